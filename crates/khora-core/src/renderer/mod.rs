// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Host-side renderer records consumed by the shading core.
//!
//! The lights, materials and texture-unit descriptions defined here are plain
//! data. The `khora-shading` crate turns them into packed GPU buffers and into
//! the shader functions that read those buffers.

pub mod light;
pub mod material;
pub mod texture;

pub use self::light::{
    Attenuation, DirectionalLight, LightBase, LightType, PointLight, ShadowSettings, ShadowType,
    SpotLight, DIRECTIONAL_MAX_CASCADES,
};
pub use self::material::{PbrMRMaterial, PbrSGMaterial, PhongMaterial};
pub use self::texture::{ChannelMask, TextureChannels, TextureUnitConfig, UvTransform};
