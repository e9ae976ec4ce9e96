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

//! # Khora Shading
//!
//! Build-time generation of lighting shader code.
//!
//! A [`LightingModel`] writes the lighting equations of one material model
//! (Phong, metallic-roughness PBR or specular-glossiness PBR) into a
//! [`ShaderWriter`], one function per light kind and feature combination.
//! The resulting [`ast::ShaderModule`] is emitted as WGSL by [`wgsl::emit`]
//! or run on the CPU by [`eval::Interpreter`].
//!
//! Host-side records (lights, materials, texture units) live in
//! `khora_core::renderer`; this crate packs them into the buffers the
//! generated code decodes.

#![warn(missing_docs)]

pub mod ast;
pub mod brdf;
mod error;
pub mod eval;
pub mod lighting;
pub mod lights;
pub mod material;
pub mod output;
pub mod settings;
pub mod shadow;
pub mod surface;
pub mod texture;
pub mod wgsl;
pub mod writer;

pub use error::ShadingError;
pub use lighting::{LightKind, LightingModel};
pub use material::MaterialModel;
pub use settings::ShadingSettings;
pub use writer::{FunctionCache, FunctionHandle, ShaderWriter};
