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

//! Slot schema of the packed light buffer.
//!
//! The buffer is an array of `vec4<f32>` slots. Every light occupies
//! [`MAX_LIGHT_COMPONENTS`] slots; directional lights come first, then point
//! lights, then spot lights. The first [`BASE_LIGHT_COMPONENTS`] slots of a
//! light hold the parameters shared by all types:
//!
//! | slot | x | y | z | w |
//! |------|---|---|---|---|
//! | 0 | colour.r | colour.g | colour.b | shadowMapIndex |
//! | 1 | intensity.x | intensity.y | farPlane | shadowType |
//! | 2 | volumetricSteps | volumetricScattering | pcfFilterSize | pcfSampleCount |
//! | 3 | rawShadowOffsets.x | rawShadowOffsets.y | pcfShadowOffsets.x | pcfShadowOffsets.y |
//! | 4 | vsmMinVariance | vsmLightBleedingReduction | | |
//!
//! Directional lights: slot 5 direction and cascade count, 6-7 split depths,
//! 8 split scales, 9-24 the four cascade matrices (column-major).
//! Point lights: 5 position, 6 attenuation.
//! Spot lights: 5 position, 6 attenuation, 7 direction and exponent,
//! 8 inner cutoff, outer cutoff and cutoff difference reciprocal, 9-12 transform.

/// Slots shared by every light type.
pub const BASE_LIGHT_COMPONENTS: usize = 5;
/// Slots reserved per light, whatever its type.
pub const MAX_LIGHT_COMPONENTS: usize = 25;

/// Colour and shadow map index.
pub const COLOUR_SHADOW_INDEX: usize = 0;
/// Intensity, far plane and shadow type.
pub const INTENSITY_FAR_TYPE: usize = 1;
/// Volumetric and PCF parameters.
pub const VOLUMETRIC_PCF: usize = 2;
/// Raw and PCF depth offsets.
pub const SHADOW_OFFSETS: usize = 3;
/// Variance shadow map parameters.
pub const VSM: usize = 4;

/// Direction and cascade count of a directional light.
pub const DIRECTION_CASCADES: usize = BASE_LIGHT_COMPONENTS;
/// First of the two split depth slots.
pub const SPLIT_DEPTHS: usize = BASE_LIGHT_COMPONENTS + 1;
/// Split scales.
pub const SPLIT_SCALES: usize = BASE_LIGHT_COMPONENTS + 3;
/// First slot of the cascade matrices.
pub const CASCADE_TRANSFORMS: usize = BASE_LIGHT_COMPONENTS + 4;

/// Position of a point or spot light.
pub const POSITION: usize = BASE_LIGHT_COMPONENTS;
/// Attenuation of a point or spot light.
pub const ATTENUATION: usize = BASE_LIGHT_COMPONENTS + 1;
/// Direction and exponent of a spot light.
pub const SPOT_DIRECTION_EXPONENT: usize = BASE_LIGHT_COMPONENTS + 2;
/// Cone cutoffs of a spot light.
pub const SPOT_CUTOFFS: usize = BASE_LIGHT_COMPONENTS + 3;
/// First slot of the spot light matrix.
pub const SPOT_TRANSFORM: usize = BASE_LIGHT_COMPONENTS + 4;

/// Slots used by one 4x4 matrix.
pub const MATRIX_SLOTS: usize = 4;
/// Slots holding the split depths (`DIRECTIONAL_MAX_CASCADES + 1` floats).
pub const SPLIT_DEPTH_SLOTS: usize = 2;

const _: () = assert!(CASCADE_TRANSFORMS + 4 * MATRIX_SLOTS <= MAX_LIGHT_COMPONENTS);
const _: () = assert!(SPOT_TRANSFORM + MATRIX_SLOTS <= MAX_LIGHT_COMPONENTS);
