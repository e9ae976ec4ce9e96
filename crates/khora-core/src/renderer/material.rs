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

//! Defines the material records consumed by the lighting models.
//!
//! Three parameterizations are supported: the legacy Phong model, the
//! metallic-roughness PBR workflow (glTF 2.0 core), and the
//! specular-glossiness PBR workflow. The conversion helpers at the bottom of
//! the module are the single source of truth for moving between the scalar
//! representations (roughness, glossiness, shininess).

use serde::{Deserialize, Serialize};

use crate::math::{saturate, LinearRgba};

/// The largest Phong shininess exponent.
pub const MAX_SHININESS: f32 = 256.0;
/// The smallest Phong shininess exponent.
pub const MIN_SHININESS: f32 = 1.0;
/// Reflectance at normal incidence of common dielectrics.
pub const DIELECTRIC_F0: f32 = 0.04;

/// Converts a glossiness value to roughness (`1 - glossiness`).
#[inline]
pub fn roughness_from_glossiness(glossiness: f32) -> f32 {
    1.0 - saturate(glossiness)
}

/// Converts a roughness value to glossiness (`1 - roughness`).
#[inline]
pub fn glossiness_from_roughness(roughness: f32) -> f32 {
    1.0 - saturate(roughness)
}

/// Converts a roughness value to a Phong shininess exponent, clamped to `[1, 256]`.
///
/// # Examples
///
/// ```
/// use khora_core::renderer::material::shininess_from_roughness;
///
/// assert_eq!(shininess_from_roughness(0.0), 256.0);
/// assert_eq!(shininess_from_roughness(1.0), 1.0);
/// ```
#[inline]
pub fn shininess_from_roughness(roughness: f32) -> f32 {
    (glossiness_from_roughness(roughness) * MAX_SHININESS).clamp(MIN_SHININESS, MAX_SHININESS)
}

/// Converts a Phong shininess exponent to roughness.
#[inline]
pub fn roughness_from_shininess(shininess: f32) -> f32 {
    roughness_from_glossiness(shininess.clamp(MIN_SHININESS, MAX_SHININESS) / MAX_SHININESS)
}

/// Derives a metalness value from a specular colour and an albedo, for the
/// specular-glossiness workflow.
pub fn metalness_from_specular(specular: LinearRgba, albedo: LinearRgba) -> f32 {
    let spec = specular.to_vec3().max_element();
    let diff = albedo.to_vec3().max_element();
    if spec <= DIELECTRIC_F0 {
        return 0.0;
    }
    // Solve the quadratic from the Khronos specular-glossiness conversion.
    let a = DIELECTRIC_F0;
    let b = diff * (1.0 - spec) / (1.0 - a) + spec - 2.0 * a;
    let c = a - spec;
    let d = (b * b - 4.0 * a * c).max(0.0);
    saturate((-b + d.sqrt()) / (2.0 * a))
}

/// Clearcoat layer parameters (PBR models only).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Clearcoat {
    /// Strength of the coating layer, `0` disables it.
    pub factor: f32,
    /// Roughness of the coating layer.
    pub roughness: f32,
}

/// Sheen lobe parameters (PBR models only).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sheen {
    /// Sheen colour, black disables the lobe.
    pub color: LinearRgba,
    /// Roughness of the sheen lobe.
    pub roughness: f32,
}

impl Default for Sheen {
    fn default() -> Self {
        Self {
            color: LinearRgba::BLACK,
            roughness: 0.0,
        }
    }
}

/// A material using the legacy Phong lighting model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhongMaterial {
    /// Diffuse colour.
    pub diffuse: LinearRgba,
    /// Specular colour.
    pub specular: LinearRgba,
    /// Specular exponent, clamped to `[1, 256]` when used.
    pub shininess: f32,
    /// Emissive colour.
    pub emissive: LinearRgba,
    /// Transmission factor.
    pub transmission: f32,
    /// Opacity, `1` is fully opaque.
    pub opacity: f32,
}

impl PhongMaterial {
    /// The shininess clamped to its valid range.
    pub fn clamped_shininess(&self) -> f32 {
        self.shininess.clamp(MIN_SHININESS, MAX_SHININESS)
    }
}

impl Default for PhongMaterial {
    fn default() -> Self {
        Self {
            diffuse: LinearRgba::WHITE,
            specular: LinearRgba::WHITE,
            shininess: 50.0,
            emissive: LinearRgba::BLACK,
            transmission: 0.0,
            opacity: 1.0,
        }
    }
}

/// A physically-based material using the metallic-roughness workflow.
///
/// # Examples
///
/// ```
/// use khora_core::renderer::material::PbrMRMaterial;
/// use khora_core::math::LinearRgba;
///
/// let gold = PbrMRMaterial {
///     albedo: LinearRgba::rgb(1.0, 0.766, 0.336),
///     metalness: 1.0,
///     roughness: 0.2,
///     ..Default::default()
/// };
/// assert_eq!(gold.opacity, 1.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PbrMRMaterial {
    /// Base colour.
    pub albedo: LinearRgba,
    /// Roughness in `[0, 1]`.
    pub roughness: f32,
    /// Metalness in `[0, 1]`.
    pub metalness: f32,
    /// Emissive colour.
    pub emissive: LinearRgba,
    /// Transmission factor.
    pub transmission: f32,
    /// Opacity, `1` is fully opaque.
    pub opacity: f32,
    /// Clearcoat layer.
    pub clearcoat: Clearcoat,
    /// Sheen lobe.
    pub sheen: Sheen,
}

impl Default for PbrMRMaterial {
    fn default() -> Self {
        Self {
            albedo: LinearRgba::WHITE,
            roughness: 1.0,
            metalness: 0.0,
            emissive: LinearRgba::BLACK,
            transmission: 0.0,
            opacity: 1.0,
            clearcoat: Clearcoat::default(),
            sheen: Sheen::default(),
        }
    }
}

/// A physically-based material using the specular-glossiness workflow.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PbrSGMaterial {
    /// Diffuse colour.
    pub diffuse: LinearRgba,
    /// Specular colour (F0).
    pub specular: LinearRgba,
    /// Glossiness in `[0, 1]`.
    pub glossiness: f32,
    /// Emissive colour.
    pub emissive: LinearRgba,
    /// Transmission factor.
    pub transmission: f32,
    /// Opacity, `1` is fully opaque.
    pub opacity: f32,
    /// Clearcoat layer.
    pub clearcoat: Clearcoat,
    /// Sheen lobe.
    pub sheen: Sheen,
}

impl Default for PbrSGMaterial {
    fn default() -> Self {
        Self {
            diffuse: LinearRgba::WHITE,
            specular: LinearRgba::rgb(DIELECTRIC_F0, DIELECTRIC_F0, DIELECTRIC_F0),
            glossiness: 0.0,
            emissive: LinearRgba::BLACK,
            transmission: 0.0,
            opacity: 1.0,
            clearcoat: Clearcoat::default(),
            sheen: Sheen::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_glossiness_roughness_round_trip() {
        for i in 0..=100 {
            let glossiness = i as f32 / 100.0;
            let back = glossiness_from_roughness(roughness_from_glossiness(glossiness));
            assert_relative_eq!(back, glossiness, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_shininess_is_clamped() {
        for i in 0..=20 {
            let s = shininess_from_roughness(i as f32 / 20.0);
            assert!((MIN_SHININESS..=MAX_SHININESS).contains(&s));
        }
        let phong = PhongMaterial {
            shininess: 1000.0,
            ..Default::default()
        };
        assert_eq!(phong.clamped_shininess(), MAX_SHININESS);
        assert_relative_eq!(roughness_from_shininess(128.0), 0.5);
    }

    #[test]
    fn test_metalness_from_specular() {
        let albedo = LinearRgba::rgb(0.5, 0.5, 0.5);
        let dielectric = LinearRgba::rgb(0.04, 0.04, 0.04);
        assert_eq!(metalness_from_specular(dielectric, albedo), 0.0);
        let metal = LinearRgba::rgb(0.95, 0.93, 0.88);
        let m = metalness_from_specular(metal, LinearRgba::BLACK);
        assert!(m > 0.9 && m <= 1.0);
    }
}
