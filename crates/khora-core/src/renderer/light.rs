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

//! Defines light types for the rendering system.
//!
//! These are the host-side records a scene hands to the renderer. The shading
//! core packs them into the light buffer read by the generated shaders, and the
//! shadow passes use them to compute cascade and face transforms.

use serde::{Deserialize, Serialize};

use crate::math::{LinearRgba, Mat4, Vec2, Vec3};

/// The maximum number of shadow cascades a directional light can use.
pub const DIRECTIONAL_MAX_CASCADES: usize = 4;

/// The filtering technique used when sampling a light's shadow map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ShadowType {
    /// The light casts no shadows.
    #[default]
    None,
    /// A single depth comparison per fragment.
    Raw,
    /// Percentage-closer filtering over a Poisson disk.
    Pcf,
    /// Variance shadow maps (depth moments + Chebyshev bound).
    Variance,
}

impl ShadowType {
    /// Returns the value written in the light buffer for this shadow type.
    pub const fn as_u32(self) -> u32 {
        match self {
            ShadowType::None => 0,
            ShadowType::Raw => 1,
            ShadowType::Pcf => 2,
            ShadowType::Variance => 3,
        }
    }

    /// Decodes a light buffer value; unknown values map to [`ShadowType::None`].
    pub const fn from_u32(value: u32) -> Self {
        match value {
            1 => ShadowType::Raw,
            2 => ShadowType::Pcf,
            3 => ShadowType::Variance,
            _ => ShadowType::None,
        }
    }
}

/// Shadow and volumetric parameters shared by every light type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadowSettings {
    /// The filtering technique, or [`ShadowType::None`].
    pub shadow_type: ShadowType,
    /// The slice of the shadow map array assigned to this light, `-1` if none.
    pub map_index: i32,
    /// Minimum and slope-scaled depth bias for raw sampling.
    pub raw_offsets: Vec2,
    /// Minimum and slope-scaled depth bias for PCF sampling.
    pub pcf_offsets: Vec2,
    /// Kernel radius in texels for PCF sampling.
    pub pcf_filter_size: f32,
    /// Number of Poisson samples for PCF sampling.
    pub pcf_sample_count: u32,
    /// Lower bound of the variance for VSM sampling.
    pub vsm_min_variance: f32,
    /// Light bleeding reduction factor for VSM sampling, in `[0, 1)`.
    pub vsm_light_bleeding_reduction: f32,
    /// Number of ray-marching steps for volumetric scattering, `0` disables it.
    pub volumetric_steps: u32,
    /// Henyey-Greenstein asymmetry factor for volumetric scattering.
    pub volumetric_scattering: f32,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            shadow_type: ShadowType::None,
            map_index: -1,
            raw_offsets: Vec2::new(0.0005, 0.002),
            pcf_offsets: Vec2::new(0.0002, 0.001),
            pcf_filter_size: 4.0,
            pcf_sample_count: 8,
            vsm_min_variance: 0.000_02,
            vsm_light_bleeding_reduction: 0.2,
            volumetric_steps: 0,
            volumetric_scattering: 0.2,
        }
    }
}

/// Colour, intensity and shadow parameters common to every light source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightBase {
    /// The color of the light in linear RGB space.
    pub color: LinearRgba,
    /// Diffuse (`x`) and specular (`y`) intensity multipliers.
    pub intensity: Vec2,
    /// The far plane used when rendering this light's shadow map.
    pub far_plane: f32,
    /// Shadow and volumetric parameters.
    pub shadow: ShadowSettings,
}

impl Default for LightBase {
    fn default() -> Self {
        Self {
            color: LinearRgba::WHITE,
            intensity: Vec2::ONE,
            far_plane: 100.0,
            shadow: ShadowSettings::default(),
        }
    }
}

/// Polynomial distance attenuation `constant + linear * d + quadratic * d²`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Attenuation {
    /// Constant term.
    pub constant: f32,
    /// Linear term.
    pub linear: f32,
    /// Quadratic term.
    pub quadratic: f32,
}

impl Attenuation {
    /// Evaluates the attenuation denominator at `distance`.
    ///
    /// # Examples
    ///
    /// ```
    /// use khora_core::renderer::light::Attenuation;
    ///
    /// let att = Attenuation { constant: 1.0, linear: 0.0, quadratic: 1.0 };
    /// assert_eq!(att.denominator(3.0), 10.0);
    /// ```
    #[inline]
    pub fn denominator(&self, distance: f32) -> f32 {
        self.constant + self.linear * distance + self.quadratic * distance * distance
    }

    /// Returns the attenuation terms as a vector (constant, linear, quadratic).
    #[inline]
    pub const fn to_vec3(&self) -> Vec3 {
        Vec3::new(self.constant, self.linear, self.quadratic)
    }
}

impl Default for Attenuation {
    fn default() -> Self {
        Self {
            constant: 1.0,
            linear: 0.0,
            quadratic: 1.0,
        }
    }
}

/// A directional light source that illuminates from a uniform direction.
///
/// Directional lights simulate infinitely distant light sources like the sun.
/// Their shadows are split into up to [`DIRECTIONAL_MAX_CASCADES`] cascades.
///
/// # Examples
///
/// ```
/// use khora_core::renderer::light::DirectionalLight;
/// use khora_core::math::{Vec3, LinearRgba};
///
/// let sun = DirectionalLight {
///     direction: Vec3::new(-0.5, -1.0, -0.3).normalize(),
///     cascade_count: 3,
///     ..Default::default()
/// };
/// assert_eq!(sun.base.color, LinearRgba::WHITE);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionalLight {
    /// Common light parameters.
    pub base: LightBase,
    /// The direction the light is pointing (normalized), from the light towards the scene.
    pub direction: Vec3,
    /// The number of shadow cascades, clamped to [`DIRECTIONAL_MAX_CASCADES`].
    pub cascade_count: u32,
    /// View-space split depths, `cascade_count + 1` meaningful entries.
    pub split_depths: [f32; DIRECTIONAL_MAX_CASCADES + 1],
    /// Per-cascade texel scale, used to keep filter kernels consistent across cascades.
    pub split_scales: [f32; DIRECTIONAL_MAX_CASCADES],
    /// Per-cascade light view-projection transforms.
    pub transforms: [Mat4; DIRECTIONAL_MAX_CASCADES],
}

impl DirectionalLight {
    /// Returns the cascade count clamped to `[1, DIRECTIONAL_MAX_CASCADES]`.
    pub fn clamped_cascade_count(&self) -> usize {
        (self.cascade_count as usize).clamp(1, DIRECTIONAL_MAX_CASCADES)
    }
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            base: LightBase::default(),
            direction: Vec3::new(0.0, -1.0, -0.5).normalize(),
            cascade_count: 1,
            split_depths: [0.0; DIRECTIONAL_MAX_CASCADES + 1],
            split_scales: [1.0; DIRECTIONAL_MAX_CASCADES],
            transforms: [Mat4::IDENTITY; DIRECTIONAL_MAX_CASCADES],
        }
    }
}

/// A point light source that emits light in all directions from a single point.
///
/// Point lights cast omnidirectional shadows through six cube faces.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointLight {
    /// Common light parameters.
    pub base: LightBase,
    /// World-space position of the light.
    pub position: Vec3,
    /// Distance attenuation.
    pub attenuation: Attenuation,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            base: LightBase::default(),
            position: Vec3::ZERO,
            attenuation: Attenuation::default(),
        }
    }
}

/// A spot light source that emits light in a cone from a single point.
///
/// # Examples
///
/// ```
/// use khora_core::renderer::light::SpotLight;
///
/// let flashlight = SpotLight {
///     inner_cone_angle: 15.0_f32.to_radians(),
///     outer_cone_angle: 30.0_f32.to_radians(),
///     ..Default::default()
/// };
/// assert!(flashlight.inner_cutoff() > flashlight.outer_cutoff());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpotLight {
    /// Common light parameters.
    pub base: LightBase,
    /// World-space position of the light.
    pub position: Vec3,
    /// The direction the spotlight is pointing (normalized).
    pub direction: Vec3,
    /// Distance attenuation.
    pub attenuation: Attenuation,
    /// Falloff exponent inside the cone.
    pub exponent: f32,
    /// Half-angle in radians of the fully lit cone.
    pub inner_cone_angle: f32,
    /// Half-angle in radians beyond which there is no light.
    pub outer_cone_angle: f32,
    /// Light view-projection used for shadow sampling.
    pub transform: Mat4,
}

impl SpotLight {
    /// Cosine of the inner cone angle.
    #[inline]
    pub fn inner_cutoff(&self) -> f32 {
        self.inner_cone_angle.cos()
    }

    /// Cosine of the outer cone angle.
    #[inline]
    pub fn outer_cutoff(&self) -> f32 {
        self.outer_cone_angle.cos()
    }

    /// Reciprocal of the cutoff difference, `1 / (inner - outer)` in cosine space.
    ///
    /// Returns `0.0` for a degenerate cone where both angles are equal.
    pub fn cutoff_diff_reciprocal(&self) -> f32 {
        let diff = self.inner_cutoff() - self.outer_cutoff();
        if diff.abs() <= f32::EPSILON {
            0.0
        } else {
            1.0 / diff
        }
    }
}

impl Default for SpotLight {
    fn default() -> Self {
        Self {
            base: LightBase::default(),
            position: Vec3::ZERO,
            direction: Vec3::new(0.0, -1.0, 0.0),
            attenuation: Attenuation::default(),
            exponent: 1.0,
            inner_cone_angle: 20.0_f32.to_radians(),
            outer_cone_angle: 35.0_f32.to_radians(),
            transform: Mat4::IDENTITY,
        }
    }
}

/// An enumeration of all supported light types.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LightType {
    /// A directional light (sun-like, infinite distance, no falloff).
    Directional(DirectionalLight),
    /// A point light (omni-directional with distance falloff).
    Point(PointLight),
    /// A spotlight (cone-shaped with distance and angular falloff).
    Spot(SpotLight),
}

impl LightType {
    /// Returns the parameters shared by every light type.
    pub fn base(&self) -> &LightBase {
        match self {
            LightType::Directional(light) => &light.base,
            LightType::Point(light) => &light.base,
            LightType::Spot(light) => &light.base,
        }
    }
}

impl Default for LightType {
    fn default() -> Self {
        LightType::Directional(DirectionalLight::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::EPSILON;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_directional_light_default() {
        let light = DirectionalLight::default();
        assert_eq!(light.base.color, LinearRgba::WHITE);
        assert!(approx_eq(light.direction.length(), 1.0));
        assert_eq!(light.clamped_cascade_count(), 1);
    }

    #[test]
    fn test_cascade_count_is_clamped() {
        let light = DirectionalLight {
            cascade_count: 9,
            ..Default::default()
        };
        assert_eq!(light.clamped_cascade_count(), DIRECTIONAL_MAX_CASCADES);
        let light = DirectionalLight {
            cascade_count: 0,
            ..Default::default()
        };
        assert_eq!(light.clamped_cascade_count(), 1);
    }

    #[test]
    fn test_shadow_type_round_trip() {
        for ty in [
            ShadowType::None,
            ShadowType::Raw,
            ShadowType::Pcf,
            ShadowType::Variance,
        ] {
            assert_eq!(ShadowType::from_u32(ty.as_u32()), ty);
        }
        assert_eq!(ShadowType::from_u32(42), ShadowType::None);
    }

    #[test]
    fn test_attenuation_denominator() {
        let att = Attenuation {
            constant: 1.0,
            linear: 0.5,
            quadratic: 0.25,
        };
        assert!(approx_eq(att.denominator(2.0), 1.0 + 1.0 + 1.0));
        assert_eq!(att.to_vec3(), Vec3::new(1.0, 0.5, 0.25));
    }

    #[test]
    fn test_spot_light_cutoffs() {
        let light = SpotLight::default();
        assert!(light.inner_cutoff() > light.outer_cutoff());
        let expected = 1.0 / (light.inner_cutoff() - light.outer_cutoff());
        assert!(approx_eq(light.cutoff_diff_reciprocal(), expected));

        let degenerate = SpotLight {
            inner_cone_angle: 0.3,
            outer_cone_angle: 0.3,
            ..Default::default()
        };
        assert_eq!(degenerate.cutoff_diff_reciprocal(), 0.0);
    }

    #[test]
    fn test_light_type_base() {
        let point = LightType::Point(PointLight {
            base: LightBase {
                far_plane: 12.0,
                ..Default::default()
            },
            ..Default::default()
        });
        assert!(approx_eq(point.base().far_plane, 12.0));
        assert!(matches!(LightType::default(), LightType::Directional(_)));
    }
}
