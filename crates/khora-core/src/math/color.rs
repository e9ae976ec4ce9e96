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

//! Defines the `LinearRgba` color type.

use crate::math::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// A color in a **linear RGBA** color space using `f32` components.
///
/// Lighting is computed in linear space, so every color handed to the shading
/// core (light colours, albedo, emissive) is expected to be linear. Components
/// may exceed `1.0` for HDR values.
#[derive(
    Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable, Serialize, Deserialize,
)]
#[repr(C)]
pub struct LinearRgba {
    /// The red component in linear space.
    pub r: f32,
    /// The green component in linear space.
    pub g: f32,
    /// The blue component in linear space.
    pub b: f32,
    /// The alpha (opacity) component.
    pub a: f32,
}

impl LinearRgba {
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);

    /// Creates a new `LinearRgba` with explicit RGBA values.
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Creates a new opaque `LinearRgba` (alpha = 1.0).
    #[inline]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Creates a color from sRGB-encoded components, converting RGB to linear.
    ///
    /// # Examples
    ///
    /// ```
    /// use khora_core::math::LinearRgba;
    ///
    /// let c = LinearRgba::from_srgb(1.0, 0.0, 0.5);
    /// assert_eq!(c.r, 1.0);
    /// assert!(c.b < 0.5);
    /// ```
    pub fn from_srgb(r: f32, g: f32, b: f32) -> Self {
        Self::rgb(srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b))
    }

    /// Returns the RGB part as a vector.
    #[inline]
    pub const fn to_vec3(&self) -> Vec3 {
        Vec3::new(self.r, self.g, self.b)
    }

    /// Returns all four components as a vector.
    #[inline]
    pub const fn to_vec4(&self) -> Vec4 {
        Vec4::new(self.r, self.g, self.b, self.a)
    }
}

impl Default for LinearRgba {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<Vec3> for LinearRgba {
    fn from(v: Vec3) -> Self {
        Self::rgb(v.x, v.y, v.z)
    }
}

#[inline]
fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_srgb_conversion_endpoints() {
        let black = LinearRgba::from_srgb(0.0, 0.0, 0.0);
        let white = LinearRgba::from_srgb(1.0, 1.0, 1.0);
        assert_eq!(black, LinearRgba::BLACK);
        assert_relative_eq!(white.r, 1.0, epsilon = 1e-6);
        assert_relative_eq!(LinearRgba::from_srgb(0.5, 0.5, 0.5).g, 0.214_041, epsilon = 1e-5);
    }

    #[test]
    fn test_vector_views() {
        let c = LinearRgba::new(0.1, 0.2, 0.3, 0.4);
        assert_eq!(c.to_vec3(), Vec3::new(0.1, 0.2, 0.3));
        assert_eq!(c.to_vec4().w, 0.4);
        assert_eq!(LinearRgba::from(Vec3::ONE), LinearRgba::WHITE);
    }
}
