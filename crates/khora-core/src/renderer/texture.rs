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

//! Describes how a material texture unit feeds the material channels.

use serde::{Deserialize, Serialize};

use crate::khora_bitflags;
use crate::math::Vec2;

khora_bitflags! {
    /// The material channels a texture unit contributes to.
    pub struct TextureChannels: u32 {
        /// Albedo / diffuse colour.
        const COLOUR = 1 << 0;
        /// Specular colour.
        const SPECULAR = 1 << 1;
        /// Glossiness (inverted roughness).
        const GLOSSINESS = 1 << 2;
        /// Opacity.
        const OPACITY = 1 << 3;
        /// Emissive colour.
        const EMISSIVE = 1 << 4;
        /// Ambient occlusion.
        const OCCLUSION = 1 << 5;
        /// Transmittance.
        const TRANSMITTANCE = 1 << 6;
        /// Tangent-space normal map.
        const NORMAL = 1 << 7;
        /// Height map for parallax occlusion mapping.
        const HEIGHT = 1 << 8;
        /// Metalness.
        const METALNESS = 1 << 9;
        /// Roughness.
        const ROUGHNESS = 1 << 10;
        /// Clearcoat factor.
        const CLEARCOAT = 1 << 11;
        /// Sheen colour.
        const SHEEN = 1 << 12;
        /// Channels that alter the surface geometry and are applied first.
        const GEOMETRY = (1 << 7) | (1 << 8) | (1 << 3);
    }
}

/// Routes one material channel to a component of the sampled texel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChannelMask {
    /// Whether this channel is read from the texture.
    pub enabled: bool,
    /// Index of the first component of the sampled texel used by this channel (0-3).
    pub component: u8,
}

impl ChannelMask {
    /// A mask reading the given component.
    pub const fn component(component: u8) -> Self {
        Self {
            enabled: true,
            component,
        }
    }

    /// The two floats written in the packed configuration row.
    pub fn packed(&self) -> Vec2 {
        Vec2::new(
            if self.enabled { 1.0 } else { 0.0 },
            f32::from(self.component.min(3)),
        )
    }
}

/// UV transform applied to an animated texture unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UvTransform {
    /// Translation added after rotation.
    pub translate: Vec2,
    /// Rotation angle in radians.
    pub rotate: f32,
    /// Scale applied first.
    pub scale: Vec2,
}

impl Default for UvTransform {
    fn default() -> Self {
        Self {
            translate: Vec2::ZERO,
            rotate: 0.0,
            scale: Vec2::ONE,
        }
    }
}

/// The host-side configuration of one texture unit.
///
/// # Examples
///
/// ```
/// use khora_core::renderer::texture::{ChannelMask, TextureChannels, TextureUnitConfig};
///
/// let mut config = TextureUnitConfig::default();
/// config.occlusion = ChannelMask::component(0);
/// config.roughness = ChannelMask::component(1);
/// config.metalness = ChannelMask::component(2);
/// assert_eq!(
///     config.channels(),
///     TextureChannels::OCCLUSION | TextureChannels::ROUGHNESS | TextureChannels::METALNESS
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextureUnitConfig {
    /// Colour mask.
    pub colour: ChannelMask,
    /// Specular mask.
    pub specular: ChannelMask,
    /// Glossiness mask.
    pub glossiness: ChannelMask,
    /// Opacity mask.
    pub opacity: ChannelMask,
    /// Emissive mask.
    pub emissive: ChannelMask,
    /// Occlusion mask.
    pub occlusion: ChannelMask,
    /// Transmittance mask.
    pub transmittance: ChannelMask,
    /// Normal mask.
    pub normal: ChannelMask,
    /// Height mask.
    pub height: ChannelMask,
    /// Metalness mask.
    pub metalness: ChannelMask,
    /// Roughness mask.
    pub roughness: ChannelMask,
    /// Clearcoat mask.
    pub clearcoat: ChannelMask,
    /// Sheen mask.
    pub sheen: ChannelMask,
    /// Strength of the normal perturbation.
    pub normal_factor: f32,
    /// Multiplier applied to the green channel of normal maps (`-1` for DirectX maps).
    pub normal_g_multiplier: f32,
    /// Depth scale of the height map.
    pub height_factor: f32,
    /// Whether the texel colours are sRGB encoded.
    pub needs_gamma_correction: bool,
    /// Whether the V coordinate must be flipped.
    pub needs_y_inversion: bool,
    /// Whether the UV transform is applied.
    pub animated: bool,
    /// Index of the texture coordinate set.
    pub texcoord_set: u32,
    /// UV transform.
    pub transform: UvTransform,
}

impl TextureUnitConfig {
    /// Returns the set of channels this unit contributes to.
    pub fn channels(&self) -> TextureChannels {
        let routed = [
            (self.colour, TextureChannels::COLOUR),
            (self.specular, TextureChannels::SPECULAR),
            (self.glossiness, TextureChannels::GLOSSINESS),
            (self.opacity, TextureChannels::OPACITY),
            (self.emissive, TextureChannels::EMISSIVE),
            (self.occlusion, TextureChannels::OCCLUSION),
            (self.transmittance, TextureChannels::TRANSMITTANCE),
            (self.normal, TextureChannels::NORMAL),
            (self.height, TextureChannels::HEIGHT),
            (self.metalness, TextureChannels::METALNESS),
            (self.roughness, TextureChannels::ROUGHNESS),
            (self.clearcoat, TextureChannels::CLEARCOAT),
            (self.sheen, TextureChannels::SHEEN),
        ];
        routed
            .into_iter()
            .filter(|(mask, _)| mask.enabled)
            .fold(TextureChannels::EMPTY, |acc, (_, flag)| acc | flag)
    }
}

impl Default for TextureUnitConfig {
    fn default() -> Self {
        Self {
            colour: ChannelMask::default(),
            specular: ChannelMask::default(),
            glossiness: ChannelMask::default(),
            opacity: ChannelMask::default(),
            emissive: ChannelMask::default(),
            occlusion: ChannelMask::default(),
            transmittance: ChannelMask::default(),
            normal: ChannelMask::default(),
            height: ChannelMask::default(),
            metalness: ChannelMask::default(),
            roughness: ChannelMask::default(),
            clearcoat: ChannelMask::default(),
            sheen: ChannelMask::default(),
            normal_factor: 1.0,
            normal_g_multiplier: 1.0,
            height_factor: 0.1,
            needs_gamma_correction: false,
            needs_y_inversion: false,
            animated: false,
            texcoord_set: 0,
            transform: UvTransform::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_routes_nothing() {
        assert!(TextureUnitConfig::default().channels().is_empty());
    }

    #[test]
    fn test_packed_mask() {
        assert_eq!(ChannelMask::default().packed(), Vec2::ZERO);
        assert_eq!(ChannelMask::component(2).packed(), Vec2::new(1.0, 2.0));
        let clamped = ChannelMask {
            enabled: true,
            component: 7,
        };
        assert_eq!(clamped.packed(), Vec2::new(1.0, 3.0));
    }

    #[test]
    fn test_geometry_channels() {
        let mut config = TextureUnitConfig::default();
        config.normal = ChannelMask::component(0);
        assert!(config.channels().intersects(TextureChannels::GEOMETRY));
        config.normal = ChannelMask::default();
        config.colour = ChannelMask::component(0);
        assert!(!config.channels().intersects(TextureChannels::GEOMETRY));
    }
}
