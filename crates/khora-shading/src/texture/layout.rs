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

//! Slot schema of the packed texture configuration buffer.
//!
//! Each texture unit occupies [`TEXTURE_CONFIG_COMPONENTS`] `vec4<f32>` slots.
//! Units are numbered from 1: the first row of the buffer is reserved so that
//! index 0 can mean "no texture".
//!
//! | slot | x | y | z | w |
//! |------|---|---|---|---|
//! | 0 | colour mask | | specular mask | |
//! | 1 | glossiness mask | | opacity mask | |
//! | 2 | emissive mask | | occlusion mask | |
//! | 3 | transmittance mask | | needsGammaCorrection | needsYInversion |
//! | 4 | normal mask | | normalFactor | normalGMultiplier |
//! | 5 | height mask | | heightFactor | |
//! | 6 | isAnimated | texcoordSet | | |
//! | 7 | metalness mask | | roughness mask | |
//! | 8 | translate.x | translate.y | rotate | |
//! | 9 | scale.x | scale.y | clearcoat mask | |
//! | 10 | sheen mask | | | |
//!
//! A mask is two floats: `1` when the channel is read from the unit, then the
//! index of the texel component it starts at.

use bytemuck::{Pod, Zeroable};

use khora_core::math::Vec2;
use khora_core::renderer::texture::TextureUnitConfig;

use super::TEXTURE_CONFIGS_BUFFER;
use crate::eval::{Interpreter, Value};
use crate::ShadingError;

/// Slots per texture unit.
pub const TEXTURE_CONFIG_COMPONENTS: usize = 11;

/// Colour and specular masks.
pub const COLR_SPEC: usize = 0;
/// Glossiness and opacity masks.
pub const GLOSS_OPA: usize = 1;
/// Emissive and occlusion masks.
pub const EMIS_OCCL: usize = 2;
/// Transmittance mask and colour space flags.
pub const TRNS_DUMM: usize = 3;
/// Normal mask and factors.
pub const NORMAL_FC: usize = 4;
/// Height mask and factor.
pub const HEIGHT_FC: usize = 5;
/// Animation flag and texture coordinate set.
pub const MISC_VALS: usize = 6;
/// Metalness and roughness masks.
pub const METL_RGH: usize = 7;
/// UV translation and rotation.
pub const TRANSLATE: usize = 8;
/// UV scale and clearcoat mask.
pub const SCALE_CLC: usize = 9;
/// Sheen mask.
pub const SHEEN_MSK: usize = 10;

/// One `vec4<f32>` slot of the texture configuration buffer.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct TextureConfigSlot(pub [f32; 4]);

impl TextureConfigSlot {
    fn pair(a: Vec2, b: Vec2) -> Self {
        Self([a.x, a.y, b.x, b.y])
    }
}

fn flag(value: bool) -> f32 {
    if value {
        1.0
    } else {
        0.0
    }
}

/// Packs the configuration of one texture unit.
pub fn encode(config: &TextureUnitConfig) -> [TextureConfigSlot; TEXTURE_CONFIG_COMPONENTS] {
    let pair = TextureConfigSlot::pair;
    let t = &config.transform;
    let mut slots = [TextureConfigSlot::default(); TEXTURE_CONFIG_COMPONENTS];
    slots[COLR_SPEC] = pair(config.colour.packed(), config.specular.packed());
    slots[GLOSS_OPA] = pair(config.glossiness.packed(), config.opacity.packed());
    slots[EMIS_OCCL] = pair(config.emissive.packed(), config.occlusion.packed());
    slots[TRNS_DUMM] = pair(
        config.transmittance.packed(),
        Vec2::new(
            flag(config.needs_gamma_correction),
            flag(config.needs_y_inversion),
        ),
    );
    slots[NORMAL_FC] = pair(
        config.normal.packed(),
        Vec2::new(config.normal_factor, config.normal_g_multiplier),
    );
    slots[HEIGHT_FC] = pair(config.height.packed(), Vec2::new(config.height_factor, 0.0));
    let texcoord_set = config.texcoord_set as f32;
    slots[MISC_VALS] = TextureConfigSlot([flag(config.animated), texcoord_set, 0.0, 0.0]);
    slots[METL_RGH] = pair(config.metalness.packed(), config.roughness.packed());
    slots[TRANSLATE] = TextureConfigSlot([t.translate.x, t.translate.y, t.rotate, 0.0]);
    slots[SCALE_CLC] = pair(t.scale, config.clearcoat.packed());
    slots[SHEEN_MSK] = pair(config.sheen.packed(), Vec2::ZERO);
    slots
}

/// The texture configuration buffer of a pass.
///
/// # Examples
///
/// ```
/// use khora_core::renderer::texture::{ChannelMask, TextureUnitConfig};
/// use khora_shading::texture::TextureConfigBuffer;
///
/// let mut buffer = TextureConfigBuffer::new();
/// let mut albedo = TextureUnitConfig::default();
/// albedo.colour = ChannelMask::component(0);
/// let index = buffer.push(&albedo);
/// assert_eq!(index, 1);
/// assert_eq!(buffer.offset(index).unwrap(), 11);
/// assert!(buffer.offset(0).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TextureConfigBuffer {
    slots: Vec<TextureConfigSlot>,
}

impl Default for TextureConfigBuffer {
    fn default() -> Self {
        Self {
            slots: vec![TextureConfigSlot::default(); TEXTURE_CONFIG_COMPONENTS],
        }
    }
}

impl TextureConfigBuffer {
    /// Creates a buffer holding only the reserved row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a unit and returns its 1-based index.
    pub fn push(&mut self, config: &TextureUnitConfig) -> u32 {
        let index = self.len() + 1;
        self.slots.extend_from_slice(&encode(config));
        log::trace!(
            "TextureConfigBuffer: unit {} routes {:?}",
            index,
            config.channels()
        );
        index
    }

    /// Number of units, the reserved row excluded.
    pub fn len(&self) -> u32 {
        (self.slots.len() / TEXTURE_CONFIG_COMPONENTS) as u32 - 1
    }

    /// Returns `true` if no unit was pushed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// First slot of unit `index`.
    ///
    /// # Errors
    /// [`ShadingError::InvalidTextureUnit`] for the reserved index 0 and for
    /// indices past the last unit.
    pub fn offset(&self, index: u32) -> Result<u32, ShadingError> {
        if index == 0 || index > self.len() {
            return Err(ShadingError::InvalidTextureUnit(index));
        }
        Ok(index * TEXTURE_CONFIG_COMPONENTS as u32)
    }

    /// The packed slots, reserved row included.
    pub fn slots(&self) -> &[TextureConfigSlot] {
        &self.slots
    }

    /// The packed slots as bytes, ready for upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.slots)
    }

    /// Binds the buffer as the `c3d_textureConfigs` global.
    pub fn bind(&self, interpreter: &mut Interpreter<'_>) {
        let slots: Vec<[f32; 4]> = self.slots.iter().map(|s| s.0).collect();
        interpreter.bind_global(TEXTURE_CONFIGS_BUFFER, Value::from_slots(&slots));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use khora_core::renderer::texture::{ChannelMask, UvTransform};

    #[test]
    fn test_encode_masks_and_flags() {
        let config = TextureUnitConfig {
            occlusion: ChannelMask::component(0),
            roughness: ChannelMask::component(1),
            metalness: ChannelMask::component(2),
            needs_y_inversion: true,
            animated: true,
            transform: UvTransform {
                translate: Vec2::new(0.25, 0.5),
                rotate: 1.0,
                scale: Vec2::new(2.0, 3.0),
            },
            ..Default::default()
        };
        let slots = encode(&config);
        assert_eq!(slots[EMIS_OCCL].0, [0.0, 0.0, 1.0, 0.0]);
        assert_eq!(slots[METL_RGH].0, [1.0, 2.0, 1.0, 1.0]);
        assert_eq!(slots[TRNS_DUMM].0, [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(slots[MISC_VALS].0, [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(slots[TRANSLATE].0, [0.25, 0.5, 1.0, 0.0]);
        assert_eq!(slots[SCALE_CLC].0, [2.0, 3.0, 0.0, 0.0]);
        assert_eq!(slots[NORMAL_FC].0, [0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_reserved_row() {
        let mut buffer = TextureConfigBuffer::new();
        assert!(buffer.is_empty());
        assert_eq!(buffer.slots().len(), TEXTURE_CONFIG_COMPONENTS);
        buffer.push(&TextureUnitConfig::default());
        buffer.push(&TextureUnitConfig::default());
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.offset(2).unwrap(), 22);
        assert!(matches!(buffer.offset(3), Err(ShadingError::InvalidTextureUnit(3))));
        assert_eq!(buffer.as_bytes().len(), 3 * TEXTURE_CONFIG_COMPONENTS * 16);
    }
}
