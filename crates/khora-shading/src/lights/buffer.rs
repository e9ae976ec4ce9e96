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

//! Host-side packing of lights into the slot buffer read by the decoders.

use bytemuck::{Pod, Zeroable};

use khora_core::math::{Mat4, Vec4};
use khora_core::renderer::light as host;

use super::layout::*;
use super::{LightKind, LIGHTS_BUFFER, LIGHT_COUNTS_BUFFER, LIGHT_COUNTS};
use crate::eval::{Interpreter, Value};

/// One `vec4<f32>` slot of the light buffer.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct LightSlot(pub [f32; 4]);

impl LightSlot {
    fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self([x, y, z, w])
    }
}

impl From<Vec4> for LightSlot {
    fn from(v: Vec4) -> Self {
        Self([v.x, v.y, v.z, v.w])
    }
}

/// Number of lights of each type, bound as the `c3d_lightCounts` uniform.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct LightCounts {
    /// Directional lights, stored first.
    pub directional: u32,
    /// Point lights, stored after the directional lights.
    pub point: u32,
    /// Spot lights, stored last.
    pub spot: u32,
    /// Padding for 16-byte alignment.
    pub _padding: u32,
}

impl LightCounts {
    /// Total number of lights.
    pub fn total(&self) -> u32 {
        self.directional + self.point + self.spot
    }

    /// Converts to an evaluator value.
    pub fn to_value(&self) -> Value {
        Value::Struct {
            name: LIGHT_COUNTS.to_owned(),
            fields: vec![
                ("directional".to_owned(), self.directional.into()),
                ("point".to_owned(), self.point.into()),
                ("spot".to_owned(), self.spot.into()),
            ],
        }
    }
}

/// Packs the parameters shared by every light type.
pub fn encode_base(base: &host::LightBase) -> [LightSlot; BASE_LIGHT_COMPONENTS] {
    let shadow = &base.shadow;
    let mut slots = [LightSlot::default(); BASE_LIGHT_COMPONENTS];
    slots[COLOUR_SHADOW_INDEX] = LightSlot::new(
        base.color.r,
        base.color.g,
        base.color.b,
        shadow.map_index as f32,
    );
    slots[INTENSITY_FAR_TYPE] = LightSlot::new(
        base.intensity.x,
        base.intensity.y,
        base.far_plane,
        shadow.shadow_type.as_u32() as f32,
    );
    slots[VOLUMETRIC_PCF] = LightSlot::new(
        shadow.volumetric_steps as f32,
        shadow.volumetric_scattering,
        shadow.pcf_filter_size,
        shadow.pcf_sample_count as f32,
    );
    slots[SHADOW_OFFSETS] = LightSlot::new(
        shadow.raw_offsets.x,
        shadow.raw_offsets.y,
        shadow.pcf_offsets.x,
        shadow.pcf_offsets.y,
    );
    slots[VSM] = LightSlot::new(
        shadow.vsm_min_variance,
        shadow.vsm_light_bleeding_reduction,
        0.0,
        0.0,
    );
    slots
}

fn write_matrix(slots: &mut [LightSlot], first: usize, matrix: &Mat4) {
    for (slot, col) in slots[first..first + MATRIX_SLOTS].iter_mut().zip(matrix.cols) {
        *slot = col.into();
    }
}

fn with_base(base: &host::LightBase) -> [LightSlot; MAX_LIGHT_COMPONENTS] {
    let mut slots = [LightSlot::default(); MAX_LIGHT_COMPONENTS];
    slots[..BASE_LIGHT_COMPONENTS].copy_from_slice(&encode_base(base));
    slots
}

/// Packs a directional light.
pub fn encode_directional(light: &host::DirectionalLight) -> [LightSlot; MAX_LIGHT_COMPONENTS] {
    let mut slots = with_base(&light.base);
    let d = light.direction;
    slots[DIRECTION_CASCADES] =
        LightSlot::new(d.x, d.y, d.z, light.clamped_cascade_count() as f32);
    let mut depths = [0.0; 4 * SPLIT_DEPTH_SLOTS];
    depths[..light.split_depths.len()].copy_from_slice(&light.split_depths);
    slots[SPLIT_DEPTHS] = LightSlot::new(depths[0], depths[1], depths[2], depths[3]);
    slots[SPLIT_DEPTHS + 1] = LightSlot::new(depths[4], depths[5], depths[6], depths[7]);
    slots[SPLIT_SCALES] = LightSlot(light.split_scales);
    for (cascade, transform) in light.transforms.iter().enumerate() {
        write_matrix(&mut slots, CASCADE_TRANSFORMS + cascade * MATRIX_SLOTS, transform);
    }
    slots
}

/// Packs a point light.
pub fn encode_point(light: &host::PointLight) -> [LightSlot; MAX_LIGHT_COMPONENTS] {
    let mut slots = with_base(&light.base);
    slots[POSITION] = light.position.extend(0.0).into();
    slots[ATTENUATION] = light.attenuation.to_vec3().extend(0.0).into();
    slots
}

/// Packs a spot light.
pub fn encode_spot(light: &host::SpotLight) -> [LightSlot; MAX_LIGHT_COMPONENTS] {
    let mut slots = with_base(&light.base);
    slots[POSITION] = light.position.extend(0.0).into();
    slots[ATTENUATION] = light.attenuation.to_vec3().extend(0.0).into();
    slots[SPOT_DIRECTION_EXPONENT] = light.direction.extend(light.exponent).into();
    slots[SPOT_CUTOFFS] = LightSlot::new(
        light.inner_cutoff(),
        light.outer_cutoff(),
        light.cutoff_diff_reciprocal(),
        0.0,
    );
    write_matrix(&mut slots, SPOT_TRANSFORM, &light.transform);
    slots
}

/// Collects the lights of a frame and packs them in buffer order.
///
/// # Examples
///
/// ```
/// use khora_core::renderer::light::{LightType, PointLight, SpotLight};
/// use khora_shading::lights::{LightBufferWriter, LightKind, MAX_LIGHT_COMPONENTS};
///
/// let mut writer = LightBufferWriter::new();
/// writer.push(LightType::Spot(SpotLight::default()));
/// writer.push(LightType::Point(PointLight::default()));
/// let buffer = writer.build();
/// assert_eq!(buffer.counts().point, 1);
/// // Point lights precede spot lights whatever the push order.
/// assert_eq!(buffer.offset(LightKind::Spot, 0), Some(MAX_LIGHT_COMPONENTS as u32));
/// ```
#[derive(Debug, Clone, Default)]
pub struct LightBufferWriter {
    directional: Vec<host::DirectionalLight>,
    point: Vec<host::PointLight>,
    spot: Vec<host::SpotLight>,
}

impl LightBufferWriter {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a light.
    pub fn push(&mut self, light: host::LightType) {
        match light {
            host::LightType::Directional(light) => self.directional.push(light),
            host::LightType::Point(light) => self.point.push(light),
            host::LightType::Spot(light) => self.spot.push(light),
        }
    }

    /// Number of lights added so far.
    pub fn len(&self) -> usize {
        self.directional.len() + self.point.len() + self.spot.len()
    }

    /// Returns `true` if no light was added.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Packs every light: directional, then point, then spot.
    pub fn build(&self) -> LightBuffer {
        let counts = LightCounts {
            directional: self.directional.len() as u32,
            point: self.point.len() as u32,
            spot: self.spot.len() as u32,
            _padding: 0,
        };
        let mut slots = Vec::with_capacity(counts.total() as usize * MAX_LIGHT_COMPONENTS);
        for light in &self.directional {
            slots.extend_from_slice(&encode_directional(light));
        }
        for light in &self.point {
            slots.extend_from_slice(&encode_point(light));
        }
        for light in &self.spot {
            slots.extend_from_slice(&encode_spot(light));
        }
        log::debug!(
            "LightBuffer: packed {} directional, {} point and {} spot light(s) into {} slots",
            counts.directional,
            counts.point,
            counts.spot,
            slots.len()
        );
        LightBuffer { slots, counts }
    }
}

/// A packed light buffer with its counts.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LightBuffer {
    slots: Vec<LightSlot>,
    counts: LightCounts,
}

impl LightBuffer {
    /// The packed slots.
    pub fn slots(&self) -> &[LightSlot] {
        &self.slots
    }

    /// The packed slots as bytes, ready for upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.slots)
    }

    /// The light counts.
    pub fn counts(&self) -> LightCounts {
        self.counts
    }

    /// Slot offset of the `index`-th light of a kind, `None` when out of range.
    pub fn offset(&self, kind: LightKind, index: u32) -> Option<u32> {
        let c = &self.counts;
        let (first, count) = match kind {
            LightKind::Directional | LightKind::TiledDirectional => (0, c.directional),
            LightKind::Point => (c.directional, c.point),
            LightKind::Spot => (c.directional + c.point, c.spot),
        };
        (index < count).then(|| (first + index) * MAX_LIGHT_COMPONENTS as u32)
    }

    /// Binds the buffer and its counts as the `c3d_lights` and `c3d_lightCounts` globals.
    pub fn bind(&self, interpreter: &mut Interpreter<'_>) {
        let slots: Vec<[f32; 4]> = self.slots.iter().map(|s| s.0).collect();
        interpreter.bind_global(LIGHTS_BUFFER, Value::from_slots(&slots));
        interpreter.bind_global(LIGHT_COUNTS_BUFFER, self.counts.to_value());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use khora_core::math::{LinearRgba, Vec2, Vec3};
    use khora_core::renderer::light::{DirectionalLight, LightType, PointLight, ShadowType};

    #[test]
    fn test_base_slots() {
        let mut base = host::LightBase {
            color: LinearRgba::rgb(1.0, 0.5, 0.25),
            intensity: Vec2::new(2.0, 3.0),
            far_plane: 100.0,
            ..Default::default()
        };
        base.shadow.shadow_type = ShadowType::Pcf;
        base.shadow.map_index = -1;
        base.shadow.pcf_sample_count = 16;
        let slots = encode_base(&base);
        assert_eq!(slots[COLOUR_SHADOW_INDEX].0, [1.0, 0.5, 0.25, -1.0]);
        assert_eq!(slots[INTENSITY_FAR_TYPE].0, [2.0, 3.0, 100.0, 2.0]);
        assert_eq!(slots[VOLUMETRIC_PCF].0[3], 16.0);
    }

    #[test]
    fn test_directional_cascade_count_clamped() {
        let light = DirectionalLight {
            cascade_count: 9,
            split_depths: [0.1, 2.0, 8.0, 24.0, 1000.0],
            ..Default::default()
        };
        let slots = encode_directional(&light);
        assert_eq!(slots[DIRECTION_CASCADES].0[3], 4.0);
        assert_eq!(slots[SPLIT_DEPTHS].0, [0.1, 2.0, 8.0, 24.0]);
        assert_eq!(slots[SPLIT_DEPTHS + 1].0, [1000.0, 0.0, 0.0, 0.0]);
        assert_eq!(slots[CASCADE_TRANSFORMS].0, [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(slots[CASCADE_TRANSFORMS + 3].0, [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_buffer_orders_by_type() {
        let mut writer = LightBufferWriter::new();
        writer.push(LightType::Point(PointLight {
            position: Vec3::new(1.0, 2.0, 3.0),
            ..Default::default()
        }));
        writer.push(LightType::Directional(DirectionalLight::default()));
        let buffer = writer.build();
        assert_eq!(buffer.slots().len(), 2 * MAX_LIGHT_COMPONENTS);
        assert_eq!(buffer.offset(LightKind::Directional, 0), Some(0));
        assert_eq!(buffer.offset(LightKind::Point, 0), Some(25));
        assert_eq!(buffer.offset(LightKind::Point, 1), None);
        assert_eq!(buffer.offset(LightKind::Spot, 0), None);
        assert_eq!(buffer.slots()[25 + POSITION].0, [1.0, 2.0, 3.0, 0.0]);
        assert_eq!(buffer.as_bytes().len(), 2 * MAX_LIGHT_COMPONENTS * 16);
    }
}
