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

//! Lowering of the host material records to `LightMaterial` values.

use khora_core::math::Vec3;
use khora_core::renderer::material::{
    metalness_from_specular, roughness_from_glossiness, roughness_from_shininess,
    PbrMRMaterial, PbrSGMaterial, PhongMaterial, DIELECTRIC_F0,
};

use super::{
    MaterialModel, ALBEDO, CLEARCOAT_FACTOR, CLEARCOAT_ROUGHNESS, EMISSIVE, F0, METALNESS,
    OCCLUSION, OPACITY, ROUGHNESS, SHEEN_FACTOR, SHEEN_ROUGHNESS, SPECULAR, TRANSMISSION,
};
use crate::eval::Value;

/// Canonical material values, the host mirror of a `LightMaterial`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialValues {
    /// Base colour.
    pub albedo: Vec3,
    /// Specular colour.
    pub specular: Vec3,
    /// Reflectance at normal incidence.
    pub f0: Vec3,
    /// Roughness.
    pub roughness: f32,
    /// Metalness.
    pub metalness: f32,
    /// Emissive colour.
    pub emissive: Vec3,
    /// Transmission.
    pub transmission: f32,
    /// Opacity.
    pub opacity: f32,
    /// Ambient occlusion, `1` is unoccluded.
    pub occlusion: f32,
    /// Clearcoat strength.
    pub clearcoat_factor: f32,
    /// Clearcoat roughness.
    pub clearcoat_roughness: f32,
    /// Sheen colour.
    pub sheen_factor: Vec3,
    /// Sheen roughness.
    pub sheen_roughness: f32,
}

impl Default for MaterialValues {
    fn default() -> Self {
        MaterialRecord::PbrMR(PbrMRMaterial::default()).values()
    }
}

impl MaterialValues {
    /// Converts to an evaluator value of `model`'s material struct.
    pub fn to_value(&self, model: MaterialModel) -> Value {
        let mut fields: Vec<(String, Value)> = vec![
            (ALBEDO.into(), self.albedo.into()),
            (SPECULAR.into(), self.specular.into()),
            (F0.into(), self.f0.into()),
            (ROUGHNESS.into(), self.roughness.into()),
            (METALNESS.into(), self.metalness.into()),
            (EMISSIVE.into(), self.emissive.into()),
            (TRANSMISSION.into(), self.transmission.into()),
            (OPACITY.into(), self.opacity.into()),
            (OCCLUSION.into(), self.occlusion.into()),
        ];
        if model.is_pbr() {
            fields.extend([
                (CLEARCOAT_FACTOR.into(), self.clearcoat_factor.into()),
                (CLEARCOAT_ROUGHNESS.into(), self.clearcoat_roughness.into()),
                (SHEEN_FACTOR.into(), self.sheen_factor.into()),
                (SHEEN_ROUGHNESS.into(), self.sheen_roughness.into()),
            ]);
        }
        Value::Struct {
            name: model.struct_name().to_owned(),
            fields,
        }
    }

    /// Reads an evaluated material back. PBR-only members default to zero on Phong.
    pub fn from_value(value: &Value) -> Option<Self> {
        let scalar = |name: &str| value.field(name).and_then(Value::as_f32);
        let vector = |name: &str| value.field(name).and_then(Value::as_vec3);
        Some(Self {
            albedo: vector(ALBEDO)?,
            specular: vector(SPECULAR)?,
            f0: vector(F0)?,
            roughness: scalar(ROUGHNESS)?,
            metalness: scalar(METALNESS)?,
            emissive: vector(EMISSIVE)?,
            transmission: scalar(TRANSMISSION)?,
            opacity: scalar(OPACITY)?,
            occlusion: scalar(OCCLUSION)?,
            clearcoat_factor: scalar(CLEARCOAT_FACTOR).unwrap_or(0.0),
            clearcoat_roughness: scalar(CLEARCOAT_ROUGHNESS).unwrap_or(0.0),
            sheen_factor: vector(SHEEN_FACTOR).unwrap_or(Vec3::ZERO),
            sheen_roughness: scalar(SHEEN_ROUGHNESS).unwrap_or(0.0),
        })
    }
}

/// A host material record of any model.
///
/// ```
/// use khora_core::renderer::material::PbrSGMaterial;
/// use khora_shading::material::MaterialRecord;
///
/// let record = MaterialRecord::PbrSG(PbrSGMaterial { glossiness: 0.75, ..Default::default() });
/// assert_eq!(record.values().roughness, 0.25);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaterialRecord {
    /// Phong material.
    Phong(PhongMaterial),
    /// Metallic-roughness material.
    PbrMR(PbrMRMaterial),
    /// Specular-glossiness material.
    PbrSG(PbrSGMaterial),
}

impl MaterialRecord {
    /// The model of this record.
    pub fn model(&self) -> MaterialModel {
        match self {
            MaterialRecord::Phong(_) => MaterialModel::Phong,
            MaterialRecord::PbrMR(_) => MaterialModel::PbrMR,
            MaterialRecord::PbrSG(_) => MaterialModel::PbrSG,
        }
    }

    /// Lowers the record to canonical values.
    pub fn values(&self) -> MaterialValues {
        match self {
            MaterialRecord::Phong(m) => MaterialValues {
                albedo: m.diffuse.to_vec3(),
                specular: m.specular.to_vec3(),
                f0: m.specular.to_vec3(),
                roughness: roughness_from_shininess(m.shininess),
                metalness: 0.0,
                emissive: m.emissive.to_vec3(),
                transmission: m.transmission,
                opacity: m.opacity,
                occlusion: 1.0,
                clearcoat_factor: 0.0,
                clearcoat_roughness: 0.0,
                sheen_factor: Vec3::ZERO,
                sheen_roughness: 0.0,
            },
            MaterialRecord::PbrMR(m) => {
                let f0 = Vec3::lerp(Vec3::splat(DIELECTRIC_F0), m.albedo.to_vec3(), m.metalness);
                MaterialValues {
                    albedo: m.albedo.to_vec3(),
                    specular: f0,
                    f0,
                    roughness: m.roughness.clamp(0.0, 1.0),
                    metalness: m.metalness.clamp(0.0, 1.0),
                    emissive: m.emissive.to_vec3(),
                    transmission: m.transmission,
                    opacity: m.opacity,
                    occlusion: 1.0,
                    clearcoat_factor: m.clearcoat.factor,
                    clearcoat_roughness: m.clearcoat.roughness,
                    sheen_factor: m.sheen.color.to_vec3(),
                    sheen_roughness: m.sheen.roughness,
                }
            }
            MaterialRecord::PbrSG(m) => MaterialValues {
                albedo: m.diffuse.to_vec3(),
                specular: m.specular.to_vec3(),
                f0: m.specular.to_vec3(),
                roughness: roughness_from_glossiness(m.glossiness),
                metalness: metalness_from_specular(m.specular, m.diffuse),
                emissive: m.emissive.to_vec3(),
                transmission: m.transmission,
                opacity: m.opacity,
                occlusion: 1.0,
                clearcoat_factor: m.clearcoat.factor,
                clearcoat_roughness: m.clearcoat.roughness,
                sheen_factor: m.sheen.color.to_vec3(),
                sheen_roughness: m.sheen.roughness,
            },
        }
    }

    /// The evaluator value of the record's `LightMaterial`.
    pub fn to_value(&self) -> Value {
        self.values().to_value(self.model())
    }
}
