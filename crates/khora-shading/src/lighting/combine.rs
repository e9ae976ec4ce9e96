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

//! Final compositing of the accumulated direct lighting with the indirect
//! terms, and the light loop entry point.

use khora_core::math::Vec3;

use super::{Components, LightKind};
use crate::ast::{clamp, dot, max, mix, normalize, select, var, Expr, Param, StructDecl, Type};
use crate::brdf::CookTorranceBrdf;
use crate::eval::Value;
use crate::lights::LightRecords;
use crate::material::{LightMaterial, MaterialModel};
use crate::output::OutputComponents;
use crate::surface::Surface;
use crate::{FunctionHandle, ShaderWriter, ShadingError};

/// Name of the indirect lighting struct.
pub const INDIRECT_LIGHTING: &str = "IndirectLighting";

/// Indirect (ambient and image based) light reaching the fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct IndirectLighting {
    expr: Expr,
}

impl IndirectLighting {
    /// Declares the struct.
    pub fn declare(writer: &mut ShaderWriter) -> Type {
        writer.declare_struct(StructDecl::new(
            INDIRECT_LIGHTING,
            vec![
                ("ambient", Type::Vec3),
                ("diffuse", Type::Vec3),
                ("specular", Type::Vec3),
                ("indirectAmbient", Type::Vec3),
                ("reflected", Type::Vec3),
                ("refracted", Type::Vec3),
            ],
        ))
    }

    /// The struct type.
    pub fn ty() -> Type {
        Type::named(INDIRECT_LIGHTING)
    }

    /// Wraps a value of the struct type.
    pub fn new(expr: Expr) -> Self {
        Self { expr }
    }

    /// The wrapped expression.
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Scene ambient colour.
    pub fn ambient(&self) -> Expr {
        self.expr.field("ambient")
    }

    /// Irradiance from the environment.
    pub fn diffuse(&self) -> Expr {
        self.expr.field("diffuse")
    }

    /// Prefiltered environment radiance.
    pub fn specular(&self) -> Expr {
        self.expr.field("specular")
    }

    /// Ambient term of the environment, applied to the reflected colour.
    pub fn indirect_ambient(&self) -> Expr {
        self.expr.field("indirectAmbient")
    }

    /// Reflected environment colour.
    pub fn reflected(&self) -> Expr {
        self.expr.field("reflected")
    }

    /// Refracted environment colour, for transmissive materials.
    pub fn refracted(&self) -> Expr {
        self.expr.field("refracted")
    }
}

/// Host-side values of an [`IndirectLighting`], for evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IndirectValues {
    /// Scene ambient colour.
    pub ambient: Vec3,
    /// Irradiance from the environment.
    pub diffuse: Vec3,
    /// Prefiltered environment radiance.
    pub specular: Vec3,
    /// Ambient term of the environment.
    pub indirect_ambient: Vec3,
    /// Reflected environment colour.
    pub reflected: Vec3,
    /// Refracted environment colour.
    pub refracted: Vec3,
}

impl IndirectValues {
    /// Converts to an evaluator value.
    pub fn to_value(&self) -> Value {
        Value::Struct {
            name: INDIRECT_LIGHTING.to_owned(),
            fields: vec![
                ("ambient".to_owned(), self.ambient.into()),
                ("diffuse".to_owned(), self.diffuse.into()),
                ("specular".to_owned(), self.specular.into()),
                ("indirectAmbient".to_owned(), self.indirect_ambient.into()),
                ("reflected".to_owned(), self.reflected.into()),
                ("refracted".to_owned(), self.refracted.into()),
            ],
        }
    }
}

/// `<model>_combine(material, surface, worldEye, components, indirect) -> vec3`
pub(super) fn combine_fn(
    c: &mut Components,
    w: &mut ShaderWriter,
    name: String,
) -> Result<FunctionHandle, ShadingError> {
    let model = c.model;
    let helpers = &mut c.helpers;
    c.functions.get_or_implement(
        w,
        "combine",
        name,
        Type::Vec3,
        vec![
            Param::new("material", model.material_type()),
            Param::new("surface", Surface::ty()),
            Param::new("worldEye", Type::Vec3),
            Param::new("components", OutputComponents::ty()),
            Param::new("indirect", IndirectLighting::ty()),
        ],
        |w| {
            let material = LightMaterial::new(var("material"), model);
            let direct = OutputComponents::new(var("components"));
            let indirect = IndirectLighting::new(var("indirect"));
            let occlusion = w.decl("occlusion", Type::Float, material.occlusion())?;
            if !model.is_pbr() {
                let ambient = (indirect.ambient() + indirect.diffuse()) * &occlusion;
                let lit = w.decl(
                    "lit",
                    Type::Vec3,
                    material.albedo() * (direct.diffuse() + ambient)
                        + direct.specular()
                        + indirect.specular() * &occlusion,
                )?;
                let transmission = material.transmission();
                return w.ret(
                    select(
                        transmission.gt(0.0),
                        mix(&lit, indirect.refracted(), &transmission),
                        &lit,
                    ) + material.emissive()
                        + direct.scattering(),
                );
            }

            let diffuse = w.decl(
                "diffuseBrdf",
                Type::Vec3,
                material.albedo() * (direct.diffuse() + indirect.diffuse() * &occlusion),
            )?;
            let specular = w.decl(
                "specularBrdf",
                Type::Vec3,
                indirect.reflected() * indirect.ambient() * indirect.indirect_ambient() * &occlusion
                    + direct.specular()
                    + indirect.specular() * &occlusion,
            )?;
            let transmission = material.transmission();
            w.if_(transmission.gt(0.0), |w| {
                w.assign(&diffuse, mix(&diffuse, indirect.refracted(), &transmission))
            })?;
            let result = w.decl(
                "result",
                Type::Vec3,
                mix(&specular + &diffuse, &specular, material.metalness()),
            )?;

            let sheen_factor = material.sheen_factor()?;
            let has_sheen = max(max(sheen_factor.x(), sheen_factor.y()), sheen_factor.z()).gt(0.0);
            w.if_(has_sheen, |w| {
                w.add_assign(&result, &sheen_factor * direct.sheen().x())
            })?;

            let clearcoat = material.clearcoat_factor()?;
            w.if_(clearcoat.gt(0.0), |w| {
                let surface = Surface::new(var("surface"));
                let n = normalize(surface.clearcoat_normal());
                let v = normalize(var("worldEye") - surface.world_position());
                let ndot_v = w.decl("clearcoatNdotV", Type::Float, clamp(dot(n, v), 0.0001, 1.0))?;
                let fresnel = CookTorranceBrdf::clearcoat_fresnel(w, helpers, ndot_v)?;
                let fresnel = w.decl("Fc", Type::Vec3, fresnel)?;
                let coating = direct.coating_specular() * &clearcoat;
                w.assign(&result, &result * (1.0 - &clearcoat * &fresnel) + coating)
            })?;
            w.ret(&result + material.emissive() + direct.scattering())
        },
    )
}

/// The light functions and decoders the light loop calls.
pub(super) struct LightLoop {
    pub(super) directional_kind: LightKind,
    pub(super) directional: FunctionHandle,
    pub(super) point: FunctionHandle,
    pub(super) spot: FunctionHandle,
    pub(super) combine: FunctionHandle,
}

/// `<model>_computeLighting(material, surface, worldEye, receivesShadows, indirect) -> vec3`
///
/// Loops over the packed lights using the `c3d_lightCounts` uniform, then
/// composites with the indirect terms.
pub(super) fn light_loop_params(model: MaterialModel) -> Vec<Param> {
    vec![
        Param::new("material", model.material_type()),
        Param::new("surface", Surface::ty()),
        Param::new("worldEye", Type::Vec3),
        Param::new("receivesShadows", Type::UInt),
        Param::new("indirect", IndirectLighting::ty()),
    ]
}

/// Writes the light loop body.
pub(super) fn write_light_loop(
    records: &mut LightRecords,
    functions: &LightLoop,
    w: &mut ShaderWriter,
) -> Result<(), ShadingError> {
    let output = OutputComponents::local(w, "lighting")?;
    let counts = LightRecords::counts();
    let lights = [
        (functions.directional_kind, &functions.directional, "directional"),
        (LightKind::Point, &functions.point, "point"),
        (LightKind::Spot, &functions.spot, "spot"),
    ];
    for (kind, handle, count) in lights {
        w.for_range("i", 0u32, counts.field(count), |w, i| {
            let light = records.decode(w, kind, LightRecords::offset(kind, i))?;
            w.call(handle.call([
                light,
                var("material"),
                var("surface"),
                var("worldEye"),
                var("receivesShadows"),
                output.expr().clone(),
            ]))
        })?;
    }
    w.ret(functions.combine.call([
        var("material"),
        var("surface"),
        var("worldEye"),
        output.expr().clone(),
        var("indirect"),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::Interpreter;
    use crate::material::MaterialValues;
    use crate::output::OutputValues;
    use crate::surface::SurfaceData;
    use crate::{LightingModel, ShadingSettings};
    use approx::assert_relative_eq;

    fn combined(
        model: MaterialModel,
        material: MaterialValues,
        direct: OutputValues,
        indirect: IndirectValues,
    ) -> Vec3 {
        let mut writer = ShaderWriter::new();
        let mut lighting = LightingModel::new(ShadingSettings {
            material_model: model,
            ..Default::default()
        })
        .unwrap();
        let handle = lighting.combine_fn(&mut writer).unwrap();
        let module = writer.finish();
        let mut interpreter = Interpreter::new(&module).unwrap();
        interpreter
            .call(
                handle.name(),
                vec![
                    material.to_value(model),
                    SurfaceData::default().to_value(),
                    Vec3::new(0.0, 0.0, 5.0).into(),
                    direct.to_value(),
                    indirect.to_value(),
                ],
            )
            .unwrap()
            .result
            .as_vec3()
            .unwrap()
    }

    fn direct() -> OutputValues {
        OutputValues {
            diffuse: Vec3::new(0.5, 0.5, 0.5),
            specular: Vec3::new(0.1, 0.1, 0.1),
            scattering: Vec3::new(0.01, 0.02, 0.03),
            ..Default::default()
        }
    }

    #[test]
    fn test_dielectric_combination() {
        let material = MaterialValues {
            albedo: Vec3::new(1.0, 0.5, 0.25),
            occlusion: 1.0,
            ..Default::default()
        };
        let indirect = IndirectValues {
            diffuse: Vec3::new(0.2, 0.2, 0.2),
            ..Default::default()
        };
        let result = combined(MaterialModel::PbrMR, material, direct(), indirect);
        // albedo * (0.5 + 0.2) + 0.1 + scattering
        assert_relative_eq!(result.x, 0.7 + 0.1 + 0.01, epsilon = 1e-5);
        assert_relative_eq!(result.y, 0.35 + 0.1 + 0.02, epsilon = 1e-5);
        assert_relative_eq!(result.z, 0.175 + 0.1 + 0.03, epsilon = 1e-5);
    }

    #[test]
    fn test_metal_drops_diffuse() {
        let material = MaterialValues {
            metalness: 1.0,
            occlusion: 1.0,
            ..Default::default()
        };
        let result = combined(MaterialModel::PbrMR, material, direct(), IndirectValues::default());
        assert_relative_eq!(result.x, 0.1 + 0.01, epsilon = 1e-5);
    }

    #[test]
    fn test_phong_transmission_mixes_refraction() {
        let material = MaterialValues {
            albedo: Vec3::ONE,
            transmission: 0.5,
            occlusion: 1.0,
            ..Default::default()
        };
        let indirect = IndirectValues {
            refracted: Vec3::new(1.0, 1.0, 1.0),
            ..Default::default()
        };
        let result = combined(MaterialModel::Phong, material, direct(), indirect);
        // mix(0.5 + 0.1, 1, 0.5) + scattering
        assert_relative_eq!(result.x, 0.8 + 0.01, epsilon = 1e-5);
    }

    #[test]
    fn test_clearcoat_attenuates_base() {
        let base = MaterialValues {
            albedo: Vec3::ONE,
            occlusion: 1.0,
            ..Default::default()
        };
        let coated = MaterialValues {
            clearcoat_factor: 1.0,
            ..base
        };
        let plain = combined(MaterialModel::PbrMR, base, direct(), IndirectValues::default());
        let with_coat = combined(MaterialModel::PbrMR, coated, direct(), IndirectValues::default());
        assert!(with_coat.x < plain.x);
        // Normal incidence: the coat reflects 4 %.
        assert_relative_eq!(with_coat.x - 0.01, (plain.x - 0.01) * 0.96, epsilon = 1e-4);
    }
}
