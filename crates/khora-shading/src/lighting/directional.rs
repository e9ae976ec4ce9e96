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

//! Directional lights: cascade selection, cascaded shadows and volumetric
//! in-scattering.

use super::{shadow_factor, Components, LightFunctionKey, LightSample, Response};
use crate::ast::{clamp, select, var, vec3, vec3_splat, Expr, Param, Type};
use crate::lights::{DirectionalLight, Light, LightKind, LIGHT};
use crate::material::LightMaterial;
use crate::shadow::sampling_strategy;
use crate::surface::{LightSurface, Surface};
use crate::{FunctionHandle, ShaderWriter, ShadingError, ShadingSettings};

/// Fraction of a cascade's depth range, at its near end, over which it is
/// blended with the previous cascade.
pub const CASCADE_BLEND_DIVISOR: f32 = 16.0;

/// `getCascadeFactors(depth, splitDepths, index) -> vec3`
///
/// Returns `(index + 1, blendCurrent, blendPrevious)` when `depth` falls in
/// cascade `index`, `vec3(0)` otherwise.
pub(super) fn cascade_factors_fn(
    c: &mut Components,
    w: &mut ShaderWriter,
    name: String,
) -> Result<FunctionHandle, ShadingError> {
    c.functions.get_or_implement(
        w,
        "getCascadeFactors",
        name,
        Type::Vec3,
        vec![
            Param::new("depth", Type::Float),
            Param::new("splitDepths", Type::array(Type::Vec4, 2)),
            Param::new("index", Type::UInt),
        ],
        |w| {
            let splits = w.decl("splits", Type::array(Type::Vec4, 2), var("splitDepths"))?;
            let index = var("index");
            let split = |k: Expr| splits.at(&k / 4u32).at(k % 4u32);
            let depth = var("depth");
            let current = w.decl("current", Type::Float, split(index.clone()))?;
            let next = w.decl("next", Type::Float, split(&index + 1u32))?;
            let in_range = depth.ge(&current).and(depth.lt(&next));
            w.if_(in_range, |w| {
                let cascade = (&index + 1u32).cast(Type::Float);
                let margin =
                    w.decl("margin", Type::Float, (&next - &current) / CASCADE_BLEND_DIVISOR)?;
                w.if_(index.gt(0u32).and(depth.lt(&current + &margin)), |w| {
                    let blend = w.decl("blend", Type::Float, (&depth - &current) / &margin)?;
                    w.ret(vec3(cascade.clone(), &blend, 1.0 - &blend))
                })?;
                w.ret(vec3(cascade, 1.0, 0.0))
            })?;
            w.ret(vec3_splat(0.0))
        },
    )
}

/// Writes the body of a directional light function.
pub(super) fn write(
    c: &mut Components,
    settings: &ShadingSettings,
    key: LightFunctionKey,
    w: &mut ShaderWriter,
) -> Result<(), ShadingError> {
    let light = DirectionalLight::new(var("light"));
    let base = light.base();
    let material = LightMaterial::new(var("material"), c.model);
    let surface = Surface::new(var("surface"));
    let receives = var("receivesShadows");

    let response = Response::new(w, key.pass)?;
    let ls = LightSurface::directional(w, &surface, &var("worldEye"), light.direction())?;
    let radiance = base.colour();
    let intensity = base.intensity();
    let sample = LightSample {
        surface: &surface,
        light: &ls,
        material: &material,
        radiance: &radiance,
        intensity: &intensity,
    };
    response.evaluate(c, w, &sample)?;

    if !key.shadows {
        return response.finish(w);
    }
    let factors_fn = cascade_factors_fn(c, w, settings.function_name("getCascadeFactors"))?;
    let strategy = sampling_strategy(key.kind == LightKind::TiledDirectional);
    let factor = w.decl("shadowFactor", Type::Float, 1.0)?;
    w.if_(base.has_shadow_map(), |w| {
        let count = w.decl(
            "cascadeCount",
            Type::UInt,
            clamp(light.cascade_count(), 1u32, settings.cascade_count()),
        )?;
        let splits = w.decl("splitDepths", Type::array(Type::Vec4, 2), light.split_depths())?;
        let transforms =
            w.decl("cascadeTransforms", Type::array(Type::Mat4, 4), light.transforms())?;
        let scales = w.decl("splitScales", Type::Vec4, light.split_scales())?;
        let depth = w.decl("depth", Type::Float, surface.depth())?;

        // Closer than the first split uses the first cascade, beyond the
        // last one the last cascade.
        let factors = w.decl(
            "cascadeFactors",
            Type::Vec3,
            select(
                depth.lt(splits.at(0u32).x()),
                vec3(1.0, 1.0, 0.0),
                vec3(count.cast(Type::Float), 1.0, 0.0),
            ),
        )?;
        w.for_range("cascade", 0u32, &count, |w, i| {
            let found = w.decl(
                "factors",
                Type::Vec3,
                factors_fn.call([depth.clone(), splits.clone(), i]),
            )?;
            w.if_(found.x().not_equals(0.0), |w| {
                w.assign(&factors, &found)?;
                w.break_()
            })
        })?;

        let cascade = w.decl("cascadeIndex", Type::UInt, factors.x().cast(Type::UInt) - 1u32)?;
        w.if_(receives.not_equals(0u32), |w| {
            let shadow_light = Light::new(w.decl("shadowLight", Type::named(LIGHT), base.expr())?);
            w.assign(
                &shadow_light.pcf_filter_size(),
                base.pcf_filter_size() * scales.at(&cascade),
            )?;
            let current = c.shadows.compute_directional(
                w,
                strategy,
                &shadow_light,
                &ls,
                &transforms.at(&cascade),
                &cascade,
                &count,
            )?;
            let shadow = w.decl("shadow", Type::Float, factors.y() * current)?;
            w.if_(factors.z().gt(0.0), |w| {
                let previous = w.decl("previousCascade", Type::UInt, &cascade - 1u32)?;
                w.assign(
                    &shadow_light.pcf_filter_size(),
                    base.pcf_filter_size() * scales.at(&previous),
                )?;
                let blended = c.shadows.compute_directional(
                    w,
                    strategy,
                    &shadow_light,
                    &ls,
                    &transforms.at(&previous),
                    &previous,
                    &count,
                )?;
                w.add_assign(&shadow, factors.z() * blended)
            })?;
            w.assign(&factor, shadow_factor(shadow))
        })?;

        // In-scattering does not depend on the fragment receiving shadows.
        if key.volumetric {
            w.if_(base.volumetric_steps().gt(0u32), |w| {
                let volumetric = c.shadows.compute_volumetric(
                    w,
                    strategy,
                    &base,
                    &ls,
                    &transforms.at(&cascade),
                    &cascade,
                    &count,
                )?;
                response.set_scattering(w, volumetric * &radiance * intensity.x())
            })?;
        }
        Ok(())
    })?;
    response.scale(w, &factor)?;
    response.finish(w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::{Interpreter, Value};
    use crate::lighting::LightingPass;
    use crate::shadow::cascades::split_depths;
    use crate::LightingModel;
    use approx::assert_relative_eq;
    use khora_core::math::Vec4;

    fn factors_module() -> crate::ast::ShaderModule {
        let mut writer = ShaderWriter::new();
        let mut lighting = LightingModel::new(ShadingSettings::default()).unwrap();
        cascade_factors_fn(&mut lighting.components, &mut writer, "getCascadeFactors".to_owned())
            .unwrap();
        writer.finish()
    }

    fn splits(values: [f32; 5]) -> Value {
        Value::Array(vec![
            Vec4::new(values[0], values[1], values[2], values[3]).into(),
            Vec4::new(values[4], values[4], values[4], values[4]).into(),
        ])
    }

    fn factors(
        module: &crate::ast::ShaderModule,
        depth: f32,
        splits: &Value,
        index: u32,
    ) -> [f32; 3] {
        let mut interpreter = Interpreter::new(module).unwrap();
        let result = interpreter
            .call("getCascadeFactors", vec![depth.into(), splits.clone(), index.into()])
            .unwrap()
            .result;
        let v = result.as_vec3().unwrap();
        [v.x, v.y, v.z]
    }

    #[test]
    fn test_cascade_factors() {
        let module = factors_module();
        let splits = splits([2.0, 8.0, 24.0, 1000.0, 1000.0]);
        assert_eq!(factors(&module, 5.0, &splits, 0), [1.0, 1.0, 0.0]);
        assert_eq!(factors(&module, 5.0, &splits, 1), [0.0, 0.0, 0.0]);

        // One unit into the second cascade, whose blend margin is 16 / 16.
        let blended = factors(&module, 8.5, &splits, 1);
        assert_relative_eq!(blended[0], 2.0);
        assert_relative_eq!(blended[1], 0.5, epsilon = 1e-5);
        assert_relative_eq!(blended[2], 0.5, epsilon = 1e-5);

        // The first cascade never blends.
        assert_eq!(factors(&module, 2.01, &splits, 0), [1.0, 1.0, 0.0]);
        assert_eq!(factors(&module, 500.0, &splits, 2), [3.0, 1.0, 0.0]);
    }

    #[test]
    fn test_cascade_factors_match_host_splits() {
        let module = factors_module();
        let host = split_depths(0.1, 100.0, 3, 0.75);
        let values = splits(host);
        for cascade in 0..3u32 {
            let near = host[cascade as usize];
            let far = host[cascade as usize + 1];
            let middle = near + (far - near) * 0.5;
            let selected = (0..3u32)
                .map(|i| factors(&module, middle, &values, i))
                .find(|f| f[0] != 0.0)
                .unwrap();
            assert_eq!(selected, [cascade as f32 + 1.0, 1.0, 0.0]);
        }
    }

    #[test]
    fn test_unshadowed_function_skips_cascades() {
        let mut writer = ShaderWriter::new();
        let mut lighting = LightingModel::new(ShadingSettings {
            shadows: false,
            ..Default::default()
        })
        .unwrap();
        lighting
            .light_function(&mut writer, LightKind::Directional, LightingPass::Full)
            .unwrap();
        let module = writer.finish();
        assert!(module.function("c3d_pbrmr_computeDirectional").is_some());
        assert!(module.function("c3d_computeDirectionalShadow").is_none());
    }
}
