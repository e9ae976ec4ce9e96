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

//! End-to-end lighting scenarios evaluated on the CPU.

use std::f32::consts::PI;

use anyhow::{anyhow, Result};
use approx::assert_relative_eq;
use khora_core::math::{LinearRgba, Vec2, Vec3};
use khora_core::renderer::light::{
    DirectionalLight, LightBase, LightType, PointLight, ShadowType,
};
use khora_shading::ast::{var, Param, ShaderModule, Type};
use khora_shading::brdf::sheen_albedo_scaling;
use khora_shading::eval::{Interpreter, Value};
use khora_shading::lighting::{IndirectLighting, IndirectValues};
use khora_shading::lights::LightBufferWriter;
use khora_shading::material::{LightMaterial, MaterialValues};
use khora_shading::output::{OutputComponents, OutputValues};
use khora_shading::surface::{Surface, SurfaceData};
use khora_shading::{LightKind, LightingModel, MaterialModel, ShaderWriter, ShadingSettings};

/// A fragment lit by a list of lights.
struct Scene {
    settings: ShadingSettings,
    lights: Vec<LightType>,
    surface: SurfaceData,
    material: MaterialValues,
    eye: Vec3,
    receives_shadows: u32,
    stored_depth: f32,
}

impl Scene {
    fn new(lights: Vec<LightType>) -> Self {
        Self {
            settings: ShadingSettings::default(),
            lights,
            surface: SurfaceData::default(),
            material: MaterialValues::default(),
            eye: Vec3::new(0.0, 0.0, 5.0),
            receives_shadows: 1,
            stored_depth: 1.0,
        }
    }

    fn model(&self) -> MaterialModel {
        self.settings.material_model
    }

    fn params(&self) -> Vec<Param> {
        vec![
            Param::new("material", self.model().material_type()),
            Param::new("surface", Surface::ty()),
            Param::new("worldEye", Type::Vec3),
            Param::new("receivesShadows", Type::UInt),
        ]
    }

    fn run(&self, module: &ShaderModule, extra: Vec<Value>) -> Result<Value> {
        let mut buffer = LightBufferWriter::new();
        for light in &self.lights {
            buffer.push(*light);
        }
        let stored = self.stored_depth;
        let mut interpreter = Interpreter::new(module)?
            .with_textures(move |_: &str, _: &[f32], _: Option<i32>, _: f32| [stored; 4]);
        buffer.build().bind(&mut interpreter);
        let mut args = vec![
            self.material.to_value(self.model()),
            self.surface.to_value(),
            self.eye.into(),
            self.receives_shadows.into(),
        ];
        args.extend(extra);
        Ok(interpreter.call("entry", args)?.result)
    }

    /// The accumulated direct lighting of the first light.
    fn direct(&self) -> Result<OutputValues> {
        let kind = match self.lights.first() {
            Some(LightType::Point(_)) => LightKind::Point,
            Some(LightType::Spot(_)) => LightKind::Spot,
            _ => LightKind::Directional,
        };
        let mut writer = ShaderWriter::new();
        let mut lighting = LightingModel::new(self.settings.clone())?;
        lighting.declare(&mut writer);
        let model = self.model();
        writer.implement_function("entry", OutputComponents::ty(), self.params(), |w| {
            let output = OutputComponents::local(w, "result")?;
            let light = lighting.light(w, kind, 0u32)?;
            lighting.compute(
                w,
                kind,
                &light,
                &LightMaterial::new(var("material"), model),
                &Surface::new(var("surface")),
                &var("worldEye"),
                &var("receivesShadows"),
                &output,
            )?;
            w.ret(output.expr())
        })?;
        let module = writer.finish();
        let result = self.run(&module, vec![])?;
        OutputValues::from_value(&result)
            .ok_or_else(|| anyhow!("not an OutputComponents: {result:?}"))
    }

    /// The composited colour of every light, without indirect lighting.
    fn combined(&self) -> Result<Vec3> {
        let mut writer = ShaderWriter::new();
        let mut lighting = LightingModel::new(self.settings.clone())?;
        lighting.declare(&mut writer);
        let model = self.model();
        let mut params = self.params();
        params.push(Param::new("indirect", IndirectLighting::ty()));
        writer.implement_function("entry", Type::Vec3, params, |w| {
            let colour = lighting.compute_combined(
                w,
                &LightMaterial::new(var("material"), model),
                &Surface::new(var("surface")),
                &var("worldEye"),
                &var("receivesShadows"),
                &IndirectLighting::new(var("indirect")),
            )?;
            w.ret(colour)
        })?;
        let module = writer.finish();
        let result = self.run(&module, vec![IndirectValues::default().to_value()])?;
        result.as_vec3().ok_or_else(|| anyhow!("not a vec3: {result:?}"))
    }
}

fn sun() -> DirectionalLight {
    DirectionalLight {
        direction: Vec3::new(0.0, 0.0, -1.0),
        ..Default::default()
    }
}

#[test]
fn test_directional_at_normal_incidence() -> Result<()> {
    let mut scene = Scene::new(vec![LightType::Directional(sun())]);
    scene.material.albedo = Vec3::new(0.8, 0.5, 0.2);

    let direct = scene.direct()?;
    // F = F0 when H = N = V.
    assert_relative_eq!(direct.diffuse.x, 0.96 / PI, epsilon = 1e-4);
    assert!(direct.specular.x > 0.0 && direct.specular.x < 0.05);

    let colour = scene.combined()?;
    assert_relative_eq!(colour.x, 0.8 * 0.96 / PI + direct.specular.x, epsilon = 1e-4);
    assert_relative_eq!(colour.z, 0.2 * 0.96 / PI + direct.specular.z, epsilon = 1e-4);
    // Within 5 % of the Lambert term.
    assert!((colour.y - 0.5 / PI).abs() < 0.05 * 0.5 / PI);
    Ok(())
}

#[test]
fn test_directional_at_grazing_view() -> Result<()> {
    let mut scene = Scene::new(vec![LightType::Directional(sun())]);
    scene.material.roughness = 0.5;
    scene.eye = Vec3::new(60f32.to_radians().sin(), 0.0, 60f32.to_radians().cos()) * 10.0;
    let direct = scene.direct()?;
    let f = 0.04 + 0.96 * (1.0 - 30f32.to_radians().cos()).powi(5);
    assert_relative_eq!(direct.diffuse.x, (1.0 - f) / PI, epsilon = 1e-5);
    assert!(direct.specular.x > 0.003 && direct.specular.x < 0.004);
    Ok(())
}

#[test]
fn test_lights_accumulate() -> Result<()> {
    let single = Scene::new(vec![LightType::Directional(sun())]).combined()?;
    let double = Scene::new(vec![LightType::Directional(sun()), LightType::Directional(sun())])
        .combined()?;
    assert_relative_eq!(double.x, 2.0 * single.x, epsilon = 1e-5);
    Ok(())
}

#[test]
fn test_light_colour_and_intensity() -> Result<()> {
    let tinted = DirectionalLight {
        base: LightBase {
            color: LinearRgba::rgb(1.0, 0.0, 0.5),
            intensity: Vec2::new(2.0, 0.0),
            ..Default::default()
        },
        ..sun()
    };
    let direct = Scene::new(vec![LightType::Directional(tinted)]).direct()?;
    assert_relative_eq!(direct.diffuse.x, 2.0 * 0.96 / PI, epsilon = 1e-4);
    assert_eq!(direct.diffuse.y, 0.0);
    assert_relative_eq!(direct.diffuse.z, 0.96 / PI, epsilon = 1e-4);
    assert_eq!(direct.specular, Vec3::ZERO);
    Ok(())
}

#[test]
fn test_shadowed_fragment() -> Result<()> {
    for shadow_type in [ShadowType::Raw, ShadowType::Pcf] {
        let mut light = sun();
        light.base.shadow.shadow_type = shadow_type;
        light.base.shadow.map_index = 0;
        let mut scene = Scene::new(vec![LightType::Directional(light)]);
        // Identity light matrix: the fragment sits at depth 0.5 and the map
        // stores 0.
        scene.surface.world_position = Vec3::new(0.0, 0.0, 0.5);
        scene.stored_depth = 0.0;
        let shadowed = scene.direct()?;
        assert_eq!(shadowed.diffuse, Vec3::ZERO, "{shadow_type:?}");

        scene.receives_shadows = 0;
        let unshadowed = scene.direct()?;
        assert!(unshadowed.diffuse.x > 0.3, "{shadow_type:?}");

        scene.receives_shadows = 1;
        scene.stored_depth = 1.0;
        let lit = scene.direct()?;
        assert_relative_eq!(lit.diffuse.x, unshadowed.diffuse.x, epsilon = 1e-5);
    }
    Ok(())
}

#[test]
fn test_phong_directional() -> Result<()> {
    let mut scene = Scene::new(vec![LightType::Directional(sun())]);
    scene.settings.material_model = MaterialModel::Phong;
    scene.material.albedo = Vec3::new(0.5, 0.5, 0.5);
    let direct = scene.direct()?;
    assert_relative_eq!(direct.diffuse.x, 1.0, epsilon = 1e-5);
    let colour = scene.combined()?;
    assert_relative_eq!(colour.x, 0.5 + direct.specular.x, epsilon = 1e-5);
    Ok(())
}

#[test]
fn test_variance_shadowed_fragment() -> Result<()> {
    let mut light = sun();
    light.base.shadow.shadow_type = ShadowType::Variance;
    light.base.shadow.map_index = 0;
    let mut scene = Scene::new(vec![LightType::Directional(light)]);
    scene.surface.world_position = Vec3::new(0.0, 0.0, 0.5);
    scene.receives_shadows = 0;
    let unshadowed = scene.direct()?;

    // Both moments read 0.25: variance 0.1875 at distance 0.25 gives
    // pMax = 0.75, rescaled by the 0.2 bleeding reduction.
    scene.receives_shadows = 1;
    scene.stored_depth = 0.25;
    let partial = scene.direct()?;
    assert_relative_eq!(partial.diffuse.x, 0.6875 * unshadowed.diffuse.x, max_relative = 1e-4);
    assert_relative_eq!(partial.specular.x, 0.6875 * unshadowed.specular.x, max_relative = 1e-4);

    // Closer than the mean occluder depth is fully lit.
    scene.stored_depth = 0.75;
    let lit = scene.direct()?;
    assert_relative_eq!(lit.diffuse.x, unshadowed.diffuse.x, epsilon = 1e-6);
    Ok(())
}

#[test]
fn test_pcf_point_light() -> Result<()> {
    let mut light = PointLight {
        position: Vec3::new(0.0, 0.0, 3.0),
        ..Default::default()
    };
    light.base.shadow.shadow_type = ShadowType::Pcf;
    light.base.shadow.map_index = 0;
    let mut scene = Scene::new(vec![LightType::Point(light)]);
    scene.receives_shadows = 0;
    let unshadowed = scene.direct()?;
    // Attenuated by 10 at distance 3.
    assert_relative_eq!(unshadowed.diffuse.x, 0.96 / PI / 10.0, max_relative = 1e-4);

    // Every tap of the cube kernel sits behind an occluder at depth 0.
    scene.receives_shadows = 1;
    scene.stored_depth = 0.0;
    let shadowed = scene.direct()?;
    assert_eq!(shadowed.diffuse, Vec3::ZERO);

    scene.stored_depth = 1.0;
    let lit = scene.direct()?;
    assert_relative_eq!(lit.diffuse.x, unshadowed.diffuse.x, epsilon = 1e-6);
    Ok(())
}

#[test]
fn test_volumetric_scattering_ignores_receiving_shadows() -> Result<()> {
    let mut light = sun();
    light.base.shadow.shadow_type = ShadowType::Raw;
    light.base.shadow.map_index = 0;
    light.base.shadow.volumetric_steps = 8;
    light.base.shadow.volumetric_scattering = 0.2;
    let mut scene = Scene::new(vec![LightType::Directional(light)]);
    scene.settings.volumetric = true;
    scene.eye = Vec3::new(0.0, 0.0, 0.9);
    scene.surface.world_position = Vec3::new(0.0, 0.0, 0.1);

    // The view ray runs against the light: Henyey-Greenstein at
    // cos(theta) = -1, every step lit.
    let g: f32 = 0.2;
    let phase = (1.0 - g * g) / (4.0 * PI * (1.0 + g * g + 2.0 * g).powf(1.5));
    for receives_shadows in [0, 1] {
        scene.receives_shadows = receives_shadows;
        let direct = scene.direct()?;
        assert_relative_eq!(direct.scattering.x, phase, max_relative = 1e-4);
        assert_relative_eq!(direct.scattering.z, phase, max_relative = 1e-4);
    }

    // Scattering reaches the composited colour.
    scene.receives_shadows = 0;
    let with = scene.combined()?;
    scene.settings.volumetric = false;
    let without = scene.combined()?;
    assert_relative_eq!(with.x - without.x, phase, max_relative = 1e-3);
    Ok(())
}

#[test]
fn test_sheen_scales_base_layer() -> Result<()> {
    let mut scene = Scene::new(vec![LightType::Directional(sun())]);
    scene.material.albedo = Vec3::new(0.8, 0.8, 0.8);
    let plain = scene.direct()?;
    assert_eq!(plain.sheen, Vec2::ZERO);

    scene.material.sheen_factor = Vec3::new(1.0, 1.0, 1.0);
    scene.material.sheen_roughness = 0.5;
    let sheen = scene.direct()?;
    let scaling = 1.0 - sheen_albedo_scaling(1.0, 0.5);
    assert!(scaling > 0.0 && scaling < 1.0);
    assert_relative_eq!(sheen.sheen.y, scaling, epsilon = 1e-5);
    assert!(sheen.sheen.x > 0.0);
    assert_relative_eq!(sheen.diffuse.x, plain.diffuse.x * scaling, max_relative = 1e-4);
    assert_relative_eq!(sheen.specular.x, plain.specular.x * scaling, max_relative = 1e-4);

    let colour = scene.combined()?;
    assert_relative_eq!(
        colour.x,
        0.8 * sheen.diffuse.x + sheen.specular.x + sheen.sheen.x,
        max_relative = 1e-4
    );
    Ok(())
}

#[test]
fn test_clearcoat_layer() -> Result<()> {
    let mut scene = Scene::new(vec![LightType::Directional(sun())]);
    scene.material.albedo = Vec3::new(0.8, 0.8, 0.8);
    assert_eq!(scene.direct()?.coating_specular, Vec3::ZERO);

    scene.material.clearcoat_factor = 1.0;
    scene.material.clearcoat_roughness = 0.3;
    let direct = scene.direct()?;
    assert!(direct.coating_specular.x > 0.0);

    // At normal incidence the coat reflects F0 = 0.04 of the base layer.
    let base = 0.8 * direct.diffuse.x + direct.specular.x;
    let colour = scene.combined()?;
    assert_relative_eq!(colour.x, base * 0.96 + direct.coating_specular.x, max_relative = 1e-4);
    Ok(())
}
