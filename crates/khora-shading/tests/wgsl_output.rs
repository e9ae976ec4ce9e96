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

//! Shape of the WGSL emitted for complete lighting modules.

use anyhow::{anyhow, Result};
use khora_shading::ast::{var, Param, Type};
use khora_shading::lighting::{IndirectLighting, LightingPass};
use khora_shading::material::LightMaterial;
use khora_shading::surface::Surface;
use khora_shading::wgsl::emit;
use khora_shading::{LightKind, LightingModel, MaterialModel, ShaderWriter, ShadingSettings};
use naga::front::wgsl;
use naga::valid::{Capabilities, ValidationFlags, Validator};

fn lighting_module(settings: ShadingSettings) -> Result<String> {
    let bind_group = settings.bind_group;
    let model = settings.material_model;
    let mut writer = ShaderWriter::new();
    let mut lighting = LightingModel::new(settings)?;
    lighting.declare(&mut writer);
    let params = vec![
        Param::new("material", model.material_type()),
        Param::new("surface", Surface::ty()),
        Param::new("worldEye", Type::Vec3),
        Param::new("indirect", IndirectLighting::ty()),
    ];
    writer.implement_function("shade", Type::Vec3, params, |w| {
        let material = LightMaterial::new(var("material"), model);
        let surface = Surface::new(var("surface"));
        let first = lighting.compute_combined(
            w,
            &material,
            &surface,
            &var("worldEye"),
            &1u32.into(),
            &IndirectLighting::new(var("indirect")),
        )?;
        // A second request reuses every function.
        let second = lighting.compute_combined(
            w,
            &material,
            &surface,
            &var("worldEye"),
            &0u32.into(),
            &IndirectLighting::new(var("indirect")),
        )?;
        w.ret(first + second)
    })?;
    Ok(emit(&writer.finish(), bind_group)?)
}

/// Parses `text` with naga and runs the full validator over it.
fn validate(text: &str) -> Result<()> {
    let module = wgsl::parse_str(text).map_err(|e| anyhow!(e.emit_to_string(text)))?;
    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|e| anyhow!(e.emit_to_string(text)))?;
    Ok(())
}

fn definitions(text: &str, name: &str) -> usize {
    text.matches(&format!("fn {name}(")).count()
}

#[test]
fn test_pbr_module_defines_each_function_once() -> Result<()> {
    let text = lighting_module(ShadingSettings::default())?;
    for name in [
        "c3d_pbrmr_computeLighting",
        "c3d_pbrmr_combine",
        "c3d_pbrmr_computeDirectional",
        "c3d_pbrmr_computePoint",
        "c3d_pbrmr_computeSpot",
        "c3d_computeCookTorrance",
        "c3d_computeClearcoat",
        "c3d_computeSheen",
        "c3d_getCascadeFactors",
        "c3d_getDirectionalLight",
        "c3d_getBaseLight",
        "c3d_computeDirectionalShadow",
        "c3d_computePointShadow",
        "c3d_computeSpotShadow",
    ] {
        assert_eq!(definitions(&text, name), 1, "{name}");
    }
    assert!(text.contains("struct PbrLightMaterial {"));
    assert!(text.contains("struct OutputComponents {"));
    assert!(text.contains("var<storage, read> c3d_lights: array<vec4<f32>>;"));
    assert!(text.contains("@group(1) @binding(0)"));
    assert!(text.contains("output: ptr<function, OutputComponents>"));
    Ok(())
}

#[test]
fn test_phong_module_has_no_pbr_layers() -> Result<()> {
    let text = lighting_module(ShadingSettings {
        material_model: MaterialModel::Phong,
        shadows: false,
        bind_group: 2,
        prefix: "fwd_".to_owned(),
        ..Default::default()
    })?;
    assert_eq!(definitions(&text, "c3d_fwd_phong_computeLighting"), 1);
    assert_eq!(definitions(&text, "c3d_fwd_computeBlinnPhong"), 1);
    for absent in [
        "c3d_fwd_computeClearcoat",
        "c3d_fwd_computeSheen",
        "c3d_fwd_computeCookTorrance",
        "c3d_fwd_computeDirectionalShadow",
        "c3d_fwd_getCascadeFactors",
    ] {
        assert_eq!(definitions(&text, absent), 0, "{absent}");
    }
    assert!(!text.contains("clearcoatFactor"));
    assert!(!text.contains("texture_depth"));
    assert!(text.contains("@group(2) @binding(0)"));
    assert!(text.contains("struct PhongLightMaterial {"));
    Ok(())
}

#[test]
fn test_tiled_directional_variant() -> Result<()> {
    let text = lighting_module(ShadingSettings {
        tiled_directional: true,
        volumetric: true,
        ..Default::default()
    })?;
    assert_eq!(definitions(&text, "c3d_pbrmr_computeTiledDirectional"), 1);
    assert_eq!(definitions(&text, "c3d_pbrmr_computeDirectional"), 0);
    assert_eq!(definitions(&text, "c3d_computeDirectionalShadowTiled"), 1);
    assert_eq!(definitions(&text, "c3d_computeVolumetricTiled"), 1);
    assert!(text.contains("texture_depth_2d"));
    Ok(())
}

#[test]
fn test_diffuse_only_function_returns_vec3() -> Result<()> {
    let mut writer = ShaderWriter::new();
    let mut lighting = LightingModel::new(ShadingSettings::default())?;
    let handle = lighting.light_function(&mut writer, LightKind::Point, LightingPass::DiffuseOnly)?;
    let text = emit(&writer.finish(), 0)?;
    assert!(text.contains(&format!(
        "fn {}(light: PointLight, material: PbrLightMaterial, surface: Surface, worldEye: vec3<f32>, receivesShadows: u32) -> vec3<f32>",
        handle.name()
    )));
    Ok(())
}

#[test]
fn test_lighting_modules_validate() -> Result<()> {
    for material_model in [MaterialModel::PbrMR, MaterialModel::PbrSG, MaterialModel::Phong] {
        let variants = [(false, false), (true, false), (true, true), (false, true)];
        for (volumetric, tiled_directional) in variants {
            let settings = ShadingSettings {
                material_model,
                volumetric,
                tiled_directional,
                ..Default::default()
            };
            let text = lighting_module(settings)?;
            let variant = (material_model, volumetric, tiled_directional);
            validate(&text).map_err(|e| anyhow!("{variant:?}: {e}"))?;
        }
    }
    Ok(())
}

#[test]
fn test_unshadowed_and_diffuse_modules_validate() -> Result<()> {
    for material_model in [MaterialModel::PbrMR, MaterialModel::PbrSG, MaterialModel::Phong] {
        let text = lighting_module(ShadingSettings {
            material_model,
            shadows: false,
            prefix: "fwd_".to_owned(),
            ..Default::default()
        })?;
        validate(&text)?;

        let mut writer = ShaderWriter::new();
        let mut lighting = LightingModel::new(ShadingSettings {
            material_model,
            ..Default::default()
        })?;
        for kind in LightKind::ALL {
            lighting.light_function(&mut writer, kind, LightingPass::DiffuseOnly)?;
        }
        validate(&emit(&writer.finish(), 0)?)?;
    }
    Ok(())
}
