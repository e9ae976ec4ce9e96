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

//! Per-light lighting functions and the final combination.
//!
//! A [`LightingModel`] is bound to one [`ShadingSettings`] and writes, on
//! first use, one function per [`LightFunctionKey`]. Every light function
//! follows the same steps: derive the light vectors, evaluate the BRDF of
//! the material model, attenuate by the shadow factor (and, for positional
//! lights, by distance and cone), then clamp and accumulate into the
//! caller's [`OutputComponents`].

mod combine;
mod directional;
mod point;
mod spot;

pub use crate::lights::LightKind;
pub use combine::{IndirectLighting, IndirectValues, INDIRECT_LIGHTING};
pub use directional::CASCADE_BLEND_DIVISOR;

use crate::ast::{max, var, vec3_splat, Expr, Param, Type};
use crate::brdf::{BlinnPhongBrdf, BrdfHelpers, CookTorranceBrdf, SheenBrdf, SheenVisibility};
use crate::lights::LightRecords;
use crate::material::{LightMaterial, MaterialModel};
use crate::output::OutputComponents;
use crate::shadow::ShadowModel;
use crate::surface::{LightSurface, Surface};
use crate::writer::FunctionCache;
use crate::{FunctionHandle, ShaderWriter, ShadingError, ShadingSettings};

/// Which outputs a light function produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightingPass {
    /// Every [`OutputComponents`] member, accumulated through an `inout` parameter.
    Full,
    /// Only the diffuse term, returned as a `vec3`.
    DiffuseOnly,
}

impl LightingPass {
    fn suffix(self) -> &'static str {
        match self {
            LightingPass::Full => "",
            LightingPass::DiffuseOnly => "Diffuse",
        }
    }
}

/// Identifies one generated light function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LightFunctionKey {
    /// The light record the function reads.
    pub kind: LightKind,
    /// The outputs it produces.
    pub pass: LightingPass,
    /// Whether shadow maps are sampled.
    pub shadows: bool,
    /// Whether volumetric scattering is added.
    pub volumetric: bool,
}

/// The generators a lighting model writes its functions with.
#[derive(Debug)]
struct Components {
    model: MaterialModel,
    helpers: BrdfHelpers,
    cook_torrance: CookTorranceBrdf,
    sheen: SheenBrdf,
    phong: BlinnPhongBrdf,
    shadows: ShadowModel,
    records: LightRecords,
    functions: FunctionCache<&'static str>,
}

/// Writes the lighting functions of one material model.
///
/// # Examples
///
/// ```
/// use khora_shading::lighting::LightingPass;
/// use khora_shading::{LightKind, LightingModel, ShaderWriter, ShadingSettings};
///
/// let mut writer = ShaderWriter::new();
/// let mut lighting = LightingModel::new(ShadingSettings::default()).unwrap();
/// let first = lighting.light_function(&mut writer, LightKind::Point, LightingPass::Full).unwrap();
/// let again = lighting.light_function(&mut writer, LightKind::Point, LightingPass::Full).unwrap();
/// assert_eq!(first.name(), "c3d_pbrmr_computePoint");
/// assert_eq!(first, again);
/// ```
#[derive(Debug)]
pub struct LightingModel {
    settings: ShadingSettings,
    components: Components,
    functions: FunctionCache<LightFunctionKey>,
    entry_points: FunctionCache<&'static str>,
}

impl LightingModel {
    /// Creates the model described by `settings`.
    ///
    /// # Errors
    /// [`ShadingError::CascadeCount`] for invalid settings.
    pub fn new(settings: ShadingSettings) -> Result<Self, ShadingError> {
        settings.validate()?;
        let prefix = settings.prefix.as_str();
        log::info!(
            "LightingModel: {} lighting (shadows: {}, volumetric: {}, cascades: {}, tiled: {})",
            settings.material_model,
            settings.shadows,
            settings.volumetric && settings.opaque_pass,
            settings.cascade_count(),
            settings.tiled_directional
        );
        let components = Components {
            model: settings.material_model,
            helpers: BrdfHelpers::new(prefix),
            cook_torrance: CookTorranceBrdf::new(prefix),
            sheen: SheenBrdf::new(prefix, SheenVisibility::default()),
            phong: BlinnPhongBrdf::new(prefix),
            shadows: ShadowModel::new(prefix, settings.pcf_texture_size),
            records: LightRecords::new(prefix),
            functions: FunctionCache::new(),
        };
        Ok(Self {
            settings,
            components,
            functions: FunctionCache::new(),
            entry_points: FunctionCache::new(),
        })
    }

    /// The settings the model was created with.
    pub fn settings(&self) -> &ShadingSettings {
        &self.settings
    }

    /// The material model.
    pub fn material_model(&self) -> MaterialModel {
        self.settings.material_model
    }

    /// Number of light functions written so far.
    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    /// Declares the structs every lighting function uses.
    pub fn declare(&self, w: &mut ShaderWriter) {
        Surface::declare(w);
        OutputComponents::declare(w);
        IndirectLighting::declare(w);
        self.material_model().declare(w);
        LightRecords::declare(w);
    }

    /// The key of the function [`light_function`](Self::light_function)
    /// returns for these arguments.
    pub fn key(&self, kind: LightKind, pass: LightingPass) -> LightFunctionKey {
        let settings = &self.settings;
        LightFunctionKey {
            kind,
            pass,
            shadows: settings.shadows,
            volumetric: settings.shadows
                && settings.volumetric
                && settings.opaque_pass
                && pass == LightingPass::Full
                && kind.is_directional(),
        }
    }

    /// The light function for `kind`, written on first use.
    ///
    /// Full functions take `(light, material, surface, worldEye,
    /// receivesShadows, inout output)`; diffuse-only functions drop `output`
    /// and return the diffuse term.
    pub fn light_function(
        &mut self,
        w: &mut ShaderWriter,
        kind: LightKind,
        pass: LightingPass,
    ) -> Result<FunctionHandle, ShadingError> {
        self.declare(w);
        let key = self.key(kind, pass);
        let model = self.material_model();
        let name = self.settings.function_name(&format!(
            "{}_compute{}{}",
            model.name(),
            kind.name(),
            pass.suffix()
        ));
        let mut params = vec![
            Param::new("light", kind.ty()),
            Param::new("material", model.material_type()),
            Param::new("surface", Surface::ty()),
            Param::new("worldEye", Type::Vec3),
            Param::new("receivesShadows", Type::UInt),
        ];
        let ret = match pass {
            LightingPass::Full => {
                params.push(Param::inout("output", OutputComponents::ty()));
                Type::Void
            }
            LightingPass::DiffuseOnly => Type::Vec3,
        };
        let built = self.functions.get(w, &key).is_none();
        let settings = &self.settings;
        let components = &mut self.components;
        let handle = self.functions.get_or_implement(w, key, name, ret, params, |w| match kind {
            LightKind::Directional | LightKind::TiledDirectional => {
                directional::write(components, settings, key, w)
            }
            LightKind::Point => point::write(components, key, w),
            LightKind::Spot => spot::write(components, key, w),
        })?;
        if built {
            log::debug!("LightingModel: built {} ({:?})", handle.name(), key);
        }
        Ok(handle)
    }

    /// Decodes the `kind` record at slot `offset` of the light buffer.
    pub fn light(
        &mut self,
        w: &mut ShaderWriter,
        kind: LightKind,
        offset: impl Into<Expr>,
    ) -> Result<Expr, ShadingError> {
        self.components.records.decode(w, kind, offset)
    }

    /// Adds the contribution of one light to `output`.
    ///
    /// `light` must be a value of `kind`'s record type and `material` of the
    /// model's material type.
    #[allow(clippy::too_many_arguments)]
    pub fn compute(
        &mut self,
        w: &mut ShaderWriter,
        kind: LightKind,
        light: &Expr,
        material: &LightMaterial,
        surface: &Surface,
        world_eye: &Expr,
        receives_shadows: &Expr,
        output: &OutputComponents,
    ) -> Result<(), ShadingError> {
        self.check_material(material)?;
        let handle = self.light_function(w, kind, LightingPass::Full)?;
        w.call(handle.call([
            light.clone(),
            material.expr().clone(),
            surface.expr().clone(),
            world_eye.clone(),
            receives_shadows.clone(),
            output.expr().clone(),
        ]))
    }

    /// The diffuse contribution of one light.
    #[allow(clippy::too_many_arguments)]
    pub fn compute_diffuse(
        &mut self,
        w: &mut ShaderWriter,
        kind: LightKind,
        light: &Expr,
        material: &LightMaterial,
        surface: &Surface,
        world_eye: &Expr,
        receives_shadows: &Expr,
    ) -> Result<Expr, ShadingError> {
        self.check_material(material)?;
        let handle = self.light_function(w, kind, LightingPass::DiffuseOnly)?;
        Ok(handle.call([
            light.clone(),
            material.expr().clone(),
            surface.expr().clone(),
            world_eye.clone(),
            receives_shadows.clone(),
        ]))
    }

    fn combine_fn(&mut self, w: &mut ShaderWriter) -> Result<FunctionHandle, ShadingError> {
        self.declare(w);
        let name = self
            .settings
            .function_name(&format!("{}_combine", self.material_model().name()));
        combine::combine_fn(&mut self.components, w, name)
    }

    /// Composites the accumulated direct lighting with the indirect terms.
    ///
    /// PBR models mix the dielectric and metallic responses by metalness,
    /// then add sheen and layer the clearcoat on top; Phong sums the terms.
    /// Both add the emissive colour and the volumetric scattering last.
    pub fn combine(
        &mut self,
        w: &mut ShaderWriter,
        material: &LightMaterial,
        surface: &Surface,
        world_eye: &Expr,
        output: &OutputComponents,
        indirect: &IndirectLighting,
    ) -> Result<Expr, ShadingError> {
        self.check_material(material)?;
        let handle = self.combine_fn(w)?;
        Ok(handle.call([
            material.expr().clone(),
            surface.expr().clone(),
            world_eye.clone(),
            output.expr().clone(),
            indirect.expr().clone(),
        ]))
    }

    /// The lit colour of a fragment: every light of the packed buffer,
    /// composited with `indirect`.
    ///
    /// Writes `c3d_<model>_computeLighting` on first use.
    pub fn compute_combined(
        &mut self,
        w: &mut ShaderWriter,
        material: &LightMaterial,
        surface: &Surface,
        world_eye: &Expr,
        receives_shadows: &Expr,
        indirect: &IndirectLighting,
    ) -> Result<Expr, ShadingError> {
        self.check_material(material)?;
        let directional_kind = if self.settings.tiled_directional {
            LightKind::TiledDirectional
        } else {
            LightKind::Directional
        };
        let functions = combine::LightLoop {
            directional_kind,
            directional: self.light_function(w, directional_kind, LightingPass::Full)?,
            point: self.light_function(w, LightKind::Point, LightingPass::Full)?,
            spot: self.light_function(w, LightKind::Spot, LightingPass::Full)?,
            combine: self.combine_fn(w)?,
        };
        let model = self.material_model();
        let name = self.settings.function_name(&format!("{}_computeLighting", model.name()));
        let records = &mut self.components.records;
        let handle = self.entry_points.get_or_implement(
            w,
            "computeLighting",
            name,
            Type::Vec3,
            combine::light_loop_params(model),
            |w| combine::write_light_loop(records, &functions, w),
        )?;
        Ok(handle.call([
            material.expr().clone(),
            surface.expr().clone(),
            world_eye.clone(),
            receives_shadows.clone(),
            indirect.expr().clone(),
        ]))
    }

    fn check_material(&self, material: &LightMaterial) -> Result<(), ShadingError> {
        let model = self.material_model();
        let given = material.model();
        if given.struct_name() == model.struct_name() {
            return Ok(());
        }
        if let Some((member, _)) = model.members().into_iter().find(|(m, _)| !given.has_member(m)) {
            return Err(ShadingError::MissingMember {
                model: given.name(),
                member,
            });
        }
        match given.members().into_iter().find(|(m, _)| !model.has_member(m)) {
            Some((member, _)) => Err(ShadingError::MissingMember {
                model: model.name(),
                member,
            }),
            None => Ok(()),
        }
    }
}

/// The light sample a light function evaluates the BRDF for.
struct LightSample<'a> {
    surface: &'a Surface,
    light: &'a LightSurface,
    material: &'a LightMaterial,
    radiance: &'a Expr,
    intensity: &'a Expr,
}

/// The per-light result locals of a light function.
enum Response {
    Full(OutputComponents),
    Diffuse(Expr),
}

impl Response {
    /// Declares zeroed result locals.
    fn new(w: &mut ShaderWriter, pass: LightingPass) -> Result<Self, ShadingError> {
        Ok(match pass {
            LightingPass::Full => Response::Full(OutputComponents::local(w, "lightComponents")?),
            LightingPass::DiffuseOnly => {
                Response::Diffuse(w.decl("lightDiffuse", Type::Vec3, vec3_splat(0.0))?)
            }
        })
    }

    /// Writes the BRDF response of `sample` into the locals.
    fn evaluate(
        &self,
        c: &mut Components,
        w: &mut ShaderWriter,
        sample: &LightSample<'_>,
    ) -> Result<(), ShadingError> {
        let LightSample {
            surface,
            light,
            material,
            radiance,
            intensity,
        } = *sample;
        match (self, c.model.is_pbr()) {
            (Response::Diffuse(diffuse), true) => {
                let fresnel = light.fresnel(w, &mut c.helpers, material.f0())?;
                let value = c.cook_torrance.compute_diffuse(
                    w,
                    radiance,
                    intensity,
                    light,
                    &fresnel,
                    &material.metalness(),
                )?;
                w.assign(diffuse, value)
            }
            (Response::Diffuse(diffuse), false) => {
                let value = c.phong.compute_diffuse(w, radiance, intensity, light)?;
                w.assign(diffuse, value)
            }
            (Response::Full(local), false) => {
                let fresnel = light.fresnel(w, &mut c.helpers, material.specular())?;
                c.phong.compute(
                    w,
                    radiance,
                    intensity,
                    light,
                    &fresnel,
                    &material.shininess(),
                    &local.diffuse(),
                    &local.specular(),
                )
            }
            (Response::Full(local), true) => {
                let fresnel = light.fresnel(w, &mut c.helpers, material.f0())?;
                c.cook_torrance.compute(
                    w,
                    &mut c.helpers,
                    radiance,
                    intensity,
                    light,
                    &fresnel,
                    &material.roughness(),
                    &material.metalness(),
                    &local.diffuse(),
                    &local.specular(),
                )?;

                let sheen_factor = material.sheen_factor()?;
                let sheen_roughness = material.sheen_roughness()?;
                let has_sheen =
                    max(max(sheen_factor.x(), sheen_factor.y()), sheen_factor.z()).gt(0.0);
                w.if_(has_sheen, |w| {
                    let sheen = c.sheen.compute(
                        w,
                        &mut c.helpers,
                        radiance,
                        intensity,
                        light,
                        &sheen_factor,
                        &sheen_roughness,
                    )?;
                    w.assign(&local.sheen(), sheen)?;
                    // The sheen layer takes its energy from the base layer.
                    w.mul_assign(&local.diffuse(), local.sheen().y())?;
                    w.mul_assign(&local.specular(), local.sheen().y())
                })?;

                let clearcoat_factor = material.clearcoat_factor()?;
                let clearcoat_roughness = material.clearcoat_roughness()?;
                w.if_(clearcoat_factor.gt(0.0), |w| {
                    let coat = light.with_normal(w, surface.clearcoat_normal())?;
                    let coating = c.cook_torrance.compute_clearcoat(
                        w,
                        &mut c.helpers,
                        radiance,
                        intensity,
                        &coat,
                        &clearcoat_roughness,
                    )?;
                    w.assign(&local.coating_specular(), coating)
                })
            }
        }
    }

    /// Multiplies every surface term by `factor`.
    fn scale(&self, w: &mut ShaderWriter, factor: &Expr) -> Result<(), ShadingError> {
        match self {
            Response::Full(local) => {
                w.mul_assign(&local.diffuse(), factor)?;
                w.mul_assign(&local.specular(), factor)?;
                w.mul_assign(&local.coating_specular(), factor)?;
                w.mul_assign(&local.sheen().x(), factor)
            }
            Response::Diffuse(diffuse) => w.mul_assign(diffuse, factor),
        }
    }

    /// Sets the volumetric scattering term. Diffuse-only passes have none.
    fn set_scattering(&self, w: &mut ShaderWriter, scattering: Expr) -> Result<(), ShadingError> {
        match self {
            Response::Full(local) => w.assign(&local.scattering(), scattering),
            Response::Diffuse(_) => Ok(()),
        }
    }

    /// Accumulates into the `output` parameter, or returns the diffuse term.
    fn finish(self, w: &mut ShaderWriter) -> Result<(), ShadingError> {
        match self {
            Response::Full(local) => OutputComponents::new(var("output")).accumulate(w, &local),
            Response::Diffuse(diffuse) => w.ret(max(diffuse, vec3_splat(0.0))),
        }
    }
}

/// Shadow factor of a light function: the sample when the surface receives
/// shadows, `1` otherwise.
fn shadow_factor(sample: Expr) -> Expr {
    max(1.0 - var("receivesShadows").cast(Type::Float), sample)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::eval::Interpreter;
    use crate::lights::LightBufferWriter;
    use crate::material::MaterialValues;
    use crate::output::OutputValues;
    use crate::surface::SurfaceData;
    use khora_core::math::Vec3;
    use khora_core::renderer::light::LightType;

    /// Evaluates the light function of `light` for one fragment.
    pub(crate) fn evaluate_light(
        settings: ShadingSettings,
        light: LightType,
        surface: &SurfaceData,
        material: &MaterialValues,
        eye: Vec3,
    ) -> OutputValues {
        let kind = match light {
            LightType::Directional(_) if settings.tiled_directional => LightKind::TiledDirectional,
            LightType::Directional(_) => LightKind::Directional,
            LightType::Point(_) => LightKind::Point,
            LightType::Spot(_) => LightKind::Spot,
        };
        let model = settings.material_model;
        let mut writer = ShaderWriter::new();
        let mut lighting = LightingModel::new(settings).unwrap();
        lighting.declare(&mut writer);
        let params = vec![
            Param::new("material", model.material_type()),
            Param::new("surface", Surface::ty()),
            Param::new("worldEye", Type::Vec3),
        ];
        writer
            .implement_function("entry", OutputComponents::ty(), params, |w| {
                let output = OutputComponents::local(w, "result")?;
                let record = lighting.light(w, kind, 0u32)?;
                lighting.compute(
                    w,
                    kind,
                    &record,
                    &LightMaterial::new(var("material"), model),
                    &Surface::new(var("surface")),
                    &var("worldEye"),
                    &Expr::from(1u32),
                    &output,
                )?;
                w.ret(output.expr())
            })
            .unwrap();
        let module = writer.finish();

        let mut buffer = LightBufferWriter::new();
        buffer.push(light);
        let mut interpreter = Interpreter::new(&module).unwrap();
        buffer.build().bind(&mut interpreter);
        let result = interpreter
            .call("entry", vec![material.to_value(model), surface.to_value(), eye.into()])
            .unwrap()
            .result;
        OutputValues::from_value(&result).unwrap()
    }

    #[test]
    fn test_functions_are_memoized_per_key() {
        let mut writer = ShaderWriter::new();
        let mut lighting = LightingModel::new(ShadingSettings::default()).unwrap();
        for _ in 0..2 {
            for kind in LightKind::ALL {
                lighting.light_function(&mut writer, kind, LightingPass::Full).unwrap();
            }
            lighting
                .light_function(&mut writer, LightKind::Spot, LightingPass::DiffuseOnly)
                .unwrap();
        }
        assert_eq!(lighting.function_count(), 5);
        let module = writer.finish();
        for name in [
            "c3d_pbrmr_computeDirectional",
            "c3d_pbrmr_computeTiledDirectional",
            "c3d_pbrmr_computePoint",
            "c3d_pbrmr_computeSpot",
        ] {
            let function = module.function(name).unwrap();
            assert_eq!(function.ret, Type::Void);
            assert_eq!(function.params.len(), 6);
        }
        let diffuse = module.function("c3d_pbrmr_computeSpotDiffuse").unwrap();
        assert_eq!(diffuse.ret, Type::Vec3);
        // The tiled variant samples its own maps.
        assert!(module.function("c3d_computeDirectionalShadowTiled").is_some());
        assert!(module.function("c3d_computeDirectionalShadow").is_some());
    }

    #[test]
    fn test_model_reused_with_another_writer() {
        let mut lighting = LightingModel::new(ShadingSettings::default()).unwrap();
        let mut first = ShaderWriter::new();
        lighting.light_function(&mut first, LightKind::Point, LightingPass::Full).unwrap();

        let mut second = ShaderWriter::new();
        let handle = lighting
            .light_function(&mut second, LightKind::Point, LightingPass::Full)
            .unwrap();
        let module = second.finish();
        assert!(module.function(handle.name()).is_some());
        // Helpers cached by the components are written again as well.
        assert!(module.function("c3d_computePointShadow").is_some());
        assert!(module.function("c3d_computeCookTorrance").is_some());
    }

    #[test]
    fn test_key_flags() {
        let settings = ShadingSettings {
            volumetric: true,
            ..Default::default()
        };
        let lighting = LightingModel::new(settings).unwrap();
        let key = lighting.key(LightKind::Directional, LightingPass::Full);
        assert!(key.shadows && key.volumetric);
        assert!(!lighting.key(LightKind::Point, LightingPass::Full).volumetric);
        assert!(!lighting.key(LightKind::Directional, LightingPass::DiffuseOnly).volumetric);

        let lighting = LightingModel::new(ShadingSettings {
            volumetric: true,
            opaque_pass: false,
            ..Default::default()
        })
        .unwrap();
        assert!(!lighting.key(LightKind::Directional, LightingPass::Full).volumetric);
    }

    #[test]
    fn test_volumetric_only_in_opaque_passes() {
        let build = |opaque_pass: bool| {
            let mut writer = ShaderWriter::new();
            let mut lighting = LightingModel::new(ShadingSettings {
                volumetric: true,
                opaque_pass,
                ..Default::default()
            })
            .unwrap();
            lighting
                .light_function(&mut writer, LightKind::Directional, LightingPass::Full)
                .unwrap();
            writer.finish().function("c3d_computeVolumetric").is_some()
        };
        assert!(build(true));
        assert!(!build(false));
    }

    #[test]
    fn test_prefix_and_model_in_names() {
        let mut writer = ShaderWriter::new();
        let mut lighting = LightingModel::new(ShadingSettings {
            material_model: MaterialModel::Phong,
            prefix: "fwd_".to_owned(),
            ..Default::default()
        })
        .unwrap();
        let handle = lighting
            .light_function(&mut writer, LightKind::Directional, LightingPass::DiffuseOnly)
            .unwrap();
        assert_eq!(handle.name(), "c3d_fwd_phong_computeDirectionalDiffuse");
        let module = writer.finish();
        assert!(module.function("c3d_fwd_computeBlinnPhongDiffuse").is_some());
        assert!(module.function("c3d_fwd_computeCookTorranceDiffuse").is_none());
    }

    #[test]
    fn test_phong_material_rejected_by_pbr_lighting() {
        let mut writer = ShaderWriter::new();
        let mut lighting = LightingModel::new(ShadingSettings::default()).unwrap();
        let material = LightMaterial::new(var("material"), MaterialModel::Phong);
        let err = lighting
            .compute_diffuse(
                &mut writer,
                LightKind::Point,
                &var("light"),
                &material,
                &Surface::new(var("surface")),
                &var("eye"),
                &Expr::from(1u32),
            )
            .unwrap_err();
        assert!(matches!(err, ShadingError::MissingMember { model: "phong", .. }));

        let pbrsg = LightMaterial::new(var("material"), MaterialModel::PbrSG);
        assert!(lighting.check_material(&pbrsg).is_ok());
    }
}
