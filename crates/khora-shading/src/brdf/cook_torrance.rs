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

use std::f32::consts::PI;

use super::BrdfHelpers;
use crate::ast::{vec3_splat, Expr, Param, Type};
use crate::surface::LightSurface;
use crate::writer::FunctionCache;
use crate::{ShaderWriter, ShadingError};

/// Added to the specular denominator.
const SPECULAR_EPSILON: f32 = 0.001;
/// Reflectance at normal incidence of the clearcoat layer.
const CLEARCOAT_F0: f32 = 0.04;

/// Cook-Torrance microfacet BRDF with a Lambertian diffuse lobe.
#[derive(Debug, Default)]
pub struct CookTorranceBrdf {
    prefix: String,
    functions: FunctionCache<&'static str>,
}

impl CookTorranceBrdf {
    /// Creates the BRDF, generated function names start with `c3d_{prefix}`.
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_owned(),
            functions: FunctionCache::new(),
        }
    }

    /// Writes the diffuse and specular response of one light into the
    /// `diffuse` and `specular` locals.
    ///
    /// `fresnel` is the `F` local declared by [`LightSurface::fresnel`].
    #[allow(clippy::too_many_arguments)]
    pub fn compute(
        &mut self,
        w: &mut ShaderWriter,
        helpers: &mut BrdfHelpers,
        radiance: &Expr,
        intensity: &Expr,
        surface: &LightSurface,
        fresnel: &Expr,
        roughness: &Expr,
        metalness: &Expr,
        diffuse: &Expr,
        specular: &Expr,
    ) -> Result<(), ShadingError> {
        let name = format!("c3d_{}computeCookTorrance", self.prefix);
        let handle = self.functions.get_or_implement(
            w,
            "computeCookTorrance",
            name,
            Type::Void,
            vec![
                Param::new("radiance", Type::Vec3),
                Param::new("intensity", Type::Vec2),
                Param::new("F", Type::Vec3),
                Param::new("NdotH", Type::Float),
                Param::new("NdotV", Type::Float),
                Param::new("NdotL", Type::Float),
                Param::new("roughness", Type::Float),
                Param::new("metalness", Type::Float),
                Param::inout("diffuse", Type::Vec3),
                Param::inout("specular", Type::Vec3),
            ],
            |w| {
                let radiance = Expr::Var("radiance".into());
                let intensity = Expr::Var("intensity".into());
                let f = Expr::Var("F".into());
                let ndot_v = Expr::Var("NdotV".into());
                let ndot_l = Expr::Var("NdotL".into());
                let roughness = Expr::Var("roughness".into());
                let metalness = Expr::Var("metalness".into());

                let alpha = &roughness * &roughness;
                let d = helpers.distribution_ggx(w, Expr::Var("NdotH".into()), alpha)?;
                let d = w.decl("D", Type::Float, d)?;
                let gv = helpers.visibility_schlick_ggx(w, &ndot_v, &roughness)?;
                let gl = helpers.visibility_schlick_ggx(w, &ndot_l, &roughness)?;
                let g = w.decl("G", Type::Float, gv * gl)?;
                let numerator = w.decl("numerator", Type::Vec3, &f * (&d * &g))?;
                let denominator = w.decl(
                    "denominator",
                    Type::Float,
                    (4.0 * (&ndot_v * &ndot_l)) + SPECULAR_EPSILON,
                )?;
                w.assign(
                    &Expr::Var("specular".into()),
                    (&numerator / &denominator) * &radiance * (intensity.y() * &ndot_l),
                )?;
                let kd = w.decl(
                    "kD",
                    Type::Vec3,
                    (vec3_splat(1.0) - &f) * (1.0 - &metalness),
                )?;
                w.assign(
                    &Expr::Var("diffuse".into()),
                    (&kd * &radiance) * (intensity.x() * &ndot_l / PI),
                )
            },
        )?;
        w.call(handle.call([
            radiance.clone(),
            intensity.clone(),
            fresnel.clone(),
            surface.ndot_h.clone(),
            surface.ndot_v.clone(),
            surface.ndot_l.clone(),
            roughness.clone(),
            metalness.clone(),
            diffuse.clone(),
            specular.clone(),
        ]))
    }

    /// The diffuse response of one light.
    pub fn compute_diffuse(
        &mut self,
        w: &mut ShaderWriter,
        radiance: &Expr,
        intensity: &Expr,
        surface: &LightSurface,
        fresnel: &Expr,
        metalness: &Expr,
    ) -> Result<Expr, ShadingError> {
        let name = format!("c3d_{}computeCookTorranceDiffuse", self.prefix);
        let handle = self.functions.get_or_implement(
            w,
            "computeCookTorranceDiffuse",
            name,
            Type::Vec3,
            vec![
                Param::new("radiance", Type::Vec3),
                Param::new("intensity", Type::Vec2),
                Param::new("F", Type::Vec3),
                Param::new("NdotL", Type::Float),
                Param::new("metalness", Type::Float),
            ],
            |w| {
                let kd = (vec3_splat(1.0) - Expr::Var("F".into()))
                    * (1.0 - Expr::Var("metalness".into()));
                let factor = Expr::Var("intensity".into()).x() * Expr::Var("NdotL".into()) / PI;
                w.ret((kd * Expr::Var("radiance".into())) * factor)
            },
        )?;
        Ok(handle.call([
            radiance.clone(),
            intensity.clone(),
            fresnel.clone(),
            surface.ndot_l.clone(),
            metalness.clone(),
        ]))
    }

    /// Specular response of the clearcoat layer.
    ///
    /// `surface` must carry the clearcoat normal, see [`LightSurface::with_normal`].
    pub fn compute_clearcoat(
        &mut self,
        w: &mut ShaderWriter,
        helpers: &mut BrdfHelpers,
        radiance: &Expr,
        intensity: &Expr,
        surface: &LightSurface,
        roughness: &Expr,
    ) -> Result<Expr, ShadingError> {
        let name = format!("c3d_{}computeClearcoat", self.prefix);
        let handle = self.functions.get_or_implement(
            w,
            "computeClearcoat",
            name,
            Type::Vec3,
            vec![
                Param::new("radiance", Type::Vec3),
                Param::new("intensity", Type::Vec2),
                Param::new("HdotV", Type::Float),
                Param::new("NdotH", Type::Float),
                Param::new("NdotV", Type::Float),
                Param::new("NdotL", Type::Float),
                Param::new("roughness", Type::Float),
            ],
            |w| {
                let ndot_v = Expr::Var("NdotV".into());
                let ndot_l = Expr::Var("NdotL".into());
                let roughness = Expr::Var("roughness".into());
                let fc = helpers.fresnel_schlick(
                    w,
                    Expr::Var("HdotV".into()),
                    vec3_splat(CLEARCOAT_F0),
                )?;
                let fc = w.decl("Fc", Type::Vec3, fc)?;
                let alpha = &roughness * &roughness;
                let d = helpers.distribution_ggx(w, Expr::Var("NdotH".into()), alpha)?;
                let d = w.decl("D", Type::Float, d)?;
                let v = helpers.visibility_smith_ggx_correlated(w, &ndot_v, &ndot_l, &roughness)?;
                let v = w.decl("Vis", Type::Float, v)?;
                w.ret(
                    (&fc * (&d * &v))
                        * Expr::Var("radiance".into())
                        * (Expr::Var("intensity".into()).y() * &ndot_l),
                )
            },
        )?;
        Ok(handle.call([
            radiance.clone(),
            intensity.clone(),
            surface.hdot_v.clone(),
            surface.ndot_h.clone(),
            surface.ndot_v.clone(),
            surface.ndot_l.clone(),
            roughness.clone(),
        ]))
    }

    /// Reflectance of the clearcoat layer seen at `product = NdotV`, used to
    /// attenuate the base layer.
    pub fn clearcoat_fresnel(
        w: &mut ShaderWriter,
        helpers: &mut BrdfHelpers,
        product: impl Into<Expr>,
    ) -> Result<Expr, ShadingError> {
        helpers.fresnel_schlick(w, product, vec3_splat(CLEARCOAT_F0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::vec2;
    use crate::eval::{Interpreter, Value};
    use crate::surface::{Surface, SurfaceData};
    use approx::assert_relative_eq;
    use khora_core::math::Vec3;

    #[test]
    fn test_cook_torrance_lobes() {
        let mut writer = ShaderWriter::new();
        let mut helpers = BrdfHelpers::new("");
        let mut brdf = CookTorranceBrdf::new("");
        let surface_ty = Surface::declare(&mut writer);
        writer
            .implement_function(
                "shade",
                Type::Vec3,
                vec![Param::new("surface", surface_ty), Param::new("eye", Type::Vec3)],
                |w| {
                    let surface = Surface::new(Expr::Var("surface".into()));
                    let ls = LightSurface::directional(
                        w,
                        &surface,
                        &Expr::Var("eye".into()),
                        crate::ast::vec3(0.0, 0.0, -1.0),
                    )?;
                    let f = ls.fresnel(w, &mut helpers, vec3_splat(0.04))?;
                    let diffuse = w.decl_zeroed("diffuse", Type::Vec3)?;
                    let specular = w.decl_zeroed("specular", Type::Vec3)?;
                    brdf.compute(
                        w,
                        &mut helpers,
                        &vec3_splat(1.0),
                        &vec2(1.0, 1.0),
                        &ls,
                        &f,
                        &Expr::from(0.5),
                        &Expr::from(0.0),
                        &diffuse,
                        &specular,
                    )?;
                    w.ret(crate::ast::vec3(diffuse.x(), specular.x(), 0.0))
                },
            )
            .unwrap();
        let module = writer.finish();

        // Eye at 60 degrees from the normal: NdotV = 0.5, HdotV = cos(30).
        let eye = Vec3::new(60f32.to_radians().sin(), 0.0, 60f32.to_radians().cos()) * 10.0;
        let result = Interpreter::new(&module)
            .unwrap()
            .call("shade", vec![SurfaceData::default().to_value(), eye.into()])
            .unwrap()
            .result
            .as_vec3()
            .unwrap();
        let f = 0.04 + 0.96 * (1.0 - 30f32.to_radians().cos()).powi(5);
        assert_relative_eq!(result.x, (1.0 - f) / PI, epsilon = 1e-5);
        assert!(result.y > 0.003 && result.y < 0.004, "specular {}", result.y);
    }

    #[test]
    fn test_clearcoat_is_one_function() {
        let mut writer = ShaderWriter::new();
        let mut helpers = BrdfHelpers::new("");
        let mut brdf = CookTorranceBrdf::new("");
        let surface_ty = Surface::declare(&mut writer);
        writer
            .implement_function(
                "coat",
                Type::Vec3,
                vec![Param::new("surface", surface_ty), Param::new("eye", Type::Vec3)],
                |w| {
                    let surface = Surface::new(Expr::Var("surface".into()));
                    let ls = LightSurface::directional(
                        w,
                        &surface,
                        &Expr::Var("eye".into()),
                        crate::ast::vec3(0.0, 0.0, -1.0),
                    )?;
                    let coat = ls.with_normal(w, surface.clearcoat_normal())?;
                    let (radiance, intensity) = (vec3_splat(1.0), vec2(1.0, 1.0));
                    let a = brdf.compute_clearcoat(
                        w,
                        &mut helpers,
                        &radiance,
                        &intensity,
                        &coat,
                        &Expr::from(0.3),
                    )?;
                    let b = brdf.compute_clearcoat(
                        w,
                        &mut helpers,
                        &radiance,
                        &intensity,
                        &coat,
                        &Expr::from(0.6),
                    )?;
                    w.ret(a + b)
                },
            )
            .unwrap();
        let module = writer.finish();
        assert_eq!(
            module.functions.iter().filter(|f| f.name == "c3d_computeClearcoat").count(),
            1
        );
        let result = Interpreter::new(&module)
            .unwrap()
            .call(
                "coat",
                vec![SurfaceData::default().to_value(), Value::Vec3([0.0, 0.0, 5.0])],
            )
            .unwrap()
            .result
            .as_vec3()
            .unwrap();
        assert!(result.x > 0.0 && result.x.is_finite());
    }
}
