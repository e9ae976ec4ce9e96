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

use crate::ast::{pow, Expr, Param, Type};
use crate::surface::LightSurface;
use crate::writer::FunctionCache;
use crate::{ShaderWriter, ShadingError};

/// Blinn-Phong BRDF of the legacy Phong material model.
#[derive(Debug, Default)]
pub struct BlinnPhongBrdf {
    prefix: String,
    functions: FunctionCache<&'static str>,
}

impl BlinnPhongBrdf {
    /// Creates the BRDF, generated function names start with `c3d_{prefix}`.
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_owned(),
            functions: FunctionCache::new(),
        }
    }

    /// Writes the diffuse and specular response of one light into the
    /// `diffuse` and `specular` locals.
    #[allow(clippy::too_many_arguments)]
    pub fn compute(
        &mut self,
        w: &mut ShaderWriter,
        radiance: &Expr,
        intensity: &Expr,
        surface: &LightSurface,
        fresnel: &Expr,
        shininess: &Expr,
        diffuse: &Expr,
        specular: &Expr,
    ) -> Result<(), ShadingError> {
        let name = format!("c3d_{}computeBlinnPhong", self.prefix);
        let handle = self.functions.get_or_implement(
            w,
            "computeBlinnPhong",
            name,
            Type::Void,
            vec![
                Param::new("radiance", Type::Vec3),
                Param::new("intensity", Type::Vec2),
                Param::new("F", Type::Vec3),
                Param::new("NdotH", Type::Float),
                Param::new("NdotL", Type::Float),
                Param::new("shininess", Type::Float),
                Param::inout("diffuse", Type::Vec3),
                Param::inout("specular", Type::Vec3),
            ],
            |w| {
                let radiance = Expr::Var("radiance".into());
                let intensity = Expr::Var("intensity".into());
                let ndot_l = Expr::Var("NdotL".into());
                w.assign(
                    &Expr::Var("diffuse".into()),
                    &radiance * (intensity.x() * &ndot_l),
                )?;
                let highlight = w.decl(
                    "highlight",
                    Type::Float,
                    pow(Expr::Var("NdotH".into()), Expr::Var("shininess".into())),
                )?;
                w.assign(
                    &Expr::Var("specular".into()),
                    (&radiance * Expr::Var("F".into())) * (intensity.y() * &highlight * &ndot_l),
                )
            },
        )?;
        w.call(handle.call([
            radiance.clone(),
            intensity.clone(),
            fresnel.clone(),
            surface.ndot_h.clone(),
            surface.ndot_l.clone(),
            shininess.clone(),
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
    ) -> Result<Expr, ShadingError> {
        let name = format!("c3d_{}computeBlinnPhongDiffuse", self.prefix);
        let handle = self.functions.get_or_implement(
            w,
            "computeBlinnPhongDiffuse",
            name,
            Type::Vec3,
            vec![
                Param::new("radiance", Type::Vec3),
                Param::new("intensity", Type::Vec2),
                Param::new("NdotL", Type::Float),
            ],
            |w| {
                w.ret(
                    Expr::Var("radiance".into())
                        * (Expr::Var("intensity".into()).x() * Expr::Var("NdotL".into())),
                )
            },
        )?;
        Ok(handle.call([radiance.clone(), intensity.clone(), surface.ndot_l.clone()]))
    }
}
