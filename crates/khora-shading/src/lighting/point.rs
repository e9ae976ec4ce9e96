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

//! Point lights.

use super::{shadow_factor, Components, LightFunctionKey, LightSample, Response};
use crate::ast::{dot, max, var, vec3, Expr, Type};
use crate::lights::PointLight;
use crate::material::LightMaterial;
use crate::surface::{LightSurface, Surface};
use crate::{ShaderWriter, ShadingError};

/// `constant + linear * d + quadratic * d²`, never below `1e-4`.
pub(super) fn attenuation(
    w: &mut ShaderWriter,
    coefficients: Expr,
    distance: &Expr,
) -> Result<Expr, ShadingError> {
    w.decl(
        "attenuation",
        Type::Float,
        max(dot(coefficients, vec3(1.0, distance, distance * distance)), 1e-4),
    )
}

/// Writes the body of a point light function.
pub(super) fn write(
    c: &mut Components,
    key: LightFunctionKey,
    w: &mut ShaderWriter,
) -> Result<(), ShadingError> {
    let light = PointLight::new(var("light"));
    let base = light.base();
    let material = LightMaterial::new(var("material"), c.model);
    let surface = Surface::new(var("surface"));

    let response = Response::new(w, key.pass)?;
    let ls = LightSurface::positional(w, &surface, &var("worldEye"), light.position())?;
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

    if key.shadows {
        let factor = w.decl("shadowFactor", Type::Float, 1.0)?;
        w.if_(base.casts_shadows(&var("receivesShadows")), |w| {
            let shadow = c.shadows.compute_point(w, &base, &ls)?;
            w.assign(&factor, shadow_factor(shadow))
        })?;
        response.scale(w, &factor)?;
    }
    let attenuation = attenuation(w, light.attenuation(), &ls.length_l)?;
    response.scale(w, &(1.0 / attenuation))?;
    response.finish(w)
}

#[cfg(test)]
mod tests {
    use crate::lighting::tests::evaluate_light;
    use crate::material::{MaterialModel, MaterialValues};
    use crate::surface::SurfaceData;
    use crate::ShadingSettings;
    use approx::assert_relative_eq;
    use khora_core::math::Vec3;
    use khora_core::renderer::light::{Attenuation, LightType, PointLight};

    fn diffuse(attenuation: Attenuation, model: MaterialModel) -> Vec3 {
        let light = PointLight {
            position: Vec3::new(0.0, 0.0, 3.0),
            attenuation,
            ..Default::default()
        };
        let settings = ShadingSettings {
            material_model: model,
            ..Default::default()
        };
        evaluate_light(
            settings,
            LightType::Point(light),
            &SurfaceData::default(),
            &MaterialValues::default(),
            Vec3::new(0.0, 0.0, 5.0),
        )
        .diffuse
    }

    #[test]
    fn test_quadratic_attenuation() {
        let unattenuated = Attenuation {
            constant: 1.0,
            linear: 0.0,
            quadratic: 0.0,
        };
        for model in [MaterialModel::PbrMR, MaterialModel::Phong] {
            let reference = diffuse(unattenuated, model);
            assert!(reference.x > 0.0);
            let attenuated = diffuse(Attenuation::default(), model);
            assert_relative_eq!(attenuated.x, reference.x / 10.0, epsilon = 1e-5);
        }
    }
}
