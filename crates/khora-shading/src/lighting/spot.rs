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

//! Spot lights.

use super::point::attenuation;
use super::{shadow_factor, Components, LightFunctionKey, LightSample, Response};
use crate::ast::{clamp, dot, pow, select, var, Type};
use crate::lights::SpotLight;
use crate::material::LightMaterial;
use crate::surface::{LightSurface, Surface};
use crate::{ShaderWriter, ShadingError};

/// Writes the body of a spot light function.
///
/// Fragments outside the outer cone keep a zero contribution. Between the
/// cones the contribution fades as `((spotFactor - outer) / (inner - outer))^exponent`.
pub(super) fn write(
    c: &mut Components,
    key: LightFunctionKey,
    w: &mut ShaderWriter,
) -> Result<(), ShadingError> {
    let light = SpotLight::new(var("light"));
    let base = light.base();
    let material = LightMaterial::new(var("material"), c.model);
    let surface = Surface::new(var("surface"));

    let response = Response::new(w, key.pass)?;
    let ls = LightSurface::positional(w, &surface, &var("worldEye"), light.position())?;
    let spot_factor = w.decl("spotFactor", Type::Float, dot(&ls.l, -light.direction()))?;
    let outer = light.outer_cut_off();
    w.if_(spot_factor.gt(&outer), |w| {
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
                let shadow = c.shadows.compute_spot(w, &base, &ls, &light.transform())?;
                w.assign(&factor, shadow_factor(shadow))
            })?;
            response.scale(w, &factor)?;
        }
        let attenuation = attenuation(w, light.attenuation(), &ls.length_l)?;
        // Full intensity inside the inner cone. A cone whose angles match
        // has a zero `cutOffsDiff` and a hard edge.
        let diff = light.cut_offs_diff();
        let smooth = clamp((&spot_factor - &outer) * &diff, 0.0, 1.0);
        let falloff = w.decl(
            "falloff",
            Type::Float,
            pow(select(diff.gt(0.0), smooth, 1.0), light.exponent()),
        )?;
        response.scale(w, &(falloff / attenuation))
    })?;
    response.finish(w)
}

#[cfg(test)]
mod tests {
    use crate::lighting::tests::evaluate_light;
    use crate::material::MaterialValues;
    use crate::surface::SurfaceData;
    use crate::ShadingSettings;
    use approx::assert_relative_eq;
    use khora_core::math::Vec3;
    use khora_core::renderer::light::{LightType, PointLight, SpotLight};

    fn diffuse(light: LightType) -> Vec3 {
        evaluate_light(
            ShadingSettings::default(),
            light,
            &SurfaceData::default(),
            &MaterialValues::default(),
            Vec3::new(0.0, 0.0, 5.0),
        )
        .diffuse
    }

    fn spot(direction: Vec3) -> SpotLight {
        SpotLight {
            position: Vec3::new(0.0, 0.0, 3.0),
            direction,
            ..Default::default()
        }
    }

    #[test]
    fn test_full_falloff_on_axis() {
        let on_axis = diffuse(LightType::Spot(spot(Vec3::new(0.0, 0.0, -1.0))));
        let point = diffuse(LightType::Point(PointLight {
            position: Vec3::new(0.0, 0.0, 3.0),
            ..Default::default()
        }));
        assert!(point.x > 0.0);
        assert_relative_eq!(on_axis.x, point.x, epsilon = 1e-5);
    }

    #[test]
    fn test_no_light_at_outer_cone() {
        let light = spot(Vec3::ZERO);
        let angle = light.outer_cone_angle;
        let at_edge = diffuse(LightType::Spot(SpotLight {
            direction: Vec3::new(angle.sin(), 0.0, -angle.cos()),
            ..light
        }));
        assert!(at_edge.x.abs() < 1e-4);

        let outside = diffuse(LightType::Spot(SpotLight {
            direction: Vec3::new(1.0, 0.0, 0.0),
            ..light
        }));
        assert_eq!(outside, Vec3::ZERO);
    }

    #[test]
    fn test_falloff_between_cones() {
        let light = spot(Vec3::new(0.0, 0.0, -1.0));
        let on_axis = diffuse(LightType::Spot(light));
        // Halfway between the cone cosines.
        let angle = ((light.inner_cutoff() + light.outer_cutoff()) / 2.0).acos();
        let tilted = SpotLight {
            direction: Vec3::new(angle.sin(), 0.0, -angle.cos()),
            ..light
        };
        let linear = diffuse(LightType::Spot(tilted));
        assert_relative_eq!(linear.x, 0.5 * on_axis.x, max_relative = 1e-3);

        let squared = diffuse(LightType::Spot(SpotLight {
            exponent: 2.0,
            ..tilted
        }));
        assert_relative_eq!(squared.x, 0.25 * on_axis.x, max_relative = 1e-3);
    }

    #[test]
    fn test_matching_cones_have_a_hard_edge() {
        let light = SpotLight {
            inner_cone_angle: 30f32.to_radians(),
            outer_cone_angle: 30f32.to_radians(),
            ..spot(Vec3::new(0.0, 0.0, -1.0))
        };
        assert_eq!(light.cutoff_diff_reciprocal(), 0.0);
        let on_axis = diffuse(LightType::Spot(light));
        let inside = diffuse(LightType::Spot(SpotLight {
            direction: Vec3::new(25f32.to_radians().sin(), 0.0, -25f32.to_radians().cos()),
            ..light
        }));
        assert!(on_axis.x > 0.0);
        assert_relative_eq!(inside.x, on_axis.x, epsilon = 1e-6);
    }
}
