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

use serde::{Deserialize, Serialize};

use super::BrdfHelpers;
use crate::ast::{dot, floor, max, min, mix, vec2, vec3, Expr, GlobalKind, Param, Type};
use crate::surface::LightSurface;
use crate::writer::FunctionCache;
use crate::{FunctionHandle, ShaderWriter, ShadingError};

/// Resolution of the sheen albedo scaling table along each axis.
pub const SHEEN_LUT_SIZE: usize = 16;

/// Directional albedo of the Charlie sheen lobe.
///
/// Row `i` holds roughness `i / 15`, column `j` holds `NdotV = j / 15`.
#[rustfmt::skip]
pub static SHEEN_ALBEDO_SCALING: [f32; SHEEN_LUT_SIZE * SHEEN_LUT_SIZE] = [
    1.0000, 0.2750, 0.0159, 0.0003, 0.0000, 0.0000, 0.0000, 0.0000, 0.0000, 0.0000, 0.0000, 0.0000, 0.0000, 0.0000, 0.0000, 0.0000,
    1.0000, 0.6856, 0.2045, 0.0485, 0.0097, 0.0016, 0.0002, 0.0000, 0.0000, 0.0000, 0.0000, 0.0000, 0.0000, 0.0000, 0.0000, 0.0000,
    1.0000, 0.7489, 0.4016, 0.2070, 0.1043, 0.0504, 0.0230, 0.0098, 0.0038, 0.0013, 0.0004, 0.0001, 0.0000, 0.0000, 0.0000, 0.0000,
    0.9189, 0.6858, 0.4451, 0.2862, 0.1840, 0.1168, 0.0725, 0.0436, 0.0252, 0.0139, 0.0071, 0.0033, 0.0014, 0.0004, 0.0001, 0.0000,
    0.7780, 0.6371, 0.4563, 0.3265, 0.2350, 0.1686, 0.1196, 0.0834, 0.0569, 0.0378, 0.0242, 0.0147, 0.0082, 0.0040, 0.0016, 0.0003,
    0.6987, 0.6095, 0.4644, 0.3543, 0.2723, 0.2094, 0.1601, 0.1211, 0.0903, 0.0664, 0.0477, 0.0330, 0.0217, 0.0131, 0.0068, 0.0024,
    0.6573, 0.5991, 0.4766, 0.3797, 0.3045, 0.2449, 0.1964, 0.1563, 0.1232, 0.0963, 0.0742, 0.0558, 0.0404, 0.0276, 0.0171, 0.0086,
    0.6383, 0.6018, 0.4941, 0.4063, 0.3356, 0.2782, 0.2304, 0.1898, 0.1553, 0.1266, 0.1021, 0.0810, 0.0625, 0.0463, 0.0321, 0.0197,
    0.6359, 0.6141, 0.5165, 0.4348, 0.3669, 0.3108, 0.2633, 0.2223, 0.1868, 0.1566, 0.1306, 0.1075, 0.0867, 0.0679, 0.0508, 0.0353,
    0.6432, 0.6322, 0.5416, 0.4644, 0.3985, 0.3429, 0.2953, 0.2538, 0.2173, 0.1861, 0.1588, 0.1342, 0.1118, 0.0912, 0.0720, 0.0541,
    0.6577, 0.6535, 0.5679, 0.4941, 0.4297, 0.3741, 0.3260, 0.2838, 0.2464, 0.2143, 0.1860, 0.1604, 0.1368, 0.1148, 0.0941, 0.0747,
    0.6755, 0.6752, 0.5932, 0.5220, 0.4588, 0.4031, 0.3545, 0.3115, 0.2734, 0.2405, 0.2114, 0.1850, 0.1606, 0.1377, 0.1162, 0.0958,
    0.6924, 0.6943, 0.6151, 0.5461, 0.4841, 0.4285, 0.3794, 0.3359, 0.2972, 0.2638, 0.2342, 0.2073, 0.1824, 0.1590, 0.1370, 0.1162,
    0.7047, 0.7079, 0.6312, 0.5641, 0.5035, 0.4485, 0.3993, 0.3557, 0.3168, 0.2832, 0.2535, 0.2265, 0.2014, 0.1779, 0.1558, 0.1349,
    0.7092, 0.7127, 0.6385, 0.5737, 0.5149, 0.4612, 0.4127, 0.3695, 0.3310, 0.2977, 0.2684, 0.2416, 0.2169, 0.1936, 0.1717, 0.1511,
    0.7010, 0.7063, 0.6350, 0.5729, 0.5165, 0.4647, 0.4178, 0.3759, 0.3385, 0.3063, 0.2778, 0.2519, 0.2279, 0.2054, 0.1842, 0.1641,
];

const SHEEN_LUT_GLOBAL: &str = "c3d_sheenLut";
const LUMINANCE: [f32; 3] = [0.2126, 0.7152, 0.0722];

/// Bilinear lookup in [`SHEEN_ALBEDO_SCALING`], identical to the generated
/// shader lookup.
///
/// ```
/// use khora_shading::brdf::sheen_albedo_scaling;
///
/// assert_eq!(sheen_albedo_scaling(0.0, 0.0), 1.0);
/// let e = sheen_albedo_scaling(0.5, 0.7);
/// assert!((0.0..=1.0).contains(&e));
/// ```
pub fn sheen_albedo_scaling(ndot_v: f32, roughness: f32) -> f32 {
    let last = (SHEEN_LUT_SIZE - 1) as f32;
    let x = ndot_v.clamp(0.0, 1.0) * last;
    let y = roughness.clamp(0.0, 1.0) * last;
    let (x0, y0) = (x.floor(), y.floor());
    let (fx, fy) = (x - x0, y - y0);
    let (i0, j0) = (x0 as usize, y0 as usize);
    let (i1, j1) = ((i0 + 1).min(SHEEN_LUT_SIZE - 1), (j0 + 1).min(SHEEN_LUT_SIZE - 1));
    let at = |i: usize, j: usize| SHEEN_ALBEDO_SCALING[j * SHEEN_LUT_SIZE + i];
    let top = khora_core::math::mix(at(i0, j0), at(i1, j0), fx);
    let bottom = khora_core::math::mix(at(i0, j1), at(i1, j1), fx);
    khora_core::math::mix(top, bottom, fy)
}

/// Visibility term of the sheen lobe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SheenVisibility {
    /// Estevez-Kulla, energy preserving.
    #[default]
    EstevezKulla,
    /// Ashikhmin, cheaper.
    Ashikhmin,
}

/// Charlie sheen BRDF.
///
/// [`compute`](Self::compute) returns `vec2(sheen intensity, albedo scaling)`:
/// the scaling is applied to the base layer of the same light.
#[derive(Debug, Default)]
pub struct SheenBrdf {
    prefix: String,
    visibility: SheenVisibility,
    functions: FunctionCache<&'static str>,
}

impl SheenBrdf {
    /// Creates the BRDF, generated function names start with `c3d_{prefix}`.
    pub fn new(prefix: &str, visibility: SheenVisibility) -> Self {
        Self {
            prefix: prefix.to_owned(),
            visibility,
            functions: FunctionCache::new(),
        }
    }

    /// Declares the albedo scaling table as a private module constant.
    fn declare_table(w: &mut ShaderWriter) -> Expr {
        let values = SHEEN_ALBEDO_SCALING.iter().map(|&v| Expr::from(v)).collect();
        let ty = Type::array(Type::Float, SHEEN_ALBEDO_SCALING.len() as u32);
        w.declare_global(
            SHEEN_LUT_GLOBAL,
            GlobalKind::Private {
                ty: ty.clone(),
                init: Some(Expr::Construct(ty, values)),
            },
        )
    }

    /// Albedo scaling `E(NdotV, roughness)` read from the table.
    pub fn albedo_scaling(
        &mut self,
        w: &mut ShaderWriter,
        ndot_v: impl Into<Expr>,
        roughness: impl Into<Expr>,
    ) -> Result<Expr, ShadingError> {
        let handle = self.albedo_scaling_fn(w)?;
        Ok(handle.call([ndot_v.into(), roughness.into()]))
    }

    fn albedo_scaling_fn(&mut self, w: &mut ShaderWriter) -> Result<FunctionHandle, ShadingError> {
        let name = format!("c3d_{}getSheenAlbedoScaling", self.prefix);
        let table = Self::declare_table(w);
        self.functions.get_or_implement(
            w,
            "getSheenAlbedoScaling",
            name,
            Type::Float,
            vec![Param::new("NdotV", Type::Float), Param::new("roughness", Type::Float)],
            move |w| {
                let last = (SHEEN_LUT_SIZE - 1) as f32;
                let size = SHEEN_LUT_SIZE as u32;
                let x = w.decl(
                    "x",
                    Type::Float,
                    crate::ast::clamp(Expr::Var("NdotV".into()), 0.0, 1.0) * last,
                )?;
                let y = w.decl(
                    "y",
                    Type::Float,
                    crate::ast::clamp(Expr::Var("roughness".into()), 0.0, 1.0) * last,
                )?;
                let fx = w.decl("fx", Type::Float, &x - floor(&x))?;
                let fy = w.decl("fy", Type::Float, &y - floor(&y))?;
                let i0 = w.decl("i0", Type::UInt, floor(&x).cast(Type::UInt))?;
                let j0 = w.decl("j0", Type::UInt, floor(&y).cast(Type::UInt))?;
                let i1 = w.decl("i1", Type::UInt, min(&i0 + 1u32, size - 1))?;
                let j1 = w.decl("j1", Type::UInt, min(&j0 + 1u32, size - 1))?;
                let at = |i: &Expr, j: &Expr| table.at((j * size) + i);
                let top = w.decl("top", Type::Float, mix(at(&i0, &j0), at(&i1, &j0), &fx))?;
                let bottom = w.decl("bottom", Type::Float, mix(at(&i0, &j1), at(&i1, &j1), &fx))?;
                w.ret(mix(top, bottom, fy))
            },
        )
    }

    /// Sheen response of one light: `vec2(intensity, albedo scaling)`.
    #[allow(clippy::too_many_arguments)]
    pub fn compute(
        &mut self,
        w: &mut ShaderWriter,
        helpers: &mut BrdfHelpers,
        radiance: &Expr,
        intensity: &Expr,
        surface: &LightSurface,
        sheen_factor: &Expr,
        sheen_roughness: &Expr,
    ) -> Result<Expr, ShadingError> {
        let scaling = self.albedo_scaling_fn(w)?;
        let visibility = self.visibility;
        let name = format!("c3d_{}computeSheen", self.prefix);
        let handle = self.functions.get_or_implement(
            w,
            "computeSheen",
            name,
            Type::Vec2,
            vec![
                Param::new("radiance", Type::Vec3),
                Param::new("intensity", Type::Vec2),
                Param::new("NdotH", Type::Float),
                Param::new("NdotV", Type::Float),
                Param::new("NdotL", Type::Float),
                Param::new("sheenFactor", Type::Vec3),
                Param::new("sheenRoughness", Type::Float),
            ],
            |w| {
                let ndot_v = Expr::Var("NdotV".into());
                let ndot_l = Expr::Var("NdotL".into());
                let factor = Expr::Var("sheenFactor".into());
                let roughness = Expr::Var("sheenRoughness".into());
                let alpha = w.decl("alpha", Type::Float, &roughness * &roughness)?;
                let d = helpers.distribution_charlie(w, Expr::Var("NdotH".into()), &alpha)?;
                let d = w.decl("D", Type::Float, d)?;
                let v = match visibility {
                    SheenVisibility::EstevezKulla => {
                        helpers.visibility_sheen(w, &ndot_v, &ndot_l, &alpha)?
                    }
                    SheenVisibility::Ashikhmin => {
                        helpers.visibility_ashikhmin(w, &ndot_l, &ndot_v)?
                    }
                };
                let v = w.decl("Vis", Type::Float, v)?;
                let luminance = dot(
                    Expr::Var("radiance".into()),
                    vec3(LUMINANCE[0], LUMINANCE[1], LUMINANCE[2]),
                );
                let lobe = w.decl(
                    "lobe",
                    Type::Float,
                    (&d * &v) * (&ndot_l * Expr::Var("intensity".into()).y()) * luminance,
                )?;
                let max_sheen = w.decl(
                    "maxSheen",
                    Type::Float,
                    max(max(factor.x(), factor.y()), factor.z()),
                )?;
                let lookup = |cosine: &Expr| scaling.call([cosine, &roughness]);
                let albedo_scaling = w.decl(
                    "albedoScaling",
                    Type::Float,
                    min(
                        1.0 - (&max_sheen * lookup(&ndot_v)),
                        1.0 - (&max_sheen * lookup(&ndot_l)),
                    ),
                )?;
                w.ret(vec2(lobe, albedo_scaling))
            },
        )?;
        Ok(handle.call([
            radiance.clone(),
            intensity.clone(),
            surface.ndot_h.clone(),
            surface.ndot_v.clone(),
            surface.ndot_l.clone(),
            sheen_factor.clone(),
            sheen_roughness.clone(),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::{Interpreter, Value};
    use approx::assert_relative_eq;

    #[test]
    fn test_table_entries_are_in_unit_range() {
        assert!(SHEEN_ALBEDO_SCALING.iter().all(|v| (0.0..=1.0).contains(v)));
        assert_eq!(SHEEN_ALBEDO_SCALING.len(), 256);
    }

    #[test]
    fn test_shader_lookup_matches_host_lookup() {
        let mut writer = ShaderWriter::new();
        let mut sheen = SheenBrdf::new("", SheenVisibility::default());
        writer
            .implement_function(
                "lookup",
                Type::Float,
                vec![Param::new("c", Type::Float), Param::new("r", Type::Float)],
                |w| {
                    let e = sheen.albedo_scaling(w, Expr::Var("c".into()), Expr::Var("r".into()))?;
                    w.ret(e)
                },
            )
            .unwrap();
        let module = writer.finish();
        let mut interpreter = Interpreter::new(&module).unwrap();
        for (c, r) in [(0.0, 0.0), (0.33, 0.5), (0.9, 0.95), (1.0, 1.0), (0.5, 0.2)] {
            let e = interpreter
                .call("lookup", vec![Value::Float(c), Value::Float(r)])
                .unwrap()
                .result
                .as_f32()
                .unwrap();
            assert_relative_eq!(e, sheen_albedo_scaling(c, r), epsilon = 1e-6);
        }
    }
}
