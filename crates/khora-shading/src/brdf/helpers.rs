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

//! Stateless BRDF building blocks, each written once per module.

use std::f32::consts::PI;

use crate::ast::{
    abs, clamp, cos, dot, exp, float, max, mix, pow, reverse_bits, sin, sqrt, vec3_splat, vec4,
    Expr, Param, Type,
};
use crate::writer::FunctionCache;
use crate::{FunctionHandle, ShaderWriter, ShadingError};

/// Smallest alpha fed to the microfacet distributions.
pub const MIN_ALPHA: f32 = 1e-3;
/// Floor of `sin²θh` in the Charlie distribution.
pub const MIN_SIN2_THETA_H: f32 = 0.007_812_5;
/// Scale of the f0 dot product giving the Fresnel reflectance at grazing angles.
pub const F90_SCALE: f32 = 16.5;

/// Memoized microfacet helpers: distributions, visibility terms, Fresnel,
/// importance sampling and low-discrepancy sequences.
///
/// ```
/// use khora_shading::brdf::BrdfHelpers;
/// use khora_shading::ast::{float, Type};
/// use khora_shading::ShaderWriter;
///
/// let mut writer = ShaderWriter::new();
/// let mut helpers = BrdfHelpers::new("");
/// writer
///     .implement_function("f", Type::Float, vec![], |w| {
///         let d = helpers.distribution_ggx(w, float(1.0), float(0.25))?;
///         w.ret(d)
///     })
///     .unwrap();
/// assert!(writer.module().function("c3d_distributionGGX").is_some());
/// ```
#[derive(Debug, Default)]
pub struct BrdfHelpers {
    prefix: String,
    functions: FunctionCache<&'static str>,
}

impl BrdfHelpers {
    /// Creates the helpers, generated function names start with `c3d_{prefix}`.
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_owned(),
            functions: FunctionCache::new(),
        }
    }

    fn function<F>(
        &mut self,
        w: &mut ShaderWriter,
        key: &'static str,
        ret: Type,
        params: Vec<Param>,
        body: F,
    ) -> Result<FunctionHandle, ShadingError>
    where
        F: FnOnce(&mut ShaderWriter) -> Result<(), ShadingError>,
    {
        let name = format!("c3d_{}{}", self.prefix, key);
        self.functions.get_or_implement(w, key, name, ret, params, body)
    }

    /// GGX / Trowbridge-Reitz normal distribution.
    pub fn distribution_ggx(
        &mut self,
        w: &mut ShaderWriter,
        ndot_h: impl Into<Expr>,
        alpha: impl Into<Expr>,
    ) -> Result<Expr, ShadingError> {
        let handle = self.distribution_ggx_fn(w)?;
        Ok(handle.call([ndot_h.into(), alpha.into()]))
    }

    fn distribution_ggx_fn(
        &mut self,
        w: &mut ShaderWriter,
    ) -> Result<FunctionHandle, ShadingError> {
        self.function(
            w,
            "distributionGGX",
            Type::Float,
            vec![Param::new("NdotH", Type::Float), Param::new("alpha", Type::Float)],
            |w| {
                let ndot_h = Expr::Var("NdotH".into());
                let a = w.decl("a", Type::Float, max(Expr::Var("alpha".into()), MIN_ALPHA))?;
                let a2 = w.decl("a2", Type::Float, &a * &a)?;
                let denom = w.decl(
                    "denom",
                    Type::Float,
                    (&ndot_h * &ndot_h) * (&a2 - 1.0) + 1.0,
                )?;
                w.ret(&a2 / (PI * (&denom * &denom)))
            },
        )
    }

    /// Charlie sheen distribution.
    pub fn distribution_charlie(
        &mut self,
        w: &mut ShaderWriter,
        ndot_h: impl Into<Expr>,
        alpha: impl Into<Expr>,
    ) -> Result<Expr, ShadingError> {
        let handle = self.distribution_charlie_fn(w)?;
        Ok(handle.call([ndot_h.into(), alpha.into()]))
    }

    fn distribution_charlie_fn(
        &mut self,
        w: &mut ShaderWriter,
    ) -> Result<FunctionHandle, ShadingError> {
        self.function(
            w,
            "distributionCharlie",
            Type::Float,
            vec![Param::new("NdotH", Type::Float), Param::new("alpha", Type::Float)],
            |w| {
                let ndot_h = Expr::Var("NdotH".into());
                let inv_r = w.decl(
                    "invR",
                    Type::Float,
                    1.0 / max(Expr::Var("alpha".into()), MIN_ALPHA),
                )?;
                let sin2h = w.decl(
                    "sin2h",
                    Type::Float,
                    max(1.0 - (&ndot_h * &ndot_h), MIN_SIN2_THETA_H),
                )?;
                w.ret((2.0 + &inv_r) * pow(&sin2h, &inv_r * 0.5) / (2.0 * PI))
            },
        )
    }

    /// Schlick-GGX geometric shadowing of one direction, `k = (r + 1)² / 8`.
    pub fn visibility_schlick_ggx(
        &mut self,
        w: &mut ShaderWriter,
        product: impl Into<Expr>,
        roughness: impl Into<Expr>,
    ) -> Result<Expr, ShadingError> {
        let handle = self.function(
            w,
            "visibilitySchlickGGX",
            Type::Float,
            vec![Param::new("product", Type::Float), Param::new("roughness", Type::Float)],
            |w| {
                let product = Expr::Var("product".into());
                let r = w.decl("r", Type::Float, Expr::Var("roughness".into()) + 1.0)?;
                let k = w.decl("k", Type::Float, (&r * &r) / 8.0)?;
                w.ret(&product / ((&product * (1.0 - &k)) + &k))
            },
        )?;
        Ok(handle.call([product.into(), roughness.into()]))
    }

    /// Height-correlated Smith visibility, already divided by `4 NdotV NdotL`.
    pub fn visibility_smith_ggx_correlated(
        &mut self,
        w: &mut ShaderWriter,
        ndot_v: impl Into<Expr>,
        ndot_l: impl Into<Expr>,
        roughness: impl Into<Expr>,
    ) -> Result<Expr, ShadingError> {
        let handle = self.function(
            w,
            "visibilitySmithGGXCorrelated",
            Type::Float,
            vec![
                Param::new("NdotV", Type::Float),
                Param::new("NdotL", Type::Float),
                Param::new("roughness", Type::Float),
            ],
            |w| {
                let ndot_v = Expr::Var("NdotV".into());
                let ndot_l = Expr::Var("NdotL".into());
                let roughness = Expr::Var("roughness".into());
                let alpha = w.decl("alpha", Type::Float, &roughness * &roughness)?;
                let a2 = w.decl("a2", Type::Float, &alpha * &alpha)?;
                let ggxv = w.decl(
                    "GGXV",
                    Type::Float,
                    &ndot_l * sqrt((&ndot_v * &ndot_v) * (1.0 - &a2) + &a2),
                )?;
                let ggxl = w.decl(
                    "GGXL",
                    Type::Float,
                    &ndot_v * sqrt((&ndot_l * &ndot_l) * (1.0 - &a2) + &a2),
                )?;
                w.ret(0.5 / (&ggxv + &ggxl + 1e-5))
            },
        )?;
        Ok(handle.call([ndot_v.into(), ndot_l.into(), roughness.into()]))
    }

    /// Ashikhmin sheen visibility.
    pub fn visibility_ashikhmin(
        &mut self,
        w: &mut ShaderWriter,
        ndot_l: impl Into<Expr>,
        ndot_v: impl Into<Expr>,
    ) -> Result<Expr, ShadingError> {
        let handle = self.function(
            w,
            "visibilityAshikhmin",
            Type::Float,
            vec![Param::new("NdotL", Type::Float), Param::new("NdotV", Type::Float)],
            |w| {
                let ndot_l = Expr::Var("NdotL".into());
                let ndot_v = Expr::Var("NdotV".into());
                let denom = 4.0 * (&ndot_l + &ndot_v - (&ndot_l * &ndot_v));
                w.ret(clamp(1.0 / max(denom, 1e-5), 0.0, 1.0))
            },
        )?;
        Ok(handle.call([ndot_l.into(), ndot_v.into()]))
    }

    fn lambda_sheen_numeric_fn(
        &mut self,
        w: &mut ShaderWriter,
    ) -> Result<FunctionHandle, ShadingError> {
        self.function(
            w,
            "lambdaSheenNumericHelper",
            Type::Float,
            vec![Param::new("x", Type::Float), Param::new("alpha", Type::Float)],
            |w| {
                let x = Expr::Var("x".into());
                let one_minus = w.decl(
                    "oneMinusAlphaSq",
                    Type::Float,
                    (1.0 - Expr::Var("alpha".into())) * (1.0 - Expr::Var("alpha".into())),
                )?;
                let a = w.decl("a", Type::Float, mix(21.5473, 25.3245, &one_minus))?;
                let b = w.decl("b", Type::Float, mix(3.82987, 3.32435, &one_minus))?;
                let c = w.decl("c", Type::Float, mix(0.19823, 0.16801, &one_minus))?;
                let d = w.decl("d", Type::Float, mix(-1.97760, -1.27393, &one_minus))?;
                let e = w.decl("e", Type::Float, mix(-4.32054, -4.85967, &one_minus))?;
                w.ret(&a / (1.0 + &b * pow(&x, &c)) + &d * &x + &e)
            },
        )
    }

    /// Estevez-Kulla sheen lambda term.
    pub fn lambda_sheen(
        &mut self,
        w: &mut ShaderWriter,
        cos_theta: impl Into<Expr>,
        alpha: impl Into<Expr>,
    ) -> Result<Expr, ShadingError> {
        let handle = self.lambda_sheen_fn(w)?;
        Ok(handle.call([cos_theta.into(), alpha.into()]))
    }

    fn lambda_sheen_fn(&mut self, w: &mut ShaderWriter) -> Result<FunctionHandle, ShadingError> {
        let numeric = self.lambda_sheen_numeric_fn(w)?;
        self.function(
            w,
            "lambdaSheen",
            Type::Float,
            vec![Param::new("cosTheta", Type::Float), Param::new("alpha", Type::Float)],
            move |w| {
                let cos_theta = Expr::Var("cosTheta".into());
                let alpha = Expr::Var("alpha".into());
                w.if_(abs(&cos_theta).lt(0.5), |w| {
                    w.ret(exp(numeric.call([&cos_theta, &alpha])))
                })?;
                w.ret(exp(
                    2.0 * numeric.call([float(0.5), alpha.clone()])
                        - numeric.call([1.0 - &cos_theta, alpha.clone()]),
                ))
            },
        )
    }

    /// Estevez-Kulla sheen visibility.
    pub fn visibility_sheen(
        &mut self,
        w: &mut ShaderWriter,
        ndot_v: impl Into<Expr>,
        ndot_l: impl Into<Expr>,
        alpha: impl Into<Expr>,
    ) -> Result<Expr, ShadingError> {
        let lambda = self.lambda_sheen_fn(w)?;
        let handle = self.function(
            w,
            "visibilitySheen",
            Type::Float,
            vec![
                Param::new("NdotV", Type::Float),
                Param::new("NdotL", Type::Float),
                Param::new("alpha", Type::Float),
            ],
            move |w| {
                let ndot_v = Expr::Var("NdotV".into());
                let ndot_l = Expr::Var("NdotL".into());
                let alpha = Expr::Var("alpha".into());
                let denom = (1.0 + lambda.call([&ndot_v, &alpha]) + lambda.call([&ndot_l, &alpha]))
                    * (4.0 * &ndot_v * &ndot_l);
                w.ret(clamp(1.0 / max(denom, 1e-5), 0.0, 1.0))
            },
        )?;
        Ok(handle.call([ndot_v.into(), ndot_l.into(), alpha.into()]))
    }

    /// Schlick Fresnel with `f90` derived from `f0`.
    pub fn fresnel_schlick(
        &mut self,
        w: &mut ShaderWriter,
        product: impl Into<Expr>,
        f0: impl Into<Expr>,
    ) -> Result<Expr, ShadingError> {
        let handle = self.function(
            w,
            "fresnelSchlick",
            Type::Vec3,
            vec![Param::new("product", Type::Float), Param::new("f0", Type::Vec3)],
            |w| {
                let f0 = Expr::Var("f0".into());
                let f90 = w.decl(
                    "f90",
                    Type::Float,
                    clamp(dot(&f0, vec3_splat(F90_SCALE)), 0.0, 1.0),
                )?;
                let t = w.decl(
                    "t",
                    Type::Float,
                    pow(clamp(1.0 - Expr::Var("product".into()), 0.0, 1.0), 5.0),
                )?;
                w.ret(&f0 + (max(vec3_splat(&f90), &f0) - &f0) * &t)
            },
        )?;
        Ok(handle.call([product.into(), f0.into()]))
    }

    /// Van der Corput radical inverse of `bits`.
    pub fn radical_inverse(
        &mut self,
        w: &mut ShaderWriter,
        bits: impl Into<Expr>,
    ) -> Result<Expr, ShadingError> {
        let handle = self.radical_inverse_fn(w)?;
        Ok(handle.call([bits.into()]))
    }

    fn radical_inverse_fn(&mut self, w: &mut ShaderWriter) -> Result<FunctionHandle, ShadingError> {
        self.function(
            w,
            "radicalInverse",
            Type::Float,
            vec![Param::new("bits", Type::UInt)],
            |w| {
                w.ret(
                    reverse_bits(Expr::Var("bits".into())).cast(Type::Float)
                        * 2.328_306_4e-10,
                )
            },
        )
    }

    /// The `i`-th point of an `n` point Hammersley set.
    pub fn hammersley(
        &mut self,
        w: &mut ShaderWriter,
        i: impl Into<Expr>,
        n: impl Into<Expr>,
    ) -> Result<Expr, ShadingError> {
        let radical = self.radical_inverse_fn(w)?;
        let handle = self.function(
            w,
            "hammersley",
            Type::Vec2,
            vec![Param::new("i", Type::UInt), Param::new("n", Type::UInt)],
            move |w| {
                let i = Expr::Var("i".into());
                let n = Expr::Var("n".into());
                w.ret(crate::ast::vec2(
                    i.cast(Type::Float) / n.cast(Type::Float),
                    radical.call([i]),
                ))
            },
        )?;
        Ok(handle.call([i.into(), n.into()]))
    }

    /// GGX importance sample of `xi`: `vec4(phi, cosTheta, sinTheta, pdf)`.
    pub fn importance_sample_ggx(
        &mut self,
        w: &mut ShaderWriter,
        xi: impl Into<Expr>,
        roughness: impl Into<Expr>,
    ) -> Result<Expr, ShadingError> {
        let distribution = self.distribution_ggx_fn(w)?;
        let handle = self.function(
            w,
            "importanceSampleGGX",
            Type::Vec4,
            vec![Param::new("xi", Type::Vec2), Param::new("roughness", Type::Float)],
            move |w| {
                let xi = Expr::Var("xi".into());
                let roughness = Expr::Var("roughness".into());
                let alpha = w.decl("alpha", Type::Float, &roughness * &roughness)?;
                let phi = w.decl("phi", Type::Float, 2.0 * PI * xi.x())?;
                let cos_theta = w.decl(
                    "cosTheta",
                    Type::Float,
                    clamp(
                        sqrt((1.0 - xi.y()) / (1.0 + ((&alpha * &alpha) - 1.0) * xi.y())),
                        0.0,
                        1.0,
                    ),
                )?;
                let sin_theta = w.decl(
                    "sinTheta",
                    Type::Float,
                    sqrt(1.0 - (&cos_theta * &cos_theta)),
                )?;
                let pdf = w.decl(
                    "pdf",
                    Type::Float,
                    distribution.call([&cos_theta, &alpha]) / 4.0,
                )?;
                w.ret(vec4(phi, cos_theta, sin_theta, pdf))
            },
        )?;
        Ok(handle.call([xi.into(), roughness.into()]))
    }

    /// Charlie importance sample of `xi`: `vec4(phi, cosTheta, sinTheta, pdf)`.
    pub fn importance_sample_charlie(
        &mut self,
        w: &mut ShaderWriter,
        xi: impl Into<Expr>,
        roughness: impl Into<Expr>,
    ) -> Result<Expr, ShadingError> {
        let distribution = self.distribution_charlie_fn(w)?;
        let handle = self.function(
            w,
            "importanceSampleCharlie",
            Type::Vec4,
            vec![Param::new("xi", Type::Vec2), Param::new("roughness", Type::Float)],
            move |w| {
                let xi = Expr::Var("xi".into());
                let roughness = Expr::Var("roughness".into());
                let alpha = w.decl(
                    "alpha",
                    Type::Float,
                    max(&roughness * &roughness, MIN_ALPHA),
                )?;
                let phi = w.decl("phi", Type::Float, 2.0 * PI * xi.x())?;
                let sin_theta = w.decl(
                    "sinTheta",
                    Type::Float,
                    pow(xi.y(), &alpha / ((2.0 * &alpha) + 1.0)),
                )?;
                let cos_theta = w.decl(
                    "cosTheta",
                    Type::Float,
                    sqrt(1.0 - (&sin_theta * &sin_theta)),
                )?;
                let pdf = w.decl(
                    "pdf",
                    Type::Float,
                    distribution.call([&cos_theta, &alpha]) / 4.0,
                )?;
                w.ret(vec4(phi, cos_theta, sin_theta, pdf))
            },
        )?;
        Ok(handle.call([xi.into(), roughness.into()]))
    }

    /// Tangent-space direction of an importance sample returned by
    /// [`importance_sample_ggx`](Self::importance_sample_ggx).
    pub fn sample_direction(sample: &Expr) -> Expr {
        let phi = sample.x();
        crate::ast::vec3(
            sample.z() * cos(&phi),
            sample.z() * sin(&phi),
            sample.y(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::{Interpreter, Value};
    use approx::assert_relative_eq;

    fn scalar_module(
        build: impl FnOnce(&mut ShaderWriter, &mut BrdfHelpers),
    ) -> crate::ast::ShaderModule {
        let mut writer = ShaderWriter::new();
        let mut helpers = BrdfHelpers::new("");
        build(&mut writer, &mut helpers);
        writer.finish()
    }

    fn call(module: &crate::ast::ShaderModule, name: &str, args: Vec<Value>) -> Value {
        Interpreter::new(module).unwrap().call(name, args).unwrap().result
    }

    #[test]
    fn test_ggx_is_finite_for_vanishing_roughness() {
        let module = scalar_module(|w, helpers| {
            w.implement_function(
                "ggx",
                Type::Float,
                vec![Param::new("r", Type::Float)],
                |w| {
                    let r = Expr::Var("r".into());
                    let d = helpers.distribution_ggx(w, 1.0, &r * &r)?;
                    w.ret(d)
                },
            )
            .unwrap();
        });
        for r in [1.0, 0.5, 0.1, 0.01, 0.0] {
            let d = call(&module, "ggx", vec![Value::Float(r)]).as_f32().unwrap();
            assert!(d.is_finite() && d > 0.0, "D({r}) = {d}");
        }
        let d = call(&module, "ggx", vec![Value::Float(1.0)]).as_f32().unwrap();
        assert_relative_eq!(d, 1.0 / PI, epsilon = 1e-6);
    }

    #[test]
    fn test_helpers_are_written_once() {
        let module = scalar_module(|w, helpers| {
            w.implement_function("f", Type::Float, vec![], |w| {
                let a = helpers.distribution_ggx(w, 1.0, 0.5)?;
                let b = helpers.distribution_ggx(w, 0.5, 0.5)?;
                let c = helpers.importance_sample_ggx(w, crate::ast::vec2(0.5, 0.5), 0.5)?;
                w.ret(a + b + c.w())
            })
            .unwrap();
        });
        let count = module
            .functions
            .iter()
            .filter(|f| f.name == "c3d_distributionGGX")
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_fresnel_schlick() {
        let module = scalar_module(|w, helpers| {
            w.implement_function(
                "fresnel",
                Type::Vec3,
                vec![Param::new("product", Type::Float)],
                |w| {
                    let f = helpers.fresnel_schlick(
                        w,
                        Expr::Var("product".into()),
                        vec3_splat(0.04),
                    )?;
                    w.ret(f)
                },
            )
            .unwrap();
        });
        let normal = call(&module, "fresnel", vec![Value::Float(1.0)]).as_vec3().unwrap();
        assert_relative_eq!(normal.x, 0.04, epsilon = 1e-6);
        let grazing = call(&module, "fresnel", vec![Value::Float(0.0)]).as_vec3().unwrap();
        assert_relative_eq!(grazing.y, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_visibility_terms_are_bounded() {
        let module = scalar_module(|w, helpers| {
            w.implement_function(
                "vis",
                Type::Vec4,
                vec![Param::new("c", Type::Float), Param::new("r", Type::Float)],
                |w| {
                    let c = Expr::Var("c".into());
                    let r = Expr::Var("r".into());
                    let schlick = helpers.visibility_schlick_ggx(w, &c, &r)?;
                    let smith = helpers.visibility_smith_ggx_correlated(w, &c, &c, &r)?;
                    let ashikhmin = helpers.visibility_ashikhmin(w, &c, &c)?;
                    let sheen = helpers.visibility_sheen(w, &c, &c, &r * &r)?;
                    w.ret(vec4(schlick, smith, ashikhmin, sheen))
                },
            )
            .unwrap();
        });
        for c in [0.05, 0.3, 0.7, 1.0] {
            for r in [0.05, 0.5, 1.0] {
                let v = call(&module, "vis", vec![Value::Float(c), Value::Float(r)])
                    .as_vec4()
                    .unwrap();
                assert!(v.x > 0.0 && v.x <= 1.0);
                assert!(v.y.is_finite() && v.y > 0.0);
                assert!((0.0..=1.0).contains(&v.z));
                assert!((0.0..=1.0).contains(&v.w));
            }
        }
    }

    #[test]
    fn test_hammersley_sequence() {
        let module = scalar_module(|w, helpers| {
            w.implement_function(
                "h",
                Type::Vec2,
                vec![Param::new("i", Type::UInt)],
                |w| {
                    let h = helpers.hammersley(w, Expr::Var("i".into()), 4u32)?;
                    w.ret(h)
                },
            )
            .unwrap();
        });
        let first = call(&module, "h", vec![Value::UInt(1)]).as_vec2().unwrap();
        assert_relative_eq!(first.x, 0.25);
        assert_relative_eq!(first.y, 0.5);
        let second = call(&module, "h", vec![Value::UInt(2)]).as_vec2().unwrap();
        assert_relative_eq!(second.y, 0.25);
    }

    #[test]
    fn test_charlie_importance_sample_is_normalized() {
        let module = scalar_module(|w, helpers| {
            w.implement_function("s", Type::Vec4, vec![], |w| {
                let s = helpers.importance_sample_charlie(w, crate::ast::vec2(0.3, 0.6), 0.5)?;
                w.ret(s)
            })
            .unwrap();
        });
        let s = call(&module, "s", vec![]).as_vec4().unwrap();
        assert_relative_eq!(s.y * s.y + s.z * s.z, 1.0, epsilon = 1e-5);
        assert!(s.w > 0.0);
    }
}
