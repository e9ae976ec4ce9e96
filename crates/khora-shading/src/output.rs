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

//! The per-fragment lighting accumulator.

use khora_core::math::{Vec2, Vec3};

use crate::ast::{max, vec2_splat, vec3_splat, Expr, StructDecl, Type};
use crate::eval::Value;
use crate::{ShaderWriter, ShadingError};

/// Name of the accumulator struct in generated modules.
pub const OUTPUT_COMPONENTS: &str = "OutputComponents";

/// Typed view over an `OutputComponents` value.
///
/// Light functions write their local contribution into one of these and add
/// it to the caller's accumulator with [`accumulate`](Self::accumulate), which
/// clamps every component at zero.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputComponents {
    expr: Expr,
}

impl OutputComponents {
    /// Declares the struct in the writer's module.
    pub fn declare(writer: &mut ShaderWriter) -> Type {
        writer.declare_struct(StructDecl::new(
            OUTPUT_COMPONENTS,
            vec![
                ("diffuse", Type::Vec3),
                ("specular", Type::Vec3),
                ("scattering", Type::Vec3),
                ("coatingSpecular", Type::Vec3),
                ("sheen", Type::Vec2),
            ],
        ))
    }

    /// The shader type.
    pub fn ty() -> Type {
        Type::named(OUTPUT_COMPONENTS)
    }

    /// Wraps an expression of type `OutputComponents`.
    pub fn new(expr: Expr) -> Self {
        Self { expr }
    }

    /// Declares a zeroed local accumulator.
    pub fn local(writer: &mut ShaderWriter, name: &str) -> Result<Self, ShadingError> {
        Self::declare(writer);
        Ok(Self::new(writer.decl_zeroed(name, Self::ty())?))
    }

    /// The wrapped expression.
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Diffuse radiance.
    pub fn diffuse(&self) -> Expr {
        self.expr.field("diffuse")
    }

    /// Specular radiance.
    pub fn specular(&self) -> Expr {
        self.expr.field("specular")
    }

    /// Volumetric in-scattering.
    pub fn scattering(&self) -> Expr {
        self.expr.field("scattering")
    }

    /// Specular radiance of the clearcoat layer.
    pub fn coating_specular(&self) -> Expr {
        self.expr.field("coatingSpecular")
    }

    /// Sheen intensity in `x`, albedo scaling in `y`.
    pub fn sheen(&self) -> Expr {
        self.expr.field("sheen")
    }

    /// Adds `local` to this accumulator, every component clamped at zero.
    pub fn accumulate(
        &self,
        writer: &mut ShaderWriter,
        local: &OutputComponents,
    ) -> Result<(), ShadingError> {
        writer.add_assign(&self.diffuse(), max(local.diffuse(), vec3_splat(0.0)))?;
        writer.add_assign(&self.specular(), max(local.specular(), vec3_splat(0.0)))?;
        writer.add_assign(&self.scattering(), max(local.scattering(), vec3_splat(0.0)))?;
        writer.add_assign(
            &self.coating_specular(),
            max(local.coating_specular(), vec3_splat(0.0)),
        )?;
        writer.add_assign(&self.sheen(), max(local.sheen(), vec2_splat(0.0)))
    }
}

/// Host-side copy of an evaluated `OutputComponents`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OutputValues {
    /// Diffuse radiance.
    pub diffuse: Vec3,
    /// Specular radiance.
    pub specular: Vec3,
    /// Volumetric in-scattering.
    pub scattering: Vec3,
    /// Clearcoat specular radiance.
    pub coating_specular: Vec3,
    /// Sheen intensity and albedo scaling.
    pub sheen: Vec2,
}

impl OutputValues {
    /// The evaluator value of a zeroed accumulator.
    pub fn zero_value() -> Value {
        OutputValues::default().to_value()
    }

    /// Converts to an evaluator value.
    pub fn to_value(&self) -> Value {
        Value::Struct {
            name: OUTPUT_COMPONENTS.to_owned(),
            fields: vec![
                ("diffuse".to_owned(), self.diffuse.into()),
                ("specular".to_owned(), self.specular.into()),
                ("scattering".to_owned(), self.scattering.into()),
                ("coatingSpecular".to_owned(), self.coating_specular.into()),
                ("sheen".to_owned(), self.sheen.into()),
            ],
        }
    }

    /// Reads an evaluated accumulator back.
    pub fn from_value(value: &Value) -> Option<Self> {
        Some(Self {
            diffuse: value.field("diffuse")?.as_vec3()?,
            specular: value.field("specular")?.as_vec3()?,
            scattering: value.field("scattering")?.as_vec3()?,
            coating_specular: value.field("coatingSpecular")?.as_vec3()?,
            sheen: value.field("sheen")?.as_vec2()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{var, Param};
    use crate::eval::Interpreter;

    #[test]
    fn test_accumulate_clamps_negative_contributions() {
        let mut writer = ShaderWriter::new();
        OutputComponents::declare(&mut writer);
        writer
            .implement_function(
                "add",
                Type::Void,
                vec![
                    Param::new("local", OutputComponents::ty()),
                    Param::inout("output", OutputComponents::ty()),
                ],
                |w| {
                    let output = OutputComponents::new(var("output"));
                    output.accumulate(w, &OutputComponents::new(var("local")))
                },
            )
            .unwrap();
        let module = writer.finish();

        let local = OutputValues {
            diffuse: Vec3::new(0.5, -1.0, 0.25),
            specular: Vec3::new(-0.1, 0.2, 0.0),
            sheen: Vec2::new(-2.0, 0.5),
            ..Default::default()
        };
        let mut interpreter = Interpreter::new(&module).unwrap();
        let invocation = interpreter
            .call("add", vec![local.to_value(), OutputValues::zero_value()])
            .unwrap();
        let output = OutputValues::from_value(invocation.inout("output").unwrap()).unwrap();
        assert_eq!(output.diffuse, Vec3::new(0.5, 0.0, 0.25));
        assert_eq!(output.specular, Vec3::new(0.0, 0.2, 0.0));
        assert_eq!(output.sheen, Vec2::new(0.0, 0.5));
    }
}
