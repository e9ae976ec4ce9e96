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

//! WGSL emission for a [`ShaderModule`].
//!
//! Binary operations are always parenthesized, so the emitted text does not
//! depend on WGSL precedence rules. `InOut` parameters are lowered to
//! `ptr<function, T>`: reads and writes go through `(*name)` and call sites
//! pass the address of the argument.

use std::fmt::Write;

use ahash::AHashSet;

use crate::ast::{
    Block, Expr, Function, GlobalKind, Literal, ParamKind, ShaderModule, Stmt, TextureKind,
    TextureSample, Type, UnaryOp,
};
use crate::ShadingError;

const INDENT: &str = "    ";

/// Emits `module` as WGSL, with every resource bound in `bind_group`.
///
/// # Errors
/// [`ShadingError::UnknownFunction`] when a call names a function the module
/// does not contain.
pub fn emit(module: &ShaderModule, bind_group: u32) -> Result<String, ShadingError> {
    let mut emitter = Emitter {
        module,
        out: String::new(),
        pointers: AHashSet::new(),
    };
    emitter.module(bind_group)?;
    log::debug!(
        "WGSL: emitted {} functions, {} bytes",
        module.functions.len(),
        emitter.out.len()
    );
    Ok(emitter.out)
}

struct Emitter<'a> {
    module: &'a ShaderModule,
    out: String,
    pointers: AHashSet<String>,
}

impl Emitter<'_> {
    fn module(&mut self, bind_group: u32) -> Result<(), ShadingError> {
        for decl in &self.module.structs {
            let _ = writeln!(self.out, "struct {} {{", decl.name);
            for (name, ty) in &decl.fields {
                let _ = writeln!(self.out, "{INDENT}{name}: {ty},");
            }
            self.out.push_str("}\n\n");
        }

        let mut binding = 0;
        for global in &self.module.globals {
            if global.kind.is_resource() {
                let _ = write!(self.out, "@group({bind_group}) @binding({binding}) ");
                binding += 1;
            }
            let name = &global.name;
            match &global.kind {
                GlobalKind::Storage(ty) => {
                    let _ = writeln!(self.out, "var<storage, read> {name}: {ty};");
                }
                GlobalKind::Uniform(ty) => {
                    let _ = writeln!(self.out, "var<uniform> {name}: {ty};");
                }
                GlobalKind::Texture(kind) => {
                    let _ = writeln!(self.out, "var {name}: {kind};");
                }
                GlobalKind::Sampler { comparison } => {
                    let sampler = if *comparison {
                        "sampler_comparison"
                    } else {
                        "sampler"
                    };
                    let _ = writeln!(self.out, "var {name}: {sampler};");
                }
                GlobalKind::Private { ty, init } => match init {
                    Some(init) => {
                        let init = self.expr(init)?;
                        let _ = writeln!(self.out, "var<private> {name}: {ty} = {init};");
                    }
                    None => {
                        let _ = writeln!(self.out, "var<private> {name}: {ty};");
                    }
                },
            }
        }
        if !self.module.globals.is_empty() {
            self.out.push('\n');
        }

        for function in &self.module.functions {
            self.function(function)?;
        }
        Ok(())
    }

    fn function(&mut self, function: &Function) -> Result<(), ShadingError> {
        self.pointers = function
            .params
            .iter()
            .filter(|p| p.kind == ParamKind::InOut)
            .map(|p| p.name.clone())
            .collect();

        let params = function
            .params
            .iter()
            .map(|p| match p.kind {
                ParamKind::In => format!("{}: {}", p.name, p.ty),
                ParamKind::InOut => format!("{}: ptr<function, {}>", p.name, p.ty),
            })
            .collect::<Vec<_>>()
            .join(", ");
        let _ = write!(self.out, "fn {}({})", function.name, params);
        if function.ret != Type::Void {
            let _ = write!(self.out, " -> {}", function.ret);
        }
        self.out.push_str(" {\n");
        self.block(&function.body, 1)?;
        self.out.push_str("}\n\n");
        Ok(())
    }

    fn block(&mut self, block: &Block, depth: usize) -> Result<(), ShadingError> {
        for stmt in block {
            self.stmt(stmt, depth)?;
        }
        Ok(())
    }

    fn line(&mut self, depth: usize, text: &str) {
        for _ in 0..depth {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn stmt(&mut self, stmt: &Stmt, depth: usize) -> Result<(), ShadingError> {
        match stmt {
            Stmt::Let { name, ty, init } => {
                let text = match init {
                    Some(init) => format!("var {name}: {ty} = {};", self.expr(init)?),
                    None => format!("var {name}: {ty};"),
                };
                self.line(depth, &text);
            }
            Stmt::Assign { target, op, value } => {
                let target = self.expr(target)?;
                let value = self.expr(value)?;
                let op = op.map(|op| op.symbol()).unwrap_or("");
                self.line(depth, &format!("{target} {op}= {value};"));
            }
            Stmt::If {
                condition,
                then,
                otherwise,
            } => {
                let condition = self.expr(condition)?;
                self.line(depth, &format!("if ({condition}) {{"));
                self.block(then, depth + 1)?;
                if let Some(otherwise) = otherwise {
                    self.line(depth, "} else {");
                    self.block(otherwise, depth + 1)?;
                }
                self.line(depth, "}");
            }
            Stmt::For {
                var,
                ty,
                start,
                end,
                body,
            } => {
                let start = self.expr(start)?;
                let end = self.expr(end)?;
                let one = if *ty == Type::Int { "1i" } else { "1u" };
                let step = format!("{var} = {var} + {one}");
                self.line(
                    depth,
                    &format!("for (var {var}: {ty} = {start}; {var} < {end}; {step}) {{"),
                );
                self.block(body, depth + 1)?;
                self.line(depth, "}");
            }
            Stmt::While { condition, body } => {
                let condition = self.expr(condition)?;
                self.line(depth, &format!("while ({condition}) {{"));
                self.block(body, depth + 1)?;
                self.line(depth, "}");
            }
            Stmt::Break => self.line(depth, "break;"),
            Stmt::Continue => self.line(depth, "continue;"),
            Stmt::Return(None) => self.line(depth, "return;"),
            Stmt::Return(Some(value)) => {
                let value = self.expr(value)?;
                self.line(depth, &format!("return {value};"));
            }
            Stmt::Expr(expr) => {
                let text = self.expr(expr)?;
                match expr {
                    Expr::Call(..) => self.line(depth, &format!("{text};")),
                    _ => self.line(depth, &format!("_ = {text};")),
                }
            }
        }
        Ok(())
    }

    fn exprs(&mut self, exprs: &[Expr]) -> Result<String, ShadingError> {
        let parts = exprs
            .iter()
            .map(|e| self.expr(e))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(parts.join(", "))
    }

    fn expr(&mut self, expr: &Expr) -> Result<String, ShadingError> {
        Ok(match expr {
            Expr::Literal(literal) => literal_text(*literal),
            Expr::Var(name) if self.pointers.contains(name) => format!("(*{name})"),
            Expr::Var(name) => name.clone(),
            Expr::Unary(op, operand) => {
                let operand = self.expr(operand)?;
                match op {
                    UnaryOp::Neg => format!("(-{operand})"),
                    UnaryOp::Not => format!("(!{operand})"),
                }
            }
            Expr::Binary(op, lhs, rhs) => {
                format!("({} {} {})", self.expr(lhs)?, op.symbol(), self.expr(rhs)?)
            }
            Expr::Call(name, args) => self.call(name, args)?,
            Expr::Intrinsic(op, args) => format!("{}({})", op.wgsl_name(), self.exprs(args)?),
            Expr::Construct(ty, args) => format!("{}({})", ty, self.exprs(args)?),
            Expr::Swizzle(base, components) => {
                let swizzle: String = components
                    .iter()
                    .map(|&c| ['x', 'y', 'z', 'w'][usize::from(c.min(3))])
                    .collect();
                format!("{}.{}", self.expr(base)?, swizzle)
            }
            Expr::Field(base, field) => format!("{}.{}", self.expr(base)?, field),
            Expr::Index(base, index) => format!("{}[{}]", self.expr(base)?, self.expr(index)?),
            Expr::Select {
                condition,
                accept,
                reject,
            } => format!(
                "select({}, {}, {})",
                self.expr(reject)?,
                self.expr(accept)?,
                self.expr(condition)?
            ),
            Expr::Texture(sample) => self.texture(sample)?,
        })
    }

    fn call(&mut self, name: &str, args: &[Expr]) -> Result<String, ShadingError> {
        let module = self.module;
        let callee = module
            .function(name)
            .ok_or_else(|| ShadingError::UnknownFunction(name.to_owned()))?;
        let mut parts = Vec::with_capacity(args.len());
        for (index, arg) in args.iter().enumerate() {
            let by_pointer = callee
                .params
                .get(index)
                .is_some_and(|p| p.kind == ParamKind::InOut);
            let text = match arg {
                Expr::Var(var) if by_pointer && self.pointers.contains(var) => var.clone(),
                _ if by_pointer => format!("&{}", self.expr(arg)?),
                _ => self.expr(arg)?,
            };
            parts.push(text);
        }
        Ok(format!("{}({})", name, parts.join(", ")))
    }

    fn texture_kind(&self, name: &str) -> Option<TextureKind> {
        match self.module.global(name).map(|g| &g.kind) {
            Some(GlobalKind::Texture(kind)) => Some(*kind),
            _ => None,
        }
    }

    fn texture(&mut self, sample: &TextureSample) -> Result<String, ShadingError> {
        match sample {
            TextureSample::Sample {
                texture,
                sampler,
                coords,
                layer,
                level,
            } => {
                let mut args = vec![texture.clone(), sampler.clone(), self.expr(coords)?];
                if let Some(layer) = layer {
                    args.push(format!("i32({})", self.expr(layer)?));
                }
                let level = self.expr(level)?;
                // Depth textures take an integer mip level.
                if self.texture_kind(texture).is_some_and(TextureKind::is_depth) {
                    args.push(format!("i32({level})"));
                } else {
                    args.push(level);
                }
                Ok(format!("textureSampleLevel({})", args.join(", ")))
            }
            TextureSample::Compare {
                texture,
                sampler,
                coords,
                layer,
                depth_ref,
            } => {
                let mut args = vec![texture.clone(), sampler.clone(), self.expr(coords)?];
                if let Some(layer) = layer {
                    args.push(format!("i32({})", self.expr(layer)?));
                }
                args.push(self.expr(depth_ref)?);
                Ok(format!("textureSampleCompareLevel({})", args.join(", ")))
            }
        }
    }
}

fn literal_text(literal: Literal) -> String {
    match literal {
        Literal::Bool(value) => value.to_string(),
        Literal::Int(value) if value < 0 => format!("({value}i)"),
        Literal::Int(value) => format!("{value}i"),
        Literal::UInt(value) => format!("{value}u"),
        Literal::Float(value) => {
            // `Debug` always keeps a decimal point or an exponent.
            let text = format!("{value:?}");
            if value < 0.0 {
                format!("({text})")
            } else {
                text
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{dot, float, max, var, Param, StructDecl};
    use crate::ShaderWriter;

    #[test]
    fn test_literal_text() {
        assert_eq!(literal_text(Literal::Float(1.0)), "1.0");
        assert_eq!(literal_text(Literal::Float(-0.5)), "(-0.5)");
        assert_eq!(literal_text(Literal::Float(1e-5)), "1e-5");
        assert_eq!(literal_text(Literal::UInt(3)), "3u");
        assert_eq!(literal_text(Literal::Int(-2)), "(-2i)");
    }

    #[test]
    fn test_emit_function_with_pointer_parameter() {
        let mut writer = ShaderWriter::new();
        writer.declare_struct(StructDecl::new("Acc", vec![("value", Type::Float)]));
        let add = writer
            .implement_function(
                "accumulate",
                Type::Void,
                vec![
                    Param::new("x", Type::Vec3),
                    Param::inout("acc", Type::named("Acc")),
                ],
                |w| w.add_assign(&var("acc").field("value"), max(dot(var("x"), var("x")), 0.0)),
            )
            .unwrap();
        writer
            .implement_function("main", Type::Float, vec![], |w| {
                let acc = w.decl_zeroed("acc", Type::named("Acc"))?;
                w.call(add.call([var("x_unused"), acc.clone()]))?;
                w.ret(acc.field("value"))
            })
            .unwrap();
        let text = emit(writer.module(), 0).unwrap();
        assert!(text.contains("struct Acc {"));
        assert!(text.contains("fn accumulate(x: vec3<f32>, acc: ptr<function, Acc>) {"));
        assert!(text.contains("(*acc).value += max(dot(x, x), 0.0);"));
        assert!(text.contains("accumulate(x_unused, &acc);"));
        assert!(text.contains("fn main() -> f32 {"));
    }

    #[test]
    fn test_emit_bindings_are_sequential() {
        let mut writer = ShaderWriter::new();
        writer.declare_global(
            "lights",
            GlobalKind::Storage(Type::RuntimeArray(Box::new(Type::Vec4))),
        );
        writer.declare_global(
            "table",
            GlobalKind::Private {
                ty: Type::array(Type::Float, 2),
                init: Some(Expr::Construct(
                    Type::array(Type::Float, 2),
                    vec![float(0.0), float(1.0)],
                )),
            },
        );
        writer.declare_global("shadowMap", GlobalKind::Texture(TextureKind::Depth2DArray));
        let text = emit(writer.module(), 2).unwrap();
        assert!(
            text.contains("@group(2) @binding(0) var<storage, read> lights: array<vec4<f32>>;")
        );
        assert!(text.contains("var<private> table: array<f32, 2> = array<f32, 2>(0.0, 1.0);"));
        assert!(text.contains("@group(2) @binding(1) var shadowMap: texture_depth_2d_array;"));
    }

    #[test]
    fn test_unknown_callee_is_reported() {
        let mut writer = ShaderWriter::new();
        writer
            .implement_function("f", Type::Float, vec![], |w| {
                w.ret(Expr::Call("missing".into(), vec![]))
            })
            .unwrap();
        assert!(matches!(
            emit(writer.module(), 0),
            Err(ShadingError::UnknownFunction(name)) if name == "missing"
        ));
    }
}
