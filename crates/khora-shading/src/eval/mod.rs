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

//! CPU evaluation of generated shader functions.
//!
//! The [`Interpreter`] executes functions of a [`ShaderModule`] directly on
//! the AST. It is the reference used by the test-suite to check the lighting
//! equations numerically, and by host tools that need the exact values the
//! GPU would compute.
//!
//! ```
//! use khora_shading::ast::{var, Param, Type};
//! use khora_shading::eval::{Interpreter, Value};
//! use khora_shading::ShaderWriter;
//!
//! let mut writer = ShaderWriter::new();
//! writer
//!     .implement_function("twice", Type::Float, vec![Param::new("x", Type::Float)], |w| {
//!         w.ret(var("x") * 2.0)
//!     })
//!     .unwrap();
//! let module = writer.finish();
//! let mut interpreter = Interpreter::new(&module).unwrap();
//! let out = interpreter.call("twice", vec![Value::Float(1.5)]).unwrap();
//! assert_eq!(out.result, Value::Float(3.0));
//! ```

mod texture;
mod value;

pub use texture::{NullTextures, TextureSource};
pub use value::Value;

use ahash::AHashMap;
use thiserror::Error;

use crate::ast::{
    BinaryOp, Block, Expr, Function, GlobalKind, Literal, ParamKind, ShaderModule, Stmt,
    TextureSample, Type,
};

/// Default bound on loop iterations per top-level call.
pub const DEFAULT_ITERATION_LIMIT: u64 = 1 << 20;

/// An error raised while evaluating shader code.
#[derive(Debug, Error)]
pub enum EvalError {
    /// A variable is neither local, parameter nor bound global.
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),
    /// A call names a function the module does not contain.
    #[error("unknown function '{0}'")]
    UnknownFunction(String),
    /// A type names an undeclared struct.
    #[error("unknown struct '{0}'")]
    UnknownStruct(String),
    /// An operation was applied to values of the wrong type.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
    /// A function or builtin was called with the wrong number of arguments.
    #[error("'{function}' expects {expected} argument(s), got {found}")]
    Arity {
        /// Called function.
        function: String,
        /// Declared parameter count.
        expected: usize,
        /// Supplied argument count.
        found: usize,
    },
    /// Loops ran for more iterations than allowed.
    #[error("loop iteration limit of {0} exceeded")]
    IterationLimit(u64),
    /// An index was outside of its array or vector.
    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds {
        /// Requested index.
        index: usize,
        /// Length of the indexed value.
        len: usize,
    },
    /// An expression cannot be written to.
    #[error("expression cannot be assigned to: {0}")]
    InvalidLValue(String),
}

/// The outcome of a top-level call.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    /// Returned value, [`Value::Void`] for functions without result.
    pub result: Value,
    /// Final values of the `InOut` parameters, by name.
    pub inout: Vec<(String, Value)>,
}

impl Invocation {
    /// The final value of an `InOut` parameter.
    pub fn inout(&self, name: &str) -> Option<&Value> {
        self.inout.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

enum Access {
    Field(String),
    Index(usize),
}

#[derive(Default)]
struct Frame {
    scopes: Vec<AHashMap<String, Value>>,
}

impl Frame {
    fn lookup(&self, name: &str) -> Option<&Value> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    fn lookup_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.scopes.iter_mut().rev().find_map(|scope| scope.get_mut(name))
    }

    fn declare(&mut self, name: &str, value: Value) {
        if self.scopes.is_empty() {
            self.scopes.push(AHashMap::new());
        }
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_owned(), value);
        }
    }
}

fn coerce(value: Value, ty: &Type) -> Value {
    match (ty, &value) {
        (Type::Float, Value::Int(_) | Value::UInt(_)) => value.as_f32().map_or(value, Value::Float),
        _ => value,
    }
}

fn coerce_like(target: &Value, value: Value) -> Value {
    match target {
        Value::Float(_) => coerce(value, &Type::Float),
        _ => value,
    }
}

fn index_of(value: &Value) -> Result<usize, EvalError> {
    match *value {
        Value::UInt(i) => Ok(i as usize),
        Value::Int(i) if i >= 0 => Ok(i as usize),
        _ => Err(EvalError::TypeMismatch(format!("index of type {value:?}"))),
    }
}

fn read_index(base: &Value, index: usize) -> Result<Value, EvalError> {
    let out_of_bounds = |len| EvalError::IndexOutOfBounds { index, len };
    match base {
        Value::Array(items) => items.get(index).cloned().ok_or(out_of_bounds(items.len())),
        Value::Mat4(cols) => cols
            .get(index)
            .map(|c| Value::Vec4(*c))
            .ok_or(out_of_bounds(4)),
        Value::Mat3(cols) => cols
            .get(index)
            .map(|c| Value::Vec3(*c))
            .ok_or(out_of_bounds(3)),
        other => {
            let (lanes, count) = other
                .lanes()
                .ok_or_else(|| EvalError::TypeMismatch(format!("indexing {other:?}")))?;
            if index < count {
                Ok(Value::Float(lanes[index]))
            } else {
                Err(out_of_bounds(count))
            }
        }
    }
}

fn write_path(target: &mut Value, path: &[Access], value: Value) -> Result<(), EvalError> {
    let Some((first, rest)) = path.split_first() else {
        *target = coerce_like(target, value);
        return Ok(());
    };
    match first {
        Access::Field(name) => {
            let field = target
                .field_mut(name)
                .ok_or_else(|| EvalError::InvalidLValue(format!("field '{name}'")))?;
            write_path(field, rest, value)
        }
        Access::Index(index) => {
            let index = *index;
            match target {
                Value::Array(items) => {
                    let len = items.len();
                    let item = items
                        .get_mut(index)
                        .ok_or(EvalError::IndexOutOfBounds { index, len })?;
                    write_path(item, rest, value)
                }
                Value::Mat4(cols) => {
                    let Value::Vec4(column) = value else {
                        return Err(EvalError::TypeMismatch("matrix column".into()));
                    };
                    let slot = cols
                        .get_mut(index)
                        .ok_or(EvalError::IndexOutOfBounds { index, len: 4 })?;
                    *slot = column;
                    Ok(())
                }
                vector => {
                    let component = value
                        .as_f32()
                        .ok_or_else(|| EvalError::TypeMismatch("vector component".into()))?;
                    let (mut lanes, count) = vector
                        .lanes()
                        .ok_or_else(|| EvalError::InvalidLValue(format!("{vector:?}")))?;
                    if index >= count {
                        return Err(EvalError::IndexOutOfBounds { index, len: count });
                    }
                    lanes[index] = component;
                    *vector = Value::from_lanes(lanes, count);
                    Ok(())
                }
            }
        }
    }
}

/// Executes functions of a [`ShaderModule`].
pub struct Interpreter<'m> {
    module: &'m ShaderModule,
    globals: AHashMap<String, Value>,
    textures: Box<dyn TextureSource + 'm>,
    iteration_limit: u64,
    iterations: u64,
}

impl<'m> Interpreter<'m> {
    /// Creates an interpreter and initializes the module's private globals.
    ///
    /// Resource globals (buffers, textures) are bound with [`bind_global`](Self::bind_global).
    pub fn new(module: &'m ShaderModule) -> Result<Self, EvalError> {
        let mut interpreter = Self {
            module,
            globals: AHashMap::new(),
            textures: Box::new(NullTextures),
            iteration_limit: DEFAULT_ITERATION_LIMIT,
            iterations: 0,
        };
        for global in &module.globals {
            if let GlobalKind::Private { ty, init } = &global.kind {
                let value = match init {
                    Some(init) => {
                        let mut frame = Frame::default();
                        interpreter.eval(&mut frame, init)?
                    }
                    None => Value::zero(ty, module)?,
                };
                interpreter.globals.insert(global.name.clone(), value);
            }
        }
        Ok(interpreter)
    }

    /// Replaces the texture source, [`NullTextures`] by default.
    pub fn with_textures(mut self, textures: impl TextureSource + 'm) -> Self {
        self.textures = Box::new(textures);
        self
    }

    /// Sets the bound on loop iterations per call.
    pub fn with_iteration_limit(mut self, limit: u64) -> Self {
        self.iteration_limit = limit;
        self
    }

    /// Binds the value of a global (storage buffer, uniform).
    pub fn bind_global(&mut self, name: &str, value: Value) {
        self.globals.insert(name.to_owned(), value);
    }

    /// Calls a function of the module.
    pub fn call(&mut self, name: &str, args: Vec<Value>) -> Result<Invocation, EvalError> {
        let module = self.module;
        let function = module
            .function(name)
            .ok_or_else(|| EvalError::UnknownFunction(name.to_owned()))?;
        self.iterations = 0;
        let (result, finals) = self.invoke(function, args)?;
        let inout = function
            .params
            .iter()
            .zip(finals)
            .filter(|(p, _)| p.kind == ParamKind::InOut)
            .map(|(p, v)| (p.name.clone(), v))
            .collect();
        Ok(Invocation { result, inout })
    }

    fn invoke(
        &mut self,
        function: &'m Function,
        args: Vec<Value>,
    ) -> Result<(Value, Vec<Value>), EvalError> {
        if args.len() != function.params.len() {
            return Err(EvalError::Arity {
                function: function.name.clone(),
                expected: function.params.len(),
                found: args.len(),
            });
        }
        let mut frame = Frame::default();
        for (param, arg) in function.params.iter().zip(args) {
            frame.declare(&param.name, coerce(arg, &param.ty));
        }
        let result = match self.exec_block(&mut frame, &function.body)? {
            Flow::Return(value) => value,
            _ => Value::Void,
        };
        let finals = function
            .params
            .iter()
            .map(|p| frame.lookup(&p.name).cloned().unwrap_or(Value::Void))
            .collect();
        Ok((result, finals))
    }

    fn tick(&mut self) -> Result<(), EvalError> {
        self.iterations += 1;
        if self.iterations > self.iteration_limit {
            return Err(EvalError::IterationLimit(self.iteration_limit));
        }
        Ok(())
    }

    fn exec_block(&mut self, frame: &mut Frame, block: &'m Block) -> Result<Flow, EvalError> {
        frame.scopes.push(AHashMap::new());
        let mut flow = Flow::Normal;
        for stmt in block {
            match self.exec_stmt(frame, stmt) {
                Ok(Flow::Normal) => {}
                Ok(other) => {
                    flow = other;
                    break;
                }
                Err(err) => {
                    frame.scopes.pop();
                    return Err(err);
                }
            }
        }
        frame.scopes.pop();
        Ok(flow)
    }

    fn condition(&mut self, frame: &mut Frame, expr: &Expr) -> Result<bool, EvalError> {
        let value = self.eval(frame, expr)?;
        value
            .as_bool()
            .ok_or_else(|| EvalError::TypeMismatch(format!("condition of type {value:?}")))
    }

    fn exec_stmt(&mut self, frame: &mut Frame, stmt: &'m Stmt) -> Result<Flow, EvalError> {
        match stmt {
            Stmt::Let { name, ty, init } => {
                let value = match init {
                    Some(init) => coerce(self.eval(frame, init)?, ty),
                    None => Value::zero(ty, self.module)?,
                };
                frame.declare(name, value);
            }
            Stmt::Assign { target, op, value } => {
                let mut value = self.eval(frame, value)?;
                if let Some(op) = op {
                    let current = self.eval(frame, target)?;
                    value = value::binary(*op, &current, &value)?;
                }
                let (root, path) = self.place(frame, target)?;
                self.store(frame, &root, &path, value)?;
            }
            Stmt::If {
                condition,
                then,
                otherwise,
            } => {
                if self.condition(frame, condition)? {
                    return self.exec_block(frame, then);
                } else if let Some(otherwise) = otherwise {
                    return self.exec_block(frame, otherwise);
                }
            }
            Stmt::For {
                var,
                ty,
                start,
                end,
                body,
            } => {
                let start = coerce(self.eval(frame, start)?, ty);
                frame.scopes.push(AHashMap::new());
                frame.declare(var, start);
                let result = self.run_for(frame, var, end, body);
                frame.scopes.pop();
                if let Flow::Return(value) = result? {
                    return Ok(Flow::Return(value));
                }
            }
            Stmt::While { condition, body } => {
                while self.condition(frame, condition)? {
                    self.tick()?;
                    match self.exec_block(frame, body)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
            }
            Stmt::Break => return Ok(Flow::Break),
            Stmt::Continue => return Ok(Flow::Continue),
            Stmt::Return(None) => return Ok(Flow::Return(Value::Void)),
            Stmt::Return(Some(value)) => return Ok(Flow::Return(self.eval(frame, value)?)),
            Stmt::Expr(expr) => {
                self.eval(frame, expr)?;
            }
        }
        Ok(Flow::Normal)
    }

    fn run_for(
        &mut self,
        frame: &mut Frame,
        var: &str,
        end: &Expr,
        body: &'m Block,
    ) -> Result<Flow, EvalError> {
        loop {
            let counter = frame
                .lookup(var)
                .cloned()
                .ok_or_else(|| EvalError::UnknownVariable(var.to_owned()))?;
            let bound = self.eval(frame, end)?;
            let keep_going = value::binary(BinaryOp::Lt, &counter, &bound)?;
            if keep_going != Value::Bool(true) {
                return Ok(Flow::Normal);
            }
            self.tick()?;
            match self.exec_block(frame, body)? {
                Flow::Break => return Ok(Flow::Normal),
                Flow::Return(value) => return Ok(Flow::Return(value)),
                Flow::Normal | Flow::Continue => {}
            }
            let counter = frame
                .lookup(var)
                .cloned()
                .ok_or_else(|| EvalError::UnknownVariable(var.to_owned()))?;
            let next = match counter {
                Value::Int(i) => Value::Int(i.wrapping_add(1)),
                Value::UInt(i) => Value::UInt(i.wrapping_add(1)),
                other => value::binary(BinaryOp::Add, &other, &Value::Float(1.0))?,
            };
            self.store(frame, var, &[], next)?;
        }
    }

    fn place(
        &mut self,
        frame: &mut Frame,
        expr: &Expr,
    ) -> Result<(String, Vec<Access>), EvalError> {
        match expr {
            Expr::Var(name) => Ok((name.clone(), Vec::new())),
            Expr::Field(base, field) => {
                let (root, mut path) = self.place(frame, base)?;
                path.push(Access::Field(field.clone()));
                Ok((root, path))
            }
            Expr::Index(base, index) => {
                let index = index_of(&self.eval(frame, index)?)?;
                let (root, mut path) = self.place(frame, base)?;
                path.push(Access::Index(index));
                Ok((root, path))
            }
            Expr::Swizzle(base, components) if components.len() == 1 => {
                let (root, mut path) = self.place(frame, base)?;
                path.push(Access::Index(usize::from(components[0])));
                Ok((root, path))
            }
            other => Err(EvalError::InvalidLValue(format!("{other:?}"))),
        }
    }

    fn store(
        &mut self,
        frame: &mut Frame,
        root: &str,
        path: &[Access],
        value: Value,
    ) -> Result<(), EvalError> {
        let target = match frame.lookup_mut(root) {
            Some(target) => target,
            None => self
                .globals
                .get_mut(root)
                .ok_or_else(|| EvalError::UnknownVariable(root.to_owned()))?,
        };
        write_path(target, path, value)
    }

    fn lookup<'a>(&'a self, frame: &'a Frame, name: &str) -> Result<&'a Value, EvalError> {
        frame
            .lookup(name)
            .or_else(|| self.globals.get(name))
            .ok_or_else(|| EvalError::UnknownVariable(name.to_owned()))
    }

    fn eval(&mut self, frame: &mut Frame, expr: &Expr) -> Result<Value, EvalError> {
        Ok(match expr {
            Expr::Literal(literal) => match *literal {
                Literal::Bool(v) => Value::Bool(v),
                Literal::Int(v) => Value::Int(v),
                Literal::UInt(v) => Value::UInt(v),
                Literal::Float(v) => Value::Float(v),
            },
            Expr::Var(name) => self.lookup(frame, name)?.clone(),
            Expr::Unary(op, operand) => {
                let operand = self.eval(frame, operand)?;
                value::unary(*op, &operand)?
            }
            Expr::Binary(op, lhs, rhs) => {
                let lhs = self.eval(frame, lhs)?;
                let rhs = self.eval(frame, rhs)?;
                value::binary(*op, &lhs, &rhs)?
            }
            Expr::Call(name, args) => self.eval_call(frame, name, args)?,
            Expr::Intrinsic(op, args) => {
                let args = self.eval_all(frame, args)?;
                value::intrinsic(*op, &args)?
            }
            Expr::Construct(ty, args) => {
                let args = self.eval_all(frame, args)?;
                value::construct(ty, args, self.module)?
            }
            Expr::Swizzle(base, components) => {
                let base = self.eval(frame, base)?;
                let (lanes, count) = base
                    .lanes()
                    .ok_or_else(|| EvalError::TypeMismatch(format!("swizzle of {base:?}")))?;
                let mut out = [0.0; 4];
                for (slot, &component) in out.iter_mut().zip(components) {
                    let component = usize::from(component);
                    if component >= count {
                        return Err(EvalError::IndexOutOfBounds {
                            index: component,
                            len: count,
                        });
                    }
                    *slot = lanes[component];
                }
                Value::from_lanes(out, components.len())
            }
            Expr::Field(base, field) => {
                let base = self.eval(frame, base)?;
                base.field(field)
                    .cloned()
                    .ok_or_else(|| EvalError::TypeMismatch(format!("no field '{field}'")))?
            }
            Expr::Index(base, index) => {
                let index = index_of(&self.eval(frame, index)?)?;
                // Buffers are indexed in place rather than copied.
                if let Expr::Var(name) = base.as_ref() {
                    read_index(self.lookup(frame, name)?, index)?
                } else {
                    let base = self.eval(frame, base)?;
                    read_index(&base, index)?
                }
            }
            Expr::Select {
                condition,
                accept,
                reject,
            } => {
                let condition = self.condition(frame, condition)?;
                let accept = self.eval(frame, accept)?;
                let reject = self.eval(frame, reject)?;
                if condition {
                    accept
                } else {
                    reject
                }
            }
            Expr::Texture(sample) => self.eval_texture(frame, sample)?,
        })
    }

    fn eval_all(&mut self, frame: &mut Frame, exprs: &[Expr]) -> Result<Vec<Value>, EvalError> {
        exprs.iter().map(|e| self.eval(frame, e)).collect()
    }

    fn eval_call(
        &mut self,
        frame: &mut Frame,
        name: &str,
        args: &[Expr],
    ) -> Result<Value, EvalError> {
        let module = self.module;
        let callee = module
            .function(name)
            .ok_or_else(|| EvalError::UnknownFunction(name.to_owned()))?;
        let values = self.eval_all(frame, args)?;
        let mut write_back = Vec::new();
        for (index, (param, arg)) in callee.params.iter().zip(args).enumerate() {
            if param.kind == ParamKind::InOut {
                write_back.push((index, self.place(frame, arg)?));
            }
        }
        let (result, finals) = self.invoke(callee, values)?;
        for (index, (root, path)) in write_back {
            if let Some(value) = finals.get(index) {
                self.store(frame, &root, &path, value.clone())?;
            }
        }
        Ok(result)
    }

    fn layer(
        &mut self,
        frame: &mut Frame,
        layer: &Option<Box<Expr>>,
    ) -> Result<Option<i32>, EvalError> {
        let Some(layer) = layer else {
            return Ok(None);
        };
        let value = self.eval(frame, layer)?;
        let layer = value
            .as_f32()
            .ok_or_else(|| EvalError::TypeMismatch(format!("texture layer {value:?}")))?;
        Ok(Some(layer as i32))
    }

    fn coords(&mut self, frame: &mut Frame, coords: &Expr) -> Result<Vec<f32>, EvalError> {
        let value = self.eval(frame, coords)?;
        let (lanes, count) = value
            .lanes()
            .ok_or_else(|| EvalError::TypeMismatch(format!("texture coordinates {value:?}")))?;
        Ok(lanes[..count].to_vec())
    }

    fn scalar(&mut self, frame: &mut Frame, expr: &Expr) -> Result<f32, EvalError> {
        let value = self.eval(frame, expr)?;
        value
            .as_f32()
            .ok_or_else(|| EvalError::TypeMismatch(format!("expected a scalar, got {value:?}")))
    }

    fn eval_texture(
        &mut self,
        frame: &mut Frame,
        sample: &TextureSample,
    ) -> Result<Value, EvalError> {
        match sample {
            TextureSample::Sample {
                texture,
                coords,
                layer,
                level,
                ..
            } => {
                let coords = self.coords(frame, coords)?;
                let layer = self.layer(frame, layer)?;
                let level = self.scalar(frame, level)?;
                let texel = self.textures.sample(texture, &coords, layer, level);
                let depth = matches!(
                    self.module.global(texture).map(|g| &g.kind),
                    Some(GlobalKind::Texture(kind)) if kind.is_depth()
                );
                Ok(if depth {
                    Value::Float(texel[0])
                } else {
                    Value::Vec4(texel)
                })
            }
            TextureSample::Compare {
                texture,
                coords,
                layer,
                depth_ref,
                ..
            } => {
                let coords = self.coords(frame, coords)?;
                let layer = self.layer(frame, layer)?;
                let depth_ref = self.scalar(frame, depth_ref)?;
                Ok(Value::Float(
                    self.textures.sample_compare(texture, &coords, layer, depth_ref),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{float, var, Param, StructDecl};
    use crate::ShaderWriter;

    #[test]
    fn test_inout_parameters_are_written_back() {
        let mut writer = ShaderWriter::new();
        writer.declare_struct(StructDecl::new("Acc", vec![("sum", Type::Vec3)]));
        let add = writer
            .implement_function(
                "add",
                Type::Void,
                vec![Param::new("v", Type::Vec3), Param::inout("acc", Type::named("Acc"))],
                |w| w.add_assign(&var("acc").field("sum"), var("v")),
            )
            .unwrap();
        writer
            .implement_function("twice", Type::Vec3, vec![Param::new("v", Type::Vec3)], |w| {
                let acc = w.decl_zeroed("acc", Type::named("Acc"))?;
                w.call(add.call([var("v"), acc.clone()]))?;
                w.call(add.call([var("v"), acc.clone()]))?;
                w.ret(acc.field("sum"))
            })
            .unwrap();
        let module = writer.finish();
        let mut interpreter = Interpreter::new(&module).unwrap();
        let out = interpreter
            .call("twice", vec![Value::Vec3([1.0, 2.0, 3.0])])
            .unwrap();
        assert_eq!(out.result, Value::Vec3([2.0, 4.0, 6.0]));
    }

    #[test]
    fn test_loops_and_component_assignment() {
        let mut writer = ShaderWriter::new();
        writer
            .implement_function("f", Type::Vec2, vec![Param::new("n", Type::UInt)], |w| {
                let acc = w.decl_zeroed("acc", Type::Vec2)?;
                w.for_range("i", 0u32, var("n"), |w, i| {
                    w.if_(i.equals(3u32), |w| w.continue_())?;
                    w.add_assign(&acc.x(), 1.0)
                })?;
                w.assign(&acc.y(), float(7.0))?;
                w.ret(acc)
            })
            .unwrap();
        let module = writer.finish();
        let mut interpreter = Interpreter::new(&module).unwrap();
        let out = interpreter.call("f", vec![Value::UInt(5)]).unwrap();
        assert_eq!(out.result, Value::Vec2([4.0, 7.0]));
    }

    #[test]
    fn test_iteration_limit() {
        let mut writer = ShaderWriter::new();
        writer
            .implement_function("spin", Type::Void, vec![], |w| {
                w.while_(Expr::from(true), |_| Ok(()))
            })
            .unwrap();
        let module = writer.finish();
        let mut interpreter = Interpreter::new(&module).unwrap().with_iteration_limit(100);
        assert!(matches!(
            interpreter.call("spin", vec![]),
            Err(EvalError::IterationLimit(100))
        ));
    }

    #[test]
    fn test_private_tables_and_bound_buffers() {
        let mut writer = ShaderWriter::new();
        let table = writer.declare_global(
            "table",
            GlobalKind::Private {
                ty: Type::array(Type::Float, 3),
                init: Some(Expr::Construct(
                    Type::array(Type::Float, 3),
                    vec![float(0.5), float(1.5), float(2.5)],
                )),
            },
        );
        let buffer = writer.declare_global(
            "slots",
            GlobalKind::Storage(Type::RuntimeArray(Box::new(Type::Vec4))),
        );
        writer
            .implement_function("read", Type::Float, vec![Param::new("i", Type::UInt)], |w| {
                w.ret(table.at(var("i")) + buffer.at(var("i")).w())
            })
            .unwrap();
        let module = writer.finish();
        let mut interpreter = Interpreter::new(&module).unwrap();
        interpreter.bind_global("slots", Value::from_slots(&[[0.0; 4], [0.0, 0.0, 0.0, 10.0]]));
        let out = interpreter.call("read", vec![Value::UInt(1)]).unwrap();
        assert_eq!(out.result, Value::Float(11.5));
        assert!(matches!(
            interpreter.call("read", vec![Value::UInt(5)]),
            Err(EvalError::IndexOutOfBounds { index: 5, len: 3 })
        ));
    }
}
