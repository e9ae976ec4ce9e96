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

//! Incremental construction of a [`ShaderModule`].
//!
//! The [`ShaderWriter`] keeps a stack of functions under construction. A
//! function body is a closure that receives the writer back, so building a
//! function may itself implement helper functions: those complete first and
//! therefore precede their callers in the module.
//!
//! ```
//! use khora_shading::ast::{float, var, Param, Type};
//! use khora_shading::ShaderWriter;
//!
//! let mut writer = ShaderWriter::new();
//! let square = writer
//!     .implement_function("square", Type::Float, vec![Param::new("x", Type::Float)], |w| {
//!         w.ret(var("x") * var("x"))
//!     })
//!     .unwrap();
//! let call = square.call([float(3.0)]);
//! assert_eq!(writer.module().functions.len(), 1);
//! # let _ = call;
//! ```

use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};

use ahash::{AHashMap, AHashSet};

use crate::ast::{
    BinaryOp, Block, Expr, Function, Global, GlobalKind, Param, ParamKind, ShaderModule, Stmt,
    StructDecl, Type,
};
use crate::ShadingError;

/// A callable reference to an implemented function.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionHandle {
    name: String,
}

impl FunctionHandle {
    /// The function name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Builds a call expression.
    pub fn call<I>(&self, args: I) -> Expr
    where
        I: IntoIterator,
        I::Item: Into<Expr>,
    {
        Expr::Call(self.name.clone(), args.into_iter().map(Into::into).collect())
    }
}

struct FunctionContext {
    name: String,
    ret: Type,
    params: Vec<Param>,
    blocks: Vec<Block>,
    locals: AHashMap<String, u32>,
}

impl FunctionContext {
    fn current_block(&mut self) -> &mut Block {
        // The body block is pushed at creation and only popped by `finish`.
        if self.blocks.is_empty() {
            self.blocks.push(Block::new());
        }
        let last = self.blocks.len() - 1;
        &mut self.blocks[last]
    }

    fn unique_local(&mut self, name: &str) -> String {
        let taken = |ctx: &FunctionContext, candidate: &str| {
            ctx.locals.contains_key(candidate) || ctx.params.iter().any(|p| p.name == candidate)
        };
        if !taken(self, name) {
            self.locals.insert(name.to_owned(), 0);
            return name.to_owned();
        }
        let mut counter = self.locals.get(name).copied().unwrap_or(0);
        loop {
            counter += 1;
            let candidate = format!("{name}_{counter}");
            if !taken(self, &candidate) {
                self.locals.insert(name.to_owned(), counter);
                self.locals.insert(candidate.clone(), 0);
                return candidate;
            }
        }
    }
}

static NEXT_WRITER_ID: AtomicU64 = AtomicU64::new(1);

/// Builds a shader module function by function.
pub struct ShaderWriter {
    id: u64,
    module: ShaderModule,
    stack: Vec<FunctionContext>,
    names: AHashSet<String>,
}

impl Default for ShaderWriter {
    fn default() -> Self {
        Self {
            id: NEXT_WRITER_ID.fetch_add(1, Ordering::Relaxed),
            module: ShaderModule::default(),
            stack: Vec::new(),
            names: AHashSet::new(),
        }
    }
}

impl ShaderWriter {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifies this writer among all writers of the process.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The module built so far.
    pub fn module(&self) -> &ShaderModule {
        &self.module
    }

    /// Consumes the writer and returns the module.
    pub fn finish(self) -> ShaderModule {
        if !self.stack.is_empty() {
            log::warn!(
                "ShaderWriter: finished with {} function(s) still open",
                self.stack.len()
            );
        }
        self.module
    }

    /// Declares a struct. Declaring the same name twice keeps the first declaration.
    pub fn declare_struct(&mut self, decl: StructDecl) -> Type {
        let ty = Type::Struct(decl.name.clone());
        if self.module.struct_decl(&decl.name).is_none() {
            self.module.structs.push(decl);
        }
        ty
    }

    /// Declares a module-scope variable and returns a reference to it.
    /// Declaring the same name twice keeps the first declaration.
    pub fn declare_global(&mut self, name: &str, kind: GlobalKind) -> Expr {
        if self.module.global(name).is_none() {
            self.module.globals.push(Global {
                name: name.to_owned(),
                kind,
            });
        }
        Expr::Var(name.to_owned())
    }

    /// Returns `true` if a function with this name is implemented or being implemented.
    pub fn has_function(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Implements a function.
    ///
    /// `body` records the statements of the function through the writer it is
    /// given. Helper functions implemented from inside `body` complete, and are
    /// added to the module, before this one.
    ///
    /// # Errors
    /// [`ShadingError::DuplicateFunction`] if the name is taken,
    /// [`ShadingError::UnknownStruct`] if a parameter or the return type names
    /// an undeclared struct, or any error returned by `body`.
    pub fn implement_function<F>(
        &mut self,
        name: impl Into<String>,
        ret: Type,
        params: Vec<Param>,
        body: F,
    ) -> Result<FunctionHandle, ShadingError>
    where
        F: FnOnce(&mut ShaderWriter) -> Result<(), ShadingError>,
    {
        let name = name.into();
        if !self.names.insert(name.clone()) {
            return Err(ShadingError::DuplicateFunction(name));
        }
        for ty in params.iter().map(|p| &p.ty).chain(std::iter::once(&ret)) {
            if let Err(err) = self.check_type(ty) {
                self.names.remove(&name);
                return Err(err);
            }
        }

        self.stack.push(FunctionContext {
            name: name.clone(),
            ret,
            params,
            blocks: vec![Block::new()],
            locals: AHashMap::new(),
        });
        let result = body(self);
        let Some(mut context) = self.stack.pop() else {
            return Err(ShadingError::NoActiveFunction);
        };
        if let Err(err) = result {
            self.names.remove(&name);
            return Err(err);
        }

        let body = context.blocks.drain(..).next().unwrap_or_default();
        self.module.functions.push(Function {
            name: context.name,
            ret: context.ret,
            params: context.params,
            body,
        });
        log::debug!("ShaderWriter: implemented {}", name);
        Ok(FunctionHandle { name })
    }

    fn check_type(&self, ty: &Type) -> Result<(), ShadingError> {
        match ty {
            Type::Struct(name) if self.module.struct_decl(name).is_none() => {
                Err(ShadingError::UnknownStruct(name.clone()))
            }
            Type::Array(element, _) | Type::RuntimeArray(element) => self.check_type(element),
            _ => Ok(()),
        }
    }

    fn context(&mut self) -> Result<&mut FunctionContext, ShadingError> {
        self.stack.last_mut().ok_or(ShadingError::NoActiveFunction)
    }

    fn push(&mut self, stmt: Stmt) -> Result<(), ShadingError> {
        self.context()?.current_block().push(stmt);
        Ok(())
    }

    fn scoped<F>(&mut self, body: F) -> Result<Block, ShadingError>
    where
        F: FnOnce(&mut ShaderWriter) -> Result<(), ShadingError>,
    {
        self.context()?.blocks.push(Block::new());
        let result = body(self);
        let block = self.context()?.blocks.pop().unwrap_or_default();
        result.map(|()| block)
    }

    /// Declares a local variable and returns a reference to it.
    ///
    /// The name is made unique within the current function, so helpers can
    /// declare `"NdotL"` repeatedly without clashing.
    pub fn decl(
        &mut self,
        name: &str,
        ty: Type,
        init: impl Into<Expr>,
    ) -> Result<Expr, ShadingError> {
        self.decl_local(name, ty, Some(init.into()))
    }

    /// Declares a zero-initialized local variable.
    pub fn decl_zeroed(&mut self, name: &str, ty: Type) -> Result<Expr, ShadingError> {
        self.decl_local(name, ty, None)
    }

    fn decl_local(
        &mut self,
        name: &str,
        ty: Type,
        init: Option<Expr>,
    ) -> Result<Expr, ShadingError> {
        self.check_type(&ty)?;
        let context = self.context()?;
        let unique = context.unique_local(name);
        context.current_block().push(Stmt::Let {
            name: unique.clone(),
            ty,
            init,
        });
        Ok(Expr::Var(unique))
    }

    /// `target = value;`
    pub fn assign(&mut self, target: &Expr, value: impl Into<Expr>) -> Result<(), ShadingError> {
        self.assign_with(target, None, value.into())
    }

    /// `target += value;`
    pub fn add_assign(
        &mut self,
        target: &Expr,
        value: impl Into<Expr>,
    ) -> Result<(), ShadingError> {
        self.assign_with(target, Some(BinaryOp::Add), value.into())
    }

    /// `target -= value;`
    pub fn sub_assign(
        &mut self,
        target: &Expr,
        value: impl Into<Expr>,
    ) -> Result<(), ShadingError> {
        self.assign_with(target, Some(BinaryOp::Sub), value.into())
    }

    /// `target *= value;`
    pub fn mul_assign(
        &mut self,
        target: &Expr,
        value: impl Into<Expr>,
    ) -> Result<(), ShadingError> {
        self.assign_with(target, Some(BinaryOp::Mul), value.into())
    }

    /// `target /= value;`
    pub fn div_assign(
        &mut self,
        target: &Expr,
        value: impl Into<Expr>,
    ) -> Result<(), ShadingError> {
        self.assign_with(target, Some(BinaryOp::Div), value.into())
    }

    fn assign_with(
        &mut self,
        target: &Expr,
        op: Option<BinaryOp>,
        value: Expr,
    ) -> Result<(), ShadingError> {
        self.check_lvalue(target)?;
        self.push(Stmt::Assign {
            target: target.clone(),
            op,
            value,
        })
    }

    fn check_lvalue(&mut self, target: &Expr) -> Result<(), ShadingError> {
        let invalid = || ShadingError::InvalidLValue(format!("{target:?}"));
        let mut root = target;
        loop {
            root = match root {
                Expr::Var(_) => break,
                Expr::Field(base, _) | Expr::Index(base, _) => base,
                Expr::Swizzle(base, components) if components.len() == 1 => base,
                _ => return Err(invalid()),
            };
        }
        let Expr::Var(name) = root else {
            return Err(invalid());
        };
        let context = self.context()?;
        let read_only = context
            .params
            .iter()
            .any(|p| &p.name == name && p.kind == ParamKind::In);
        if read_only {
            return Err(invalid());
        }
        Ok(())
    }

    /// `if (condition) { then }`
    pub fn if_<F>(&mut self, condition: impl Into<Expr>, then: F) -> Result<(), ShadingError>
    where
        F: FnOnce(&mut ShaderWriter) -> Result<(), ShadingError>,
    {
        let then = self.scoped(then)?;
        self.push(Stmt::If {
            condition: condition.into(),
            then,
            otherwise: None,
        })
    }

    /// `if (condition) { then } else { otherwise }`
    pub fn if_else<F, G>(
        &mut self,
        condition: impl Into<Expr>,
        then: F,
        otherwise: G,
    ) -> Result<(), ShadingError>
    where
        F: FnOnce(&mut ShaderWriter) -> Result<(), ShadingError>,
        G: FnOnce(&mut ShaderWriter) -> Result<(), ShadingError>,
    {
        let then = self.scoped(then)?;
        let otherwise = self.scoped(otherwise)?;
        self.push(Stmt::If {
            condition: condition.into(),
            then,
            otherwise: Some(otherwise),
        })
    }

    /// `for (var name = start; name < end; name++) { body }` with a `u32` counter.
    pub fn for_range<F>(
        &mut self,
        name: &str,
        start: impl Into<Expr>,
        end: impl Into<Expr>,
        body: F,
    ) -> Result<(), ShadingError>
    where
        F: FnOnce(&mut ShaderWriter, Expr) -> Result<(), ShadingError>,
    {
        let var = self.context()?.unique_local(name);
        let counter = Expr::Var(var.clone());
        let body = self.scoped(|w| body(w, counter))?;
        self.push(Stmt::For {
            var,
            ty: Type::UInt,
            start: start.into(),
            end: end.into(),
            body,
        })
    }

    /// `while (condition) { body }`
    pub fn while_<F>(&mut self, condition: impl Into<Expr>, body: F) -> Result<(), ShadingError>
    where
        F: FnOnce(&mut ShaderWriter) -> Result<(), ShadingError>,
    {
        let body = self.scoped(body)?;
        self.push(Stmt::While {
            condition: condition.into(),
            body,
        })
    }

    /// `return value;`
    pub fn ret(&mut self, value: impl Into<Expr>) -> Result<(), ShadingError> {
        self.push(Stmt::Return(Some(value.into())))
    }

    /// `return;`
    pub fn ret_void(&mut self) -> Result<(), ShadingError> {
        self.push(Stmt::Return(None))
    }

    /// Evaluates an expression for its side effects.
    pub fn call(&mut self, expr: Expr) -> Result<(), ShadingError> {
        self.push(Stmt::Expr(expr))
    }

    /// `break;`
    pub fn break_(&mut self) -> Result<(), ShadingError> {
        self.push(Stmt::Break)
    }

    /// `continue;`
    pub fn continue_(&mut self) -> Result<(), ShadingError> {
        self.push(Stmt::Continue)
    }
}

/// Memoizes implemented functions by a caller-defined key.
///
/// Each generator owns its cache: the first request for a key implements the
/// function, later requests return the same handle. Handles are bound to the
/// writer that implemented them, so a generator reused with another writer
/// implements its functions again in that writer's module.
#[derive(Debug)]
pub struct FunctionCache<K> {
    functions: AHashMap<(u64, K), FunctionHandle>,
}

impl<K> Default for FunctionCache<K> {
    fn default() -> Self {
        Self {
            functions: AHashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone> FunctionCache<K> {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The handle cached for `key` in `writer`'s module, if any.
    pub fn get(&self, writer: &ShaderWriter, key: &K) -> Option<&FunctionHandle> {
        self.functions.get(&(writer.id(), key.clone()))
    }

    /// Number of cached functions, across all writers.
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Returns `true` if nothing was implemented yet.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Returns the handle cached for `key`, implementing the function on a miss.
    pub fn get_or_implement<F>(
        &mut self,
        writer: &mut ShaderWriter,
        key: K,
        name: impl Into<String>,
        ret: Type,
        params: Vec<Param>,
        body: F,
    ) -> Result<FunctionHandle, ShadingError>
    where
        F: FnOnce(&mut ShaderWriter) -> Result<(), ShadingError>,
    {
        let key = (writer.id(), key);
        if let Some(handle) = self.functions.get(&key) {
            log::trace!("ShaderWriter: reusing {}", handle.name());
            return Ok(handle.clone());
        }
        let handle = writer.implement_function(name, ret, params, body)?;
        self.functions.insert(key, handle.clone());
        Ok(handle)
    }
}
