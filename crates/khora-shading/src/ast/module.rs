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

//! A complete shader module: structs, globals and functions.

use super::{Block, Expr, Param, StructDecl, TextureKind, Type};

/// A module-scope variable.
#[derive(Debug, Clone, PartialEq)]
pub enum GlobalKind {
    /// Read-only storage buffer.
    Storage(Type),
    /// Uniform buffer.
    Uniform(Type),
    /// Sampled texture.
    Texture(TextureKind),
    /// Sampler, `comparison` for depth comparison samplers.
    Sampler {
        /// Whether this is a comparison sampler.
        comparison: bool,
    },
    /// `var<private>` with an optional initializer, used for constant tables.
    Private {
        /// Variable type.
        ty: Type,
        /// Initial value.
        init: Option<Expr>,
    },
}

impl GlobalKind {
    /// Returns `true` for globals that occupy a resource binding.
    pub fn is_resource(&self) -> bool {
        !matches!(self, GlobalKind::Private { .. })
    }
}

/// A named module-scope variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Global {
    /// Global name.
    pub name: String,
    /// What the global is.
    pub kind: GlobalKind,
}

/// A finished shader function.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    /// Function name.
    pub name: String,
    /// Return type, `Void` for none.
    pub ret: Type,
    /// Parameters in order.
    pub params: Vec<Param>,
    /// Function body.
    pub body: Block,
}

impl Function {
    /// Looks up a parameter by name.
    pub fn param(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.name == name)
    }
}

/// A shader module.
///
/// Functions are stored in completion order, so every callee precedes its
/// callers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShaderModule {
    /// Struct declarations in declaration order.
    pub structs: Vec<StructDecl>,
    /// Module-scope variables in declaration order.
    pub globals: Vec<Global>,
    /// Functions in completion order.
    pub functions: Vec<Function>,
}

impl ShaderModule {
    /// Looks up a function by name.
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Looks up a struct declaration by name.
    pub fn struct_decl(&self, name: &str) -> Option<&StructDecl> {
        self.structs.iter().find(|s| s.name == name)
    }

    /// Looks up a global by name.
    pub fn global(&self, name: &str) -> Option<&Global> {
        self.globals.iter().find(|g| g.name == name)
    }
}
