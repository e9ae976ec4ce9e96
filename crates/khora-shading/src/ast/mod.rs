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

//! The shader abstract syntax tree.
//!
//! Lighting code builds [`Expr`] trees with the helpers re-exported here and
//! records statements through the [`ShaderWriter`](crate::writer::ShaderWriter).

mod expr;
mod module;
mod stmt;
mod types;

pub use expr::*;
pub use module::{Function, Global, GlobalKind, ShaderModule};
pub use stmt::{Block, Stmt};
pub use types::{Param, ParamKind, StructDecl, TextureKind, Type};
