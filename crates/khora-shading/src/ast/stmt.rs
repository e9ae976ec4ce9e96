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

//! Shader statements.

use super::{BinaryOp, Expr, Type};

/// A sequence of statements.
pub type Block = Vec<Stmt>;

/// A shader statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `var name: ty = init;`
    Let {
        /// Local name, unique within its function.
        name: String,
        /// Declared type.
        ty: Type,
        /// Initial value, zero-initialized when absent.
        init: Option<Expr>,
    },
    /// `target = value;` or `target op= value;`
    Assign {
        /// Assigned location (variable, field, single component or element).
        target: Expr,
        /// Compound operator, if any.
        op: Option<BinaryOp>,
        /// Assigned value.
        value: Expr,
    },
    /// `if (condition) { then } else { otherwise }`
    If {
        /// Boolean condition.
        condition: Expr,
        /// Taken branch.
        then: Block,
        /// Optional else branch.
        otherwise: Option<Block>,
    },
    /// `for (var name: ty = start; name < end; name++) { body }`
    For {
        /// Loop counter name.
        var: String,
        /// Counter type, `Int` or `UInt`.
        ty: Type,
        /// First value.
        start: Expr,
        /// Exclusive upper bound.
        end: Expr,
        /// Loop body.
        body: Block,
    },
    /// `while (condition) { body }`
    While {
        /// Loop condition.
        condition: Expr,
        /// Loop body.
        body: Block,
    },
    /// `break;`
    Break,
    /// `continue;`
    Continue,
    /// `return;` or `return value;`
    Return(Option<Expr>),
    /// Expression evaluated for its side effects, typically a call.
    Expr(Expr),
}
