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

//! Shader expressions and the small DSL used to build them.
//!
//! Expressions are plain trees. Rust operators are overloaded so lighting code
//! reads close to the shading language it produces:
//!
//! ```
//! use khora_shading::ast::{dot, float, max, var, Expr};
//!
//! let n = var("N");
//! let l = var("L");
//! let n_dot_l: Expr = max(dot(&n, &l), 0.0);
//! let scaled = n_dot_l * float(0.5) + 1.0;
//! assert!(matches!(scaled, Expr::Binary(..)));
//! ```

use super::Type;

/// A literal constant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    /// Boolean literal.
    Bool(bool),
    /// Signed integer literal.
    Int(i32),
    /// Unsigned integer literal.
    UInt(u32),
    /// Float literal.
    Float(f32),
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `&&`
    And,
    /// `||`
    Or,
    /// `&`
    BitAnd,
    /// `|`
    BitOr,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
}

impl BinaryOp {
    /// The operator token.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Arithmetic negation.
    Neg,
    /// Logical not.
    Not,
}

/// Built-in functions of the shading language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intrinsic {
    /// Absolute value.
    Abs,
    /// Arc cosine.
    Acos,
    /// Two-argument arc tangent.
    Atan2,
    /// Round up.
    Ceil,
    /// Clamp to a range.
    Clamp,
    /// Cosine.
    Cos,
    /// Cross product.
    Cross,
    /// Distance between two points.
    Distance,
    /// Dot product.
    Dot,
    /// Natural exponential.
    Exp,
    /// Base 2 exponential.
    Exp2,
    /// Round down.
    Floor,
    /// Fused multiply-add.
    Fma,
    /// Fractional part.
    Fract,
    /// Reciprocal square root.
    InverseSqrt,
    /// Vector length.
    Length,
    /// Natural logarithm.
    Log,
    /// Component-wise maximum.
    Max,
    /// Component-wise minimum.
    Min,
    /// Linear interpolation.
    Mix,
    /// Unit vector.
    Normalize,
    /// Power.
    Pow,
    /// Reflection about a normal.
    Reflect,
    /// Bit reversal of an unsigned integer.
    ReverseBits,
    /// Clamp to `[0, 1]`.
    Saturate,
    /// Sign.
    Sign,
    /// Sine.
    Sin,
    /// Hermite interpolation between two edges.
    SmoothStep,
    /// Square root.
    Sqrt,
    /// `0` below the edge, `1` otherwise.
    Step,
    /// Tangent.
    Tan,
}

impl Intrinsic {
    /// The WGSL spelling of the builtin.
    pub fn wgsl_name(self) -> &'static str {
        match self {
            Intrinsic::Abs => "abs",
            Intrinsic::Acos => "acos",
            Intrinsic::Atan2 => "atan2",
            Intrinsic::Ceil => "ceil",
            Intrinsic::Clamp => "clamp",
            Intrinsic::Cos => "cos",
            Intrinsic::Cross => "cross",
            Intrinsic::Distance => "distance",
            Intrinsic::Dot => "dot",
            Intrinsic::Exp => "exp",
            Intrinsic::Exp2 => "exp2",
            Intrinsic::Floor => "floor",
            Intrinsic::Fma => "fma",
            Intrinsic::Fract => "fract",
            Intrinsic::InverseSqrt => "inverseSqrt",
            Intrinsic::Length => "length",
            Intrinsic::Log => "log",
            Intrinsic::Max => "max",
            Intrinsic::Min => "min",
            Intrinsic::Mix => "mix",
            Intrinsic::Normalize => "normalize",
            Intrinsic::Pow => "pow",
            Intrinsic::Reflect => "reflect",
            Intrinsic::ReverseBits => "reverseBits",
            Intrinsic::Saturate => "saturate",
            Intrinsic::Sign => "sign",
            Intrinsic::Sin => "sin",
            Intrinsic::SmoothStep => "smoothstep",
            Intrinsic::Sqrt => "sqrt",
            Intrinsic::Step => "step",
            Intrinsic::Tan => "tan",
        }
    }

    /// Number of arguments the builtin takes.
    pub fn arity(self) -> usize {
        match self {
            Intrinsic::Clamp | Intrinsic::Fma | Intrinsic::Mix | Intrinsic::SmoothStep => 3,
            Intrinsic::Atan2
            | Intrinsic::Cross
            | Intrinsic::Distance
            | Intrinsic::Dot
            | Intrinsic::Max
            | Intrinsic::Min
            | Intrinsic::Pow
            | Intrinsic::Reflect
            | Intrinsic::Step => 2,
            _ => 1,
        }
    }
}

/// A texture fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum TextureSample {
    /// Explicit-level sample returning a `vec4` (or `f32` for depth textures).
    Sample {
        /// Texture global name.
        texture: String,
        /// Sampler global name.
        sampler: String,
        /// Texture coordinates (`vec2` or a `vec3` direction for cubes).
        coords: Box<Expr>,
        /// Array layer for arrayed textures.
        layer: Option<Box<Expr>>,
        /// Mip level.
        level: Box<Expr>,
    },
    /// Depth comparison sample returning the fraction of passing texels.
    Compare {
        /// Depth texture global name.
        texture: String,
        /// Comparison sampler global name.
        sampler: String,
        /// Texture coordinates.
        coords: Box<Expr>,
        /// Array layer for arrayed textures.
        layer: Option<Box<Expr>>,
        /// Reference depth.
        depth_ref: Box<Expr>,
    },
}

/// A shader expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Constant.
    Literal(Literal),
    /// Local, parameter or global by name.
    Var(String),
    /// Unary operation.
    Unary(UnaryOp, Box<Expr>),
    /// Binary operation.
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    /// Call of a module function by name.
    Call(String, Vec<Expr>),
    /// Call of a builtin.
    Intrinsic(Intrinsic, Vec<Expr>),
    /// Type constructor or conversion.
    Construct(Type, Vec<Expr>),
    /// Vector component selection (component indices 0-3).
    Swizzle(Box<Expr>, Vec<u8>),
    /// Struct member access.
    Field(Box<Expr>, String),
    /// Array, vector or matrix indexing.
    Index(Box<Expr>, Box<Expr>),
    /// `condition ? accept : reject`.
    Select {
        /// Boolean condition.
        condition: Box<Expr>,
        /// Value when the condition holds.
        accept: Box<Expr>,
        /// Value otherwise.
        reject: Box<Expr>,
    },
    /// Texture fetch.
    Texture(TextureSample),
}

impl Expr {
    /// Builds a binary expression.
    pub fn binary(op: BinaryOp, lhs: impl Into<Expr>, rhs: impl Into<Expr>) -> Self {
        Expr::Binary(op, Box::new(lhs.into()), Box::new(rhs.into()))
    }

    /// Selects components by name, e.g. `"xyz"` or `"rg"`.
    ///
    /// # Panics
    /// Panics on characters outside `xyzw`/`rgba`: swizzles are written by hand
    /// in lighting code, so a typo is a programming error.
    pub fn swizzle(&self, components: &str) -> Expr {
        let indices = components
            .chars()
            .map(|c| match c {
                'x' | 'r' => 0,
                'y' | 'g' => 1,
                'z' | 'b' => 2,
                'w' | 'a' => 3,
                other => panic!("invalid swizzle component '{other}'"),
            })
            .collect();
        Expr::Swizzle(Box::new(self.clone()), indices)
    }

    /// Component `x`.
    pub fn x(&self) -> Expr {
        Expr::Swizzle(Box::new(self.clone()), vec![0])
    }

    /// Component `y`.
    pub fn y(&self) -> Expr {
        Expr::Swizzle(Box::new(self.clone()), vec![1])
    }

    /// Component `z`.
    pub fn z(&self) -> Expr {
        Expr::Swizzle(Box::new(self.clone()), vec![2])
    }

    /// Component `w`.
    pub fn w(&self) -> Expr {
        Expr::Swizzle(Box::new(self.clone()), vec![3])
    }

    /// Components `xy`.
    pub fn xy(&self) -> Expr {
        Expr::Swizzle(Box::new(self.clone()), vec![0, 1])
    }

    /// Components `zw`.
    pub fn zw(&self) -> Expr {
        Expr::Swizzle(Box::new(self.clone()), vec![2, 3])
    }

    /// Components `xyz`.
    pub fn xyz(&self) -> Expr {
        Expr::Swizzle(Box::new(self.clone()), vec![0, 1, 2])
    }

    /// Struct member access.
    pub fn field(&self, name: impl Into<String>) -> Expr {
        Expr::Field(Box::new(self.clone()), name.into())
    }

    /// Indexing.
    pub fn at(&self, index: impl Into<Expr>) -> Expr {
        Expr::Index(Box::new(self.clone()), Box::new(index.into()))
    }

    /// Conversion to another scalar or vector type.
    pub fn cast(&self, ty: Type) -> Expr {
        Expr::Construct(ty, vec![self.clone()])
    }

    /// `self == rhs`
    pub fn equals(&self, rhs: impl Into<Expr>) -> Expr {
        Expr::binary(BinaryOp::Eq, self.clone(), rhs)
    }

    /// `self != rhs`
    pub fn not_equals(&self, rhs: impl Into<Expr>) -> Expr {
        Expr::binary(BinaryOp::Ne, self.clone(), rhs)
    }

    /// `self < rhs`
    pub fn lt(&self, rhs: impl Into<Expr>) -> Expr {
        Expr::binary(BinaryOp::Lt, self.clone(), rhs)
    }

    /// `self <= rhs`
    pub fn le(&self, rhs: impl Into<Expr>) -> Expr {
        Expr::binary(BinaryOp::Le, self.clone(), rhs)
    }

    /// `self > rhs`
    pub fn gt(&self, rhs: impl Into<Expr>) -> Expr {
        Expr::binary(BinaryOp::Gt, self.clone(), rhs)
    }

    /// `self >= rhs`
    pub fn ge(&self, rhs: impl Into<Expr>) -> Expr {
        Expr::binary(BinaryOp::Ge, self.clone(), rhs)
    }

    /// `self && rhs`
    pub fn and(&self, rhs: impl Into<Expr>) -> Expr {
        Expr::binary(BinaryOp::And, self.clone(), rhs)
    }

    /// `self || rhs`
    pub fn or(&self, rhs: impl Into<Expr>) -> Expr {
        Expr::binary(BinaryOp::Or, self.clone(), rhs)
    }

    /// `!self`
    pub fn not(&self) -> Expr {
        Expr::Unary(UnaryOp::Not, Box::new(self.clone()))
    }
}

impl From<f32> for Expr {
    fn from(value: f32) -> Self {
        Expr::Literal(Literal::Float(value))
    }
}

impl From<i32> for Expr {
    fn from(value: i32) -> Self {
        Expr::Literal(Literal::Int(value))
    }
}

impl From<u32> for Expr {
    fn from(value: u32) -> Self {
        Expr::Literal(Literal::UInt(value))
    }
}

impl From<bool> for Expr {
    fn from(value: bool) -> Self {
        Expr::Literal(Literal::Bool(value))
    }
}

impl From<&Expr> for Expr {
    fn from(value: &Expr) -> Self {
        value.clone()
    }
}

macro_rules! impl_binary_operator {
    ($trait:ident, $method:ident, $op:ident) => {
        impl<R: Into<Expr>> std::ops::$trait<R> for Expr {
            type Output = Expr;
            fn $method(self, rhs: R) -> Expr {
                Expr::binary(BinaryOp::$op, self, rhs)
            }
        }

        impl<R: Into<Expr>> std::ops::$trait<R> for &Expr {
            type Output = Expr;
            fn $method(self, rhs: R) -> Expr {
                Expr::binary(BinaryOp::$op, self.clone(), rhs)
            }
        }

        impl std::ops::$trait<Expr> for f32 {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                Expr::binary(BinaryOp::$op, self, rhs)
            }
        }

        impl std::ops::$trait<&Expr> for f32 {
            type Output = Expr;
            fn $method(self, rhs: &Expr) -> Expr {
                Expr::binary(BinaryOp::$op, self, rhs.clone())
            }
        }

        impl std::ops::$trait<Expr> for u32 {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                Expr::binary(BinaryOp::$op, self, rhs)
            }
        }

        impl std::ops::$trait<&Expr> for u32 {
            type Output = Expr;
            fn $method(self, rhs: &Expr) -> Expr {
                Expr::binary(BinaryOp::$op, self, rhs.clone())
            }
        }
    };
}

impl_binary_operator!(Add, add, Add);
impl_binary_operator!(Sub, sub, Sub);
impl_binary_operator!(Mul, mul, Mul);
impl_binary_operator!(Div, div, Div);
impl_binary_operator!(Rem, rem, Rem);
impl_binary_operator!(BitAnd, bitand, BitAnd);
impl_binary_operator!(BitOr, bitor, BitOr);
impl_binary_operator!(Shl, shl, Shl);
impl_binary_operator!(Shr, shr, Shr);

impl std::ops::Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::Unary(UnaryOp::Neg, Box::new(self))
    }
}

impl std::ops::Neg for &Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::Unary(UnaryOp::Neg, Box::new(self.clone()))
    }
}

// --- Constructors ---

/// A variable reference.
pub fn var(name: impl Into<String>) -> Expr {
    Expr::Var(name.into())
}

/// A float literal.
pub fn float(value: f32) -> Expr {
    Expr::from(value)
}

/// An unsigned integer literal.
pub fn uint(value: u32) -> Expr {
    Expr::from(value)
}

/// A signed integer literal.
pub fn int(value: i32) -> Expr {
    Expr::from(value)
}

/// `vec2(x, y)`
pub fn vec2(x: impl Into<Expr>, y: impl Into<Expr>) -> Expr {
    Expr::Construct(Type::Vec2, vec![x.into(), y.into()])
}

/// `vec3(x, y, z)`
pub fn vec3(x: impl Into<Expr>, y: impl Into<Expr>, z: impl Into<Expr>) -> Expr {
    Expr::Construct(Type::Vec3, vec![x.into(), y.into(), z.into()])
}

/// `vec4(x, y, z, w)`
pub fn vec4(
    x: impl Into<Expr>,
    y: impl Into<Expr>,
    z: impl Into<Expr>,
    w: impl Into<Expr>,
) -> Expr {
    Expr::Construct(Type::Vec4, vec![x.into(), y.into(), z.into(), w.into()])
}

/// `vec2(value)` with every component set to `value`.
pub fn vec2_splat(value: impl Into<Expr>) -> Expr {
    Expr::Construct(Type::Vec2, vec![value.into()])
}

/// `vec3(value)` with every component set to `value`.
pub fn vec3_splat(value: impl Into<Expr>) -> Expr {
    Expr::Construct(Type::Vec3, vec![value.into()])
}

/// `vec4(xyz, w)`
pub fn vec4_from(xyz: impl Into<Expr>, w: impl Into<Expr>) -> Expr {
    Expr::Construct(Type::Vec4, vec![xyz.into(), w.into()])
}

/// `mat3x3(c0, c1, c2)` from three column vectors.
pub fn mat3(c0: impl Into<Expr>, c1: impl Into<Expr>, c2: impl Into<Expr>) -> Expr {
    Expr::Construct(Type::Mat3, vec![c0.into(), c1.into(), c2.into()])
}

/// `condition ? accept : reject`
pub fn select(
    condition: impl Into<Expr>,
    accept: impl Into<Expr>,
    reject: impl Into<Expr>,
) -> Expr {
    Expr::Select {
        condition: Box::new(condition.into()),
        accept: Box::new(accept.into()),
        reject: Box::new(reject.into()),
    }
}

/// Explicit-level texture sample.
pub fn texture_sample(
    texture: &str,
    sampler: &str,
    coords: impl Into<Expr>,
    layer: Option<Expr>,
) -> Expr {
    Expr::Texture(TextureSample::Sample {
        texture: texture.to_owned(),
        sampler: sampler.to_owned(),
        coords: Box::new(coords.into()),
        layer: layer.map(Box::new),
        level: Box::new(float(0.0)),
    })
}

/// Depth comparison sample.
pub fn texture_compare(
    texture: &str,
    sampler: &str,
    coords: impl Into<Expr>,
    layer: Option<Expr>,
    depth_ref: impl Into<Expr>,
) -> Expr {
    Expr::Texture(TextureSample::Compare {
        texture: texture.to_owned(),
        sampler: sampler.to_owned(),
        coords: Box::new(coords.into()),
        layer: layer.map(Box::new),
        depth_ref: Box::new(depth_ref.into()),
    })
}

macro_rules! intrinsic_fns {
    ($($(#[$doc:meta])* $name:ident => $variant:ident ($($arg:ident),+);)*) => {
        $(
            $(#[$doc])*
            pub fn $name($($arg: impl Into<Expr>),+) -> Expr {
                Expr::Intrinsic(Intrinsic::$variant, vec![$($arg.into()),+])
            }
        )*
    };
}

intrinsic_fns! {
    /// `abs(x)`
    abs => Abs(x);
    /// `acos(x)`
    acos => Acos(x);
    /// `atan2(y, x)`
    atan2 => Atan2(y, x);
    /// `ceil(x)`
    ceil => Ceil(x);
    /// `clamp(x, lo, hi)`
    clamp => Clamp(x, lo, hi);
    /// `cos(x)`
    cos => Cos(x);
    /// `cross(a, b)`
    cross => Cross(a, b);
    /// `distance(a, b)`
    distance => Distance(a, b);
    /// `dot(a, b)`
    dot => Dot(a, b);
    /// `exp(x)`
    exp => Exp(x);
    /// `exp2(x)`
    exp2 => Exp2(x);
    /// `floor(x)`
    floor => Floor(x);
    /// `fma(a, b, c)` = `a * b + c`
    fma => Fma(a, b, c);
    /// `fract(x)`
    fract => Fract(x);
    /// `inverseSqrt(x)`
    inverse_sqrt => InverseSqrt(x);
    /// `length(x)`
    length => Length(x);
    /// `log(x)`
    log => Log(x);
    /// `max(a, b)`
    max => Max(a, b);
    /// `min(a, b)`
    min => Min(a, b);
    /// `mix(a, b, t)`
    mix => Mix(a, b, t);
    /// `normalize(x)`
    normalize => Normalize(x);
    /// `pow(x, y)`
    pow => Pow(x, y);
    /// `reflect(i, n)`
    reflect => Reflect(i, n);
    /// `reverseBits(x)`
    reverse_bits => ReverseBits(x);
    /// `saturate(x)`
    saturate => Saturate(x);
    /// `sign(x)`
    sign => Sign(x);
    /// `sin(x)`
    sin => Sin(x);
    /// `smoothstep(lo, hi, x)`
    smoothstep => SmoothStep(lo, hi, x);
    /// `sqrt(x)`
    sqrt => Sqrt(x);
    /// `step(edge, x)`
    step => Step(edge, x);
    /// `tan(x)`
    tan => Tan(x);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_overloads_build_trees() {
        let a = var("a");
        let e = &a * 2.0 + 1.0;
        match e {
            Expr::Binary(BinaryOp::Add, lhs, rhs) => {
                assert!(matches!(*lhs, Expr::Binary(BinaryOp::Mul, _, _)));
                assert_eq!(*rhs, Expr::Literal(Literal::Float(1.0)));
            }
            other => panic!("unexpected expression {other:?}"),
        }
        let e = 1.0 - &a;
        assert!(matches!(e, Expr::Binary(BinaryOp::Sub, _, _)));
    }

    #[test]
    fn test_swizzle_parsing() {
        let v = var("v");
        assert_eq!(v.swizzle("rgb"), v.xyz());
        assert_eq!(v.swizzle("w"), v.w());
    }

    #[test]
    fn test_intrinsic_arity_matches_helpers() {
        match mix(var("a"), var("b"), 0.5) {
            Expr::Intrinsic(op, args) => assert_eq!(args.len(), op.arity()),
            other => panic!("unexpected expression {other:?}"),
        }
        match dot(var("a"), var("b")) {
            Expr::Intrinsic(op, args) => assert_eq!(args.len(), op.arity()),
            other => panic!("unexpected expression {other:?}"),
        }
    }
}
