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

//! Runtime values of the CPU evaluator and the operations over them.

use khora_core::math::{Mat4, Vec2, Vec3, Vec4};

use super::EvalError;
use crate::ast::{BinaryOp, Intrinsic, ShaderModule, Type, UnaryOp};

/// A value produced while evaluating shader code on the CPU.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Result of a function without return value.
    Void,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i32),
    /// Unsigned integer.
    UInt(u32),
    /// Float.
    Float(f32),
    /// `vec2<f32>`
    Vec2([f32; 2]),
    /// `vec3<f32>`
    Vec3([f32; 3]),
    /// `vec4<f32>`
    Vec4([f32; 4]),
    /// `mat3x3<f32>`, column-major.
    Mat3([[f32; 3]; 3]),
    /// `mat4x4<f32>`, column-major.
    Mat4([[f32; 4]; 4]),
    /// Fixed or runtime-sized array.
    Array(Vec<Value>),
    /// Struct instance with fields in declaration order.
    Struct {
        /// Struct name.
        name: String,
        /// Field values.
        fields: Vec<(String, Value)>,
    },
}

impl Value {
    /// Builds a storage buffer of `vec4` slots.
    pub fn from_slots(slots: &[[f32; 4]]) -> Self {
        Value::Array(slots.iter().map(|s| Value::Vec4(*s)).collect())
    }

    /// The zero value of `ty`.
    pub fn zero(ty: &Type, module: &ShaderModule) -> Result<Self, EvalError> {
        Ok(match ty {
            Type::Void => Value::Void,
            Type::Bool => Value::Bool(false),
            Type::Int => Value::Int(0),
            Type::UInt => Value::UInt(0),
            Type::Float => Value::Float(0.0),
            Type::Vec2 => Value::Vec2([0.0; 2]),
            Type::Vec3 => Value::Vec3([0.0; 3]),
            Type::Vec4 => Value::Vec4([0.0; 4]),
            Type::Mat3 => Value::Mat3([[0.0; 3]; 3]),
            Type::Mat4 => Value::Mat4([[0.0; 4]; 4]),
            Type::Array(element, count) => {
                let element = Value::zero(element, module)?;
                Value::Array(vec![element; *count as usize])
            }
            Type::RuntimeArray(_) => Value::Array(Vec::new()),
            Type::Struct(name) => {
                let decl = module
                    .struct_decl(name)
                    .ok_or_else(|| EvalError::UnknownStruct(name.clone()))?;
                let fields = decl
                    .fields
                    .iter()
                    .map(|(field, ty)| Ok((field.clone(), Value::zero(ty, module)?)))
                    .collect::<Result<Vec<_>, EvalError>>()?;
                Value::Struct {
                    name: name.clone(),
                    fields,
                }
            }
        })
    }

    /// The float value of a scalar.
    pub fn as_f32(&self) -> Option<f32> {
        match *self {
            Value::Float(v) => Some(v),
            Value::Int(v) => Some(v as f32),
            Value::UInt(v) => Some(v as f32),
            _ => None,
        }
    }

    /// The value of an unsigned integer.
    pub fn as_u32(&self) -> Option<u32> {
        match *self {
            Value::UInt(v) => Some(v),
            Value::Int(v) if v >= 0 => Some(v as u32),
            _ => None,
        }
    }

    /// The value of a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(v) => Some(v),
            _ => None,
        }
    }

    /// The value of a `vec2`.
    pub fn as_vec2(&self) -> Option<Vec2> {
        match *self {
            Value::Vec2([x, y]) => Some(Vec2::new(x, y)),
            _ => None,
        }
    }

    /// The value of a `vec3`.
    pub fn as_vec3(&self) -> Option<Vec3> {
        match *self {
            Value::Vec3([x, y, z]) => Some(Vec3::new(x, y, z)),
            _ => None,
        }
    }

    /// The value of a `vec4`.
    pub fn as_vec4(&self) -> Option<Vec4> {
        match *self {
            Value::Vec4([x, y, z, w]) => Some(Vec4::new(x, y, z, w)),
            _ => None,
        }
    }

    /// A struct field by name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Struct { fields, .. } => {
                fields.iter().find(|(field, _)| field == name).map(|(_, v)| v)
            }
            _ => None,
        }
    }

    pub(crate) fn field_mut(&mut self, name: &str) -> Option<&mut Value> {
        match self {
            Value::Struct { fields, .. } => fields
                .iter_mut()
                .find(|(field, _)| field == name)
                .map(|(_, v)| v),
            _ => None,
        }
    }

    /// Float lanes of a scalar or vector, with the lane count.
    pub(crate) fn lanes(&self) -> Option<([f32; 4], usize)> {
        match *self {
            Value::Float(_) | Value::Int(_) | Value::UInt(_) => {
                Some(([self.as_f32()?, 0.0, 0.0, 0.0], 1))
            }
            Value::Vec2([x, y]) => Some(([x, y, 0.0, 0.0], 2)),
            Value::Vec3([x, y, z]) => Some(([x, y, z, 0.0], 3)),
            Value::Vec4(v) => Some((v, 4)),
            _ => None,
        }
    }

    pub(crate) fn from_lanes(lanes: [f32; 4], count: usize) -> Value {
        match count {
            1 => Value::Float(lanes[0]),
            2 => Value::Vec2([lanes[0], lanes[1]]),
            3 => Value::Vec3([lanes[0], lanes[1], lanes[2]]),
            _ => Value::Vec4(lanes),
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Value::Void => "void",
            Value::Bool(_) => "bool",
            Value::Int(_) => "i32",
            Value::UInt(_) => "u32",
            Value::Float(_) => "f32",
            Value::Vec2(_) => "vec2",
            Value::Vec3(_) => "vec3",
            Value::Vec4(_) => "vec4",
            Value::Mat3(_) => "mat3x3",
            Value::Mat4(_) => "mat4x4",
            Value::Array(_) => "array",
            Value::Struct { .. } => "struct",
        }
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::UInt(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<Vec2> for Value {
    fn from(v: Vec2) -> Self {
        Value::Vec2([v.x, v.y])
    }
}

impl From<Vec3> for Value {
    fn from(v: Vec3) -> Self {
        Value::Vec3([v.x, v.y, v.z])
    }
}

impl From<Vec4> for Value {
    fn from(v: Vec4) -> Self {
        Value::Vec4([v.x, v.y, v.z, v.w])
    }
}

impl From<Mat4> for Value {
    fn from(m: Mat4) -> Self {
        Value::Mat4(m.cols.map(|c| [c.x, c.y, c.z, c.w]))
    }
}

fn mismatch(what: &str, lhs: &Value, rhs: &Value) -> EvalError {
    EvalError::TypeMismatch(format!(
        "{what} between {} and {}",
        lhs.type_name(),
        rhs.type_name()
    ))
}

fn broadcast(lhs: &Value, rhs: &Value) -> Option<([f32; 4], [f32; 4], usize)> {
    let (a, na) = lhs.lanes()?;
    let (b, nb) = rhs.lanes()?;
    let count = match (na, nb) {
        (1, n) => {
            return Some(([a[0]; 4], b, n));
        }
        (n, 1) => {
            return Some((a, [b[0]; 4], n));
        }
        (n, m) if n == m => n,
        _ => return None,
    };
    Some((a, b, count))
}

fn map_lanes(value: &Value, f: impl Fn(f32) -> f32) -> Option<Value> {
    let (lanes, count) = value.lanes()?;
    Some(Value::from_lanes(lanes.map(f), count))
}

fn zip_lanes(lhs: &Value, rhs: &Value, f: impl Fn(f32, f32) -> f32) -> Option<Value> {
    let (a, b, count) = broadcast(lhs, rhs)?;
    let mut out = [0.0; 4];
    for i in 0..4 {
        out[i] = f(a[i], b[i]);
    }
    Some(Value::from_lanes(out, count))
}

fn mat_vec4(m: &[[f32; 4]; 4], v: [f32; 4]) -> [f32; 4] {
    let mut out = [0.0; 4];
    for (col, &scale) in m.iter().zip(v.iter()) {
        for row in 0..4 {
            out[row] += col[row] * scale;
        }
    }
    out
}

fn mat_vec3(m: &[[f32; 3]; 3], v: [f32; 3]) -> [f32; 3] {
    let mut out = [0.0; 3];
    for (col, &scale) in m.iter().zip(v.iter()) {
        for row in 0..3 {
            out[row] += col[row] * scale;
        }
    }
    out
}

/// Applies a unary operator.
pub(crate) fn unary(op: UnaryOp, value: &Value) -> Result<Value, EvalError> {
    match (op, value) {
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOp::Neg, Value::Int(v)) => Ok(Value::Int(v.wrapping_neg())),
        (UnaryOp::Neg, v) => map_lanes(v, |x| -x)
            .ok_or_else(|| EvalError::TypeMismatch(format!("negation of {}", v.type_name()))),
        (UnaryOp::Not, v) => Err(EvalError::TypeMismatch(format!(
            "logical not of {}",
            v.type_name()
        ))),
    }
}

fn integer_binary(op: BinaryOp, a: i64, b: i64) -> Option<i64> {
    Some(match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a.checked_div(b)?,
        BinaryOp::Rem => a.checked_rem(b)?,
        BinaryOp::BitAnd => a & b,
        BinaryOp::BitOr => a | b,
        BinaryOp::Shl => a << (b & 31),
        BinaryOp::Shr => a >> (b & 31),
        _ => return None,
    })
}

fn compare<T: PartialOrd>(op: BinaryOp, a: T, b: T) -> Option<bool> {
    Some(match op {
        BinaryOp::Eq => a == b,
        BinaryOp::Ne => a != b,
        BinaryOp::Lt => a < b,
        BinaryOp::Le => a <= b,
        BinaryOp::Gt => a > b,
        BinaryOp::Ge => a >= b,
        _ => return None,
    })
}

/// Applies a binary operator, broadcasting scalars over vectors.
pub(crate) fn binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, EvalError> {
    use Value::*;

    if let (Bool(a), Bool(b)) = (lhs, rhs) {
        return match op {
            BinaryOp::And => Ok(Bool(*a && *b)),
            BinaryOp::Or => Ok(Bool(*a || *b)),
            BinaryOp::Eq => Ok(Bool(a == b)),
            BinaryOp::Ne => Ok(Bool(a != b)),
            _ => Err(mismatch(op.symbol(), lhs, rhs)),
        };
    }

    // Integer arithmetic stays integral; mixed signedness is compared exactly.
    let integers = match (lhs, rhs) {
        (Int(a), Int(b)) => Some((i64::from(*a), i64::from(*b), true)),
        (UInt(a), UInt(b)) => Some((i64::from(*a), i64::from(*b), false)),
        (Int(a), UInt(b)) => Some((i64::from(*a), i64::from(*b), true)),
        (UInt(a), Int(b)) => Some((i64::from(*a), i64::from(*b), true)),
        _ => None,
    };
    if let Some((a, b, signed)) = integers {
        if let Some(result) = compare(op, a, b) {
            return Ok(Bool(result));
        }
        let value = integer_binary(op, a, b).ok_or_else(|| mismatch(op.symbol(), lhs, rhs))?;
        return Ok(if signed {
            Int(value as i32)
        } else {
            UInt(value as u32)
        });
    }

    match (op, lhs, rhs) {
        (BinaryOp::Mul, Mat4(m), Vec4(v)) => return Ok(Vec4(mat_vec4(m, *v))),
        (BinaryOp::Mul, Mat3(m), Vec3(v)) => return Ok(Vec3(mat_vec3(m, *v))),
        (BinaryOp::Mul, Mat4(a), Mat4(b)) => return Ok(Mat4(b.map(|col| mat_vec4(a, col)))),
        (BinaryOp::Mul, Mat3(a), Mat3(b)) => return Ok(Mat3(b.map(|col| mat_vec3(a, col)))),
        _ => {}
    }

    if matches!(
        op,
        BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
    ) {
        let (Some(a), Some(b)) = (lhs.as_f32(), rhs.as_f32()) else {
            return Err(mismatch(op.symbol(), lhs, rhs));
        };
        return compare(op, a, b)
            .map(Bool)
            .ok_or_else(|| mismatch(op.symbol(), lhs, rhs));
    }

    let f: fn(f32, f32) -> f32 = match op {
        BinaryOp::Add => |a, b| a + b,
        BinaryOp::Sub => |a, b| a - b,
        BinaryOp::Mul => |a, b| a * b,
        BinaryOp::Div => |a, b| a / b,
        BinaryOp::Rem => |a, b| a % b,
        _ => return Err(mismatch(op.symbol(), lhs, rhs)),
    };
    zip_lanes(lhs, rhs, f).ok_or_else(|| mismatch(op.symbol(), lhs, rhs))
}

fn dot_lanes(a: &Value, b: &Value) -> Option<f32> {
    let (x, n) = a.lanes()?;
    let (y, m) = b.lanes()?;
    if n != m {
        return None;
    }
    Some((0..n).map(|i| x[i] * y[i]).sum())
}

/// Evaluates a builtin.
pub(crate) fn intrinsic(op: Intrinsic, args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != op.arity() {
        return Err(EvalError::Arity {
            function: op.wgsl_name().to_owned(),
            expected: op.arity(),
            found: args.len(),
        });
    }
    let fail = || {
        EvalError::TypeMismatch(format!(
            "{}({})",
            op.wgsl_name(),
            args.iter().map(Value::type_name).collect::<Vec<_>>().join(", ")
        ))
    };

    // Integer overloads.
    match (op, args) {
        (Intrinsic::ReverseBits, [Value::UInt(v)]) => return Ok(Value::UInt(v.reverse_bits())),
        (Intrinsic::ReverseBits, [Value::Int(v)]) => return Ok(Value::Int(v.reverse_bits())),
        (Intrinsic::Abs, [Value::Int(v)]) => return Ok(Value::Int(v.wrapping_abs())),
        (Intrinsic::Sign, [Value::Int(v)]) => return Ok(Value::Int(v.signum())),
        (Intrinsic::Min, [Value::UInt(a), Value::UInt(b)]) => return Ok(Value::UInt(*a.min(b))),
        (Intrinsic::Max, [Value::UInt(a), Value::UInt(b)]) => return Ok(Value::UInt(*a.max(b))),
        (Intrinsic::Min, [Value::Int(a), Value::Int(b)]) => return Ok(Value::Int(*a.min(b))),
        (Intrinsic::Max, [Value::Int(a), Value::Int(b)]) => return Ok(Value::Int(*a.max(b))),
        (Intrinsic::Clamp, [Value::UInt(v), Value::UInt(lo), Value::UInt(hi)]) => {
            return Ok(Value::UInt((*v).max(*lo).min(*hi)))
        }
        (Intrinsic::Clamp, [Value::Int(v), Value::Int(lo), Value::Int(hi)]) => {
            return Ok(Value::Int((*v).max(*lo).min(*hi)))
        }
        _ => {}
    }

    let value = match op {
        Intrinsic::Abs => map_lanes(&args[0], f32::abs),
        Intrinsic::Acos => map_lanes(&args[0], f32::acos),
        Intrinsic::Ceil => map_lanes(&args[0], f32::ceil),
        Intrinsic::Cos => map_lanes(&args[0], f32::cos),
        Intrinsic::Exp => map_lanes(&args[0], f32::exp),
        Intrinsic::Exp2 => map_lanes(&args[0], f32::exp2),
        Intrinsic::Floor => map_lanes(&args[0], f32::floor),
        Intrinsic::Fract => map_lanes(&args[0], |x| x - x.floor()),
        Intrinsic::InverseSqrt => map_lanes(&args[0], |x| 1.0 / x.sqrt()),
        Intrinsic::Log => map_lanes(&args[0], f32::ln),
        Intrinsic::Saturate => map_lanes(&args[0], |x| x.clamp(0.0, 1.0)),
        Intrinsic::Sign => map_lanes(&args[0], |x| {
            if x > 0.0 {
                1.0
            } else if x < 0.0 {
                -1.0
            } else {
                0.0
            }
        }),
        Intrinsic::Sin => map_lanes(&args[0], f32::sin),
        Intrinsic::Sqrt => map_lanes(&args[0], f32::sqrt),
        Intrinsic::Tan => map_lanes(&args[0], f32::tan),
        Intrinsic::Atan2 => zip_lanes(&args[0], &args[1], f32::atan2),
        Intrinsic::Max => zip_lanes(&args[0], &args[1], f32::max),
        Intrinsic::Min => zip_lanes(&args[0], &args[1], f32::min),
        Intrinsic::Pow => zip_lanes(&args[0], &args[1], f32::powf),
        Intrinsic::Step => zip_lanes(&args[0], &args[1], |edge, x| {
            if edge <= x {
                1.0
            } else {
                0.0
            }
        }),
        Intrinsic::Dot => dot_lanes(&args[0], &args[1]).map(Value::Float),
        Intrinsic::Length => dot_lanes(&args[0], &args[0]).map(|d| Value::Float(d.sqrt())),
        Intrinsic::Distance => {
            let delta = binary(BinaryOp::Sub, &args[0], &args[1])?;
            dot_lanes(&delta, &delta).map(|d| Value::Float(d.sqrt()))
        }
        Intrinsic::Normalize => {
            let length = dot_lanes(&args[0], &args[0]).ok_or_else(fail)?.sqrt();
            map_lanes(&args[0], |x| x / length)
        }
        Intrinsic::Cross => match (&args[0], &args[1]) {
            (Value::Vec3(a), Value::Vec3(b)) => Some(Value::Vec3([
                a[1] * b[2] - a[2] * b[1],
                a[2] * b[0] - a[0] * b[2],
                a[0] * b[1] - a[1] * b[0],
            ])),
            _ => None,
        },
        Intrinsic::Reflect => {
            let d = dot_lanes(&args[1], &args[0]).ok_or_else(fail)?;
            let scaled = binary(BinaryOp::Mul, &args[1], &Value::Float(2.0 * d))?;
            Some(binary(BinaryOp::Sub, &args[0], &scaled)?)
        }
        Intrinsic::Clamp => {
            let low = zip_lanes(&args[0], &args[1], f32::max).ok_or_else(fail)?;
            zip_lanes(&low, &args[2], f32::min)
        }
        Intrinsic::Fma => {
            let product = binary(BinaryOp::Mul, &args[0], &args[1])?;
            Some(binary(BinaryOp::Add, &product, &args[2])?)
        }
        Intrinsic::Mix => {
            let delta = binary(BinaryOp::Sub, &args[1], &args[0])?;
            let scaled = binary(BinaryOp::Mul, &delta, &args[2])?;
            Some(binary(BinaryOp::Add, &args[0], &scaled)?)
        }
        Intrinsic::SmoothStep => {
            let range = binary(BinaryOp::Sub, &args[1], &args[0])?;
            let offset = binary(BinaryOp::Sub, &args[2], &args[0])?;
            let t = zip_lanes(&offset, &range, |o, r| (o / r).clamp(0.0, 1.0)).ok_or_else(fail)?;
            map_lanes(&t, |t| t * t * (3.0 - 2.0 * t))
        }
        Intrinsic::ReverseBits => None,
    };
    value.ok_or_else(fail)
}

fn flatten(args: &[Value]) -> Option<Vec<f32>> {
    let mut out = Vec::new();
    for arg in args {
        let (lanes, count) = arg.lanes()?;
        out.extend_from_slice(&lanes[..count]);
    }
    Some(out)
}

/// Evaluates a constructor or conversion.
pub(crate) fn construct(
    ty: &Type,
    args: Vec<Value>,
    module: &ShaderModule,
) -> Result<Value, EvalError> {
    let fail = |args: &[Value]| {
        EvalError::TypeMismatch(format!(
            "{ty}({})",
            args.iter().map(Value::type_name).collect::<Vec<_>>().join(", ")
        ))
    };
    if args.is_empty() {
        return Value::zero(ty, module);
    }
    let value = match ty {
        Type::Float => args[0].as_f32().map(Value::Float).or(match args[0] {
            Value::Bool(b) => Some(Value::Float(if b { 1.0 } else { 0.0 })),
            _ => None,
        }),
        Type::Int => match args[0] {
            Value::Int(v) => Some(Value::Int(v)),
            Value::UInt(v) => Some(Value::Int(v as i32)),
            Value::Float(v) => Some(Value::Int(v as i32)),
            Value::Bool(b) => Some(Value::Int(i32::from(b))),
            _ => None,
        },
        Type::UInt => match args[0] {
            Value::UInt(v) => Some(Value::UInt(v)),
            Value::Int(v) => Some(Value::UInt(v as u32)),
            Value::Float(v) => Some(Value::UInt(v as u32)),
            Value::Bool(b) => Some(Value::UInt(u32::from(b))),
            _ => None,
        },
        Type::Bool => match args[0] {
            Value::Bool(b) => Some(Value::Bool(b)),
            ref other => other.as_f32().map(|v| Value::Bool(v != 0.0)),
        },
        Type::Vec2 | Type::Vec3 | Type::Vec4 => {
            let count = ty.component_count().unwrap_or(4);
            let flat = flatten(&args).ok_or_else(|| fail(&args))?;
            let mut lanes = [0.0; 4];
            match flat.len() {
                1 => lanes = [flat[0]; 4],
                n if n == count => lanes[..n].copy_from_slice(&flat),
                _ => return Err(fail(&args)),
            }
            Some(Value::from_lanes(lanes, count))
        }
        Type::Mat3 => match args.as_slice() {
            [Value::Vec3(a), Value::Vec3(b), Value::Vec3(c)] => Some(Value::Mat3([*a, *b, *c])),
            _ => None,
        },
        Type::Mat4 => match args.as_slice() {
            [Value::Vec4(a), Value::Vec4(b), Value::Vec4(c), Value::Vec4(d)] => {
                Some(Value::Mat4([*a, *b, *c, *d]))
            }
            _ => None,
        },
        Type::Array(_, count) if args.len() == *count as usize => Some(Value::Array(args.clone())),
        Type::Struct(name) => {
            let decl = module
                .struct_decl(name)
                .ok_or_else(|| EvalError::UnknownStruct(name.clone()))?;
            if decl.fields.len() != args.len() {
                return Err(EvalError::Arity {
                    function: name.clone(),
                    expected: decl.fields.len(),
                    found: args.len(),
                });
            }
            let fields = decl
                .fields
                .iter()
                .map(|(field, _)| field.clone())
                .zip(args.iter().cloned())
                .collect();
            Some(Value::Struct {
                name: name.clone(),
                fields,
            })
        }
        _ => None,
    };
    value.ok_or_else(|| fail(&args))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_scalar_broadcast() {
        let v = binary(BinaryOp::Mul, &Value::Vec3([1.0, 2.0, 3.0]), &Value::Float(2.0)).unwrap();
        assert_eq!(v, Value::Vec3([2.0, 4.0, 6.0]));
        let v = binary(BinaryOp::Sub, &Value::Float(1.0), &Value::Vec2([0.25, 0.5])).unwrap();
        assert_eq!(v, Value::Vec2([0.75, 0.5]));
    }

    #[test]
    fn test_integer_arithmetic_and_comparison() {
        assert_eq!(
            binary(BinaryOp::Add, &Value::UInt(2), &Value::UInt(3)).unwrap(),
            Value::UInt(5)
        );
        assert_eq!(
            binary(BinaryOp::Lt, &Value::UInt(2), &Value::UInt(3)).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            binary(BinaryOp::Ge, &Value::Int(-1), &Value::Int(0)).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn test_matrix_vector_product() {
        let m = Value::from(Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)));
        let p = binary(BinaryOp::Mul, &m, &Value::Vec4([0.0, 0.0, 0.0, 1.0])).unwrap();
        assert_eq!(p, Value::Vec4([1.0, 2.0, 3.0, 1.0]));
    }

    #[test]
    fn test_intrinsics() {
        let n = intrinsic(Intrinsic::Normalize, &[Value::Vec3([3.0, 0.0, 4.0])]).unwrap();
        let n = n.as_vec3().unwrap();
        assert_relative_eq!(n.x, 0.6);
        assert_relative_eq!(n.z, 0.8);
        let m = intrinsic(
            Intrinsic::Mix,
            &[Value::Float(2.0), Value::Float(4.0), Value::Float(0.25)],
        )
        .unwrap();
        assert_eq!(m, Value::Float(2.5));
        let r = intrinsic(Intrinsic::ReverseBits, &[Value::UInt(1)]).unwrap();
        assert_eq!(r, Value::UInt(0x8000_0000));
        let err = intrinsic(Intrinsic::Dot, &[Value::Float(1.0)]).unwrap_err();
        assert!(matches!(err, EvalError::Arity { expected: 2, found: 1, .. }));
    }

    #[test]
    fn test_vector_construction() {
        let module = ShaderModule::default();
        let v = construct(&Type::Vec3, vec![Value::Float(0.5)], &module).unwrap();
        assert_eq!(v, Value::Vec3([0.5; 3]));
        let v = construct(
            &Type::Vec4,
            vec![Value::Vec3([1.0, 2.0, 3.0]), Value::Float(4.0)],
            &module,
        )
        .unwrap();
        assert_eq!(v, Value::Vec4([1.0, 2.0, 3.0, 4.0]));
        assert!(construct(&Type::Vec3, vec![Value::Vec2([1.0, 2.0])], &module).is_err());
    }
}
