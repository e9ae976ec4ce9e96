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

//! Shader types, struct declarations and function parameters.

use std::fmt;

/// A shader value type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// No value, only valid as a function return type.
    Void,
    /// Boolean.
    Bool,
    /// 32-bit signed integer.
    Int,
    /// 32-bit unsigned integer.
    UInt,
    /// 32-bit float.
    Float,
    /// 2-component float vector.
    Vec2,
    /// 3-component float vector.
    Vec3,
    /// 4-component float vector.
    Vec4,
    /// 3x3 float matrix.
    Mat3,
    /// 4x4 float matrix.
    Mat4,
    /// Fixed-size array.
    Array(Box<Type>, u32),
    /// Runtime-sized array, only valid for storage buffers.
    RuntimeArray(Box<Type>),
    /// A struct declared in the module, by name.
    Struct(String),
}

impl Type {
    /// Fixed-size array of `count` elements.
    pub fn array(element: Type, count: u32) -> Self {
        Type::Array(Box::new(element), count)
    }

    /// Struct type by name.
    pub fn named(name: impl Into<String>) -> Self {
        Type::Struct(name.into())
    }

    /// Number of float components for vector and scalar types.
    pub fn component_count(&self) -> Option<usize> {
        match self {
            Type::Bool | Type::Int | Type::UInt | Type::Float => Some(1),
            Type::Vec2 => Some(2),
            Type::Vec3 => Some(3),
            Type::Vec4 => Some(4),
            _ => None,
        }
    }

    /// The vector type with `count` components, or `Float` for one.
    pub fn float_vector(count: usize) -> Option<Self> {
        match count {
            1 => Some(Type::Float),
            2 => Some(Type::Vec2),
            3 => Some(Type::Vec3),
            4 => Some(Type::Vec4),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => write!(f, "void"),
            Type::Bool => write!(f, "bool"),
            Type::Int => write!(f, "i32"),
            Type::UInt => write!(f, "u32"),
            Type::Float => write!(f, "f32"),
            Type::Vec2 => write!(f, "vec2<f32>"),
            Type::Vec3 => write!(f, "vec3<f32>"),
            Type::Vec4 => write!(f, "vec4<f32>"),
            Type::Mat3 => write!(f, "mat3x3<f32>"),
            Type::Mat4 => write!(f, "mat4x4<f32>"),
            Type::Array(element, count) => write!(f, "array<{}, {}>", element, count),
            Type::RuntimeArray(element) => write!(f, "array<{}>", element),
            Type::Struct(name) => write!(f, "{}", name),
        }
    }
}

/// A struct declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct StructDecl {
    /// Struct name.
    pub name: String,
    /// Fields in declaration order.
    pub fields: Vec<(String, Type)>,
}

impl StructDecl {
    /// Creates a declaration from `(field, type)` pairs.
    pub fn new<N: Into<String>>(name: impl Into<String>, fields: Vec<(N, Type)>) -> Self {
        Self {
            name: name.into(),
            fields: fields.into_iter().map(|(n, t)| (n.into(), t)).collect(),
        }
    }

    /// Returns `true` if the struct declares `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|(name, _)| name == field)
    }
}

/// How a parameter is passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// By value.
    In,
    /// By reference; the callee's writes are visible to the caller.
    InOut,
}

/// A function parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// Parameter name.
    pub name: String,
    /// Parameter type.
    pub ty: Type,
    /// Passing convention.
    pub kind: ParamKind,
}

impl Param {
    /// A by-value parameter.
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            kind: ParamKind::In,
        }
    }

    /// A by-reference parameter.
    pub fn inout(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            kind: ParamKind::InOut,
        }
    }
}

/// Kinds of texture bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    /// `texture_2d<f32>`.
    D2,
    /// `texture_2d_array<f32>`.
    D2Array,
    /// `texture_cube_array<f32>`.
    CubeArray,
    /// `texture_depth_2d`.
    Depth2D,
    /// `texture_depth_2d_array`.
    Depth2DArray,
    /// `texture_depth_cube_array`.
    DepthCubeArray,
}

impl TextureKind {
    /// Returns `true` for depth textures, whose samples are scalar.
    pub fn is_depth(self) -> bool {
        matches!(
            self,
            TextureKind::Depth2D | TextureKind::Depth2DArray | TextureKind::DepthCubeArray
        )
    }

    /// Returns `true` when sampling needs an array layer.
    pub fn is_arrayed(self) -> bool {
        matches!(
            self,
            TextureKind::D2Array
                | TextureKind::CubeArray
                | TextureKind::Depth2DArray
                | TextureKind::DepthCubeArray
        )
    }
}

impl fmt::Display for TextureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TextureKind::D2 => "texture_2d<f32>",
            TextureKind::D2Array => "texture_2d_array<f32>",
            TextureKind::CubeArray => "texture_cube_array<f32>",
            TextureKind::Depth2D => "texture_depth_2d",
            TextureKind::Depth2DArray => "texture_depth_2d_array",
            TextureKind::DepthCubeArray => "texture_depth_cube_array",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_display() {
        assert_eq!(Type::Vec3.to_string(), "vec3<f32>");
        assert_eq!(Type::array(Type::Mat4, 4).to_string(), "array<mat4x4<f32>, 4>");
        assert_eq!(
            Type::RuntimeArray(Box::new(Type::Vec4)).to_string(),
            "array<vec4<f32>>"
        );
        assert_eq!(Type::named("Light").to_string(), "Light");
    }

    #[test]
    fn test_struct_fields() {
        let decl = StructDecl::new("Foo", vec![("a", Type::Float), ("b", Type::Vec2)]);
        assert!(decl.has_field("b"));
        assert!(!decl.has_field("c"));
    }
}
