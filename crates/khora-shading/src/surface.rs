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

//! Fragment surface records and the per-light vectors derived from them.

use khora_core::math::{Vec2, Vec3};

use crate::ast::{clamp, distance, dot, length, normalize, Expr, StructDecl, Type};
use crate::brdf::BrdfHelpers;
use crate::eval::Value;
use crate::{ShaderWriter, ShadingError};

/// Name of the surface struct in generated modules.
pub const SURFACE: &str = "Surface";

/// Typed view over a `Surface` value.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    expr: Expr,
}

impl Surface {
    /// Declares the struct in the writer's module.
    pub fn declare(writer: &mut ShaderWriter) -> Type {
        writer.declare_struct(StructDecl::new(
            SURFACE,
            vec![
                ("worldPosition", Type::Vec3),
                ("viewPosition", Type::Vec3),
                ("clipPosition", Type::Vec2),
                ("normal", Type::Vec3),
                ("clearcoatNormal", Type::Vec3),
                ("tangent", Type::Vec3),
                ("bitangent", Type::Vec3),
                ("texCoord", Type::Vec3),
            ],
        ))
    }

    /// The shader type.
    pub fn ty() -> Type {
        Type::named(SURFACE)
    }

    /// Wraps an expression of type `Surface`.
    pub fn new(expr: Expr) -> Self {
        Self { expr }
    }

    /// The wrapped expression.
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// World space position.
    pub fn world_position(&self) -> Expr {
        self.expr.field("worldPosition")
    }

    /// Camera space position, the camera looks down `-z`.
    pub fn view_position(&self) -> Expr {
        self.expr.field("viewPosition")
    }

    /// Fragment position in pixels.
    pub fn clip_position(&self) -> Expr {
        self.expr.field("clipPosition")
    }

    /// World space shading normal.
    pub fn normal(&self) -> Expr {
        self.expr.field("normal")
    }

    /// World space normal of the clearcoat layer.
    pub fn clearcoat_normal(&self) -> Expr {
        self.expr.field("clearcoatNormal")
    }

    /// World space tangent.
    pub fn tangent(&self) -> Expr {
        self.expr.field("tangent")
    }

    /// World space bitangent.
    pub fn bitangent(&self) -> Expr {
        self.expr.field("bitangent")
    }

    /// Texture coordinates.
    pub fn tex_coord(&self) -> Expr {
        self.expr.field("texCoord")
    }

    /// Linear depth of the fragment in front of the camera.
    pub fn depth(&self) -> Expr {
        -self.view_position().z()
    }
}

/// Host-side values of a `Surface`, for evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceData {
    /// World space position.
    pub world_position: Vec3,
    /// Camera space position.
    pub view_position: Vec3,
    /// Fragment position in pixels.
    pub clip_position: Vec2,
    /// Shading normal.
    pub normal: Vec3,
    /// Clearcoat normal.
    pub clearcoat_normal: Vec3,
    /// Tangent.
    pub tangent: Vec3,
    /// Bitangent.
    pub bitangent: Vec3,
    /// Texture coordinates.
    pub tex_coord: Vec3,
}

impl Default for SurfaceData {
    fn default() -> Self {
        Self {
            world_position: Vec3::ZERO,
            view_position: Vec3::new(0.0, 0.0, -1.0),
            clip_position: Vec2::ZERO,
            normal: Vec3::Z,
            clearcoat_normal: Vec3::Z,
            tangent: Vec3::X,
            bitangent: Vec3::Y,
            tex_coord: Vec3::ZERO,
        }
    }
}

impl SurfaceData {
    /// Converts to an evaluator value.
    pub fn to_value(&self) -> Value {
        Value::Struct {
            name: SURFACE.to_owned(),
            fields: vec![
                ("worldPosition".to_owned(), self.world_position.into()),
                ("viewPosition".to_owned(), self.view_position.into()),
                ("clipPosition".to_owned(), self.clip_position.into()),
                ("normal".to_owned(), self.normal.into()),
                ("clearcoatNormal".to_owned(), self.clearcoat_normal.into()),
                ("tangent".to_owned(), self.tangent.into()),
                ("bitangent".to_owned(), self.bitangent.into()),
                ("texCoord".to_owned(), self.tex_coord.into()),
            ],
        }
    }
}

/// Vectors and cosines shared by every BRDF term of one light.
///
/// Built once at the top of a light function; each member is a local of that
/// function.
#[derive(Debug, Clone, PartialEq)]
pub struct LightSurface {
    /// World space position.
    pub world_position: Expr,
    /// Eye position.
    pub eye_position: Expr,
    /// Fragment position in pixels.
    pub clip_position: Expr,
    /// Normal.
    pub n: Expr,
    /// Unit vector towards the eye.
    pub v: Expr,
    /// Distance to the eye.
    pub length_v: Expr,
    /// Unnormalized vector from the fragment to the light.
    pub vertex_to_light: Expr,
    /// Unit vector towards the light.
    pub l: Expr,
    /// Distance to the light, `1` for directional lights.
    pub length_l: Expr,
    /// Half vector.
    pub h: Expr,
    /// `dot(N, V)`, kept away from zero.
    pub ndot_v: Expr,
    /// `dot(N, L)` clamped to `[0, 1]`.
    pub ndot_l: Expr,
    /// `dot(N, H)` clamped to `[0, 1]`.
    pub ndot_h: Expr,
    /// `dot(H, V)` clamped to `[0, 1]`.
    pub hdot_v: Expr,
}

impl LightSurface {
    /// Declares the vectors for a light travelling along `direction`.
    pub fn directional(
        writer: &mut ShaderWriter,
        surface: &Surface,
        world_eye: &Expr,
        direction: Expr,
    ) -> Result<Self, ShadingError> {
        Self::declare(writer, surface, world_eye, -direction)
    }

    /// Declares the vectors for a light located at `position`.
    pub fn positional(
        writer: &mut ShaderWriter,
        surface: &Surface,
        world_eye: &Expr,
        position: Expr,
    ) -> Result<Self, ShadingError> {
        Self::declare(writer, surface, world_eye, position - surface.world_position())
    }

    fn declare(
        w: &mut ShaderWriter,
        surface: &Surface,
        world_eye: &Expr,
        vertex_to_light: Expr,
    ) -> Result<Self, ShadingError> {
        let world_position = surface.world_position();
        let n = w.decl("N", Type::Vec3, normalize(surface.normal()))?;
        let v = w.decl("V", Type::Vec3, normalize(world_eye - &world_position))?;
        let length_v = w.decl("lengthV", Type::Float, distance(world_eye, &world_position))?;
        let vertex_to_light = w.decl("vertexToLight", Type::Vec3, vertex_to_light)?;
        let length_l = w.decl("lengthL", Type::Float, length(&vertex_to_light))?;
        let l = w.decl("L", Type::Vec3, &vertex_to_light / &length_l)?;
        let h = w.decl("H", Type::Vec3, normalize(&l + &v))?;
        let hdot_v = w.decl("HdotV", Type::Float, clamp(dot(&h, &v), 0.0, 1.0))?;
        let mut surface = Self {
            world_position,
            eye_position: world_eye.clone(),
            clip_position: surface.clip_position(),
            n: n.clone(),
            v,
            length_v,
            vertex_to_light,
            l,
            length_l,
            h,
            hdot_v,
            ndot_v: Expr::from(0.0),
            ndot_l: Expr::from(0.0),
            ndot_h: Expr::from(0.0),
        };
        surface.declare_cosines(w, n)?;
        Ok(surface)
    }

    fn declare_cosines(&mut self, w: &mut ShaderWriter, n: Expr) -> Result<(), ShadingError> {
        self.ndot_v = w.decl("NdotV", Type::Float, clamp(dot(&n, &self.v), 0.0001, 1.0))?;
        self.ndot_l = w.decl("NdotL", Type::Float, clamp(dot(&n, &self.l), 0.0, 1.0))?;
        self.ndot_h = w.decl("NdotH", Type::Float, clamp(dot(&n, &self.h), 0.0, 1.0))?;
        self.n = n;
        Ok(())
    }

    /// The same light seen from another normal, e.g. the clearcoat layer.
    pub fn with_normal(&self, w: &mut ShaderWriter, normal: Expr) -> Result<Self, ShadingError> {
        let mut surface = self.clone();
        let n = w.decl("N", Type::Vec3, normalize(normal))?;
        surface.declare_cosines(w, n)?;
        Ok(surface)
    }

    /// Declares `F`, the Schlick Fresnel term at `HdotV` for `f0`.
    pub fn fresnel(
        &self,
        w: &mut ShaderWriter,
        helpers: &mut BrdfHelpers,
        f0: Expr,
    ) -> Result<Expr, ShadingError> {
        let fresnel = helpers.fresnel_schlick(w, self.hdot_v.clone(), f0)?;
        w.decl("F", Type::Vec3, fresnel)
    }
}
