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

//! Material models and the canonical shader-side material record.
//!
//! Every model is lowered to one `LightMaterial` struct so the lighting
//! functions read the same members whatever the authoring workflow. The PBR
//! models add the clearcoat and sheen members; asking a Phong material for
//! them is a [`ShadingError::MissingMember`].

mod record;

pub use record::{MaterialRecord, MaterialValues};

use std::fmt;

use serde::{Deserialize, Serialize};

use khora_core::renderer::material::{MAX_SHININESS, MIN_SHININESS};

use crate::ast::{clamp, Expr, StructDecl, Type};
use crate::{ShaderWriter, ShadingError};

/// Albedo member.
pub const ALBEDO: &str = "albedo";
/// Specular colour member.
pub const SPECULAR: &str = "specular";
/// Reflectance at normal incidence.
pub const F0: &str = "f0";
/// Roughness member, the canonical smoothness scalar.
pub const ROUGHNESS: &str = "roughness";
/// Metalness member.
pub const METALNESS: &str = "metalness";
/// Emissive member.
pub const EMISSIVE: &str = "emissive";
/// Transmission member.
pub const TRANSMISSION: &str = "transmission";
/// Opacity member.
pub const OPACITY: &str = "opacity";
/// Ambient occlusion member.
pub const OCCLUSION: &str = "occlusion";
/// Clearcoat strength member (PBR only).
pub const CLEARCOAT_FACTOR: &str = "clearcoatFactor";
/// Clearcoat roughness member (PBR only).
pub const CLEARCOAT_ROUGHNESS: &str = "clearcoatRoughness";
/// Sheen colour member (PBR only).
pub const SHEEN_FACTOR: &str = "sheenFactor";
/// Sheen roughness member (PBR only).
pub const SHEEN_ROUGHNESS: &str = "sheenRoughness";

const COMMON_MEMBERS: [(&str, Type); 9] = [
    (ALBEDO, Type::Vec3),
    (SPECULAR, Type::Vec3),
    (F0, Type::Vec3),
    (ROUGHNESS, Type::Float),
    (METALNESS, Type::Float),
    (EMISSIVE, Type::Vec3),
    (TRANSMISSION, Type::Float),
    (OPACITY, Type::Float),
    (OCCLUSION, Type::Float),
];

const PBR_MEMBERS: [(&str, Type); 4] = [
    (CLEARCOAT_FACTOR, Type::Float),
    (CLEARCOAT_ROUGHNESS, Type::Float),
    (SHEEN_FACTOR, Type::Vec3),
    (SHEEN_ROUGHNESS, Type::Float),
];

/// The closed set of material models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaterialModel {
    /// Legacy Blinn-Phong.
    Phong,
    /// Metallic-roughness PBR.
    PbrMR,
    /// Specular-glossiness PBR.
    PbrSG,
}

impl MaterialModel {
    /// Short lowercase name used in generated function names.
    pub fn name(self) -> &'static str {
        match self {
            MaterialModel::Phong => "phong",
            MaterialModel::PbrMR => "pbrmr",
            MaterialModel::PbrSG => "pbrsg",
        }
    }

    /// Returns `true` for the physically based models.
    pub fn is_pbr(self) -> bool {
        !matches!(self, MaterialModel::Phong)
    }

    /// Name of the `LightMaterial` struct of this model.
    pub fn struct_name(self) -> &'static str {
        if self.is_pbr() {
            "PbrLightMaterial"
        } else {
            "PhongLightMaterial"
        }
    }

    /// Members of the `LightMaterial` struct, in declaration order.
    pub fn members(self) -> Vec<(&'static str, Type)> {
        let mut members = COMMON_MEMBERS.to_vec();
        if self.is_pbr() {
            members.extend(PBR_MEMBERS);
        }
        members
    }

    /// Returns `true` if the model's material record has `member`.
    ///
    /// ```
    /// use khora_shading::MaterialModel;
    ///
    /// assert!(MaterialModel::PbrMR.has_member("clearcoatFactor"));
    /// assert!(!MaterialModel::Phong.has_member("sheenFactor"));
    /// assert!(MaterialModel::Phong.has_member("roughness"));
    /// ```
    pub fn has_member(self, member: &str) -> bool {
        self.members().iter().any(|(name, _)| *name == member)
    }

    /// Declares the material struct in the writer's module.
    pub fn declare(self, writer: &mut ShaderWriter) -> Type {
        writer.declare_struct(StructDecl::new(self.struct_name(), self.members()))
    }

    /// The shader type of the material struct.
    pub fn material_type(self) -> Type {
        Type::named(self.struct_name())
    }
}

impl fmt::Display for MaterialModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Typed view over a `LightMaterial` value of a given model.
#[derive(Debug, Clone, PartialEq)]
pub struct LightMaterial {
    expr: Expr,
    model: MaterialModel,
}

impl LightMaterial {
    /// Wraps an expression of the model's material type.
    pub fn new(expr: Expr, model: MaterialModel) -> Self {
        Self { expr, model }
    }

    /// The wrapped expression.
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// The material model.
    pub fn model(&self) -> MaterialModel {
        self.model
    }

    /// A member by name.
    ///
    /// # Errors
    /// [`ShadingError::MissingMember`] if the model has no such member.
    pub fn member(&self, member: &'static str) -> Result<Expr, ShadingError> {
        if self.model.has_member(member) {
            Ok(self.expr.field(member))
        } else {
            Err(ShadingError::MissingMember {
                model: self.model.name(),
                member,
            })
        }
    }

    /// Base colour.
    pub fn albedo(&self) -> Expr {
        self.expr.field(ALBEDO)
    }

    /// Specular colour.
    pub fn specular(&self) -> Expr {
        self.expr.field(SPECULAR)
    }

    /// Reflectance at normal incidence.
    pub fn f0(&self) -> Expr {
        self.expr.field(F0)
    }

    /// Roughness.
    pub fn roughness(&self) -> Expr {
        self.expr.field(ROUGHNESS)
    }

    /// Metalness.
    pub fn metalness(&self) -> Expr {
        self.expr.field(METALNESS)
    }

    /// Emissive colour.
    pub fn emissive(&self) -> Expr {
        self.expr.field(EMISSIVE)
    }

    /// Transmission.
    pub fn transmission(&self) -> Expr {
        self.expr.field(TRANSMISSION)
    }

    /// Opacity.
    pub fn opacity(&self) -> Expr {
        self.expr.field(OPACITY)
    }

    /// Ambient occlusion.
    pub fn occlusion(&self) -> Expr {
        self.expr.field(OCCLUSION)
    }

    /// Phong exponent derived from the roughness, clamped to `[1, 256]`.
    pub fn shininess(&self) -> Expr {
        clamp(
            (1.0 - self.roughness()) * MAX_SHININESS,
            MIN_SHININESS,
            MAX_SHININESS,
        )
    }

    /// Clearcoat strength.
    pub fn clearcoat_factor(&self) -> Result<Expr, ShadingError> {
        self.member(CLEARCOAT_FACTOR)
    }

    /// Clearcoat roughness.
    pub fn clearcoat_roughness(&self) -> Result<Expr, ShadingError> {
        self.member(CLEARCOAT_ROUGHNESS)
    }

    /// Sheen colour.
    pub fn sheen_factor(&self) -> Result<Expr, ShadingError> {
        self.member(SHEEN_FACTOR)
    }

    /// Sheen roughness.
    pub fn sheen_roughness(&self) -> Result<Expr, ShadingError> {
        self.member(SHEEN_ROUGHNESS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::var;

    #[test]
    fn test_missing_member_on_phong() {
        let material = LightMaterial::new(var("material"), MaterialModel::Phong);
        let err = material.clearcoat_factor().unwrap_err();
        assert!(matches!(
            err,
            ShadingError::MissingMember { model: "phong", member: "clearcoatFactor" }
        ));
        assert!(material.roughness() == var("material").field("roughness"));
    }

    #[test]
    fn test_pbr_models_share_a_struct() {
        let mut writer = ShaderWriter::new();
        let mr = MaterialModel::PbrMR.declare(&mut writer);
        let sg = MaterialModel::PbrSG.declare(&mut writer);
        MaterialModel::Phong.declare(&mut writer);
        assert_eq!(mr, sg);
        assert_eq!(writer.module().structs.len(), 2);
        let pbr = writer.module().struct_decl("PbrLightMaterial").unwrap();
        assert!(pbr.has_field(SHEEN_ROUGHNESS));
        let phong = writer.module().struct_decl("PhongLightMaterial").unwrap();
        assert!(!phong.has_field(CLEARCOAT_FACTOR));
    }
}
