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

//! Texture unit configurations: decode and per-channel getters.
//!
//! [`TextureConfigurations`] implements `c3d_getTextureConfiguration(index)`,
//! which rebuilds a [`TextureConfigData`] record from the packed buffer (see
//! [`layout`]). The getters of the record blend a sampled texel into a
//! material channel and are a no-op when the channel is not routed to the
//! unit.

mod contributions;
pub mod layout;

pub use contributions::{GeometryInputs, TextureUnit, MAP_SAMPLER};
pub use layout::{encode, TextureConfigBuffer, TextureConfigSlot, TEXTURE_CONFIG_COMPONENTS};

use crate::ast::{
    cos, mix, normalize, pow, select, sin, vec2, vec3, vec3_splat, Expr, GlobalKind, Param,
    StructDecl, Type,
};
use crate::writer::FunctionCache;
use crate::{ShaderWriter, ShadingError};
use layout::*;

/// Name of the texture configuration storage buffer.
pub const TEXTURE_CONFIGS_BUFFER: &str = "c3d_textureConfigs";
/// Name of the decoded record struct.
pub const TEXTURE_CONFIG_DATA: &str = "TextureConfigData";
/// Exponent removing the sRGB transfer curve.
pub const GAMMA: f32 = 2.2;

/// Typed view over a `TextureConfigData` value.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureConfigData {
    expr: Expr,
}

impl TextureConfigData {
    /// Declares the struct.
    pub fn declare(writer: &mut ShaderWriter) -> Type {
        writer.declare_struct(StructDecl::new(
            TEXTURE_CONFIG_DATA,
            vec![
                ("colourMask", Type::Vec2),
                ("specularMask", Type::Vec2),
                ("glossinessMask", Type::Vec2),
                ("opacityMask", Type::Vec2),
                ("emissiveMask", Type::Vec2),
                ("occlusionMask", Type::Vec2),
                ("transmittanceMask", Type::Vec2),
                ("needsGammaCorrection", Type::Float),
                ("needsYInversion", Type::Float),
                ("normalMask", Type::Vec2),
                ("normalFactor", Type::Float),
                ("normalGMultiplier", Type::Float),
                ("heightMask", Type::Vec2),
                ("heightFactor", Type::Float),
                ("isAnimated", Type::Float),
                ("texcoordSet", Type::Float),
                ("metalnessMask", Type::Vec2),
                ("roughnessMask", Type::Vec2),
                ("translate", Type::Vec2),
                ("rotate", Type::Float),
                ("scale", Type::Vec2),
                ("clearcoatMask", Type::Vec2),
                ("sheenMask", Type::Vec2),
            ],
        ))
    }

    /// The shader type.
    pub fn ty() -> Type {
        Type::named(TEXTURE_CONFIG_DATA)
    }

    /// Wraps an expression of type `TextureConfigData`.
    pub fn new(expr: Expr) -> Self {
        Self { expr }
    }

    /// The wrapped expression.
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// A field by name.
    pub fn field(&self, name: &str) -> Expr {
        self.expr.field(name)
    }

    /// `mask.x != 0`: the channel is read from this unit.
    pub fn is_mapped(&self, mask: &str) -> Expr {
        self.field(mask).x().not_equals(0.0)
    }

    /// The texel component selected by `mask`.
    pub fn scalar(&self, sampled: &Expr, mask: &str) -> Expr {
        sampled.at(self.field(mask).y().cast(Type::UInt))
    }

    /// Three texel components starting at the one selected by `mask` (`rgb` or `gba`).
    pub fn vector(&self, sampled: &Expr, mask: &str) -> Expr {
        select(
            self.field(mask).y().ge(1.0),
            sampled.swizzle("gba"),
            sampled.swizzle("rgb"),
        )
    }

    /// [`vector`](Self::vector) converted to linear space when the unit is sRGB encoded.
    pub fn colour(&self, sampled: &Expr, mask: &str) -> Expr {
        let rgb = self.vector(sampled, mask);
        select(
            self.field("needsGammaCorrection").not_equals(0.0),
            pow(rgb.clone(), vec3_splat(GAMMA)),
            rgb,
        )
    }

    fn modulate_colour(&self, sampled: &Expr, mask: &str, current: &Expr) -> Expr {
        select(
            self.is_mapped(mask),
            current * self.colour(sampled, mask),
            current,
        )
    }

    fn modulate_scalar(&self, sampled: &Expr, mask: &str, current: &Expr) -> Expr {
        select(
            self.is_mapped(mask),
            current * self.scalar(sampled, mask),
            current,
        )
    }

    /// Albedo modulated by the texel colour.
    pub fn get_albedo(&self, sampled: &Expr, albedo: &Expr) -> Expr {
        self.modulate_colour(sampled, "colourMask", albedo)
    }

    /// Specular colour modulated by the texel colour.
    pub fn get_specular(&self, sampled: &Expr, specular: &Expr) -> Expr {
        self.modulate_colour(sampled, "specularMask", specular)
    }

    /// Emissive colour modulated by the texel colour.
    pub fn get_emissive(&self, sampled: &Expr, emissive: &Expr) -> Expr {
        self.modulate_colour(sampled, "emissiveMask", emissive)
    }

    /// Sheen colour modulated by the texel colour.
    pub fn get_sheen(&self, sampled: &Expr, sheen: &Expr) -> Expr {
        self.modulate_colour(sampled, "sheenMask", sheen)
    }

    /// Glossiness scaled by the texel.
    pub fn get_glossiness(&self, sampled: &Expr, glossiness: &Expr) -> Expr {
        self.modulate_scalar(sampled, "glossinessMask", glossiness)
    }

    /// Roughness scaled by the texel.
    pub fn get_roughness(&self, sampled: &Expr, roughness: &Expr) -> Expr {
        self.modulate_scalar(sampled, "roughnessMask", roughness)
    }

    /// Metalness scaled by the texel.
    pub fn get_metalness(&self, sampled: &Expr, metalness: &Expr) -> Expr {
        self.modulate_scalar(sampled, "metalnessMask", metalness)
    }

    /// Opacity scaled by the texel.
    pub fn get_opacity(&self, sampled: &Expr, opacity: &Expr) -> Expr {
        self.modulate_scalar(sampled, "opacityMask", opacity)
    }

    /// Occlusion scaled by the texel.
    pub fn get_occlusion(&self, sampled: &Expr, occlusion: &Expr) -> Expr {
        self.modulate_scalar(sampled, "occlusionMask", occlusion)
    }

    /// Transmittance scaled by the texel.
    pub fn get_transmittance(&self, sampled: &Expr, transmittance: &Expr) -> Expr {
        self.modulate_scalar(sampled, "transmittanceMask", transmittance)
    }

    /// Clearcoat factor scaled by the texel.
    pub fn get_clearcoat(&self, sampled: &Expr, clearcoat: &Expr) -> Expr {
        self.modulate_scalar(sampled, "clearcoatMask", clearcoat)
    }

    /// Height read from the texel, `0` when the unit holds no height.
    pub fn get_height(&self, sampled: &Expr) -> Expr {
        select(
            self.is_mapped("heightMask"),
            self.scalar(sampled, "heightMask"),
            0.0,
        )
    }

    /// The normal perturbed by a tangent-space normal map texel.
    ///
    /// The green channel is scaled by `normalGMultiplier` and the result is
    /// blended with the geometric normal by `normalFactor`.
    pub fn get_normal(
        &self,
        sampled: &Expr,
        normal: &Expr,
        tangent: &Expr,
        bitangent: &Expr,
    ) -> Expr {
        let decoded = vec3(
            sampled.x() * 2.0 - 1.0,
            (sampled.y() * 2.0 - 1.0) * self.field("normalGMultiplier"),
            sampled.z() * 2.0 - 1.0,
        );
        let tbn = Expr::Construct(
            Type::Mat3,
            vec![tangent.clone(), bitangent.clone(), normal.clone()],
        );
        let mapped = normalize(tbn * decoded);
        select(
            self.is_mapped("normalMask"),
            normalize(mix(normal, mapped, self.field("normalFactor"))),
            normal,
        )
    }

    /// Texture coordinates of this unit: scaled, rotated and translated when
    /// the unit is animated, then flipped vertically when required.
    pub fn transform_uv(&self, uv: &Expr) -> Expr {
        let scaled = uv * self.field("scale");
        let angle = self.field("rotate");
        let (c, s) = (cos(&angle), sin(&angle));
        let rotated = vec2(
            &c * scaled.x() - &s * scaled.y(),
            s * scaled.x() + c * scaled.y(),
        ) + self.field("translate");
        let animated = select(self.field("isAnimated").not_equals(0.0), rotated, uv);
        select(
            self.field("needsYInversion").not_equals(0.0),
            vec2(animated.x(), 1.0 - animated.y()),
            animated,
        )
    }
}

/// Declares the texture configuration buffer and decodes its rows.
#[derive(Debug, Default)]
pub struct TextureConfigurations {
    prefix: String,
    functions: FunctionCache<&'static str>,
}

impl TextureConfigurations {
    /// Creates the generator, the decoder name starts with `c3d_{prefix}`.
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_owned(),
            functions: FunctionCache::new(),
        }
    }

    /// Declares the record struct and the storage buffer.
    pub fn declare(writer: &mut ShaderWriter) {
        TextureConfigData::declare(writer);
        writer.declare_global(
            TEXTURE_CONFIGS_BUFFER,
            GlobalKind::Storage(Type::RuntimeArray(Box::new(Type::Vec4))),
        );
    }

    /// `c3d_getTextureConfiguration(index)`: decodes the row of unit `index` (1-based).
    pub fn get_texture_configuration(
        &mut self,
        writer: &mut ShaderWriter,
        index: impl Into<Expr>,
    ) -> Result<TextureConfigData, ShadingError> {
        Self::declare(writer);
        let name = format!("c3d_{}getTextureConfiguration", self.prefix);
        let handle = self.functions.get_or_implement(
            writer,
            "getTextureConfiguration",
            name,
            TextureConfigData::ty(),
            vec![Param::new("index", Type::UInt)],
            |w| {
                let base = w.decl(
                    "base",
                    Type::UInt,
                    Expr::Var("index".to_owned()) * TEXTURE_CONFIG_COMPONENTS as u32,
                )?;
                let buffer = Expr::Var(TEXTURE_CONFIGS_BUFFER.to_owned());
                let mut slots = Vec::with_capacity(TEXTURE_CONFIG_COMPONENTS);
                for i in 0..TEXTURE_CONFIG_COMPONENTS {
                    let at = buffer.at(&base + i as u32);
                    slots.push(w.decl(&format!("s{i}"), Type::Vec4, at)?);
                }
                w.ret(Expr::Construct(
                    TextureConfigData::ty(),
                    vec![
                        slots[COLR_SPEC].xy(),
                        slots[COLR_SPEC].zw(),
                        slots[GLOSS_OPA].xy(),
                        slots[GLOSS_OPA].zw(),
                        slots[EMIS_OCCL].xy(),
                        slots[EMIS_OCCL].zw(),
                        slots[TRNS_DUMM].xy(),
                        slots[TRNS_DUMM].z(),
                        slots[TRNS_DUMM].w(),
                        slots[NORMAL_FC].xy(),
                        slots[NORMAL_FC].z(),
                        slots[NORMAL_FC].w(),
                        slots[HEIGHT_FC].xy(),
                        slots[HEIGHT_FC].z(),
                        slots[MISC_VALS].x(),
                        slots[MISC_VALS].y(),
                        slots[METL_RGH].xy(),
                        slots[METL_RGH].zw(),
                        slots[TRANSLATE].xy(),
                        slots[TRANSLATE].z(),
                        slots[SCALE_CLC].xy(),
                        slots[SCALE_CLC].zw(),
                        slots[SHEEN_MSK].xy(),
                    ],
                ))
            },
        )?;
        Ok(TextureConfigData::new(handle.call([index.into()])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::{Interpreter, Value};
    use approx::assert_relative_eq;
    use khora_core::math::{Vec2, Vec3};
    use khora_core::renderer::texture::{ChannelMask, TextureUnitConfig, UvTransform};

    fn getter_module<F>(ret: Type, body: F) -> crate::ast::ShaderModule
    where
        F: FnOnce(&TextureConfigData) -> Expr,
    {
        let mut writer = ShaderWriter::new();
        let mut configs = TextureConfigurations::new("");
        writer
            .implement_function(
                "entry",
                ret,
                vec![
                    Param::new("index", Type::UInt),
                    Param::new("sampled", Type::Vec4),
                    Param::new("current", Type::Vec3),
                ],
                |w| {
                    let config = configs.get_texture_configuration(w, Expr::Var("index".into()))?;
                    let config = w.decl("config", TextureConfigData::ty(), config.expr())?;
                    let config = TextureConfigData::new(config);
                    w.ret(body(&config))
                },
            )
            .unwrap();
        writer.finish()
    }

    #[test]
    fn test_unmapped_albedo_is_unchanged() {
        let module = getter_module(Type::Vec3, |config| {
            config.get_albedo(&Expr::Var("sampled".into()), &Expr::Var("current".into()))
        });
        let mut buffer = TextureConfigBuffer::new();
        let mut config = TextureUnitConfig::default();
        config.roughness = ChannelMask::component(1);
        let index = buffer.push(&config);
        let mut interpreter = Interpreter::new(&module).unwrap();
        buffer.bind(&mut interpreter);
        let albedo = Vec3::new(0.3, 0.6, 0.9);
        let result = interpreter
            .call(
                "entry",
                vec![Value::UInt(index), Value::Vec4([0.1, 0.2, 0.3, 0.4]), albedo.into()],
            )
            .unwrap()
            .result;
        assert_eq!(result.as_vec3(), Some(albedo));
    }

    #[test]
    fn test_mapped_albedo_removes_gamma() {
        let module = getter_module(Type::Vec3, |config| {
            config.get_albedo(&Expr::Var("sampled".into()), &Expr::Var("current".into()))
        });
        let mut buffer = TextureConfigBuffer::new();
        let config = TextureUnitConfig {
            colour: ChannelMask::component(0),
            needs_gamma_correction: true,
            ..Default::default()
        };
        buffer.push(&config);
        let mut interpreter = Interpreter::new(&module).unwrap();
        buffer.bind(&mut interpreter);
        let result = interpreter
            .call(
                "entry",
                vec![Value::UInt(1), Value::Vec4([0.5, 1.0, 0.0, 1.0]), Vec3::ONE.into()],
            )
            .unwrap()
            .result
            .as_vec3()
            .unwrap();
        assert_relative_eq!(result.x, 0.5f32.powf(GAMMA), epsilon = 1e-5);
        assert_relative_eq!(result.y, 1.0, epsilon = 1e-6);
        assert_relative_eq!(result.z, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_scalar_channel_reads_selected_component() {
        let module = getter_module(Type::Float, |config| {
            config.get_roughness(&Expr::Var("sampled".into()), &Expr::Var("current".into()).x())
        });
        let mut buffer = TextureConfigBuffer::new();
        let config = TextureUnitConfig {
            roughness: ChannelMask::component(2),
            ..Default::default()
        };
        buffer.push(&config);
        let mut interpreter = Interpreter::new(&module).unwrap();
        buffer.bind(&mut interpreter);
        let result = interpreter
            .call(
                "entry",
                vec![
                    Value::UInt(1),
                    Value::Vec4([0.1, 0.2, 0.25, 0.4]),
                    Vec3::new(0.8, 0.0, 0.0).into(),
                ],
            )
            .unwrap()
            .result;
        assert_relative_eq!(result.as_f32().unwrap(), 0.2, epsilon = 1e-6);
    }

    #[test]
    fn test_uv_transform_and_inversion() {
        let module = getter_module(Type::Vec2, |config| {
            config.transform_uv(&Expr::Var("current".into()).xy())
        });
        let mut buffer = TextureConfigBuffer::new();
        let config = TextureUnitConfig {
            animated: true,
            needs_y_inversion: true,
            transform: UvTransform {
                translate: Vec2::new(0.5, 0.0),
                rotate: std::f32::consts::FRAC_PI_2,
                scale: Vec2::new(2.0, 2.0),
            },
            ..Default::default()
        };
        buffer.push(&config);
        let mut interpreter = Interpreter::new(&module).unwrap();
        buffer.bind(&mut interpreter);
        let uv = interpreter
            .call(
                "entry",
                vec![Value::UInt(1), Value::Vec4([0.0; 4]), Vec3::new(0.25, 0.0, 0.0).into()],
            )
            .unwrap()
            .result
            .as_vec2()
            .unwrap();
        // (0.25, 0) scaled to (0.5, 0), rotated to (0, 0.5), translated to (0.5, 0.5), flipped.
        assert_relative_eq!(uv.x, 0.5, epsilon = 1e-6);
        assert_relative_eq!(uv.y, 0.5, epsilon = 1e-6);
    }
}
