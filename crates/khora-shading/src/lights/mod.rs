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

//! Shader-side light records and their decoders.
//!
//! Lights reach the shader as one storage buffer of `vec4<f32>` slots (see
//! [`layout`]). [`LightRecords`] declares the record structs and implements
//! one `c3d_get<Kind>Light(offset)` decoder per record type; the typed views
//! ([`Light`], [`DirectionalLight`], [`PointLight`], [`SpotLight`]) give the
//! lighting code named access to the decoded fields.

mod buffer;
pub mod layout;

pub use buffer::{
    encode_base, encode_directional, encode_point, encode_spot, LightBuffer, LightBufferWriter,
    LightCounts, LightSlot,
};
pub use layout::{BASE_LIGHT_COMPONENTS, MAX_LIGHT_COMPONENTS};

use std::fmt;

use crate::ast::{Expr, GlobalKind, Param, StructDecl, Type};
use crate::writer::FunctionCache;
use crate::{ShaderWriter, ShadingError};
use layout::*;

/// Name of the light slot storage buffer.
pub const LIGHTS_BUFFER: &str = "c3d_lights";
/// Name of the light count uniform.
pub const LIGHT_COUNTS_BUFFER: &str = "c3d_lightCounts";
/// Name of the light count struct.
pub const LIGHT_COUNTS: &str = "LightCounts";
/// Name of the base light struct.
pub const LIGHT: &str = "Light";

/// The light record types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightKind {
    /// Directional light with cascades in a texture array.
    Directional,
    /// Directional light with cascades tiled in one atlas.
    TiledDirectional,
    /// Omnidirectional light.
    Point,
    /// Cone light.
    Spot,
}

impl LightKind {
    /// Every kind, in declaration order.
    pub const ALL: [LightKind; 4] = [
        LightKind::Directional,
        LightKind::TiledDirectional,
        LightKind::Point,
        LightKind::Spot,
    ];

    /// Name used in generated function names, e.g. `computeDirectionalLight`.
    pub fn name(self) -> &'static str {
        match self {
            LightKind::Directional => "Directional",
            LightKind::TiledDirectional => "TiledDirectional",
            LightKind::Point => "Point",
            LightKind::Spot => "Spot",
        }
    }

    /// Name of the record struct.
    pub fn struct_name(self) -> &'static str {
        match self {
            LightKind::Directional => "DirectionalLight",
            LightKind::TiledDirectional => "TiledDirectionalLight",
            LightKind::Point => "PointLight",
            LightKind::Spot => "SpotLight",
        }
    }

    /// The record type.
    pub fn ty(self) -> Type {
        Type::named(self.struct_name())
    }

    /// Returns `true` for both directional variants.
    pub fn is_directional(self) -> bool {
        matches!(self, LightKind::Directional | LightKind::TiledDirectional)
    }

    fn fields(self) -> Vec<(&'static str, Type)> {
        let base = ("base", Type::named(LIGHT));
        match self {
            LightKind::Directional | LightKind::TiledDirectional => vec![
                base,
                ("direction", Type::Vec3),
                ("cascadeCount", Type::UInt),
                ("splitDepths", Type::array(Type::Vec4, SPLIT_DEPTH_SLOTS as u32)),
                ("splitScales", Type::Vec4),
                ("transforms", Type::array(Type::Mat4, 4)),
            ],
            LightKind::Point => vec![
                base,
                ("position", Type::Vec3),
                ("attenuation", Type::Vec3),
            ],
            LightKind::Spot => vec![
                base,
                ("position", Type::Vec3),
                ("attenuation", Type::Vec3),
                ("direction", Type::Vec3),
                ("exponent", Type::Float),
                ("innerCutOff", Type::Float),
                ("outerCutOff", Type::Float),
                ("cutOffsDiff", Type::Float),
                ("transform", Type::Mat4),
            ],
        }
    }
}

impl fmt::Display for LightKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// View over a `Light` value: the parameters shared by every light type.
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    expr: Expr,
}

impl Light {
    /// Declares the struct.
    pub fn declare(writer: &mut ShaderWriter) -> Type {
        writer.declare_struct(StructDecl::new(
            LIGHT,
            vec![
                ("colour", Type::Vec3),
                ("shadowMapIndex", Type::Int),
                ("intensity", Type::Vec2),
                ("farPlane", Type::Float),
                ("shadowType", Type::UInt),
                ("volumetricSteps", Type::UInt),
                ("volumetricScattering", Type::Float),
                ("pcfFilterSize", Type::Float),
                ("pcfSampleCount", Type::UInt),
                ("rawShadowOffsets", Type::Vec2),
                ("pcfShadowOffsets", Type::Vec2),
                ("vsmMinVariance", Type::Float),
                ("vsmLightBleedingReduction", Type::Float),
            ],
        ))
    }

    /// Wraps an expression of type `Light`.
    pub fn new(expr: Expr) -> Self {
        Self { expr }
    }

    /// The wrapped expression.
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Linear colour.
    pub fn colour(&self) -> Expr {
        self.expr.field("colour")
    }

    /// Shadow map layer, negative when the light has none.
    pub fn shadow_map_index(&self) -> Expr {
        self.expr.field("shadowMapIndex")
    }

    /// Diffuse intensity in `x`, specular intensity in `y`.
    pub fn intensity(&self) -> Expr {
        self.expr.field("intensity")
    }

    /// Far plane of the shadow projection.
    pub fn far_plane(&self) -> Expr {
        self.expr.field("farPlane")
    }

    /// Shadow filtering, see `ShadowType::as_u32`.
    pub fn shadow_type(&self) -> Expr {
        self.expr.field("shadowType")
    }

    /// Ray-march steps of volumetric scattering.
    pub fn volumetric_steps(&self) -> Expr {
        self.expr.field("volumetricSteps")
    }

    /// Scattering factor of volumetric scattering.
    pub fn volumetric_scattering(&self) -> Expr {
        self.expr.field("volumetricScattering")
    }

    /// PCF kernel radius in texels.
    pub fn pcf_filter_size(&self) -> Expr {
        self.expr.field("pcfFilterSize")
    }

    /// PCF tap count.
    pub fn pcf_sample_count(&self) -> Expr {
        self.expr.field("pcfSampleCount")
    }

    /// Minimum and slope-scaled depth offsets of raw filtering.
    pub fn raw_shadow_offsets(&self) -> Expr {
        self.expr.field("rawShadowOffsets")
    }

    /// Minimum and slope-scaled depth offsets of PCF filtering.
    pub fn pcf_shadow_offsets(&self) -> Expr {
        self.expr.field("pcfShadowOffsets")
    }

    /// Variance clamp of variance shadow maps.
    pub fn vsm_min_variance(&self) -> Expr {
        self.expr.field("vsmMinVariance")
    }

    /// Light bleeding reduction of variance shadow maps.
    pub fn vsm_light_bleeding_reduction(&self) -> Expr {
        self.expr.field("vsmLightBleedingReduction")
    }

    /// `shadowType != 0 && shadowMapIndex >= 0`.
    pub fn has_shadow_map(&self) -> Expr {
        self.shadow_type()
            .not_equals(0u32)
            .and(self.shadow_map_index().ge(0i32))
    }

    /// `has_shadow_map() && receivesShadows != 0`.
    pub fn casts_shadows(&self, receives_shadows: &Expr) -> Expr {
        self.has_shadow_map().and(receives_shadows.not_equals(0u32))
    }
}

/// View over a `DirectionalLight` or `TiledDirectionalLight` value.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalLight {
    expr: Expr,
}

impl DirectionalLight {
    /// Wraps a directional record expression.
    pub fn new(expr: Expr) -> Self {
        Self { expr }
    }

    /// The wrapped expression.
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Shared parameters.
    pub fn base(&self) -> Light {
        Light::new(self.expr.field("base"))
    }

    /// Normalized direction, from the light towards the scene.
    pub fn direction(&self) -> Expr {
        self.expr.field("direction")
    }

    /// Number of cascades.
    pub fn cascade_count(&self) -> Expr {
        self.expr.field("cascadeCount")
    }

    /// The `cascadeCount + 1` view-space split depths, packed in two `vec4`.
    pub fn split_depths(&self) -> Expr {
        self.expr.field("splitDepths")
    }

    /// Per-cascade texel scales.
    pub fn split_scales(&self) -> Expr {
        self.expr.field("splitScales")
    }

    /// All four cascade view-projections.
    pub fn transforms(&self) -> Expr {
        self.expr.field("transforms")
    }
}

/// View over a `PointLight` value.
#[derive(Debug, Clone, PartialEq)]
pub struct PointLight {
    expr: Expr,
}

impl PointLight {
    /// Wraps a point record expression.
    pub fn new(expr: Expr) -> Self {
        Self { expr }
    }

    /// The wrapped expression.
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Shared parameters.
    pub fn base(&self) -> Light {
        Light::new(self.expr.field("base"))
    }

    /// World-space position.
    pub fn position(&self) -> Expr {
        self.expr.field("position")
    }

    /// Constant, linear and quadratic attenuation.
    pub fn attenuation(&self) -> Expr {
        self.expr.field("attenuation")
    }
}

/// View over a `SpotLight` value.
#[derive(Debug, Clone, PartialEq)]
pub struct SpotLight {
    expr: Expr,
}

impl SpotLight {
    /// Wraps a spot record expression.
    pub fn new(expr: Expr) -> Self {
        Self { expr }
    }

    /// The wrapped expression.
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Shared parameters.
    pub fn base(&self) -> Light {
        Light::new(self.expr.field("base"))
    }

    /// World-space position.
    pub fn position(&self) -> Expr {
        self.expr.field("position")
    }

    /// Constant, linear and quadratic attenuation.
    pub fn attenuation(&self) -> Expr {
        self.expr.field("attenuation")
    }

    /// Normalized cone axis.
    pub fn direction(&self) -> Expr {
        self.expr.field("direction")
    }

    /// Falloff exponent.
    pub fn exponent(&self) -> Expr {
        self.expr.field("exponent")
    }

    /// Cosine of the inner cone angle.
    pub fn inner_cut_off(&self) -> Expr {
        self.expr.field("innerCutOff")
    }

    /// Cosine of the outer cone angle.
    pub fn outer_cut_off(&self) -> Expr {
        self.expr.field("outerCutOff")
    }

    /// `1 / (innerCutOff - outerCutOff)`.
    pub fn cut_offs_diff(&self) -> Expr {
        self.expr.field("cutOffsDiff")
    }

    /// Light view-projection.
    pub fn transform(&self) -> Expr {
        self.expr.field("transform")
    }
}

/// Declares the light records and implements their buffer decoders.
///
/// # Examples
///
/// ```
/// use khora_shading::lights::{LightKind, LightRecords};
/// use khora_shading::ShaderWriter;
///
/// let mut writer = ShaderWriter::new();
/// let mut records = LightRecords::new("");
/// records.decode(&mut writer, LightKind::Spot, 0u32).unwrap();
/// records.decode(&mut writer, LightKind::Spot, 25u32).unwrap();
/// let module = writer.finish();
/// assert!(module.function("c3d_getSpotLight").is_some());
/// assert!(module.function("c3d_getBaseLight").is_some());
/// assert_eq!(module.functions.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct LightRecords {
    prefix: String,
    functions: FunctionCache<Option<LightKind>>,
}

impl LightRecords {
    /// Creates the generator, decoder names start with `c3d_{prefix}`.
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_owned(),
            functions: FunctionCache::new(),
        }
    }

    /// Declares the record structs, the slot buffer and the count uniform.
    pub fn declare(writer: &mut ShaderWriter) {
        Light::declare(writer);
        for kind in LightKind::ALL {
            writer.declare_struct(StructDecl::new(kind.struct_name(), kind.fields()));
        }
        writer.declare_struct(StructDecl::new(
            LIGHT_COUNTS,
            vec![
                ("directional", Type::UInt),
                ("point", Type::UInt),
                ("spot", Type::UInt),
            ],
        ));
        writer.declare_global(
            LIGHTS_BUFFER,
            GlobalKind::Storage(Type::RuntimeArray(Box::new(Type::Vec4))),
        );
        writer.declare_global(LIGHT_COUNTS_BUFFER, GlobalKind::Uniform(Type::named(LIGHT_COUNTS)));
    }

    /// The `c3d_lightCounts` uniform.
    pub fn counts() -> Expr {
        Expr::Var(LIGHT_COUNTS_BUFFER.to_owned())
    }

    /// Slot offset of the `index`-th light of `kind`, computed in the shader
    /// from the count uniform.
    pub fn offset(kind: LightKind, index: impl Into<Expr>) -> Expr {
        let counts = Self::counts();
        let index: Expr = index.into();
        let first = match kind {
            LightKind::Directional | LightKind::TiledDirectional => index,
            LightKind::Point => index + counts.field("directional"),
            LightKind::Spot => index + counts.field("directional") + counts.field("point"),
        };
        first * MAX_LIGHT_COMPONENTS as u32
    }

    /// Decodes the shared parameters at slot `offset`.
    pub fn base(
        &mut self,
        writer: &mut ShaderWriter,
        offset: impl Into<Expr>,
    ) -> Result<Light, ShadingError> {
        Self::declare(writer);
        let name = format!("c3d_{}getBaseLight", self.prefix);
        let handle = self.functions.get_or_implement(
            writer,
            None,
            name,
            Type::named(LIGHT),
            vec![Param::new("offset", Type::UInt)],
            |w| {
                let s0 = w.decl("s0", Type::Vec4, slot(COLOUR_SHADOW_INDEX))?;
                let s1 = w.decl("s1", Type::Vec4, slot(INTENSITY_FAR_TYPE))?;
                let s2 = w.decl("s2", Type::Vec4, slot(VOLUMETRIC_PCF))?;
                let s3 = w.decl("s3", Type::Vec4, slot(SHADOW_OFFSETS))?;
                let s4 = w.decl("s4", Type::Vec4, slot(VSM))?;
                w.ret(Expr::Construct(
                    Type::named(LIGHT),
                    vec![
                        s0.xyz(),
                        s0.w().cast(Type::Int),
                        s1.xy(),
                        s1.z(),
                        s1.w().cast(Type::UInt),
                        s2.x().cast(Type::UInt),
                        s2.y(),
                        s2.z(),
                        s2.w().cast(Type::UInt),
                        s3.xy(),
                        s3.zw(),
                        s4.x(),
                        s4.y(),
                    ],
                ))
            },
        )?;
        Ok(Light::new(handle.call([offset.into()])))
    }

    /// Decodes the record of `kind` at slot `offset` and returns the call expression.
    pub fn decode(
        &mut self,
        writer: &mut ShaderWriter,
        kind: LightKind,
        offset: impl Into<Expr>,
    ) -> Result<Expr, ShadingError> {
        let base = self.base(writer, Expr::Var("offset".to_owned()))?;
        let name = format!("c3d_{}get{}Light", self.prefix, kind.name());
        let handle = self.functions.get_or_implement(
            writer,
            Some(kind),
            name,
            kind.ty(),
            vec![Param::new("offset", Type::UInt)],
            |w| {
                let base = w.decl("base", Type::named(LIGHT), base.expr())?;
                let fields = match kind {
                    LightKind::Directional | LightKind::TiledDirectional => {
                        let s = w.decl("s", Type::Vec4, slot(DIRECTION_CASCADES))?;
                        let depths = (0..SPLIT_DEPTH_SLOTS).map(|i| slot(SPLIT_DEPTHS + i));
                        let transforms = (0..4).map(|cascade| {
                            matrix(CASCADE_TRANSFORMS + cascade * MATRIX_SLOTS)
                        });
                        vec![
                            base,
                            s.xyz(),
                            s.w().cast(Type::UInt),
                            Expr::Construct(
                                Type::array(Type::Vec4, SPLIT_DEPTH_SLOTS as u32),
                                depths.collect(),
                            ),
                            slot(SPLIT_SCALES),
                            Expr::Construct(Type::array(Type::Mat4, 4), transforms.collect()),
                        ]
                    }
                    LightKind::Point => {
                        vec![base, slot(POSITION).xyz(), slot(ATTENUATION).xyz()]
                    }
                    LightKind::Spot => {
                        let s = w.decl("s", Type::Vec4, slot(SPOT_DIRECTION_EXPONENT))?;
                        let c = w.decl("c", Type::Vec4, slot(SPOT_CUTOFFS))?;
                        vec![
                            base,
                            slot(POSITION).xyz(),
                            slot(ATTENUATION).xyz(),
                            s.xyz(),
                            s.w(),
                            c.x(),
                            c.y(),
                            c.z(),
                            matrix(SPOT_TRANSFORM),
                        ]
                    }
                };
                w.ret(Expr::Construct(kind.ty(), fields))
            },
        )?;
        Ok(handle.call([offset.into()]))
    }

    /// Decodes a directional record (either variant).
    pub fn directional(
        &mut self,
        writer: &mut ShaderWriter,
        kind: LightKind,
        offset: impl Into<Expr>,
    ) -> Result<DirectionalLight, ShadingError> {
        debug_assert!(kind.is_directional());
        Ok(DirectionalLight::new(self.decode(writer, kind, offset)?))
    }

    /// Decodes a point record.
    pub fn point(
        &mut self,
        writer: &mut ShaderWriter,
        offset: impl Into<Expr>,
    ) -> Result<PointLight, ShadingError> {
        Ok(PointLight::new(self.decode(writer, LightKind::Point, offset)?))
    }

    /// Decodes a spot record.
    pub fn spot(
        &mut self,
        writer: &mut ShaderWriter,
        offset: impl Into<Expr>,
    ) -> Result<SpotLight, ShadingError> {
        Ok(SpotLight::new(self.decode(writer, LightKind::Spot, offset)?))
    }
}

/// `c3d_lights[offset + index]`
fn slot(index: usize) -> Expr {
    let offset = Expr::Var("offset".to_owned());
    let position = if index == 0 {
        offset
    } else {
        offset + index as u32
    };
    Expr::Var(LIGHTS_BUFFER.to_owned()).at(position)
}

fn matrix(first: usize) -> Expr {
    Expr::Construct(Type::Mat4, (first..first + MATRIX_SLOTS).map(slot).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::{Interpreter, Value};
    use approx::assert_relative_eq;
    use khora_core::math::{Mat4, Vec2, Vec3};
    use khora_core::renderer::light::{
        Attenuation, DirectionalLight as HostDirectional, LightType, ShadowType,
        SpotLight as HostSpot,
    };

    fn decode_all(buffer: &LightBuffer, kind: LightKind, offset: u32) -> Value {
        let mut writer = ShaderWriter::new();
        let mut records = LightRecords::new("");
        records.decode(&mut writer, kind, 0u32).unwrap();
        let module = writer.finish();
        let mut interpreter = Interpreter::new(&module).unwrap();
        buffer.bind(&mut interpreter);
        let name = format!("c3d_get{}Light", kind.name());
        interpreter
            .call(&name, vec![Value::UInt(offset)])
            .unwrap()
            .result
    }

    #[test]
    fn test_decoders_are_memoized() {
        let mut writer = ShaderWriter::new();
        let mut records = LightRecords::new("fwd_");
        for kind in LightKind::ALL {
            records.decode(&mut writer, kind, 0u32).unwrap();
            records.decode(&mut writer, kind, 25u32).unwrap();
        }
        let module = writer.finish();
        assert_eq!(module.functions.len(), 5);
        assert!(module.function("c3d_fwd_getTiledDirectionalLight").is_some());
        assert!(module.global(LIGHTS_BUFFER).is_some());
    }

    #[test]
    fn test_spot_light_round_trip() {
        let spot = HostSpot {
            position: Vec3::new(1.0, 2.0, 3.0),
            direction: Vec3::new(0.0, 0.0, -1.0),
            attenuation: Attenuation {
                constant: 1.0,
                linear: 0.5,
                quadratic: 0.25,
            },
            exponent: 2.0,
            transform: Mat4::from_translation(Vec3::new(4.0, 5.0, 6.0)),
            ..Default::default()
        };
        let mut writer = LightBufferWriter::new();
        writer.push(LightType::Directional(HostDirectional::default()));
        writer.push(LightType::Spot(spot));
        let buffer = writer.build();
        let offset = buffer.offset(LightKind::Spot, 0).unwrap();

        let value = decode_all(&buffer, LightKind::Spot, offset);
        let field = |name: &str| value.field(name).unwrap();
        assert_eq!(field("position").as_vec3(), Some(spot.position));
        assert_eq!(field("attenuation").as_vec3(), Some(Vec3::new(1.0, 0.5, 0.25)));
        assert_eq!(field("exponent").as_f32(), Some(2.0));
        assert_relative_eq!(field("innerCutOff").as_f32().unwrap(), spot.inner_cutoff());
        assert_relative_eq!(field("outerCutOff").as_f32().unwrap(), spot.outer_cutoff());
        assert_eq!(field("transform"), &Value::from(spot.transform));
        let base = field("base");
        assert_eq!(base.field("shadowMapIndex"), Some(&Value::Int(-1)));
    }

    #[test]
    fn test_directional_light_round_trip() {
        let mut sun = HostDirectional {
            direction: Vec3::new(0.0, -1.0, 0.0),
            cascade_count: 3,
            split_depths: [0.5, 2.0, 8.0, 24.0, 0.0],
            ..Default::default()
        };
        sun.base.intensity = Vec2::new(1.5, 2.5);
        sun.base.shadow.shadow_type = ShadowType::Variance;
        sun.base.shadow.map_index = 2;
        sun.base.shadow.vsm_min_variance = 1e-4;
        sun.transforms[2] = Mat4::from_translation(Vec3::new(0.0, 0.0, -3.0));
        let mut writer = LightBufferWriter::new();
        writer.push(LightType::Directional(sun));
        let buffer = writer.build();

        let value = decode_all(&buffer, LightKind::Directional, 0);
        assert_eq!(value.field("cascadeCount"), Some(&Value::UInt(3)));
        assert_eq!(value.field("direction").and_then(Value::as_vec3), Some(sun.direction));
        let depths = value.field("splitDepths").unwrap();
        assert_eq!(
            depths,
            &Value::Array(vec![
                Value::Vec4([0.5, 2.0, 8.0, 24.0]),
                Value::Vec4([0.0, 0.0, 0.0, 0.0]),
            ])
        );
        let Value::Array(transforms) = value.field("transforms").unwrap() else {
            panic!("transforms is not an array");
        };
        assert_eq!(transforms[2], Value::from(sun.transforms[2]));
        let base = value.field("base").unwrap();
        assert_eq!(base.field("shadowType"), Some(&Value::UInt(3)));
        assert_eq!(base.field("shadowMapIndex"), Some(&Value::Int(2)));
        assert_eq!(base.field("intensity").and_then(Value::as_vec2), Some(sun.base.intensity));
        assert_eq!(base.field("vsmMinVariance").and_then(Value::as_f32), Some(1e-4));
    }

    #[test]
    fn test_shader_offsets_follow_counts() {
        let mut writer = ShaderWriter::new();
        LightRecords::declare(&mut writer);
        writer
            .implement_function(
                "spotOffset",
                Type::UInt,
                vec![Param::new("i", Type::UInt)],
                |w| w.ret(LightRecords::offset(LightKind::Spot, Expr::Var("i".to_owned()))),
            )
            .unwrap();
        let module = writer.finish();
        let mut host = LightBufferWriter::new();
        host.push(LightType::Directional(HostDirectional::default()));
        host.push(LightType::Spot(HostSpot::default()));
        host.push(LightType::Spot(HostSpot::default()));
        let buffer = host.build();
        let mut interpreter = Interpreter::new(&module).unwrap();
        buffer.bind(&mut interpreter);
        let result = interpreter.call("spotOffset", vec![Value::UInt(1)]).unwrap().result;
        assert_eq!(result.as_u32(), buffer.offset(LightKind::Spot, 1));
    }
}
