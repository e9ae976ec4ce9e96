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

//! Shadow map sampling.
//!
//! [`ShadowModel`] writes one shadow function per light kind. Each returns
//! the lit fraction of the fragment in `[0, 1]`, filtered as the light's
//! `shadowType` requests: a single depth test, Poisson-disk PCF over the
//! comparison map, or the Chebyshev bound of a variance shadow map.
//! Directional functions are generated once per [`ShadowSamplingStrategy`].
//!
//! Depth maps hold `[0, 1]` depth from the light's view-projection; point
//! light cube maps hold `distance / farPlane`.

pub mod cascades;
mod strategy;

pub use strategy::{
    sampling_strategy, CascadeArraySampling, ShadowSamplingStrategy, TiledAtlasSampling,
};

use std::f32::consts::PI;

use khora_core::renderer::light::ShadowType;

use crate::ast::{
    clamp, cos, dot, fract, length, max, normalize, pow, sin, sqrt, step, texture_compare,
    texture_sample, var, vec2, vec3, vec4_from, Expr, GlobalKind, Param, TextureKind, Type,
};
use crate::lights::{Light, LIGHT};
use crate::surface::LightSurface;
use crate::writer::FunctionCache;
use crate::{FunctionHandle, ShaderWriter, ShadingError};

/// Non-comparison sampler of every shadow map.
pub const SHADOW_SAMPLER: &str = "c3d_shadowSampler";
/// `less_equal` comparison sampler of the depth comparison maps.
pub const SHADOW_CMP_SAMPLER: &str = "c3d_shadowCmpSampler";
/// Largest PCF tap count.
pub const MAX_PCF_SAMPLES: u32 = 16;

const POISSON_SAMPLES: &str = "c3d_poissonSamples";
const VOLUMETRIC_DITHER: &str = "c3d_volumetricDither";

#[rustfmt::skip]
const POISSON_DISK: [[f32; 2]; MAX_PCF_SAMPLES as usize] = [
    [-0.942_016_24, -0.399_062_16], [0.945_586_09, -0.768_907_25],
    [-0.094_184_101, -0.929_388_7], [0.344_959_38, 0.293_877_6],
    [-0.915_885_81, 0.457_714_32], [-0.815_442_32, -0.879_124_64],
    [-0.382_775_43, 0.276_768_45], [0.974_843_98, 0.756_483_79],
    [0.443_233_25, -0.975_115_54], [0.537_429_81, -0.473_734_2],
    [-0.264_969_11, -0.418_930_23], [0.791_975_14, 0.190_901_88],
    [-0.241_888_4, 0.997_065_07], [-0.814_099_55, 0.914_375_9],
    [0.199_841_26, 0.786_413_67], [0.143_831_61, -0.141_007_9],
];

/// 4x4 ordered dither, offsets the first volumetric sample per pixel.
#[rustfmt::skip]
const DITHER: [[f32; 4]; 4] = [
    [0.0, 8.0, 2.0, 10.0],
    [12.0, 4.0, 14.0, 6.0],
    [3.0, 11.0, 1.0, 9.0],
    [15.0, 7.0, 13.0, 5.0],
];

/// Half-extent of the cube PCF kernel, in taps.
const CUBE_PCF_RADIUS: u32 = 1;

/// The textures a light kind samples its shadows from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShadowMap {
    /// Depth read through [`SHADOW_SAMPLER`] by raw filtering.
    Depth,
    /// The same depth read through [`SHADOW_CMP_SAMPLER`] by PCF.
    DepthCmp,
    /// Depth moments of variance shadow maps.
    Variance,
}

impl ShadowMap {
    /// Texture name for lights of `light` kind (`Directional`, `Spot`,
    /// `Point`) and a strategy suffix.
    pub fn name(self, light: &str, suffix: &str) -> String {
        let map = match self {
            ShadowMap::Depth => "NormalDepth",
            ShadowMap::DepthCmp => "DepthCmp",
            ShadowMap::Variance => "Variance",
        };
        format!("c3d_map{map}{light}{suffix}")
    }
}

fn declare_maps(
    w: &mut ShaderWriter,
    light: &str,
    suffix: &str,
    depth: TextureKind,
    variance: TextureKind,
) -> [String; 3] {
    w.declare_global(SHADOW_SAMPLER, GlobalKind::Sampler { comparison: false });
    w.declare_global(SHADOW_CMP_SAMPLER, GlobalKind::Sampler { comparison: true });
    let names = [
        ShadowMap::Depth.name(light, suffix),
        ShadowMap::DepthCmp.name(light, suffix),
        ShadowMap::Variance.name(light, suffix),
    ];
    w.declare_global(&names[0], GlobalKind::Texture(depth));
    w.declare_global(&names[1], GlobalKind::Texture(depth));
    w.declare_global(&names[2], GlobalKind::Texture(variance));
    names
}

fn private_table(w: &mut ShaderWriter, name: &str, ty: Type, values: Vec<Expr>) -> Expr {
    w.declare_global(
        name,
        GlobalKind::Private {
            ty: ty.clone(),
            init: Some(Expr::Construct(ty, values)),
        },
    )
}

/// Writes the shadow functions of a lighting model.
#[derive(Debug)]
pub struct ShadowModel {
    prefix: String,
    texel_size: f32,
    functions: FunctionCache<String>,
}

impl ShadowModel {
    /// Creates the model for shadow maps of `pcf_texture_size` texels a side.
    pub fn new(prefix: &str, pcf_texture_size: f32) -> Self {
        Self {
            prefix: prefix.to_owned(),
            texel_size: 1.0 / pcf_texture_size.max(1.0),
            functions: FunctionCache::new(),
        }
    }

    fn implement<F>(
        &mut self,
        w: &mut ShaderWriter,
        name: String,
        ret: Type,
        params: Vec<Param>,
        body: F,
    ) -> Result<FunctionHandle, ShadingError>
    where
        F: FnOnce(&mut ShaderWriter) -> Result<(), ShadingError>,
    {
        let full = format!("c3d_{}{}", self.prefix, name);
        self.functions.get_or_implement(w, name, full, ret, params, body)
    }

    /// `getLightSpacePosition(lightMatrix, worldPosition)`: shadow map
    /// coordinates in `xy`, depth in `z`.
    pub fn get_light_space_position(
        &mut self,
        w: &mut ShaderWriter,
        light_matrix: impl Into<Expr>,
        world_position: impl Into<Expr>,
    ) -> Result<Expr, ShadingError> {
        let handle = self.light_space_position_fn(w)?;
        Ok(handle.call([light_matrix.into(), world_position.into()]))
    }

    fn light_space_position_fn(
        &mut self,
        w: &mut ShaderWriter,
    ) -> Result<FunctionHandle, ShadingError> {
        self.implement(
            w,
            "getLightSpacePosition".to_owned(),
            Type::Vec3,
            vec![
                Param::new("lightMatrix", Type::Mat4),
                Param::new("worldPosition", Type::Vec3),
            ],
            |w| {
                let clip = w.decl(
                    "lightSpacePosition",
                    Type::Vec4,
                    var("lightMatrix") * vec4_from(var("worldPosition"), 1.0),
                )?;
                let ndc = w.decl("ndc", Type::Vec3, clip.xyz() / clip.w())?;
                w.ret(vec3(
                    ndc.x() * 0.5 + 0.5,
                    ndc.y() * -0.5 + 0.5,
                    ndc.z(),
                ))
            },
        )
    }

    /// `getShadowOffset(normal, lightDirection, minOffset, maxSlopeOffset)`:
    /// depth bias growing with the sine of the incidence angle.
    pub fn get_shadow_offset(
        &mut self,
        w: &mut ShaderWriter,
        normal: impl Into<Expr>,
        light_direction: impl Into<Expr>,
        offsets: &Expr,
    ) -> Result<Expr, ShadingError> {
        let handle = self.shadow_offset_fn(w)?;
        Ok(handle.call([normal.into(), light_direction.into(), offsets.x(), offsets.y()]))
    }

    fn shadow_offset_fn(&mut self, w: &mut ShaderWriter) -> Result<FunctionHandle, ShadingError> {
        self.implement(
            w,
            "getShadowOffset".to_owned(),
            Type::Float,
            vec![
                Param::new("normal", Type::Vec3),
                Param::new("lightDirection", Type::Vec3),
                Param::new("minOffset", Type::Float),
                Param::new("maxSlopeOffset", Type::Float),
            ],
            |w| {
                let cos_alpha = w.decl(
                    "cosAlpha",
                    Type::Float,
                    clamp(dot(var("normal"), var("lightDirection")), 0.0, 1.0),
                )?;
                let slope = w.decl("slope", Type::Float, sqrt(1.0 - &cos_alpha * &cos_alpha))?;
                w.ret(var("minOffset") + var("maxSlopeOffset") * slope)
            },
        )
    }

    /// `chebyshevUpperBound(moments, depth, minVariance, lightBleedingReduction)`.
    pub fn chebyshev_upper_bound(
        &mut self,
        w: &mut ShaderWriter,
        moments: impl Into<Expr>,
        depth: impl Into<Expr>,
        light: &Light,
    ) -> Result<Expr, ShadingError> {
        let handle = self.chebyshev_fn(w)?;
        Ok(handle.call([
            moments.into(),
            depth.into(),
            light.vsm_min_variance(),
            light.vsm_light_bleeding_reduction(),
        ]))
    }

    fn chebyshev_fn(&mut self, w: &mut ShaderWriter) -> Result<FunctionHandle, ShadingError> {
        self.implement(
            w,
            "chebyshevUpperBound".to_owned(),
            Type::Float,
            vec![
                Param::new("moments", Type::Vec2),
                Param::new("depth", Type::Float),
                Param::new("minVariance", Type::Float),
                Param::new("lightBleedingReduction", Type::Float),
            ],
            |w| {
                let moments = var("moments");
                let depth = var("depth");
                let reduction = var("lightBleedingReduction");
                let variance = w.decl(
                    "variance",
                    Type::Float,
                    max(moments.y() - moments.x() * moments.x(), var("minVariance")),
                )?;
                let d = w.decl("d", Type::Float, &depth - moments.x())?;
                let p_max = w.decl("pMax", Type::Float, &variance / (&variance + &d * &d))?;
                w.assign(
                    &p_max,
                    clamp((&p_max - &reduction) / (1.0 - &reduction), 0.0, 1.0),
                )?;
                w.if_(depth.le(moments.x()), |w| w.ret(1.0))?;
                w.ret(p_max)
            },
        )
    }

    /// `filterPCF`: Poisson-disk PCF over a 2D comparison map laid out by
    /// `strategy`, the kernel rotated per texel.
    fn filter_pcf_fn(
        &mut self,
        w: &mut ShaderWriter,
        strategy: &dyn ShadowSamplingStrategy,
        light: &str,
        texture: String,
    ) -> Result<FunctionHandle, ShadingError> {
        let disk = POISSON_DISK.iter().map(|&[x, y]| vec2(x, y)).collect();
        let ty = Type::array(Type::Vec2, MAX_PCF_SAMPLES);
        let disk = private_table(w, POISSON_SAMPLES, ty, disk);
        let texel = self.texel_size;
        self.implement(
            w,
            format!("filterPCF{light}{}", strategy.suffix()),
            Type::Float,
            vec![
                Param::new("lightSpacePosition", Type::Vec3),
                Param::new("index", Type::UInt),
                Param::new("count", Type::UInt),
                Param::new("depthBias", Type::Float),
                Param::new("sampleCount", Type::UInt),
                Param::new("filterSize", Type::Float),
            ],
            move |w| {
                let position = var("lightSpacePosition");
                let sample_scale = w.decl("sampleScale", Type::Float, var("filterSize") * texel)?;
                let screen = w.decl("screenPos", Type::Vec2, position.xy() / texel)?;
                // Interleaved gradient noise.
                let theta = w.decl(
                    "theta",
                    Type::Float,
                    fract(52.982_918 * fract(dot(&screen, vec2(0.067_110_56, 0.005_837_15))))
                        * (2.0 * PI),
                )?;
                let c = w.decl("c", Type::Float, cos(&theta))?;
                let s = w.decl("s", Type::Float, sin(&theta))?;
                let taps = w.decl(
                    "taps",
                    Type::UInt,
                    clamp(var("sampleCount"), 1u32, MAX_PCF_SAMPLES),
                )?;
                let depth_ref = w.decl("depthRef", Type::Float, position.z() - var("depthBias"))?;
                let factor = w.decl("shadowFactor", Type::Float, 0.0)?;
                w.for_range("i", 0u32, &taps, |w, i| {
                    let p = w.decl("poisson", Type::Vec2, disk.at(i))?;
                    let rotated = vec2(&c * p.x() - &s * p.y(), &s * p.x() + &c * p.y());
                    let offset = rotated * &sample_scale;
                    let (coords, layer) =
                        strategy.coordinates(position.xy() + offset, &var("index"), &var("count"));
                    w.add_assign(
                        &factor,
                        texture_compare(&texture, SHADOW_CMP_SAMPLER, coords, layer, &depth_ref),
                    )
                })?;
                w.ret(factor / taps.cast(Type::Float))
            },
        )
    }

    /// `filterPCFPoint`: box PCF around the cube map direction.
    fn filter_pcf_cube_fn(
        &mut self,
        w: &mut ShaderWriter,
        texture: String,
    ) -> Result<FunctionHandle, ShadingError> {
        let texel = self.texel_size;
        self.implement(
            w,
            "filterPCFPoint".to_owned(),
            Type::Float,
            vec![
                Param::new("lightToVertex", Type::Vec3),
                Param::new("layer", Type::Int),
                Param::new("depthRef", Type::Float),
                Param::new("filterSize", Type::Float),
            ],
            move |w| {
                let taps = 2 * CUBE_PCF_RADIUS + 1;
                let direction = w.decl("direction", Type::Vec3, normalize(var("lightToVertex")))?;
                // A cube face spans two units at unit distance.
                let spacing = w.decl("spacing", Type::Float, var("filterSize") * (2.0 * texel))?;
                let factor = w.decl("shadowFactor", Type::Float, 0.0)?;
                w.for_range("x", 0u32, taps, |w, x| {
                    w.for_range("y", 0u32, taps, |w, y| {
                        w.for_range("z", 0u32, taps, |w, z| {
                            let cell = vec3(
                                x.cast(Type::Float),
                                y.cast(Type::Float),
                                z.cast(Type::Float),
                            ) - CUBE_PCF_RADIUS as f32;
                            w.add_assign(
                                &factor,
                                texture_compare(
                                    &texture,
                                    SHADOW_CMP_SAMPLER,
                                    &direction + cell * &spacing,
                                    Some(var("layer")),
                                    var("depthRef"),
                                ),
                            )
                        })
                    })
                })?;
                w.ret(factor / (taps * taps * taps) as f32)
            },
        )
    }

    fn directional_fn(
        &mut self,
        w: &mut ShaderWriter,
        strategy: &dyn ShadowSamplingStrategy,
    ) -> Result<FunctionHandle, ShadingError> {
        let [depth_map, cmp_map, variance_map] = declare_maps(
            w,
            "Directional",
            strategy.suffix(),
            strategy.depth_kind(),
            strategy.variance_kind(),
        );
        let light_space = self.light_space_position_fn(w)?;
        let offset = self.shadow_offset_fn(w)?;
        let chebyshev = self.chebyshev_fn(w)?;
        let pcf = self.filter_pcf_fn(w, strategy, "Directional", cmp_map)?;
        self.implement(
            w,
            format!("computeDirectionalShadow{}", strategy.suffix()),
            Type::Float,
            vec![
                Param::new("light", Type::named(LIGHT)),
                Param::new("vertexToLight", Type::Vec3),
                Param::new("normal", Type::Vec3),
                Param::new("worldPosition", Type::Vec3),
                Param::new("lightMatrix", Type::Mat4),
                Param::new("cascadeIndex", Type::UInt),
                Param::new("cascadeCount", Type::UInt),
            ],
            |w| {
                let light = Light::new(var("light"));
                let (cascade, count) = (var("cascadeIndex"), var("cascadeCount"));
                let l = w.decl("lightDirection", Type::Vec3, normalize(var("vertexToLight")))?;
                let position = w.decl(
                    "lightSpacePosition",
                    Type::Vec3,
                    light_space.call([var("lightMatrix"), var("worldPosition")]),
                )?;
                let (coords, layer) = strategy.coordinates(position.xy(), &cascade, &count);
                let result = w.decl("result", Type::Float, 1.0)?;
                w.if_else(
                    light.shadow_type().equals(ShadowType::Variance.as_u32()),
                    |w| {
                        let sample = texture_sample(
                            &variance_map,
                            SHADOW_SAMPLER,
                            coords.clone(),
                            layer.clone(),
                        );
                        let moments = w.decl("moments", Type::Vec2, sample.xy())?;
                        w.assign(
                            &result,
                            chebyshev.call([
                                moments,
                                position.z(),
                                light.vsm_min_variance(),
                                light.vsm_light_bleeding_reduction(),
                            ]),
                        )
                    },
                    |w| {
                        w.if_else(
                            light.shadow_type().equals(ShadowType::Pcf.as_u32()),
                            |w| {
                                let offsets = light.pcf_shadow_offsets();
                                let bias = offset.call([
                                    var("normal"),
                                    l.clone(),
                                    offsets.x(),
                                    offsets.y(),
                                ]);
                                let bias = w.decl("depthBias", Type::Float, bias)?;
                                w.assign(
                                    &result,
                                    pcf.call([
                                        position.clone(),
                                        cascade.clone(),
                                        count.clone(),
                                        bias,
                                        light.pcf_sample_count(),
                                        light.pcf_filter_size(),
                                    ]),
                                )
                            },
                            |w| {
                                let offsets = light.raw_shadow_offsets();
                                let bias = offset.call([
                                    var("normal"),
                                    l.clone(),
                                    offsets.x(),
                                    offsets.y(),
                                ]);
                                let bias = w.decl("depthBias", Type::Float, bias)?;
                                let stored = texture_sample(
                                    &depth_map,
                                    SHADOW_SAMPLER,
                                    coords.clone(),
                                    layer.clone(),
                                );
                                let stored = w.decl("shadowMapDepth", Type::Float, stored)?;
                                w.assign(&result, step(position.z() - bias, stored))
                            },
                        )
                    },
                )?;
                w.ret(result)
            },
        )
    }

    /// `computeDirectionalShadow`: lit fraction of `surface` in cascade
    /// `cascade_index`, whose view-projection is `light_matrix`.
    #[allow(clippy::too_many_arguments)]
    pub fn compute_directional(
        &mut self,
        w: &mut ShaderWriter,
        strategy: &dyn ShadowSamplingStrategy,
        light: &Light,
        surface: &LightSurface,
        light_matrix: &Expr,
        cascade_index: &Expr,
        cascade_count: &Expr,
    ) -> Result<Expr, ShadingError> {
        let handle = self.directional_fn(w, strategy)?;
        Ok(handle.call([
            light.expr().clone(),
            surface.vertex_to_light.clone(),
            surface.n.clone(),
            surface.world_position.clone(),
            light_matrix.clone(),
            cascade_index.clone(),
            cascade_count.clone(),
        ]))
    }

    /// `computeSpotShadow`: lit fraction of `surface` in the layer
    /// `shadowMapIndex` of the spot maps.
    pub fn compute_spot(
        &mut self,
        w: &mut ShaderWriter,
        light: &Light,
        surface: &LightSurface,
        light_matrix: &Expr,
    ) -> Result<Expr, ShadingError> {
        let strategy = &CascadeArraySampling;
        let [depth_map, cmp_map, variance_map] = declare_maps(
            w,
            "Spot",
            "",
            TextureKind::Depth2DArray,
            TextureKind::D2Array,
        );
        let light_space = self.light_space_position_fn(w)?;
        let offset = self.shadow_offset_fn(w)?;
        let chebyshev = self.chebyshev_fn(w)?;
        let pcf = self.filter_pcf_fn(w, strategy, "Spot", cmp_map)?;
        let handle = self.implement(
            w,
            "computeSpotShadow".to_owned(),
            Type::Float,
            vec![
                Param::new("light", Type::named(LIGHT)),
                Param::new("vertexToLight", Type::Vec3),
                Param::new("normal", Type::Vec3),
                Param::new("worldPosition", Type::Vec3),
                Param::new("lightMatrix", Type::Mat4),
            ],
            |w| {
                let light = Light::new(var("light"));
                let l = w.decl("lightDirection", Type::Vec3, normalize(var("vertexToLight")))?;
                let position = w.decl(
                    "lightSpacePosition",
                    Type::Vec3,
                    light_space.call([var("lightMatrix"), var("worldPosition")]),
                )?;
                let index = w.decl("index", Type::UInt, light.shadow_map_index().cast(Type::UInt))?;
                let layer = Some(light.shadow_map_index());
                let shadow_type = w.decl("shadowType", Type::UInt, light.shadow_type())?;
                w.if_(shadow_type.equals(ShadowType::Variance.as_u32()), |w| {
                    let moments =
                        texture_sample(&variance_map, SHADOW_SAMPLER, position.xy(), layer.clone())
                            .xy();
                    w.ret(chebyshev.call([
                        moments,
                        position.z(),
                        light.vsm_min_variance(),
                        light.vsm_light_bleeding_reduction(),
                    ]))
                })?;
                w.if_(shadow_type.equals(ShadowType::Pcf.as_u32()), |w| {
                    let offsets = light.pcf_shadow_offsets();
                    let bias = w.decl(
                        "depthBias",
                        Type::Float,
                        offset.call([var("normal"), l.clone(), offsets.x(), offsets.y()]),
                    )?;
                    w.ret(pcf.call([
                        position.clone(),
                        index.clone(),
                        Expr::from(1u32),
                        bias,
                        light.pcf_sample_count(),
                        light.pcf_filter_size(),
                    ]))
                })?;
                let offsets = light.raw_shadow_offsets();
                let bias = w.decl(
                    "depthBias",
                    Type::Float,
                    offset.call([var("normal"), l.clone(), offsets.x(), offsets.y()]),
                )?;
                let stored = w.decl(
                    "shadowMapDepth",
                    Type::Float,
                    texture_sample(&depth_map, SHADOW_SAMPLER, position.xy(), layer.clone()),
                )?;
                w.ret(step(position.z() - bias, stored))
            },
        )?;
        Ok(handle.call([
            light.expr().clone(),
            surface.vertex_to_light.clone(),
            surface.n.clone(),
            surface.world_position.clone(),
            light_matrix.clone(),
        ]))
    }

    /// `computePointShadow`: lit fraction of `surface` in the cube layer
    /// `shadowMapIndex` of the point maps.
    pub fn compute_point(
        &mut self,
        w: &mut ShaderWriter,
        light: &Light,
        surface: &LightSurface,
    ) -> Result<Expr, ShadingError> {
        let [depth_map, cmp_map, variance_map] = declare_maps(
            w,
            "Point",
            "",
            TextureKind::DepthCubeArray,
            TextureKind::CubeArray,
        );
        let offset = self.shadow_offset_fn(w)?;
        let chebyshev = self.chebyshev_fn(w)?;
        let pcf = self.filter_pcf_cube_fn(w, cmp_map)?;
        let handle = self.implement(
            w,
            "computePointShadow".to_owned(),
            Type::Float,
            vec![
                Param::new("light", Type::named(LIGHT)),
                Param::new("vertexToLight", Type::Vec3),
                Param::new("normal", Type::Vec3),
            ],
            |w| {
                let light = Light::new(var("light"));
                let light_to_vertex = w.decl("lightToVertex", Type::Vec3, -var("vertexToLight"))?;
                let l = w.decl("lightDirection", Type::Vec3, normalize(var("vertexToLight")))?;
                let depth = w.decl(
                    "depth",
                    Type::Float,
                    length(&light_to_vertex) / light.far_plane(),
                )?;
                let layer = light.shadow_map_index();
                let shadow_type = w.decl("shadowType", Type::UInt, light.shadow_type())?;
                w.if_(shadow_type.equals(ShadowType::Variance.as_u32()), |w| {
                    let moments = texture_sample(
                        &variance_map,
                        SHADOW_SAMPLER,
                        &light_to_vertex,
                        Some(layer.clone()),
                    )
                    .xy();
                    w.ret(chebyshev.call([
                        moments,
                        depth.clone(),
                        light.vsm_min_variance(),
                        light.vsm_light_bleeding_reduction(),
                    ]))
                })?;
                w.if_(shadow_type.equals(ShadowType::Pcf.as_u32()), |w| {
                    let offsets = light.pcf_shadow_offsets();
                    let bias = offset.call([var("normal"), l.clone(), offsets.x(), offsets.y()]);
                    w.ret(pcf.call([
                        light_to_vertex.clone(),
                        layer.clone(),
                        &depth - bias,
                        light.pcf_filter_size(),
                    ]))
                })?;
                let offsets = light.raw_shadow_offsets();
                let bias = w.decl(
                    "depthBias",
                    Type::Float,
                    offset.call([var("normal"), l.clone(), offsets.x(), offsets.y()]),
                )?;
                let layer = Some(layer.clone());
                let stored = texture_sample(&depth_map, SHADOW_SAMPLER, &light_to_vertex, layer);
                let stored = w.decl("shadowMapDepth", Type::Float, stored)?;
                w.ret(step(&depth - bias, stored))
            },
        )?;
        Ok(handle.call([
            light.expr().clone(),
            surface.vertex_to_light.clone(),
            surface.n.clone(),
        ]))
    }

    /// `computeVolumetric`: in-scattered fraction along the view ray.
    ///
    /// The ray from the eye to the fragment is marched in
    /// `volumetricSteps` steps; every lit step adds the Henyey-Greenstein
    /// phase of `volumetricScattering`.
    #[allow(clippy::too_many_arguments)]
    pub fn compute_volumetric(
        &mut self,
        w: &mut ShaderWriter,
        strategy: &dyn ShadowSamplingStrategy,
        light: &Light,
        surface: &LightSurface,
        light_matrix: &Expr,
        cascade_index: &Expr,
        cascade_count: &Expr,
    ) -> Result<Expr, ShadingError> {
        let rows = DITHER
            .iter()
            .map(|row| {
                let values = row.iter().map(|&v| Expr::from(v / 16.0)).collect();
                Expr::Construct(Type::Vec4, values)
            })
            .collect();
        let dither = private_table(w, VOLUMETRIC_DITHER, Type::array(Type::Vec4, 4), rows);
        let directional = self.directional_fn(w, strategy)?;
        let handle = self.implement(
            w,
            format!("computeVolumetric{}", strategy.suffix()),
            Type::Float,
            vec![
                Param::new("light", Type::named(LIGHT)),
                Param::new("vertexToLight", Type::Vec3),
                Param::new("normal", Type::Vec3),
                Param::new("eye", Type::Vec3),
                Param::new("worldPosition", Type::Vec3),
                Param::new("clipPosition", Type::Vec2),
                Param::new("lightMatrix", Type::Mat4),
                Param::new("cascadeIndex", Type::UInt),
                Param::new("cascadeCount", Type::UInt),
            ],
            move |w| {
                let light = Light::new(var("light"));
                let eye = var("eye");
                let ray = w.decl("rayVector", Type::Vec3, var("worldPosition") - &eye)?;
                let ray_length = w.decl("rayLength", Type::Float, length(&ray))?;
                let direction = w.decl("rayDirection", Type::Vec3, &ray / max(&ray_length, 1e-4))?;
                let steps = w.decl(
                    "steps",
                    Type::Float,
                    max(light.volumetric_steps().cast(Type::Float), 1.0),
                )?;
                let step_length = w.decl("stepLength", Type::Float, &ray_length / &steps)?;
                let clip = var("clipPosition");
                let dither_value = w.decl(
                    "ditherValue",
                    Type::Float,
                    dither
                        .at(clip.x().cast(Type::UInt) % 4u32)
                        .at(clip.y().cast(Type::UInt) % 4u32),
                )?;
                let g = w.decl("g", Type::Float, light.volumetric_scattering())?;
                let cos_theta = w.decl(
                    "cosTheta",
                    Type::Float,
                    dot(&direction, normalize(var("vertexToLight"))),
                )?;
                let denominator = max(1.0 + &g * &g - 2.0 * &g * &cos_theta, 1e-4);
                let phase = w.decl(
                    "phase",
                    Type::Float,
                    (1.0 - &g * &g) / (4.0 * PI * pow(denominator, 1.5)),
                )?;
                let t = w.decl("t", Type::Float, &step_length * &dither_value)?;
                let volumetric = w.decl("volumetric", Type::Float, 0.0)?;
                w.for_range("i", 0u32, light.volumetric_steps(), |w, _| {
                    let sample = w.decl("samplePosition", Type::Vec3, &eye + &direction * &t)?;
                    let lit = directional.call([
                        var("light"),
                        var("vertexToLight"),
                        var("normal"),
                        sample,
                        var("lightMatrix"),
                        var("cascadeIndex"),
                        var("cascadeCount"),
                    ]);
                    w.if_(lit.gt(0.5), |w| w.add_assign(&volumetric, &phase))?;
                    w.add_assign(&t, &step_length)
                })?;
                w.ret(&volumetric / &steps)
            },
        )?;
        Ok(handle.call([
            light.expr().clone(),
            surface.vertex_to_light.clone(),
            surface.n.clone(),
            surface.eye_position.clone(),
            surface.world_position.clone(),
            surface.clip_position.clone(),
            light_matrix.clone(),
            cascade_index.clone(),
            cascade_count.clone(),
        ]))
    }
}
