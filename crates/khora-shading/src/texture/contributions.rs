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

//! Inline texture contributions to the surface geometry and the material.

use khora_core::renderer::texture::{TextureChannels, TextureUnitConfig};

use super::{TextureConfigData, TextureConfigurations};
use crate::ast::{
    abs, dot, max, min, mix, normalize, texture_sample, vec3, vec3_splat, Expr, GlobalKind,
    TextureKind, Type,
};
use crate::material::{LightMaterial, MaterialModel};
use crate::{ShaderWriter, ShadingError};

/// Sampler shared by every material texture.
pub const MAP_SAMPLER: &str = "c3d_mapSampler";
/// Parallax layers at grazing angles.
const MAX_PARALLAX_LAYERS: f32 = 64.0;
/// Parallax layers when looking along the normal.
const MIN_PARALLAX_LAYERS: f32 = 32.0;
const DIELECTRIC_F0: f32 = 0.04;

/// A texture bound to a pass, with the unit configuration it was packed with.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureUnit {
    /// 1-based index in the texture configuration buffer.
    pub index: u32,
    /// Name of the `texture_2d<f32>` global.
    pub texture: String,
    /// Channels the unit contributes to, fixed when the pipeline is built.
    pub channels: TextureChannels,
}

impl TextureUnit {
    /// Creates a unit.
    pub fn new(index: u32, texture: impl Into<String>, channels: TextureChannels) -> Self {
        Self {
            index,
            texture: texture.into(),
            channels,
        }
    }

    /// Creates a unit routing the channels of `config`.
    pub fn from_config(index: u32, texture: impl Into<String>, config: &TextureUnitConfig) -> Self {
        Self::new(index, texture, config.channels())
    }

    fn sample(&self, uv: &Expr) -> Expr {
        texture_sample(&self.texture, MAP_SAMPLER, uv, None)
    }
}

/// Surface locals rewritten by the geometry contributions.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryInputs {
    /// `vec3` texture coordinates, shifted by parallax mapping.
    pub tex_coords: Expr,
    /// World-space normal, perturbed by normal maps.
    pub normal: Expr,
    /// World-space tangent.
    pub tangent: Expr,
    /// World-space bitangent.
    pub bitangent: Expr,
    /// Unit vector from the fragment towards the eye.
    pub view: Expr,
}

impl TextureConfigurations {
    fn unit_config(
        &mut self,
        w: &mut ShaderWriter,
        unit: &TextureUnit,
        tex_coords: &Expr,
    ) -> Result<(TextureConfigData, Expr), ShadingError> {
        if unit.index == 0 {
            log::warn!(
                "TextureConfigurations: texture '{}' uses the reserved unit index 0",
                unit.texture
            );
            return Err(ShadingError::InvalidTextureUnit(0));
        }
        w.declare_global(&unit.texture, GlobalKind::Texture(TextureKind::D2));
        w.declare_global(MAP_SAMPLER, GlobalKind::Sampler { comparison: false });
        let config = self.get_texture_configuration(w, unit.index)?;
        let config = TextureConfigData::new(w.decl(
            "config",
            TextureConfigData::ty(),
            config.expr(),
        )?);
        let uv = w.decl("uv", Type::Vec2, config.transform_uv(&tex_coords.xy()))?;
        Ok((config, uv))
    }

    /// Applies the height, normal and opacity maps, in that order.
    ///
    /// Height maps shift `tex_coords` by parallax occlusion mapping, so they
    /// run before any other unit is sampled.
    pub fn compute_geometry_map_contributions(
        &mut self,
        w: &mut ShaderWriter,
        units: &[TextureUnit],
        geometry: &GeometryInputs,
        opacity: &Expr,
    ) -> Result<(), ShadingError> {
        for unit in units.iter().filter(|u| u.channels.contains(TextureChannels::HEIGHT)) {
            self.parallax(w, unit, geometry)?;
        }
        let normal_or_opacity = TextureChannels::NORMAL | TextureChannels::OPACITY;
        for unit in units.iter().filter(|u| u.channels.intersects(normal_or_opacity)) {
            let (config, uv) = self.unit_config(w, unit, &geometry.tex_coords)?;
            let sampled = w.decl("sampled", Type::Vec4, unit.sample(&uv))?;
            if unit.channels.contains(TextureChannels::NORMAL) {
                let normal = config.get_normal(
                    &sampled,
                    &geometry.normal,
                    &geometry.tangent,
                    &geometry.bitangent,
                );
                w.assign(&geometry.normal, normal)?;
            }
            if unit.channels.contains(TextureChannels::OPACITY) {
                w.assign(opacity, config.get_opacity(&sampled, opacity))?;
            }
        }
        Ok(())
    }

    /// Parallax occlusion mapping: marches the height field along the
    /// tangent-space view ray and interpolates between the last two layers.
    fn parallax(
        &mut self,
        w: &mut ShaderWriter,
        unit: &TextureUnit,
        g: &GeometryInputs,
    ) -> Result<(), ShadingError> {
        let (config, uv) = self.unit_config(w, unit, &g.tex_coords)?;
        let depth_at = |uv: &Expr| 1.0 - config.get_height(&unit.sample(uv));
        w.if_(config.is_mapped("heightMask"), |w| {
            let view_ts = w.decl(
                "viewTS",
                Type::Vec3,
                normalize(vec3(
                    dot(&g.view, &g.tangent),
                    dot(&g.view, &g.bitangent),
                    dot(&g.view, &g.normal),
                )),
            )?;
            let num_layers = w.decl(
                "numLayers",
                Type::Float,
                mix(
                    MAX_PARALLAX_LAYERS,
                    MIN_PARALLAX_LAYERS,
                    abs(dot(&g.normal, &g.view)),
                ),
            )?;
            let layer_depth = w.decl("layerDepth", Type::Float, 1.0 / &num_layers)?;
            let current_layer_depth = w.decl("currentLayerDepth", Type::Float, 0.0)?;
            let p = w.decl(
                "P",
                Type::Vec2,
                view_ts.xy() / max(view_ts.z(), 1e-4) * config.field("heightFactor"),
            )?;
            let delta = w.decl("deltaTexCoords", Type::Vec2, &p / &num_layers)?;
            let current_uv = w.decl("currentTexCoords", Type::Vec2, &uv)?;
            let current_depth = w.decl("currentDepth", Type::Float, depth_at(&current_uv))?;
            w.for_range("layer", 0u32, MAX_PARALLAX_LAYERS as u32, |w, _| {
                w.if_(current_layer_depth.ge(&current_depth), |w| w.break_())?;
                w.sub_assign(&current_uv, &delta)?;
                w.assign(&current_depth, depth_at(&current_uv))?;
                w.add_assign(&current_layer_depth, &layer_depth)
            })?;
            let prev_uv = w.decl("prevTexCoords", Type::Vec2, &current_uv + &delta)?;
            let after = w.decl("afterDepth", Type::Float, &current_depth - &current_layer_depth)?;
            let before = w.decl(
                "beforeDepth",
                Type::Float,
                depth_at(&prev_uv) - &current_layer_depth + &layer_depth,
            )?;
            let weight = w.decl("weight", Type::Float, &after / min(&after - &before, -1e-5))?;
            let shift = mix(&current_uv, &prev_uv, &weight) - &uv;
            w.assign(
                &g.tex_coords,
                Expr::Construct(Type::Vec3, vec![g.tex_coords.xy() + shift, g.tex_coords.z()]),
            )
        })
    }

    /// Applies every non-geometry channel of `units` to `material`, which must
    /// be an assignable local.
    ///
    /// Channels are applied in a fixed order. The metallic-roughness model
    /// recomputes `f0` from the textured albedo and metalness; the other
    /// models take `f0` from the textured specular colour.
    ///
    /// # Errors
    /// [`ShadingError::InvalidTextureUnit`] for a unit with index 0 and
    /// [`ShadingError::MissingMember`] for a clearcoat or sheen unit on a
    /// Phong material.
    pub fn compute_common_map_contribution(
        &mut self,
        w: &mut ShaderWriter,
        units: &[TextureUnit],
        tex_coords: &Expr,
        material: &LightMaterial,
    ) -> Result<(), ShadingError> {
        let mut touched = TextureChannels::EMPTY;
        for unit in units {
            let mut channels = unit.channels;
            channels.remove(TextureChannels::GEOMETRY);
            if channels.is_empty() {
                continue;
            }
            let (config, uv) = self.unit_config(w, unit, tex_coords)?;
            let sampled = w.decl("sampled", Type::Vec4, unit.sample(&uv))?;
            let s = &sampled;

            if channels.contains(TextureChannels::COLOUR) {
                let albedo = material.albedo();
                w.assign(&albedo, config.get_albedo(s, &albedo))?;
            }
            if channels.contains(TextureChannels::SPECULAR) {
                let specular = material.specular();
                w.assign(&specular, config.get_specular(s, &specular))?;
            }
            if channels.contains(TextureChannels::GLOSSINESS) {
                let roughness = material.roughness();
                let glossiness = config.get_glossiness(s, &(1.0 - &roughness));
                w.assign(&roughness, 1.0 - glossiness)?;
            }
            if channels.contains(TextureChannels::ROUGHNESS) {
                let roughness = material.roughness();
                w.assign(&roughness, config.get_roughness(s, &roughness))?;
            }
            if channels.contains(TextureChannels::METALNESS) {
                let metalness = material.metalness();
                w.assign(&metalness, config.get_metalness(s, &metalness))?;
            }
            if channels.contains(TextureChannels::EMISSIVE) {
                let emissive = material.emissive();
                w.assign(&emissive, config.get_emissive(s, &emissive))?;
            }
            if channels.contains(TextureChannels::OCCLUSION) {
                let occlusion = material.occlusion();
                w.assign(&occlusion, config.get_occlusion(s, &occlusion))?;
            }
            if channels.contains(TextureChannels::TRANSMITTANCE) {
                let transmission = material.transmission();
                w.assign(&transmission, config.get_transmittance(s, &transmission))?;
            }
            if channels.contains(TextureChannels::CLEARCOAT) {
                let clearcoat = material.clearcoat_factor()?;
                w.assign(&clearcoat, config.get_clearcoat(s, &clearcoat))?;
            }
            if channels.contains(TextureChannels::SHEEN) {
                let sheen = material.sheen_factor()?;
                w.assign(&sheen, config.get_sheen(s, &sheen))?;
            }
            touched |= channels;
        }

        match material.model() {
            MaterialModel::PbrMR => {
                if touched.intersects(TextureChannels::COLOUR | TextureChannels::METALNESS) {
                    w.assign(
                        &material.f0(),
                        mix(vec3_splat(DIELECTRIC_F0), material.albedo(), material.metalness()),
                    )?;
                }
            }
            MaterialModel::PbrSG | MaterialModel::Phong => {
                if touched.contains(TextureChannels::SPECULAR) {
                    w.assign(&material.f0(), material.specular())?;
                }
            }
        }
        Ok(())
    }
}
