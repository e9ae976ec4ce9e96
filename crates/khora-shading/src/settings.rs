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

//! Configuration of the lighting shader generator.

use serde::{Deserialize, Serialize};

use khora_core::renderer::light::DIRECTIONAL_MAX_CASCADES;

use crate::material::MaterialModel;
use crate::ShadingError;

/// Largest supported cascade count.
pub const MAX_CASCADES: u32 = DIRECTIONAL_MAX_CASCADES as u32;

/// Settings selecting which lighting code is generated.
///
/// Settings are usually authored in RON next to the pipeline description;
/// omitted fields take their [`Default`] value.
///
/// # Examples
///
/// ```
/// use khora_shading::{MaterialModel, ShadingSettings};
///
/// let settings = ShadingSettings::from_ron("(material_model: PbrSG, volumetric: true)").unwrap();
/// assert_eq!(settings.material_model, MaterialModel::PbrSG);
/// assert!(settings.volumetric);
/// assert!(settings.shadows);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadingSettings {
    /// The material model the lighting functions are generated for.
    pub material_model: MaterialModel,
    /// Whether shadow maps are sampled.
    pub shadows: bool,
    /// Whether directional lights add volumetric in-scattering.
    pub volumetric: bool,
    /// Whether the generated code runs in an opaque pass. Volumetrics only apply there.
    pub opaque_pass: bool,
    /// Number of directional shadow cascades, at most [`MAX_CASCADES`].
    pub cascade_count: u32,
    /// Whether directional cascades share one tiled atlas instead of a texture array.
    pub tiled_directional: bool,
    /// Resolution of one shadow map, used to size PCF filter taps.
    pub pcf_texture_size: f32,
    /// Bind group of every resource declared by the generated module.
    pub bind_group: u32,
    /// Prefix inserted after `c3d_` in generated function names.
    pub prefix: String,
}

impl Default for ShadingSettings {
    fn default() -> Self {
        Self {
            material_model: MaterialModel::PbrMR,
            shadows: true,
            volumetric: false,
            opaque_pass: true,
            cascade_count: MAX_CASCADES,
            tiled_directional: false,
            pcf_texture_size: 2048.0,
            bind_group: 1,
            prefix: String::new(),
        }
    }
}

impl ShadingSettings {
    /// Parses settings from RON and validates them.
    pub fn from_ron(source: &str) -> Result<Self, ShadingError> {
        let settings: ShadingSettings = ron::from_str(source)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Serializes the settings to pretty RON.
    pub fn to_ron(&self) -> Result<String, ShadingError> {
        let pretty = ron::ser::PrettyConfig::default().indentor("  ".to_string());
        Ok(ron::ser::to_string_pretty(self, pretty)?)
    }

    /// Checks the settings for values the generator cannot honour.
    pub fn validate(&self) -> Result<(), ShadingError> {
        if self.cascade_count > MAX_CASCADES {
            return Err(ShadingError::CascadeCount {
                count: self.cascade_count,
                max: MAX_CASCADES,
            });
        }
        Ok(())
    }

    /// The cascade count, never zero.
    pub fn cascade_count(&self) -> u32 {
        self.cascade_count.clamp(1, MAX_CASCADES)
    }

    /// Builds a generated function name: `c3d_<prefix><name>`.
    pub fn function_name(&self, name: &str) -> String {
        format!("c3d_{}{}", self.prefix, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ron_round_trip() {
        let settings = ShadingSettings {
            material_model: MaterialModel::Phong,
            volumetric: true,
            cascade_count: 3,
            prefix: "fwd_".to_string(),
            ..Default::default()
        };
        let text = settings.to_ron().unwrap();
        let back = ShadingSettings::from_ron(&text).unwrap();
        assert_eq!(back, settings);
    }

    #[test]
    fn test_too_many_cascades_rejected() {
        let err = ShadingSettings::from_ron("(cascade_count: 9)").unwrap_err();
        assert!(matches!(err, ShadingError::CascadeCount { count: 9, .. }));
    }

    #[test]
    fn test_malformed_ron_is_reported() {
        let err = ShadingSettings::from_ron("(shadows: maybe)").unwrap_err();
        assert!(matches!(err, ShadingError::Settings(_)));
    }

    #[test]
    fn test_function_name_uses_prefix() {
        let settings = ShadingSettings {
            prefix: "pbr_".to_string(),
            ..Default::default()
        };
        assert_eq!(settings.function_name("combine"), "c3d_pbr_combine");
    }
}
