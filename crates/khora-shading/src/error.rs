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

//! Errors raised while building shader modules.

use thiserror::Error;

/// An error raised at shader construction time.
///
/// These are programming errors in the lighting configuration (a member the
/// material model lacks, a function defined twice) rather than conditions the
/// generated shader could recover from.
#[derive(Debug, Error)]
pub enum ShadingError {
    /// The material model has no such member (e.g. clearcoat on Phong).
    #[error("material model '{model}' has no member '{member}'")]
    MissingMember {
        /// Name of the material model.
        model: &'static str,
        /// The requested member.
        member: &'static str,
    },
    /// A function with this name was already implemented.
    #[error("function '{0}' is already implemented")]
    DuplicateFunction(String),
    /// A statement was recorded outside of any function body.
    #[error("no function is being implemented")]
    NoActiveFunction,
    /// A call references a function that does not exist.
    #[error("unknown function '{0}'")]
    UnknownFunction(String),
    /// A type references a struct that was never declared.
    #[error("unknown struct '{0}'")]
    UnknownStruct(String),
    /// The assignment target is not a writable location.
    #[error("expression cannot be assigned to: {0}")]
    InvalidLValue(String),
    /// Texture unit index 0 is reserved for "no texture".
    #[error("invalid texture unit index {0}")]
    InvalidTextureUnit(u32),
    /// A directional light was configured with too many cascades.
    #[error("cascade count {count} exceeds the maximum of {max}")]
    CascadeCount {
        /// Requested count.
        count: u32,
        /// Supported maximum.
        max: u32,
    },
    /// The shading settings could not be parsed.
    #[error("invalid shading settings: {0}")]
    Settings(#[from] ron::error::SpannedError),
    /// The shading settings could not be serialized.
    #[error("could not serialize shading settings: {0}")]
    SettingsSerialize(#[from] ron::Error),
}
