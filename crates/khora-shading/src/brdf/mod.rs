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

//! Bidirectional reflectance distribution functions.
//!
//! [`BrdfHelpers`] holds the shared microfacet terms. The composite BRDFs
//! ([`CookTorranceBrdf`], [`SheenBrdf`], [`BlinnPhongBrdf`]) each write one
//! memoized function that evaluates the response of a single light sample.

mod cook_torrance;
mod helpers;
mod phong;
mod sheen;

pub use cook_torrance::CookTorranceBrdf;
pub use helpers::{BrdfHelpers, F90_SCALE, MIN_ALPHA, MIN_SIN2_THETA_H};
pub use phong::BlinnPhongBrdf;
pub use sheen::{
    sheen_albedo_scaling, SheenBrdf, SheenVisibility, SHEEN_ALBEDO_SCALING, SHEEN_LUT_SIZE,
};
