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

//! How directional cascades are laid out in their shadow maps.

use crate::ast::{clamp, vec2, vec2_splat, Expr, TextureKind, Type};

/// Maps a cascade's shadow-map coordinates to the texture that stores it.
///
/// Directional lights keep one map per cascade. The layout of those maps is
/// a property of the render pipeline, so the shadow functions are generated
/// once per strategy and carry its [`suffix`](Self::suffix) in their names.
pub trait ShadowSamplingStrategy: Sync {
    /// Appended to generated function and texture names.
    fn suffix(&self) -> &'static str;

    /// Kind of the depth and depth-comparison textures.
    fn depth_kind(&self) -> TextureKind;

    /// Kind of the variance (moments) texture.
    fn variance_kind(&self) -> TextureKind;

    /// Texture coordinates and array layer of `uv` in cascade `cascade` out
    /// of `cascade_count`.
    fn coordinates(&self, uv: Expr, cascade: &Expr, cascade_count: &Expr) -> (Expr, Option<Expr>);
}

/// One texture array layer per cascade.
#[derive(Debug, Clone, Copy, Default)]
pub struct CascadeArraySampling;

impl ShadowSamplingStrategy for CascadeArraySampling {
    fn suffix(&self) -> &'static str {
        ""
    }

    fn depth_kind(&self) -> TextureKind {
        TextureKind::Depth2DArray
    }

    fn variance_kind(&self) -> TextureKind {
        TextureKind::D2Array
    }

    fn coordinates(&self, uv: Expr, cascade: &Expr, _: &Expr) -> (Expr, Option<Expr>) {
        (uv, Some(cascade.cast(Type::Int)))
    }
}

/// All cascades side by side in one atlas: cascade `i` of `N` covers
/// `[i / N, (i + 1) / N]` horizontally.
#[derive(Debug, Clone, Copy, Default)]
pub struct TiledAtlasSampling;

impl ShadowSamplingStrategy for TiledAtlasSampling {
    fn suffix(&self) -> &'static str {
        "Tiled"
    }

    fn depth_kind(&self) -> TextureKind {
        TextureKind::Depth2D
    }

    fn variance_kind(&self) -> TextureKind {
        TextureKind::D2
    }

    fn coordinates(&self, uv: Expr, cascade: &Expr, cascade_count: &Expr) -> (Expr, Option<Expr>) {
        // Filter taps must not read the neighbouring tile.
        let uv = clamp(uv, vec2_splat(0.0), vec2_splat(1.0));
        let tile = vec2(cascade.cast(Type::Float), 0.0);
        let tiles = vec2(cascade_count.cast(Type::Float), 1.0);
        ((uv + tile) / tiles, None)
    }
}

static CASCADE_ARRAY: CascadeArraySampling = CascadeArraySampling;
static TILED_ATLAS: TiledAtlasSampling = TiledAtlasSampling;

/// The strategy of a pipeline that tiles its cascades or not.
pub fn sampling_strategy(tiled: bool) -> &'static dyn ShadowSamplingStrategy {
    if tiled {
        &TILED_ATLAS
    } else {
        &CASCADE_ARRAY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{var, Param};
    use crate::eval::{Interpreter, Value};
    use crate::ShaderWriter;
    use khora_core::math::Vec2;

    #[test]
    fn test_tiled_coordinates() {
        let mut writer = ShaderWriter::new();
        writer
            .implement_function(
                "tile",
                Type::Vec2,
                vec![
                    Param::new("uv", Type::Vec2),
                    Param::new("cascade", Type::UInt),
                    Param::new("count", Type::UInt),
                ],
                |w| {
                    let (coords, layer) =
                        TiledAtlasSampling.coordinates(var("uv"), &var("cascade"), &var("count"));
                    assert!(layer.is_none());
                    w.ret(coords)
                },
            )
            .unwrap();
        let module = writer.finish();
        let mut interpreter = Interpreter::new(&module).unwrap();
        let mut tile = |uv: Vec2, cascade: u32| {
            interpreter
                .call("tile", vec![uv.into(), Value::UInt(cascade), Value::UInt(4)])
                .unwrap()
                .result
                .as_vec2()
                .unwrap()
        };
        assert_eq!(tile(Vec2::new(0.5, 0.25), 0), Vec2::new(0.125, 0.25));
        assert_eq!(tile(Vec2::new(0.5, 0.25), 2), Vec2::new(0.625, 0.25));
        assert_eq!(tile(Vec2::new(1.5, -0.5), 3), Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_strategy_selection() {
        assert_eq!(sampling_strategy(false).suffix(), "");
        assert_eq!(sampling_strategy(true).suffix(), "Tiled");
        assert!(sampling_strategy(false).depth_kind().is_arrayed());
        assert!(!sampling_strategy(true).depth_kind().is_arrayed());
    }
}
