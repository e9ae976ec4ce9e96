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

//! Texture fetches for the CPU evaluator.

/// Supplies texel values to the evaluator.
///
/// Closures of the shape `Fn(&str, &[f32], Option<i32>, f32) -> [f32; 4]`
/// implement this trait, which is convenient in tests:
///
/// ```
/// use khora_shading::eval::TextureSource;
///
/// let checker = |_: &str, uv: &[f32], _: Option<i32>, _: f32| {
///     let v = if (uv[0] * 2.0).floor() as i32 % 2 == 0 { 1.0 } else { 0.0 };
///     [v, v, v, 1.0]
/// };
/// assert_eq!(checker.sample("albedo", &[0.25, 0.5], None, 0.0)[0], 1.0);
/// ```
pub trait TextureSource {
    /// Samples `texture` at `coords` on the given array layer and mip level.
    fn sample(&self, texture: &str, coords: &[f32], layer: Option<i32>, level: f32) -> [f32; 4];

    /// Depth comparison sample with a `less_equal` comparison: `1` when
    /// `depth_ref` is not behind the stored depth.
    fn sample_compare(
        &self,
        texture: &str,
        coords: &[f32],
        layer: Option<i32>,
        depth_ref: f32,
    ) -> f32 {
        if depth_ref <= self.sample(texture, coords, layer, 0.0)[0] {
            1.0
        } else {
            0.0
        }
    }
}

impl<F> TextureSource for F
where
    F: Fn(&str, &[f32], Option<i32>, f32) -> [f32; 4],
{
    fn sample(&self, texture: &str, coords: &[f32], layer: Option<i32>, level: f32) -> [f32; 4] {
        self(texture, coords, layer, level)
    }
}

/// A source where every texel is `1`: unshadowed, fully opaque, white.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTextures;

impl TextureSource for NullTextures {
    fn sample(&self, _: &str, _: &[f32], _: Option<i32>, _: f32) -> [f32; 4] {
        [1.0; 4]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_compare_is_less_equal() {
        let depth = |_: &str, _: &[f32], _: Option<i32>, _: f32| [0.5, 0.0, 0.0, 0.0];
        assert_eq!(depth.sample_compare("map", &[0.0, 0.0], Some(0), 0.4), 1.0);
        assert_eq!(depth.sample_compare("map", &[0.0, 0.0], Some(0), 0.5), 1.0);
        assert_eq!(depth.sample_compare("map", &[0.0, 0.0], Some(0), 0.6), 0.0);
    }

    #[test]
    fn test_null_textures_are_white() {
        assert_eq!(NullTextures.sample("any", &[0.0; 2], None, 0.0), [1.0; 4]);
        assert_eq!(NullTextures.sample_compare("any", &[0.0; 2], None, 0.99), 1.0);
    }
}
