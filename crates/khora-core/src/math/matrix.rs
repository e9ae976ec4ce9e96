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

//! Provides the column-major 4x4 matrix used for light and shadow transforms.

use super::{Vec3, Vec4, EPSILON};
use serde::{Deserialize, Serialize};
use std::ops::Mul;

/// A 4x4 column-major matrix, laid out exactly as WGSL's `mat4x4<f32>`.
#[derive(
    Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable, Serialize, Deserialize,
)]
#[repr(C)]
pub struct Mat4 {
    /// The four columns of the matrix.
    pub cols: [Vec4; 4],
}

impl Mat4 {
    /// The identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [
            Vec4::new(1.0, 0.0, 0.0, 0.0),
            Vec4::new(0.0, 1.0, 0.0, 0.0),
            Vec4::new(0.0, 0.0, 1.0, 0.0),
            Vec4::new(0.0, 0.0, 0.0, 1.0),
        ],
    };

    /// Creates a matrix from four column vectors.
    #[inline]
    pub const fn from_cols(c0: Vec4, c1: Vec4, c2: Vec4, c3: Vec4) -> Self {
        Self {
            cols: [c0, c1, c2, c3],
        }
    }

    /// Creates a translation matrix.
    #[inline]
    pub const fn from_translation(v: Vec3) -> Self {
        let mut m = Self::IDENTITY;
        m.cols[3] = v.extend(1.0);
        m
    }

    /// Returns the row at `index`.
    #[inline]
    pub fn row(&self, index: usize) -> Vec4 {
        Vec4::new(
            self.cols[0][index],
            self.cols[1][index],
            self.cols[2][index],
            self.cols[3][index],
        )
    }

    /// Returns the transposed matrix.
    #[inline]
    pub fn transpose(&self) -> Self {
        Self::from_cols(self.row(0), self.row(1), self.row(2), self.row(3))
    }

    /// Returns the matrix as a flat column-major array.
    #[inline]
    pub fn to_cols_array(&self) -> [f32; 16] {
        bytemuck::cast(self.cols)
    }

    /// Right-handed perspective projection with a `[0, 1]` depth range.
    ///
    /// Returns `None` when `z_near` is not positive or `z_far <= z_near`.
    pub fn perspective_rh_zo(
        fov_y_radians: f32,
        aspect_ratio: f32,
        z_near: f32,
        z_far: f32,
    ) -> Option<Self> {
        if z_near <= 0.0 || z_far <= z_near {
            return None;
        }
        let f = 1.0 / (fov_y_radians * 0.5).tan();
        let range = z_near - z_far;
        Some(Self::from_cols(
            Vec4::new(f / aspect_ratio, 0.0, 0.0, 0.0),
            Vec4::new(0.0, f, 0.0, 0.0),
            Vec4::new(0.0, 0.0, z_far / range, -1.0),
            Vec4::new(0.0, 0.0, z_near * z_far / range, 0.0),
        ))
    }

    /// Right-handed orthographic projection with a `[0, 1]` depth range.
    pub fn orthographic_rh_zo(
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        z_near: f32,
        z_far: f32,
    ) -> Self {
        let width = right - left;
        let height = top - bottom;
        let depth = z_far - z_near;
        Self::from_cols(
            Vec4::new(2.0 / width, 0.0, 0.0, 0.0),
            Vec4::new(0.0, 2.0 / height, 0.0, 0.0),
            Vec4::new(0.0, 0.0, -1.0 / depth, 0.0),
            Vec4::new(
                -(right + left) / width,
                -(top + bottom) / height,
                -z_near / depth,
                1.0,
            ),
        )
    }

    /// Right-handed view matrix looking from `eye` towards `target`.
    ///
    /// Returns `None` if `eye == target` or `up` is parallel to the view direction.
    pub fn look_at_rh(eye: Vec3, target: Vec3, up: Vec3) -> Option<Self> {
        let forward = target - eye;
        if forward.length_squared() < EPSILON * EPSILON {
            return None;
        }
        let f = forward.normalize();
        let side = f.cross(up);
        if side.length_squared() < EPSILON * EPSILON {
            return None;
        }
        let s = side.normalize();
        let u = s.cross(f);
        Some(Self::from_cols(
            Vec4::new(s.x, u.x, -f.x, 0.0),
            Vec4::new(s.y, u.y, -f.y, 0.0),
            Vec4::new(s.z, u.z, -f.z, 0.0),
            Vec4::new(-eye.dot(s), -eye.dot(u), eye.dot(f), 1.0),
        ))
    }

    /// Computes the inverse by Gauss-Jordan elimination with partial pivoting.
    /// Returns `None` if the matrix is singular.
    pub fn inverse(&self) -> Option<Self> {
        let mut a: [[f32; 4]; 4] = [[0.0; 4]; 4];
        let mut inv = [[0.0f32; 4]; 4];
        for r in 0..4 {
            for c in 0..4 {
                a[r][c] = self.cols[c][r];
            }
            inv[r][r] = 1.0;
        }

        for col in 0..4 {
            let pivot = (col..4).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
            if a[pivot][col].abs() < f32::EPSILON {
                return None;
            }
            a.swap(col, pivot);
            inv.swap(col, pivot);

            let scale = 1.0 / a[col][col];
            for c in 0..4 {
                a[col][c] *= scale;
                inv[col][c] *= scale;
            }
            for r in 0..4 {
                if r != col {
                    let factor = a[r][col];
                    for c in 0..4 {
                        a[r][c] -= factor * a[col][c];
                        inv[r][c] -= factor * inv[col][c];
                    }
                }
            }
        }

        let column = |c: usize| Vec4::new(inv[0][c], inv[1][c], inv[2][c], inv[3][c]);
        Some(Self::from_cols(column(0), column(1), column(2), column(3)))
    }

    /// Transforms a point, including the perspective divide.
    #[inline]
    pub fn project_point(&self, point: Vec3) -> Vec3 {
        let p = *self * point.extend(1.0);
        p.truncate() / p.w
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul<Mat4> for Mat4 {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Mat4) -> Self {
        Self::from_cols(
            self * rhs.cols[0],
            self * rhs.cols[1],
            self * rhs.cols[2],
            self * rhs.cols[3],
        )
    }
}

impl Mul<Vec4> for Mat4 {
    type Output = Vec4;
    #[inline]
    fn mul(self, rhs: Vec4) -> Vec4 {
        self.cols[0] * rhs.x + self.cols[1] * rhs.y + self.cols[2] * rhs.z + self.cols[3] * rhs.w
    }
}

impl approx::AbsDiffEq for Mat4 {
    type Epsilon = f32;

    fn default_epsilon() -> f32 {
        EPSILON
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.cols
            .iter()
            .zip(other.cols.iter())
            .all(|(a, b)| approx::AbsDiffEq::abs_diff_eq(a, b, epsilon))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_inverse_of_translation() {
        let m = Mat4::from_translation(Vec3::new(1.0, -2.0, 3.0));
        let inv = m.inverse().expect("translation is invertible");
        assert_abs_diff_eq!(inv, Mat4::from_translation(Vec3::new(-1.0, 2.0, -3.0)));
        assert_abs_diff_eq!(m * inv, Mat4::IDENTITY, epsilon = 1e-5);
    }

    #[test]
    fn test_singular_matrix_has_no_inverse() {
        let mut m = Mat4::IDENTITY;
        m.cols[2] = Vec4::ZERO;
        assert!(m.inverse().is_none());
    }

    #[test]
    fn test_look_at_moves_target_onto_negative_z() {
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y)
            .expect("valid view");
        let p = view.project_point(Vec3::ZERO);
        assert_abs_diff_eq!(p, Vec3::new(0.0, 0.0, -5.0), epsilon = 1e-5);
    }

    #[test]
    fn test_orthographic_maps_range_to_unit_depth() {
        let proj = Mat4::orthographic_rh_zo(-1.0, 1.0, -1.0, 1.0, 1.0, 11.0);
        assert_abs_diff_eq!(proj.project_point(Vec3::new(0.0, 0.0, -1.0)).z, 0.0);
        assert_abs_diff_eq!(proj.project_point(Vec3::new(0.0, 0.0, -11.0)).z, 1.0);
    }

    #[test]
    fn test_perspective_rejects_invalid_planes() {
        assert!(Mat4::perspective_rh_zo(1.0, 1.0, 0.0, 10.0).is_none());
        let proj = Mat4::perspective_rh_zo(1.0, 1.0, 0.5, 10.0).expect("valid planes");
        assert_abs_diff_eq!(proj.project_point(Vec3::new(0.0, 0.0, -0.5)).z, 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(proj.project_point(Vec3::new(0.0, 0.0, -10.0)).z, 1.0, epsilon = 1e-5);
    }
}
