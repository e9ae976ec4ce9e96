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

//! Host-side shadow view setup.
//!
//! Directional lights split the camera frustum with the practical split
//! scheme and fit one orthographic projection around each slice. Point
//! lights render six cube faces, spot lights a single perspective view.

use khora_core::math::{Mat4, Vec3, Vec4, EPSILON, FRAC_PI_2};
use khora_core::renderer::light::{DirectionalLight, SpotLight, DIRECTIONAL_MAX_CASCADES};

/// Depth added on both sides of a cascade so that casters outside the
/// camera frustum still land in the map.
pub const SHADOW_Z_PADDING: f32 = 100.0;
/// Blend between logarithmic (`1`) and uniform (`0`) splits.
pub const DEFAULT_SPLIT_LAMBDA: f32 = 0.75;

/// The camera parameters the cascades are fitted to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFrustum {
    /// World to view transform.
    pub view: Mat4,
    /// Vertical field of view, in radians.
    pub fov_y: f32,
    /// Width over height.
    pub aspect: f32,
    /// Near plane distance.
    pub near: f32,
    /// Far plane distance.
    pub far: f32,
}

/// Split distances of `cascade_count` cascades between `near` and `far`.
///
/// Entry `i` is the view distance where cascade `i` starts; entry
/// `cascade_count` is `far`. Entries past it repeat `far`, leaving the
/// unused cascades empty.
///
/// # Examples
///
/// ```
/// use khora_shading::shadow::cascades::split_depths;
///
/// let uniform = split_depths(1.0, 9.0, 2, 0.0);
/// assert_eq!(uniform, [1.0, 5.0, 9.0, 9.0, 9.0]);
/// ```
pub fn split_depths(
    near: f32,
    far: f32,
    cascade_count: usize,
    lambda: f32,
) -> [f32; DIRECTIONAL_MAX_CASCADES + 1] {
    let count = cascade_count.clamp(1, DIRECTIONAL_MAX_CASCADES);
    let lambda = lambda.clamp(0.0, 1.0);
    let mut splits = [far; DIRECTIONAL_MAX_CASCADES + 1];
    splits[0] = near;
    for (i, split) in splits.iter_mut().enumerate().take(count).skip(1) {
        let t = i as f32 / count as f32;
        let logarithmic = near * (far / near).powf(t);
        let uniform = near + (far - near) * t;
        *split = lambda * logarithmic + (1.0 - lambda) * uniform;
    }
    splits
}

fn slice_corners(inverse_view: &Mat4, tan_x: f32, tan_y: f32, near: f32, far: f32) -> [Vec3; 8] {
    let mut corners = [Vec3::ZERO; 8];
    let mut i = 0;
    for distance in [near, far] {
        for x in [-1.0, 1.0] {
            for y in [-1.0, 1.0] {
                let view = Vec4::new(x * tan_x * distance, y * tan_y * distance, -distance, 1.0);
                corners[i] = (*inverse_view * view).truncate();
                i += 1;
            }
        }
    }
    corners
}

fn light_up(direction: Vec3) -> Vec3 {
    if direction.y.abs() > 0.99 {
        Vec3::Z
    } else {
        Vec3::Y
    }
}

/// Recomputes the split depths, split scales and cascade view-projections
/// of `light` for `camera`.
pub fn update_directional(light: &mut DirectionalLight, camera: &CameraFrustum, lambda: f32) {
    let Some(inverse_view) = camera.view.inverse() else {
        log::warn!("Cascades: camera view is not invertible, keeping previous cascades");
        return;
    };
    let count = light.clamped_cascade_count();
    let splits = split_depths(camera.near, camera.far, count, lambda);
    let direction = light.direction.normalize();
    let up = light_up(direction);
    let tan_y = (camera.fov_y * 0.5).tan();
    let tan_x = tan_y * camera.aspect;
    let mut widths = [0.0f32; DIRECTIONAL_MAX_CASCADES];

    for cascade in 0..count {
        let (near, far) = (splits[cascade], splits[cascade + 1]);
        let corners = slice_corners(&inverse_view, tan_x, tan_y, near, far);
        let center = corners.iter().fold(Vec3::ZERO, |acc, p| acc + *p) / 8.0;
        let light_view = Mat4::look_at_rh(center, center + direction, up).unwrap_or_else(|| {
            log::warn!("Cascades: degenerate light direction {:?}", direction);
            Mat4::IDENTITY
        });

        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        for corner in corners {
            let p = (light_view * Vec4::from_vec3(corner, 1.0)).truncate();
            min = min.min(p);
            max = max.max(p);
        }

        let projection = Mat4::orthographic_rh_zo(
            min.x,
            max.x,
            min.y,
            max.y,
            -max.z - SHADOW_Z_PADDING,
            -min.z + SHADOW_Z_PADDING,
        );
        light.transforms[cascade] = projection * light_view;
        widths[cascade] = max.x - min.x;
    }

    for (cascade, scale) in light.split_scales.iter_mut().enumerate() {
        *scale = if cascade < count && widths[cascade] > EPSILON {
            widths[0] / widths[cascade]
        } else {
            1.0
        };
    }
    light.split_depths = splits;
    log::trace!("Cascades: {} cascades split at {:?}", count, &splits[..=count]);
}

/// Cube face directions and up vectors, in `+X, -X, +Y, -Y, +Z, -Z` order.
const CUBE_FACES: [(Vec3, Vec3); 6] = [
    (Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, -1.0, 0.0)),
    (Vec3::new(-1.0, 0.0, 0.0), Vec3::new(0.0, -1.0, 0.0)),
    (Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 0.0, 1.0)),
    (Vec3::new(0.0, -1.0, 0.0), Vec3::new(0.0, 0.0, -1.0)),
    (Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.0, -1.0, 0.0)),
    (Vec3::new(0.0, 0.0, -1.0), Vec3::new(0.0, -1.0, 0.0)),
];

/// View-projections of the six cube faces of a point light at `position`.
///
/// Returns `None` for an invalid depth range.
pub fn point_face_transforms(position: Vec3, near: f32, far: f32) -> Option<[Mat4; 6]> {
    let projection = Mat4::perspective_rh_zo(FRAC_PI_2, 1.0, near, far)?;
    let mut transforms = [Mat4::IDENTITY; 6];
    for (transform, (direction, up)) in transforms.iter_mut().zip(CUBE_FACES) {
        *transform = projection * Mat4::look_at_rh(position, position + direction, up)?;
    }
    Some(transforms)
}

/// View-projection of a spot light, covering its outer cone.
pub fn spot_transform(light: &SpotLight, near: f32, far: f32) -> Option<Mat4> {
    let projection = Mat4::perspective_rh_zo(2.0 * light.outer_cone_angle, 1.0, near, far)?;
    let direction = light.direction.normalize();
    let view = Mat4::look_at_rh(light.position, light.position + direction, light_up(direction))?;
    Some(projection * view)
}

/// Updates `light.transform`, leaving it untouched on a degenerate setup.
pub fn update_spot(light: &mut SpotLight, near: f32) {
    match spot_transform(light, near, light.base.far_plane) {
        Some(transform) => light.transform = transform,
        None => log::warn!(
            "Cascades: invalid spot light projection (near {}, far {})",
            near,
            light.base.far_plane
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn camera() -> CameraFrustum {
        let view = Mat4::look_at_rh(Vec3::new(0.0, 2.0, 10.0), Vec3::new(0.0, 2.0, 0.0), Vec3::Y)
            .unwrap();
        CameraFrustum {
            view,
            fov_y: 1.0,
            aspect: 16.0 / 9.0,
            near: 0.5,
            far: 80.0,
        }
    }

    #[test]
    fn test_split_depths_are_monotonic() {
        for count in 1..=DIRECTIONAL_MAX_CASCADES {
            for lambda in [0.0, 0.5, 1.0] {
                let splits = split_depths(0.1, 100.0, count, lambda);
                assert_eq!(splits[0], 0.1);
                assert_relative_eq!(splits[count], 100.0, epsilon = 1e-3);
                for i in 0..count {
                    assert!(splits[i] < splits[i + 1], "{splits:?}");
                }
            }
        }
        let logarithmic = split_depths(1.0, 100.0, 2, 1.0);
        assert_relative_eq!(logarithmic[1], 10.0, epsilon = 1e-4);
    }

    #[test]
    fn test_cascades_cover_their_slice() {
        let mut light = DirectionalLight {
            direction: Vec3::new(0.3, -1.0, -0.2).normalize(),
            cascade_count: 3,
            ..Default::default()
        };
        let camera = camera();
        update_directional(&mut light, &camera, DEFAULT_SPLIT_LAMBDA);
        let inverse_view = camera.view.inverse().unwrap();

        assert_eq!(light.split_depths[0], camera.near);
        assert_eq!(light.split_depths[3], camera.far);
        assert_eq!(light.split_scales[0], 1.0);
        assert_eq!(light.split_scales[3], 1.0);
        for cascade in 0..3 {
            assert!(light.split_scales[cascade] <= 1.0 + 1e-5);
            let middle = 0.5 * (light.split_depths[cascade] + light.split_depths[cascade + 1]);
            let world = (inverse_view * Vec4::new(0.0, 0.0, -middle, 1.0)).truncate();
            let p = light.transforms[cascade].project_point(world);
            assert!(p.x.abs() <= 1.0 && p.y.abs() <= 1.0, "cascade {cascade}: {p:?}");
            assert!((0.0..=1.0).contains(&p.z), "cascade {cascade}: {p:?}");
        }
    }

    #[test]
    fn test_point_faces_look_along_the_axes() {
        let position = Vec3::new(1.0, 2.0, 3.0);
        let transforms = point_face_transforms(position, 0.1, 50.0).unwrap();
        for (transform, (direction, _)) in transforms.iter().zip(CUBE_FACES) {
            let p = transform.project_point(position + direction * 5.0);
            assert_relative_eq!(p.x, 0.0, epsilon = 1e-4);
            assert_relative_eq!(p.y, 0.0, epsilon = 1e-4);
            assert!(p.z > 0.0 && p.z < 1.0);
        }
        assert!(point_face_transforms(position, 0.0, 50.0).is_none());
    }

    #[test]
    fn test_spot_transform() {
        let mut light = SpotLight {
            position: Vec3::new(0.0, 5.0, 0.0),
            direction: Vec3::new(0.0, -1.0, 0.0),
            ..Default::default()
        };
        update_spot(&mut light, 0.1);
        let p = light.transform.project_point(Vec3::new(0.0, 1.0, 0.0));
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-4);
        assert_relative_eq!(p.y, 0.0, epsilon = 1e-4);
        assert!(p.z > 0.0 && p.z < 1.0);

        let before = light.transform;
        update_spot(&mut light, -1.0);
        assert_eq!(light.transform, before);
    }
}
