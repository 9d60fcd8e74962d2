/// Geometry transform: Euler rotation, projection calibration, and the
/// point -> screen mapping shared by every stage of the pipeline.
///
/// The rotation composes elementary rotations X, then Y, then Z. The order
/// is load-bearing: visibility and lighting rotate face normals with the
/// same matrix, so all three stages agree on orientation bit-for-bit.
use glam::{Mat3, Vec2, Vec3};

use crate::model::Bounds;
use crate::view::{DepthReference, Projection, Rotation};

/// Largest fraction of the output's shorter side the model may span.
const MAX_COVERAGE: f32 = 0.9;
/// Perspective FOV slider range, degrees.
const FOV_MIN: f32 = 5.0;
const FOV_MAX: f32 = 75.0;
/// Camera distance curve: near factor at max FOV, extra pullback at min FOV.
const CAM_BASE_NEAR: f32 = 1.2;
const CAM_FAR_EXTRA: f32 = 45.0;
/// Depths are floored here before any perspective divide.
const MIN_DEPTH: f32 = 0.001;

impl Rotation {
    /// Rotation matrix composing X, then Y, then Z.
    pub fn matrix(&self) -> Mat3 {
        Mat3::from_rotation_z(self.z_deg.to_radians())
            * Mat3::from_rotation_y(self.y_deg.to_radians())
            * Mat3::from_rotation_x(self.x_deg.to_radians())
    }
}

/// A point mapped to screen space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
    /// Squared camera distance, used as the painter's sort key.
    pub depth: f32,
}

/// Per-frame projection calibration: camera placement, focal length and
/// the pixels-per-voxel factor, derived once per render call.
#[derive(Copy, Clone, Debug)]
pub struct Calibration {
    pub perspective: bool,
    pub camera_distance: f32,
    pub focal_length: f32,
    /// Pixels per world unit at the reference depth.
    pub voxel_size: f32,
    /// Rotation pivot (model middle point).
    pub middle: Vec3,
    /// Camera position in world space, on the +Z axis through the middle.
    pub camera_pos: Vec3,
    pub screen_center: Vec2,
}

impl Calibration {
    /// Derive the frame calibration from the model bounds and view inputs.
    ///
    /// Perspective pins the chosen reference depth plane (front, middle or
    /// back of the rotated bounding box) at exactly `scale` pixels per
    /// voxel. The FOV maps through a cube-root warp so the slider feels
    /// perceptually linear: narrow FOV pushes the camera far back, wide
    /// FOV pulls it close.
    pub fn compute(
        bounds: &Bounds,
        rotation: &Rotation,
        projection: &Projection,
        scale: f32,
        width: u32,
        height: u32,
    ) -> Calibration {
        let middle = bounds.middle();
        let max_dim = bounds.max_dim();
        let max_allowed = (width.min(height) as f32) * MAX_COVERAGE;
        let screen_center = Vec2::new(width as f32 * 0.5, height as f32 * 0.5);

        let fov = match projection {
            Projection::Perspective { fov_degrees, .. } if *fov_degrees > 0.0 => {
                Some(fov_degrees.clamp(FOV_MIN, FOV_MAX))
            }
            _ => None,
        };

        match fov {
            Some(fov) => {
                let warp_t = ((fov - FOV_MIN) / (FOV_MAX - FOV_MIN)).clamp(0.0, 1.0);
                let amplified = warp_t.powf(1.0 / 3.0);
                let camera_distance =
                    max_dim * (CAM_BASE_NEAR + (1.0 - amplified) * (1.0 - amplified) * CAM_FAR_EXTRA);
                let focal_length = (height as f32 * 0.5) / (fov.to_radians() * 0.5).tan();

                // Rotate the AABB corners to find the front/back depth planes.
                let m = rotation.matrix();
                let camera_z = middle.z + camera_distance;
                let mut z_min = f32::INFINITY;
                let mut z_max = f32::NEG_INFINITY;
                for corner in bounds.corners() {
                    let world_z = (m * (corner - middle)).z + middle.z;
                    z_min = z_min.min(world_z);
                    z_max = z_max.max(world_z);
                }
                let depth_back = (camera_z - z_min).max(MIN_DEPTH);
                let depth_front = (camera_z - z_max).max(MIN_DEPTH);
                let depth_middle = camera_distance.max(MIN_DEPTH);

                let reference = match projection {
                    Projection::Perspective { reference, .. } => *reference,
                    Projection::Orthographic => DepthReference::Middle,
                };
                let depth_ref = match reference {
                    DepthReference::Front => depth_front,
                    DepthReference::Middle => depth_middle,
                    DepthReference::Back => depth_back,
                };

                let mut voxel_size = scale * (depth_ref / focal_length);
                if max_dim > 0.0 && voxel_size * max_dim > max_allowed {
                    voxel_size = max_allowed / max_dim;
                }
                if voxel_size <= 0.0 {
                    voxel_size = 1.0;
                }

                Calibration {
                    perspective: true,
                    camera_distance,
                    focal_length,
                    voxel_size,
                    middle,
                    camera_pos: Vec3::new(middle.x, middle.y, camera_z),
                    screen_center,
                }
            }
            None => {
                let camera_distance = max_dim * 5.0;
                // Fractional scale is handled by supersampling in the
                // composer; the rasterizer never sees sub-pixel voxels.
                let mut voxel_size = scale.max(1.0);
                if max_dim > 0.0 && voxel_size * max_dim > max_allowed {
                    voxel_size *= max_allowed / (voxel_size * max_dim);
                }
                Calibration {
                    perspective: false,
                    camera_distance,
                    focal_length: 0.0,
                    voxel_size,
                    middle,
                    camera_pos: Vec3::new(middle.x, middle.y, middle.z + camera_distance),
                    screen_center,
                }
            }
        }
    }

    /// View direction in camera space: constant +Z for both projections.
    #[inline]
    pub fn view_dir(&self) -> Vec3 {
        Vec3::Z
    }

    /// Rotate a world-space point about the model middle.
    #[inline]
    pub fn rotate(&self, m: &Mat3, p: Vec3) -> Vec3 {
        *m * (p - self.middle) + self.middle
    }

    /// Map a rotated voxel-space point to the screen. Raster Y grows
    /// downward, so world +Y maps up the image.
    pub fn to_screen(&self, rotated: Vec3) -> ScreenPoint {
        let sx = (rotated.x - self.middle.x) * self.voxel_size;
        let sy = (rotated.y - self.middle.y) * self.voxel_size;
        let (x, y) = if self.perspective {
            let depth = (self.camera_pos.z - rotated.z).max(MIN_DEPTH);
            let s = if self.focal_length > 0.0 {
                self.focal_length / depth
            } else {
                1.0
            };
            (self.screen_center.x + sx * s, self.screen_center.y - sy * s)
        } else {
            (self.screen_center.x + sx, self.screen_center.y - sy)
        };
        ScreenPoint {
            x,
            y,
            depth: self.camera_pos.distance_squared(rotated),
        }
    }

    /// Transform + project one world-space point in a single call.
    pub fn transform(&self, m: &Mat3, p: Vec3) -> ScreenPoint {
        self.to_screen(self.rotate(m, p))
    }

    /// Project one corner of a voxel face.
    ///
    /// `rotated_center` is the voxel center after rotation; `corner` is the
    /// local cube-corner offset (pre-rotation, voxel units). Corners scale
    /// with `voxel_size` in the image plane but only nudge the perspective
    /// depth, so a cube face stays a convex quad.
    pub fn project_corner(&self, m: &Mat3, rotated_center: Vec3, corner: Vec3) -> Vec2 {
        let offset = *m * (corner * self.voxel_size);
        let wx = (rotated_center.x - self.middle.x) * self.voxel_size + offset.x;
        let wy = (rotated_center.y - self.middle.y) * self.voxel_size + offset.y;
        if self.perspective {
            let wz = rotated_center.z + offset.z / self.voxel_size;
            let depth = (self.camera_pos.z - wz).max(MIN_DEPTH);
            let s = if self.focal_length > 0.0 {
                self.focal_length / depth
            } else {
                1.0
            };
            Vec2::new(
                self.screen_center.x + wx * s,
                self.screen_center.y - wy * s,
            )
        } else {
            Vec2::new(self.screen_center.x + wx, self.screen_center.y - wy)
        }
    }
}
