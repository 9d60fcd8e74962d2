/// Rotation-driven face visibility.
///
/// All voxels share the same six local face normals, so for a given
/// rotation the camera-facing subset is identical across the whole model:
/// at most 3 of 6 faces can point toward the camera. The resolver computes
/// that set once per distinct rotation and the composer combines it with
/// the per-voxel adjacency mask from the model.
use glam::Vec3;

use crate::model::Face;
use crate::view::Rotation;

/// Base visibility epsilon. The effective cutoff grows as voxels shrink
/// on screen, so near-edge-on faces do not pop in and out at small
/// scales.
const BASE_THRESHOLD: f32 = 0.01;

/// Rotation-derived face data for one frame: rotated normals and the
/// camera-facing set.
#[derive(Copy, Clone, Debug)]
pub struct FrameVisibility {
    pub normals: [Vec3; 6],
    pub visible: [bool; 6],
    pub threshold: f32,
}

impl FrameVisibility {
    /// Rotate the six fixed normals and test each against the view
    /// direction (constant +Z in camera space for both projections).
    pub fn resolve(rotation: &Rotation, voxel_size: f32) -> FrameVisibility {
        let m = rotation.matrix();
        let threshold = BASE_THRESHOLD / voxel_size.clamp(f32::MIN_POSITIVE, 3.0);
        let mut normals = [Vec3::ZERO; 6];
        let mut visible = [false; 6];
        for face in Face::ALL {
            let n = (m * face.normal()).normalize_or_zero();
            normals[face.index()] = n;
            visible[face.index()] = n.z > threshold;
        }
        FrameVisibility {
            normals,
            visible,
            threshold,
        }
    }

    #[inline]
    pub fn is_visible(&self, face: Face) -> bool {
        self.visible[face.index()]
    }

    #[inline]
    pub fn normal(&self, face: Face) -> Vec3 {
        self.normals[face.index()]
    }

    pub fn visible_count(&self) -> usize {
        self.visible.iter().filter(|v| **v).count()
    }
}

/// Bit-exact cache key for the rotation-derived data.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct VisibilityKey {
    rx: u32,
    ry: u32,
    rz: u32,
    voxel_size: u32,
}

impl VisibilityKey {
    fn new(rotation: &Rotation, voxel_size: f32) -> Self {
        Self {
            rx: rotation.x_deg.to_bits(),
            ry: rotation.y_deg.to_bits(),
            rz: rotation.z_deg.to_bits(),
            voxel_size: voxel_size.to_bits(),
        }
    }
}

/// Single-entry cache held by the renderer. The cached value is reused
/// only when every key input is bit-identical to the previous call;
/// anything else recomputes. Call-scoped state, never process-global.
#[derive(Default)]
pub struct VisibilityCache {
    entry: Option<(VisibilityKey, FrameVisibility)>,
}

impl VisibilityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&mut self, rotation: &Rotation, voxel_size: f32) -> FrameVisibility {
        let key = VisibilityKey::new(rotation, voxel_size);
        if let Some((cached_key, cached)) = &self.entry {
            if *cached_key == key {
                return *cached;
            }
        }
        let fresh = FrameVisibility::resolve(rotation, voxel_size);
        self.entry = Some((key, fresh));
        fresh
    }
}
