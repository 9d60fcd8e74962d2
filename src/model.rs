/// Voxel model: the immutable input to every render call.
/// A model is an ordered list of colored unit cubes on an integer grid,
/// plus an occupancy set used for rotation-independent adjacency culling.
use glam::{IVec3, Vec3};
use std::collections::HashSet;

/// 8-bit RGBA color. Stored per voxel; the pipeline only ever mutates
/// derived per-face copies, never the source color.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);
    pub const WHITE: Rgba = Rgba::new(255, 255, 255, 255);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    #[inline]
    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }

    /// Scale RGB by a [0, 1] factor, leaving alpha untouched.
    #[inline]
    pub fn scaled(&self, factor: f32) -> Rgba {
        let s = |c: u8| ((c as f32 * factor) + 0.5).min(255.0).max(0.0) as u8;
        Rgba::new(s(self.r), s(self.g), s(self.b), self.a)
    }
}

/// One of the six axis-aligned cube faces.
///
/// Screen-semantic names follow the camera convention (camera looks down +Z):
/// `Front` = +z, `Back` = -z, `Right` = +x, `Left` = -x, `Top` = +y,
/// `Bottom` = -y. Per-face storage is always a `[T; 6]` indexed by
/// `Face::index()`; face names never key a hash map in the hot loop.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Face {
    Front = 0,
    Back = 1,
    Right = 2,
    Left = 3,
    Top = 4,
    Bottom = 5,
}

/// Unit cube corners, centered on the voxel position.
pub const CUBE_CORNERS: [Vec3; 8] = [
    Vec3::new(-0.5, -0.5, -0.5),
    Vec3::new(0.5, -0.5, -0.5),
    Vec3::new(0.5, 0.5, -0.5),
    Vec3::new(-0.5, 0.5, -0.5),
    Vec3::new(-0.5, -0.5, 0.5),
    Vec3::new(0.5, -0.5, 0.5),
    Vec3::new(0.5, 0.5, 0.5),
    Vec3::new(-0.5, 0.5, 0.5),
];

/// Corner indices for each face, wound consistently so projected quads
/// stay convex under any rotation.
const FACE_CORNERS: [[usize; 4]; 6] = [
    [4, 5, 6, 7], // front  (+z)
    [1, 0, 3, 2], // back   (-z)
    [5, 1, 2, 6], // right  (+x)
    [0, 4, 7, 3], // left   (-x)
    [7, 6, 2, 3], // top    (+y)
    [0, 1, 5, 4], // bottom (-y)
];

impl Face {
    pub const ALL: [Face; 6] = [
        Face::Front,
        Face::Back,
        Face::Right,
        Face::Left,
        Face::Top,
        Face::Bottom,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Fixed local-space unit normal. Only the rotated copies vary per frame.
    #[inline]
    pub const fn normal(self) -> Vec3 {
        match self {
            Face::Front => Vec3::new(0.0, 0.0, 1.0),
            Face::Back => Vec3::new(0.0, 0.0, -1.0),
            Face::Right => Vec3::new(1.0, 0.0, 0.0),
            Face::Left => Vec3::new(-1.0, 0.0, 0.0),
            Face::Top => Vec3::new(0.0, 1.0, 0.0),
            Face::Bottom => Vec3::new(0.0, -1.0, 0.0),
        }
    }

    /// Grid offset to the neighboring voxel beyond this face.
    #[inline]
    pub const fn neighbor_offset(self) -> IVec3 {
        match self {
            Face::Front => IVec3::new(0, 0, 1),
            Face::Back => IVec3::new(0, 0, -1),
            Face::Right => IVec3::new(1, 0, 0),
            Face::Left => IVec3::new(-1, 0, 0),
            Face::Top => IVec3::new(0, 1, 0),
            Face::Bottom => IVec3::new(0, -1, 0),
        }
    }

    /// The physically opposite face.
    #[inline]
    pub const fn opposite(self) -> Face {
        match self {
            Face::Front => Face::Back,
            Face::Back => Face::Front,
            Face::Right => Face::Left,
            Face::Left => Face::Right,
            Face::Top => Face::Bottom,
            Face::Bottom => Face::Top,
        }
    }

    /// Local-space corner positions of this face, relative to the voxel center.
    #[inline]
    pub fn corners(self) -> [Vec3; 4] {
        let idx = FACE_CORNERS[self.index()];
        [
            CUBE_CORNERS[idx[0]],
            CUBE_CORNERS[idx[1]],
            CUBE_CORNERS[idx[2]],
            CUBE_CORNERS[idx[3]],
        ]
    }

    pub const fn name(self) -> &'static str {
        match self {
            Face::Front => "front",
            Face::Back => "back",
            Face::Right => "right",
            Face::Left => "left",
            Face::Top => "top",
            Face::Bottom => "bottom",
        }
    }
}

/// A unit cube at an integer grid position with a single color.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Voxel {
    pub pos: IVec3,
    pub color: Rgba,
}

impl Voxel {
    #[inline]
    pub fn new(x: i32, y: i32, z: i32, color: Rgba) -> Self {
        Self {
            pos: IVec3::new(x, y, z),
            color,
        }
    }
}

/// Axis-aligned integer bounds of a model.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Bounds {
    pub min: IVec3,
    pub max: IVec3,
}

impl Bounds {
    /// Midpoint of the bounds. Rotation pivots here.
    #[inline]
    pub fn middle(&self) -> Vec3 {
        (self.min.as_vec3() + self.max.as_vec3()) * 0.5
    }

    /// Extent + 1 per axis (a single voxel has size 1).
    #[inline]
    pub fn size(&self) -> Vec3 {
        (self.max - self.min).as_vec3() + Vec3::ONE
    }

    #[inline]
    pub fn max_dim(&self) -> f32 {
        self.size().max_element()
    }

    /// The 8 corners of the bounding box, in voxel-center coordinates.
    pub fn corners(&self) -> [Vec3; 8] {
        let (mn, mx) = (self.min.as_vec3(), self.max.as_vec3());
        [
            Vec3::new(mn.x, mn.y, mn.z),
            Vec3::new(mx.x, mn.y, mn.z),
            Vec3::new(mn.x, mx.y, mn.z),
            Vec3::new(mx.x, mx.y, mn.z),
            Vec3::new(mn.x, mn.y, mx.z),
            Vec3::new(mx.x, mn.y, mx.z),
            Vec3::new(mn.x, mx.y, mx.z),
            Vec3::new(mx.x, mx.y, mx.z),
        ]
    }
}

/// Ordered collection of voxels. Order carries no meaning but is preserved
/// so identical inputs render identically (painter ties break by order).
#[derive(Clone, Debug, Default)]
pub struct VoxelModel {
    voxels: Vec<Voxel>,
    occupied: HashSet<IVec3>,
}

impl VoxelModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_voxels(voxels: Vec<Voxel>) -> Self {
        let occupied = voxels.iter().map(|v| v.pos).collect();
        Self { voxels, occupied }
    }

    pub fn push(&mut self, voxel: Voxel) {
        self.occupied.insert(voxel.pos);
        self.voxels.push(voxel);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }

    #[inline]
    pub fn voxels(&self) -> &[Voxel] {
        &self.voxels
    }

    #[inline]
    pub fn contains(&self, pos: IVec3) -> bool {
        self.occupied.contains(&pos)
    }

    /// Faces not covered by a neighboring voxel. Rotation-independent:
    /// a shared face between two voxels can never be seen from any angle.
    /// This only ever hides faces; it never exposes new ones.
    pub fn exposed_faces(&self, pos: IVec3) -> [bool; 6] {
        let mut exposed = [true; 6];
        for face in Face::ALL {
            if self.occupied.contains(&(pos + face.neighbor_offset())) {
                exposed[face.index()] = false;
            }
        }
        exposed
    }

    /// Min/max per axis over all voxels. `None` for an empty model.
    pub fn bounds(&self) -> Option<Bounds> {
        let first = self.voxels.first()?;
        let mut min = first.pos;
        let mut max = first.pos;
        for v in &self.voxels[1..] {
            min = min.min(v.pos);
            max = max.max(v.pos);
        }
        Some(Bounds { min, max })
    }
}

impl FromIterator<Voxel> for VoxelModel {
    fn from_iter<I: IntoIterator<Item = Voxel>>(iter: I) -> Self {
        Self::from_voxels(iter.into_iter().collect())
    }
}
