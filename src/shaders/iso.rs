/// Isometric role shading: the visible faces are assigned the roles
/// top / left / right and tinted from a three-entry palette.
///
/// The top role goes to whichever of the physical top/bottom pair faces
/// the camera more, and also to its physical opposite, so flipping a
/// model upside down keeps the "top" palette on the face the viewer
/// perceives as up. The two most camera-facing side faces become left
/// and right by the sign ordering of their rotated X normals.
use super::{
    apply_palette_color, is_pure_color, FaceBatch, ParamKind, ParamSpec, ShaderCategory,
    ShaderError, ShaderInfo, ShaderModule, ShaderParams,
};
use crate::model::{Face, Rgba};

const SCHEMA: &[ParamSpec] = &[
    ParamSpec {
        key: "shading_mode",
        label: "Mode",
        kind: ParamKind::Choice {
            options: &["alpha", "literal"],
            default: "alpha",
        },
    },
    ParamSpec {
        key: "material_mode",
        label: "Skip pure colors",
        kind: ParamKind::Bool { default: false },
    },
    ParamSpec {
        key: "enable_tint",
        label: "Tint",
        kind: ParamKind::Bool { default: false },
    },
    ParamSpec {
        key: "top_color",
        label: "Top",
        kind: ParamKind::Color {
            default: Rgba::new(255, 255, 255, 255),
        },
    },
    ParamSpec {
        key: "left_color",
        label: "Left",
        kind: ParamKind::Color {
            default: Rgba::new(235, 235, 235, 230),
        },
    },
    ParamSpec {
        key: "right_color",
        label: "Right",
        kind: ParamKind::Color {
            default: Rgba::new(210, 210, 210, 210),
        },
    },
];

#[derive(Copy, Clone, PartialEq)]
enum Role {
    Top,
    Left,
    Right,
}

/// Side-face visibility cutoff when picking the left/right pair.
const SIDE_VISIBLE: f32 = 0.01;

pub struct IsoShade;

impl ShaderModule for IsoShade {
    fn info(&self) -> ShaderInfo {
        ShaderInfo {
            id: "iso",
            name: "Isometric Shading",
            category: ShaderCategory::Fx,
            requires_normals: true,
            requires_geometry: false,
        }
    }

    fn parameter_schema(&self) -> &'static [ParamSpec] {
        SCHEMA
    }

    fn process(&self, batch: &mut FaceBatch, params: &ShaderParams) -> Result<(), ShaderError> {
        let literal = params.string("shading_mode", "alpha") == "literal";
        let material_mode = params.boolean("material_mode", false);
        let tint = params.boolean("enable_tint", false);
        let palette = [
            params.color("top_color", Rgba::new(255, 255, 255, 255)),
            params.color("left_color", Rgba::new(235, 235, 235, 230)),
            params.color("right_color", Rgba::new(210, 210, 210, 210)),
        ];

        let roles = assign_roles(batch);

        for face in &mut batch.faces {
            if material_mode && is_pure_color(face.color) {
                continue;
            }
            let Some(role) = roles[face.face.index()] else {
                continue;
            };
            let color = match role {
                Role::Top => palette[0],
                Role::Left => palette[1],
                Role::Right => palette[2],
            };
            apply_palette_color(face, color, literal, tint);
        }
        Ok(())
    }
}

/// Build the face -> role table for this frame. Normals are shared by
/// every voxel at a given rotation, so one pass over the batch collects
/// everything needed.
fn assign_roles(batch: &FaceBatch) -> [Option<Role>; 6] {
    // Rotated normal per face present in the batch.
    let mut present: [Option<glam::Vec3>; 6] = [None; 6];
    for face in &batch.faces {
        present[face.face.index()].get_or_insert(face.normal);
    }

    let facing = |face: Face| -> f32 {
        present[face.index()].map(|n| n.z).unwrap_or(f32::NEG_INFINITY)
    };

    // Top role: the more camera-facing of the physical top/bottom pair,
    // plus its opposite.
    let iso_top = if facing(Face::Top) >= facing(Face::Bottom) {
        Face::Top
    } else {
        Face::Bottom
    };

    // Left/right roles: pick the two most camera-facing sides, preferring
    // strictly visible ones, then order them by rotated X normal.
    let side_faces = [Face::Front, Face::Back, Face::Left, Face::Right];
    let sides: Vec<(Face, glam::Vec3)> = side_faces
        .iter()
        .filter_map(|&f| present[f.index()].map(|n| (f, n)))
        .collect();
    let visible: Vec<(Face, glam::Vec3)> = sides
        .iter()
        .copied()
        .filter(|(_, n)| n.z > SIDE_VISIBLE)
        .collect();
    let mut pool = if visible.len() >= 2 { visible } else { sides };
    pool.sort_by(|a, b| {
        b.1.z
            .partial_cmp(&a.1.z)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut roles: [Option<Role>; 6] = [None; 6];
    roles[iso_top.index()] = Some(Role::Top);
    roles[iso_top.opposite().index()] = Some(Role::Top);
    if pool.len() >= 2 {
        let (a, b) = (pool[0], pool[1]);
        let (right, left) = if a.1.x > b.1.x { (a.0, b.0) } else { (b.0, a.0) };
        roles[left.index()] = Some(Role::Left);
        roles[right.index()] = Some(Role::Right);
    }
    roles
}
