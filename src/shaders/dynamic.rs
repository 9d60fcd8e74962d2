/// Directional lighting: yaw/pitch light with ambient floor, radial
/// cone falloff around the light axis, and an optional rim term near
/// silhouette edges.
use glam::Vec3;

use super::{
    FaceBatch, ParamKind, ParamSpec, ShaderCategory, ShaderError, ShaderInfo, ShaderModule,
    ShaderParams,
};
use crate::model::Rgba;

const SCHEMA: &[ParamSpec] = &[
    ParamSpec {
        key: "yaw",
        label: "Yaw",
        kind: ParamKind::Number {
            min: -180.0,
            max: 180.0,
            default: 25.0,
        },
    },
    ParamSpec {
        key: "pitch",
        label: "Pitch",
        kind: ParamKind::Number {
            min: -90.0,
            max: 90.0,
            default: 25.0,
        },
    },
    ParamSpec {
        key: "diffuse",
        label: "Diffuse",
        kind: ParamKind::Number {
            min: 0.0,
            max: 100.0,
            default: 60.0,
        },
    },
    ParamSpec {
        key: "ambient",
        label: "Ambient",
        kind: ParamKind::Number {
            min: 0.0,
            max: 100.0,
            default: 30.0,
        },
    },
    ParamSpec {
        key: "diameter",
        label: "Cone diameter",
        kind: ParamKind::Number {
            min: 0.0,
            max: 1000.0,
            default: 100.0,
        },
    },
    ParamSpec {
        key: "rim_enabled",
        label: "Rim light",
        kind: ParamKind::Bool { default: false },
    },
    ParamSpec {
        key: "light_color",
        label: "Light color",
        kind: ParamKind::Color {
            default: Rgba::WHITE,
        },
    },
];

const RIM_START: f32 = 0.55;
const RIM_END: f32 = 0.95;
const RIM_STRENGTH: f32 = 0.6;

pub struct DynamicLighting;

impl ShaderModule for DynamicLighting {
    fn info(&self) -> ShaderInfo {
        ShaderInfo {
            id: "dynamic",
            name: "Dynamic Lighting",
            category: ShaderCategory::Lighting,
            requires_normals: true,
            requires_geometry: true,
        }
    }

    fn parameter_schema(&self) -> &'static [ParamSpec] {
        SCHEMA
    }

    fn process(&self, batch: &mut FaceBatch, params: &ShaderParams) -> Result<(), ShaderError> {
        let yaw = (params.number("yaw", 25.0) as f32).to_radians();
        let pitch = (params.number("pitch", 25.0) as f32).to_radians();
        let diffuse_intensity = params.number("diffuse", 60.0) as f32 / 100.0;
        let ambient = params.number("ambient", 30.0) as f32 / 100.0;
        let diameter = params.number("diameter", 100.0) as f32;
        let rim_enabled = params.boolean("rim_enabled", false);
        let light_color = params.color("light_color", Rgba::WHITE);

        let light_dir = Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalize_or_zero();
        let lr = light_color.r as f32 / 255.0;
        let lg = light_color.g as f32 / 255.0;
        let lb = light_color.b as f32 / 255.0;

        let exponent = 1.0 + (1.0 - diffuse_intensity) * 3.0;
        let view = batch.frame.view_dir.normalize_or_zero();
        let middle = batch.frame.middle;
        let radius = diameter * 0.5;

        for face in &mut batch.faces {
            let ndotl = face.normal.dot(light_dir).max(0.0);
            let mut diffuse = ndotl.powf(exponent);

            // Cone falloff: brightness fades with perpendicular distance
            // from the light axis through the model middle.
            if radius > 0.0 {
                let to_voxel = face.voxel_pos - middle;
                let along = to_voxel.dot(light_dir);
                let perp_dist = (to_voxel - along * light_dir).length();
                diffuse *= (1.0 - perp_dist / radius).max(0.0);
            }
            diffuse *= diffuse_intensity;

            let mut r = face.color.r as f32 * (ambient + diffuse * lr);
            let mut g = face.color.g as f32 * (ambient + diffuse * lg);
            let mut b = face.color.b as f32 * (ambient + diffuse * lb);

            if rim_enabled {
                let ndotv = face.normal.dot(view);
                if ndotv > 0.0 {
                    let edge = 1.0 - ndotv;
                    if edge > RIM_START {
                        let t = ((edge - RIM_START) / (RIM_END - RIM_START)).min(1.0);
                        let t = t * t * (3.0 - 2.0 * t);
                        let rim = RIM_STRENGTH * t;
                        r += lr * rim * 255.0;
                        g += lg * rim * 255.0;
                        b += lb * rim * 255.0;
                    }
                }
            }

            let clamp = |v: f32| (v + 0.5).clamp(0.0, 255.0) as u8;
            face.color.r = clamp(r);
            face.color.g = clamp(g);
            face.color.b = clamp(b);
        }
        Ok(())
    }
}
