/// Interactive viewer: drag to rotate, scroll to zoom, keys to switch
/// projection and shading. Renders through the backend arbiter so the
/// threaded path is exercised when available.
use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Instant;

use voxelview::*;
use winit::{
    event::*,
    event_loop::{ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::WindowBuilder,
};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    println!("=== Voxelview ===");
    println!("Controls:");
    println!("  Drag      - Rotate model");
    println!("  Scroll    - Zoom");
    println!("  P         - Toggle perspective / orthographic");
    println!("  L         - Cycle lighting (none / basic / dynamic)");
    println!("  I         - Toggle isometric shading");
    println!("  O         - Toggle outline");
    println!("  ESC       - Exit");
    println!();

    let event_loop = EventLoop::new().unwrap();
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Voxelview")
            .with_inner_size(winit::dpi::LogicalSize::new(800, 600))
            .build(&event_loop)
            .unwrap(),
    );

    let context = softbuffer::Context::new(window.clone()).unwrap();
    let mut surface = softbuffer::Surface::new(&context, window.clone()).unwrap();

    let model = sample_model();
    let mut arbiter = BackendArbiter::new();
    println!(
        "Backend: {}",
        if arbiter.is_accelerated() {
            "threaded"
        } else {
            "software"
        }
    );

    let mut rotation = Rotation::new(30.0, 45.0, 0.0);
    let mut scale = 12.0f32;
    let mut perspective = false;
    let mut lighting_mode = 1u8;
    let mut iso_enabled = false;
    let mut outline_enabled = false;

    let mut dragging = false;
    let mut last_mouse_pos: Option<(f64, f64)> = None;

    let mut frame_count = 0u32;
    let mut fps_timer = Instant::now();

    event_loop
        .run(move |event, elwt| {
            elwt.set_control_flow(ControlFlow::Poll);

            match event {
                Event::WindowEvent { event, .. } => match event {
                    WindowEvent::CloseRequested => {
                        elwt.exit();
                    }
                    WindowEvent::KeyboardInput { event, .. } => {
                        let pressed = event.state == ElementState::Pressed;
                        if let PhysicalKey::Code(keycode) = event.physical_key {
                            match keycode {
                                KeyCode::KeyP if pressed => {
                                    perspective = !perspective;
                                    println!(
                                        "Projection: {}",
                                        if perspective { "perspective" } else { "orthographic" }
                                    );
                                }
                                KeyCode::KeyL if pressed => {
                                    lighting_mode = (lighting_mode + 1) % 3;
                                    println!(
                                        "Lighting: {}",
                                        ["none", "basic", "dynamic"][lighting_mode as usize]
                                    );
                                }
                                KeyCode::KeyI if pressed => {
                                    iso_enabled = !iso_enabled;
                                    println!("Iso shading: {}", if iso_enabled { "ON" } else { "OFF" });
                                }
                                KeyCode::KeyO if pressed => {
                                    outline_enabled = !outline_enabled;
                                    println!("Outline: {}", if outline_enabled { "ON" } else { "OFF" });
                                }
                                KeyCode::Escape if pressed => {
                                    elwt.exit();
                                }
                                _ => {}
                            }
                        }
                    }
                    WindowEvent::MouseInput { state, button, .. } => {
                        if button == MouseButton::Left {
                            dragging = state == ElementState::Pressed;
                            if !dragging {
                                last_mouse_pos = None;
                            }
                        }
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        if dragging {
                            if let Some(last_pos) = last_mouse_pos {
                                let dx = (position.x - last_pos.0) as f32;
                                let dy = (position.y - last_pos.1) as f32;
                                rotation.y_deg += dx * 0.5;
                                rotation.x_deg += dy * 0.5;
                            }
                            last_mouse_pos = Some((position.x, position.y));
                        }
                    }
                    WindowEvent::MouseWheel { delta, .. } => {
                        let step = match delta {
                            MouseScrollDelta::LineDelta(_, y) => y,
                            MouseScrollDelta::PixelDelta(p) => p.y as f32 / 40.0,
                        };
                        scale = (scale * (1.0 + step * 0.1)).clamp(0.25, 64.0);
                    }
                    WindowEvent::RedrawRequested => {
                        let size = window.inner_size();
                        if size.width == 0 || size.height == 0 {
                            return;
                        }

                        let params = ViewParams {
                            rotation,
                            scale,
                            projection: if perspective {
                                Projection::Perspective {
                                    fov_degrees: 45.0,
                                    reference: DepthReference::Middle,
                                }
                            } else {
                                Projection::Orthographic
                            },
                            width: size.width,
                            height: size.height,
                            background: Rgba::TRANSPARENT,
                            outline: outline_enabled.then(OutlineSettings::default),
                            downsample: DownsampleMode::BoxAverage,
                            shader_stack: shader_stack(lighting_mode, iso_enabled),
                        };
                        let frame = arbiter.render(&model, &params);

                        surface
                            .resize(
                                NonZeroU32::new(frame.width).unwrap(),
                                NonZeroU32::new(frame.height).unwrap(),
                            )
                            .unwrap();
                        let mut buffer = surface.buffer_mut().unwrap();
                        for (dst, px) in buffer.iter_mut().zip(frame.pixels.chunks_exact(4)) {
                            *dst = ((px[0] as u32) << 16) | ((px[1] as u32) << 8) | px[2] as u32;
                        }
                        buffer.present().unwrap();

                        frame_count += 1;
                        if fps_timer.elapsed().as_secs() >= 1 {
                            println!("FPS: {frame_count}");
                            frame_count = 0;
                            fps_timer = Instant::now();
                        }
                    }
                    _ => {}
                },
                Event::AboutToWait => {
                    window.request_redraw();
                }
                _ => {}
            }
        })
        .unwrap();
}

fn shader_stack(lighting_mode: u8, iso_enabled: bool) -> ShaderStackConfig {
    let mut stack = ShaderStackConfig::default();
    match lighting_mode {
        1 => stack.lighting.push(ShaderEntry::new("basic")),
        2 => stack.lighting.push(
            ShaderEntry::new("dynamic")
                .with_params(ShaderParams::new().set_bool("rim_enabled", true)),
        ),
        _ => {}
    }
    if iso_enabled {
        stack.fx.push(ShaderEntry::new("iso"));
    }
    stack
}

/// A small house-like test model: colored walls, a roof ridge and a
/// hollow interior so adjacency culling has something to remove.
fn sample_model() -> VoxelModel {
    let mut model = VoxelModel::new();
    let wall = Rgba::opaque(205, 170, 125);
    let roof = Rgba::opaque(160, 60, 50);
    let floor = Rgba::opaque(110, 110, 120);

    for x in 0..9 {
        for z in 0..9 {
            model.push(Voxel::new(x, 0, z, floor));
            for y in 1..5 {
                let edge = x == 0 || x == 8 || z == 0 || z == 8;
                if edge && !(y < 3 && x == 4 && z == 0) {
                    model.push(Voxel::new(x, y, z, wall));
                }
            }
        }
    }
    for step in 0..5 {
        for x in step..9 - step {
            for z in step..9 - step {
                let rim = x == step || x == 8 - step || z == step || z == 8 - step;
                if rim || step == 4 {
                    model.push(Voxel::new(x, 5 + step, z, roof));
                }
            }
        }
    }
    model
}
