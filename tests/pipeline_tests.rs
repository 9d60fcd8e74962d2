/// End-to-end pipeline tests: model + view params in, finished RGBA
/// frame out.
use voxelview::*;

fn pixel(frame: &Frame, x: u32, y: u32) -> Rgba {
    let off = ((y * frame.width + x) * 4) as usize;
    Rgba::new(
        frame.pixels[off],
        frame.pixels[off + 1],
        frame.pixels[off + 2],
        frame.pixels[off + 3],
    )
}

fn count_color(frame: &Frame, color: Rgba) -> usize {
    (0..frame.height)
        .flat_map(|y| (0..frame.width).map(move |x| (x, y)))
        .filter(|&(x, y)| pixel(frame, x, y) == color)
        .count()
}

fn head_on(scale: f32, size: u32) -> ViewParams {
    ViewParams {
        scale,
        width: size,
        height: size,
        ..ViewParams::default()
    }
}

#[test]
fn single_voxel_renders_as_centered_square() {
    let mut renderer = Renderer::new();
    let model = VoxelModel::from_voxels(vec![Voxel::new(0, 0, 0, Rgba::opaque(255, 0, 0))]);
    let frame = renderer.render(&model, &head_on(10.0, 64));

    let red = Rgba::opaque(255, 0, 0);
    assert_eq!(count_color(&frame, red), 100, "10x10 red square expected");
    for (x, y) in [(27, 27), (36, 27), (27, 36), (36, 36), (32, 32)] {
        assert_eq!(pixel(&frame, x, y), red, "({x},{y}) inside the square");
    }
    assert!(pixel(&frame, 26, 32).is_transparent(), "left of the square");
    assert!(pixel(&frame, 37, 32).is_transparent(), "right of the square");
}

#[test]
fn stacked_voxels_hide_their_shared_face() {
    let mut renderer = Renderer::new();
    let rear = Rgba::opaque(255, 0, 0);
    let front = Rgba::opaque(0, 255, 0);
    let model = VoxelModel::from_voxels(vec![
        Voxel::new(0, 0, 0, rear),
        Voxel::new(0, 0, 1, front),
    ]);
    let frame = renderer.render(&model, &head_on(10.0, 64));

    // Head-on, only front faces are candidates; the rear voxel's front
    // face is interior so no rear-colored pixel can appear.
    assert_eq!(count_color(&frame, rear), 0, "shared face must be culled");
    assert_eq!(count_color(&frame, front), 100);
}

#[test]
fn enclosed_voxel_never_shows_through() {
    let hidden = Rgba::opaque(1, 2, 3);
    let shell = Rgba::opaque(200, 200, 200);
    let mut voxels = vec![Voxel::new(0, 0, 0, hidden)];
    for x in -1..=1 {
        for y in -1..=1 {
            for z in -1..=1 {
                if (x, y, z) != (0, 0, 0) {
                    voxels.push(Voxel::new(x, y, z, shell));
                }
            }
        }
    }
    let model = VoxelModel::from_voxels(voxels);

    let mut renderer = Renderer::new();
    let params = ViewParams {
        rotation: Rotation::new(33.0, 52.0, 18.0),
        ..head_on(8.0, 96)
    };
    let frame = renderer.render(&model, &params);
    assert_eq!(
        count_color(&frame, hidden),
        0,
        "a fully enclosed voxel has no exposed face at any rotation"
    );
    assert!(count_color(&frame, shell) > 0);
}

#[test]
fn empty_model_is_a_background_frame() {
    let mut renderer = Renderer::new();
    let params = ViewParams {
        background: Rgba::opaque(10, 20, 30),
        ..head_on(4.0, 16)
    };
    let frame = renderer.render(&VoxelModel::new(), &params);
    assert_eq!(frame.width, 16);
    assert_eq!(count_color(&frame, Rgba::opaque(10, 20, 30)), 16 * 16);
}

#[test]
fn fractional_scale_supersamples_to_requested_size() {
    let mut renderer = Renderer::new();
    let model = VoxelModel::from_voxels(vec![Voxel::new(0, 0, 0, Rgba::opaque(255, 0, 0))]);
    let params = ViewParams {
        downsample: DownsampleMode::BoxAverage,
        ..head_on(0.5, 40)
    };
    let frame = renderer.render(&model, &params);
    assert_eq!(frame.width, 40, "output keeps the requested size");
    assert_eq!(frame.height, 40);
    let covered = (0..40u32)
        .flat_map(|y| (0..40u32).map(move |x| (x, y)))
        .filter(|&(x, y)| !pixel(&frame, x, y).is_transparent())
        .count();
    assert!(covered >= 1, "sub-pixel voxel must still land pixels");
    assert!(covered <= 4, "half-scale voxel stays tiny, got {covered}");
}

#[test]
fn outline_rings_the_model_silhouette() {
    let mut renderer = Renderer::new();
    let model = VoxelModel::from_voxels(vec![Voxel::new(0, 0, 0, Rgba::opaque(255, 0, 0))]);
    let outline_color = Rgba::opaque(0, 0, 255);
    let params = ViewParams {
        outline: Some(OutlineSettings {
            color: outline_color,
            placement: OutlinePlacement::Outside,
            kernel: OutlineKernel::FourConnected,
        }),
        ..head_on(10.0, 64)
    };
    let frame = renderer.render(&model, &params);

    // The square spans 27..=36; the ring sits one pixel outside.
    assert_eq!(pixel(&frame, 26, 32), outline_color, "left rim");
    assert_eq!(pixel(&frame, 37, 32), outline_color, "right rim");
    assert_eq!(pixel(&frame, 32, 26), outline_color, "top rim");
    assert_eq!(pixel(&frame, 32, 37), outline_color, "bottom rim");
    // Body pixels are untouched.
    assert_eq!(pixel(&frame, 32, 32), Rgba::opaque(255, 0, 0));
    // And the 10x10 body is still complete.
    assert_eq!(count_color(&frame, Rgba::opaque(255, 0, 0)), 100);
}

#[test]
fn empty_shader_stack_matches_no_stack_bit_for_bit() {
    let model = VoxelModel::from_voxels(vec![
        Voxel::new(0, 0, 0, Rgba::opaque(90, 140, 210)),
        Voxel::new(1, 0, 0, Rgba::opaque(210, 90, 40)),
    ]);
    let params = ViewParams {
        rotation: Rotation::new(15.0, 30.0, 5.0),
        ..head_on(6.0, 80)
    };
    let a = Renderer::new().render(&model, &params);
    let b = Renderer::new().render(&model, &params);
    assert_eq!(a.pixels, b.pixels, "renders of identical inputs are identical");
}

#[test]
fn lighting_stack_darkens_tilted_faces() {
    let model = VoxelModel::from_voxels(vec![Voxel::new(0, 0, 0, Rgba::opaque(200, 200, 200))]);
    let mut params = ViewParams {
        rotation: Rotation::new(30.0, 45.0, 0.0),
        ..head_on(10.0, 64)
    };
    let unlit = Renderer::new().render(&model, &params);

    params.shader_stack.lighting.push(ShaderEntry::new("basic"));
    let lit = Renderer::new().render(&model, &params);

    let unlit_count = count_color(&unlit, Rgba::opaque(200, 200, 200));
    let lit_count = count_color(&lit, Rgba::opaque(200, 200, 200));
    assert!(unlit_count > 0);
    assert!(
        lit_count < unlit_count,
        "tilted faces must be darkened by basic lighting ({lit_count} vs {unlit_count})"
    );
}

#[test]
fn perspective_front_reference_never_exceeds_scale() {
    // With the front plane as the depth reference everything sits at or
    // behind the reference, so nothing renders larger than `scale`
    // pixels per voxel and the model stays comfortably in frame.
    let model = VoxelModel::from_voxels(vec![
        Voxel::new(0, 0, 0, Rgba::opaque(255, 255, 255)),
        Voxel::new(4, 4, 4, Rgba::opaque(255, 255, 255)),
    ]);
    let params = ViewParams {
        rotation: Rotation::new(20.0, 40.0, 0.0),
        projection: Projection::Perspective {
            fov_degrees: 60.0,
            reference: DepthReference::Front,
        },
        ..head_on(10.0, 100)
    };
    let frame = Renderer::new().render(&model, &params);
    let mut covered = 0;
    for y in 0..frame.height {
        for x in 0..frame.width {
            if !pixel(&frame, x, y).is_transparent() {
                covered += 1;
                assert!(
                    (10..90).contains(&x) && (10..90).contains(&y),
                    "pixel ({x},{y}) strays further than the front-plane bound allows"
                );
            }
        }
    }
    assert!(covered > 0, "the model must render");
}
