use super::*;
use crate::animation::tween::NodeProps;
use crate::foundation::core::Vec2;
use crate::render::text::{CaptionFont, load_caption_font};

const BG: Rgba8 = Rgba8::rgb(0x18, 0x18, 0x18);

fn canvas() -> Canvas {
    Canvas {
        width: 64,
        height: 64,
    }
}

fn surface() -> Option<CpuSurface> {
    let font = load_caption_font(None).ok()?;
    Some(CpuSurface::new(canvas(), BG, &font).unwrap())
}

fn is_background(frame: &FrameRGBA) -> bool {
    frame
        .data
        .chunks_exact(4)
        .all(|px| px == [BG.r, BG.g, BG.b, 255])
}

fn scene_with_caption(opacity: f64) -> SceneGraph {
    let mut scene = SceneGraph::new();
    let c = scene.create_caption(
        Caption {
            text: "Hi".to_string(),
            font_size: 24.0,
            color: Rgba8::rgb(255, 255, 255),
            max_width: 60.0,
        },
        NodeProps::at(Vec2::new(4.0, 40.0)).with_opacity(opacity),
    );
    scene.append(scene.root(), c).unwrap();
    scene
}

#[test]
fn odd_canvas_is_rejected() {
    let odd = Canvas {
        width: 63,
        height: 64,
    };
    assert!(CpuSurface::new(odd, BG, &CaptionFont::new(Vec::new(), 0)).is_err());
}

#[test]
fn empty_scene_is_solid_background() {
    let Some(mut s) = surface() else {
        eprintln!("skipping: no system font available");
        return;
    };
    let frame = s.snapshot(&SceneGraph::new(), 0).unwrap();
    assert_eq!((frame.width, frame.height), (64, 64));
    assert_eq!(frame.data.len(), 64 * 64 * 4);
    assert!(frame.premultiplied);
    assert!(is_background(&frame));
}

#[test]
fn visible_caption_paints_pixels() {
    let Some(mut s) = surface() else {
        eprintln!("skipping: no system font available");
        return;
    };
    let frame = s.snapshot(&scene_with_caption(1.0), 0).unwrap();
    assert!(!is_background(&frame));
}

#[test]
fn transparent_caption_is_skipped() {
    let Some(mut s) = surface() else {
        eprintln!("skipping: no system font available");
        return;
    };
    let frame = s.snapshot(&scene_with_caption(0.0), 0).unwrap();
    assert!(is_background(&frame));
}

#[test]
fn factory_creates_independent_surfaces() {
    let Ok(font) = load_caption_font(None) else {
        eprintln!("skipping: no system font available");
        return;
    };
    let factory = CpuSurfaceFactory::new(canvas(), BG, font).unwrap();
    let a = factory.create_surface().unwrap();
    let b = factory.create_surface().unwrap();
    assert_eq!(a.canvas(), b.canvas());
}
