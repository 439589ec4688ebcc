use super::*;

fn entrance(start_ms: u64) -> Tween {
    Tween {
        from: NodeProps::default().with_scale(0.7).with_opacity(0.0),
        to: NodeProps::default().with_scale(1.5),
        start_ms,
        duration_ms: 300,
        ease: Ease::Linear,
    }
}

#[test]
fn holds_endpoints_outside_window() {
    let tw = entrance(1000);
    assert_eq!(tw.sample(0), tw.from);
    assert_eq!(tw.sample(1000), tw.from);
    assert_eq!(tw.sample(1300), tw.to);
    assert_eq!(tw.sample(99_999), tw.to);
    assert_eq!(tw.end_ms(), 1300);
}

#[test]
fn linear_midpoint_interpolates_every_prop() {
    let mid = entrance(0).sample(150);
    assert!((mid.scale.x - 1.1).abs() < 1e-9);
    assert!((mid.opacity - 0.5).abs() < 1e-9);
}

#[test]
fn zero_duration_jumps_to_target() {
    let mut tw = entrance(10);
    tw.duration_ms = 0;
    assert_eq!(tw.sample(10), tw.to);
    assert_eq!(tw.sample(9), tw.from);
}
