/// Keyframe animator that walks the word timeline.
pub mod animator;
/// Easing curves.
pub mod ease;
/// Prop interpolation on the scene clock.
pub mod tween;
