use crate::animation::ease::Ease;
use crate::foundation::core::Vec2;

/// Linear interpolation for animatable values.
pub trait Lerp: Sized {
    /// Interpolate from `a` to `b` with normalized factor `t` in `[0, 1]`.
    fn lerp(a: &Self, b: &Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        a + (b - a) * t
    }
}

impl Lerp for Vec2 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Vec2::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
    }
}

/// Animatable visual properties of a scene node.
///
/// Rotation and scale pivot around the node's transform origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeProps {
    /// Offset in parent space.
    pub translate: Vec2,
    /// Per-axis scale.
    pub scale: Vec2,
    /// Clockwise rotation in degrees.
    pub rotate_deg: f64,
    /// Opacity in `[0, 1]`, multiplied down the tree.
    pub opacity: f64,
}

impl Default for NodeProps {
    fn default() -> Self {
        Self {
            translate: Vec2::ZERO,
            scale: Vec2::new(1.0, 1.0),
            rotate_deg: 0.0,
            opacity: 1.0,
        }
    }
}

impl NodeProps {
    /// Identity props placed at `translate`.
    pub fn at(translate: Vec2) -> Self {
        Self {
            translate,
            ..Self::default()
        }
    }

    /// Copy with a uniform scale.
    pub fn with_scale(mut self, s: f64) -> Self {
        self.scale = Vec2::new(s, s);
        self
    }

    /// Copy with an opacity.
    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }
}

impl Lerp for NodeProps {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Self {
            translate: <Vec2 as Lerp>::lerp(&a.translate, &b.translate, t),
            scale: <Vec2 as Lerp>::lerp(&a.scale, &b.scale, t),
            rotate_deg: <f64 as Lerp>::lerp(&a.rotate_deg, &b.rotate_deg, t),
            opacity: <f64 as Lerp>::lerp(&a.opacity, &b.opacity, t),
        }
    }
}

/// One-shot transition between two prop states on the scene clock.
///
/// Holds `from` before `start_ms` and `to` after it ends (fill both ways).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tween {
    /// State before and at `start_ms`.
    pub from: NodeProps,
    /// State at and after `start_ms + duration_ms`.
    pub to: NodeProps,
    /// Scene clock start.
    pub start_ms: u64,
    /// Transition length; zero jumps straight to `to`.
    pub duration_ms: u64,
    /// Progress mapping.
    pub ease: Ease,
}

impl Tween {
    /// Sample the tween at scene time `at_ms`.
    pub fn sample(&self, at_ms: u64) -> NodeProps {
        if at_ms < self.start_ms {
            return self.from;
        }
        if self.duration_ms == 0 || at_ms >= self.end_ms() {
            return self.to;
        }
        let t = (at_ms - self.start_ms) as f64 / self.duration_ms as f64;
        NodeProps::lerp(&self.from, &self.to, self.ease.apply(t))
    }

    /// Scene time at which the tween settles.
    pub fn end_ms(&self) -> u64 {
        self.start_ms.saturating_add(self.duration_ms)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/tween.rs"]
mod tests;
