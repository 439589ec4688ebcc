use std::path::Path;

use crate::animation::animator::{AnimatorOpts, CaptureTarget, KeyframeAnimator};
use crate::encode::ffmpeg::ensure_parent_dir;
use crate::foundation::core::Rgba8;
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::backend::RenderSurface;
use crate::scene::graph::SceneGraph;
use crate::timeline::word::WordTimeline;

use super::recorder::write_opaque_png;

struct Discard;

impl CaptureTarget for Discard {
    fn capture(&mut self, _scene: &SceneGraph, _at_ms: u64, _duration_ms: i64) -> ReelResult<()> {
        Ok(())
    }
}

/// Animate the first `after_words` words and write the resulting scene to `out` as a PNG.
///
/// `after_words == 0` yields the empty opening frame. Intermediate captures are skipped, so
/// nothing but the requested frame touches the disk.
#[tracing::instrument(skip_all, fields(after_words, out = %out.display()))]
pub fn render_still(
    timeline: &WordTimeline,
    opts: AnimatorOpts,
    surface: &mut dyn RenderSurface,
    background: Rgba8,
    after_words: usize,
    out: &Path,
) -> ReelResult<()> {
    if after_words > timeline.len() {
        return Err(ReelError::validation(format!(
            "cannot render after {after_words} words; timeline has {}",
            timeline.len()
        )));
    }

    let mut animator = KeyframeAnimator::new(timeline, opts);
    for _ in 0..after_words {
        animator.advance(&mut Discard)?;
    }

    let frame = surface.snapshot(animator.scene(), animator.clock_ms())?;
    ensure_parent_dir(out)?;
    write_opaque_png(&frame, surface.canvas(), background, &mut Vec::new(), out)
}

#[cfg(test)]
#[path = "../../tests/unit/capture/still.rs"]
mod tests;
