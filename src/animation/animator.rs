//! Timing-driven caption animator.
//!
//! The animator walks a [`WordTimeline`] one word per [`KeyframeAnimator::advance`] call. Each
//! advance first asks its [`CaptureTarget`] to record the *previous* visual state for the time it
//! must stay on screen (`word.start - keyframe_begin`), then builds the new caption, pushes the
//! older stack away, and runs the entrance animation on the scene clock.
//!
//! The trailing hold of the last word is left to the caller (see [`KeyframeAnimator::final_hold_ms`]).

use crate::animation::ease::Ease;
use crate::animation::tween::NodeProps;
use crate::foundation::core::{Fps, Vec2};
use crate::foundation::error::{ReelError, ReelResult};
use crate::scene::caption::{CaptionStyle, LINE_GAP_PX};
use crate::scene::graph::{Caption, NodeId, PruneOutcome, SceneGraph};
use crate::timeline::word::{Word, WordTimeline};

/// Group nesting depth above which the oldest branch is pruned.
pub const MAX_GROUP_DEPTH: usize = 10;
/// Steps down the group chain at which pruning cuts.
pub const PRUNE_DEPTH: usize = 9;
/// Every n-th word flies the previous stack out instead of shrinking it.
pub const FLY_OUT_EVERY: usize = 5;

const ENTRANCE_FROM_SCALE: f64 = 0.7;
const ENTRANCE_TO_SCALE: f64 = 1.5;

/// Receives one snapshot request per visual transition.
pub trait CaptureTarget {
    /// Record the scene as it looks at scene time `at_ms`, held for `duration_ms`.
    ///
    /// `duration_ms` may be negative when word windows overlap; implementations clamp it.
    fn capture(&mut self, scene: &SceneGraph, at_ms: u64, duration_ms: i64) -> ReelResult<()>;
}

/// Animator tuning.
#[derive(Clone, Debug)]
pub struct AnimatorOpts {
    /// Caption geometry and colors.
    pub style: CaptionStyle,
    /// Entrance animation length (scale + fade).
    pub entrance_ms: u64,
    /// Length of the transform applied to the previous stack.
    pub transition_ms: u64,
    /// Output frame rate, used for tween frames.
    pub fps: Fps,
    /// Capture zero-duration frames while the entrance animation runs.
    pub tween_frames: bool,
}

impl Default for AnimatorOpts {
    fn default() -> Self {
        Self {
            style: CaptionStyle::default(),
            entrance_ms: 300,
            transition_ms: 300,
            fps: Fps { num: 30, den: 1 },
            tween_frames: false,
        }
    }
}

/// Walks a word timeline and drives per-word visual transitions.
pub struct KeyframeAnimator<'w> {
    words: &'w [Word],
    opts: AnimatorOpts,
    scene: SceneGraph,

    current_index: usize,
    keyframe_begin: u64,
    keyframe_end: u64,
    clock_ms: u64,
    // Wall time already occupied by tween frames and not yet taken out of a hold. Never negative.
    tween_debt_ms: i64,

    last_group: Option<NodeId>,
    groups_created: u64,
}

impl<'w> KeyframeAnimator<'w> {
    /// Create an animator over `timeline` with an empty scene.
    pub fn new(timeline: &'w WordTimeline, opts: AnimatorOpts) -> Self {
        Self {
            words: timeline.words(),
            opts,
            scene: SceneGraph::new(),
            current_index: 0,
            keyframe_begin: 0,
            keyframe_end: 0,
            clock_ms: 0,
            tween_debt_ms: 0,
            last_group: None,
            groups_created: 0,
        }
    }

    /// Index of the next word to animate.
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// `true` once every word has been advanced.
    pub fn is_finished(&self) -> bool {
        self.current_index >= self.words.len()
    }

    /// Current scene.
    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    /// Scene clock: animation time elapsed, independent of word timing.
    pub fn clock_ms(&self) -> u64 {
        self.clock_ms
    }

    /// Groups created so far.
    pub fn groups_created(&self) -> u64 {
        self.groups_created
    }

    /// Outermost group, wrapping every caption still on screen.
    pub fn last_group(&self) -> Option<NodeId> {
        self.last_group
    }

    /// Hold for the last word, to be captured by the caller after the final advance.
    pub fn final_hold_ms(&self) -> i64 {
        signed_diff(self.keyframe_end, self.keyframe_begin).saturating_sub(self.tween_debt_ms)
    }

    /// Animate the next word, returning the new `current_index`.
    pub fn advance(&mut self, target: &mut dyn CaptureTarget) -> ReelResult<usize> {
        let index = self.current_index;
        let word = self.words.get(index).ok_or_else(|| {
            ReelError::validation("animator advanced past the end of the word timeline")
        })?;

        // Debt larger than this hold carries into the next one.
        let raw = signed_diff(word.start, self.keyframe_begin);
        let covered = raw.clamp(0, self.tween_debt_ms);
        target.capture(&self.scene, self.clock_ms, raw - covered)?;
        self.tween_debt_ms -= covered;

        self.keyframe_begin = word.start;
        self.keyframe_end = word.end;

        let style = &self.opts.style;
        let metrics = style.metrics(&word.text);
        let caption = self.scene.create_caption(
            Caption {
                text: word.text.clone(),
                font_size: metrics.font_size,
                color: style.color_for(word.is_hl),
                max_width: style.line_width() as f32,
            },
            NodeProps::at(metrics.anchor)
                .with_scale(ENTRANCE_FROM_SCALE)
                .with_opacity(0.0),
        );
        self.scene.append(self.scene.root(), caption)?;
        let entrance_end = self.scene.animate(
            caption,
            NodeProps::at(metrics.anchor).with_scale(ENTRANCE_TO_SCALE),
            self.clock_ms,
            self.opts.entrance_ms,
            Ease::OutQuad,
        )?;

        let prev = self.last_group;
        if let Some(prev) = prev {
            self.push_back_previous(prev, index, metrics.char_width)?;

            if self.scene.chain_depth(prev) > MAX_GROUP_DEPTH
                && let PruneOutcome::Pruned(removed) = self.scene.prune_branch(prev, PRUNE_DEPTH)
            {
                tracing::trace!(index, removed, "pruned deep caption branch");
            }
        }

        let group = self.scene.create_group();
        self.scene.append(self.scene.root(), group)?;
        if let Some(prev) = prev {
            self.scene.append(group, prev)?;
        }
        self.scene.append(group, caption)?;
        self.last_group = Some(group);
        self.groups_created += 1;

        let window_ms = match self.words.get(index + 1) {
            Some(next) => next.start.saturating_sub(word.start),
            None => word.end.saturating_sub(word.start),
        };
        self.finish_entrance(target, entrance_end, window_ms)?;

        self.current_index += 1;
        Ok(self.current_index)
    }

    /// Fly-out rotate every [`FLY_OUT_EVERY`]th word, shrink-and-rise otherwise.
    fn push_back_previous(
        &mut self,
        prev: NodeId,
        index: usize,
        char_width: f64,
    ) -> ReelResult<()> {
        let padding = self.opts.style.padding;
        let y = self.opts.style.baseline_y();
        let odd = index % 2 == 1;
        let current = self.scene.props_at(prev, self.clock_ms)?;
        let mut to = current;

        if index.is_multiple_of(FLY_OUT_EVERY) {
            let origin = if odd {
                Vec2::new(padding, y)
            } else {
                Vec2::new(padding + self.opts.style.line_width(), y)
            };
            self.scene.set_origin(prev, origin)?;
            to.translate.x += if odd { -padding / 2.0 } else { padding / 2.0 };
            to.rotate_deg = if odd { -90.0 } else { 90.0 };
        } else {
            let s = if odd { 0.7 } else { 1.2 };
            self.scene.set_origin(prev, Vec2::new(padding, y))?;
            to.scale = Vec2::new(s, s);
            to.translate.y -= char_width + LINE_GAP_PX;
        }

        self.scene.animate(
            prev,
            to,
            self.clock_ms,
            self.opts.transition_ms,
            Ease::Linear,
        )?;
        Ok(())
    }

    /// Await the entrance: advance the scene clock, optionally snapshotting in-between states.
    ///
    /// Tween frames never run past `window_ms` of wall time (the gap to the next word, or the
    /// word's own length for the last one), counting debt still owed by earlier tweens.
    fn finish_entrance(
        &mut self,
        target: &mut dyn CaptureTarget,
        entrance_end: u64,
        window_ms: u64,
    ) -> ReelResult<()> {
        let start = self.clock_ms;
        if self.opts.tween_frames {
            let fps = self.opts.fps;
            let owed = u64::try_from(self.tween_debt_ms).unwrap_or(0);
            let room = fps.ms_to_frames(window_ms.saturating_sub(owed));
            let frames = fps
                .ms_to_frames(entrance_end.saturating_sub(start))
                .saturating_sub(1)
                .min(room);
            for k in 1..=frames {
                target.capture(&self.scene, start + fps.frames_to_ms(k), 0)?;
            }
            let occupied = i64::try_from(fps.frames_to_ms(frames)).unwrap_or(i64::MAX);
            self.tween_debt_ms = self.tween_debt_ms.saturating_add(occupied);
        }
        self.clock_ms = entrance_end.max(start + self.opts.transition_ms);
        Ok(())
    }
}

/// `a - b` in signed milliseconds, saturating at the `i64` bounds.
fn signed_diff(a: u64, b: u64) -> i64 {
    let diff = i128::from(a) - i128::from(b);
    i64::try_from(diff).unwrap_or(if diff < 0 { i64::MIN } else { i64::MAX })
}

#[cfg(test)]
#[path = "../../tests/unit/animation/animator.rs"]
mod tests;
