use std::path::{Path, PathBuf};

use crate::animation::animator::CaptureTarget;
use crate::foundation::core::{Canvas, Rgba8};
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::{flatten_premul_over_bg_to_opaque_rgba8, premul_rgba8};
use crate::job::cancel::CancelToken;
use crate::render::backend::{FrameRGBA, RenderSurface};
use crate::scene::graph::SceneGraph;

/// One persisted frame and how long it stays on screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FrameRecord {
    /// Sequential index; the file is `frame-<index>.png`.
    pub index: usize,
    /// Hold duration, never negative.
    pub duration_ms: u64,
}

/// Path of frame `index` under `frame_dir`.
pub fn frame_path(frame_dir: &Path, index: usize) -> PathBuf {
    frame_dir.join(format!("frame-{index}.png"))
}

/// Writes one opaque PNG per capture request and keeps the ordered record list.
pub struct FrameRecorder<'s> {
    surface: &'s mut dyn RenderSurface,
    frame_dir: PathBuf,
    background: Rgba8,
    cancel: CancelToken,

    records: Vec<FrameRecord>,
    scratch: Vec<u8>,
}

impl<'s> FrameRecorder<'s> {
    /// Record into `frame_dir`, which must already exist.
    pub fn new(
        surface: &'s mut dyn RenderSurface,
        frame_dir: impl Into<PathBuf>,
        background: Rgba8,
        cancel: CancelToken,
    ) -> Self {
        Self {
            surface,
            frame_dir: frame_dir.into(),
            background,
            cancel,
            records: Vec::new(),
            scratch: Vec::new(),
        }
    }

    /// Frames recorded so far, in index order.
    pub fn records(&self) -> &[FrameRecord] {
        &self.records
    }

    /// Frame directory.
    pub fn frame_dir(&self) -> &Path {
        &self.frame_dir
    }
}

/// Flatten `frame` over `background` and write it as an opaque PNG.
pub(crate) fn write_opaque_png(
    frame: &FrameRGBA,
    canvas: Canvas,
    background: Rgba8,
    scratch: &mut Vec<u8>,
    path: &Path,
) -> ReelResult<()> {
    if frame.width != canvas.width || frame.height != canvas.height {
        return Err(ReelError::render(format!(
            "frame size mismatch: got {}x{}, expected {}x{}",
            frame.width, frame.height, canvas.width, canvas.height
        )));
    }

    scratch.resize(frame.data.len(), 0);
    let bg = background.to_array();
    if frame.premultiplied {
        flatten_premul_over_bg_to_opaque_rgba8(&mut scratch[..], &frame.data, bg)?;
    } else {
        let premul: Vec<u8> = frame
            .data
            .chunks_exact(4)
            .flat_map(|px| premul_rgba8(px[0], px[1], px[2], px[3]))
            .collect();
        flatten_premul_over_bg_to_opaque_rgba8(&mut scratch[..], &premul, bg)?;
    }

    image::save_buffer_with_format(
        path,
        &scratch[..],
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .map_err(|e| ReelError::filesystem(format!("write frame '{}': {e}", path.display())))
}

impl CaptureTarget for FrameRecorder<'_> {
    fn capture(&mut self, scene: &SceneGraph, at_ms: u64, duration_ms: i64) -> ReelResult<()> {
        self.cancel.check("capture")?;

        let duration_ms = u64::try_from(duration_ms).unwrap_or(0);
        let index = self.records.len();
        let frame = self.surface.snapshot(scene, at_ms)?;
        let path = frame_path(&self.frame_dir, index);
        write_opaque_png(
            &frame,
            self.surface.canvas(),
            self.background,
            &mut self.scratch,
            &path,
        )?;

        tracing::trace!(index, duration_ms, at_ms, "frame captured");
        self.records.push(FrameRecord { index, duration_ms });
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/recorder.rs"]
mod tests;
