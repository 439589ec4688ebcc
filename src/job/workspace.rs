use std::path::{Path, PathBuf};

use anyhow::Context as _;
use uuid::Uuid;

use crate::foundation::error::{ReelError, ReelResult};

/// Per-job filesystem layout.
///
/// ```text
/// <temp_root>/<id>/frames/frame-<i>.png
/// <temp_root>/<id>/segments/video-<i>.mp4
/// <temp_root>/<id>/audio.<ext>
/// <output_dir>/video-<id>.mp4
/// ```
#[derive(Clone, Debug)]
pub struct JobWorkspace {
    id: Uuid,
    temp_dir: PathBuf,
    output_path: PathBuf,
}

impl JobWorkspace {
    /// Compute the layout for job `id` without touching the filesystem.
    pub fn new(id: Uuid, temp_root: &Path, output_dir: &Path) -> Self {
        Self {
            id,
            temp_dir: temp_root.join(id.to_string()),
            output_path: output_dir.join(format!("video-{id}.mp4")),
        }
    }

    /// Use an explicit final output path instead of `<output_dir>/video-<id>.mp4`.
    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    /// Create the temp tree and the output directory.
    pub fn create(&self) -> ReelResult<()> {
        for dir in [self.frame_dir(), self.segment_dir()] {
            std::fs::create_dir_all(&dir).map_err(|e| {
                ReelError::filesystem(format!("create '{}': {e}", dir.display()))
            })?;
        }
        if let Some(parent) = self.output_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ReelError::filesystem(format!("create '{}': {e}", parent.display()))
            })?;
        }
        Ok(())
    }

    /// Job id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Root of everything this job owns.
    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// Directory of the indexed PNG frames.
    pub fn frame_dir(&self) -> PathBuf {
        self.temp_dir.join("frames")
    }

    /// Directory of intermediate segment videos.
    pub fn segment_dir(&self) -> PathBuf {
        self.temp_dir.join("segments")
    }

    /// Path of segment `index`.
    pub fn segment_path(&self, index: usize) -> PathBuf {
        self.segment_dir().join(format!("video-{index}.mp4"))
    }

    /// Audio temp file, keeping the source's extension when it has a plausible one.
    pub fn audio_path(&self, source: &str) -> PathBuf {
        self.temp_dir.join(format!("audio.{}", audio_extension(source)))
    }

    /// Final output video.
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Remove the temp tree. Failures are logged, never returned.
    pub fn cleanup(&self) {
        if !self.temp_dir.exists() {
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.temp_dir)
            .with_context(|| format!("remove job temp dir '{}'", self.temp_dir.display()))
        {
            tracing::warn!(job_id = %self.id, error = %format!("{e:#}"), "temp cleanup failed");
        }
    }

    /// Delete a partially written output. Failures are logged.
    pub fn discard_output(&self) {
        match std::fs::remove_file(&self.output_path) {
            Ok(()) => {
                tracing::debug!(job_id = %self.id, path = %self.output_path.display(), "removed partial output");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(job_id = %self.id, error = %e, "failed to remove partial output");
            }
        }
    }
}

fn audio_extension(source: &str) -> String {
    let path_part = source.split(['?', '#']).next().unwrap_or(source);
    // Only the path of a URL names a file; a bare host never does.
    let path_part = match path_part.split_once("://") {
        Some((_, rest)) => rest.split_once('/').map_or("", |(_, path)| path),
        None => path_part,
    };
    let file_name = path_part.rsplit('/').next().unwrap_or(path_part);
    match file_name.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && (1..=5).contains(&ext.len())
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            ext.to_ascii_lowercase()
        }
        _ => "mp3".to_string(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/job/workspace.rs"]
mod tests;
