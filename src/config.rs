use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;

use crate::animation::animator::AnimatorOpts;
use crate::encode::assemble::AssembleOpts;
use crate::encode::ffmpeg::EncodeSettings;
use crate::foundation::core::{Canvas, Fps, Rgba8};
use crate::foundation::error::{ReelError, ReelResult};
use crate::job::pipeline::PipelineOpts;
use crate::scene::caption::CaptionStyle;

/// Every tunable of a render, loadable from TOML.
///
/// Missing keys take their defaults, so an empty file is a valid config.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frame rate.
    pub fps: u32,
    /// Horizontal caption inset.
    pub padding: f64,
    /// Regular caption color, `#RRGGBB`.
    pub text_color: String,
    /// Highlighted caption color.
    pub highlight_color: String,
    /// Canvas background.
    pub background: String,
    /// Caption entrance animation length.
    pub entrance_ms: u64,
    /// Frames per encoder invocation before switching to segment-and-concat.
    pub max_frames_per_segment: usize,
    /// Where per-job temp trees are created.
    pub temp_root: PathBuf,
    /// Where final videos land.
    pub output_dir: PathBuf,
    /// Caption font; falls back to a system sans-serif.
    pub font_path: Option<PathBuf>,
    /// Audio download deadline.
    pub audio_timeout_secs: u64,
    /// Per-invocation encoder deadline; `0` disables it.
    pub encode_timeout_secs: u64,
    /// Encode segments concurrently.
    pub parallel_segments: bool,
    /// Worker threads for parallel segments; `0` lets rayon decide.
    pub threads: usize,
    /// Snapshot intermediate states of each entrance animation.
    pub tween_frames: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        let tmp = std::env::temp_dir().join("wordreel");
        Self {
            width: 540,
            height: 960,
            fps: 30,
            padding: 70.0,
            text_color: "#FFFFFF".to_string(),
            highlight_color: "#FF0000".to_string(),
            background: "#181818".to_string(),
            entrance_ms: 300,
            max_frames_per_segment: 50,
            temp_root: tmp.clone(),
            output_dir: tmp,
            font_path: None,
            audio_timeout_secs: 30,
            encode_timeout_secs: 600,
            parallel_segments: false,
            threads: 0,
            tween_frames: false,
        }
    }
}

impl RenderConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(s: &str) -> ReelResult<Self> {
        toml::from_str(s).map_err(|e| ReelError::validation(format!("invalid config: {e}")))
    }

    /// Read and parse a TOML file.
    pub fn from_toml_path(path: &Path) -> ReelResult<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        Self::from_toml_str(&raw)
    }

    /// Reject values no render can succeed with.
    pub fn validate(&self) -> ReelResult<()> {
        self.canvas().validate()?;
        if self.fps == 0 {
            return Err(ReelError::validation("fps must be > 0"));
        }
        if self.max_frames_per_segment == 0 {
            return Err(ReelError::validation("max_frames_per_segment must be > 0"));
        }
        if !self.padding.is_finite()
            || self.padding < 0.0
            || self.padding * 2.0 >= f64::from(self.width)
        {
            return Err(ReelError::validation(
                "padding must be >= 0 and leave room for a caption line",
            ));
        }
        self.text_color()?;
        self.highlight_color()?;
        self.background_color()?;
        Ok(())
    }

    /// Output canvas.
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    /// Output frame rate.
    pub fn fps(&self) -> ReelResult<Fps> {
        Fps::new(self.fps, 1)
    }

    /// Parsed regular caption color.
    pub fn text_color(&self) -> ReelResult<Rgba8> {
        Rgba8::from_hex(&self.text_color)
    }

    /// Parsed highlight color.
    pub fn highlight_color(&self) -> ReelResult<Rgba8> {
        Rgba8::from_hex(&self.highlight_color)
    }

    /// Parsed background color.
    pub fn background_color(&self) -> ReelResult<Rgba8> {
        Rgba8::from_hex(&self.background)
    }

    /// Caption geometry and colors.
    pub fn style(&self) -> ReelResult<CaptionStyle> {
        Ok(CaptionStyle {
            canvas: self.canvas(),
            padding: self.padding,
            color: self.text_color()?,
            highlight: self.highlight_color()?,
        })
    }

    /// Everything a job needs besides its collaborators.
    pub fn pipeline_opts(&self) -> ReelResult<PipelineOpts> {
        self.validate()?;
        Ok(PipelineOpts {
            animator: AnimatorOpts {
                style: self.style()?,
                entrance_ms: self.entrance_ms,
                transition_ms: self.entrance_ms,
                fps: self.fps()?,
                tween_frames: self.tween_frames,
            },
            background: self.background_color()?,
            assemble: AssembleOpts {
                max_frames_per_segment: self.max_frames_per_segment,
                parallel: self.parallel_segments,
                threads: (self.threads > 0).then_some(self.threads),
            },
        })
    }

    /// Fixed encoder output parameters.
    pub fn encode_settings(&self) -> ReelResult<EncodeSettings> {
        Ok(EncodeSettings {
            canvas: self.canvas(),
            fps: self.fps()?,
            threads_per_encode: 1,
            timeout: (self.encode_timeout_secs > 0)
                .then(|| Duration::from_secs(self.encode_timeout_secs)),
        })
    }

    /// Audio download deadline.
    pub fn audio_timeout(&self) -> Duration {
        Duration::from_secs(self.audio_timeout_secs.max(1))
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
