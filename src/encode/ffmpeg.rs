use std::ffi::OsString;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use crate::capture::recorder::{FrameRecord, frame_path};
use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{ReelError, ReelResult};
use crate::job::cancel::CancelToken;

const POLL_INTERVAL: Duration = Duration::from_millis(20);
const FFMPEG: &str = "ffmpeg";

/// Fixed output parameters shared by every encoder invocation of a job.
#[derive(Clone, Debug, PartialEq)]
pub struct EncodeSettings {
    /// Output resolution.
    pub canvas: Canvas,
    /// Output frame rate.
    pub fps: Fps,
    /// `-threads` passed to each invocation.
    pub threads_per_encode: u32,
    /// Kill an invocation that runs longer than this.
    pub timeout: Option<Duration>,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            canvas: Canvas {
                width: 540,
                height: 960,
            },
            fps: Fps { num: 30, den: 1 },
            threads_per_encode: 1,
            timeout: None,
        }
    }
}

/// Encode an ordered run of frames into one video.
#[derive(Clone, Copy, Debug)]
pub struct SegmentRequest<'a> {
    /// Frames in index order.
    pub frames: &'a [FrameRecord],
    /// Directory holding `frame-<i>.png`.
    pub frame_dir: &'a Path,
    /// Audio to mux; only set when this segment is the whole job.
    pub audio: Option<&'a Path>,
    /// Destination video.
    pub out_path: &'a Path,
}

/// Join already-encoded segments, in order, into the final output.
#[derive(Clone, Copy, Debug)]
pub struct ConcatRequest<'a> {
    /// Segment videos in chunk order.
    pub segments: &'a [PathBuf],
    /// Audio to mux, exactly once.
    pub audio: Option<&'a Path>,
    /// Destination video.
    pub out_path: &'a Path,
}

/// External encoder collaborator.
///
/// Implementations must be callable from several threads at once when segments encode in
/// parallel.
pub trait SegmentEncoder: Send + Sync {
    /// Render every frame for its hold duration and concatenate them in index order.
    fn encode_segment(&self, req: &SegmentRequest<'_>, cancel: &CancelToken) -> ReelResult<()>;

    /// Concatenate segment videos in order, muxing audio when given.
    fn concat_segments(&self, req: &ConcatRequest<'_>, cancel: &CancelToken) -> ReelResult<()>;
}

/// [`SegmentEncoder`] that shells out to the system `ffmpeg`.
#[derive(Clone, Debug)]
pub struct FfmpegEncoder {
    settings: EncodeSettings,
}

impl FfmpegEncoder {
    /// Use `ffmpeg` from `PATH`.
    pub fn new(settings: EncodeSettings) -> Self {
        Self { settings }
    }

    /// Output parameters.
    pub fn settings(&self) -> &EncodeSettings {
        &self.settings
    }
}

impl SegmentEncoder for FfmpegEncoder {
    fn encode_segment(&self, req: &SegmentRequest<'_>, cancel: &CancelToken) -> ReelResult<()> {
        if req.frames.is_empty() {
            return Err(ReelError::encode("cannot encode a segment with no frames"));
        }
        ensure_parent_dir(req.out_path)?;
        let args = segment_args(req, &self.settings);
        tracing::debug!(
            frames = req.frames.len(),
            audio = req.audio.is_some(),
            out = %req.out_path.display(),
            "encoding segment"
        );
        run_ffmpeg(Path::new(FFMPEG), &args, self.settings.timeout, cancel)
    }

    fn concat_segments(&self, req: &ConcatRequest<'_>, cancel: &CancelToken) -> ReelResult<()> {
        if req.segments.is_empty() {
            return Err(ReelError::encode("cannot concatenate zero segments"));
        }
        ensure_parent_dir(req.out_path)?;
        let args = concat_args(req, &self.settings);
        tracing::debug!(
            segments = req.segments.len(),
            audio = req.audio.is_some(),
            out = %req.out_path.display(),
            "concatenating segments"
        );
        run_ffmpeg(Path::new(FFMPEG), &args, self.settings.timeout, cancel)
    }
}

/// Arguments for a per-image segment encode.
///
/// Audio (when present) is input 0; each frame is one image input read at the output rate,
/// looped for its hold duration when that duration is positive. A zero hold yields exactly
/// one output frame.
pub fn segment_args(req: &SegmentRequest<'_>, settings: &EncodeSettings) -> Vec<OsString> {
    let mut args = base_args();
    let first_video = push_audio_input(&mut args, req.audio);
    let rate = rate_arg(settings.fps);

    for frame in req.frames {
        args.push("-framerate".into());
        args.push(rate.as_str().into());
        if frame.duration_ms > 0 {
            args.push("-loop".into());
            args.push("1".into());
            args.push("-t".into());
            args.push(format!("{:.3}", frame.duration_ms as f64 / 1000.0).into());
        }
        args.push("-i".into());
        args.push(frame_path(req.frame_dir, frame.index).into());
    }

    push_concat_filter(&mut args, first_video, req.frames.len());
    push_output(&mut args, req.audio.is_some(), settings, req.out_path);
    args
}

/// Arguments for joining segment videos in order.
pub fn concat_args(req: &ConcatRequest<'_>, settings: &EncodeSettings) -> Vec<OsString> {
    let mut args = base_args();
    let first_video = push_audio_input(&mut args, req.audio);

    for seg in req.segments {
        args.push("-i".into());
        args.push(seg.into());
    }

    push_concat_filter(&mut args, first_video, req.segments.len());
    push_output(&mut args, req.audio.is_some(), settings, req.out_path);
    args
}

fn base_args() -> Vec<OsString> {
    vec!["-y".into(), "-loglevel".into(), "error".into()]
}

fn push_audio_input(args: &mut Vec<OsString>, audio: Option<&Path>) -> usize {
    match audio {
        Some(path) => {
            args.push("-i".into());
            args.push(path.into());
            1
        }
        None => 0,
    }
}

fn push_concat_filter(args: &mut Vec<OsString>, first_video: usize, n: usize) {
    let mut filter: String = (first_video..first_video + n)
        .map(|i| format!("[{i}:v]"))
        .collect();
    filter.push_str(&format!("concat=n={n}:v=1:a=0[v]"));
    args.push("-filter_complex".into());
    args.push(filter.into());
    args.push("-map".into());
    args.push("[v]".into());
}

fn push_output(args: &mut Vec<OsString>, audio: bool, settings: &EncodeSettings, out: &Path) {
    if audio {
        for a in ["-map", "0:a", "-c:a", "aac"] {
            args.push(a.into());
        }
    } else {
        args.push("-an".into());
    }
    let rate = rate_arg(settings.fps);
    let size = format!("{}x{}", settings.canvas.width, settings.canvas.height);
    let threads = settings.threads_per_encode.max(1).to_string();
    for a in [
        "-c:v",
        "libx264",
        "-r",
        rate.as_str(),
        "-s",
        size.as_str(),
        "-pix_fmt",
        "yuv420p",
        "-threads",
        threads.as_str(),
        "-movflags",
        "+faststart",
    ] {
        args.push(a.into());
    }
    args.push(out.into());
}

fn rate_arg(fps: Fps) -> String {
    if fps.den == 1 {
        fps.num.to_string()
    } else {
        format!("{}/{}", fps.num, fps.den)
    }
}

/// Run `program` to completion, honoring `timeout` and `cancel`.
///
/// stderr is drained on a side thread so a chatty encoder cannot block on a full pipe.
pub fn run_ffmpeg(
    program: &Path,
    args: &[OsString],
    timeout: Option<Duration>,
    cancel: &CancelToken,
) -> ReelResult<()> {
    cancel.check("encoder invocation")?;

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            ReelError::encode(format!(
                "failed to spawn '{}' (is it installed and on PATH?): {e}",
                program.display()
            ))
        })?;

    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| ReelError::encode("failed to open ffmpeg stderr (unexpected)"))?;
    let stderr_drain = std::thread::spawn(move || {
        let mut stderr_bytes = Vec::new();
        stderr.read_to_end(&mut stderr_bytes)?;
        Ok::<_, std::io::Error>(stderr_bytes)
    });

    let started = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {}
            Err(e) => {
                terminate(&mut child);
                return Err(ReelError::encode(format!("failed to wait for ffmpeg: {e}")));
            }
        }
        if cancel.is_cancelled() {
            terminate(&mut child);
            return Err(ReelError::cancelled("job cancelled during encoder invocation"));
        }
        if let Some(limit) = timeout
            && started.elapsed() >= limit
        {
            terminate(&mut child);
            return Err(ReelError::timeout(format!(
                "ffmpeg did not finish within {}s",
                limit.as_secs_f64()
            )));
        }
        std::thread::sleep(POLL_INTERVAL);
    };

    let stderr_bytes = stderr_drain
        .join()
        .map_err(|_| ReelError::encode("ffmpeg stderr drain thread panicked"))?
        .map_err(|e| ReelError::encode(format!("ffmpeg stderr read failed: {e}")))?;

    if !status.success() {
        let stderr = String::from_utf8_lossy(&stderr_bytes);
        return Err(ReelError::encode(format!(
            "ffmpeg exited with status {}: {}",
            status,
            stderr.trim()
        )));
    }
    Ok(())
}

fn terminate(child: &mut Child) -> Option<ExitStatus> {
    if let Ok(Some(status)) = child.try_wait() {
        return Some(status);
    }
    let _ = child.kill();
    child.wait().ok()
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> ReelResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            ReelError::filesystem(format!(
                "failed to create output directory '{}': {e}",
                parent.display()
            ))
        })?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    std::process::Command::new(FFMPEG)
        .arg("-version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
