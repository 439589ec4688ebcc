use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::capture::recorder::FrameRecord;
use crate::encode::chunk::split_frames;
use crate::encode::ffmpeg::{ConcatRequest, SegmentEncoder, SegmentRequest};
use crate::foundation::error::{ReelError, ReelResult};
use crate::job::cancel::CancelToken;
use crate::job::state::JobState;
use crate::job::workspace::JobWorkspace;

/// Assembly tuning.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssembleOpts {
    /// Upper bound on frames handed to one encoder invocation.
    pub max_frames_per_segment: usize,
    /// Encode segments concurrently on a rayon pool.
    pub parallel: bool,
    /// Pool size for parallel segment encodes; `None` lets rayon decide.
    pub threads: Option<usize>,
}

impl Default for AssembleOpts {
    fn default() -> Self {
        Self {
            max_frames_per_segment: 50,
            parallel: false,
            threads: None,
        }
    }
}

/// What assembly produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Assembly {
    /// Final output video.
    pub output: PathBuf,
    /// Number of chunks the frames were split into.
    pub segments: usize,
    /// Encoder invocations issued (segment encodes plus the concatenation, if any).
    pub encoder_calls: usize,
}

/// Turns the ordered frame list (plus optional audio) into the job's final video.
///
/// Short sequences are encoded straight into the output with audio muxed inline. Longer ones
/// are encoded as bounded segments without audio and then concatenated, muxing audio once.
pub struct Assembler<'e> {
    encoder: &'e dyn SegmentEncoder,
    opts: AssembleOpts,
    cancel: CancelToken,
}

impl<'e> Assembler<'e> {
    /// Create an assembler driving `encoder`.
    pub fn new(encoder: &'e dyn SegmentEncoder, opts: AssembleOpts, cancel: CancelToken) -> Self {
        Self {
            encoder,
            opts,
            cancel,
        }
    }

    /// Encode `frames` into `workspace.output_path()`.
    ///
    /// `on_state` observes the `Encoding` and `Concatenating` transitions.
    #[tracing::instrument(skip_all, fields(job_id = %workspace.id(), frames = frames.len()))]
    pub fn assemble(
        &self,
        frames: &[FrameRecord],
        workspace: &JobWorkspace,
        audio: Option<&Path>,
        on_state: &mut dyn FnMut(JobState),
    ) -> ReelResult<Assembly> {
        if frames.is_empty() {
            return Err(ReelError::validation("no frames to assemble"));
        }
        let max = self.opts.max_frames_per_segment;
        let output = workspace.output_path().to_path_buf();
        let frame_dir = workspace.frame_dir();

        on_state(JobState::Encoding);
        if frames.len() <= max {
            self.cancel.check("encoding")?;
            self.encoder.encode_segment(
                &SegmentRequest {
                    frames,
                    frame_dir: &frame_dir,
                    audio,
                    out_path: &output,
                },
                &self.cancel,
            )?;
            tracing::info!(output = %output.display(), "encoded in a single pass");
            return Ok(Assembly {
                output,
                segments: 1,
                encoder_calls: 1,
            });
        }

        let chunks = split_frames(frames, max)?;
        let segments: Vec<PathBuf> = (0..chunks.len())
            .map(|i| workspace.segment_path(i))
            .collect();
        tracing::debug!(segments = chunks.len(), max, "encoding in segments");

        if self.opts.parallel {
            self.encode_parallel(&chunks, &segments, &frame_dir)?;
        } else {
            for (i, chunk) in chunks.iter().enumerate() {
                self.encode_chunk(i, chunk, &segments[i], &frame_dir)?;
            }
        }

        on_state(JobState::Concatenating);
        self.cancel.check("concatenation")?;
        self.encoder.concat_segments(
            &ConcatRequest {
                segments: &segments,
                audio,
                out_path: &output,
            },
            &self.cancel,
        )?;
        remove_segments(&segments);

        tracing::info!(output = %output.display(), segments = segments.len(), "segments concatenated");
        Ok(Assembly {
            output,
            segments: segments.len(),
            encoder_calls: segments.len() + 1,
        })
    }

    fn encode_chunk(
        &self,
        index: usize,
        chunk: &[FrameRecord],
        out_path: &Path,
        frame_dir: &Path,
    ) -> ReelResult<()> {
        self.cancel.check("segment encode")?;
        self.encoder
            .encode_segment(
                &SegmentRequest {
                    frames: chunk,
                    frame_dir,
                    audio: None,
                    out_path,
                },
                &self.cancel,
            )
            .inspect_err(|e| tracing::error!(segment = index, error = %e, "segment encode failed"))?;
        tracing::debug!(segment = index, frames = chunk.len(), "segment encoded");
        Ok(())
    }

    fn encode_parallel(
        &self,
        chunks: &[&[FrameRecord]],
        segments: &[PathBuf],
        frame_dir: &Path,
    ) -> ReelResult<()> {
        let pool = build_thread_pool(self.opts.threads)?;
        pool.install(|| {
            chunks
                .par_iter()
                .zip(segments.par_iter())
                .enumerate()
                .try_for_each(|(i, (chunk, out))| self.encode_chunk(i, chunk, out, frame_dir))
        })
    }
}

fn build_thread_pool(threads: Option<usize>) -> ReelResult<rayon::ThreadPool> {
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| ReelError::encode(format!("failed to build rayon thread pool: {e}")))
}

fn remove_segments(segments: &[PathBuf]) {
    for seg in segments {
        if let Err(e) = std::fs::remove_file(seg)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            tracing::warn!(path = %seg.display(), error = %e, "failed to remove segment");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/assemble.rs"]
mod tests;
