use crate::animation::animator::{AnimatorOpts, CaptureTarget, KeyframeAnimator};
use crate::capture::recorder::{FrameRecord, FrameRecorder};
use crate::encode::assemble::{AssembleOpts, Assembler, Assembly};
use crate::encode::ffmpeg::SegmentEncoder;
use crate::foundation::core::Rgba8;
use crate::foundation::error::ReelResult;
use crate::job::audio::AudioFetcher;
use crate::job::cancel::CancelToken;
use crate::job::state::{JobFailure, JobState, JobStatus};
use crate::job::workspace::JobWorkspace;
use crate::render::backend::RenderSurface;
use crate::timeline::word::WordTimeline;

/// Everything one render invocation owns.
#[derive(Clone, Debug)]
pub struct Job {
    /// Temp tree and output location.
    pub workspace: JobWorkspace,
    /// Words to animate.
    pub timeline: WordTimeline,
    /// Remote URL or local path of the audio track.
    pub audio_source: Option<String>,
}

/// Per-job pipeline settings.
#[derive(Clone, Debug, Default)]
pub struct PipelineOpts {
    /// Caption animation.
    pub animator: AnimatorOpts,
    /// Opaque color frames are flattened over.
    pub background: Rgba8,
    /// Encoding strategy.
    pub assemble: AssembleOpts,
}

/// Collaborators a job runs against.
pub struct JobRunner<'a> {
    /// Surface owned by this job for its whole capture phase.
    pub surface: &'a mut dyn RenderSurface,
    /// External encoder.
    pub encoder: &'a dyn SegmentEncoder,
    /// Audio fetcher.
    pub fetcher: &'a AudioFetcher,
    /// Settings.
    pub opts: &'a PipelineOpts,
    /// Abort signal checked between suspension points.
    pub cancel: CancelToken,
}

impl JobRunner<'_> {
    /// Drive `job` from `Created` to `Done` or `Failed`.
    ///
    /// `observer` sees every state transition. The job's temp tree is removed before this
    /// returns, whatever the outcome; on failure a partial output file is removed too.
    #[tracing::instrument(skip_all, fields(job_id = %job.workspace.id(), words = job.timeline.len()))]
    pub fn run(self, job: &Job, observer: &mut dyn FnMut(&JobStatus)) -> JobStatus {
        let mut status = JobStatus::created(job.workspace.id());
        observer(&status);

        match self.run_stages(job, &mut status, observer) {
            Ok(assembly) => {
                status.state = JobState::Done;
                status.output = Some(assembly.output);
                tracing::info!(
                    frames = status.frames,
                    segments = assembly.segments,
                    encoder_calls = assembly.encoder_calls,
                    has_audio = status.has_audio,
                    "job done"
                );
            }
            Err(e) => {
                tracing::error!(kind = ?e.kind(), error = %format!("{e:#}"), "job failed");
                job.workspace.discard_output();
                status.state = JobState::Failed;
                status.failure = Some(JobFailure::from(&e));
            }
        }

        job.workspace.cleanup();
        observer(&status);
        status
    }

    fn run_stages(
        self,
        job: &Job,
        status: &mut JobStatus,
        observer: &mut dyn FnMut(&JobStatus),
    ) -> ReelResult<Assembly> {
        let ws = &job.workspace;
        ws.create()?;

        status.state = JobState::Capturing;
        observer(status);
        let frames = capture_frames(
            &job.timeline,
            &mut FrameRecorder::new(
                self.surface,
                ws.frame_dir(),
                self.opts.background,
                self.cancel.clone(),
            ),
            self.opts.animator.clone(),
            &self.cancel,
        )?;
        status.frames = frames.len();
        tracing::debug!(frames = frames.len(), "capture finished");

        self.cancel.check("audio fetch")?;
        status.state = JobState::AudioFetch;
        observer(status);
        let audio_path = ws.audio_path(job.audio_source.as_deref().unwrap_or_default());
        status.has_audio = self
            .fetcher
            .fetch(job.audio_source.as_deref(), &audio_path);
        let audio = status.has_audio.then_some(audio_path.as_path());

        Assembler::new(self.encoder, self.opts.assemble.clone(), self.cancel.clone()).assemble(
            &frames,
            ws,
            audio,
            &mut |state| {
                status.state = state;
                observer(status);
            },
        )
    }
}

/// Drive the animator over every word, then record the last word's hold.
///
/// Produces `words + 1` frames unless tween frames are enabled.
pub fn capture_frames(
    timeline: &WordTimeline,
    recorder: &mut FrameRecorder<'_>,
    opts: AnimatorOpts,
    cancel: &CancelToken,
) -> ReelResult<Vec<FrameRecord>> {
    let mut animator = KeyframeAnimator::new(timeline, opts);
    while !animator.is_finished() {
        cancel.check("next word")?;
        animator.advance(recorder)?;
    }
    recorder.capture(
        animator.scene(),
        animator.clock_ms(),
        animator.final_hold_ms(),
    )?;
    Ok(recorder.records().to_vec())
}

#[cfg(test)]
#[path = "../../tests/unit/job/pipeline.rs"]
mod tests;
