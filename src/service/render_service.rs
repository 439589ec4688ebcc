use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use uuid::Uuid;

use crate::config::RenderConfig;
use crate::encode::ffmpeg::{FfmpegEncoder, SegmentEncoder};
use crate::foundation::error::{ReelError, ReelResult};
use crate::job::audio::AudioFetcher;
use crate::job::cancel::CancelToken;
use crate::job::pipeline::{Job, JobRunner, PipelineOpts};
use crate::job::state::{JobFailure, JobState, JobStatus};
use crate::job::workspace::JobWorkspace;
use crate::render::backend::SurfaceFactory;
use crate::render::cpu::CpuSurfaceFactory;
use crate::render::text::load_caption_font;
use crate::timeline::word::WordTimeline;

/// Inbound render request.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RenderRequest {
    /// JSON string of the form `{"words": [{start, end, text, is_hl}, ...]}`.
    pub word_json: String,
    /// Remote URL or local path of the audio track.
    #[serde(default)]
    pub audio_url: Option<String>,
}

/// Immediate answer to a submission.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SubmitAck {
    /// `false` when the request was rejected and no job exists.
    pub ok: bool,
    /// Id to poll or cancel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<Uuid>,
    /// Rejection reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

struct JobSlot {
    status: Mutex<JobStatus>,
    finished: Condvar,
    cancel: CancelToken,
}

impl JobSlot {
    fn lock(&self) -> MutexGuard<'_, JobStatus> {
        self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, status: &JobStatus) {
        let mut guard = self.lock();
        *guard = status.clone();
        if status.state.is_terminal() {
            self.finished.notify_all();
        }
    }
}

/// Handle to a submitted job.
#[derive(Clone)]
pub struct JobHandle {
    id: Uuid,
    slot: Arc<JobSlot>,
}

impl std::fmt::Debug for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobHandle")
            .field("id", &self.id)
            .field("state", &self.slot.lock().state)
            .finish()
    }
}

impl JobHandle {
    /// Job id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current status.
    pub fn status(&self) -> JobStatus {
        self.slot.lock().clone()
    }

    /// Request cancellation; takes effect at the next suspension point.
    pub fn cancel(&self) {
        self.slot.cancel.cancel();
    }

    /// Block until the job is `Done` or `Failed`.
    pub fn wait(&self) -> JobStatus {
        let mut guard = self.slot.lock();
        while !guard.state.is_terminal() {
            guard = self
                .slot
                .finished
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
        }
        guard.clone()
    }

    /// Like [`JobHandle::wait`], giving up after `timeout`.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<JobStatus> {
        let guard = self.slot.lock();
        let (guard, _) = self
            .slot
            .finished
            .wait_timeout_while(guard, timeout, |s| !s.state.is_terminal())
            .unwrap_or_else(PoisonError::into_inner);
        guard.state.is_terminal().then(|| guard.clone())
    }
}

/// Accepts render requests and runs each as an independent background job.
///
/// Every job owns its own render surface and temp tree; the encoder, audio fetcher and
/// settings are shared.
pub struct RenderService {
    opts: Arc<PipelineOpts>,
    temp_root: PathBuf,
    output_dir: PathBuf,
    fetcher: Arc<AudioFetcher>,
    encoder: Arc<dyn SegmentEncoder>,
    surfaces: Arc<dyn SurfaceFactory>,
    jobs: Mutex<HashMap<Uuid, Arc<JobSlot>>>,
}

impl RenderService {
    /// Build a service from explicit collaborators.
    pub fn new(
        config: &RenderConfig,
        encoder: Arc<dyn SegmentEncoder>,
        surfaces: Arc<dyn SurfaceFactory>,
    ) -> ReelResult<Self> {
        let opts = config.pipeline_opts()?;
        Ok(Self {
            opts: Arc::new(opts),
            temp_root: config.temp_root.clone(),
            output_dir: config.output_dir.clone(),
            fetcher: Arc::new(AudioFetcher::new(config.audio_timeout())?),
            encoder,
            surfaces,
            jobs: Mutex::new(HashMap::new()),
        })
    }

    /// Build a service rendering with `vello_cpu` and encoding with the system `ffmpeg`.
    pub fn from_config(config: &RenderConfig) -> ReelResult<Self> {
        config.validate()?;
        let font = load_caption_font(config.font_path.as_deref())?;
        let surfaces =
            CpuSurfaceFactory::new(config.canvas(), config.background_color()?, font)?;
        let encoder = FfmpegEncoder::new(config.encode_settings()?);
        Self::new(config, Arc::new(encoder), Arc::new(surfaces))
    }

    /// Validate `req` and start a job, answering immediately.
    ///
    /// A malformed `word_json` yields `ok: false` and creates nothing.
    pub fn submit(&self, req: &RenderRequest) -> SubmitAck {
        let timeline = match WordTimeline::from_word_json(&req.word_json) {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(error = %e, "rejected render request");
                return SubmitAck {
                    ok: false,
                    job_id: None,
                    error: Some(e.to_string()),
                };
            }
        };
        match self.submit_timeline(timeline, req.audio_url.clone(), None) {
            Ok(handle) => SubmitAck {
                ok: true,
                job_id: Some(handle.id()),
                error: None,
            },
            Err(e) => {
                tracing::error!(error = %e, "failed to start job");
                SubmitAck {
                    ok: false,
                    job_id: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Start a job for an already-parsed timeline.
    ///
    /// `output` overrides the default `<output_dir>/video-<id>.mp4`.
    pub fn submit_timeline(
        &self,
        timeline: WordTimeline,
        audio_source: Option<String>,
        output: Option<PathBuf>,
    ) -> ReelResult<JobHandle> {
        let id = Uuid::new_v4();
        let mut workspace = JobWorkspace::new(id, &self.temp_root, &self.output_dir);
        if let Some(out) = output {
            workspace = workspace.with_output_path(out);
        }
        let job = Job {
            workspace,
            timeline,
            audio_source,
        };

        let slot = Arc::new(JobSlot {
            status: Mutex::new(JobStatus::created(id)),
            finished: Condvar::new(),
            cancel: CancelToken::new(),
        });
        self.lock_jobs().insert(id, slot.clone());

        let worker_slot = slot.clone();
        let opts = self.opts.clone();
        let fetcher = self.fetcher.clone();
        let encoder = self.encoder.clone();
        let surfaces = self.surfaces.clone();
        let spawned = std::thread::Builder::new()
            .name(format!("wordreel-job-{id}"))
            .spawn(move || {
                run_job(
                    job,
                    &worker_slot,
                    &opts,
                    &fetcher,
                    encoder.as_ref(),
                    surfaces.as_ref(),
                )
            });
        if let Err(e) = spawned {
            self.lock_jobs().remove(&id);
            return Err(ReelError::Other(
                anyhow::Error::new(e).context("spawn job worker thread"),
            ));
        }

        tracing::info!(job_id = %id, "job submitted");
        Ok(JobHandle { id, slot })
    }

    /// Current status of a job, if known.
    pub fn status(&self, id: Uuid) -> Option<JobStatus> {
        self.lock_jobs().get(&id).map(|slot| slot.lock().clone())
    }

    /// Handle to a known job.
    pub fn handle(&self, id: Uuid) -> Option<JobHandle> {
        self.lock_jobs().get(&id).map(|slot| JobHandle {
            id,
            slot: slot.clone(),
        })
    }

    /// Request cancellation; `false` when the job is unknown or already finished.
    pub fn cancel(&self, id: Uuid) -> bool {
        let Some(slot) = self.lock_jobs().get(&id).cloned() else {
            return false;
        };
        if slot.lock().state.is_terminal() {
            return false;
        }
        slot.cancel.cancel();
        tracing::info!(job_id = %id, "cancellation requested");
        true
    }

    /// Forget finished jobs, returning how many were dropped.
    pub fn prune_finished(&self) -> usize {
        let mut jobs = self.lock_jobs();
        let before = jobs.len();
        jobs.retain(|_, slot| !slot.lock().state.is_terminal());
        before - jobs.len()
    }

    fn lock_jobs(&self) -> MutexGuard<'_, HashMap<Uuid, Arc<JobSlot>>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn run_job(
    job: Job,
    slot: &JobSlot,
    opts: &PipelineOpts,
    fetcher: &AudioFetcher,
    encoder: &dyn SegmentEncoder,
    surfaces: &dyn SurfaceFactory,
) {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut surface = match surfaces.create_surface() {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(job_id = %job.workspace.id(), error = %e, "no render surface for job");
                publish_failure(slot, job.workspace.id(), &e);
                return;
            }
        };

        JobRunner {
            surface: surface.as_mut(),
            encoder,
            fetcher,
            opts,
            cancel: slot.cancel.clone(),
        }
        .run(&job, &mut |status| slot.publish(status));
    }));

    if let Err(payload) = outcome {
        let message = panic_message(payload.as_ref());
        tracing::error!(job_id = %job.workspace.id(), panic = %message, "job worker panicked");
        job.workspace.discard_output();
        job.workspace.cleanup();
        let err = ReelError::Other(anyhow::anyhow!("job worker panicked: {message}"));
        publish_failure(slot, job.workspace.id(), &err);
    }
}

/// Move the slot to `Failed`, keeping the progress counters already published.
fn publish_failure(slot: &JobSlot, id: Uuid, err: &ReelError) {
    let mut status = slot.lock().clone();
    status.id = id;
    status.state = JobState::Failed;
    status.output = None;
    status.failure = Some(JobFailure::from(err));
    slot.publish(&status);
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/service/render_service.rs"]
mod tests;
