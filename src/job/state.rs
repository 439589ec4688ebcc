use std::path::PathBuf;

use uuid::Uuid;

use crate::foundation::error::{FailureKind, ReelError};

/// Lifecycle of one render job.
///
/// `Created -> Capturing -> AudioFetch -> Encoding -> (Concatenating) -> Done | Failed`
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Accepted, not started.
    Created,
    /// Animator running, frames being written.
    Capturing,
    /// Audio source being copied into the temp tree.
    AudioFetch,
    /// Single-pass encode or per-chunk segment encodes.
    Encoding,
    /// Joining segments into the final output.
    Concatenating,
    /// Output written.
    Done,
    /// Aborted; see [`JobStatus::failure`].
    Failed,
}

impl JobState {
    /// `true` for `Done` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// Typed failure reason reported for a failed job.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct JobFailure {
    /// Classification.
    pub kind: FailureKind,
    /// Human-readable detail.
    pub message: String,
}

impl From<&ReelError> for JobFailure {
    fn from(e: &ReelError) -> Self {
        Self {
            kind: e.kind(),
            message: format!("{e:#}"),
        }
    }
}

/// Snapshot of a job's progress, safe to hand to callers.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct JobStatus {
    /// Job id.
    pub id: Uuid,
    /// Current state.
    pub state: JobState,
    /// Final video path once `Done`.
    pub output: Option<PathBuf>,
    /// Failure reason once `Failed`.
    pub failure: Option<JobFailure>,
    /// Frames captured so far.
    pub frames: usize,
    /// Whether audio was fetched.
    pub has_audio: bool,
}

impl JobStatus {
    /// Fresh status for a just-created job.
    pub fn created(id: Uuid) -> Self {
        Self {
            id,
            state: JobState::Created,
            output: None,
            failure: None,
            frames: 0,
            has_audio: false,
        }
    }
}
