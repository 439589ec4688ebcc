//! Wordreel renders timestamped word timelines into animated caption videos.
//!
//! A job walks its [`WordTimeline`] with a keyframe animator, snapshots the caption scene once
//! per word boundary, and hands the frames (each with its own hold duration) to an external
//! encoder. Long jobs are encoded in bounded segments and concatenated.
//!
//! - Build a [`RenderService`] from a [`RenderConfig`]
//! - [`RenderService::submit`] a [`RenderRequest`] and poll or wait on the job
#![forbid(unsafe_code)]

mod foundation;

/// Keyframe animator, easing and tweens.
pub mod animation;
pub mod capture;
/// Configuration loading.
pub mod config;
pub mod encode;
pub mod job;
pub mod render;
/// Caption scene model.
pub mod scene;
pub mod service;
/// Word input model.
pub mod timeline;

pub use crate::foundation::core::{Affine, Canvas, Fps, Point, Rgba8, Vec2};
pub use crate::foundation::error::{FailureKind, ReelError, ReelResult};

pub use crate::config::RenderConfig;
pub use crate::encode::assemble::{AssembleOpts, Assembler, Assembly};
pub use crate::encode::ffmpeg::{EncodeSettings, FfmpegEncoder, SegmentEncoder};
pub use crate::job::cancel::CancelToken;
pub use crate::job::state::{JobFailure, JobState, JobStatus};
pub use crate::render::backend::{FrameRGBA, RenderSurface, SurfaceFactory};
pub use crate::render::cpu::{CpuSurface, CpuSurfaceFactory};
pub use crate::service::render_service::{JobHandle, RenderRequest, RenderService, SubmitAck};
pub use crate::timeline::word::{Word, WordTimeline};
