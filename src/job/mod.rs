//! Job lifecycle: temp tree, audio fetch, cancellation and the end-to-end pipeline.

pub mod audio;
pub mod cancel;
pub mod pipeline;
pub mod state;
pub mod workspace;
