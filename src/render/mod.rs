//! Render surfaces: turn a [`SceneGraph`](crate::scene::graph::SceneGraph) into pixels.

pub mod backend;
pub mod cpu;
pub mod text;
