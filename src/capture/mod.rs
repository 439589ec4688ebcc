//! Frame capture: snapshot the scene and persist indexed PNG frames.

pub mod recorder;
pub mod still;
