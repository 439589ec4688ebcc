use crate::foundation::core::Canvas;
use crate::foundation::error::ReelResult;
use crate::scene::graph::SceneGraph;

/// A rendered frame as RGBA8 pixels.
///
/// Surfaces produce **premultiplied alpha** by default. The `premultiplied` flag makes this
/// explicit at API boundaries.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

/// A canvas a single job snapshots its scene from.
///
/// One job drives one surface at a time; surfaces are created per job through a
/// [`SurfaceFactory`] and never shared.
pub trait RenderSurface {
    /// Output size of every snapshot.
    fn canvas(&self) -> Canvas;

    /// Rasterize `scene` as it looks at scene time `at_ms`.
    fn snapshot(&mut self, scene: &SceneGraph, at_ms: u64) -> ReelResult<FrameRGBA>;
}

/// Creates an independent [`RenderSurface`] for each job.
pub trait SurfaceFactory: Send + Sync {
    /// Build a fresh surface.
    fn create_surface(&self) -> ReelResult<Box<dyn RenderSurface>>;
}
