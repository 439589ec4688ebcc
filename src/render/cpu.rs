use std::collections::HashMap;
use std::sync::Arc;

use crate::foundation::core::{Affine, Canvas, Rgba8};
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::backend::{FrameRGBA, RenderSurface, SurfaceFactory};
use crate::render::text::{CaptionFont, TextBrushRgba8, TextLayoutEngine};
use crate::scene::graph::{Caption, NodeId, SceneGraph};

/// CPU raster surface powered by `vello_cpu`.
///
/// Caption layouts are shaped once per scene node and reused for every later snapshot.
pub struct CpuSurface {
    canvas: Canvas,
    width: u16,
    height: u16,
    background: Rgba8,

    text: TextLayoutEngine,
    font: vello_cpu::peniko::FontData,
    layouts: HashMap<NodeId, Arc<parley::Layout<TextBrushRgba8>>>,

    ctx: Option<vello_cpu::RenderContext>,
}

impl CpuSurface {
    /// Create a surface drawing captions with `font` over an opaque `background`.
    pub fn new(canvas: Canvas, background: Rgba8, font: &CaptionFont) -> ReelResult<Self> {
        canvas.validate()?;
        let width = u16::try_from(canvas.width)
            .map_err(|_| ReelError::render("canvas width must fit in u16"))?;
        let height = u16::try_from(canvas.height)
            .map_err(|_| ReelError::render("canvas height must fit in u16"))?;

        let text = TextLayoutEngine::new(font)?;
        let font = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(font.bytes().to_vec()),
            font.index(),
        );

        Ok(Self {
            canvas,
            width,
            height,
            background,
            text,
            font,
            layouts: HashMap::new(),
            ctx: None,
        })
    }

    fn layout_for(
        &mut self,
        node: NodeId,
        caption: &Caption,
    ) -> ReelResult<Arc<parley::Layout<TextBrushRgba8>>> {
        if let Some(layout) = self.layouts.get(&node) {
            return Ok(layout.clone());
        }
        let layout = Arc::new(self.text.layout_plain(
            &caption.text,
            caption.font_size,
            caption.color.into(),
            Some(caption.max_width),
        )?);
        self.layouts.insert(node, layout.clone());
        Ok(layout)
    }

    fn take_ctx(&mut self) -> vello_cpu::RenderContext {
        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == self.width && ctx.height() == self.height => ctx,
            _ => vello_cpu::RenderContext::new(self.width, self.height),
        };
        ctx.reset();
        ctx
    }
}

impl RenderSurface for CpuSurface {
    fn canvas(&self) -> Canvas {
        self.canvas
    }

    fn snapshot(&mut self, scene: &SceneGraph, at_ms: u64) -> ReelResult<FrameRGBA> {
        let items = scene.draw_list(at_ms);
        self.layouts.retain(|id, _| scene.contains(*id));

        let mut ctx = self.take_ctx();
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        let bg = self.background;
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(bg.r, bg.g, bg.b, bg.a));
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(self.width),
            f64::from(self.height),
        ));

        for item in &items {
            let layout = self.layout_for(item.node, item.caption)?;
            // Captions are anchored at their bottom-left corner.
            let xf = item.transform * Affine::translate((0.0, -f64::from(layout.height())));
            ctx.set_transform(affine_to_cpu(xf));

            let opacity = item.opacity as f32;
            if opacity < 1.0 {
                ctx.push_opacity_layer(opacity);
            }

            for line in layout.lines() {
                for run_item in line.items() {
                    let parley::layout::PositionedLayoutItem::GlyphRun(run) = run_item else {
                        continue;
                    };

                    let brush = run.style().brush;
                    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                        brush.r, brush.g, brush.b, brush.a,
                    ));

                    let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                        id: g.id,
                        x: g.x,
                        y: g.y,
                    });
                    ctx.glyph_run(&self.font)
                        .font_size(run.run().font_size())
                        .fill_glyphs(glyphs);
                }
            }

            if opacity < 1.0 {
                ctx.pop_layer();
            }
        }

        ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(self.width, self.height);
        ctx.render_to_pixmap(&mut pixmap);
        self.ctx = Some(ctx);

        Ok(FrameRGBA {
            width: self.canvas.width,
            height: self.canvas.height,
            data: pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

/// Builds one [`CpuSurface`] per job from a shared caption font.
#[derive(Clone, Debug)]
pub struct CpuSurfaceFactory {
    canvas: Canvas,
    background: Rgba8,
    font: CaptionFont,
}

impl CpuSurfaceFactory {
    /// Create a factory; the font is validated eagerly so misconfiguration fails before any job.
    pub fn new(canvas: Canvas, background: Rgba8, font: CaptionFont) -> ReelResult<Self> {
        TextLayoutEngine::new(&font)?;
        Ok(Self {
            canvas,
            background,
            font,
        })
    }
}

impl SurfaceFactory for CpuSurfaceFactory {
    fn create_surface(&self) -> ReelResult<Box<dyn RenderSurface>> {
        Ok(Box::new(CpuSurface::new(
            self.canvas,
            self.background,
            &self.font,
        )?))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
