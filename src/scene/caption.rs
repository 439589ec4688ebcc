use crate::foundation::core::{Canvas, Rgba8, Vec2};

/// Vertical gap added between stacked captions when the stack rises.
pub const LINE_GAP_PX: f64 = 15.0;

/// Visual parameters shared by every caption of a job.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptionStyle {
    /// Output canvas.
    pub canvas: Canvas,
    /// Horizontal inset on both sides.
    pub padding: f64,
    /// Regular text color.
    pub color: Rgba8,
    /// Color for highlighted words.
    pub highlight: Rgba8,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            canvas: Canvas {
                width: 540,
                height: 960,
            },
            padding: 70.0,
            color: Rgba8::rgb(0xff, 0xff, 0xff),
            highlight: Rgba8::rgb(0xff, 0x00, 0x00),
        }
    }
}

/// Size and placement of one caption line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CaptionMetrics {
    /// Horizontal cell per character.
    pub char_width: f64,
    /// Font size in pixels.
    pub font_size: f32,
    /// Width actually covered by the text (`char_width * chars`).
    pub text_width: f64,
    /// Anchor (bottom-left) position on the canvas.
    pub anchor: Vec2,
}

impl CaptionStyle {
    /// Usable line width between the paddings.
    pub fn line_width(&self) -> f64 {
        (f64::from(self.canvas.width) - self.padding * 2.0).max(1.0)
    }

    /// Baseline row every new caption enters on.
    pub fn baseline_y(&self) -> f64 {
        f64::from(self.canvas.height) / 2.0
    }

    /// Fit `text` on one line: every character gets an equal cell, font size is 2/3 of a cell.
    pub fn metrics(&self, text: &str) -> CaptionMetrics {
        let chars = text.chars().count().max(1) as f64;
        let char_width = (self.line_width() / chars).floor().max(1.0);
        let font_size = (char_width / 1.5).floor().max(1.0) as f32;
        CaptionMetrics {
            char_width,
            font_size,
            text_width: char_width * chars,
            anchor: Vec2::new(self.padding, self.baseline_y()),
        }
    }

    /// Fill color for a word.
    pub fn color_for(&self, is_hl: bool) -> Rgba8 {
        if is_hl { self.highlight } else { self.color }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/caption.rs"]
mod tests;
