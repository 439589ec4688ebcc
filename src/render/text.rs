use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;

use crate::foundation::core::Rgba8;
use crate::foundation::error::{ReelError, ReelResult};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color used by Parley text layout.
pub struct TextBrushRgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl From<Rgba8> for TextBrushRgba8 {
    fn from(c: Rgba8) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        }
    }
}

/// Parley contexts bound to a single caption font.
///
/// The font is registered once at construction; every layout uses the family of its selected face.
pub struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    family_name: String,
}

impl TextLayoutEngine {
    /// Register `font` and resolve the family every layout will use.
    pub fn new(font: &CaptionFont) -> ReelResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font.bytes().to_vec()), None);
        let family_id = families
            .iter()
            .find(|(_, faces)| faces.iter().any(|f| f.index() == font.index()))
            .or_else(|| families.first())
            .map(|(id, _)| *id)
            .ok_or_else(|| ReelError::render("no font families registered from font bytes"))?;
        let family_name = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| ReelError::render("registered font family has no name"))?
            .to_string();

        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family_name,
        })
    }

    /// Family name resolved from the font bytes.
    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    /// Shape and lay out plain text.
    pub fn layout_plain(
        &mut self,
        text: &str,
        size_px: f32,
        brush: TextBrushRgba8,
        max_width_px: Option<f32>,
    ) -> ReelResult<parley::Layout<TextBrushRgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(ReelError::render("text size_px must be finite and > 0"));
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(self.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(max_width_px);
        if let Some(w) = max_width_px {
            layout.align(
                Some(w),
                parley::Alignment::Start,
                parley::AlignmentOptions::default(),
            );
        }
        Ok(layout)
    }
}

/// Caption font file contents and the face to use inside them.
///
/// Collections (`.ttc`) hold several faces, so the index travels with the bytes.
#[derive(Clone, Debug)]
pub struct CaptionFont {
    bytes: Arc<Vec<u8>>,
    index: u32,
}

impl CaptionFont {
    /// Wrap raw font file bytes, selecting face `index`.
    pub fn new(bytes: Vec<u8>, index: u32) -> Self {
        Self {
            bytes: Arc::new(bytes),
            index,
        }
    }

    /// Raw font file bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Face index within [`CaptionFont::bytes`].
    pub fn index(&self) -> u32 {
        self.index
    }
}

/// Families tried, in order, when no font file is configured. Generic sans-serif comes last.
pub const CAPTION_FAMILIES: &[&str] = &["WenQuanYi Micro Hei", "Arial"];

/// Load the caption font: `explicit` when given, otherwise the best system match for
/// [`CAPTION_FAMILIES`].
pub fn load_caption_font(explicit: Option<&Path>) -> ReelResult<CaptionFont> {
    if let Some(path) = explicit {
        let bytes = std::fs::read(path)
            .with_context(|| format!("read font file '{}'", path.display()))?;
        return Ok(CaptionFont::new(bytes, 0));
    }

    let mut db = fontdb::Database::new();
    db.load_system_fonts();
    select_caption_font(&db)
}

fn select_caption_font(db: &fontdb::Database) -> ReelResult<CaptionFont> {
    let mut families: Vec<fontdb::Family<'_>> = CAPTION_FAMILIES
        .iter()
        .map(|name| fontdb::Family::Name(*name))
        .collect();
    families.push(fontdb::Family::SansSerif);

    let query = fontdb::Query {
        families: &families,
        weight: fontdb::Weight::NORMAL,
        stretch: fontdb::Stretch::Normal,
        style: fontdb::Style::Normal,
    };
    let id = db.query(&query).ok_or_else(|| {
        ReelError::render(format!(
            "no caption font configured and none of {CAPTION_FAMILIES:?} or a sans-serif font is installed ({} faces scanned)",
            db.len()
        ))
    })?;

    if let Some(face) = db.face(id) {
        let family = face.families.first().map(|(name, _)| name.as_str()).unwrap_or("?");
        tracing::debug!(family, index = face.index, "using system caption font");
    }
    let (bytes, index) = db
        .with_face_data(id, |data, index| (data.to_vec(), index))
        .ok_or_else(|| ReelError::render("system caption font could not be read"))?;
    Ok(CaptionFont::new(bytes, index))
}

#[cfg(test)]
#[path = "../../tests/unit/render/text.rs"]
mod tests;
