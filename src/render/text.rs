use std::collections::HashMap;
use std::sync::Arc;

use crate::assets::font::CaptionFont;
use crate::foundation::error::{ReelError, ReelResult};

/// Shaped layouts kept before the cache is flushed.
const SHAPE_CACHE_CAP: usize = 64;

/// One laid-out line of glyphs.
#[derive(Clone, Debug)]
pub(crate) struct ShapedLine {
    /// Advance width of the line in pixels.
    pub(crate) width: f32,
    /// Baseline, measured from the top of the layout.
    pub(crate) baseline: f32,
    /// Glyphs positioned relative to the line start (x) and layout top (y).
    pub(crate) glyphs: Vec<vello_cpu::Glyph>,
}

/// Text shaped at a fixed size, ready to be drawn with any paint.
#[derive(Clone, Debug)]
pub(crate) struct ShapedText {
    pub(crate) font_size: f32,
    pub(crate) lines: Vec<ShapedLine>,
}

impl ShapedText {
    pub(crate) fn first_baseline(&self) -> f32 {
        self.lines.first().map(|l| l.baseline).unwrap_or(0.0)
    }

    pub(crate) fn last_baseline(&self) -> f32 {
        self.lines.last().map(|l| l.baseline).unwrap_or(0.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct ShapeKey {
    text: String,
    size_bits: u32,
    max_width_bits: u32,
}

/// Parley-backed shaper bound to one caption font.
pub(crate) struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<()>,
    family_name: String,
    font_data: vello_cpu::peniko::FontData,
    cache: HashMap<ShapeKey, Arc<ShapedText>>,
}

impl TextLayoutEngine {
    pub(crate) fn new(font: &CaptionFont) -> ReelResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx.collection.register_fonts(
            parley::fontique::Blob::from(font.bytes.as_ref().clone()),
            None,
        );
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            ReelError::validation("no font families registered from font bytes")
        })?;
        let family_name = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| ReelError::validation("registered font family has no name"))?
            .to_string();

        let font_data = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(font.bytes.as_ref().clone()),
            font.index,
        );

        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family_name,
            font_data,
            cache: HashMap::new(),
        })
    }

    pub(crate) fn font_data(&self) -> &vello_cpu::peniko::FontData {
        &self.font_data
    }

    /// Shape `text` at `size_px`, wrapping at `max_width_px`. Results are cached.
    pub(crate) fn shape(
        &mut self,
        text: &str,
        size_px: f32,
        max_width_px: f32,
    ) -> ReelResult<Arc<ShapedText>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(ReelError::validation(
                "text size_px must be finite and > 0",
            ));
        }

        let key = ShapeKey {
            text: text.to_string(),
            size_bits: size_px.to_bits(),
            max_width_bits: max_width_px.to_bits(),
        };
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit.clone());
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(self.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));

        let mut layout: parley::Layout<()> = builder.build(text);
        layout.break_all_lines(Some(max_width_px));
        layout.align(
            Some(max_width_px),
            parley::Alignment::Start,
            parley::AlignmentOptions::default(),
        );

        let mut lines = Vec::new();
        for line in layout.lines() {
            let mut width = 0.0f32;
            let mut baseline = None;
            let mut glyphs = Vec::new();
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                baseline.get_or_insert(run.baseline());
                glyphs.extend(run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                }));
                width = width.max(run.offset() + run.advance());
            }
            if let Some(baseline) = baseline {
                lines.push(ShapedLine {
                    width,
                    baseline,
                    glyphs,
                });
            }
        }

        let shaped = Arc::new(ShapedText {
            font_size: size_px,
            lines,
        });
        if self.cache.len() >= SHAPE_CACHE_CAP {
            self.cache.clear();
        }
        self.cache.insert(key, shaped.clone());
        Ok(shaped)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/text.rs"]
mod tests;
