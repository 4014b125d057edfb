//! Deterministic rasterizer and recording surface used by unit tests.

use crate::display_list::{Image, Surface};
use crate::error::FontError;
use crate::format::{Dim, Pos};
use crate::glyph_cache::BitmapGlyph;
use crate::rasterizer::{
    pack_mono, FaceLoader, FontSource, GlyphMetrics, GlyphRasterizer, LineMetrics, PixelDepth,
    RasterOutput,
};

/// Code point the fixed face does not map.
pub const UNMAPPED: char = '\u{E000}';
/// Code point the fixed face maps but fails to render.
pub const RENDER_FAILURE: char = '\u{E001}';
/// Code point the fixed face renders with fewer bytes than its rows need.
pub const TRUNCATED_BITMAP: char = '\u{E002}';

/// Fixed-pitch face: letters advance `size / 2`, spaces `size / 4`; ink sits
/// on the baseline and rises `size * 3 / 4`.
#[derive(Clone, Debug, Default)]
pub struct FixedFace {
    size_px: i32,
    pub set_size_calls: usize,
    pub render_calls: usize,
}

impl FixedFace {
    fn metrics_for(&self, glyph_index: u16) -> GlyphMetrics {
        if glyph_index == u16::from(b' ') {
            return GlyphMetrics {
                advance: self.size_px / 4,
                ..GlyphMetrics::default()
            };
        }
        let advance = self.size_px / 2;
        let height = self.size_px * 3 / 4;
        GlyphMetrics {
            width: (advance - 1).max(0),
            height,
            xoff: 0,
            yoff: -height,
            advance,
        }
    }
}

impl GlyphRasterizer for FixedFace {
    fn set_pixel_size(&mut self, size_px: u16) -> Result<(), FontError> {
        self.size_px = i32::from(size_px);
        self.set_size_calls += 1;
        Ok(())
    }

    fn glyph_index(&self, codepoint: char) -> Option<u16> {
        if codepoint == UNMAPPED {
            return None;
        }
        if codepoint == RENDER_FAILURE {
            return Some(u16::MAX);
        }
        if codepoint == TRUNCATED_BITMAP {
            return Some(u16::MAX - 1);
        }
        Some((codepoint as u32 % 0xFFFD) as u16)
    }

    fn glyph_metrics(&mut self, glyph_index: u16) -> Result<GlyphMetrics, FontError> {
        Ok(self.metrics_for(glyph_index))
    }

    fn render(&mut self, glyph_index: u16, depth: PixelDepth) -> Result<RasterOutput, FontError> {
        self.render_calls += 1;
        if glyph_index == u16::MAX {
            return Err(FontError::Raster {
                codepoint: RENDER_FAILURE,
                reason: "outline rejected".to_string(),
            });
        }
        let metrics = self.metrics_for(glyph_index);
        let (width, height) = (metrics.width as usize, metrics.height as usize);
        let coverage = vec![0xFF; width * height];
        let (pitch, mut pixels) = match depth {
            PixelDepth::EightBit => (width, coverage),
            PixelDepth::OneBit => pack_mono(width, height, &coverage),
        };
        if glyph_index == u16::MAX - 1 {
            pixels.truncate(pixels.len() / 2);
        }
        Ok(RasterOutput {
            metrics,
            pitch,
            pixels,
        })
    }

    fn line_metrics(&self) -> LineMetrics {
        LineMetrics {
            ascent: self.size_px * 3 / 4,
            descent: self.size_px / 4,
        }
    }
}

/// Loader producing [`FixedFace`]s; payloads starting with `b"bad"` fail.
#[derive(Clone, Debug, Default)]
pub struct FixedLoader {
    pub loads: usize,
}

impl FaceLoader for FixedLoader {
    type Face = FixedFace;

    fn load(&mut self, name: &str, source: FontSource<'_>) -> Result<FixedFace, FontError> {
        if let FontSource::Memory(data) = source {
            if data.starts_with(b"bad") {
                return Err(FontError::Load {
                    name: name.to_string(),
                    reason: "unsupported format".to_string(),
                });
            }
        }
        self.loads += 1;
        Ok(FixedFace::default())
    }
}

/// Surface operation captured by [`RecordingSurface`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordedOp {
    Clear,
    Glyph(Pos, char),
    Image(Pos, Dim),
    Highlight(Pos, Dim),
    ClearHighlight(Pos, Dim),
    ClearRegion(Pos, Dim),
    SetRegion(Pos, Dim),
    Update { no_full: bool },
}

/// Surface recording every call it receives.
#[derive(Clone, Debug, Default)]
pub struct RecordingSurface {
    pub depth: PixelDepth,
    pub ops: Vec<RecordedOp>,
}

impl RecordingSurface {
    pub fn glyphs(&self) -> Vec<(Pos, char)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                RecordedOp::Glyph(pos, ch) => Some((*pos, *ch)),
                _ => None,
            })
            .collect()
    }
}

impl Surface for RecordingSurface {
    type Error = core::convert::Infallible;

    fn pixel_depth(&self) -> PixelDepth {
        self.depth
    }

    fn clear(&mut self) -> Result<(), Self::Error> {
        self.ops.push(RecordedOp::Clear);
        Ok(())
    }

    fn draw_glyph(&mut self, pos: Pos, glyph: &BitmapGlyph) -> Result<(), Self::Error> {
        self.ops.push(RecordedOp::Glyph(pos, glyph.codepoint));
        Ok(())
    }

    fn draw_image(&mut self, pos: Pos, image: &Image) -> Result<(), Self::Error> {
        self.ops.push(RecordedOp::Image(pos, image.dim));
        Ok(())
    }

    fn highlight(&mut self, pos: Pos, dim: Dim) -> Result<(), Self::Error> {
        self.ops.push(RecordedOp::Highlight(pos, dim));
        Ok(())
    }

    fn clear_highlight(&mut self, pos: Pos, dim: Dim) -> Result<(), Self::Error> {
        self.ops.push(RecordedOp::ClearHighlight(pos, dim));
        Ok(())
    }

    fn clear_region(&mut self, pos: Pos, dim: Dim) -> Result<(), Self::Error> {
        self.ops.push(RecordedOp::ClearRegion(pos, dim));
        Ok(())
    }

    fn set_region(&mut self, pos: Pos, dim: Dim) -> Result<(), Self::Error> {
        self.ops.push(RecordedOp::SetRegion(pos, dim));
        Ok(())
    }

    fn update(&mut self, no_full: bool) -> Result<(), Self::Error> {
        self.ops.push(RecordedOp::Update { no_full });
        Ok(())
    }
}
