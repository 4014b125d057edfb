//! Rasterizer seam between the glyph cache and a font engine.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::FontError;

/// Pixel depth of the target panel; selects the glyph render mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelDepth {
    /// 1 bit per pixel, rows packed MSB-first and padded to `pitch` bytes.
    #[default]
    OneBit,
    /// 8-bit coverage per pixel.
    EightBit,
}

/// Size, placement and advance of one glyph at one pixel size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct GlyphMetrics {
    pub width: i32,
    pub height: i32,
    /// Horizontal offset of the bitmap from the pen position.
    pub xoff: i32,
    /// Top of the bitmap relative to the baseline (negative is above).
    pub yoff: i32,
    /// Horizontal pen advance.
    pub advance: i32,
}

impl GlyphMetrics {
    /// Pixels above the baseline.
    pub fn ascent(&self) -> i32 {
        -self.yoff
    }

    /// Pixels below the baseline.
    pub fn descent(&self) -> i32 {
        self.height + self.yoff
    }
}

/// Face-wide vertical metrics at one pixel size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LineMetrics {
    pub ascent: i32,
    pub descent: i32,
}

/// Bitmap produced by a rasterizer, before it is copied into the glyph pool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterOutput {
    pub metrics: GlyphMetrics,
    /// Bytes per bitmap row.
    pub pitch: usize,
    pub pixels: Vec<u8>,
}

/// A loaded font face able to measure and render glyphs.
///
/// The active pixel size is state of the rasterizer: callers set it once and
/// then issue lookups at that size.
pub trait GlyphRasterizer {
    /// Reconfigure the active pixel size. Can be expensive.
    fn set_pixel_size(&mut self, size_px: u16) -> Result<(), FontError>;

    /// Glyph index for a code point, `None` when the face does not map it.
    fn glyph_index(&self, codepoint: char) -> Option<u16>;

    /// Metrics of a glyph at the active size.
    fn glyph_metrics(&mut self, glyph_index: u16) -> Result<GlyphMetrics, FontError>;

    /// Render a glyph at the active size.
    fn render(&mut self, glyph_index: u16, depth: PixelDepth) -> Result<RasterOutput, FontError>;

    /// Face ascent/descent at the active size.
    fn line_metrics(&self) -> LineMetrics;
}

/// Where a face's bytes come from.
#[derive(Clone, Copy, Debug)]
pub enum FontSource<'a> {
    /// TrueType/OpenType file on disk.
    Path(&'a Path),
    /// Font file already in memory.
    Memory(&'a [u8]),
}

/// Builds rasterizers for registry entries.
pub trait FaceLoader {
    type Face: GlyphRasterizer;

    fn load(&mut self, name: &str, source: FontSource<'_>) -> Result<Self::Face, FontError>;
}

/// `fontdue`-backed face.
pub struct FontdueFace {
    font: fontdue::Font,
    size_px: f32,
}

impl core::fmt::Debug for FontdueFace {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FontdueFace")
            .field("glyphs", &self.font.glyph_count())
            .field("size_px", &self.size_px)
            .finish()
    }
}

impl FontdueFace {
    /// Parse a face from TrueType/OpenType bytes.
    pub fn from_bytes(name: &str, data: &[u8]) -> Result<Self, FontError> {
        let font = fontdue::Font::from_bytes(data, fontdue::FontSettings::default()).map_err(
            |reason| FontError::Load {
                name: name.to_string(),
                reason: reason.to_string(),
            },
        )?;
        Ok(Self { font, size_px: 0.0 })
    }

    fn convert_metrics(metrics: &fontdue::Metrics) -> GlyphMetrics {
        let height = metrics.height as i32;
        GlyphMetrics {
            width: metrics.width as i32,
            height,
            xoff: metrics.xmin,
            yoff: -(metrics.ymin + height),
            advance: metrics.advance_width.round() as i32,
        }
    }
}

impl GlyphRasterizer for FontdueFace {
    fn set_pixel_size(&mut self, size_px: u16) -> Result<(), FontError> {
        self.size_px = f32::from(size_px);
        Ok(())
    }

    fn glyph_index(&self, codepoint: char) -> Option<u16> {
        let index = self.font.lookup_glyph_index(codepoint);
        (index != 0).then_some(index)
    }

    fn glyph_metrics(&mut self, glyph_index: u16) -> Result<GlyphMetrics, FontError> {
        let metrics = self.font.metrics_indexed(glyph_index, self.size_px);
        Ok(Self::convert_metrics(&metrics))
    }

    fn render(&mut self, glyph_index: u16, depth: PixelDepth) -> Result<RasterOutput, FontError> {
        let (metrics, coverage) = self.font.rasterize_indexed(glyph_index, self.size_px);
        let converted = Self::convert_metrics(&metrics);
        Ok(match depth {
            PixelDepth::EightBit => RasterOutput {
                metrics: converted,
                pitch: metrics.width,
                pixels: coverage,
            },
            PixelDepth::OneBit => {
                let (pitch, pixels) = pack_mono(metrics.width, metrics.height, &coverage);
                RasterOutput {
                    metrics: converted,
                    pitch,
                    pixels,
                }
            }
        })
    }

    fn line_metrics(&self) -> LineMetrics {
        match self.font.horizontal_line_metrics(self.size_px) {
            Some(line) => LineMetrics {
                ascent: line.ascent.round() as i32,
                descent: (-line.descent).round() as i32,
            },
            None => LineMetrics {
                ascent: (self.size_px * 0.8).round() as i32,
                descent: (self.size_px * 0.2).round() as i32,
            },
        }
    }
}

/// Default loader: reads files from disk and parses them with `fontdue`.
#[derive(Clone, Copy, Debug, Default)]
pub struct FontdueLoader;

impl FaceLoader for FontdueLoader {
    type Face = FontdueFace;

    fn load(&mut self, name: &str, source: FontSource<'_>) -> Result<Self::Face, FontError> {
        match source {
            FontSource::Path(path) => {
                let data = std::fs::read(path).map_err(|err| FontError::Io {
                    path: path.to_path_buf(),
                    reason: err.to_string(),
                })?;
                log::debug!("font file {} length: {}", path.display(), data.len());
                FontdueFace::from_bytes(name, &data)
            }
            FontSource::Memory(data) => FontdueFace::from_bytes(name, data),
        }
    }
}

/// Threshold 8-bit coverage into MSB-first 1bpp rows. Returns `(pitch, bits)`.
pub(crate) fn pack_mono(width: usize, height: usize, coverage: &[u8]) -> (usize, Vec<u8>) {
    let pitch = width.div_ceil(8);
    let mut bits = vec![0u8; pitch * height];
    for y in 0..height {
        for x in 0..width {
            let on = coverage.get(y * width + x).is_some_and(|value| *value >= 0x80);
            if on {
                bits[y * pitch + x / 8] |= 0x80 >> (x % 8);
            }
        }
    }
    (pitch, bits)
}
