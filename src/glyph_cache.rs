//! Per-face glyph rasterization cache with pool-carved bitmap storage.

use std::collections::HashMap;

use bytes::{Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::error::FontError;
use crate::format::Dim;
use crate::rasterizer::{GlyphMetrics, GlyphRasterizer, LineMetrics, PixelDepth, RasterOutput};

/// Rasterization and glyph-pool limits for one face.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterOptions {
    /// Render mode selector, taken from the target panel.
    pub pixel_depth: PixelDepth,
    /// Size of each pool block bitmaps are carved from.
    pub pool_block_bytes: usize,
    /// Maximum pool blocks held at once by one face.
    pub max_pool_blocks: usize,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            pixel_depth: PixelDepth::OneBit,
            pool_block_bytes: 16 * 1024,
            max_pool_blocks: 64,
        }
    }
}

/// Identifies the face and size a glyph was rendered with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FaceHandle {
    pub font_index: usize,
    pub size_px: u16,
}

/// Rasterized glyph bitmap plus metrics.
///
/// Pixels live in a shared pool block; clones are cheap and keep the block
/// alive, so a glyph placed in a display list outlives a cache clear.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitmapGlyph {
    pub face: FaceHandle,
    pub codepoint: char,
    pub dim: Dim,
    /// Bytes per bitmap row.
    pub pitch: usize,
    pub xoff: i32,
    pub yoff: i32,
    pub advance: i32,
    pub depth: PixelDepth,
    pixels: Bytes,
}

impl BitmapGlyph {
    /// Raw bitmap rows.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Ink test for one bitmap pixel; gray coverage counts from half intensity.
    pub fn pixel_is_on(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x >= self.dim.width || y >= self.dim.height {
            return false;
        }
        let (x, y) = (x as usize, y as usize);
        match self.depth {
            PixelDepth::OneBit => self
                .pixels
                .get(y * self.pitch + x / 8)
                .is_some_and(|byte| byte & (0x80 >> (x % 8)) != 0),
            PixelDepth::EightBit => self
                .pixels
                .get(y * self.pitch + x)
                .is_some_and(|value| *value >= 0x80),
        }
    }

    pub fn metrics(&self) -> GlyphMetrics {
        GlyphMetrics {
            width: self.dim.width,
            height: self.dim.height,
            xoff: self.xoff,
            yoff: self.yoff,
            advance: self.advance,
        }
    }
}

/// Bump allocator over fixed-size blocks.
///
/// Handed-out slices share their block's allocation; dropping the pool only
/// forgets the blocks, the memory is returned once the last slice is gone.
#[derive(Debug)]
struct BytePool {
    block_size: usize,
    max_blocks: usize,
    blocks: usize,
    used: usize,
    current: BytesMut,
}

impl BytePool {
    fn new(block_size: usize, max_blocks: usize) -> Self {
        Self {
            block_size: block_size.max(1),
            max_blocks,
            blocks: 0,
            used: 0,
            current: BytesMut::new(),
        }
    }

    fn alloc(&mut self, data: &[u8]) -> Result<Bytes, FontError> {
        if data.is_empty() {
            return Ok(Bytes::new());
        }
        if data.len() > self.block_size {
            log::error!(
                "glyph bitmap of {} bytes exceeds pool block size {}",
                data.len(),
                self.block_size
            );
            return Err(FontError::PoolExhausted {
                requested: data.len(),
                block_size: self.block_size,
            });
        }
        if self.blocks == 0 || self.current.capacity() < data.len() {
            if self.blocks >= self.max_blocks {
                log::error!("glyph pool limit of {} blocks reached", self.max_blocks);
                return Err(FontError::PoolExhausted {
                    requested: data.len(),
                    block_size: self.block_size,
                });
            }
            log::debug!("adding glyph pool block {}", self.blocks + 1);
            self.current = BytesMut::with_capacity(self.block_size);
            self.blocks += 1;
        }
        self.current.extend_from_slice(data);
        self.used += data.len();
        Ok(self.current.split().freeze())
    }

    fn clear(&mut self) {
        self.current = BytesMut::new();
        self.blocks = 0;
        self.used = 0;
    }
}

#[derive(Clone, Debug)]
enum GlyphSlot {
    Unmapped,
    Measured {
        glyph_index: u16,
        metrics: GlyphMetrics,
        bitmap: Option<BitmapGlyph>,
    },
}

/// Glyph cache for one face, keyed by (pixel size, code point).
pub struct GlyphRasterCache<F> {
    face: F,
    font_index: usize,
    options: RasterOptions,
    current_size: Option<u16>,
    glyphs: HashMap<u16, HashMap<char, GlyphSlot>>,
    line_metrics: HashMap<u16, LineMetrics>,
    pool: BytePool,
}

impl<F: GlyphRasterizer> core::fmt::Debug for GlyphRasterCache<F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GlyphRasterCache")
            .field("font_index", &self.font_index)
            .field("current_size", &self.current_size)
            .field("cached_glyphs", &self.cached_glyphs())
            .field("pool_blocks", &self.pool.blocks)
            .finish()
    }
}

impl<F> GlyphRasterCache<F>
where
    F: GlyphRasterizer,
{
    pub fn new(face: F, font_index: usize, options: RasterOptions) -> Self {
        Self {
            face,
            font_index,
            options,
            current_size: None,
            glyphs: HashMap::new(),
            line_metrics: HashMap::new(),
            pool: BytePool::new(options.pool_block_bytes, options.max_pool_blocks),
        }
    }

    /// Rasterized glyph for `codepoint` at `size_px`.
    ///
    /// `Ok(None)` means the glyph should be skipped: the face does not map the
    /// code point or rendering failed. `Err` is reserved for pool exhaustion.
    pub fn get(&mut self, codepoint: char, size_px: u16) -> Result<Option<BitmapGlyph>, FontError> {
        if let Some(GlyphSlot::Measured {
            bitmap: Some(bitmap),
            ..
        }) = self.slot(codepoint, size_px)
        {
            return Ok(Some(bitmap.clone()));
        }
        let Some((glyph_index, _)) = self.measure(codepoint, size_px) else {
            return Ok(None);
        };
        if !self.ensure_size(size_px) {
            return Ok(None);
        }
        let rendered = self
            .face
            .render(glyph_index, self.options.pixel_depth)
            .and_then(|output| check_raster(codepoint, output));
        let output = match rendered {
            Ok(output) => output,
            Err(err) => {
                log::warn!("font {}: {}", self.font_index, err);
                return Ok(None);
            }
        };
        let pixels = self.pool.alloc(&output.pixels)?;
        let bitmap = BitmapGlyph {
            face: FaceHandle {
                font_index: self.font_index,
                size_px,
            },
            codepoint,
            dim: Dim::new(output.metrics.width, output.metrics.height),
            pitch: output.pitch,
            xoff: output.metrics.xoff,
            yoff: output.metrics.yoff,
            advance: output.metrics.advance,
            depth: self.options.pixel_depth,
            pixels,
        };
        if let Some(GlyphSlot::Measured { bitmap: slot, .. }) = self
            .glyphs
            .get_mut(&size_px)
            .and_then(|by_char| by_char.get_mut(&codepoint))
        {
            *slot = Some(bitmap.clone());
        }
        Ok(Some(bitmap))
    }

    /// Metrics for `codepoint` at `size_px` without rasterizing.
    pub fn metrics(&mut self, codepoint: char, size_px: u16) -> Option<GlyphMetrics> {
        self.measure(codepoint, size_px).map(|(_, metrics)| metrics)
    }

    /// Face ascent/descent at `size_px`.
    pub fn line_metrics(&mut self, size_px: u16) -> LineMetrics {
        if let Some(metrics) = self.line_metrics.get(&size_px) {
            return *metrics;
        }
        let metrics = if self.ensure_size(size_px) {
            self.face.line_metrics()
        } else {
            LineMetrics {
                ascent: i32::from(size_px) * 4 / 5,
                descent: i32::from(size_px) / 5,
            }
        };
        self.line_metrics.insert(size_px, metrics);
        metrics
    }

    /// Advance width and ink height of `text` at `size_px`.
    pub fn text_size(&mut self, text: &str, size_px: u16) -> Dim {
        let mut width = 0;
        let mut max_up = 0;
        let mut max_down = 0;
        for ch in text.chars() {
            if let Some(metrics) = self.metrics(ch, size_px) {
                width += metrics.advance;
                max_up = max_up.max(metrics.ascent());
                max_down = max_down.max(metrics.descent());
            }
        }
        Dim::new(width, max_up + max_down)
    }

    /// Drop every cached glyph and pool block.
    pub fn clear(&mut self) {
        log::debug!(
            "clearing glyph cache of font {} ({} glyphs, {} pool blocks)",
            self.font_index,
            self.cached_glyphs(),
            self.pool.blocks
        );
        self.glyphs.clear();
        self.line_metrics.clear();
        self.pool.clear();
    }

    /// Switch render mode; cached bitmaps of the old depth are dropped.
    pub fn set_pixel_depth(&mut self, depth: PixelDepth) {
        if self.options.pixel_depth != depth {
            self.options.pixel_depth = depth;
            self.clear();
        }
    }

    pub fn options(&self) -> RasterOptions {
        self.options
    }

    pub fn font_index(&self) -> usize {
        self.font_index
    }

    pub fn face(&self) -> &F {
        &self.face
    }

    /// Number of (size, code point) entries, measured or rasterized.
    pub fn cached_glyphs(&self) -> usize {
        self.glyphs.values().map(HashMap::len).sum()
    }

    pub fn pool_blocks(&self) -> usize {
        self.pool.blocks
    }

    pub fn pool_bytes_used(&self) -> usize {
        self.pool.used
    }

    fn slot(&self, codepoint: char, size_px: u16) -> Option<&GlyphSlot> {
        self.glyphs
            .get(&size_px)
            .and_then(|by_char| by_char.get(&codepoint))
    }

    fn measure(&mut self, codepoint: char, size_px: u16) -> Option<(u16, GlyphMetrics)> {
        match self.slot(codepoint, size_px) {
            Some(GlyphSlot::Unmapped) => return None,
            Some(GlyphSlot::Measured {
                glyph_index,
                metrics,
                ..
            }) => return Some((*glyph_index, *metrics)),
            None => {}
        }

        let Some(glyph_index) = self.face.glyph_index(codepoint) else {
            log::warn!("font {}: {}", self.font_index, FontError::Unmapped(codepoint));
            self.glyphs
                .entry(size_px)
                .or_default()
                .insert(codepoint, GlyphSlot::Unmapped);
            return None;
        };
        if !self.ensure_size(size_px) {
            return None;
        }
        match self.face.glyph_metrics(glyph_index) {
            Ok(metrics) => {
                self.glyphs.entry(size_px).or_default().insert(
                    codepoint,
                    GlyphSlot::Measured {
                        glyph_index,
                        metrics,
                        bitmap: None,
                    },
                );
                Some((glyph_index, metrics))
            }
            Err(err) => {
                log::warn!("font {}: {}", self.font_index, err);
                None
            }
        }
    }

    fn ensure_size(&mut self, size_px: u16) -> bool {
        if self.current_size == Some(size_px) {
            return true;
        }
        match self.face.set_pixel_size(size_px) {
            Ok(()) => {
                self.current_size = Some(size_px);
                true
            }
            Err(err) => {
                log::error!("unable to set font {} size {}: {}", self.font_index, size_px, err);
                false
            }
        }
    }
}

/// Reject a bitmap too short for its declared rows.
fn check_raster(codepoint: char, output: RasterOutput) -> Result<RasterOutput, FontError> {
    let rows = usize::try_from(output.metrics.height).unwrap_or(0);
    let needed = output.pitch * rows;
    if output.pixels.len() < needed {
        return Err(FontError::Raster {
            codepoint,
            reason: format!("bitmap holds {} of {} bytes", output.pixels.len(), needed),
        });
    }
    Ok(output)
}
