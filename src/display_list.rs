//! Positioned draw primitives and the surface they are replayed on.

use bytes::Bytes;

use crate::error::LayoutError;
use crate::format::{Dim, Pos};
use crate::glyph_cache::BitmapGlyph;
use crate::rasterizer::PixelDepth;

/// Decoded image bitmap placed by the layout engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    pub dim: Dim,
    pub depth: PixelDepth,
    /// Bytes per bitmap row.
    pub pitch: usize,
    pixels: Bytes,
}

impl Image {
    /// 1bpp image with MSB-first rows of `ceil(width / 8)` bytes.
    pub fn mono(width: i32, height: i32, pixels: impl Into<Bytes>) -> Self {
        Self {
            dim: Dim::new(width, height),
            depth: PixelDepth::OneBit,
            pitch: (width.max(0) as usize).div_ceil(8),
            pixels: pixels.into(),
        }
    }

    /// 8-bit gray image with rows of `width` bytes.
    pub fn gray(width: i32, height: i32, pixels: impl Into<Bytes>) -> Self {
        Self {
            dim: Dim::new(width, height),
            depth: PixelDepth::EightBit,
            pitch: width.max(0) as usize,
            pixels: pixels.into(),
        }
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Ink test for one pixel; gray values below half intensity are ink.
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
                .is_some_and(|value| *value < 0x80),
        }
    }
}

/// Kind of a display list entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntryKind {
    /// Glyph bitmap; the entry position is the bitmap's top-left corner.
    Glyph(BitmapGlyph),
    Image(Image),
    /// Selection cursor drawn over content.
    Highlight(Dim),
    /// Removes a previously drawn highlight.
    ClearHighlight(Dim),
    /// Erase a rectangle to background.
    ClearRegion(Dim),
    /// Fill a rectangle with ink.
    SetRegion(Dim),
}

/// One positioned draw primitive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayListEntry {
    pub pos: Pos,
    pub kind: EntryKind,
}

impl DisplayListEntry {
    pub fn new(pos: Pos, kind: EntryKind) -> Self {
        Self { pos, kind }
    }

    /// Width and height covered by the entry.
    pub fn dim(&self) -> Dim {
        match &self.kind {
            EntryKind::Glyph(glyph) => glyph.dim,
            EntryKind::Image(image) => image.dim,
            EntryKind::Highlight(dim)
            | EntryKind::ClearHighlight(dim)
            | EntryKind::ClearRegion(dim)
            | EntryKind::SetRegion(dim) => *dim,
        }
    }
}

/// Ordered draw primitives for a page or a pending line.
///
/// `clear` keeps the allocation, so a list reused page after page stops
/// touching the heap once it has grown to the largest page.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DisplayList {
    entries: Vec<DisplayListEntry>,
    limit: Option<usize>,
}

impl DisplayList {
    /// Empty list; `limit` caps the number of entries it accepts.
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            entries: Vec::with_capacity(0),
            limit,
        }
    }

    pub fn with_capacity(capacity: usize, limit: Option<usize>) -> Self {
        let capacity = limit.map_or(capacity, |limit| capacity.min(limit));
        Self {
            entries: Vec::with_capacity(capacity),
            limit,
        }
    }

    pub fn push(&mut self, entry: DisplayListEntry) -> Result<(), LayoutError> {
        self.ensure_room(1)?;
        self.entries.push(entry);
        Ok(())
    }

    /// Move every entry of `other` to the end of this list.
    ///
    /// On error neither list is modified.
    pub fn append(&mut self, other: &mut DisplayList) -> Result<(), LayoutError> {
        self.ensure_room(other.entries.len())?;
        self.entries.append(&mut other.entries);
        Ok(())
    }

    /// Fail unless `additional` more entries fit under the limit.
    pub fn ensure_room(&self, additional: usize) -> Result<(), LayoutError> {
        match self.limit {
            Some(limit) if self.entries.len() + additional > limit => {
                log::error!(
                    "display list limit of {} entries reached ({} queued)",
                    limit,
                    self.entries.len()
                );
                Err(LayoutError::PoolExhausted { limit })
            }
            _ => Ok(()),
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn truncate(&mut self, len: usize) {
        self.entries.truncate(len);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.capacity()
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn entries(&self) -> &[DisplayListEntry] {
        &self.entries
    }

    pub fn iter(&self) -> core::slice::Iter<'_, DisplayListEntry> {
        self.entries.iter()
    }

    /// Shift entries from index `from` onwards horizontally.
    pub(crate) fn shift_x(&mut self, from: usize, dx: i32) {
        if dx == 0 {
            return;
        }
        for entry in self.entries.iter_mut().skip(from) {
            entry.pos.x += dx;
        }
    }

    /// Move every entry at and after `at` out of the list.
    pub(crate) fn split_off(&mut self, at: usize) -> Vec<DisplayListEntry> {
        self.entries.split_off(at.min(self.entries.len()))
    }

    /// Offset every entry by `(dx, dy)`.
    pub(crate) fn translate(&mut self, dx: i32, dy: i32) {
        for entry in &mut self.entries {
            entry.pos.x += dx;
            entry.pos.y += dy;
        }
    }

    /// Issue every entry, in order, against `surface`.
    pub fn replay<S>(&self, surface: &mut S) -> Result<(), S::Error>
    where
        S: Surface + ?Sized,
    {
        for entry in &self.entries {
            match &entry.kind {
                EntryKind::Glyph(glyph) => surface.draw_glyph(entry.pos, glyph)?,
                EntryKind::Image(image) => surface.draw_image(entry.pos, image)?,
                EntryKind::Highlight(dim) => surface.highlight(entry.pos, *dim)?,
                EntryKind::ClearHighlight(dim) => surface.clear_highlight(entry.pos, *dim)?,
                EntryKind::ClearRegion(dim) => surface.clear_region(entry.pos, *dim)?,
                EntryKind::SetRegion(dim) => surface.set_region(entry.pos, *dim)?,
            }
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a DisplayList {
    type Item = &'a DisplayListEntry;
    type IntoIter = core::slice::Iter<'a, DisplayListEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Output device a display list is painted on.
///
/// `update` is the refresh hook called once a page has been painted;
/// `no_full` asks the implementation to skip any full-refresh scheduling.
pub trait Surface {
    type Error;

    /// Panel depth, used to pick the glyph render mode.
    fn pixel_depth(&self) -> PixelDepth;

    fn clear(&mut self) -> Result<(), Self::Error>;

    fn draw_glyph(&mut self, pos: Pos, glyph: &BitmapGlyph) -> Result<(), Self::Error>;

    fn draw_image(&mut self, pos: Pos, image: &Image) -> Result<(), Self::Error>;

    fn highlight(&mut self, pos: Pos, dim: Dim) -> Result<(), Self::Error>;

    fn clear_highlight(&mut self, pos: Pos, dim: Dim) -> Result<(), Self::Error>;

    fn clear_region(&mut self, pos: Pos, dim: Dim) -> Result<(), Self::Error>;

    fn set_region(&mut self, pos: Pos, dim: Dim) -> Result<(), Self::Error>;

    fn update(&mut self, no_full: bool) -> Result<(), Self::Error>;
}
