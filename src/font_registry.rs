//! Indexed set of loaded faces with style resolution.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::FontError;
use crate::format::Format;
use crate::glyph_cache::{GlyphRasterCache, RasterOptions};
use crate::rasterizer::{FaceLoader, FontSource, FontdueLoader, PixelDepth};

/// Family name used when a style is missing from the requested family.
pub const DEFAULT_FAMILY: &str = "Default";

/// Resolved face style.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaceStyle {
    #[default]
    Normal,
    Bold,
    Italic,
    BoldItalic,
}

/// Slant requested by markup (`font-style`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontSlant {
    Normal,
    Italic,
}

/// Weight requested by markup (`font-weight`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontWeight {
    Normal,
    Bold,
}

impl FaceStyle {
    /// Combine an inherited style with slant and weight requests.
    ///
    /// The slant axis is applied first, then the weight axis; `None` leaves
    /// that axis untouched.
    pub fn adjust(self, slant: Option<FontSlant>, weight: Option<FontWeight>) -> Self {
        let mut style = self;
        match slant {
            Some(FontSlant::Italic) => {
                style = match style {
                    Self::Normal => Self::Italic,
                    Self::Bold => Self::BoldItalic,
                    other => other,
                };
            }
            Some(FontSlant::Normal) => {
                style = match style {
                    Self::BoldItalic => Self::Bold,
                    Self::Italic => Self::Normal,
                    other => other,
                };
            }
            None => {}
        }
        match weight {
            Some(FontWeight::Bold) => {
                style = match style {
                    Self::Italic => Self::BoldItalic,
                    Self::Normal => Self::Bold,
                    other => other,
                };
            }
            Some(FontWeight::Normal) => {
                style = match style {
                    Self::Bold => Self::Normal,
                    Self::BoldItalic => Self::Italic,
                    other => other,
                };
            }
            None => {}
        }
        style
    }
}

/// Registry sizing and per-face raster options.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryOptions {
    /// Leading entries kept (caches emptied) by a non-destructive `clear`.
    pub sticky_entries: usize,
    pub raster: RasterOptions,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            sticky_entries: 5,
            raster: RasterOptions::default(),
        }
    }
}

/// A face to load from disk at setup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceSpec {
    pub name: String,
    pub style: FaceStyle,
    pub path: PathBuf,
}

struct FontEntry<F> {
    name: String,
    style: FaceStyle,
    cache: GlyphRasterCache<F>,
}

/// Faces indexed in load order, each with its glyph cache.
pub struct FontRegistry<L: FaceLoader = FontdueLoader> {
    loader: L,
    options: RegistryOptions,
    entries: Vec<FontEntry<L::Face>>,
}

impl<L: FaceLoader> core::fmt::Debug for FontRegistry<L> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let faces: Vec<(&str, FaceStyle)> = self
            .entries
            .iter()
            .map(|entry| (entry.name.as_str(), entry.style))
            .collect();
        f.debug_struct("FontRegistry")
            .field("options", &self.options)
            .field("faces", &faces)
            .finish()
    }
}

impl<L> Default for FontRegistry<L>
where
    L: FaceLoader + Default,
{
    fn default() -> Self {
        Self::new(RegistryOptions::default())
    }
}

impl<L> FontRegistry<L>
where
    L: FaceLoader + Default,
{
    pub fn new(options: RegistryOptions) -> Self {
        Self::with_loader(L::default(), options)
    }
}

impl<L> FontRegistry<L>
where
    L: FaceLoader,
{
    pub fn with_loader(loader: L, options: RegistryOptions) -> Self {
        Self {
            loader,
            options,
            entries: Vec::with_capacity(options.sticky_entries.max(4)),
        }
    }

    /// Load the configured default faces, dropping everything loaded before.
    pub fn setup(&mut self, faces: &[FaceSpec]) -> Result<(), FontError> {
        log::debug!("fonts initialization ({} faces)", faces.len());
        self.clear(true);
        for face in faces {
            self.try_add(&face.name, face.style, FontSource::Path(&face.path))?;
        }
        Ok(())
    }

    /// Add a face; `true` when it is loaded, including when already present.
    pub fn add(&mut self, name: &str, style: FaceStyle, source: FontSource<'_>) -> bool {
        match self.try_add(name, style, source) {
            Ok(_) => true,
            Err(err) => {
                log::error!("font {} ({:?}) not added: {}", name, style, err);
                false
            }
        }
    }

    /// Add a face and return its index.
    pub fn try_add(
        &mut self,
        name: &str,
        style: FaceStyle,
        source: FontSource<'_>,
    ) -> Result<usize, FontError> {
        if let Some(index) = self.get_index(name, style) {
            return Ok(index);
        }
        let face = self.loader.load(name, source)?;
        let index = self.entries.len();
        self.entries.push(FontEntry {
            name: name.to_string(),
            style,
            cache: GlyphRasterCache::new(face, index, self.options.raster),
        });
        log::debug!(
            "font {} added to cache at index {} and style {:?}",
            name,
            index,
            style
        );
        Ok(index)
    }

    /// Glyph cache of face `index`; out-of-range indices fall back to face 0.
    ///
    /// `None` only when no face is loaded.
    pub fn get(&mut self, index: usize) -> Option<&mut GlyphRasterCache<L::Face>> {
        let index = self.checked_index(index)?;
        self.entries.get_mut(index).map(|entry| &mut entry.cache)
    }

    /// Family name of face `index`, with the same fallback as [`get`](Self::get).
    pub fn get_name(&self, index: usize) -> Option<&str> {
        let index = self.checked_index(index)?;
        self.entries.get(index).map(|entry| entry.name.as_str())
    }

    /// Style of face `index`, with the same fallback as [`get`](Self::get).
    pub fn get_style(&self, index: usize) -> Option<FaceStyle> {
        let index = self.checked_index(index)?;
        self.entries.get(index).map(|entry| entry.style)
    }

    pub fn get_index(&self, name: &str, style: FaceStyle) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.name == name && entry.style == style)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn options(&self) -> RegistryOptions {
        self.options
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Drop book faces, keeping the sticky defaults with emptied caches.
    ///
    /// With `all`, every face is released.
    pub fn clear(&mut self, all: bool) {
        let keep = if all {
            0
        } else {
            self.options.sticky_entries.min(self.entries.len())
        };
        log::debug!(
            "clearing fonts: keeping {} of {} faces",
            keep,
            self.entries.len()
        );
        self.entries.truncate(keep);
        for entry in &mut self.entries {
            entry.cache.clear();
        }
    }

    /// Empty every face's glyph cache, keeping the faces loaded.
    pub fn clear_glyph_caches(&mut self) {
        for entry in &mut self.entries {
            entry.cache.clear();
        }
    }

    /// Change the render mode of every face (cached bitmaps are dropped).
    pub fn set_pixel_depth(&mut self, depth: PixelDepth) {
        self.options.raster.pixel_depth = depth;
        for entry in &mut self.entries {
            entry.cache.set_pixel_depth(depth);
        }
    }

    /// See [`FaceStyle::adjust`].
    pub fn adjust_font_style(
        &self,
        style: FaceStyle,
        slant: Option<FontSlant>,
        weight: Option<FontWeight>,
    ) -> FaceStyle {
        style.adjust(slant, weight)
    }

    /// Point `fmt` at the face serving `style`.
    ///
    /// Tries the current family first, then [`DEFAULT_FAMILY`]; when neither
    /// has the style, falls back to the normal default face.
    pub fn reset_font_index(&self, fmt: &mut Format, style: FaceStyle) {
        if style == fmt.font_style {
            return;
        }
        let found = self
            .get_name(fmt.font_index)
            .and_then(|name| self.get_index(name, style))
            .or_else(|| self.get_index(DEFAULT_FAMILY, style));
        match found {
            Some(index) => {
                fmt.font_style = style;
                fmt.font_index = index;
            }
            None => {
                log::warn!(
                    "no face for style {:?} of font {}, using default",
                    style,
                    fmt.font_index
                );
                fmt.font_style = FaceStyle::Normal;
                fmt.font_index = self
                    .get_index(DEFAULT_FAMILY, FaceStyle::Normal)
                    .unwrap_or(0);
            }
        }
    }

    /// Release every face, returning the loader.
    pub fn into_loader(mut self) -> L {
        self.clear(true);
        self.loader
    }

    fn checked_index(&self, index: usize) -> Option<usize> {
        if self.entries.is_empty() {
            log::error!("font registry is empty, index {} unavailable", index);
            return None;
        }
        if index >= self.entries.len() {
            log::error!(
                "{}",
                FontError::IndexOutOfRange {
                    index,
                    len: self.entries.len()
                }
            );
            return Some(0);
        }
        Some(index)
    }
}
