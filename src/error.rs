//! Error types for font loading, glyph caching and page layout.

use std::path::PathBuf;

/// Font registry and glyph cache error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FontError {
    /// The font payload could not be parsed as a usable face.
    Load { name: String, reason: String },
    /// The font file could not be read.
    Io { path: PathBuf, reason: String },
    /// The rasterizer failed to produce a bitmap for a mapped glyph.
    Raster { codepoint: char, reason: String },
    /// The face has no glyph for this code point.
    Unmapped(char),
    /// The glyph byte pool cannot satisfy a bitmap request.
    PoolExhausted { requested: usize, block_size: usize },
    /// A face index beyond the registry length.
    IndexOutOfRange { index: usize, len: usize },
}

impl core::fmt::Display for FontError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Load { name, reason } => write!(f, "unable to load font {}: {}", name, reason),
            Self::Io { path, reason } => {
                write!(f, "unable to read font file {}: {}", path.display(), reason)
            }
            Self::Raster { codepoint, reason } => write!(
                f,
                "unable to render glyph U+{:04X}: {}",
                *codepoint as u32, reason
            ),
            Self::Unmapped(codepoint) => {
                write!(f, "code point U+{:04X} not found in face", *codepoint as u32)
            }
            Self::PoolExhausted {
                requested,
                block_size,
            } => write!(
                f,
                "glyph pool exhausted (requested={} block_size={})",
                requested, block_size
            ),
            Self::IndexOutOfRange { index, len } => {
                write!(f, "font index {} out of range (len={})", index, len)
            }
        }
    }
}

impl std::error::Error for FontError {}

/// Layout engine error.
///
/// Running out of room on a page is not an error: layout calls report it as
/// `Ok(false)`. Errors here leave the engine state as it was before the call,
/// so the caller may release memory (for instance with
/// [`FontRegistry::clear_glyph_caches`](crate::FontRegistry::clear_glyph_caches))
/// and retry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LayoutError {
    /// Glyph cache failure that cannot be degraded to a skipped glyph.
    Font(FontError),
    /// The display list reached its configured entry limit.
    PoolExhausted { limit: usize },
}

impl core::fmt::Display for LayoutError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Font(err) => write!(f, "layout font failure: {}", err),
            Self::PoolExhausted { limit } => {
                write!(f, "display list entry pool exhausted (limit={})", limit)
            }
        }
    }
}

impl std::error::Error for LayoutError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Font(err) => Some(err),
            Self::PoolExhausted { .. } => None,
        }
    }
}

impl From<FontError> for LayoutError {
    fn from(value: FontError) -> Self {
        Self::Font(value)
    }
}

impl LayoutError {
    /// True when the failure is a memory-pool limit the caller can relieve.
    pub fn is_pool_exhausted(&self) -> bool {
        matches!(
            self,
            Self::PoolExhausted { .. } | Self::Font(FontError::PoolExhausted { .. })
        )
    }
}
