//! Text layout, glyph caching and pagination for e-paper readers.
//!
//! Words and characters go in with a [`Format`]; a page [`DisplayList`] of
//! positioned glyphs, images and rectangles comes out, ready to be replayed
//! on a [`Surface`]. Page-break indexing runs the same layout in a
//! measure-only [`ComputeMode`], so breaks never depend on whether pixels are
//! produced.
//!
//! ```rust,no_run
//! use inkpage::{Format, ReaderSession, SessionConfig};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session: ReaderSession = ReaderSession::init(SessionConfig::default())?;
//! let fmt = Format::for_screen(480, 800);
//! let engine = session.engine_mut();
//! engine.start(&fmt);
//! engine.new_paragraph(&fmt, false)?;
//! for word in "It was a dark and stormy night".split(' ') {
//!     if !engine.add_word(word, &fmt)? {
//!         break;
//!     }
//! }
//! engine.end_paragraph(&fmt)?;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(
    not(test),
    deny(
        clippy::disallowed_methods,
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::panic_in_result_fn,
        clippy::todo,
        clippy::unimplemented
    )
)]

pub mod display_list;
pub mod error;
pub mod font_registry;
pub mod format;
pub mod glyph_cache;
pub mod page;
pub mod pagination;
pub mod rasterizer;
pub mod session;

#[cfg(test)]
mod test_support;

pub use display_list::{DisplayList, DisplayListEntry, EntryKind, Image, Surface};
pub use error::{FontError, LayoutError};
pub use font_registry::{
    FaceSpec, FaceStyle, FontRegistry, FontSlant, FontWeight, RegistryOptions, DEFAULT_FAMILY,
};
pub use format::{Align, Dim, Format, Pos, TextTransform};
pub use glyph_cache::{BitmapGlyph, FaceHandle, GlyphRasterCache, RasterOptions};
pub use page::{ComputeMode, LayoutEngine, LayoutOptions, PageState};
pub use pagination::{
    locate_pages, seek_page, show_page, text_tokens, PageBreak, PageSpan, StyledToken, Token,
};
pub use rasterizer::{
    FaceLoader, FontSource, FontdueFace, FontdueLoader, GlyphMetrics, GlyphRasterizer,
    LineMetrics, PixelDepth, RasterOutput,
};
pub use session::{ReaderSession, SessionConfig};
