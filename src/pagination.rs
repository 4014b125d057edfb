//! Page-break indexing and page seeking over a token stream.
//!
//! The layout engine breaks pages one call at a time; this module drives it
//! over a whole document:
//!
//! - [`locate_pages`] sweeps the document in [`ComputeMode::Location`] and
//!   records where each page starts,
//! - [`show_page`] lays out one page from a recorded start for display,
//! - [`seek_page`] skips pages in [`ComputeMode::Move`] when no index exists.

use crate::display_list::Image;
use crate::error::LayoutError;
use crate::format::Format;
use crate::page::{ComputeMode, LayoutEngine};
use crate::rasterizer::FaceLoader;

/// One layout input produced by a document reader.
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    ParagraphStart,
    Word(String),
    /// Character glued to the preceding word; whitespace separates words.
    Char(char),
    LineBreak {
        indent: bool,
    },
    ParagraphEnd,
    Image(Image),
}

/// A token with the format it is laid out with.
#[derive(Clone, Debug, PartialEq)]
pub struct StyledToken {
    pub token: Token,
    pub fmt: Format,
}

impl StyledToken {
    pub fn new(token: Token, fmt: Format) -> Self {
        Self { token, fmt }
    }
}

/// Tokens for plain text: paragraphs are separated by blank lines, words by
/// whitespace, every token styled with `fmt`.
pub fn text_tokens(text: &str, fmt: &Format) -> Vec<StyledToken> {
    let mut tokens = Vec::new();
    let mut open = false;
    for line in text.lines() {
        if line.trim().is_empty() {
            if open {
                tokens.push(StyledToken::new(Token::ParagraphEnd, *fmt));
                open = false;
            }
            continue;
        }
        if !open {
            tokens.push(StyledToken::new(Token::ParagraphStart, *fmt));
            open = true;
        }
        tokens.extend(
            line.split_whitespace()
                .map(|word| StyledToken::new(Token::Word(word.to_string()), *fmt)),
        );
    }
    if open {
        tokens.push(StyledToken::new(Token::ParagraphEnd, *fmt));
    }
    tokens
}

/// Start of a page within a token stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PageBreak {
    /// 0-based page number.
    pub page_index: usize,
    /// Offset of the first token on the page.
    pub start: usize,
    /// The page continues a paragraph opened on the previous page.
    pub mid_paragraph: bool,
}

/// Token range laid out on one page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PageSpan {
    pub start: usize,
    /// Offset of the first token not on the page.
    pub end: usize,
    /// The next page continues an open paragraph.
    pub next_mid_paragraph: bool,
}

impl PageSpan {
    pub fn is_last(&self, tokens: &[StyledToken]) -> bool {
        self.end >= tokens.len()
    }
}

/// Sweep `tokens` in LOCATION mode and return the start of every page.
///
/// The engine's compute mode is restored afterwards, also on error.
pub fn locate_pages<L>(
    engine: &mut LayoutEngine<L>,
    tokens: &[StyledToken],
    page_fmt: &Format,
) -> Result<Vec<PageBreak>, LayoutError>
where
    L: FaceLoader,
{
    let previous = engine.compute_mode();
    engine.set_compute_mode(ComputeMode::Location);
    let result = sweep(engine, tokens, page_fmt, None);
    engine.set_compute_mode(previous);
    let pages = result?.0;
    log::debug!("located {} pages over {} tokens", pages.len(), tokens.len());
    Ok(pages)
}

/// Lay out the page starting at `page` in DISPLAY mode, ready to paint.
pub fn show_page<L>(
    engine: &mut LayoutEngine<L>,
    tokens: &[StyledToken],
    page_fmt: &Format,
    page: &PageBreak,
) -> Result<PageSpan, LayoutError>
where
    L: FaceLoader,
{
    engine.set_compute_mode(ComputeMode::Display);
    lay_out_page(engine, tokens, page_fmt, page.start, page.mid_paragraph)
}

/// Skip to page `page_index` in MOVE mode, then lay it out for display.
///
/// Returns `None` when the document has fewer pages.
pub fn seek_page<L>(
    engine: &mut LayoutEngine<L>,
    tokens: &[StyledToken],
    page_fmt: &Format,
    page_index: usize,
) -> Result<Option<PageSpan>, LayoutError>
where
    L: FaceLoader,
{
    engine.set_compute_mode(ComputeMode::Move);
    let (pages, next) = match sweep(engine, tokens, page_fmt, Some(page_index)) {
        Ok(found) => found,
        Err(err) => {
            engine.set_compute_mode(ComputeMode::Display);
            return Err(err);
        }
    };
    let target = match pages.last() {
        Some(page) if page.page_index == page_index => *page,
        _ => {
            engine.set_compute_mode(ComputeMode::Display);
            log::warn!("page {} past the end ({} pages)", page_index, next);
            return Ok(None);
        }
    };
    show_page(engine, tokens, page_fmt, &target).map(Some)
}

// Lay out pages until the tokens run out, or until page `stop_at` is reached
// (its start is recorded but it is not laid out). Returns the page starts and
// the number of pages laid out.
fn sweep<L>(
    engine: &mut LayoutEngine<L>,
    tokens: &[StyledToken],
    page_fmt: &Format,
    stop_at: Option<usize>,
) -> Result<(Vec<PageBreak>, usize), LayoutError>
where
    L: FaceLoader,
{
    let mut pages = Vec::new();
    let mut start = 0;
    let mut mid_paragraph = false;
    while start < tokens.len() {
        let page_index = pages.len();
        pages.push(PageBreak {
            page_index,
            start,
            mid_paragraph,
        });
        if stop_at == Some(page_index) {
            return Ok((pages, page_index));
        }
        let span = lay_out_page(engine, tokens, page_fmt, start, mid_paragraph)?;
        start = span.end;
        mid_paragraph = span.next_mid_paragraph;
    }
    let laid_out = pages.len();
    Ok((pages, laid_out))
}

fn lay_out_page<L>(
    engine: &mut LayoutEngine<L>,
    tokens: &[StyledToken],
    page_fmt: &Format,
    start: usize,
    mid_paragraph: bool,
) -> Result<PageSpan, LayoutError>
where
    L: FaceLoader,
{
    engine.start(page_fmt);
    let mut in_paragraph = mid_paragraph;
    if mid_paragraph {
        if let Some(first) = tokens.get(start) {
            engine.new_paragraph(&first.fmt, true)?;
        }
    }

    let mut index = start;
    while let Some(StyledToken { token, fmt }) = tokens.get(index) {
        let was_empty = engine.is_empty();
        let placed = match token {
            Token::ParagraphStart => {
                let opened = engine.new_paragraph(fmt, false)?;
                in_paragraph |= opened;
                opened
            }
            Token::Word(word) => engine.add_word(word, fmt)?,
            Token::Char(ch) => engine.add_char(*ch, fmt)?,
            Token::LineBreak { indent } => engine.line_break(fmt, *indent)?,
            Token::ParagraphEnd => {
                in_paragraph = false;
                if !engine.end_paragraph(fmt)? {
                    // The text is committed; only the bottom margin is lost.
                    index += 1;
                    break;
                }
                true
            }
            Token::Image(image) => engine.add_image(image, fmt)?,
        };
        if !placed {
            if was_empty || index == start {
                log::warn!("token {} does not fit on an empty page, skipped", index);
                index += 1;
            } else {
                index = withheld_word_start(tokens, start, index, engine.withheld_fragments());
            }
            break;
        }
        index += 1;
    }

    Ok(PageSpan {
        start,
        end: index,
        next_mid_paragraph: in_paragraph && index < tokens.len(),
    })
}

/// Walk back from `index` over the `withheld` fragment tokens of a word the
/// engine dropped at the page end. Never returns `start` or earlier.
fn withheld_word_start(
    tokens: &[StyledToken],
    start: usize,
    index: usize,
    withheld: usize,
) -> usize {
    let mut remaining = withheld;
    let mut first = index;
    while remaining > 0 && first > start + 1 {
        first -= 1;
        let StyledToken { token, fmt } = &tokens[first];
        let fragment = match token {
            Token::Word(word) if fmt.trim => !word.trim().is_empty(),
            Token::Word(word) => !word.is_empty(),
            Token::Char(ch) => fmt.pre || !ch.is_whitespace(),
            _ => false,
        };
        if fragment {
            remaining -= 1;
        }
    }
    if remaining > 0 {
        log::warn!("word ending at token {} split across pages", index);
        return index;
    }
    first
}
