//! Page layout engine: greedy line breaking into a page display list.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::display_list::{DisplayList, DisplayListEntry, EntryKind, Image, Surface};
use crate::error::{FontError, LayoutError};
use crate::font_registry::{FaceStyle, FontRegistry};
use crate::format::{Align, Dim, Format, Pos};
use crate::glyph_cache::BitmapGlyph;
use crate::rasterizer::{FaceLoader, FontdueLoader, PixelDepth};

/// Whether layout calls produce pixels.
///
/// Line and page breaks are computed identically in every mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComputeMode {
    /// Page-index sweep: measure only.
    Location,
    /// Skip ahead to a known page: measure only.
    Move,
    /// Interactive: rasterize and paint.
    #[default]
    Display,
}

impl ComputeMode {
    pub fn renders(self) -> bool {
        matches!(self, Self::Display)
    }
}

/// Fill state of the page being built.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PageState {
    #[default]
    Empty,
    Filling,
    Full,
}

/// Display list sizing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    /// Cap on committed entries per page; `None` is unbounded.
    pub max_display_list_entries: Option<usize>,
    /// Entries reserved up front for the pending line.
    pub initial_line_capacity: usize,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            max_display_list_entries: None,
            initial_line_capacity: 64,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct LineWord {
    /// First entry of the word in the pending line list.
    entry_start: usize,
    /// Natural offset from the line start.
    x: i32,
    width: i32,
    ascent: i32,
    /// Natural space before the word; zero for the first word.
    gap_before: i32,
    /// Fragments glued into the word.
    fragments: usize,
}

#[derive(Clone, Copy, Debug, Default)]
struct PendingLine {
    open: bool,
    left: i32,
    avail: i32,
    width: i32,
    ascent: i32,
    height: i32,
    align: Align,
}

#[derive(Clone, Debug)]
struct PlacedGlyph {
    x: i32,
    y: i32,
    glyph: BitmapGlyph,
}

#[derive(Clone, Copy, Debug, Default)]
struct Shaped {
    width: i32,
    ascent: i32,
    descent: i32,
}

type WordList = SmallVec<[LineWord; 16]>;

/// Builds one page at a time from words, characters and images.
///
/// Calls that run out of vertical room return `Ok(false)` and leave the
/// engine in [`PageState::Full`]; the page built so far stays committed and
/// paintable. `Err` is reserved for memory limits, with the engine left as it
/// was before the call.
pub struct LayoutEngine<L: FaceLoader = FontdueLoader> {
    fonts: FontRegistry<L>,
    options: LayoutOptions,
    mode: ComputeMode,
    state: PageState,
    page: DisplayList,
    line: DisplayList,
    words: WordList,
    pending: PendingLine,
    scratch: Vec<PlacedGlyph>,
    glue_next: bool,
    /// Fragments of a glued word withheld when the page filled.
    withheld: usize,
    /// Something was placed since `start`, in any mode.
    has_content: bool,
    next_indent: i32,
    committed_lines: usize,
    cursor_y: i32,
    top: i32,
    bottom: i32,
    left: i32,
    right: i32,
    para_left: i32,
    para_right: i32,
}

impl<L: FaceLoader> core::fmt::Debug for LayoutEngine<L> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LayoutEngine")
            .field("mode", &self.mode)
            .field("state", &self.state)
            .field("cursor_y", &self.cursor_y)
            .field("page_entries", &self.page.len())
            .field("line_entries", &self.line.len())
            .field("committed_lines", &self.committed_lines)
            .finish()
    }
}

impl<L> LayoutEngine<L>
where
    L: FaceLoader,
{
    pub fn new(fonts: FontRegistry<L>, options: LayoutOptions) -> Self {
        let fmt = Format::default();
        let mut engine = Self {
            fonts,
            options,
            mode: ComputeMode::Display,
            state: PageState::Empty,
            page: DisplayList::new(options.max_display_list_entries),
            line: DisplayList::with_capacity(options.initial_line_capacity, None),
            words: SmallVec::new(),
            pending: PendingLine::default(),
            scratch: Vec::with_capacity(32),
            glue_next: false,
            withheld: 0,
            has_content: false,
            next_indent: 0,
            committed_lines: 0,
            cursor_y: 0,
            top: 0,
            bottom: 0,
            left: 0,
            right: 0,
            para_left: 0,
            para_right: 0,
        };
        engine.set_limits(&fmt);
        engine
    }

    pub fn fonts(&self) -> &FontRegistry<L> {
        &self.fonts
    }

    pub fn fonts_mut(&mut self) -> &mut FontRegistry<L> {
        &mut self.fonts
    }

    pub fn into_fonts(self) -> FontRegistry<L> {
        self.fonts
    }

    pub fn options(&self) -> LayoutOptions {
        self.options
    }

    pub fn set_compute_mode(&mut self, mode: ComputeMode) {
        self.mode = mode;
    }

    pub fn compute_mode(&self) -> ComputeMode {
        self.mode
    }

    /// Select the glyph render mode matching the target panel.
    pub fn set_pixel_depth(&mut self, depth: PixelDepth) {
        self.fonts.set_pixel_depth(depth);
    }

    /// Clear the page and pending line, then apply `fmt` limits.
    pub fn start(&mut self, fmt: &Format) {
        self.page.clear();
        self.line.clear();
        self.words.clear();
        self.scratch.clear();
        self.pending = PendingLine::default();
        self.committed_lines = 0;
        self.withheld = 0;
        self.has_content = false;
        self.set_limits(fmt);
    }

    /// Number of fragments of the word in progress that were dropped when
    /// the page filled, so the caller can replay the whole word on the next
    /// page.
    pub fn withheld_fragments(&self) -> usize {
        self.withheld
    }

    /// Take the drawable rectangle from `fmt` and move to its top-left.
    ///
    /// Content already committed is kept.
    pub fn set_limits(&mut self, fmt: &Format) {
        self.top = fmt.screen_top;
        self.bottom = fmt.screen_bottom;
        self.left = fmt.screen_left;
        self.right = fmt.screen_right;
        self.para_left = fmt.screen_left + fmt.margin_left;
        self.para_right = (fmt.screen_right - fmt.margin_right).max(self.para_left);
        self.cursor_y = fmt.screen_top;
        self.next_indent = 0;
        self.glue_next = false;
        self.state = if self.has_content {
            PageState::Filling
        } else {
            PageState::Empty
        };
    }

    /// Open a paragraph. `recover` continues a paragraph begun on a previous
    /// page, so the first-line indent is not applied.
    pub fn new_paragraph(&mut self, fmt: &Format, recover: bool) -> Result<bool, LayoutError> {
        if self.state == PageState::Full {
            return Ok(false);
        }
        self.flush_line(false)?;
        self.glue_next = false;
        if self.cursor_y > self.top {
            self.cursor_y += fmt.margin_top.max(0);
        }
        self.para_left = self.left + fmt.margin_left;
        self.para_right = (self.right - fmt.margin_right).max(self.para_left);
        self.next_indent = if recover { 0 } else { fmt.indent };
        if !self.has_room_for(fmt.line_height_px()) {
            self.state = PageState::Full;
            return Ok(false);
        }
        Ok(true)
    }

    /// Append a word, breaking the line before it when it does not fit.
    ///
    /// Returns `Ok(false)` without placing the word when the page has no
    /// room left for the line it needs.
    pub fn add_word(&mut self, word: &str, fmt: &Format) -> Result<bool, LayoutError> {
        let word = if fmt.trim { word.trim() } else { word };
        let placed = self.place_fragment(word, fmt, false)?;
        if placed {
            self.glue_next = true;
        }
        Ok(placed)
    }

    /// Append one character to the current word.
    ///
    /// Whitespace ends the word unless `fmt.pre` is set, in which case it is
    /// placed with its own advance.
    pub fn add_char(&mut self, ch: char, fmt: &Format) -> Result<bool, LayoutError> {
        if self.state == PageState::Full {
            return Ok(false);
        }
        if ch.is_whitespace() && !fmt.pre {
            self.glue_next = false;
            return Ok(true);
        }
        let mut buf = [0u8; 4];
        let text: &str = ch.encode_utf8(&mut buf);
        let placed = self.place_fragment(text, fmt, self.glue_next)?;
        if placed {
            self.glue_next = true;
        }
        Ok(placed)
    }

    /// Commit the pending line without justification.
    ///
    /// With nothing pending, moves down one blank line when there is room.
    /// `indent_next` applies `fmt.indent` to the following line.
    pub fn line_break(&mut self, fmt: &Format, indent_next: bool) -> Result<bool, LayoutError> {
        if self.state == PageState::Full {
            return Ok(false);
        }
        if self.pending.open {
            self.flush_line(false)?;
        } else {
            let height = fmt.line_height_px();
            if self.has_room_for(height) {
                self.cursor_y += height;
                self.mark_filling();
            }
        }
        self.glue_next = false;
        self.next_indent = if indent_next { fmt.indent } else { 0 };
        Ok(true)
    }

    /// Commit the pending line and add the paragraph's bottom margin.
    pub fn end_paragraph(&mut self, fmt: &Format) -> Result<bool, LayoutError> {
        if self.state == PageState::Full {
            return Ok(false);
        }
        self.flush_line(false)?;
        self.glue_next = false;
        self.next_indent = 0;
        self.cursor_y += fmt.margin_bottom.max(0);
        if self.cursor_y > self.bottom {
            self.state = PageState::Full;
            return Ok(false);
        }
        Ok(true)
    }

    /// Place `text` at the cursor without wrapping, then move to the next line.
    pub fn add_text(&mut self, text: &str, fmt: &Format) -> Result<bool, LayoutError> {
        if self.state == PageState::Full {
            return Ok(false);
        }
        self.flush_line(false)?;
        let height = fmt.line_height_px();
        if !self.has_room_for(height) {
            self.state = PageState::Full;
            return Ok(false);
        }
        self.add_text_raw(text, fmt)?;
        self.cursor_y += height;
        Ok(true)
    }

    /// Place `text` at the cursor without wrapping or moving the cursor.
    pub fn add_text_raw(&mut self, text: &str, fmt: &Format) -> Result<Dim, LayoutError> {
        self.flush_line(false)?;
        let ascent = self.face_ascent(fmt)?;
        let origin = Pos::new(self.para_left, self.cursor_y + ascent);
        self.place_direct(text, origin, fmt)
    }

    /// Place `text` with its baseline origin at `pos`.
    ///
    /// `pos.x == Pos::USE_MARGIN` places it at `fmt.screen_left`.
    pub fn put_str_at(&mut self, text: &str, pos: Pos, fmt: &Format) -> Result<Dim, LayoutError> {
        self.place_direct(text, Self::resolve_x(pos, fmt), fmt)
    }

    /// Single-character form of [`put_str_at`](Self::put_str_at).
    pub fn put_char_at(&mut self, ch: char, pos: Pos, fmt: &Format) -> Result<Dim, LayoutError> {
        let mut buf = [0u8; 4];
        let text: &str = ch.encode_utf8(&mut buf);
        self.place_direct(text, Self::resolve_x(pos, fmt), fmt)
    }

    /// Place a block image centered between the paragraph margins.
    ///
    /// An image taller than the remaining room ends the page, unless the
    /// page is still empty, where it is placed and clipped by the surface.
    pub fn add_image(&mut self, image: &Image, fmt: &Format) -> Result<bool, LayoutError> {
        if self.state == PageState::Full {
            return Ok(false);
        }
        self.flush_line(false)?;
        let height = image.dim.height.max(0);
        if !self.has_room_for(height) && self.state != PageState::Empty {
            self.state = PageState::Full;
            return Ok(false);
        }
        let left = self.left + fmt.margin_left;
        let room = (self.right - fmt.margin_right) - left;
        let x = left + ((room - image.dim.width) / 2).max(0);
        if self.mode.renders() {
            self.page.push(DisplayListEntry::new(
                Pos::new(x, self.cursor_y),
                EntryKind::Image(image.clone()),
            ))?;
        }
        self.cursor_y += height;
        self.glue_next = false;
        self.mark_filling();
        log::trace!("image {}x{} placed, y now {}", image.dim.width, height, self.cursor_y);
        Ok(true)
    }

    /// Place an image with its top-left corner at `pos`.
    pub fn put_image_at(&mut self, image: &Image, pos: Pos, fmt: &Format) -> Result<(), LayoutError> {
        let pos = Self::resolve_x(pos, fmt);
        if self.mode.renders() {
            self.page
                .push(DisplayListEntry::new(pos, EntryKind::Image(image.clone())))?;
        }
        self.mark_filling();
        Ok(())
    }

    pub fn put_highlight(&mut self, dim: Dim, pos: Pos) -> Result<(), LayoutError> {
        self.push_rect(pos, EntryKind::Highlight(dim))
    }

    pub fn clear_highlight(&mut self, dim: Dim, pos: Pos) -> Result<(), LayoutError> {
        self.push_rect(pos, EntryKind::ClearHighlight(dim))
    }

    pub fn clear_region(&mut self, dim: Dim, pos: Pos) -> Result<(), LayoutError> {
        self.push_rect(pos, EntryKind::ClearRegion(dim))
    }

    pub fn set_region(&mut self, dim: Dim, pos: Pos) -> Result<(), LayoutError> {
        self.push_rect(pos, EntryKind::SetRegion(dim))
    }

    /// Replay the committed page on `surface`.
    ///
    /// Only [`ComputeMode::Display`] paints unless `do_it` forces it.
    /// `no_full` is forwarded to the surface refresh hook. Returns whether
    /// anything was painted.
    pub fn paint<S>(
        &self,
        surface: &mut S,
        clear_screen: bool,
        no_full: bool,
        do_it: bool,
    ) -> Result<bool, S::Error>
    where
        S: Surface + ?Sized,
    {
        if !self.mode.renders() && !do_it {
            return Ok(false);
        }
        if clear_screen {
            surface.clear()?;
        }
        self.page.replay(surface)?;
        surface.update(no_full)?;
        log::debug!(
            "page painted: {} entries, {} lines",
            self.page.len(),
            self.committed_lines
        );
        Ok(true)
    }

    /// Re-select `fmt.font_index` for `style`. See [`FontRegistry::reset_font_index`].
    pub fn reset_font_index(&self, fmt: &mut Format, style: FaceStyle) {
        self.fonts.reset_font_index(fmt, style);
    }

    pub fn state(&self) -> PageState {
        self.state
    }

    pub fn is_full(&self) -> bool {
        self.state == PageState::Full
    }

    pub fn is_empty(&self) -> bool {
        self.state == PageState::Empty
    }

    /// True when a pending line holds content not yet committed.
    pub fn some_data_waiting(&self) -> bool {
        self.pending.open && !self.words.is_empty()
    }

    /// Width between the current paragraph margins.
    pub fn paint_width(&self) -> i32 {
        self.para_right - self.para_left
    }

    /// Top of the next line.
    pub fn pos_y(&self) -> i32 {
        self.cursor_y
    }

    pub fn committed_lines(&self) -> usize {
        self.committed_lines
    }

    /// Committed page entries.
    pub fn display_list(&self) -> &DisplayList {
        &self.page
    }

    /// Entries of the pending line, positioned relative to its start and baseline.
    pub fn line_list(&self) -> &DisplayList {
        &self.line
    }

    fn resolve_x(pos: Pos, fmt: &Format) -> Pos {
        if pos.x == Pos::USE_MARGIN {
            Pos::new(fmt.screen_left, pos.y)
        } else {
            pos
        }
    }

    fn has_room_for(&self, height: i32) -> bool {
        self.cursor_y + height <= self.bottom
    }

    fn mark_filling(&mut self) {
        self.has_content = true;
        if self.state == PageState::Empty {
            self.state = PageState::Filling;
        }
    }

    fn push_rect(&mut self, pos: Pos, kind: EntryKind) -> Result<(), LayoutError> {
        self.page.push(DisplayListEntry::new(pos, kind))?;
        self.mark_filling();
        Ok(())
    }

    fn face_ascent(&mut self, fmt: &Format) -> Result<i32, LayoutError> {
        let cache = self.fonts.get(fmt.font_index).ok_or(FontError::IndexOutOfRange {
            index: fmt.font_index,
            len: 0,
        })?;
        Ok(cache.line_metrics(fmt.font_size).ascent)
    }

    fn space_width(&mut self, fmt: &Format) -> i32 {
        self.fonts
            .get(fmt.font_index)
            .and_then(|cache| cache.metrics(' ', fmt.font_size))
            .map_or(i32::from(fmt.font_size) / 4, |metrics| metrics.advance)
    }

    /// Measure `text` and, when rendering, rasterize it into `scratch` with
    /// positions relative to the fragment start and the baseline.
    fn shape(&mut self, text: &str, fmt: &Format, word_start: bool) -> Result<Shaped, LayoutError> {
        self.scratch.clear();
        let rasterize = self.mode.renders();
        let cache = self.fonts.get(fmt.font_index).ok_or(FontError::IndexOutOfRange {
            index: fmt.font_index,
            len: 0,
        })?;
        let size = fmt.font_size;
        let mut shaped = Shaped {
            ascent: cache.line_metrics(size).ascent,
            ..Shaped::default()
        };
        let mut first = word_start;
        for ch in text.chars() {
            let ch = fmt.text_transform.apply(ch, first);
            first = false;
            let Some(metrics) = cache.metrics(ch, size) else {
                continue;
            };
            if rasterize {
                if let Some(glyph) = cache.get(ch, size)? {
                    if glyph.dim.width > 0 && glyph.dim.height > 0 {
                        self.scratch.push(PlacedGlyph {
                            x: shaped.width + glyph.xoff,
                            y: glyph.yoff,
                            glyph,
                        });
                    }
                }
            }
            shaped.width += metrics.advance;
            shaped.ascent = shaped.ascent.max(metrics.ascent());
            shaped.descent = shaped.descent.max(metrics.descent());
        }
        Ok(shaped)
    }

    fn place_direct(&mut self, text: &str, origin: Pos, fmt: &Format) -> Result<Dim, LayoutError> {
        let shaped = self.shape(text, fmt, true)?;
        self.page.ensure_room(self.scratch.len())?;
        for placed in self.scratch.drain(..) {
            self.page.push(DisplayListEntry::new(
                Pos::new(origin.x + placed.x, origin.y + placed.y),
                EntryKind::Glyph(placed.glyph),
            ))?;
        }
        if !text.is_empty() {
            self.mark_filling();
        }
        Ok(Dim::new(shaped.width, shaped.ascent + shaped.descent))
    }

    fn place_fragment(&mut self, text: &str, fmt: &Format, glue: bool) -> Result<bool, LayoutError> {
        if self.state == PageState::Full {
            return Ok(false);
        }
        if text.is_empty() {
            return Ok(true);
        }
        let shaped = self.shape(text, fmt, !glue)?;
        self.page
            .ensure_room(self.line.len() + self.scratch.len())?;
        let height = fmt.line_height_px();

        if !self.pending.open {
            if !self.open_line(fmt) {
                return Ok(false);
            }
        } else if !self.words.is_empty() {
            let gap = if glue { 0 } else { self.space_width(fmt) };
            let fits_width = self.pending.width + gap + shaped.width <= self.pending.avail;
            let fits_height = self.cursor_y + self.pending.height.max(height) <= self.bottom;
            let can_break = !glue || self.words.len() > 1;
            if !(fits_width && fits_height) && can_break {
                let next_top = self.cursor_y + self.pending.height;
                if next_top + height > self.bottom {
                    if glue {
                        if let Some((word, _)) = self.detach_last_word() {
                            self.withheld = word.fragments;
                        }
                    }
                    self.flush_line(self.pending.align == Align::Justify)?;
                    self.state = PageState::Full;
                    log::trace!("page full at y={}", self.cursor_y);
                    return Ok(false);
                }
                let carried = if glue { self.detach_last_word() } else { None };
                self.flush_line(self.pending.align == Align::Justify)?;
                if !self.open_line(fmt) {
                    return Ok(false);
                }
                if let Some((word, entries)) = carried {
                    self.reattach_word(word, entries)?;
                }
            }
        }

        let glue = glue && !self.words.is_empty();
        let x0 = if glue {
            match self.words.last_mut() {
                Some(last) => {
                    let x0 = last.x + last.width;
                    last.width += shaped.width;
                    last.fragments += 1;
                    last.ascent = last.ascent.max(shaped.ascent);
                    x0
                }
                None => 0,
            }
        } else {
            let gap = if self.words.is_empty() {
                0
            } else {
                self.space_width(fmt)
            };
            let x0 = self.pending.width + gap;
            self.words.push(LineWord {
                entry_start: self.line.len(),
                x: x0,
                width: shaped.width,
                ascent: shaped.ascent,
                gap_before: gap,
                fragments: 1,
            });
            x0
        };
        for placed in self.scratch.drain(..) {
            self.line.push(DisplayListEntry::new(
                Pos::new(x0 + placed.x, placed.y),
                EntryKind::Glyph(placed.glyph),
            ))?;
        }
        self.pending.width = x0 + shaped.width;
        self.pending.ascent = self.pending.ascent.max(shaped.ascent);
        self.pending.height = self.pending.height.max(height);
        Ok(true)
    }

    fn open_line(&mut self, fmt: &Format) -> bool {
        let height = fmt.line_height_px();
        if !self.has_room_for(height) {
            self.state = PageState::Full;
            log::trace!("no room for a line of {}px at y={}", height, self.cursor_y);
            return false;
        }
        let left = self.para_left + self.next_indent;
        self.next_indent = 0;
        self.pending = PendingLine {
            open: true,
            left,
            avail: (self.para_right - left).max(0),
            width: 0,
            ascent: 0,
            height,
            align: fmt.align,
        };
        self.mark_filling();
        true
    }

    fn detach_last_word(&mut self) -> Option<(LineWord, Vec<DisplayListEntry>)> {
        let word = self.words.pop()?;
        let mut entries = self.line.split_off(word.entry_start);
        for entry in &mut entries {
            entry.pos.x -= word.x;
        }
        self.pending.width = self.words.last().map_or(0, |last| last.x + last.width);
        Some((word, entries))
    }

    fn reattach_word(
        &mut self,
        word: LineWord,
        entries: Vec<DisplayListEntry>,
    ) -> Result<(), LayoutError> {
        self.words.push(LineWord {
            entry_start: self.line.len(),
            x: 0,
            gap_before: 0,
            ..word
        });
        for entry in entries {
            self.line.push(entry)?;
        }
        self.pending.width = word.width;
        self.pending.ascent = self.pending.ascent.max(word.ascent);
        Ok(())
    }

    fn flush_line(&mut self, justify: bool) -> Result<(), LayoutError> {
        if !self.pending.open {
            return Ok(());
        }
        self.page.ensure_room(self.line.len())?;
        let line = self.pending;
        let slack = line.avail - line.width;
        let offset = match line.align {
            Align::Center => (slack / 2).max(0),
            Align::Right => slack.max(0),
            Align::Left | Align::Justify => 0,
        };
        if justify && line.align == Align::Justify && self.words.len() > 1 && slack > 0 {
            let gaps: SmallVec<[i32; 16]> =
                self.words.iter().skip(1).map(|word| word.gap_before).collect();
            let shifts = justified_offsets(&gaps, slack);
            let mut applied = 0;
            for (word, shift) in self.words.iter_mut().skip(1).zip(shifts) {
                self.line.shift_x(word.entry_start, shift - applied);
                word.x += shift;
                applied = shift;
            }
        }
        let baseline = self.cursor_y + line.ascent.min(self.bottom - self.cursor_y).max(0);
        self.line.translate(line.left + offset, baseline);
        self.page.append(&mut self.line)?;
        self.cursor_y += line.height;
        self.words.clear();
        self.pending = PendingLine::default();
        self.committed_lines += 1;
        Ok(())
    }
}

/// Cumulative shifts for words 1..=n of a justified line.
///
/// `slack` is spread over the inter-word gaps in proportion to their natural
/// widths (evenly when they are all zero). Shifts are non-decreasing and the
/// last equals `slack`, so the widened gaps add up to exactly the line width
/// minus the word widths.
pub(crate) fn justified_offsets(gaps: &[i32], slack: i32) -> SmallVec<[i32; 16]> {
    let total: i64 = gaps.iter().map(|gap| i64::from((*gap).max(0))).sum();
    let count = gaps.len() as i64;
    let slack = i64::from(slack.max(0));
    let mut shifts = SmallVec::with_capacity(gaps.len());
    let mut cumulative = 0i64;
    for (index, gap) in gaps.iter().enumerate() {
        let share = if total > 0 {
            cumulative += i64::from((*gap).max(0));
            (slack * cumulative * 2 + total) / (2 * total)
        } else {
            let done = index as i64 + 1;
            (slack * done * 2 + count) / (2 * count)
        };
        shifts.push(share as i32);
    }
    shifts
}
