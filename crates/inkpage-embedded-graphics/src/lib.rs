//! embedded-graphics surface for `inkpage` display lists.

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

use embedded_graphics::{
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::{PrimitiveStyle, Rectangle},
};
use inkpage::{BitmapGlyph, Dim, Image, PixelDepth, Pos, Surface};

/// Kind of panel refresh requested after a page was painted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Refresh {
    /// Fast partial update; may leave ghosting.
    Partial,
    /// Full flashing update that clears ghosting.
    Full,
}

/// Surface configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EgSurfaceConfig {
    /// Partial refreshes allowed between two full refreshes; 0 makes every
    /// update a full one.
    pub full_refresh_every: u16,
    /// Color `clear` fills the display with.
    pub background: BinaryColor,
}

impl Default for EgSurfaceConfig {
    fn default() -> Self {
        Self {
            full_refresh_every: 10,
            background: BinaryColor::Off,
        }
    }
}

/// Counts partial refreshes and schedules a full one every so often.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RefreshGovernor {
    every: u16,
    partials: u16,
}

impl RefreshGovernor {
    pub fn new(every: u16) -> Self {
        Self { every, partials: 0 }
    }

    /// Refresh to use for the next update. `no_full` forces a partial one
    /// without resetting the count, so the full refresh happens on the next
    /// update that allows it.
    pub fn next(&mut self, no_full: bool) -> Refresh {
        if no_full {
            self.partials = self.partials.saturating_add(1);
            return Refresh::Partial;
        }
        if self.partials >= self.every {
            self.partials = 0;
            return Refresh::Full;
        }
        self.partials += 1;
        Refresh::Partial
    }

    /// Partial refreshes since the last full one.
    pub fn partials(&self) -> u16 {
        self.partials
    }

    /// Make the next permitted update a full refresh.
    pub fn force_full(&mut self) {
        self.partials = self.every;
    }
}

/// [`Surface`] drawing into any 1-bit embedded-graphics target.
///
/// Drawing only touches the target's buffer; the refresh decided by
/// `update` is queued for the panel driver to pick up with
/// [`EgSurface::take_refresh`].
#[derive(Debug)]
pub struct EgSurface<D> {
    display: D,
    cfg: EgSurfaceConfig,
    governor: RefreshGovernor,
    pending: Option<Refresh>,
}

impl<D> EgSurface<D>
where
    D: DrawTarget<Color = BinaryColor>,
{
    pub fn new(display: D) -> Self {
        Self::with_config(display, EgSurfaceConfig::default())
    }

    pub fn with_config(display: D, cfg: EgSurfaceConfig) -> Self {
        Self {
            display,
            governor: RefreshGovernor::new(cfg.full_refresh_every),
            cfg,
            pending: None,
        }
    }

    pub fn config(&self) -> EgSurfaceConfig {
        self.cfg
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    pub fn governor(&self) -> &RefreshGovernor {
        &self.governor
    }

    pub fn governor_mut(&mut self) -> &mut RefreshGovernor {
        &mut self.governor
    }

    /// Refresh queued by the last `update`, if not yet taken.
    pub fn take_refresh(&mut self) -> Option<Refresh> {
        self.pending.take()
    }

    pub fn into_inner(self) -> D {
        self.display
    }

    fn fill(&mut self, pos: Pos, dim: Dim, color: BinaryColor) -> Result<(), D::Error> {
        let Some(rect) = rectangle(pos, dim) else {
            return Ok(());
        };
        rect.into_styled(PrimitiveStyle::with_fill(color))
            .draw(&mut self.display)
    }

    fn outline(&mut self, pos: Pos, dim: Dim, color: BinaryColor) -> Result<(), D::Error> {
        let Some(rect) = rectangle(pos, dim) else {
            return Ok(());
        };
        rect.into_styled(PrimitiveStyle::with_stroke(color, 1))
            .draw(&mut self.display)
    }
}

fn rectangle(pos: Pos, dim: Dim) -> Option<Rectangle> {
    if dim.width <= 0 || dim.height <= 0 {
        return None;
    }
    Some(Rectangle::new(
        Point::new(pos.x, pos.y),
        Size::new(dim.width as u32, dim.height as u32),
    ))
}

impl<D> Surface for EgSurface<D>
where
    D: DrawTarget<Color = BinaryColor>,
{
    type Error = D::Error;

    fn pixel_depth(&self) -> PixelDepth {
        PixelDepth::OneBit
    }

    fn clear(&mut self) -> Result<(), Self::Error> {
        self.display.clear(self.cfg.background)
    }

    fn draw_glyph(&mut self, pos: Pos, glyph: &BitmapGlyph) -> Result<(), Self::Error> {
        for y in 0..glyph.dim.height {
            self.display.draw_iter((0..glyph.dim.width).filter_map(|x| {
                glyph
                    .pixel_is_on(x, y)
                    .then_some(Pixel(Point::new(pos.x + x, pos.y + y), BinaryColor::On))
            }))?;
        }
        Ok(())
    }

    fn draw_image(&mut self, pos: Pos, image: &Image) -> Result<(), Self::Error> {
        for y in 0..image.dim.height {
            self.display.draw_iter((0..image.dim.width).filter_map(|x| {
                image
                    .pixel_is_on(x, y)
                    .then_some(Pixel(Point::new(pos.x + x, pos.y + y), BinaryColor::On))
            }))?;
        }
        Ok(())
    }

    fn highlight(&mut self, pos: Pos, dim: Dim) -> Result<(), Self::Error> {
        self.outline(pos, dim, BinaryColor::On)
    }

    fn clear_highlight(&mut self, pos: Pos, dim: Dim) -> Result<(), Self::Error> {
        self.outline(pos, dim, BinaryColor::Off)
    }

    fn clear_region(&mut self, pos: Pos, dim: Dim) -> Result<(), Self::Error> {
        self.fill(pos, dim, BinaryColor::Off)
    }

    fn set_region(&mut self, pos: Pos, dim: Dim) -> Result<(), Self::Error> {
        self.fill(pos, dim, BinaryColor::On)
    }

    fn update(&mut self, no_full: bool) -> Result<(), Self::Error> {
        let refresh = self.governor.next(no_full);
        if refresh == Refresh::Full {
            log::debug!("full refresh scheduled");
        }
        self.pending = Some(refresh);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_graphics::mock_display::MockDisplay;

    #[derive(Default)]
    struct PixelCaptureDisplay {
        size: Size,
        on_pixels: Vec<Point>,
        clears: usize,
    }

    impl PixelCaptureDisplay {
        fn new(width: u32, height: u32) -> Self {
            Self {
                size: Size::new(width, height),
                ..Self::default()
            }
        }
    }

    impl OriginDimensions for PixelCaptureDisplay {
        fn size(&self) -> Size {
            self.size
        }
    }

    impl DrawTarget for PixelCaptureDisplay {
        type Color = BinaryColor;
        type Error = Infallible;

        fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
        where
            I: IntoIterator<Item = Pixel<Self::Color>>,
        {
            for Pixel(point, color) in pixels {
                if color == BinaryColor::On {
                    self.on_pixels.push(point);
                }
            }
            Ok(())
        }

        fn clear(&mut self, _color: Self::Color) -> Result<(), Self::Error> {
            self.clears += 1;
            self.on_pixels.clear();
            Ok(())
        }
    }

    #[test]
    fn image_pixels_are_drawn_at_offset() {
        let mut surface = EgSurface::new(PixelCaptureDisplay::new(32, 32));
        let image = Image::mono(3, 2, vec![0b1010_0000, 0b0100_0000]);
        surface.draw_image(Pos::new(10, 5), &image).expect("draw");
        assert_eq!(
            surface.display().on_pixels,
            vec![Point::new(10, 5), Point::new(12, 5), Point::new(11, 6)]
        );
    }

    #[test]
    fn gray_image_inks_dark_pixels() {
        let mut surface = EgSurface::new(PixelCaptureDisplay::new(8, 8));
        let image = Image::gray(2, 1, vec![0x00, 0xFF]);
        surface.draw_image(Pos::new(0, 0), &image).expect("draw");
        assert_eq!(surface.display().on_pixels, vec![Point::new(0, 0)]);
    }

    #[test]
    fn set_region_fills_and_clear_region_erases() {
        let mut display = MockDisplay::<BinaryColor>::new();
        display.set_allow_overdraw(true);
        let mut surface = EgSurface::new(display);
        surface
            .set_region(Pos::new(0, 0), Dim::new(3, 2))
            .expect("fill");
        surface
            .clear_region(Pos::new(1, 0), Dim::new(1, 2))
            .expect("erase");
        surface.display().assert_pattern(&["#.#", "#.#"]);
    }

    #[test]
    fn highlight_draws_outline() {
        let mut display = MockDisplay::<BinaryColor>::new();
        display.set_allow_overdraw(true);
        let mut surface = EgSurface::new(display);
        surface
            .highlight(Pos::new(0, 0), Dim::new(3, 3))
            .expect("outline");
        surface.display().assert_pattern(&["###", "# #", "###"]);
    }

    #[test]
    fn clear_highlight_turns_outline_off() {
        let mut display = MockDisplay::<BinaryColor>::new();
        display.set_allow_overdraw(true);
        let mut surface = EgSurface::new(display);
        surface
            .set_region(Pos::new(0, 0), Dim::new(3, 3))
            .expect("fill");
        surface
            .clear_highlight(Pos::new(0, 0), Dim::new(3, 3))
            .expect("outline off");
        surface.display().assert_pattern(&["...", ".#.", "..."]);
    }

    #[test]
    fn empty_rectangles_draw_nothing() {
        let mut surface = EgSurface::new(PixelCaptureDisplay::new(8, 8));
        surface
            .set_region(Pos::new(1, 1), Dim::new(0, 4))
            .expect("noop");
        surface
            .highlight(Pos::new(1, 1), Dim::new(4, -1))
            .expect("noop");
        assert!(surface.display().on_pixels.is_empty());
    }

    #[test]
    fn clear_fills_background() {
        let mut surface = EgSurface::new(PixelCaptureDisplay::new(4, 4));
        surface
            .set_region(Pos::new(0, 0), Dim::new(2, 2))
            .expect("fill");
        surface.clear().expect("clear");
        assert_eq!(surface.display().clears, 1);
        assert!(surface.display().on_pixels.is_empty());
    }

    #[test]
    fn governor_schedules_full_refresh_every_n_updates() {
        let mut surface = EgSurface::with_config(
            PixelCaptureDisplay::new(4, 4),
            EgSurfaceConfig {
                full_refresh_every: 2,
                ..EgSurfaceConfig::default()
            },
        );
        let mut seen = Vec::new();
        for _ in 0..6 {
            surface.update(false).expect("update");
            seen.push(surface.take_refresh().expect("queued"));
        }
        assert_eq!(
            seen,
            vec![
                Refresh::Partial,
                Refresh::Partial,
                Refresh::Full,
                Refresh::Partial,
                Refresh::Partial,
                Refresh::Full,
            ]
        );
        assert_eq!(surface.take_refresh(), None);
    }

    #[test]
    fn no_full_defers_the_full_refresh() {
        let mut governor = RefreshGovernor::new(1);
        assert_eq!(governor.next(false), Refresh::Partial);
        assert_eq!(governor.next(true), Refresh::Partial);
        assert_eq!(governor.partials(), 2);
        assert_eq!(governor.next(false), Refresh::Full);
        assert_eq!(governor.partials(), 0);
    }

    #[test]
    fn force_full_applies_to_next_update() {
        let mut governor = RefreshGovernor::new(5);
        governor.force_full();
        assert_eq!(governor.next(false), Refresh::Full);

        let mut every_time = RefreshGovernor::new(0);
        assert_eq!(every_time.next(false), Refresh::Full);
        assert_eq!(every_time.next(false), Refresh::Full);
    }

    #[test]
    fn surface_reports_one_bit_depth() {
        let surface = EgSurface::new(PixelCaptureDisplay::new(1, 1));
        assert_eq!(surface.pixel_depth(), PixelDepth::OneBit);
    }
}
