mod common;

use std::collections::HashSet;
use std::convert::Infallible;

use common::fixtures::{box_engine, page_format, sample_tokens, DISPLAY_HEIGHT, DISPLAY_WIDTH};
use embedded_graphics::{pixelcolor::BinaryColor, prelude::*};
use inkpage::{
    locate_pages, show_page, ComputeMode, Dim, EntryKind, Image, LayoutOptions, PixelDepth, Pos,
    Surface,
};
use inkpage_embedded_graphics::{EgSurface, Refresh};

/// Tracks which pixels are lit, like a 1-bit framebuffer.
struct Framebuffer {
    size: Size,
    lit: HashSet<Point>,
}

impl Framebuffer {
    fn new() -> Self {
        Self {
            size: Size::new(DISPLAY_WIDTH as u32, DISPLAY_HEIGHT as u32),
            lit: HashSet::new(),
        }
    }
}

impl OriginDimensions for Framebuffer {
    fn size(&self) -> Size {
        self.size
    }
}

impl DrawTarget for Framebuffer {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            match color {
                BinaryColor::On => {
                    self.lit.insert(point);
                }
                BinaryColor::Off => {
                    self.lit.remove(&point);
                }
            }
        }
        Ok(())
    }
}

#[test]
fn painted_page_lights_exactly_the_glyph_boxes() {
    let fmt = page_format();
    let tokens = sample_tokens(2, &fmt);
    let mut engine = box_engine(LayoutOptions::default());
    let pages = locate_pages(&mut engine, &tokens, &fmt).expect("locate");
    show_page(&mut engine, &tokens, &fmt, &pages[0]).expect("show");

    let mut expected = HashSet::new();
    for entry in engine.display_list() {
        if let EntryKind::Glyph(glyph) = &entry.kind {
            assert_eq!(glyph.depth, PixelDepth::OneBit);
            for y in 0..glyph.dim.height {
                for x in 0..glyph.dim.width {
                    expected.insert(Point::new(entry.pos.x + x, entry.pos.y + y));
                }
            }
        }
    }
    assert!(!expected.is_empty());

    let mut surface = EgSurface::new(Framebuffer::new());
    assert!(engine.paint(&mut surface, true, false, false).expect("paint"));
    assert_eq!(surface.display().lit, expected);
    assert_eq!(surface.take_refresh(), Some(Refresh::Partial));
}

#[test]
fn measuring_modes_paint_only_on_request() {
    let fmt = page_format();
    let mut engine = box_engine(LayoutOptions::default());
    engine.set_compute_mode(ComputeMode::Location);
    engine.start(&fmt);
    engine.new_paragraph(&fmt, false).expect("paragraph");
    assert!(engine.add_word("measured", &fmt).expect("word"));

    let mut surface = EgSurface::new(Framebuffer::new());
    assert!(!engine.paint(&mut surface, true, false, false).expect("skip"));
    assert_eq!(surface.take_refresh(), None);

    assert!(engine.paint(&mut surface, true, true, true).expect("forced"));
    assert!(surface.display().lit.is_empty());
    assert_eq!(surface.take_refresh(), Some(Refresh::Partial));
}

#[test]
fn rectangles_and_images_reach_the_display() {
    let fmt = page_format();
    let mut engine = box_engine(LayoutOptions::default());
    engine.start(&fmt);

    engine
        .set_region(Dim::new(4, 4), Pos::new(100, 100))
        .expect("fill");
    engine
        .clear_region(Dim::new(2, 2), Pos::new(101, 101))
        .expect("erase");
    engine
        .put_highlight(Dim::new(3, 3), Pos::new(200, 200))
        .expect("highlight");
    engine
        .put_image_at(&Image::mono(2, 1, vec![0b0100_0000]), Pos::new(300, 300), &fmt)
        .expect("image");

    let mut surface = EgSurface::new(Framebuffer::new());
    assert_eq!(surface.pixel_depth(), PixelDepth::OneBit);
    engine.paint(&mut surface, true, false, false).expect("paint");
    let lit = &surface.display().lit;

    assert!(lit.contains(&Point::new(100, 100)));
    assert!(!lit.contains(&Point::new(101, 101)));
    assert!(!lit.contains(&Point::new(102, 102)));
    assert!(lit.contains(&Point::new(103, 103)));
    assert!(lit.contains(&Point::new(200, 200)));
    assert!(!lit.contains(&Point::new(201, 201)));
    assert!(lit.contains(&Point::new(301, 300)));
    assert!(!lit.contains(&Point::new(300, 300)));
    // 12 ring pixels of the region, 8 of the highlight, 1 of the image.
    assert_eq!(lit.len(), 21);
}
