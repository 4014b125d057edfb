use inkpage::{
    text_tokens, FaceLoader, FaceStyle, FontError, FontRegistry, FontSource, Format,
    GlyphMetrics, GlyphRasterizer, LayoutEngine, LayoutOptions, LineMetrics, PixelDepth,
    RasterOutput, RegistryOptions, StyledToken, DEFAULT_FAMILY,
};

pub const DISPLAY_WIDTH: i32 = 480;
pub const DISPLAY_HEIGHT: i32 = 800;

/// Project Gutenberg opening paragraphs, enough for a handful of pages.
pub const SAMPLE_TEXT: &str = "\
It is a truth universally acknowledged, that a single man in possession of a good fortune, \
must be in want of a wife.

However little known the feelings or views of such a man may be on his first entering a \
neighbourhood, this truth is so well fixed in the minds of the surrounding families, that he \
is considered as the rightful property of some one or other of their daughters.

\"My dear Mr. Bennet,\" said his lady to him one day, \"have you heard that Netherfield Park \
is let at last?\"

Mr. Bennet replied that he had not.

\"But it is,\" returned she; \"for Mrs. Long has just been here, and she told me all about it.\"

Mr. Bennet made no answer.

\"Do you not want to know who has taken it?\" cried his wife impatiently.

\"You want to tell me, and I have no objection to hearing it.\"

This was invitation enough.
";

/// Box-glyph face with proportional widths: narrow letters are thinner,
/// capitals wider. Every glyph is solid ink.
#[derive(Clone, Debug, Default)]
pub struct BoxFace {
    size_px: i32,
}

impl BoxFace {
    fn metrics_for(&self, codepoint: char) -> GlyphMetrics {
        if codepoint.is_whitespace() {
            return GlyphMetrics {
                advance: (self.size_px / 4).max(1),
                ..GlyphMetrics::default()
            };
        }
        let advance = match codepoint {
            'i' | 'l' | 'j' | 't' | 'f' | '.' | ',' | ';' | ':' | '!' | '\'' | '"' => {
                self.size_px / 4
            }
            'm' | 'w' | 'M' | 'W' => self.size_px * 3 / 4,
            c if c.is_uppercase() => self.size_px * 5 / 8,
            _ => self.size_px / 2,
        }
        .max(2);
        let height = if codepoint.is_uppercase() {
            self.size_px * 3 / 4
        } else {
            self.size_px / 2
        };
        GlyphMetrics {
            width: advance - 1,
            height,
            xoff: 0,
            yoff: -height,
            advance,
        }
    }
}

impl GlyphRasterizer for BoxFace {
    fn set_pixel_size(&mut self, size_px: u16) -> Result<(), FontError> {
        self.size_px = i32::from(size_px);
        Ok(())
    }

    fn glyph_index(&self, codepoint: char) -> Option<u16> {
        u16::try_from(codepoint as u32).ok()
    }

    fn glyph_metrics(&mut self, glyph_index: u16) -> Result<GlyphMetrics, FontError> {
        let codepoint = char::from_u32(u32::from(glyph_index)).unwrap_or(' ');
        Ok(self.metrics_for(codepoint))
    }

    fn render(&mut self, glyph_index: u16, depth: PixelDepth) -> Result<RasterOutput, FontError> {
        let metrics = self.glyph_metrics(glyph_index)?;
        let (width, height) = (metrics.width.max(0) as usize, metrics.height.max(0) as usize);
        let (pitch, pixels) = match depth {
            PixelDepth::EightBit => (width, vec![0xFF; width * height]),
            PixelDepth::OneBit => {
                let pitch = width.div_ceil(8);
                let mut rows = vec![0u8; pitch * height];
                for y in 0..height {
                    for x in 0..width {
                        rows[y * pitch + x / 8] |= 0x80 >> (x % 8);
                    }
                }
                (pitch, rows)
            }
        };
        Ok(RasterOutput {
            metrics,
            pitch,
            pixels,
        })
    }

    fn line_metrics(&self) -> LineMetrics {
        LineMetrics {
            ascent: self.size_px * 3 / 4,
            descent: self.size_px / 4,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct BoxLoader;

impl FaceLoader for BoxLoader {
    type Face = BoxFace;

    fn load(&mut self, _name: &str, _source: FontSource<'_>) -> Result<BoxFace, FontError> {
        Ok(BoxFace::default())
    }
}

/// Engine with the four `Default` styles registered.
pub fn box_engine(options: LayoutOptions) -> LayoutEngine<BoxLoader> {
    let mut fonts = FontRegistry::<BoxLoader>::new(RegistryOptions::default());
    for style in [
        FaceStyle::Normal,
        FaceStyle::Bold,
        FaceStyle::Italic,
        FaceStyle::BoldItalic,
    ] {
        assert!(fonts.add(DEFAULT_FAMILY, style, FontSource::Memory(b"box")));
    }
    LayoutEngine::new(fonts, options)
}

pub fn page_format() -> Format {
    Format {
        font_size: 20,
        indent: 20,
        margin_bottom: 6,
        screen_left: 16,
        screen_top: 16,
        screen_right: DISPLAY_WIDTH - 16,
        screen_bottom: DISPLAY_HEIGHT - 16,
        ..Format::default()
    }
}

/// `SAMPLE_TEXT` repeated `copies` times as one token stream.
pub fn sample_tokens(copies: usize, fmt: &Format) -> Vec<StyledToken> {
    let mut tokens = Vec::new();
    for _ in 0..copies {
        tokens.extend(text_tokens(SAMPLE_TEXT, fmt));
    }
    tokens
}
