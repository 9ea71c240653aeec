use crate::core::Fixed26_6;

/// Fixed-cell monospace bitmap face backed by the `font8x8` basic set.
///
/// Each glyph is 8x8 pixels. Rows `0..ASCENT` sit above the baseline and the
/// last row holds descenders.
#[derive(Clone, Copy)]
pub struct BitmapFace {
    glyphs: &'static [[u8; 8]; 128],
}

impl BitmapFace {
    pub const ADVANCE: i32 = 8;
    pub const ASCENT: i32 = 7;
    pub const DESCENT: i32 = 1;

    pub fn basic() -> Self {
        Self {
            glyphs: &font8x8::legacy::BASIC_LEGACY,
        }
    }

    /// Bitmap rows for `ch`, LSB is the leftmost column. `None` for non-ASCII.
    pub fn glyph(&self, ch: char) -> Option<&'static [u8; 8]> {
        let glyphs: &'static [[u8; 8]; 128] = self.glyphs;
        glyphs.get(ch as usize)
    }

    pub fn advance(&self) -> Fixed26_6 {
        Fixed26_6::from_pixels(Self::ADVANCE)
    }

    /// Width in pixels of `text` laid out on one line.
    pub fn text_width(&self, text: &str) -> i32 {
        i32::try_from(text.chars().count())
            .unwrap_or(i32::MAX)
            .saturating_mul(Self::ADVANCE)
    }

    /// Set pixels of `ch` as `(dx, dy)` offsets from the pen position on the baseline.
    pub fn glyph_pixels(&self, ch: char) -> impl Iterator<Item = (i32, i32)> + 'static {
        let rows = self.glyph(ch).copied().unwrap_or([0; 8]);
        (0..8i32).flat_map(move |row| {
            let bits = rows[row as usize];
            (0..8i32)
                .filter(move |col| bits & (1 << col) != 0)
                .map(move |col| (col, row - Self::ASCENT))
        })
    }
}

impl Default for BitmapFace {
    fn default() -> Self {
        Self::basic()
    }
}

impl std::fmt::Debug for BitmapFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitmapFace")
            .field("advance", &Self::ADVANCE)
            .field("ascent", &Self::ASCENT)
            .field("descent", &Self::DESCENT)
            .finish()
    }
}
