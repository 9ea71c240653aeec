use image::{DynamicImage, RgbaImage};

use crate::{
    core::{Point, Rgba8, SubPixelPoint},
    font::BitmapFace,
};

pub const WATERMARK_TEXT: &str = "This is watermark";

/// Images narrower AND shorter than this get the label at the origin.
pub const SMALL_IMAGE_EDGE: u32 = 20;

/// Anchor used for images that are not small.
pub const DEFAULT_ANCHOR: Point = Point::new(20, 20);

#[derive(Clone, Debug)]
pub struct Label {
    pub text: String,
    pub color: Rgba8,
    pub face: BitmapFace,
}

impl Label {
    pub fn new(text: impl Into<String>, color: Rgba8) -> Self {
        Self {
            text: text.into(),
            color,
            face: BitmapFace::basic(),
        }
    }

    /// The fixed "This is watermark" label in opaque red.
    pub fn watermark() -> Self {
        Self::new(WATERMARK_TEXT, Rgba8::RED)
    }
}

impl Default for Label {
    fn default() -> Self {
        Self::watermark()
    }
}

/// Baseline-left anchor for the label. At the origin the glyphs sit above
/// row 0, so on small images the label is mostly or entirely clipped.
pub fn placement_for(width: u32, height: u32) -> Point {
    if width < SMALL_IMAGE_EDGE && height < SMALL_IMAGE_EDGE {
        Point::ORIGIN
    } else {
        DEFAULT_ANCHOR
    }
}

/// Copy `image` into a new RGBA buffer and draw `label` with its baseline-left at `at`.
///
/// Glyph pixels outside the canvas are dropped.
pub fn annotate(image: &DynamicImage, at: Point, label: &Label) -> RgbaImage {
    let mut canvas = image.to_rgba8();
    let mut pen = GlyphPen {
        dst: &mut canvas,
        color: label.color.to_pixel(),
        face: label.face,
        dot: SubPixelPoint::from(at),
    };
    pen.draw_str(&label.text);
    canvas
}

struct GlyphPen<'a> {
    dst: &'a mut RgbaImage,
    color: image::Rgba<u8>,
    face: BitmapFace,
    dot: SubPixelPoint,
}

impl GlyphPen<'_> {
    fn draw_str(&mut self, text: &str) {
        for ch in text.chars() {
            self.draw_glyph(ch);
            self.dot.x = self.dot.x + self.face.advance();
        }
    }

    fn draw_glyph(&mut self, ch: char) {
        let origin_x = self.dot.x.floor_pixels();
        let origin_y = self.dot.y.floor_pixels();
        let (w, h) = self.dst.dimensions();
        for (dx, dy) in self.face.glyph_pixels(ch) {
            let x = i64::from(origin_x) + i64::from(dx);
            let y = i64::from(origin_y) + i64::from(dy);
            if x < 0 || y < 0 || x >= i64::from(w) || y >= i64::from(h) {
                continue;
            }
            self.dst.put_pixel(x as u32, y as u32, self.color);
        }
    }
}
