use std::ops::Add;

/// Straight (non-premultiplied) RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const RED: Self = Self::new(255, 0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_pixel(self) -> image::Rgba<u8> {
        image::Rgba([self.r, self.g, self.b, self.a])
    }
}

/// Integer pixel position. `y` is the text baseline when used as a label anchor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const ORIGIN: Self = Self::new(0, 0);

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// 26.6 fixed-point value: 64 units per pixel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fixed26_6(pub i32);

impl Fixed26_6 {
    pub const ONE_PIXEL: i32 = 64;

    pub const fn from_pixels(px: i32) -> Self {
        Self(px.saturating_mul(Self::ONE_PIXEL))
    }

    /// Largest whole pixel not greater than this value.
    pub const fn floor_pixels(self) -> i32 {
        self.0 >> 6
    }
}

impl Add for Fixed26_6 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

/// Pen position in the rasterizer's sub-pixel coordinate system.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SubPixelPoint {
    pub x: Fixed26_6,
    pub y: Fixed26_6,
}

impl From<Point> for SubPixelPoint {
    fn from(p: Point) -> Self {
        Self {
            x: Fixed26_6::from_pixels(p.x),
            y: Fixed26_6::from_pixels(p.y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_point_uses_64_units_per_pixel() {
        assert_eq!(Fixed26_6::from_pixels(20).0, 1280);
        assert_eq!(Fixed26_6::from_pixels(20).floor_pixels(), 20);
        assert_eq!(Fixed26_6(63).floor_pixels(), 0);
        assert_eq!(Fixed26_6(-1).floor_pixels(), -1);
    }

    #[test]
    fn subpixel_point_from_pixel_point() {
        let p = SubPixelPoint::from(Point::new(3, -2));
        assert_eq!(p.x, Fixed26_6(192));
        assert_eq!(p.y, Fixed26_6(-128));
    }

    #[test]
    fn red_is_opaque() {
        assert_eq!(Rgba8::RED.to_pixel(), image::Rgba([255, 0, 0, 255]));
    }
}
