use crate::foundation::math::mul_div255_u8;

/// Integer axis-aligned rectangle in pixel space.
///
/// `width`/`height` are signed so degenerate results of arithmetic stay representable; any
/// rectangle with a non-positive side is empty.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Rect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl Rect {
    /// Construct a rectangle from origin and size.
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    pub const fn right(self) -> i32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub const fn bottom(self) -> i32 {
        self.y + self.height
    }

    /// Return `true` when the rectangle covers no pixel.
    pub const fn is_empty(self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Covered pixel count (0 for empty rectangles).
    pub fn area(self) -> i64 {
        if self.is_empty() {
            return 0;
        }
        i64::from(self.width) * i64::from(self.height)
    }

    /// Intersection of two rectangles, `None` when they do not overlap.
    pub fn intersect(self, other: Rect) -> Option<Rect> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(Rect::new(x0, y0, x1 - x0, y1 - y0))
    }

    /// Smallest rectangle covering both inputs. Empty inputs are ignored.
    pub fn union_bounds(self, other: Rect) -> Rect {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        let x0 = self.x.min(other.x);
        let y0 = self.y.min(other.y);
        let x1 = self.right().max(other.right());
        let y1 = self.bottom().max(other.bottom());
        Rect::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// Shift by `(dx, dy)`.
    pub const fn translate(self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Return `true` when pixel `(px, py)` is inside.
    pub const fn contains(self, px: i32, py: i32) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }
}

/// Frame extents of a window (decoration widths), in pixels.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Margins {
    /// Top margin.
    pub top: i32,
    /// Left margin.
    pub left: i32,
    /// Bottom margin.
    pub bottom: i32,
    /// Right margin.
    pub right: i32,
}

impl Margins {
    /// Construct margins in `top, left, bottom, right` order.
    pub const fn new(top: i32, left: i32, bottom: i32, right: i32) -> Self {
        Self {
            top,
            left,
            bottom,
            right,
        }
    }

    /// Return `true` when every margin is zero or negative.
    pub const fn is_zero(self) -> bool {
        self.top <= 0 && self.left <= 0 && self.bottom <= 0 && self.right <= 0
    }
}

/// Straight-alpha color with `f64` channels in `[0, 1]`, the way the display server takes it.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Color {
    /// Red channel, not multiplied by alpha.
    pub red: f64,
    /// Green channel, not multiplied by alpha.
    pub green: f64,
    /// Blue channel, not multiplied by alpha.
    pub blue: f64,
    /// Coverage; 1 is opaque.
    pub alpha: f64,
}

impl Color {
    /// Opaque black.
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    /// Opaque white.
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);

    /// Construct a color from straight-alpha channels.
    pub const fn rgba(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Build from 16-bit channels (`0xffff` == 1.0).
    pub fn from_u16(red: u16, green: u16, blue: u16, alpha: u16) -> Self {
        let f = |v: u16| f64::from(v) / f64::from(u16::MAX);
        Self::rgba(f(red), f(green), f(blue), f(alpha))
    }

    /// Convert to premultiplied RGBA8.
    pub fn to_premul_rgba8(self) -> Rgba8Premul {
        let q = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u16;
        let a = q(self.alpha);
        Rgba8Premul::new(
            mul_div255_u8(q(self.red), a),
            mul_div255_u8(q(self.green), a),
            mul_div255_u8(q(self.blue), a),
            a as u8,
        )
    }
}

/// Premultiplied RGBA8 pixel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgba8Premul {
    /// Red (premultiplied).
    pub r: u8,
    /// Green (premultiplied).
    pub g: u8,
    /// Blue (premultiplied).
    pub b: u8,
    /// Alpha.
    pub a: u8,
}

impl Rgba8Premul {
    /// Fully transparent pixel.
    pub const TRANSPARENT: Rgba8Premul = Rgba8Premul::new(0, 0, 0, 0);

    /// Construct from premultiplied channels.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Channel array in `[r, g, b, a]` order.
    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Build from `[r, g, b, a]`.
    pub const fn from_array(px: [u8; 4]) -> Self {
        Self::new(px[0], px[1], px[2], px[3])
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
