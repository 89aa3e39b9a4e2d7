use crate::display::PictOp;
use crate::foundation::math::{Fixed, fixed_to_double, mul_div255_u8};

/// Premultiplied RGBA8 pixel.
pub(crate) type Px = [u8; 4];

pub(crate) const TRANSPARENT: Px = [0, 0, 0, 0];

/// Read-only view over a tightly packed RGBA8 buffer with picture sampling rules applied.
#[derive(Clone, Copy)]
pub(crate) struct PixelView<'a> {
    pub(crate) data: &'a [u8],
    pub(crate) width: i32,
    pub(crate) height: i32,
    /// Alpha channel is ignored and reads as 255 (24-bit formats).
    pub(crate) opaque: bool,
    /// Only the alpha channel is meaningful (A8).
    pub(crate) alpha_only: bool,
    /// Out-of-bounds reads wrap instead of returning transparent.
    pub(crate) repeat: bool,
}

impl PixelView<'_> {
    pub(crate) fn sample(&self, x: i32, y: i32) -> Px {
        if self.width <= 0 || self.height <= 0 {
            return TRANSPARENT;
        }
        let (x, y) = if self.repeat {
            (x.rem_euclid(self.width), y.rem_euclid(self.height))
        } else if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return TRANSPARENT;
        } else {
            (x, y)
        };
        let idx = ((y * self.width + x) as usize) * 4;
        let mut px = [
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ];
        if self.alpha_only {
            px = [0, 0, 0, px[3]];
        }
        if self.opaque {
            px[3] = 255;
        }
        px
    }

    /// Sample through a `[w, h, weights...]` fixed-point convolution kernel centered on `(x, y)`.
    pub(crate) fn sample_convolved(&self, x: i32, y: i32, kernel: &[Fixed]) -> Px {
        let Some((kw, kh, weights)) = split_kernel(kernel) else {
            return self.sample(x, y);
        };
        let (cx, cy) = (kw / 2, kh / 2);
        let mut acc = [0.0f64; 4];
        for ky in 0..kh {
            for kx in 0..kw {
                let w = weights[(ky * kw + kx) as usize];
                if w == 0.0 {
                    continue;
                }
                let px = self.sample(x + kx - cx, y + ky - cy);
                for c in 0..4 {
                    acc[c] += w * f64::from(px[c]);
                }
            }
        }
        acc.map(|v| v.round().clamp(0.0, 255.0) as u8)
    }
}

/// Decode `[w, h, weights...]` into dimensions and `f64` weights.
pub(crate) fn split_kernel(kernel: &[Fixed]) -> Option<(i32, i32, Vec<f64>)> {
    if kernel.len() < 2 {
        return None;
    }
    let kw = fixed_to_double(kernel[0]) as i32;
    let kh = fixed_to_double(kernel[1]) as i32;
    if kw <= 0 || kh <= 0 || kernel.len() < 2 + (kw * kh) as usize {
        return None;
    }
    let weights = kernel[2..2 + (kw * kh) as usize]
        .iter()
        .map(|&v| fixed_to_double(v))
        .collect();
    Some((kw, kh, weights))
}

/// Apply one operator to a pixel. `mask` scales the source first (255 = no mask).
pub(crate) fn blend(op: PictOp, dst: Px, src: Px, mask: u8) -> Px {
    let s = if mask == 255 { src } else { scale(src, mask) };
    match op {
        PictOp::Src => s,
        PictOp::Over => over(dst, s),
        PictOp::Difference => difference(dst, s),
        PictOp::InReverse => scale(dst, s[3]),
    }
}

pub(crate) fn over(dst: Px, src: Px) -> Px {
    if src[3] == 255 {
        return src;
    }
    if src[3] == 0 && src[..3] == [0, 0, 0] {
        return dst;
    }
    let inv = 255u16 - u16::from(src[3]);
    let mut out = [0u8; 4];
    for c in 0..4 {
        out[c] = src[c].saturating_add(mul_div255_u8(u16::from(dst[c]), inv));
    }
    out
}

pub(crate) fn scale(px: Px, factor: u8) -> Px {
    if factor == 255 {
        return px;
    }
    let f = u16::from(factor);
    px.map(|c| mul_div255_u8(u16::from(c), f))
}

fn difference(dst: Px, src: Px) -> Px {
    let (sa, da) = (u32::from(src[3]), u32::from(dst[3]));
    let mut out = [0u8; 4];
    for c in 0..3 {
        let (sc, dc) = (u32::from(src[c]), u32::from(dst[c]));
        let m = ((sc * da).min(dc * sa) + 127) / 255;
        out[c] = (sc + dc).saturating_sub(2 * m).min(255) as u8;
    }
    out[3] = (sa + da - u32::from(mul_div255_u8(sa as u16, da as u16))).min(255) as u8;
    out
}

/// Invert premultiplied color channels against their own alpha.
pub(crate) fn invert(px: Px) -> Px {
    [px[3] - px[0].min(px[3]), px[3] - px[1].min(px[3]), px[3] - px[2].min(px[3]), px[3]]
}

#[cfg(test)]
#[path = "../../tests/unit/display/raster.rs"]
mod tests;
