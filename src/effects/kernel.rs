use crate::foundation::error::{WincompError, WincompResult};

/// Largest shadow radius a [`GaussianMap`] is built for.
pub const MAX_SHADOW_RADIUS: u32 = 256;

/// Square, normalized Gaussian convolution map with a summed-area table.
///
/// `rsum[y * size + x]` holds the sum of all weights from `(0, 0)` to `(x, y)` inclusive, so
/// any axis-aligned window of the map sums in constant time.
#[derive(Clone, Debug)]
pub struct GaussianMap {
    size: i32,
    data: Vec<f64>,
    rsum: Vec<f64>,
}

impl GaussianMap {
    /// Build the `(2r+1)²` map for `radius`. Radius 0 yields the sharp 1×1 kernel.
    pub fn new(radius: u32) -> WincompResult<Self> {
        let too_large =
            || WincompError::validation(format!("shadow radius {radius} exceeds {MAX_SHADOW_RADIUS}"));
        if radius > MAX_SHADOW_RADIUS {
            return Err(too_large());
        }
        let r = f64::from(radius);
        let size = i32::try_from(radius)
            .ok()
            .and_then(|r| r.checked_mul(2))
            .and_then(|d| d.checked_add(1))
            .ok_or_else(too_large)?;
        let center = size / 2;
        let cells = usize::try_from(size)
            .ok()
            .and_then(|s| s.checked_mul(s))
            .ok_or_else(too_large)?;
        let mut data = Vec::with_capacity(cells);
        for y in 0..size {
            for x in 0..size {
                data.push(gaussian(r, f64::from(x - center), f64::from(y - center)));
            }
        }
        let total: f64 = data.iter().sum();
        for v in &mut data {
            *v /= total;
        }
        let rsum = summed_area(&data, size);
        Ok(Self { size, data, rsum })
    }

    /// Side length (`2r + 1`).
    pub fn size(&self) -> i32 {
        self.size
    }

    /// Kernel radius.
    pub fn radius(&self) -> i32 {
        self.size / 2
    }

    /// Row-major normalized weights.
    pub fn weights(&self) -> &[f64] {
        &self.data
    }

    /// Sum of the weights inside the `width × height` window whose top-left is `(x, y)`,
    /// clipped to the map.
    pub fn sum_kernel(&self, x: i32, y: i32, width: i32, height: i32) -> f64 {
        let d = self.size;
        let xstart = x.max(0);
        let xend = (x + width).min(d);
        let ystart = y.max(0);
        let yend = (y + height).min(d);
        if xend <= xstart || yend <= ystart {
            return 0.0;
        }
        let at = |xx: i32, yy: i32| self.rsum[(yy * d + xx) as usize];
        let v1 = if xstart > 0 { at(xstart - 1, yend - 1) } else { 0.0 };
        let v2 = if ystart > 0 { at(xend - 1, ystart - 1) } else { 0.0 };
        let v3 = if xstart > 0 && ystart > 0 {
            at(xstart - 1, ystart - 1)
        } else {
            0.0
        };
        at(xend - 1, yend - 1) - v1 - v2 + v3
    }

    /// [`GaussianMap::sum_kernel`] clamped to `[0, 1]`.
    pub fn sum_kernel_normalized(&self, x: i32, y: i32, width: i32, height: i32) -> f64 {
        self.sum_kernel(x, y, width, height).clamp(0.0, 1.0)
    }

    fn corner(&self, x: i32, y: i32) -> f64 {
        self.rsum[(y * self.size + x) as usize]
    }
}

fn gaussian(r: f64, x: f64, y: f64) -> f64 {
    if r == 0.0 {
        return 1.0;
    }
    (-0.5 * (x * x + y * y) / (r * r)).exp() / (2.0 * std::f64::consts::PI * r * r)
}

fn summed_area(data: &[f64], d: i32) -> Vec<f64> {
    let d = d as usize;
    let mut sum = vec![0.0; d * d];
    sum[0] = data[0];
    for x in 1..d {
        sum[x] = sum[x - 1] + data[x];
    }
    for y in 1..d {
        sum[y * d] = sum[(y - 1) * d] + data[y * d];
        for x in 1..d {
            sum[y * d + x] = sum[(y - 1) * d + x] + sum[y * d + x - 1]
                - sum[(y - 1) * d + x - 1]
                + data[y * d + x];
        }
    }
    sum
}

/// 8-bit shadow alpha mask, `(w + 2r) × (h + 2r)`, tightly packed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShadowMask {
    /// Window width plus twice the radius.
    pub width: i32,
    /// Window height plus twice the radius.
    pub height: i32,
    /// One alpha byte per pixel.
    pub data: Vec<u8>,
}

impl ShadowMask {
    /// Alpha at `(x, y)`.
    pub fn at(&self, x: i32, y: i32) -> u8 {
        self.data[(y * self.width + x) as usize]
    }

    fn set(&mut self, x: i32, y: i32, v: f64) {
        self.data[(y * self.width + x) as usize] = v as u8;
    }
}

/// Compute the shadow mask of a `width × height` window.
///
/// The mask is split into four corners, four edges and the body: corners read the summed-area
/// table directly, edges repeat one value per row/column and the body is fully covered. Windows
/// narrower or shorter than the kernel are convolved directly instead.
pub fn make_shadow(
    map: &GaussianMap,
    opacity: f64,
    width: i32,
    height: i32,
) -> WincompResult<ShadowMask> {
    if width <= 0 || height <= 0 {
        return Err(WincompError::validation(format!(
            "shadow of empty window {width}x{height}"
        )));
    }
    let d = map.size();
    let r = map.radius();
    let swidth = width + r * 2;
    let sheight = height + r * 2;
    let scale = opacity.clamp(0.0, 1.0) * 255.0;
    let mut mask = ShadowMask {
        width: swidth,
        height: sheight,
        data: vec![0; (swidth * sheight) as usize],
    };

    if width < r * 2 && height < r * 2 {
        for y in 0..sheight {
            for x in 0..swidth {
                let sum = map.sum_kernel_normalized(d - x - 1, d - y - 1, width, height);
                mask.set(x, y, sum * scale);
            }
        }
        return Ok(mask);
    }

    if height < r * 2 {
        for y in 0..sheight {
            for x in 0..r * 2 {
                let sum = map.sum_kernel_normalized(d - x - 1, d - y - 1, d, height) * scale;
                mask.set(x, y, sum);
                mask.set(swidth - x - 1, y, sum);
            }
            let sum = map.sum_kernel_normalized(0, d - y - 1, d, height) * scale;
            for x in r * 2..width {
                mask.set(x, y, sum);
            }
        }
        return Ok(mask);
    }

    if width < r * 2 {
        for y in 0..r * 2 {
            for x in 0..swidth {
                let sum = map.sum_kernel_normalized(d - x - 1, d - y - 1, width, d) * scale;
                mask.set(x, y, sum);
                mask.set(x, sheight - y - 1, sum);
            }
        }
        for x in 0..swidth {
            let sum = map.sum_kernel_normalized(d - x - 1, 0, width, d) * scale;
            for y in r * 2..height {
                mask.set(x, y, sum);
            }
        }
        return Ok(mask);
    }

    // body
    for y in r..height + r {
        for x in r..width + r {
            mask.set(x, y, scale);
        }
    }

    // corners
    for y in 0..r * 2 {
        for x in 0..r * 2 {
            let v = map.corner(x, y) * scale;
            mask.set(x, y, v);
            mask.set(x, sheight - y - 1, v);
            mask.set(swidth - x - 1, sheight - y - 1, v);
            mask.set(swidth - x - 1, y, v);
        }
    }

    // top and bottom edges
    for y in 0..r * 2 {
        let v = map.corner(d - 1, y) * scale;
        for x in r * 2..width {
            mask.set(x, y, v);
            mask.set(x, sheight - y - 1, v);
        }
    }

    // left and right edges
    for x in 0..r * 2 {
        let v = map.corner(x, d - 1) * scale;
        for y in r * 2..height {
            mask.set(x, y, v);
            mask.set(swidth - x - 1, y, v);
        }
    }

    Ok(mask)
}

#[cfg(test)]
#[path = "../../tests/unit/effects/kernel.rs"]
mod tests;
