/// 16.16 fixed-point value, the number format convolution filters travel in.
pub type Fixed = i32;

const FIXED_ONE: f64 = 65536.0;

/// Convert a double to 16.16 fixed point (truncating, like the wire format expects).
pub fn double_to_fixed(v: f64) -> Fixed {
    (v * FIXED_ONE) as Fixed
}

/// Convert a 16.16 fixed-point value back to a double.
pub fn fixed_to_double(v: Fixed) -> f64 {
    f64::from(v) / FIXED_ONE
}

pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

pub(crate) fn mul_div255_u8(x: u16, y: u16) -> u8 {
    mul_div255_u16(x, y) as u8
}

/// Quantize an opacity in `[0, 1]` to `0..=255`.
pub(crate) fn opacity_to_u8(opacity: f64) -> u8 {
    (opacity.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
