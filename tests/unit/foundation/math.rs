use super::*;

#[test]
fn mul_div255_endpoints() {
    assert_eq!(mul_div255_u8(255, 255), 255);
    assert_eq!(mul_div255_u8(0, 255), 0);
    assert_eq!(mul_div255_u8(255, 0), 0);
    assert_eq!(mul_div255_u8(128, 255), 128);
}

#[test]
fn fixed_point_conversions() {
    assert_eq!(double_to_fixed(1.0), 65536);
    assert_eq!(double_to_fixed(0.5), 32768);
    assert_eq!(double_to_fixed(3.0), 3 << 16);
    assert!((fixed_to_double(double_to_fixed(0.243117)) - 0.243117).abs() < 1e-4);
}

#[test]
fn opacity_quantization_clamps() {
    assert_eq!(opacity_to_u8(-1.0), 0);
    assert_eq!(opacity_to_u8(2.0), 255);
    assert_eq!(opacity_to_u8(0.5), 128);
}
