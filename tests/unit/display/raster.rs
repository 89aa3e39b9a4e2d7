use super::*;
use crate::foundation::math::double_to_fixed;

#[test]
fn over_opaque_source_replaces() {
    assert_eq!(blend(PictOp::Over, [1, 2, 3, 255], [200, 0, 0, 255], 255), [200, 0, 0, 255]);
}

#[test]
fn over_transparent_source_is_noop() {
    assert_eq!(blend(PictOp::Over, [1, 2, 3, 4], [0, 0, 0, 0], 255), [1, 2, 3, 4]);
}

#[test]
fn mask_scales_source() {
    let out = blend(PictOp::Src, [9, 9, 9, 9], [255, 255, 255, 255], 128);
    assert_eq!(out, [128, 128, 128, 128]);
}

#[test]
fn difference_against_white_inverts_opaque_pixels() {
    let out = blend(PictOp::Difference, [100, 0, 255, 255], [255, 255, 255, 255], 255);
    assert_eq!(out, [155, 255, 0, 255]);
}

#[test]
fn in_reverse_scales_destination_by_source_alpha() {
    let out = blend(PictOp::InReverse, [200, 100, 50, 255], [0, 0, 0, 0], 255);
    assert_eq!(out, [0, 0, 0, 0]);
    let out = blend(PictOp::InReverse, [200, 100, 50, 255], [0, 0, 0, 255], 255);
    assert_eq!(out, [200, 100, 50, 255]);
}

#[test]
fn sampling_rules() {
    let data = [10u8, 20, 30, 40];
    let v = PixelView {
        data: &data,
        width: 1,
        height: 1,
        opaque: false,
        alpha_only: false,
        repeat: false,
    };
    assert_eq!(v.sample(0, 0), [10, 20, 30, 40]);
    assert_eq!(v.sample(1, 0), TRANSPARENT);

    let rep = PixelView { repeat: true, ..v };
    assert_eq!(rep.sample(5, -3), [10, 20, 30, 40]);

    let opaque = PixelView { opaque: true, ..v };
    assert_eq!(opaque.sample(0, 0)[3], 255);

    let a8 = PixelView {
        alpha_only: true,
        ..v
    };
    assert_eq!(a8.sample(0, 0), [0, 0, 0, 40]);
}

#[test]
fn convolution_of_constant_interior_is_identity_for_unit_sum_kernel() {
    let data = [50u8, 60, 70, 255].repeat(25);
    let v = PixelView {
        data: &data,
        width: 5,
        height: 5,
        opaque: false,
        alpha_only: false,
        repeat: false,
    };
    let w = 1.0 / 9.0;
    let mut kernel = vec![double_to_fixed(3.0), double_to_fixed(3.0)];
    kernel.extend(std::iter::repeat_n(double_to_fixed(w), 9));
    let px = v.sample_convolved(2, 2, &kernel);
    for c in 0..4 {
        assert!((i32::from(px[c]) - i32::from(data[c])).abs() <= 1);
    }
}

#[test]
fn invert_keeps_alpha() {
    assert_eq!(invert([10, 20, 30, 255]), [245, 235, 225, 255]);
    assert_eq!(invert([10, 20, 30, 100]), [90, 80, 70, 100]);
}
