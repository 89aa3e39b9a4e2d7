use super::*;

fn brute_sum(map: &GaussianMap, x: i32, y: i32, w: i32, h: i32) -> f64 {
    let d = map.size();
    let mut acc = 0.0;
    for yy in y.max(0)..(y + h).min(d) {
        for xx in x.max(0)..(x + w).min(d) {
            acc += map.weights()[(yy * d + xx) as usize];
        }
    }
    acc
}

#[test]
fn radius_zero_is_sharp() {
    let map = GaussianMap::new(0).expect("map");
    assert_eq!(map.size(), 1);
    assert_eq!(map.weights(), &[1.0]);
    let mask = make_shadow(&map, 1.0, 3, 2).expect("mask");
    assert_eq!((mask.width, mask.height), (3, 2));
    assert!(mask.data.iter().all(|&a| a == 255));
}

#[test]
fn gaussian_map_is_normalized() {
    for radius in [1, 3, 12] {
        let map = GaussianMap::new(radius).expect("map");
        assert_eq!(map.size(), radius as i32 * 2 + 1);
        let total: f64 = map.weights().iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert!((map.sum_kernel(0, 0, map.size(), map.size()) - 1.0).abs() < 1e-9);
    }
}

#[test]
fn summed_area_matches_brute_force() {
    let map = GaussianMap::new(4).expect("map");
    for (x, y, w, h) in [(0, 0, 3, 3), (2, 5, 4, 10), (-3, -2, 6, 5), (7, 7, 9, 9)] {
        let fast = map.sum_kernel(x, y, w, h);
        let slow = brute_sum(&map, x, y, w, h);
        assert!((fast - slow).abs() < 1e-9, "window {x},{y},{w},{h}");
    }
    assert_eq!(map.sum_kernel(20, 0, 3, 3), 0.0);
    assert!(map.sum_kernel_normalized(-50, -50, 200, 200) <= 1.0);
}

#[test]
fn large_window_mask_shape() {
    let map = GaussianMap::new(3).expect("map");
    let mask = make_shadow(&map, 1.0, 40, 30).expect("mask");
    assert_eq!((mask.width, mask.height), (46, 36));
    assert_eq!(mask.at(23, 18), 255);
    assert!(mask.at(0, 0) < mask.at(5, 5));
    assert!(mask.at(0, 18) < mask.at(6, 18));
    assert_eq!(mask.at(0, 0), mask.at(45, 35));
    assert_eq!(mask.at(10, 0), mask.at(10, 35));
    assert_eq!(mask.at(0, 12), mask.at(45, 12));
}

#[test]
fn opacity_scales_the_body() {
    let map = GaussianMap::new(2).expect("map");
    let mask = make_shadow(&map, 0.5, 20, 20).expect("mask");
    assert_eq!(mask.at(12, 12), 127);
}

#[test]
fn small_windows_use_direct_convolution() {
    let map = GaussianMap::new(3).expect("map");
    for (w, h) in [(2, 2), (2, 20), (20, 2)] {
        let mask = make_shadow(&map, 1.0, w, h).expect("mask");
        assert_eq!((mask.width, mask.height), (w + 6, h + 6));
        for y in 0..mask.height {
            for x in 0..mask.width {
                let mirrored = mask.at(mask.width - 1 - x, y);
                assert!((i32::from(mask.at(x, y)) - i32::from(mirrored)).abs() <= 1);
            }
        }
        let center = mask.at(mask.width / 2, mask.height / 2);
        assert!(center > mask.at(0, 0));
        assert!(center < 255);
    }
}

#[test]
fn empty_window_is_rejected() {
    let map = GaussianMap::new(1).expect("map");
    assert!(make_shadow(&map, 1.0, 0, 5).is_err());
}
