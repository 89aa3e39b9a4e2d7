use super::*;

fn r(x: i32, y: i32, w: i32, h: i32) -> Rect {
    Rect::new(x, y, w, h)
}

fn disjoint(reg: &Region) -> bool {
    let rs = reg.rects();
    for i in 0..rs.len() {
        for j in (i + 1)..rs.len() {
            if rs[i].intersect(rs[j]).is_some() {
                return false;
            }
        }
    }
    true
}

#[test]
fn empty_inputs_give_empty_results() {
    let mut a = Region::new();
    a.union(&Region::new());
    assert!(a.is_empty());
    a.subtract(&Region::from_rect(r(0, 0, 5, 5)));
    assert!(a.is_empty());
    a.intersect_rect(r(0, 0, 5, 5));
    assert!(a.is_empty());
    assert!(Region::from_rect(r(0, 0, 0, 10)).is_empty());
    assert_eq!(Region::new().extents(), Rect::default());
}

#[test]
fn union_of_overlapping_rects_counts_area_once() {
    let reg = Region::from_rects([r(0, 0, 10, 10), r(5, 5, 10, 10)]);
    assert_eq!(reg.area(), 100 + 100 - 25);
    assert!(disjoint(&reg));
    assert_eq!(reg.extents(), r(0, 0, 15, 15));
}

#[test]
fn subtract_punches_a_hole() {
    let mut reg = Region::from_rect(r(0, 0, 10, 10));
    reg.subtract_rect(r(3, 3, 4, 4));
    assert_eq!(reg.area(), 100 - 16);
    assert!(!reg.contains_point(4, 4));
    assert!(reg.contains_point(0, 0));
    assert!(reg.contains_point(9, 9));
    assert!(disjoint(&reg));
}

#[test]
fn intersect_keeps_overlap_only() {
    let mut a = Region::from_rects([r(0, 0, 4, 4), r(6, 0, 4, 4)]);
    let b = Region::from_rect(r(2, 2, 6, 6));
    a.intersect(&b);
    assert_eq!(a, Region::from_rects([r(2, 2, 2, 2), r(6, 2, 2, 2)]));
}

#[test]
fn translate_moves_every_rect() {
    let reg = Region::from_rects([r(0, 0, 2, 2), r(4, 4, 1, 1)]).translated(10, -1);
    assert!(reg.contains_point(10, -1));
    assert!(reg.contains_point(14, 3));
    assert!(!reg.contains_point(0, 0));
}

#[test]
fn equality_is_point_set_equality() {
    let a = Region::from_rects([r(0, 0, 5, 10), r(5, 0, 5, 10)]);
    let b = Region::from_rect(r(0, 0, 10, 10));
    assert_eq!(a, b);
    assert_ne!(a, Region::from_rect(r(0, 0, 10, 9)));
}

#[test]
fn intersect_of_union_with_a_is_a() {
    let cases = [
        (vec![r(0, 0, 10, 10)], vec![r(5, 5, 10, 10)]),
        (vec![r(0, 0, 3, 3), r(10, 10, 2, 2)], vec![r(20, 20, 5, 5)]),
        (vec![r(-4, -4, 8, 8)], vec![r(-2, -2, 4, 4), r(3, -10, 2, 30)]),
        (vec![], vec![r(0, 0, 1, 1)]),
    ];
    for (a_rects, b_rects) in cases {
        let a = Region::from_rects(a_rects);
        let b = Region::from_rects(b_rects);
        let mut u = a.clone();
        u.union(&b);
        assert!(disjoint(&u));
        u.intersect(&a);
        assert_eq!(u, a);
    }
}

#[test]
fn subtract_then_union_restores_when_contained() {
    let whole = Region::from_rect(r(0, 0, 20, 20));
    let part = Region::from_rects([r(2, 2, 3, 3), r(10, 0, 5, 20)]);
    let mut rest = whole.minus(&part);
    assert_eq!(rest.area(), 400 - 9 - 100);
    rest.union(&part);
    assert_eq!(rest, whole);
}
