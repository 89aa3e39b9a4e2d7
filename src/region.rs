//! Rectangle-set region algebra.
//!
//! A [`Region`] is a set of pairwise non-overlapping, non-empty rectangles. Every operation keeps
//! that invariant, so area and equality can be computed without normalizing first.

use crate::foundation::core::Rect;
use smallvec::SmallVec;

type Rects = SmallVec<[Rect; 8]>;

/// A 2-D area made of disjoint rectangles.
///
/// Regions carry no coordinate space of their own: callers keep global (screen) and
/// window-local regions apart and use [`Region::translate`] to move between them.
#[derive(Clone, Debug, Default)]
pub struct Region {
    rects: Rects,
}

impl Region {
    /// The empty region.
    pub fn new() -> Self {
        Self::default()
    }

    /// Region covering a single rectangle (empty when `r` is empty).
    pub fn from_rect(r: Rect) -> Self {
        let mut rects = Rects::new();
        if !r.is_empty() {
            rects.push(r);
        }
        Self { rects }
    }

    /// Union of arbitrary (possibly overlapping) rectangles.
    pub fn from_rects(rects: impl IntoIterator<Item = Rect>) -> Self {
        let mut out = Self::new();
        for r in rects {
            out.union_rect(r);
        }
        out
    }

    /// The disjoint rectangles making up this region, in no particular order.
    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    /// Return `true` when the region covers no pixel.
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Drop every rectangle.
    pub fn clear(&mut self) {
        self.rects.clear();
    }

    /// Covered pixel count.
    pub fn area(&self) -> i64 {
        self.rects.iter().map(|r| r.area()).sum()
    }

    /// Bounding box; an empty rectangle for the empty region.
    pub fn extents(&self) -> Rect {
        self.rects
            .iter()
            .fold(Rect::default(), |acc, r| acc.union_bounds(*r))
    }

    /// Return `true` when pixel `(x, y)` is covered.
    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        self.rects.iter().any(|r| r.contains(x, y))
    }

    /// `self = self ∪ other`.
    pub fn union(&mut self, other: &Region) {
        for r in &other.rects {
            self.union_rect(*r);
        }
    }

    /// `self = self ∪ r`.
    pub fn union_rect(&mut self, r: Rect) {
        if r.is_empty() {
            return;
        }
        let mut pieces = Rects::new();
        pieces.push(r);
        for existing in &self.rects {
            if pieces.is_empty() {
                return;
            }
            let mut next = Rects::new();
            for p in &pieces {
                subtract_rect(*p, *existing, &mut next);
            }
            pieces = next;
        }
        self.rects.extend(pieces);
    }

    /// `self = self − other`.
    pub fn subtract(&mut self, other: &Region) {
        for cut in &other.rects {
            if self.rects.is_empty() {
                return;
            }
            self.subtract_rect(*cut);
        }
    }

    /// `self = self − r`.
    pub fn subtract_rect(&mut self, cut: Rect) {
        if cut.is_empty() {
            return;
        }
        let mut next = Rects::with_capacity(self.rects.len());
        for r in &self.rects {
            subtract_rect(*r, cut, &mut next);
        }
        self.rects = next;
    }

    /// `self = self ∩ other`.
    pub fn intersect(&mut self, other: &Region) {
        let mut next = Rects::new();
        for a in &self.rects {
            for b in &other.rects {
                if let Some(i) = a.intersect(*b) {
                    next.push(i);
                }
            }
        }
        self.rects = next;
    }

    /// `self = self ∩ r`.
    pub fn intersect_rect(&mut self, r: Rect) {
        let mut next = Rects::with_capacity(self.rects.len());
        for a in &self.rects {
            if let Some(i) = a.intersect(r) {
                next.push(i);
            }
        }
        self.rects = next;
    }

    /// Move every rectangle by `(dx, dy)`.
    pub fn translate(&mut self, dx: i32, dy: i32) {
        for r in &mut self.rects {
            *r = r.translate(dx, dy);
        }
    }

    /// By-value helpers for expression-style call sites.
    pub fn translated(mut self, dx: i32, dy: i32) -> Self {
        self.translate(dx, dy);
        self
    }

    /// `self − other` as a new region.
    pub fn minus(&self, other: &Region) -> Self {
        let mut out = self.clone();
        out.subtract(other);
        out
    }

    /// `self ∩ other` as a new region.
    pub fn and(&self, other: &Region) -> Self {
        let mut out = self.clone();
        out.intersect(other);
        out
    }
}

impl PartialEq for Region {
    /// Point-set equality: both regions cover exactly the same pixels.
    fn eq(&self, other: &Self) -> bool {
        self.area() == other.area() && self.minus(other).is_empty() && other.minus(self).is_empty()
    }
}

impl Eq for Region {}

impl From<Rect> for Region {
    fn from(r: Rect) -> Self {
        Region::from_rect(r)
    }
}

/// Push the parts of `a` not covered by `b` into `out` (at most four bands).
fn subtract_rect(a: Rect, b: Rect, out: &mut Rects) {
    let Some(i) = a.intersect(b) else {
        out.push(a);
        return;
    };

    let top = Rect::new(a.x, a.y, a.width, i.y - a.y);
    let bottom = Rect::new(a.x, i.bottom(), a.width, a.bottom() - i.bottom());
    let left = Rect::new(a.x, i.y, i.x - a.x, i.height);
    let right = Rect::new(i.right(), i.y, a.right() - i.right(), i.height);
    for piece in [top, bottom, left, right] {
        if !piece.is_empty() {
            out.push(piece);
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/region.rs"]
mod tests;
