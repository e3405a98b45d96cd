use nalgebra::DVector;
use simba::scalar::SupersetOf;

use crate::geometry::{Capacity, Corner};
use crate::misc::FloatingPoint;

/// An axis-aligned box in n-dimensional space, built from two same-arity
/// corners. Either side of any dimension may be unbounded, so a box can
/// describe closed, half-open, and fully open regions alike.
///
/// # Examples
/// ```
/// use orthant::prelude::{AxisBox, Corner};
///
/// // the half-open strip x in [0, 2], y in (-inf, 5]
/// let b = AxisBox::try_new(
///     Corner::new(vec![Some(0.), None]),
///     Corner::new(vec![Some(2.), Some(5.)]),
/// ).unwrap();
/// assert_eq!(b.arity(), 2);
///
/// // corners of differing arity are rejected
/// assert!(AxisBox::try_new(Corner::<f64>::unbounded(2), Corner::unbounded(3)).is_err());
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AxisBox<T: FloatingPoint> {
    start: Corner<T>,
    end: Corner<T>,
}

impl<T: FloatingPoint> AxisBox<T> {
    /// Try to create a new box from a start and end corner.
    pub fn try_new(start: Corner<T>, end: Corner<T>) -> anyhow::Result<Self> {
        anyhow::ensure!(
            start.arity() == end.arity(),
            "Arity mismatch: {} != {}",
            start.arity(),
            end.arity()
        );
        Ok(Self { start, end })
    }

    /// Create a box from per-dimension `(start, end)` intervals.
    pub fn from_intervals(intervals: &[(Option<T>, Option<T>)]) -> Self {
        Self {
            start: Corner::new(intervals.iter().map(|i| i.0).collect()),
            end: Corner::new(intervals.iter().map(|i| i.1).collect()),
        }
    }

    /// Create a fully-bounded box from two points.
    pub fn bounded(min: &DVector<T>, max: &DVector<T>) -> anyhow::Result<Self> {
        Self::try_new(Corner::bounded(min), Corner::bounded(max))
    }

    pub fn start(&self) -> &Corner<T> {
        &self.start
    }

    pub fn end(&self) -> &Corner<T> {
        &self.end
    }

    /// The number of dimensions of this box.
    pub fn arity(&self) -> usize {
        self.start.arity()
    }

    fn ensure_same_arity(&self, other: &Self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.arity() == other.arity(),
            "Arity mismatch: {} != {}",
            self.arity(),
            other.arity()
        );
        Ok(())
    }

    /// Check if the box contains another box.
    ///
    /// An unbounded side of `self` admits anything on that side; a bounded
    /// side of `self` never admits an unbounded side of `other`.
    ///
    /// # Examples
    /// ```
    /// use orthant::prelude::AxisBox;
    ///
    /// let outer = AxisBox::from_intervals(&[(Some(-8.), Some(8.))]);
    /// let inner = AxisBox::from_intervals(&[(Some(3.), Some(5.))]);
    /// assert!(outer.contains(&inner).unwrap());
    /// assert!(!inner.contains(&outer).unwrap());
    ///
    /// let ray = AxisBox::from_intervals(&[(Some(0.), None)]);
    /// assert!(!outer.contains(&ray).unwrap());
    /// assert!(ray.contains(&AxisBox::from_intervals(&[(Some(1.), Some(2.))])).unwrap());
    /// ```
    pub fn contains(&self, other: &Self) -> anyhow::Result<bool> {
        self.ensure_same_arity(other)?;
        for i in 0..self.arity() {
            let start_ok = match (self.start.coord(i), other.start.coord(i)) {
                (None, _) => true,
                (Some(_), None) => false,
                (Some(a), Some(b)) => a <= b,
            };
            let end_ok = match (self.end.coord(i), other.end.coord(i)) {
                (None, _) => true,
                (Some(_), None) => false,
                (Some(a), Some(b)) => b <= a,
            };
            if !start_ok || !end_ok {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Check if the box intersects another box.
    ///
    /// Ranges that merely touch at a shared bound count as intersecting;
    /// unbounded sides always overlap.
    ///
    /// # Examples
    /// ```
    /// use orthant::prelude::AxisBox;
    ///
    /// let a = AxisBox::from_intervals(&[(Some(0.), Some(2.))]);
    /// let b = AxisBox::from_intervals(&[(Some(2.), Some(4.))]);
    /// let c = AxisBox::from_intervals(&[(Some(3.), None)]);
    /// assert!(a.intersects(&b).unwrap());
    /// assert!(!a.intersects(&c).unwrap());
    /// assert!(b.intersects(&c).unwrap());
    /// ```
    pub fn intersects(&self, other: &Self) -> anyhow::Result<bool> {
        self.ensure_same_arity(other)?;
        for i in 0..self.arity() {
            let lo = match (self.start.coord(i), other.start.coord(i)) {
                (Some(a), Some(b)) => Some(a.max(b)),
                (Some(a), None) => Some(a),
                (None, b) => b,
            };
            let hi = match (self.end.coord(i), other.end.coord(i)) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (Some(a), None) => Some(a),
                (None, b) => b,
            };
            if let (Some(lo), Some(hi)) = (lo, hi) {
                if lo > hi {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    /// The overlap of two boxes, or `None` when they are disjoint.
    ///
    /// Each dimension is clamped to `[max(starts), min(ends)]`, with
    /// unbounded sides absorbed by their finite counterpart; a dimension
    /// unbounded on a side in both boxes stays unbounded there.
    ///
    /// # Examples
    /// ```
    /// use orthant::prelude::AxisBox;
    ///
    /// let a = AxisBox::from_intervals(&[(Some(-1.), Some(3.))]);
    /// let b = AxisBox::from_intervals(&[(Some(0.), None)]);
    /// let overlap = a.intersection(&b).unwrap().unwrap();
    /// assert_eq!(overlap, AxisBox::from_intervals(&[(Some(0.), Some(3.))]));
    ///
    /// let far = AxisBox::from_intervals(&[(Some(5.), Some(6.))]);
    /// assert!(a.intersection(&far).unwrap().is_none());
    /// ```
    pub fn intersection(&self, other: &Self) -> anyhow::Result<Option<Self>> {
        self.ensure_same_arity(other)?;
        let n = self.arity();
        let mut start = Vec::with_capacity(n);
        let mut end = Vec::with_capacity(n);
        for i in 0..n {
            let lo = match (self.start.coord(i), other.start.coord(i)) {
                (Some(a), Some(b)) => Some(a.max(b)),
                (Some(a), None) => Some(a),
                (None, b) => b,
            };
            let hi = match (self.end.coord(i), other.end.coord(i)) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (Some(a), None) => Some(a),
                (None, b) => b,
            };
            if let (Some(lo), Some(hi)) = (lo, hi) {
                if lo > hi {
                    return Ok(None);
                }
            }
            start.push(lo);
            end.push(hi);
        }
        Ok(Some(Self {
            start: Corner::new(start),
            end: Corner::new(end),
        }))
    }

    /// The smallest box covering both boxes. Unbounded sides absorb their
    /// finite counterpart.
    pub fn union(&self, other: &Self) -> anyhow::Result<Self> {
        self.ensure_same_arity(other)?;
        let n = self.arity();
        let mut start = Vec::with_capacity(n);
        let mut end = Vec::with_capacity(n);
        for i in 0..n {
            start.push(match (self.start.coord(i), other.start.coord(i)) {
                (Some(a), Some(b)) => Some(a.min(b)),
                _ => None,
            });
            end.push(match (self.end.coord(i), other.end.coord(i)) {
                (Some(a), Some(b)) => Some(a.max(b)),
                _ => None,
            });
        }
        Ok(Self {
            start: Corner::new(start),
            end: Corner::new(end),
        })
    }

    /// Resolve the box into fully-bounded `(start, end)` points, taking the
    /// capacity's bound wherever a side is unbounded.
    pub fn resolved_against(&self, capacity: &Capacity<T>) -> anyhow::Result<(DVector<T>, DVector<T>)> {
        anyhow::ensure!(
            self.arity() == capacity.arity(),
            "Arity mismatch: {} != {}",
            self.arity(),
            capacity.arity()
        );
        let n = self.arity();
        let lo = DVector::from_iterator(
            n,
            (0..n).map(|i| self.start.coord(i).unwrap_or(capacity.min()[i])),
        );
        let hi = DVector::from_iterator(
            n,
            (0..n).map(|i| self.end.coord(i).unwrap_or(capacity.max()[i])),
        );
        Ok((lo, hi))
    }

    /// The midpoint of the box, resolved against a capacity when a side is
    /// unbounded.
    pub fn midpoint_within(&self, capacity: &Capacity<T>) -> anyhow::Result<DVector<T>> {
        let (lo, hi) = self.resolved_against(capacity)?;
        Ok((lo + hi) / T::from_usize(2).unwrap())
    }

    /// Bisect every dimension at a midpoint, producing all `2^n`
    /// combinations of lower and upper halves. Unbounded sides are preserved
    /// on the outer halves.
    ///
    /// Bit `j` of a piece's index selects the upper half in dimension `j`.
    ///
    /// # Examples
    /// ```
    /// use nalgebra::dvector;
    /// use orthant::prelude::AxisBox;
    ///
    /// let b = AxisBox::from_intervals(&[(Some(-8.), Some(8.))]);
    /// let halves = b.binary_split(&dvector![0.]).unwrap();
    /// assert_eq!(halves[0], AxisBox::from_intervals(&[(Some(-8.), Some(0.))]));
    /// assert_eq!(halves[1], AxisBox::from_intervals(&[(Some(0.), Some(8.))]));
    /// ```
    pub fn binary_split(&self, mid: &DVector<T>) -> anyhow::Result<Vec<Self>> {
        anyhow::ensure!(
            mid.len() == self.arity(),
            "Arity mismatch: {} != {}",
            mid.len(),
            self.arity()
        );
        let n = self.arity();
        let mut pieces = Vec::with_capacity(1 << n);
        for index in 0..1usize << n {
            let mut start = Vec::with_capacity(n);
            let mut end = Vec::with_capacity(n);
            for dim in 0..n {
                if index & (1 << dim) == 0 {
                    start.push(self.start.coord(dim));
                    end.push(Some(mid[dim]));
                } else {
                    start.push(Some(mid[dim]));
                    end.push(self.end.coord(dim));
                }
            }
            pieces.push(Self {
                start: Corner::new(start),
                end: Corner::new(end),
            });
        }
        Ok(pieces)
    }

    /// Cast the box to another floating point type
    pub fn cast<F: FloatingPoint + SupersetOf<T>>(&self) -> AxisBox<F> {
        AxisBox {
            start: self.start.cast(),
            end: self.end.cast(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::dvector;

    fn boxed(intervals: &[(f64, f64)]) -> AxisBox<f64> {
        AxisBox::from_intervals(
            &intervals
                .iter()
                .map(|&(s, e)| (Some(s), Some(e)))
                .collect::<Vec<_>>(),
        )
    }

    #[test]
    fn operations_reject_arity_mismatch() {
        let a = boxed(&[(0., 1.)]);
        let b = boxed(&[(0., 1.), (0., 1.)]);
        assert!(a.contains(&b).is_err());
        assert!(a.intersects(&b).is_err());
        assert!(a.intersection(&b).is_err());
        assert!(a.union(&b).is_err());
    }

    #[test]
    fn touching_boxes_intersect_with_degenerate_overlap() {
        let a = boxed(&[(0., 2.)]);
        let b = boxed(&[(2., 4.)]);
        assert!(a.intersects(&b).unwrap());
        let overlap = a.intersection(&b).unwrap().unwrap();
        assert_eq!(overlap, boxed(&[(2., 2.)]));
    }

    #[test]
    fn union_absorbs_unbounded_sides() {
        let a = boxed(&[(0., 2.)]);
        let ray = AxisBox::from_intervals(&[(Some(5.), None)]);
        let u = a.union(&ray).unwrap();
        assert_eq!(u, AxisBox::from_intervals(&[(Some(0.), None)]));
    }

    #[test]
    fn unbounded_dimensions_stay_unbounded_in_intersection() {
        let a = AxisBox::from_intervals(&[(None, Some(2.)), (None, None)]);
        let b = AxisBox::from_intervals(&[(None, Some(5.)), (None, Some(1.))]);
        let overlap = a.intersection(&b).unwrap().unwrap();
        assert_eq!(
            overlap,
            AxisBox::from_intervals(&[(None, Some(2.)), (None, Some(1.))])
        );
    }

    #[test]
    fn split_pieces_cover_the_box_and_share_only_faces() {
        let b = boxed(&[(-2., 2.), (0., 8.)]);
        let mid = dvector![0., 4.];
        let pieces = b.binary_split(&mid).unwrap();
        assert_eq!(pieces.len(), 4);

        let mut cover = pieces[0].clone();
        for piece in &pieces[1..] {
            cover = cover.union(piece).unwrap();
        }
        assert_eq!(cover, b);

        for i in 0..pieces.len() {
            for j in i + 1..pieces.len() {
                let overlap = pieces[i].intersection(&pieces[j]).unwrap().unwrap();
                // pieces may share a face but never interior volume
                let degenerate = (0..overlap.arity()).any(|d| {
                    overlap.start().coord(d).unwrap() == overlap.end().coord(d).unwrap()
                });
                assert!(degenerate, "pieces {i} and {j} overlap in the interior");
            }
        }
    }

    #[test]
    fn split_preserves_unbounded_outer_halves() {
        let b = AxisBox::from_intervals(&[(None, None)]);
        let pieces = b.binary_split(&dvector![3.]).unwrap();
        assert_eq!(pieces[0], AxisBox::from_intervals(&[(None, Some(3.))]));
        assert_eq!(pieces[1], AxisBox::from_intervals(&[(Some(3.), None)]));
    }

    #[test]
    fn resolution_substitutes_capacity_bounds() {
        let b = AxisBox::from_intervals(&[(None, Some(2.)), (Some(-1.), None)]);
        let cap = Capacity::from_bounds(&[(-8., 8.), (-8., 8.)]);
        let (lo, hi) = b.resolved_against(&cap).unwrap();
        assert_eq!(lo, dvector![-8., -1.]);
        assert_eq!(hi, dvector![2., 8.]);

        let mid = b.midpoint_within(&cap).unwrap();
        assert_relative_eq!(mid[0], -3.);
        assert_relative_eq!(mid[1], 3.5);
    }
}
