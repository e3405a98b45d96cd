use itertools::Itertools;
use simba::scalar::SupersetOf;

use crate::geometry::{AxisBox, Capacity};
use crate::misc::FloatingPoint;

/// The region a tree node is responsible for: the working box it partitions
/// plus the fully-bounded capacity reserved for it.
///
/// At the root the capacity decides when an insert forces the tree to grow.
/// Below the root, boundaries are fixed: a binary split hands each child the
/// matching pieces of both the box and the capacity, so that children with
/// unbounded sides can still resolve midpoints for further splits.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Boundary<T: FloatingPoint> {
    capacity: Capacity<T>,
    bounds: AxisBox<T>,
}

impl<T: FloatingPoint> Boundary<T> {
    /// Try to create a new boundary from a capacity and a working box.
    pub fn try_new(capacity: Capacity<T>, bounds: AxisBox<T>) -> anyhow::Result<Self> {
        anyhow::ensure!(
            capacity.arity() == bounds.arity(),
            "Arity mismatch: {} != {}",
            capacity.arity(),
            bounds.arity()
        );
        Ok(Self { capacity, bounds })
    }

    /// A boundary whose working box coincides with its capacity.
    pub fn from_capacity(capacity: Capacity<T>) -> Self {
        let bounds = AxisBox::bounded(capacity.min(), capacity.max())
            .expect("capacity corners share an arity");
        Self { capacity, bounds }
    }

    pub fn capacity(&self) -> &Capacity<T> {
        &self.capacity
    }

    pub fn bounds(&self) -> &AxisBox<T> {
        &self.bounds
    }

    /// The number of dimensions of this boundary.
    pub fn arity(&self) -> usize {
        self.bounds.arity()
    }

    /// Split the boundary into `2^n` child boundaries, bisecting every
    /// dimension at the midpoint of the working box resolved against the
    /// capacity. This is the sole subdivision rule of the tree.
    pub fn binary_split(&self) -> anyhow::Result<Vec<Self>> {
        let mid = self.bounds.midpoint_within(&self.capacity)?;
        let boxes = self.bounds.binary_split(&mid)?;
        let capacities = self.capacity.split_at(&mid)?;
        Ok(boxes
            .into_iter()
            .zip_eq(capacities)
            .map(|(bounds, capacity)| Self { capacity, bounds })
            .collect())
    }

    /// The boundary that results from growing this one to admit a box: the
    /// capacity doubles about the widened midpoint (skipping dimensions in
    /// which the box is unbounded) and the working box becomes the exact
    /// union of the old box and the new one.
    pub fn grown_for(&self, target: &AxisBox<T>) -> anyhow::Result<Self> {
        let capacity = self.capacity.grown_to_cover(target)?;
        let bounds = self.bounds.union(target)?;
        Ok(Self { capacity, bounds })
    }

    /// Cast the boundary to another floating point type
    pub fn cast<F: FloatingPoint + SupersetOf<T>>(&self) -> Boundary<F> {
        Boundary {
            capacity: self.capacity.cast(),
            bounds: self.bounds.cast(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Corner;

    #[test]
    fn arity_mismatch_is_rejected() {
        let capacity = Capacity::from_bounds(&[(-1., 1.)]);
        let bounds = AxisBox::from_intervals(&[(Some(0.), Some(1.)), (Some(0.), Some(1.))]);
        assert!(Boundary::try_new(capacity, bounds).is_err());
    }

    #[test]
    fn split_children_partition_box_and_capacity_alike() {
        let boundary = Boundary::from_capacity(Capacity::from_bounds(&[(-8., 8.)]));
        let children = boundary.binary_split().unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(
            children[0].bounds(),
            &AxisBox::from_intervals(&[(Some(-8.), Some(0.))])
        );
        assert_eq!(children[1].capacity(), &Capacity::from_bounds(&[(0., 8.)]));
    }

    #[test]
    fn split_of_unbounded_box_uses_capacity_for_the_midpoint() {
        let capacity = Capacity::from_bounds(&[(0., 4.)]);
        let bounds = AxisBox::try_new(Corner::new(vec![Some(0.)]), Corner::new(vec![None])).unwrap();
        let boundary = Boundary::try_new(capacity, bounds).unwrap();
        let children = boundary.binary_split().unwrap();
        assert_eq!(
            children[0].bounds(),
            &AxisBox::from_intervals(&[(Some(0.), Some(2.))])
        );
        assert_eq!(
            children[1].bounds(),
            &AxisBox::from_intervals(&[(Some(2.), None)])
        );
        assert_eq!(children[1].capacity(), &Capacity::from_bounds(&[(2., 4.)]));
    }

    #[test]
    fn growth_unions_the_box_and_doubles_the_capacity() {
        let capacity = Capacity::from_bounds(&[(-4., 4.)]);
        let bounds = AxisBox::from_intervals(&[(Some(-8.), Some(8.))]);
        let boundary = Boundary::try_new(capacity, bounds).unwrap();

        let inserted = AxisBox::from_intervals(&[(Some(6.), Some(13.))]);
        let grown = boundary.grown_for(&inserted).unwrap();
        assert_eq!(
            grown.bounds(),
            &AxisBox::from_intervals(&[(Some(-8.), Some(13.))])
        );
        assert_eq!(grown.capacity(), &Capacity::from_bounds(&[(-12.5, 21.5)]));
    }
}
