use nalgebra::DVector;
use simba::scalar::SupersetOf;

use crate::geometry::AxisBox;
use crate::misc::FloatingPoint;

/// A fully-bounded reserved region in n-dimensional space.
///
/// The capacity is the region a tree root is provisioned to cover before it
/// must grow. Unlike [`AxisBox`], every dimension of a capacity is finite,
/// which makes it the reference used to resolve unbounded box sides into
/// concrete coordinates (midpoints, splits).
///
/// # Examples
/// ```
/// use nalgebra::dvector;
/// use orthant::prelude::Capacity;
///
/// let c = Capacity::try_new(dvector![-4., -4.], dvector![4., 4.]).unwrap();
/// assert_eq!(c.center(), dvector![0., 0.]);
/// assert_eq!(c.size(), dvector![8., 8.]);
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Capacity<T: FloatingPoint> {
    min: DVector<T>,
    max: DVector<T>,
}

impl<T: FloatingPoint> Capacity<T> {
    /// Try to create a new capacity from a minimum and maximum point.
    /// Bounds are normalized per dimension so that `min <= max` holds.
    pub fn try_new(min: DVector<T>, max: DVector<T>) -> anyhow::Result<Self> {
        anyhow::ensure!(
            min.len() == max.len(),
            "Arity mismatch: {} != {}",
            min.len(),
            max.len()
        );

        let mut tmin = min.clone();
        let mut tmax = max.clone();
        for i in 0..min.len() {
            tmin[i] = min[i].min(max[i]);
            tmax[i] = max[i].max(min[i]);
        }

        Ok(Self {
            min: tmin,
            max: tmax,
        })
    }

    /// Create a capacity from per-dimension `(min, max)` bounds.
    pub fn from_bounds(bounds: &[(T, T)]) -> Self {
        let min = DVector::from_iterator(bounds.len(), bounds.iter().map(|b| b.0.min(b.1)));
        let max = DVector::from_iterator(bounds.len(), bounds.iter().map(|b| b.0.max(b.1)));
        Self { min, max }
    }

    pub fn min(&self) -> &DVector<T> {
        &self.min
    }

    pub fn max(&self) -> &DVector<T> {
        &self.max
    }

    /// The number of dimensions of this capacity.
    pub fn arity(&self) -> usize {
        self.min.len()
    }

    pub fn center(&self) -> DVector<T> {
        (&self.min + &self.max) / T::from_usize(2).unwrap()
    }

    pub fn size(&self) -> DVector<T> {
        &self.max - &self.min
    }

    /// Split the capacity into `2^n` pieces at a midpoint.
    ///
    /// Bit `j` of a piece's index selects the upper half in dimension `j`,
    /// the same enumeration used by [`AxisBox::binary_split`] so that piece
    /// `i` of a capacity corresponds to piece `i` of its box.
    pub fn split_at(&self, mid: &DVector<T>) -> anyhow::Result<Vec<Self>> {
        anyhow::ensure!(
            mid.len() == self.arity(),
            "Arity mismatch: {} != {}",
            mid.len(),
            self.arity()
        );

        let n = self.arity();
        let mut pieces = Vec::with_capacity(1 << n);
        for index in 0..1usize << n {
            let mut min = self.min.clone();
            let mut max = self.max.clone();
            for dim in 0..n {
                if index & (1 << dim) == 0 {
                    max[dim] = mid[dim];
                } else {
                    min[dim] = mid[dim];
                }
            }
            pieces.push(Self::try_new(min, max)?);
        }
        Ok(pieces)
    }

    /// Grow the capacity so that it reserves room for a box, doubling its
    /// extent about the midpoint of the widened bounds.
    ///
    /// Per dimension: the current bounds are widened to cover the box, then
    /// every bound is scaled outward from the widened region's midpoint by a
    /// factor of two. A dimension in which the box is unbounded on either
    /// side does not participate: its reservation is left exactly as it was,
    /// only the working box widens there.
    pub fn grown_to_cover(&self, target: &AxisBox<T>) -> anyhow::Result<Self> {
        anyhow::ensure!(
            target.arity() == self.arity(),
            "Arity mismatch: {} != {}",
            target.arity(),
            self.arity()
        );

        let two = T::from_usize(2).unwrap();
        let mut min = self.min.clone();
        let mut max = self.max.clone();
        for i in 0..self.arity() {
            if let (Some(start), Some(end)) = (target.start().coord(i), target.end().coord(i)) {
                let lo = min[i].min(start);
                let hi = max[i].max(end);
                let mid = (lo + hi) / two;
                min[i] = mid + (lo - mid) * two;
                max[i] = mid + (hi - mid) * two;
            }
        }
        Self::try_new(min, max)
    }

    /// Cast the capacity to another floating point type
    pub fn cast<F: FloatingPoint + SupersetOf<T>>(&self) -> Capacity<F> {
        Capacity {
            min: self.min.clone().cast(),
            max: self.max.clone().cast(),
        }
    }
}
