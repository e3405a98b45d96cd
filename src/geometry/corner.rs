use nalgebra::DVector;
use simba::scalar::SupersetOf;

use crate::misc::FloatingPoint;

/// One end of an axis-aligned box: an ordered sequence of coordinates,
/// each of which is either finite or unbounded in its dimension.
///
/// An unbounded coordinate (`None`) stands for negative infinity when the
/// corner is used as the start of a box and positive infinity when it is
/// used as the end.
///
/// # Examples
/// ```
/// use orthant::prelude::Corner;
///
/// let c = Corner::new(vec![Some(1.), None, Some(-2.)]);
/// assert_eq!(c.arity(), 3);
/// assert!(!c.is_bounded());
/// assert_eq!(c.coord(1), None);
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Corner<T: FloatingPoint> {
    coords: Vec<Option<T>>,
}

impl<T: FloatingPoint> Corner<T> {
    /// Create a new corner from per-dimension coordinates.
    pub fn new(coords: Vec<Option<T>>) -> Self {
        Self { coords }
    }

    /// Create a fully-bounded corner from a point.
    pub fn bounded(point: &DVector<T>) -> Self {
        Self {
            coords: point.iter().map(|v| Some(*v)).collect(),
        }
    }

    /// Create a corner that is unbounded in every dimension.
    pub fn unbounded(arity: usize) -> Self {
        Self {
            coords: vec![None; arity],
        }
    }

    /// The number of dimensions of this corner.
    pub fn arity(&self) -> usize {
        self.coords.len()
    }

    /// The coordinate in a dimension, or `None` when unbounded there.
    pub fn coord(&self, dim: usize) -> Option<T> {
        self.coords[dim]
    }

    pub fn coords(&self) -> &[Option<T>] {
        &self.coords
    }

    /// Whether every dimension has a finite coordinate.
    pub fn is_bounded(&self) -> bool {
        self.coords.iter().all(|c| c.is_some())
    }

    /// The bounded form of this corner, if every dimension is finite.
    pub fn to_bounded(&self) -> Option<DVector<T>> {
        self.coords
            .iter()
            .map(|c| *c)
            .collect::<Option<Vec<_>>>()
            .map(DVector::from_vec)
    }

    /// Cast the corner to another floating point type
    pub fn cast<F: FloatingPoint + SupersetOf<T>>(&self) -> Corner<F> {
        Corner {
            coords: self
                .coords
                .iter()
                .map(|c| c.map(|v| F::from_subset(&v)))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::dvector;

    #[test]
    fn bounded_round_trip() {
        let p = dvector![1.0_f64, -2.0, 3.5];
        let c = Corner::bounded(&p);
        assert!(c.is_bounded());
        assert_eq!(c.to_bounded(), Some(p));
    }

    #[test]
    fn unbounded_has_no_bounded_form() {
        let c = Corner::<f64>::new(vec![Some(1.), None]);
        assert_eq!(c.to_bounded(), None);
        assert!(Corner::<f64>::unbounded(4).coords().iter().all(Option::is_none));
    }
}
