use crate::geometry::AxisBox;
use crate::misc::FloatingPoint;

/// A stored value together with the box it occupies.
///
/// When an inserted box straddles more than one child boundary it is cut
/// into fragments, one per intersecting child. Every fragment records the
/// original, pre-fragmentation box as its `parent`, however many levels of
/// splitting it passes through, so the original item can always be
/// reconstructed ("healed") from any one of its fragments.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoxedPayload<T: FloatingPoint, A> {
    bounds: AxisBox<T>,
    payload: A,
    parent: Option<AxisBox<T>>,
}

impl<T: FloatingPoint, A> BoxedPayload<T, A> {
    /// Create a new, unfragmented boxed payload.
    pub fn new(bounds: AxisBox<T>, payload: A) -> Self {
        Self {
            bounds,
            payload,
            parent: None,
        }
    }

    pub(crate) fn fragment(bounds: AxisBox<T>, payload: A, parent: AxisBox<T>) -> Self {
        Self {
            bounds,
            payload,
            parent: Some(parent),
        }
    }

    pub fn bounds(&self) -> &AxisBox<T> {
        &self.bounds
    }

    pub fn payload(&self) -> &A {
        &self.payload
    }

    /// The original box this fragment was cut from, if it is a fragment.
    pub fn parent_bounds(&self) -> Option<&AxisBox<T>> {
        self.parent.as_ref()
    }

    pub fn is_fragment(&self) -> bool {
        self.parent.is_some()
    }
}

impl<T: FloatingPoint, A: Clone + PartialEq> BoxedPayload<T, A> {
    /// Reconstruct the originally-inserted item. For a fragment this swaps
    /// the recorded parent box back in; for anything else it is a plain
    /// clone.
    pub fn healed(&self) -> Self {
        match &self.parent {
            Some(parent) => Self {
                bounds: parent.clone(),
                payload: self.payload.clone(),
                parent: None,
            },
            None => self.clone(),
        }
    }

    /// Whether this item stores the given box/payload pair, ignoring any
    /// fragment parent.
    pub fn matches(&self, bounds: &AxisBox<T>, payload: &A) -> bool {
        &self.bounds == bounds && &self.payload == payload
    }

    /// Collapse a query result into exactly-once, un-fragmented items.
    ///
    /// Unfragmented items pass through unchanged; fragments are healed and
    /// added only when an equal `(box, payload)` pair is not already
    /// present. Idempotent: deduplicating a deduplicated result is a no-op.
    ///
    /// # Examples
    /// ```
    /// use orthant::prelude::{AxisBox, BoxedPayload};
    ///
    /// let b = AxisBox::from_intervals(&[(Some(0.), Some(4.))]);
    /// let whole = BoxedPayload::new(b.clone(), "x");
    /// let deduped = BoxedPayload::deduplicate(vec![whole.clone(), whole.clone()]);
    /// // unfragmented duplicates are passed through untouched
    /// assert_eq!(deduped.len(), 2);
    /// assert_eq!(BoxedPayload::deduplicate(deduped.clone()), deduped);
    /// ```
    pub fn deduplicate(results: Vec<Self>) -> Vec<Self> {
        let (fragments, mut kept): (Vec<_>, Vec<_>) =
            results.into_iter().partition(|item| item.is_fragment());
        for fragment in fragments {
            let healed = fragment.healed();
            if !kept.contains(&healed) {
                kept.push(healed);
            }
        }
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interval(s: f64, e: f64) -> AxisBox<f64> {
        AxisBox::from_intervals(&[(Some(s), Some(e))])
    }

    #[test]
    fn healing_restores_the_parent_box() {
        let fragment = BoxedPayload::fragment(interval(0., 1.), "a", interval(0., 3.));
        let healed = fragment.healed();
        assert_eq!(healed.bounds(), &interval(0., 3.));
        assert!(!healed.is_fragment());
        assert_eq!(healed.healed(), healed);
    }

    #[test]
    fn fragments_of_one_item_collapse() {
        let parent = interval(-1., 3.);
        let results = vec![
            BoxedPayload::new(interval(3., 5.), "one"),
            BoxedPayload::fragment(interval(-1., 0.), "two", parent.clone()),
            BoxedPayload::fragment(interval(0., 3.), "two", parent.clone()),
        ];
        let deduped = BoxedPayload::deduplicate(results);
        assert_eq!(deduped.len(), 2);
        assert!(deduped.contains(&BoxedPayload::new(interval(3., 5.), "one")));
        assert!(deduped.contains(&BoxedPayload::new(parent, "two")));
    }

    #[test]
    fn deduplication_is_idempotent() {
        let parent = interval(0., 8.);
        let results = vec![
            BoxedPayload::fragment(interval(0., 4.), 1, parent.clone()),
            BoxedPayload::fragment(interval(4., 8.), 1, parent.clone()),
            BoxedPayload::new(interval(2., 3.), 2),
            BoxedPayload::new(interval(2., 3.), 2),
        ];
        let once = BoxedPayload::deduplicate(results);
        let twice = BoxedPayload::deduplicate(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn matching_ignores_the_fragment_parent() {
        let fragment = BoxedPayload::fragment(interval(0., 1.), "a", interval(0., 3.));
        assert!(fragment.matches(&interval(0., 1.), &"a"));
        assert!(!fragment.matches(&interval(0., 3.), &"a"));
    }
}
