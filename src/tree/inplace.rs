use crate::boundary::Boundary;
use crate::config::TreeConfig;
use crate::geometry::AxisBox;
use crate::misc::FloatingPoint;
use crate::payload::BoxedPayload;

#[derive(Clone, Debug)]
enum MutNode<T: FloatingPoint, A> {
    Leaf {
        boundary: Boundary<T>,
        depth: usize,
        config: TreeConfig,
        items: Vec<BoxedPayload<T, A>>,
    },
    Branch {
        boundary: Boundary<T>,
        depth: usize,
        config: TreeConfig,
        children: Vec<MutNode<T, A>>,
    },
}

impl<T: FloatingPoint, A> MutNode<T, A> {
    fn leaf(boundary: Boundary<T>, depth: usize, config: TreeConfig) -> Self {
        MutNode::Leaf {
            boundary,
            depth,
            config,
            items: Vec::new(),
        }
    }

    fn boundary(&self) -> &Boundary<T> {
        match self {
            MutNode::Leaf { boundary, .. } | MutNode::Branch { boundary, .. } => boundary,
        }
    }

    fn len(&self) -> usize {
        match self {
            MutNode::Leaf { items, .. } => items.len(),
            MutNode::Branch { children, .. } => children.iter().map(|c| c.len()).sum(),
        }
    }

    fn clear(&mut self) {
        match self {
            MutNode::Leaf { items, .. } => items.clear(),
            MutNode::Branch { children, .. } => {
                for child in children {
                    child.clear();
                }
            }
        }
    }

    fn leaf_stats(&self, out: &mut Vec<(usize, usize)>) {
        match self {
            MutNode::Leaf { depth, items, .. } => out.push((*depth, items.len())),
            MutNode::Branch { children, .. } => {
                for child in children {
                    child.leaf_stats(out);
                }
            }
        }
    }
}

impl<T: FloatingPoint, A: Clone + PartialEq> MutNode<T, A> {
    /// Replace this leaf with a branch over its split boundary and push the
    /// leaf's items back down through it. The node slot is rewritten
    /// wholesale; only the caller may hold a reference to it.
    fn promote(&mut self) -> anyhow::Result<()> {
        let MutNode::Leaf {
            boundary,
            depth,
            config,
            items,
        } = self
        else {
            return Ok(());
        };

        let boundary = boundary.clone();
        let depth = *depth;
        let config = *config;
        let children = boundary
            .binary_split()?
            .into_iter()
            .map(|child| MutNode::leaf(child, depth + 1, config))
            .collect();
        let drained = std::mem::take(items);

        #[cfg(feature = "log")]
        log::trace!("leaf at depth {} is full, splitting", depth);
        *self = MutNode::Branch {
            boundary,
            depth,
            config,
            children,
        };
        for item in drained {
            self.add(item)?;
        }
        Ok(())
    }

    /// Insert one item below this node, assuming the node's boundary
    /// already admits it. Growth is handled at the root by [`BoxTreeMut`].
    fn add(&mut self, item: BoxedPayload<T, A>) -> anyhow::Result<()> {
        if let MutNode::Leaf {
            depth,
            config,
            items,
            ..
        } = self
        {
            if items.len() < config.node_capacity || *depth == config.depth_limit {
                items.insert(0, item);
                return Ok(());
            }
            self.promote()?;
            return self.add(item);
        }

        let MutNode::Branch { children, .. } = self else {
            unreachable!("add matched a leaf above");
        };

        let mut hits = Vec::new();
        for (i, child) in children.iter().enumerate() {
            if item.bounds().intersects(child.boundary().bounds())? {
                hits.push(i);
            }
        }

        if hits.len() > 1 {
            // The item straddles several children: cut it into one fragment
            // per child, all pointing back at the original box.
            let parent = item
                .parent_bounds()
                .cloned()
                .unwrap_or_else(|| item.bounds().clone());
            for i in hits {
                if let Some(clipped) = item.bounds().intersection(children[i].boundary().bounds())? {
                    children[i].add(BoxedPayload::fragment(
                        clipped,
                        item.payload().clone(),
                        parent.clone(),
                    ))?;
                }
            }
            Ok(())
        } else if let Some(&i) = hits.first() {
            children[i].add(item)
        } else {
            Ok(())
        }
    }

    fn remove(&mut self, bounds: &AxisBox<T>, payload: &A) -> anyhow::Result<()> {
        match self {
            MutNode::Leaf { items, .. } => {
                items.retain(|item| !item.matches(bounds, payload));
                Ok(())
            }
            MutNode::Branch { children, .. } => {
                for child in children {
                    if let Some(clipped) = bounds.intersection(child.boundary().bounds())? {
                        child.remove(&clipped, payload)?;
                    }
                }
                Ok(())
            }
        }
    }

    fn query_into(
        &self,
        range: &AxisBox<T>,
        out: &mut Vec<BoxedPayload<T, A>>,
    ) -> anyhow::Result<()> {
        match self {
            MutNode::Leaf { items, .. } => {
                for item in items {
                    if item.bounds().intersects(range)? {
                        out.push(item.clone());
                    }
                }
            }
            MutNode::Branch {
                boundary, children, ..
            } => {
                if !boundary.bounds().intersects(range)? {
                    return Ok(());
                }
                for child in children {
                    if let Some(clipped) = range.intersection(child.boundary().bounds())? {
                        child.query_into(&clipped, out)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn collect_into(&self, out: &mut Vec<BoxedPayload<T, A>>) {
        match self {
            MutNode::Leaf { items, .. } => out.extend_from_slice(items),
            MutNode::Branch { children, .. } => {
                for child in children {
                    child.collect_into(out);
                }
            }
        }
    }
}

/// The in-place counterpart of [`BoxTree`](crate::prelude::BoxTree):
/// mutations modify the receiver directly instead of returning a new
/// version.
///
/// Each node is exclusively owned by its parent, and a full leaf is
/// promoted to a branch by rewriting its slot wholesale. Nothing is shared,
/// so mutation requires the usual exclusive `&mut` access; concurrent
/// readers need an external read-write lock. [`BoxTreeMut::copy`] is a deep
/// structural clone that can be mutated independently.
///
/// # Examples
/// ```
/// use orthant::prelude::*;
///
/// let boundary = Boundary::from_capacity(Capacity::from_bounds(&[(-8., 8.), (-8., 8.)]));
/// let mut tree = BoxTreeMut::new(boundary);
///
/// let b = AxisBox::from_intervals(&[(Some(1.), Some(2.)), (Some(1.), Some(2.))]);
/// tree.insert(BoxedPayload::new(b.clone(), 7)).unwrap();
/// assert_eq!(tree.len(), 1);
///
/// tree.remove(&BoxedPayload::new(b, 7)).unwrap();
/// assert!(tree.is_empty());
/// ```
#[derive(Clone, Debug)]
pub struct BoxTreeMut<T: FloatingPoint, A> {
    root: MutNode<T, A>,
}

impl<T: FloatingPoint, A: Clone + PartialEq> BoxTreeMut<T, A> {
    /// Create an empty tree over a boundary with the default configuration.
    pub fn new(boundary: Boundary<T>) -> Self {
        Self::with_config(boundary, TreeConfig::default())
    }

    /// Create an empty tree over a boundary with an explicit configuration.
    pub fn with_config(boundary: Boundary<T>, config: TreeConfig) -> Self {
        Self {
            root: MutNode::leaf(boundary, 0, config),
        }
    }

    /// Bulk-load a tree by inserting every item in order.
    pub fn from_items(
        boundary: Boundary<T>,
        items: Vec<BoxedPayload<T, A>>,
        config: TreeConfig,
    ) -> anyhow::Result<Self> {
        let mut tree = Self::with_config(boundary, config);
        tree.insert_all(items)?;
        Ok(tree)
    }

    /// The root boundary. Grows monotonically as out-of-bounds items are
    /// inserted; it never shrinks.
    pub fn boundary(&self) -> &Boundary<T> {
        self.root.boundary()
    }

    pub fn config(&self) -> TreeConfig {
        match &self.root {
            MutNode::Leaf { config, .. } | MutNode::Branch { config, .. } => *config,
        }
    }

    /// The number of stored entries, counting every fragment separately.
    pub fn len(&self) -> usize {
        self.root.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every stored entry, fragments included, in storage order.
    pub fn items(&self) -> Vec<BoxedPayload<T, A>> {
        let mut out = Vec::new();
        self.root.collect_into(&mut out);
        out
    }

    /// Insert an item.
    ///
    /// When the item's box is not contained in the root boundary, the
    /// boundary grows to admit it and the whole tree is rebuilt from its
    /// deduplicated contents before the item is added.
    pub fn insert(&mut self, item: BoxedPayload<T, A>) -> anyhow::Result<()> {
        if self.boundary().bounds().contains(item.bounds())? {
            return self.root.add(item);
        }

        #[cfg(feature = "log")]
        log::debug!("root boundary does not admit the inserted box, growing");
        let grown = self.boundary().grown_for(item.bounds())?;
        let survivors = BoxedPayload::deduplicate(self.items());
        self.root = MutNode::leaf(grown, 0, self.config());
        self.insert_all(survivors)?;
        self.insert(item)
    }

    /// Insert every item in order.
    pub fn insert_all(
        &mut self,
        items: impl IntoIterator<Item = BoxedPayload<T, A>>,
    ) -> anyhow::Result<()> {
        for item in items {
            self.insert(item)?;
        }
        Ok(())
    }

    /// Remove every stored entry matching the item's `(box, payload)` pair,
    /// fragment parents ignored. Removing an absent item is a no-op. The
    /// tree keeps its shape: branches never collapse back into leaves.
    pub fn remove(&mut self, item: &BoxedPayload<T, A>) -> anyhow::Result<()> {
        anyhow::ensure!(
            item.bounds().arity() == self.boundary().arity(),
            "Arity mismatch: {} != {}",
            item.bounds().arity(),
            self.boundary().arity()
        );
        self.root.remove(item.bounds(), item.payload())
    }

    /// All stored entries whose box intersects the range.
    ///
    /// The result may hold several fragments of one logical item as well as
    /// items only touching the range bound; see [`BoxedPayload::deduplicate`].
    pub fn query(&self, range: &AxisBox<T>) -> anyhow::Result<Vec<BoxedPayload<T, A>>> {
        anyhow::ensure!(
            range.arity() == self.boundary().arity(),
            "Arity mismatch: {} != {}",
            range.arity(),
            self.boundary().arity()
        );
        let mut out = Vec::new();
        self.root.query_into(range, &mut out)?;
        Ok(out)
    }

    /// Empty every leaf while keeping the branch structure.
    pub fn clear(&mut self) {
        self.root.clear();
    }

    /// A deep structural clone, independently mutable.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    pub(crate) fn leaf_stats(&self) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        self.root.leaf_stats(&mut out);
        out
    }
}
