use std::sync::Arc;

use crate::boundary::Boundary;
use crate::config::TreeConfig;
use crate::geometry::AxisBox;
use crate::misc::FloatingPoint;
use crate::payload::BoxedPayload;

#[derive(Debug)]
enum Node<T: FloatingPoint, A> {
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
        children: Vec<Arc<Node<T, A>>>,
    },
}

impl<T: FloatingPoint, A> Node<T, A> {
    fn leaf(boundary: Boundary<T>, depth: usize, config: TreeConfig) -> Self {
        Node::Leaf {
            boundary,
            depth,
            config,
            items: Vec::new(),
        }
    }

    fn boundary(&self) -> &Boundary<T> {
        match self {
            Node::Leaf { boundary, .. } | Node::Branch { boundary, .. } => boundary,
        }
    }

    fn len(&self) -> usize {
        match self {
            Node::Leaf { items, .. } => items.len(),
            Node::Branch { children, .. } => children.iter().map(|c| c.len()).sum(),
        }
    }

    fn leaf_stats(&self, out: &mut Vec<(usize, usize)>) {
        match self {
            Node::Leaf { depth, items, .. } => out.push((*depth, items.len())),
            Node::Branch { children, .. } => {
                for child in children {
                    child.leaf_stats(out);
                }
            }
        }
    }
}

impl<T: FloatingPoint, A: Clone + PartialEq> Node<T, A> {
    /// Insert one item below this node, assuming the node's boundary
    /// already admits it. Growth is handled at the root by [`BoxTree`].
    fn add(&self, item: BoxedPayload<T, A>) -> anyhow::Result<Arc<Self>> {
        match self {
            Node::Leaf {
                boundary,
                depth,
                config,
                items,
            } => {
                if items.len() < config.node_capacity || *depth == config.depth_limit {
                    let mut next = Vec::with_capacity(items.len() + 1);
                    next.push(item);
                    next.extend_from_slice(items);
                    Ok(Arc::new(Node::Leaf {
                        boundary: boundary.clone(),
                        depth: *depth,
                        config: *config,
                        items: next,
                    }))
                } else {
                    #[cfg(feature = "log")]
                    log::trace!("leaf at depth {} is full, splitting", depth);
                    let children = boundary
                        .binary_split()?
                        .into_iter()
                        .map(|child| Arc::new(Self::leaf(child, depth + 1, *config)))
                        .collect();
                    let mut node = Arc::new(Node::Branch {
                        boundary: boundary.clone(),
                        depth: *depth,
                        config: *config,
                        children,
                    });
                    for existing in items.iter().cloned().chain(std::iter::once(item)) {
                        node = node.add(existing)?;
                    }
                    Ok(node)
                }
            }
            Node::Branch {
                boundary,
                depth,
                config,
                children,
            } => {
                let mut hits = Vec::new();
                for (i, child) in children.iter().enumerate() {
                    if item.bounds().intersects(child.boundary().bounds())? {
                        hits.push(i);
                    }
                }

                let mut next = children.clone();
                if hits.len() > 1 {
                    // The item straddles several children: cut it into one
                    // fragment per child, all pointing back at the original
                    // pre-fragmentation box.
                    let parent = item
                        .parent_bounds()
                        .cloned()
                        .unwrap_or_else(|| item.bounds().clone());
                    for i in hits {
                        if let Some(clipped) =
                            item.bounds().intersection(next[i].boundary().bounds())?
                        {
                            let fragment = BoxedPayload::fragment(
                                clipped,
                                item.payload().clone(),
                                parent.clone(),
                            );
                            next[i] = next[i].add(fragment)?;
                        }
                    }
                } else if let Some(&i) = hits.first() {
                    next[i] = next[i].add(item)?;
                }

                Ok(Arc::new(Node::Branch {
                    boundary: boundary.clone(),
                    depth: *depth,
                    config: *config,
                    children: next,
                }))
            }
        }
    }

    fn remove(&self, bounds: &AxisBox<T>, payload: &A) -> anyhow::Result<Arc<Self>> {
        match self {
            Node::Leaf {
                boundary,
                depth,
                config,
                items,
            } => {
                let remaining = items
                    .iter()
                    .filter(|item| !item.matches(bounds, payload))
                    .cloned()
                    .collect();
                Ok(Arc::new(Node::Leaf {
                    boundary: boundary.clone(),
                    depth: *depth,
                    config: *config,
                    items: remaining,
                }))
            }
            Node::Branch {
                boundary,
                depth,
                config,
                children,
            } => {
                let mut next = children.clone();
                for i in 0..next.len() {
                    if let Some(clipped) = bounds.intersection(next[i].boundary().bounds())? {
                        next[i] = next[i].remove(&clipped, payload)?;
                    }
                }
                Ok(Arc::new(Node::Branch {
                    boundary: boundary.clone(),
                    depth: *depth,
                    config: *config,
                    children: next,
                }))
            }
        }
    }

    fn query_into(
        &self,
        range: &AxisBox<T>,
        out: &mut Vec<BoxedPayload<T, A>>,
    ) -> anyhow::Result<()> {
        match self {
            Node::Leaf { items, .. } => {
                for item in items {
                    if item.bounds().intersects(range)? {
                        out.push(item.clone());
                    }
                }
            }
            Node::Branch {
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
            Node::Leaf { items, .. } => out.extend_from_slice(items),
            Node::Branch { children, .. } => {
                for child in children {
                    child.collect_into(out);
                }
            }
        }
    }

    fn cleared(&self) -> Arc<Self> {
        match self {
            Node::Leaf {
                boundary,
                depth,
                config,
                ..
            } => Arc::new(Self::leaf(boundary.clone(), *depth, *config)),
            Node::Branch {
                boundary,
                depth,
                config,
                children,
            } => Arc::new(Node::Branch {
                boundary: boundary.clone(),
                depth: *depth,
                config: *config,
                children: children.iter().map(|c| c.cleared()).collect(),
            }),
        }
    }
}

/// A persistent box search tree: an n-dimensional spatial index over
/// [`BoxedPayload`]s, specialized by its boundary's arity into a
/// B-tree/quadtree/octree-like structure.
///
/// Every mutation returns a new tree and leaves the receiver untouched;
/// untouched subtrees are shared between versions, so handles are cheap to
/// keep and every version stays queryable indefinitely. Since nodes are
/// never mutated after construction, handles can be read from multiple
/// threads without locking.
///
/// Queries return stored fragments as-is and may include items that merely
/// touch the query bounds; pass results through
/// [`BoxedPayload::deduplicate`] for exactly-once, healed items.
///
/// # Examples
/// ```
/// use orthant::prelude::*;
///
/// let boundary = Boundary::from_capacity(Capacity::from_bounds(&[(-8., 8.)]));
/// let tree = BoxTree::new(boundary);
///
/// let item = BoxedPayload::new(AxisBox::from_intervals(&[(Some(3.), Some(5.))]), "one");
/// let tree = tree.insert(item.clone()).unwrap();
///
/// let hits = tree.query(&AxisBox::from_intervals(&[(Some(4.), Some(6.))])).unwrap();
/// assert_eq!(BoxedPayload::deduplicate(hits), vec![item]);
/// ```
#[derive(Clone, Debug)]
pub struct BoxTree<T: FloatingPoint, A> {
    root: Arc<Node<T, A>>,
}

impl<T: FloatingPoint, A: Clone + PartialEq> BoxTree<T, A> {
    /// Create an empty tree over a boundary with the default configuration.
    pub fn new(boundary: Boundary<T>) -> Self {
        Self::with_config(boundary, TreeConfig::default())
    }

    /// Create an empty tree over a boundary with an explicit configuration.
    pub fn with_config(boundary: Boundary<T>, config: TreeConfig) -> Self {
        Self {
            root: Arc::new(Node::leaf(boundary, 0, config)),
        }
    }

    /// Bulk-load a tree by inserting every item in order.
    pub fn from_items(
        boundary: Boundary<T>,
        items: Vec<BoxedPayload<T, A>>,
        config: TreeConfig,
    ) -> anyhow::Result<Self> {
        Self::with_config(boundary, config).insert_all(items)
    }

    /// The root boundary. Grows monotonically as out-of-bounds items are
    /// inserted; it never shrinks.
    pub fn boundary(&self) -> &Boundary<T> {
        self.root.boundary()
    }

    pub fn config(&self) -> TreeConfig {
        match &*self.root {
            Node::Leaf { config, .. } | Node::Branch { config, .. } => *config,
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

    /// Insert an item, returning the tree that contains it.
    ///
    /// When the item's box is not contained in the root boundary, the
    /// boundary grows to admit it and the whole tree is rebuilt from its
    /// deduplicated contents before the item is added.
    pub fn insert(&self, item: BoxedPayload<T, A>) -> anyhow::Result<Self> {
        if self.boundary().bounds().contains(item.bounds())? {
            return Ok(Self {
                root: self.root.add(item)?,
            });
        }

        #[cfg(feature = "log")]
        log::debug!("root boundary does not admit the inserted box, growing");
        let grown = self.boundary().grown_for(item.bounds())?;
        let survivors = BoxedPayload::deduplicate(self.items());
        Self::with_config(grown, self.config())
            .insert_all(survivors)?
            .insert(item)
    }

    /// Insert every item in order, returning the final tree.
    pub fn insert_all(
        &self,
        items: impl IntoIterator<Item = BoxedPayload<T, A>>,
    ) -> anyhow::Result<Self> {
        let mut tree = self.clone();
        for item in items {
            tree = tree.insert(item)?;
        }
        Ok(tree)
    }

    /// Remove every stored entry matching the item's `(box, payload)` pair,
    /// fragment parents ignored. Removing an absent item is a no-op. The
    /// tree keeps its shape: branches never collapse back into leaves.
    pub fn remove(&self, item: &BoxedPayload<T, A>) -> anyhow::Result<Self> {
        anyhow::ensure!(
            item.bounds().arity() == self.boundary().arity(),
            "Arity mismatch: {} != {}",
            item.bounds().arity(),
            self.boundary().arity()
        );
        Ok(Self {
            root: self.root.remove(item.bounds(), item.payload())?,
        })
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

    /// The tree with every leaf emptied but the branch structure kept.
    pub fn cleared(&self) -> Self {
        Self {
            root: self.root.cleared(),
        }
    }

    /// An aliasing copy. Versions share structure and are safe to use
    /// independently.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    pub(crate) fn leaf_stats(&self) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        self.root.leaf_stats(&mut out);
        out
    }
}
