/// Structural limits shared by every node of a box tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TreeConfig {
    /// Maximum number of items a leaf holds before it splits into a branch,
    /// unless the leaf sits at the depth limit.
    pub node_capacity: usize,
    /// Hard cap on tree depth. Leaves at this depth accept items beyond
    /// `node_capacity`, which bounds recursion even when many stored boxes
    /// collide on the same coordinates.
    pub depth_limit: usize,
}

impl TreeConfig {
    pub const DEFAULT_NODE_CAPACITY: usize = 256;
    pub const DEFAULT_DEPTH_LIMIT: usize = 32;

    pub fn new(node_capacity: usize, depth_limit: usize) -> Self {
        Self {
            node_capacity,
            depth_limit,
        }
    }

    /// Read the process-wide defaults from `ORTHANT_NODE_CAPACITY` and
    /// `ORTHANT_DEPTH_LIMIT`, falling back per variable when it is unset or
    /// unparsable. Call once at startup and pass the result to tree
    /// constructors; the library itself keeps no global state.
    pub fn from_env() -> Self {
        let node_capacity = std::env::var("ORTHANT_NODE_CAPACITY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(Self::DEFAULT_NODE_CAPACITY);
        let depth_limit = std::env::var("ORTHANT_DEPTH_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(Self::DEFAULT_DEPTH_LIMIT);
        Self::new(node_capacity, depth_limit)
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_NODE_CAPACITY, Self::DEFAULT_DEPTH_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = TreeConfig::default();
        assert_eq!(config.node_capacity, 256);
        assert_eq!(config.depth_limit, 32);
    }

    #[test]
    fn from_env_falls_back_per_variable() {
        std::env::set_var("ORTHANT_NODE_CAPACITY", "64");
        std::env::set_var("ORTHANT_DEPTH_LIMIT", "not a number");
        let config = TreeConfig::from_env();
        assert_eq!(config.node_capacity, 64);
        assert_eq!(config.depth_limit, TreeConfig::DEFAULT_DEPTH_LIMIT);
        std::env::remove_var("ORTHANT_NODE_CAPACITY");
        std::env::remove_var("ORTHANT_DEPTH_LIMIT");
    }
}
