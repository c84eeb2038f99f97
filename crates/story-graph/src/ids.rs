//! Identifier allocation for the two graph namespaces
//!
//! Node ids carry the `n-` prefix and resource ids the `r-` prefix, so a
//! free-form id string found inside `data` can be routed to the right
//! namespace by inspection alone.

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Prefix of every node identifier
pub const NODE_PREFIX: &str = "n-";

/// Prefix of every resource identifier
pub const RESOURCE_PREFIX: &str = "r-";

/// Identifier of a node in the story graph
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Wrap an existing id string without checking its prefix
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id lives in the node namespace
    #[inline]
    #[must_use]
    pub fn has_node_prefix(&self) -> bool {
        self.0.starts_with(NODE_PREFIX)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Identifier of a resource in the story graph
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    /// Wrap an existing id string without checking its prefix
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id lives in the resource namespace
    #[inline]
    #[must_use]
    pub fn has_resource_prefix(&self) -> bool {
        self.0.starts_with(RESOURCE_PREFIX)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// How fresh identifiers are generated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdStrategy {
    /// `n-1`, `n-2`, ... reproducible across runs on the same input
    #[default]
    Sequential,
    /// `n-<ulid>`, unique across graphs as well
    Ulid,
}

/// Allocates ids for one conversion run
///
/// Ids never repeat within the lifetime of one allocator. Nothing is
/// guaranteed across allocators when using [`IdStrategy::Sequential`].
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    strategy: IdStrategy,
    next_node: u64,
    next_resource: u64,
}

impl IdAllocator {
    /// Create an allocator with the given strategy
    #[inline]
    #[must_use]
    pub fn new(strategy: IdStrategy) -> Self {
        Self {
            strategy,
            next_node: 0,
            next_resource: 0,
        }
    }

    /// Strategy in use
    #[inline]
    #[must_use]
    pub fn strategy(&self) -> IdStrategy {
        self.strategy
    }

    /// Next id in the node namespace
    pub fn next_node_id(&mut self) -> NodeId {
        self.next_node += 1;
        NodeId(self.render(NODE_PREFIX, self.next_node))
    }

    /// Next id in the resource namespace
    pub fn next_resource_id(&mut self) -> ResourceId {
        self.next_resource += 1;
        ResourceId(self.render(RESOURCE_PREFIX, self.next_resource))
    }

    fn render(&self, prefix: &str, counter: u64) -> String {
        match self.strategy {
            IdStrategy::Sequential => format!("{prefix}{counter}"),
            // randomness keeps ids apart across graphs
            IdStrategy::Ulid => format!("{prefix}{}", Ulid::new().to_string().to_lowercase()),
        }
    }
}
