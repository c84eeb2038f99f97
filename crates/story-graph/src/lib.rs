//! Story Graph
//!
//! The node/resource graph produced by classic story conversion:
//! - **Identifiers**: disjoint `n-`/`r-` namespaces ([`IdAllocator`])
//! - **Model**: [`Graph`], [`Node`], [`Resource`], [`Action`]
//! - **Builder**: [`GraphBuilder`], the only way conversion code mutates a graph
//! - **Validator**: [`StructuralValidator`], post-build invariant checks
//!
//! # Example
//!
//! ```rust
//! use story_graph::{node_type, GraphBuilder, IdStrategy, Node, StructuralValidator};
//!
//! let mut builder = GraphBuilder::new(IdStrategy::Sequential);
//! builder.create_root(Node::container(node_type::STORY)).unwrap();
//! builder
//!     .attach(
//!         Node::new(node_type::TEXT)
//!             .with_data("text", "Hello")
//!             .with_data("textAlignment", "start"),
//!         None,
//!     )
//!     .unwrap();
//!
//! let graph = builder.build().unwrap();
//! let report = StructuralValidator::new().validate(&graph);
//! assert!(report.is_clean());
//! ```

pub mod builder;
pub mod error;
pub mod ids;
pub mod media;
pub mod model;
pub mod validator;

// Re-exports
pub use builder::{GraphBuilder, Group};
pub use error::BuilderError;
pub use ids::{IdAllocator, IdStrategy, NodeId, ResourceId, NODE_PREFIX, RESOURCE_PREFIX};
pub use media::{normalize_url, MediaContext, MediaKind, MediaRequest, TransferOutcome};
pub use model::{
    node_type, resource_type, Action, ActionData, DataMap, Graph, Node, Resource,
    REPLACE_MEDIA_EVENT,
};
pub use validator::{Diagnostics, Issue, IssueCode, StructuralValidator, Subject, ValidationContext};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
