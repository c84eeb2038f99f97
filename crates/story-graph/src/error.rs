//! Error types for graph construction
//!
//! Builder errors are programming errors in the conversion logic, never a
//! consequence of bad input data. Callers surface them as fatal.

use crate::ids::NodeId;

/// Graph builder invariant violations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuilderError {
    /// Parent passed to `attach`/`place` does not exist
    #[error("parent node not found: {0}")]
    ParentNotFound(NodeId),

    /// Parent exists but is a leaf type without a children list
    #[error("node {0} cannot hold children")]
    NotAContainer(NodeId),

    /// Node passed to `place` or `compose_group` does not exist
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// `build` called before a root story node was created
    #[error("graph has no root story node")]
    MissingRoot,

    /// A second root story node was requested
    #[error("root story node already exists: {0}")]
    RootAlreadySet(NodeId),

    /// A terminal marker was requested while another is active
    #[error("terminal node already designated: {0}")]
    TerminalAlreadySet(NodeId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_error_display() {
        let err = BuilderError::ParentNotFound(NodeId::new("n-missing"));
        assert_eq!(err.to_string(), "parent node not found: n-missing");
        assert!(BuilderError::MissingRoot.to_string().contains("no root"));
        assert_eq!(
            BuilderError::NodeNotFound(NodeId::new("n-9")).to_string(),
            "node not found: n-9"
        );
        assert_eq!(
            BuilderError::TerminalAlreadySet(NodeId::new("n-2")).to_string(),
            "terminal node already designated: n-2"
        );
    }
}
