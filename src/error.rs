//! Error types for flowsheet editing, persistence and export.

use thiserror::Error;

use crate::types::{NodeId, PortDirection};

/// Main error type for the flowsheet editor.
#[derive(Debug, Error)]
pub enum FlowsheetError {
    /// No constructor is registered for the requested unit type
    #[error("Unknown unit type: {0}")]
    UnknownNodeType(String),

    /// A node id did not resolve to a node in the flowsheet
    #[error("Node {0} does not exist")]
    NodeNotFound(NodeId),

    /// A port reference points past the end of a node's port list
    #[error("Node {node} has no {direction:?} port #{index}")]
    PortNotFound {
        /// Node the reference points into
        node: NodeId,
        /// Side of the node
        direction: PortDirection,
        /// Index that was out of range
        index: usize,
    },

    /// Both ends of a connection are on the same node
    #[error("Cannot connect a unit to itself")]
    SelfConnection,

    /// Both ends of a connection are inlets, or both are outlets
    #[error("A connection must join an outlet to an inlet")]
    PortDirectionMismatch,

    /// One end of a connection already carries a stream
    #[error("Port '{0}' is already connected")]
    PortOccupied(String),

    /// Flowsheet or settings JSON could not be (de)serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading or writing a file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A background file task could not be started
    #[error("Background task failed: {0}")]
    Task(String),

    /// SVG or PNG rendering failed
    #[error("Export failed: {0}")]
    Export(String),
}

/// Result type alias using [`FlowsheetError`].
pub type Result<T> = std::result::Result<T, FlowsheetError>;
