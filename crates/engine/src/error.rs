//! Error types for the recommendation engine.
//!
//! All engine operations are deterministic computations over in-memory
//! data, so nothing here is retried. Each operation either succeeds
//! completely or returns one of these errors.

use catalog::{ClusterLabel, SerialId};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Two feature vectors of different length were compared
    #[error("Feature vectors must be of equal length (got {left} and {right})")]
    LengthMismatch { left: usize, right: usize },

    /// A declared cluster has no catalog members
    #[error("Cluster {cluster} has no catalog members")]
    EmptyCluster { cluster: ClusterLabel },

    /// An item carries a label outside `[0, num_clusters)`
    #[error("Item {serial_id} has cluster label {cluster_label}, expected < {num_clusters}")]
    ClusterOutOfRange {
        serial_id: SerialId,
        cluster_label: ClusterLabel,
        num_clusters: usize,
    },

    /// Affinity was requested for a guest with no consumption history
    #[error("Consumption history is empty")]
    EmptyHistory,

    /// Weighted affinity sums to zero, so no ranking can be derived
    #[error("Affinity scores sum to zero after weighting")]
    DegenerateScore,

    /// Engine parameters out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
