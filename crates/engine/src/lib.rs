//! # Engine Crate
//!
//! Affinity scoring and recommendation selection over a clustered catalog
//! of binary feature vectors.
//!
//! ## Components
//!
//! ### Distance
//! Normalized Hamming distance, the one similarity primitive every other
//! component uses.
//!
//! ### MedoidResolver
//! One representative item per cluster: the member with the smallest mean
//! distance to the rest of its cluster. Runs once per catalog.
//!
//! ### AffinityScorer
//! Recency-weighted similarity between a guest's history and each medoid,
//! normalized to sum to 1. Runs once per guest per request.
//!
//! ### RecommendationSelector
//! Ranks clusters by affinity and picks today's new items, plus the menu
//! items the guest already tried. Runs once per guest per day.
//!
//! ## Example Usage
//!
//! ```ignore
//! use engine::{AffinityScorer, EngineConfig, MedoidResolver, RecommendationSelector};
//!
//! let config = EngineConfig::default();
//! let medoids = MedoidResolver.resolve(index.items(), index.num_clusters())?;
//!
//! let affinity = AffinityScorer::from_config(&config).score(&history.features, &medoids)?;
//! let result = RecommendationSelector::from_config(&config)
//!     .select(&affinity, index.daily_menu(), &history.seen);
//! ```
//!
//! Everything here is synchronous and free of shared mutable state. A
//! `MedoidSet` is immutable once built and can be shared across threads.

pub mod config;
pub mod distance;
pub mod error;
pub mod medoids;
pub mod scorer;
pub mod selector;

// Re-export commonly used types
pub use config::EngineConfig;
pub use distance::distance;
pub use error::{EngineError, Result};
pub use medoids::{DistanceMatrix, Medoid, MedoidResolver, MedoidSet};
pub use scorer::{AffinityScorer, AffinityVector, RecencyWeights};
pub use selector::{RecommendationResult, RecommendationSelector};
