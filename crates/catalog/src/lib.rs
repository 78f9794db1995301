//! # Catalog Crate
//!
//! This crate holds the data model shared by the recommender and the
//! plumbing to read and write a dataset directory.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (FeatureVector, CatalogItem, CandidateItem, CatalogIndex)
//! - **parser**: Parse the `::` separated .dat files into Rust structs
//! - **writer**: Write those files back out
//! - **index**: Build and validate the CatalogIndex
//! - **history**: Extract one guest's chronological consumption history
//! - **error**: Error types for catalog loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use catalog::{CatalogIndex, history::build_guest_history};
//! use std::path::Path;
//!
//! let index = CatalogIndex::load_from_files(Path::new("data/sim"))?;
//! let history = build_guest_history(&index, 103)?;
//!
//! println!("{} tried {} items", history.guest.name, history.len());
//! ```

// Public modules
pub mod error;
pub mod history;
pub mod index;
pub mod parser;
pub mod types;
pub mod writer;

// Re-export commonly used types for convenience
pub use error::{CatalogError, Result};
pub use history::{GuestHistory, build_guest_history};
pub use types::{
    // Type aliases
    ClusterLabel,
    GuestId,
    SerialId,
    // Core types
    CandidateItem,
    CatalogIndex,
    CatalogItem,
    FeatureVector,
    Guest,
    Transaction,
};
