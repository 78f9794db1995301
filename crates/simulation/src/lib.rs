//! # Simulation Crate
//!
//! Synthetic data for running the recommender without real sales records:
//!
//! - a keyword catalog where each cluster owns a block of keywords
//! - a guest directory
//! - a consumption log with one random item per guest per day
//! - a daily menu spread across clusters
//!
//! Every generator takes the random source as a parameter, so a seeded
//! `StdRng` reproduces a dataset exactly.

pub mod dataset;
pub mod guests;
pub mod keywords;
pub mod menu;
pub mod transactions;

pub use dataset::{SimulatedDataset, SimulationParams};
pub use guests::GuestDirectorySimulator;
pub use keywords::KeywordCatalogSimulator;
pub use menu::DailyMenuSimulator;
pub use transactions::TransactionSimulator;
