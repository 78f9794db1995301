//! Server crate for the daily-menu recommender.
//!
//! This crate contains the orchestrator that ties the catalog and the
//! engine together: one cached medoid set, one request per guest.

pub mod orchestrator;

pub use orchestrator::{GuestRecommendation, RankingPolicy, RecommendationOrchestrator};
