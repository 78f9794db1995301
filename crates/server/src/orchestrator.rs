//! # Recommendation Orchestrator
//!
//! Coordinates one recommendation request:
//! 1. Build the guest's consumption history from the catalog
//! 2. Score the history against the cached medoids
//! 3. Fall back to a uniform ranking when the guest cannot be scored
//! 4. Select today's new items and the already-tried ones
//!
//! Medoids depend only on the catalog, so they are resolved once at
//! construction and shared by every request. The engine is synchronous;
//! `recommend_many` runs independent requests on the blocking pool.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use catalog::{CandidateItem, CatalogIndex, GuestHistory, GuestId, build_guest_history};
use engine::{
    AffinityScorer, AffinityVector, EngineConfig, EngineError, MedoidResolver, MedoidSet,
    RecommendationResult, RecommendationSelector,
};

/// How the clusters were ranked for a request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum RankingPolicy {
    /// Ranked by the guest's affinity scores
    Affinity,
    /// Ranked in ascending cluster order because scoring was not possible
    Uniform { reason: String },
}

impl RankingPolicy {
    pub fn is_fallback(&self) -> bool {
        matches!(self, RankingPolicy::Uniform { .. })
    }
}

/// Final recommendation returned for one guest
#[derive(Debug, Clone, Serialize)]
pub struct GuestRecommendation {
    pub guest_id: GuestId,
    pub guest_name: String,
    /// Number of transactions the ranking was based on
    pub history_len: usize,
    pub ranking: RankingPolicy,
    pub affinity: AffinityVector,
    pub result: RecommendationResult,
}

/// Main orchestrator that coordinates the recommendation flow
#[derive(Clone)]
pub struct RecommendationOrchestrator {
    catalog: Arc<CatalogIndex>,
    medoids: Arc<MedoidSet>,
    config: EngineConfig,
    scorer: AffinityScorer,
    selector: RecommendationSelector,
}

impl RecommendationOrchestrator {
    /// Create an orchestrator over a loaded catalog
    ///
    /// Validates `config` and resolves the medoid of every cluster. Fails if
    /// the config is out of range or the catalog has an empty cluster.
    pub fn new(catalog: Arc<CatalogIndex>, config: EngineConfig) -> Result<Self> {
        config.validate().context("Invalid engine configuration")?;

        let start_time = Instant::now();
        let medoids = MedoidResolver::new()
            .resolve(catalog.items(), catalog.num_clusters())
            .context("Failed to resolve cluster medoids")?;
        info!(
            "Resolved {} medoids over {} items in {:.2?}",
            medoids.len(),
            catalog.items().len(),
            start_time.elapsed()
        );

        Ok(Self {
            catalog,
            medoids: Arc::new(medoids),
            config,
            scorer: AffinityScorer::from_config(&config),
            selector: RecommendationSelector::from_config(&config),
        })
    }

    pub fn catalog(&self) -> &CatalogIndex {
        &self.catalog
    }

    pub fn medoids(&self) -> &MedoidSet {
        &self.medoids
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Main entry point: recommendations for a guest from today's menu
    pub fn get_recommendations(&self, guest_id: GuestId) -> Result<GuestRecommendation> {
        self.get_recommendations_for_menu(guest_id, self.catalog.daily_menu())
    }

    /// Recommendations for a guest from an explicit candidate list
    #[instrument(skip(self, menu), fields(menu_len = menu.len()))]
    pub fn get_recommendations_for_menu(
        &self,
        guest_id: GuestId,
        menu: &[CandidateItem],
    ) -> Result<GuestRecommendation> {
        let start_time = Instant::now();

        let history = self.build_history(guest_id)?;
        let (ranking, affinity) = self.rank_clusters(&history)?;
        let result = self.selector.select(&affinity, menu, &history.seen);

        debug!(
            "Guest {}: {} new, {} already tried in {:.2?}",
            guest_id,
            result.new_items.len(),
            result.seen_items.len(),
            start_time.elapsed()
        );

        Ok(GuestRecommendation {
            guest_id,
            guest_name: history.guest.name,
            history_len: history.serial_ids.len(),
            ranking,
            affinity,
            result,
        })
    }

    /// Run one request per guest concurrently on the blocking pool
    ///
    /// Results come back in the order of `guest_ids`. The first failed
    /// request fails the whole batch.
    pub async fn recommend_many(&self, guest_ids: &[GuestId]) -> Result<Vec<GuestRecommendation>> {
        let handles: Vec<_> = guest_ids
            .iter()
            .map(|&guest_id| {
                let orchestrator = self.clone();
                tokio::task::spawn_blocking(move || orchestrator.get_recommendations(guest_id))
            })
            .collect();

        let mut recommendations = Vec::with_capacity(handles.len());
        for handle in handles {
            let recommendation = handle.await.context("Recommendation task panicked")??;
            recommendations.push(recommendation);
        }
        Ok(recommendations)
    }

    fn build_history(&self, guest_id: GuestId) -> Result<GuestHistory> {
        build_guest_history(&self.catalog, guest_id)
            .with_context(|| format!("Failed to build history for guest {}", guest_id))
    }

    /// Score the history, or rank uniformly when there is nothing to score
    fn rank_clusters(&self, history: &GuestHistory) -> Result<(RankingPolicy, AffinityVector)> {
        match self.scorer.score(&history.features, &self.medoids) {
            Ok(affinity) => Ok((RankingPolicy::Affinity, affinity)),
            Err(err @ (EngineError::EmptyHistory | EngineError::DegenerateScore)) => {
                warn!(
                    "Guest {} cannot be scored ({}), ranking clusters uniformly",
                    history.guest.id, err
                );
                Ok((
                    RankingPolicy::Uniform {
                        reason: err.to_string(),
                    },
                    AffinityVector::uniform(self.medoids.len()),
                ))
            }
            Err(err) => Err(err).context("Failed to score guest history"),
        }
    }
}
