use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use super::config::MatchingConfig;
use super::domain::{
    BookingRequest, CleanerProfile, ClientProfile, ClientRelations, MatchContext,
    MatchPreferences, MatchResult,
};
use super::engine::MatchingEngine;
use crate::config::PolicyError;
use crate::workflows::booking::UserRef;
use crate::workflows::collaborators::RepositoryError;
use crate::workflows::reliability::SnapshotStore;

/// Read side of the persistence collaborator for matching inputs.
pub trait MatchDataSource: Send + Sync {
    fn active_cleaners(&self) -> Result<Vec<CleanerProfile>, RepositoryError>;
    fn client_profile(&self, client: &UserRef) -> Result<Option<ClientProfile>, RepositoryError>;
    fn preferences(&self, client: &UserRef) -> Result<Option<MatchPreferences>, RepositoryError>;
    fn relations(&self, client: &UserRef) -> Result<ClientRelations, RepositoryError>;
}

/// Service loading the pool and client context, refreshing reliability fields from the latest
/// published snapshots, and ranking through the engine.
pub struct MatchingService<D, S> {
    engine: Arc<MatchingEngine>,
    source: Arc<D>,
    snapshots: Arc<S>,
}

impl<D, S> MatchingService<D, S>
where
    D: MatchDataSource + 'static,
    S: SnapshotStore + 'static,
{
    pub fn new(
        source: Arc<D>,
        snapshots: Arc<S>,
        config: MatchingConfig,
    ) -> Result<Self, PolicyError> {
        Ok(Self {
            engine: Arc::new(MatchingEngine::new(config)?),
            source,
            snapshots,
        })
    }

    pub fn engine(&self) -> &MatchingEngine {
        &self.engine
    }

    /// Rank the pool for `request`, returning at most `limit` (or the configured default)
    /// candidates. An empty pool yields an empty result, not an error.
    pub fn find_matches(
        &self,
        request: &BookingRequest,
        limit: Option<usize>,
    ) -> Result<MatchResult, MatchingError> {
        let pool = self.load_pool()?;
        let context = self.load_context(&request.client)?;
        let limit = limit.unwrap_or(self.engine.config().default_limit);

        let result = self.engine.rank(request, &pool, &context, limit);
        match &result.primary {
            Some(primary) => info!(
                client = %request.client,
                primary = %primary.profile.cleaner,
                fallbacks = result.fallbacks.len(),
                excluded = result.excluded.len(),
                "match ranked"
            ),
            None => info!(
                client = %request.client,
                excluded = result.excluded.len(),
                "no cleaners available"
            ),
        }
        Ok(result)
    }

    /// Cleaners from the ranked list that may be booked instantly.
    pub fn instant_book_candidates(
        &self,
        request: &BookingRequest,
        result: &MatchResult,
        now: DateTime<Utc>,
    ) -> Vec<UserRef> {
        result
            .scored
            .iter()
            .filter(|candidate| {
                self.engine
                    .instant_book_eligible(&candidate.profile, request, now)
            })
            .map(|candidate| candidate.profile.cleaner.clone())
            .collect()
    }

    fn load_pool(&self) -> Result<Vec<CleanerProfile>, MatchingError> {
        let mut pool = self
            .source
            .active_cleaners()
            .map_err(|source| MatchingError::Load {
                dataset: "cleaners",
                source,
            })?;
        for profile in &mut pool {
            let latest = self
                .snapshots
                .latest(&profile.cleaner)
                .map_err(|source| MatchingError::Load {
                    dataset: "reliability snapshots",
                    source,
                })?;
            if let Some(snapshot) = latest {
                profile.apply_snapshot(&snapshot);
            }
        }
        Ok(pool)
    }

    fn load_context(&self, client: &UserRef) -> Result<MatchContext, MatchingError> {
        let load = |dataset: &'static str| {
            move |source: RepositoryError| MatchingError::Load { dataset, source }
        };

        let profile = self
            .source
            .client_profile(client)
            .map_err(load("client profile"))?
            .unwrap_or_else(|| ClientProfile::new(client.clone()));
        let preferences = self
            .source
            .preferences(client)
            .map_err(load("match preferences"))?
            .unwrap_or_default();
        let relations = self.source.relations(client).map_err(load("client relations"))?;

        Ok(MatchContext {
            client: profile,
            preferences,
            relations,
        })
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum MatchingError {
    #[error("failed to load {dataset}")]
    Load {
        dataset: &'static str,
        #[source]
        source: RepositoryError,
    },
}
