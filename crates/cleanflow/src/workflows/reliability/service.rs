use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::config::ReliabilityConfig;
use super::domain::{CleanerHistory, ReliabilitySnapshot};
use super::engine::ReliabilityEngine;
use super::milestones::MilestoneEvent;
use super::repository::{HistorySource, MilestoneLedger, SnapshotStore};
use crate::config::PolicyError;
use crate::workflows::booking::UserRef;
use crate::workflows::collaborators::{Notification, NotificationSink, RepositoryError};

/// Service composing history fetches, the engine, snapshot publishing and milestone tracking.
pub struct ReliabilityService<H, S, N> {
    engine: Arc<ReliabilityEngine>,
    history: Arc<H>,
    store: Arc<S>,
    notifications: Arc<N>,
}

impl<H, S, N> ReliabilityService<H, S, N>
where
    H: HistorySource + 'static,
    S: SnapshotStore + MilestoneLedger + 'static,
    N: NotificationSink + 'static,
{
    pub fn new(
        history: Arc<H>,
        store: Arc<S>,
        notifications: Arc<N>,
        config: ReliabilityConfig,
    ) -> Result<Self, PolicyError> {
        Ok(Self {
            engine: Arc::new(ReliabilityEngine::new(config)?),
            history,
            store,
            notifications,
        })
    }

    pub fn engine(&self) -> &ReliabilityEngine {
        &self.engine
    }

    /// Recompute and publish the cleaner's snapshot, then award new milestones.
    ///
    /// Every history fetch completes before anything is computed; a failed fetch leaves the
    /// previously published snapshot untouched.
    pub fn recompute(
        &self,
        cleaner: &UserRef,
        now: DateTime<Utc>,
    ) -> Result<RecomputeOutcome, ReliabilityError> {
        let history = self.fetch_history(cleaner, now)?;
        let snapshot = self.engine.compute(cleaner, &history, now);

        let recorded = self.store.recorded(cleaner)?;
        let pending = self.engine.pending_milestones(&snapshot, &recorded);

        self.store.publish(snapshot.clone())?;
        info!(
            cleaner = %cleaner,
            score = snapshot.score,
            tier = snapshot.tier.label(),
            "reliability snapshot published"
        );

        let mut milestones = Vec::new();
        for event in pending {
            if !self.store.record(cleaner, event.kind)? {
                continue;
            }
            info!(cleaner = %cleaner, milestone = %event.kind.label(), "milestone achieved");
            if let Err(err) = self
                .notifications
                .publish(Notification::Milestone(event.clone()))
            {
                warn!(cleaner = %cleaner, error = %err, "milestone event not delivered");
            }
            milestones.push(event);
        }

        Ok(RecomputeOutcome {
            snapshot,
            milestones,
        })
    }

    /// Fresh snapshot when the recompute succeeds, otherwise the last published one labeled
    /// stale. Fails only when there is nothing to fall back to.
    pub fn snapshot_or_stale(
        &self,
        cleaner: &UserRef,
        now: DateTime<Utc>,
    ) -> Result<SnapshotView, ReliabilityError> {
        let error = match self.recompute(cleaner, now) {
            Ok(outcome) => return Ok(SnapshotView::Fresh(outcome.snapshot)),
            Err(error) => error,
        };

        match self.store.latest(cleaner)? {
            Some(snapshot) => {
                warn!(
                    cleaner = %cleaner,
                    last_updated_at = %snapshot.computed_at,
                    error = %error,
                    "serving stale reliability snapshot"
                );
                Ok(SnapshotView::Stale { snapshot, error })
            }
            None => Err(error),
        }
    }

    fn fetch_history(
        &self,
        cleaner: &UserRef,
        now: DateTime<Utc>,
    ) -> Result<CleanerHistory, ReliabilityError> {
        let window = self.engine.window_ending(now);
        let jobs = self
            .history
            .jobs_for(cleaner, &window)
            .map_err(|source| ReliabilityError::History {
                dataset: "jobs",
                source,
            })?;
        let reviews = self
            .history
            .reviews_for(cleaner, &window)
            .map_err(|source| ReliabilityError::History {
                dataset: "reviews",
                source,
            })?;
        let disputes = self
            .history
            .disputes_for(cleaner, &window)
            .map_err(|source| ReliabilityError::History {
                dataset: "disputes",
                source,
            })?;
        let lifetime_completed_jobs = self
            .history
            .lifetime_completed_jobs(cleaner)
            .map_err(|source| ReliabilityError::History {
                dataset: "lifetime jobs",
                source,
            })?;

        Ok(CleanerHistory {
            jobs,
            reviews,
            disputes,
            lifetime_completed_jobs,
        })
    }
}

/// Result of a successful recompute.
#[derive(Debug, Clone, PartialEq)]
pub struct RecomputeOutcome {
    pub snapshot: ReliabilitySnapshot,
    pub milestones: Vec<MilestoneEvent>,
}

/// Snapshot handed to readers, labeled with its freshness.
#[derive(Debug, Clone)]
pub enum SnapshotView {
    Fresh(ReliabilitySnapshot),
    Stale {
        snapshot: ReliabilitySnapshot,
        error: ReliabilityError,
    },
}

impl SnapshotView {
    pub fn snapshot(&self) -> &ReliabilitySnapshot {
        match self {
            Self::Fresh(snapshot) | Self::Stale { snapshot, .. } => snapshot,
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale { .. })
    }

    pub fn last_updated_at(&self) -> DateTime<Utc> {
        self.snapshot().computed_at
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ReliabilityError {
    #[error("failed to load {dataset} history")]
    History {
        dataset: &'static str,
        #[source]
        source: RepositoryError,
    },
    #[error(transparent)]
    Store(#[from] RepositoryError),
}
