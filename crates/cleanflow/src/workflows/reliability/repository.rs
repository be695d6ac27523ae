use std::collections::BTreeSet;

use super::domain::{Dispute, HistoryWindow, ReliabilitySnapshot, Review};
use super::milestones::MilestoneKind;
use crate::workflows::booking::{Job, UserRef};
use crate::workflows::collaborators::RepositoryError;

/// Read side of the persistence collaborator for reliability history.
pub trait HistorySource: Send + Sync {
    fn jobs_for(
        &self,
        cleaner: &UserRef,
        window: &HistoryWindow,
    ) -> Result<Vec<Job>, RepositoryError>;
    fn reviews_for(
        &self,
        cleaner: &UserRef,
        window: &HistoryWindow,
    ) -> Result<Vec<Review>, RepositoryError>;
    fn disputes_for(
        &self,
        cleaner: &UserRef,
        window: &HistoryWindow,
    ) -> Result<Vec<Dispute>, RepositoryError>;
    /// Jobs the cleaner has finished across all time.
    fn lifetime_completed_jobs(&self, cleaner: &UserRef) -> Result<u32, RepositoryError>;
}

/// Holds the latest published snapshot per cleaner. `publish` replaces the whole value.
pub trait SnapshotStore: Send + Sync {
    fn latest(&self, cleaner: &UserRef) -> Result<Option<ReliabilitySnapshot>, RepositoryError>;
    fn publish(&self, snapshot: ReliabilitySnapshot) -> Result<(), RepositoryError>;
}

/// Milestones already awarded.
pub trait MilestoneLedger: Send + Sync {
    fn recorded(&self, cleaner: &UserRef) -> Result<BTreeSet<MilestoneKind>, RepositoryError>;
    /// Returns `false` when the milestone was already present.
    fn record(&self, cleaner: &UserRef, kind: MilestoneKind) -> Result<bool, RepositoryError>;
}
