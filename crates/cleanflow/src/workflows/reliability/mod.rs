//! Cleaner trust: windowed metrics, composite score, tier, streaks and milestones, recomputed
//! in full and published as immutable snapshots.

pub mod config;
pub mod domain;
mod engine;
mod metrics;
pub mod milestones;
pub mod repository;
mod scoring;
pub mod service;
mod streaks;

#[cfg(test)]
mod tests;

pub use config::{
    MilestoneThresholds, ReliabilityConfig, ScoreWeights, TierPolicy, TierRequirement,
    MAX_WINDOW_DAYS,
};
pub use domain::{
    CleanerHistory, Dispute, DisputeId, DisputeKind, DisputeParty, DisputeStatus, HistoryWindow,
    ReliabilityMetrics, ReliabilitySnapshot, Review, ReviewId, StreakSummary, Tier, TierProgress,
};
pub use engine::ReliabilityEngine;
pub use milestones::{pending_milestones, MilestoneEvent, MilestoneKind};
pub use repository::{HistorySource, MilestoneLedger, SnapshotStore};
pub use service::{RecomputeOutcome, ReliabilityError, ReliabilityService, SnapshotView};
