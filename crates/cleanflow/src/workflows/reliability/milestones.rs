use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::config::MilestoneThresholds;
use super::domain::{ReliabilitySnapshot, Tier};
use crate::workflows::booking::UserRef;

/// One-time achievement. Each kind fires at most once per cleaner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MilestoneKind {
    JobsCompleted { count: u32 },
    PerfectStreak { days: u32 },
    ReachedElite,
    ZeroDisputePeriod,
    PerfectPhotoCompliance,
}

impl MilestoneKind {
    pub fn label(self) -> String {
        match self {
            Self::JobsCompleted { count } => format!("{count} jobs completed"),
            Self::PerfectStreak { days } => format!("{days}-day perfect streak"),
            Self::ReachedElite => "reached Elite".to_string(),
            Self::ZeroDisputePeriod => "zero-dispute period".to_string(),
            Self::PerfectPhotoCompliance => "perfect photo compliance".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilestoneEvent {
    pub cleaner: UserRef,
    pub kind: MilestoneKind,
    pub achieved_at: DateTime<Utc>,
}

fn achieved(
    snapshot: &ReliabilitySnapshot,
    thresholds: &MilestoneThresholds,
) -> Vec<MilestoneKind> {
    let metrics = &snapshot.metrics;
    let mut kinds: Vec<MilestoneKind> = thresholds
        .job_counts
        .iter()
        .filter(|count| snapshot.lifetime_completed_jobs >= **count)
        .map(|count| MilestoneKind::JobsCompleted { count: *count })
        .collect();

    if snapshot.streaks.best_days >= thresholds.perfect_streak_days {
        kinds.push(MilestoneKind::PerfectStreak {
            days: thresholds.perfect_streak_days,
        });
    }
    if snapshot.tier == Tier::Elite {
        kinds.push(MilestoneKind::ReachedElite);
    }
    // Period milestones judge the window only.
    if metrics.dispute_count == 0
        && metrics.total_completed_jobs >= thresholds.zero_dispute_min_jobs
    {
        kinds.push(MilestoneKind::ZeroDisputePeriod);
    }
    if metrics.photo_proof_rate >= 100.0
        && metrics.total_completed_jobs >= thresholds.photo_compliance_min_jobs
    {
        kinds.push(MilestoneKind::PerfectPhotoCompliance);
    }
    kinds
}

/// Milestones the snapshot qualifies for that are not in `recorded`.
pub fn pending_milestones(
    snapshot: &ReliabilitySnapshot,
    recorded: &BTreeSet<MilestoneKind>,
    thresholds: &MilestoneThresholds,
) -> Vec<MilestoneEvent> {
    achieved(snapshot, thresholds)
        .into_iter()
        .filter(|kind| !recorded.contains(kind))
        .map(|kind| MilestoneEvent {
            cleaner: snapshot.cleaner.clone(),
            kind,
            achieved_at: snapshot.computed_at,
        })
        .collect()
}
