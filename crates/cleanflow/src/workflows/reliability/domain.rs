use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::workflows::booking::{Job, JobId, UserRef};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReviewId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisputeId(pub String);

/// Client rating of a finished job, 1 to 5.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub job_id: JobId,
    pub cleaner: UserRef,
    pub rating: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeParty {
    Client,
    Cleaner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeKind {
    NoShow,
    Quality,
    Damage,
    Payment,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeStatus {
    Open,
    ResolvedForClient,
    ResolvedForCleaner,
    Withdrawn,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dispute {
    pub id: DisputeId,
    pub job_id: JobId,
    pub cleaner: UserRef,
    pub filed_by: DisputeParty,
    pub kind: DisputeKind,
    pub status: DisputeStatus,
    pub created_at: DateTime<Utc>,
}

impl Dispute {
    pub fn is_client_no_show(&self) -> bool {
        self.filed_by == DisputeParty::Client && self.kind == DisputeKind::NoShow
    }
}

/// Discrete trust level, ordered from lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Developing,
    SemiPro,
    Pro,
    Elite,
}

impl Tier {
    pub const fn ordered() -> [Self; 4] {
        [Self::Developing, Self::SemiPro, Self::Pro, Self::Elite]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Developing => "Developing",
            Self::SemiPro => "Semi Pro",
            Self::Pro => "Pro",
            Self::Elite => "Elite",
        }
    }

    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Developing => Some(Self::SemiPro),
            Self::SemiPro => Some(Self::Pro),
            Self::Pro => Some(Self::Elite),
            Self::Elite => None,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Trailing window `[start, end)` over which history is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl HistoryWindow {
    pub fn trailing(end: DateTime<Utc>, days: u32) -> Self {
        Self {
            start: end - Duration::days(i64::from(days)),
            end,
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at < self.end
    }
}

/// Everything fetched for one recompute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanerHistory {
    pub jobs: Vec<Job>,
    pub reviews: Vec<Review>,
    pub disputes: Vec<Dispute>,
    /// Finished jobs over the cleaner's whole tenure, not only the window.
    pub lifetime_completed_jobs: u32,
}

/// Rates are percentages in `[0, 100]`; `average_rating` is on the 1 to 5 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReliabilityMetrics {
    pub attendance_rate: f64,
    pub punctuality_rate: f64,
    pub cancellation_rate: f64,
    pub completion_confirmation_rate: f64,
    pub photo_proof_rate: f64,
    pub communication_rate: f64,
    pub average_rating: f64,
    pub no_show_rate: f64,
    pub dispute_rate: f64,
    pub scheduled_jobs: u32,
    pub total_completed_jobs: u32,
    pub cleaner_cancellations: u32,
    pub no_show_count: u32,
    pub dispute_count: u32,
    pub review_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreakSummary {
    pub current_days: u32,
    pub best_days: u32,
}

/// Gap between the current standing and the next tier's floors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierProgress {
    pub current: Tier,
    pub next: Option<Tier>,
    pub jobs_needed: u32,
    pub score_needed: f64,
}

/// Immutable result of one full recompute. Consumers replace the whole value; it is never
/// patched in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReliabilitySnapshot {
    pub cleaner: UserRef,
    pub computed_at: DateTime<Utc>,
    pub window: HistoryWindow,
    pub metrics: ReliabilityMetrics,
    /// Never below `metrics.total_completed_jobs`. Drives the job-count milestones.
    #[serde(default)]
    pub lifetime_completed_jobs: u32,
    pub streaks: StreakSummary,
    pub score: f64,
    pub tier: Tier,
    pub progress: TierProgress,
}
