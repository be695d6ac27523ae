use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::geo::GeoPoint;

/// Identifier wrapper for booked jobs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(pub String);

/// Email-style reference to a client or cleaner account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserRef(pub String);

impl UserRef {
    pub fn new(email: impl Into<String>) -> Self {
        Self(email.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Primary lifecycle stage of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Requested,
    Offered,
    Assigned,
    EnRoute,
    Arrived,
    InProgress,
    AwaitingClientReview,
    UnderReview,
    CompletedApproved,
    Cancelled,
    Rescheduled,
}

impl JobState {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Requested => "REQUESTED",
            Self::Offered => "OFFERED",
            Self::Assigned => "ASSIGNED",
            Self::EnRoute => "EN_ROUTE",
            Self::Arrived => "ARRIVED",
            Self::InProgress => "IN_PROGRESS",
            Self::AwaitingClientReview => "AWAITING_CLIENT_REVIEW",
            Self::UnderReview => "UNDER_REVIEW",
            Self::CompletedApproved => "COMPLETED_APPROVED",
            Self::Cancelled => "CANCELLED",
            Self::Rescheduled => "RESCHEDULED",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::CompletedApproved | Self::Cancelled | Self::Rescheduled
        )
    }

    /// States in which the cleaner had committed to the job.
    pub const fn is_committed(self) -> bool {
        matches!(
            self,
            Self::Assigned
                | Self::EnRoute
                | Self::Arrived
                | Self::InProgress
                | Self::AwaitingClientReview
                | Self::UnderReview
                | Self::CompletedApproved
        )
    }

    /// States reached only after the cleaner finished the work.
    pub const fn is_work_finished(self) -> bool {
        matches!(
            self,
            Self::AwaitingClientReview | Self::UnderReview | Self::CompletedApproved
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Orthogonal flag for special conditions layered over the primary state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubState {
    #[default]
    None,
    PhotosPending,
    ExtraTimeRequested,
    ExtraTimeApproved,
    GpsIssue,
    DisputeByClient,
    DisputeByCleaner,
}

impl SubState {
    pub const fn is_dispute(self) -> bool {
        matches!(self, Self::DisputeByClient | Self::DisputeByCleaner)
    }
}

/// Party that cancelled a job; only cleaner cancellations count against reliability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancellationParty {
    Client,
    Cleaner,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleaningType {
    Basic,
    Deep,
    Moveout,
}

impl CleaningType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Deep => "deep",
            Self::Moveout => "moveout",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DwellingSize {
    pub bedrooms: u8,
    pub bathrooms: u8,
    pub square_feet: Option<u32>,
}

/// Pricing captured when the booking was made; never recomputed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingSnapshot {
    pub credits_per_hour: u32,
    pub quoted_credits: u32,
}

/// What was booked, where, and when.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    pub scheduled_start: DateTime<Utc>,
    pub duration_minutes: u32,
    pub address: String,
    pub coordinates: Option<GeoPoint>,
    pub cleaning_type: CleaningType,
    pub dwelling: DwellingSize,
    pub pricing: PricingSnapshot,
}

impl ServiceDescriptor {
    pub fn scheduled_end(&self) -> DateTime<Utc> {
        self.scheduled_start + Duration::minutes(i64::from(self.duration_minutes))
    }

    pub fn scheduled_date(&self) -> NaiveDate {
        self.scheduled_start.date_naive()
    }
}

/// Lifecycle timestamps. Present values are non-decreasing along the lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobTimeline {
    pub created_at: DateTime<Utc>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub en_route_at: Option<DateTime<Utc>>,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
    pub disputed_at: Option<DateTime<Utc>>,
    pub dispute_resolved_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl JobTimeline {
    pub fn starting_at(created_at: DateTime<Utc>) -> Self {
        Self {
            created_at,
            assigned_at: None,
            en_route_at: None,
            checked_in_at: None,
            start_at: None,
            end_at: None,
            approved_at: None,
            disputed_at: None,
            dispute_resolved_at: None,
            cancelled_at: None,
        }
    }

    pub fn validate(&self) -> Result<(), JobRecordError> {
        if self.end_at.is_some() && self.start_at.is_none() {
            return Err(JobRecordError::EndWithoutStart);
        }

        let lifecycle = [
            ("created_at", Some(self.created_at)),
            ("assigned_at", self.assigned_at),
            ("en_route_at", self.en_route_at),
            ("checked_in_at", self.checked_in_at),
            ("start_at", self.start_at),
            ("end_at", self.end_at),
            ("approved_at", self.approved_at),
        ];
        check_chain(&lifecycle)?;

        let dispute = [
            ("end_at", self.end_at),
            ("disputed_at", self.disputed_at),
            ("dispute_resolved_at", self.dispute_resolved_at),
        ];
        check_chain(&dispute)?;

        check_chain(&[
            ("created_at", Some(self.created_at)),
            ("cancelled_at", self.cancelled_at),
        ])
    }
}

fn check_chain(chain: &[(&'static str, Option<DateTime<Utc>>)]) -> Result<(), JobRecordError> {
    let mut previous: Option<(&'static str, DateTime<Utc>)> = None;
    for (field, value) in chain {
        let Some(value) = value else {
            continue;
        };
        if let Some((earlier_field, earlier)) = previous {
            if *value < earlier {
                return Err(JobRecordError::TimestampOrder {
                    earlier: earlier_field,
                    later: field,
                });
            }
        }
        previous = Some((field, *value));
    }
    Ok(())
}

/// Locations captured at the four GPS checkpoints.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct JobCheckpoints {
    pub en_route: Option<GeoPoint>,
    pub check_in: Option<GeoPoint>,
    pub start: Option<GeoPoint>,
    pub end: Option<GeoPoint>,
}

/// Contract cap and settled amounts. Escrow is owned by the billing collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct JobBilling {
    pub max_billable_minutes: Option<u32>,
    pub max_billable_credits: Option<u32>,
    pub actual_minutes_worked: Option<u32>,
    pub final_credits_charged: Option<u32>,
    pub escrow_entry: Option<String>,
}

/// Photo counters maintained by the upload collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PhotoEvidence {
    pub before_required: bool,
    pub after_required: bool,
    pub before_count: u32,
    pub after_count: u32,
    pub submitted: bool,
}

impl PhotoEvidence {
    pub fn total(&self) -> u32 {
        self.before_count + self.after_count
    }
}

/// One booked cleaning engagement between a client and a cleaner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub client: UserRef,
    pub assigned_cleaner: Option<UserRef>,
    pub state: JobState,
    pub sub_state: SubState,
    pub cancelled_by: Option<CancellationParty>,
    pub timeline: JobTimeline,
    pub checkpoints: JobCheckpoints,
    pub billing: JobBilling,
    pub photos: PhotoEvidence,
    pub service: ServiceDescriptor,
}

impl Job {
    /// A freshly requested job with no cleaner and no progress.
    pub fn new(
        id: JobId,
        client: UserRef,
        service: ServiceDescriptor,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            client,
            assigned_cleaner: None,
            state: JobState::Requested,
            sub_state: SubState::None,
            cancelled_by: None,
            timeline: JobTimeline::starting_at(created_at),
            checkpoints: JobCheckpoints::default(),
            billing: JobBilling::default(),
            photos: PhotoEvidence {
                before_required: true,
                after_required: true,
                ..PhotoEvidence::default()
            },
            service,
        }
    }

    /// Re-check invariants on a record loaded from storage.
    pub fn validated(self) -> Result<Self, JobRecordError> {
        self.timeline.validate()?;
        if self.billing.final_credits_charged.is_some() && !self.state.is_terminal() {
            return Err(JobRecordError::SettledButOpen(self.state));
        }
        Ok(self)
    }

    pub fn with_billing_cap(mut self, max_minutes: Option<u32>, max_credits: Option<u32>) -> Self {
        self.billing.max_billable_minutes = max_minutes;
        self.billing.max_billable_credits = max_credits;
        self
    }

    /// A settled job is frozen: no location or time field may change.
    pub fn is_settled(&self) -> bool {
        self.billing.final_credits_charged.is_some()
    }

    pub fn is_cancelled_by_cleaner(&self) -> bool {
        self.state == JobState::Cancelled && self.cancelled_by == Some(CancellationParty::Cleaner)
    }

    pub fn is_in_dispute(&self) -> bool {
        self.state == JobState::UnderReview || self.sub_state.is_dispute()
    }
}

/// Invariant violations detected on a job record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JobRecordError {
    #[error("{later} precedes {earlier}")]
    TimestampOrder {
        earlier: &'static str,
        later: &'static str,
    },
    #[error("end_at recorded without start_at")]
    EndWithoutStart,
    #[error("final credits charged on a job still in {0}")]
    SettledButOpen(JobState),
}
