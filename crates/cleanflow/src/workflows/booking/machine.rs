use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use super::billing::{billable_minutes, final_credits, worked_minutes};
use super::domain::{CancellationParty, Job, JobId, JobRecordError, JobState, SubState, UserRef};
use super::guards::{
    CleanerAssigned, EndRecorded, Guard, GuardContext, GuardReport, MinimumAfterPhotos,
    MinimumBeforePhotos, NotSettled, PositiveWorkedDuration, StartRecorded, WithinGeofence,
};
use crate::config::PolicyError;
use crate::geo::GeoPoint;

pub const DEFAULT_GEOFENCE_RADIUS_METERS: f64 = 250.0;
pub const DEFAULT_MINIMUM_PHOTOS: u32 = 3;

/// Thresholds applied by the transition guards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionPolicy {
    pub min_before_photos: u32,
    pub min_after_photos: u32,
    pub geofence_radius_meters: f64,
}

impl Default for TransitionPolicy {
    fn default() -> Self {
        Self {
            min_before_photos: DEFAULT_MINIMUM_PHOTOS,
            min_after_photos: DEFAULT_MINIMUM_PHOTOS,
            geofence_radius_meters: DEFAULT_GEOFENCE_RADIUS_METERS,
        }
    }
}

impl TransitionPolicy {
    pub fn with_geofence_radius(mut self, radius_meters: f64) -> Self {
        self.geofence_radius_meters = radius_meters;
        self
    }

    pub fn validate(&self) -> Result<(), PolicyError> {
        if !self.geofence_radius_meters.is_finite() || self.geofence_radius_meters < 0.0 {
            return Err(PolicyError::OutOfRange {
                field: "geofence_radius_meters",
                value: self.geofence_radius_meters,
            });
        }
        Ok(())
    }
}

/// Caller-supplied facts accompanying a transition attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionInput {
    pub at: DateTime<Utc>,
    pub location: Option<GeoPoint>,
    pub cleaner: Option<UserRef>,
    pub sub_state: Option<SubState>,
    pub cancelled_by: Option<CancellationParty>,
}

impl TransitionInput {
    pub fn at(at: DateTime<Utc>) -> Self {
        Self {
            at,
            location: None,
            cleaner: None,
            sub_state: None,
            cancelled_by: None,
        }
    }

    pub fn with_location(mut self, location: GeoPoint) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_cleaner(mut self, cleaner: UserRef) -> Self {
        self.cleaner = Some(cleaner);
        self
    }

    pub fn with_sub_state(mut self, sub_state: SubState) -> Self {
        self.sub_state = Some(sub_state);
        self
    }

    pub fn cancelled_by(mut self, party: CancellationParty) -> Self {
        self.cancelled_by = Some(party);
        self
    }
}

/// Side-effect descriptor for the notification collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobEvent {
    pub job_id: JobId,
    pub at: DateTime<Utc>,
    pub kind: JobEventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobEventKind {
    Offered,
    OfferWithdrawn,
    Accepted { cleaner: UserRef },
    EnRoute,
    CheckedIn,
    Started,
    SubmittedForReview { billable_minutes: Option<u32> },
    Completed { final_credits: Option<u32> },
    Disputed { raised_by: SubState },
    DisputeResolved { outcome: JobState },
    Cancelled { by: Option<CancellationParty> },
    Rescheduled,
}

impl JobEvent {
    /// Events after which the cleaner's reliability snapshot is out of date.
    pub fn triggers_reliability_recompute(&self) -> bool {
        matches!(
            self.kind,
            JobEventKind::Completed { .. }
                | JobEventKind::Cancelled { .. }
                | JobEventKind::DisputeResolved { .. }
        )
    }
}

/// A committed transition: the updated record and the events it produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionOutcome {
    pub job: Job,
    pub events: Vec<JobEvent>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransitionError {
    #[error("no transition defined from {from} to {to}")]
    Undefined { from: JobState, to: JobState },
    #[error("transition from {from} to {to} rejected: {}", .failures.join("; "))]
    Rejected {
        from: JobState,
        to: JobState,
        failures: Vec<String>,
    },
    #[error("job {0} has already been settled")]
    Settled(JobId),
    #[error("clock-out requires IN_PROGRESS, job is {0}")]
    NotInProgress(JobState),
    #[error("clock-out must come after the recorded start")]
    EndNotAfterStart,
    #[error("clock-out already recorded at {0}")]
    AlreadyClockedOut(DateTime<Utc>),
    #[error(transparent)]
    Timeline(#[from] JobRecordError),
}

impl TransitionError {
    /// Guard rejections are expected outcomes the caller can act on; everything else indicates a
    /// programming or data error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

type GuardTable = BTreeMap<(JobState, JobState), Vec<Box<dyn Guard>>>;

/// The job lifecycle: a table of `(from, to)` edges, each with an ordered guard list.
#[derive(Debug)]
pub struct StateMachine {
    policy: TransitionPolicy,
    table: GuardTable,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new(TransitionPolicy::default())
    }
}

impl StateMachine {
    pub fn new(policy: TransitionPolicy) -> Self {
        let table = build_table(&policy);
        Self { policy, table }
    }

    pub fn policy(&self) -> &TransitionPolicy {
        &self.policy
    }

    pub fn is_defined(&self, from: JobState, to: JobState) -> bool {
        self.table.contains_key(&(from, to))
    }

    pub fn edges(&self) -> impl Iterator<Item = (JobState, JobState)> + '_ {
        self.table.keys().copied()
    }

    /// Evaluate every guard on the edge from the job's current state to `to`.
    pub fn can_transition(
        &self,
        job: &Job,
        to: JobState,
        location: Option<GeoPoint>,
    ) -> Result<GuardReport, TransitionError> {
        let guards = self.guards_for(job.state, to)?;
        Ok(GuardReport::evaluate(guards, &GuardContext::new(job, location)))
    }

    /// Produce the record that results from moving `job` to `to`.
    ///
    /// Guards run against the staged record, i.e. with any cleaner named in `input` already
    /// assigned. The original record is untouched; persisting the result is the caller's
    /// conditional write.
    pub fn apply(
        &self,
        job: &Job,
        to: JobState,
        input: TransitionInput,
    ) -> Result<TransitionOutcome, TransitionError> {
        let from = job.state;
        let guards = self.guards_for(from, to)?;

        let mut next = job.clone();
        if let Some(cleaner) = input.cleaner.clone() {
            next.assigned_cleaner = Some(cleaner);
        }

        let report = GuardReport::evaluate(guards, &GuardContext::new(&next, input.location));
        if !report.is_allowed() {
            warn!(
                job_id = %job.id,
                %from,
                %to,
                failures = ?report.failures,
                "transition rejected by guards"
            );
            return Err(TransitionError::Rejected {
                from,
                to,
                failures: report.failures,
            });
        }

        let at = input.at;
        let mut events = Vec::new();
        let mut event = |kind: JobEventKind| {
            events.push(JobEvent {
                job_id: job.id.clone(),
                at,
                kind,
            })
        };

        if let Some(sub_state) = input.sub_state {
            next.sub_state = sub_state;
        }

        match to {
            JobState::Requested => event(JobEventKind::OfferWithdrawn),
            JobState::Offered => event(JobEventKind::Offered),
            JobState::Assigned => {
                next.timeline.assigned_at = Some(at);
                if let Some(cleaner) = next.assigned_cleaner.clone() {
                    event(JobEventKind::Accepted { cleaner });
                }
            }
            JobState::EnRoute => {
                next.timeline.en_route_at = Some(at);
                next.checkpoints.en_route = input.location;
                event(JobEventKind::EnRoute);
            }
            JobState::Arrived => {
                next.timeline.checked_in_at = Some(at);
                next.checkpoints.check_in = input.location;
                event(JobEventKind::CheckedIn);
            }
            JobState::InProgress => {
                if next.timeline.checked_in_at.is_none() {
                    next.timeline.checked_in_at = Some(at);
                    next.checkpoints.check_in = input.location;
                    event(JobEventKind::CheckedIn);
                }
                next.timeline.start_at = Some(at);
                next.checkpoints.start = input.location;
                event(JobEventKind::Started);
            }
            JobState::AwaitingClientReview => {
                next.billing.actual_minutes_worked = worked_minutes(&next);
                event(JobEventKind::SubmittedForReview {
                    billable_minutes: billable_minutes(&next),
                });
            }
            JobState::UnderReview => {
                next.timeline.disputed_at = Some(at);
                if !next.sub_state.is_dispute() {
                    next.sub_state = SubState::DisputeByClient;
                }
                event(JobEventKind::Disputed {
                    raised_by: next.sub_state,
                });
            }
            JobState::CompletedApproved => {
                if from == JobState::UnderReview {
                    next.timeline.dispute_resolved_at = Some(at);
                    next.sub_state = SubState::None;
                    event(JobEventKind::DisputeResolved { outcome: to });
                }
                next.timeline.approved_at = Some(at);
                next.billing.actual_minutes_worked = worked_minutes(&next);
                next.billing.final_credits_charged = final_credits(&next);
                event(JobEventKind::Completed {
                    final_credits: next.billing.final_credits_charged,
                });
            }
            JobState::Cancelled => {
                if from == JobState::UnderReview {
                    next.timeline.dispute_resolved_at = Some(at);
                    next.sub_state = SubState::None;
                    event(JobEventKind::DisputeResolved { outcome: to });
                }
                next.timeline.cancelled_at = Some(at);
                next.cancelled_by = input.cancelled_by;
                event(JobEventKind::Cancelled {
                    by: input.cancelled_by,
                });
            }
            JobState::Rescheduled => event(JobEventKind::Rescheduled),
        }

        next.state = to;
        next.timeline.validate()?;

        debug!(job_id = %job.id, %from, %to, "transition applied");
        Ok(TransitionOutcome { job: next, events })
    }

    /// Record the end of work on an in-progress job. `end_at` must fall strictly after `start_at`.
    pub fn record_clock_out(
        &self,
        job: &Job,
        at: DateTime<Utc>,
        location: Option<GeoPoint>,
    ) -> Result<Job, TransitionError> {
        if job.is_settled() {
            return Err(TransitionError::Settled(job.id.clone()));
        }
        if job.state != JobState::InProgress {
            return Err(TransitionError::NotInProgress(job.state));
        }
        if let Some(ended) = job.timeline.end_at {
            return Err(TransitionError::AlreadyClockedOut(ended));
        }
        match job.timeline.start_at {
            Some(start) if at > start => {}
            _ => return Err(TransitionError::EndNotAfterStart),
        }

        let mut next = job.clone();
        next.timeline.end_at = Some(at);
        next.checkpoints.end = location;
        next.timeline.validate()?;
        Ok(next)
    }

    fn guards_for(
        &self,
        from: JobState,
        to: JobState,
    ) -> Result<&[Box<dyn Guard>], TransitionError> {
        match self.table.get(&(from, to)) {
            Some(guards) => Ok(guards.as_slice()),
            None => {
                error!(%from, %to, "attempted transition with no table entry");
                Err(TransitionError::Undefined { from, to })
            }
        }
    }
}

fn build_table(policy: &TransitionPolicy) -> GuardTable {
    use JobState::*;

    let geofence = || -> Box<dyn Guard> {
        Box::new(WithinGeofence {
            radius_meters: policy.geofence_radius_meters,
        })
    };

    let mut table: GuardTable = BTreeMap::new();
    let mut edge = |from: JobState, to: JobState, mut guards: Vec<Box<dyn Guard>>| {
        guards.insert(0, Box::new(NotSettled));
        table.insert((from, to), guards);
    };

    edge(Requested, Offered, vec![]);
    edge(Requested, Assigned, vec![Box::new(CleanerAssigned)]);
    edge(Offered, Requested, vec![]);
    edge(Offered, Assigned, vec![Box::new(CleanerAssigned)]);
    edge(Assigned, EnRoute, vec![Box::new(CleanerAssigned)]);
    edge(EnRoute, Arrived, vec![Box::new(CleanerAssigned), geofence()]);
    edge(EnRoute, InProgress, vec![Box::new(CleanerAssigned), geofence()]);
    edge(Arrived, InProgress, vec![Box::new(CleanerAssigned), geofence()]);
    edge(
        InProgress,
        AwaitingClientReview,
        vec![
            Box::new(MinimumBeforePhotos {
                minimum: policy.min_before_photos,
            }),
            Box::new(MinimumAfterPhotos {
                minimum: policy.min_after_photos,
            }),
            Box::new(StartRecorded),
            Box::new(EndRecorded),
        ],
    );
    edge(
        AwaitingClientReview,
        CompletedApproved,
        vec![Box::new(PositiveWorkedDuration)],
    );
    edge(AwaitingClientReview, UnderReview, vec![]);
    edge(UnderReview, CompletedApproved, vec![Box::new(PositiveWorkedDuration)]);
    edge(UnderReview, Cancelled, vec![]);

    for from in [Requested, Offered, Assigned, EnRoute, Arrived] {
        edge(from, Cancelled, vec![]);
        edge(from, Rescheduled, vec![]);
    }

    table
}
