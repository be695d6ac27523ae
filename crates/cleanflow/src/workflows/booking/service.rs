use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::domain::{Job, JobId, JobState};
use super::guards::GuardReport;
use super::machine::{
    StateMachine, TransitionError, TransitionInput, TransitionOutcome, TransitionPolicy,
};
use super::repository::JobRepository;
use crate::geo::GeoPoint;
use crate::workflows::collaborators::{Notification, NotificationSink, RepositoryError};

pub const DEFAULT_TRANSITION_ATTEMPTS: u32 = 3;

/// Service composing the state machine with conditional persistence and notifications.
pub struct JobLifecycleService<R, N> {
    machine: Arc<StateMachine>,
    repository: Arc<R>,
    notifications: Arc<N>,
    max_attempts: u32,
}

impl<R, N> JobLifecycleService<R, N>
where
    R: JobRepository + 'static,
    N: NotificationSink + 'static,
{
    pub fn new(repository: Arc<R>, notifications: Arc<N>, policy: TransitionPolicy) -> Self {
        Self {
            machine: Arc::new(StateMachine::new(policy)),
            repository,
            notifications,
            max_attempts: DEFAULT_TRANSITION_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn machine(&self) -> &StateMachine {
        &self.machine
    }

    /// Report which guards would fail if the job moved to `to` now.
    pub fn check(
        &self,
        job_id: &JobId,
        to: JobState,
        location: Option<GeoPoint>,
    ) -> Result<GuardReport, LifecycleError> {
        let job = self.load(job_id)?;
        Ok(self.machine.can_transition(&job, to, location)?)
    }

    /// Move a job from `expected` to `to` as a conditional write.
    ///
    /// When the write loses a race the record is re-read and re-validated. If the state is no
    /// longer `expected` the attempt ends with [`LifecycleError::StateChanged`].
    pub fn transition(
        &self,
        job_id: &JobId,
        expected: JobState,
        to: JobState,
        input: TransitionInput,
    ) -> Result<TransitionOutcome, LifecycleError> {
        for attempt in 1..=self.max_attempts {
            let job = self.load(job_id)?;
            if job.state != expected {
                return Err(LifecycleError::StateChanged {
                    expected,
                    actual: job.state,
                });
            }

            let outcome = self.machine.apply(&job, to, input.clone())?;

            match self.repository.compare_and_swap(expected, outcome.job.clone()) {
                Ok(()) => {
                    info!(job_id = %job_id, from = %expected, %to, "job transition committed");
                    self.dispatch(&outcome);
                    return Ok(outcome);
                }
                Err(RepositoryError::StaleState { actual, .. }) => {
                    warn!(
                        job_id = %job_id,
                        attempt,
                        %actual,
                        "conditional write lost a race, re-reading job"
                    );
                }
                Err(other) => return Err(other.into()),
            }
        }

        Err(LifecycleError::ConcurrentModification {
            attempts: self.max_attempts,
        })
    }

    /// Record the end of work on an in-progress job.
    pub fn clock_out(
        &self,
        job_id: &JobId,
        at: DateTime<Utc>,
        location: Option<GeoPoint>,
    ) -> Result<Job, LifecycleError> {
        let job = self.load(job_id)?;
        let updated = self.machine.record_clock_out(&job, at, location)?;

        match self
            .repository
            .compare_and_swap(JobState::InProgress, updated.clone())
        {
            Ok(()) => Ok(updated),
            Err(RepositoryError::StaleState { expected, actual }) => {
                Err(LifecycleError::StateChanged { expected, actual })
            }
            Err(other) => Err(other.into()),
        }
    }

    fn load(&self, job_id: &JobId) -> Result<Job, LifecycleError> {
        let job = self
            .repository
            .fetch(job_id)?
            .ok_or_else(|| LifecycleError::NotFound(job_id.clone()))?;
        Ok(job.validated().map_err(TransitionError::from)?)
    }

    fn dispatch(&self, outcome: &TransitionOutcome) {
        for event in &outcome.events {
            if let Err(err) = self
                .notifications
                .publish(Notification::Job(event.clone()))
            {
                warn!(job_id = %event.job_id, error = %err, "job event not delivered");
            }
        }
    }
}

/// Error raised by the lifecycle service.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("job {0} not found")]
    NotFound(JobId),
    #[error("job moved to {actual} while expecting {expected}")]
    StateChanged { expected: JobState, actual: JobState },
    #[error("gave up after {attempts} conflicting writes")]
    ConcurrentModification { attempts: u32 },
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
