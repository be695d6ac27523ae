//! Boundaries to the hosted backend: storage failures and outbound notifications.

use serde::{Deserialize, Serialize};

use super::booking::{JobEvent, JobState};
use super::reliability::MilestoneEvent;

/// Error enumeration for persistence failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("conditional write rejected: expected {expected}, found {actual}")]
    StaleState { expected: JobState, actual: JobState },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Descriptor handed to the notification collaborator, which owns delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum Notification {
    Job(JobEvent),
    Milestone(MilestoneEvent),
}

/// Trait describing outbound notification hooks (e-mail, SMS, push adapters).
pub trait NotificationSink: Send + Sync {
    fn publish(&self, notification: Notification) -> Result<(), PublishError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PublishError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
