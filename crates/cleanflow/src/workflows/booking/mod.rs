//! Job lifecycle: guarded state transitions, derived billing figures, and the conditional-write
//! service that persists them.

pub mod billing;
pub mod domain;
pub mod guards;
mod machine;
pub mod repository;
pub mod service;

#[cfg(test)]
mod tests;

pub use billing::{billable_minutes, final_credits, worked_minutes};
pub use domain::{
    CancellationParty, CleaningType, DwellingSize, Job, JobBilling, JobCheckpoints, JobId,
    JobRecordError, JobState, JobTimeline, PhotoEvidence, PricingSnapshot, ServiceDescriptor,
    SubState, UserRef,
};
pub use guards::{Guard, GuardContext, GuardReport};
pub use machine::{
    JobEvent, JobEventKind, StateMachine, TransitionError, TransitionInput, TransitionOutcome,
    TransitionPolicy, DEFAULT_GEOFENCE_RADIUS_METERS, DEFAULT_MINIMUM_PHOTOS,
};
pub use repository::JobRepository;
pub use service::{JobLifecycleService, LifecycleError};
