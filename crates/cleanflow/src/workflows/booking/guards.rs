use std::fmt;

use super::billing::worked_minutes;
use super::domain::Job;
use crate::geo::{is_location_near, GeoPoint};

/// Inputs visible to a guard: the staged job record and, for GPS checkpoints, the reported
/// device location.
#[derive(Debug, Clone, Copy)]
pub struct GuardContext<'a> {
    pub job: &'a Job,
    pub location: Option<GeoPoint>,
}

impl<'a> GuardContext<'a> {
    pub fn new(job: &'a Job, location: Option<GeoPoint>) -> Self {
        Self { job, location }
    }
}

/// A pure predicate over a job record. Guards never mutate and carry the message shown to the
/// acting party when they fail.
pub trait Guard: fmt::Debug + Send + Sync {
    fn check(&self, ctx: &GuardContext<'_>) -> bool;
    fn message(&self) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NotSettled;

impl Guard for NotSettled {
    fn check(&self, ctx: &GuardContext<'_>) -> bool {
        !ctx.job.is_settled()
    }

    fn message(&self) -> String {
        "Job has already been settled".to_string()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CleanerAssigned;

impl Guard for CleanerAssigned {
    fn check(&self, ctx: &GuardContext<'_>) -> bool {
        ctx.job.assigned_cleaner.is_some()
    }

    fn message(&self) -> String {
        "Job must have an assigned cleaner".to_string()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MinimumBeforePhotos {
    pub minimum: u32,
}

impl Guard for MinimumBeforePhotos {
    fn check(&self, ctx: &GuardContext<'_>) -> bool {
        let photos = &ctx.job.photos;
        !photos.before_required || photos.before_count >= self.minimum
    }

    fn message(&self) -> String {
        format!("At least {} before photos are required", self.minimum)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MinimumAfterPhotos {
    pub minimum: u32,
}

impl Guard for MinimumAfterPhotos {
    fn check(&self, ctx: &GuardContext<'_>) -> bool {
        let photos = &ctx.job.photos;
        !photos.after_required || photos.after_count >= self.minimum
    }

    fn message(&self) -> String {
        format!("At least {} after photos are required", self.minimum)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StartRecorded;

impl Guard for StartRecorded {
    fn check(&self, ctx: &GuardContext<'_>) -> bool {
        ctx.job.timeline.start_at.is_some()
    }

    fn message(&self) -> String {
        "Start time must be recorded".to_string()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EndRecorded;

impl Guard for EndRecorded {
    fn check(&self, ctx: &GuardContext<'_>) -> bool {
        ctx.job.timeline.end_at.is_some()
    }

    fn message(&self) -> String {
        "End time must be recorded".to_string()
    }
}

/// Requires a reported location inside the geofence around the job's stored coordinates.
#[derive(Debug, Clone, Copy)]
pub struct WithinGeofence {
    pub radius_meters: f64,
}

impl Guard for WithinGeofence {
    fn check(&self, ctx: &GuardContext<'_>) -> bool {
        match (ctx.location, ctx.job.service.coordinates) {
            (Some(location), Some(site)) => is_location_near(location, site, self.radius_meters),
            _ => false,
        }
    }

    fn message(&self) -> String {
        format!(
            "Location must be within {:.0}m of the job site",
            self.radius_meters
        )
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PositiveWorkedDuration;

impl Guard for PositiveWorkedDuration {
    fn check(&self, ctx: &GuardContext<'_>) -> bool {
        worked_minutes(ctx.job).is_some()
    }

    fn message(&self) -> String {
        "Worked duration must be positive".to_string()
    }
}

/// Result of evaluating every guard on one edge. Failures are kept in table order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GuardReport {
    pub failures: Vec<String>,
}

impl GuardReport {
    pub fn evaluate(guards: &[Box<dyn Guard>], ctx: &GuardContext<'_>) -> Self {
        let failures = guards
            .iter()
            .filter(|guard| !guard.check(ctx))
            .map(|guard| guard.message())
            .collect();
        Self { failures }
    }

    pub fn is_allowed(&self) -> bool {
        self.failures.is_empty()
    }
}
