use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::workflows::booking::domain::{
    CancellationParty, CleaningType, DwellingSize, Job, JobId, JobState, PricingSnapshot,
    ServiceDescriptor, UserRef,
};
use crate::workflows::collaborators::{
    Notification, NotificationSink, PublishError, RepositoryError,
};
use crate::workflows::reliability::domain::{
    CleanerHistory, Dispute, DisputeId, DisputeKind, DisputeParty, DisputeStatus, HistoryWindow,
    ReliabilitySnapshot, Review, ReviewId,
};
use crate::workflows::reliability::milestones::MilestoneKind;
use crate::workflows::reliability::repository::{HistorySource, MilestoneLedger, SnapshotStore};

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 20, 0, 0)
        .single()
        .expect("valid timestamp")
}

/// 14:00 UTC on the day `days_ago` days before `now()`.
pub(super) fn slot(days_ago: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 14, 0, 0)
        .single()
        .expect("valid timestamp")
        - Duration::days(days_ago)
}

pub(super) fn cleaner() -> UserRef {
    UserRef::new("casey@sparkle.example")
}

fn service_at(start: DateTime<Utc>) -> ServiceDescriptor {
    ServiceDescriptor {
        scheduled_start: start,
        duration_minutes: 180,
        address: "88 Ingersoll Ave, Des Moines, IA".to_string(),
        coordinates: None,
        cleaning_type: CleaningType::Basic,
        dwelling: DwellingSize {
            bedrooms: 3,
            bathrooms: 2,
            square_feet: None,
        },
        pricing: PricingSnapshot {
            credits_per_hour: 40,
            quoted_credits: 120,
        },
    }
}

pub(super) fn booked_job(id: &str, start: DateTime<Utc>) -> Job {
    let mut job = Job::new(
        JobId(id.to_string()),
        UserRef::new("jordan@client.example"),
        service_at(start),
        start - Duration::days(2),
    );
    job.assigned_cleaner = Some(cleaner());
    job.timeline.assigned_at = Some(start - Duration::days(1));
    job
}

/// Approved job with an on-time check-in and a full photo set.
pub(super) fn completed_job(id: &str, start: DateTime<Utc>) -> Job {
    let mut job = booked_job(id, start);
    job.state = JobState::CompletedApproved;
    job.timeline.checked_in_at = Some(start - Duration::minutes(5));
    job.timeline.start_at = Some(start);
    job.timeline.end_at = Some(start + Duration::hours(3));
    job.timeline.approved_at = Some(start + Duration::hours(4));
    job.photos.before_count = 3;
    job.photos.after_count = 3;
    job.photos.submitted = true;
    job.billing.actual_minutes_worked = Some(180);
    job.billing.final_credits_charged = Some(120);
    job
}

pub(super) fn cancelled_job(id: &str, start: DateTime<Utc>, by: CancellationParty) -> Job {
    let mut job = booked_job(id, start);
    job.state = JobState::Cancelled;
    job.cancelled_by = Some(by);
    job.timeline.cancelled_at = Some(start - Duration::hours(6));
    job
}

/// One completed job per day for `count` days ending today.
pub(super) fn daily_jobs(count: i64) -> Vec<Job> {
    (0..count)
        .map(|days_ago| completed_job(&format!("job-{days_ago:03}"), slot(days_ago)))
        .collect()
}

pub(super) fn review(job: &Job, rating: f64) -> Review {
    Review {
        id: ReviewId(format!("review-{}", job.id)),
        job_id: job.id.clone(),
        cleaner: cleaner(),
        rating,
        created_at: job.service.scheduled_start + Duration::hours(5),
    }
}

pub(super) fn dispute(job: &Job, kind: DisputeKind, status: DisputeStatus) -> Dispute {
    Dispute {
        id: DisputeId(format!("dispute-{}", job.id)),
        job_id: job.id.clone(),
        cleaner: cleaner(),
        filed_by: DisputeParty::Client,
        kind,
        status,
        created_at: job.service.scheduled_start + Duration::hours(5),
    }
}

pub(super) fn history(jobs: Vec<Job>) -> CleanerHistory {
    CleanerHistory {
        jobs,
        ..CleanerHistory::default()
    }
}

pub(super) fn close(actual: f64, expected: f64) -> bool {
    (actual - expected).abs() < 1e-9
}

#[derive(Default)]
pub(super) struct MemoryHistory {
    pub(super) records: Mutex<CleanerHistory>,
    pub(super) failing: Mutex<Option<&'static str>>,
}

impl MemoryHistory {
    pub(super) fn with(history: CleanerHistory) -> Self {
        Self {
            records: Mutex::new(history),
            failing: Mutex::new(None),
        }
    }

    pub(super) fn fail(&self, dataset: &'static str) {
        *self.failing.lock().expect("history mutex poisoned") = Some(dataset);
    }

    pub(super) fn recover(&self) {
        *self.failing.lock().expect("history mutex poisoned") = None;
    }

    fn check(&self, dataset: &'static str) -> Result<(), RepositoryError> {
        match *self.failing.lock().expect("history mutex poisoned") {
            Some(failing) if failing == dataset => {
                Err(RepositoryError::Unavailable(format!("{dataset} table offline")))
            }
            _ => Ok(()),
        }
    }
}

impl HistorySource for MemoryHistory {
    fn jobs_for(
        &self,
        _cleaner: &UserRef,
        _window: &HistoryWindow,
    ) -> Result<Vec<Job>, RepositoryError> {
        self.check("jobs")?;
        Ok(self.records.lock().expect("history mutex poisoned").jobs.clone())
    }

    fn reviews_for(
        &self,
        _cleaner: &UserRef,
        _window: &HistoryWindow,
    ) -> Result<Vec<Review>, RepositoryError> {
        self.check("reviews")?;
        Ok(self
            .records
            .lock()
            .expect("history mutex poisoned")
            .reviews
            .clone())
    }

    fn disputes_for(
        &self,
        _cleaner: &UserRef,
        _window: &HistoryWindow,
    ) -> Result<Vec<Dispute>, RepositoryError> {
        self.check("disputes")?;
        Ok(self
            .records
            .lock()
            .expect("history mutex poisoned")
            .disputes
            .clone())
    }

    fn lifetime_completed_jobs(&self, _cleaner: &UserRef) -> Result<u32, RepositoryError> {
        self.check("lifetime jobs")?;
        Ok(self
            .records
            .lock()
            .expect("history mutex poisoned")
            .lifetime_completed_jobs)
    }
}

#[derive(Default, Clone)]
pub(super) struct MemorySnapshots {
    snapshots: Arc<Mutex<HashMap<UserRef, ReliabilitySnapshot>>>,
    milestones: Arc<Mutex<HashMap<UserRef, BTreeSet<MilestoneKind>>>>,
}

impl SnapshotStore for MemorySnapshots {
    fn latest(&self, cleaner: &UserRef) -> Result<Option<ReliabilitySnapshot>, RepositoryError> {
        Ok(self
            .snapshots
            .lock()
            .expect("snapshot mutex poisoned")
            .get(cleaner)
            .cloned())
    }

    fn publish(&self, snapshot: ReliabilitySnapshot) -> Result<(), RepositoryError> {
        self.snapshots
            .lock()
            .expect("snapshot mutex poisoned")
            .insert(snapshot.cleaner.clone(), snapshot);
        Ok(())
    }
}

impl MilestoneLedger for MemorySnapshots {
    fn recorded(&self, cleaner: &UserRef) -> Result<BTreeSet<MilestoneKind>, RepositoryError> {
        Ok(self
            .milestones
            .lock()
            .expect("ledger mutex poisoned")
            .get(cleaner)
            .cloned()
            .unwrap_or_default())
    }

    fn record(&self, cleaner: &UserRef, kind: MilestoneKind) -> Result<bool, RepositoryError> {
        Ok(self
            .milestones
            .lock()
            .expect("ledger mutex poisoned")
            .entry(cleaner.clone())
            .or_default()
            .insert(kind))
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifications {
    events: Arc<Mutex<Vec<Notification>>>,
}

impl MemoryNotifications {
    pub(super) fn events(&self) -> Vec<Notification> {
        self.events.lock().expect("notification mutex poisoned").clone()
    }
}

impl NotificationSink for MemoryNotifications {
    fn publish(&self, notification: Notification) -> Result<(), PublishError> {
        self.events
            .lock()
            .expect("notification mutex poisoned")
            .push(notification);
        Ok(())
    }
}
