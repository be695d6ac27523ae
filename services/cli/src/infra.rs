use chrono::{DateTime, Utc};
use cleanflow::error::AppError;
use cleanflow::workflows::booking::{
    CleaningType, DwellingSize, Job, JobId, JobRepository, JobState, PricingSnapshot,
    ServiceDescriptor, UserRef,
};
use cleanflow::workflows::collaborators::{
    Notification, NotificationSink, PublishError, RepositoryError,
};
use cleanflow::workflows::matching::{
    CleanerProfile, ClientProfile, ClientRelations, MatchDataSource, MatchPreferences,
};
use cleanflow::workflows::reliability::{
    Dispute, HistorySource, HistoryWindow, MilestoneKind, MilestoneLedger, ReliabilitySnapshot,
    Review, SnapshotStore,
};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

#[derive(Default, Clone)]
pub(crate) struct InMemoryJobRepository {
    records: Arc<Mutex<HashMap<JobId, Job>>>,
}

impl InMemoryJobRepository {
    pub(crate) fn insert(&self, job: Job) {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.insert(job.id.clone(), job);
    }

    /// Stand-in for the photo upload collaborator incrementing evidence counters.
    pub(crate) fn attach_photos(&self, id: &JobId, before: u32, after: u32) {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if let Some(job) = guard.get_mut(id) {
            job.photos.before_count += before;
            job.photos.after_count += after;
            job.photos.submitted = true;
        }
    }

    pub(crate) fn jobs_for(&self, cleaner: &UserRef) -> Vec<Job> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        guard
            .values()
            .filter(|job| job.assigned_cleaner.as_ref() == Some(cleaner))
            .cloned()
            .collect()
    }
}

impl JobRepository for InMemoryJobRepository {
    fn fetch(&self, id: &JobId) -> Result<Option<Job>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn compare_and_swap(&self, expected: JobState, job: Job) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let stored = guard.get(&job.id).ok_or(RepositoryError::NotFound)?;
        if stored.state != expected {
            return Err(RepositoryError::StaleState {
                expected,
                actual: stored.state,
            });
        }
        guard.insert(job.id.clone(), job);
        Ok(())
    }
}

/// Reliability history backed by the in-memory job store plus reviews and disputes.
#[derive(Clone)]
pub(crate) struct InMemoryHistory {
    jobs: InMemoryJobRepository,
    reviews: Arc<Mutex<Vec<Review>>>,
    disputes: Arc<Mutex<Vec<Dispute>>>,
}

impl InMemoryHistory {
    pub(crate) fn new(jobs: InMemoryJobRepository) -> Self {
        Self {
            jobs,
            reviews: Arc::default(),
            disputes: Arc::default(),
        }
    }

    pub(crate) fn add_review(&self, review: Review) {
        self.reviews.lock().expect("history mutex poisoned").push(review);
    }
}

impl HistorySource for InMemoryHistory {
    fn jobs_for(
        &self,
        cleaner: &UserRef,
        window: &HistoryWindow,
    ) -> Result<Vec<Job>, RepositoryError> {
        Ok(self
            .jobs
            .jobs_for(cleaner)
            .into_iter()
            .filter(|job| window.contains(job.timeline.created_at))
            .collect())
    }

    fn reviews_for(
        &self,
        cleaner: &UserRef,
        window: &HistoryWindow,
    ) -> Result<Vec<Review>, RepositoryError> {
        let guard = self.reviews.lock().expect("history mutex poisoned");
        Ok(guard
            .iter()
            .filter(|review| &review.cleaner == cleaner && window.contains(review.created_at))
            .cloned()
            .collect())
    }

    fn disputes_for(
        &self,
        cleaner: &UserRef,
        window: &HistoryWindow,
    ) -> Result<Vec<Dispute>, RepositoryError> {
        let guard = self.disputes.lock().expect("history mutex poisoned");
        Ok(guard
            .iter()
            .filter(|dispute| &dispute.cleaner == cleaner && window.contains(dispute.created_at))
            .cloned()
            .collect())
    }

    fn lifetime_completed_jobs(&self, cleaner: &UserRef) -> Result<u32, RepositoryError> {
        Ok(self
            .jobs
            .jobs_for(cleaner)
            .iter()
            .filter(|job| job.state.is_work_finished())
            .count() as u32)
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemorySnapshotStore {
    snapshots: Arc<Mutex<HashMap<UserRef, ReliabilitySnapshot>>>,
    milestones: Arc<Mutex<HashMap<UserRef, BTreeSet<MilestoneKind>>>>,
}

impl SnapshotStore for InMemorySnapshotStore {
    fn latest(&self, cleaner: &UserRef) -> Result<Option<ReliabilitySnapshot>, RepositoryError> {
        let guard = self.snapshots.lock().expect("snapshot mutex poisoned");
        Ok(guard.get(cleaner).cloned())
    }

    fn publish(&self, snapshot: ReliabilitySnapshot) -> Result<(), RepositoryError> {
        let mut guard = self.snapshots.lock().expect("snapshot mutex poisoned");
        guard.insert(snapshot.cleaner.clone(), snapshot);
        Ok(())
    }
}

impl MilestoneLedger for InMemorySnapshotStore {
    fn recorded(&self, cleaner: &UserRef) -> Result<BTreeSet<MilestoneKind>, RepositoryError> {
        let guard = self.milestones.lock().expect("ledger mutex poisoned");
        Ok(guard.get(cleaner).cloned().unwrap_or_default())
    }

    fn record(&self, cleaner: &UserRef, kind: MilestoneKind) -> Result<bool, RepositoryError> {
        let mut guard = self.milestones.lock().expect("ledger mutex poisoned");
        Ok(guard.entry(cleaner.clone()).or_default().insert(kind))
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryMatchData {
    pub(crate) pool: Vec<CleanerProfile>,
    pub(crate) relations: HashMap<UserRef, ClientRelations>,
}

impl MatchDataSource for InMemoryMatchData {
    fn active_cleaners(&self) -> Result<Vec<CleanerProfile>, RepositoryError> {
        Ok(self.pool.clone())
    }

    fn client_profile(&self, _client: &UserRef) -> Result<Option<ClientProfile>, RepositoryError> {
        Ok(None)
    }

    fn preferences(&self, _client: &UserRef) -> Result<Option<MatchPreferences>, RepositoryError> {
        Ok(None)
    }

    fn relations(&self, client: &UserRef) -> Result<ClientRelations, RepositoryError> {
        Ok(self.relations.get(client).cloned().unwrap_or_default())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryNotificationSink {
    events: Arc<Mutex<Vec<Notification>>>,
}

impl NotificationSink for InMemoryNotificationSink {
    fn publish(&self, notification: Notification) -> Result<(), PublishError> {
        let mut guard = self.events.lock().expect("notification mutex poisoned");
        guard.push(notification);
        Ok(())
    }
}

impl InMemoryNotificationSink {
    pub(crate) fn events(&self) -> Vec<Notification> {
        self.events.lock().expect("notification mutex poisoned").clone()
    }
}

/// Minimal booking used when only the billing arithmetic matters.
pub(crate) fn adhoc_service(start: DateTime<Utc>) -> ServiceDescriptor {
    ServiceDescriptor {
        scheduled_start: start,
        duration_minutes: 0,
        address: String::new(),
        coordinates: None,
        cleaning_type: CleaningType::Basic,
        dwelling: DwellingSize {
            bedrooms: 0,
            bathrooms: 0,
            square_feet: None,
        },
        pricing: PricingSnapshot {
            credits_per_hour: 0,
            quoted_credits: 0,
        },
    }
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|err| format!("failed to parse '{raw}' as RFC 3339 ({err})"))
}

pub(crate) fn write_json<W: Write, T: Serialize>(out: &mut W, value: &T) -> Result<(), AppError> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    write_json(&mut io::stdout().lock(), value)
}
