#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};
use cleanflow::geo::GeoPoint;
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
    Review, SnapshotStore, Tier,
};

pub const SITE: GeoPoint = GeoPoint::new(41.5868, -93.6250);

pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 4, hour, minute, 0)
        .single()
        .expect("valid timestamp")
}

pub fn near_site() -> GeoPoint {
    GeoPoint::new(SITE.lat + 0.0005, SITE.lng)
}

pub fn client() -> UserRef {
    UserRef::new("jordan@client.example")
}

pub fn cleaner() -> UserRef {
    UserRef::new("casey@sparkle.example")
}

pub fn requested_job(id: &str) -> Job {
    Job::new(
        JobId(id.to_string()),
        client(),
        ServiceDescriptor {
            scheduled_start: at(14, 0),
            duration_minutes: 180,
            address: "1200 Grand Ave, Des Moines, IA".to_string(),
            coordinates: Some(SITE),
            cleaning_type: CleaningType::Deep,
            dwelling: DwellingSize {
                bedrooms: 2,
                bathrooms: 1,
                square_feet: None,
            },
            pricing: PricingSnapshot {
                credits_per_hour: 40,
                quoted_credits: 120,
            },
        },
        at(8, 0),
    )
}

pub fn profile(email: &str, score: f64, tier: Tier) -> CleanerProfile {
    CleanerProfile {
        cleaner: UserRef::new(email),
        display_name: email.split('@').next().unwrap_or(email).to_string(),
        active: true,
        service_areas: BTreeSet::from(["50309".to_string()]),
        location: None,
        specialty_tags: BTreeSet::new(),
        products: BTreeSet::new(),
        availability: HashMap::new(),
        instant_book: Default::default(),
        reliability_score: score,
        tier,
        average_rating: 4.8,
        acceptance_by_bucket: Default::default(),
    }
}

#[derive(Default, Clone)]
pub struct MemoryJobs {
    records: Arc<Mutex<HashMap<JobId, Job>>>,
}

impl MemoryJobs {
    pub fn with(jobs: Vec<Job>) -> Self {
        let store = Self::default();
        for job in jobs {
            store.insert(job);
        }
        store
    }

    pub fn insert(&self, job: Job) {
        let mut guard = self.records.lock().expect("jobs mutex");
        guard.insert(job.id.clone(), job);
    }

    pub fn get(&self, id: &str) -> Job {
        let guard = self.records.lock().expect("jobs mutex");
        guard
            .get(&JobId(id.to_string()))
            .cloned()
            .expect("job stored")
    }

    pub fn update(&self, id: &str, change: impl FnOnce(&mut Job)) {
        let mut guard = self.records.lock().expect("jobs mutex");
        let job = guard.get_mut(&JobId(id.to_string())).expect("job stored");
        change(job);
    }
}

impl JobRepository for MemoryJobs {
    fn fetch(&self, id: &JobId) -> Result<Option<Job>, RepositoryError> {
        Ok(self.records.lock().expect("jobs mutex").get(id).cloned())
    }

    fn compare_and_swap(&self, expected: JobState, job: Job) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("jobs mutex");
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

impl HistorySource for MemoryJobs {
    fn jobs_for(
        &self,
        cleaner: &UserRef,
        window: &HistoryWindow,
    ) -> Result<Vec<Job>, RepositoryError> {
        let guard = self.records.lock().expect("jobs mutex");
        Ok(guard
            .values()
            .filter(|job| job.assigned_cleaner.as_ref() == Some(cleaner))
            .filter(|job| window.contains(job.timeline.created_at))
            .cloned()
            .collect())
    }

    fn reviews_for(
        &self,
        _cleaner: &UserRef,
        _window: &HistoryWindow,
    ) -> Result<Vec<Review>, RepositoryError> {
        Ok(Vec::new())
    }

    fn disputes_for(
        &self,
        _cleaner: &UserRef,
        _window: &HistoryWindow,
    ) -> Result<Vec<Dispute>, RepositoryError> {
        Ok(Vec::new())
    }

    fn lifetime_completed_jobs(&self, cleaner: &UserRef) -> Result<u32, RepositoryError> {
        let guard = self.records.lock().expect("jobs mutex");
        Ok(guard
            .values()
            .filter(|job| job.assigned_cleaner.as_ref() == Some(cleaner))
            .filter(|job| job.state.is_work_finished())
            .count() as u32)
    }
}

#[derive(Default)]
pub struct MemoryNotifications {
    pub delivered: Mutex<Vec<Notification>>,
}

impl MemoryNotifications {
    pub fn delivered(&self) -> Vec<Notification> {
        self.delivered.lock().expect("notifications mutex").clone()
    }
}

impl NotificationSink for MemoryNotifications {
    fn publish(&self, notification: Notification) -> Result<(), PublishError> {
        self.delivered
            .lock()
            .expect("notifications mutex")
            .push(notification);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemorySnapshots {
    snapshots: Mutex<HashMap<UserRef, ReliabilitySnapshot>>,
    milestones: Mutex<HashMap<UserRef, BTreeSet<MilestoneKind>>>,
}

impl SnapshotStore for MemorySnapshots {
    fn latest(&self, cleaner: &UserRef) -> Result<Option<ReliabilitySnapshot>, RepositoryError> {
        Ok(self
            .snapshots
            .lock()
            .expect("snapshots mutex")
            .get(cleaner)
            .cloned())
    }

    fn publish(&self, snapshot: ReliabilitySnapshot) -> Result<(), RepositoryError> {
        self.snapshots
            .lock()
            .expect("snapshots mutex")
            .insert(snapshot.cleaner.clone(), snapshot);
        Ok(())
    }
}

impl MilestoneLedger for MemorySnapshots {
    fn recorded(&self, cleaner: &UserRef) -> Result<BTreeSet<MilestoneKind>, RepositoryError> {
        Ok(self
            .milestones
            .lock()
            .expect("ledger mutex")
            .get(cleaner)
            .cloned()
            .unwrap_or_default())
    }

    fn record(&self, cleaner: &UserRef, kind: MilestoneKind) -> Result<bool, RepositoryError> {
        Ok(self
            .milestones
            .lock()
            .expect("ledger mutex")
            .entry(cleaner.clone())
            .or_default()
            .insert(kind))
    }
}

#[derive(Default)]
pub struct MemoryPool {
    pub pool: Vec<CleanerProfile>,
    pub relations: ClientRelations,
}

impl MatchDataSource for MemoryPool {
    fn active_cleaners(&self) -> Result<Vec<CleanerProfile>, RepositoryError> {
        Ok(self.pool.clone())
    }

    fn client_profile(&self, _client: &UserRef) -> Result<Option<ClientProfile>, RepositoryError> {
        Ok(None)
    }

    fn preferences(&self, _client: &UserRef) -> Result<Option<MatchPreferences>, RepositoryError> {
        Ok(None)
    }

    fn relations(&self, _client: &UserRef) -> Result<ClientRelations, RepositoryError> {
        Ok(self.relations.clone())
    }
}
