use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};

use crate::geo::GeoPoint;
use crate::workflows::booking::domain::{
    CleaningType, DwellingSize, Job, JobId, JobState, PricingSnapshot, ServiceDescriptor, UserRef,
};
use crate::workflows::booking::repository::JobRepository;
use crate::workflows::booking::{JobLifecycleService, TransitionPolicy};
use crate::workflows::collaborators::{
    Notification, NotificationSink, PublishError, RepositoryError,
};

pub(super) const SITE: GeoPoint = GeoPoint::new(41.5868, -93.6250);

pub(super) fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 4, hour, minute, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn cleaner() -> UserRef {
    UserRef::new("casey@sparkle.example")
}

pub(super) fn service() -> ServiceDescriptor {
    ServiceDescriptor {
        scheduled_start: at(14, 0),
        duration_minutes: 180,
        address: "1200 Grand Ave, Des Moines, IA".to_string(),
        coordinates: Some(SITE),
        cleaning_type: CleaningType::Deep,
        dwelling: DwellingSize {
            bedrooms: 2,
            bathrooms: 1,
            square_feet: Some(950),
        },
        pricing: PricingSnapshot {
            credits_per_hour: 40,
            quoted_credits: 120,
        },
    }
}

pub(super) fn requested_job(id: &str) -> Job {
    Job::new(
        JobId(id.to_string()),
        UserRef::new("jordan@client.example"),
        service(),
        at(9, 0),
    )
}

pub(super) fn assigned_job(id: &str) -> Job {
    let mut job = requested_job(id);
    job.state = JobState::Assigned;
    job.assigned_cleaner = Some(cleaner());
    job.timeline.assigned_at = Some(at(9, 30));
    job
}

pub(super) fn in_progress_job(id: &str) -> Job {
    let mut job = assigned_job(id);
    job.state = JobState::InProgress;
    job.timeline.en_route_at = Some(at(13, 30));
    job.timeline.checked_in_at = Some(at(13, 58));
    job.timeline.start_at = Some(at(14, 0));
    job.checkpoints.check_in = Some(SITE);
    job.checkpoints.start = Some(SITE);
    job
}

/// In-progress job with clock-out recorded and photos in place.
pub(super) fn finished_job(id: &str) -> Job {
    let mut job = in_progress_job(id);
    job.timeline.end_at = Some(at(17, 0));
    job.photos.before_count = 3;
    job.photos.after_count = 4;
    job.photos.submitted = true;
    job
}

pub(super) fn near_site() -> GeoPoint {
    GeoPoint::new(SITE.lat + 0.0005, SITE.lng)
}

pub(super) fn far_from_site() -> GeoPoint {
    GeoPoint::new(SITE.lat + 0.1, SITE.lng)
}

#[derive(Default, Clone)]
pub(super) struct MemoryJobs {
    pub(super) records: Arc<Mutex<HashMap<JobId, Job>>>,
}

impl MemoryJobs {
    pub(super) fn with(jobs: Vec<Job>) -> Self {
        let repository = Self::default();
        {
            let mut guard = repository.records.lock().expect("repository mutex poisoned");
            for job in jobs {
                guard.insert(job.id.clone(), job);
            }
        }
        repository
    }

    pub(super) fn get(&self, id: &str) -> Job {
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .get(&JobId(id.to_string()))
            .cloned()
            .expect("job stored")
    }
}

impl JobRepository for MemoryJobs {
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

/// Lets a competing writer commit between our read and our conditional write.
pub(super) struct RacingJobs {
    pub(super) inner: MemoryJobs,
    pub(super) competitor: Mutex<Option<Job>>,
}

impl JobRepository for RacingJobs {
    fn fetch(&self, id: &JobId) -> Result<Option<Job>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn compare_and_swap(&self, expected: JobState, job: Job) -> Result<(), RepositoryError> {
        if let Some(winner) = self.competitor.lock().expect("mutex poisoned").take() {
            self.inner.compare_and_swap(expected, winner)?;
        }
        self.inner.compare_and_swap(expected, job)
    }
}

pub(super) struct OfflineJobs;

impl JobRepository for OfflineJobs {
    fn fetch(&self, _id: &JobId) -> Result<Option<Job>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn compare_and_swap(&self, _expected: JobState, _job: Job) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
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

pub(super) struct FailingNotifications;

impl NotificationSink for FailingNotifications {
    fn publish(&self, _notification: Notification) -> Result<(), PublishError> {
        Err(PublishError::Transport("smtp down".to_string()))
    }
}

pub(super) fn build_service(
    jobs: Vec<Job>,
) -> (
    JobLifecycleService<MemoryJobs, MemoryNotifications>,
    Arc<MemoryJobs>,
    Arc<MemoryNotifications>,
) {
    let repository = Arc::new(MemoryJobs::with(jobs));
    let notifications = Arc::new(MemoryNotifications::default());
    let service = JobLifecycleService::new(
        repository.clone(),
        notifications.clone(),
        TransitionPolicy::default(),
    );
    (service, repository, notifications)
}
