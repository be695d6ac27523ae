use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};

use crate::workflows::booking::{CleaningType, UserRef};
use crate::workflows::collaborators::RepositoryError;
use crate::workflows::matching::domain::{
    BookingRequest, CleanerProfile, ClientProfile, ClientRelations, InstantBookSettings,
    MatchContext, MatchPreferences,
};
use crate::workflows::matching::service::MatchDataSource;
use crate::workflows::reliability::{ReliabilitySnapshot, SnapshotStore, Tier};

/// 2026-01-05 is a Monday.
pub(super) fn monday_at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 5, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn client() -> UserRef {
    UserRef::new("jordan@client.example")
}

pub(super) fn request() -> BookingRequest {
    BookingRequest {
        client: client(),
        scheduled_start: monday_at(10),
        duration_minutes: 180,
        cleaning_type: CleaningType::Deep,
        location: None,
        service_area: Some("50309".to_string()),
        recurring_series: None,
        minimum_tier: None,
    }
}

pub(super) fn profile(email: &str) -> CleanerProfile {
    CleanerProfile {
        cleaner: UserRef::new(email),
        display_name: email.split('@').next().unwrap_or(email).to_string(),
        active: true,
        service_areas: BTreeSet::from(["50309".to_string()]),
        location: None,
        specialty_tags: BTreeSet::new(),
        products: BTreeSet::new(),
        availability: HashMap::new(),
        instant_book: InstantBookSettings::default(),
        reliability_score: 90.0,
        tier: Tier::Pro,
        average_rating: 4.8,
        acceptance_by_bucket: BTreeMap::new(),
    }
}

pub(super) fn context() -> MatchContext {
    MatchContext::for_client(client())
}

pub(super) fn tags(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|item| item.to_string()).collect()
}

pub(super) fn close(actual: f64, expected: f64) -> bool {
    (actual - expected).abs() < 1e-9
}

#[derive(Default)]
pub(super) struct MemoryMatchData {
    pub(super) pool: Vec<CleanerProfile>,
    pub(super) clients: HashMap<UserRef, ClientProfile>,
    pub(super) preferences: HashMap<UserRef, MatchPreferences>,
    pub(super) relations: HashMap<UserRef, ClientRelations>,
    pub(super) offline: bool,
}

impl MemoryMatchData {
    fn check(&self) -> Result<(), RepositoryError> {
        if self.offline {
            return Err(RepositoryError::Unavailable("profiles offline".to_string()));
        }
        Ok(())
    }
}

impl MatchDataSource for MemoryMatchData {
    fn active_cleaners(&self) -> Result<Vec<CleanerProfile>, RepositoryError> {
        self.check()?;
        Ok(self.pool.clone())
    }

    fn client_profile(&self, client: &UserRef) -> Result<Option<ClientProfile>, RepositoryError> {
        self.check()?;
        Ok(self.clients.get(client).cloned())
    }

    fn preferences(&self, client: &UserRef) -> Result<Option<MatchPreferences>, RepositoryError> {
        self.check()?;
        Ok(self.preferences.get(client).cloned())
    }

    fn relations(&self, client: &UserRef) -> Result<ClientRelations, RepositoryError> {
        self.check()?;
        Ok(self.relations.get(client).cloned().unwrap_or_default())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemorySnapshots {
    pub(super) snapshots: Arc<Mutex<HashMap<UserRef, ReliabilitySnapshot>>>,
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
