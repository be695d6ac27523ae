use chrono::{DateTime, Utc};
use cleanflow::error::AppError;
use cleanflow::workflows::booking::{Job, UserRef};
use cleanflow::workflows::matching::{
    BookingRequest, CleanerProfile, ClientProfile, ClientRelations, MatchContext,
    MatchPreferences,
};
use cleanflow::workflows::reliability::{CleanerHistory, Dispute, Review};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::Path;

/// Input for `cleanflow match`.
#[derive(Debug, Deserialize)]
pub(crate) struct MatchFixture {
    pub(crate) request: BookingRequest,
    pub(crate) pool: Vec<CleanerProfile>,
    #[serde(default)]
    pub(crate) client: Option<ClientProfile>,
    #[serde(default)]
    pub(crate) preferences: MatchPreferences,
    #[serde(default)]
    pub(crate) relations: ClientRelations,
}

impl MatchFixture {
    pub(crate) fn context(&self) -> MatchContext {
        MatchContext {
            client: self
                .client
                .clone()
                .unwrap_or_else(|| ClientProfile::new(self.request.client.clone())),
            preferences: self.preferences.clone(),
            relations: self.relations.clone(),
        }
    }
}

/// Input for `cleanflow reliability`.
#[derive(Debug, Deserialize)]
pub(crate) struct ReliabilityFixture {
    pub(crate) cleaner: UserRef,
    #[serde(default)]
    pub(crate) now: Option<DateTime<Utc>>,
    #[serde(default)]
    pub(crate) jobs: Vec<Job>,
    #[serde(default)]
    pub(crate) reviews: Vec<Review>,
    #[serde(default)]
    pub(crate) disputes: Vec<Dispute>,
    #[serde(default)]
    pub(crate) lifetime_completed_jobs: u32,
}

impl ReliabilityFixture {
    pub(crate) fn history(&self) -> CleanerHistory {
        CleanerHistory {
            jobs: self.jobs.clone(),
            reviews: self.reviews.clone(),
            disputes: self.disputes.clone(),
            lifetime_completed_jobs: self.lifetime_completed_jobs,
        }
    }
}

pub(crate) fn load_fixture<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}
