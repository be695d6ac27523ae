use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Duration, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;
use crate::workflows::booking::{CleaningType, UserRef};
use crate::workflows::reliability::{ReliabilitySnapshot, Tier};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeriesId(pub String);

/// Declared working hours for one weekday, `[start_hour, end_hour]` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl HourWindow {
    pub const fn new(start_hour: u32, end_hour: u32) -> Self {
        Self {
            start_hour,
            end_hour,
        }
    }

    /// True when `[start_minute, end_minute]` (minutes since midnight) lies inside the window.
    pub fn covers(&self, start_minute: u32, end_minute: u32) -> bool {
        match (self.start_hour.checked_mul(60), self.end_hour.checked_mul(60)) {
            (Some(opens), Some(closes)) => start_minute >= opens && end_minute <= closes,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InstantBookSettings {
    pub enabled: bool,
    pub min_lead_hours: u32,
}

/// Matching view of a cleaner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanerProfile {
    pub cleaner: UserRef,
    pub display_name: String,
    pub active: bool,
    #[serde(default)]
    pub service_areas: BTreeSet<String>,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    #[serde(default)]
    pub specialty_tags: BTreeSet<String>,
    #[serde(default)]
    pub products: BTreeSet<String>,
    /// Empty means no schedule was configured; such a cleaner is always available.
    #[serde(default)]
    pub availability: HashMap<Weekday, HourWindow>,
    #[serde(default)]
    pub instant_book: InstantBookSettings,
    pub reliability_score: f64,
    pub tier: Tier,
    pub average_rating: f64,
    /// Historical acceptance rate keyed by three-hour bucket of the day (0 = 00:00-02:59).
    #[serde(default)]
    pub acceptance_by_bucket: BTreeMap<u32, f64>,
}

impl CleanerProfile {
    /// Replace reliability-derived fields with the values from a published snapshot.
    pub fn apply_snapshot(&mut self, snapshot: &ReliabilitySnapshot) {
        self.reliability_score = snapshot.score;
        self.tier = snapshot.tier;
        self.average_rating = snapshot.metrics.average_rating;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientProfile {
    pub client: UserRef,
    #[serde(default)]
    pub specialty_tags: BTreeSet<String>,
    #[serde(default)]
    pub preferred_products: BTreeSet<String>,
}

impl ClientProfile {
    pub fn new(client: UserRef) -> Self {
        Self {
            client,
            specialty_tags: BTreeSet::new(),
            preferred_products: BTreeSet::new(),
        }
    }
}

/// Saved match preferences for a client.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MatchPreferences {
    #[serde(default)]
    pub preferred_tier: Option<Tier>,
    #[serde(default)]
    pub specialty_tags: BTreeSet<String>,
    #[serde(default)]
    pub products: BTreeSet<String>,
}

/// Favorites and block lists between one client and the cleaner pool.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClientRelations {
    #[serde(default)]
    pub favorites: BTreeSet<UserRef>,
    /// Cleaners this client blocked.
    #[serde(default)]
    pub blocked: BTreeSet<UserRef>,
    /// Cleaners who blocked this client.
    #[serde(default)]
    pub blocked_by: BTreeSet<UserRef>,
    #[serde(default)]
    pub last_booked: Option<UserRef>,
}

impl ClientRelations {
    pub fn is_favorite(&self, cleaner: &UserRef) -> bool {
        self.favorites.contains(cleaner)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringSeries {
    pub id: SeriesId,
    pub cleaner: UserRef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub client: UserRef,
    pub scheduled_start: DateTime<Utc>,
    pub duration_minutes: u32,
    pub cleaning_type: CleaningType,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    #[serde(default)]
    pub service_area: Option<String>,
    #[serde(default)]
    pub recurring_series: Option<RecurringSeries>,
    #[serde(default)]
    pub minimum_tier: Option<Tier>,
}

impl BookingRequest {
    pub fn scheduled_end(&self) -> DateTime<Utc> {
        self.scheduled_start + Duration::minutes(i64::from(self.duration_minutes))
    }
}

/// Client-side context loaded once per matching call.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchContext {
    pub client: ClientProfile,
    pub preferences: MatchPreferences,
    pub relations: ClientRelations,
}

impl MatchContext {
    pub fn for_client(client: UserRef) -> Self {
        Self {
            client: ClientProfile::new(client),
            preferences: MatchPreferences::default(),
            relations: ClientRelations::default(),
        }
    }

    pub(crate) fn wanted_tags(&self) -> BTreeSet<&String> {
        self.client
            .specialty_tags
            .iter()
            .chain(self.preferences.specialty_tags.iter())
            .collect()
    }

    pub(crate) fn wanted_products(&self) -> BTreeSet<&String> {
        self.client
            .preferred_products
            .iter()
            .chain(self.preferences.products.iter())
            .collect()
    }
}

/// Why a cleaner was removed before scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    Inactive,
    BlockedByClient,
    BlockedClient,
    Unavailable,
    BelowMinimumTier { required: Tier, actual: Tier },
}

impl ExclusionReason {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Inactive => "cleaner is not active",
            Self::BlockedByClient => "client blocked this cleaner",
            Self::BlockedClient => "cleaner blocked this client",
            Self::Unavailable => "outside declared availability",
            Self::BelowMinimumTier { .. } => "below the requested minimum tier",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exclusion {
    pub cleaner: UserRef,
    pub reason: ExclusionReason,
}

/// Per-component sub-scores, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub distance: f64,
    pub reliability: f64,
    pub rating: f64,
    pub tier: f64,
    pub specialty: f64,
    pub product: f64,
    pub loyalty: f64,
    pub acceptance: f64,
    pub budget: f64,
}

/// Ephemeral pairing of a cleaner with its aggregate score. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub profile: CleanerProfile,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

/// Ranked outcome of one matching call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MatchResult {
    pub primary: Option<MatchCandidate>,
    pub fallbacks: Vec<MatchCandidate>,
    /// Every survivor of the hard filters in rank order, for auditing.
    pub scored: Vec<MatchCandidate>,
    pub excluded: Vec<Exclusion>,
}

impl MatchResult {
    pub fn is_empty(&self) -> bool {
        self.primary.is_none()
    }
}
