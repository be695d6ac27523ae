//! Candidate selection for new bookings: hard eligibility filters, weighted soft scoring, and a
//! ranked primary plus fallbacks.

pub mod config;
pub mod domain;
mod engine;
mod filters;
mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use config::{LoyaltyValues, MatchWeights, MatchingConfig, ServiceAreaFit, TierValues};
pub use domain::{
    BookingRequest, CleanerProfile, ClientProfile, ClientRelations, Exclusion, ExclusionReason,
    HourWindow, InstantBookSettings, MatchCandidate, MatchContext, MatchPreferences, MatchResult,
    RecurringSeries, ScoreBreakdown, SeriesId,
};
pub use engine::MatchingEngine;
pub use service::{MatchDataSource, MatchingError, MatchingService};
