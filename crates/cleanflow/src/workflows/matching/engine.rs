use chrono::{DateTime, Duration, Utc};
use tracing::{debug, trace};

use super::config::MatchingConfig;
use super::domain::{
    BookingRequest, CleanerProfile, Exclusion, MatchCandidate, MatchContext, MatchResult,
};
use super::filters::hard_filter;
use super::scoring::{aggregate, score_candidate};
use crate::config::PolicyError;

/// Stateless ranker over a cleaner pool fetched just before the call.
#[derive(Debug, Clone, Default)]
pub struct MatchingEngine {
    config: MatchingConfig,
}

impl MatchingEngine {
    pub fn new(config: MatchingConfig) -> Result<Self, PolicyError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// Filter, score and rank `pool`, keeping the top `limit` as primary plus fallbacks.
    ///
    /// Candidates with equal scores keep their pool order.
    pub fn rank(
        &self,
        request: &BookingRequest,
        pool: &[CleanerProfile],
        context: &MatchContext,
        limit: usize,
    ) -> MatchResult {
        let mut scored = Vec::new();
        let mut excluded = Vec::new();

        for profile in pool {
            if let Err(reason) = hard_filter(profile, request, context) {
                debug!(
                    cleaner = %profile.cleaner,
                    reason = reason.label(),
                    "cleaner filtered out"
                );
                excluded.push(Exclusion {
                    cleaner: profile.cleaner.clone(),
                    reason,
                });
                continue;
            }

            let breakdown = score_candidate(profile, request, context, &self.config);
            let score = aggregate(&breakdown, &self.config.weights);
            trace!(cleaner = %profile.cleaner, score, "candidate scored");
            scored.push(MatchCandidate {
                profile: profile.clone(),
                score,
                breakdown,
            });
        }

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));

        let mut top = scored.iter().take(limit).cloned();
        let primary = top.next();
        let fallbacks = top.collect();

        MatchResult {
            primary,
            fallbacks,
            scored,
            excluded,
        }
    }

    /// Instant booking is decided separately from ranking.
    pub fn instant_book_eligible(
        &self,
        cleaner: &CleanerProfile,
        request: &BookingRequest,
        now: DateTime<Utc>,
    ) -> bool {
        let settings = cleaner.instant_book;
        if !settings.enabled {
            return false;
        }
        let lead = Duration::hours(i64::from(settings.min_lead_hours));
        request.scheduled_start - now >= lead
            && cleaner.reliability_score / 100.0 >= self.config.instant_book_min_reliability
    }
}
