use std::collections::BTreeSet;

use chrono::Timelike;

use super::config::{MatchWeights, MatchingConfig};
use super::domain::{BookingRequest, CleanerProfile, MatchContext, ScoreBreakdown};

pub(crate) fn score_candidate(
    cleaner: &CleanerProfile,
    request: &BookingRequest,
    context: &MatchContext,
    config: &MatchingConfig,
) -> ScoreBreakdown {
    ScoreBreakdown {
        distance: distance_fit(cleaner, request, config),
        reliability: (cleaner.reliability_score / 100.0).clamp(0.0, 1.0),
        rating: rating_fit(cleaner.average_rating, config),
        tier: tier_fit(cleaner, context, config),
        specialty: overlap(&cleaner.specialty_tags, &context.wanted_tags(), config.neutral),
        product: overlap(&cleaner.products, &context.wanted_products(), config.neutral),
        loyalty: loyalty_fit(cleaner, request, context, config),
        acceptance: acceptance_fit(cleaner, request, config),
        budget: config.budget_placeholder,
    }
}

pub(crate) fn aggregate(breakdown: &ScoreBreakdown, weights: &MatchWeights) -> f64 {
    weights.distance * breakdown.distance
        + weights.reliability * breakdown.reliability
        + weights.rating * breakdown.rating
        + weights.tier * breakdown.tier
        + weights.specialty * breakdown.specialty
        + weights.product * breakdown.product
        + weights.loyalty * breakdown.loyalty
        + weights.acceptance * breakdown.acceptance
        + weights.budget * breakdown.budget
}

// TODO: replace with true geodistance scoring
fn distance_fit(
    cleaner: &CleanerProfile,
    request: &BookingRequest,
    config: &MatchingConfig,
) -> f64 {
    let fit = &config.service_area;
    match &request.service_area {
        Some(area) if cleaner.service_areas.contains(area) => fit.covered,
        Some(_) => fit.not_covered,
        None => fit.unknown,
    }
}

/// Linear map of the rating range onto `[0, 1]`.
pub(crate) fn rating_fit(rating: f64, config: &MatchingConfig) -> f64 {
    let span = config.rating_ceiling - config.rating_floor;
    ((rating - config.rating_floor) / span).clamp(0.0, 1.0)
}

fn tier_fit(cleaner: &CleanerProfile, context: &MatchContext, config: &MatchingConfig) -> f64 {
    let base = config.tiers.value_for(cleaner.tier);
    let bonus = match context.preferences.preferred_tier {
        Some(preferred) if preferred >= cleaner.tier => config.tiers.preferred_bonus,
        _ => 0.0,
    };
    (base + bonus).clamp(0.0, 1.0)
}

/// Share of the wanted items the cleaner offers, or `neutral` when nothing is wanted.
fn overlap(offered: &BTreeSet<String>, wanted: &BTreeSet<&String>, neutral: f64) -> f64 {
    if wanted.is_empty() {
        return neutral;
    }
    let matched = wanted.iter().filter(|item| offered.contains(**item)).count();
    matched as f64 / wanted.len() as f64
}

fn loyalty_fit(
    cleaner: &CleanerProfile,
    request: &BookingRequest,
    context: &MatchContext,
    config: &MatchingConfig,
) -> f64 {
    let values = &config.loyalty;
    let recurring = request
        .recurring_series
        .as_ref()
        .is_some_and(|series| series.cleaner == cleaner.cleaner);

    if recurring {
        values.recurring_series
    } else if context.relations.is_favorite(&cleaner.cleaner) {
        values.favorite
    } else if context.relations.last_booked.as_ref() == Some(&cleaner.cleaner) {
        values.last_booked
    } else {
        values.none
    }
}

fn acceptance_fit(
    cleaner: &CleanerProfile,
    request: &BookingRequest,
    config: &MatchingConfig,
) -> f64 {
    let bucket = request.scheduled_start.hour() / config.acceptance_bucket_hours.max(1);
    cleaner
        .acceptance_by_bucket
        .get(&bucket)
        .map(|rate| rate.clamp(0.0, 1.0))
        .unwrap_or(config.neutral)
}
