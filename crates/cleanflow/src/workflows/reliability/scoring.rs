use super::config::{ReliabilityConfig, TierRequirement};
use super::domain::{ReliabilityMetrics, Tier, TierProgress};

/// Weighted composite in `[0, 100]`. Tier floors are compared against this unrounded value.
///
/// Cancellation, no-show and dispute rates enter as `max(0, 100 - rate * multiplier)`; the
/// rating enters as a percentage of five stars.
pub(crate) fn composite_score(metrics: &ReliabilityMetrics, config: &ReliabilityConfig) -> f64 {
    let weights = &config.weights;
    let penalty = |rate: f64| (100.0 - rate * config.penalty_multiplier).max(0.0);
    let rating = (metrics.average_rating / 5.0 * 100.0).clamp(0.0, 100.0);

    let score = weights.attendance * metrics.attendance_rate
        + weights.punctuality * metrics.punctuality_rate
        + weights.cancellation * penalty(metrics.cancellation_rate)
        + weights.no_show * penalty(metrics.no_show_rate)
        + weights.dispute * penalty(metrics.dispute_rate)
        + weights.photo_proof * metrics.photo_proof_rate
        + weights.communication * metrics.communication_rate
        + weights.rating * rating;

    score.clamp(0.0, 100.0)
}

/// Published form of a score, rounded to one decimal.
pub(crate) fn rounded_score(score: f64) -> f64 {
    (score * 10.0).round() / 10.0
}

fn meets(requirement: &TierRequirement, metrics: &ReliabilityMetrics, score: f64) -> bool {
    metrics.total_completed_jobs >= requirement.min_jobs
        && score >= requirement.min_score
        && requirement
            .max_no_show_rate
            .map_or(true, |max| metrics.no_show_rate < max)
        && requirement
            .max_cancellation_rate
            .map_or(true, |max| metrics.cancellation_rate < max)
        && requirement
            .min_rating
            .map_or(true, |min| metrics.average_rating >= min)
}

/// First requirement met, checked from the highest tier down.
pub(crate) fn determine_tier(
    metrics: &ReliabilityMetrics,
    score: f64,
    config: &ReliabilityConfig,
) -> Tier {
    config
        .tiers
        .iter()
        .find(|requirement| meets(requirement, metrics, score))
        .map(|requirement| requirement.tier)
        .unwrap_or(Tier::Developing)
}

pub(crate) fn tier_progress(
    tier: Tier,
    metrics: &ReliabilityMetrics,
    score: f64,
    config: &ReliabilityConfig,
) -> TierProgress {
    let next = tier.next();
    let requirement = next.and_then(|next| config.requirement_for(next));

    let (jobs_needed, score_needed) = match requirement {
        Some(requirement) => (
            requirement
                .min_jobs
                .saturating_sub(metrics.total_completed_jobs),
            ((requirement.min_score - score).max(0.0) * 10.0).ceil() / 10.0,
        ),
        None => (0, 0.0),
    };

    TierProgress {
        current: tier,
        next,
        jobs_needed,
        score_needed,
    }
}
