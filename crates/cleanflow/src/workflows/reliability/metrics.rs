use chrono::Duration;

use super::config::ReliabilityConfig;
use super::domain::{CleanerHistory, Dispute, DisputeKind, HistoryWindow, ReliabilityMetrics};
use crate::workflows::booking::{Job, UserRef};

/// History restricted to one cleaner and one window.
pub(crate) struct WindowedHistory<'a> {
    pub jobs: Vec<&'a Job>,
    pub ratings: Vec<f64>,
    pub disputes: Vec<&'a Dispute>,
}

pub(crate) fn in_window<'a>(
    history: &'a CleanerHistory,
    cleaner: &UserRef,
    window: &HistoryWindow,
) -> WindowedHistory<'a> {
    let jobs = history
        .jobs
        .iter()
        .filter(|job| job.assigned_cleaner.as_ref() == Some(cleaner))
        .filter(|job| window.contains(job.timeline.created_at))
        .collect();
    let ratings = history
        .reviews
        .iter()
        .filter(|review| &review.cleaner == cleaner && window.contains(review.created_at))
        .map(|review| review.rating)
        .collect();
    let disputes = history
        .disputes
        .iter()
        .filter(|dispute| &dispute.cleaner == cleaner && window.contains(dispute.created_at))
        .collect();

    WindowedHistory {
        jobs,
        ratings,
        disputes,
    }
}

/// Percentage of `numerator / denominator`, or `empty` when nothing was observed.
fn rate(numerator: usize, denominator: usize, empty: f64) -> f64 {
    if denominator == 0 {
        return empty;
    }
    (numerator as f64 / denominator as f64 * 100.0).clamp(0.0, 100.0)
}

/// A job counts as scheduled once the cleaner committed to it and it was due, or when the
/// cleaner cancelled it. Client and admin cancellations never count.
fn is_scheduled(job: &Job, window: &HistoryWindow) -> bool {
    if job.is_cancelled_by_cleaner() {
        return true;
    }
    if job.state.is_work_finished() {
        return true;
    }
    job.state.is_committed() && job.service.scheduled_start < window.end
}

pub(crate) fn compute_metrics(
    windowed: &WindowedHistory<'_>,
    window: &HistoryWindow,
    config: &ReliabilityConfig,
) -> ReliabilityMetrics {
    let scheduled: Vec<&Job> = windowed
        .jobs
        .iter()
        .copied()
        .filter(|job| is_scheduled(job, window))
        .collect();
    let completed: Vec<&Job> = scheduled
        .iter()
        .copied()
        .filter(|job| job.state.is_work_finished())
        .collect();

    let cleaner_cancellations = scheduled
        .iter()
        .filter(|job| job.is_cancelled_by_cleaner())
        .count();

    let grace = Duration::minutes(config.punctuality_grace_minutes);
    let checked_in: Vec<&Job> = completed
        .iter()
        .copied()
        .filter(|job| job.timeline.checked_in_at.is_some())
        .collect();
    let on_time = checked_in
        .iter()
        .filter(|job| {
            job.timeline
                .checked_in_at
                .is_some_and(|at| at <= job.service.scheduled_start + grace)
        })
        .count();

    let confirmed = completed
        .iter()
        .filter(|job| job.timeline.checked_in_at.is_some() && job.timeline.end_at.is_some())
        .count();

    let photo_proven = completed
        .iter()
        .filter(|job| job.photos.submitted && job.photos.total() >= config.photo_proof_min_photos)
        .count();

    let no_shows = windowed
        .disputes
        .iter()
        .filter(|dispute| dispute.is_client_no_show())
        .count();
    let disputes = windowed
        .disputes
        .iter()
        .filter(|dispute| dispute.kind != DisputeKind::Payment)
        .count();

    let average_rating = if windowed.ratings.is_empty() {
        config.neutral_rating
    } else {
        windowed.ratings.iter().sum::<f64>() / windowed.ratings.len() as f64
    };

    ReliabilityMetrics {
        attendance_rate: rate(completed.len(), scheduled.len(), 100.0),
        punctuality_rate: rate(on_time, checked_in.len(), 100.0),
        cancellation_rate: rate(cleaner_cancellations, scheduled.len(), 0.0),
        completion_confirmation_rate: rate(confirmed, completed.len(), 100.0),
        photo_proof_rate: rate(photo_proven, completed.len(), 100.0),
        communication_rate: config.communication_rate,
        average_rating,
        no_show_rate: rate(no_shows, scheduled.len(), 0.0),
        dispute_rate: rate(disputes, completed.len(), 0.0),
        scheduled_jobs: scheduled.len() as u32,
        total_completed_jobs: completed.len() as u32,
        cleaner_cancellations: cleaner_cancellations as u32,
        no_show_count: no_shows as u32,
        dispute_count: disputes as u32,
        review_count: windowed.ratings.len() as u32,
    }
}
