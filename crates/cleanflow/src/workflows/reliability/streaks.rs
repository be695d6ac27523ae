use std::collections::BTreeSet;

use chrono::NaiveDate;

use super::domain::{Dispute, DisputeStatus, StreakSummary};
use crate::workflows::booking::Job;

/// Days on which at least one finished job had a check-in, was not cancelled by the cleaner,
/// and is not in dispute.
pub(crate) fn successful_days(jobs: &[&Job], disputes: &[&Dispute]) -> BTreeSet<NaiveDate> {
    jobs.iter()
        .filter(|job| job.state.is_work_finished())
        .filter(|job| job.timeline.checked_in_at.is_some())
        .filter(|job| !job.is_cancelled_by_cleaner())
        .filter(|job| !job.is_in_dispute())
        .filter(|job| {
            !disputes
                .iter()
                .any(|dispute| dispute.job_id == job.id && dispute.status == DisputeStatus::Open)
        })
        .map(|job| job.service.scheduled_date())
        .collect()
}

/// Consecutive successful days ending today. A day without success, today included, ends it.
pub(crate) fn current_streak(days: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut streak = 0;
    let mut cursor = Some(today);
    while let Some(day) = cursor.filter(|day| days.contains(day)) {
        streak += 1;
        cursor = day.pred_opt();
    }
    streak
}

pub(crate) fn best_streak(days: &BTreeSet<NaiveDate>) -> u32 {
    let mut best = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;

    for day in days {
        run = match previous {
            Some(prev) if (*day - prev).num_days() == 1 => run + 1,
            _ => 1,
        };
        best = best.max(run);
        previous = Some(*day);
    }
    best
}

pub(crate) fn summarize(days: &BTreeSet<NaiveDate>, today: NaiveDate) -> StreakSummary {
    StreakSummary {
        current_days: current_streak(days, today),
        best_days: best_streak(days),
    }
}
