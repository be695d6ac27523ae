//! Derived time and billing figures. Every function is pure and returns `None` instead of a
//! silent zero when the inputs cannot support a charge.

use super::domain::Job;

/// Whole minutes between `start_at` and `end_at`, or `None` when either timestamp is missing or
/// the duration is not positive.
pub fn worked_minutes(job: &Job) -> Option<u32> {
    let start = job.timeline.start_at?;
    let end = job.timeline.end_at?;

    let minutes = (end - start).num_minutes();
    if minutes <= 0 {
        return None;
    }
    u32::try_from(minutes).ok()
}

/// Worked minutes limited by the contract cap when one exists.
pub fn billable_minutes(job: &Job) -> Option<u32> {
    let worked = worked_minutes(job)?;
    Some(match job.billing.max_billable_minutes {
        Some(cap) => worked.min(cap),
        None => worked,
    })
}

/// Credits owed for the billable minutes at the frozen hourly rate, rounded half-up and capped
/// at `max_billable_credits`.
pub fn final_credits(job: &Job) -> Option<u32> {
    let billable = u64::from(billable_minutes(job)?);
    let rate = u64::from(job.service.pricing.credits_per_hour);

    let credits = (billable * rate + 30) / 60;
    let credits = u32::try_from(credits).unwrap_or(u32::MAX);

    Some(match job.billing.max_billable_credits {
        Some(cap) => credits.min(cap),
        None => credits,
    })
}
