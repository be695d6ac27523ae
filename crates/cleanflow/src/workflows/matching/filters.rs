use chrono::{Datelike, Timelike};

use super::domain::{BookingRequest, CleanerProfile, ExclusionReason, MatchContext};

/// Hard eligibility. The first failing check is reported; the cleaner is not scored.
pub(crate) fn hard_filter(
    cleaner: &CleanerProfile,
    request: &BookingRequest,
    context: &MatchContext,
) -> Result<(), ExclusionReason> {
    if !cleaner.active {
        return Err(ExclusionReason::Inactive);
    }
    if context.relations.blocked.contains(&cleaner.cleaner) {
        return Err(ExclusionReason::BlockedByClient);
    }
    if context.relations.blocked_by.contains(&cleaner.cleaner) {
        return Err(ExclusionReason::BlockedClient);
    }
    if !is_available(cleaner, request) {
        return Err(ExclusionReason::Unavailable);
    }
    if let Some(required) = request.minimum_tier {
        if cleaner.tier < required {
            return Err(ExclusionReason::BelowMinimumTier {
                required,
                actual: cleaner.tier,
            });
        }
    }
    Ok(())
}

/// Day-of-week lookup, then the booking's whole time range must fit that day's window.
pub(crate) fn is_available(cleaner: &CleanerProfile, request: &BookingRequest) -> bool {
    if cleaner.availability.is_empty() {
        return true;
    }
    let start = request.scheduled_start;
    let Some(window) = cleaner.availability.get(&start.weekday()) else {
        return false;
    };
    let start_minute = start.hour() * 60 + start.minute();
    match start_minute.checked_add(request.duration_minutes) {
        Some(end_minute) => window.covers(start_minute, end_minute),
        None => false,
    }
}
