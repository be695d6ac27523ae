use crate::infra::{
    parse_timestamp, InMemoryHistory, InMemoryJobRepository, InMemoryMatchData,
    InMemoryNotificationSink, InMemorySnapshotStore,
};
use chrono::{DateTime, Datelike, Duration, TimeZone, Utc, Weekday};
use clap::Args;
use cleanflow::config::AppConfig;
use cleanflow::error::AppError;
use cleanflow::geo::GeoPoint;
use cleanflow::workflows::booking::{
    billable_minutes, worked_minutes, CleaningType, DwellingSize, Job, JobEvent, JobEventKind,
    JobId, JobLifecycleService, JobState, PricingSnapshot, ServiceDescriptor, TransitionInput,
    UserRef,
};
use cleanflow::workflows::collaborators::Notification;
use cleanflow::workflows::matching::{
    BookingRequest, CleanerProfile, ClientRelations, HourWindow, InstantBookSettings,
    MatchCandidate, MatchingService,
};
use cleanflow::workflows::reliability::{ReliabilityService, Review, ReviewId, Tier};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

const SITE: GeoPoint = GeoPoint::new(41.5868, -93.6250);

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Scheduled start of the demo booking (RFC 3339). Defaults to 2026-01-04T14:00:00Z.
    #[arg(long, value_parser = parse_timestamp)]
    pub(crate) start: Option<DateTime<Utc>>,
    /// Stop after the job lifecycle and skip the reliability recompute.
    #[arg(long)]
    pub(crate) skip_reliability: bool,
}

pub(crate) fn run_demo(args: DemoArgs, config: &AppConfig) -> Result<(), AppError> {
    let start = args.start.unwrap_or_else(default_start);
    let client = UserRef::new("jordan@client.example");

    let jobs = InMemoryJobRepository::default();
    let snapshots = InMemorySnapshotStore::default();
    let notifications = InMemoryNotificationSink::default();

    println!("Cleanflow demo");
    println!("Booking: deep clean starting {start}");

    let request = BookingRequest {
        client: client.clone(),
        scheduled_start: start,
        duration_minutes: 180,
        cleaning_type: CleaningType::Deep,
        location: Some(SITE),
        service_area: Some("50309".to_string()),
        recurring_series: None,
        minimum_tier: None,
    };
    let mut relations = ClientRelations::default();
    relations
        .blocked
        .insert(UserRef::new("riley@sparkle.example"));
    let match_data = InMemoryMatchData {
        pool: demo_pool(start.weekday()),
        relations: HashMap::from([(client.clone(), relations)]),
    };

    let matching = MatchingService::new(
        Arc::new(match_data.clone()),
        Arc::new(snapshots.clone()),
        config.engines.matching_config()?,
    )?;
    let result = matching.find_matches(&request, None)?;

    println!("\nMatching");
    let Some(primary) = result.primary.clone() else {
        println!("- No cleaners available, try adjusting filters");
        return Ok(());
    };
    print_candidate("primary", &primary);
    for fallback in &result.fallbacks {
        print_candidate("fallback", fallback);
    }
    for exclusion in &result.excluded {
        println!("  excluded {}: {}", exclusion.cleaner, exclusion.reason.label());
    }
    let instant = matching.instant_book_candidates(&request, &result, start - Duration::days(2));
    println!("  instant-book eligible: {}", instant.len());

    let cleaner = primary.profile.cleaner.clone();
    let job_id = JobId("job-1001".to_string());
    let created_at = start - Duration::days(2);
    jobs.insert(Job::new(
        job_id.clone(),
        client.clone(),
        demo_service(start),
        created_at,
    ));

    let lifecycle = JobLifecycleService::new(
        Arc::new(jobs.clone()),
        Arc::new(notifications.clone()),
        config.engines.transition_policy()?,
    )
    .with_max_attempts(config.engines.transition_attempts);

    println!("\nJob lifecycle");
    let mut committed: Vec<JobEvent> = Vec::new();
    let mut step = |expected: JobState, to: JobState, input: TransitionInput| {
        let outcome = lifecycle.transition(&job_id, expected, to, input)?;
        for event in &outcome.events {
            println!("- {} -> {}: {}", expected, to, describe(&event.kind));
        }
        committed.extend(outcome.events);
        Ok::<Job, AppError>(outcome.job)
    };

    let near_site = GeoPoint::new(SITE.lat + 0.0005, SITE.lng);
    step(
        JobState::Requested,
        JobState::Offered,
        TransitionInput::at(created_at + Duration::minutes(5)),
    )?;
    step(
        JobState::Offered,
        JobState::Assigned,
        TransitionInput::at(created_at + Duration::minutes(20)).with_cleaner(cleaner.clone()),
    )?;
    step(
        JobState::Assigned,
        JobState::EnRoute,
        TransitionInput::at(start - Duration::minutes(30))
            .with_location(GeoPoint::new(41.6005, -93.6091)),
    )?;
    step(
        JobState::EnRoute,
        JobState::Arrived,
        TransitionInput::at(start - Duration::minutes(4)).with_location(near_site),
    )?;
    step(
        JobState::Arrived,
        JobState::InProgress,
        TransitionInput::at(start).with_location(SITE),
    )?;

    let end = start + Duration::minutes(180);
    lifecycle.clock_out(&job_id, end, Some(SITE))?;
    println!("- clocked out at {end}");

    let report = lifecycle.check(&job_id, JobState::AwaitingClientReview, None)?;
    if !report.is_allowed() {
        println!("- review submission blocked:");
        for failure in &report.failures {
            println!("    {failure}");
        }
    }
    jobs.attach_photos(&job_id, 3, 4);
    println!("- 3 before / 4 after photos uploaded");

    step(
        JobState::InProgress,
        JobState::AwaitingClientReview,
        TransitionInput::at(end + Duration::minutes(2)),
    )?;
    let approved_at = end + Duration::hours(1);
    let settled = step(
        JobState::AwaitingClientReview,
        JobState::CompletedApproved,
        TransitionInput::at(approved_at),
    )?;

    println!(
        "  worked {} min | billable {} min | charged {} credits",
        display(worked_minutes(&settled)),
        display(billable_minutes(&settled)),
        display(settled.billing.final_credits_charged),
    );

    if args.skip_reliability {
        return Ok(());
    }

    println!("\nReliability");
    let history = InMemoryHistory::new(jobs.clone());
    history.add_review(Review {
        id: ReviewId("review-1001".to_string()),
        job_id: job_id.clone(),
        cleaner: cleaner.clone(),
        rating: 5.0,
        created_at: approved_at + Duration::minutes(30),
    });
    let reliability = ReliabilityService::new(
        Arc::new(history),
        Arc::new(snapshots.clone()),
        Arc::new(notifications.clone()),
        config.engines.reliability_config()?,
    )?;

    let now = approved_at + Duration::hours(1);
    if committed.iter().any(JobEvent::triggers_reliability_recompute) {
        let outcome = reliability.recompute(&cleaner, now)?;
        let snapshot = &outcome.snapshot;
        println!(
            "- {}: score {:.1} | tier {} | {} completed in {} days",
            cleaner,
            snapshot.score,
            snapshot.tier,
            snapshot.metrics.total_completed_jobs,
            config.engines.reliability_window_days
        );
        if let Some(next) = snapshot.progress.next {
            println!(
                "  next tier {}: {} more jobs, {:.1} more points",
                next, snapshot.progress.jobs_needed, snapshot.progress.score_needed
            );
        }
        for milestone in &outcome.milestones {
            println!("  milestone: {}", milestone.kind.label());
        }
        if let Some(credits) = settled.billing.final_credits_charged {
            println!(
                "  payout at {}: {} of {} credits",
                snapshot.tier,
                reliability.engine().payout_credits(snapshot.tier, credits),
                credits
            );
        }
    }

    let refreshed = matching.find_matches(&request, Some(1))?;
    if let Some(top) = refreshed.primary {
        println!(
            "- next match for this slot: {} (reliability {:.1}, tier {})",
            top.profile.cleaner, top.profile.reliability_score, top.profile.tier
        );
    }

    let delivered = notifications.events();
    let milestones = delivered
        .iter()
        .filter(|event| matches!(event, Notification::Milestone(_)))
        .count();
    println!(
        "\nNotifications queued: {} job events, {} milestones",
        delivered.len() - milestones,
        milestones
    );

    Ok(())
}

fn default_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 4, 14, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

fn demo_service(start: DateTime<Utc>) -> ServiceDescriptor {
    ServiceDescriptor {
        scheduled_start: start,
        duration_minutes: 180,
        address: "1200 Grand Ave, Des Moines, IA".to_string(),
        coordinates: Some(SITE),
        cleaning_type: CleaningType::Deep,
        dwelling: DwellingSize {
            bedrooms: 2,
            bathrooms: 1,
            square_feet: Some(950),
        },
        pricing: PricingSnapshot {
            credits_per_hour: 40,
            quoted_credits: 120,
        },
    }
}

fn demo_pool(booking_day: Weekday) -> Vec<CleanerProfile> {
    let cleaner = |email: &str, name: &str, score: f64, tier: Tier, rating: f64| CleanerProfile {
        cleaner: UserRef::new(email),
        display_name: name.to_string(),
        active: true,
        service_areas: BTreeSet::from(["50309".to_string(), "50312".to_string()]),
        location: None,
        specialty_tags: BTreeSet::from(["deep".to_string()]),
        products: BTreeSet::new(),
        availability: HashMap::new(),
        instant_book: InstantBookSettings::default(),
        reliability_score: score,
        tier,
        average_rating: rating,
        acceptance_by_bucket: BTreeMap::from([(4, 0.9)]),
    };

    let mut casey = cleaner("casey@sparkle.example", "Casey", 88.0, Tier::Pro, 4.9);
    casey.instant_book = InstantBookSettings {
        enabled: true,
        min_lead_hours: 24,
    };
    let riley = cleaner("riley@sparkle.example", "Riley", 97.0, Tier::Elite, 5.0);
    let mut morgan = cleaner("morgan@sparkle.example", "Morgan", 74.0, Tier::SemiPro, 4.4);
    morgan.service_areas = BTreeSet::from(["50317".to_string()]);
    let mut avery = cleaner("avery@sparkle.example", "Avery", 91.0, Tier::Pro, 4.8);
    avery
        .availability
        .insert(booking_day, HourWindow::new(6, 12));

    vec![casey, riley, morgan, avery]
}

fn print_candidate(role: &str, candidate: &MatchCandidate) {
    let b = &candidate.breakdown;
    println!(
        "  {role} {} ({}) score {:.3} [reliability {:.2}, rating {:.2}, tier {:.2}, loyalty {:.2}]",
        candidate.profile.display_name,
        candidate.profile.cleaner,
        candidate.score,
        b.reliability,
        b.rating,
        b.tier,
        b.loyalty
    );
}

fn describe(kind: &JobEventKind) -> String {
    match kind {
        JobEventKind::Offered => "offered to matched cleaners".to_string(),
        JobEventKind::OfferWithdrawn => "offer withdrawn".to_string(),
        JobEventKind::Accepted { cleaner } => format!("accepted by {cleaner}"),
        JobEventKind::EnRoute => "cleaner en route".to_string(),
        JobEventKind::CheckedIn => "checked in on site".to_string(),
        JobEventKind::Started => "work started".to_string(),
        JobEventKind::SubmittedForReview { billable_minutes } => {
            format!("submitted for review ({} billable min)", display(*billable_minutes))
        }
        JobEventKind::Completed { final_credits } => {
            format!("approved, {} credits charged", display(*final_credits))
        }
        JobEventKind::Disputed { raised_by } => format!("disputed ({raised_by:?})"),
        JobEventKind::DisputeResolved { outcome } => format!("dispute resolved as {outcome}"),
        JobEventKind::Cancelled { by } => format!("cancelled ({by:?})"),
        JobEventKind::Rescheduled => "rescheduled".to_string(),
    }
}

fn display(value: Option<u32>) -> String {
    value.map_or_else(|| "n/a".to_string(), |value| value.to_string())
}
