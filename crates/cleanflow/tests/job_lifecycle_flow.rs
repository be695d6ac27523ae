mod common;

use std::sync::Arc;

use cleanflow::workflows::booking::{
    billable_minutes, final_credits, worked_minutes, CancellationParty, JobEventKind, JobId,
    JobLifecycleService, JobState, LifecycleError, TransitionError, TransitionInput,
    TransitionPolicy,
};
use cleanflow::workflows::collaborators::Notification;
use common::*;

fn lifecycle(
    jobs: &MemoryJobs,
) -> (
    JobLifecycleService<MemoryJobs, MemoryNotifications>,
    Arc<MemoryNotifications>,
) {
    let notifications = Arc::new(MemoryNotifications::default());
    let service = JobLifecycleService::new(
        Arc::new(jobs.clone()),
        notifications.clone(),
        TransitionPolicy::default(),
    );
    (service, notifications)
}

/// Walks a requested job up to a recorded clock-out at 17:00.
fn work_job(service: &JobLifecycleService<MemoryJobs, MemoryNotifications>, id: &JobId) {
    let steps = [
        (
            JobState::Requested,
            JobState::Offered,
            TransitionInput::at(at(8, 5)),
        ),
        (
            JobState::Offered,
            JobState::Assigned,
            TransitionInput::at(at(8, 30)).with_cleaner(cleaner()),
        ),
        (
            JobState::Assigned,
            JobState::EnRoute,
            TransitionInput::at(at(13, 30)),
        ),
        (
            JobState::EnRoute,
            JobState::Arrived,
            TransitionInput::at(at(13, 56)).with_location(near_site()),
        ),
        (
            JobState::Arrived,
            JobState::InProgress,
            TransitionInput::at(at(14, 0)).with_location(SITE),
        ),
    ];
    for (from, to, input) in steps {
        service
            .transition(id, from, to, input)
            .unwrap_or_else(|err| panic!("{from} -> {to} failed: {err}"));
    }
    service
        .clock_out(id, at(17, 0), Some(SITE))
        .expect("clock out recorded");
}

#[test]
fn booking_runs_from_request_to_settlement() {
    let jobs = MemoryJobs::with(vec![requested_job("job-e2e")]);
    let (service, notifications) = lifecycle(&jobs);
    let id = JobId("job-e2e".to_string());

    work_job(&service, &id);
    jobs.update("job-e2e", |job| {
        job.photos.before_count = 3;
        job.photos.after_count = 4;
        job.photos.submitted = true;
    });
    service
        .transition(
            &id,
            JobState::InProgress,
            JobState::AwaitingClientReview,
            TransitionInput::at(at(17, 2)),
        )
        .expect("submitted for review");
    let approved = service
        .transition(
            &id,
            JobState::AwaitingClientReview,
            JobState::CompletedApproved,
            TransitionInput::at(at(18, 0)),
        )
        .expect("approved");

    let job = jobs.get("job-e2e");
    assert_eq!(job, approved.job);
    assert_eq!(job.state, JobState::CompletedApproved);
    assert_eq!(job.assigned_cleaner, Some(cleaner()));
    assert_eq!(worked_minutes(&job), Some(180));
    assert_eq!(billable_minutes(&job), Some(180));
    assert_eq!(job.billing.actual_minutes_worked, Some(180));
    assert_eq!(job.billing.final_credits_charged, Some(120));
    assert_eq!(job.timeline.approved_at, Some(at(18, 0)));
    assert!(approved
        .events
        .iter()
        .any(|event| event.triggers_reliability_recompute()));

    let kinds: Vec<JobEventKind> = notifications
        .delivered()
        .into_iter()
        .map(|notification| match notification {
            Notification::Job(event) => event.kind,
            other => panic!("unexpected result: {other:?}"),
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            JobEventKind::Offered,
            JobEventKind::Accepted { cleaner: cleaner() },
            JobEventKind::EnRoute,
            JobEventKind::CheckedIn,
            JobEventKind::Started,
            JobEventKind::SubmittedForReview {
                billable_minutes: Some(180)
            },
            JobEventKind::Completed {
                final_credits: Some(120)
            },
        ]
    );
}

#[test]
fn contract_cap_limits_billable_minutes() {
    let job = requested_job("job-capped").with_billing_cap(Some(150), None);
    let jobs = MemoryJobs::with(vec![job]);
    let (service, _) = lifecycle(&jobs);
    let id = JobId("job-capped".to_string());

    work_job(&service, &id);
    jobs.update("job-capped", |job| {
        job.photos.before_count = 3;
        job.photos.after_count = 3;
    });
    service
        .transition(
            &id,
            JobState::InProgress,
            JobState::AwaitingClientReview,
            TransitionInput::at(at(17, 2)),
        )
        .expect("submitted for review");
    service
        .transition(
            &id,
            JobState::AwaitingClientReview,
            JobState::CompletedApproved,
            TransitionInput::at(at(18, 0)),
        )
        .expect("approved");

    let job = jobs.get("job-capped");
    assert_eq!(worked_minutes(&job), Some(180));
    assert_eq!(billable_minutes(&job), Some(150));
    assert_eq!(final_credits(&job), Some(100));
    assert_eq!(job.billing.final_credits_charged, Some(100));
}

#[test]
fn review_submission_waits_for_photos() {
    let jobs = MemoryJobs::with(vec![requested_job("job-photos")]);
    let (service, _) = lifecycle(&jobs);
    let id = JobId("job-photos".to_string());
    work_job(&service, &id);

    let report = service
        .check(&id, JobState::AwaitingClientReview, None)
        .expect("job readable");
    assert!(!report.is_allowed());
    assert_eq!(report.failures.len(), 2);

    match service.transition(
        &id,
        JobState::InProgress,
        JobState::AwaitingClientReview,
        TransitionInput::at(at(17, 2)),
    ) {
        Err(LifecycleError::Transition(TransitionError::Rejected { failures, .. })) => {
            assert_eq!(failures, report.failures);
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(jobs.get("job-photos").state, JobState::InProgress);
}

#[test]
fn settled_jobs_stay_settled() {
    let mut job = requested_job("job-settled");
    job.state = JobState::Assigned;
    job.assigned_cleaner = Some(cleaner());
    job.timeline.assigned_at = Some(at(8, 30));
    let jobs = MemoryJobs::with(vec![job]);
    let (service, notifications) = lifecycle(&jobs);
    let id = JobId("job-settled".to_string());

    let cancelled = service
        .transition(
            &id,
            JobState::Assigned,
            JobState::Cancelled,
            TransitionInput::at(at(9, 0)).cancelled_by(CancellationParty::Cleaner),
        )
        .expect("cleaner cancels");
    assert!(cancelled.job.is_cancelled_by_cleaner());
    assert!(cancelled.events[0].triggers_reliability_recompute());

    match service.transition(
        &id,
        JobState::Cancelled,
        JobState::Rescheduled,
        TransitionInput::at(at(9, 5)),
    ) {
        Err(LifecycleError::Transition(TransitionError::Undefined { from, to })) => {
            assert_eq!(from, JobState::Cancelled);
            assert_eq!(to, JobState::Rescheduled);
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(service.clock_out(&id, at(17, 0), None).is_err());
    assert_eq!(notifications.delivered().len(), 1);
}
