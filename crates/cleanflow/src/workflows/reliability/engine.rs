use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::config::ReliabilityConfig;
use super::domain::{CleanerHistory, HistoryWindow, ReliabilitySnapshot, Tier};
use super::metrics::{compute_metrics, in_window};
use super::milestones::{pending_milestones, MilestoneEvent, MilestoneKind};
use super::scoring::{composite_score, determine_tier, rounded_score, tier_progress};
use super::streaks::{successful_days, summarize};
use crate::config::PolicyError;
use crate::workflows::booking::UserRef;

/// Stateless engine turning a cleaner's windowed history into a snapshot.
#[derive(Debug, Clone, Default)]
pub struct ReliabilityEngine {
    config: ReliabilityConfig,
}

impl ReliabilityEngine {
    pub fn new(config: ReliabilityConfig) -> Result<Self, PolicyError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ReliabilityConfig {
        &self.config
    }

    /// Window ending at `now` covering the configured number of days.
    pub fn window_ending(&self, now: DateTime<Utc>) -> HistoryWindow {
        HistoryWindow::trailing(now, self.config.window_days)
    }

    /// Full recompute over the window ending at `now`. Records outside the window or belonging
    /// to other cleaners are ignored.
    pub fn compute(
        &self,
        cleaner: &UserRef,
        history: &CleanerHistory,
        now: DateTime<Utc>,
    ) -> ReliabilitySnapshot {
        let window = self.window_ending(now);
        let windowed = in_window(history, cleaner, &window);
        let metrics = compute_metrics(&windowed, &window, &self.config);

        let days = successful_days(&windowed.jobs, &windowed.disputes);
        let streaks = summarize(&days, now.date_naive());

        let raw_score = composite_score(&metrics, &self.config);
        let tier = determine_tier(&metrics, raw_score, &self.config);
        let progress = tier_progress(tier, &metrics, raw_score, &self.config);
        let score = rounded_score(raw_score);
        let lifetime_completed_jobs = history
            .lifetime_completed_jobs
            .max(metrics.total_completed_jobs);

        debug!(
            cleaner = %cleaner,
            score,
            tier = tier.label(),
            completed = metrics.total_completed_jobs,
            lifetime_completed_jobs,
            "reliability computed"
        );

        ReliabilitySnapshot {
            cleaner: cleaner.clone(),
            computed_at: now,
            window,
            metrics,
            lifetime_completed_jobs,
            streaks,
            score,
            tier,
            progress,
        }
    }

    pub fn pending_milestones(
        &self,
        snapshot: &ReliabilitySnapshot,
        recorded: &BTreeSet<MilestoneKind>,
    ) -> Vec<MilestoneEvent> {
        pending_milestones(snapshot, recorded, &self.config.milestones)
    }

    /// Communication sub-score. Fixed until message response latency is tracked.
    pub fn communication_rate(&self) -> f64 {
        self.config.communication_rate
    }

    pub fn payout_rate(&self, tier: Tier) -> f64 {
        self.config.tier_policy.payout_rate(tier)
    }

    pub fn payout_credits(&self, tier: Tier, credits: u32) -> u32 {
        self.config.tier_policy.payout_credits(tier, credits)
    }
}
