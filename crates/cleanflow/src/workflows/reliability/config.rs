use serde::{Deserialize, Serialize};

use super::domain::Tier;
use crate::config::PolicyError;

/// Longest accepted history window, about ten years.
pub const MAX_WINDOW_DAYS: u32 = 3650;

/// Weights of the composite score. Each is a fraction; together they sum to 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub attendance: f64,
    pub punctuality: f64,
    pub cancellation: f64,
    pub no_show: f64,
    pub dispute: f64,
    pub photo_proof: f64,
    pub communication: f64,
    pub rating: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            attendance: 0.20,
            punctuality: 0.15,
            cancellation: 0.10,
            no_show: 0.20,
            dispute: 0.10,
            photo_proof: 0.10,
            communication: 0.10,
            rating: 0.05,
        }
    }
}

impl ScoreWeights {
    pub fn total(&self) -> f64 {
        self.attendance
            + self.punctuality
            + self.cancellation
            + self.no_show
            + self.dispute
            + self.photo_proof
            + self.communication
            + self.rating
    }
}

/// Floors a snapshot must clear to hold `tier`. Rate ceilings are strict (`<`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierRequirement {
    pub tier: Tier,
    pub min_jobs: u32,
    pub min_score: f64,
    pub max_no_show_rate: Option<f64>,
    pub max_cancellation_rate: Option<f64>,
    pub min_rating: Option<f64>,
}

pub(crate) fn default_tier_requirements() -> Vec<TierRequirement> {
    vec![
        TierRequirement {
            tier: Tier::Elite,
            min_jobs: 100,
            min_score: 90.0,
            max_no_show_rate: Some(1.0),
            max_cancellation_rate: Some(3.0),
            min_rating: Some(4.8),
        },
        TierRequirement {
            tier: Tier::Pro,
            min_jobs: 50,
            min_score: 80.0,
            max_no_show_rate: Some(2.0),
            max_cancellation_rate: Some(5.0),
            min_rating: None,
        },
        TierRequirement {
            tier: Tier::SemiPro,
            min_jobs: 10,
            min_score: 70.0,
            max_no_show_rate: None,
            max_cancellation_rate: None,
            min_rating: None,
        },
    ]
}

/// Thresholds for the one-time achievement events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilestoneThresholds {
    pub job_counts: Vec<u32>,
    pub perfect_streak_days: u32,
    pub zero_dispute_min_jobs: u32,
    pub photo_compliance_min_jobs: u32,
}

impl Default for MilestoneThresholds {
    fn default() -> Self {
        Self {
            job_counts: vec![10, 50, 100],
            perfect_streak_days: 30,
            zero_dispute_min_jobs: 20,
            photo_compliance_min_jobs: 20,
        }
    }
}

/// Share of job credits paid out to the cleaner at each tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierPolicy {
    pub developing: f64,
    pub semi_pro: f64,
    pub pro: f64,
    pub elite: f64,
}

impl Default for TierPolicy {
    fn default() -> Self {
        Self {
            developing: 0.80,
            semi_pro: 0.82,
            pro: 0.85,
            elite: 0.88,
        }
    }
}

impl TierPolicy {
    pub fn payout_rate(&self, tier: Tier) -> f64 {
        match tier {
            Tier::Developing => self.developing,
            Tier::SemiPro => self.semi_pro,
            Tier::Pro => self.pro,
            Tier::Elite => self.elite,
        }
    }

    /// Cleaner's share of `credits`, rounded down.
    pub fn payout_credits(&self, tier: Tier, credits: u32) -> u32 {
        (f64::from(credits) * self.payout_rate(tier)).floor() as u32
    }
}

/// Policy for the reliability engine, injected at construction time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReliabilityConfig {
    pub window_days: u32,
    pub punctuality_grace_minutes: i64,
    pub photo_proof_min_photos: u32,
    /// Stand-in until message latency is measured; see `ReliabilityEngine::communication_rate`.
    pub communication_rate: f64,
    pub neutral_rating: f64,
    pub penalty_multiplier: f64,
    pub weights: ScoreWeights,
    pub tiers: Vec<TierRequirement>,
    pub milestones: MilestoneThresholds,
    pub tier_policy: TierPolicy,
}

impl Default for ReliabilityConfig {
    fn default() -> Self {
        Self {
            window_days: 90,
            punctuality_grace_minutes: 10,
            photo_proof_min_photos: 2,
            communication_rate: 85.0,
            neutral_rating: 5.0,
            penalty_multiplier: 2.0,
            weights: ScoreWeights::default(),
            tiers: default_tier_requirements(),
            milestones: MilestoneThresholds::default(),
            tier_policy: TierPolicy::default(),
        }
    }
}

impl ReliabilityConfig {
    pub fn with_window_days(mut self, days: u32) -> Self {
        self.window_days = days;
        self
    }

    pub fn requirement_for(&self, tier: Tier) -> Option<&TierRequirement> {
        self.tiers.iter().find(|requirement| requirement.tier == tier)
    }

    pub fn validate(&self) -> Result<(), PolicyError> {
        let total = self.weights.total();
        if (total - 1.0).abs() > 1e-6 {
            return Err(PolicyError::WeightsDoNotSumToOne { total });
        }
        if !(1..=MAX_WINDOW_DAYS).contains(&self.window_days) {
            return Err(PolicyError::OutOfRange {
                field: "window_days",
                value: f64::from(self.window_days),
            });
        }
        if !(0.0..=100.0).contains(&self.communication_rate) {
            return Err(PolicyError::OutOfRange {
                field: "communication_rate",
                value: self.communication_rate,
            });
        }
        let mut previous: Option<Tier> = None;
        for requirement in &self.tiers {
            if requirement.tier == Tier::Developing
                || previous.is_some_and(|tier| requirement.tier >= tier)
            {
                return Err(PolicyError::TierOrder(requirement.tier.label()));
            }
            previous = Some(requirement.tier);
        }
        Ok(())
    }
}
