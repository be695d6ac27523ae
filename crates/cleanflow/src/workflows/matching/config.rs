use serde::{Deserialize, Serialize};

use crate::config::PolicyError;
use crate::workflows::reliability::Tier;

/// Weights of the aggregate match score. Together they sum to 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchWeights {
    pub distance: f64,
    pub reliability: f64,
    pub rating: f64,
    pub tier: f64,
    pub specialty: f64,
    pub product: f64,
    pub loyalty: f64,
    pub acceptance: f64,
    pub budget: f64,
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            distance: 0.15,
            reliability: 0.20,
            rating: 0.10,
            tier: 0.10,
            specialty: 0.10,
            product: 0.05,
            loyalty: 0.20,
            acceptance: 0.05,
            budget: 0.05,
        }
    }
}

impl MatchWeights {
    pub fn total(&self) -> f64 {
        self.distance
            + self.reliability
            + self.rating
            + self.tier
            + self.specialty
            + self.product
            + self.loyalty
            + self.acceptance
            + self.budget
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierValues {
    pub developing: f64,
    pub semi_pro: f64,
    pub pro: f64,
    pub elite: f64,
    /// Added when the client's preferred tier is at or above the cleaner's.
    pub preferred_bonus: f64,
}

impl Default for TierValues {
    fn default() -> Self {
        Self {
            developing: 0.4,
            semi_pro: 0.6,
            pro: 0.8,
            elite: 1.0,
            preferred_bonus: 0.1,
        }
    }
}

impl TierValues {
    pub fn value_for(&self, tier: Tier) -> f64 {
        match tier {
            Tier::Developing => self.developing,
            Tier::SemiPro => self.semi_pro,
            Tier::Pro => self.pro,
            Tier::Elite => self.elite,
        }
    }
}

/// Loyalty sub-scores, highest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoyaltyValues {
    pub recurring_series: f64,
    pub favorite: f64,
    pub last_booked: f64,
    pub none: f64,
}

impl Default for LoyaltyValues {
    fn default() -> Self {
        Self {
            recurring_series: 1.0,
            favorite: 0.8,
            last_booked: 0.6,
            none: 0.3,
        }
    }
}

/// Coarse geographic fit until real distances are scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceAreaFit {
    pub covered: f64,
    pub not_covered: f64,
    pub unknown: f64,
}

impl Default for ServiceAreaFit {
    fn default() -> Self {
        Self {
            covered: 1.0,
            not_covered: 0.2,
            unknown: 0.5,
        }
    }
}

/// Policy for the matching engine, injected at construction time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingConfig {
    pub weights: MatchWeights,
    pub rating_floor: f64,
    pub rating_ceiling: f64,
    pub tiers: TierValues,
    pub loyalty: LoyaltyValues,
    pub service_area: ServiceAreaFit,
    /// Value used when a component has no signal (no tags requested, no acceptance history).
    pub neutral: f64,
    /// Fixed until client budgets are modeled.
    pub budget_placeholder: f64,
    pub acceptance_bucket_hours: u32,
    pub instant_book_min_reliability: f64,
    pub default_limit: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            weights: MatchWeights::default(),
            rating_floor: 3.0,
            rating_ceiling: 5.0,
            tiers: TierValues::default(),
            loyalty: LoyaltyValues::default(),
            service_area: ServiceAreaFit::default(),
            neutral: 0.5,
            budget_placeholder: 0.5,
            acceptance_bucket_hours: 3,
            instant_book_min_reliability: 0.80,
            default_limit: 5,
        }
    }
}

impl MatchingConfig {
    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit;
        self
    }

    pub fn validate(&self) -> Result<(), PolicyError> {
        let total = self.weights.total();
        if (total - 1.0).abs() > 1e-6 {
            return Err(PolicyError::WeightsDoNotSumToOne { total });
        }
        if self.rating_ceiling <= self.rating_floor {
            return Err(PolicyError::OutOfRange {
                field: "rating_ceiling",
                value: self.rating_ceiling,
            });
        }
        if !(1..=24).contains(&self.acceptance_bucket_hours) {
            return Err(PolicyError::OutOfRange {
                field: "acceptance_bucket_hours",
                value: f64::from(self.acceptance_bucket_hours),
            });
        }
        if !(0.0..=1.0).contains(&self.instant_book_min_reliability) {
            return Err(PolicyError::OutOfRange {
                field: "instant_book_min_reliability",
                value: self.instant_book_min_reliability,
            });
        }
        Ok(())
    }
}
