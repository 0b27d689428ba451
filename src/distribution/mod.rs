//! Hourly ad distribution
//!
//! Decides how many ads run in a given hour by evaluating a distribution
//! formula over three variables:
//!
//! | Variable | Meaning |
//! |----------|---------|
//! | `h` | Preferred hour (distribution peak) |
//! | `x` | Hour being evaluated |
//! | `n` | Number of ads available today |
//!
//! The raw decimal result is rounded up, so `0.1` still yields one ad.
//! Negative results are clamped to zero.

pub mod error;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::expression::{Bindings, DecimalEvaluator, ExpressionEvaluator};

pub use error::{DistributionError, DistributionResult};

/// Default distribution formula: a downward parabola peaking at `h`
pub const DEFAULT_FORMULA: &str = "((-1/n) * (x-h)^2) + log(n)";

/// Default preferred hour
pub const DEFAULT_PREFERRED_HOUR: u32 = 12;

/// Hours in a day
pub const HOURS_PER_DAY: u32 = 24;

/// Inputs of a single hourly evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionRequest {
    /// Hour around which ad volume peaks
    pub preferred_hour: u32,

    /// Hour being evaluated
    pub hour: u32,

    /// Ads available today
    pub total_ads: u32,
}

impl DistributionRequest {
    /// Create a new request
    pub fn new(preferred_hour: u32, hour: u32, total_ads: u32) -> Self {
        Self {
            preferred_hour,
            hour,
            total_ads,
        }
    }

    /// Variable bindings for this request (`h`, `x`, `n`)
    pub fn bindings(&self) -> Bindings {
        Bindings::new()
            .with("h", Decimal::from(self.preferred_hour))
            .with("x", Decimal::from(self.hour))
            .with("n", Decimal::from(self.total_ads))
    }
}

/// Round a raw formula result up to an ad count
///
/// Returns `None` when the ceiling does not fit a `u32`. Zero and negative
/// values map to `0`.
pub fn ceil_to_count(raw: Decimal) -> Option<u32> {
    if raw <= Decimal::ZERO {
        return Some(0);
    }
    raw.ceil().to_u32()
}

/// Computes per-hour ad counts from a distribution formula
#[derive(Debug, Clone, Default)]
pub struct AdDistributor<E = DecimalEvaluator> {
    evaluator: E,
}

impl AdDistributor<DecimalEvaluator> {
    /// Create a distributor backed by the bundled decimal evaluator
    pub fn with_defaults() -> Self {
        Self::new(DecimalEvaluator::new())
    }
}

impl<E: ExpressionEvaluator> AdDistributor<E> {
    /// Create a distributor using the given evaluator
    pub fn new(evaluator: E) -> Self {
        Self { evaluator }
    }

    /// Get the underlying evaluator
    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    /// Number of ads to broadcast at `hour`
    ///
    /// Hours are not range checked; whatever is passed gets bound.
    /// `total_ads` must be positive.
    pub fn compute_ads_for_hour(
        &self,
        formula: &str,
        preferred_hour: u32,
        hour: u32,
        total_ads: u32,
    ) -> DistributionResult<u32> {
        self.compute(
            formula,
            &DistributionRequest::new(preferred_hour, hour, total_ads),
        )
    }

    /// Same as [`compute_ads_for_hour`](Self::compute_ads_for_hour) with a request bundle
    pub fn compute(&self, formula: &str, request: &DistributionRequest) -> DistributionResult<u32> {
        if request.total_ads == 0 {
            return Err(DistributionError::domain(
                formula,
                "total ads available today must be positive",
            ));
        }

        let raw = self
            .evaluator
            .evaluate(formula, &request.bindings())
            .map_err(|e| DistributionError::from_expression(formula, e))?;

        let count = ceil_to_count(raw).ok_or_else(|| DistributionError::CountOutOfRange {
            formula: formula.to_string(),
            value: raw,
        })?;

        if raw.is_sign_negative() && !raw.is_zero() {
            tracing::warn!(
                hour = request.hour,
                raw = %raw,
                "Negative distribution result clamped to zero"
            );
        }

        tracing::debug!(
            preferred_hour = request.preferred_hour,
            hour = request.hour,
            total_ads = request.total_ads,
            raw = %raw,
            count,
            "Evaluated distribution formula"
        );

        Ok(count)
    }

    /// Evaluate every hour of the day
    pub fn daily_distribution(
        &self,
        formula: &str,
        preferred_hour: u32,
        total_ads: u32,
    ) -> DistributionResult<DailyDistribution> {
        let counts = (0..HOURS_PER_DAY)
            .map(|hour| self.compute_ads_for_hour(formula, preferred_hour, hour, total_ads))
            .collect::<DistributionResult<Vec<_>>>()?;

        Ok(DailyDistribution {
            formula: formula.to_string(),
            preferred_hour,
            total_ads,
            counts,
        })
    }
}

/// Ad counts for all 24 hours of a day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyDistribution {
    /// Formula the counts were computed with
    pub formula: String,

    /// Preferred hour used
    pub preferred_hour: u32,

    /// Ads available that day
    pub total_ads: u32,

    /// Count per hour, indexed by hour
    pub counts: Vec<u32>,
}

impl DailyDistribution {
    /// Count for a specific hour
    pub fn count_at(&self, hour: u32) -> Option<u32> {
        self.counts.get(hour as usize).copied()
    }

    /// Highest hourly count
    pub fn max_count(&self) -> u32 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// All hours sharing the highest count
    pub fn peak_hours(&self) -> Vec<u32> {
        let max = self.max_count();
        (0..HOURS_PER_DAY)
            .zip(&self.counts)
            .filter(|(_, count)| **count == max)
            .map(|(hour, _)| hour)
            .collect()
    }

    /// Sum over all hours
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| u64::from(c)).sum()
    }

    /// Iterate `(hour, count)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (0..HOURS_PER_DAY).zip(self.counts.iter().copied())
    }
}
