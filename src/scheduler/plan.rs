//! Hourly broadcast plans
//!
//! Turns today's ads into a concrete list of occurrences for one hour:
//! expired ads are dropped, the distribution formula picks how many ads run,
//! a date-seeded shuffle picks which ones, and every pick is expanded by its
//! interval and spread across the hour.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::error::{SchedulerError, SchedulerResult};
use crate::broadcast::{broadcast, AdDelivery, BroadcastResult, DeliveryStatus};
use crate::config::AdsConfig;
use crate::distribution::{AdDistributor, HOURS_PER_DAY};
use crate::expression::{DecimalEvaluator, ExpressionEvaluator};
use crate::models::Ad;

/// Seconds in one hour window
pub const SECONDS_PER_HOUR: u32 = 3600;

/// One ad occurrence placed inside the hour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledOccurrence {
    /// Seconds after the start of the hour
    pub offset_secs: u32,

    /// Occurrence to broadcast
    pub ad: Ad,
}

/// Everything that runs during one hour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourPlan {
    /// Day the plan is for
    pub date: NaiveDate,

    /// Hour of the day (0-23)
    pub hour: u32,

    /// Ads still live at planning time (`n` in the formula)
    pub live_ads: u32,

    /// Ads the formula asked for
    pub target_count: u32,

    /// Ads actually selected
    pub selected_ads: u32,

    /// Occurrences ordered by offset
    pub occurrences: Vec<ScheduledOccurrence>,

    /// Ads dropped during replication, with the reason
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<String>,
}

impl HourPlan {
    fn empty(date: NaiveDate, hour: u32) -> Self {
        Self {
            date,
            hour,
            live_ads: 0,
            target_count: 0,
            selected_ads: 0,
            occurrences: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Check if nothing runs this hour
    pub fn is_empty(&self) -> bool {
        self.occurrences.is_empty()
    }

    /// Broadcast every occurrence in order
    ///
    /// Offsets are informational here; waiting between occurrences is left
    /// to the host's timer.
    pub fn dispatch<D: AdDelivery + ?Sized>(
        &self,
        delivery: &D,
    ) -> Vec<BroadcastResult<DeliveryStatus>> {
        self.occurrences
            .iter()
            .map(|occurrence| broadcast(&occurrence.ad, delivery))
            .collect()
    }
}

/// Builds [`HourPlan`]s from a formula and preferred hour
#[derive(Debug, Clone)]
pub struct HourPlanner<E = DecimalEvaluator> {
    distributor: AdDistributor<E>,
    formula: String,
    preferred_hour: u32,
}

impl HourPlanner<DecimalEvaluator> {
    /// Create a planner from configuration
    pub fn from_config(config: &AdsConfig) -> Self {
        Self::new(
            AdDistributor::with_defaults(),
            config.distribution_function.clone(),
            config.preferred_hour,
        )
    }
}

impl<E: ExpressionEvaluator> HourPlanner<E> {
    /// Create a planner
    pub fn new(distributor: AdDistributor<E>, formula: impl Into<String>, preferred_hour: u32) -> Self {
        Self {
            distributor,
            formula: formula.into(),
            preferred_hour,
        }
    }

    /// Formula in use
    pub fn formula(&self) -> &str {
        &self.formula
    }

    /// Plan `hour` of the day containing `now`
    pub fn plan(&self, ads: &[Ad], now: DateTime<Utc>, hour: u32) -> SchedulerResult<HourPlan> {
        if hour >= HOURS_PER_DAY {
            return Err(SchedulerError::invalid_hour(hour));
        }

        let date = now.date_naive();
        let timestamp = now.timestamp();
        let mut live: Vec<&Ad> = ads.iter().filter(|ad| ad.expiration > timestamp).collect();

        if live.is_empty() {
            tracing::info!(%date, hour, "No live ads to plan");
            return Ok(HourPlan::empty(date, hour));
        }

        let live_ads = u32::try_from(live.len()).unwrap_or(u32::MAX);
        let target_count =
            self.distributor
                .compute_ads_for_hour(&self.formula, self.preferred_hour, hour, live_ads)?;

        let mut rng = ChaCha8Rng::seed_from_u64(selection_seed(date, hour));
        live.shuffle(&mut rng);
        live.truncate(target_count as usize);

        let mut skipped = Vec::new();
        let mut expanded = Vec::with_capacity(live.len());
        for ad in &live {
            match (*ad).clone().multiply() {
                Ok(copies) => expanded.push(copies),
                Err(e) => {
                    tracing::warn!(username = %ad.username, error = %e, "Skipping ad");
                    skipped.push(e.to_string());
                }
            }
        }

        let occurrences = spread(interleave(expanded));

        tracing::info!(
            %date,
            hour,
            live_ads,
            target_count,
            selected = live.len(),
            occurrences = occurrences.len(),
            skipped = skipped.len(),
            "Hour plan built"
        );

        Ok(HourPlan {
            date,
            hour,
            live_ads,
            target_count,
            selected_ads: u32::try_from(live.len()).unwrap_or(u32::MAX),
            occurrences,
            skipped,
        })
    }
}

fn selection_seed(date: NaiveDate, hour: u32) -> u64 {
    // num_days_from_ce() keeps seeds unique per date; it is negative before year 1
    let slot = i64::from(date.num_days_from_ce()) * i64::from(HOURS_PER_DAY) + i64::from(hour);
    slot as u64
}

/// Round-robin over each ad's copies so one ad's occurrences are not bunched
fn interleave(groups: Vec<Vec<Ad>>) -> Vec<Ad> {
    let total = groups.iter().map(Vec::len).sum();
    let mut iters: Vec<_> = groups.into_iter().map(Vec::into_iter).collect();
    let mut out = Vec::with_capacity(total);
    while out.len() < total {
        for iter in iters.iter_mut() {
            if let Some(ad) = iter.next() {
                out.push(ad);
            }
        }
    }
    out
}

fn spread(ads: Vec<Ad>) -> Vec<ScheduledOccurrence> {
    let count = ads.len() as u64;
    ads.into_iter()
        .enumerate()
        .map(|(i, ad)| ScheduledOccurrence {
            offset_secs: (i as u64 * u64::from(SECONDS_PER_HOUR) / count) as u32,
            ad,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AdKind;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 11, 30, 0).unwrap()
    }

    fn ad(name: &str, interval: u32) -> Ad {
        Ad::new(name, AdKind::Chat, format!("{name} message"))
            .with_interval(interval)
            .with_expiration(now().timestamp() + 86_400)
    }

    fn constant_planner(formula: &str) -> HourPlanner {
        HourPlanner::new(AdDistributor::with_defaults(), formula, 12)
    }

    #[test]
    fn test_invalid_hour() {
        let err = constant_planner("1").plan(&[], now(), 24).unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidHour { hour: 24 }));
    }

    #[test]
    fn test_no_live_ads() {
        let expired = ad("old", 1).with_expiration(now().timestamp() - 1);
        let plan = constant_planner("1").plan(&[expired], now(), 12).unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.live_ads, 0);
    }

    #[test]
    fn test_expiration_is_exclusive() {
        let edge = ad("edge", 1).with_expiration(now().timestamp());
        let plan = constant_planner("1").plan(&[edge], now(), 12).unwrap();
        assert_eq!(plan.live_ads, 0);
    }

    #[test]
    fn test_target_caps_selection() {
        let ads: Vec<_> = (0..5).map(|i| ad(&format!("user{i}"), 1)).collect();
        let plan = constant_planner("2").plan(&ads, now(), 12).unwrap();
        assert_eq!(plan.live_ads, 5);
        assert_eq!(plan.target_count, 2);
        assert_eq!(plan.selected_ads, 2);
        assert_eq!(plan.occurrences.len(), 2);
    }

    #[test]
    fn test_target_larger_than_pool() {
        let ads = vec![ad("a", 1), ad("b", 1)];
        let plan = constant_planner("10").plan(&ads, now(), 12).unwrap();
        assert_eq!(plan.selected_ads, 2);
    }

    #[test]
    fn test_occurrences_expand_and_spread() {
        let ads = vec![ad("a", 3), ad("b", 1)];
        let plan = constant_planner("2").plan(&ads, now(), 12).unwrap();
        assert_eq!(plan.occurrences.len(), 4);

        let offsets: Vec<_> = plan.occurrences.iter().map(|o| o.offset_secs).collect();
        assert_eq!(offsets, vec![0, 900, 1800, 2700]);

        // copies of the same ad never sit next to each other while others remain
        let first_two: Vec<_> = plan.occurrences[..2]
            .iter()
            .map(|o| o.ad.username.as_str())
            .collect();
        assert_ne!(first_two[0], first_two[1]);
    }

    #[test]
    fn test_zero_interval_ad_skipped() {
        let ads = vec![ad("broken", 0), ad("ok", 2)];
        let plan = constant_planner("2").plan(&ads, now(), 12).unwrap();
        assert_eq!(plan.skipped.len(), 1);
        assert!(plan.skipped[0].contains("broken"));
        assert_eq!(plan.occurrences.len(), 2);
    }

    #[test]
    fn test_selection_is_deterministic() {
        let ads: Vec<_> = (0..10).map(|i| ad(&format!("user{i}"), 1)).collect();
        let planner = constant_planner("3");
        let first = planner.plan(&ads, now(), 9).unwrap();
        let second = planner.plan(&ads, now(), 9).unwrap();
        assert_eq!(first.occurrences, second.occurrences);
    }

    #[test]
    fn test_selection_seed_before_common_era() {
        let date = NaiveDate::from_ymd_opt(-100, 3, 1).unwrap();
        let seed = selection_seed(date, 5);
        assert_ne!(seed, selection_seed(date, 6));
        assert_ne!(seed, selection_seed(date.succ_opt().unwrap(), 5));
    }

    #[test]
    fn test_plan_before_common_era() {
        let ancient = Utc.with_ymd_and_hms(-50, 1, 1, 0, 0, 0).unwrap();
        let ads = vec![ad("old", 1).with_expiration(ancient.timestamp() + 3_600)];
        let plan = constant_planner("1").plan(&ads, ancient, 0).unwrap();
        assert_eq!(plan.occurrences.len(), 1);
    }

    #[test]
    fn test_formula_error_propagates() {
        let err = constant_planner("(x").plan(&[ad("a", 1)], now(), 12).unwrap_err();
        assert_eq!(err.formula(), Some("(x"));
    }

    #[test]
    fn test_interleave_round_robin() {
        let groups = vec![
            vec![ad("a", 1), ad("a", 1)],
            vec![ad("b", 1)],
        ];
        let names: Vec<_> = interleave(groups)
            .into_iter()
            .map(|a| a.username)
            .collect();
        assert_eq!(names, vec!["a", "b", "a"]);
    }
}
