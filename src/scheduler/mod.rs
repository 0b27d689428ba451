//! Hourly ad scheduling
//!
//! Combines the distribution formula and ad replication into a plan for a
//! single hour. The module is pure: it never sleeps or spawns timers, and
//! the host decides when to build a plan and when to fire each occurrence.
//!
//! # Flow
//!
//! ```text
//! today's ads ──► drop expired ──► n live ads
//!                                      │
//!                     formula(h, x, n) ▼
//!                               target count
//!                                      │
//!                  date/hour seeded    ▼
//!                      shuffle ──► selected ads
//!                                      │
//!                          multiply()  ▼
//!                            occurrences spread over 3600s
//! ```
//!
//! # Quick Start
//!
//! ```
//! use adsky::config::AdsConfig;
//! use adsky::models::{Ad, AdKind};
//! use adsky::scheduler::HourPlanner;
//! use chrono::Utc;
//!
//! let planner = HourPlanner::from_config(&AdsConfig::default());
//! let ads = vec![Ad::new("skyost", AdKind::Chat, "Hello!").with_interval(2)];
//! let plan = planner.plan(&ads, Utc::now(), 12).unwrap();
//! assert!(plan.occurrences.len() <= 2);
//! ```

pub mod error;
pub mod plan;

pub use error::{SchedulerError, SchedulerResult};
pub use plan::{HourPlan, HourPlanner, ScheduledOccurrence, SECONDS_PER_HOUR};
