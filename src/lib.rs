//! adsky - Hourly ad distribution and replication engine
//!
//! Decides how many ads to broadcast in each hour of the day, following a
//! configurable curve centred on a preferred hour, and expands every ad into
//! the number of occurrences its interval asks for.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`expression`] - Formula parsing and exact decimal evaluation
//! - [`distribution`] - Per-hour ad counts from a distribution formula
//! - [`models`] - The [`Ad`] record and its replication
//! - [`broadcast`] - Host-supplied delivery capability, dispatched by ad kind
//! - [`scheduler`] - Hour plans combining distribution and replication
//! - [`config`] - Configuration management and settings
//! - [`error`] - Unified error type
//!
//! # Example
//!
//! ```
//! use adsky::distribution::{AdDistributor, DEFAULT_FORMULA};
//! use adsky::models::{Ad, AdKind};
//!
//! let distributor = AdDistributor::with_defaults();
//! let count = distributor
//!     .compute_ads_for_hour(DEFAULT_FORMULA, 12, 12, 100)
//!     .unwrap();
//! assert_eq!(count, 5);
//!
//! let ad = Ad::new("skyost", AdKind::Chat, "Visit our shop!").with_interval(3);
//! assert_eq!(ad.multiply().unwrap().len(), 3);
//! ```

pub mod broadcast;
pub mod config;
pub mod distribution;
pub mod error;
pub mod expression;
pub mod models;
pub mod scheduler;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::broadcast::{broadcast, AdDelivery, DeliveryStatus};
    pub use crate::config::Config;
    pub use crate::distribution::{AdDistributor, DailyDistribution, DEFAULT_FORMULA};
    pub use crate::error::{AdskyErrorTrait, Error, ErrorCategory, Result};
    pub use crate::expression::{Bindings, DecimalEvaluator, ExpressionEvaluator};
    pub use crate::models::{Ad, AdError, AdKind};
    pub use crate::scheduler::{HourPlan, HourPlanner};
}

// Direct re-exports for convenience
pub use models::{Ad, AdKind};
