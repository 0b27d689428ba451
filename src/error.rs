//! Unified error handling for the adsky crate
//!
//! Each module keeps its own error enum; [`Error`] wraps them so callers
//! crossing module boundaries can use a single type.
//!
//! - [`AdskyErrorTrait`] - Common interface implemented by all error types
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors
//!
//! # Usage
//!
//! ```rust,ignore
//! use adsky::error::{AdskyErrorTrait, Error};
//!
//! fn handle_error(err: Error) {
//!     if err.is_recoverable() {
//!         tracing::warn!(category = %err.category(), "Retrying: {err}");
//!     } else {
//!         tracing::error!(category = %err.category(), "Skipping hour: {err}");
//!     }
//! }
//! ```

use std::fmt;
use std::io;
use thiserror::Error;

pub use crate::broadcast::BroadcastError;
pub use crate::distribution::DistributionError;
pub use crate::expression::ExpressionError;
pub use crate::models::AdError;
pub use crate::scheduler::SchedulerError;

/// Common trait for all adsky error types
pub trait AdskyErrorTrait: std::error::Error {
    /// Check if this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Malformed or unevaluable distribution formulas
    Formula,
    /// Invalid ad definitions
    Ad,
    /// Broadcast delivery failures
    Delivery,
    /// Configuration and validation errors
    Config,
    /// File and serialization errors
    Storage,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Short description for the category
    pub fn description(&self) -> &'static str {
        match self {
            Self::Formula => "formula error",
            Self::Ad => "ad error",
            Self::Delivery => "delivery error",
            Self::Config => "configuration error",
            Self::Storage => "storage error",
            Self::Other => "other error",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl AdskyErrorTrait for ExpressionError {
    fn is_recoverable(&self) -> bool {
        false
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Formula
    }
}

impl AdskyErrorTrait for DistributionError {
    fn is_recoverable(&self) -> bool {
        false
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Formula
    }
}

impl AdskyErrorTrait for AdError {
    fn is_recoverable(&self) -> bool {
        false
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Ad
    }
}

impl AdskyErrorTrait for BroadcastError {
    fn is_recoverable(&self) -> bool {
        BroadcastError::is_recoverable(self)
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Delivery
    }
}

impl AdskyErrorTrait for SchedulerError {
    fn is_recoverable(&self) -> bool {
        false
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidHour { .. } => ErrorCategory::Config,
            Self::Distribution(_) => ErrorCategory::Formula,
        }
    }
}

/// Unified error type for the adsky crate
#[derive(Error, Debug)]
pub enum Error {
    /// Expression parsing or evaluation errors
    #[error("Expression error: {0}")]
    Expression(#[from] ExpressionError),

    /// Hourly distribution errors
    #[error("Distribution error: {0}")]
    Distribution(#[from] DistributionError),

    /// Ad validation and replication errors
    #[error("Ad error: {0}")]
    Ad(#[from] AdError),

    /// Delivery errors
    #[error("Broadcast error: {0}")]
    Broadcast(#[from] BroadcastError),

    /// Scheduler errors
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML deserialization errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl AdskyErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Expression(e) => e.is_recoverable(),
            Self::Distribution(e) => e.is_recoverable(),
            Self::Ad(e) => e.is_recoverable(),
            Self::Broadcast(e) => AdskyErrorTrait::is_recoverable(e),
            Self::Scheduler(e) => e.is_recoverable(),
            Self::Io(_) => true, // I/O errors are often transient
            Self::Json(_) | Self::Toml(_) => false,
            Self::Config(_) => false,
            Self::Other { .. } => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Expression(e) => e.category(),
            Self::Distribution(e) => e.category(),
            Self::Ad(e) => e.category(),
            Self::Broadcast(e) => e.category(),
            Self::Scheduler(e) => e.category(),
            Self::Io(_) | Self::Json(_) | Self::Toml(_) => ErrorCategory::Storage,
            Self::Config(_) => ErrorCategory::Config,
            Self::Other { .. } => ErrorCategory::Other,
        }
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a generic error with context
    pub fn other(context: impl Into<String>) -> Self {
        Self::Other {
            context: context.into(),
            source: None,
        }
    }

    /// Create a generic error with context and source
    pub fn with_source(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Other {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }
}

// Conversion from anyhow::Error
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other {
            context: format!("{err:#}"),
            source: None,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
