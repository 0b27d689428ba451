//! Error types for the scheduler module

use std::fmt;

use crate::distribution::DistributionError;

/// Result type for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Scheduler-specific errors
#[derive(Debug)]
pub enum SchedulerError {
    /// Invalid hour value (must be 0-23)
    InvalidHour { hour: u32 },

    /// The hour's ad count could not be computed
    Distribution(DistributionError),
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidHour { hour } => {
                write!(f, "Invalid hour '{}'. Must be 0-23", hour)
            }
            Self::Distribution(err) => {
                write!(f, "Distribution failed: {}", err)
            }
        }
    }
}

impl std::error::Error for SchedulerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Distribution(err) => Some(err),
            Self::InvalidHour { .. } => None,
        }
    }
}

impl From<DistributionError> for SchedulerError {
    fn from(err: DistributionError) -> Self {
        Self::Distribution(err)
    }
}

impl SchedulerError {
    /// Create an invalid hour error
    pub fn invalid_hour(hour: u32) -> Self {
        Self::InvalidHour { hour }
    }

    /// Formula text involved, if any
    pub fn formula(&self) -> Option<&str> {
        match self {
            Self::Distribution(err) => Some(err.formula()),
            Self::InvalidHour { .. } => None,
        }
    }
}
