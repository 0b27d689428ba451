// Core data structures for adsky

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Result type for ad operations
pub type AdResult<T> = Result<T, AdError>;

/// Errors raised by ad validation and replication
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdError {
    /// Interval must be at least 1
    #[error("Invalid interval {interval} for ad by '{username}': must be at least 1")]
    InvalidInterval { username: String, interval: u32 },

    /// Ads must have an owner
    #[error("Ad username must not be empty")]
    EmptyUsername,

    /// Unknown presentation type on the wire
    #[error("Unknown ad type '{0}'")]
    UnknownKind(String),
}

/// Presentation channel of an ad
///
/// Serialized as the numeric type id used by the ad server (`0` = title, `1` = chat).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum AdKind {
    /// Shown as an on-screen title overlay
    Title,
    /// Sent as a chat line
    Chat,
}

impl AdKind {
    /// Get all kinds
    pub fn all() -> [Self; 2] {
        [Self::Title, Self::Chat]
    }

    /// Numeric type id
    pub fn id(&self) -> u8 {
        match self {
            Self::Title => 0,
            Self::Chat => 1,
        }
    }

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Chat => "chat",
        }
    }
}

impl TryFrom<u8> for AdKind {
    type Error = AdError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        match id {
            0 => Ok(Self::Title),
            1 => Ok(Self::Chat),
            other => Err(AdError::UnknownKind(other.to_string())),
        }
    }
}

impl From<AdKind> for u8 {
    fn from(kind: AdKind) -> Self {
        kind.id()
    }
}

impl FromStr for AdKind {
    type Err = AdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "title" | "0" => Ok(Self::Title),
            "chat" | "1" => Ok(Self::Chat),
            _ => Err(AdError::UnknownKind(s.to_string())),
        }
    }
}

impl fmt::Display for AdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single advertisement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ad {
    /// Owner of the ad
    pub username: String,

    /// Presentation channel
    #[serde(rename = "type")]
    pub kind: AdKind,

    /// Title text, only rendered for title ads
    #[serde(default)]
    pub title: String,

    /// Body text
    pub message: String,

    /// Number of occurrences per broadcast window
    pub interval: u32,

    /// Epoch seconds after which the ad is no longer scheduled
    pub expiration: i64,

    /// Seconds a single occurrence stays visible
    #[serde(default)]
    pub duration: u32,
}

impl Ad {
    /// Create an ad with interval 1, no expiration and no duration
    pub fn new(username: impl Into<String>, kind: AdKind, message: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            kind,
            title: String::new(),
            message: message.into(),
            interval: 1,
            expiration: i64::MAX,
            duration: 0,
        }
    }

    /// Set the title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the interval
    pub fn with_interval(mut self, interval: u32) -> Self {
        self.interval = interval;
        self
    }

    /// Set the expiration (epoch seconds)
    pub fn with_expiration(mut self, expiration: i64) -> Self {
        self.expiration = expiration;
        self
    }

    /// Set the duration (seconds)
    pub fn with_duration(mut self, duration: u32) -> Self {
        self.duration = duration;
        self
    }

    /// Check if this is a title ad
    pub fn is_title(&self) -> bool {
        self.kind == AdKind::Title
    }

    /// Check if this is a chat ad
    pub fn is_chat(&self) -> bool {
        self.kind == AdKind::Chat
    }

    /// Validate the ad's invariants
    pub fn validate(&self) -> AdResult<()> {
        if self.username.trim().is_empty() {
            return Err(AdError::EmptyUsername);
        }
        if self.interval == 0 {
            return Err(self.invalid_interval());
        }
        Ok(())
    }

    /// Expand this ad into `interval` occurrences
    ///
    /// The first element is `self`, moved rather than copied; the rest are
    /// independent clones.
    pub fn multiply(self) -> AdResult<Vec<Ad>> {
        if self.interval == 0 {
            return Err(self.invalid_interval());
        }

        let count = self.interval as usize;
        let mut ads = Vec::with_capacity(count);
        ads.push(self);
        for _ in 1..count {
            let copy = ads[0].clone();
            ads.push(copy);
        }
        Ok(ads)
    }

    fn invalid_interval(&self) -> AdError {
        AdError::InvalidInterval {
            username: self.username.clone(),
            interval: self.interval,
        }
    }
}
