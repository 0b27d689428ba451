//! Ad delivery
//!
//! Ads are plain data; getting an occurrence in front of viewers is the
//! host's job. The host supplies an [`AdDelivery`] implementation with one
//! entry point per [`AdKind`], and [`broadcast`] routes each occurrence to
//! the matching one.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{Ad, AdKind};

/// Result type for delivery operations
pub type BroadcastResult<T> = Result<T, BroadcastError>;

/// Errors that can occur while delivering an ad
#[derive(Debug, thiserror::Error)]
pub enum BroadcastError {
    /// Delivery target temporarily unavailable
    #[error("Delivery target unavailable: {0}")]
    Unavailable(String),

    /// Delivery target refused the ad
    #[error("Ad rejected: {0}")]
    Rejected(String),

    /// Generic error
    #[error("Delivery error: {0}")]
    Other(String),
}

impl BroadcastError {
    /// Check if the delivery may succeed on a later attempt
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Outcome of delivering one occurrence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryStatus {
    /// Whether the ad reached at least one viewer
    pub success: bool,
    /// Delivery implementation that handled the ad
    pub channel: String,
    /// Kind the ad was delivered as
    pub kind: AdKind,
    /// Optional message about the delivery
    pub message: Option<String>,
    /// Timestamp of delivery attempt
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl DeliveryStatus {
    /// Create a successful delivery status
    pub fn success(channel: impl Into<String>, kind: AdKind) -> Self {
        Self {
            success: true,
            channel: channel.into(),
            kind,
            message: None,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Create a failed delivery status
    pub fn failure(channel: impl Into<String>, kind: AdKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            channel: channel.into(),
            kind,
            message: Some(message.into()),
            timestamp: chrono::Utc::now(),
        }
    }

    /// Attach a message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.success { "SUCCESS" } else { "FAILED" };
        write!(f, "[{status}] {} ({})", self.channel, self.kind)?;
        if let Some(msg) = &self.message {
            write!(f, ": {msg}")?;
        }
        Ok(())
    }
}

/// Host-supplied delivery capability
pub trait AdDelivery: Send + Sync {
    /// Name used in logs and delivery statuses
    fn name(&self) -> &str;

    /// Show a title ad as an on-screen overlay
    fn show_title(&self, ad: &Ad) -> BroadcastResult<DeliveryStatus>;

    /// Send a chat ad as a chat line
    fn send_chat(&self, ad: &Ad) -> BroadcastResult<DeliveryStatus>;
}

/// Deliver one occurrence through the capability matching its kind
pub fn broadcast<D: AdDelivery + ?Sized>(ad: &Ad, delivery: &D) -> BroadcastResult<DeliveryStatus> {
    let result = match ad.kind {
        AdKind::Title => delivery.show_title(ad),
        AdKind::Chat => delivery.send_chat(ad),
    };

    match &result {
        Ok(status) => tracing::info!(
            channel = delivery.name(),
            kind = %ad.kind,
            username = %ad.username,
            success = status.success,
            "Ad broadcast"
        ),
        Err(e) => tracing::warn!(
            channel = delivery.name(),
            kind = %ad.kind,
            username = %ad.username,
            error = %e,
            "Ad broadcast failed"
        ),
    }

    result
}

/// Delivery that writes occurrences to the log
///
/// Useful for dry runs: each occurrence is logged once per target world
/// that is not blacklisted.
#[derive(Debug, Clone, Default)]
pub struct TracingDelivery {
    worlds: Vec<String>,
    blacklist: Vec<String>,
}

impl TracingDelivery {
    /// Create a delivery targeting `worlds`, skipping any in `blacklist`
    pub fn new(worlds: Vec<String>, blacklist: Vec<String>) -> Self {
        Self { worlds, blacklist }
    }

    /// Worlds an ad would reach
    pub fn eligible_worlds(&self) -> impl Iterator<Item = &str> {
        self.worlds
            .iter()
            .filter(|w| !self.blacklist.iter().any(|b| b.eq_ignore_ascii_case(w)))
            .map(String::as_str)
    }

    fn deliver(&self, ad: &Ad, rendered: &str) -> DeliveryStatus {
        let mut reached = 0usize;
        for world in self.eligible_worlds() {
            tracing::info!(world, kind = %ad.kind, duration = ad.duration, "{rendered}");
            reached += 1;
        }

        if reached == 0 {
            DeliveryStatus::failure(self.name(), ad.kind, "no eligible world")
        } else {
            DeliveryStatus::success(self.name(), ad.kind)
                .with_message(format!("delivered to {reached} world(s)"))
        }
    }
}

impl AdDelivery for TracingDelivery {
    fn name(&self) -> &str {
        "tracing"
    }

    fn show_title(&self, ad: &Ad) -> BroadcastResult<DeliveryStatus> {
        Ok(self.deliver(ad, &format!("[title] {} | {}", ad.title, ad.message)))
    }

    fn send_chat(&self, ad: &Ad) -> BroadcastResult<DeliveryStatus> {
        Ok(self.deliver(ad, &format!("[chat] {}", ad.message)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<&'static str>>,
    }

    impl AdDelivery for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn show_title(&self, ad: &Ad) -> BroadcastResult<DeliveryStatus> {
            self.calls.lock().unwrap().push("title");
            Ok(DeliveryStatus::success(self.name(), ad.kind))
        }

        fn send_chat(&self, _ad: &Ad) -> BroadcastResult<DeliveryStatus> {
            self.calls.lock().unwrap().push("chat");
            Err(BroadcastError::Unavailable("server restarting".to_string()))
        }
    }

    #[test]
    fn test_dispatch_by_kind() {
        let recorder = Recorder::default();
        let title = Ad::new("a", AdKind::Title, "m").with_title("t");
        let chat = Ad::new("a", AdKind::Chat, "m");

        assert!(broadcast(&title, &recorder).unwrap().success);
        assert!(broadcast(&chat, &recorder).unwrap_err().is_recoverable());
        assert_eq!(*recorder.calls.lock().unwrap(), vec!["title", "chat"]);
    }

    #[test]
    fn test_tracing_delivery_honours_blacklist() {
        let delivery = TracingDelivery::new(
            vec!["world".to_string(), "WorldA".to_string()],
            vec!["worlda".to_string()],
        );
        let worlds: Vec<_> = delivery.eligible_worlds().collect();
        assert_eq!(worlds, vec!["world"]);

        let status = broadcast(&Ad::new("a", AdKind::Chat, "hello"), &delivery).unwrap();
        assert!(status.success);
        assert_eq!(status.message.as_deref(), Some("delivered to 1 world(s)"));
    }

    #[test]
    fn test_tracing_delivery_all_blacklisted() {
        let delivery = TracingDelivery::new(vec!["WorldA".to_string()], vec!["WorldA".to_string()]);
        let status = broadcast(&Ad::new("a", AdKind::Title, "hello"), &delivery).unwrap();
        assert!(!status.success);
        assert!(status.to_string().starts_with("[FAILED] tracing (title)"));
    }
}
