//! Typed workflow events broadcast to any number of listeners.

use serde::Serialize;
use siteinspect_core::error::SiteError;
use siteinspect_core::models::{EdgeClassification, WorkflowStage};
use tokio::sync::broadcast;
use tracing::trace;

pub const DEFAULT_EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// User-facing message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    /// Whether retrying the same action may succeed
    pub retryable: bool,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, message: message.into(), retryable: false }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Warning, message: message.into(), retryable: false }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, message: message.into(), retryable: false }
    }
}

impl From<&SiteError> for Notice {
    fn from(err: &SiteError) -> Self {
        let level = match err {
            SiteError::InsufficientPoints { .. }
            | SiteError::NoBoundary
            | SiteError::EdgesNotSelected
            | SiteError::InvalidGeometry { .. } => NoticeLevel::Warning,
            _ => NoticeLevel::Error,
        };
        Self { level, message: err.to_string(), retryable: err.is_network() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WorkflowEvent {
    BoundaryCreated { area_m2: f64, perimeter_m: f64, edge_count: usize },
    BoundaryCleared,
    BoundaryLockChanged { locked: bool },
    EdgeSelectionChanged { front: Option<usize>, back: Option<usize> },
    SetbacksChanged { classifications: Vec<EdgeClassification> },
    PreviewUpdated { area_m2: f64, coverage_ratio: f64 },
    PreviewCleared,
    BuildableAreaConfirmed { area_m2: f64, coverage_ratio: f64 },
    FootprintUpdated { area_m2: f64 },
    FootprintCleared,
    FootprintLockChanged { locked: bool },
    StageChanged { from: WorkflowStage, to: WorkflowStage },
    /// A blocking operation started or finished
    Busy { operation: String, active: bool },
    Notice(Notice),
}

/// Broadcast channel for [`WorkflowEvent`]s
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<WorkflowEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.sender.subscribe()
    }

    /// Publish an event; having no listeners is fine
    pub fn publish(&self, event: WorkflowEvent) {
        if self.sender.send(event).is_err() {
            trace!("No event listeners");
        }
    }

    pub fn notify(&self, notice: Notice) {
        self.publish(WorkflowEvent::Notice(notice));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_without_listeners() {
        let bus = EventBus::default();
        bus.publish(WorkflowEvent::BoundaryCleared);
    }

    #[tokio::test]
    async fn test_listeners_receive_events() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        bus.publish(WorkflowEvent::BoundaryLockChanged { locked: true });

        assert_eq!(rx.recv().await.unwrap(), WorkflowEvent::BoundaryLockChanged { locked: true });
    }

    #[test]
    fn test_notice_from_error() {
        let notice = Notice::from(&SiteError::Timeout { operation: "save".to_string(), seconds: 10 });
        assert_eq!(notice.level, NoticeLevel::Error);
        assert!(notice.retryable);

        let notice = Notice::from(&SiteError::NoBoundary);
        assert_eq!(notice.level, NoticeLevel::Warning);
        assert!(!notice.retryable);
    }

    #[test]
    fn test_event_serialization() {
        let json = serde_json::to_value(WorkflowEvent::FootprintUpdated { area_m2: 12.5 }).unwrap();
        assert_eq!(json["event"], "footprint_updated");
        assert_eq!(json["area_m2"], 12.5);
    }
}
