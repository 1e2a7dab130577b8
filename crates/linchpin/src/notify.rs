//! Change notifications.
//!
//! After every committed write the dependency service publishes a
//! [`ChangeEvent`]. Delivery is best effort: publishing never fails the
//! write, events carry no ordering guarantee across publishers, and a
//! consumer may see an event more than once. Consumers treat events as a
//! hint to refresh and re-fetch state from the service. A
//! [`broadcast::error::RecvError::Lagged`] on a subscription means events
//! were missed; the same re-fetch recovers.

use crate::config::EngineConfig;
use crate::domain::{DependencyEdge, EdgeId, WorkItemId};
use crate::error::ConfigError;
use serde::Serialize;
use tokio::sync::broadcast;

/// A committed change to the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ChangeEvent {
    /// An edge was created.
    DependencyCreated {
        /// The committed edge
        edge: DependencyEdge,
    },

    /// An edge was deleted.
    DependencyDeleted {
        /// Id of the removed edge
        edge_id: EdgeId,
        /// Dependent side
        from_id: WorkItemId,
        /// Prerequisite side
        to_id: WorkItemId,
    },

    /// A work item was removed and its edges cascaded away.
    WorkItemRemoved {
        /// The removed item
        item_id: WorkItemId,
        /// Edges removed with it
        removed_edges: Vec<EdgeId>,
    },
}

/// Fire-and-forget sink for change events.
pub trait ChangePublisher: Send + Sync {
    /// Publish an event. Must not block and must not fail the caller.
    fn publish(&self, event: ChangeEvent);
}

/// Publisher that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPublisher;

impl ChangePublisher for NoopPublisher {
    fn publish(&self, _event: ChangeEvent) {}
}

/// In-process publish/subscribe over a tokio broadcast channel.
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<ChangeEvent>,
}

impl BroadcastNotifier {
    /// Create a notifier buffering up to `capacity` events per subscriber.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero; [`EngineConfig::validate`](crate::config::EngineConfig::validate)
    /// rejects that value.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Create a notifier sized by [`EngineConfig::notification_capacity`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the config does not validate.
    pub fn from_config(config: &EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config.notification_capacity))
    }

    /// Subscribe to events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl ChangePublisher for BroadcastNotifier {
    fn publish(&self, event: ChangeEvent) {
        if self.sender.send(event).is_err() {
            tracing::trace!("Change event dropped: no subscribers");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::RecvError;

    fn deleted(n: usize) -> ChangeEvent {
        ChangeEvent::DependencyDeleted {
            edge_id: EdgeId::new(format!("dep-{n}")),
            from_id: "b".into(),
            to_id: "a".into(),
        }
    }

    #[tokio::test]
    async fn every_subscriber_receives_events() {
        let notifier = BroadcastNotifier::new(8);
        let mut first = notifier.subscribe();
        let mut second = notifier.subscribe();

        notifier.publish(deleted(1));

        assert_eq!(first.recv().await.unwrap(), deleted(1));
        assert_eq!(second.recv().await.unwrap(), deleted(1));
    }

    #[test]
    fn publishing_without_subscribers_is_silent() {
        let notifier = BroadcastNotifier::new(8);
        notifier.publish(deleted(1));
        assert_eq!(notifier.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn slow_subscriber_sees_lag_signal() {
        let notifier = BroadcastNotifier::new(2);
        let mut receiver = notifier.subscribe();

        for n in 0..5 {
            notifier.publish(deleted(n));
        }

        assert!(matches!(receiver.recv().await, Err(RecvError::Lagged(3))));
        assert_eq!(receiver.recv().await.unwrap(), deleted(3));
    }

    #[test]
    fn zero_capacity_config_is_rejected() {
        let config = EngineConfig {
            notification_capacity: 0,
            ..EngineConfig::default()
        };
        assert!(BroadcastNotifier::from_config(&config).is_err());
    }

    #[test]
    fn events_serialize_with_tag() {
        let json = serde_json::to_value(deleted(7)).unwrap();
        assert_eq!(json["event"], "dependency_deleted");
        assert_eq!(json["edge_id"], "dep-7");
    }
}
