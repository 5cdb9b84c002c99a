use crate::SsdpRecord;
use futures_channel::mpsc::UnboundedReceiver;
use futures_channel::mpsc::UnboundedSender;
use serde::Serialize;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum SsdpEvent {
    /// A datagram that is neither a search nor a notification, typically a search response.
    Discover(SsdpRecord),

    Notify(SsdpRecord),

    Error(String),
}

/// Fans every published [SsdpEvent] out to all subscribers.
#[derive(Default)]
pub struct EventSink {
    subscribers: Mutex<Vec<UnboundedSender<SsdpEvent>>>,
}

impl EventSink {
    pub fn subscribe(&self) -> UnboundedReceiver<SsdpEvent> {
        let (sender, receiver) = futures_channel::mpsc::unbounded();
        crate::lock(&self.subscribers).push(sender);
        receiver
    }

    /// Subscribers whose receiver was dropped are removed.
    pub fn publish(&self, event: SsdpEvent) {
        crate::lock(&self.subscribers).retain(|s| s.unbounded_send(event.clone()).is_ok());
    }

    #[cfg(test)]
    fn subscriber_count(&self) -> usize {
        crate::lock(&self.subscribers).len()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use futures_util::StreamExt;

    #[tokio::test]
    async fn every_subscriber_receives() {
        let sink = EventSink::default();
        let mut first = sink.subscribe();
        let mut second = sink.subscribe();

        // When
        sink.publish(SsdpEvent::Error("boom".into()));

        // Then
        assert_eq!(first.next().await, Some(SsdpEvent::Error("boom".into())));
        assert_eq!(second.next().await, Some(SsdpEvent::Error("boom".into())));
    }

    #[test]
    fn dropped_subscriber_is_pruned() {
        let sink = EventSink::default();
        let kept = sink.subscribe();
        drop(sink.subscribe());

        // When
        sink.publish(SsdpEvent::Error("boom".into()));

        // Then
        assert_eq!(sink.subscriber_count(), 1);
        drop(kept);
    }

    #[test]
    fn serialize_error() {
        let json = serde_json::to_string(&SsdpEvent::Error("boom".into())).unwrap();
        assert_eq!(json, r#"{"event":"error","data":"boom"}"#);
    }
}
