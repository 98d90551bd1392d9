//! Sinks for deployments without an external audit or messaging service.

use crate::access::{AccessEvent, AccessOutcome};
use crate::collaborators::{AccessLogSink, NotificationSink, SinkError};
use lifetag_uuid::ProfileId;
use tokio::sync::mpsc;

/// Writes each access event as a structured `tracing` event at `info`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingAccessLog;

impl AccessLogSink for TracingAccessLog {
    fn record(&self, event: &AccessEvent) -> Result<(), SinkError> {
        match event.outcome {
            AccessOutcome::Granted => tracing::info!(
                profile = %event.profile_id,
                level = %event.level,
                at = %event.timestamp.to_rfc3339(),
                "access granted"
            ),
            AccessOutcome::Denied => tracing::info!(
                profile = %event.profile_id,
                level = %event.level,
                at = %event.timestamp.to_rfc3339(),
                reason = ?event.denial_reason,
                "access denied"
            ),
        }
        Ok(())
    }
}

/// A notification queued for delivery to a profile owner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnerNotification {
    pub profile_id: ProfileId,
    pub event: AccessEvent,
}

/// Hands notifications to a delivery task over an unbounded channel.
///
/// `notify_owner` never waits; it fails only once the receiving side has gone away.
#[derive(Clone, Debug)]
pub struct ChannelNotificationSink {
    tx: mpsc::UnboundedSender<OwnerNotification>,
}

impl ChannelNotificationSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<OwnerNotification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl NotificationSink for ChannelNotificationSink {
    fn notify_owner(&self, profile_id: &ProfileId, event: &AccessEvent) -> Result<(), SinkError> {
        self.tx
            .send(OwnerNotification {
                profile_id: profile_id.clone(),
                event: event.clone(),
            })
            .map_err(|_| SinkError::Unavailable("notification receiver closed".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::AccessLevel;
    use chrono::Utc;

    fn event(profile_id: &ProfileId) -> AccessEvent {
        AccessEvent {
            profile_id: profile_id.clone(),
            level: AccessLevel::Medical,
            timestamp: Utc::now(),
            outcome: AccessOutcome::Granted,
            denial_reason: None,
        }
    }

    #[tokio::test]
    async fn channel_sink_delivers_in_order() {
        let (sink, mut rx) = ChannelNotificationSink::channel();
        let first = ProfileId::new();
        let second = ProfileId::new();

        sink.notify_owner(&first, &event(&first)).unwrap();
        sink.notify_owner(&second, &event(&second)).unwrap();

        assert_eq!(rx.recv().await.unwrap().profile_id, first);
        assert_eq!(rx.recv().await.unwrap().profile_id, second);
    }

    #[test]
    fn channel_sink_fails_once_receiver_dropped() {
        let (sink, rx) = ChannelNotificationSink::channel();
        drop(rx);

        let id = ProfileId::new();
        let err = sink.notify_owner(&id, &event(&id)).expect_err("closed");
        assert!(matches!(err, SinkError::Unavailable(_)));
    }

    #[test]
    fn tracing_log_accepts_events() {
        let id = ProfileId::new();
        assert!(TracingAccessLog.record(&event(&id)).is_ok());
    }
}
