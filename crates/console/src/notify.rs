//! User-facing notifications.
//!
//! The console raises toasts for login, logout, and every mutation outcome.
//! The data layer only publishes them; whatever renders the UI subscribes.

use tokio::sync::broadcast;
use tracing::{info, warn};

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub description: String,
}

/// Broadcasts notifications to any number of subscribers.
///
/// Publishing never blocks and never fails; with no subscribers the
/// notification is only logged.
#[derive(Debug, Clone)]
pub struct Notifier {
    sender: broadcast::Sender<Notification>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    pub fn notify(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Error => {
                warn!(title = %notification.title, description = %notification.description, "Notification");
            }
            NotificationKind::Success => {
                info!(title = %notification.title, description = %notification.description, "Notification");
            }
        }
        let _ = self.sender.send(notification);
    }

    pub fn success(&self, title: impl Into<String>, description: impl Into<String>) {
        self.notify(Notification {
            kind: NotificationKind::Success,
            title: title.into(),
            description: description.into(),
        });
    }

    pub fn error(&self, title: impl Into<String>, description: impl Into<String>) {
        self.notify(Notification {
            kind: NotificationKind::Error,
            title: title.into(),
            description: description.into(),
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_notifications() {
        let notifier = Notifier::new();
        let mut rx = notifier.subscribe();

        notifier.success("Saved", "Operation completed successfully");

        let received = rx.recv().await.unwrap();
        assert_eq!(received.kind, NotificationKind::Success);
        assert_eq!(received.description, "Operation completed successfully");
    }

    #[test]
    fn test_notify_without_subscribers_is_fine() {
        Notifier::new().error("Error", "An error occurred");
    }
}
