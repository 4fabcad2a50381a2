use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Variant {
	#[default]
	Default,
	Destructive,
}

/// A user-facing toast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
	pub title: String,
	pub description: String,
	pub variant: Variant,
}

impl Notification {
	pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
		Self {
			title: title.into(),
			description: description.into(),
			variant: Variant::Default,
		}
	}

	pub fn destructive(title: impl Into<String>, description: impl Into<String>) -> Self {
		Self {
			variant: Variant::Destructive,
			..Self::new(title, description)
		}
	}
}

/// Fire-and-forget sink for notifications; implementations must not block.
pub trait Notifier: Send + Sync + fmt::Debug {
	fn notify(&self, notification: Notification);
}

/// Writes notifications to the log. Used when no UI is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
	fn notify(&self, Notification { title, description, variant }: Notification) {
		match variant {
			Variant::Default => info!(%title, %description, "notification"),
			Variant::Destructive => warn!(%title, %description, "notification"),
		}
	}
}

/// Hands notifications to the UI layer over an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
	tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
	#[must_use]
	pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
		let (tx, rx) = mpsc::unbounded_channel();
		(Self { tx }, rx)
	}
}

impl Notifier for ChannelNotifier {
	fn notify(&self, notification: Notification) {
		if let Err(mpsc::error::SendError(notification)) = self.tx.send(notification) {
			warn!(?notification, "Notification dropped, the UI side of the channel is closed");
		}
	}
}

#[cfg(test)]
mod tests {
	use tracing_test::traced_test;

	use super::*;

	#[test]
	#[traced_test]
	fn channel_notifier_survives_a_closed_receiver() {
		let (notifier, mut rx) = ChannelNotifier::new();

		notifier.notify(Notification::new("Saved", "Order 12 was updated"));
		assert_eq!(
			rx.try_recv().unwrap(),
			Notification {
				title: "Saved".into(),
				description: "Order 12 was updated".into(),
				variant: Variant::Default,
			}
		);

		drop(rx);
		notifier.notify(Notification::destructive("Validation error", "is required"));
		assert!(logs_contain("Notification dropped"));
	}
}
