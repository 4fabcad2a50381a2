//! Status vocabularies shared with the backend.
//!
//! Wire names are the `snake_case` variant names, both for serde and for `FromStr`/`Display`.
//! Labels are what the UI shows.

use serde::{Deserialize, Serialize};
use strum::{
	Display, EnumIter, EnumMessage, EnumString, IntoEnumIterator, IntoStaticStr, VariantNames,
};

pub trait Vocabulary:
	Copy + IntoEnumIterator + EnumMessage + VariantNames + Into<&'static str> + 'static
{
	fn wire_name(self) -> &'static str {
		self.into()
	}

	fn label(self) -> &'static str {
		self.get_message().unwrap_or_else(|| self.wire_name())
	}

	/// Every wire name, in declaration order, e.g. for `one_of` fields.
	fn wire_names() -> &'static [&'static str] {
		Self::VARIANTS
	}
}

macro_rules! vocabulary {
	($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
		$(#[$meta])*
		#[derive(
			Debug,
			Clone,
			Copy,
			PartialEq,
			Eq,
			Hash,
			Serialize,
			Deserialize,
			Display,
			EnumString,
			EnumIter,
			EnumMessage,
			IntoStaticStr,
			VariantNames,
		)]
		#[serde(rename_all = "snake_case")]
		#[strum(serialize_all = "snake_case")]
		pub enum $name {
			$(
				#[strum(message = $label)]
				$variant,
			)+
		}

		impl Vocabulary for $name {}
	};
}

vocabulary!(
	OrderStatus {
		Received => "Received",
		InDesign => "In design",
		Proofing => "Proofing",
		InProduction => "In production",
		Ready => "Ready for pickup",
		Delivered => "Delivered",
		Cancelled => "Cancelled",
	}
);

vocabulary!(
	DesignStatus {
		Unassigned => "Unassigned",
		Assigned => "Assigned",
		InProgress => "In progress",
		Submitted => "Submitted for proofing",
		Approved => "Approved",
	}
);

vocabulary!(
	ProofingStatus {
		Pending => "Pending",
		Sent => "Sent to customer",
		Approved => "Approved",
		RevisionRequested => "Revision requested",
		Rejected => "Rejected",
	}
);

vocabulary!(
	ProductionStatus {
		Queued => "Queued",
		Printing => "Printing",
		Finishing => "Finishing",
		OnHold => "On hold",
		Completed => "Completed",
	}
);

impl OrderStatus {
	#[must_use]
	pub const fn is_terminal(self) -> bool {
		matches!(self, Self::Delivered | Self::Cancelled)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn wire_names_and_labels() {
		assert_eq!(OrderStatus::InProduction.wire_name(), "in_production");
		assert_eq!(OrderStatus::InProduction.label(), "In production");
		assert_eq!(
			"revision_requested".parse::<ProofingStatus>().unwrap(),
			ProofingStatus::RevisionRequested
		);
		assert_eq!(
			serde_json::to_value(ProductionStatus::OnHold).unwrap(),
			serde_json::json!("on_hold")
		);
		assert_eq!(
			DesignStatus::wire_names(),
			["unassigned", "assigned", "in_progress", "submitted", "approved"]
		);
	}

	#[test]
	fn terminal_order_statuses() {
		assert!(OrderStatus::Cancelled.is_terminal());
		assert!(!OrderStatus::Ready.is_terminal());
	}
}
