use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// `Fresh → Stale` on invalidation, `Stale → Refetching` on the next read (or right away with
/// eager refetch), then `Refetching → Fresh` on success or back to `Stale` on failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryState {
	Fresh,
	Stale,
	Refetching,
}

/// Snapshot of an entry handed out to readers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CachedEntry {
	pub value: Value,
	pub state: EntryState,
	pub updated_at: DateTime<Utc>,
}

#[derive(Debug)]
pub(crate) struct CacheEntry {
	value: Value,
	state: EntryState,
	updated_at: DateTime<Utc>,
	/// Set when an invalidation lands while a refetch is in flight: the response may predate
	/// the mutation, so the entry must end up stale again.
	invalidated_while_fetching: bool,
}

impl CacheEntry {
	pub(crate) fn fresh(value: Value) -> Self {
		Self {
			value,
			state: EntryState::Fresh,
			updated_at: Utc::now(),
			invalidated_while_fetching: false,
		}
	}

	pub(crate) fn stale(value: Value) -> Self {
		Self {
			state: EntryState::Stale,
			..Self::fresh(value)
		}
	}

	pub(crate) const fn state(&self) -> EntryState {
		self.state
	}

	pub(crate) fn snapshot(&self) -> CachedEntry {
		CachedEntry {
			value: self.value.clone(),
			state: self.state,
			updated_at: self.updated_at,
		}
	}

	/// Returns `false` when the entry was already stale or already flagged, which is what makes
	/// repeated invalidations free.
	pub(crate) fn invalidate(&mut self) -> bool {
		match self.state {
			EntryState::Fresh => {
				self.state = EntryState::Stale;
				true
			}
			EntryState::Stale => false,
			EntryState::Refetching => !std::mem::replace(&mut self.invalidated_while_fetching, true),
		}
	}

	pub(crate) fn begin_refetch(&mut self) -> bool {
		if self.state == EntryState::Stale {
			self.state = EntryState::Refetching;
			true
		} else {
			false
		}
	}

	/// Returns the state the entry landed in, or `None` if the entry wasn't refetching anymore
	/// (a `write` got there first and wins).
	pub(crate) fn complete_refetch(&mut self, value: Value) -> Option<EntryState> {
		if self.state != EntryState::Refetching {
			return None;
		}

		self.value = value;
		self.updated_at = Utc::now();
		self.state = if std::mem::take(&mut self.invalidated_while_fetching) {
			EntryState::Stale
		} else {
			EntryState::Fresh
		};

		Some(self.state)
	}

	pub(crate) fn fail_refetch(&mut self) {
		if self.state == EntryState::Refetching {
			self.state = EntryState::Stale;
			self.invalidated_while_fetching = false;
		}
	}

	pub(crate) fn write(&mut self, value: Value) {
		*self = Self::fresh(value);
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn follows_the_state_machine() {
		let mut entry = CacheEntry::fresh(json!(1));
		assert!(!entry.begin_refetch());

		assert!(entry.invalidate());
		assert!(!entry.invalidate());
		assert_eq!(entry.state(), EntryState::Stale);

		assert!(entry.begin_refetch());
		assert!(!entry.begin_refetch());
		entry.fail_refetch();
		assert_eq!(entry.state(), EntryState::Stale);
		assert_eq!(entry.snapshot().value, json!(1));

		assert!(entry.begin_refetch());
		assert_eq!(entry.complete_refetch(json!(2)), Some(EntryState::Fresh));
		assert_eq!(entry.snapshot().value, json!(2));
	}

	#[test]
	fn invalidation_during_refetch_lands_stale() {
		let mut entry = CacheEntry::fresh(json!(1));
		entry.invalidate();
		entry.begin_refetch();

		assert!(entry.invalidate());
		assert!(!entry.invalidate());
		assert_eq!(entry.complete_refetch(json!(2)), Some(EntryState::Stale));
		assert_eq!(entry.snapshot().value, json!(2));
	}

	#[test]
	fn writes_win_over_in_flight_refetches() {
		let mut entry = CacheEntry::fresh(json!(1));
		entry.invalidate();
		entry.begin_refetch();
		entry.write(json!("written"));

		assert_eq!(entry.complete_refetch(json!("fetched")), None);
		assert_eq!(entry.snapshot().value, json!("written"));
		assert_eq!(entry.state(), EntryState::Fresh);
	}
}
