use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{broadcast, watch, RwLock};
use tracing::{debug, trace, warn};

use super::{
	entry::CacheEntry, CachedEntry, EntryState, Error, FetchError, KeyPrefix, ResourceKey,
	SharedFetchError,
};

const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Loads the backend value behind a key. The cache calls it on misses and refetches.
#[async_trait]
pub trait QueryFetcher: Send + Sync + 'static {
	async fn fetch(&self, key: &ResourceKey) -> Result<Value, FetchError>;
}

/// What happens to entries right after they are invalidated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefetchMode {
	/// Stay stale until someone reads them.
	#[default]
	OnNextRead,
	/// Start refetching in the background right away.
	Eager,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum CacheEvent {
	Loaded(ResourceKey),
	Written(ResourceKey),
	Invalidated(ResourceKey),
	RefetchStarted(ResourceKey),
	Refetched { key: ResourceKey, state: EntryState },
	RefetchFailed(ResourceKey),
	Removed(ResourceKey),
}

/// `None` until the fetch settles.
type FetchOutcome = Option<Result<CachedEntry, SharedFetchError>>;

#[derive(Default)]
struct Entries {
	cached: HashMap<ResourceKey, CacheEntry>,
	/// At most one fetch per key, first loads and refetches alike. Everyone else waiting on the
	/// key joins it.
	in_flight: HashMap<ResourceKey, InFlight>,
	next_fetch_id: u64,
}

struct InFlight {
	id: u64,
	done: watch::Receiver<FetchOutcome>,
	/// An invalidation matched the key while it had no entry yet: the loaded value may predate
	/// it, so it is stored stale.
	invalidated: bool,
}

/// Process-wide query cache.
///
/// Only invalidation, the cache's own fetches and explicit writes change entry state. Reads of
/// stale entries hand back the stale value and refetch in the background.
pub struct QueryCache {
	entries: RwLock<Entries>,
	fetcher: Arc<dyn QueryFetcher>,
	events_tx: broadcast::Sender<CacheEvent>,
}

impl QueryCache {
	pub fn new(fetcher: Arc<dyn QueryFetcher>) -> Arc<Self> {
		let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

		Arc::new(Self {
			entries: RwLock::default(),
			fetcher,
			events_tx,
		})
	}

	pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
		self.events_tx.subscribe()
	}

	/// Misses wait for the value, sharing the fetch with concurrent readers of the same key.
	/// Stale entries are returned as they are, in the `Refetching` state, while a background task
	/// refetches them.
	pub async fn read(self: &Arc<Self>, key: &ResourceKey) -> Result<CachedEntry, Error> {
		let done = {
			let mut entries = self.entries.write().await;

			let cached = entries
				.cached
				.get_mut(key)
				.map(|entry| (entry.begin_refetch(), entry.snapshot()));

			match cached {
				Some((began_refetch, snapshot)) => {
					if began_refetch {
						self.start_fetch(&mut entries, key);
						self.emit(CacheEvent::RefetchStarted(key.clone()));
					}
					return Ok(snapshot);
				}
				None => {
					debug!(%key, "cache miss, fetching");
					self.join_or_start_fetch(&mut entries, key)
				}
			}
		};

		settled(key, done).await
	}

	/// Like [`Self::read`], but waits for the refetch of a non-fresh entry and returns its result.
	/// A refetch already running is joined, not repeated.
	pub async fn ensure_fresh(self: &Arc<Self>, key: &ResourceKey) -> Result<Value, Error> {
		let done = {
			let mut entries = self.entries.write().await;

			let cached = entries
				.cached
				.get_mut(key)
				.map(|entry| (entry.begin_refetch(), entry.snapshot()));

			match cached {
				Some((_, snapshot)) if snapshot.state == EntryState::Fresh => {
					return Ok(snapshot.value);
				}
				Some((true, _)) => {
					let done = self.start_fetch(&mut entries, key);
					self.emit(CacheEvent::RefetchStarted(key.clone()));
					done
				}
				_ => self.join_or_start_fetch(&mut entries, key),
			}
		};

		settled(key, done).await.map(|entry| entry.value)
	}

	pub async fn write(&self, key: ResourceKey, value: Value) {
		{
			let mut entries = self.entries.write().await;
			if let Some(entry) = entries.cached.get_mut(&key) {
				entry.write(value);
			} else {
				entries.cached.insert(key.clone(), CacheEntry::fresh(value));
			}
		}

		trace!(%key, "written");
		self.emit(CacheEvent::Written(key));
	}

	/// Marks every entry matching one of `prefixes` as stale and returns how many changed.
	/// Keys still loading for the first time count too: they land stale. Entries that were
	/// already stale are left alone, so repeating an invalidation is free.
	pub async fn invalidate(self: &Arc<Self>, prefixes: &[KeyPrefix], mode: RefetchMode) -> usize {
		let matches = |key: &ResourceKey| prefixes.iter().any(|prefix| prefix.matches(key));
		let mut invalidated = Vec::new();
		let mut to_refetch = Vec::new();

		{
			let mut entries = self.entries.write().await;
			let Entries {
				cached, in_flight, ..
			} = &mut *entries;

			for (key, entry) in cached.iter_mut().filter(|(key, _)| matches(*key)) {
				if entry.invalidate() {
					invalidated.push(key.clone());

					if mode == RefetchMode::Eager && entry.begin_refetch() {
						to_refetch.push(key.clone());
					}
				}
			}

			for (key, load) in in_flight
				.iter_mut()
				.filter(|(key, _)| !cached.contains_key(*key) && matches(*key))
			{
				if !std::mem::replace(&mut load.invalidated, true) {
					invalidated.push(key.clone());
				}
			}

			for key in &to_refetch {
				self.start_fetch(&mut entries, key);
			}
		}

		for key in &invalidated {
			trace!(%key, "invalidated");
			self.emit(CacheEvent::Invalidated(key.clone()));
		}

		for key in to_refetch {
			self.emit(CacheEvent::RefetchStarted(key));
		}

		invalidated.len()
	}

	/// Drops matching entries. Fetches still running for them are forgotten: their results are
	/// handed to whoever waits on them but never stored.
	pub async fn remove(&self, prefix: &KeyPrefix) -> usize {
		let mut removed = Vec::new();

		{
			let mut entries = self.entries.write().await;
			entries.cached.retain(|key, _| {
				if prefix.matches(key) {
					removed.push(key.clone());
					false
				} else {
					true
				}
			});
			entries.in_flight.retain(|key, _| !prefix.matches(key));
		}

		let count = removed.len();
		for key in removed {
			self.emit(CacheEvent::Removed(key));
		}

		count
	}

	pub async fn state(&self, key: &ResourceKey) -> Option<EntryState> {
		self.entries.read().await.cached.get(key).map(CacheEntry::state)
	}

	/// Current snapshot without triggering any fetch.
	pub async fn peek(&self, key: &ResourceKey) -> Option<CachedEntry> {
		self.entries.read().await.cached.get(key).map(CacheEntry::snapshot)
	}

	/// Every cached key, sorted.
	pub async fn keys(&self) -> Vec<ResourceKey> {
		let mut keys = self
			.entries
			.read()
			.await
			.cached
			.keys()
			.cloned()
			.collect::<Vec<_>>();
		keys.sort();
		keys
	}

	pub async fn len(&self) -> usize {
		self.entries.read().await.cached.len()
	}

	pub async fn is_empty(&self) -> bool {
		self.entries.read().await.cached.is_empty()
	}

	fn join_or_start_fetch(
		self: &Arc<Self>,
		entries: &mut Entries,
		key: &ResourceKey,
	) -> watch::Receiver<FetchOutcome> {
		match entries.in_flight.get(key) {
			Some(in_flight) => {
				trace!(%key, "joining fetch in flight");
				in_flight.done.clone()
			}
			None => self.start_fetch(entries, key),
		}
	}

	/// Spawns a fetch of `key`, superseding any fetch still running for it.
	fn start_fetch(
		self: &Arc<Self>,
		entries: &mut Entries,
		key: &ResourceKey,
	) -> watch::Receiver<FetchOutcome> {
		entries.next_fetch_id += 1;
		let id = entries.next_fetch_id;
		let (done_tx, done) = watch::channel(None);

		entries.in_flight.insert(
			key.clone(),
			InFlight {
				id,
				done: done.clone(),
				invalidated: false,
			},
		);

		let this = Arc::clone(self);
		let key = key.clone();
		tokio::spawn(async move {
			let outcome = this.run_fetch(&key, id).await;
			done_tx.send_replace(Some(outcome));
		});

		done
	}

	async fn run_fetch(&self, key: &ResourceKey, id: u64) -> Result<CachedEntry, SharedFetchError> {
		let result = self.fetcher.fetch(key).await;

		let mut entries = self.entries.write().await;

		let current = entries.in_flight.get(key).is_some_and(|in_flight| in_flight.id == id);
		let invalidated = current
			&& entries
				.in_flight
				.remove(key)
				.is_some_and(|in_flight| in_flight.invalidated);

		let mut event = None;
		let outcome = match result {
			Ok(value) => Ok(match entries.cached.get_mut(key) {
				Some(entry) if current => {
					if let Some(state) = entry.complete_refetch(value) {
						trace!(%key, ?state, "refetched");
						event = Some(CacheEvent::Refetched {
							key: key.clone(),
							state,
						});
					} else {
						debug!(%key, "Entry was written while fetching, discarding the response");
					}
					entry.snapshot()
				}
				None if current => {
					let entry = if invalidated {
						debug!(%key, "Invalidated while loading, storing the value as stale");
						CacheEntry::stale(value)
					} else {
						CacheEntry::fresh(value)
					};
					let snapshot = entry.snapshot();
					entries.cached.insert(key.clone(), entry);
					event = Some(CacheEvent::Loaded(key.clone()));
					snapshot
				}
				Some(entry) => {
					debug!(%key, "Fetch was superseded, discarding the response");
					entry.snapshot()
				}
				None => CacheEntry::fresh(value).snapshot(),
			}),
			Err(source) => {
				if let Some(entry) = entries.cached.get_mut(key).filter(|_| current) {
					entry.fail_refetch();
					warn!(%key, ?source, "Background refetch failed, entry stays stale");
					event = Some(CacheEvent::RefetchFailed(key.clone()));
				}
				Err(SharedFetchError::from(source))
			}
		};

		drop(entries);

		if let Some(event) = event {
			self.emit(event);
		}

		outcome
	}

	fn emit(&self, event: CacheEvent) {
		// No subscribers is the normal case outside of UI bindings and tests
		self.events_tx.send(event).ok();
	}
}

async fn settled(
	key: &ResourceKey,
	mut done: watch::Receiver<FetchOutcome>,
) -> Result<CachedEntry, Error> {
	let outcome = match done.wait_for(Option::is_some).await {
		Ok(outcome) => (*outcome).clone(),
		Err(_) => None,
	};

	match outcome {
		Some(Ok(entry)) => Ok(entry),
		Some(Err(source)) => Err(Error::Fetch {
			key: key.clone(),
			source,
		}),
		None => Err(Error::FetchAborted(key.clone())),
	}
}
