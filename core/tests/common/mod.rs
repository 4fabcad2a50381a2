#![allow(dead_code)]

use pd_core::{
	CacheEvent, Client, ClientConfig, ResourceKey, Transport, TransportError, TransportRequest,
};
use pd_query_cache::{FetchError, QueryFetcher};

use std::{
	collections::HashMap,
	sync::{Arc, Mutex},
	time::Duration,
};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::{sync::broadcast, time::timeout};

/// In-memory backend: mutations are recorded and answered with `{"id": n}`, reads return the
/// key together with how often it was fetched.
#[derive(Default)]
pub struct MockBackend {
	pub mutations: Mutex<Vec<TransportRequest>>,
	pub fetches: Mutex<HashMap<ResourceKey, u64>>,
	pub fail_mutations: Mutex<Option<TransportError>>,
}

impl MockBackend {
	pub fn mutation_count(&self) -> usize {
		self.mutations.lock().unwrap().len()
	}

	pub fn fetch_count(&self, key: &ResourceKey) -> u64 {
		self.fetches.lock().unwrap().get(key).copied().unwrap_or(0)
	}
}

#[async_trait]
impl Transport for MockBackend {
	async fn call(&self, request: TransportRequest) -> Result<Value, TransportError> {
		let mut mutations = self.mutations.lock().unwrap();
		mutations.push(request);

		if let Some(e) = self.fail_mutations.lock().unwrap().take() {
			return Err(e);
		}

		Ok(json!({ "id": mutations.len() }))
	}
}

#[async_trait]
impl QueryFetcher for MockBackend {
	async fn fetch(&self, key: &ResourceKey) -> Result<Value, FetchError> {
		let mut fetches = self.fetches.lock().unwrap();
		let version = fetches.entry(key.clone()).or_default();
		*version += 1;

		Ok(json!({ "key": key.to_string(), "version": *version }))
	}
}

pub fn client() -> (Client, Arc<MockBackend>) {
	let backend = Arc::new(MockBackend::default());
	let client = Client::with_transport(ClientConfig::default(), Arc::clone(&backend)).unwrap();

	(client, backend)
}

pub async fn wait_for(
	events: &mut broadcast::Receiver<CacheEvent>,
	wanted: impl Fn(&CacheEvent) -> bool,
) -> CacheEvent {
	timeout(Duration::from_secs(5), async {
		loop {
			let event = events.recv().await.unwrap();
			if wanted(&event) {
				return event;
			}
		}
	})
	.await
	.unwrap()
}
