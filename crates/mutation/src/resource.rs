use std::{collections::BTreeSet, fmt, sync::Arc};

use pd_query_cache::{InvalidationCoordinator, ResourceId};
use pd_schema::Schema;
use pd_transport::{Method, Transport, TransportError, TransportRequest};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::{MutationOptions, Notifier, ResourceError, ValidatedMutation};

/// A mutation against one backend resource.
///
/// Each call validates the variables, sends them with the bound method and, once the backend
/// accepted the call, invalidates the resource root together with its related roots and any
/// roots added through [`Self::also_invalidate`]. Rejected or failed calls invalidate nothing.
#[derive(Clone)]
pub struct ResourceMutation {
	transport: Arc<dyn Transport>,
	coordinator: InvalidationCoordinator,
	notifier: Arc<dyn Notifier>,
	root: String,
	method: Method,
	also_invalidate: BTreeSet<String>,
	schema: Option<Arc<dyn Schema>>,
	options: MutationOptions,
}

struct Pipeline {
	transport: Arc<dyn Transport>,
	coordinator: InvalidationCoordinator,
	root: String,
	method: Method,
	id: Option<ResourceId>,
	invalidates: BTreeSet<String>,
}

impl ResourceMutation {
	pub fn new(
		transport: Arc<dyn Transport>,
		coordinator: InvalidationCoordinator,
		notifier: Arc<dyn Notifier>,
		root: impl Into<String>,
		method: Method,
	) -> Self {
		Self {
			transport,
			coordinator,
			notifier,
			root: root.into(),
			method,
			also_invalidate: BTreeSet::new(),
			schema: None,
			options: MutationOptions::default(),
		}
	}

	#[must_use]
	pub fn with_schema(mut self, schema: Arc<dyn Schema>) -> Self {
		self.schema = Some(schema);
		self
	}

	#[must_use]
	pub fn with_options(mut self, options: MutationOptions) -> Self {
		self.options = options;
		self
	}

	#[must_use]
	pub fn also_invalidate<I, S>(mut self, roots: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.also_invalidate.extend(roots.into_iter().map(Into::into));
		self
	}

	pub fn root(&self) -> &str {
		&self.root
	}

	pub const fn method(&self) -> Method {
		self.method
	}

	/// Calls `<root>` with `variables`.
	pub async fn execute<D, V>(&self, variables: &V) -> Result<D, ResourceError>
	where
		D: DeserializeOwned + Send + 'static,
		V: Serialize + ?Sized,
	{
		self.bind(None).execute(variables).await
	}

	/// Calls `<root>/<id>` with `variables`.
	pub async fn execute_on<D, V>(
		&self,
		id: impl Into<ResourceId>,
		variables: &V,
	) -> Result<D, ResourceError>
	where
		D: DeserializeOwned + Send + 'static,
		V: Serialize + ?Sized,
	{
		self.bind(Some(id.into())).execute(variables).await
	}

	/// Background variant of [`Self::execute`]; see [`ValidatedMutation::fire`].
	pub fn fire<V>(&self, variables: &V) -> Option<JoinHandle<()>>
	where
		V: Serialize + ?Sized,
	{
		self.bind::<Value>(None).fire(variables)
	}

	pub fn fire_on<V>(&self, id: impl Into<ResourceId>, variables: &V) -> Option<JoinHandle<()>>
	where
		V: Serialize + ?Sized,
	{
		self.bind::<Value>(Some(id.into())).fire(variables)
	}

	fn bind<D>(&self, id: Option<ResourceId>) -> ValidatedMutation<D, TransportError>
	where
		D: DeserializeOwned + Send + 'static,
	{
		let mut invalidates = self.also_invalidate.clone();
		invalidates.insert(self.root.clone());

		let pipeline = Arc::new(Pipeline {
			transport: Arc::clone(&self.transport),
			coordinator: self.coordinator.clone(),
			root: self.root.clone(),
			method: self.method,
			id,
			invalidates,
		});

		let mutation = ValidatedMutation::new(Arc::clone(&self.notifier), move |payload| {
			let pipeline = Arc::clone(&pipeline);
			async move { pipeline.run::<D>(payload).await }
		})
		.with_options(self.options.clone());

		match &self.schema {
			Some(schema) => mutation.with_schema(Arc::clone(schema)),
			None => mutation,
		}
	}
}

impl Pipeline {
	async fn run<D: DeserializeOwned>(&self, payload: Value) -> Result<D, TransportError> {
		let mut request = TransportRequest::new(&self.root, self.method);
		request.id.clone_from(&self.id);
		if !payload.is_null() {
			request = request.with_payload(payload);
		}

		info!(resource = %self.root, method = %self.method, id = ?self.id, "Dispatching mutation");

		let response = self.transport.call(request).await?;

		// The backend accepted the change, so related queries are stale even if the response
		// turns out to be unreadable
		let report = self.coordinator.invalidate(&self.invalidates).await;
		debug!(
			resource = %self.root,
			roots = ?report.roots,
			stale_entries = report.stale_entries,
			"mutation settled"
		);

		Ok(serde_json::from_value(response)?)
	}
}

impl fmt::Debug for ResourceMutation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ResourceMutation")
			.field("root", &self.root)
			.field("method", &self.method)
			.field("also_invalidate", &self.also_invalidate)
			.field("schema", &self.schema.as_ref().map(|schema| schema.name()))
			.field("options", &self.options)
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use std::{
		sync::{
			atomic::{AtomicBool, Ordering},
			Mutex,
		},
		time::Duration,
	};

	use async_trait::async_trait;
	use pd_query_cache::{
		EntryState, FetchError, QueryCache, QueryFetcher, QueryKeys, RelatedQueries, ResourceKey,
	};
	use pd_schema::{FieldSchema, ObjectSchema};
	use serde::Deserialize;
	use serde_json::json;
	use tokio::time::timeout;
	use tracing_test::traced_test;

	use crate::{MutationError, TracingNotifier};

	use super::*;

	#[derive(Default)]
	struct MockBackend {
		requests: Mutex<Vec<TransportRequest>>,
		fail_with: Mutex<Option<u16>>,
		response: Mutex<Value>,
		hang: AtomicBool,
	}

	#[async_trait]
	impl Transport for MockBackend {
		async fn call(&self, request: TransportRequest) -> Result<Value, TransportError> {
			self.requests.lock().unwrap().push(request);

			if self.hang.load(Ordering::SeqCst) {
				std::future::pending::<()>().await;
			}

			if let Some(status) = *self.fail_with.lock().unwrap() {
				return Err(TransportError::Status {
					status,
					body: "nope".into(),
				});
			}

			Ok(self.response.lock().unwrap().clone())
		}
	}

	#[async_trait]
	impl QueryFetcher for MockBackend {
		async fn fetch(&self, key: &ResourceKey) -> Result<Value, FetchError> {
			Ok(json!({ "key": key.to_string() }))
		}
	}

	#[derive(Debug, Deserialize, PartialEq, Eq)]
	struct Created {
		id: i64,
	}

	struct Fixture {
		backend: Arc<MockBackend>,
		cache: Arc<QueryCache>,
		orders: ResourceMutation,
	}

	async fn fixture() -> Fixture {
		let backend = Arc::new(MockBackend::default());
		*backend.response.lock().unwrap() = json!({ "id": 41 });

		let cache = QueryCache::new(backend.clone());
		for root in ["orders", "designs", "productions", "customers", "stocks"] {
			cache.write(QueryKeys::new(root).list(), json!([])).await;
		}

		let coordinator = InvalidationCoordinator::new(
			Arc::clone(&cache),
			Arc::new(RelatedQueries::from_entries([(
				"orders",
				vec!["orders", "designs", "productions"],
			)])),
		);

		let orders = ResourceMutation::new(
			backend.clone(),
			coordinator,
			Arc::new(TracingNotifier),
			"orders",
			Method::Post,
		)
		.with_schema(Arc::new(
			ObjectSchema::new("OrderCreate")
				.field("quantity", FieldSchema::integer().min(0).coerce()),
		));

		Fixture {
			backend,
			cache,
			orders,
		}
	}

	async fn states(cache: &QueryCache) -> Vec<(String, EntryState)> {
		let mut states = Vec::new();
		for key in cache.keys().await {
			if let Some(state) = cache.state(&key).await {
				states.push((key.root().to_string(), state));
			}
		}
		states
	}

	#[tokio::test]
	#[traced_test]
	async fn success_invalidates_root_and_related_roots() {
		let Fixture {
			backend,
			cache,
			orders,
		} = fixture().await;

		let created: Created = orders
			.also_invalidate(["stocks"])
			.execute(&json!({ "quantity": "3", "draft": true }))
			.await
			.unwrap();

		assert_eq!(created, Created { id: 41 });
		assert_eq!(
			backend.requests.lock().unwrap()[0].payload,
			Some(json!({ "quantity": 3 }))
		);
		assert_eq!(
			states(&cache).await,
			vec![
				("customers".to_string(), EntryState::Fresh),
				("designs".to_string(), EntryState::Stale),
				("orders".to_string(), EntryState::Stale),
				("productions".to_string(), EntryState::Stale),
				("stocks".to_string(), EntryState::Stale),
			]
		);
	}

	#[tokio::test]
	#[traced_test]
	async fn rejected_or_failed_calls_invalidate_nothing() {
		let Fixture {
			backend,
			cache,
			orders,
		} = fixture().await;

		let invalid = orders
			.execute::<Created, _>(&json!({ "quantity": -1 }))
			.await
			.unwrap_err();
		assert_eq!(invalid.to_string(), "must be >= 0");
		assert!(backend.requests.lock().unwrap().is_empty());

		*backend.fail_with.lock().unwrap() = Some(500);
		let failed = orders
			.execute::<Created, _>(&json!({ "quantity": 1 }))
			.await
			.unwrap_err();
		assert!(matches!(
			failed,
			MutationError::Mutation(TransportError::Status { status: 500, .. })
		));

		assert!(states(&cache)
			.await
			.iter()
			.all(|(_, state)| *state == EntryState::Fresh));
	}

	#[tokio::test]
	#[traced_test]
	async fn dropped_calls_invalidate_nothing() {
		let Fixture {
			backend,
			cache,
			orders,
		} = fixture().await;
		backend.hang.store(true, Ordering::SeqCst);

		let payload = json!({ "quantity": 1 });
		let call = orders.execute::<Created, _>(&payload);
		assert!(timeout(Duration::from_millis(20), call).await.is_err());

		assert_eq!(backend.requests.lock().unwrap().len(), 1);
		assert!(states(&cache)
			.await
			.iter()
			.all(|(_, state)| *state == EntryState::Fresh));
	}

	#[tokio::test]
	#[traced_test]
	async fn targets_a_record_and_skips_empty_payloads() {
		let Fixture {
			backend,
			cache,
			orders,
		} = fixture().await;
		*backend.response.lock().unwrap() = Value::Null;

		let delete = ResourceMutation {
			method: Method::Delete,
			schema: None,
			..orders
		};
		delete.execute_on::<(), _>("7", &()).await.unwrap();

		let request = backend.requests.lock().unwrap().remove(0);
		assert_eq!(request, TransportRequest::new("orders", Method::Delete).with_id(7));
		assert_eq!(
			cache.state(&QueryKeys::new("designs").list()).await,
			Some(EntryState::Stale)
		);
	}

	#[tokio::test]
	#[traced_test]
	async fn unreadable_responses_still_invalidate() {
		let Fixture {
			backend,
			cache,
			orders,
		} = fixture().await;
		*backend.response.lock().unwrap() = json!("created");

		let err = orders
			.execute::<Created, _>(&json!({ "quantity": 1 }))
			.await
			.unwrap_err();

		assert!(matches!(err, MutationError::Mutation(TransportError::Decode(_))));
		assert_eq!(
			cache.state(&QueryKeys::new("orders").list()).await,
			Some(EntryState::Stale)
		);
	}

	#[tokio::test]
	#[traced_test]
	async fn fire_runs_the_pipeline_in_the_background() {
		let Fixture {
			backend,
			cache,
			orders,
		} = fixture().await;

		assert!(orders.fire(&json!({ "quantity": -5 })).is_none());
		orders
			.fire_on(12, &json!({ "quantity": 5 }))
			.unwrap()
			.await
			.unwrap();

		assert_eq!(backend.requests.lock().unwrap().len(), 1);
		assert_eq!(
			cache.state(&QueryKeys::new("productions").list()).await,
			Some(EntryState::Stale)
		);
	}
}
