use std::sync::Arc;

use pd_catalog::{contract, mutation_schema, related_queries};
use pd_mutation::{Notifier, ResourceMutation, TracingNotifier};
use pd_query_cache::{
	CachedEntry, InvalidationBatcher, InvalidationCoordinator, InvalidationReport, QueryCache,
	QueryFetcher, QueryKeys, ResourceKey,
};
use pd_schema::{Error as SchemaError, SchemaRegistry};
use pd_transport::{HttpTransport, Method, Transport};
use serde_json::Value;
use tracing::{debug, info, instrument};

use super::{ClientConfig, Error};

/// Everything a printdesk front end needs to talk to the backend.
///
/// Reads go through the shared [`QueryCache`]; writes go through [`ResourceMutation`]s, which
/// validate against the request contract and invalidate related queries once the backend
/// accepted them.
#[derive(Clone)]
pub struct Client {
	config: Arc<ClientConfig>,
	transport: Arc<dyn Transport>,
	cache: Arc<QueryCache>,
	coordinator: InvalidationCoordinator,
	notifier: Arc<dyn Notifier>,
	schemas: &'static SchemaRegistry,
}

impl Client {
	/// Builds the HTTP stack described by `config`.
	pub fn new(config: ClientConfig) -> Result<Self, Error> {
		config.validate()?;

		let mut transport = HttpTransport::new(&config.api_base_url, config.request_timeout())?;
		if let Some(token) = &config.auth_token {
			transport = transport.with_auth_token(token);
		}

		info!(base_url = %transport.base_url(), "Client ready");

		Self::with_transport(config, Arc::new(transport))
	}

	/// Uses `transport` both for mutations and for loading cache entries.
	pub fn with_transport<T>(config: ClientConfig, transport: Arc<T>) -> Result<Self, Error>
	where
		T: Transport + QueryFetcher,
	{
		config.validate()?;

		let cache = QueryCache::new(Arc::clone(&transport) as Arc<dyn QueryFetcher>);
		let coordinator =
			InvalidationCoordinator::new(Arc::clone(&cache), related_queries()).with_mode(config.refetch);

		Ok(Self {
			config: Arc::new(config),
			transport,
			cache,
			coordinator,
			notifier: Arc::new(TracingNotifier),
			schemas: contract(),
		})
	}

	#[must_use]
	pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
		self.notifier = notifier;
		self
	}

	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	pub const fn cache(&self) -> &Arc<QueryCache> {
		&self.cache
	}

	pub const fn schemas(&self) -> &'static SchemaRegistry {
		self.schemas
	}

	pub fn keys(&self, root: &str) -> QueryKeys {
		QueryKeys::new(root)
	}

	pub async fn read(&self, key: &ResourceKey) -> Result<CachedEntry, Error> {
		Ok(self.cache.read(key).await?)
	}

	/// Like [`Self::read`], but waits for stale data to be refetched.
	pub async fn read_fresh(&self, key: &ResourceKey) -> Result<Value, Error> {
		Ok(self.cache.ensure_fresh(key).await?)
	}

	/// A mutation of `root` through `method`, validated by the contract schema registered for
	/// that pair (if any) and configured from [`ClientConfig::notifications`].
	pub fn mutation(&self, root: &str, method: Method) -> ResourceMutation {
		let mutation = self.unvalidated(root, method);

		match mutation_schema(root, method).and_then(|name| self.schemas.get(name)) {
			Some(schema) => mutation.with_schema(schema),
			None => {
				debug!(%root, %method, "no request schema, variables are sent as they are");
				mutation
			}
		}
	}

	/// Like [`Self::mutation`], but with an explicitly named schema.
	pub fn mutation_with_schema(
		&self,
		root: &str,
		method: Method,
		schema: &str,
	) -> Result<ResourceMutation, Error> {
		let schema = self
			.schemas
			.get(schema)
			.ok_or_else(|| SchemaError::UnknownSchema(schema.to_string()))?;

		Ok(self.unvalidated(root, method).with_schema(schema))
	}

	/// Marks `roots` and their related roots stale right away.
	#[instrument(skip(self, roots))]
	pub async fn invalidate<I, S>(&self, roots: I) -> InvalidationReport
	where
		I: IntoIterator<Item = S> + Send,
		S: AsRef<str>,
	{
		self.coordinator.invalidate(roots).await
	}

	/// Starts a batcher for invalidations pushed by the backend, using the configured window.
	pub fn spawn_batcher(&self) -> InvalidationBatcher {
		InvalidationBatcher::spawn(self.coordinator.clone(), self.config.invalidation_throttle())
	}

	fn unvalidated(&self, root: &str, method: Method) -> ResourceMutation {
		ResourceMutation::new(
			Arc::clone(&self.transport),
			self.coordinator.clone(),
			Arc::clone(&self.notifier),
			root,
			method,
		)
		.with_options(self.config.mutation_options())
	}
}
