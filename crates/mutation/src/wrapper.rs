use std::{fmt, future::Future, sync::Arc};

use futures::future::{BoxFuture, FutureExt};
use pd_schema::Schema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use super::{MutationError, Notification, Notifier, ValidationFailure};

pub const VALIDATION_ERROR_TITLE: &str = "Validation error";
pub const DEFAULT_VALIDATION_FALLBACK: &str = "Please check the form for errors";

type MutationFn<D, E> = Arc<dyn Fn(Value) -> BoxFuture<'static, Result<D, E>> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MutationOptions {
	/// Run the schema before calling the mutation. Without a schema this has no effect.
	pub validate_before_mutate: bool,
	/// Notify the user when validation fails.
	pub show_validation_errors: bool,
	/// Shown when validation fails without a single usable message.
	pub validation_fallback: String,
}

impl Default for MutationOptions {
	fn default() -> Self {
		Self {
			validate_before_mutate: true,
			show_validation_errors: true,
			validation_fallback: DEFAULT_VALIDATION_FALLBACK.to_string(),
		}
	}
}

/// An async mutation gated by an optional schema.
///
/// Invalid variables never reach the mutation: the user gets one notification and the caller gets
/// [`MutationError::Validation`] (from [`Self::execute`]) or nothing at all (from [`Self::fire`]).
/// Valid variables are forwarded in their validated form, with coercions applied and unknown keys
/// stripped. Without a schema, or with validation turned off, the serialized variables are
/// forwarded as they are.
pub struct ValidatedMutation<D, E> {
	mutate: MutationFn<D, E>,
	schema: Option<Arc<dyn Schema>>,
	options: MutationOptions,
	notifier: Arc<dyn Notifier>,
}

impl<D, E> Clone for ValidatedMutation<D, E> {
	fn clone(&self) -> Self {
		Self {
			mutate: Arc::clone(&self.mutate),
			schema: self.schema.clone(),
			options: self.options.clone(),
			notifier: Arc::clone(&self.notifier),
		}
	}
}

impl<D, E> fmt::Debug for ValidatedMutation<D, E> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ValidatedMutation")
			.field("schema", &self.schema.as_ref().map(|schema| schema.name()))
			.field("options", &self.options)
			.field("notifier", &self.notifier)
			.finish_non_exhaustive()
	}
}

impl<D, E> ValidatedMutation<D, E>
where
	D: Send + 'static,
	E: fmt::Display + Send + 'static,
{
	pub fn new<F, Fut>(notifier: Arc<dyn Notifier>, mutate: F) -> Self
	where
		F: Fn(Value) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = Result<D, E>> + Send + 'static,
	{
		Self {
			mutate: Arc::new(move |payload| mutate(payload).boxed()),
			schema: None,
			options: MutationOptions::default(),
			notifier,
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

	pub const fn options(&self) -> &MutationOptions {
		&self.options
	}

	pub fn schema(&self) -> Option<&Arc<dyn Schema>> {
		self.schema.as_ref()
	}

	/// Serializes and validates `variables`, producing the payload the mutation would receive.
	/// Notifies the user on validation failure when enabled.
	pub fn prepare<V>(&self, variables: &V) -> Result<Value, MutationError<E>>
	where
		V: Serialize + ?Sized,
	{
		let raw = serde_json::to_value(variables).map_err(MutationError::Encode)?;

		let schema = match &self.schema {
			Some(schema) if self.options.validate_before_mutate => schema,
			_ => return Ok(raw),
		};

		schema.validate(&raw).map_err(|errors| {
			let failure = ValidationFailure::new(errors, &self.options.validation_fallback);

			debug!(schema = schema.name(), %failure, "mutation variables rejected");

			if self.options.show_validation_errors {
				self.notifier.notify(Notification::destructive(
					VALIDATION_ERROR_TITLE,
					failure.first_message(),
				));
			}

			MutationError::Validation(failure)
		})
	}

	/// Validates, then awaits the mutation. Mutation failures come back unchanged as
	/// [`MutationError::Mutation`].
	pub async fn execute<V>(&self, variables: &V) -> Result<D, MutationError<E>>
	where
		V: Serialize + ?Sized,
	{
		let payload = self.prepare(variables)?;

		(self.mutate)(payload)
			.await
			.map_err(MutationError::Mutation)
	}

	/// Validates synchronously, then runs the mutation in the background.
	///
	/// Returns `None` when the variables were rejected; the user was already notified and the
	/// caller gets no error. Failures of the spawned mutation are only logged.
	pub fn fire<V>(&self, variables: &V) -> Option<JoinHandle<()>>
	where
		V: Serialize + ?Sized,
	{
		let payload = match self.prepare(variables) {
			Ok(payload) => payload,
			Err(MutationError::Encode(e)) => {
				error!(?e, "Failed to encode mutation variables");
				return None;
			}
			Err(_) => return None,
		};

		let mutation = (self.mutate)(payload);

		Some(tokio::spawn(async move {
			if let Err(e) = mutation.await {
				error!(%e, "Mutation failed");
			}
		}))
	}
}
