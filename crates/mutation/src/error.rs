use std::fmt;

use pd_schema::{FieldError, ValidationErrors};
use pd_transport::TransportError;
use thiserror::Error;

/// Variables rejected by the schema before any request was made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
	errors: ValidationErrors,
	flattened: Vec<FieldError>,
	message: String,
}

impl ValidationFailure {
	/// Keeps the first message of every field. An empty set of errors reads as `fallback`.
	#[must_use]
	pub fn new(errors: ValidationErrors, fallback: &str) -> Self {
		let flattened = errors.flatten();
		let message = if flattened.is_empty() {
			fallback.to_string()
		} else {
			flattened
				.iter()
				.map(|error| error.message.as_str())
				.collect::<Vec<_>>()
				.join(", ")
		};

		Self {
			errors,
			flattened,
			message,
		}
	}

	/// Every message the schema produced, grouped by field.
	#[must_use]
	pub const fn errors(&self) -> &ValidationErrors {
		&self.errors
	}

	#[must_use]
	pub fn fields(&self) -> &[FieldError] {
		&self.flattened
	}

	/// What the user sees: the first flattened message, or the fallback when there is none.
	#[must_use]
	pub fn first_message(&self) -> &str {
		self.flattened
			.first()
			.map_or(self.message.as_str(), |error| error.message.as_str())
	}
}

impl fmt::Display for ValidationFailure {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.message)
	}
}

impl std::error::Error for ValidationFailure {}

#[derive(Debug, Error)]
pub enum MutationError<E> {
	#[error(transparent)]
	Validation(#[from] ValidationFailure),
	#[error("failed to encode mutation variables: {0}")]
	Encode(#[source] serde_json::Error),
	#[error(transparent)]
	Mutation(E),
}

impl<E> MutationError<E> {
	pub const fn is_validation(&self) -> bool {
		matches!(self, Self::Validation(_))
	}

	pub const fn validation(&self) -> Option<&ValidationFailure> {
		match self {
			Self::Validation(failure) => Some(failure),
			_ => None,
		}
	}

	pub fn into_mutation(self) -> Option<E> {
		match self {
			Self::Mutation(e) => Some(e),
			_ => None,
		}
	}
}

/// Failure of a [`crate::ResourceMutation`].
pub type ResourceError = MutationError<TransportError>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn message_joins_first_message_per_field() {
		let mut errors = ValidationErrors::new();
		errors.add("customer", "is required");
		errors.add("quantity", "must be >= 0");
		errors.add("quantity", "expected integer");

		let failure = ValidationFailure::new(errors, "Please check the form for errors");

		assert_eq!(failure.to_string(), "is required, must be >= 0");
		assert_eq!(failure.first_message(), "is required");
		assert_eq!(failure.fields().len(), 2);
		assert_eq!(failure.errors().get("quantity").map(<[_]>::len), Some(2));
	}

	#[test]
	fn empty_errors_read_as_fallback() {
		let mut errors = ValidationErrors::new();
		errors.touch("quantity");

		let failure = ValidationFailure::new(errors, "Please check the form for errors");

		assert!(failure.fields().is_empty());
		assert_eq!(failure.first_message(), "Please check the form for errors");
		assert_eq!(failure.to_string(), "Please check the form for errors");
	}
}
