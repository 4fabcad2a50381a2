use std::fmt;

use serde_json::Value;

use super::ValidationErrors;

/// `Ok` carries the validated value, which is what must be sent onwards: validators may coerce
/// types and strip unknown keys.
pub type ValidationResult = Result<Value, ValidationErrors>;

pub trait Schema: Send + Sync + fmt::Debug {
	/// Stable name, matching the backend request type it validates.
	fn name(&self) -> &str;

	fn validate(&self, input: &Value) -> ValidationResult;
}

/// A [`Schema`] backed by a plain function, for validators that are not declarative.
pub struct FnSchema<F> {
	name: String,
	validate: F,
}

pub fn schema_fn<F>(name: impl Into<String>, validate: F) -> FnSchema<F>
where
	F: Fn(&Value) -> ValidationResult + Send + Sync,
{
	FnSchema {
		name: name.into(),
		validate,
	}
}

impl<F> fmt::Debug for FnSchema<F> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FnSchema")
			.field("name", &self.name)
			.finish_non_exhaustive()
	}
}

impl<F> Schema for FnSchema<F>
where
	F: Fn(&Value) -> ValidationResult + Send + Sync,
{
	fn name(&self) -> &str {
		&self.name
	}

	fn validate(&self, input: &Value) -> ValidationResult {
		(self.validate)(input)
	}
}
