use std::{collections::HashMap, sync::Arc};

use serde_json::Value;
use tracing::trace;

use super::{Error, Schema, ValidationResult};

/// Name to validator lookup, built once at startup and only read afterwards.
#[derive(Debug, Default, Clone)]
pub struct SchemaRegistry {
	schemas: HashMap<String, Arc<dyn Schema>>,
}

impl SchemaRegistry {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	pub fn from_schemas(
		schemas: impl IntoIterator<Item = Arc<dyn Schema>>,
	) -> Result<Self, Error> {
		let mut registry = Self::new();
		for schema in schemas {
			registry.insert(schema)?;
		}

		Ok(registry)
	}

	pub fn insert(&mut self, schema: Arc<dyn Schema>) -> Result<(), Error> {
		let name = schema.name().to_string();
		if self.schemas.contains_key(&name) {
			return Err(Error::DuplicateSchema(name));
		}

		self.schemas.insert(name, schema);

		Ok(())
	}

	#[must_use]
	pub fn get(&self, name: &str) -> Option<Arc<dyn Schema>> {
		self.schemas.get(name).cloned()
	}

	#[must_use]
	pub fn contains(&self, name: &str) -> bool {
		self.schemas.contains_key(name)
	}

	/// Registered names, sorted.
	#[must_use]
	pub fn names(&self) -> Vec<&str> {
		let mut names = self.schemas.keys().map(String::as_str).collect::<Vec<_>>();
		names.sort_unstable();
		names
	}

	/// The outer `Result` reports a missing schema, the inner one the validation outcome.
	pub fn validate(&self, name: &str, value: &Value) -> Result<ValidationResult, Error> {
		let schema = self
			.schemas
			.get(name)
			.ok_or_else(|| Error::UnknownSchema(name.to_string()))?;

		trace!(schema = name, "validating");

		Ok(schema.validate(value))
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use crate::{schema_fn, FieldSchema, ObjectSchema};

	use super::*;

	#[test]
	fn lookup_and_validate_by_name() {
		let registry = SchemaRegistry::from_schemas([
			Arc::new(ObjectSchema::new("StockAdjust").field("delta", FieldSchema::integer()))
				as Arc<dyn Schema>,
			Arc::new(schema_fn("Ping", |value| Ok(value.clone()))),
		])
		.unwrap();

		assert_eq!(registry.names(), vec!["Ping", "StockAdjust"]);
		assert!(registry
			.validate("StockAdjust", &json!({ "delta": 3 }))
			.unwrap()
			.is_ok());
		assert!(matches!(
			registry.validate("Missing", &json!({})),
			Err(Error::UnknownSchema(name)) if name == "Missing"
		));
	}

	#[test]
	fn duplicate_names_are_rejected() {
		let result = SchemaRegistry::from_schemas([
			Arc::new(schema_fn("Ping", |value| Ok(value.clone()))) as Arc<dyn Schema>,
			Arc::new(schema_fn("Ping", |value| Ok(value.clone()))),
		]);

		assert!(matches!(result, Err(Error::DuplicateSchema(name)) if name == "Ping"));
	}
}
