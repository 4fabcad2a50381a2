use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
	#[error("unknown schema: {0}")]
	UnknownSchema(String),
	#[error("schema registered twice: {0}")]
	DuplicateSchema(String),
}

/// Per-field validation messages, keyed by a dot/bracket path (`items[0].quantity`).
///
/// Fields keep the order in which their first error was reported, and messages keep the order in
/// which the validator produced them. The empty path holds form-level errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors {
	fields: Vec<(String, Vec<String>)>,
}

/// One message for one field, as produced by [`ValidationErrors::flatten`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
	pub path: String,
	pub message: String,
}

impl ValidationErrors {
	#[must_use]
	pub const fn new() -> Self {
		Self { fields: Vec::new() }
	}

	pub fn add(&mut self, path: impl Into<String>, message: impl Into<String>) {
		let path = path.into();
		let message = message.into();

		if let Some((_, messages)) = self.fields.iter_mut().find(|(p, _)| *p == path) {
			messages.push(message);
		} else {
			self.fields.push((path, vec![message]));
		}
	}

	/// Registers a field with no messages at all. Validators generated from loose contracts do
	/// report failures like this, and [`Self::flatten`] skips them.
	pub fn touch(&mut self, path: impl Into<String>) {
		let path = path.into();
		if !self.fields.iter().any(|(p, _)| *p == path) {
			self.fields.push((path, Vec::new()));
		}
	}

	/// Adds a form-level error.
	pub fn form(&mut self, message: impl Into<String>) {
		self.add(String::new(), message);
	}

	/// Moves every error of `other` under `prefix`.
	pub fn extend_nested(&mut self, prefix: &str, other: Self) {
		for (path, messages) in other.fields {
			let path = join_key(prefix, &path);
			if messages.is_empty() {
				self.touch(path.clone());
			}
			for message in messages {
				self.add(path.clone(), message);
			}
		}
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.fields.is_empty()
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.fields.len()
	}

	#[must_use]
	pub fn get(&self, path: &str) -> Option<&[String]> {
		self.fields
			.iter()
			.find(|(p, _)| p == path)
			.map(|(_, messages)| messages.as_slice())
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
		self.fields
			.iter()
			.map(|(path, messages)| (path.as_str(), messages.as_slice()))
	}

	/// One message per field, the first one reported. Later messages for the same field are
	/// dropped on purpose: forms show a single line under each input.
	#[must_use]
	pub fn flatten(&self) -> Vec<FieldError> {
		self.fields
			.iter()
			.filter_map(|(path, messages)| {
				messages.first().map(|message| FieldError {
					path: path.clone(),
					message: message.clone(),
				})
			})
			.collect()
	}
}

impl fmt::Display for ValidationErrors {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut first = true;
		for (path, messages) in &self.fields {
			for message in messages {
				if !first {
					f.write_str("; ")?;
				}
				first = false;

				if path.is_empty() {
					write!(f, "{message}")?;
				} else {
					write!(f, "{path}: {message}")?;
				}
			}
		}

		if first {
			f.write_str("validation failed")?;
		}

		Ok(())
	}
}

impl std::error::Error for ValidationErrors {}

pub(crate) fn join_key(parent: &str, key: &str) -> String {
	match (parent.is_empty(), key.is_empty()) {
		(true, _) => key.to_string(),
		(false, true) => parent.to_string(),
		// Array indices are already bracketed by `join_index`
		(false, false) if key.starts_with('[') => format!("{parent}{key}"),
		(false, false) => format!("{parent}.{key}"),
	}
}

pub(crate) fn join_index(parent: &str, index: usize) -> String {
	format!("{parent}[{index}]")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn flatten_keeps_first_message_per_field() {
		let mut errors = ValidationErrors::new();
		errors.add("quantity", "must be >= 0");
		errors.add("customer_id", "is required");
		errors.add("quantity", "expected integer");

		assert_eq!(
			errors.flatten(),
			vec![
				FieldError {
					path: "quantity".into(),
					message: "must be >= 0".into()
				},
				FieldError {
					path: "customer_id".into(),
					message: "is required".into()
				},
			]
		);
		assert_eq!(errors.get("quantity").map(<[String]>::len), Some(2));
	}

	#[test]
	fn touched_fields_do_not_flatten() {
		let mut errors = ValidationErrors::new();
		errors.touch("quantity");

		assert!(!errors.is_empty());
		assert!(errors.flatten().is_empty());
	}

	#[test]
	fn nested_paths_use_dots_and_brackets() {
		let mut item = ValidationErrors::new();
		item.add("width_mm", "must be >= 1");

		let mut items = ValidationErrors::new();
		items.extend_nested(&join_index("", 0), item);

		let mut errors = ValidationErrors::new();
		errors.extend_nested("items", items);
		errors.form("order is locked");

		assert_eq!(
			errors.get("items[0].width_mm"),
			Some(&["must be >= 1".to_string()][..])
		);
		assert_eq!(
			errors.to_string(),
			"items[0].width_mm: must be >= 1; order is locked"
		);
	}
}
