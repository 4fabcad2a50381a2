use std::borrow::Cow;

use chrono::NaiveDate;
use serde_json::{Map, Number, Value};

use super::{
	error::{join_index, join_key},
	Schema, ValidationErrors, ValidationResult,
};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone)]
pub enum FieldKind {
	Text {
		min_len: Option<usize>,
		max_len: Option<usize>,
		trim: bool,
	},
	Integer {
		min: Option<f64>,
		max: Option<f64>,
	},
	Number {
		min: Option<f64>,
		max: Option<f64>,
	},
	Boolean,
	/// Calendar date in `YYYY-MM-DD` form.
	Date,
	OneOf(&'static [&'static str]),
	Array {
		item: Box<FieldSchema>,
		min_items: Option<usize>,
	},
	Object(ObjectSchema),
}

/// Declaration of a single field. Fields are required, non-nullable and strict by default.
#[derive(Debug, Clone)]
pub struct FieldSchema {
	kind: FieldKind,
	required: bool,
	nullable: bool,
	coerce: bool,
}

impl FieldSchema {
	fn of(kind: FieldKind) -> Self {
		Self {
			kind,
			required: true,
			nullable: false,
			coerce: false,
		}
	}

	#[must_use]
	pub fn text() -> Self {
		Self::of(FieldKind::Text {
			min_len: None,
			max_len: None,
			trim: false,
		})
	}

	#[must_use]
	pub fn integer() -> Self {
		Self::of(FieldKind::Integer {
			min: None,
			max: None,
		})
	}

	#[must_use]
	pub fn number() -> Self {
		Self::of(FieldKind::Number {
			min: None,
			max: None,
		})
	}

	#[must_use]
	pub fn boolean() -> Self {
		Self::of(FieldKind::Boolean)
	}

	#[must_use]
	pub fn date() -> Self {
		Self::of(FieldKind::Date)
	}

	#[must_use]
	pub fn one_of(variants: &'static [&'static str]) -> Self {
		Self::of(FieldKind::OneOf(variants))
	}

	#[must_use]
	pub fn array(item: Self) -> Self {
		Self::of(FieldKind::Array {
			item: Box::new(item),
			min_items: None,
		})
	}

	#[must_use]
	pub fn object(schema: ObjectSchema) -> Self {
		Self::of(FieldKind::Object(schema))
	}

	#[must_use]
	pub fn optional(mut self) -> Self {
		self.required = false;
		self
	}

	#[must_use]
	pub fn nullable(mut self) -> Self {
		self.nullable = true;
		self
	}

	/// Accept the string form of numbers and booleans, and integral floats for integers.
	#[must_use]
	pub fn coerce(mut self) -> Self {
		self.coerce = true;
		self
	}

	/// Lower bound for numbers, minimum length for text, minimum item count for arrays.
	#[must_use]
	pub fn min(mut self, bound: impl Into<f64>) -> Self {
		let bound = bound.into();
		match &mut self.kind {
			FieldKind::Integer { min, .. } | FieldKind::Number { min, .. } => *min = Some(bound),
			FieldKind::Text { min_len, .. } => *min_len = Some(as_count(bound)),
			FieldKind::Array { min_items, .. } => *min_items = Some(as_count(bound)),
			_ => {}
		}
		self
	}

	/// Upper bound for numbers, maximum length for text.
	#[must_use]
	pub fn max(mut self, bound: impl Into<f64>) -> Self {
		let bound = bound.into();
		match &mut self.kind {
			FieldKind::Integer { max, .. } | FieldKind::Number { max, .. } => *max = Some(bound),
			FieldKind::Text { max_len, .. } => *max_len = Some(as_count(bound)),
			_ => {}
		}
		self
	}

	/// Trim surrounding whitespace from text before checking it.
	#[must_use]
	pub fn trim(mut self) -> Self {
		if let FieldKind::Text { trim, .. } = &mut self.kind {
			*trim = true;
		}
		self
	}

	#[must_use]
	pub const fn kind(&self) -> &FieldKind {
		&self.kind
	}

	#[must_use]
	pub const fn is_required(&self) -> bool {
		self.required
	}

	/// `None` means the field is absent from the output, either because it was absent and
	/// optional or because it failed (in which case `errors` says so).
	fn check(&self, value: Option<&Value>, path: &str, errors: &mut ValidationErrors) -> Option<Value> {
		let value = match value {
			None => {
				if self.required {
					errors.add(path, "is required");
				}
				return None;
			}
			Some(Value::Null) if self.nullable => return Some(Value::Null),
			Some(Value::Null) => {
				errors.add(
					path,
					if self.required {
						"is required"
					} else {
						"must not be null"
					},
				);
				return None;
			}
			Some(value) => value,
		};

		match &self.kind {
			FieldKind::Text {
				min_len,
				max_len,
				trim,
			} => {
				let Some(text) = value.as_str() else {
					errors.add(path, "expected string");
					return None;
				};
				let text = if *trim { text.trim() } else { text };
				let len = text.chars().count();

				if let Some(min_len) = min_len.filter(|min_len| len < *min_len) {
					errors.add(path, format!("must be at least {min_len} characters"));
					return None;
				}
				if let Some(max_len) = max_len.filter(|max_len| len > *max_len) {
					errors.add(path, format!("must be at most {max_len} characters"));
					return None;
				}

				Some(Value::String(text.to_string()))
			}

			FieldKind::Integer { min, max } => {
				let Some(int) = self.as_integer(value) else {
					errors.add(path, "expected integer");
					return None;
				};

				#[allow(clippy::cast_precision_loss)]
				let as_float = int as f64;

				check_bounds(as_float, *min, *max, path, errors).then(|| Value::Number(int.into()))
			}

			FieldKind::Number { min, max } => {
				let Some(number) = self.as_number(value) else {
					errors.add(path, "expected number");
					return None;
				};

				check_bounds(number, *min, *max, path, errors)
					.then(|| Number::from_f64(number).map(Value::Number))
					.flatten()
			}

			FieldKind::Boolean => match (value, self.coerce) {
				(Value::Bool(b), _) => Some(Value::Bool(*b)),
				(Value::String(s), true) if s.trim() == "true" => Some(Value::Bool(true)),
				(Value::String(s), true) if s.trim() == "false" => Some(Value::Bool(false)),
				_ => {
					errors.add(path, "expected boolean");
					None
				}
			},

			FieldKind::Date => {
				let parsed = value
					.as_str()
					.and_then(|s| NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok());

				if let Some(date) = parsed {
					Some(Value::String(date.format(DATE_FORMAT).to_string()))
				} else {
					errors.add(path, "expected date (YYYY-MM-DD)");
					None
				}
			}

			FieldKind::OneOf(variants) => {
				if let Some(variant) = value
					.as_str()
					.and_then(|s| variants.iter().find(|v| **v == s))
				{
					Some(Value::String((*variant).to_string()))
				} else {
					errors.add(path, format!("must be one of: {}", variants.join(", ")));
					None
				}
			}

			FieldKind::Array { item, min_items } => {
				let Some(items) = value.as_array() else {
					errors.add(path, "expected array");
					return None;
				};

				if let Some(min_items) = min_items.filter(|min_items| items.len() < *min_items) {
					errors.add(path, format!("must contain at least {min_items} items"));
					return None;
				}

				let before = errors.len();
				let out = items
					.iter()
					.enumerate()
					.filter_map(|(idx, value)| item.check(Some(value), &join_index(path, idx), errors))
					.collect::<Vec<_>>();

				(errors.len() == before).then_some(Value::Array(out))
			}

			FieldKind::Object(schema) => {
				let Some(object) = value.as_object() else {
					errors.add(path, "expected object");
					return None;
				};

				let mut nested = ValidationErrors::new();
				let out = schema.check_object(object, &mut nested);
				if nested.is_empty() {
					Some(Value::Object(out))
				} else {
					errors.extend_nested(path, nested);
					None
				}
			}
		}
	}

	fn as_integer(&self, value: &Value) -> Option<i64> {
		match value {
			Value::Number(n) => n.as_i64().or_else(|| {
				n.as_f64()
					.filter(|f| self.coerce && f.fract() == 0.0)
					.and_then(float_to_i64)
			}),
			Value::String(s) if self.coerce => s.trim().parse().ok(),
			_ => None,
		}
	}

	fn as_number(&self, value: &Value) -> Option<f64> {
		match value {
			Value::Number(n) => n.as_f64(),
			Value::String(s) if self.coerce => s.trim().parse().ok().filter(|f: &f64| f.is_finite()),
			_ => None,
		}
	}
}

/// An object with declared fields, checked in declaration order. Undeclared keys are dropped
/// from the validated value.
#[derive(Debug, Clone)]
pub struct ObjectSchema {
	name: Cow<'static, str>,
	fields: Vec<(Cow<'static, str>, FieldSchema)>,
}

impl ObjectSchema {
	#[must_use]
	pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
		Self {
			name: name.into(),
			fields: Vec::new(),
		}
	}

	#[must_use]
	pub fn field(mut self, name: impl Into<Cow<'static, str>>, field: FieldSchema) -> Self {
		self.fields.push((name.into(), field));
		self
	}

	pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldSchema)> {
		self.fields.iter().map(|(name, field)| (name.as_ref(), field))
	}

	fn check_object(&self, object: &Map<String, Value>, errors: &mut ValidationErrors) -> Map<String, Value> {
		let mut out = Map::new();

		for (name, field) in &self.fields {
			if let Some(value) = field.check(object.get(name.as_ref()), &join_key("", name), errors) {
				out.insert(name.to_string(), value);
			}
		}

		out
	}
}

impl Schema for ObjectSchema {
	fn name(&self) -> &str {
		&self.name
	}

	fn validate(&self, input: &Value) -> ValidationResult {
		let mut errors = ValidationErrors::new();

		let Some(object) = input.as_object() else {
			errors.form("expected object");
			return Err(errors);
		};

		let out = self.check_object(object, &mut errors);
		if errors.is_empty() {
			Ok(Value::Object(out))
		} else {
			Err(errors)
		}
	}
}

fn check_bounds(
	value: f64,
	min: Option<f64>,
	max: Option<f64>,
	path: &str,
	errors: &mut ValidationErrors,
) -> bool {
	if let Some(min) = min.filter(|min| value < *min) {
		errors.add(path, format!("must be >= {min}"));
		return false;
	}
	if let Some(max) = max.filter(|max| value > *max) {
		errors.add(path, format!("must be <= {max}"));
		return false;
	}

	true
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn as_count(bound: f64) -> usize {
	bound.max(0.0) as usize
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn float_to_i64(f: f64) -> Option<i64> {
	(f >= i64::MIN as f64 && f < i64::MAX as f64).then_some(f as i64)
}
