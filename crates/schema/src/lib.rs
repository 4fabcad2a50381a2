//!
//! # Schema Contract
//!
//! A fixed set of named validators, each one a pure function from a JSON value to either the
//! validated (and possibly coerced) value or a set of per-field error messages.
//!
//! The mutation layer only relies on the [`Schema`] trait, so the validators can come from any
//! source. [`ObjectSchema`] is the declarative implementation used by the printdesk request
//! contract: declared fields are checked in order, unknown keys are stripped and fields marked
//! with [`FieldSchema::coerce`] accept their string form (`"5"` becomes `5`).
//!
//! ```
//! use pd_schema::{FieldSchema, ObjectSchema, Schema};
//! use serde_json::json;
//!
//! let schema = ObjectSchema::new("OrderCreate")
//! 	.field("quantity", FieldSchema::integer().min(0).coerce());
//!
//! assert_eq!(
//! 	schema.validate(&json!({ "quantity": "12" })).unwrap(),
//! 	json!({ "quantity": 12 })
//! );
//!
//! let errors = schema.validate(&json!({ "quantity": -1 })).unwrap_err();
//! assert_eq!(errors.get("quantity"), Some(&["must be >= 0".to_string()][..]));
//! ```

#![warn(
	clippy::all,
	clippy::pedantic,
	clippy::correctness,
	clippy::perf,
	clippy::style,
	clippy::suspicious,
	clippy::complexity,
	clippy::nursery,
	clippy::unwrap_used,
	unused_qualifications,
	rust_2018_idioms,
	trivial_casts,
	trivial_numeric_casts,
	unused_allocation,
	clippy::unnecessary_cast,
	clippy::cast_lossless,
	clippy::cast_possible_truncation,
	clippy::cast_possible_wrap,
	clippy::cast_precision_loss,
	clippy::cast_sign_loss,
	clippy::dbg_macro,
	clippy::deprecated_cfg_attr,
	clippy::separated_literal_suffix,
	deprecated
)]
#![forbid(deprecated_in_future)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

mod error;
mod object;
mod registry;
mod schema;

pub use error::{Error, FieldError, ValidationErrors};
pub use object::{FieldKind, FieldSchema, ObjectSchema};
pub use registry::SchemaRegistry;
pub use schema::{schema_fn, FnSchema, Schema, ValidationResult};
