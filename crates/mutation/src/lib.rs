//!
//! # Mutations
//!
//! Wraps backend writes so that invalid input never leaves the client and successful writes
//! leave no stale data behind.
//!
//! [`ValidatedMutation`] is the generic gate: schema validation, one notification on failure and
//! either an error ([`ValidatedMutation::execute`]) or a silent abort
//! ([`ValidatedMutation::fire`]). [`ResourceMutation`] binds that gate to a backend resource,
//! sends the validated payload through a [`pd_transport::Transport`] and invalidates the affected
//! queries afterwards.
//!
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
mod notify;
mod resource;
mod wrapper;

pub use error::{MutationError, ResourceError, ValidationFailure};
pub use notify::{ChannelNotifier, Notification, Notifier, TracingNotifier, Variant};
pub use resource::ResourceMutation;
pub use wrapper::{
	MutationOptions, ValidatedMutation, DEFAULT_VALIDATION_FALLBACK, VALIDATION_ERROR_TITLE,
};
