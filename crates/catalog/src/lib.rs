//!
//! # Catalog
//!
//! The print shop's static tables: which resources go stale together, what each role may do,
//! the status vocabularies shared with the backend, and the request schemas every mutation is
//! validated against. Everything here is built once on first use and never changes afterwards.
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

mod contract;
mod permissions;
pub mod resources;
mod status;

pub use contract::{contract, mutation_schema, PAYMENT_METHODS};
pub use permissions::{Permission, Role};
pub use resources::{keys, related_queries};
pub use status::{DesignStatus, OrderStatus, ProductionStatus, ProofingStatus, Vocabulary};
