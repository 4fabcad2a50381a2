//!
//! # Transport
//!
//! The seam between printdesk and its backend. Mutations and cache refetches only see the
//! [`Transport`] trait; [`HttpTransport`] is the implementation used against the real API and
//! also serves as the cache's [`pd_query_cache::QueryFetcher`].
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
mod http;
mod request;

pub use error::TransportError;
pub use http::{HttpTransport, REQUEST_ID_HEADER};
pub use request::{Method, Transport, TransportRequest};
