//!
//! # Query Cache
//!
//! Structured keys for backend resources, a process-wide stale-while-revalidate cache keyed by
//! them, and the coordinator that marks related resources stale after a mutation.
//!
//! Keys follow a fixed shape per resource root: `[root, "list"]`, `[root, "list", params]` and
//! `[root, "detail", id]`. Invalidation always works on whole roots; the [`RelatedQueries`] table
//! says which other roots a change to one root touches.
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

mod batcher;
mod cache;
mod coordinator;
mod entry;
mod error;
mod key;
mod related;

pub use batcher::InvalidationBatcher;
pub use cache::{CacheEvent, QueryCache, QueryFetcher, RefetchMode};
pub use coordinator::{InvalidationCoordinator, InvalidationReport};
pub use entry::{CachedEntry, EntryState};
pub use error::{Error, FetchError, SharedFetchError};
pub use key::{KeyPrefix, ParamValue, QueryKeys, QueryParams, ResourceId, ResourceKey, Segment};
pub use related::RelatedQueries;
