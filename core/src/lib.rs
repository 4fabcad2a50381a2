//!
//! # Printdesk
//!
//! Client-side data layer of the printdesk shop manager. A [`Client`] ties together the HTTP
//! transport, the shared query cache, the related-queries table and the request contract:
//!
//! ```no_run
//! use pd_core::{Client, ClientConfig, Method};
//! use serde_json::{json, Value};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::new(ClientConfig::load("printdesk.toml")?)?;
//!
//! let orders = client.keys("orders");
//! let list = client.read(&orders.list()).await?;
//! println!("{} orders ({:?})", list.value.as_array().map_or(0, Vec::len), list.state);
//!
//! // Invalid input is rejected before any request; success marks orders, designs,
//! // proofing-orders, productions and accountings stale.
//! let created: Value = client
//! 	.mutation("orders", Method::Post)
//! 	.execute(&json!({ "quantity": 250 }))
//! 	.await?;
//! # Ok(())
//! # }
//! ```
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

mod client;
mod config;
mod error;
mod logging;

pub use client::Client;
pub use config::{ClientConfig, ConfigError, NotificationConfig, ENV_API_BASE_URL, ENV_AUTH_TOKEN};
pub use error::Error;
pub use logging::{init_tracing, DEFAULT_DIRECTIVES};

pub use pd_catalog as catalog;
pub use pd_mutation::{
	ChannelNotifier, MutationError, MutationOptions, Notification, Notifier, ResourceError,
	ResourceMutation, TracingNotifier, ValidationFailure, Variant,
};
pub use pd_query_cache::{
	CacheEvent, CachedEntry, EntryState, InvalidationBatcher, InvalidationReport, KeyPrefix,
	QueryKeys, QueryParams, RefetchMode, ResourceId, ResourceKey,
};
pub use pd_transport::{Method, Transport, TransportError, TransportRequest};
