use std::sync::Arc;

use thiserror::Error;

use super::ResourceKey;

pub type FetchError = Box<dyn std::error::Error + Send + Sync>;

/// A fetch failure handed to every reader that joined the fetch.
pub type SharedFetchError = Arc<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
	#[error("failed to fetch <key='{key}'>: {source}")]
	Fetch {
		key: ResourceKey,
		#[source]
		source: SharedFetchError,
	},
	#[error("fetch task ended without a result <key='{0}'>")]
	FetchAborted(ResourceKey),
	#[error("unsupported query parameter <name='{0}'>: nested objects can't be part of a key")]
	UnsupportedParam(String),
	#[error("query parameters must be a JSON object")]
	ParamsNotAnObject,
	#[error("invalidation batcher is shut down")]
	BatcherClosed,
}
