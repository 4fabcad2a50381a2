use thiserror::Error;

/// Failures of a backend call. Callers get them unchanged; nothing here is retried.
#[derive(Debug, Error)]
pub enum TransportError {
	#[error("network error: {0}")]
	Network(String),
	#[error("request timed out")]
	Timeout,
	#[error("backend answered with status {status}: {body}")]
	Status { status: u16, body: String },
	#[error("failed to decode response body: {0}")]
	Decode(#[from] serde_json::Error),
	#[error("invalid url <url='{0}'>")]
	InvalidUrl(String),
	#[error("payload can't be sent as a query string: {0}")]
	Query(#[from] pd_query_cache::Error),
}

impl TransportError {
	/// Whether the backend rejected the request itself, as opposed to never answering.
	#[must_use]
	pub const fn is_status(&self) -> bool {
		matches!(self, Self::Status { .. })
	}

	#[must_use]
	pub const fn status(&self) -> Option<u16> {
		match self {
			Self::Status { status, .. } => Some(*status),
			_ => None,
		}
	}
}

impl From<reqwest::Error> for TransportError {
	fn from(e: reqwest::Error) -> Self {
		if e.is_timeout() {
			Self::Timeout
		} else if e.is_decode() {
			Self::Network(format!("failed to read response: {e}"))
		} else {
			Self::Network(e.to_string())
		}
	}
}
