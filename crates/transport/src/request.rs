use async_trait::async_trait;
use pd_query_cache::{ResourceId, ResourceKey};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

use super::TransportError;

#[derive(
	Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Method {
	Get,
	Post,
	Put,
	Patch,
	Delete,
}

impl From<Method> for reqwest::Method {
	fn from(method: Method) -> Self {
		match method {
			Method::Get => Self::GET,
			Method::Post => Self::POST,
			Method::Put => Self::PUT,
			Method::Patch => Self::PATCH,
			Method::Delete => Self::DELETE,
		}
	}
}

/// One call against a backend resource.
///
/// `payload` is the query string for `GET` and the JSON body for everything else.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransportRequest {
	pub resource: String,
	pub method: Method,
	pub id: Option<ResourceId>,
	pub payload: Option<Value>,
}

impl TransportRequest {
	pub fn new(resource: impl Into<String>, method: Method) -> Self {
		Self {
			resource: resource.into(),
			method,
			id: None,
			payload: None,
		}
	}

	#[must_use]
	pub fn with_id(mut self, id: impl Into<ResourceId>) -> Self {
		self.id = Some(id.into());
		self
	}

	#[must_use]
	pub fn with_payload(mut self, payload: Value) -> Self {
		self.payload = Some(payload);
		self
	}

	/// The `GET` that loads whatever `key` names.
	#[must_use]
	pub fn for_key(key: &ResourceKey) -> Self {
		Self {
			resource: key.root().to_string(),
			method: Method::Get,
			id: key.id().cloned(),
			payload: key.params().map(pd_query_cache::QueryParams::to_json),
		}
	}
}

#[async_trait]
pub trait Transport: Send + Sync + 'static {
	async fn call(&self, request: TransportRequest) -> Result<Value, TransportError>;
}
