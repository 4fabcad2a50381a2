use std::time::Duration;

use async_trait::async_trait;
use pd_query_cache::{FetchError, QueryFetcher, QueryParams, ResourceId, ResourceKey};
use reqwest::Url;
use serde_json::Value;
use tracing::{debug, field, instrument, Span};
use uuid::Uuid;

use super::{Method, Transport, TransportError, TransportRequest};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// [`Transport`] over HTTP with JSON bodies.
///
/// Resources live at `<base>/<resource>` and single records at `<base>/<resource>/<id>`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
	client: reqwest::Client,
	base_url: Url,
	auth_token: Option<String>,
}

impl HttpTransport {
	pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
		let base_url = parse_base_url(base_url)?;
		let client = reqwest::Client::builder().timeout(timeout).build()?;

		Ok(Self {
			client,
			base_url,
			auth_token: None,
		})
	}

	#[must_use]
	pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
		self.auth_token = Some(token.into());
		self
	}

	pub const fn base_url(&self) -> &Url {
		&self.base_url
	}

	pub fn endpoint(&self, resource: &str, id: Option<&ResourceId>) -> Result<Url, TransportError> {
		endpoint(&self.base_url, resource, id)
	}
}

#[async_trait]
impl Transport for HttpTransport {
	#[instrument(
		skip(self, request),
		fields(resource = %request.resource, method = %request.method, request_id = field::Empty),
		err
	)]
	async fn call(&self, request: TransportRequest) -> Result<Value, TransportError> {
		let url = self.endpoint(&request.resource, request.id.as_ref())?;

		let request_id = Uuid::new_v4();
		Span::current().record("request_id", field::display(request_id));

		let mut req = self
			.client
			.request(request.method.into(), url)
			.header(REQUEST_ID_HEADER, request_id.to_string());

		if let Some(token) = &self.auth_token {
			req = req.bearer_auth(token);
		}

		match (request.method, &request.payload) {
			(Method::Get, Some(payload)) => {
				req = req.query(&QueryParams::from_json(payload)?.to_query_pairs());
			}
			(_, Some(payload)) => req = req.json(payload),
			(_, None) => {}
		}

		let response = req.send().await?;
		let status = response.status();
		let body = response.bytes().await?;

		debug!(%status, bytes = body.len(), "backend responded");

		if !status.is_success() {
			return Err(TransportError::Status {
				status: status.as_u16(),
				body: String::from_utf8_lossy(&body).into_owned(),
			});
		}

		if body.iter().all(u8::is_ascii_whitespace) {
			return Ok(Value::Null);
		}

		Ok(serde_json::from_slice(&body)?)
	}
}

#[async_trait]
impl QueryFetcher for HttpTransport {
	async fn fetch(&self, key: &ResourceKey) -> Result<Value, FetchError> {
		self.call(TransportRequest::for_key(key))
			.await
			.map_err(Into::into)
	}
}

fn parse_base_url(raw: &str) -> Result<Url, TransportError> {
	let url = Url::parse(raw).map_err(|e| TransportError::InvalidUrl(format!("{raw}: {e}")))?;

	if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
		return Err(TransportError::InvalidUrl(raw.to_string()));
	}

	Ok(url)
}

fn endpoint(base: &Url, resource: &str, id: Option<&ResourceId>) -> Result<Url, TransportError> {
	let mut url = base.clone();

	{
		let mut segments = url
			.path_segments_mut()
			.map_err(|()| TransportError::InvalidUrl(base.to_string()))?;

		segments
			.pop_if_empty()
			.extend(resource.split('/').filter(|segment| !segment.is_empty()));

		if let Some(id) = id {
			segments.push(&id.to_string());
		}
	}

	Ok(url)
}
