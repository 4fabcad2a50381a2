use pd_transport::TransportError;
use thiserror::Error;

use super::ConfigError;

#[derive(Debug, Error)]
pub enum Error {
	#[error(transparent)]
	Config(#[from] ConfigError),
	#[error(transparent)]
	Transport(#[from] TransportError),
	#[error(transparent)]
	Cache(#[from] pd_query_cache::Error),
	#[error(transparent)]
	Schema(#[from] pd_schema::Error),
}
