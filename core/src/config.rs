use std::{
	fs,
	path::{Path, PathBuf},
	time::Duration,
};

use pd_mutation::{MutationOptions, DEFAULT_VALIDATION_FALLBACK};
use pd_query_cache::{InvalidationBatcher, RefetchMode};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

pub const ENV_API_BASE_URL: &str = "PRINTDESK_API_BASE_URL";
pub const ENV_AUTH_TOKEN: &str = "PRINTDESK_AUTH_TOKEN";

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("failed to read config file <path='{}'>: {source}", .path.display())]
	Read {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("failed to write config file <path='{}'>: {source}", .path.display())]
	Write {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("failed to parse config: {0}")]
	Parse(#[from] toml::de::Error),
	#[error("failed to serialize config: {0}")]
	Serialize(#[from] toml::ser::Error),
	#[error("invalid api base url <url='{0}'>: must be an http or https url")]
	InvalidBaseUrl(String),
	#[error("request timeout must be greater than zero")]
	ZeroTimeout,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
	/// Show a toast when a mutation is rejected by its schema.
	pub show_validation_errors: bool,
	/// Toast text when the schema gave no usable message.
	pub validation_fallback: String,
}

impl Default for NotificationConfig {
	fn default() -> Self {
		Self {
			show_validation_errors: true,
			validation_fallback: DEFAULT_VALIDATION_FALLBACK.to_string(),
		}
	}
}

/// Client settings, usually read from a TOML file. Every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
	pub api_base_url: String,
	pub request_timeout_secs: u64,
	/// When invalidated queries refetch.
	pub refetch: RefetchMode,
	/// Window in which pushed invalidations are merged into one pass.
	pub invalidation_throttle_ms: u64,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub auth_token: Option<String>,
	pub notifications: NotificationConfig,
}

impl Default for ClientConfig {
	fn default() -> Self {
		Self {
			api_base_url: "http://localhost:8080/api".to_string(),
			request_timeout_secs: 30,
			refetch: RefetchMode::default(),
			invalidation_throttle_ms: 10,
			auth_token: None,
			notifications: NotificationConfig::default(),
		}
	}
}

impl ClientConfig {
	/// Reads `path`, applies environment overrides and validates the result.
	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		Self::load_with_env(path, |name| std::env::var(name).ok())
	}

	/// Like [`Self::load`], with the environment read through `lookup`.
	pub fn load_with_env(
		path: impl AsRef<Path>,
		lookup: impl Fn(&str) -> Option<String>,
	) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		info!("Loading config from {}", path.display());

		let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
			path: path.to_path_buf(),
			source,
		})?;

		let config = Self::from_toml_str(&raw)?.with_env_overrides(lookup);
		config.validate()?;

		Ok(config)
	}

	pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(raw)?)
	}

	pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
		let path = path.as_ref();

		fs::write(path, toml::to_string_pretty(self)?).map_err(|source| ConfigError::Write {
			path: path.to_path_buf(),
			source,
		})
	}

	/// Replaces the base url and token with whatever `lookup` finds for [`ENV_API_BASE_URL`] and
	/// [`ENV_AUTH_TOKEN`]. Empty values are ignored.
	#[must_use]
	pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
		let lookup = |name| lookup(name).filter(|value: &String| !value.trim().is_empty());

		if let Some(url) = lookup(ENV_API_BASE_URL) {
			debug!(%url, "api base url overridden from environment");
			self.api_base_url = url;
		}

		if let Some(token) = lookup(ENV_AUTH_TOKEN) {
			debug!("auth token overridden from environment");
			self.auth_token = Some(token);
		}

		self
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		let valid_url = Url::parse(&self.api_base_url)
			.is_ok_and(|url| matches!(url.scheme(), "http" | "https") && !url.cannot_be_a_base());

		if !valid_url {
			return Err(ConfigError::InvalidBaseUrl(self.api_base_url.clone()));
		}

		if self.request_timeout_secs == 0 {
			return Err(ConfigError::ZeroTimeout);
		}

		Ok(())
	}

	#[must_use]
	pub const fn request_timeout(&self) -> Duration {
		Duration::from_secs(self.request_timeout_secs)
	}

	/// Zero falls back to the batcher's default window.
	#[must_use]
	pub const fn invalidation_throttle(&self) -> Duration {
		if self.invalidation_throttle_ms == 0 {
			InvalidationBatcher::DEFAULT_THROTTLE
		} else {
			Duration::from_millis(self.invalidation_throttle_ms)
		}
	}

	#[must_use]
	pub fn mutation_options(&self) -> MutationOptions {
		MutationOptions {
			show_validation_errors: self.notifications.show_validation_errors,
			validation_fallback: self.notifications.validation_fallback.clone(),
			..MutationOptions::default()
		}
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashMap;

	use super::*;

	#[test]
	fn empty_file_is_all_defaults() {
		assert_eq!(
			ClientConfig::from_toml_str("").unwrap(),
			ClientConfig::default()
		);
	}

	#[test]
	fn partial_file_keeps_other_defaults() {
		let config = ClientConfig::from_toml_str(
			r#"
			api_base_url = "https://shop.example.com/api"
			refetch = "eager"

			[notifications]
			show_validation_errors = false
			"#,
		)
		.unwrap();

		assert_eq!(config.api_base_url, "https://shop.example.com/api");
		assert_eq!(config.refetch, RefetchMode::Eager);
		assert_eq!(config.request_timeout(), Duration::from_secs(30));
		assert!(!config.notifications.show_validation_errors);
		assert_eq!(
			config.notifications.validation_fallback,
			DEFAULT_VALIDATION_FALLBACK
		);
	}

	#[test]
	fn env_overrides_win_unless_empty() {
		let env = HashMap::from([
			(ENV_API_BASE_URL, "http://10.0.0.2/api".to_string()),
			(ENV_AUTH_TOKEN, "  ".to_string()),
		]);

		let config = ClientConfig {
			auth_token: Some("from-file".into()),
			..ClientConfig::default()
		}
		.with_env_overrides(|name| env.get(name).cloned());

		assert_eq!(config.api_base_url, "http://10.0.0.2/api");
		assert_eq!(config.auth_token.as_deref(), Some("from-file"));
	}

	#[test]
	fn validation() {
		assert!(ClientConfig::default().validate().is_ok());

		for url in ["ftp://shop/api", "localhost:8080", ""] {
			let config = ClientConfig {
				api_base_url: url.to_string(),
				..ClientConfig::default()
			};
			assert!(matches!(
				config.validate(),
				Err(ConfigError::InvalidBaseUrl(_))
			));
		}

		let config = ClientConfig {
			request_timeout_secs: 0,
			..ClientConfig::default()
		};
		assert!(matches!(config.validate(), Err(ConfigError::ZeroTimeout)));
	}

	#[test]
	fn zero_throttle_uses_the_default_window() {
		let config = ClientConfig {
			invalidation_throttle_ms: 0,
			..ClientConfig::default()
		};

		assert_eq!(config.invalidation_throttle(), Duration::from_millis(10));
	}
}
