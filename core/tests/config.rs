use pd_core::{
	ClientConfig, ConfigError, NotificationConfig, RefetchMode, ENV_API_BASE_URL, ENV_AUTH_TOKEN,
};

use std::{fs, path::Path};

use tempfile::TempDir;
use tracing_test::traced_test;

fn load(path: &Path) -> Result<ClientConfig, ConfigError> {
	ClientConfig::load_with_env(path, |_| None)
}

#[test]
#[traced_test]
fn saved_config_loads_back() {
	let dir = TempDir::new().unwrap();
	let path = dir.path().join("printdesk.toml");

	let config = ClientConfig {
		api_base_url: "https://print.example.com/api".into(),
		request_timeout_secs: 5,
		refetch: RefetchMode::Eager,
		notifications: NotificationConfig {
			show_validation_errors: false,
			validation_fallback: "Check the order form".into(),
		},
		..ClientConfig::default()
	};
	config.save(&path).unwrap();

	assert_eq!(load(&path).unwrap(), config);
	assert!(logs_contain("Loading config from"));
}

#[test]
fn partial_files_keep_defaults() {
	let dir = TempDir::new().unwrap();
	let path = dir.path().join("printdesk.toml");
	fs::write(&path, "request_timeout_secs = 12\n").unwrap();

	let config = load(&path).unwrap();

	assert_eq!(config.request_timeout_secs, 12);
	assert_eq!(config.invalidation_throttle_ms, 10);
	assert!(config.notifications.show_validation_errors);
}

#[test]
fn load_errors_name_the_problem() {
	let dir = TempDir::new().unwrap();

	let missing = dir.path().join("missing.toml");
	assert!(matches!(
		load(&missing),
		Err(ConfigError::Read { path, .. }) if path == missing
	));

	let broken = dir.path().join("broken.toml");
	fs::write(&broken, "request_timeout_secs = \"soon\"\n").unwrap();
	assert!(matches!(load(&broken), Err(ConfigError::Parse(_))));

	let zero = dir.path().join("zero.toml");
	fs::write(&zero, "request_timeout_secs = 0\n").unwrap();
	assert!(matches!(load(&zero), Err(ConfigError::ZeroTimeout)));

	let ftp = dir.path().join("ftp.toml");
	fs::write(&ftp, "api_base_url = \"ftp://files.local\"\n").unwrap();
	assert!(matches!(
		load(&ftp),
		Err(ConfigError::InvalidBaseUrl(url)) if url == "ftp://files.local"
	));
}

#[test]
fn environment_overrides_the_file() {
	let dir = TempDir::new().unwrap();
	let path = dir.path().join("printdesk.toml");
	fs::write(&path, "api_base_url = \"ftp://files.local\"\n").unwrap();

	let config = ClientConfig::load_with_env(&path, |name| match name {
		ENV_API_BASE_URL => Some("https://print.example.com/api".into()),
		ENV_AUTH_TOKEN => Some("secret".into()),
		_ => None,
	})
	.unwrap();

	assert_eq!(config.api_base_url, "https://print.example.com/api");
	assert_eq!(config.auth_token.as_deref(), Some("secret"));
}

#[test]
fn saving_into_a_missing_directory_fails() {
	let dir = TempDir::new().unwrap();
	let path = dir.path().join("nested").join("printdesk.toml");

	assert!(matches!(
		ClientConfig::default().save(&path),
		Err(ConfigError::Write { .. })
	));
}
