//! Configuration loader with environment variable substitution.

use std::collections::HashSet;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use crate::types::Config;

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("file not found: {0}")]
	FileNotFound(String),

	#[error("parse error: {0}")]
	Parse(String),

	#[error("validation error: {0}")]
	Validation(String),

	#[error("environment variable not found: {0}")]
	EnvVarNotFound(String),

	#[error("io error: {0}")]
	Io(#[from] std::io::Error),
}

/// Loads a TOML configuration file, substituting `${VAR}` references and
/// applying environment overrides before validation.
#[derive(Default)]
pub struct ConfigLoader {
	file_path: Option<String>,
	env_prefix: String,
}

impl ConfigLoader {
	pub fn new() -> Self {
		Self {
			file_path: None,
			env_prefix: "CHAINBLOG_".to_string(),
		}
	}

	pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
		self.file_path = Some(path.as_ref().to_string_lossy().to_string());
		self
	}

	pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.env_prefix = prefix.into();
		self
	}

	pub async fn load(&self) -> Result<Config, ConfigError> {
		let mut config = if let Some(file_path) = &self.file_path {
			self.load_from_file(file_path).await?
		} else {
			return Err(ConfigError::FileNotFound(
				"no configuration file specified".to_string(),
			));
		};

		self.apply_env_overrides(&mut config)?;
		self.validate_config(&config)?;

		Ok(config)
	}

	async fn load_from_file(&self, file_path: &str) -> Result<Config, ConfigError> {
		let content = match tokio::fs::read_to_string(file_path).await {
			Ok(content) => content,
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
				return Err(ConfigError::FileNotFound(file_path.to_string()));
			}
			Err(err) => return Err(err.into()),
		};

		let substituted_content = self.substitute_env_vars(&content)?;

		let config: Config = toml::from_str(&substituted_content)
			.map_err(|e| ConfigError::Parse(e.to_string()))?;

		debug!(path = file_path, networks = config.networks.len(), "configuration loaded");
		Ok(config)
	}

	fn substitute_env_vars(&self, content: &str) -> Result<String, ConfigError> {
		let mut result = content.to_string();

		// Find and replace ${VAR_NAME} patterns
		let re = regex::Regex::new(r"\$\{([^}]+)\}").unwrap();

		for cap in re.captures_iter(content) {
			let full_match = &cap[0];
			let var_name = &cap[1];

			let env_value = env::var(var_name)
				.map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;

			result = result.replace(full_match, &env_value);
		}

		Ok(result)
	}

	fn apply_env_overrides(&self, config: &mut Config) -> Result<(), ConfigError> {
		if let Ok(confirmations) = env::var(format!("{}CONFIRMATIONS", self.env_prefix)) {
			config.session.confirmations = confirmations.parse().map_err(|e| {
				ConfigError::Validation(format!("invalid confirmations override: {}", e))
			})?;
		}

		Ok(())
	}

	fn validate_config(&self, config: &Config) -> Result<(), ConfigError> {
		if config.networks.is_empty() {
			return Err(ConfigError::Validation(
				"at least one network must be configured".to_string(),
			));
		}

		let mut seen = HashSet::new();
		for entry in &config.networks {
			let descriptor = entry.to_descriptor()?;

			if !seen.insert(descriptor.chain_id) {
				return Err(ConfigError::Validation(format!(
					"duplicate chain id {} in network table",
					descriptor.chain_id
				)));
			}

			if !descriptor.rpc_url.starts_with("http://")
				&& !descriptor.rpc_url.starts_with("https://")
			{
				return Err(ConfigError::Validation(format!(
					"network `{}` rpc_url must start with http:// or https://",
					descriptor.name
				)));
			}
		}

		Ok(())
	}
}
