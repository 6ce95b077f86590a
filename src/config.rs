//! Config: the `init/config.yaml` schema and its loading rules.
//!
//! Priority for the API token only: config file value, falling back to the
//! `OUTLINE_API_TOKEN` environment variable. Every other field comes from
//! the config file alone; there is no CLI-flag override layer because the
//! CLI surface carries only `--config`, `--dry-run`, `-v`.

use crate::error::SyncError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "init/config.yaml";
const TOKEN_ENV_VAR: &str = "OUTLINE_API_TOKEN";

/// Deserialized shape of `init/config.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
	pub api_base_url: String,

	#[serde(default)]
	pub api_token: Option<String>,

	/// Omitted to trigger interactive selection via `CollectionPicker`.
	#[serde(default)]
	pub collection_id: Option<String>,

	pub sync_root: PathBuf,
}

impl Config {
	/// Load and parse `path`, resolving the API token against
	/// `OUTLINE_API_TOKEN` when the file doesn't set one.
	pub async fn load(path: &Path) -> Result<Config, SyncError> {
		let contents = tokio::fs::read_to_string(path).await.map_err(|source| SyncError::Io {
			message: format!("cannot read config file {}", path.display()),
			source,
		})?;

		let mut config: Config = serde_yaml::from_str(&contents).map_err(|e| SyncError::Config {
			message: format!("{} is not valid: {}", path.display(), e),
		})?;

		if config.api_token.is_none() {
			config.api_token = std::env::var(TOKEN_ENV_VAR).ok();
		}

		Ok(config)
	}

	/// The resolved token, or a `Config` error naming where it should have
	/// come from.
	pub fn require_token(&self) -> Result<&str, SyncError> {
		self.api_token.as_deref().ok_or_else(|| SyncError::Config {
			message: format!(
				"no api_token in config and {} is not set",
				TOKEN_ENV_VAR
			),
		})
	}
}


// vim: ts=4
