//! StateStore: load and persist the sidecar state file.
//!
//! `load()` degrades a missing or malformed sidecar to an empty
//! `SyncState` rather than erroring: a missing, truncated, or
//! schema-shifted sidecar must degrade to a safe first-run, never to
//! destructive action. `save()` writes atomically (temp file + rename).

use crate::error::StateError;
use crate::logging::*;
use crate::scanner::{LocalFile, SIDECAR_NAME};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One entry of the previous remote listing, as last observed. Field names
/// are already snake_case in Rust, so no `rename_all` is needed: the JSON
/// keys (`short_id`, `parent_id`, `updated_at`, `local_path`, `is_folder`)
/// fall out without a rename pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMappingEntry {
	pub id: String,
	#[serde(skip_serializing_if = "Option::is_none", default)]
	pub short_id: Option<String>,
	pub title: String,
	pub parent_id: Option<String>,
	pub updated_at: DateTime<Utc>,
	pub local_path: String,
	pub is_folder: bool,
}

/// Persisted at `<root>/.outline` as JSON. The only fields consumed by
/// change detection are `last_sync`, `document_mapping`, and
/// `local_files`; `extra` preserves any fields this engine doesn't know
/// about, so a round-trip never drops data added by a future schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncState {
	#[serde(skip_serializing_if = "Option::is_none", default)]
	pub last_sync: Option<DateTime<Utc>>,
	#[serde(default)]
	pub collection_id: String,
	#[serde(default)]
	pub document_mapping: Vec<DocumentMappingEntry>,
	#[serde(default)]
	pub local_files: Vec<LocalFile>,
	#[serde(flatten)]
	pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SyncState {
	/// True for a never-synced root: absent or malformed sidecar.
	pub fn is_first_run(&self) -> bool {
		self.last_sync.is_none()
	}

	pub fn mapping_by_id(&self, id: &str) -> Option<&DocumentMappingEntry> {
		self.document_mapping.iter().find(|e| e.id == id || e.short_id.as_deref() == Some(id))
	}

	pub fn local_files_by_path(&self) -> std::collections::HashMap<String, &LocalFile> {
		self.local_files.iter().map(|f| (f.rel_path.clone(), f)).collect()
	}

	/// Translate a locally-stored identifier (which may be a `shortId`) into
	/// its canonical `id`, per the previous mapping. Falls back to `id`
	/// unchanged when it isn't found, so a never-synced id still round-trips.
	pub fn canonicalize(&self, id: &str) -> String {
		self.document_mapping
			.iter()
			.find(|e| e.id == id || e.short_id.as_deref() == Some(id))
			.map(|e| e.id.clone())
			.unwrap_or_else(|| id.to_string())
	}
}

impl DocumentMappingEntry {
	/// True if `doc` is the same remote document this entry last observed,
	/// considering either identifier form on either side.
	pub fn matches_doc(&self, doc: &crate::remote::RemoteDoc) -> bool {
		self.id == doc.id
			|| self.short_id.as_deref() == Some(doc.id.as_str())
			|| doc.short_id.as_deref() == Some(self.id.as_str())
			|| (self.short_id.is_some() && self.short_id == doc.short_id)
	}
}

pub struct StateStore {
	sidecar_path: PathBuf,
}

impl StateStore {
	pub fn new(root: &Path) -> Self {
		StateStore { sidecar_path: root.join(SIDECAR_NAME) }
	}

	/// Load the sidecar. Returns an empty `SyncState` (not an error) when
	/// the file is absent or fails to parse.
	pub async fn load(&self) -> SyncState {
		let contents = match tokio::fs::read_to_string(&self.sidecar_path).await {
			Ok(contents) => contents,
			Err(_) => return SyncState::default(),
		};

		match serde_json::from_str(&contents) {
			Ok(state) => state,
			Err(e) => {
				warn!(
					"sidecar {} is corrupted, treating as first run: {}",
					self.sidecar_path.display(),
					e
				);
				SyncState::default()
			}
		}
	}

	/// Write the sidecar atomically: write to a temp file in the same
	/// directory, then rename into place.
	pub async fn save(&self, state: &SyncState) -> Result<(), StateError> {
		let json = serde_json::to_string_pretty(state).map_err(|e| StateError::SaveFailed {
			source: std::io::Error::new(std::io::ErrorKind::Other, e),
		})?;

		let dir = self.sidecar_path.parent().unwrap_or_else(|| Path::new("."));
		let tmp_path = dir.join(format!(".{}.tmp", SIDECAR_NAME));

		tokio::fs::write(&tmp_path, json.as_bytes())
			.await
			.map_err(|source| StateError::SaveFailed { source })?;

		tokio::fs::rename(&tmp_path, &self.sidecar_path)
			.await
			.map_err(|source| StateError::SaveFailed { source })?;

		Ok(())
	}
}
