//! CollectionPicker: interactive collection selection when
//! `Config::collection_id` is omitted from `init/config.yaml`.
//!
//! An external collaborator in the same sense as `RemoteGateway`: the
//! reconciliation engine never calls into this module itself, only
//! `main` does, before constructing the `Orchestrator`.

use crate::error::SyncError;
use crate::remote::{Collection, RemoteGateway};
use dialoguer::Select;

/// Resolve the collection to sync: the configured id if present, otherwise
/// an interactive prompt over every collection the token can see.
pub async fn resolve(
	gateway: &dyn RemoteGateway,
	configured: Option<&str>,
) -> Result<String, SyncError> {
	if let Some(id) = configured {
		return Ok(id.to_string());
	}

	let collections = gateway.list_collections().await.map_err(SyncError::from)?;
	if collections.is_empty() {
		return Err(SyncError::Config {
			message: "no collections available to sync and none configured".to_string(),
		});
	}
	if collections.len() == 1 {
		return Ok(collections[0].id.clone());
	}

	let labels: Vec<&str> = collections.iter().map(|c| c.name.as_str()).collect();
	let choice = Select::new()
		.with_prompt("Select a collection to sync")
		.items(&labels)
		.default(0)
		.interact()
		.map_err(|e| SyncError::Config { message: format!("collection selection failed: {}", e) })?;

	Ok(collections[choice].id.clone())
}


// vim: ts=4
