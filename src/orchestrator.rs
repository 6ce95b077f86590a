//! Orchestrator: sequences the five phases (Scan, Detect, Conflict,
//! Execute, Persist) and owns fatal-error handling.
//!
//! A linear sequence of awaited stages, each one a total barrier over the
//! previous.

use crate::change_detector::{self, LocalChangeSet, RemoteChangeSet};
use crate::conflict::{self, Conflict};
use crate::error::{FileOpError, SyncError};
use crate::hierarchy::Hierarchy;
use crate::logging::*;
use crate::parent_converter;
use crate::path_mapper;
use crate::pull_engine;
use crate::push_engine;
use crate::remote::RemoteGateway;
use crate::scanner;
use crate::state::{DocumentMappingEntry, StateStore, SyncState};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub enum RunOutcome {
	/// Phase 4 ran (or would have, under `--dry-run`) and new state was
	/// persisted.
	Clean,

	/// Phase 3 found at least one conflict. Neither side was mutated and
	/// the sidecar was not rewritten; exits 0 regardless.
	ConflictsFound(Vec<Conflict>),
}

pub struct Orchestrator<'a> {
	root: PathBuf,
	collection_id: String,
	gateway: &'a dyn RemoteGateway,
}

impl<'a> Orchestrator<'a> {
	pub fn new(root: PathBuf, collection_id: String, gateway: &'a dyn RemoteGateway) -> Self {
		Orchestrator { root, collection_id, gateway }
	}

	pub async fn run(&self, dry_run: bool) -> Result<RunOutcome, SyncError> {
		// Phase 1: Scan.
		let local_snapshot = scanner::scan(&self.root).await?;
		let state_store = StateStore::new(&self.root);
		let prev_state = state_store.load().await;

		let remote_docs = self
			.gateway
			.list_documents(&self.collection_id)
			.await
			.map_err(SyncError::from)?;
		let hierarchy = Hierarchy::build(remote_docs.clone())
			.map_err(|e| SyncError::InvariantViolation {
				message: format!("cycle detected in remote hierarchy at document {}", e.id),
			})?;
		let assignment = path_mapper::assign(&hierarchy);

		// Phase 2: Detect.
		let local_changes = change_detector::detect_local_changes(&prev_state, &local_snapshot);
		let remote_changes = change_detector::detect_remote_changes(&prev_state, &remote_docs);

		// Phase 3: Conflict.
		let conflicts =
			conflict::detect(&local_changes, &remote_changes, |id| prev_state.canonicalize(id));
		if !conflicts.is_empty() {
			info!("{} conflict(s) found, halting before any mutation", conflicts.len());
			return Ok(RunOutcome::ConflictsFound(conflicts));
		}

		if dry_run {
			log_planned_operations(&local_changes, &remote_changes);
			return Ok(RunOutcome::Clean);
		}

		// Phase 4: Execute.
		self.promote_newly_parented_docs(&hierarchy, &prev_state).await;

		if let Err(e) = push_engine::run(
			&self.root,
			self.gateway,
			&self.collection_id,
			&hierarchy,
			&prev_state,
			&local_snapshot,
			&local_changes,
		)
		.await
		{
			return Err(SyncError::Io {
				message: "push phase failed".to_string(),
				source: e,
			});
		}

		if let Err(e) = pull_engine::run(
			&self.root,
			&hierarchy,
			&assignment,
			&prev_state,
			&local_snapshot,
			&remote_changes,
		)
		.await
		{
			return Err(SyncError::Io {
				message: "pull phase failed".to_string(),
				source: e,
			});
		}

		// Phase 5: Persist. Re-derive both snapshots so the new state
		// reflects exactly what Phase 4 left on disk and on the remote,
		// rather than requiring every engine to report its own deltas.
		let final_local = scanner::scan(&self.root).await?;
		let final_remote = self
			.gateway
			.list_documents(&self.collection_id)
			.await
			.map_err(SyncError::from)?;
		let final_hierarchy = Hierarchy::build(final_remote).map_err(|e| SyncError::InvariantViolation {
			message: format!("cycle detected in remote hierarchy at document {}", e.id),
		})?;
		let final_assignment = path_mapper::assign(&final_hierarchy);

		let new_state = SyncState {
			last_sync: Some(chrono::Utc::now()),
			collection_id: self.collection_id.clone(),
			document_mapping: final_hierarchy
				.all_docs()
				.map(|doc| DocumentMappingEntry {
					id: doc.id.clone(),
					short_id: doc.short_id.clone(),
					title: doc.title.clone(),
					parent_id: doc.parent_id.clone(),
					updated_at: doc.updated_at,
					local_path: final_assignment.get(&doc.id).cloned().unwrap_or_default(),
					is_folder: final_hierarchy.is_parent(&doc.id),
				})
				.collect(),
			local_files: final_local.into_values().collect(),
			extra: prev_state.extra.clone(),
		};

		state_store.save(&new_state).await?;
		Ok(RunOutcome::Clean)
	}

	/// Promote any document that gained a child since the previous run but
	/// whose local representation is still a standalone file.
	/// Runs before `PushEngine` so newly-created child documents resolve a
	/// valid parent directory.
	async fn promote_newly_parented_docs(&self, hierarchy: &Hierarchy, prev_state: &SyncState) {
		for entry in &prev_state.document_mapping {
			if entry.is_folder {
				continue;
			}
			if !hierarchy.contains(&entry.id) || !hierarchy.is_parent(&entry.id) {
				continue;
			}
			let title = hierarchy.doc(&entry.id).map(|d| d.title.clone()).unwrap_or_else(|| entry.title.clone());
			match parent_converter::promote(&self.root, &entry.local_path, &title, &entry.id).await {
				Ok(new_path) => info!("promoted {} to {}", entry.local_path, new_path),
				Err(source) => warn!(
					"failed to promote: {}",
					FileOpError { path: scanner::to_fs_path(&self.root, &entry.local_path), source }
				),
			}
		}
	}
}

fn log_planned_operations(local_changes: &LocalChangeSet, remote_changes: &RemoteChangeSet) {
	info!(
		"dry run: would push {} new, {} modified, {} moved, {} deleted local file(s)",
		local_changes.new_files.len(),
		local_changes.modified_files.len(),
		local_changes.moved_files.len(),
		local_changes.deleted_files.len(),
	);
	info!(
		"dry run: would pull {} new, {} updated, {} deleted remote document(s)",
		remote_changes.new_docs.len(),
		remote_changes.updated_docs.len(),
		remote_changes.deleted_docs.len(),
	);
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::remote::{Collection, RemoteDoc, RemoteResult};
	use async_trait::async_trait;
	use std::sync::Mutex;
	use tempfile::tempdir;

	#[derive(Default)]
	struct FakeGateway {
		docs: Mutex<Vec<RemoteDoc>>,
	}

	#[async_trait]
	impl RemoteGateway for FakeGateway {
		async fn list_collections(&self) -> RemoteResult<Vec<Collection>> {
			Ok(vec![])
		}
		async fn list_documents(&self, _collection_id: &str) -> RemoteResult<Vec<RemoteDoc>> {
			Ok(self.docs.lock().unwrap().clone())
		}
		async fn create_document(
			&self,
			_collection_id: &str,
			title: &str,
			text: &str,
			parent_id: Option<&str>,
		) -> RemoteResult<RemoteDoc> {
			let doc = RemoteDoc {
				id: format!("gen-{}", self.docs.lock().unwrap().len()),
				short_id: None,
				title: title.to_string(),
				text: text.to_string(),
				parent_id: parent_id.map(|p| p.to_string()),
				created_at: chrono::Utc::now(),
				updated_at: chrono::Utc::now(),
			};
			self.docs.lock().unwrap().push(doc.clone());
			Ok(doc)
		}
		async fn update_document(
			&self,
			_id: &str,
			_title: Option<&str>,
			_text: Option<&str>,
			_parent_id: Option<Option<&str>>,
		) -> RemoteResult<RemoteDoc> {
			unimplemented!("not exercised by this test")
		}
		async fn delete_document(&self, _id: &str) -> RemoteResult<()> {
			Ok(())
		}
	}

	#[tokio::test]
	async fn first_run_pulls_a_new_remote_document() {
		let dir = tempdir().unwrap();
		let gateway = FakeGateway {
			docs: Mutex::new(vec![RemoteDoc {
				id: "A".to_string(),
				short_id: None,
				title: "Hello".to_string(),
				text: "hi".to_string(),
				parent_id: None,
				created_at: chrono::Utc::now(),
				updated_at: chrono::Utc::now(),
			}]),
		};

		let orchestrator =
			Orchestrator::new(dir.path().to_path_buf(), "col1".to_string(), &gateway);
		let outcome = orchestrator.run(false).await.unwrap();
		assert!(matches!(outcome, RunOutcome::Clean));

		let contents = tokio::fs::read_to_string(dir.path().join("Hello.md")).await.unwrap();
		assert!(contents.contains("id_outline: A"));
		assert!(contents.contains("hi"));
		assert!(dir.path().join(".outline").exists());
	}

	#[tokio::test]
	async fn second_run_against_unchanged_state_is_idempotent() {
		let dir = tempdir().unwrap();
		let gateway = FakeGateway {
			docs: Mutex::new(vec![RemoteDoc {
				id: "A".to_string(),
				short_id: None,
				title: "Hello".to_string(),
				text: "hi".to_string(),
				parent_id: None,
				created_at: chrono::Utc::now(),
				updated_at: chrono::Utc::now(),
			}]),
		};

		let orchestrator =
			Orchestrator::new(dir.path().to_path_buf(), "col1".to_string(), &gateway);
		orchestrator.run(false).await.unwrap();
		let after_first = tokio::fs::read_to_string(dir.path().join("Hello.md")).await.unwrap();

		orchestrator.run(false).await.unwrap();
		let after_second = tokio::fs::read_to_string(dir.path().join("Hello.md")).await.unwrap();

		assert_eq!(after_first, after_second);
	}
}

// vim: ts=4
