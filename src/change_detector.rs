//! ChangeDetector: diffs the current local scan and current remote
//! listing against the last-known `SyncState`, producing the typed,
//! disjoint categories consumed by `PushEngine`/`PullEngine`.

use crate::remote::RemoteDoc;
use crate::scanner::{LocalFile, LocalSnapshot};
use crate::state::{DocumentMappingEntry, SyncState};
use std::collections::{HashMap, HashSet};

/// The state a single document can occupy across one run.
/// Not executed directly: Phase 2 below produces exactly the categories
/// that correspond to each variant, and Phase 3/4 resolve them as
/// documented on the variants themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(dead_code)]
pub enum DocState {
	/// Present remotely, absent locally. Resolved by `PullEngine` creating
	/// the local file.
	RemoteOnly,
	/// Present locally, absent remotely. Resolved by `PushEngine` creating
	/// the remote document.
	LocalOnly,
	/// Unchanged on both sides since the last sync. No action.
	InSync,
	/// Changed locally since the last sync, unchanged remotely. Resolved by
	/// `PushEngine`, subject to the staleness guard.
	DivergedLocal,
	/// Changed remotely since the last sync, unchanged locally. Resolved by
	/// `PullEngine`, subject to the staleness guard.
	DivergedRemote,
	/// Changed on both sides since the last sync (`DivergedLocal` ∧
	/// `DivergedRemote`). Escalated by Phase 3; aborts the run.
	Conflict,
	/// Present in the previous mapping but absent from both the current
	/// local scan and the current remote listing. No-op.
	Orphaned,
}

#[derive(Debug, Clone)]
pub struct MovedFile {
	pub id: String,
	pub from_path: String,
	pub to_path: String,
}

#[derive(Debug, Clone, Default)]
pub struct LocalChangeSet {
	pub new_files: Vec<LocalFile>,
	pub modified_files: Vec<LocalFile>,
	pub moved_files: Vec<MovedFile>,
	pub deleted_files: Vec<String>,
	pub potential_conflicts: Vec<LocalFile>,
}

#[derive(Debug, Clone, Default)]
pub struct RemoteChangeSet {
	pub new_docs: Vec<RemoteDoc>,
	pub updated_docs: Vec<RemoteDoc>,
	pub deleted_docs: Vec<DocumentMappingEntry>,
}

/// Compute the local delta. First-run rule: if `prev` has
/// never completed a sync, this returns an empty delta regardless of what
/// is on disk, so a lost sidecar is never mistaken for a tree full of new
/// files. The current scan still becomes the baseline once `Orchestrator`
/// persists it at the end of this run.
pub fn detect_local_changes(prev: &SyncState, current: &LocalSnapshot) -> LocalChangeSet {
	if prev.is_first_run() {
		return LocalChangeSet::default();
	}
	let last_sync = prev.last_sync.expect("not first run");

	let prev_by_path = prev.local_files_by_path();
	let mut prev_by_outline_id: HashMap<&str, &str> = HashMap::new();
	for file in &prev.local_files {
		if let Some(oid) = &file.outline_id {
			prev_by_outline_id.insert(oid.as_str(), file.rel_path.as_str());
		}
	}

	let mut new_files = Vec::new();
	let mut modified_files = Vec::new();
	let mut moved_files = Vec::new();
	let mut potential_conflicts = Vec::new();
	let mut used_as_move_source: HashSet<String> = HashSet::new();

	let mut paths: Vec<&String> = current.keys().collect();
	paths.sort();

	for path in paths {
		let file = &current[path];
		match prev_by_path.get(path) {
			Some(prev_file) => {
				if file.mtime > prev_file.mtime {
					modified_files.push(file.clone());
					if file.mtime > last_sync {
						potential_conflicts.push(file.clone());
					}
				}
			}
			None => {
				let move_source = file
					.outline_id
					.as_deref()
					.and_then(|oid| prev_by_outline_id.get(oid))
					.filter(|from_path| !current.contains_key(**from_path));

				match move_source {
					Some(from_path) => {
						used_as_move_source.insert(from_path.to_string());
						moved_files.push(MovedFile {
							id: file.outline_id.clone().expect("move_source requires outline_id"),
							from_path: from_path.to_string(),
							to_path: path.clone(),
						});
					}
					None => new_files.push(file.clone()),
				}
			}
		}
	}

	let deleted_files = prev
		.local_files
		.iter()
		.filter(|f| !current.contains_key(&f.rel_path) && !used_as_move_source.contains(&f.rel_path))
		.map(|f| f.rel_path.clone())
		.collect();

	LocalChangeSet { new_files, modified_files, moved_files, deleted_files, potential_conflicts }
}

/// Compute the remote delta against the previous `documentMapping`.
pub fn detect_remote_changes(prev: &SyncState, current: &[RemoteDoc]) -> RemoteChangeSet {
	let mut new_docs = Vec::new();
	let mut updated_docs = Vec::new();
	let mut matched_entry_ids: HashSet<String> = HashSet::new();

	for doc in current {
		let matched_entry = prev.document_mapping.iter().find(|entry| entry.matches_doc(doc));
		match matched_entry {
			Some(entry) => {
				matched_entry_ids.insert(entry.id.clone());
				if let Some(last_sync) = prev.last_sync {
					if doc.updated_at > last_sync {
						updated_docs.push(doc.clone());
					}
				}
			}
			None => new_docs.push(doc.clone()),
		}
	}

	let deleted_docs = prev
		.document_mapping
		.iter()
		.filter(|entry| !matched_entry_ids.contains(&entry.id))
		.cloned()
		.collect();

	RemoteChangeSet { new_docs, updated_docs, deleted_docs }
}


// vim: ts=4
