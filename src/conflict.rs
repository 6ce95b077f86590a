//! ConflictDetector: compares the local and remote change sets to find
//! documents that diverged on both sides since the last sync.
//!
//! A conflict is never auto-resolved and is never an `Err`: it is a
//! successful, terminal outcome of a run. Detecting one excludes that
//! document from Phase 4 entirely, on both sides.

use crate::change_detector::{LocalChangeSet, RemoteChangeSet};
use crate::remote::RemoteDoc;
use crate::scanner::LocalFile;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Edits within this many seconds of each other are flagged as a
/// simultaneous edit even though the gap alone wouldn't otherwise make one
/// side's change a `potentialConflict`; clock skew between the remote
/// server and the local filesystem means equality can never be relied on.
pub const SIMULTANEOUS_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
	/// A file that was modified locally after the last sync, whose document
	/// also changed remotely. Flagged regardless of how close the two
	/// timestamps are.
	BidirectionalEdit,

	/// A file that was modified locally (not necessarily after the last
	/// sync), whose document also changed remotely within the tolerance
	/// window.
	SimultaneousEdit,
}

#[derive(Debug, Clone)]
pub struct Conflict {
	pub kind: ConflictKind,
	pub path: String,
	pub id: String,
	pub local_mtime: DateTime<Utc>,
	pub remote_updated_at: DateTime<Utc>,
	pub local_data: LocalFile,
	pub remote_data: RemoteDoc,
}

fn conflict_of(kind: ConflictKind, local: LocalFile, remote: RemoteDoc) -> Conflict {
	Conflict {
		kind,
		path: local.rel_path.clone(),
		id: remote.id.clone(),
		local_mtime: local.mtime,
		remote_updated_at: remote.updated_at,
		local_data: local,
		remote_data: remote,
	}
}

/// Find every conflict in one run. `canonicalize` resolves a locally-stored
/// identifier (which may be a `shortId`) to the canonical `id` used by
/// `remote_changes`, mirroring `SyncState::canonicalize`.
pub fn detect(
	local_changes: &LocalChangeSet,
	remote_changes: &RemoteChangeSet,
	canonicalize: impl Fn(&str) -> String,
) -> Vec<Conflict> {
	let mut conflicts = Vec::new();
	let mut flagged: HashSet<String> = HashSet::new();

	for file in &local_changes.potential_conflicts {
		let Some(outline_id) = &file.outline_id else { continue };
		let canonical = canonicalize(outline_id);
		if let Some(remote) = remote_changes.updated_docs.iter().find(|d| d.matches_id(&canonical)) {
			flagged.insert(canonical);
			conflicts.push(conflict_of(ConflictKind::BidirectionalEdit, file.clone(), remote.clone()));
		}
	}

	for file in &local_changes.modified_files {
		let Some(outline_id) = &file.outline_id else { continue };
		let canonical = canonicalize(outline_id);
		if flagged.contains(&canonical) {
			continue;
		}
		if let Some(remote) = remote_changes.updated_docs.iter().find(|d| d.matches_id(&canonical)) {
			let delta = (file.mtime - remote.updated_at).num_seconds().abs();
			if delta < SIMULTANEOUS_TOLERANCE_SECS {
				flagged.insert(canonical);
				conflicts.push(conflict_of(ConflictKind::SimultaneousEdit, file.clone(), remote.clone()));
			}
		}
	}

	conflicts
}


// vim: ts=4
