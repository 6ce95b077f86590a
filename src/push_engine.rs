//! PushEngine: applies a local `ChangeSet` to the remote side.
//!
//! Looks up a document's current remote state through the `Hierarchy`
//! already fetched at the start of the run, never through an extra
//! `RemoteGateway` call: the trait exposes exactly five operations and
//! none of them is "fetch by id", so the engine treats the already-listed
//! `Hierarchy` as its view of remote truth for the duration of the run.

use crate::change_detector::{LocalChangeSet, MovedFile};
use crate::error::FileOpError;
use crate::front_matter;
use crate::hierarchy::Hierarchy;
use crate::logging::*;
use crate::path_mapper::{basename, dirname, join_path, INDEX_NAME};
use crate::remote::RemoteGateway;
use crate::scanner::{self, LocalFile, LocalSnapshot};
use crate::state::SyncState;
use chrono::Duration as ChronoDuration;
use std::path::Path;

/// Staleness tolerance for comparing a local file's mtime against the
/// remote document's `updatedAt` before deciding whether a local edit is
/// worth pushing.
const STALENESS_TOLERANCE_SECS: i64 = 5;

/// Title derivation from path: index files take the title from their
/// containing directory name; non-index files take the basename without
/// `.md`.
fn derive_title(rel_path: &str, is_index: bool) -> String {
	if is_index {
		basename(&dirname(rel_path)).to_string()
	} else {
		basename(rel_path).trim_end_matches(".md").to_string()
	}
}

/// Determine the remote parent id for a file living in `dir` (the POSIX
/// directory component of its relative path), by reading the `id_outline`
/// of that directory's index file, falling back to the previous mapping's
/// record of that index file's id.
fn resolve_parent_id(dir: &str, local: &LocalSnapshot, state: &SyncState) -> Option<String> {
	if dir.is_empty() {
		return None;
	}
	let index_path = join_path(dir, INDEX_NAME);

	if let Some(index_file) = local.get(&index_path) {
		if let Some(id) = &index_file.outline_id {
			return Some(state.canonicalize(id));
		}
	}

	state.document_mapping.iter().find(|e| e.local_path == index_path).map(|e| e.id.clone())
}

async fn read_body(root: &Path, rel_path: &str) -> Result<String, std::io::Error> {
	let bytes = tokio::fs::read(scanner::to_fs_path(root, rel_path)).await?;
	let content = String::from_utf8_lossy(&bytes).to_string();
	let (_fm, body) = front_matter::parse(&content);
	Ok(body)
}

async fn write_outline_id(root: &Path, rel_path: &str, id: &str) -> Result<(), std::io::Error> {
	let fs_path = scanner::to_fs_path(root, rel_path);
	let bytes = tokio::fs::read(&fs_path).await?;
	let content = String::from_utf8_lossy(&bytes).to_string();
	let (mut fm, body) = front_matter::parse(&content);
	fm.set("id_outline", id);
	tokio::fs::write(&fs_path, front_matter::write(&fm, &body).as_bytes()).await
}

/// Apply `changes` to the remote collection. Every per-document failure is
/// logged and that document is simply left for the next run to retry; this
/// function itself only returns an error for conditions that would make
/// continuing nonsensical (there are none at present, so it never does, but
/// the `Result` shape matches `PullEngine::run`'s).
pub async fn run(
	root: &Path,
	gateway: &dyn RemoteGateway,
	collection_id: &str,
	hierarchy: &Hierarchy,
	state: &SyncState,
	local: &LocalSnapshot,
	changes: &LocalChangeSet,
) -> Result<(), std::io::Error> {
	push_new_files(root, gateway, collection_id, state, local, &changes.new_files).await;
	push_modified_files(root, gateway, hierarchy, state, &changes.modified_files).await;
	push_moved_files(gateway, state, local, &changes.moved_files).await;
	push_deleted_files(gateway, state, &changes.deleted_files).await;
	Ok(())
}

/// Each document in a sub-phase is an independent `RemoteGateway` call
/// touching a distinct local file, so the four sub-phases below fan a
/// group out via `join_all` and only serialize *between* groups --
/// matching the per-subtree concurrency the orchestrator's ordering
/// constraint allows (creates, then updates, then moves, then deletes).
async fn push_new_files(
	root: &Path,
	gateway: &dyn RemoteGateway,
	collection_id: &str,
	state: &SyncState,
	local: &LocalSnapshot,
	new_files: &[LocalFile],
) {
	let tasks = new_files.iter().map(|file| push_one_new_file(root, gateway, collection_id, state, local, file));
	futures::future::join_all(tasks).await;
}

async fn push_one_new_file(
	root: &Path,
	gateway: &dyn RemoteGateway,
	collection_id: &str,
	state: &SyncState,
	local: &LocalSnapshot,
	file: &LocalFile,
) {
	let dir = dirname(&file.rel_path);
	let parent_id = resolve_parent_id(&dir, local, state);
	let title = derive_title(&file.rel_path, file.is_index);

	let text = match read_body(root, &file.rel_path).await {
		Ok(text) => text,
		Err(source) => {
			warn!(
				"skipping push of new file: {}",
				FileOpError { path: scanner::to_fs_path(root, &file.rel_path), source }
			);
			return;
		}
	};

	match gateway.create_document(collection_id, &title, &text, parent_id.as_deref()).await {
		Ok(doc) => {
			let new_id = doc.short_id.as_deref().unwrap_or(&doc.id);
			if let Err(source) = write_outline_id(root, &file.rel_path, new_id).await {
				warn!(
					"created {} remotely but failed to stamp its id locally: {}",
					file.rel_path,
					FileOpError { path: scanner::to_fs_path(root, &file.rel_path), source }
				);
			}
		}
		Err(e) => warn!("failed to create remote document for {}: {}", file.rel_path, e),
	}
}

async fn push_modified_files(
	root: &Path,
	gateway: &dyn RemoteGateway,
	hierarchy: &Hierarchy,
	state: &SyncState,
	modified_files: &[LocalFile],
) {
	let tasks = modified_files.iter().map(|file| push_one_modified_file(root, gateway, hierarchy, state, file));
	futures::future::join_all(tasks).await;
}

async fn push_one_modified_file(
	root: &Path,
	gateway: &dyn RemoteGateway,
	hierarchy: &Hierarchy,
	state: &SyncState,
	file: &LocalFile,
) {
	let outline_id = match &file.outline_id {
		Some(id) => state.canonicalize(id),
		None => return,
	};
	let remote = match hierarchy.doc(&outline_id) {
		Some(doc) => doc,
		None => return,
	};

	let tolerance = ChronoDuration::seconds(STALENESS_TOLERANCE_SECS);
	let remote_is_newer = remote.updated_at > file.mtime + tolerance;
	let hashes_equal = if remote_is_newer {
		match read_body(root, &file.rel_path).await {
			Ok(local_body) => blake3::hash(local_body.trim().as_bytes())
				== blake3::hash(remote.text.trim().as_bytes()),
			Err(_) => false,
		}
	} else {
		false
	};

	if remote_is_newer && hashes_equal {
		return;
	}

	let text = match read_body(root, &file.rel_path).await {
		Ok(text) => text,
		Err(source) => {
			warn!(
				"skipping push of modified file: {}",
				FileOpError { path: scanner::to_fs_path(root, &file.rel_path), source }
			);
			return;
		}
	};
	let title = derive_title(&file.rel_path, file.is_index);

	if let Err(e) = gateway.update_document(&outline_id, Some(&title), Some(&text), None).await {
		warn!("failed to update remote document for {}: {}", file.rel_path, e);
	}
}

async fn push_moved_files(
	gateway: &dyn RemoteGateway,
	state: &SyncState,
	local: &LocalSnapshot,
	moved_files: &[MovedFile],
) {
	let tasks = moved_files.iter().map(|moved| push_one_moved_file(gateway, state, local, moved));
	futures::future::join_all(tasks).await;
}

async fn push_one_moved_file(
	gateway: &dyn RemoteGateway,
	state: &SyncState,
	local: &LocalSnapshot,
	moved: &MovedFile,
) {
	let outline_id = state.canonicalize(&moved.id);
	let new_dir = dirname(&moved.to_path);
	let parent_id = resolve_parent_id(&new_dir, local, state);
	let is_index = local.get(&moved.to_path).map(|f| f.is_index).unwrap_or(false);
	let title = derive_title(&moved.to_path, is_index);

	if let Err(e) =
		gateway.update_document(&outline_id, Some(&title), None, Some(parent_id.as_deref())).await
	{
		warn!("failed to update moved document {}: {}", moved.to_path, e);
	}
}

async fn push_deleted_files(gateway: &dyn RemoteGateway, state: &SyncState, deleted_files: &[String]) {
	let previous = state.local_files_by_path();
	let tasks = deleted_files.iter().map(|path| push_one_deleted_file(gateway, state, &previous, path));
	futures::future::join_all(tasks).await;
}

async fn push_one_deleted_file(
	gateway: &dyn RemoteGateway,
	state: &SyncState,
	previous: &std::collections::HashMap<String, &LocalFile>,
	path: &str,
) {
	let outline_id = match previous.get(path).and_then(|f| f.outline_id.clone()) {
		Some(id) => state.canonicalize(&id),
		None => return,
	};
	if let Err(e) = gateway.delete_document(&outline_id).await {
		warn!("failed to delete remote document for {}: {}", path, e);
	}
}


// vim: ts=4
