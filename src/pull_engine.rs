//! PullEngine: applies a remote `ChangeSet` to the local tree.
//!
//! Order within a run: deletions, then demotions (so a
//! demotion never races a sibling deletion that would otherwise leave the
//! directory transiently non-empty), then new documents, then updates.
//!
//! Each sub-phase loops sequentially rather than fanning documents out
//! concurrently: siblings under one directory share ancestor-cleanup and
//! directory-creation side effects, and interleaving those across
//! documents is the one place concurrency would need per-subtree
//! serialization rather than a flat `join_all`. `PushEngine`'s sub-phases
//! have no such shared filesystem state and fan out freely.

use crate::change_detector::RemoteChangeSet;
use crate::error::FileOpError;
use crate::front_matter::{self, FrontMatter};
use crate::hierarchy::Hierarchy;
use crate::logging::*;
use crate::parent_converter;
use crate::path_mapper::{dirname, PathAssignment};
use crate::remote::RemoteDoc;
use crate::scanner::{self, LocalSnapshot};
use crate::state::SyncState;
use crate::text_clean;
use std::path::Path;

pub async fn run(
	root: &Path,
	hierarchy: &Hierarchy,
	assignment: &PathAssignment,
	state: &SyncState,
	local: &LocalSnapshot,
	changes: &RemoteChangeSet,
) -> Result<(), std::io::Error> {
	delete_docs(root, &changes.deleted_docs).await;
	demote_stale_folders(root, hierarchy, state).await;
	create_new_docs(root, assignment, &changes.new_docs).await;
	update_existing_docs(root, assignment, local, &changes.updated_docs).await;
	Ok(())
}

async fn delete_docs(root: &Path, deleted_docs: &[crate::state::DocumentMappingEntry]) {
	for entry in deleted_docs {
		let fs_path = scanner::to_fs_path(root, &entry.local_path);
		if let Err(source) = tokio::fs::remove_file(&fs_path).await {
			warn!(
				"failed to remove deleted document {}: {}",
				entry.id,
				FileOpError { path: fs_path.clone(), source }
			);
			continue;
		}
		cleanup_empty_ancestors(root, &dirname(&entry.local_path)).await;
	}
}

async fn demote_stale_folders(root: &Path, hierarchy: &Hierarchy, state: &SyncState) {
	for entry in &state.document_mapping {
		if !entry.is_folder {
			continue;
		}
		let still_a_parent = hierarchy.contains(&entry.id) && hierarchy.is_parent(&entry.id);
		if still_a_parent {
			continue;
		}
		match parent_converter::demote(root, &entry.local_path).await {
			Ok(Some(new_path)) => info!("demoted {} to {}", entry.local_path, new_path),
			Ok(None) => {}
			Err(source) => warn!(
				"failed to demote: {}",
				FileOpError { path: scanner::to_fs_path(root, &entry.local_path), source }
			),
		}
	}
}

async fn create_new_docs(root: &Path, assignment: &PathAssignment, new_docs: &[RemoteDoc]) {
	for doc in new_docs {
		let path = match assignment.get(&doc.id) {
			Some(p) => p.clone(),
			None => {
				warn!("no path assignment for new document {}, skipping", doc.id);
				continue;
			}
		};
		let path = unique_path(root, &path).await;

		let fs_path = scanner::to_fs_path(root, &path);
		if let Some(parent) = fs_path.parent() {
			if let Err(source) = tokio::fs::create_dir_all(parent).await {
				warn!(
					"failed to create directory for new document {}: {}",
					doc.id,
					FileOpError { path: parent.to_path_buf(), source }
				);
				continue;
			}
		}

		let mut fm = FrontMatter::new();
		fm.set("id_outline", doc.short_id.as_deref().unwrap_or(&doc.id));
		let body = text_clean::clean(&doc.text);
		let contents = front_matter::write(&fm, &body);

		if let Err(source) = tokio::fs::write(&fs_path, contents.as_bytes()).await {
			warn!(
				"failed to write new document {}: {}",
				doc.id,
				FileOpError { path: fs_path.clone(), source }
			);
			continue;
		}
		set_mtime(&fs_path, doc.updated_at);
	}
}

async fn update_existing_docs(
	root: &Path,
	assignment: &PathAssignment,
	local: &LocalSnapshot,
	updated_docs: &[RemoteDoc],
) {
	for doc in updated_docs {
		let current = local.values().find(|f| {
			f.outline_id.as_deref() == Some(doc.id.as_str())
				|| (doc.short_id.is_some() && f.outline_id.as_deref() == doc.short_id.as_deref())
		});
		let current = match current {
			Some(f) => f,
			None => {
				warn!("no local file found for updated document {}, skipping", doc.id);
				continue;
			}
		};

		if current.mtime > doc.updated_at {
			continue;
		}

		let new_path = match assignment.get(&doc.id) {
			Some(p) => p.clone(),
			None => current.rel_path.clone(),
		};

		let old_fs = scanner::to_fs_path(root, &current.rel_path);
		let (mut fm, _old_body) = match tokio::fs::read(&old_fs).await {
			Ok(bytes) => front_matter::parse(&String::from_utf8_lossy(&bytes)),
			Err(source) => {
				warn!("failed to read before updating: {}", FileOpError { path: old_fs.clone(), source });
				continue;
			}
		};
		fm.set("id_outline", doc.short_id.as_deref().unwrap_or(&doc.id));
		let body = text_clean::clean(&doc.text);
		let contents = front_matter::write(&fm, &body);

		if new_path != current.rel_path {
			let new_fs = scanner::to_fs_path(root, &new_path);
			if let Some(parent) = new_fs.parent() {
				if let Err(source) = tokio::fs::create_dir_all(parent).await {
					warn!(
						"failed to create directory for moved document {}: {}",
						doc.id,
						FileOpError { path: parent.to_path_buf(), source }
					);
					continue;
				}
			}
			if let Err(source) = tokio::fs::write(&new_fs, contents.as_bytes()).await {
				warn!(
					"failed to write moved document {}: {}",
					doc.id,
					FileOpError { path: new_fs.clone(), source }
				);
				continue;
			}
			if let Err(source) = tokio::fs::remove_file(&old_fs).await {
				warn!(
					"failed to remove old location after move: {}",
					FileOpError { path: old_fs.clone(), source }
				);
			}
			cleanup_empty_ancestors(root, &dirname(&current.rel_path)).await;
			set_mtime(&new_fs, doc.updated_at);
		} else if let Err(source) = tokio::fs::write(&old_fs, contents.as_bytes()).await {
			warn!(
				"failed to update document {} in place: {}",
				doc.id,
				FileOpError { path: old_fs.clone(), source }
			);
		} else {
			set_mtime(&old_fs, doc.updated_at);
		}
	}
}

/// Remove empty directories from `dir_rel` up to (but not including) the
/// sync root.
async fn cleanup_empty_ancestors(root: &Path, dir_rel: &str) {
	let mut current = dir_rel.to_string();
	while !current.is_empty() {
		let fs_path = scanner::to_fs_path(root, &current);
		match tokio::fs::read_dir(&fs_path).await {
			Ok(mut entries) => match entries.next_entry().await {
				Ok(None) => {
					if tokio::fs::remove_dir(&fs_path).await.is_err() {
						break;
					}
				}
				_ => break,
			},
			Err(_) => break,
		}
		current = dirname(&current);
	}
}

/// If `path` already exists (occupied by something this run's
/// `PathAssignment` didn't account for), append `-2`, `-3`, ... before the
/// extension until free.
async fn unique_path(root: &Path, path: &str) -> String {
	if tokio::fs::metadata(scanner::to_fs_path(root, path)).await.is_err() {
		return path.to_string();
	}
	let (stem, ext) = match path.rsplit_once('.') {
		Some((s, e)) => (s.to_string(), format!(".{}", e)),
		None => (path.to_string(), String::new()),
	};
	let mut n = 2;
	loop {
		let candidate = format!("{}-{}{}", stem, n, ext);
		if tokio::fs::metadata(scanner::to_fs_path(root, &candidate)).await.is_err() {
			return candidate;
		}
		n += 1;
	}
}

fn set_mtime(fs_path: &Path, updated_at: chrono::DateTime<chrono::Utc>) {
	let system_time: std::time::SystemTime = updated_at.into();
	if let Err(source) =
		filetime::set_file_mtime(fs_path, filetime::FileTime::from_system_time(system_time))
	{
		warn!("failed to set mtime: {}", FileOpError { path: fs_path.to_path_buf(), source });
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::hierarchy::Hierarchy;
	use crate::path_mapper;
	use crate::state::DocumentMappingEntry;
	use chrono::Utc;
	use tempfile::tempdir;

	fn doc(id: &str, title: &str, text: &str) -> RemoteDoc {
		RemoteDoc {
			id: id.to_string(),
			short_id: None,
			title: title.to_string(),
			text: text.to_string(),
			parent_id: None,
			created_at: Utc::now(),
			updated_at: Utc::now(),
		}
	}

	#[tokio::test]
	async fn creates_new_document_with_front_matter() {
		let dir = tempdir().unwrap();
		let hierarchy = Hierarchy::build(vec![doc("A", "Hello", "hi")]).unwrap();
		let assignment = path_mapper::assign(&hierarchy);
		let changes =
			RemoteChangeSet { new_docs: vec![doc("A", "Hello", "hi")], ..Default::default() };

		create_new_docs(dir.path(), &assignment, &changes.new_docs).await;

		let contents = tokio::fs::read_to_string(dir.path().join("Hello.md")).await.unwrap();
		let (fm, body) = front_matter::parse(&contents);
		assert_eq!(fm.get("id_outline"), Some("A"));
		assert_eq!(body.trim(), "hi");
	}

	#[tokio::test]
	async fn deleting_a_document_cleans_up_empty_ancestor_directories() {
		let dir = tempdir().unwrap();
		tokio::fs::create_dir_all(dir.path().join("Topic")).await.unwrap();
		tokio::fs::write(dir.path().join("Topic/Sub.md"), "body\n").await.unwrap();

		let entry = DocumentMappingEntry {
			id: "S1".to_string(),
			short_id: None,
			title: "Sub".to_string(),
			parent_id: None,
			updated_at: Utc::now(),
			local_path: "Topic/Sub.md".to_string(),
			is_folder: false,
		};
		delete_docs(dir.path(), &[entry]).await;

		assert!(!dir.path().join("Topic/Sub.md").exists());
		assert!(!dir.path().join("Topic").exists());
	}
}

// vim: ts=4
