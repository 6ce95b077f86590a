//! ParentConverter: structural rewrite between a standalone file and a
//! folder-with-index-file, triggered when a document's parenthood changes.
//! Demotion's safety check never destroys a non-empty directory: it
//! refuses the conversion rather than guessing which file is safe to drop.

use crate::front_matter;
use crate::logging::*;
use crate::path_mapper::{self, basename, dirname, join_path as join, INDEX_NAME};
use crate::scanner;
use std::path::Path;

/// Promote `current_rel_path` (a standalone file) into a folder carrying an
/// index file, because its document gained children. Returns the new
/// relative path of the index file.
pub async fn promote(
	root: &Path,
	current_rel_path: &str,
	title: &str,
	id_outline: &str,
) -> Result<String, std::io::Error> {
	let parent_dir = dirname(current_rel_path);
	let new_dir = join(&parent_dir, &path_mapper::sanitize(title));
	let new_path = join(&new_dir, INDEX_NAME);

	tokio::fs::create_dir_all(scanner::to_fs_path(root, &new_dir)).await?;

	let old_fs = scanner::to_fs_path(root, current_rel_path);
	let bytes = tokio::fs::read(&old_fs).await?;
	let content = String::from_utf8_lossy(&bytes).to_string();
	let (mut fm, body) = front_matter::parse(&content);
	fm.set("id_outline", id_outline);
	let rewritten = front_matter::write(&fm, &body);

	let new_fs = scanner::to_fs_path(root, &new_path);
	tokio::fs::write(&new_fs, rewritten.as_bytes()).await?;
	tokio::fs::remove_file(&old_fs).await?;

	Ok(new_path)
}

/// Demote the folder containing `index_rel_path` back into a standalone
/// file, because its document lost its last child (or dropped out of the
/// hierarchy entirely). Returns `Ok(None)` without touching anything when
/// the directory holds more than the index file; this is a skip, not an
/// error.
pub async fn demote(root: &Path, index_rel_path: &str) -> Result<Option<String>, std::io::Error> {
	let dir_rel = dirname(index_rel_path);
	let dir_fs = scanner::to_fs_path(root, &dir_rel);

	let mut entries = tokio::fs::read_dir(&dir_fs).await?;
	while let Some(entry) = entries.next_entry().await? {
		if entry.file_name().to_string_lossy() != INDEX_NAME {
			warn!("skipping demotion of {}: directory is not empty", dir_rel);
			return Ok(None);
		}
	}

	let folder_name = basename(&dir_rel).to_string();
	let grandparent = dirname(&dir_rel);
	let new_path = join(&grandparent, &format!("{}.md", folder_name));

	let old_fs = scanner::to_fs_path(root, index_rel_path);
	let new_fs = scanner::to_fs_path(root, &new_path);
	tokio::fs::rename(&old_fs, &new_fs).await?;
	tokio::fs::remove_dir(&dir_fs).await?;

	Ok(Some(new_path))
}


// vim: ts=4
