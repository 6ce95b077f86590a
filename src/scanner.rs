//! LocalScanner: walks the sync root, builds a snapshot of files with
//! ids, hashes, and timestamps.

use crate::error::{FileOpError, SyncError};
use crate::front_matter;
use crate::logging::*;
use crate::path_mapper::INDEX_NAME;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The sidecar state file's reserved basename; never treated as a
/// syncable document.
pub const SIDECAR_NAME: &str = ".outline";

/// An on-disk text file under the sync root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalFile {
	pub rel_path: String,
	pub mtime: DateTime<Utc>,
	pub size: u64,
	pub content_hash: String,
	pub outline_id: Option<String>,
	pub has_front_matter: bool,
	pub is_index: bool,
}

/// `relPath -> LocalFile`.
pub type LocalSnapshot = HashMap<String, LocalFile>;

/// Walk `root`, visiting every regular `.md` file, skipping the sidecar and
/// any path component starting with `.`. Individual per-file read errors
/// are logged and the file is skipped; a failure to read the root itself
/// is fatal.
pub async fn scan(root: &Path) -> Result<LocalSnapshot, SyncError> {
	let metadata = tokio::fs::metadata(root).await.map_err(|source| SyncError::Io {
		message: format!("cannot read sync root {}", root.display()),
		source,
	})?;
	if !metadata.is_dir() {
		return Err(SyncError::Io {
			message: format!("sync root {} is not a directory", root.display()),
			source: std::io::Error::new(std::io::ErrorKind::Other, "not a directory"),
		});
	}

	let mut snapshot = LocalSnapshot::new();
	walk(root, root, &mut snapshot).await?;
	Ok(snapshot)
}

fn walk<'a>(
	root: &'a Path,
	dir: &'a Path,
	snapshot: &'a mut LocalSnapshot,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<(), SyncError>> + 'a>> {
	Box::pin(async move {
		let mut entries = match tokio::fs::read_dir(dir).await {
			Ok(entries) => entries,
			Err(source) => {
				if dir == root {
					return Err(SyncError::Io {
						message: format!("cannot read sync root {}", root.display()),
						source,
					});
				}
				warn!("skipping unreadable directory: {}", FileOpError { path: dir.to_path_buf(), source });
				return Ok(());
			}
		};

		while let Some(entry) = entries.next_entry().await.map_err(|source| {
			if dir == root {
				SyncError::Io { message: format!("cannot read sync root {}", root.display()), source }
			} else {
				SyncError::Io { message: format!("cannot read {}", dir.display()), source }
			}
		})? {
			let path = entry.path();
			let file_name = entry.file_name();
			let name = file_name.to_string_lossy();

			if name.starts_with('.') {
				continue;
			}

			let file_type = match entry.file_type().await {
				Ok(ft) => ft,
				Err(source) => {
					warn!("skipping: {}", FileOpError { path: path.clone(), source });
					continue;
				}
			};

			if file_type.is_dir() {
				walk(root, &path, snapshot).await?;
				continue;
			}

			if !file_type.is_file() || !name.ends_with(".md") {
				continue;
			}

			match scan_file(root, &path).await {
				Ok(local_file) => {
					snapshot.insert(local_file.rel_path.clone(), local_file);
				}
				Err(source) => warn!("skipping unreadable file: {}", FileOpError { path: path.clone(), source }),
			}
		}

		Ok(())
	})
}

async fn scan_file(root: &Path, path: &Path) -> Result<LocalFile, std::io::Error> {
	let bytes = tokio::fs::read(path).await?;
	let metadata = tokio::fs::metadata(path).await?;

	let content_hash = blake3::hash(&bytes).to_hex().to_string();
	let content = String::from_utf8_lossy(&bytes);
	let (fm, _body) = front_matter::parse(&content);
	let outline_id = fm.get("id_outline").map(|s| s.to_string());
	let has_front_matter = !fm.is_empty();

	let mtime: DateTime<Utc> = metadata.modified()?.into();
	let rel_path = path
		.strip_prefix(root)
		.unwrap_or(path)
		.to_string_lossy()
		.replace(std::path::MAIN_SEPARATOR, "/");
	let is_index = path.file_name().map(|n| n == INDEX_NAME).unwrap_or(false);

	Ok(LocalFile {
		rel_path,
		mtime,
		size: metadata.len(),
		content_hash,
		outline_id,
		has_front_matter,
		is_index,
	})
}

/// Join a POSIX-style relative path onto `root` for actual filesystem
/// access.
pub fn to_fs_path(root: &Path, rel_path: &str) -> PathBuf {
	root.join(rel_path.replace('/', &std::path::MAIN_SEPARATOR.to_string()))
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::tempdir;

	#[tokio::test]
	async fn scans_markdown_files_and_skips_dotfiles_and_sidecar() {
		let dir = tempdir().unwrap();
		tokio::fs::write(dir.path().join("Hello.md"), "---\nid_outline: a1\n---\n\nbody\n")
			.await
			.unwrap();
		tokio::fs::write(dir.path().join(SIDECAR_NAME), "{}").await.unwrap();
		tokio::fs::write(dir.path().join("notes.txt"), "ignore me").await.unwrap();
		tokio::fs::create_dir(dir.path().join(".git")).await.unwrap();
		tokio::fs::write(dir.path().join(".git").join("config"), "x").await.unwrap();

		let snapshot = scan(dir.path()).await.unwrap();
		assert_eq!(snapshot.len(), 1);
		let file = snapshot.get("Hello.md").unwrap();
		assert_eq!(file.outline_id.as_deref(), Some("a1"));
		assert!(file.has_front_matter);
		assert!(!file.is_index);
	}

	#[tokio::test]
	async fn recognizes_index_files_in_subdirectories() {
		let dir = tempdir().unwrap();
		tokio::fs::create_dir(dir.path().join("Topic")).await.unwrap();
		tokio::fs::write(dir.path().join("Topic").join(INDEX_NAME), "body\n").await.unwrap();

		let snapshot = scan(dir.path()).await.unwrap();
		let file = snapshot.get("Topic/README.md").unwrap();
		assert!(file.is_index);
		assert!(!file.has_front_matter);
	}

	#[tokio::test]
	async fn fails_on_missing_root() {
		let result = scan(Path::new("/nonexistent/path/for/outline-sync-tests")).await;
		assert!(result.is_err());
	}
}
