//! PathMapper: pure, deterministic mapping from a `Hierarchy` to a
//! `PathAssignment` (`id -> relPath`).
//!
//! - A non-parent document at hierarchy path `root/.../D` becomes
//!   `<sanitize(root)>/.../<sanitize(D)>.md`.
//! - A parent document becomes
//!   `<sanitize(root)>/.../<sanitize(D)>/<INDEX>`.
//! - Sibling name collisions are resolved by appending `-2`, `-3`, ...
//!   ordered by `id` ascending, so reruns never reshuffle an existing
//!   suffix.

use crate::hierarchy::Hierarchy;
use std::collections::{BTreeMap, HashMap};

/// Fixed basename for the on-disk representative of a parent document.
pub const INDEX_NAME: &str = "README.md";

/// `id -> relPath`, POSIX separators, relative to the sync root.
pub type PathAssignment = HashMap<String, String>;

/// Replace every character outside `[A-Za-z0-9_-]` with `-`, collapse runs
/// of `-`, trim leading/trailing `-`. An empty result becomes `untitled`.
/// Case is preserved.
pub fn sanitize(title: &str) -> String {
	let mut out = String::with_capacity(title.len());
	let mut last_was_dash = false;
	for c in title.chars() {
		if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
			out.push(c);
			last_was_dash = c == '-';
		} else if !last_was_dash {
			out.push('-');
			last_was_dash = true;
		}
	}
	let trimmed = out.trim_matches('-');
	if trimmed.is_empty() {
		"untitled".to_string()
	} else {
		trimmed.to_string()
	}
}

/// Compute the full `id -> relPath` assignment for a hierarchy. Pure and
/// idempotent: the result depends only on `hierarchy`'s content, never on
/// iteration order of the underlying collection.
pub fn assign(hierarchy: &Hierarchy) -> PathAssignment {
	let mut assignment = PathAssignment::new();
	assign_siblings(hierarchy, hierarchy.roots(), "", &mut assignment);
	assignment
}

fn assign_siblings(
	hierarchy: &Hierarchy,
	ids: &[String],
	parent_dir: &str,
	assignment: &mut PathAssignment,
) {
	// Stable collision resolution: always walk siblings in id order.
	let mut sorted_ids: Vec<&String> = ids.iter().collect();
	sorted_ids.sort();

	let mut used_names: BTreeMap<String, u32> = BTreeMap::new();

	for id in sorted_ids {
		let doc = match hierarchy.doc(id) {
			Some(d) => d,
			None => continue,
		};
		let base = sanitize(&doc.title);
		let count = used_names.entry(base.clone()).or_insert(0);
		*count += 1;
		let name = if *count == 1 { base.clone() } else { format!("{}-{}", base, count) };

		let is_parent = hierarchy.is_parent(id);
		if is_parent {
			let dir = join(parent_dir, &name);
			let index_path = join(&dir, INDEX_NAME);
			assignment.insert(id.clone(), index_path);

			let children = &hierarchy.entry(id).expect("entry exists for known id").children;
			assign_siblings(hierarchy, children, &dir, assignment);
		} else {
			let file_name = format!("{}.md", name);
			let path = join(parent_dir, &file_name);
			assignment.insert(id.clone(), path);
		}
	}
}

fn join(dir: &str, name: &str) -> String {
	if dir.is_empty() {
		name.to_string()
	} else {
		format!("{}/{}", dir, name)
	}
}

/// The directory component of a POSIX-style relative path, `""` at the
/// root. Shared by `ParentConverter` and `PushEngine`, which both need to
/// reason about a file's containing directory without re-deriving it.
pub fn dirname(path: &str) -> String {
	match path.rfind('/') {
		Some(i) => path[..i].to_string(),
		None => String::new(),
	}
}

/// The final path component.
pub fn basename(path: &str) -> &str {
	match path.rfind('/') {
		Some(i) => &path[i + 1..],
		None => path,
	}
}

pub fn join_path(dir: &str, name: &str) -> String {
	join(dir, name)
}
