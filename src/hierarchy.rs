//! Derived hierarchy view over a remote listing.
//!
//! Built fresh each run from `RemoteGateway::list_documents`. Detects
//! parent-id cycles up front so `PathMapper` never has to guard against
//! infinite walks.

use crate::remote::RemoteDoc;
use std::collections::HashMap;

/// One document's position in the forest.
#[derive(Debug, Clone)]
pub struct HierarchyEntry {
	pub id: String,
	pub children: Vec<String>,
	pub depth: usize,
	pub is_parent: bool,
}

/// A derived view of the remote listing: for each id, its children, depth,
/// and whether it is a parent (non-empty children).
#[derive(Debug, Clone, Default)]
pub struct Hierarchy {
	docs: HashMap<String, RemoteDoc>,
	entries: HashMap<String, HierarchyEntry>,
	roots: Vec<String>,
}

#[derive(Debug)]
pub struct CycleError {
	pub id: String,
}

impl Hierarchy {
	/// Build a `Hierarchy` from a flat remote listing. Returns `Err` if the
	/// parent relation does not form a forest (a cycle was found).
	pub fn build(docs: Vec<RemoteDoc>) -> Result<Self, CycleError> {
		let mut by_id: HashMap<String, RemoteDoc> = HashMap::new();
		let mut children: HashMap<String, Vec<String>> = HashMap::new();
		let mut roots = Vec::new();

		for doc in docs {
			if let Some(parent_id) = &doc.parent_id {
				children.entry(parent_id.clone()).or_default().push(doc.id.clone());
			} else {
				roots.push(doc.id.clone());
			}
			by_id.insert(doc.id.clone(), doc);
		}

		roots.sort();
		for kids in children.values_mut() {
			kids.sort();
		}

		let mut entries = HashMap::new();
		for id in by_id.keys() {
			let mut depth = 0usize;
			let mut seen = std::collections::HashSet::new();
			let mut cursor = id.clone();
			loop {
				if !seen.insert(cursor.clone()) {
					return Err(CycleError { id: id.clone() });
				}
				match by_id.get(&cursor).and_then(|d| d.parent_id.clone()) {
					Some(parent) if by_id.contains_key(&parent) => {
						depth += 1;
						cursor = parent;
						if depth > by_id.len() {
							return Err(CycleError { id: id.clone() });
						}
					}
					_ => break,
				}
			}
			let kids = children.get(id).cloned().unwrap_or_default();
			entries.insert(
				id.clone(),
				HierarchyEntry { id: id.clone(), is_parent: !kids.is_empty(), children: kids, depth },
			);
		}

		Ok(Hierarchy { docs: by_id, entries, roots })
	}

	pub fn doc(&self, id: &str) -> Option<&RemoteDoc> {
		self.docs.get(id)
	}

	pub fn entry(&self, id: &str) -> Option<&HierarchyEntry> {
		self.entries.get(id)
	}

	pub fn is_parent(&self, id: &str) -> bool {
		self.entries.get(id).map(|e| e.is_parent).unwrap_or(false)
	}

	pub fn roots(&self) -> &[String] {
		&self.roots
	}

	pub fn all_docs(&self) -> impl Iterator<Item = &RemoteDoc> {
		self.docs.values()
	}

	pub fn contains(&self, id: &str) -> bool {
		self.docs.contains_key(id)
	}

	pub fn len(&self) -> usize {
		self.docs.len()
	}

	pub fn is_empty(&self) -> bool {
		self.docs.is_empty()
	}
}
