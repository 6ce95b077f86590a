use async_trait::async_trait;
use chrono::{DateTime, Utc};
use outline_sync::remote::{Collection, RemoteDoc, RemoteGateway, RemoteResult};
use std::sync::Mutex;

/// An in-memory `RemoteGateway` that behaves like a single-collection
/// Outline instance: creates assign an id, updates patch fields in place
/// and bump `updated_at`, deletes remove the document.
pub struct FakeGateway {
	pub collection_id: String,
	docs: Mutex<Vec<RemoteDoc>>,
	next_id: Mutex<u64>,
}

impl FakeGateway {
	pub fn new(collection_id: &str, docs: Vec<RemoteDoc>) -> Self {
		FakeGateway { collection_id: collection_id.to_string(), docs: Mutex::new(docs), next_id: Mutex::new(1) }
	}

	pub fn empty(collection_id: &str) -> Self {
		FakeGateway::new(collection_id, vec![])
	}

	/// Simulate a remote-side edit made directly against the backing
	/// store, bypassing `update_document`'s id/title bookkeeping -- used
	/// to set up "remote changed since last sync" preconditions.
	pub fn touch(&self, id: &str, text: &str, at: DateTime<Utc>) {
		let mut docs = self.docs.lock().unwrap();
		if let Some(doc) = docs.iter_mut().find(|d| d.id == id) {
			doc.text = text.to_string();
			doc.updated_at = at;
		}
	}

	pub fn add_child(&self, parent_id: &str, id: &str, title: &str, text: &str, at: DateTime<Utc>) {
		let mut docs = self.docs.lock().unwrap();
		docs.push(RemoteDoc {
			id: id.to_string(),
			short_id: None,
			title: title.to_string(),
			text: text.to_string(),
			parent_id: Some(parent_id.to_string()),
			created_at: at,
			updated_at: at,
		});
	}

	pub fn remove(&self, id: &str) {
		self.docs.lock().unwrap().retain(|d| d.id != id);
	}

	pub fn snapshot(&self) -> Vec<RemoteDoc> {
		self.docs.lock().unwrap().clone()
	}
}

#[async_trait]
impl RemoteGateway for FakeGateway {
	async fn list_collections(&self) -> RemoteResult<Vec<Collection>> {
		Ok(vec![Collection { id: self.collection_id.clone(), name: "Test".to_string() }])
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
		let mut next_id = self.next_id.lock().unwrap();
		let id = format!("gen-{}", *next_id);
		*next_id += 1;

		let now = Utc::now();
		let doc = RemoteDoc {
			id,
			short_id: None,
			title: title.to_string(),
			text: text.to_string(),
			parent_id: parent_id.map(|p| p.to_string()),
			created_at: now,
			updated_at: now,
		};
		self.docs.lock().unwrap().push(doc.clone());
		Ok(doc)
	}

	async fn update_document(
		&self,
		id: &str,
		title: Option<&str>,
		text: Option<&str>,
		parent_id: Option<Option<&str>>,
	) -> RemoteResult<RemoteDoc> {
		let mut docs = self.docs.lock().unwrap();
		let doc = docs
			.iter_mut()
			.find(|d| d.id == id)
			.unwrap_or_else(|| panic!("update_document on unknown id {}", id));
		if let Some(title) = title {
			doc.title = title.to_string();
		}
		if let Some(text) = text {
			doc.text = text.to_string();
		}
		if let Some(parent_id) = parent_id {
			doc.parent_id = parent_id.map(|p| p.to_string());
		}
		doc.updated_at = Utc::now();
		Ok(doc.clone())
	}

	async fn delete_document(&self, id: &str) -> RemoteResult<()> {
		self.docs.lock().unwrap().retain(|d| d.id != id);
		Ok(())
	}
}

pub fn doc(id: &str, title: &str, text: &str, parent: Option<&str>, at: DateTime<Utc>) -> RemoteDoc {
	RemoteDoc {
		id: id.to_string(),
		short_id: None,
		title: title.to_string(),
		text: text.to_string(),
		parent_id: parent.map(|p| p.to_string()),
		created_at: at,
		updated_at: at,
	}
}
