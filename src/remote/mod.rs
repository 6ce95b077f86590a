//! RemoteGateway: the external collaborator interface.
//!
//! This module defines the trait the reconciliation engine depends on and
//! the data types that cross the boundary. The core never depends on
//! `http`'s concrete client; only on `RemoteGateway`.

pub mod http;

use crate::error::TransportError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type RemoteResult<T> = Result<T, TransportError>;

/// The unit of remote state. `id` is opaque, stable, and immutable;
/// `short_id` is an alternate human-readable identifier that may also
/// appear in local front-matter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteDoc {
	pub id: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub short_id: Option<String>,
	pub title: String,
	#[serde(default)]
	pub text: String,
	pub parent_id: Option<String>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl RemoteDoc {
	/// True if `candidate` equals either of this document's two identifier
	/// forms. All equality tests against a locally-stored `outlineId` must
	/// go through this, never a bare `==` on `id`.
	pub fn matches_id(&self, candidate: &str) -> bool {
		self.id == candidate || self.short_id.as_deref() == Some(candidate)
	}
}

/// A remote collection: the top-level container that scopes a sync run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
	pub id: String,
	pub name: String,
}

/// The external collaborator interface. Every method may fail with a
/// `TransportError`, which callers treat as per-operation: log it, abandon
/// that single operation, and continue the phase.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
	async fn list_collections(&self) -> RemoteResult<Vec<Collection>>;

	/// Ordered, paginated internally at >= 100 documents per page.
	async fn list_documents(&self, collection_id: &str) -> RemoteResult<Vec<RemoteDoc>>;

	async fn create_document(
		&self,
		collection_id: &str,
		title: &str,
		text: &str,
		parent_id: Option<&str>,
	) -> RemoteResult<RemoteDoc>;

	async fn update_document(
		&self,
		id: &str,
		title: Option<&str>,
		text: Option<&str>,
		parent_id: Option<Option<&str>>,
	) -> RemoteResult<RemoteDoc>;

	async fn delete_document(&self, id: &str) -> RemoteResult<()>;
}
