//! Concrete `RemoteGateway` speaking to an Outline-style JSON API over
//! HTTP. Not load-bearing for the reconciliation engine (which only
//! depends on the `RemoteGateway` trait); this exists so the crate ships a
//! default, runnable backend.

use super::{Collection, RemoteDoc, RemoteGateway, RemoteResult};
use crate::error::TransportError;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;

const PAGE_SIZE: usize = 100;

pub struct HttpRemoteGateway {
	client: reqwest::Client,
	base_url: String,
	token: String,
}

impl HttpRemoteGateway {
	pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
		HttpRemoteGateway {
			client: reqwest::Client::new(),
			base_url: base_url.into(),
			token: token.into(),
		}
	}

	async fn post<T: DeserializeOwned>(
		&self,
		path: &str,
		body: serde_json::Value,
	) -> RemoteResult<T> {
		let url = format!("{}/api/{}", self.base_url.trim_end_matches('/'), path);
		let response = self
			.client
			.post(&url)
			.bearer_auth(&self.token)
			.json(&body)
			.send()
			.await
			.map_err(|e| TransportError::RequestFailed { message: e.to_string() })?;

		let status = response.status();
		if !status.is_success() {
			let body = response.text().await.unwrap_or_default();
			return Err(TransportError::Status { code: status.as_u16(), body });
		}

		response
			.json::<T>()
			.await
			.map_err(|e| TransportError::Decode { message: e.to_string() })
	}
}

#[derive(Deserialize)]
struct Envelope<T> {
	data: T,
}

#[derive(Deserialize)]
struct ApiCollection {
	id: String,
	name: String,
}

#[derive(Deserialize)]
struct ApiDocument {
	id: String,
	#[serde(rename = "urlId")]
	url_id: Option<String>,
	title: String,
	#[serde(default)]
	text: String,
	#[serde(rename = "parentDocumentId")]
	parent_document_id: Option<String>,
	#[serde(rename = "createdAt")]
	created_at: chrono::DateTime<chrono::Utc>,
	#[serde(rename = "updatedAt")]
	updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<ApiDocument> for RemoteDoc {
	fn from(d: ApiDocument) -> Self {
		RemoteDoc {
			id: d.id,
			short_id: d.url_id,
			title: d.title,
			text: d.text,
			parent_id: d.parent_document_id,
			created_at: d.created_at,
			updated_at: d.updated_at,
		}
	}
}

#[derive(Serialize)]
struct ListRequest<'a> {
	#[serde(rename = "collectionId")]
	collection_id: &'a str,
	limit: usize,
	offset: usize,
}

#[async_trait]
impl RemoteGateway for HttpRemoteGateway {
	async fn list_collections(&self) -> RemoteResult<Vec<Collection>> {
		let envelope: Envelope<Vec<ApiCollection>> =
			self.post("collections.list", json!({ "limit": PAGE_SIZE })).await?;
		Ok(envelope.data.into_iter().map(|c| Collection { id: c.id, name: c.name }).collect())
	}

	async fn list_documents(&self, collection_id: &str) -> RemoteResult<Vec<RemoteDoc>> {
		let mut all = Vec::new();
		let mut offset = 0usize;
		loop {
			let envelope: Envelope<Vec<ApiDocument>> = self
				.post(
					"documents.list",
					serde_json::to_value(ListRequest { collection_id, limit: PAGE_SIZE, offset })
						.expect("request serializes"),
				)
				.await?;
			let page_len = envelope.data.len();
			all.extend(envelope.data.into_iter().map(RemoteDoc::from));
			if page_len < PAGE_SIZE {
				break;
			}
			offset += PAGE_SIZE;
		}
		Ok(all)
	}

	async fn create_document(
		&self,
		collection_id: &str,
		title: &str,
		text: &str,
		parent_id: Option<&str>,
	) -> RemoteResult<RemoteDoc> {
		let envelope: Envelope<ApiDocument> = self
			.post(
				"documents.create",
				json!({
					"collectionId": collection_id,
					"title": title,
					"text": text,
					"parentDocumentId": parent_id,
					"publish": true,
				}),
			)
			.await?;
		Ok(envelope.data.into())
	}

	async fn update_document(
		&self,
		id: &str,
		title: Option<&str>,
		text: Option<&str>,
		parent_id: Option<Option<&str>>,
	) -> RemoteResult<RemoteDoc> {
		let mut body = json!({ "id": id });
		let obj = body.as_object_mut().expect("constructed as object");
		if let Some(title) = title {
			obj.insert("title".to_string(), json!(title));
		}
		if let Some(text) = text {
			obj.insert("text".to_string(), json!(text));
		}
		if let Some(parent_id) = parent_id {
			obj.insert("parentDocumentId".to_string(), json!(parent_id));
		}
		let envelope: Envelope<ApiDocument> = self.post("documents.update", body).await?;
		Ok(envelope.data.into())
	}

	async fn delete_document(&self, id: &str) -> RemoteResult<()> {
		let _: Envelope<serde_json::Value> =
			self.post("documents.delete", json!({ "id": id })).await?;
		Ok(())
	}
}
