//! Firestore REST document client.
//!
//! # Responsibility
//! - Implement [`DocumentClient`] over the Firestore v1 REST API.
//! - Translate HTTP outcomes into `StoreError` values.
//!
//! # Invariants
//! - Update and delete carry `currentDocument.exists=true`, so a missing
//!   document surfaces as `NotFound` instead of being created or ignored.
//! - The API key is sent as a query parameter and never logged.

use super::{Document, DocumentClient, DocumentFields};
use crate::model::activity::RecordId;
use crate::store::{StoreError, StoreResult};
use log::debug;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com/v1";
pub const DEFAULT_DATABASE: &str = "(default)";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const LIST_PAGE_SIZE: u32 = 300;

/// Connection settings for one Firestore project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirestoreSettings {
    pub base_url: String,
    pub project_id: String,
    pub database: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl FirestoreSettings {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            project_id: project_id.into(),
            database: DEFAULT_DATABASE.to_string(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireDocument {
    name: String,
    #[serde(default)]
    fields: DocumentFields,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<WireDocument>,
    next_page_token: Option<String>,
}

/// Blocking Firestore REST client.
pub struct FirestoreRestClient {
    http: Client,
    settings: FirestoreSettings,
}

impl FirestoreRestClient {
    /// # Errors
    /// - `Transport` when the HTTP client cannot be constructed.
    pub fn new(settings: FirestoreSettings) -> StoreResult<Self> {
        let http = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(transport_error)?;
        Ok(Self { http, settings })
    }

    pub fn settings(&self) -> &FirestoreSettings {
        &self.settings
    }

    fn collection_url(&self, collection: &str) -> String {
        format!(
            "{}/projects/{}/databases/{}/documents/{}",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.project_id,
            self.settings.database,
            collection
        )
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}", self.collection_url(collection), id)
    }

    fn with_key(&self, request: RequestBuilder) -> RequestBuilder {
        match self.settings.api_key.as_deref() {
            Some(key) => request.query(&[("key", key)]),
            None => request,
        }
    }

    fn send(&self, request: RequestBuilder, target: Option<&str>) -> StoreResult<Response> {
        let response = self.with_key(request).send().map_err(transport_error)?;
        let status = response.status();
        debug!("event=firestore_response module=store status_code={}", status.as_u16());

        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND {
            if let Some(id) = target {
                return Err(StoreError::NotFound(RecordId::new(id)));
            }
        }
        let body = response.text().unwrap_or_default();
        Err(StoreError::Http {
            status: status.as_u16(),
            body,
        })
    }
}

impl DocumentClient for FirestoreRestClient {
    fn list_documents(&self, collection: &str) -> StoreResult<Vec<Document>> {
        let url = self.collection_url(collection);
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .http
                .get(&url)
                .query(&[("pageSize", LIST_PAGE_SIZE.to_string())]);
            if let Some(token) = page_token.as_deref() {
                request = request.query(&[("pageToken", token)]);
            }

            let page: ListDocumentsResponse =
                self.send(request, None)?.json().map_err(transport_error)?;
            documents.extend(page.documents.into_iter().map(|wire| Document {
                id: document_id(&wire.name).to_string(),
                fields: wire.fields,
            }));

            match page.next_page_token.filter(|token| !token.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(documents)
    }

    fn create_document(&self, collection: &str, fields: &DocumentFields) -> StoreResult<String> {
        let request = self
            .http
            .post(self.collection_url(collection))
            .json(&json!({ "fields": fields }));
        let created: WireDocument = self.send(request, None)?.json().map_err(transport_error)?;
        Ok(document_id(&created.name).to_string())
    }

    fn update_document(
        &self,
        collection: &str,
        id: &str,
        fields: &DocumentFields,
    ) -> StoreResult<()> {
        let request = self
            .http
            .patch(self.document_url(collection, id))
            .query(&[("currentDocument.exists", "true")])
            .json(&json!({ "fields": fields }));
        self.send(request, Some(id))?;
        Ok(())
    }

    fn delete_document(&self, collection: &str, id: &str) -> StoreResult<()> {
        let request = self
            .http
            .delete(self.document_url(collection, id))
            .query(&[("currentDocument.exists", "true")]);
        self.send(request, Some(id))?;
        Ok(())
    }
}

/// Returns the trailing id segment of a full document resource name.
fn document_id(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

fn transport_error(err: reqwest::Error) -> StoreError {
    StoreError::Transport(err.without_url().to_string())
}

#[cfg(test)]
mod tests {
    use super::{document_id, FirestoreRestClient, FirestoreSettings};

    #[test]
    fn document_id_takes_last_path_segment() {
        assert_eq!(
            document_id("projects/p/databases/(default)/documents/activities/abc123"),
            "abc123"
        );
        assert_eq!(document_id("plain"), "plain");
    }

    #[test]
    fn collection_url_tolerates_trailing_slash() {
        let mut settings = FirestoreSettings::new("demo-project");
        settings.base_url = "http://localhost:8080/v1/".to_string();
        let client = FirestoreRestClient::new(settings).unwrap();

        assert_eq!(
            client.collection_url("activities"),
            "http://localhost:8080/v1/projects/demo-project/databases/(default)/documents/activities"
        );
    }
}
