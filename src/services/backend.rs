use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::models::{LikeOutcome, Profile};

/// Errors from the remote document store.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: session ended or invalid credentials")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Remote mutations the swipe processor and engine depend on.
///
/// `like` must be idempotent from the caller's perspective: a retried
/// like for an already-liked id returns the same outcome without
/// creating a second match.
#[async_trait]
pub trait MatchBackend: Send + Sync {
    async fn like(&self, profile_id: &str) -> Result<LikeOutcome, BackendError>;
    async fn dislike(&self, profile_id: &str) -> Result<(), BackendError>;
    async fn unmatch(&self, match_id: &str) -> Result<(), BackendError>;
    /// Fetch the raw (unfiltered) candidate pool for the current user.
    async fn fetch_discover_pool(&self) -> Result<Vec<Profile>, BackendError>;
    /// Fetch a single hydrated profile.
    async fn fetch_profile(&self, profile_id: &str) -> Result<Profile, BackendError>;
}

/// Collection ids in the document store.
#[derive(Debug, Clone)]
pub struct StoreCollections {
    pub profiles: String,
    pub likes: String,
    pub matches: String,
    pub conversations: String,
}

/// Document-store API client.
///
/// Speaks the store's REST documents API on behalf of one signed-in
/// user. Mutual-match detection runs server-side; the like endpoint
/// returns the evaluated outcome in the created document's data.
pub struct DocumentClient {
    base_url: String,
    api_key: String,
    project_id: String,
    database_id: String,
    user_id: String,
    client: Client,
    collections: StoreCollections,
}

impl DocumentClient {
    pub fn new(
        base_url: String,
        api_key: String,
        project_id: String,
        database_id: String,
        user_id: String,
        collections: StoreCollections,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url,
            api_key,
            project_id,
            database_id,
            user_id,
            client,
            collections,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    fn documents_url(&self, collection: &str) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.base_url.trim_end_matches('/'),
            self.database_id,
            collection
        )
    }

    fn check_status(status: StatusCode, context: &str) -> Result<(), BackendError> {
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(BackendError::Unauthorized);
        }
        if !status.is_success() {
            return Err(BackendError::ApiError(format!("{}: {}", context, status)));
        }
        Ok(())
    }

    /// Deterministic document id for a directed like, so a retried like
    /// upserts instead of creating a second record.
    fn like_document_id(&self, target_id: &str) -> String {
        format!("like_{}_{}", self.user_id, target_id)
    }

    pub(crate) async fn list_documents(
        &self,
        collection: &str,
        queries: &[String],
    ) -> Result<Vec<Value>, BackendError> {
        let queries_json = serde_json::to_string(queries)
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;
        let encoded = urlencoding::encode(&queries_json);
        let url = format!("{}?query={}", self.documents_url(collection), encoded);

        tracing::debug!("Listing documents: {}", url);

        let response = self
            .client
            .get(&url)
            .header("X-Store-Key", &self.api_key)
            .header("X-Store-Project", &self.project_id)
            .send()
            .await?;

        Self::check_status(response.status(), "list documents")?;

        let json: Value = response.json().await?;
        let documents = json
            .get("documents")
            .and_then(|d| d.as_array())
            .ok_or_else(|| BackendError::InvalidResponse("Missing documents array".into()))?;

        Ok(documents.clone())
    }

    pub(crate) async fn create_document(
        &self,
        collection: &str,
        document_id: &str,
        data: Value,
    ) -> Result<Value, BackendError> {
        let payload = serde_json::json!({
            "documentId": document_id,
            "data": data,
        });

        let response = self
            .client
            .post(self.documents_url(collection))
            .header("X-Store-Key", &self.api_key)
            .header("X-Store-Project", &self.project_id)
            .json(&payload)
            .send()
            .await?;

        Self::check_status(response.status(), "create document")?;
        Ok(response.json().await?)
    }

    pub(crate) async fn delete_document(
        &self,
        collection: &str,
        document_id: &str,
    ) -> Result<(), BackendError> {
        let url = format!("{}/{}", self.documents_url(collection), document_id);

        let response = self
            .client
            .delete(&url)
            .header("X-Store-Key", &self.api_key)
            .header("X-Store-Project", &self.project_id)
            .send()
            .await?;

        // Deleting an already-deleted document is not an error for us.
        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!("Document {} already gone from {}", document_id, collection);
            return Ok(());
        }
        Self::check_status(response.status(), "delete document")
    }
}

#[async_trait]
impl MatchBackend for DocumentClient {
    async fn like(&self, profile_id: &str) -> Result<LikeOutcome, BackendError> {
        let doc = self
            .create_document(
                &self.collections.likes,
                &self.like_document_id(profile_id),
                serde_json::json!({
                    "userId": self.user_id,
                    "targetUserId": profile_id,
                    "direction": "like",
                    "createdAt": chrono::Utc::now(),
                }),
            )
            .await?;

        // Server-side hooks evaluate mutuality and write the outcome
        // back into the created document's data.
        let data = doc.get("data").unwrap_or(&doc);
        let outcome = serde_json::from_value(data.clone())
            .map_err(|e| BackendError::InvalidResponse(format!("Failed to parse like outcome: {}", e)))?;

        tracing::debug!("Like {} -> {}: recorded", self.user_id, profile_id);
        Ok(outcome)
    }

    async fn dislike(&self, profile_id: &str) -> Result<(), BackendError> {
        self.create_document(
            &self.collections.likes,
            &self.like_document_id(profile_id),
            serde_json::json!({
                "userId": self.user_id,
                "targetUserId": profile_id,
                "direction": "dislike",
                "createdAt": chrono::Utc::now(),
            }),
        )
        .await?;

        tracing::debug!("Dislike {} -> {}: recorded", self.user_id, profile_id);
        Ok(())
    }

    async fn unmatch(&self, match_id: &str) -> Result<(), BackendError> {
        // Termination is a logical delete server-side; from this
        // client's perspective the record leaves the filtered query and
        // both participants observe a `removed` event.
        self.delete_document(&self.collections.matches, match_id)
            .await?;
        tracing::debug!("Unmatch requested for {}", match_id);
        Ok(())
    }

    async fn fetch_discover_pool(&self) -> Result<Vec<Profile>, BackendError> {
        let queries = vec![format!("notEqual(\"id\", \"{}\")", self.user_id)];
        let documents = self
            .list_documents(&self.collections.profiles, &queries)
            .await?;

        // Tolerate individual malformed documents; the selector handles
        // duplicates downstream.
        let profiles: Vec<Profile> = documents
            .iter()
            .filter_map(|doc| {
                let data = doc.get("data").unwrap_or(doc);
                serde_json::from_value(data.clone()).ok()
            })
            .collect();

        tracing::debug!("Fetched {} discover profiles", profiles.len());
        Ok(profiles)
    }

    async fn fetch_profile(&self, profile_id: &str) -> Result<Profile, BackendError> {
        let queries = vec![format!("equal(\"id\", \"{}\")", profile_id)];
        let documents = self
            .list_documents(&self.collections.profiles, &queries)
            .await?;

        let doc = documents
            .first()
            .ok_or_else(|| BackendError::NotFound(format!("Profile not found: {}", profile_id)))?;

        let data = doc.get("data").unwrap_or(doc);
        serde_json::from_value(data.clone())
            .map_err(|e| BackendError::InvalidResponse(format!("Failed to parse profile: {}", e)))
    }
}
