use async_trait::async_trait;
use std::sync::Arc;

use crate::services::backend::{BackendError, DocumentClient};

/// Boundary to the messaging subsystem.
///
/// The match engine treats conversation identity as opaque: it resolves
/// a thread when a match confirms and drops threads when the cascade
/// removes a participant.
#[async_trait]
pub trait ConversationBinder: Send + Sync {
    /// Resolve the conversation with `other_user_id`, creating it if
    /// absent. Idempotent: calling twice for the same pair returns the
    /// same id.
    async fn resolve_or_create(&self, other_user_id: &str) -> Result<String, BackendError>;

    /// Drop every conversation whose participant set includes
    /// `user_id`. Idempotent.
    async fn drop_by_participant(&self, user_id: &str) -> Result<(), BackendError>;
}

/// Document-store conversation binder.
///
/// Conversation documents get a deterministic id derived from the
/// ordered participant pair, which is what makes `resolve_or_create`
/// idempotent without a read-modify-write race.
pub struct DocumentConversations {
    client: Arc<DocumentClient>,
    collection: String,
}

impl DocumentConversations {
    pub fn new(client: Arc<DocumentClient>, collection: String) -> Self {
        Self { client, collection }
    }

    fn pair_id(&self, other_user_id: &str) -> String {
        let me = self.client.user_id();
        let (first, second) = if me <= other_user_id {
            (me, other_user_id)
        } else {
            (other_user_id, me)
        };
        format!("conv_{}_{}", first, second)
    }
}

#[async_trait]
impl ConversationBinder for DocumentConversations {
    async fn resolve_or_create(&self, other_user_id: &str) -> Result<String, BackendError> {
        let id = self.pair_id(other_user_id);
        let me = self.client.user_id().to_string();

        match self
            .client
            .create_document(
                &self.collection,
                &id,
                serde_json::json!({
                    "participants": [me, other_user_id],
                    "createdAt": chrono::Utc::now(),
                }),
            )
            .await
        {
            Ok(_) => {
                tracing::debug!("Created conversation {}", id);
                Ok(id)
            }
            // Already exists under the pair id: same thread, same answer.
            Err(BackendError::ApiError(msg)) if msg.contains("409") => {
                tracing::debug!("Conversation {} already exists", id);
                Ok(id)
            }
            Err(e) => Err(e),
        }
    }

    async fn drop_by_participant(&self, user_id: &str) -> Result<(), BackendError> {
        let queries = vec![format!("contains(\"participants\", \"{}\")", user_id)];
        let documents = self.client.list_documents(&self.collection, &queries).await?;

        for doc in &documents {
            if let Some(id) = doc.get("$id").and_then(|v| v.as_str()) {
                self.client.delete_document(&self.collection, id).await?;
            }
        }

        tracing::debug!(
            "Dropped {} conversation(s) involving {}",
            documents.len(),
            user_id
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::backend::StoreCollections;

    fn client(base_url: &str) -> Arc<DocumentClient> {
        Arc::new(DocumentClient::new(
            base_url.to_string(),
            "test_key".to_string(),
            "test_project".to_string(),
            "test_db".to_string(),
            "u1".to_string(),
            StoreCollections {
                profiles: "profiles".to_string(),
                likes: "likes".to_string(),
                matches: "matches".to_string(),
                conversations: "conversations".to_string(),
            },
        ))
    }

    #[test]
    fn test_pair_id_is_order_independent() {
        let binder = DocumentConversations::new(client("https://store.test/v1"), "conversations".to_string());
        // u1 paired with u7 yields the same id whichever side asks.
        assert_eq!(binder.pair_id("u7"), "conv_u1_u7");

        let binder_other_side = DocumentConversations::new(
            Arc::new(DocumentClient::new(
                "https://store.test/v1".to_string(),
                "k".to_string(),
                "p".to_string(),
                "db".to_string(),
                "u7".to_string(),
                StoreCollections {
                    profiles: "profiles".to_string(),
                    likes: "likes".to_string(),
                    matches: "matches".to_string(),
                    conversations: "conversations".to_string(),
                },
            )),
            "conversations".to_string(),
        );
        assert_eq!(binder_other_side.pair_id("u1"), "conv_u1_u7");
    }

    #[tokio::test]
    async fn test_drop_by_participant_deletes_each_thread() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock(
                "GET",
                mockito::Matcher::Regex(
                    "/databases/test_db/collections/conversations/documents.*".to_string(),
                ),
            )
            .with_status(200)
            .with_body(r#"{"total": 1, "documents": [{"$id": "conv_u1_u7", "data": {}}]}"#)
            .create_async()
            .await;
        let delete = server
            .mock(
                "DELETE",
                "/databases/test_db/collections/conversations/documents/conv_u1_u7",
            )
            .with_status(204)
            .create_async()
            .await;

        let binder = DocumentConversations::new(client(&server.url()), "conversations".to_string());
        binder.drop_by_participant("u7").await.unwrap();
        delete.assert_async().await;
    }
}
