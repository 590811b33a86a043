//! Conversation context: which conversation a request belongs to, what
//! gets persisted, and the bounded window replayed to the model.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use triage_core::domain::{Conversation, ConversationId, Message, MessageId, MessageRole, UserId};
use triage_db::repositories::{ConversationRepository, RepositoryError};

use crate::llm::ChatMessage;

pub struct ContextManager {
    conversations: Arc<dyn ConversationRepository>,
    window: usize,
}

impl ContextManager {
    pub fn new(conversations: Arc<dyn ConversationRepository>, window: usize) -> Self {
        Self { conversations, window }
    }

    /// Resolve the conversation a request belongs to.
    ///
    /// An explicitly requested conversation wins if it exists and belongs
    /// to the user. Otherwise the user's most recent conversation is
    /// reused, and a fresh one is created only when they have none.
    pub async fn resolve(
        &self,
        user_id: &UserId,
        requested: Option<&ConversationId>,
    ) -> Result<Conversation, RepositoryError> {
        if let Some(id) = requested {
            if let Some(conversation) = self.conversations.find_by_id(id).await? {
                if &conversation.user_id == user_id {
                    return Ok(conversation);
                }
                debug!(conversation = %id.0, "requested conversation belongs to another user");
            }
        }

        if let Some(conversation) = self.conversations.latest_for_user(user_id).await? {
            return Ok(conversation);
        }

        let conversation = Conversation {
            id: ConversationId::generate(),
            user_id: user_id.clone(),
            title: "New Conversation".to_string(),
            created_at: Utc::now(),
        };
        self.conversations.create(conversation.clone()).await?;
        Ok(conversation)
    }

    /// Persist one message and return it as stored.
    pub async fn record(
        &self,
        conversation_id: &ConversationId,
        role: MessageRole,
        content: impl Into<String>,
    ) -> Result<Message, RepositoryError> {
        let message = Message {
            id: MessageId::generate(),
            conversation_id: conversation_id.clone(),
            role,
            content: content.into(),
            created_at: Utc::now(),
        };
        self.conversations.append_message(message.clone()).await?;
        Ok(message)
    }

    /// The window replayed to the model: the trailing slice of the
    /// caller-supplied transcript, at most `window` entries, order
    /// preserved.
    pub fn window_for<'a>(&self, transcript: &'a [ChatMessage]) -> &'a [ChatMessage] {
        let start = transcript.len().saturating_sub(self.window);
        &transcript[start..]
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use triage_core::domain::{Conversation, ConversationId, MessageRole, UserId};
    use triage_db::repositories::InMemoryConversationRepository;

    use super::ContextManager;
    use crate::llm::{ChatMessage, ChatRole};

    fn conversation(id: &str, user: &str, days_ago: i64) -> Conversation {
        Conversation {
            id: ConversationId(id.to_string()),
            user_id: UserId(user.to_string()),
            title: "New Conversation".to_string(),
            created_at: Utc::now() - Duration::days(days_ago),
        }
    }

    #[tokio::test]
    async fn resolve_prefers_the_requested_conversation() {
        let repo = Arc::new(InMemoryConversationRepository::with_history(
            vec![conversation("conv-a", "u-1", 3), conversation("conv-b", "u-1", 1)],
            Vec::new(),
        ));
        let manager = ContextManager::new(repo, 10);

        let resolved = manager
            .resolve(&UserId("u-1".to_string()), Some(&ConversationId("conv-a".to_string())))
            .await
            .expect("resolve");
        assert_eq!(resolved.id.0, "conv-a");
    }

    #[tokio::test]
    async fn resolve_ignores_a_conversation_of_another_user() {
        let repo = Arc::new(InMemoryConversationRepository::with_history(
            vec![conversation("conv-theirs", "u-2", 2), conversation("conv-mine", "u-1", 5)],
            Vec::new(),
        ));
        let manager = ContextManager::new(repo, 10);

        let resolved = manager
            .resolve(&UserId("u-1".to_string()), Some(&ConversationId("conv-theirs".to_string())))
            .await
            .expect("resolve");
        assert_eq!(resolved.id.0, "conv-mine");
    }

    #[tokio::test]
    async fn resolve_falls_back_to_latest_then_creates() {
        let repo = Arc::new(InMemoryConversationRepository::with_history(
            vec![conversation("conv-old", "u-1", 9), conversation("conv-new", "u-1", 1)],
            Vec::new(),
        ));
        let manager = ContextManager::new(repo.clone(), 10);

        let latest =
            manager.resolve(&UserId("u-1".to_string()), None).await.expect("resolve");
        assert_eq!(latest.id.0, "conv-new");

        let created =
            manager.resolve(&UserId("u-9".to_string()), None).await.expect("resolve");
        assert_eq!(created.user_id.0, "u-9");
        assert_eq!(created.title, "New Conversation");
    }

    #[tokio::test]
    async fn record_returns_the_message_as_stored() {
        let repo = Arc::new(InMemoryConversationRepository::new());
        let manager = ContextManager::new(repo.clone(), 10);
        let conv = ConversationId("conv-r".to_string());

        let stored =
            manager.record(&conv, MessageRole::User, "hello").await.expect("record");
        assert_eq!(stored.role, MessageRole::User);
        assert_eq!(stored.content, "hello");
        assert_eq!(repo.messages(), vec![stored]);
    }

    #[test]
    fn window_keeps_the_trailing_slice_in_order() {
        let manager = ContextManager::new(Arc::new(InMemoryConversationRepository::new()), 3);

        let transcript: Vec<ChatMessage> = (0..5)
            .map(|index| {
                if index % 2 == 0 {
                    ChatMessage::user(format!("message {index}"))
                } else {
                    ChatMessage::assistant(format!("message {index}"))
                }
            })
            .collect();

        let window = manager.window_for(&transcript);
        assert_eq!(window.len(), 3);
        assert_eq!(window[0].content, "message 2");
        assert_eq!(window[2].content, "message 4");
        assert_eq!(window[2].role, ChatRole::User);
    }

    #[test]
    fn window_passes_short_transcripts_through_whole() {
        let manager = ContextManager::new(Arc::new(InMemoryConversationRepository::new()), 10);

        let transcript = vec![ChatMessage::user("only turn")];
        assert_eq!(manager.window_for(&transcript), transcript.as_slice());
        assert!(manager.window_for(&[]).is_empty());
    }
}
