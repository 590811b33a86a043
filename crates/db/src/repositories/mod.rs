use async_trait::async_trait;
use thiserror::Error;

use triage_core::domain::{
    Conversation, ConversationId, Invoice, InvoiceId, Message, Order, OrderId, UserId,
};

pub mod conversation;
pub mod invoice;
pub mod memory;
pub mod order;

pub use conversation::SqlConversationRepository;
pub use invoice::SqlInvoiceRepository;
pub use memory::{InMemoryConversationRepository, InMemoryInvoiceRepository, InMemoryOrderRepository};
pub use order::SqlOrderRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError>;
    /// Most recent orders for a user, newest first.
    async fn recent_for_user(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<Order>, RepositoryError>;
}

#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    async fn find_by_id(&self, id: &InvoiceId) -> Result<Option<Invoice>, RepositoryError>;
    async fn find_by_order_id(&self, id: &OrderId) -> Result<Option<Invoice>, RepositoryError>;
}

#[async_trait]
pub trait ConversationRepository: Send + Sync {
    async fn find_by_id(
        &self,
        id: &ConversationId,
    ) -> Result<Option<Conversation>, RepositoryError>;
    /// Most recently created conversation for a user, if any.
    async fn latest_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Conversation>, RepositoryError>;
    /// Most recent conversations for a user, newest first.
    async fn recent_for_user(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<Conversation>, RepositoryError>;
    async fn create(&self, conversation: Conversation) -> Result<(), RepositoryError>;
    async fn append_message(&self, message: Message) -> Result<(), RepositoryError>;
    /// Last `limit` messages of a conversation, newest first.
    async fn recent_messages(
        &self,
        conversation_id: &ConversationId,
        limit: u32,
    ) -> Result<Vec<Message>, RepositoryError>;
}
