//! In-memory repository fakes for tests and for wiring the agent crate
//! without a database.

use std::sync::Mutex;

use triage_core::domain::{
    Conversation, ConversationId, Invoice, InvoiceId, Message, Order, OrderId, UserId,
};

use super::{ConversationRepository, InvoiceRepository, OrderRepository, RepositoryError};

#[derive(Default)]
pub struct InMemoryOrderRepository {
    orders: Mutex<Vec<Order>>,
}

impl InMemoryOrderRepository {
    pub fn new(orders: Vec<Order>) -> Self {
        Self { orders: Mutex::new(orders) }
    }
}

#[async_trait::async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        let orders = self.orders.lock().map_err(poisoned)?;
        Ok(orders.iter().find(|order| &order.id == id).cloned())
    }

    async fn recent_for_user(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<Order>, RepositoryError> {
        let orders = self.orders.lock().map_err(poisoned)?;
        let mut matching: Vec<Order> =
            orders.iter().filter(|order| &order.user_id == user_id).cloned().collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching.truncate(limit as usize);
        Ok(matching)
    }
}

#[derive(Default)]
pub struct InMemoryInvoiceRepository {
    invoices: Mutex<Vec<Invoice>>,
}

impl InMemoryInvoiceRepository {
    pub fn new(invoices: Vec<Invoice>) -> Self {
        Self { invoices: Mutex::new(invoices) }
    }
}

#[async_trait::async_trait]
impl InvoiceRepository for InMemoryInvoiceRepository {
    async fn find_by_id(&self, id: &InvoiceId) -> Result<Option<Invoice>, RepositoryError> {
        let invoices = self.invoices.lock().map_err(poisoned)?;
        Ok(invoices.iter().find(|invoice| &invoice.id == id).cloned())
    }

    async fn find_by_order_id(&self, id: &OrderId) -> Result<Option<Invoice>, RepositoryError> {
        let invoices = self.invoices.lock().map_err(poisoned)?;
        Ok(invoices.iter().find(|invoice| &invoice.order_id == id).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryConversationRepository {
    conversations: Mutex<Vec<Conversation>>,
    messages: Mutex<Vec<Message>>,
}

impl InMemoryConversationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history(conversations: Vec<Conversation>, messages: Vec<Message>) -> Self {
        Self { conversations: Mutex::new(conversations), messages: Mutex::new(messages) }
    }

    /// Snapshot of all stored messages, in insertion order.
    pub fn messages(&self) -> Vec<Message> {
        self.messages.lock().map(|messages| messages.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl ConversationRepository for InMemoryConversationRepository {
    async fn find_by_id(
        &self,
        id: &ConversationId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let conversations = self.conversations.lock().map_err(poisoned)?;
        Ok(conversations.iter().find(|conversation| &conversation.id == id).cloned())
    }

    async fn latest_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let conversations = self.conversations.lock().map_err(poisoned)?;
        Ok(conversations
            .iter()
            .filter(|conversation| &conversation.user_id == user_id)
            .max_by_key(|conversation| conversation.created_at)
            .cloned())
    }

    async fn recent_for_user(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<Conversation>, RepositoryError> {
        let conversations = self.conversations.lock().map_err(poisoned)?;
        let mut matching: Vec<Conversation> = conversations
            .iter()
            .filter(|conversation| &conversation.user_id == user_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching.truncate(limit as usize);
        Ok(matching)
    }

    async fn create(&self, conversation: Conversation) -> Result<(), RepositoryError> {
        self.conversations.lock().map_err(poisoned)?.push(conversation);
        Ok(())
    }

    async fn append_message(&self, message: Message) -> Result<(), RepositoryError> {
        self.messages.lock().map_err(poisoned)?.push(message);
        Ok(())
    }

    async fn recent_messages(
        &self,
        conversation_id: &ConversationId,
        limit: u32,
    ) -> Result<Vec<Message>, RepositoryError> {
        let messages = self.messages.lock().map_err(poisoned)?;
        let mut matching: Vec<Message> = messages
            .iter()
            .filter(|message| &message.conversation_id == conversation_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching.truncate(limit as usize);
        Ok(matching)
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> RepositoryError {
    RepositoryError::Decode("in-memory repository lock poisoned".to_string())
}
