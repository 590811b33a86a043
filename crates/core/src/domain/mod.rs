pub mod conversation;
pub mod invoice;
pub mod order;

pub use conversation::{Conversation, ConversationId, Message, MessageId, MessageRole, UserId};
pub use invoice::{Invoice, InvoiceId, RefundStatus};
pub use order::{Order, OrderId, OrderStatus};
