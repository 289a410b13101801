//! Seams between the dispatcher and its collaborators.

mod exchange;
mod notify;
mod storage;

pub use exchange::TokenExchange;
pub use notify::NotificationSink;
pub use storage::SlotStorage;
