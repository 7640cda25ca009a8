//! Chat domain module - threads, messages and topic categories.

mod category;
mod message;
mod thread;

pub use category::Category;
pub use message::{Message, MessageRole};
pub use thread::{Thread, MAX_THREAD_NAME_LEN};
