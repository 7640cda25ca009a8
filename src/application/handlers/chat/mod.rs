//! Chat command and query handlers.
//!
//! Thread lifecycle, user turns, assistant streaming, naming, access checks
//! and usage reporting.

mod check_access;
mod create_thread;
mod delete_thread;
mod generate_thread_name;
mod get_usage;
mod list_assistants;
mod list_messages;
mod list_threads;
mod open_assistant_stream;
mod post_user_turn;
mod rename_thread;

#[cfg(test)]
pub(crate) mod test_support;

pub use check_access::{CheckAccessHandler, CheckAccessQuery};
pub use create_thread::{CreateThreadCommand, CreateThreadHandler};
pub use delete_thread::{DeleteThreadCommand, DeleteThreadHandler};
pub use generate_thread_name::{GenerateThreadNameCommand, GenerateThreadNameHandler};
pub use get_usage::{GetUsageHandler, GetUsageQuery, UsageReport};
pub use list_assistants::ListAssistantsHandler;
pub use list_messages::{ListMessagesHandler, ListMessagesQuery};
pub use list_threads::{ListThreadsHandler, ListThreadsQuery};
pub use open_assistant_stream::{OpenAssistantStreamCommand, OpenAssistantStreamHandler};
pub use post_user_turn::{PostUserTurnCommand, PostUserTurnHandler};
pub use rename_thread::{RenameThreadCommand, RenameThreadHandler};
