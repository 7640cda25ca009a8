//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod chat;

pub use chat::{
    // Commands
    CreateThreadCommand, CreateThreadHandler,
    DeleteThreadCommand, DeleteThreadHandler,
    GenerateThreadNameCommand, GenerateThreadNameHandler,
    OpenAssistantStreamCommand, OpenAssistantStreamHandler,
    PostUserTurnCommand, PostUserTurnHandler,
    RenameThreadCommand, RenameThreadHandler,
    // Queries
    CheckAccessHandler, CheckAccessQuery,
    GetUsageHandler, GetUsageQuery, UsageReport,
    ListAssistantsHandler,
    ListMessagesHandler, ListMessagesQuery,
    ListThreadsHandler, ListThreadsQuery,
};
