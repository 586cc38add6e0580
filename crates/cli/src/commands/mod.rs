//! Command handlers for the docchat CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod ask;
pub mod chat;
pub mod delete;
pub mod ingest;
pub mod models;
pub mod status;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use delete::DeleteCommand;
pub use ingest::IngestCommand;
pub use models::ModelsCommand;
pub use status::StatusCommand;
