//! Conversation session management.
//!
//! A `ChatSession` holds the ordered turn history bound to one model
//! handle and sends one turn at a time.

mod chat;
mod manager;
mod types;


pub use manager::ChatSession;
pub use types::augment_query;
