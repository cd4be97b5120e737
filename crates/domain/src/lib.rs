//! Shared types for the tutoring gateway: configuration, errors,
//! conversation model, collaborator record payloads and trace events.

pub mod config;
pub mod conversation;
pub mod error;
pub mod records;
pub mod trace;
