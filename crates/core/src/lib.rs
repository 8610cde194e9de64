//! # Catalogist Core
//!
//! Domain types, traits, and error definitions for the Catalogist catalog
//! compensation runtime. This crate has **no I/O of its own**: it defines the
//! catalog model and the seams (providers, tools) that the other crates
//! implement against.
//!
//! ## Layout
//!
//! - [`catalog`]: the catalog forest, categories and structural operations
//! - [`message`]: role-tagged conversation messages sent to a backend
//! - [`provider`]: the text-completion backend abstraction
//! - [`tool`]: tools the repair agent can invoke against the forest
//! - [`error`]: the error taxonomy shared by all crates

pub mod catalog;
pub mod error;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use catalog::{CatalogNode, Category, Forest, ModuleType, NodePath};
pub use error::{Error, Result};
pub use message::{Conversation, Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse};
pub use tool::{Tool, ToolCall, ToolRegistry, ToolResult};
