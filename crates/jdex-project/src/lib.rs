//! Collaborator boundary for the companion Java language server.
//!
//! The explorer never talks to the server directly; it consumes the
//! [`ProjectClient`] trait for structural queries and watches the
//! [`ServerMode`] signal to know when those queries can be answered.

mod client;
mod node;
mod status;

pub use client::ProjectClient;
pub use node::{NodeData, NodeKind};
pub use status::{ServerMode, ServerStatus};
