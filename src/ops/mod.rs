//! High-level operations.
//!
//! Resolution produces data only; applying mutates a project model. An
//! embedding tool calls [`resolve`] once its declarations are known and
//! [`apply`] once its project model is ready.

pub mod apply;
pub mod resolve;

pub use apply::{apply, candidate_folders, ApplyReport, RegisteredRoot};
pub use resolve::{resolve, resolve_one};
