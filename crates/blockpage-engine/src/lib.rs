//! Block content tree engine for the school website page builder.
//!
//! - [`models`]: the stored page and block documents
//! - [`registry`]: block types, their defaults and renderers
//! - [`editing`]: the content tree and its structural edits
//! - [`render`]: block lists to HTML
//! - [`import`]: markup and Markdown fragments to blocks
//! - [`io`]: page storage

pub mod editing;
pub mod import;
pub mod io;
pub mod models;
pub mod registry;
pub mod render;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use editing::{
    Cmd, ContentTree, Direction, EditOutcome, Edited, InsertTarget, PageEditor, Patch, Selection,
    TreeError,
};
pub use import::{ImportError, import_markdown, import_markup};
pub use io::*;
pub use models::*;
pub use registry::{BlockTypeRegistry, RegistryError};
pub use render::{RenderOutput, Renderer};
