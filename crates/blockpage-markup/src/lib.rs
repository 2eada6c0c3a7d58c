//! # blockpage-markup
//!
//! A small, lenient reader for the markup fragments editors paste into the
//! page builder (web pages, word-processor exports, old CMS content).
//!
//! ## Architecture Overview
//!
//! ```text
//! Source Text → Lexer → Tokens → TreeBuilder → Vec<Node>
//!               (Logos)          (open-element stack)
//! ```
//!
//! ### 1. Lexer ([`lexer`] module)
//!
//! Tokenizes the fragment into tags, comments, declarations and text runs.
//! Every byte ends up in some token.
//!
//! ### 2. Parser ([`parser`] module)
//!
//! Folds tokens into a forest of [`Node`]s, recovering from the usual
//! sloppiness (unclosed `<p>` and `<li>`, stray end tags, unclosed elements
//! at the end).
//!
//! ## Failure Model
//!
//! Almost anything parses. The input is rejected only when a tag, comment or
//! declaration is still open when the input runs out, which usually means
//! the fragment was truncated in transit.
//!
//! ## Quick Start
//!
//! ```
//! use blockpage_markup::{Node, parse_fragment};
//!
//! let nodes = parse_fragment("<h2>Welcome</h2><p>Term starts <b>Monday</b></p>").unwrap();
//! assert_eq!(nodes.len(), 2);
//! assert_eq!(nodes[1].text_content(), "Term starts Monday");
//! assert_eq!(nodes[1].to_html(), "<p>Term starts <b>Monday</b></p>");
//! ```

pub mod lexer;
pub mod node;
pub mod parser;

pub use node::{Attribute, Element, Node, Text};
pub use parser::parse_fragment;

/// Errors that make a fragment unreadable as markup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MarkupError {
    #[error("unterminated tag starting at byte {offset}")]
    UnterminatedTag { offset: usize },
    #[error("unterminated comment starting at byte {offset}")]
    UnterminatedComment { offset: usize },
    #[error("unterminated declaration starting at byte {offset}")]
    UnterminatedDeclaration { offset: usize },
    #[error("unexpected input at byte {offset}")]
    Unexpected { offset: usize },
}
