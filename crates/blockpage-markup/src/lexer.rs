//! # Lexer - Tokenizing Markup Fragments
//!
//! This module breaks a markup fragment into a flat token stream using the
//! [Logos] lexer generator.
//!
//! [Logos]: https://docs.rs/logos
//!
//! ## Coverage Guarantee
//!
//! Every byte of the input lands in exactly one token. Text runs, tags,
//! comments and declarations are all kept as slices of the source so the
//! tree builder can serialise elements back out without re-escaping text:
//!
//! ```
//! use blockpage_markup::lexer::lex;
//!
//! let input = "<p class=\"lead\">Hello &amp; welcome</p>";
//! let tokens = lex(input).unwrap();
//!
//! let reconstructed: String = tokens.iter().map(|t| t.text).collect();
//! assert_eq!(input, reconstructed);
//! ```
//!
//! ## Token Design
//!
//! A tag is lexed as one token from `<` to the matching `>`, honouring quoted
//! attribute values. The lexer does not know about nesting, void elements or
//! implied end tags; that is the tree builder's job.
//!
//! A lone `<` that does not start a tag (as in `a < b`) becomes [`TokenKind::Lt`]
//! and is treated as text. The only hard failures are constructs that are
//! opened but never closed before the end of input.

use std::ops::Range;

use logos::{Lexer, Logos};

use crate::MarkupError;

/// Failure raised from inside a Logos callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LexError {
    #[default]
    Unexpected,
    UnterminatedTag,
    UnterminatedComment,
    UnterminatedDeclaration,
}

/// Token kinds produced by the Logos lexer.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(error = LexError)]
pub enum TokenKind {
    /// `<!-- ... -->`
    #[token("<!--", comment)]
    Comment,

    /// `<!DOCTYPE ...>`, `<![CDATA[...]]>` and friends
    #[token("<!", declaration)]
    Declaration,

    /// `<?xml ...?>`
    #[token("<?", declaration)]
    ProcessingInstruction,

    /// `<name attr="value" ...>` or `<name ... />`
    #[regex(r"<[A-Za-z][A-Za-z0-9:_-]*", tag_rest)]
    StartTag,

    /// `</name>`
    #[regex(r"</[A-Za-z][A-Za-z0-9:_-]*", tag_rest)]
    EndTag,

    /// A `<` that does not open anything
    #[token("<")]
    Lt,

    /// Character data between tags
    #[regex(r"[^<]+")]
    Text,
}

fn comment(lex: &mut Lexer<TokenKind>) -> Result<(), LexError> {
    match lex.remainder().find("-->") {
        Some(end) => {
            lex.bump(end + 3);
            Ok(())
        }
        None => {
            lex.bump(lex.remainder().len());
            Err(LexError::UnterminatedComment)
        }
    }
}

fn declaration(lex: &mut Lexer<TokenKind>) -> Result<(), LexError> {
    match lex.remainder().find('>') {
        Some(end) => {
            lex.bump(end + 1);
            Ok(())
        }
        None => {
            lex.bump(lex.remainder().len());
            Err(LexError::UnterminatedDeclaration)
        }
    }
}

fn tag_rest(lex: &mut Lexer<TokenKind>) -> Result<(), LexError> {
    match find_tag_end(lex.remainder()) {
        Some(end) => {
            lex.bump(end);
            Ok(())
        }
        None => {
            lex.bump(lex.remainder().len());
            Err(LexError::UnterminatedTag)
        }
    }
}

/// Byte length up to and including the `>` closing a tag, skipping over
/// quoted attribute values.
fn find_tag_end(rest: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in rest.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' => quote = Some(c),
                '>' => return Some(i + 1),
                _ => {}
            },
        }
    }
    None
}

/// A lexed token with its kind, text slice and byte span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub span: Range<usize>,
}

/// Lex the input into a sequence of tokens.
///
/// Fails only when a tag, comment or declaration is still open at the end of
/// the input.
pub fn lex(input: &str) -> Result<Vec<Token<'_>>, MarkupError> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(input);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let text = lexer.slice();
        let kind = match result {
            Ok(kind) => kind,
            Err(err) => {
                let offset = span.start;
                return Err(match err {
                    LexError::UnterminatedTag => MarkupError::UnterminatedTag { offset },
                    LexError::UnterminatedComment => MarkupError::UnterminatedComment { offset },
                    LexError::UnterminatedDeclaration => {
                        MarkupError::UnterminatedDeclaration { offset }
                    }
                    LexError::Unexpected => MarkupError::Unexpected { offset },
                });
            }
        };
        tokens.push(Token { kind, text, span });
    }

    Ok(tokens)
}
