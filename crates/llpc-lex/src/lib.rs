//! Lexical analysis: turns source text into a [`Token`] stream.
//!
//! Dispatch lives in [`lexer::core::Lexer::next_token`], split by concern
//! across the `lexer` submodules (identifiers/keywords, numbers, strings,
//! operators, comments). `cursor` and `unicode` are the character-level
//! primitives the dispatch methods build on.

pub mod cursor;
pub mod lexer;
pub mod token;
pub mod unicode;

#[cfg(test)]
mod edge_cases;

pub use lexer::Lexer;
pub use token::Token;
