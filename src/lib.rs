//! The lexical and syntactic front-end of the coral language: a tokenizer with precise error
//! reporting, a redirection scanner, a flat parse tree with type-safe navigation, and the word
//! motion machinery used by the line editor.

pub mod parse_constants;
pub mod parse_tree;
pub mod redirection;
pub mod tnode;
pub mod tokenizer;
pub mod wchar;
pub mod wchar_ext;
pub mod word_motion;
