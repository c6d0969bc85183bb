//! Parser module for assembly source lines

pub mod lexer;
pub mod number;

pub use lexer::{split_fields, strip_comment, Fields, Shape};
pub use number::NumberParser;
