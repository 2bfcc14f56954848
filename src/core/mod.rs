//! Core parsing modules
//!
//! The pipeline runs in stages:
//! - `category`: characters to category-coded characters
//! - `tokenizer`: category-coded characters to tokens
//! - `reader`: tokens to an expression tree
//! - `tree` / `node`: the tree itself, with read-only and mutable views
//!
//! `buffer` provides the rewindable cursor every stage reads through.

pub mod buffer;
pub mod category;
pub mod node;
pub mod reader;
pub mod token;
pub mod tokenizer;
pub mod tree;

pub use buffer::Buffer;
pub use category::{categorize, Categorizer, CategoryCode};
pub use node::{Attr, NodeKind, TexNode};
pub use reader::{ParseOptions, Parser, Tolerance};
pub use token::{Token, TokenCode};
pub use tokenizer::{tokenize, Tokenizer};
pub use tree::{
    ArgSlot, Child, EnvKind, Expr, GroupKind, NodeId, TexArgs, TexNodeMut, TexTree,
};
