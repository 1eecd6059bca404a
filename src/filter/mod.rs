//! Filter compilation and evaluation.
//!
//! This module provides:
//! - the predicate tree (`ast`), the compiled form of one filter
//! - the lexer/parser front end turning filter text into a tree
//! - the typed value extractor and per-type relational comparators
//! - the recursive evaluator applying a tree to one packet's dissection

mod ast;
mod compare;
mod compile;
mod eval;
mod extract;
mod lexer;
mod parser;

pub use ast::{ByteRange, CompareOp, LogicalOp, PredicateNode, PredicateTree};
pub use compile::FilterCompiler;
pub use eval::evaluate;
