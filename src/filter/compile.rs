//! Filter compiler: from filter text to an executable predicate tree.

use std::sync::Arc;

use super::ast::PredicateTree;
use super::lexer;
use super::parser::Parser;
use crate::error::{CompileError, Result};
use crate::field::{FieldRegistry, SymbolTable};

/// Compiles display-filter text into [`PredicateTree`]s.
///
/// One compiler is built over a fully populated registry; the symbol table
/// is derived once at construction. Every successful [`compile`](Self::compile)
/// call returns an independent, immutable tree, so recompiling (e.g. while a
/// user edits the filter) never invalidates trees that are still evaluating
/// packets elsewhere.
#[derive(Debug, Clone)]
pub struct FilterCompiler {
    registry: Arc<FieldRegistry>,
    symbols: Arc<SymbolTable>,
}

impl FilterCompiler {
    /// Build a compiler over the given registry.
    pub fn new(registry: Arc<FieldRegistry>) -> Self {
        let symbols = Arc::new(SymbolTable::build(&registry));
        Self { registry, symbols }
    }

    /// The symbol table derived from the registry.
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Compile filter text into an executable predicate tree.
    ///
    /// Empty or all-whitespace input is rejected before the parser runs.
    /// Note that a filter consisting of a single bare literal (e.g. `42`)
    /// compiles and matches every packet; this leniency is kept for
    /// compatibility with the grammar this engine descends from.
    pub fn compile(&self, text: &str) -> Result<PredicateTree> {
        if text.trim().is_empty() {
            return Err(CompileError::InvalidArgument);
        }

        let tokens = lexer::tokenize(text).map_err(CompileError::Syntax)?;
        let root = Parser::new(tokens, &self.registry, &self.symbols)
            .parse()
            .map_err(CompileError::Syntax)?;

        tracing::debug!(filter = text, "compiled display filter");
        Ok(PredicateTree {
            root,
            source: text.into(),
        })
    }
}
