//! Predicate tree: the compiled form of one filter expression.

use crate::dissect::DissectionTree;
use crate::field::{FieldId, FieldType, FieldValue};

/// Relational operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Gt,
    GtEq,
    Lt,
    LtEq,
}

impl CompareOp {
    /// Whether a relation with this operator is admissible on operands of
    /// the given declared type. The compiler front end enforces this; the
    /// comparators assume it.
    pub fn admissible_for(self, ftype: FieldType) -> bool {
        match ftype {
            FieldType::Numeric => true,
            FieldType::Bytes => matches!(
                self,
                CompareOp::Eq | CompareOp::NotEq | CompareOp::Gt | CompareOp::Lt
            ),
            FieldType::Boolean
            | FieldType::MacAddr
            | FieldType::Ipv4Addr
            | FieldType::IpxNet
            | FieldType::AbsTime
            | FieldType::Str => matches!(self, CompareOp::Eq | CompareOp::NotEq),
            FieldType::None => false,
        }
    }

    /// Operator spelling used in diagnostics.
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::NotEq => "!=",
            CompareOp::Gt => ">",
            CompareOp::GtEq => ">=",
            CompareOp::Lt => "<",
            CompareOp::LtEq => "<=",
        }
    }
}

/// Logical combinators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
    Xor,
    Not,
}

/// Byte range written on a bytes operand in the filter text
/// (`field[offset:length]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// Offset into the field's stored bytes.
    pub offset: usize,
    /// Number of bytes addressed from the offset.
    pub length: usize,
}

/// One node of a predicate tree.
///
/// A `Relation`'s operands are always `FieldRef` or `Literal`; the parser
/// never nests relations. Everywhere else a `FieldRef` is an existence test
/// and a `Literal` is trivially true (leniency kept for compatibility with
/// the expression grammar this engine descends from).
#[derive(Debug, Clone)]
pub enum PredicateNode {
    /// Reference to a registered field.
    FieldRef {
        /// The referenced field.
        field: FieldId,
        /// Its declared value type.
        ftype: FieldType,
        /// Protocol whose first subtree scopes value extraction and
        /// existence tests: the field itself for protocol references,
        /// otherwise the owning protocol. `None` never matches anything.
        scope: Option<FieldId>,
        /// Explicit byte slice; only bytes-typed fields carry one.
        range: Option<ByteRange>,
    },
    /// Constant decoded from the filter text.
    Literal(FieldValue),
    /// Relational comparison between two operands.
    Relation {
        op: CompareOp,
        lhs: Box<PredicateNode>,
        rhs: Box<PredicateNode>,
    },
    /// Logical combinator; `rhs` is absent exactly for `Not`.
    Logical {
        op: LogicalOp,
        lhs: Box<PredicateNode>,
        rhs: Option<Box<PredicateNode>>,
    },
}

/// A compiled filter expression.
///
/// The tree is immutable and holds no per-evaluation scratch state, so one
/// tree may be evaluated against any number of packets, concurrently if
/// desired. Trees from successive compiles are independent of each other.
#[derive(Debug, Clone)]
pub struct PredicateTree {
    pub(crate) root: PredicateNode,
    pub(crate) source: Box<str>,
}

impl PredicateTree {
    /// Evaluate this filter against one packet's dissection.
    pub fn matches(&self, dissection: &DissectionTree) -> bool {
        super::eval::evaluate(self, dissection)
    }

    /// The filter text this tree was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The root node of the compiled tree.
    pub fn root(&self) -> &PredicateNode {
        &self.root
    }
}
