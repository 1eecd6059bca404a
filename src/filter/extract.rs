//! Typed value extraction from dissection trees.

use smallvec::{smallvec, SmallVec};

use super::ast::PredicateNode;
use crate::dissect::DissectionTree;
use crate::field::FieldValue;

/// Collection of operand values for one side of a relation. Most fields
/// occur once per packet, so four inline slots cover the common case.
pub(crate) type ValueVec<'a> = SmallVec<[&'a FieldValue; 4]>;

/// Collect a relation operand's values.
///
/// A field reference yields every instance of the field within its search
/// scope, in document order: the first subtree of the owning protocol, or
/// of the field itself when it denotes a protocol. A missing protocol or
/// field yields an empty collection; the enclosing relation then simply
/// cannot match. A literal yields its single decoded value.
pub(crate) fn extract<'a>(
    node: &'a PredicateNode,
    dissection: &'a DissectionTree,
) -> ValueVec<'a> {
    match node {
        PredicateNode::FieldRef { field, scope, .. } => {
            let mut values = ValueVec::new();
            if let Some(protocol) = scope {
                if let Some(root) = dissection.find_protocol(*protocol) {
                    dissection.collect_values(root, *field, &mut values);
                }
            }
            values
        }
        PredicateNode::Literal(value) => smallvec![value],
        _ => unreachable!("relation operands are field references or literals"),
    }
}
