//! Predicate evaluation against one packet's dissection.
//!
//! Evaluation is a pure recursive walk: no allocation beyond the per-
//! relation value collections, no mutation of the tree, no failure paths
//! for packet content. A packet that lacks a referenced field or protocol
//! simply does not match.

use super::ast::{CompareOp, LogicalOp, PredicateNode, PredicateTree};
use super::compare::{self, ByteSpan};
use super::extract::extract;
use crate::dissect::DissectionTree;
use crate::field::{CompareDomain, FieldId, FieldValue};

/// Evaluate a compiled filter against one packet's dissection.
pub fn evaluate(tree: &PredicateTree, dissection: &DissectionTree) -> bool {
    apply_node(&tree.root, dissection)
}

fn apply_node(node: &PredicateNode, dissection: &DissectionTree) -> bool {
    match node {
        PredicateNode::Logical { op, lhs, rhs } => check_logical(*op, lhs, rhs, dissection),
        PredicateNode::Relation { op, lhs, rhs } => check_relation(*op, lhs, rhs, dissection),
        PredicateNode::FieldRef { field, scope, .. } => {
            check_existence(*field, *scope, dissection)
        }
        // A bare constant with no relation around it matches everything;
        // grammar leniency kept for compatibility.
        PredicateNode::Literal(_) => true,
    }
}

fn check_logical(
    op: LogicalOp,
    lhs: &PredicateNode,
    rhs: &Option<Box<PredicateNode>>,
    dissection: &DissectionTree,
) -> bool {
    match op {
        // && and || short-circuit: the right operand is not evaluated when
        // the left already decides.
        LogicalOp::And => apply_node(lhs, dissection) && apply_node(binary_rhs(rhs), dissection),
        LogicalOp::Or => apply_node(lhs, dissection) || apply_node(binary_rhs(rhs), dissection),
        LogicalOp::Xor => {
            let a = apply_node(lhs, dissection);
            let b = apply_node(binary_rhs(rhs), dissection);
            a ^ b
        }
        LogicalOp::Not => {
            debug_assert!(rhs.is_none(), "negation takes a single operand");
            !apply_node(lhs, dissection)
        }
    }
}

fn binary_rhs(rhs: &Option<Box<PredicateNode>>) -> &PredicateNode {
    match rhs {
        Some(node) => node,
        None => unreachable!("binary logical operator without a right operand"),
    }
}

fn check_relation(
    op: CompareOp,
    lhs: &PredicateNode,
    rhs: &PredicateNode,
    dissection: &DissectionTree,
) -> bool {
    let domain = operand_domain(lhs);
    debug_assert_eq!(domain, operand_domain(rhs), "operand domains diverge");

    let vals_a = extract(lhs, dissection);
    let vals_b = extract(rhs, dissection);

    match domain {
        CompareDomain::U32 => compare::compare_u32(op, &vals_a, &vals_b),
        CompareDomain::Bool => compare::compare_bool(op, &vals_a, &vals_b),
        CompareDomain::Mac => compare::compare_mac(op, &vals_a, &vals_b),
        CompareDomain::Bytes => {
            // Bounds are fixed by the relation's operands, not by packet
            // content, so compute them once up front.
            let span = declared_span(lhs).narrow(declared_span(rhs));
            compare::compare_bytes(op, &vals_a, &vals_b, span)
        }
        CompareDomain::Time => compare::compare_time(op, &vals_a, &vals_b),
        CompareDomain::Text => compare::compare_text(op, &vals_a, &vals_b),
    }
}

fn operand_domain(node: &PredicateNode) -> CompareDomain {
    let ftype = match node {
        PredicateNode::FieldRef { ftype, .. } => *ftype,
        PredicateNode::Literal(value) => value.field_type(),
        _ => unreachable!("relation operands are field references or literals"),
    };
    match ftype.domain() {
        Some(domain) => domain,
        None => unreachable!("valueless operand in relation"),
    }
}

fn declared_span(node: &PredicateNode) -> ByteSpan {
    match node {
        PredicateNode::FieldRef {
            range: Some(range), ..
        } => ByteSpan {
            offset: range.offset,
            length: range.length,
        },
        PredicateNode::FieldRef { .. } => ByteSpan {
            offset: 0,
            length: usize::MAX,
        },
        PredicateNode::Literal(FieldValue::Bytes(bytes)) => ByteSpan {
            offset: 0,
            length: bytes.len(),
        },
        _ => unreachable!("byte span requested for a non-bytes operand"),
    }
}

fn check_existence(
    field: FieldId,
    scope: Option<FieldId>,
    dissection: &DissectionTree,
) -> bool {
    match scope {
        Some(protocol) => dissection
            .find_protocol(protocol)
            .is_some_and(|root| dissection.contains(root, field)),
        None => false,
    }
}
