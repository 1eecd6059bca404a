//! Type-specific relational comparators.
//!
//! Every comparator implements existential matching over two value
//! collections: the relation holds if any pairing of one value from each
//! side satisfies the operator. The double iteration is quadratic, which is
//! acceptable because a field rarely occurs more than a handful of times in
//! one packet.
//!
//! Operator/type combinations outside what the compiler front end admits
//! are unreachable here; hitting one means a malformed tree escaped the
//! compiler, which is a fatal bug rather than a user error.

use super::ast::CompareOp;
use crate::field::FieldValue;

/// Effective byte-comparison bounds for one relation: the minimum of the
/// two operands' declared offsets and lengths, computed once per relation
/// and passed explicitly so compiled trees carry no evaluation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ByteSpan {
    pub offset: usize,
    pub length: usize,
}

impl ByteSpan {
    /// Narrow this span to the bounds of another operand.
    pub(crate) fn narrow(self, other: ByteSpan) -> ByteSpan {
        ByteSpan {
            offset: self.offset.min(other.offset),
            length: self.length.min(other.length),
        }
    }

    /// The addressed window of a stored byte value, clamped to what the
    /// value actually holds.
    fn window(self, bytes: &[u8]) -> &[u8] {
        let start = self.offset.min(bytes.len());
        let end = self.offset.saturating_add(self.length).min(bytes.len());
        &bytes[start..end]
    }
}

pub(crate) fn compare_u32(op: CompareOp, a: &[&FieldValue], b: &[&FieldValue]) -> bool {
    for &va in a {
        let x = as_u32(va);
        for &vb in b {
            let y = as_u32(vb);
            let holds = match op {
                CompareOp::Eq => x == y,
                CompareOp::NotEq => x != y,
                CompareOp::Gt => x > y,
                CompareOp::GtEq => x >= y,
                CompareOp::Lt => x < y,
                CompareOp::LtEq => x <= y,
            };
            if holds {
                return true;
            }
        }
    }
    false
}

pub(crate) fn compare_bool(op: CompareOp, a: &[&FieldValue], b: &[&FieldValue]) -> bool {
    for &va in a {
        let x = as_bool(va);
        for &vb in b {
            let y = as_bool(vb);
            let holds = match op {
                CompareOp::Eq => x == y,
                CompareOp::NotEq => x != y,
                _ => unreachable!("booleans admit equality operators only"),
            };
            if holds {
                return true;
            }
        }
    }
    false
}

pub(crate) fn compare_mac(op: CompareOp, a: &[&FieldValue], b: &[&FieldValue]) -> bool {
    for &va in a {
        let x = as_mac(va);
        for &vb in b {
            let y = as_mac(vb);
            let holds = match op {
                CompareOp::Eq => x == y,
                CompareOp::NotEq => x != y,
                _ => unreachable!("MAC addresses admit equality operators only"),
            };
            if holds {
                return true;
            }
        }
    }
    false
}

/// Byte strings compare lexicographically over the addressed window of each
/// side's stored bytes.
pub(crate) fn compare_bytes(
    op: CompareOp,
    a: &[&FieldValue],
    b: &[&FieldValue],
    span: ByteSpan,
) -> bool {
    for &va in a {
        let x = span.window(as_bytes(va));
        for &vb in b {
            let y = span.window(as_bytes(vb));
            let holds = match op {
                CompareOp::Eq => x == y,
                CompareOp::NotEq => x != y,
                CompareOp::Gt => x > y,
                CompareOp::Lt => x < y,
                _ => unreachable!("byte strings admit ==, !=, > and < only"),
            };
            if holds {
                return true;
            }
        }
    }
    false
}

pub(crate) fn compare_time(op: CompareOp, a: &[&FieldValue], b: &[&FieldValue]) -> bool {
    for &va in a {
        let x = as_time(va);
        for &vb in b {
            let y = as_time(vb);
            let holds = match op {
                CompareOp::Eq => x == y,
                CompareOp::NotEq => x != y,
                _ => unreachable!("timestamps admit equality operators only"),
            };
            if holds {
                return true;
            }
        }
    }
    false
}

pub(crate) fn compare_text(op: CompareOp, a: &[&FieldValue], b: &[&FieldValue]) -> bool {
    for &va in a {
        let x = as_str(va);
        for &vb in b {
            let y = as_str(vb);
            let holds = match op {
                CompareOp::Eq => x == y,
                CompareOp::NotEq => x != y,
                _ => unreachable!("strings admit equality operators only"),
            };
            if holds {
                return true;
            }
        }
    }
    false
}

fn as_u32(value: &FieldValue) -> u32 {
    match value {
        FieldValue::Numeric(n) => *n,
        FieldValue::Ipv4Addr(addr) => u32::from(*addr),
        FieldValue::IpxNet(net) => *net,
        other => unreachable!("non-numeric value {other:?} in numeric relation"),
    }
}

fn as_bool(value: &FieldValue) -> bool {
    match value {
        FieldValue::Boolean(b) => *b,
        other => unreachable!("non-boolean value {other:?} in boolean relation"),
    }
}

fn as_mac(value: &FieldValue) -> &[u8; 6] {
    match value {
        FieldValue::MacAddr(mac) => mac,
        other => unreachable!("non-MAC value {other:?} in MAC relation"),
    }
}

fn as_bytes(value: &FieldValue) -> &[u8] {
    match value {
        FieldValue::Bytes(bytes) => bytes,
        other => unreachable!("non-bytes value {other:?} in bytes relation"),
    }
}

fn as_time(value: &FieldValue) -> i64 {
    match value {
        FieldValue::AbsTime(nanos) => *nanos,
        other => unreachable!("non-time value {other:?} in time relation"),
    }
}

fn as_str(value: &FieldValue) -> &str {
    match value {
        FieldValue::Str(s) => s,
        other => unreachable!("non-string value {other:?} in string relation"),
    }
}
