//! Dissection trees consumed by filter evaluation.

mod tree;

pub use tree::{DissectionTree, FieldInstance, NodeId};
