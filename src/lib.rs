//! displayfilter - compile display-filter expressions and evaluate them
//! against dissected packets.
//!
//! A filter like `ip.ttl > 32 and tcp` is compiled once into an immutable
//! predicate tree, then applied to any number of packet dissections. Field
//! names resolve through a registry the embedding application populates at
//! startup; dissectors (not part of this crate) produce the per-packet
//! dissection trees the evaluator walks.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use displayfilter::{
//!     DissectionTree, FieldRegistry, FieldType, FieldValue, FilterCompiler,
//! };
//!
//! let mut registry = FieldRegistry::new();
//! let ip = registry.register_protocol("Internet Protocol", "ip");
//! let ttl = registry.register_field("Time to live", "ip.ttl", FieldType::Numeric, ip);
//!
//! let compiler = FilterCompiler::new(Arc::new(registry));
//! let filter = compiler.compile("ip.ttl > 32").unwrap();
//!
//! let mut packet = DissectionTree::new();
//! let ip_node = packet.push_protocol(ip);
//! packet.push_field(ip_node, ttl, FieldValue::Numeric(64));
//!
//! assert!(filter.matches(&packet));
//! ```

pub mod dissect;
pub mod error;
pub mod field;
pub mod filter;

pub use dissect::{DissectionTree, FieldInstance, NodeId};
pub use error::{CompileError, Result};
pub use field::{FieldDescriptor, FieldId, FieldRegistry, FieldType, FieldValue, SymbolTable};
pub use filter::{evaluate, ByteRange, CompareOp, FilterCompiler, LogicalOp, PredicateNode, PredicateTree};
