//! Field registry: identifiers and descriptors for protocols and fields.

use std::fmt;

use compact_str::CompactString;

use super::FieldType;

/// Opaque handle naming a registered protocol or header field.
///
/// Stable for the lifetime of the registry that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId(u32);

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Everything the engine knows about one registered field.
///
/// Immutable after registration.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// Human-readable name (e.g. "Time to live").
    pub name: CompactString,
    /// Filter abbreviation (e.g. "ip.ttl"); empty means not filterable.
    pub abbrev: CompactString,
    /// Declared value type.
    pub ftype: FieldType,
    /// Protocol this field belongs to; protocols themselves have none.
    pub parent: Option<FieldId>,
    /// Whether this entry denotes a protocol rather than a header field.
    pub is_protocol: bool,
}

/// Registry of all protocols and header fields known to the engine.
///
/// Populated once at startup by the embedding application and treated as
/// immutable for the rest of the process; the symbol table and compiler
/// borrow or share it read-only.
#[derive(Debug, Default)]
pub struct FieldRegistry {
    fields: Vec<FieldDescriptor>,
}

impl FieldRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Register a protocol. Protocols are valueless; filters can only test
    /// their presence.
    pub fn register_protocol(&mut self, name: &str, abbrev: &str) -> FieldId {
        self.push(FieldDescriptor {
            name: CompactString::new(name),
            abbrev: CompactString::new(abbrev),
            ftype: FieldType::None,
            parent: None,
            is_protocol: true,
        })
    }

    /// Register a header field under its owning protocol.
    pub fn register_field(
        &mut self,
        name: &str,
        abbrev: &str,
        ftype: FieldType,
        parent: FieldId,
    ) -> FieldId {
        self.push(FieldDescriptor {
            name: CompactString::new(name),
            abbrev: CompactString::new(abbrev),
            ftype,
            parent: Some(parent),
            is_protocol: false,
        })
    }

    fn push(&mut self, descriptor: FieldDescriptor) -> FieldId {
        let id = FieldId(self.fields.len() as u32);
        self.fields.push(descriptor);
        id
    }

    /// Number of registered entries (protocols and fields).
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Descriptor for a registered identifier.
    pub fn descriptor(&self, id: FieldId) -> &FieldDescriptor {
        &self.fields[id.0 as usize]
    }

    /// Filter abbreviation for an identifier; `None` when the field was
    /// registered without one.
    pub fn abbreviation(&self, id: FieldId) -> Option<&str> {
        let abbrev = self.descriptor(id).abbrev.as_str();
        if abbrev.is_empty() {
            None
        } else {
            Some(abbrev)
        }
    }

    /// Whether the identifier denotes a protocol.
    pub fn is_protocol(&self, id: FieldId) -> bool {
        self.descriptor(id).is_protocol
    }

    /// All registered identifiers in registration order.
    pub fn ids(&self) -> impl Iterator<Item = FieldId> + '_ {
        (0..self.fields.len()).map(|i| FieldId(i as u32))
    }
}
