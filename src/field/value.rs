//! Field value types for dissected packets and filter literals.

use std::fmt;
use std::net::Ipv4Addr;

use compact_str::CompactString;

/// Declared type of a registered field.
///
/// The declared type drives which extractor and comparator a relation uses.
/// Full six-operator comparison exists only for `Numeric`; `Bytes` supports
/// equality and strict ordering; the remaining valued types support equality
/// only. `None` marks valueless fields (protocol nodes themselves), which
/// participate only in existence tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// Valueless field; protocols register with this type.
    None,
    /// Unsigned 32-bit integer.
    Numeric,
    /// Boolean value.
    Boolean,
    /// MAC address (6 bytes).
    MacAddr,
    /// Variable-length byte string.
    Bytes,
    /// IPv4 address.
    Ipv4Addr,
    /// IPX network number.
    IpxNet,
    /// Absolute timestamp.
    AbsTime,
    /// UTF-8 string.
    Str,
}

/// Comparison domain a field type is evaluated in.
///
/// `Numeric`, `Ipv4Addr` and `IpxNet` all compare as unsigned 32-bit values,
/// so they collapse onto one domain; which operators are admissible is still
/// decided per `FieldType` by the compiler front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CompareDomain {
    U32,
    Bool,
    Mac,
    Bytes,
    Time,
    Text,
}

impl FieldType {
    /// The comparison domain for this type, or `None` for valueless fields.
    pub(crate) fn domain(self) -> Option<CompareDomain> {
        match self {
            FieldType::None => None,
            FieldType::Numeric | FieldType::Ipv4Addr | FieldType::IpxNet => {
                Some(CompareDomain::U32)
            }
            FieldType::Boolean => Some(CompareDomain::Bool),
            FieldType::MacAddr => Some(CompareDomain::Mac),
            FieldType::Bytes => Some(CompareDomain::Bytes),
            FieldType::AbsTime => Some(CompareDomain::Time),
            FieldType::Str => Some(CompareDomain::Text),
        }
    }
}

/// A decoded field value from a dissection, or a literal from a filter.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Unsigned 32-bit integer.
    Numeric(u32),
    /// Boolean value.
    Boolean(bool),
    /// MAC address (6 bytes).
    MacAddr([u8; 6]),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// IPv4 address.
    Ipv4Addr(Ipv4Addr),
    /// IPX network number.
    IpxNet(u32),
    /// Nanoseconds since the Unix epoch.
    AbsTime(i64),
    /// Owned string; CompactString keeps short values inline.
    Str(CompactString),
    /// Value carried by a valueless (`FieldType::None`) field instance.
    Null,
}

impl FieldValue {
    /// Create a MAC address value from the first 6 bytes of a slice.
    pub fn mac(bytes: &[u8]) -> Self {
        if bytes.len() >= 6 {
            let mut mac = [0u8; 6];
            mac.copy_from_slice(&bytes[..6]);
            FieldValue::MacAddr(mac)
        } else {
            FieldValue::Null
        }
    }

    /// Create an IPv4 address value from the first 4 bytes of a slice.
    pub fn ipv4(bytes: &[u8]) -> Self {
        if bytes.len() >= 4 {
            FieldValue::Ipv4Addr(Ipv4Addr::new(bytes[0], bytes[1], bytes[2], bytes[3]))
        } else {
            FieldValue::Null
        }
    }

    /// The field type this value belongs to.
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldValue::Numeric(_) => FieldType::Numeric,
            FieldValue::Boolean(_) => FieldType::Boolean,
            FieldValue::MacAddr(_) => FieldType::MacAddr,
            FieldValue::Bytes(_) => FieldType::Bytes,
            FieldValue::Ipv4Addr(_) => FieldType::Ipv4Addr,
            FieldValue::IpxNet(_) => FieldType::IpxNet,
            FieldValue::AbsTime(_) => FieldType::AbsTime,
            FieldValue::Str(_) => FieldType::Str,
            FieldValue::Null => FieldType::None,
        }
    }

    /// Format a MAC address as a string.
    pub fn format_mac(mac: &[u8; 6]) -> String {
        format!(
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            mac[0], mac[1], mac[2], mac[3], mac[4], mac[5]
        )
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Numeric(v) => write!(f, "{v}"),
            FieldValue::Boolean(v) => write!(f, "{v}"),
            FieldValue::MacAddr(mac) => write!(f, "{}", Self::format_mac(mac)),
            FieldValue::Bytes(b) => {
                for (i, byte) in b.iter().enumerate() {
                    if i > 0 {
                        write!(f, ":")?;
                    }
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
            FieldValue::Ipv4Addr(addr) => write!(f, "{addr}"),
            FieldValue::IpxNet(net) => write!(f, "{net:#010x}"),
            FieldValue::AbsTime(nanos) => write!(f, "{nanos}ns"),
            FieldValue::Str(s) => write!(f, "{s}"),
            FieldValue::Null => write!(f, "NULL"),
        }
    }
}
