//! Dissection tree: the structured result of decoding one packet.

use smallvec::SmallVec;

use crate::field::{FieldId, FieldValue};

/// Index of a node within its `DissectionTree`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// One field instance in a dissection.
///
/// The same field identifier may occur more than once in a packet (e.g. a
/// repeated option), which is why lookups collect instances rather than
/// returning a single value.
#[derive(Debug, Clone)]
pub struct FieldInstance {
    /// Identifier of the field this instance decodes.
    pub field: FieldId,
    /// Decoded value, of the field's declared type.
    pub value: FieldValue,
    children: Vec<NodeId>,
}

impl FieldInstance {
    /// Child nodes in document order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Tree of field instances produced by dissecting one packet.
///
/// Dissectors (or test fixtures) build the tree top-down with
/// [`push_protocol`](Self::push_protocol) and
/// [`push_field`](Self::push_field); filter evaluation consumes it
/// read-only. Nodes are stored in one flat arena indexed by [`NodeId`], so
/// document order is the order of insertion within each subtree.
#[derive(Debug, Clone, Default)]
pub struct DissectionTree {
    nodes: Vec<FieldInstance>,
    roots: Vec<NodeId>,
}

impl DissectionTree {
    /// Create an empty dissection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a top-level protocol node. Protocol instances are valueless.
    pub fn push_protocol(&mut self, protocol: FieldId) -> NodeId {
        let id = self.alloc(protocol, FieldValue::Null);
        self.roots.push(id);
        id
    }

    /// Append a field instance under `parent`. The returned id can itself
    /// be used as a parent to model nested sub-structures.
    pub fn push_field(&mut self, parent: NodeId, field: FieldId, value: FieldValue) -> NodeId {
        let id = self.alloc(field, value);
        self.nodes[parent.0].children.push(id);
        id
    }

    fn alloc(&mut self, field: FieldId, value: FieldValue) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(FieldInstance {
            field,
            value,
            children: Vec::new(),
        });
        id
    }

    /// Access a node by id.
    pub fn node(&self, id: NodeId) -> &FieldInstance {
        &self.nodes[id.0]
    }

    /// Top-level nodes in document order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Whether the dissection contains any nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// First subtree in document order rooted at an instance of `protocol`.
    pub fn find_protocol(&self, protocol: FieldId) -> Option<NodeId> {
        for &root in &self.roots {
            if let Some(found) = self.find_in_subtree(root, protocol) {
                return Some(found);
            }
        }
        None
    }

    fn find_in_subtree(&self, id: NodeId, field: FieldId) -> Option<NodeId> {
        let node = &self.nodes[id.0];
        if node.field == field {
            return Some(id);
        }
        for &child in &node.children {
            if let Some(found) = self.find_in_subtree(child, field) {
                return Some(found);
            }
        }
        None
    }

    /// Collect references to the values of every instance of `field` within
    /// the subtree at `root` (the root itself included), in document order.
    pub fn collect_values<'a>(
        &'a self,
        root: NodeId,
        field: FieldId,
        out: &mut SmallVec<[&'a FieldValue; 4]>,
    ) {
        let node = &self.nodes[root.0];
        if node.field == field {
            out.push(&node.value);
        }
        for &child in &node.children {
            self.collect_values(child, field, out);
        }
    }

    /// Whether any instance of `field` occurs within the subtree at `root`
    /// (the root itself included).
    pub fn contains(&self, root: NodeId, field: FieldId) -> bool {
        self.find_in_subtree(root, field).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldRegistry, FieldType};

    fn ids() -> (FieldRegistry, FieldId, FieldId, FieldId, FieldId) {
        let mut registry = FieldRegistry::new();
        let ip = registry.register_protocol("Internet Protocol", "ip");
        let ttl = registry.register_field("Time to live", "ip.ttl", FieldType::Numeric, ip);
        let bootp = registry.register_protocol("Bootstrap Protocol", "bootp");
        let option = registry.register_field("Option", "bootp.option", FieldType::Numeric, bootp);
        (registry, ip, ttl, bootp, option)
    }

    #[test]
    fn test_find_protocol_first_occurrence() {
        let (_, ip, ttl, bootp, _) = ids();

        let mut tree = DissectionTree::new();
        let first_ip = tree.push_protocol(ip);
        tree.push_field(first_ip, ttl, FieldValue::Numeric(64));
        let second_ip = tree.push_protocol(ip);
        tree.push_field(second_ip, ttl, FieldValue::Numeric(32));

        assert_eq!(tree.find_protocol(ip), Some(first_ip));
        assert_eq!(tree.find_protocol(bootp), None);
    }

    #[test]
    fn test_collect_values_in_document_order() {
        let (_, _, _, bootp, option) = ids();

        let mut tree = DissectionTree::new();
        let proto = tree.push_protocol(bootp);
        tree.push_field(proto, option, FieldValue::Numeric(1));
        // Nested sub-structure holding a repeated occurrence
        let group = tree.push_field(proto, option, FieldValue::Numeric(5));
        tree.push_field(group, option, FieldValue::Numeric(9));

        let mut values = SmallVec::new();
        tree.collect_values(proto, option, &mut values);

        let collected: Vec<u32> = values
            .iter()
            .map(|v| match v {
                FieldValue::Numeric(n) => *n,
                other => panic!("unexpected value {other:?}"),
            })
            .collect();
        assert_eq!(collected, vec![1, 5, 9]);
    }

    #[test]
    fn test_collect_outside_subtree_is_empty() {
        let (_, ip, ttl, bootp, option) = ids();

        let mut tree = DissectionTree::new();
        let ip_node = tree.push_protocol(ip);
        tree.push_field(ip_node, ttl, FieldValue::Numeric(64));
        let bootp_node = tree.push_protocol(bootp);
        tree.push_field(bootp_node, option, FieldValue::Numeric(1));

        let mut values = SmallVec::new();
        tree.collect_values(ip_node, option, &mut values);
        assert!(values.is_empty());
    }

    #[test]
    fn test_contains() {
        let (_, ip, ttl, _, option) = ids();

        let mut tree = DissectionTree::new();
        let ip_node = tree.push_protocol(ip);
        tree.push_field(ip_node, ttl, FieldValue::Numeric(64));

        assert!(tree.contains(ip_node, ttl));
        assert!(tree.contains(ip_node, ip));
        assert!(!tree.contains(ip_node, option));
    }
}
