// Address-ordered serialization of a document tree
//
// The byte layout comes from each leaf's address, never from document order:
// leaves are collected into an address-keyed map and written out in
// ascending address order.

use std::collections::BTreeMap;

use bytes::Bytes;
use tracing::debug;

use crate::codec::decode::decode_leaf;
use crate::codec::encode::encode_leaf;
use crate::config::{DuplicateAddressPolicy, FloatByteOrder, ModelConfig};
use crate::internal::error::{Error, Result};
use crate::tree::{DocumentTree, LeafValue, NodeId};

/// Serializes and deserializes leaf values against a byte buffer.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutCodec {
    float_order: FloatByteOrder,
    duplicates: DuplicateAddressPolicy,
}

impl LayoutCodec {
    pub fn new(float_order: FloatByteOrder, duplicates: DuplicateAddressPolicy) -> Self {
        Self {
            float_order,
            duplicates,
        }
    }

    pub fn from_config(config: &ModelConfig) -> Self {
        Self::new(config.float_byte_order, config.duplicate_addresses)
    }

    /// Encodes every leaf into a map from address to bytes. With `rw_only`,
    /// read-only leaves are left out.
    pub fn serialize_to_map(&self, tree: &DocumentTree, rw_only: bool) -> Result<BTreeMap<u32, Bytes>> {
        let mut collected = BTreeMap::new();
        self.collect(tree, tree.root(), rw_only, &mut collected)?;
        Ok(collected
            .into_iter()
            .map(|(address, (_, chunk))| (address, chunk))
            .collect())
    }

    /// Serializes the tree into a buffer spanning up to the furthest leaf end.
    /// Bytes no leaf covers stay zero.
    pub fn serialize(&self, tree: &DocumentTree, rw_only: bool) -> Result<Bytes> {
        let chunks = self.serialize_to_map(tree, rw_only)?;
        let len = chunks
            .iter()
            .map(|(address, chunk)| *address as usize + chunk.len())
            .max()
            .unwrap_or(0);

        let mut buffer = vec![0u8; len];
        for (address, chunk) in &chunks {
            let start = *address as usize;
            buffer[start..start + chunk.len()].copy_from_slice(chunk);
        }
        debug!(leaves = chunks.len(), bytes = buffer.len(), rw_only, "serialized tree");
        Ok(Bytes::from(buffer))
    }

    /// Decodes every leaf from `buffer` and stores the values in place.
    /// Nothing is written unless every leaf decodes.
    pub fn deserialize(&self, tree: &mut DocumentTree, buffer: &[u8]) -> Result<()> {
        let mut decoded: Vec<(NodeId, LeafValue)> = Vec::new();
        for id in tree.leaves() {
            let Some(layout) = tree.node(id).and_then(|n| n.layout()) else {
                continue;
            };
            let start = layout.address as usize;
            let end = layout.end();
            if end > buffer.len() {
                return Err(Error::BufferTooShort {
                    key: tree.path_of(id),
                    start,
                    end,
                    len: buffer.len(),
                });
            }
            let value = decode_leaf(&tree.path_of(id), &buffer[start..end], layout, self.float_order)?;
            decoded.push((id, value));
        }

        debug!(leaves = decoded.len(), bytes = buffer.len(), "deserialized buffer");
        for (id, value) in decoded {
            tree.set_value(id, value);
        }
        Ok(())
    }

    fn collect(
        &self,
        tree: &DocumentTree,
        node: NodeId,
        rw_only: bool,
        out: &mut BTreeMap<u32, (NodeId, Bytes)>,
    ) -> Result<()> {
        for &child in tree.children(node) {
            let Some(child_node) = tree.node(child) else {
                continue;
            };
            match child_node.layout() {
                Some(layout) => {
                    if rw_only && !layout.edit_mode.is_writable() {
                        continue;
                    }
                    let key = tree.path_of(child);
                    let value = child_node.value().cloned().unwrap_or(LeafValue::Null);
                    let chunk = encode_leaf(&key, &value, layout, self.float_order)?;
                    debug!(address = layout.address, bytes = %hex::encode(&chunk), key = %key, "encoded leaf");

                    if let Some((previous, _)) = out.insert(layout.address, (child, chunk)) {
                        if self.duplicates == DuplicateAddressPolicy::Reject {
                            return Err(Error::DuplicateAddress {
                                address: layout.address,
                                first: tree.path_of(previous),
                                second: key,
                            });
                        }
                    }
                }
                None if child_node.is_container() => self.collect(tree, child, rw_only, out)?,
                // Scalars without layout have no place in the buffer
                None => {}
            }
        }
        Ok(())
    }
}
