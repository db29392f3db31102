//! # Generic Leaf Entities
//!
//! Small reusable entities with no children of their own: interned text and
//! binary payloads, plain value arrays, and arrays of references. Domain
//! records use these for their variable-size trailing data — a device
//! state's densified option values, an option's change-action offsets, a
//! touch button's label text, an image's palette and pixels.

use super::entity::{EntityId, Packable, Ref};
use super::package::OffsetTable;

/// A variable-length byte payload interned into the blob pool.
///
/// Created from a label string (NUL-terminated, the way firmware expects C
/// strings) or from pre-serialised bytes such as bitmap pixel data.
/// Alignment defaults to 1; payloads the firmware dereferences as wider
/// types (a `u16` palette) declare theirs with [`TextBlob::aligned`].
#[derive(Debug)]
pub struct TextBlob {
    id: EntityId,
    label: String,
    bytes: Vec<u8>,
    align: u32,
}

impl TextBlob {
    /// Intern a label string. A trailing NUL is appended.
    pub fn text(s: &str) -> Self {
        let mut bytes = s.as_bytes().to_vec();
        bytes.push(0);
        TextBlob {
            id: EntityId::fresh(),
            label: s.to_string(),
            bytes,
            align: 1,
        }
    }

    /// Intern pre-serialised binary data (e.g. pixel or palette bytes).
    pub fn from_bytes(label: &str, bytes: Vec<u8>) -> Self {
        TextBlob {
            id: EntityId::fresh(),
            label: label.to_string(),
            bytes,
            align: 1,
        }
    }

    /// Require the blob to land at a multiple of `alignment` bytes.
    pub fn aligned(mut self, alignment: u32) -> Self {
        self.align = alignment;
        self
    }
}

impl Packable for TextBlob {
    fn id(&self) -> EntityId {
        self.id
    }

    fn describe(&self) -> String {
        format!("blob '{}'", self.label)
    }

    fn alignment(&self) -> u32 {
        self.align
    }

    fn size(&self) -> u32 {
        self.bytes.len() as u32
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.bytes);
    }
}

/// A contiguous array of `u8` values in the main region.
#[derive(Debug)]
pub struct ByteArray {
    id: EntityId,
    label: String,
    values: Vec<u8>,
}

impl ByteArray {
    pub fn new(label: &str, values: Vec<u8>) -> Self {
        ByteArray {
            id: EntityId::fresh(),
            label: label.to_string(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Packable for ByteArray {
    fn id(&self) -> EntityId {
        self.id
    }

    fn describe(&self) -> String {
        format!("byte array '{}'", self.label)
    }

    fn size(&self) -> u32 {
        self.values.len() as u32
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.values);
    }
}

/// A contiguous array of little-endian `u32` values in the main region.
#[derive(Debug)]
pub struct WordArray {
    id: EntityId,
    label: String,
    values: Vec<u32>,
}

impl WordArray {
    pub fn new(label: &str, values: Vec<u32>) -> Self {
        WordArray {
            id: EntityId::fresh(),
            label: label.to_string(),
            values,
        }
    }
}

impl Packable for WordArray {
    fn id(&self) -> EntityId {
        self.id
    }

    fn describe(&self) -> String {
        format!("word array '{}'", self.label)
    }

    fn size(&self) -> u32 {
        4 * self.values.len() as u32
    }

    fn encode(&self, out: &mut Vec<u8>) {
        for value in &self.values {
            out.extend_from_slice(&value.to_le_bytes());
        }
    }
}

/// An array of references, each resolved to a `u32` offset.
///
/// Device options use this for their change-action lists: the option record
/// itself stays fixed-size and points at one of these as trailing data.
#[derive(Debug)]
pub struct RefArray {
    id: EntityId,
    label: String,
    slots: Vec<Ref>,
}

impl RefArray {
    pub fn new(label: &str, targets: Vec<EntityId>) -> Self {
        RefArray {
            id: EntityId::fresh(),
            label: label.to_string(),
            slots: targets.into_iter().map(Ref::to).collect(),
        }
    }
}

impl Packable for RefArray {
    fn id(&self) -> EntityId {
        self.id
    }

    fn describe(&self) -> String {
        format!("reference array '{}'", self.label)
    }

    fn size(&self) -> u32 {
        4 * self.slots.len() as u32
    }

    fn resolve(&mut self, table: &mut OffsetTable) {
        let owner = self.describe();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            slot.resolve(table, &owner, &format!("entry {index}"));
        }
    }

    fn encode(&self, out: &mut Vec<u8>) {
        for slot in &self.slots {
            out.extend_from_slice(&slot.offset().to_le_bytes());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_blob_nul_terminated() {
        let blob = TextBlob::text("TV");
        assert_eq!(blob.size(), 3);
        let mut out = Vec::new();
        blob.encode(&mut out);
        assert_eq!(out, b"TV\0");
    }

    #[test]
    fn test_byte_array_size_matches_length() {
        let arr = ByteArray::new("values", vec![1, 2, 3]);
        assert_eq!(arr.size(), 3);
        assert_eq!(arr.len(), 3);
    }

    #[test]
    fn test_word_array_little_endian() {
        let arr = WordArray::new("delays", vec![0x0102_0304]);
        let mut out = Vec::new();
        arr.encode(&mut out);
        assert_eq!(out, vec![0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn test_ref_array_reports_each_missing_entry() {
        let mut arr = RefArray::new("actions", vec![EntityId::fresh(), EntityId::fresh()]);
        let mut table = OffsetTable::new();
        arr.resolve(&mut table);
        assert_eq!(table.issues().len(), 2);
    }
}
