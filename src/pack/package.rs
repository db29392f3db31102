//! # The Allocator and Reference Table
//!
//! [`Package`] is the heart of the engine: a bump allocator that assigns
//! byte offsets as entities are appended, an identity → offset table, and
//! the final linearisation into padded, aligned bytes.
//!
//! ## Build protocol
//!
//! ```text
//! ┌──────────────┐     ┌─────────────┐     ┌──────────────┐     ┌────────┐
//! │ append roots │ ──► │ enqueue_*   │ ──► │ resolve refs │ ──► │ emit   │
//! │ (graph walk) │     │ (recursive) │     │ (aggregate)  │     │ bytes  │
//! └──────────────┘     └─────────────┘     └──────────────┘     └────────┘
//! ```
//!
//! [`Package::append`] pads the cursor to the entity's alignment, records
//! its offset, then immediately runs the entity's two enqueue hooks — so a
//! single `append` of the root expands the whole reachable graph before it
//! returns. Append order determines byte layout; two builds of an identical
//! graph are byte-identical.
//!
//! ## Two regions
//!
//! Fixed-size records live in the main region. Variable-length payloads
//! (label text, bitmap palettes and pixels) are interned via
//! [`Package::append_text`] into a blob pool that is placed after the main
//! region at pack time. The pool starts at the main region padded to a word
//! boundary and each blob's declared alignment is honored within it, so a
//! `u16` palette never lands at an odd offset even after odd-length labels.
//!
//! ## Failure
//!
//! [`Package::pack`] refuses to emit anything if any reference failed to
//! resolve: it returns one [`PackError::Unresolved`] listing every missing
//! reference found in the build. A partial or corrupt blob is never
//! returned.

use std::collections::HashMap;

use super::arrays::TextBlob;
use super::entity::{EntityId, Packable};
use crate::error::PackError;

/// Magic value at the start of every packed blob. Firmware checks it before
/// trusting the data that follows.
pub const WATERMARK: u32 = 0xBABA_BEBE;

/// Identity → offset map plus the structured issue list built up during
/// resolution.
///
/// Offsets are byte positions within the data region, which starts
/// immediately after the 4-byte watermark. The first appended entity sits
/// at offset 0; firmware dereferences `base + sizeof(header) + offset`.
#[derive(Debug, Default)]
pub struct OffsetTable {
    offsets: HashMap<EntityId, u32>,
    issues: Vec<String>,
}

impl OffsetTable {
    pub fn new() -> Self {
        OffsetTable::default()
    }

    /// Record an entity's offset. Appending the same identity twice is a
    /// graph bug; it is recorded as an issue and surfaces in the aggregate
    /// pack error rather than silently relocating the entity.
    fn record(&mut self, id: EntityId, offset: u32, description: &str) {
        if self.offsets.insert(id, offset).is_some() {
            self.issues
                .push(format!("{description} appended more than once"));
        }
    }

    pub fn lookup(&self, id: EntityId) -> Option<u32> {
        self.offsets.get(&id).copied()
    }

    /// Count a dangling reference. Resolution continues so that every
    /// missing reference in the build is reported together.
    pub fn report_missing(&mut self, owner: &str, what: &str) {
        self.issues
            .push(format!("{owner} has reference to missing {what}"));
    }

    pub fn issues(&self) -> &[String] {
        &self.issues
    }

    fn shift(&mut self, id: EntityId, delta: u32) {
        if let Some(offset) = self.offsets.get_mut(&id) {
            *offset += delta;
        }
    }
}

/// One row of the layout trace: where an entity landed and how big it is.
#[derive(Debug, Clone)]
pub struct LayoutEntry {
    pub id: EntityId,
    pub description: String,
    pub offset: u32,
    pub size: u32,
}

struct Entry {
    seq: u32,
    offset: u32,
    entity: Box<dyn Packable>,
}

/// Build context for one blob: owns append order, the offset table, and the
/// interned blob pool. Write-once — [`Package::pack`] consumes it.
pub struct Package {
    entities: Vec<Entry>,
    blobs: Vec<(u32, TextBlob)>,
    table: OffsetTable,
    cursor: u32,
    blob_cursor: u32,
    next_seq: u32,
}

impl Default for Package {
    fn default() -> Self {
        Package::new()
    }
}

impl Package {
    pub fn new() -> Self {
        Package {
            entities: Vec::new(),
            blobs: Vec::new(),
            table: OffsetTable::new(),
            cursor: 0,
            blob_cursor: 0,
            next_seq: 0,
        }
    }

    /// Append an entity to the main region.
    ///
    /// Pads the cursor to the entity's alignment, records its offset,
    /// advances the cursor by its size, then runs `enqueue_children` and
    /// `enqueue_trailing` — so everything the entity owns is laid out
    /// before this call returns.
    pub fn append(&mut self, mut entity: Box<dyn Packable>) {
        self.align_to(entity.alignment());
        let offset = self.cursor;
        // Sequence taken up front: the hooks below append children, which
        // land in the entity list before their parent does.
        let seq = self.next_seq;
        self.next_seq += 1;
        self.table.record(entity.id(), offset, &entity.describe());
        self.cursor += entity.size();
        entity.enqueue_children(self);
        entity.enqueue_trailing(self);
        self.entities.push(Entry {
            seq,
            offset,
            entity,
        });
    }

    /// Intern a variable-length payload into the blob pool.
    ///
    /// The pool cursor is padded to the blob's declared alignment. Blob
    /// offsets are local until pack time, when the whole pool is shifted
    /// past the main region.
    pub fn append_text(&mut self, blob: TextBlob) {
        let align = blob.alignment();
        let misalignment = self.blob_cursor % align;
        if misalignment != 0 {
            self.blob_cursor += align - misalignment;
        }
        self.table
            .record(blob.id(), self.blob_cursor, &blob.describe());
        self.blob_cursor += blob.size();
        self.blobs.push((self.blob_cursor - blob.size(), blob));
    }

    /// Size of the main region so far, including alignment padding.
    pub fn main_size(&self) -> u32 {
        self.cursor
    }

    /// Offset where the blob pool starts: the main region padded to a
    /// word boundary, so blob alignments stay valid in the final blob.
    fn pool_base(&self) -> u32 {
        self.cursor + (4 - self.cursor % 4) % 4
    }

    /// The layout trace in append order, main region first. Blob offsets
    /// are shown shifted past the current main region size.
    pub fn layout(&self) -> Vec<LayoutEntry> {
        let mut main: Vec<(u32, LayoutEntry)> = self
            .entities
            .iter()
            .map(|e| {
                (
                    e.seq,
                    LayoutEntry {
                        id: e.entity.id(),
                        description: e.entity.describe(),
                        offset: e.offset,
                        size: e.entity.size(),
                    },
                )
            })
            .collect();
        main.sort_by_key(|(seq, _)| *seq);
        let mut entries: Vec<LayoutEntry> = main.into_iter().map(|(_, e)| e).collect();
        for (local, blob) in &self.blobs {
            entries.push(LayoutEntry {
                id: blob.id(),
                description: blob.describe(),
                offset: self.pool_base() + *local,
                size: blob.size(),
            });
        }
        entries
    }

    /// Resolve every reference and linearise the package into bytes.
    ///
    /// Emits the watermark, every entity at its recorded offset with gaps
    /// zero-filled, the blob pool, and final zero padding to a 4-byte
    /// boundary. If any reference failed to resolve, returns the aggregate
    /// error instead of a blob.
    pub fn pack(mut self) -> Result<Vec<u8>, PackError> {
        self.entities.sort_by_key(|e| e.seq);
        let pool_base = self.pool_base();
        for (_, blob) in &self.blobs {
            self.table.shift(blob.id(), pool_base);
        }

        for entry in &mut self.entities {
            entry.entity.resolve(&mut self.table);
        }
        for (_, blob) in &mut self.blobs {
            blob.resolve(&mut self.table);
        }

        if !self.table.issues.is_empty() {
            return Err(PackError::Unresolved(std::mem::take(
                &mut self.table.issues,
            )));
        }

        let total = 4 + pool_base as usize + self.blob_cursor as usize;
        let mut out = Vec::with_capacity(total + 4);
        out.extend_from_slice(&WATERMARK.to_le_bytes());

        for entry in &self.entities {
            out.resize(4 + entry.offset as usize, 0);
            entry.entity.encode(&mut out);
        }
        for (local, blob) in &self.blobs {
            out.resize(4 + (pool_base + *local) as usize, 0);
            blob.encode(&mut out);
        }

        while out.len() % 4 != 0 {
            out.push(0);
        }
        Ok(out)
    }

    fn align_to(&mut self, alignment: u32) {
        let misalignment = self.cursor % alignment;
        if misalignment != 0 {
            self.cursor += alignment - misalignment;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::entity::Ref;
    use super::*;

    /// Minimal fixed-size entity for exercising the allocator.
    struct Stub {
        id: EntityId,
        value: u32,
        link: Ref,
        align: u32,
        bytes: u32,
    }

    impl Stub {
        fn new(value: u32) -> Self {
            Stub {
                id: EntityId::fresh(),
                value,
                link: Ref::null(),
                align: 4,
                bytes: 8,
            }
        }

        fn linked(value: u32, target: EntityId) -> Self {
            let mut s = Stub::new(value);
            s.link = Ref::to(target);
            s
        }
    }

    impl Packable for Stub {
        fn id(&self) -> EntityId {
            self.id
        }

        fn describe(&self) -> String {
            format!("Stub {}", self.value)
        }

        fn alignment(&self) -> u32 {
            self.align
        }

        fn size(&self) -> u32 {
            self.bytes
        }

        fn resolve(&mut self, table: &mut OffsetTable) {
            self.link.resolve(table, &self.describe(), "link");
        }

        fn encode(&self, out: &mut Vec<u8>) {
            out.extend_from_slice(&self.value.to_le_bytes());
            out.extend_from_slice(&self.link.offset().to_le_bytes());
        }
    }

    #[test]
    fn test_watermark_first_four_bytes() {
        let mut package = Package::new();
        package.append(Box::new(Stub::new(7)));
        let blob = package.pack().unwrap();
        assert_eq!(&blob[0..4], &[0xBE, 0xBE, 0xBA, 0xBA]);
    }

    #[test]
    fn test_offsets_assigned_in_append_order() {
        let mut package = Package::new();
        package.append(Box::new(Stub::new(1)));
        package.append(Box::new(Stub::new(2)));
        let layout = package.layout();
        assert_eq!(layout[0].offset, 0);
        assert_eq!(layout[1].offset, 8);
    }

    #[test]
    fn test_alignment_padding() {
        let mut package = Package::new();
        let mut odd = Stub::new(1);
        odd.bytes = 5;
        package.append(Box::new(odd));
        let mut aligned = Stub::new(2);
        aligned.align = 8;
        package.append(Box::new(aligned));
        let layout = package.layout();
        // 5 bytes used, next entity wants 8-byte alignment
        assert_eq!(layout[1].offset, 8);
        assert_eq!(layout[1].offset % 8, 0);
    }

    #[test]
    fn test_reference_resolves_to_target_offset() {
        let mut package = Package::new();
        let target = Stub::new(1);
        let target_id = target.id();
        package.append(Box::new(target));
        package.append(Box::new(Stub::linked(2, target_id)));
        let blob = package.pack().unwrap();
        // Second stub at data offset 8, link field at bytes 8..12 of it
        assert_eq!(&blob[4 + 12..4 + 16], &0u32.to_le_bytes());
    }

    #[test]
    fn test_missing_reference_aggregates() {
        let mut package = Package::new();
        package.append(Box::new(Stub::linked(1, EntityId::fresh())));
        package.append(Box::new(Stub::linked(2, EntityId::fresh())));
        match package.pack() {
            Err(PackError::Unresolved(issues)) => assert_eq!(issues.len(), 2),
            other => panic!("expected aggregate error, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_append_is_reported() {
        let mut package = Package::new();
        let stub = Stub::new(1);
        let id = stub.id;
        package.append(Box::new(stub));
        let mut twin = Stub::new(1);
        twin.id = id;
        package.append(Box::new(twin));
        match package.pack() {
            Err(PackError::Unresolved(issues)) => {
                assert_eq!(issues.len(), 1);
                assert!(issues[0].contains("appended more than once"));
            }
            other => panic!("expected aggregate error, got {other:?}"),
        }
    }

    #[test]
    fn test_text_pool_offsets_follow_main_region() {
        let mut package = Package::new();
        let blob = TextBlob::text("hi");
        let blob_id = blob.id();
        package.append(Box::new(Stub::linked(1, blob_id)));
        package.append_text(blob);
        let bytes = package.pack().unwrap();
        let link = u32::from_le_bytes(bytes[4 + 4..4 + 8].try_into().unwrap());
        // One 8-byte stub in the main region, blob starts right after
        assert_eq!(link, 8);
        assert_eq!(&bytes[4 + 8..4 + 10], b"hi");
    }

    #[test]
    fn test_aligned_blob_padded_past_odd_label() {
        let mut package = Package::new();
        package.append(Box::new(Stub::new(1)));
        let label = TextBlob::text("Mute"); // 5 bytes with NUL
        let palette = TextBlob::from_bytes("palette", vec![0xAA; 8]).aligned(2);
        let palette_id = palette.id();
        package.append_text(label);
        package.append_text(palette);
        let layout = package.layout();
        let entry = layout.iter().find(|e| e.id == palette_id).unwrap();
        // 8-byte stub, 5-byte label, one pad byte before the palette
        assert_eq!(entry.offset, 8 + 6);
        assert_eq!(entry.offset % 2, 0);
        let blob = package.pack().unwrap();
        assert_eq!(blob[4 + 13], 0);
        assert_eq!(blob[4 + 14], 0xAA);
    }

    #[test]
    fn test_pool_base_padded_past_odd_main_region() {
        let mut package = Package::new();
        let mut odd = Stub::new(1);
        odd.bytes = 5;
        package.append(Box::new(odd));
        let blob = TextBlob::text("hi");
        let blob_id = blob.id();
        package.append_text(blob);
        let layout = package.layout();
        let entry = layout.iter().find(|e| e.id == blob_id).unwrap();
        // 5-byte main region rounds up to a word boundary
        assert_eq!(entry.offset, 8);
        let bytes = package.pack().unwrap();
        assert_eq!(&bytes[4 + 8..4 + 10], b"hi");
    }

    #[test]
    fn test_blob_padded_to_four_bytes() {
        let mut package = Package::new();
        package.append(Box::new(Stub::new(1)));
        package.append_text(TextBlob::text("abc")); // 4 bytes with NUL
        package.append_text(TextBlob::text("z")); // 2 bytes with NUL
        let blob = package.pack().unwrap();
        assert_eq!(blob.len() % 4, 0);
    }
}
