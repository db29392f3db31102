//! # The Packable Entity Contract
//!
//! Everything that ends up inside a packed blob implements [`Packable`]:
//! a stable identity, a byte size, an alignment requirement, and a byte
//! encoding that is only valid once every reference has been resolved to an
//! offset.
//!
//! ## Identity
//!
//! [`EntityId`] is an opaque handle drawn from a process-wide monotonic
//! counter at construction time. It is never reused, so the offset table can
//! key off it safely — two live entities can never alias, even if one is
//! dropped and another allocated at the same address.
//!
//! ## References
//!
//! [`Ref`] is the pointer substitute: it holds the target's `EntityId` and,
//! after resolution, the target's byte offset from the start of the data
//! region. A null `Ref` resolves to offset 0, which firmware treats as "no
//! reference". A `Ref` whose target was never appended is an error — each
//! miss is recorded in the [`OffsetTable`] and reported in one aggregate
//! failure at pack time, never silently written as 0.

use std::sync::atomic::{AtomicU64, Ordering};

use super::package::{OffsetTable, Package};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque, stable identity for a packable entity.
///
/// Assigned once at construction from a monotonic counter and never reused
/// during the life of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u64);

impl EntityId {
    /// Allocate a fresh identity.
    pub fn fresh() -> Self {
        EntityId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A typed pointer substitute, resolved to a byte offset during packing.
///
/// Offset 0 is reserved for the null reference.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ref {
    target: Option<EntityId>,
    offset: u32,
}

impl Ref {
    /// The null reference. Always resolves to offset 0.
    pub fn null() -> Self {
        Ref::default()
    }

    /// A reference to the entity with the given identity.
    pub fn to(id: EntityId) -> Self {
        Ref {
            target: Some(id),
            offset: 0,
        }
    }

    pub fn is_null(&self) -> bool {
        self.target.is_none()
    }

    /// The resolved offset. Only meaningful after [`Ref::resolve`].
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Look the target up in the offset table.
    ///
    /// A missing target records an issue against `owner` (the referencing
    /// entity's description) and leaves this reference unresolved; it does
    /// not abort, so every dangling reference in a build gets reported.
    pub fn resolve(&mut self, table: &mut OffsetTable, owner: &str, what: &str) {
        match self.target {
            None => self.offset = 0,
            Some(id) => match table.lookup(id) {
                Some(offset) => self.offset = offset,
                None => table.report_missing(owner, what),
            },
        }
    }
}

/// Contract implemented by every entity placed into the blob.
///
/// The build protocol is two-tier: when an entity is appended, its
/// [`enqueue_children`](Packable::enqueue_children) hook appends same-size
/// children (so sibling arrays stay uniformly strided), and then its
/// [`enqueue_trailing`](Packable::enqueue_trailing) hook appends each
/// child's variable-size trailing data. Both hooks run synchronously inside
/// [`Package::append`](super::Package::append), before it returns.
pub trait Packable {
    /// Stable identity, used as the offset table key.
    fn id(&self) -> EntityId;

    /// Human-readable description, used in layout traces and error reports.
    fn describe(&self) -> String;

    /// Required alignment in bytes. 1 or a power of two.
    fn alignment(&self) -> u32 {
        4
    }

    /// Exact number of bytes this entity contributes to the main region,
    /// independent of any trailing children it enqueues.
    fn size(&self) -> u32;

    /// Append this entity's same-size children.
    fn enqueue_children(&mut self, package: &mut Package) {
        let _ = package;
    }

    /// Append the variable-size trailing data owned by this entity's
    /// children, after all of them have been laid out.
    fn enqueue_trailing(&mut self, package: &mut Package) {
        let _ = package;
    }

    /// Resolve every held reference via the table. Must attempt all of them
    /// even if some are missing, so each failure is diagnosed individually.
    fn resolve(&mut self, table: &mut OffsetTable) {
        let _ = table;
    }

    /// Write the final byte representation. Only valid after `resolve`.
    fn encode(&self, out: &mut Vec<u8>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_ids_are_unique_and_monotonic() {
        let a = EntityId::fresh();
        let b = EntityId::fresh();
        let c = EntityId::fresh();
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn test_null_ref_resolves_to_zero() {
        let mut table = OffsetTable::new();
        let mut r = Ref::null();
        r.resolve(&mut table, "test", "target");
        assert_eq!(r.offset(), 0);
        assert!(table.issues().is_empty());
    }

    #[test]
    fn test_dangling_ref_records_issue() {
        let mut table = OffsetTable::new();
        let mut r = Ref::to(EntityId::fresh());
        r.resolve(&mut table, "Widget 'x'", "event");
        assert_eq!(table.issues().len(), 1);
        assert!(table.issues()[0].contains("Widget 'x'"));
        assert!(table.issues()[0].contains("event"));
    }
}
