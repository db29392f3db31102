//! # The Graph-Flattening Engine
//!
//! This module is a miniature linker. It takes a cross-referencing object
//! graph — entities that point at each other and own variable-size trailing
//! data — and flattens it into one contiguous relocatable byte blob in which
//! every reference has become a 32-bit offset from the start of the data
//! region. Firmware with no pointer support loads the blob into memory and
//! dereferences offsets directly, with no parsing step.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌─────────────┐     ┌───────┐
//! │ entity graph │ ──► │   Package    │ ──► │  resolve()  │ ──► │ bytes │
//! │ (authoring)  │     │ (allocator)  │     │ (refs→offs) │     │       │
//! └──────────────┘     └──────────────┘     └─────────────┘     └───────┘
//! ```
//!
//! - [`Packable`] is the contract every flattenable node implements.
//! - [`Package`] owns append order, the identity → offset table, and the
//!   interned blob pool; [`Package::pack`] produces the final bytes.
//! - [`Ref`] and [`EntityId`] replace pointers with stable opaque handles.
//! - [`TextBlob`], [`ByteArray`], [`WordArray`] and [`RefArray`] are the
//!   reusable leaf entities used for trailing data.
//!
//! ## Guarantees
//!
//! - Every entity lands at an offset aligned to its declared alignment.
//! - Variable-size children of uniform arrays are laid out after the whole
//!   array, keeping the array itself indexable by stride.
//! - Building the same graph twice produces byte-identical output.
//! - A dangling reference is an error, not a silent zero: every missing
//!   reference in a build is collected and raised as one aggregate failure.

mod arrays;
mod entity;
mod package;

pub use arrays::{ByteArray, RefArray, TextBlob, WordArray};
pub use entity::{EntityId, Packable, Ref};
pub use package::{LayoutEntry, OffsetTable, Package, WATERMARK};
