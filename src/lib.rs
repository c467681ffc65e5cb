//! # Cairn - Disk-Backed B+Tree Index
//!
//! Cairn is an embedded B+tree index mapping `i32` keys to record locators
//! (`RecordId`), persisted in a single file of fixed-size 1024-byte pages so
//! that the index survives process restarts. It is the index component of a
//! small relational engine: the host program stores its tuples elsewhere and
//! registers each tuple's location here under its key.
//!
//! ## Quick Start
//!
//! ```ignore
//! use cairn::{BTreeIndex, LocateResult, OpenMode, RecordId};
//!
//! let mut index = BTreeIndex::open("users.idx", OpenMode::Write)?;
//! index.insert(42, RecordId { pid: 6, sid: 7 })?;
//!
//! let mut cursor = match index.locate(42)? {
//!     LocateResult::Found(c) => c,
//!     LocateResult::NotFound(c) => c,
//! };
//! let (key, rid) = index.read_forward(&mut cursor)?;
//! index.close()?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │      Index Engine (BTreeIndex)      │   open/close, insert, locate,
//! ├─────────────────────────────────────┤   read_forward
//! │   Leaf / Interior / Meta nodes      │   one node == one page
//! ├─────────────────────────────────────┤
//! │       Paged Store (PageFile)        │   1024-byte page read/write,
//! └─────────────────────────────────────┘   append cursor (end_pid)
//! ```
//!
//! ## File Layout
//!
//! The index file is a flat sequence of 1024-byte pages:
//!
//! ```text
//! Page 0     Tree metadata: root page id, height, init state
//! Page 1..N  Leaf and interior nodes (no per-page type tag; the tree's
//!            structure dictates which node type occupies which page)
//! ```
//!
//! Multi-byte fields are host-endian; the file is not portable across
//! differing-endian machines.
//!
//! ## Limits
//!
//! - Keys are unique `i32`s; duplicate insertion is not detected and its
//!   behavior is undefined.
//! - No deletion, no concurrent access, no crash-atomic multi-page writes.
//! - Leaves hold up to 84 entries, interior nodes up to 127 separators.
//!
//! ## Module Overview
//!
//! - [`btree`]: node layout, tree metadata, and the index engine
//! - [`storage`]: the paged file underneath
//! - [`error`]: the crate error type
//! - [`types`]: page id and record locator value types

pub mod btree;
pub mod error;
pub mod storage;
pub mod types;

pub use btree::{BTreeIndex, IndexCursor, LocateResult};
pub use error::{Error, Result};
pub use storage::{OpenMode, PageFile, PAGE_SIZE};
pub use types::{PageId, RecordId};
