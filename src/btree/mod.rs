//! # B+Tree Index Implementation
//!
//! This module implements the index proper: the two node layouts, the
//! persisted tree metadata, and the engine that ties them together.
//!
//! ## Node Types
//!
//! - **Leaf nodes** hold the actual `(key, RecordId)` entries in sorted
//!   order, plus a forward pointer to the next leaf. Following those
//!   pointers from the leftmost leaf visits every entry in ascending key
//!   order, which is how range scans run.
//!
//! - **Interior nodes** hold separator keys and child page pointers. For an
//!   entry `(k, c)`, every key in the subtree rooted at `c` is `>= k`; keys
//!   below the first separator live under the dedicated leftmost-child
//!   pointer.
//!
//! All leaves sit at the same depth, equal to the tree height stored in the
//! metadata page (height 0 means the root is itself a leaf).
//!
//! ## Page-Based Storage
//!
//! Each node occupies exactly one 1024-byte page and owns its page buffer;
//! nodes are read from and written back to the [`PageFile`] explicitly.
//! The tree stores page numbers rather than memory pointers, which is what
//! makes the structure persistent.
//!
//! ## Node Splitting
//!
//! When a node fills up during insertion:
//! 1. The combined entry set is divided with an empty sibling appended at
//!    the end of the file.
//! 2. A separator (the sibling's first key for leaves, the promoted middle
//!    key for interior nodes) travels up to the parent.
//! 3. If the parent is full too, the split propagates along the descent
//!    path; when it passes the root, a fresh root page is appended and the
//!    height grows by one.
//!
//! [`PageFile`]: crate::storage::PageFile

mod interior;
mod leaf;
mod meta;
mod tree;

pub use interior::{InteriorNode, INTERIOR_MAX_ENTRIES};
pub use leaf::{LeafNode, SearchResult, LEAF_MAX_ENTRIES};
pub use meta::{MetaPage, INIT_EMPTY, INIT_POPULATED, INIT_UNSET};
pub use tree::{BTreeIndex, IndexCursor, LocateResult};
