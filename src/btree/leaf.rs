//! # B+Tree Leaf Node Implementation
//!
//! Leaf nodes store the actual `(key, RecordId)` entries and are linked
//! together for range scans. A leaf occupies exactly one page:
//!
//! ```text
//! Offset  Size  Field
//! ------  ----  -----------------------------------------
//! 0       4     key count n
//! 4       4     next-sibling page id (0 = end of chain)
//! 8       12*n  entries, sorted ascending by key
//! ...     rest  unused (zeroed)
//! ```
//!
//! Each 12-byte entry is `(key: i32, rid.pid: i32, rid.sid: i32)`, giving a
//! capacity of (1024 - 8) / 12 = 84 entries. Fields are host-endian.
//!
//! ## Search Contract
//!
//! [`LeafNode::locate`] is a linear scan. On a hit it returns the entry
//! index; on a miss it returns the index of the first entry whose key
//! exceeds the search key, or the last entry's index when every key is
//! smaller. Range scans rely on this undershoot: the returned position is
//! always a valid place to start reading forward from.
//!
//! ## Splitting
//!
//! [`LeafNode::insert_and_split`] divides a full node around the midpoint
//! of the pre-insertion count: the upper half block-moves into an empty
//! sibling, then the new entry is routed to whichever side its insertion
//! index falls in. The caller wires the sibling chain and persists both
//! pages.

use zerocopy::native_endian::I32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::error::{Error, Result};
use crate::storage::{PageBuf, PageFile, PAGE_SIZE};
use crate::types::{PageId, RecordId};

pub const LEAF_HEADER_SIZE: usize = 8;
pub const LEAF_ENTRY_SIZE: usize = 12;
/// Entries that fit in one leaf page.
pub const LEAF_MAX_ENTRIES: usize = (PAGE_SIZE - LEAF_HEADER_SIZE) / LEAF_ENTRY_SIZE;

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
struct LeafHeader {
    key_count: I32,
    next_sibling: I32,
}

const _: () = assert!(std::mem::size_of::<LeafHeader>() == LEAF_HEADER_SIZE);

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
struct LeafEntry {
    key: I32,
    rid_pid: I32,
    rid_sid: I32,
}

const _: () = assert!(std::mem::size_of::<LeafEntry>() == LEAF_ENTRY_SIZE);

impl LeafEntry {
    fn new(key: i32, rid: RecordId) -> Self {
        Self {
            key: I32::new(key),
            rid_pid: I32::new(rid.pid),
            rid_sid: I32::new(rid.sid),
        }
    }

    fn rid(&self) -> RecordId {
        RecordId {
            pid: self.rid_pid.get(),
            sid: self.rid_sid.get(),
        }
    }
}

/// Outcome of an in-node key search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchResult {
    /// The key exists at this entry index.
    Found(usize),
    /// The key is absent; the index is the position described in the module
    /// docs (first larger entry, or the last entry when all are smaller).
    NotFound(usize),
}

/// A leaf node over an owned page buffer.
pub struct LeafNode {
    data: PageBuf,
}

impl LeafNode {
    /// An empty leaf: zero entries, no next sibling.
    pub fn new() -> Self {
        Self {
            data: [0u8; PAGE_SIZE],
        }
    }

    /// Reads the node from page `pid`. Fails with `InvalidPid` for a
    /// negative pid; store errors bubble.
    pub fn load(pid: PageId, pf: &PageFile) -> Result<Self> {
        if pid < 0 {
            return Err(Error::InvalidPid);
        }
        let mut node = Self::new();
        pf.read(pid, &mut node.data)?;
        Ok(node)
    }

    /// Writes the node back to page `pid`.
    pub fn write(&self, pid: PageId, pf: &mut PageFile) -> Result<()> {
        pf.write(pid, &self.data)
    }

    fn header(&self) -> &LeafHeader {
        // INVARIANT: the buffer is always PAGE_SIZE bytes and LeafHeader is
        // unaligned, so this cannot fail.
        LeafHeader::ref_from_bytes(&self.data[..LEAF_HEADER_SIZE]).unwrap()
    }

    fn header_mut(&mut self) -> &mut LeafHeader {
        LeafHeader::mut_from_bytes(&mut self.data[..LEAF_HEADER_SIZE]).unwrap()
    }

    pub fn key_count(&self) -> i32 {
        self.header().key_count.get()
    }

    fn set_key_count(&mut self, n: i32) {
        self.header_mut().key_count = I32::new(n);
    }

    /// Page id of the next leaf in the chain; 0 means this is the last one.
    pub fn next_node_ptr(&self) -> PageId {
        self.header().next_sibling.get()
    }

    /// Sets the next-sibling pointer. 0 denotes end-of-chain; a negative
    /// pid is rejected with `InvalidPid`.
    pub fn set_next_node_ptr(&mut self, pid: PageId) -> Result<()> {
        if pid < 0 {
            return Err(Error::InvalidPid);
        }
        self.header_mut().next_sibling = I32::new(pid);
        Ok(())
    }

    fn entry_offset(index: usize) -> usize {
        LEAF_HEADER_SIZE + index * LEAF_ENTRY_SIZE
    }

    fn entry(&self, index: usize) -> &LeafEntry {
        let offset = Self::entry_offset(index);
        LeafEntry::ref_from_bytes(&self.data[offset..offset + LEAF_ENTRY_SIZE]).unwrap()
    }

    fn set_entry(&mut self, index: usize, entry: LeafEntry) {
        let offset = Self::entry_offset(index);
        self.data[offset..offset + LEAF_ENTRY_SIZE].copy_from_slice(entry.as_bytes());
    }

    fn key_at(&self, index: usize) -> i32 {
        self.entry(index).key.get()
    }

    /// Index the new key would occupy: the first entry with a larger key.
    fn insertion_index(&self, key: i32) -> usize {
        let n = self.key_count() as usize;
        (0..n).find(|&i| self.key_at(i) > key).unwrap_or(n)
    }

    /// Inserts `(key, rid)` in sorted position, shifting larger entries
    /// right. Fails with `NodeFull` when the entry would not fit.
    /// Duplicate keys are not detected.
    pub fn insert(&mut self, key: i32, rid: RecordId) -> Result<()> {
        let n = self.key_count() as usize;
        if n >= LEAF_MAX_ENTRIES {
            return Err(Error::NodeFull);
        }

        let index = self.insertion_index(key);
        self.data.copy_within(
            Self::entry_offset(index)..Self::entry_offset(n),
            Self::entry_offset(index + 1),
        );
        self.set_entry(index, LeafEntry::new(key, rid));
        self.set_key_count(n as i32 + 1);
        Ok(())
    }

    /// Inserts `(key, rid)` while splitting this full node with an empty
    /// `sibling`: entries from the midpoint up move to the sibling, and the
    /// new entry lands on whichever side its position falls. Returns the
    /// sibling's first key, which the caller inserts into the parent as the
    /// separator. Sibling chain pointers are the caller's responsibility.
    pub fn insert_and_split(
        &mut self,
        key: i32,
        rid: RecordId,
        sibling: &mut LeafNode,
    ) -> Result<i32> {
        if sibling.key_count() != 0 {
            return Err(Error::InvalidAttribute);
        }

        let n = self.key_count() as usize;
        let index = self.insertion_index(key);
        let mid = n / 2;

        let moved = Self::entry_offset(mid)..Self::entry_offset(n);
        sibling.data[Self::entry_offset(0)..Self::entry_offset(n - mid)]
            .copy_from_slice(&self.data[moved.clone()]);
        self.data[moved].fill(0);
        sibling.set_key_count((n - mid) as i32);
        self.set_key_count(mid as i32);

        if index > mid {
            sibling.insert(key, rid)?;
        } else {
            self.insert(key, rid)?;
        }

        let (sibling_key, _) = sibling.read_entry(0)?;
        Ok(sibling_key)
    }

    /// Searches for `search_key`; see the module docs for the miss
    /// contract.
    pub fn locate(&self, search_key: i32) -> SearchResult {
        let n = self.key_count() as usize;
        for i in 0..n {
            let key = self.key_at(i);
            if key == search_key {
                return SearchResult::Found(i);
            }
            if key > search_key {
                return SearchResult::NotFound(i);
            }
        }
        SearchResult::NotFound(n.saturating_sub(1))
    }

    /// Reads the entry at `index`; `NoSuchRecord` when past the last entry.
    pub fn read_entry(&self, index: usize) -> Result<(i32, RecordId)> {
        if index >= self.key_count() as usize {
            return Err(Error::NoSuchRecord);
        }
        let entry = self.entry(index);
        Ok((entry.key.get(), entry.rid()))
    }
}

impl Default for LeafNode {
    fn default() -> Self {
        Self::new()
    }
}
