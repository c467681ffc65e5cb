//! # B+Tree Interior Node Implementation
//!
//! Interior nodes hold separator keys and child page pointers:
//!
//! ```text
//! Offset  Size  Field
//! ------  ----  -----------------------------------------
//! 0       4     key count n
//! 4       4     leftmost child page id
//! 8       8*n   entries (key, child page id), sorted ascending by key
//! ```
//!
//! Each 8-byte entry `(k, c)` points at the subtree holding keys `>= k`
//! (and below the next separator). Keys smaller than the first separator
//! live under the dedicated leftmost-child pointer at offset 4. Capacity is
//! (1024 - 8) / 8 = 127 separators.
//!
//! Splitting differs from the leaf case: the middle key is promoted to the
//! parent and kept in neither half, and its child pointer becomes the new
//! sibling's leftmost child. A full page has no slack for a 128th entry, so
//! the split stages the combined entry set in a scratch vector before
//! redistributing.

use zerocopy::native_endian::I32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::error::{Error, Result};
use crate::storage::{PageBuf, PageFile, PAGE_SIZE};
use crate::types::PageId;

pub const INTERIOR_HEADER_SIZE: usize = 8;
pub const INTERIOR_ENTRY_SIZE: usize = 8;
/// Separator entries that fit in one interior page.
pub const INTERIOR_MAX_ENTRIES: usize = (PAGE_SIZE - INTERIOR_HEADER_SIZE) / INTERIOR_ENTRY_SIZE;

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
struct InteriorHeader {
    key_count: I32,
    leftmost_child: I32,
}

const _: () = assert!(std::mem::size_of::<InteriorHeader>() == INTERIOR_HEADER_SIZE);

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
struct InteriorEntry {
    key: I32,
    child: I32,
}

const _: () = assert!(std::mem::size_of::<InteriorEntry>() == INTERIOR_ENTRY_SIZE);

/// An interior node over an owned page buffer.
pub struct InteriorNode {
    data: PageBuf,
}

impl InteriorNode {
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

    fn header(&self) -> &InteriorHeader {
        // INVARIANT: the buffer is always PAGE_SIZE bytes and the header is
        // unaligned, so this cannot fail.
        InteriorHeader::ref_from_bytes(&self.data[..INTERIOR_HEADER_SIZE]).unwrap()
    }

    fn header_mut(&mut self) -> &mut InteriorHeader {
        InteriorHeader::mut_from_bytes(&mut self.data[..INTERIOR_HEADER_SIZE]).unwrap()
    }

    pub fn key_count(&self) -> i32 {
        self.header().key_count.get()
    }

    fn set_key_count(&mut self, n: i32) {
        self.header_mut().key_count = I32::new(n);
    }

    /// Child pointer for keys below the first separator.
    pub fn leftmost_child(&self) -> PageId {
        self.header().leftmost_child.get()
    }

    fn set_leftmost_child(&mut self, pid: PageId) {
        self.header_mut().leftmost_child = I32::new(pid);
    }

    fn entry_offset(index: usize) -> usize {
        INTERIOR_HEADER_SIZE + index * INTERIOR_ENTRY_SIZE
    }

    fn entry(&self, index: usize) -> &InteriorEntry {
        let offset = Self::entry_offset(index);
        InteriorEntry::ref_from_bytes(&self.data[offset..offset + INTERIOR_ENTRY_SIZE]).unwrap()
    }

    fn set_entry(&mut self, index: usize, entry: InteriorEntry) {
        let offset = Self::entry_offset(index);
        self.data[offset..offset + INTERIOR_ENTRY_SIZE].copy_from_slice(entry.as_bytes());
    }

    pub fn key_at(&self, index: usize) -> i32 {
        self.entry(index).key.get()
    }

    pub fn child_at(&self, index: usize) -> PageId {
        self.entry(index).child.get()
    }

    /// The child pointer to follow for `search_key`: scanning from the last
    /// entry backward, the child of the first entry whose key is
    /// `<= search_key`, or the leftmost child when the key is below every
    /// separator.
    pub fn locate_child(&self, search_key: i32) -> PageId {
        let n = self.key_count() as usize;
        for i in (0..n).rev() {
            let entry = self.entry(i);
            if entry.key.get() <= search_key {
                return entry.child.get();
            }
        }
        self.leftmost_child()
    }

    fn insertion_index(&self, key: i32) -> usize {
        let n = self.key_count() as usize;
        (0..n).find(|&i| self.key_at(i) > key).unwrap_or(n)
    }

    /// Inserts the separator `(key, child)` in sorted position. Fails with
    /// `NodeFull` when the node already holds the maximum entry count.
    pub fn insert(&mut self, key: i32, child: PageId) -> Result<()> {
        let n = self.key_count() as usize;
        if n >= INTERIOR_MAX_ENTRIES {
            return Err(Error::NodeFull);
        }

        let index = self.insertion_index(key);
        self.data.copy_within(
            Self::entry_offset(index)..Self::entry_offset(n),
            Self::entry_offset(index + 1),
        );
        self.set_entry(
            index,
            InteriorEntry {
                key: I32::new(key),
                child: I32::new(child),
            },
        );
        self.set_key_count(n as i32 + 1);
        Ok(())
    }

    /// Inserts `(key, child)` while splitting this full node with an empty
    /// `sibling`. The middle separator is promoted: its key is returned for
    /// insertion into the parent and its child pointer becomes the
    /// sibling's leftmost child; entries above it move to the sibling.
    pub fn insert_and_split(
        &mut self,
        key: i32,
        child: PageId,
        sibling: &mut InteriorNode,
    ) -> Result<i32> {
        if sibling.key_count() != 0 {
            return Err(Error::InvalidAttribute);
        }

        let n = self.key_count() as usize;
        let mut entries: Vec<(i32, PageId)> =
            (0..n).map(|i| (self.key_at(i), self.child_at(i))).collect();
        let position = entries
            .iter()
            .position(|&(k, _)| k > key)
            .unwrap_or(entries.len());
        entries.insert(position, (key, child));

        let mid = entries.len() / 2;
        let (mid_key, mid_child) = entries[mid];

        self.data[Self::entry_offset(0)..Self::entry_offset(n)].fill(0);
        for (i, &(k, c)) in entries[..mid].iter().enumerate() {
            self.set_entry(
                i,
                InteriorEntry {
                    key: I32::new(k),
                    child: I32::new(c),
                },
            );
        }
        self.set_key_count(mid as i32);

        sibling.set_leftmost_child(mid_child);
        for (i, &(k, c)) in entries[mid + 1..].iter().enumerate() {
            sibling.set_entry(
                i,
                InteriorEntry {
                    key: I32::new(k),
                    child: I32::new(c),
                },
            );
        }
        sibling.set_key_count((entries.len() - mid - 1) as i32);

        Ok(mid_key)
    }

    /// Writes a fresh one-separator root: keys below `key` descend to
    /// `left_child`, the rest to `right_child`. Fails with
    /// `InvalidAttribute` when the node already contains entries.
    pub fn initialize_root(
        &mut self,
        left_child: PageId,
        key: i32,
        right_child: PageId,
    ) -> Result<()> {
        if self.key_count() != 0 {
            return Err(Error::InvalidAttribute);
        }

        self.set_leftmost_child(left_child);
        self.set_entry(
            0,
            InteriorEntry {
                key: I32::new(key),
                child: I32::new(right_child),
            },
        );
        self.set_key_count(1);
        Ok(())
    }
}

impl Default for InteriorNode {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::OpenMode;
    use tempfile::tempdir;

    #[test]
    fn interior_entry_is_8_bytes() {
        assert_eq!(std::mem::size_of::<InteriorEntry>(), 8);
    }

    #[test]
    fn capacity_is_127_entries() {
        assert_eq!(INTERIOR_MAX_ENTRIES, 127);
    }

    #[test]
    fn initialize_root_writes_single_separator() {
        let mut node = InteriorNode::new();
        node.initialize_root(1, 50, 2).unwrap();

        assert_eq!(node.key_count(), 1);
        assert_eq!(node.leftmost_child(), 1);
        assert_eq!(node.key_at(0), 50);
        assert_eq!(node.child_at(0), 2);
    }

    #[test]
    fn initialize_root_rejects_non_empty_node() {
        let mut node = InteriorNode::new();
        node.initialize_root(1, 50, 2).unwrap();

        let result = node.initialize_root(3, 60, 4);
        assert!(matches!(result, Err(Error::InvalidAttribute)));
    }

    #[test]
    fn locate_child_routes_by_separator() {
        let mut node = InteriorNode::new();
        node.initialize_root(1, 50, 2).unwrap();
        node.insert(70, 3).unwrap();

        // Keys below every separator go to the leftmost child.
        assert_eq!(node.locate_child(10), 1);
        assert_eq!(node.locate_child(49), 1);
        // A key equal to a separator belongs to that separator's subtree.
        assert_eq!(node.locate_child(50), 2);
        assert_eq!(node.locate_child(69), 2);
        assert_eq!(node.locate_child(70), 3);
        assert_eq!(node.locate_child(9999), 3);
    }

    #[test]
    fn insert_maintains_sorted_order() {
        let mut node = InteriorNode::new();
        node.initialize_root(1, 30, 2).unwrap();
        node.insert(10, 3).unwrap();
        node.insert(20, 4).unwrap();

        assert_eq!(node.key_at(0), 10);
        assert_eq!(node.key_at(1), 20);
        assert_eq!(node.key_at(2), 30);
        assert_eq!(node.child_at(0), 3);
        assert_eq!(node.child_at(1), 4);
        assert_eq!(node.child_at(2), 2);
    }

    #[test]
    fn insert_into_full_node_fails() {
        let mut node = InteriorNode::new();
        node.initialize_root(0, 0, 1).unwrap();
        for i in 1..INTERIOR_MAX_ENTRIES as i32 {
            node.insert(i * 10, i + 1).unwrap();
        }
        assert_eq!(node.key_count(), 127);

        let result = node.insert(9999, 200);
        assert!(matches!(result, Err(Error::NodeFull)));
    }

    fn full_interior() -> InteriorNode {
        // Separators 10, 20, ..., 1270 with child i for separator 10*i.
        let mut node = InteriorNode::new();
        node.initialize_root(0, 10, 1).unwrap();
        for i in 2..=INTERIOR_MAX_ENTRIES as i32 {
            node.insert(i * 10, i).unwrap();
        }
        node
    }

    #[test]
    fn split_promotes_middle_key() {
        let mut node = full_interior();
        let mut sibling = InteriorNode::new();

        let mid_key = node.insert_and_split(1275, 128, &mut sibling).unwrap();

        // 128 entries total; index 64 (key 650) is promoted.
        assert_eq!(mid_key, 650);
        assert_eq!(node.key_count(), 64);
        assert_eq!(sibling.key_count(), 63);
        assert_eq!(sibling.leftmost_child(), 65);
        assert_eq!(node.key_at(63), 640);
        assert_eq!(sibling.key_at(0), 660);
        assert_eq!(sibling.key_at(62), 1275);
        assert_eq!(sibling.child_at(62), 128);
    }

    #[test]
    fn split_conserves_entries_and_children() {
        let mut node = full_interior();
        let mut sibling = InteriorNode::new();
        let left_leftmost = node.leftmost_child();

        let mid_key = node.insert_and_split(555, 200, &mut sibling).unwrap();

        let mut keys = Vec::new();
        for i in 0..node.key_count() as usize {
            keys.push(node.key_at(i));
        }
        keys.push(mid_key);
        for i in 0..sibling.key_count() as usize {
            keys.push(sibling.key_at(i));
        }

        let mut expected: Vec<i32> = (1..=INTERIOR_MAX_ENTRIES as i32).map(|i| i * 10).collect();
        expected.push(555);
        expected.sort_unstable();
        assert_eq!(keys, expected);
        assert_eq!(node.leftmost_child(), left_leftmost);
    }

    #[test]
    fn split_rejects_non_empty_sibling() {
        let mut node = full_interior();
        let mut sibling = InteriorNode::new();
        sibling.initialize_root(1, 5, 2).unwrap();

        let result = node.insert_and_split(555, 200, &mut sibling);
        assert!(matches!(result, Err(Error::InvalidAttribute)));
    }

    #[test]
    fn write_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let mut pf = PageFile::open(dir.path().join("a.idx"), OpenMode::Write).unwrap();

        let mut node = InteriorNode::new();
        node.initialize_root(1, 50, 2).unwrap();
        node.write(0, &mut pf).unwrap();

        let loaded = InteriorNode::load(0, &pf).unwrap();
        assert_eq!(loaded.key_count(), 1);
        assert_eq!(loaded.leftmost_child(), 1);
        assert_eq!(loaded.locate_child(50), 2);
    }

    #[test]
    fn load_rejects_negative_pid() {
        let dir = tempdir().unwrap();
        let pf = PageFile::open(dir.path().join("a.idx"), OpenMode::Write).unwrap();

        assert!(matches!(InteriorNode::load(-5, &pf), Err(Error::InvalidPid)));
    }
}
