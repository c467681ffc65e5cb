//! # Index Engine
//!
//! `BTreeIndex` orchestrates the node and metadata layers over one
//! [`PageFile`]: open/close, insertion with split propagation, search
//! descent, and cursor-based forward reads.
//!
//! ## Insert Algorithm
//!
//! ```text
//! 1. First insertion ever: zero page 0, mark it populated, write the
//!    first leaf to page 1, record root = 1, height = 0.
//! 2. Single-leaf root: insert into it; on overflow split it, append the
//!    sibling, and promote a fresh interior root (height becomes 1).
//! 3. Deeper trees: descend from the root recording the visited page ids,
//!    insert at the leaf, and on overflow walk the recorded path upward,
//!    inserting the pending separator at each ancestor. Every ancestor
//!    that overflows splits in turn; if the walk passes the old root, a
//!    new root page is appended and the height grows by one.
//! ```
//!
//! The explicit path stack removes any need for parent pointers inside
//! nodes, so every node stays self-contained in its page.
//!
//! Split siblings are appended at `end_pid()`. The old root keeps its page
//! on a root split; the promoted parent takes a new page, so nothing below
//! it is rewritten. A failure between the page writes of one split can
//! leave an appended page unreferenced; such pages are never reclaimed.
//!
//! [`PageFile`]: crate::storage::PageFile

use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};
use crate::storage::{OpenMode, PageFile, PAGE_SIZE};
use crate::types::{PageId, RecordId};

use super::interior::InteriorNode;
use super::leaf::{LeafNode, SearchResult};
use super::meta::{MetaPage, INIT_POPULATED};

/// Position of one entry in the tree: the leaf page and the entry index
/// inside it. A plain value with no tie to the engine; it stays meaningful
/// for as long as the tree is not mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndexCursor {
    pub pid: PageId,
    pub eid: usize,
}

/// Outcome of [`BTreeIndex::locate`]. A miss still carries a cursor: it
/// points at the smallest key greater than the search key within the target
/// leaf (or at the leaf's last entry when no key is greater), which is
/// where a range scan starts reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocateResult {
    Found(IndexCursor),
    NotFound(IndexCursor),
}

impl LocateResult {
    pub fn cursor(self) -> IndexCursor {
        match self {
            LocateResult::Found(cursor) | LocateResult::NotFound(cursor) => cursor,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, LocateResult::Found(_))
    }
}

/// A disk-backed B+tree index over one paged file.
pub struct BTreeIndex {
    pf: PageFile,
}

impl BTreeIndex {
    /// Opens the index file. [`OpenMode::Write`] creates it when absent; no
    /// metadata is written until the first insertion.
    pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<Self> {
        let pf = PageFile::open(path, mode)?;
        Ok(Self { pf })
    }

    /// Syncs and closes the underlying file.
    pub fn close(self) -> Result<()> {
        self.pf.close()
    }

    /// Tree height: 0 when the root is a single leaf, -1 when the index
    /// holds no keys at all.
    pub fn height(&self) -> Result<i32> {
        let meta = MetaPage::load(&self.pf)?;
        if meta.init_state() <= 0 {
            return Ok(-1);
        }
        Ok(meta.height())
    }

    /// Page id of the root node, or 0 when no root exists yet.
    pub fn root_pid(&self) -> Result<PageId> {
        let meta = MetaPage::load(&self.pf)?;
        if meta.init_state() <= 0 {
            return Ok(0);
        }
        Ok(meta.root_pid())
    }

    fn update_meta(&mut self, f: impl FnOnce(&mut MetaPage)) -> Result<()> {
        let mut meta = MetaPage::load(&self.pf)?;
        f(&mut meta);
        meta.store(&mut self.pf)
    }

    /// Inserts `(key, rid)`. Keys are assumed unique; inserting a duplicate
    /// is not detected and leaves the tree in an unspecified state.
    pub fn insert(&mut self, key: i32, rid: RecordId) -> Result<()> {
        let meta = MetaPage::load(&self.pf)?;
        if meta.init_state() <= 0 {
            return self.insert_first(key, rid);
        }
        if meta.height() == 0 {
            return self.insert_into_root_leaf(key, rid);
        }
        self.insert_descend(key, rid, meta.height())
    }

    /// First insertion: page 0 becomes metadata, page 1 the root leaf.
    fn insert_first(&mut self, key: i32, rid: RecordId) -> Result<()> {
        if self.pf.end_pid() == 0 {
            self.pf.write(0, &[0u8; PAGE_SIZE])?;
        }
        self.update_meta(|meta| meta.set_init_state(INIT_POPULATED))?;

        let mut leaf = LeafNode::new();
        leaf.insert(key, rid)?;
        leaf.set_next_node_ptr(0)?;
        leaf.write(1, &mut self.pf)?;

        self.update_meta(|meta| meta.set_root_pid(1))?;
        self.update_meta(|meta| meta.set_height(0))?;

        debug!(key, "initialized index with first leaf");
        Ok(())
    }

    /// Insertion while the root is still a lone leaf.
    fn insert_into_root_leaf(&mut self, key: i32, rid: RecordId) -> Result<()> {
        let root_pid = self.root_pid()?;
        let mut leaf = LeafNode::load(root_pid, &self.pf)?;

        match leaf.insert(key, rid) {
            Ok(()) => leaf.write(root_pid, &mut self.pf),
            Err(Error::NodeFull) => {
                let (sibling_key, sibling_pid) = self.split_leaf(&mut leaf, root_pid, key, rid)?;
                self.promote_root(root_pid, sibling_key, sibling_pid)
            }
            Err(e) => Err(e),
        }
    }

    /// Insertion into a tree with at least one interior level.
    fn insert_descend(&mut self, key: i32, rid: RecordId, height: i32) -> Result<()> {
        let mut path: Vec<PageId> = Vec::with_capacity(height as usize);
        let mut current = self.root_pid()?;
        for _ in 0..height {
            let node = InteriorNode::load(current, &self.pf)?;
            path.push(current);
            current = node.locate_child(key);
        }

        let mut leaf = LeafNode::load(current, &self.pf)?;
        let (mut pending_key, mut pending_pid) = match leaf.insert(key, rid) {
            Ok(()) => return leaf.write(current, &mut self.pf),
            Err(Error::NodeFull) => self.split_leaf(&mut leaf, current, key, rid)?,
            Err(e) => return Err(e),
        };

        // Walk the recorded path upward until an ancestor absorbs the
        // pending separator.
        let mut split_pid = current;
        while let Some(parent_pid) = path.pop() {
            let mut parent = InteriorNode::load(parent_pid, &self.pf)?;
            match parent.insert(pending_key, pending_pid) {
                Ok(()) => return parent.write(parent_pid, &mut self.pf),
                Err(Error::NodeFull) => {
                    let mut sibling = InteriorNode::new();
                    let mid_key =
                        parent.insert_and_split(pending_key, pending_pid, &mut sibling)?;
                    let sibling_pid = self.pf.end_pid();
                    parent.write(parent_pid, &mut self.pf)?;
                    sibling.write(sibling_pid, &mut self.pf)?;
                    debug!(node = parent_pid, sibling = sibling_pid, "split interior node");

                    pending_key = mid_key;
                    pending_pid = sibling_pid;
                    split_pid = parent_pid;
                }
                Err(e) => return Err(e),
            }
        }

        // The old root itself split.
        self.promote_root(split_pid, pending_key, pending_pid)
    }

    /// Splits a full leaf, appends the sibling, and wires the leaf chain.
    /// Returns the separator for the parent and the sibling's page id.
    fn split_leaf(
        &mut self,
        leaf: &mut LeafNode,
        leaf_pid: PageId,
        key: i32,
        rid: RecordId,
    ) -> Result<(i32, PageId)> {
        let mut sibling = LeafNode::new();
        let sibling_key = leaf.insert_and_split(key, rid, &mut sibling)?;
        let sibling_pid = self.pf.end_pid();

        // The sibling inherits the old forward pointer before either page
        // is persisted.
        sibling.set_next_node_ptr(leaf.next_node_ptr())?;
        leaf.set_next_node_ptr(sibling_pid)?;

        leaf.write(leaf_pid, &mut self.pf)?;
        sibling.write(sibling_pid, &mut self.pf)?;
        debug!(leaf = leaf_pid, sibling = sibling_pid, "split leaf");

        Ok((sibling_key, sibling_pid))
    }

    /// Appends a fresh interior root above `left_pid` and bumps the height.
    /// The old root keeps its page as the left child.
    fn promote_root(&mut self, left_pid: PageId, key: i32, right_pid: PageId) -> Result<()> {
        let mut root = InteriorNode::new();
        root.initialize_root(left_pid, key, right_pid)?;
        let root_pid = self.pf.end_pid();
        root.write(root_pid, &mut self.pf)?;

        self.update_meta(|meta| meta.set_root_pid(root_pid))?;
        let height = self.height()?;
        self.update_meta(|meta| meta.set_height(height + 1))?;

        debug!(root = root_pid, height = height + 1, "promoted new root");
        Ok(())
    }

    /// Runs the standard search descent for `search_key` and returns a
    /// cursor into the target leaf. On an empty index this fails with
    /// `NoSuchRecord` without producing a cursor.
    pub fn locate(&self, search_key: i32) -> Result<LocateResult> {
        let height = self.height()?;
        if height < 0 {
            return Err(Error::NoSuchRecord);
        }

        let mut current = self.root_pid()?;
        for _ in 0..height {
            let node = InteriorNode::load(current, &self.pf)?;
            current = node.locate_child(search_key);
        }

        let leaf = LeafNode::load(current, &self.pf)?;
        Ok(match leaf.locate(search_key) {
            SearchResult::Found(eid) => LocateResult::Found(IndexCursor { pid: current, eid }),
            SearchResult::NotFound(eid) => {
                LocateResult::NotFound(IndexCursor { pid: current, eid })
            }
        })
    }

    /// Reads the entry under `cursor` and advances it by one entry. Fails
    /// with `NoSuchRecord` past the leaf's last entry; the cursor does not
    /// cross leaves on its own -- callers continue via [`next_leaf`].
    ///
    /// [`next_leaf`]: BTreeIndex::next_leaf
    pub fn read_forward(&self, cursor: &mut IndexCursor) -> Result<(i32, RecordId)> {
        let leaf = LeafNode::load(cursor.pid, &self.pf)?;
        let (key, rid) = leaf.read_entry(cursor.eid)?;
        cursor.eid += 1;
        Ok((key, rid))
    }

    /// Next page in the leaf chain after `pid`, or 0 at the rightmost leaf.
    pub fn next_leaf(&self, pid: PageId) -> Result<PageId> {
        let leaf = LeafNode::load(pid, &self.pf)?;
        Ok(leaf.next_node_ptr())
    }

    /// Flushes all written pages to disk.
    pub fn sync(&self) -> Result<()> {
        self.pf.sync()
    }
}
