//! # Persisted Tree Metadata
//!
//! Page 0 of the index file describes the tree itself, which keeps the
//! index self-describing in a single file:
//!
//! ```text
//! Offset  Size  Field
//! ------  ----  ------------------------------------------
//! 0       4     root page id (0 = none)
//! 4       4     tree height (0 = single-leaf root)
//! 8       4     init state (-1 unset, 0 empty, 1 populated)
//! ```
//!
//! The init tri-state distinguishes "file never written" from "page 0
//! written, no keys yet" from "populated"; the engine's first-insert path
//! keys off it. Setters at the engine level are read-modify-write of the
//! whole page.

use zerocopy::native_endian::I32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::error::Result;
use crate::storage::{PageBuf, PageFile, PAGE_SIZE};
use crate::types::PageId;

pub const INIT_UNSET: i32 = -1;
pub const INIT_EMPTY: i32 = 0;
pub const INIT_POPULATED: i32 = 1;

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
struct MetaHeader {
    root_pid: I32,
    height: I32,
    init_state: I32,
}

const _: () = assert!(std::mem::size_of::<MetaHeader>() == 12);

/// Accessor over the metadata page.
pub struct MetaPage {
    data: PageBuf,
}

impl MetaPage {
    /// Reads page 0. A file with no pages yet yields the unset state
    /// without touching the store.
    pub fn load(pf: &PageFile) -> Result<Self> {
        let mut page = Self {
            data: [0u8; PAGE_SIZE],
        };
        if pf.end_pid() == 0 {
            page.set_init_state(INIT_UNSET);
        } else {
            pf.read(0, &mut page.data)?;
        }
        Ok(page)
    }

    /// Writes the page back; appends page 0 when the file is empty.
    pub fn store(&self, pf: &mut PageFile) -> Result<()> {
        pf.write(0, &self.data)
    }

    fn header(&self) -> &MetaHeader {
        // INVARIANT: the buffer is always PAGE_SIZE bytes and the header is
        // unaligned, so this cannot fail.
        MetaHeader::ref_from_bytes(&self.data[..std::mem::size_of::<MetaHeader>()]).unwrap()
    }

    fn header_mut(&mut self) -> &mut MetaHeader {
        MetaHeader::mut_from_bytes(&mut self.data[..std::mem::size_of::<MetaHeader>()]).unwrap()
    }

    pub fn root_pid(&self) -> PageId {
        self.header().root_pid.get()
    }

    pub fn set_root_pid(&mut self, pid: PageId) {
        self.header_mut().root_pid = I32::new(pid);
    }

    pub fn height(&self) -> i32 {
        self.header().height.get()
    }

    pub fn set_height(&mut self, height: i32) {
        self.header_mut().height = I32::new(height);
    }

    pub fn init_state(&self) -> i32 {
        self.header().init_state.get()
    }

    pub fn set_init_state(&mut self, state: i32) {
        self.header_mut().init_state = I32::new(state);
    }
}
