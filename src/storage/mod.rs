//! # Storage Module
//!
//! The paged file underneath the index. An index file is a flat sequence of
//! fixed-size 1024-byte pages addressed by [`PageId`](crate::types::PageId);
//! the store knows nothing about node types or tree structure.
//!
//! ## Page Size
//!
//! All storage uses 1024-byte pages. Every persisted structure (leaf,
//! interior node, metadata) is exactly one page, and every read and write
//! moves exactly one page. Each node operation owns a single page-sized
//! buffer on its caller's stack; there is no cache layer in between.
//!
//! ## Allocation Model
//!
//! Pages are allocated by appending: writing at `end_pid()` extends the file
//! by one page and advances the cursor. Pages are never freed. A failure
//! between the writes of a multi-page mutation can therefore leave appended
//! pages unreferenced, which is leakage, not corruption.

mod pagefile;

pub use pagefile::{OpenMode, PageFile};

/// Size of every page in bytes.
pub const PAGE_SIZE: usize = 1024;

/// A page-sized byte buffer.
pub type PageBuf = [u8; PAGE_SIZE];
