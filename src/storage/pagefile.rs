//! # Paged File I/O
//!
//! `PageFile` reads and writes whole 1024-byte pages at page-aligned
//! offsets using positioned I/O, so reads take `&self` and no seek state is
//! shared. The page count is derived from the file length on open and
//! advanced as pages are appended.
//!
//! Writes go through the OS buffer; `sync()` (and `close()`) flush them to
//! disk. The index's durability model treats each page write as atomic in
//! isolation; there is no write-ahead logging here.

use std::fs::{File, OpenOptions};
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::PageId;

use super::{PageBuf, PAGE_SIZE};

/// How to open an index file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Open an existing file; fails if it does not exist.
    Read,
    /// Open for reading and writing, creating the file if absent.
    Write,
}

/// A file of fixed-size pages with an append cursor.
#[derive(Debug)]
pub struct PageFile {
    file: File,
    path: PathBuf,
    page_count: PageId,
}

impl PageFile {
    /// Opens the paged file at `path`. Under [`OpenMode::Write`] the file is
    /// created if it does not exist. Fails with `InvalidFileFormat` when the
    /// file size is not a whole number of pages.
    pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<Self> {
        let path = path.as_ref();

        let mut options = OpenOptions::new();
        options.read(true);
        if mode == OpenMode::Write {
            options.write(true).create(true);
        }

        let file = options.open(path).map_err(|source| Error::FileOpenFailed {
            path: path.to_path_buf(),
            source,
        })?;

        let size = file.metadata()?.len();
        if size % PAGE_SIZE as u64 != 0 {
            return Err(Error::InvalidFileFormat { size });
        }

        Ok(Self {
            file,
            path: path.to_path_buf(),
            page_count: (size / PAGE_SIZE as u64) as PageId,
        })
    }

    /// Reads page `pid` into `buf`. Fails with `InvalidPid` when `pid` is
    /// negative or past the last page.
    pub fn read(&self, pid: PageId, buf: &mut PageBuf) -> Result<()> {
        if pid < 0 || pid >= self.page_count {
            return Err(Error::InvalidPid);
        }

        self.file
            .read_exact_at(buf, pid as u64 * PAGE_SIZE as u64)?;
        Ok(())
    }

    /// Writes `buf` to page `pid`. Writing at `end_pid()` appends a new page
    /// and advances the cursor; writing further past the end is rejected
    /// with `InvalidPid`.
    pub fn write(&mut self, pid: PageId, buf: &PageBuf) -> Result<()> {
        if pid < 0 || pid > self.page_count {
            return Err(Error::InvalidPid);
        }

        self.file
            .write_all_at(buf, pid as u64 * PAGE_SIZE as u64)?;

        if pid == self.page_count {
            self.page_count += 1;
        }
        Ok(())
    }

    /// The id of the next unused page, equal to the current page count.
    pub fn end_pid(&self) -> PageId {
        self.page_count
    }

    /// Flushes all written pages to disk.
    pub fn sync(&self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    /// Syncs and closes the file.
    pub fn close(self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn write_mode_creates_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fresh.idx");

        let pf = PageFile::open(&path, OpenMode::Write).unwrap();

        assert!(path.exists());
        assert_eq!(pf.end_pid(), 0);
    }

    #[test]
    fn read_mode_fails_on_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.idx");

        let result = PageFile::open(&path, OpenMode::Read);

        assert!(matches!(result, Err(Error::FileOpenFailed { .. })));
    }

    #[test]
    fn rejects_file_with_partial_page() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("torn.idx");
        std::fs::write(&path, vec![0u8; PAGE_SIZE + 100]).unwrap();

        let result = PageFile::open(&path, OpenMode::Read);

        assert!(matches!(result, Err(Error::InvalidFileFormat { .. })));
    }

    #[test]
    fn write_at_end_appends() {
        let dir = tempdir().unwrap();
        let mut pf = PageFile::open(dir.path().join("a.idx"), OpenMode::Write).unwrap();

        let page = [0xABu8; PAGE_SIZE];
        pf.write(0, &page).unwrap();
        assert_eq!(pf.end_pid(), 1);

        pf.write(1, &page).unwrap();
        assert_eq!(pf.end_pid(), 2);
    }

    #[test]
    fn write_past_end_is_rejected() {
        let dir = tempdir().unwrap();
        let mut pf = PageFile::open(dir.path().join("a.idx"), OpenMode::Write).unwrap();

        let page = [0u8; PAGE_SIZE];
        assert!(matches!(pf.write(3, &page), Err(Error::InvalidPid)));
        assert!(matches!(pf.write(-1, &page), Err(Error::InvalidPid)));
    }

    #[test]
    fn read_round_trips_written_page() {
        let dir = tempdir().unwrap();
        let mut pf = PageFile::open(dir.path().join("a.idx"), OpenMode::Write).unwrap();

        let mut page = [0u8; PAGE_SIZE];
        page[0] = 0xDE;
        page[PAGE_SIZE - 1] = 0xAD;
        pf.write(0, &page).unwrap();

        let mut out = [0u8; PAGE_SIZE];
        pf.read(0, &mut out).unwrap();
        assert_eq!(out[0], 0xDE);
        assert_eq!(out[PAGE_SIZE - 1], 0xAD);
    }

    #[test]
    fn read_out_of_range_is_rejected() {
        let dir = tempdir().unwrap();
        let pf = PageFile::open(dir.path().join("a.idx"), OpenMode::Write).unwrap();

        let mut buf = [0u8; PAGE_SIZE];
        assert!(matches!(pf.read(0, &mut buf), Err(Error::InvalidPid)));
        assert!(matches!(pf.read(-2, &mut buf), Err(Error::InvalidPid)));
    }

    #[test]
    fn page_count_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.idx");

        {
            let mut pf = PageFile::open(&path, OpenMode::Write).unwrap();
            pf.write(0, &[1u8; PAGE_SIZE]).unwrap();
            pf.write(1, &[2u8; PAGE_SIZE]).unwrap();
            pf.close().unwrap();
        }

        let pf = PageFile::open(&path, OpenMode::Read).unwrap();
        assert_eq!(pf.end_pid(), 2);

        let mut buf = [0u8; PAGE_SIZE];
        pf.read(1, &mut buf).unwrap();
        assert_eq!(buf[0], 2);
    }
}
