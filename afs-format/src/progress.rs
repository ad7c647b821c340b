use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Progress updates from packing or unpacking, emitted once before and once
/// after each entry slot. `index` is 1-based; `total` counts null entries too.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryProgress<'a> {
    Started {
        total: u32,
        index: u32,
        name: &'a str,
    },
    Done {
        total: u32,
        index: u32,
        name: &'a str,
    },
}

/// Cooperative cancellation flag, shared between the worker running a
/// pack/unpack and whoever wants it stopped.
///
/// Checked only between entries; an entry that has started copying always finishes.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> CancelToken {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Statistics from packing an archive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackStats {
    /// Number of entry slots written, null entries included.
    pub entries_written: u64,
    /// Number of data bytes copied from sources.
    pub bytes_written: u64,
    /// Length of the finished file.
    pub file_size: u64,
}

/// Statistics from extracting an archive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnpackStats {
    /// Number of files written to the destination.
    pub files_extracted: u64,
    /// Number of null entries passed over.
    pub null_entries: u64,
    /// Total bytes written to disk.
    pub bytes_written: u64,
}
