//! Directory tree comparison
//!
//! - `walker`: recursive path-by-path comparison of two roots
//!
//! The walker reports only changes: entries present in one tree only,
//! files whose bytes differ, and directory subtrees summarized by their
//! non-ignored file count. It consults an [`crate::ignore::Ignore`] chain
//! to prune subtrees and honors cooperative cancellation.

pub mod walker;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bitflags::bitflags;

pub use walker::FolderDiff;

/// Classification of one folder-level entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Unchanged,
    Deleted,
    Inserted,
    Modified,
}

impl ChangeKind {
    pub fn status_char(&self) -> char {
        match self {
            ChangeKind::Unchanged => ' ',
            ChangeKind::Deleted => 'D',
            ChangeKind::Inserted => 'A',
            ChangeKind::Modified => 'M',
        }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct DiffFilter: u32 {
        const ADDED = 0b001;
        const DELETED = 0b010;
        const MODIFIED = 0b100;
    }
}

impl DiffFilter {
    pub fn try_parse(s: &str) -> Option<Self> {
        let mut filter = Self::empty();

        for c in s.chars() {
            match c {
                'A' => filter |= Self::ADDED,
                'D' => filter |= Self::DELETED,
                'M' => filter |= Self::MODIFIED,
                _ => return None,
            }
        }

        Some(filter)
    }

    pub fn admits(&self, kind: ChangeKind) -> bool {
        match kind {
            ChangeKind::Inserted => self.contains(Self::ADDED),
            ChangeKind::Deleted => self.contains(Self::DELETED),
            ChangeKind::Modified => self.contains(Self::MODIFIED),
            ChangeKind::Unchanged => false,
        }
    }
}

/// One reported difference between the two trees.
///
/// `path` is relative to both roots. For directory subtrees, `size` counts
/// the non-ignored files below the directory; for plain files it is 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffItem {
    pub kind: ChangeKind,
    pub path: PathBuf,
    pub is_dir: bool,
    pub size: usize,
    /// Set when the byte comparison of this pair failed partway; the pair is
    /// conservatively reported as modified.
    pub read_error: Option<String>,
}

impl DiffItem {
    pub(crate) fn new(kind: ChangeKind, path: PathBuf) -> Self {
        DiffItem {
            kind,
            path,
            is_dir: false,
            size: 1,
            read_error: None,
        }
    }
}

/// Shared cancellation signal for one folder comparison.
///
/// Clones observe the same flag; the walker checks it before every directory
/// and every entry and bails out with [`FolderDiffError::Interrupted`].
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub(crate) fn check(&self) -> Result<(), FolderDiffError> {
        if self.is_cancelled() {
            Err(FolderDiffError::Interrupted)
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FolderDiffError {
    /// The cancellation flag was raised; partial results are discarded.
    #[error("comparison interrupted")]
    Interrupted,

    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
