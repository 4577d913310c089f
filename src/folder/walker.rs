//! Recursive comparison of two directory trees.

use std::collections::BTreeSet;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::folder::{CancelFlag, ChangeKind, DiffItem, FolderDiffError};
use crate::ignore::Ignore;

/// Files are compared byte-for-byte up to this many bytes.
pub const COMPARE_LIMIT: u64 = 128 * 1024;

/// Rule file loaded per directory by default.
pub const DIFF_IGNORE_FILE: &str = "diff.ignore";

/// Rule file loaded per directory when opted in.
pub const GIT_IGNORE_FILE: &str = ".gitignore";

/// One folder comparison between two roots.
///
/// The walk is blocking and meant for a dedicated worker; a [`CancelFlag`]
/// obtained up front lets another thread abort it between entries.
pub struct FolderDiff {
    root_a: PathBuf,
    root_b: PathBuf,
    load_git_ignore: bool,
    load_diff_ignore: bool,
    cancel: CancelFlag,
    progress: usize,
    res: Vec<DiffItem>,
}

impl FolderDiff {
    pub fn new(
        root_a: impl AsRef<Path>,
        root_b: impl AsRef<Path>,
    ) -> Result<Self, FolderDiffError> {
        Ok(FolderDiff {
            root_a: canonical(root_a.as_ref())?,
            root_b: canonical(root_b.as_ref())?,
            load_git_ignore: false,
            load_diff_ignore: true,
            cancel: CancelFlag::new(),
            progress: 0,
            res: Vec::new(),
        })
    }

    /// Selects which per-directory rule files the walk picks up.
    pub fn with_rule_files(mut self, git_ignore: bool, diff_ignore: bool) -> Self {
        self.load_git_ignore = git_ignore;
        self.load_diff_ignore = diff_ignore;
        self
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Number of entries visited by the last walk.
    pub fn progress(&self) -> usize {
        self.progress
    }

    /// Walks both trees and returns the ordered change list. `ignore` seeds
    /// the root of the rule chain; per-directory rule files are layered on
    /// top while walking.
    pub fn compare(
        &mut self,
        ignore: Option<Arc<Ignore>>,
    ) -> Result<Vec<DiffItem>, FolderDiffError> {
        self.progress = 0;
        self.res.clear();

        let root_a = self.root_a.clone();
        let root_b = self.root_b.clone();
        self.compare_dirs(&root_a, &root_b, Path::new(""), ignore)?;

        Ok(std::mem::take(&mut self.res))
    }

    fn compare_dirs(
        &mut self,
        dir_a: &Path,
        dir_b: &Path,
        rel: &Path,
        ignore: Option<Arc<Ignore>>,
    ) -> Result<(), FolderDiffError> {
        self.cancel.check()?;

        // Rule files are read from the B (updated) side of the tree.
        let ignore = self.expand_ignore(dir_b, rel, ignore);

        let set_a = list_names(dir_a, rel, ignore.as_deref());
        let set_b = list_names(dir_b, rel, ignore.as_deref());
        let union: BTreeSet<String> = set_a.union(&set_b).cloned().collect();

        for name in union {
            self.cancel.check()?;

            let rel_path = rel.join(&name);
            let path_a = dir_a.join(&name);
            let path_b = dir_b.join(&name);

            let mut item = match (set_a.contains(&name), set_b.contains(&name)) {
                (true, true) => DiffItem::new(ChangeKind::Unchanged, rel_path.clone()),
                (true, false) => DiffItem::new(ChangeKind::Deleted, rel_path.clone()),
                (false, true) => DiffItem::new(ChangeKind::Inserted, rel_path.clone()),
                (false, false) => unreachable!("name came from the union of both sets"),
            };

            match item.kind {
                ChangeKind::Unchanged => {
                    let a_is_dir = path_a.is_dir();
                    let b_is_dir = path_b.is_dir();

                    if a_is_dir && b_is_dir {
                        // Recursing directories emit no record of their own.
                        self.compare_dirs(&path_a, &path_b, &rel_path, ignore.clone())?;
                        continue;
                    } else if a_is_dir {
                        // Directory replaced by a file: report the removed
                        // subtree and the new file separately.
                        let mut deleted = DiffItem::new(ChangeKind::Deleted, rel_path.clone());
                        self.mark_dir(&mut deleted, &path_a, &rel_path, ignore.clone())?;
                        self.res.push(deleted);
                        self.res.push(DiffItem::new(ChangeKind::Inserted, rel_path.clone()));
                    } else if b_is_dir {
                        self.res.push(DiffItem::new(ChangeKind::Deleted, rel_path.clone()));
                        let mut inserted = DiffItem::new(ChangeKind::Inserted, rel_path.clone());
                        self.mark_dir(&mut inserted, &path_b, &rel_path, ignore.clone())?;
                        self.res.push(inserted);
                    } else {
                        match compare_bytes(&path_a, &path_b) {
                            Ok(true) => item.kind = ChangeKind::Modified,
                            Ok(false) => {}
                            Err(err) => {
                                tracing::warn!(
                                    path = %rel_path.display(),
                                    %err,
                                    "byte comparison failed, reporting pair as modified"
                                );
                                item.kind = ChangeKind::Modified;
                                item.read_error = Some(err.to_string());
                            }
                        }
                    }
                }
                ChangeKind::Deleted if path_a.is_dir() => {
                    self.mark_dir(&mut item, &path_a, &rel_path, ignore.clone())?;
                }
                ChangeKind::Inserted if path_b.is_dir() => {
                    self.mark_dir(&mut item, &path_b, &rel_path, ignore.clone())?;
                }
                _ => {}
            }

            self.progress += 1;
            if item.kind != ChangeKind::Unchanged {
                self.res.push(item);
            }
        }

        Ok(())
    }

    fn mark_dir(
        &mut self,
        item: &mut DiffItem,
        dir: &Path,
        rel: &Path,
        ignore: Option<Arc<Ignore>>,
    ) -> Result<(), FolderDiffError> {
        item.is_dir = true;
        item.size = self.count_files(dir, rel, ignore)?;
        Ok(())
    }

    /// Counts non-ignored files below `dir`, layering rule files found on
    /// the way down just like the main walk does.
    fn count_files(
        &mut self,
        dir: &Path,
        rel: &Path,
        ignore: Option<Arc<Ignore>>,
    ) -> Result<usize, FolderDiffError> {
        self.cancel.check()?;

        let ignore = self.expand_ignore(dir, rel, ignore);

        let mut sum = 0;
        for name in list_names(dir, rel, ignore.as_deref()) {
            self.cancel.check()?;

            let rel_path = rel.join(&name);
            let path = dir.join(&name);
            if path.is_dir() {
                sum += self.count_files(&path, &rel_path, ignore.clone())?;
            } else {
                sum += 1;
            }
            self.progress += 1;
        }

        Ok(sum)
    }

    fn expand_ignore(
        &self,
        dir: &Path,
        rel: &Path,
        mut chain: Option<Arc<Ignore>>,
    ) -> Option<Arc<Ignore>> {
        if self.load_git_ignore {
            let file = dir.join(GIT_IGNORE_FILE);
            if file.is_file() {
                chain = Ignore::load(&file, Some(rel), chain);
            }
        }
        if self.load_diff_ignore {
            let file = dir.join(DIFF_IGNORE_FILE);
            if file.is_file() {
                chain = Ignore::load(&file, Some(rel), chain);
            }
        }
        chain
    }
}

/// Sorted, ignore-filtered child names of one directory. An unreadable
/// directory lists as empty.
fn list_names(dir: &Path, rel: &Path, ignore: Option<&Ignore>) -> BTreeSet<String> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!(dir = %dir.display(), %err, "cannot list directory");
            return BTreeSet::new();
        }
    };

    let mut names = BTreeSet::new();
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        if let Some(ignore) = ignore
            && ignore.matches_path(&rel.join(&name), entry.path().is_dir())
        {
            continue;
        }
        names.insert(name);
    }
    names
}

/// Byte-for-byte equality check capped at [`COMPARE_LIMIT`], preceded by a
/// cheap total-size check.
fn compare_bytes(path_a: &Path, path_b: &Path) -> std::io::Result<bool> {
    let len_a = std::fs::metadata(path_a)?.len();
    let len_b = std::fs::metadata(path_b)?.len();
    if len_a != len_b {
        return Ok(true);
    }

    let mut file_a = std::fs::File::open(path_a)?.take(COMPARE_LIMIT);
    let mut file_b = std::fs::File::open(path_b)?.take(COMPARE_LIMIT);

    let mut buf_a = [0u8; 8192];
    let mut buf_b = [0u8; 8192];
    loop {
        let n = file_a.read(&mut buf_a)?;
        if n == 0 {
            return Ok(false);
        }
        file_b.read_exact(&mut buf_b[..n])?;
        if buf_a[..n] != buf_b[..n] {
            return Ok(true);
        }
    }
}

fn canonical(path: &Path) -> Result<PathBuf, FolderDiffError> {
    path.canonicalize().map_err(|source| FolderDiffError::Io {
        path: path.to_path_buf(),
        source,
    })
}
