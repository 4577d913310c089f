mod common;

use std::path::PathBuf;

use fdiff::folder::{ChangeKind, FolderDiff, FolderDiffError};
use fdiff::ignore::Ignore;
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::common::tree;

#[rstest]
fn addition_under_an_ignored_directory_reports_nothing() {
    let a = tree(&[("src/main.rs", "fn main() {}\n"), ("logs/app.log", "old\n")]);
    let b = tree(&[
        ("src/main.rs", "fn main() {}\n"),
        ("logs/app.log", "old\n"),
        ("logs/new.log", "new\n"),
    ]);

    let ignore = Ignore::from_lines(["logs/"], None);
    let items = FolderDiff::new(a.path(), b.path())
        .unwrap()
        .compare(Some(ignore))
        .unwrap();

    assert_eq!(items, vec![]);
}

#[rstest]
fn addition_under_a_tracked_path_reports_one_insertion() {
    let a = tree(&[("docs/readme.md", "hello\n")]);
    let b = tree(&[("docs/readme.md", "hello\n"), ("docs/new.md", "fresh\n")]);

    let mut walker = FolderDiff::new(a.path(), b.path()).unwrap();
    let items = walker.compare(None).unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].kind, ChangeKind::Inserted);
    assert_eq!(items[0].path, PathBuf::from("docs/new.md"));
    assert!(!items[0].is_dir);
    assert_eq!(items[0].size, 1);
    // The recursed docs pair is not counted, its two entries are.
    assert_eq!(walker.progress(), 2);
}

#[rstest]
fn changed_bytes_report_the_pair_as_modified() {
    let a = tree(&[("config.toml", "value = 1\n")]);
    let b = tree(&[("config.toml", "value = 2\n")]);

    let items = FolderDiff::new(a.path(), b.path())
        .unwrap()
        .compare(None)
        .unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].kind, ChangeKind::Modified);
    assert_eq!(items[0].path, PathBuf::from("config.toml"));
    assert_eq!(items[0].read_error, None);
}

#[rstest]
fn unchanged_trees_report_nothing() {
    let a = tree(&[("x.txt", "same\n"), ("sub/y.txt", "same too\n")]);
    let b = tree(&[("x.txt", "same\n"), ("sub/y.txt", "same too\n")]);

    let items = FolderDiff::new(a.path(), b.path())
        .unwrap()
        .compare(None)
        .unwrap();

    assert_eq!(items, vec![]);
}

#[rstest]
fn inserted_subtree_is_summarized_with_a_file_count() {
    let a = tree(&[("keep.txt", "k\n")]);
    let b = tree(&[
        ("keep.txt", "k\n"),
        ("newdir/x.txt", "x\n"),
        ("newdir/sub/y.txt", "y\n"),
    ]);

    let items = FolderDiff::new(a.path(), b.path())
        .unwrap()
        .compare(None)
        .unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].kind, ChangeKind::Inserted);
    assert_eq!(items[0].path, PathBuf::from("newdir"));
    assert!(items[0].is_dir);
    assert_eq!(items[0].size, 2);
}

#[rstest]
fn deleted_subtree_count_skips_ignored_files() {
    let a = tree(&[
        ("diff.ignore", "*.log\n"),
        ("gone/data.txt", "d\n"),
        ("gone/trace.log", "t\n"),
    ]);
    let b = tree(&[("diff.ignore", "*.log\n")]);

    let items = FolderDiff::new(a.path(), b.path())
        .unwrap()
        .compare(None)
        .unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].kind, ChangeKind::Deleted);
    assert_eq!(items[0].path, PathBuf::from("gone"));
    assert!(items[0].is_dir);
    assert_eq!(items[0].size, 1);
}

#[rstest]
fn directory_replaced_by_file_reports_both_sides() {
    let a = tree(&[("thing/a.txt", "a\n"), ("thing/b.txt", "b\n")]);
    let b = tree(&[("thing", "now a file\n")]);

    let items = FolderDiff::new(a.path(), b.path())
        .unwrap()
        .compare(None)
        .unwrap();

    assert_eq!(items.len(), 2);

    assert_eq!(items[0].kind, ChangeKind::Deleted);
    assert_eq!(items[0].path, PathBuf::from("thing"));
    assert!(items[0].is_dir);
    assert_eq!(items[0].size, 2);

    assert_eq!(items[1].kind, ChangeKind::Inserted);
    assert_eq!(items[1].path, PathBuf::from("thing"));
    assert!(!items[1].is_dir);
}

#[rstest]
fn nested_rule_file_is_scoped_to_its_own_subtree() {
    let a = tree(&[
        ("sub/diff.ignore", "*.tmp\n"),
        ("sub/base.txt", "b\n"),
        ("other/base.txt", "b\n"),
    ]);
    let b = tree(&[
        ("sub/diff.ignore", "*.tmp\n"),
        ("sub/base.txt", "b\n"),
        ("sub/scratch.tmp", "s\n"),
        ("other/base.txt", "b\n"),
        ("other/scratch.tmp", "s\n"),
    ]);

    let items = FolderDiff::new(a.path(), b.path())
        .unwrap()
        .compare(None)
        .unwrap();

    // The rule only suppresses the addition below sub/, not the sibling.
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].kind, ChangeKind::Inserted);
    assert_eq!(items[0].path, PathBuf::from("other/scratch.tmp"));
}

#[rstest]
fn gitignore_rule_files_are_honored_only_when_opted_in() {
    let a = tree(&[(".gitignore", "*.log\n"), ("base.txt", "b\n")]);
    let b = tree(&[
        (".gitignore", "*.log\n"),
        ("base.txt", "b\n"),
        ("debug.log", "d\n"),
    ]);

    // Off by default: the addition is reported.
    let items = FolderDiff::new(a.path(), b.path())
        .unwrap()
        .compare(None)
        .unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].path, PathBuf::from("debug.log"));

    // Opted in: the rule file suppresses it.
    let items = FolderDiff::new(a.path(), b.path())
        .unwrap()
        .with_rule_files(true, true)
        .compare(None)
        .unwrap();
    assert_eq!(items, vec![]);
}

#[rstest]
fn diff_ignore_rule_files_can_be_switched_off() {
    let a = tree(&[("diff.ignore", "*.tmp\n")]);
    let b = tree(&[("diff.ignore", "*.tmp\n"), ("scratch.tmp", "s\n")]);

    // Loaded by default, so the addition stays hidden.
    let items = FolderDiff::new(a.path(), b.path())
        .unwrap()
        .compare(None)
        .unwrap();
    assert_eq!(items, vec![]);

    let items = FolderDiff::new(a.path(), b.path())
        .unwrap()
        .with_rule_files(false, false)
        .compare(None)
        .unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].path, PathBuf::from("scratch.tmp"));
}

#[rstest]
fn nested_negation_reincludes_a_single_file() {
    let a = tree(&[
        ("diff.ignore", "*.txt\n"),
        ("sub/diff.ignore", "!keep.txt\n"),
    ]);
    let b = tree(&[
        ("diff.ignore", "*.txt\n"),
        ("sub/diff.ignore", "!keep.txt\n"),
        ("sub/keep.txt", "kept\n"),
        ("sub/other.txt", "dropped\n"),
    ]);

    let items = FolderDiff::new(a.path(), b.path())
        .unwrap()
        .compare(None)
        .unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].kind, ChangeKind::Inserted);
    assert_eq!(items[0].path, PathBuf::from("sub/keep.txt"));
}

#[rstest]
fn cancel_raised_before_the_walk_aborts_before_any_visit() {
    let mut files = Vec::new();
    for i in 0..50 {
        files.push((format!("dir{}/file.txt", i), "content".to_string()));
    }
    let refs: Vec<(&str, &str)> = files
        .iter()
        .map(|(p, c)| (p.as_str(), c.as_str()))
        .collect();
    let a = tree(&refs);
    let b = tree(&[("only.txt", "x\n")]);

    let mut walker = FolderDiff::new(a.path(), b.path()).unwrap();
    walker.cancel_flag().cancel();

    let result = walker.compare(None);
    assert!(matches!(result, Err(FolderDiffError::Interrupted)));
    assert_eq!(walker.progress(), 0);
}

#[cfg(unix)]
#[rstest]
fn cancel_raised_mid_walk_interrupts_and_discards_partial_results() {
    use std::fs::OpenOptions;
    use std::process::Command;
    use std::thread;

    let a = tree(&[("aa.txt", "same\n"), ("zz.txt", "tail\n")]);
    let b = tree(&[("aa.txt", "same\n"), ("zz.txt", "tail\n")]);

    // A named-pipe pair stalls the byte comparison at a known entry, so
    // the flag is raised while the walk is provably in flight.
    let fifo_a = a.path().join("mid.fifo");
    let fifo_b = b.path().join("mid.fifo");
    for fifo in [&fifo_a, &fifo_b] {
        let status = Command::new("mkfifo").arg(fifo).status().unwrap();
        assert!(status.success());
    }

    let mut walker = FolderDiff::new(a.path(), b.path()).unwrap();
    let cancel = walker.cancel_flag();
    let handle = thread::spawn(move || {
        let result = walker.compare(None);
        (walker, result)
    });

    // The walker opens the original side of each pair first; opening the
    // write end only returns once the walk is blocked on this entry.
    drop(OpenOptions::new().write(true).open(&fifo_a).unwrap());
    cancel.cancel();
    drop(OpenOptions::new().write(true).open(&fifo_b).unwrap());

    let (walker, result) = handle.join().unwrap();
    assert!(matches!(result, Err(FolderDiffError::Interrupted)));
    // aa.txt and the pipe pair were visited before the flag was seen,
    // zz.txt never was, and no partial listing escapes.
    assert_eq!(walker.progress(), 2);
}

#[rstest]
fn missing_root_is_an_io_error() {
    let a = tree(&[("x.txt", "x\n")]);
    let missing = a.path().join("does-not-exist");

    let result = FolderDiff::new(&missing, a.path());
    assert!(matches!(result, Err(FolderDiffError::Io { .. })));
}
