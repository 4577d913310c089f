use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use fdiff::diff::{DiffType, diff};
use fdiff::folder::{ChangeKind, DiffFilter, DiffItem, FolderDiff, FolderDiffError};
use fdiff::ignore::Ignore;

#[derive(Parser)]
#[command(
    name = "fdiff",
    version = "0.1.0",
    about = "Compare two text files or two directory trees",
    long_about = "Compares two text files line by line, or two directory trees \
    path by path with -r. Directory comparison honors gitignore-style rule \
    files (diff.ignore by default) discovered while walking.",
    help_template = r"
{name} {version} - {about}

USAGE:
    {usage}

OPTIONS:
    {all-args}
",
)]
struct Cli {
    #[arg(index = 1, help = "Original (A side) file or directory")]
    original: PathBuf,

    #[arg(index = 2, help = "Updated (B side) file or directory")]
    updated: PathBuf,

    #[arg(short = 'r', long, help = "Compare directory trees instead of files")]
    recursive: bool,

    #[arg(long, help = "Also load .gitignore rule files found in directories")]
    gitignore: bool,

    #[arg(long, help = "Do not load diff.ignore rule files found in directories")]
    no_diff_ignore: bool,

    #[arg(
        short = 'i',
        long,
        value_name = "FILE",
        help = "Global ignore rule file replacing the built-in default (.git/)"
    )]
    ignore_file: Option<PathBuf>,

    #[arg(
        long,
        value_name = "KINDS",
        help = "Only report these change kinds: A(dded), D(eleted), M(odified)"
    )]
    filter: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    if cli.recursive {
        folder_diff(cli).await
    } else {
        file_diff(&cli)
    }
}

fn file_diff(cli: &Cli) -> Result<()> {
    let text_a = load_text(&cli.original)?;
    let text_b = load_text(&cli.updated)?;
    let lines_a: Vec<&str> = text_a.lines().collect();
    let lines_b: Vec<&str> = text_b.lines().collect();

    for chunk in diff(&lines_a, &lines_b)? {
        let range_a = chunk.start_a..chunk.start_a + chunk.length;
        let range_b = chunk.start_b..chunk.start_b + chunk.length;
        match chunk.kind {
            DiffType::Unchanged => {
                for line in &lines_a[range_a] {
                    println!("  {line}");
                }
            }
            DiffType::Deleted => {
                for line in &lines_a[range_a] {
                    println!("{}", format!("- {line}").red());
                }
            }
            DiffType::Inserted => {
                for line in &lines_b[range_b] {
                    println!("{}", format!("+ {line}").green());
                }
            }
        }
    }

    Ok(())
}

fn load_text(path: &Path) -> Result<String> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    String::from_utf8(bytes).with_context(|| format!("{} is not valid UTF-8 text", path.display()))
}

async fn folder_diff(cli: Cli) -> Result<()> {
    let filter = match &cli.filter {
        Some(s) => DiffFilter::try_parse(s)
            .with_context(|| format!("invalid filter {s:?}, expected letters A, D, M"))?,
        None => DiffFilter::all(),
    };

    let ignore = match &cli.ignore_file {
        Some(file) => Ignore::load(file, None, None),
        None => Some(Ignore::default_rules()),
    };

    let mut walker = FolderDiff::new(&cli.original, &cli.updated)?
        .with_rule_files(cli.gitignore, !cli.no_diff_ignore);
    let cancel = walker.cancel_flag();

    // The walk blocks on filesystem I/O, so it runs on a worker while the
    // runtime watches for Ctrl-C.
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let (result, visited) = tokio::task::spawn_blocking(move || {
        let result = walker.compare(ignore);
        (result, walker.progress())
    })
    .await?;

    let items = match result {
        Ok(items) => items,
        Err(FolderDiffError::Interrupted) => {
            eprintln!("fdiff: interrupted");
            std::process::exit(130);
        }
        Err(err) => return Err(err.into()),
    };

    for item in items.iter().filter(|item| filter.admits(item.kind)) {
        print_item(item);
    }
    tracing::info!(visited, "folder comparison finished");

    Ok(())
}

fn print_item(item: &DiffItem) {
    let status = item.kind.status_char().to_string();
    let status = match item.kind {
        ChangeKind::Deleted => status.red(),
        ChangeKind::Inserted => status.green(),
        ChangeKind::Modified => status.yellow(),
        ChangeKind::Unchanged => status.normal(),
    };

    let mut line = format!("{} {}", status, item.path.display());
    if item.is_dir {
        line.push_str(&format!(" ({} files)", item.size));
    }
    if let Some(err) = &item.read_error {
        line.push_str(&format!(" [read error: {err}]"));
    }
    println!("{line}");
}
