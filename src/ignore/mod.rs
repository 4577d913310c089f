//! gitignore-style exclusion rules
//!
//! A rule file compiles into four alternation patterns (ignore-file,
//! ignore-dir, allow-file, allow-dir). Rule sets form a reference-counted
//! chain along the directory ancestry: the deepest set is consulted first
//! and delegates to its parent only when none of its own patterns match.
//!
//! Supported syntax: `#` comments, blank lines, `!` negation, trailing `/`
//! for directory-only rules, `\#`/`\!` escapes, `*` and `?` globs, and
//! anchoring to the declaring directory for rules containing `/`. The
//! double-star glob is not expanded across directory boundaries; `**`
//! collapses to a plain `*` run. This is a known limitation, kept as is.

use std::path::Path;
use std::sync::Arc;

use regex::Regex;

/// One compiled rule set plus the chain to its ancestors.
#[derive(Debug)]
pub struct Ignore {
    parent: Option<Arc<Ignore>>,
    ignore: Option<Regex>,
    ignore_dir: Option<Regex>,
    allow: Option<Regex>,
    allow_dir: Option<Regex>,
}

impl Ignore {
    /// Compiles `lines` into a rule set layered on top of `parent`.
    pub fn from_lines<I, S>(lines: I, parent: Option<Arc<Ignore>>) -> Arc<Ignore>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut parser = Parser::new(None);
        for line in lines {
            parser.add_line(line.as_ref());
        }
        parser.finish(parent)
    }

    /// Loads a rule file and layers it on top of `parent`. `scope` is the
    /// declaring directory relative to the comparison root; rules in a
    /// scoped file only ever match below that directory.
    ///
    /// An unreadable file is not an error: the parent chain is returned
    /// unchanged.
    pub fn load(file: &Path, scope: Option<&Path>, parent: Option<Arc<Ignore>>) -> Option<Arc<Ignore>> {
        let text = match std::fs::read_to_string(file) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(file = %file.display(), %err, "cannot read ignore rule file");
                return parent;
            }
        };

        let prefix = scope.map(slash_path).filter(|p| !p.is_empty());
        let mut parser = Parser::new(prefix.as_deref());
        for line in text.lines() {
            parser.add_line(line);
        }
        Some(parser.finish(parent))
    }

    /// The built-in root rule set: skip `.git` directories.
    pub fn default_rules() -> Arc<Ignore> {
        Ignore::from_lines([".git/"], None)
    }

    /// Whether `path` (slash-separated, relative to the comparison root)
    /// is excluded. Allow rules beat ignore rules within one level; a level
    /// without any match defers to its ancestors.
    pub fn matches(&self, path: &str, is_dir: bool) -> bool {
        if is_dir && matched(&self.allow_dir, path) {
            return false;
        }
        if matched(&self.allow, path) {
            return false;
        }
        if is_dir && matched(&self.ignore_dir, path) {
            return true;
        }
        if matched(&self.ignore, path) {
            return true;
        }

        match &self.parent {
            Some(parent) => parent.matches(path, is_dir),
            None => false,
        }
    }

    pub fn matches_path(&self, path: &Path, is_dir: bool) -> bool {
        self.matches(&slash_path(path), is_dir)
    }
}

fn matched(pattern: &Option<Regex>, path: &str) -> bool {
    pattern.as_ref().is_some_and(|p| p.is_match(path))
}

/// Renders a relative path with forward slashes regardless of platform.
pub(crate) fn slash_path(path: &Path) -> String {
    path.iter()
        .map(|c| c.to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

struct Parser {
    /// Regex-escaped declaring-directory prefix ending in `/`, if scoped.
    prefix: Option<String>,
    ignore: Vec<String>,
    ignore_dir: Vec<String>,
    allow: Vec<String>,
    allow_dir: Vec<String>,
}

impl Parser {
    fn new(prefix: Option<&str>) -> Self {
        Parser {
            prefix: prefix.map(|p| regex::escape(&format!("{p}/"))),
            ignore: Vec::new(),
            ignore_dir: Vec::new(),
            allow: Vec::new(),
            allow_dir: Vec::new(),
        }
    }

    fn add_line(&mut self, raw: &str) {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            return;
        }

        // A leading backslash escapes `#` and `!` so they can start a
        // literal pattern.
        let (line, negated) = if let Some(rest) = line.strip_prefix('\\')
            && (rest.starts_with('#') || rest.starts_with('!'))
        {
            (rest, false)
        } else if let Some(rest) = line.strip_prefix('!') {
            (rest, true)
        } else {
            (line, false)
        };

        let (line, dir_only) = match line.strip_suffix('/') {
            Some(rest) => (rest, true),
            None => (line, false),
        };

        // A rule containing a slash is anchored to its declaring directory;
        // anything else matches at any depth.
        let anchored = line.contains('/');
        let line = line.strip_prefix('/').unwrap_or(line);

        let mut pattern = String::new();
        for ch in line.chars() {
            match ch {
                // `**` is not special here: each star matches within one
                // path component only.
                '*' => pattern.push_str("[^/]*"),
                '?' => pattern.push_str("[^/]"),
                ch => pattern.push_str(&regex::escape(ch.encode_utf8(&mut [0; 4]))),
            }
        }

        let mut pattern = if anchored {
            pattern
        } else {
            format!("(?:.*/)?{pattern}")
        };
        if let Some(prefix) = &self.prefix {
            pattern.insert_str(0, prefix);
        }

        match (dir_only, negated) {
            (true, true) => self.allow_dir.push(pattern),
            (true, false) => self.ignore_dir.push(pattern),
            (false, true) => self.allow.push(pattern),
            (false, false) => self.ignore.push(pattern),
        }
    }

    fn finish(self, parent: Option<Arc<Ignore>>) -> Arc<Ignore> {
        Arc::new(Ignore {
            parent,
            ignore: compile(&self.ignore),
            ignore_dir: compile(&self.ignore_dir),
            allow: compile(&self.allow),
            allow_dir: compile(&self.allow_dir),
        })
    }
}

fn compile(patterns: &[String]) -> Option<Regex> {
    if patterns.is_empty() {
        return None;
    }
    let alternation = patterns
        .iter()
        .map(|p| format!("(?:{p})"))
        .collect::<Vec<_>>()
        .join("|");
    match Regex::new(&format!("^(?:{alternation})$")) {
        Ok(re) => Some(re),
        // All patterns are built from escaped input; compilation only fails
        // on pathological sizes, in which case the set is dropped.
        Err(err) => {
            tracing::warn!(%err, "failed to compile ignore patterns");
            None
        }
    }
}
