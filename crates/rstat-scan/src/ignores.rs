//! Cascading ignore rules keyed by directory.
//!
//! Pattern sets are registered at the directory they were read from. A
//! path is checked from the root downwards: each level tests the part of
//! the path below that directory, and the first level that matches wins.
//! Deeper registrations are never consulted once a shallower one matched,
//! so a negation in a nested ignore file cannot re-include something an
//! ancestor excluded.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Component, Path};

use compact_str::CompactString;
use ignore::gitignore::{Gitignore, GitignoreBuilder};

/// A compiled predicate over paths relative to the directory it belongs to.
pub trait PatternSet: Send {
    /// Check whether `relative` is ignored by this set.
    fn is_match(&self, relative: &Path, is_dir: bool) -> bool;
}

impl<F> PatternSet for F
where
    F: Fn(&Path, bool) -> bool + Send,
{
    fn is_match(&self, relative: &Path, is_dir: bool) -> bool {
        self(relative, is_dir)
    }
}

/// Pattern set in gitignore syntax.
#[derive(Debug, Clone)]
pub struct GitignoreSet {
    inner: Gitignore,
}

impl GitignoreSet {
    /// Compile an ignore file that lives in `dir`.
    ///
    /// Lines that fail to parse are logged and skipped; the rest of the
    /// file still applies.
    pub fn from_file(dir: &Path, file: &Path) -> Result<Self, ignore::Error> {
        let mut builder = GitignoreBuilder::new(dir);
        if let Some(err) = builder.add(file) {
            if is_fatal(&err) {
                return Err(err);
            }
            tracing::warn!(path = %file.display(), "skipping invalid ignore rules: {err}");
        }
        Ok(Self {
            inner: builder.build()?,
        })
    }

    /// Compile inline gitignore lines.
    pub fn from_lines<I, S>(lines: I) -> Result<Self, ignore::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = GitignoreBuilder::new("");
        for line in lines {
            builder.add_line(None, line.as_ref())?;
        }
        Ok(Self {
            inner: builder.build()?,
        })
    }

    /// Number of patterns in the set.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Check if the set has no patterns.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl PatternSet for GitignoreSet {
    fn is_match(&self, relative: &Path, is_dir: bool) -> bool {
        self.inner.matched(relative, is_dir).is_ignore()
    }
}

fn is_fatal(err: &ignore::Error) -> bool {
    match err {
        ignore::Error::Partial(_) => false,
        ignore::Error::WithLineNumber { .. } | ignore::Error::Glob { .. } => false,
        ignore::Error::WithPath { err, .. } | ignore::Error::WithDepth { err, .. } => is_fatal(err),
        _ => true,
    }
}

/// Outcome of checking a path against an [`IgnoreMatcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreVerdict {
    /// A pattern set registered `level` directories below the root matched.
    Ignored { level: usize },
    /// The walk stopped at `level`: no rules are registered any deeper.
    NoDeeperRules { level: usize },
    /// Every directory on the way to the path was checked without a match.
    Exhausted,
}

impl IgnoreVerdict {
    /// Check if the verdict excludes the path.
    pub fn is_ignored(self) -> bool {
        matches!(self, IgnoreVerdict::Ignored { .. })
    }
}

/// One directory name. Names that are not valid UTF-8 are kept as raw
/// OS strings so distinct names never share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Segment {
    Utf8(CompactString),
    Raw(OsString),
}

#[derive(Default)]
struct IgnoreNode {
    children: HashMap<Segment, IgnoreNode>,
    patterns: Vec<Box<dyn PatternSet>>,
}

impl IgnoreNode {
    fn child(&self, segment: &Segment) -> Option<&IgnoreNode> {
        self.children.get(segment)
    }
}

/// Trie of pattern sets keyed by directory segments below the scan root.
#[derive(Default)]
pub struct IgnoreMatcher {
    root: IgnoreNode,
    sets: usize,
}

impl IgnoreMatcher {
    /// Create an empty matcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pattern set at `dir` (relative to the scan root; empty for the root).
    pub fn register(&mut self, dir: &Path, patterns: impl PatternSet + 'static) {
        self.register_boxed(dir, Box::new(patterns));
    }

    /// Register an already boxed pattern set at `dir`.
    pub fn register_boxed(&mut self, dir: &Path, patterns: Box<dyn PatternSet>) {
        let mut node = &mut self.root;
        for segment in segments(dir) {
            node = node.children.entry(segment).or_default();
        }
        node.patterns.push(patterns);
        self.sets += 1;
    }

    /// Check whether `path` (relative to the scan root) is ignored.
    pub fn matches(&self, path: &Path, is_dir: bool) -> bool {
        self.verdict(path, is_dir).is_ignored()
    }

    /// Check `path` and report where the decision was made.
    pub fn verdict(&self, path: &Path, is_dir: bool) -> IgnoreVerdict {
        let mut node = &self.root;
        let mut remaining = path;
        let mut level = 0;

        loop {
            if node.patterns.iter().any(|p| p.is_match(remaining, is_dir)) {
                return IgnoreVerdict::Ignored { level };
            }

            let mut components = remaining.components();
            let Some(segment) = components.by_ref().find_map(normal_segment) else {
                return IgnoreVerdict::Exhausted;
            };
            let rest = components.as_path();
            if rest.as_os_str().is_empty() {
                return IgnoreVerdict::Exhausted;
            }

            match node.child(&segment) {
                Some(child) => {
                    node = child;
                    remaining = rest;
                    level += 1;
                }
                None => return IgnoreVerdict::NoDeeperRules { level },
            }
        }
    }

    /// Number of registered pattern sets.
    pub fn len(&self) -> usize {
        self.sets
    }

    /// Check if nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.sets == 0
    }
}

fn normal_segment(component: Component<'_>) -> Option<Segment> {
    let Component::Normal(name) = component else {
        return None;
    };
    Some(match name.to_str() {
        Some(name) => Segment::Utf8(CompactString::new(name)),
        None => Segment::Raw(name.to_os_string()),
    })
}

fn segments(path: &Path) -> impl Iterator<Item = Segment> + '_ {
    path.components().filter_map(normal_segment)
}
