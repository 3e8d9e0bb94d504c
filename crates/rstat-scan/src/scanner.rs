//! JWalk-based directory scanner feeding the aggregation tree.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use jwalk::{DirEntry, Parallelism, WalkDir};
use tracing::{debug, trace, warn};

use rstat_core::{
    AggregateTreeBuilder, EntryError, EntryKind, ErrorKind, ScanConfig, ScanError,
    TraversalRecord,
};

use crate::ignores::{GitignoreSet, IgnoreMatcher};
use crate::root::ScanTarget;
use crate::stats::{ScanResult, ScanStats};

const PROGRESS_INTERVAL: u64 = 10_000;

/// Single-pass scanner using jwalk in serial mode.
///
/// Each directory's ignore files are registered before its children are
/// listed, so ignored entries are pruned before they are counted and
/// ignored directories are never descended into.
#[derive(Debug, Default)]
pub struct JwalkScanner {
    _private: (),
}

impl JwalkScanner {
    /// Create a new scanner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Perform a scan of the configured root.
    pub fn scan(&self, config: &ScanConfig) -> Result<ScanResult, ScanError> {
        self.scan_with(config, |_| {})
    }

    /// Perform a scan, handing every traversal record to `inspect` before it is aggregated.
    pub fn scan_with<F>(&self, config: &ScanConfig, mut inspect: F) -> Result<ScanResult, ScanError>
    where
        F: FnMut(&TraversalRecord),
    {
        let start = Instant::now();
        let root = config.root.clone();
        let walk_root = ScanTarget::walk_path(&root, config.follow_root_symlink);

        // Without a trailing separator a symlinked root is not followed.
        let root_metadata =
            std::fs::symlink_metadata(&walk_root).map_err(|e| ScanError::io(&root, e))?;
        if !root_metadata.is_dir() {
            return Err(ScanError::NotADirectory { path: root });
        }

        let matcher = self.root_matcher(config)?;
        let ignored = Arc::new(AtomicU64::new(0));
        let loaded = Arc::new(AtomicU64::new(0));

        let mut walker = WalkDir::new(&walk_root)
            .parallelism(Parallelism::Serial)
            .skip_hidden(!config.include_hidden)
            .follow_links(false)
            .sort(true)
            .min_depth(0);

        if config.uses_ignores() {
            walker = walker.process_read_dir(prune_ignored(
                walk_root.clone(),
                config.ignore_file_names.clone(),
                Arc::new(Mutex::new(matcher)),
                Arc::clone(&ignored),
                Arc::clone(&loaded),
            ));
        }

        let mut builder = AggregateTreeBuilder::new(&root);
        let mut stats = ScanStats::new();

        let mut ingest = |record: TraversalRecord| -> Result<(), ScanError> {
            if let Some(error) = &record.error {
                trace!(path = %record.path.display(), kind = ?error.kind, "entry error");
            }

            inspect(&record);
            stats.record(&record);
            builder.ingest(&record)?;

            if stats.total_items() % PROGRESS_INTERVAL == 0 {
                debug!(
                    files = stats.files_scanned,
                    dirs = stats.dirs_scanned,
                    errors = stats.errors_count,
                    current = %record.path.display(),
                    "scan progress"
                );
            }
            Ok(())
        };

        // Directory currently being listed at each depth. Entry errors
        // without a path are charged to the directory one level up.
        let mut open_dirs: Vec<PathBuf> = Vec::new();

        for entry_result in walker {
            match entry_result {
                Ok(entry) => {
                    let path = entry.path();
                    if entry.depth() == 0 {
                        if let Some(err) = &entry.read_children_error {
                            return Err(root_error(&root, err));
                        }
                    }
                    if entry.file_type().is_dir() {
                        open_dirs.truncate(entry.depth());
                        open_dirs.push(path.clone());
                    }

                    ingest(entry_record(&entry))?;
                    if let Some(err) = &entry.read_children_error {
                        let error = walk_error(err, &path, ErrorKind::ReadError);
                        ingest(TraversalRecord::failed(path, EntryKind::Directory, error))?;
                    }
                }
                Err(err) => {
                    if err.depth() == 0 {
                        return Err(root_error(&root, &err));
                    }
                    let record = match err.path() {
                        // Counted on the directory that listed the entry.
                        Some(path) => {
                            let error = walk_error(&err, path, ErrorKind::ReadError);
                            TraversalRecord::failed(path, EntryKind::File, error)
                        }
                        None => {
                            let dir = listing_dir(&open_dirs, err.depth(), &walk_root);
                            let error = walk_error(&err, dir, ErrorKind::ReadError);
                            TraversalRecord::failed(dir, EntryKind::Directory, error)
                        }
                    };
                    ingest(record)?;
                }
            }
        }

        stats.ignored_count = ignored.load(Ordering::Relaxed);
        stats.ignore_files_loaded = loaded.load(Ordering::Relaxed);
        stats.elapsed = start.elapsed();

        let tree = builder.finish();
        debug!(
            aggregates = tree.len(),
            entries = stats.total_items(),
            ignored = stats.ignored_count,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "scan finished"
        );

        Ok(ScanResult {
            tree,
            root_path: root,
            stats,
        })
    }

    /// Matcher holding the patterns configured for the whole tree.
    fn root_matcher(&self, config: &ScanConfig) -> Result<IgnoreMatcher, ScanError> {
        let mut matcher = IgnoreMatcher::new();
        if !config.ignore_patterns.is_empty() {
            let set = GitignoreSet::from_lines(&config.ignore_patterns).map_err(|e| {
                ScanError::InvalidConfig {
                    message: format!("invalid ignore pattern: {e}"),
                }
            })?;
            matcher.register(Path::new(""), set);
        }
        Ok(matcher)
    }
}

type Children = Vec<jwalk::Result<DirEntry<((), ())>>>;

/// Build the `process_read_dir` hook: load the directory's ignore files, then
/// drop children the matcher rejects.
fn prune_ignored(
    walk_root: PathBuf,
    ignore_file_names: Vec<String>,
    matcher: Arc<Mutex<IgnoreMatcher>>,
    ignored: Arc<AtomicU64>,
    loaded: Arc<AtomicU64>,
) -> impl Fn(Option<usize>, &Path, &mut (), &mut Children) + Send + Sync + 'static {
    move |_depth, dir, _state, children| {
        let Ok(relative_dir) = dir.strip_prefix(&walk_root) else {
            return;
        };
        // The walk is serial, so a poisoned lock only means an earlier hook
        // panicked; the trie itself is still usable.
        let mut matcher = matcher.lock().unwrap_or_else(PoisonError::into_inner);

        for name in &ignore_file_names {
            let file = dir.join(name);
            if !file.is_file() {
                continue;
            }
            match GitignoreSet::from_file(dir, &file) {
                Ok(set) => {
                    trace!(path = %file.display(), rules = set.len(), "loaded ignore file");
                    matcher.register(relative_dir, set);
                    loaded.fetch_add(1, Ordering::Relaxed);
                }
                Err(err) => warn!(path = %file.display(), "failed to load ignore file: {err}"),
            }
        }

        if matcher.is_empty() {
            return;
        }

        children.retain(|child| {
            let Ok(entry) = child else {
                return true;
            };
            let path = entry.path();
            let Ok(relative) = path.strip_prefix(&walk_root) else {
                return true;
            };
            let keep = !matcher.matches(relative, entry.file_type().is_dir());
            if !keep {
                trace!(path = %path.display(), "ignored");
                ignored.fetch_add(1, Ordering::Relaxed);
            }
            keep
        });
    }
}

/// Convert a visited entry into a traversal record.
fn entry_record(entry: &DirEntry<((), ())>) -> TraversalRecord {
    let path = entry.path();
    if entry.file_type().is_dir() {
        return TraversalRecord::directory(path);
    }

    match entry.metadata() {
        Ok(metadata) => TraversalRecord::file(path, metadata.len()),
        Err(err) => {
            let error = walk_error(&err, &path, ErrorKind::MetadataError);
            TraversalRecord::failed(path, EntryKind::File, error)
        }
    }
}

/// Directory that was being listed when an entry at `depth` failed.
fn listing_dir<'a>(open_dirs: &'a [PathBuf], depth: usize, walk_root: &'a Path) -> &'a Path {
    depth
        .checked_sub(1)
        .and_then(|parent| open_dirs.get(parent))
        .map_or(walk_root, PathBuf::as_path)
}

/// A failure on the root itself aborts the scan.
fn root_error(root: &Path, err: &jwalk::Error) -> ScanError {
    match err.io_error() {
        Some(io) => ScanError::io(root, std::io::Error::new(io.kind(), io.to_string())),
        None => ScanError::io(root, std::io::Error::other(err.to_string())),
    }
}

fn walk_error(err: &jwalk::Error, path: &Path, fallback: ErrorKind) -> EntryError {
    if err.loop_ancestor().is_some() {
        return EntryError::new(path, err.to_string(), ErrorKind::SymlinkLoop);
    }
    match err.io_error() {
        Some(io) => EntryError::from_io(path, io, fallback),
        None => EntryError::new(path, err.to_string(), fallback),
    }
}
