//! Resolution of the scan root from the command line.

use std::path::{Component, Path, PathBuf, is_separator};

/// Scan root derived from the working directory and an optional argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanTarget {
    /// Absolute, lexically cleaned root path.
    pub root: PathBuf,
    /// The argument ended in a separator; a symlinked root should be followed.
    pub follow_root_symlink: bool,
}

impl ScanTarget {
    /// Resolve `arg` against `cwd`. Without an argument the working directory is scanned.
    pub fn resolve(cwd: &Path, arg: Option<&Path>) -> Self {
        match arg {
            None => Self {
                root: clean(cwd),
                follow_root_symlink: false,
            },
            Some(arg) => Self {
                root: clean(&cwd.join(arg)),
                follow_root_symlink: arg.to_string_lossy().ends_with(is_separator),
            },
        }
    }

    /// Path handed to the walker. Keeps a trailing separator when the root
    /// symlink should be resolved.
    pub fn walk_path(root: &Path, follow_root_symlink: bool) -> PathBuf {
        let mut path = root.as_os_str().to_owned();
        if follow_root_symlink && !path.to_string_lossy().ends_with(is_separator) {
            path.push(std::path::MAIN_SEPARATOR_STR);
        }
        PathBuf::from(path)
    }
}

/// Lexically normalize a path: drop `.` segments and fold `..` into its parent.
pub fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}
