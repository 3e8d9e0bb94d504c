use rstat_scan::{
    GitignoreSet, IgnoreMatcher, IgnoreVerdict, JwalkScanner, ScanConfig, ScanError, ScanTarget,
    TraversalRecord,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn gitignore(lines: &[&str]) -> GitignoreSet {
    GitignoreSet::from_lines(lines).unwrap()
}

/// project/
///   .gitignore        -> "target/"
///   Cargo.toml
///   target/debug/app  (ignored)
///   src/main.rs
///   src/gen/.gitignore -> "*.rs"
///   src/gen/out.rs    (ignored)
///   src/gen/keep.txt
///   logs/run.log
fn create_project() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    fs::create_dir_all(root.join("target/debug")).unwrap();
    fs::create_dir_all(root.join("src/gen")).unwrap();
    fs::create_dir_all(root.join("logs")).unwrap();

    fs::write(root.join(".gitignore"), "target/\n").unwrap();
    fs::write(root.join("Cargo.toml"), "[package]\n").unwrap();
    fs::write(root.join("target/debug/app"), vec![0u8; 4096]).unwrap();
    fs::write(root.join("src/main.rs"), "fn main() {}\n").unwrap();
    fs::write(root.join("src/gen/.gitignore"), "*.rs\n").unwrap();
    fs::write(root.join("src/gen/out.rs"), "// generated\n").unwrap();
    fs::write(root.join("src/gen/keep.txt"), "keep").unwrap();
    fs::write(root.join("logs/run.log"), "started\n").unwrap();

    temp
}

fn gitignore_config(root: &Path) -> ScanConfig {
    ScanConfig::builder()
        .root(root)
        .ignore_file_names(vec![".gitignore".to_string()])
        .build()
        .unwrap()
}

#[test]
fn test_matcher_cascade() {
    let mut matcher = IgnoreMatcher::new();
    matcher.register(Path::new(""), gitignore(&["*.tmp"]));
    matcher.register(Path::new("a/b"), gitignore(&["*.log"]));

    // Root-level rules apply at any depth.
    assert!(matcher.matches(Path::new("x.tmp"), false));
    assert!(matcher.matches(Path::new("a/b/c/d/x.tmp"), false));

    // Nested rules only apply below their directory.
    assert!(matcher.matches(Path::new("a/b/x.log"), false));
    assert!(!matcher.matches(Path::new("a/c/x.log"), false));
    assert!(!matcher.matches(Path::new("x.log"), false));
}

#[test]
fn test_matcher_verdicts() {
    let mut matcher = IgnoreMatcher::new();
    matcher.register(Path::new("a"), gitignore(&["skip"]));
    matcher.register(Path::new("a/b"), gitignore(&["*.log"]));

    assert_eq!(
        matcher.verdict(Path::new("a/skip"), false),
        IgnoreVerdict::Ignored { level: 1 }
    );
    assert_eq!(
        matcher.verdict(Path::new("a/b/x.log"), false),
        IgnoreVerdict::Ignored { level: 2 }
    );
    assert_eq!(
        matcher.verdict(Path::new("z/x.log"), false),
        IgnoreVerdict::NoDeeperRules { level: 0 }
    );
    // The directory's own rules do not apply to the directory itself.
    assert_eq!(matcher.verdict(Path::new("a/b"), true), IgnoreVerdict::Exhausted);
}

#[test]
fn test_matcher_shallow_match_wins() {
    let mut matcher = IgnoreMatcher::new();
    matcher.register(Path::new(""), |path: &Path, _is_dir: bool| path.starts_with("vendor"));
    matcher.register(
        Path::new("vendor/lib"),
        |_: &Path, _: bool| -> bool { panic!("deeper rules must not be consulted") },
    );

    assert_eq!(
        matcher.verdict(Path::new("vendor/lib/x.c"), false),
        IgnoreVerdict::Ignored { level: 0 }
    );
}

#[test]
fn test_scan_honours_nested_gitignores() {
    let temp = create_project();
    let result = JwalkScanner::new().scan(&gitignore_config(temp.path())).unwrap();
    let tree = &result.tree;

    assert!(tree.find(&temp.path().join("target")).is_none());
    assert!(tree.find(&temp.path().join("target/debug")).is_none());

    let gen_dir = tree.find(&temp.path().join("src/gen")).unwrap();
    // .gitignore and keep.txt
    assert_eq!(gen_dir.counts.files, 2);

    let root = tree.root();
    // .gitignore, Cargo.toml, main.rs, gen/.gitignore, keep.txt, run.log
    assert_eq!(root.counts.files, 6);
    // root, src, src/gen, logs
    assert_eq!(root.counts.dirs, 4);
    assert_eq!(result.stats.ignore_files_loaded, 2);
    // target/ and out.rs
    assert_eq!(result.stats.ignored_count, 2);
}

#[test]
fn test_scan_without_ignores_sees_everything() {
    let temp = create_project();
    let result = JwalkScanner::new().scan(&ScanConfig::new(temp.path())).unwrap();
    let root = result.tree.root();

    assert_eq!(root.counts.files, 8);
    assert_eq!(root.counts.dirs, 6);
    assert!(root.counts.bytes >= 4096);
    assert_eq!(result.stats.ignored_count, 0);
}

#[test]
fn test_exclude_pattern_matches_at_depth() {
    let temp = create_project();
    let config = ScanConfig::builder()
        .root(temp.path())
        .ignore_patterns(vec!["*.log".to_string(), "*.rs".to_string()])
        .build()
        .unwrap();

    let result = JwalkScanner::new().scan(&config).unwrap();
    let logs = result.tree.find(&temp.path().join("logs")).unwrap();
    let src = result.tree.find(&temp.path().join("src")).unwrap();

    assert_eq!(logs.counts.files, 0);
    assert_eq!(logs.counts.dirs, 1);
    // gen/.gitignore and keep.txt
    assert_eq!(src.counts.files, 2);
}

#[test]
fn test_records_are_consistent_with_tree() {
    let temp = create_project();
    let mut records: Vec<TraversalRecord> = Vec::new();
    let result = JwalkScanner::new()
        .scan_with(&gitignore_config(temp.path()), |record| records.push(record.clone()))
        .unwrap();

    let root = result.tree.root();
    let bytes: u64 = records.iter().filter(|r| r.error.is_none()).map(|r| r.size).sum();
    assert_eq!(root.counts.bytes, bytes);
    assert_eq!(root.counts.files + root.counts.dirs, records.len() as u64);
    assert!(records.iter().all(|r| r.path.starts_with(temp.path())));
}

#[test]
fn test_file_root_is_rejected() {
    let temp = create_project();
    let config = ScanConfig::new(temp.path().join("Cargo.toml"));

    let err = JwalkScanner::new().scan(&config).unwrap_err();
    assert!(matches!(err, ScanError::NotADirectory { .. }));
}

#[test]
fn test_target_resolution() {
    let cwd = Path::new("/home/user");

    let default = ScanTarget::resolve(cwd, None);
    assert_eq!(default.root, PathBuf::from("/home/user"));
    assert!(!default.follow_root_symlink);

    let relative = ScanTarget::resolve(cwd, Some(Path::new("../other/./data/")));
    assert_eq!(relative.root, PathBuf::from("/home/other/data"));
    assert!(relative.follow_root_symlink);

    let absolute = ScanTarget::resolve(cwd, Some(Path::new("/var/log")));
    assert_eq!(absolute.root, PathBuf::from("/var/log"));
    assert!(!absolute.follow_root_symlink);
}
