//! Scan and scoring configuration types.

use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Configuration for the traversal pass.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanConfig {
    /// Root path to scan. Labels in the report are relative to this path.
    pub root: PathBuf,

    /// Walk the root with a trailing separator so a symlinked root is followed.
    #[builder(default = "false")]
    #[serde(default)]
    pub follow_root_symlink: bool,

    /// Include hidden files (starting with .).
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub include_hidden: bool,

    /// Patterns to ignore everywhere below the root (gitignore syntax).
    #[builder(default)]
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Per-directory ignore files to honour, e.g. `.gitignore`.
    #[builder(default)]
    #[serde(default)]
    pub ignore_file_names: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl ScanConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref root) = self.root {
            if root.as_os_str().is_empty() {
                return Err("Root path cannot be empty".to_string());
            }
        } else {
            return Err("Root path is required".to_string());
        }
        if let Some(ref names) = self.ignore_file_names {
            if let Some(bad) = names.iter().find(|n| n.is_empty() || n.contains(['/', '\\'])) {
                return Err(format!("Invalid ignore file name: {bad:?}"));
            }
        }
        Ok(())
    }
}

impl ScanConfig {
    /// Create a new scan config builder.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Create a simple config for scanning a path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            follow_root_symlink: false,
            include_hidden: true,
            ignore_patterns: Vec::new(),
            ignore_file_names: Vec::new(),
        }
    }

    /// Check if a file name is an ignore file this scan honours.
    pub fn is_ignore_file(&self, name: &str) -> bool {
        self.ignore_file_names.iter().any(|n| n == name)
    }

    /// Check if any ignore rules are configured.
    pub fn uses_ignores(&self) -> bool {
        !self.ignore_patterns.is_empty() || !self.ignore_file_names.is_empty()
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new(".")
    }
}

/// Thresholds for scoring and selecting interesting directories.
///
/// The floors keep small trees from producing inflated ratios: the root's
/// totals are clamped up to them before being used as the denominator.
#[derive(Debug, Clone, Builder, Serialize, Deserialize, PartialEq)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScoreConfig {
    /// Minimum directory count used for normalization.
    #[builder(default = "256")]
    #[serde(default = "default_min_dirs")]
    pub min_dirs: u64,

    /// Minimum error count used for normalization.
    #[builder(default = "1")]
    #[serde(default = "default_min_errors")]
    pub min_errors: u64,

    /// Minimum file count used for normalization.
    #[builder(default = "1024")]
    #[serde(default = "default_min_files")]
    pub min_files: u64,

    /// Minimum byte count used for normalization (10 MiB).
    #[builder(default = "10 * 1024 * 1024")]
    #[serde(default = "default_min_bytes")]
    pub min_bytes: u64,

    /// Weight applied to a candidate's best descendant score.
    #[builder(default = "1.5")]
    #[serde(default = "default_specificity_preference")]
    pub specificity_preference: f64,

    /// Scores at or above this are candidates; adjusted scores must exceed it.
    #[builder(default = "0.05")]
    #[serde(default = "default_interestingness_threshold")]
    pub interestingness_threshold: f64,
}

fn default_min_dirs() -> u64 {
    256
}

fn default_min_errors() -> u64 {
    1
}

fn default_min_files() -> u64 {
    1024
}

fn default_min_bytes() -> u64 {
    10 * 1024 * 1024
}

fn default_specificity_preference() -> f64 {
    1.5
}

fn default_interestingness_threshold() -> f64 {
    0.05
}

impl ScoreConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        let floors = [
            ("min_dirs", self.min_dirs),
            ("min_errors", self.min_errors),
            ("min_files", self.min_files),
            ("min_bytes", self.min_bytes),
        ];
        for (name, value) in floors {
            if value == Some(0) {
                return Err(format!("{name} must be at least 1"));
            }
        }
        if let Some(weight) = self.specificity_preference {
            if !weight.is_finite() || weight < 0.0 {
                return Err(format!("specificity_preference must be a non-negative number, got {weight}"));
            }
        }
        if let Some(threshold) = self.interestingness_threshold {
            if !threshold.is_finite() || threshold < 0.0 {
                return Err(format!("interestingness_threshold must be a non-negative number, got {threshold}"));
            }
        }
        Ok(())
    }
}

impl ScoreConfig {
    /// Create a new score config builder.
    pub fn builder() -> ScoreConfigBuilder {
        ScoreConfigBuilder::default()
    }
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            min_dirs: default_min_dirs(),
            min_errors: default_min_errors(),
            min_files: default_min_files(),
            min_bytes: default_min_bytes(),
            specificity_preference: default_specificity_preference(),
            interestingness_threshold: default_interestingness_threshold(),
        }
    }
}
