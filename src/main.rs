//! rstat - summarize where a directory tree's bulk lives.
//!
//! Usage:
//!   rstat [PATH]                  Summarize PATH (defaults to current directory)
//!   rstat PATH/                   Follow PATH if it is a symlink to a directory
//!   rstat -e '*.o' [PATH]         Skip entries matching a gitignore pattern
//!   rstat -i .gitignore [PATH]    Honour per-directory ignore files
//!   rstat -f json [PATH]          Print the report as JSON
//!   rstat --help                  Show help

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use color_eyre::Section;
use color_eyre::eyre::{Context, Report as EyreReport, Result};
use crossterm::style::Stylize;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;
use unicode_width::UnicodeWidthStr;

use rstat_analyze::{Column, GreedySelector, Report, ReportRow, ScoreComputer, format_bytes};
use rstat_core::{ScanError, ScoreConfig};
use rstat_scan::{JwalkScanner, ScanConfig, ScanTarget};

#[derive(Parser)]
#[command(
    name = "rstat",
    version,
    about = "Summarize a directory tree by its disproportionately large subdirectories",
    long_about = "rstat walks a directory tree once and reports the few directories that \
                  account for an outsized share of its entries, bytes or errors.\n\n\
                  A directory is never listed together with a subdirectory that already \
                  explains it."
)]
struct Cli {
    /// Directory to summarize (defaults to current directory). A trailing
    /// separator follows a symlinked root.
    path: Option<PathBuf>,

    /// Skip entries matching this gitignore-style pattern (repeatable)
    #[arg(short, long = "exclude", value_name = "PATTERN")]
    exclude: Vec<String>,

    /// Honour per-directory ignore files with this name, e.g. .gitignore (repeatable)
    #[arg(short = 'i', long = "ignore-file", value_name = "NAME")]
    ignore_files: Vec<String>,

    /// Do not descend into hidden entries
    #[arg(long)]
    skip_hidden: bool,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = Cli::parse();

    let cwd = std::env::current_dir().context("Cannot resolve the working directory")?;
    let target = ScanTarget::resolve(&cwd, cli.path.as_deref());

    let config = ScanConfig::builder()
        .root(target.root.clone())
        .follow_root_symlink(target.follow_root_symlink)
        .include_hidden(!cli.skip_hidden)
        .ignore_patterns(cli.exclude)
        .ignore_file_names(cli.ignore_files)
        .build()
        .context("Invalid scan configuration")?;

    let report = run_scan(&config)?;

    for callout in &report.errors {
        let first = callout
            .first_error
            .as_ref()
            .map_or_else(|| "unknown".to_string(), ToString::to_string);
        warn!(
            "Encountered {} errors within {:?}. First error: {first}",
            callout.count, callout.path
        );
    }

    match cli.format {
        OutputFormat::Text => {
            let stdout = io::stdout();
            let color = stdout.is_terminal() && std::env::var_os("NO_COLOR").is_none();
            render_table(&report, color, &mut stdout.lock())?;
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

/// Scan the configured root and build the report.
fn run_scan(config: &ScanConfig) -> Result<Report> {
    let result = match JwalkScanner::new().scan(config) {
        Ok(result) => result,
        Err(err @ ScanError::NotADirectory { .. }) if config.root.is_symlink() => {
            return Err(EyreReport::new(err)).suggestion(
                "The root is a symbolic link; add a trailing separator to scan its target",
            );
        }
        Err(err) => {
            return Err(err).with_context(|| format!("Failed to scan {}", config.root.display()));
        }
    };

    debug!(
        entries = result.stats.total_items(),
        ignored = result.stats.ignored_count,
        per_second = result.stats.entries_per_second() as u64,
        "scanned {}",
        result.root_path.display()
    );

    let score_config = ScoreConfig::default();
    let scorer = ScoreComputer::new(result.tree.root(), &score_config);
    let selection = GreedySelector::new(&score_config).select(&result.tree, &scorer);

    Ok(Report::build(&result.tree, &selection, &scorer))
}

/// Install the stderr log subscriber. `RSTAT_LOG` overrides the default level.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("RSTAT_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .with_target(false)
        .init();
}

/// A table cell with and without terminal styling.
struct Cell {
    plain: String,
    styled: String,
}

impl Cell {
    fn plain(text: &str) -> Self {
        Self {
            plain: text.to_string(),
            styled: text.to_string(),
        }
    }

    fn width(&self) -> usize {
        self.plain.width()
    }

    fn text(&self, color: bool) -> &str {
        if color { &self.styled } else { &self.plain }
    }
}

fn label_cell(row: &ReportRow) -> Cell {
    let label = row.label.as_str();
    if row.is_total {
        Cell {
            plain: format!("{label} (total)"),
            styled: format!("{} {}", label.green(), "(total)".dim()),
        }
    } else {
        Cell {
            plain: label.to_string(),
            styled: label.green().to_string(),
        }
    }
}

fn number_cell(text: String, column: &Column) -> Cell {
    match column.percent {
        Some(percent) => {
            let percent = format!("{percent:>4.0}%");
            Cell {
                plain: format!(" {text}{percent} "),
                styled: format!(" {}{} ", text.as_str().cyan(), percent.as_str().dim()),
            }
        }
        None => Cell {
            plain: format!(" {text}      "),
            styled: format!(" {}      ", text.as_str().cyan()),
        },
    }
}

fn table_row(row: &ReportRow) -> [Cell; 4] {
    [
        label_cell(row),
        number_cell(row.dirs.value.to_string(), &row.dirs),
        number_cell(row.files.value.to_string(), &row.files),
        number_cell(format_bytes(row.bytes.value), &row.bytes),
    ]
}

/// Print the summary table. The header is centred, labels are left-aligned
/// and numbers right-aligned.
fn render_table(report: &Report, color: bool, out: &mut impl Write) -> io::Result<()> {
    let mut rows = vec![["", "Dirs", "Files", "Bytes"].map(Cell::plain)];
    rows.extend(report.rows.iter().map(table_row));

    let mut widths = [0usize; 4];
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.width());
        }
    }

    for (row_num, row) in rows.iter().enumerate() {
        let mut line = String::new();
        for (col, (cell, width)) in row.iter().zip(widths).enumerate() {
            let pad = width - cell.width();
            let (left, right) = match (row_num, col) {
                (0, _) => (pad / 2, pad - pad / 2),
                (_, 0) => (0, pad),
                _ => (pad, 0),
            };
            line.push(' ');
            line.push_str(&" ".repeat(left));
            line.push_str(cell.text(color));
            line.push_str(&" ".repeat(right));
        }
        writeln!(out, "{line}")?;
    }
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(label: &str, is_total: bool, bytes: u64, percent: Option<f64>) -> ReportRow {
        ReportRow {
            label: label.to_string(),
            is_total,
            score: 1.0,
            dirs: Column { value: 3, percent: None },
            files: Column { value: 12, percent: None },
            bytes: Column { value: bytes, percent },
        }
    }

    #[test]
    fn test_render_table_plain() {
        let report = Report {
            rows: vec![
                row("/data", true, 20_000_000, None),
                row("/data/big", false, 19_500_000, Some(97.4)),
            ],
            errors: Vec::new(),
        };

        let mut out = Vec::new();
        render_table(&report, false, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with(" /data (total)"));
        assert!(lines[2].starts_with(" /data/big "));
        assert!(lines[2].contains("19.5M  97% "));
        assert!(lines[1].contains(" 20.0M      "));
        // Every row has the same visible width.
        let width = lines[0].width();
        assert!(lines[1..3].iter().all(|l| l.width() == width));
    }

    #[test]
    fn test_number_cell_widths_match() {
        let with = number_cell("10".to_string(), &Column { value: 10, percent: Some(50.0) });
        let without = number_cell("10".to_string(), &Column { value: 10, percent: None });
        assert_eq!(with.width(), without.width());
    }

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::try_parse_from(["rstat", "-e", "*.o", "-i", ".gitignore", "--skip-hidden", "-f", "json", "some/dir/"])
            .unwrap();
        assert_eq!(cli.path, Some(PathBuf::from("some/dir/")));
        assert_eq!(cli.exclude, vec!["*.o".to_string()]);
        assert_eq!(cli.ignore_files, vec![".gitignore".to_string()]);
        assert!(cli.skip_hidden);
        assert!(matches!(cli.format, OutputFormat::Json));
    }
}
