//! Results-tree driver: find every sweep directory under the base directory
//! and produce its latency and throughput charts.
//!
//! Expected layout (only the leaf names matter):
//!
//! ```text
//! bench_results/
//!   output_128/
//!     prompt_sweep/        *-prompt-<P>-concurrency-1.log
//!     concurrency_sweep/   *-prompt-128-concurrency-<C>.log
//! ```

use crate::chart::{self, ChartRenderer, ChartSpec};
use crate::collect::{self, MetricRecord};
use crate::config::ThroughputMode;
use crate::extract::Skip;
use crate::sweep::{self, ChartTitles, SweepKind, SweepSpec};
use std::path::{Path, PathBuf};

pub const LATENCY_FILE: &str = "latency_plot.png";
pub const THROUGHPUT_FILE: &str = "throughput_plot.png";

/// Resolved run settings (config file merged with CLI overrides).
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub base_dir: PathBuf,
    pub model_name: Option<String>,
    pub throughput_mode: ThroughputMode,
    pub include_long_prompt: bool,
}

/// What happened in one sweep directory.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectoryReport {
    pub path: PathBuf,
    pub sweep: SweepKind,
    pub records: usize,
    pub skipped: Vec<Skip>,
    /// Charts successfully written, in render order.
    pub charts: Vec<PathBuf>,
    /// Charts that failed to render.
    pub failures: usize,
}

/// Per-directory reports for a whole run, in walk order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub directories: Vec<DirectoryReport>,
}

impl RunSummary {
    pub fn charts_written(&self) -> usize {
        self.directories.iter().map(|d| d.charts.len()).sum()
    }

    pub fn render_failures(&self) -> usize {
        self.directories.iter().map(|d| d.failures).sum()
    }

    /// Sweep directories that had no usable logs.
    pub fn empty_directories(&self) -> impl Iterator<Item = &DirectoryReport> {
        self.directories.iter().filter(|d| d.records == 0)
    }
}

/// Fatal driver errors. Everything else is logged and skipped.
#[derive(Debug)]
pub enum DriverError {
    MissingRoot { path: PathBuf },
}

impl std::fmt::Display for DriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DriverError::MissingRoot { path } => write!(
                f,
                "base directory '{}' not found. Did you run the benchmark script?",
                path.display()
            ),
        }
    }
}

impl std::error::Error for DriverError {}

/// Walk `settings.base_dir` and chart every recognized sweep directory.
pub fn run(settings: &Settings, renderer: &dyn ChartRenderer) -> Result<RunSummary, DriverError> {
    let root = &settings.base_dir;
    if !root.is_dir() {
        return Err(DriverError::MissingRoot { path: root.clone() });
    }

    let mut summary = RunSummary::default();
    for dir in walk_dirs(root) {
        let Some(spec) = SweepSpec::for_dir(&dir, settings.include_long_prompt) else {
            continue;
        };
        summary
            .directories
            .push(process_directory(settings, renderer, &dir, &spec));
    }

    tracing::info!(
        directories = summary.directories.len(),
        charts = summary.charts_written(),
        failures = summary.render_failures(),
        "run complete"
    );
    Ok(summary)
}

/// All directories under `root`, top-down, `root` first, siblings in name
/// order. Symlinked directories are not followed.
pub fn walk_dirs(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let entries = match std::fs::read_dir(&dir) {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(error = %e, dir = %dir.display(), "failed to read directory");
                out.push(dir);
                continue;
            }
        };

        let mut children: Vec<PathBuf> = entries
            .flatten()
            .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .map(|entry| entry.path())
            .collect();
        children.sort();

        out.push(dir);
        // Reverse so the smallest name is popped first.
        stack.extend(children.into_iter().rev());
    }

    out
}

fn process_directory(
    settings: &Settings,
    renderer: &dyn ChartRenderer,
    dir: &Path,
    spec: &SweepSpec,
) -> DirectoryReport {
    tracing::info!(dir = %dir.display(), "processing results");

    let collection = collect::collect_records(dir);
    let mut report = DirectoryReport {
        path: dir.to_path_buf(),
        sweep: spec.kind,
        records: collection.records.len(),
        skipped: collection.skipped,
        charts: Vec::new(),
        failures: 0,
    };

    if collection.records.is_empty() {
        tracing::warn!(dir = %dir.display(), "no data found, skipping charts");
        return report;
    }

    for record in &collection.records {
        tracing::debug!(
            file = %record.filename,
            x = spec.x_field.value(record),
            ttft = ?record.ttft,
            itl = ?record.itl,
            request_throughput = ?record.request_throughput,
            token_throughput = ?record.token_throughput,
            "collected record"
        );
    }

    for chart_spec in build_charts(settings, dir, spec, &collection.records) {
        match renderer.render(&chart_spec) {
            Ok(()) => report.charts.push(chart_spec.output),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    path = %chart_spec.output.display(),
                    "failed to render chart"
                );
                report.failures += 1;
            }
        }
    }

    report
}

/// Latency and throughput chart specs for one sweep directory.
pub fn build_charts(
    settings: &Settings,
    dir: &Path,
    spec: &SweepSpec,
    records: &[MetricRecord],
) -> Vec<ChartSpec> {
    let output_len = sweep::output_len_label(&settings.base_dir, dir);
    let titles = ChartTitles::build(
        spec,
        output_len.as_deref(),
        settings.model_name.as_deref(),
        records,
    );

    let latency = chart::latency_chart(
        records,
        &titles.latency,
        spec.x_field,
        &spec.x_label,
        &dir.join(LATENCY_FILE),
    );
    let throughput = chart::throughput_chart(
        records,
        &titles.throughput,
        spec.x_field,
        &spec.x_label,
        &dir.join(THROUGHPUT_FILE),
        settings.throughput_mode,
    );

    latency.into_iter().chain(throughput).collect()
}
