//! Log collection for a single sweep directory.
//!
//! Benchmark logs are named `<anything>prompt-<P>-concurrency-<C>.log`. Each
//! matching file in the directory becomes one [`MetricRecord`] once its
//! metrics pass extraction. Files that fail any step are skipped and reported
//! without stopping the scan.

use crate::extract::{self, LogMetrics, Skip};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static FILENAME_PARAMS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"prompt-(\d+)-concurrency-(\d+)\.log").unwrap());

/// One benchmark run: filename parameters plus the metrics read from its log.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    pub filename: String,
    pub prompt_length: u64,
    pub concurrency: u64,
    pub ttft: Option<f64>,
    pub itl: Option<f64>,
    pub request_throughput: Option<f64>,
    pub token_throughput: Option<f64>,
    /// `request_throughput * prompt_length`; absent when the request rate is.
    pub prefill_throughput: Option<f64>,
}

impl MetricRecord {
    pub fn new(
        filename: impl Into<String>,
        prompt_length: u64,
        concurrency: u64,
        metrics: LogMetrics,
    ) -> Self {
        let prefill_throughput = metrics
            .request_throughput
            .map(|rps| rps * prompt_length as f64);
        Self {
            filename: filename.into(),
            prompt_length,
            concurrency,
            ttft: metrics.ttft,
            itl: metrics.itl,
            request_throughput: metrics.request_throughput,
            token_throughput: metrics.token_throughput,
            prefill_throughput,
        }
    }
}

/// Result of scanning one directory.
#[derive(Debug, Default)]
pub struct Collection {
    pub records: Vec<MetricRecord>,
    pub skipped: Vec<Skip>,
}

/// Cheap pre-filter applied before the filename pattern.
pub fn is_candidate_log(filename: &str) -> bool {
    filename.ends_with(".log") && filename.contains("prompt-") && filename.contains("concurrency-")
}

/// Pull `(prompt_length, concurrency)` out of a log filename.
///
/// e.g. `a100-2gpu-llama-70b-prompt-128-concurrency-1.log` -> `(128, 1)`.
/// Zero or overflowing values are treated as unrecognized.
pub fn params_from_filename(filename: &str) -> Option<(u64, u64)> {
    let caps = FILENAME_PARAMS.captures(filename)?;
    let prompt_length: u64 = caps.get(1)?.as_str().parse().ok()?;
    let concurrency: u64 = caps.get(2)?.as_str().parse().ok()?;
    if prompt_length == 0 || concurrency == 0 {
        return None;
    }
    Some((prompt_length, concurrency))
}

/// Scan the immediate entries of `dir` and build records for every usable log.
///
/// Entries are visited in name order. An unreadable directory yields an
/// empty collection.
pub fn collect_records(dir: &Path) -> Collection {
    let mut collection = Collection::default();

    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            tracing::warn!(
                error = %e,
                dir = %dir.display(),
                "failed to read results directory"
            );
            return collection;
        }
    };

    // Non-UTF-8 names are matched on their lossy form but read through the
    // real path.
    let mut logs: Vec<(String, PathBuf)> = entries
        .flatten()
        .filter_map(|entry| {
            let raw = entry.file_name();
            let name = raw.to_string_lossy().into_owned();
            if raw.to_str().is_none() {
                tracing::warn!(
                    file = %name,
                    dir = %dir.display(),
                    "file name is not valid UTF-8"
                );
            }
            is_candidate_log(&name).then(|| (name, entry.path()))
        })
        .collect();
    logs.sort();

    for (filename, path) in logs {
        let Some((prompt_length, concurrency)) = params_from_filename(&filename) else {
            tracing::warn!(
                file = %filename,
                "skipping file, name format unrecognized"
            );
            collection.skipped.push(Skip::UnrecognizedName { filename });
            continue;
        };

        match extract::parse_log_file(&path) {
            Ok(metrics) => {
                tracing::debug!(
                    file = %filename,
                    prompt_length,
                    concurrency,
                    "parsed log file"
                );
                collection.records.push(MetricRecord::new(
                    filename,
                    prompt_length,
                    concurrency,
                    metrics,
                ));
            }
            // Already logged by the extractor.
            Err(skip) => collection.skipped.push(skip),
        }
    }

    tracing::info!(
        count = collection.records.len(),
        dir = %dir.display(),
        "found and processed {} log files",
        collection.records.len()
    );

    collection
}
