/// Metric extraction: scan a benchmark log for the summary lines printed at
/// the end of a serving benchmark run.
///
/// Looks for lines like:
/// - `Mean TTFT (ms):                          123.45`
/// - `Mean ITL (ms):                           12.34`
/// - `Request throughput (req/s):              4.56`
/// - `Output token throughput (tok/s):         789.01`
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

// `\d+\.?\d+` needs at least two digits: a lone "5" is not a match.
static TTFT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Mean TTFT \(ms\):[ ]*(\d+\.?\d+)").unwrap());
static ITL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Mean ITL \(ms\):[ ]*(\d+\.?\d+)").unwrap());
static REQUEST_THROUGHPUT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Request throughput \(req/s\):[ ]*(\d+\.?\d+)").unwrap());
static TOKEN_THROUGHPUT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Output token throughput \(tok/s\):[ ]*(\d+\.?\d+)").unwrap()
});

/// Metrics pulled out of a single log file. Each field is independent.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LogMetrics {
    pub ttft: Option<f64>,
    pub itl: Option<f64>,
    pub request_throughput: Option<f64>,
    pub token_throughput: Option<f64>,
}

impl LogMetrics {
    /// Run all four searches over `text`, keeping the first match of each.
    pub fn from_text(text: &str) -> Self {
        Self {
            ttft: first_number(&TTFT, text),
            itl: first_number(&ITL, text),
            request_throughput: first_number(&REQUEST_THROUGHPUT, text),
            token_throughput: first_number(&TOKEN_THROUGHPUT, text),
        }
    }

    pub fn has_latency(&self) -> bool {
        self.ttft.is_some() || self.itl.is_some()
    }

    pub fn has_throughput(&self) -> bool {
        self.request_throughput.is_some() || self.token_throughput.is_some()
    }

    /// A log is usable only with at least one latency and one throughput metric.
    pub fn is_complete(&self) -> bool {
        self.has_latency() && self.has_throughput()
    }
}

fn first_number(pattern: &Regex, text: &str) -> Option<f64> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        // Digit runs too long for f64 parse to infinity.
        .filter(|v: &f64| v.is_finite())
}

/// Why a candidate log file did not become a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Skip {
    /// File name did not carry `prompt-<n>-concurrency-<n>.log`.
    UnrecognizedName { filename: String },
    /// File could not be read.
    Unreadable { path: PathBuf, detail: String },
    /// File lacked a latency or a throughput metric.
    MissingMetrics { path: PathBuf },
}

impl std::fmt::Display for Skip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Skip::UnrecognizedName { filename } => {
                write!(f, "could not extract parameters from filename: {filename}")
            }
            Skip::Unreadable { path, detail } => {
                write!(f, "error processing file {}: {detail}", path.display())
            }
            Skip::MissingMetrics { path } => {
                write!(f, "missing metrics in {}", path.display())
            }
        }
    }
}

/// Extract metrics from already-loaded text, applying the completeness rule.
pub fn parse_log_text(path: &Path, text: &str) -> Result<LogMetrics, Skip> {
    let metrics = LogMetrics::from_text(text);
    if !metrics.is_complete() {
        tracing::warn!(
            path = %path.display(),
            "skipping file due to missing metrics"
        );
        return Err(Skip::MissingMetrics {
            path: path.to_path_buf(),
        });
    }
    Ok(metrics)
}

/// Read a log file and extract its metrics.
///
/// Read failures and incomplete files are both reported as a [`Skip`];
/// neither is fatal to the caller.
pub fn parse_log_file(path: &Path) -> Result<LogMetrics, Skip> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(
                error = %e,
                path = %path.display(),
                "failed to read log file"
            );
            return Err(Skip::Unreadable {
                path: path.to_path_buf(),
                detail: e.to_string(),
            });
        }
    };

    parse_log_text(path, &contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const FULL_LOG: &str = "\
============ Serving Benchmark Result ============
Successful requests:                     100
Benchmark duration (s):                  42.17
Request throughput (req/s):              2.37
Output token throughput (tok/s):         606.95
Total Token throughput (tok/s):          910.43
---------------Time to First Token----------------
Mean TTFT (ms):                          123.45
Median TTFT (ms):                        120.01
-----Inter-token Latency----
Mean ITL (ms):                           15.72
==================================================
";

    #[test]
    fn test_extract_all_metrics() {
        let m = LogMetrics::from_text(FULL_LOG);
        assert_eq!(m.ttft, Some(123.45));
        assert_eq!(m.itl, Some(15.72));
        assert_eq!(m.request_throughput, Some(2.37));
        assert_eq!(m.token_throughput, Some(606.95));
        assert!(m.is_complete());
    }

    #[test]
    fn test_ttft_exact_value() {
        let m = LogMetrics::from_text("Mean TTFT (ms): 123.45");
        assert_eq!(m.ttft, Some(123.45));
    }

    #[test]
    fn test_first_match_wins() {
        let m = LogMetrics::from_text("Mean ITL (ms): 11.5\nMean ITL (ms): 99.9\n");
        assert_eq!(m.itl, Some(11.5));
    }

    #[test]
    fn test_total_token_throughput_not_confused_with_output() {
        let m = LogMetrics::from_text("Total Token throughput (tok/s): 910.43\n");
        assert_eq!(m.token_throughput, None);
    }

    #[test]
    fn test_multi_digit_integer_matches() {
        let m = LogMetrics::from_text("Mean TTFT (ms): 12\n");
        assert_eq!(m.ttft, Some(12.0));
    }

    #[test]
    fn test_single_digit_value_does_not_match() {
        let m = LogMetrics::from_text("Mean TTFT (ms): 5\n");
        assert_eq!(m.ttft, None);
    }

    #[test]
    fn test_labels_are_case_sensitive() {
        let m = LogMetrics::from_text("mean ttft (ms): 123.45\n");
        assert_eq!(m.ttft, None);
    }

    #[test]
    fn test_no_space_after_colon() {
        let m = LogMetrics::from_text("Request throughput (req/s):3.25");
        assert_eq!(m.request_throughput, Some(3.25));
    }

    #[test]
    fn test_tab_separator_not_matched() {
        let m = LogMetrics::from_text("Mean ITL (ms):\t15.72");
        assert_eq!(m.itl, None);
    }

    #[test]
    fn test_throughput_only_rejected() {
        let text = "Request throughput (req/s): 2.37\nOutput token throughput (tok/s): 606.95\n";
        let result = parse_log_text(Path::new("x.log"), text);
        assert_eq!(
            result,
            Err(Skip::MissingMetrics {
                path: PathBuf::from("x.log")
            })
        );
    }

    #[test]
    fn test_latency_only_rejected() {
        let text = "Mean TTFT (ms): 123.45\nMean ITL (ms): 15.72\n";
        assert!(parse_log_text(Path::new("x.log"), text).is_err());
    }

    #[test]
    fn test_one_of_each_accepted() {
        let text = "Mean ITL (ms): 15.72\nRequest throughput (req/s): 2.37\n";
        let m = parse_log_text(Path::new("x.log"), text).unwrap();
        assert_eq!(m.ttft, None);
        assert_eq!(m.itl, Some(15.72));
        assert_eq!(m.request_throughput, Some(2.37));
        assert_eq!(m.token_throughput, None);
    }

    #[test]
    fn test_parse_log_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.log");
        std::fs::write(&path, FULL_LOG).unwrap();
        let m = parse_log_file(&path).unwrap();
        assert_eq!(m.ttft, Some(123.45));
    }

    #[test]
    fn test_parse_missing_file_is_unreadable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.log");
        match parse_log_file(&path) {
            Err(Skip::Unreadable { path: p, detail }) => {
                assert_eq!(p, path);
                assert!(!detail.is_empty());
            }
            other => panic!("expected Unreadable, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_empty_file_is_missing_metrics() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.log");
        std::fs::write(&path, "").unwrap();
        assert!(matches!(
            parse_log_file(&path),
            Err(Skip::MissingMetrics { .. })
        ));
    }

    #[test]
    fn test_skip_display() {
        let skip = Skip::UnrecognizedName {
            filename: "bad.log".to_string(),
        };
        assert_eq!(
            skip.to_string(),
            "could not extract parameters from filename: bad.log"
        );
    }

    #[test]
    fn test_overflowing_value_is_absent() {
        let huge = "9".repeat(400);
        let text = format!(
            "Request throughput (req/s): 12.5\nMean TTFT (ms): {huge}\n"
        );
        let metrics = LogMetrics::from_text(&text);
        assert_eq!(metrics.ttft, None);
        assert_eq!(metrics.request_throughput, Some(12.5));
        assert!(!metrics.is_complete());
        assert!(matches!(
            parse_log_text(Path::new("x.log"), &text),
            Err(Skip::MissingMetrics { .. })
        ));
    }
}
