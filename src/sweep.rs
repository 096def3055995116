//! Sweep classification for leaf result directories.
//!
//! A leaf directory's name says which parameter the benchmark varied. The
//! classification is made once per directory into a [`SweepSpec`] and every
//! later decision (x-axis field, labels, titles) reads from it.

use crate::collect::MetricRecord;
use std::path::Path;

/// Parameter that varies across the logs of one sweep directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepKind {
    PromptSweep,
    ConcurrencySweep,
}

impl SweepKind {
    /// Classify a directory name by suffix.
    ///
    /// `long_prompt_concurrency_sweep` is a concurrency sweep run at a large
    /// fixed prompt length; it is only recognized when `include_long_prompt`
    /// is set.
    pub fn from_dir_name(name: &str, include_long_prompt: bool) -> Option<Self> {
        if name.ends_with("long_prompt_concurrency_sweep") {
            return include_long_prompt.then_some(SweepKind::ConcurrencySweep);
        }
        if name.ends_with("concurrency_sweep") {
            return Some(SweepKind::ConcurrencySweep);
        }
        if name.ends_with("prompt_sweep") {
            return Some(SweepKind::PromptSweep);
        }
        None
    }

    /// Human-readable name of the varied parameter.
    pub fn label(self) -> &'static str {
        match self {
            SweepKind::PromptSweep => "Input Length",
            SweepKind::ConcurrencySweep => "Max Concurrency",
        }
    }
}

/// Record field used as the chart x-axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XField {
    PromptLength,
    Concurrency,
}

impl XField {
    pub fn value(self, record: &MetricRecord) -> u64 {
        match self {
            XField::PromptLength => record.prompt_length,
            XField::Concurrency => record.concurrency,
        }
    }
}

/// Everything a leaf directory's name determines about its charts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepSpec {
    pub kind: SweepKind,
    pub x_field: XField,
    pub x_label: String,
}

impl SweepSpec {
    pub fn for_kind(kind: SweepKind) -> Self {
        let (x_field, x_label) = match kind {
            SweepKind::PromptSweep => (XField::PromptLength, format!("{} (Tokens)", kind.label())),
            SweepKind::ConcurrencySweep => (XField::Concurrency, kind.label().to_string()),
        };
        Self {
            kind,
            x_field,
            x_label,
        }
    }

    /// Classify `dir` by its final path component.
    pub fn for_dir(dir: &Path, include_long_prompt: bool) -> Option<Self> {
        let name = dir.file_name()?.to_str()?;
        SweepKind::from_dir_name(name, include_long_prompt).map(Self::for_kind)
    }
}

/// Output-length label taken from the first path segment below `root`.
///
/// Results are laid out as `<root>/<output_len>/.../<sweep>`, e.g.
/// `bench_results/output_128/prompt_sweep` -> `"output 128"`. Returns `None`
/// when `dir` is `root` itself or lies outside it.
pub fn output_len_label(root: &Path, dir: &Path) -> Option<String> {
    let rel = dir.strip_prefix(root).ok()?;
    let first = rel.components().next()?;
    let segment = first.as_os_str().to_str()?;
    Some(segment.replace('_', " "))
}

/// Titles for the two charts of one leaf directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartTitles {
    pub latency: String,
    pub throughput: String,
}

impl ChartTitles {
    /// Build titles like `Latency vs. Max Concurrency for llama (Prompt 128, output 256)`.
    ///
    /// Concurrency sweeps hold the prompt length fixed, so the first record's
    /// prompt length is included in the details.
    pub fn build(
        spec: &SweepSpec,
        output_len: Option<&str>,
        model_name: Option<&str>,
        records: &[MetricRecord],
    ) -> Self {
        let model_str = model_name
            .map(|m| format!(" for {m}"))
            .unwrap_or_default();

        let mut details: Vec<String> = Vec::new();
        if spec.kind == SweepKind::ConcurrencySweep {
            if let Some(first) = records.first() {
                details.push(format!("Prompt {}", first.prompt_length));
            }
        }
        if let Some(label) = output_len {
            details.push(label.to_string());
        }
        let details_str = if details.is_empty() {
            String::new()
        } else {
            format!(" ({})", details.join(", "))
        };

        let sweep = spec.kind.label();
        Self {
            latency: format!("Latency vs. {sweep}{model_str}{details_str}"),
            throughput: format!("Throughput vs. {sweep}{model_str}{details_str}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::LogMetrics;
    use std::path::PathBuf;

    fn record(prompt: u64, concurrency: u64) -> MetricRecord {
        MetricRecord::new(
            format!("m-prompt-{prompt}-concurrency-{concurrency}.log"),
            prompt,
            concurrency,
            LogMetrics::default(),
        )
    }

    #[test]
    fn test_from_dir_name() {
        assert_eq!(
            SweepKind::from_dir_name("prompt_sweep", true),
            Some(SweepKind::PromptSweep)
        );
        assert_eq!(
            SweepKind::from_dir_name("concurrency_sweep", true),
            Some(SweepKind::ConcurrencySweep)
        );
        assert_eq!(
            SweepKind::from_dir_name("long_prompt_concurrency_sweep", true),
            Some(SweepKind::ConcurrencySweep)
        );
        assert_eq!(SweepKind::from_dir_name("prompt_sweep_old", true), None);
        assert_eq!(SweepKind::from_dir_name("output_128", true), None);
    }

    #[test]
    fn test_long_prompt_can_be_excluded() {
        assert_eq!(
            SweepKind::from_dir_name("long_prompt_concurrency_sweep", false),
            None
        );
        assert_eq!(
            SweepKind::from_dir_name("concurrency_sweep", false),
            Some(SweepKind::ConcurrencySweep)
        );
    }

    #[test]
    fn test_spec_for_kind() {
        let p = SweepSpec::for_kind(SweepKind::PromptSweep);
        assert_eq!(p.x_field, XField::PromptLength);
        assert_eq!(p.x_label, "Input Length (Tokens)");

        let c = SweepSpec::for_kind(SweepKind::ConcurrencySweep);
        assert_eq!(c.x_field, XField::Concurrency);
        assert_eq!(c.x_label, "Max Concurrency");
    }

    #[test]
    fn test_spec_for_dir_uses_final_component() {
        let dir = PathBuf::from("bench_results/prompt_sweep/concurrency_sweep");
        let spec = SweepSpec::for_dir(&dir, true).unwrap();
        assert_eq!(spec.kind, SweepKind::ConcurrencySweep);
        assert!(SweepSpec::for_dir(Path::new("bench_results/output_128"), true).is_none());
    }

    #[test]
    fn test_x_field_value() {
        let r = record(512, 8);
        assert_eq!(XField::PromptLength.value(&r), 512);
        assert_eq!(XField::Concurrency.value(&r), 8);
    }

    #[test]
    fn test_output_len_label() {
        let root = Path::new("bench_results");
        assert_eq!(
            output_len_label(root, Path::new("bench_results/output_len_256/prompt_sweep")),
            Some("output len 256".to_string())
        );
        assert_eq!(output_len_label(root, root), None);
        assert_eq!(output_len_label(root, Path::new("elsewhere/prompt_sweep")), None);
    }

    #[test]
    fn test_titles_prompt_sweep() {
        let spec = SweepSpec::for_kind(SweepKind::PromptSweep);
        let titles = ChartTitles::build(&spec, Some("output 128"), None, &[record(64, 1)]);
        assert_eq!(titles.latency, "Latency vs. Input Length (output 128)");
        assert_eq!(titles.throughput, "Throughput vs. Input Length (output 128)");
    }

    #[test]
    fn test_titles_concurrency_sweep_with_model() {
        let spec = SweepSpec::for_kind(SweepKind::ConcurrencySweep);
        let records = [record(1024, 4), record(1024, 1)];
        let titles = ChartTitles::build(&spec, Some("output 256"), Some("llama-70b"), &records);
        assert_eq!(
            titles.latency,
            "Latency vs. Max Concurrency for llama-70b (Prompt 1024, output 256)"
        );
        assert_eq!(
            titles.throughput,
            "Throughput vs. Max Concurrency for llama-70b (Prompt 1024, output 256)"
        );
    }

    #[test]
    fn test_titles_without_output_segment() {
        let spec = SweepSpec::for_kind(SweepKind::ConcurrencySweep);
        let titles = ChartTitles::build(&spec, None, None, &[record(128, 2)]);
        assert_eq!(titles.latency, "Latency vs. Max Concurrency (Prompt 128)");

        let spec = SweepSpec::for_kind(SweepKind::PromptSweep);
        let titles = ChartTitles::build(&spec, None, None, &[]);
        assert_eq!(titles.latency, "Latency vs. Input Length");
    }
}
