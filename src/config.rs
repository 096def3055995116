use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level configuration loaded from sweepplot.toml.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    pub input: InputConfig,
    pub chart: ChartConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Root of the benchmark results tree.
    pub base_dir: PathBuf,
    /// Also plot `long_prompt_concurrency_sweep` directories.
    pub include_long_prompt: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Folded into chart titles as "... for <model>".
    pub model_name: Option<String>,
    pub throughput_mode: ThroughputMode,
    /// Output resolution for the 10x6 inch canvas.
    pub dpi: u32,
}

/// Upper bound on output resolution. 1200 DPI is already a 12000x7200 canvas.
pub const MAX_DPI: u32 = 1200;

/// Which series the throughput chart shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ThroughputMode {
    /// Prefill throughput (left axis) and output token throughput (right axis).
    #[default]
    Dual,
    /// Output token throughput only.
    TokenOnly,
}

impl std::fmt::Display for ThroughputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThroughputMode::Dual => write!(f, "dual"),
            ThroughputMode::TokenOnly => write!(f, "token-only"),
        }
    }
}

// --- Default implementations ---

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("bench_results"),
            include_long_prompt: true,
        }
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            model_name: None,
            throughput_mode: ThroughputMode::Dual,
            dpi: 300,
        }
    }
}

/// Errors loading the config file.
#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    Invalid {
        detail: String,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "failed to read config {}: {source}", path.display())
            }
            ConfigError::Parse { path, source } => {
                write!(f, "failed to parse config {}: {source}", path.display())
            }
            ConfigError::Invalid { detail } => write!(f, "invalid config: {detail}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::Invalid { .. } => None,
        }
    }
}

impl PlotConfig {
    /// Load config from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };
        let config: Self = toml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_DPI).contains(&self.chart.dpi) {
            return Err(ConfigError::Invalid {
                detail: format!(
                    "chart.dpi must be between 1 and {MAX_DPI}, got {}",
                    self.chart.dpi
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let cfg = PlotConfig::default();
        assert_eq!(cfg.input.base_dir, PathBuf::from("bench_results"));
        assert!(cfg.input.include_long_prompt);
        assert_eq!(cfg.chart.model_name, None);
        assert_eq!(cfg.chart.throughput_mode, ThroughputMode::Dual);
        assert_eq!(cfg.chart.dpi, 300);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let cfg = PlotConfig::load(&dir.path().join("sweepplot.toml")).unwrap();
        assert_eq!(cfg, PlotConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sweepplot.toml");
        std::fs::write(
            &path,
            "[chart]\nmodel_name = \"llama-70b\"\nthroughput_mode = \"token-only\"\n",
        )
        .unwrap();
        let cfg = PlotConfig::load(&path).unwrap();
        assert_eq!(cfg.chart.model_name.as_deref(), Some("llama-70b"));
        assert_eq!(cfg.chart.throughput_mode, ThroughputMode::TokenOnly);
        assert_eq!(cfg.chart.dpi, 300);
        assert_eq!(cfg.input.base_dir, PathBuf::from("bench_results"));
    }

    #[test]
    fn test_full_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sweepplot.toml");
        std::fs::write(
            &path,
            r#"
[input]
base_dir = "results/a100"
include_long_prompt = false

[chart]
throughput_mode = "dual"
dpi = 150
"#,
        )
        .unwrap();
        let cfg = PlotConfig::load(&path).unwrap();
        assert_eq!(cfg.input.base_dir, PathBuf::from("results/a100"));
        assert!(!cfg.input.include_long_prompt);
        assert_eq!(cfg.chart.dpi, 150);
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sweepplot.toml");
        std::fs::write(&path, "[chart\ndpi = ").unwrap();
        let err = PlotConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_unknown_mode_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sweepplot.toml");
        std::fs::write(&path, "[chart]\nthroughput_mode = \"prefill\"\n").unwrap();
        assert!(matches!(
            PlotConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_zero_dpi_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sweepplot.toml");
        std::fs::write(&path, "[chart]\ndpi = 0\n").unwrap();
        assert!(matches!(
            PlotConfig::load(&path),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_oversized_dpi_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sweepplot.toml");
        std::fs::write(&path, "[chart]\ndpi = 20000\n").unwrap();
        let err = PlotConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
        assert!(err.to_string().contains("20000"));
    }

    #[test]
    fn test_max_dpi_accepted() {
        let mut cfg = PlotConfig::default();
        cfg.chart.dpi = MAX_DPI;
        assert!(cfg.validate().is_ok());
        cfg.chart.dpi = MAX_DPI + 1;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_throughput_mode_display() {
        assert_eq!(ThroughputMode::Dual.to_string(), "dual");
        assert_eq!(ThroughputMode::TokenOnly.to_string(), "token-only");
    }
}
