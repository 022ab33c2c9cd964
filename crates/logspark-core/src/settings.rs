use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::error::{Result, SparkError};
use crate::trend::{aging_period, TREND_WIDTH};

// ── Enumerations ───────────────────────────────────────────────────────────────

/// Encoding of the records arriving on stdin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    /// One JSON object per line.
    Json,
    /// nginx access-log lines described by a `log_format` directive.
    Nginx,
}

/// What the ingestion task does with a record it cannot decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DecodePolicy {
    /// End the session with the decode error.
    #[default]
    Stop,
    /// Log the error, drop the record and keep reading.
    Skip,
}

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Live fuzzy grouping of structured log streams
#[derive(Parser, Debug, Clone)]
#[command(
    name = "logspark",
    about = "Group similar log records from stdin into a live table with trend sparklines",
    version
)]
pub struct Settings {
    /// Fields used as the fuzzy key and as table columns (derived from the
    /// first record when omitted)
    #[arg(value_name = "FIELDS")]
    pub fields: Vec<String>,

    /// Total time span covered by the trend sparkline
    #[arg(long, default_value = "10s", value_parser = humantime::parse_duration)]
    pub trend: Duration,

    /// Token edit distance below which records are merged
    #[arg(long, default_value_t = 3)]
    pub distance: usize,

    /// Input format on stdin
    #[arg(long, value_enum, default_value_t = InputFormat::Json)]
    pub format: InputFormat,

    /// nginx config file holding the log_format directive
    #[arg(long, default_value = "/etc/nginx/nginx.conf")]
    pub nginx_config: PathBuf,

    /// Name of the nginx log_format to parse
    #[arg(long, default_value = "main")]
    pub nginx_format: String,

    /// Behaviour when a record cannot be decoded
    #[arg(long, value_enum, default_value_t = DecodePolicy::Stop)]
    pub on_decode_error: DecodePolicy,

    /// Display theme
    #[arg(long, default_value = "auto", value_parser = ["light", "dark", "classic", "auto"])]
    pub theme: String,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path (defaults to ~/.logspark/logs/logspark.log)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Settings {
    /// Parse the process arguments and apply derived values.
    pub fn load() -> Result<Self> {
        Self::load_from(std::env::args_os())
    }

    /// Same as [`Settings::load`] but accepts an explicit argument list, so
    /// tests can run without spawning subprocesses.
    pub fn load_from<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let mut settings = Settings::parse_from(args);

        // --debug overrides log level.
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the runtime cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.trend.is_zero() {
            return Err(SparkError::Config(
                "trend duration must be greater than zero".to_string(),
            ));
        }
        if self.aging_period().is_zero() {
            return Err(SparkError::Config(format!(
                "trend duration {:?} is too short to split into {TREND_WIDTH} buckets",
                self.trend
            )));
        }
        Ok(())
    }

    /// Interval between two aging ticks.
    pub fn aging_period(&self) -> Duration {
        aging_period(self.trend, TREND_WIDTH)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
