//! Tracing subscriber setup.
//!
//! Filtering follows `RUST_LOG`; without it everything at `info` and above
//! is shown.

use std::str::FromStr;

use tracing_subscriber::EnvFilter;
use vaultex_types::{Result, VaultexError};

/// Output format of the global subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-field human-readable lines.
    #[default]
    Full,
    /// Single-line, abbreviated.
    Compact,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = VaultexError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(VaultexError::Configuration(format!(
                "unknown log format '{other}' (expected full, compact or json)"
            ))),
        }
    }
}

/// Install the global tracing subscriber.
///
/// # Errors
/// Returns `Configuration` if a global subscriber is already set.
pub fn init_tracing(format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = match format {
        LogFormat::Full => builder.try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|err| VaultexError::Configuration(format!("tracing: {err}")))
}
