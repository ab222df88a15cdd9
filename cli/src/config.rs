//! Configuration file plus command-line / `DFINDEX_*` overrides.
//!
//! The file is JSON: the [`IndexerConfig`] fields at top level and an
//! optional `log` section. Missing fields take their defaults.

use std::path::Path;

use anyhow::{Context, Result};
use dfindex_core::indexer::IndexerConfig;
use serde::{Deserialize, Serialize};

use crate::logging::{LogConfig, LogFormat};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(flatten)]
    pub indexer: IndexerConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Values that win over the file when set.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub rpc_url: Option<String>,
    pub rpc_user: Option<String>,
    pub rpc_password: Option<String>,
    pub database: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub log_level: Option<String>,
    pub json_logs: bool,
}

impl CliConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn apply(mut self, overrides: Overrides) -> Self {
        if let Some(url) = overrides.rpc_url {
            self.indexer.rpc_url = url;
        }
        if overrides.rpc_user.is_some() {
            self.indexer.rpc_user = overrides.rpc_user;
        }
        if overrides.rpc_password.is_some() {
            self.indexer.rpc_password = overrides.rpc_password;
        }
        if overrides.database.is_some() {
            self.indexer.database = overrides.database;
        }
        if let Some(ms) = overrides.poll_interval_ms {
            self.indexer.poll_interval_ms = ms;
        }
        if let Some(level) = overrides.log_level {
            self.log.level = level;
        }
        if overrides.json_logs {
            self.log.format = LogFormat::Json;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_fields_are_flat_with_log_section() {
        let cfg: CliConfig = serde_json::from_str(
            r#"{"rpc_url":"http://node:8554","database":"df.db","log":{"level":"debug"}}"#,
        )
        .unwrap();
        assert_eq!(cfg.indexer.rpc_url, "http://node:8554");
        assert_eq!(cfg.indexer.database.as_deref(), Some("df.db"));
        assert_eq!(cfg.indexer.poll_interval_ms, 1000);
        assert_eq!(cfg.log.level, "debug");
        assert_eq!(cfg.log.format, LogFormat::Text);
    }

    #[test]
    fn overrides_win_over_file() {
        let cfg = CliConfig::default().apply(Overrides {
            rpc_url: Some("http://other:8554".into()),
            poll_interval_ms: Some(250),
            json_logs: true,
            ..Default::default()
        });
        assert_eq!(cfg.indexer.rpc_url, "http://other:8554");
        assert_eq!(cfg.indexer.poll_interval_ms, 250);
        assert!(cfg.indexer.database.is_none());
        assert_eq!(cfg.log.format, LogFormat::Json);
    }

    #[test]
    fn load_without_path_uses_defaults() {
        assert_eq!(CliConfig::load(None).unwrap(), CliConfig::default());
    }

    #[test]
    fn load_reports_missing_file() {
        let err = CliConfig::load(Some(Path::new("/nonexistent/dfindex.json"))).unwrap_err();
        assert!(err.to_string().contains("reading config file"));
    }
}
