use super::{
    BridgeConfig, MAX_COMMAND_CHANNEL_CAPACITY, MAX_PANEL_COMPONENT_LEN,
    MIN_COMMAND_CHANNEL_CAPACITY,
};
use anyhow::{bail, Result};
use clap::Parser;
use std::env;
use std::path::{Path, PathBuf};

const DEFAULT_TRACE_FILE: &str = "action_buttons_trace.jsonl";

impl BridgeConfig {
    /// Parse CLI arguments and validate them right away.
    pub fn parse_args() -> Result<Self> {
        let mut config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    /// Check CLI values and normalize the component name.
    pub fn validate(&mut self) -> Result<()> {
        self.panel_component = validate_component_name(&self.panel_component)?;

        if !(MIN_COMMAND_CHANNEL_CAPACITY..=MAX_COMMAND_CHANNEL_CAPACITY)
            .contains(&self.command_channel_capacity)
        {
            bail!(
                "--command-channel-capacity must be between {MIN_COMMAND_CHANNEL_CAPACITY} and {MAX_COMMAND_CHANNEL_CAPACITY}, got {}",
                self.command_channel_capacity
            );
        }

        if let Some(path) = &self.log_path {
            validate_log_path(path)?;
        }
        Ok(())
    }

    /// Whether any subscriber should be installed at all.
    pub fn logging_enabled(&self) -> bool {
        !self.no_logs
    }

    /// Trace file used when `--logs` is set.
    pub fn trace_log_path(&self) -> PathBuf {
        self.log_path
            .clone()
            .unwrap_or_else(|| env::temp_dir().join(DEFAULT_TRACE_FILE))
    }
}

pub(super) fn validate_component_name(value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        bail!("--panel-component cannot be empty");
    }
    if trimmed.len() > MAX_PANEL_COMPONENT_LEN {
        bail!("--panel-component must be at most {MAX_PANEL_COMPONENT_LEN} characters");
    }
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        bail!("--panel-component must contain only ASCII letters, digits, '-' or '_'");
    }
    Ok(trimmed.to_string())
}

pub(super) fn validate_log_path(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        bail!("--log-path cannot be empty");
    }
    if path.is_dir() {
        bail!("--log-path '{}' is a directory", path.display());
    }
    Ok(())
}
