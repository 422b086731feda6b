//! Command-line parsing and validation for the bridge binary.

mod validation;

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::effects::DEFAULT_PANEL_COMPONENT;

/// Commands buffered between the stdin reader and the dispatch loop.
pub const DEFAULT_COMMAND_CHANNEL_CAPACITY: usize = 64;
pub const MIN_COMMAND_CHANNEL_CAPACITY: usize = 1;
pub const MAX_COMMAND_CHANNEL_CAPACITY: usize = 4096;
pub const MAX_PANEL_COMPONENT_LEN: usize = 64;

/// CLI options for the action-buttons bridge. Stdout carries the protocol, so
/// every diagnostic goes to stderr or the trace file.
#[derive(Debug, Parser, Clone)]
#[command(
    about = "Action buttons bridge: drives chat action-button panels over JSON lines",
    author,
    version
)]
pub struct BridgeConfig {
    /// Write JSON trace logs to a file
    #[arg(long = "logs", env = "ACTION_BUTTONS_LOGS", default_value_t = false)]
    pub logs: bool,

    /// Disable all logging (overrides --logs and --log-level)
    #[arg(long = "no-logs", env = "ACTION_BUTTONS_NO_LOGS", default_value_t = false)]
    pub no_logs: bool,

    /// Trace file location (defaults to the temp dir)
    #[arg(long = "log-path", env = "ACTION_BUTTONS_TRACE_LOG")]
    pub log_path: Option<PathBuf>,

    /// Minimum level written to stderr or the trace file
    #[arg(long = "log-level", value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Front-end component injected for new panels
    #[arg(long = "panel-component", default_value = DEFAULT_PANEL_COMPONENT)]
    pub panel_component: String,

    /// Commands buffered between the stdin reader and the dispatch loop
    #[arg(
        long = "command-channel-capacity",
        default_value_t = DEFAULT_COMMAND_CHANNEL_CAPACITY
    )]
    pub command_channel_capacity: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> tracing::level_filters::LevelFilter {
        use tracing::level_filters::LevelFilter;
        match self {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}
