//! Action buttons bridge: speaks newline-delimited JSON on stdin/stdout.

use action_buttons::config::BridgeConfig;
use action_buttons::{init_tracing, ipc};
use anyhow::Result;

fn main() -> Result<()> {
    let config = BridgeConfig::parse_args()?;
    init_tracing(&config);
    ipc::run_ipc_mode(&config)
}
