use crate::config::BridgeConfig;
use std::fs::OpenOptions;
use std::io;
use std::sync::OnceLock;
use tracing_subscriber::fmt::time::UtcTime;

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Install the global subscriber once. With `--logs` events go to the JSON
/// trace file; otherwise to stderr. Stdout is never written.
pub fn init_tracing(config: &BridgeConfig) {
    if !config.logging_enabled() {
        return;
    }

    let _ = TRACING_INIT.get_or_init(|| {
        let level = config.log_level.as_filter();
        if config.logs {
            let path = config.trace_log_path();
            let file = match OpenOptions::new().create(true).append(true).open(&path) {
                Ok(file) => file,
                Err(_) => return,
            };
            let subscriber = tracing_subscriber::fmt()
                .json()
                .with_timer(UtcTime::rfc_3339())
                .with_max_level(level)
                .with_writer(file)
                .with_current_span(false)
                .with_span_list(false)
                .finish();
            let _ = tracing::subscriber::set_global_default(subscriber);
        } else {
            let subscriber = tracing_subscriber::fmt()
                .compact()
                .with_timer(UtcTime::rfc_3339())
                .with_max_level(level)
                .with_writer(io::stderr)
                .with_ansi(false)
                .finish();
            let _ = tracing::subscriber::set_global_default(subscriber);
        }
    });
}
