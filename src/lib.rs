pub mod buttons;
pub mod config;
pub mod effects;
pub mod host;
pub mod ipc;
mod lock;
mod telemetry;
pub mod variables;

#[cfg(test)]
mod test_support;

pub(crate) use lock::lock_or_recover;
pub use telemetry::init_tracing;
