//! Button registry and click dispatch.
//!
//! The registry owns button configs and per-panel display lists; the dispatcher
//! turns a click into visibility changes plus one effect-chain run, threading a
//! bounded click stack through the forwarded trigger so nested clicks can be
//! traced and runaway recursion stopped.

mod dispatch;
mod manager;
mod registry;
mod stack;
mod types;


pub use dispatch::{ClickError, ClickOutcome, UNKNOWN_USERNAME};
pub use manager::{ActionButtons, HostModules};
pub use registry::{ButtonRegistry, HiddenChange};
pub use stack::{
    ActionButtonMetadata, ClickStack, ClickStackEntry, StackLimitReached,
    ACTION_BUTTON_METADATA_KEY, MAX_CLICK_STACK_DEPTH,
};
pub use types::{
    effect_count, ButtonAlignment, ButtonConfig, ButtonDefinition, ButtonInfo, ButtonUpdate,
    DisplayButton, OnClickVisibility,
};
