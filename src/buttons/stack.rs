use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::host::Trigger;

/// Clicks nested deeper than this are treated as an infinite loop.
pub const MAX_CLICK_STACK_DEPTH: usize = 100;

/// Metadata key under which click context travels in a trigger.
pub const ACTION_BUTTON_METADATA_KEY: &str = "actionButton";

/// One frame of click provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickStackEntry {
    pub button_id: String,
    pub panel_id: String,
    pub button_name: String,
}

/// Click ancestry, most recent click first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClickStack(Vec<ClickStackEntry>);

/// The stack is already at [`MAX_CLICK_STACK_DEPTH`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackLimitReached {
    pub depth: usize,
}

impl fmt::Display for StackLimitReached {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "click stack depth {} reached the limit of {MAX_CLICK_STACK_DEPTH}",
            self.depth
        )
    }
}

impl std::error::Error for StackLimitReached {}

impl ClickStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stack carried by a trigger, empty when the trigger has none or it is malformed.
    pub fn from_trigger(trigger: &Trigger) -> Self {
        trigger
            .metadata_value(ACTION_BUTTON_METADATA_KEY)
            .and_then(|meta| meta.get("stack"))
            .and_then(|stack| serde_json::from_value(stack.clone()).ok())
            .unwrap_or_default()
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Frame of the button currently executing.
    pub fn current(&self) -> Option<&ClickStackEntry> {
        self.0.first()
    }

    pub fn entries(&self) -> &[ClickStackEntry] {
        &self.0
    }

    /// New stack with `entry` on top, refused once the depth cap is hit.
    pub fn enter(&self, entry: ClickStackEntry) -> Result<ClickStack, StackLimitReached> {
        if self.depth() >= MAX_CLICK_STACK_DEPTH {
            return Err(StackLimitReached {
                depth: self.depth(),
            });
        }
        let mut entries = Vec::with_capacity(self.0.len() + 1);
        entries.push(entry);
        entries.extend(self.0.iter().cloned());
        Ok(ClickStack(entries))
    }
}

impl From<Vec<ClickStackEntry>> for ClickStack {
    fn from(entries: Vec<ClickStackEntry>) -> Self {
        ClickStack(entries)
    }
}

/// Click context stored under `metadata.actionButton` of a forwarded trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionButtonMetadata {
    pub timestamp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_metadata: Option<Map<String, Value>>,
    #[serde(default)]
    pub stack: ClickStack,
}

impl ActionButtonMetadata {
    pub fn from_trigger(trigger: &Trigger) -> Option<Self> {
        trigger
            .metadata_value(ACTION_BUTTON_METADATA_KEY)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }
}
