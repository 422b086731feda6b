//! JSON-lines protocol between the bridge and its host.
//!
//! Commands arrive on stdin tagged by `cmd`; events leave on stdout tagged by
//! `event`. Field names are camelCase to match the host's records.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::buttons::{ButtonUpdate, ClickStack, DisplayButton};
use crate::effects::EffectDefinition;
use crate::host::Trigger;
use crate::variables::VariableDefinition;

// ============================================================================
// IPC Events (bridge → host)
// ============================================================================

/// Events emitted by the bridge. Front-end notifications (`chatUpdate`,
/// `action-buttons:panel-updated`) share the stream but are serialized from
/// [`crate::host::FrontendEvent`].
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum IpcEvent {
    /// Sent once on startup
    #[serde(rename = "ready", rename_all = "camelCase")]
    Ready {
        session_id: String,
        version: String,
        panel_component: String,
    },

    #[serde(rename = "uuid")]
    Uuid { uuid: String },

    #[serde(rename = "click-result", rename_all = "camelCase")]
    ClickResult {
        uuid: String,
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        stack: Option<ClickStack>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    #[serde(rename = "panel-buttons", rename_all = "camelCase")]
    PanelButtons {
        panel_id: String,
        buttons: Vec<DisplayButton>,
    },

    #[serde(rename = "button-updated")]
    ButtonUpdated { uuid: String, success: bool },

    /// Outcome of a `run-effect` command
    #[serde(rename = "effect-result")]
    EffectResult {
        effect: String,
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        outputs: Option<serde_json::Map<String, Value>>,
    },

    /// Validator output for a `validate-effect` command; empty when valid
    #[serde(rename = "effect-errors")]
    EffectErrors { effect: String, errors: Vec<String> },

    #[serde(rename = "variable-value")]
    VariableValue { handle: String, value: Value },

    #[serde(rename = "definitions")]
    Definitions {
        effects: &'static [EffectDefinition],
        variables: Vec<VariableDefinition>,
    },

    /// Ask the host to run an effect chain with the forwarded trigger. The
    /// host answers with `action-buttons:effects-finished` for `request_id`.
    #[serde(rename = "process-effects", rename_all = "camelCase")]
    ProcessEffects {
        request_id: u64,
        trigger: Trigger,
        effects: Value,
    },

    /// Error (recoverable or fatal)
    #[serde(rename = "error")]
    Error { message: String, recoverable: bool },
}

// ============================================================================
// IPC Commands (host → bridge)
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "cmd")]
pub enum IpcCommand {
    #[serde(rename = "action-buttons:generate-uuid")]
    GenerateUuid,

    /// Button pressed in the UI, or clicked from a host-run effect chain
    #[serde(rename = "action-button:click")]
    Click {
        uuid: String,
        /// Invoking trigger; absent for UI clicks
        #[serde(default)]
        trigger: Option<Trigger>,
    },

    #[serde(rename = "action-buttons:get-panel-buttons")]
    GetPanelButtons {
        #[serde(rename = "panelId")]
        panel_id: String,
    },

    #[serde(rename = "action-buttons:update-button-properties")]
    UpdateButtonProperties {
        uuid: String,
        #[serde(default)]
        updates: ButtonUpdate,
    },

    /// Run one of this extension's effects. `effect` carries the `type` tag.
    #[serde(rename = "action-buttons:run-effect")]
    RunEffect {
        effect: Value,
        #[serde(default)]
        trigger: Trigger,
    },

    #[serde(rename = "action-buttons:validate-effect")]
    ValidateEffect { effect: Value },

    #[serde(rename = "action-buttons:evaluate-variable")]
    EvaluateVariable {
        handle: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        trigger: Trigger,
    },

    #[serde(rename = "action-buttons:get-definitions")]
    GetDefinitions,

    /// The host finished running the chain sent as `process-effects`
    #[serde(rename = "action-buttons:effects-finished", rename_all = "camelCase")]
    EffectsFinished {
        request_id: u64,
        #[serde(default)]
        error: Option<String>,
    },
}
