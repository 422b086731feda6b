use serde_json::Value;
use tracing::{debug, warn};

use super::protocol::{IpcCommand, IpcEvent};
use super::session::BridgeState;
use crate::buttons::ButtonUpdate;
use crate::effects::{ActionButtonEffect, EffectContext, EFFECT_DEFINITIONS};
use crate::host::Trigger;
use crate::variables::{variable_definitions, Variable};

// ============================================================================
// Command Handlers
// ============================================================================

pub(super) fn handle_command(state: &BridgeState, cmd: IpcCommand) {
    match cmd {
        IpcCommand::GenerateUuid => handle_generate_uuid(state),
        IpcCommand::Click { uuid, trigger } => handle_click(state, &uuid, trigger.as_ref()),
        IpcCommand::GetPanelButtons { panel_id } => handle_get_panel_buttons(state, &panel_id),
        IpcCommand::UpdateButtonProperties { uuid, updates } => {
            handle_update_button_properties(state, &uuid, &updates)
        }
        IpcCommand::RunEffect { effect, trigger } => handle_run_effect(state, effect, &trigger),
        IpcCommand::ValidateEffect { effect } => handle_validate_effect(state, effect),
        IpcCommand::EvaluateVariable {
            handle,
            args,
            trigger,
        } => handle_evaluate_variable(state, &handle, &args, &trigger),
        IpcCommand::GetDefinitions => handle_get_definitions(state),
        IpcCommand::EffectsFinished { request_id, error } => {
            handle_effects_finished(state, request_id, error)
        }
    }
}

pub(super) fn handle_generate_uuid(state: &BridgeState) {
    let uuid = state.buttons.registry().generate_uuid();
    state.send_event(&IpcEvent::Uuid { uuid });
}

pub(super) fn handle_click(state: &BridgeState, uuid: &str, trigger: Option<&Trigger>) {
    let event = match state.buttons.dispatch_click(uuid, trigger) {
        Ok(outcome) => IpcEvent::ClickResult {
            uuid: uuid.to_string(),
            success: outcome.effects_succeeded,
            stack: Some(outcome.stack),
            error: None,
        },
        Err(err) => IpcEvent::ClickResult {
            uuid: uuid.to_string(),
            success: false,
            stack: None,
            error: Some(err.to_string()),
        },
    };
    state.send_event(&event);
}

pub(super) fn handle_get_panel_buttons(state: &BridgeState, panel_id: &str) {
    let buttons = state.buttons.registry().panel_buttons(panel_id);
    debug!(panel_id, count = buttons.len(), "returning panel buttons");
    state.send_event(&IpcEvent::PanelButtons {
        panel_id: panel_id.to_string(),
        buttons,
    });
}

pub(super) fn handle_update_button_properties(
    state: &BridgeState,
    uuid: &str,
    updates: &ButtonUpdate,
) {
    let success = !updates.is_empty() && state.buttons.update_button_properties(uuid, updates);
    if updates.is_empty() {
        warn!(uuid, "update-button-properties called without updates");
    }
    state.send_event(&IpcEvent::ButtonUpdated {
        uuid: uuid.to_string(),
        success,
    });
}

pub(super) fn handle_run_effect(state: &BridgeState, effect: Value, trigger: &Trigger) {
    let effect = match parse_effect(state, effect) {
        Some(effect) => effect,
        None => return,
    };
    let ctx = EffectContext::new(&state.buttons).with_panel_component(&state.panel_component);
    let outcome = effect.run(ctx, trigger);
    state.send_event(&IpcEvent::EffectResult {
        effect: effect.id().to_string(),
        success: outcome.success,
        outputs: outcome.outputs,
    });
}

pub(super) fn handle_validate_effect(state: &BridgeState, effect: Value) {
    if let Some(effect) = parse_effect(state, effect) {
        state.send_event(&IpcEvent::EffectErrors {
            effect: effect.id().to_string(),
            errors: effect.validate(),
        });
    }
}

pub(super) fn handle_evaluate_variable(
    state: &BridgeState,
    handle: &str,
    args: &[String],
    trigger: &Trigger,
) {
    let Some(variable) = Variable::from_handle(handle) else {
        state.send_event(&IpcEvent::Error {
            message: format!("Unknown variable: {handle}"),
            recoverable: true,
        });
        return;
    };
    let value = variable.evaluate(state.buttons.registry(), trigger, args);
    state.send_event(&IpcEvent::VariableValue {
        handle: handle.to_string(),
        value,
    });
}

pub(super) fn handle_get_definitions(state: &BridgeState) {
    state.send_event(&IpcEvent::Definitions {
        effects: EFFECT_DEFINITIONS,
        variables: variable_definitions(),
    });
}

pub(super) fn handle_effects_finished(
    state: &BridgeState,
    request_id: u64,
    error: Option<String>,
) {
    if !state.effect_runner.complete(request_id, error) {
        warn!(request_id, "no effect chain waiting for this completion");
        state.send_event(&IpcEvent::Error {
            message: format!("Unknown effect request: {request_id}"),
            recoverable: true,
        });
    }
}

fn parse_effect(state: &BridgeState, effect: Value) -> Option<ActionButtonEffect> {
    match serde_json::from_value(effect) {
        Ok(effect) => Some(effect),
        Err(err) => {
            warn!(error = %err, "invalid effect payload");
            state.send_event(&IpcEvent::Error {
                message: format!("Invalid effect: {err}"),
                recoverable: true,
            });
            None
        }
    }
}
