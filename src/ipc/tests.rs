use super::protocol::IpcCommand;
use super::router::handle_command;
use super::session::{run_bridge, BridgeState, EventWriter};
use crate::config::BridgeConfig;
use clap::Parser;
use crossbeam_channel::{bounded, Sender};
use serde_json::{json, Value};
use std::io::{self, Cursor, Write};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SharedBuf {
    fn events(&self) -> Vec<Value> {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    fn take(&self) -> Vec<Value> {
        let events = self.events();
        self.0.lock().unwrap().clear();
        events
    }
}

fn bridge() -> (BridgeState, SharedBuf) {
    let config = BridgeConfig::parse_from(["test-app"]);
    let buf = SharedBuf::default();
    let state = BridgeState::new(&config, Arc::new(EventWriter::new(buf.clone())));
    (state, buf)
}

/// Bridge whose effect runner waits on `tx` for host completions.
fn attached_bridge() -> (Arc<BridgeState>, SharedBuf, Sender<IpcCommand>) {
    let config = BridgeConfig::parse_from(["test-app"]);
    let buf = SharedBuf::default();
    let state = Arc::new(BridgeState::new(
        &config,
        Arc::new(EventWriter::new(buf.clone())),
    ));
    let (tx, rx) = bounded(16);
    state.attach_commands(rx);
    (state, buf, tx)
}

fn queue(tx: &Sender<IpcCommand>, cmd: Value) {
    tx.send(serde_json::from_value(cmd).unwrap()).unwrap();
}

fn event_names(events: &[Value]) -> Vec<&str> {
    events.iter().filter_map(|e| e["event"].as_str()).collect()
}

fn send(state: &BridgeState, cmd: Value) {
    let cmd: IpcCommand = serde_json::from_value(cmd).unwrap();
    handle_command(state, cmd);
}

fn named<'a>(events: &'a [Value], name: &str) -> Vec<&'a Value> {
    events.iter().filter(|e| e["event"] == json!(name)).collect()
}

fn create_panel(state: &BridgeState, buf: &SharedBuf, on_click: &str) -> (String, Vec<String>) {
    send(
        state,
        json!({
            "cmd": "action-buttons:run-effect",
            "effect": {
                "type": "action-buttons:add-action-button-panel",
                "actionButtons": [
                    {"name": "Yes", "backgroundColor": "#00FF00FF", "foregroundColor": "#000000FF",
                     "onClick": on_click, "effectList": {"id": "x", "list": [{"type": "firebot:chat"}]}},
                    {"name": "No", "backgroundColor": "#FF0000FF", "foregroundColor": "#000000FF",
                     "onClick": on_click, "effectList": {"id": "y", "list": []}}
                ]
            }
        }),
    );
    let events = buf.take();
    let result = named(&events, "effect-result")[0].clone();
    assert_eq!(result["success"], json!(true));
    let panel_id = result["outputs"]["panelId"].as_str().unwrap().to_string();
    let ids = result["outputs"]["buttonIds"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect();
    (panel_id, ids)
}

#[test]
fn commands_deserialize_by_cmd_tag() {
    let cmd: IpcCommand = serde_json::from_value(json!({
        "cmd": "action-buttons:get-panel-buttons",
        "panelId": "p1"
    }))
    .unwrap();
    assert!(matches!(cmd, IpcCommand::GetPanelButtons { panel_id } if panel_id == "p1"));

    let cmd: IpcCommand =
        serde_json::from_value(json!({"cmd": "action-button:click", "uuid": "b1"})).unwrap();
    assert!(matches!(cmd, IpcCommand::Click { trigger: None, .. }));

    assert!(serde_json::from_value::<IpcCommand>(json!({"cmd": "explode"})).is_err());
}

#[test]
fn generate_uuid_returns_fresh_ids() {
    let (state, buf) = bridge();
    send(&state, json!({"cmd": "action-buttons:generate-uuid"}));
    send(&state, json!({"cmd": "action-buttons:generate-uuid"}));
    let events = buf.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["event"], json!("uuid"));
    let first = events[0]["uuid"].as_str().unwrap();
    assert!(uuid::Uuid::parse_str(first).is_ok());
    assert_ne!(events[0]["uuid"], events[1]["uuid"]);
}

#[test]
fn create_panel_injects_chat_panel_and_lists_buttons() {
    let (state, buf) = bridge();
    send(
        &state,
        json!({
            "cmd": "action-buttons:run-effect",
            "effect": {
                "type": "action-buttons:add-action-button-panel",
                "actionButtons": [{"name": "Go", "backgroundColor": "#1", "foregroundColor": "#2"}]
            }
        }),
    );
    let events = buf.take();
    let injects = named(&events, "chatUpdate");
    assert_eq!(injects.len(), 1);
    assert_eq!(injects[0]["payload"]["fbEvent"], json!("InjectCustomPanel"));
    assert_eq!(
        injects[0]["payload"]["componentName"],
        json!("action-buttons-panel")
    );
    assert_eq!(injects[0]["payload"]["position"], json!("append"));
    let panel_id = injects[0]["payload"]["panelId"].as_str().unwrap().to_string();

    send(
        &state,
        json!({"cmd": "action-buttons:get-panel-buttons", "panelId": panel_id}),
    );
    let events = buf.take();
    assert_eq!(events[0]["event"], json!("panel-buttons"));
    assert_eq!(events[0]["buttons"][0]["name"], json!("Go"));
    assert_eq!(events[0]["buttons"][0]["hidden"], json!(false));
}

#[test]
fn click_emits_process_effects_then_result() {
    let (state, buf) = bridge();
    let (panel_id, ids) = create_panel(&state, &buf, "noVisibilityChanges");

    send(&state, json!({"cmd": "action-button:click", "uuid": ids[0]}));
    let events = buf.take();
    assert_eq!(events[0]["event"], json!("process-effects"));
    assert_eq!(events[0]["requestId"], json!(1));
    assert_eq!(events[0]["effects"]["id"], json!(ids[0]));
    assert_eq!(
        events[0]["trigger"]["metadata"]["actionButton"]["stack"],
        json!([{"buttonId": ids[0], "panelId": panel_id, "buttonName": "Yes"}])
    );
    assert_eq!(events[1]["event"], json!("click-result"));
    assert_eq!(events[1]["success"], json!(true));
}

#[test]
fn nested_click_from_host_trigger_grows_stack() {
    let (state, buf) = bridge();
    let (_, ids) = create_panel(&state, &buf, "noVisibilityChanges");

    send(&state, json!({"cmd": "action-button:click", "uuid": ids[0]}));
    let forwarded = buf.take()[0]["trigger"].clone();

    send(
        &state,
        json!({"cmd": "action-button:click", "uuid": ids[1], "trigger": forwarded}),
    );
    let events = buf.take();
    let stack = events[1]["stack"].as_array().unwrap();
    assert_eq!(stack.len(), 2);
    assert_eq!(stack[0]["buttonName"], json!("No"));
    assert_eq!(stack[1]["buttonName"], json!("Yes"));
}

#[test]
fn click_unknown_button_reports_failure() {
    let (state, buf) = bridge();
    send(&state, json!({"cmd": "action-button:click", "uuid": "ghost"}));
    let events = buf.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["success"], json!(false));
    assert!(events[0]["error"].as_str().unwrap().contains("ghost"));
}

#[test]
fn hide_button_clicks_hide_the_panel_with_its_last_button() {
    let (state, buf) = bridge();
    let (panel_id, ids) = create_panel(&state, &buf, "hideButton");

    send(&state, json!({"cmd": "action-button:click", "uuid": ids[0]}));
    let events = buf.take();
    let updated = named(&events, "action-buttons:panel-updated");
    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0]["panelId"], json!(panel_id));
    assert!(named(&events, "chatUpdate").is_empty());

    send(&state, json!({"cmd": "action-button:click", "uuid": ids[1]}));
    let events = buf.take();
    let chat = named(&events, "chatUpdate");
    assert_eq!(chat.len(), 1);
    assert_eq!(
        chat[0]["payload"],
        json!({"fbEvent": "UpdateCustomPanel", "panelId": panel_id, "updates": {"hidden": true}})
    );
}

#[test]
fn update_button_properties_round_trip() {
    let (state, buf) = bridge();
    let (panel_id, ids) = create_panel(&state, &buf, "noVisibilityChanges");

    send(
        &state,
        json!({
            "cmd": "action-buttons:update-button-properties",
            "uuid": ids[0],
            "updates": {"buttonName": "Maybe", "onClick": "hidePanel"}
        }),
    );
    let events = buf.take();
    assert_eq!(events[0]["event"], json!("action-buttons:panel-updated"));
    assert_eq!(events[0]["panelId"], json!(panel_id));
    assert_eq!(events[1], json!({"event": "button-updated", "uuid": ids[0], "success": true}));

    send(
        &state,
        json!({"cmd": "action-buttons:update-button-properties", "uuid": ids[0], "updates": {}}),
    );
    assert_eq!(buf.take()[0]["success"], json!(false));

    send(
        &state,
        json!({"cmd": "action-buttons:update-button-properties", "uuid": "ghost", "updates": {"icon": "x"}}),
    );
    assert_eq!(buf.take()[0]["success"], json!(false));
}

#[test]
fn validate_effect_reports_errors_or_rejects_payload() {
    let (state, buf) = bridge();
    send(
        &state,
        json!({
            "cmd": "action-buttons:validate-effect",
            "effect": {"type": "action-buttons:remove-action-button-panel"}
        }),
    );
    send(
        &state,
        json!({"cmd": "action-buttons:validate-effect", "effect": {"type": "nope"}}),
    );
    let events = buf.events();
    assert_eq!(
        events[0],
        json!({
            "event": "effect-errors",
            "effect": "action-buttons:remove-action-button-panel",
            "errors": ["Panel ID is required"]
        })
    );
    assert_eq!(events[1]["event"], json!("error"));
    assert_eq!(events[1]["recoverable"], json!(true));
}

#[test]
fn evaluate_variable_uses_trigger_stack() {
    let (state, buf) = bridge();
    let (_, ids) = create_panel(&state, &buf, "noVisibilityChanges");
    send(&state, json!({"cmd": "action-button:click", "uuid": ids[1]}));
    let trigger = buf.take()[0]["trigger"].clone();

    send(
        &state,
        json!({
            "cmd": "action-buttons:evaluate-variable",
            "handle": "actionButtonName",
            "trigger": trigger
        }),
    );
    send(
        &state,
        json!({"cmd": "action-buttons:evaluate-variable", "handle": "mystery"}),
    );
    let events = buf.events();
    assert_eq!(
        events[0],
        json!({"event": "variable-value", "handle": "actionButtonName", "value": "No"})
    );
    assert_eq!(events[1]["event"], json!("error"));
}

#[test]
fn definitions_list_effects_and_variables() {
    let (state, buf) = bridge();
    send(&state, json!({"cmd": "action-buttons:get-definitions"}));
    let events = buf.events();
    assert_eq!(events[0]["effects"].as_array().unwrap().len(), 7);
    assert_eq!(events[0]["variables"].as_array().unwrap().len(), 8);
    assert_eq!(
        events[0]["effects"][0]["outputs"][0]["defaultName"],
        json!("panelId")
    );
}

#[test]
fn run_bridge_serves_until_input_closes() {
    let config = BridgeConfig::parse_from(["test-app", "--panel-component", "custom-panel"]);
    let buf = SharedBuf::default();
    let input = Cursor::new(
        "{\"cmd\":\"action-buttons:generate-uuid\"}\n\nnot json\n{\"cmd\":\"action-buttons:get-definitions\"}\n",
    );

    run_bridge(&config, input, EventWriter::new(buf.clone())).unwrap();

    let events = buf.events();
    assert_eq!(events[0]["event"], json!("ready"));
    assert_eq!(events[0]["panelComponent"], json!("custom-panel"));
    assert_eq!(named(&events, "uuid").len(), 1);
    assert_eq!(named(&events, "definitions").len(), 1);
    let errors = named(&events, "error");
    assert_eq!(errors.len(), 1);
    assert!(errors[0]["message"]
        .as_str()
        .unwrap()
        .starts_with("Invalid command"));
}

#[test]
fn click_waits_for_host_and_reports_chain_failure() {
    let (state, buf, tx) = attached_bridge();
    let (panel_id, ids) = create_panel(&state, &buf, "noVisibilityChanges");

    queue(
        &tx,
        json!({"cmd": "action-buttons:get-panel-buttons", "panelId": panel_id}),
    );
    queue(
        &tx,
        json!({"cmd": "action-buttons:effects-finished", "requestId": 1, "error": "chat effect failed"}),
    );
    send(&state, json!({"cmd": "action-button:click", "uuid": ids[0]}));

    let events = buf.take();
    assert_eq!(
        event_names(&events),
        ["process-effects", "panel-buttons", "click-result"]
    );
    assert_eq!(events[2]["uuid"], json!(ids[0]));
    assert_eq!(events[2]["success"], json!(false));
}

#[test]
fn nested_click_completes_inside_outer_chain() {
    let (state, buf, tx) = attached_bridge();
    let (_, ids) = create_panel(&state, &buf, "noVisibilityChanges");

    queue(&tx, json!({"cmd": "action-button:click", "uuid": ids[1]}));
    queue(&tx, json!({"cmd": "action-buttons:effects-finished", "requestId": 2}));
    queue(&tx, json!({"cmd": "action-buttons:effects-finished", "requestId": 1}));
    send(&state, json!({"cmd": "action-button:click", "uuid": ids[0]}));

    let events = buf.take();
    assert_eq!(
        event_names(&events),
        ["process-effects", "process-effects", "click-result", "click-result"]
    );
    assert_eq!(events[0]["requestId"], json!(1));
    assert_eq!(events[1]["requestId"], json!(2));
    assert_eq!(events[2]["uuid"], json!(ids[1]));
    assert_eq!(events[3]["uuid"], json!(ids[0]));
    assert_eq!(events[3]["success"], json!(true));
}

#[test]
fn outer_completion_arriving_early_is_kept_for_its_chain() {
    let (state, buf, tx) = attached_bridge();
    let (_, ids) = create_panel(&state, &buf, "noVisibilityChanges");

    queue(&tx, json!({"cmd": "action-button:click", "uuid": ids[1]}));
    queue(
        &tx,
        json!({"cmd": "action-buttons:effects-finished", "requestId": 1, "error": "outer failed"}),
    );
    queue(&tx, json!({"cmd": "action-buttons:effects-finished", "requestId": 2}));
    send(&state, json!({"cmd": "action-button:click", "uuid": ids[0]}));

    let events = buf.take();
    let results = named(&events, "click-result");
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["uuid"], json!(ids[1]));
    assert_eq!(results[0]["success"], json!(true));
    assert_eq!(results[1]["uuid"], json!(ids[0]));
    assert_eq!(results[1]["success"], json!(false));
}

#[test]
fn closed_command_stream_fails_pending_click() {
    let (state, buf, tx) = attached_bridge();
    let (_, ids) = create_panel(&state, &buf, "noVisibilityChanges");
    drop(tx);

    send(&state, json!({"cmd": "action-button:click", "uuid": ids[0]}));
    let events = buf.take();
    assert_eq!(event_names(&events), ["process-effects", "click-result"]);
    assert_eq!(events[1]["success"], json!(false));
}

#[test]
fn completion_without_waiting_chain_is_rejected() {
    let (state, buf) = bridge();
    send(
        &state,
        json!({"cmd": "action-buttons:effects-finished", "requestId": 7}),
    );
    let events = buf.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["event"], json!("error"));
    assert_eq!(events[0]["message"], json!("Unknown effect request: 7"));
}
