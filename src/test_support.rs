//! Recording doubles for the host collaborators.

use anyhow::{bail, Result};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::buttons::{ActionButtons, ButtonDefinition, HostModules, OnClickVisibility};
use crate::host::{
    ChatPanel, ChatPanels, EffectRunner, FrontendChannel, FrontendEvent, InjectPanel, PanelUpdate,
    Trigger,
};

type EffectHook = Arc<dyn Fn(&Trigger, &Value) + Send + Sync>;

#[derive(Default)]
pub(crate) struct RecordingFrontend {
    pub(crate) events: Mutex<Vec<FrontendEvent>>,
}

impl FrontendChannel for RecordingFrontend {
    fn send(&self, event: FrontendEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl RecordingFrontend {
    pub(crate) fn panel_updates(&self, panel_id: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, FrontendEvent::PanelUpdated { panel_id: p } if p == panel_id))
            .count()
    }
}

#[derive(Default)]
pub(crate) struct RecordingEffects {
    pub(crate) calls: Mutex<Vec<(Trigger, Value)>>,
    fail: AtomicBool,
    hook: Mutex<Option<EffectHook>>,
}

impl RecordingEffects {
    pub(crate) fn fail_with_error(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn set_hook(&self, hook: impl Fn(&Trigger, &Value) + Send + Sync + 'static) {
        let hook: EffectHook = Arc::new(hook);
        *self.hook.lock().unwrap() = Some(hook);
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub(crate) fn triggers(&self) -> Vec<Trigger> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(t, _)| t.clone())
            .collect()
    }
}

impl EffectRunner for RecordingEffects {
    fn process_effects(&self, trigger: &Trigger, effects: &Value) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push((trigger.clone(), effects.clone()));
        // Clone the hook out so nested clicks can re-enter without deadlocking.
        let hook = self.hook.lock().unwrap().clone();
        if let Some(hook) = hook {
            hook(trigger, effects);
        }
        if self.fail.load(Ordering::SeqCst) {
            bail!("effect chain exploded");
        }
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeChatPanels {
    pub(crate) panels: Mutex<HashMap<String, bool>>,
    pub(crate) injected: Mutex<Vec<InjectPanel>>,
    pub(crate) updates: Mutex<Vec<(String, PanelUpdate)>>,
    pub(crate) removed: Mutex<Vec<String>>,
    fail_get: AtomicBool,
}

impl FakeChatPanels {
    pub(crate) fn add_panel(&self, panel_id: &str, hidden: bool) {
        self.panels
            .lock()
            .unwrap()
            .insert(panel_id.to_string(), hidden);
    }

    pub(crate) fn fail_lookups(&self, fail: bool) {
        self.fail_get.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn hides(&self, panel_id: &str) -> usize {
        self.visibility_calls(panel_id, true)
    }

    pub(crate) fn shows(&self, panel_id: &str) -> usize {
        self.visibility_calls(panel_id, false)
    }

    fn visibility_calls(&self, panel_id: &str, hidden: bool) -> usize {
        self.updates
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, u)| id == panel_id && u.hidden == Some(hidden))
            .count()
    }

    pub(crate) fn is_hidden(&self, panel_id: &str) -> Option<bool> {
        self.panels.lock().unwrap().get(panel_id).copied()
    }
}

impl ChatPanels for FakeChatPanels {
    fn inject_panel(&self, data: InjectPanel) -> Option<String> {
        let id = data.panel_id.clone().unwrap_or_else(|| "generated".to_string());
        self.add_panel(&id, data.hidden.unwrap_or(false));
        self.injected.lock().unwrap().push(data);
        Some(id)
    }

    fn update_panel(&self, panel_id: &str, updates: PanelUpdate) {
        if let Some(hidden) = updates.hidden {
            if let Some(flag) = self.panels.lock().unwrap().get_mut(panel_id) {
                *flag = hidden;
            }
        }
        self.updates
            .lock()
            .unwrap()
            .push((panel_id.to_string(), updates));
    }

    fn remove_panel(&self, panel_id: &str) {
        self.panels.lock().unwrap().remove(panel_id);
        self.removed.lock().unwrap().push(panel_id.to_string());
    }

    fn get_panel(&self, panel_id: &str) -> Result<Option<ChatPanel>> {
        if self.fail_get.load(Ordering::SeqCst) {
            bail!("frontend did not answer");
        }
        Ok(self
            .panels
            .lock()
            .unwrap()
            .get(panel_id)
            .map(|hidden| ChatPanel {
                id: panel_id.to_string(),
                component_name: "action-buttons-panel".to_string(),
                component_data: Value::Null,
                hidden: *hidden,
            }))
    }
}

pub(crate) struct Harness {
    pub(crate) buttons: Arc<ActionButtons>,
    pub(crate) frontend: Arc<RecordingFrontend>,
    pub(crate) effects: Arc<RecordingEffects>,
    pub(crate) panels: Arc<FakeChatPanels>,
}

impl Harness {
    pub(crate) fn new() -> Self {
        let frontend = Arc::new(RecordingFrontend::default());
        let effects = Arc::new(RecordingEffects::default());
        let panels = Arc::new(FakeChatPanels::default());
        let buttons = Arc::new(ActionButtons::new(HostModules {
            effect_runner: effects.clone(),
            chat_panels: panels.clone(),
            frontend: frontend.clone(),
        }));
        Self {
            buttons,
            frontend,
            effects,
            panels,
        }
    }

    /// Register `names` on a fresh, visible panel and return their ids.
    pub(crate) fn panel_with(
        &self,
        panel_id: &str,
        names: &[&str],
        on_click: OnClickVisibility,
    ) -> Vec<String> {
        self.panels.add_panel(panel_id, false);
        let definitions: Vec<_> = names
            .iter()
            .map(|name| ButtonDefinition {
                on_click,
                ..definition(name)
            })
            .collect();
        self.buttons
            .registry()
            .process_definitions(&definitions, panel_id, &Trigger::default())
            .into_iter()
            .map(|b| b.uuid)
            .collect()
    }
}

pub(crate) fn definition(name: &str) -> ButtonDefinition {
    ButtonDefinition {
        name: name.to_string(),
        background_color: "#FF0000FF".to_string(),
        foreground_color: "#FFFFFFFF".to_string(),
        icon: "fas fa-star".to_string(),
        effect_list: json!({"id": "original-list", "list": [{"type": "firebot:chat"}]}),
        ..ButtonDefinition::default()
    }
}
