use chrono::NaiveDateTime;
use serde_json::{Map, Value};

use crate::config::{ActionBinding, CardConfig, ConfigError, EditableMode};
use crate::device::DeviceProfile;
use crate::schedule::model::{EntryStatus, ScheduleEntry};
use crate::schedule::parser::parse_schedule;
use crate::schedule::resolver::{self, SwitchState};
use crate::schedule::session::EditSession;

/// External command dispatcher. Calls are fire-and-forget: the card never
/// observes success or failure and relies on the next device state update
/// instead.
pub trait CommandSink {
    fn call(&mut self, domain: &str, action: &str, payload: Value);
}

/// Composition root: owns the configuration, the device profile, the parsed
/// entries of the latest state update, and the single edit session.
#[derive(Debug)]
pub struct ScheduleCard {
    config: CardConfig,
    profile: DeviceProfile,
    entries: Vec<ScheduleEntry>,
    session: EditSession,
    editing: bool,
}

impl ScheduleCard {
    pub fn new(config: CardConfig) -> Result<Self, ConfigError> {
        let profile = DeviceProfile::from_config(&config.device)?;
        let editing = config.editable == EditableMode::Always;
        Ok(Self {
            config,
            profile,
            entries: Vec::new(),
            session: EditSession::default(),
            editing,
        })
    }

    pub fn config(&self) -> &CardConfig {
        &self.config
    }

    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    /// Recomputes the schedule from a device state update. A missing state
    /// (entity unavailable) is an empty schedule. Entries are replaced
    /// wholesale; nothing is patched in place.
    pub fn apply_state(&mut self, raw: Option<&str>) {
        self.entries = match raw {
            Some(raw) => parse_schedule(raw, &self.profile),
            None => Vec::new(),
        };
    }

    /// Effective status of one entry at `now` given the master switch.
    pub fn display_status(
        &self,
        entry: &ScheduleEntry,
        now: NaiveDateTime,
        switch: SwitchState,
    ) -> EntryStatus {
        resolver::display_status(entry, now, switch)
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn toggle_editing(&mut self) {
        if self.config.editable == EditableMode::Toggle {
            self.editing = !self.editing;
        }
    }

    /// Adding needs a configured add action and a free device slot.
    pub fn can_add(&self) -> bool {
        self.config.actions.add.is_some()
            && self.entries.len() < self.profile.limits.max_entries
    }

    pub fn start_add(&mut self) {
        if self.can_add() {
            self.session.open_add(&self.profile.limits);
        }
    }

    pub fn start_edit(&mut self, id: u32) {
        if self.config.actions.edit.is_none() {
            return;
        }
        if let Some(entry) = self.entries.iter().find(|entry| entry.id == id) {
            self.session.open_edit(entry);
        }
    }

    pub fn set_draft_time(&mut self, hour: u32, minute: u32) {
        self.session.set_time(hour, minute);
    }

    pub fn set_draft_amount(&mut self, amount: u32) {
        self.session.set_amount(amount);
    }

    pub fn cancel_edit(&mut self) {
        self.session.cancel();
    }

    /// Commits the open draft. Exactly one add-or-edit command is emitted
    /// when the draft validates and the matching capability is configured;
    /// otherwise nothing happens.
    pub fn save_edit(&mut self, sink: &mut dyn CommandSink) {
        let binding = match self.session.draft().map(|draft| draft.id) {
            Some(None) => self.config.actions.add.clone(),
            Some(Some(_)) => self.config.actions.edit.clone(),
            None => None,
        };
        let Some(binding) = binding else {
            return;
        };
        let Some(request) = self.session.save(&self.entries, &self.profile.limits) else {
            return;
        };
        let write = request.write();
        let mut payload = Map::new();
        payload.insert("id".to_string(), Value::from(write.id));
        payload.insert("hour".to_string(), Value::from(write.hour));
        payload.insert("minute".to_string(), Value::from(write.minute));
        // Amount field name is configurable for services that still call
        // it `portions`.
        payload.insert(
            self.config.amount_field.clone(),
            Value::from(write.amount),
        );
        sink.call(&binding.domain, &binding.action, Value::Object(payload));
    }

    /// Asks the device to delete a slot. No identifier or no configured
    /// remove action means no call.
    pub fn remove_entry(&self, id: Option<u32>, sink: &mut dyn CommandSink) {
        Self::dispatch_id_action(self.config.actions.remove.as_ref(), id, sink);
    }

    /// Asks the device to enable or disable a slot.
    pub fn toggle_entry(&self, id: Option<u32>, sink: &mut dyn CommandSink) {
        Self::dispatch_id_action(self.config.actions.toggle.as_ref(), id, sink);
    }

    fn dispatch_id_action(
        binding: Option<&ActionBinding>,
        id: Option<u32>,
        sink: &mut dyn CommandSink,
    ) {
        let (Some(binding), Some(id)) = (binding, id) else {
            return;
        };
        let mut payload = Map::new();
        payload.insert("id".to_string(), Value::from(id));
        sink.call(&binding.domain, &binding.action, Value::Object(payload));
    }
}
