use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;

use crate::schedule::model::EntryStatus;

/// A setup mistake in the card configuration. These fail loudly at load
/// time; runtime data conditions (bad state strings, unknown status codes)
/// never produce one.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid editable option: {0}")]
    InvalidEditable(String),
    #[error("invalid action binding '{0}' for '{1}', expected 'domain.action'")]
    InvalidAction(String, &'static str),
    #[error("invalid device status pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
    #[error("device status pattern is missing capture group '{0}'")]
    MissingCaptureGroup(&'static str),
    #[error("invalid status map entry '{0}', expected '<code> -> <status>'")]
    InvalidStatusMapEntry(String),
    #[error("device amount limits are inverted: min {0} > max {1}")]
    InvertedAmountLimits(u32, u32),
}

/// Whether the card offers schedule editing.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum EditableMode {
    Always,
    Never,
    Toggle,
}

/// One `domain.action` service binding.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ActionBinding {
    pub domain: String,
    pub action: String,
}

impl ActionBinding {
    fn parse(value: &str, capability: &'static str) -> Result<Self, ConfigError> {
        match value.split_once('.') {
            Some((domain, action)) if !domain.is_empty() && !action.is_empty() => Ok(Self {
                domain: domain.to_string(),
                action: action.to_string(),
            }),
            _ => Err(ConfigError::InvalidAction(value.to_string(), capability)),
        }
    }
}

/// Service bindings per capability. An absent binding disables the
/// corresponding edit action.
#[derive(Debug, Clone, Default)]
pub struct Actions {
    pub add: Option<ActionBinding>,
    pub edit: Option<ActionBinding>,
    pub remove: Option<ActionBinding>,
    pub toggle: Option<ActionBinding>,
}

impl Actions {
    pub fn is_empty(&self) -> bool {
        self.add.is_none() && self.edit.is_none() && self.remove.is_none() && self.toggle.is_none()
    }
}

/// Device family selection plus, for the custom family, its grammar,
/// status map, and numeric envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum DeviceConfig {
    XiaomiSmartFeeder,
    Custom {
        status_pattern: String,
        status_map: Vec<String>,
        max_entries: usize,
        min_amount: u32,
        max_amount: u32,
        step_amount: u32,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlternateUnit {
    pub unit_of_measurement: String,
    pub conversion_factor: f64,
    #[serde(default)]
    pub approximate: bool,
}

/// Per-status display override. Unset fields fall back to the built-in
/// defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DisplayEntry {
    pub icon: Option<String>,
    pub color: Option<String>,
    pub label: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CardConfig {
    pub entity: String,
    pub switch: Option<String>,
    pub actions: Actions,
    pub editable: EditableMode,
    pub unit_of_measurement: Option<String>,
    pub alternate_unit: Option<AlternateUnit>,
    pub amount_field: String,
    pub device: DeviceConfig,
    pub display: HashMap<EntryStatus, DisplayEntry>,
}

impl CardConfig {
    /// Display label for a status: configured override first, then the
    /// status' own name.
    pub fn status_label(&self, status: EntryStatus) -> &str {
        self.display
            .get(&status)
            .and_then(|entry| entry.label.as_deref())
            .unwrap_or_else(|| status.label())
    }

    pub fn status_icon(&self, status: EntryStatus) -> &str {
        self.display
            .get(&status)
            .and_then(|entry| entry.icon.as_deref())
            .unwrap_or_else(|| default_status_icon(status))
    }

    /// Formats an amount with the configured unit and, when configured, the
    /// converted alternate unit alongside.
    pub fn format_amount(&self, amount: u32) -> String {
        let unit = self.unit_of_measurement.as_deref().unwrap_or("portions");
        let mut text = format!("{amount} {unit}");
        if let Some(alternate) = &self.alternate_unit {
            let converted = f64::from(amount) * alternate.conversion_factor;
            let approx = if alternate.approximate { "~" } else { "" };
            text.push_str(&format!(
                " ({approx}{converted} {})",
                alternate.unit_of_measurement
            ));
        }
        text
    }
}

pub fn default_status_icon(status: EntryStatus) -> &'static str {
    match status {
        EntryStatus::Dispensed => "mdi:check",
        EntryStatus::Failed => "mdi:close",
        EntryStatus::Dispensing => "mdi:tray-arrow-down",
        EntryStatus::Pending => "mdi:clock-outline",
        EntryStatus::Skipped => "mdi:clock-remove-outline",
        EntryStatus::Disabled => "mdi:clock-alert-outline",
    }
}

pub fn load_card_config(path: &Path) -> Result<CardConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("unable to read card config {}", path.display()))?;
    parse_card_config_text(&content)
}

pub fn parse_card_config_text(content: &str) -> Result<CardConfig> {
    let raw = serde_json::from_str::<CardConfigFile>(content).map_err(|err| {
        let line = err.line();
        let column = err.column();
        anyhow::anyhow!("invalid JSON at line {line}, column {column}: {err}")
    })?;

    let actions = Actions {
        add: raw
            .actions
            .add
            .as_deref()
            .map(|value| ActionBinding::parse(value, "add"))
            .transpose()?,
        edit: raw
            .actions
            .edit
            .as_deref()
            .map(|value| ActionBinding::parse(value, "edit"))
            .transpose()?,
        remove: raw
            .actions
            .remove
            .as_deref()
            .map(|value| ActionBinding::parse(value, "remove"))
            .transpose()?,
        toggle: raw
            .actions
            .toggle
            .as_deref()
            .map(|value| ActionBinding::parse(value, "toggle"))
            .transpose()?,
    };

    let mut editable = match raw.editable.as_deref() {
        None | Some("toggle") => EditableMode::Toggle,
        Some("always") => EditableMode::Always,
        Some("never") => EditableMode::Never,
        Some(other) => return Err(ConfigError::InvalidEditable(other.to_string()).into()),
    };
    // No bindings means nothing to edit with, so editing is shut off
    // regardless of the requested mode.
    if actions.is_empty() {
        editable = EditableMode::Never;
    }

    Ok(CardConfig {
        entity: raw.entity,
        switch: raw.switch,
        actions,
        editable,
        unit_of_measurement: raw.unit_of_measurement,
        alternate_unit: raw.alternate_unit,
        amount_field: raw.amount_field.unwrap_or_else(|| "amount".to_string()),
        device: raw.device.unwrap_or(DeviceConfig::XiaomiSmartFeeder),
        display: raw.display,
    })
}

#[derive(Debug, Deserialize)]
struct CardConfigFile {
    entity: String,
    #[serde(default)]
    switch: Option<String>,
    #[serde(default)]
    actions: ActionsFile,
    #[serde(default)]
    editable: Option<String>,
    #[serde(default)]
    unit_of_measurement: Option<String>,
    #[serde(default)]
    alternate_unit: Option<AlternateUnit>,
    #[serde(default)]
    amount_field: Option<String>,
    #[serde(default)]
    device: Option<DeviceConfig>,
    #[serde(default)]
    display: HashMap<EntryStatus, DisplayEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct ActionsFile {
    #[serde(default)]
    add: Option<String>,
    #[serde(default)]
    edit: Option<String>,
    #[serde(default)]
    remove: Option<String>,
    #[serde(default)]
    toggle: Option<String>,
}
