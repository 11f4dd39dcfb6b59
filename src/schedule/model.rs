use serde::{Deserialize, Serialize};

/// Hour value a device reports for an unused slot. Records carrying it are
/// filtered out before the schedule reaches any consumer.
pub const EMPTY_SLOT_HOUR: u32 = 255;

/// Status of one schedule entry. The first four variants come straight from
/// the device; `Skipped` and `Disabled` exist only as display statuses
/// computed by the resolver and never appear in parsed data.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Dispensed,
    Failed,
    Dispensing,
    Pending,
    Skipped,
    Disabled,
}

impl EntryStatus {
    pub fn label(self) -> &'static str {
        match self {
            EntryStatus::Dispensed => "dispensed",
            EntryStatus::Failed => "failed",
            EntryStatus::Dispensing => "dispensing",
            EntryStatus::Pending => "pending",
            EntryStatus::Skipped => "skipped",
            EntryStatus::Disabled => "disabled",
        }
    }

    /// Parses a status token from a device status map. Only raw device
    /// statuses are accepted; the derived display statuses are rejected so
    /// they can never be produced by parsing.
    pub fn from_raw_token(token: &str) -> Option<Self> {
        match token {
            "dispensed" => Some(EntryStatus::Dispensed),
            "failed" => Some(EntryStatus::Failed),
            "dispensing" => Some(EntryStatus::Dispensing),
            "pending" => Some(EntryStatus::Pending),
            _ => None,
        }
    }
}

/// One dispensing slot as reported by the device. Snapshots are recomputed
/// wholesale on every state update; `id` equality is the only identity that
/// survives a recomputation.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub struct ScheduleEntry {
    pub id: u32,
    pub hour: u32,
    pub minute: u32,
    pub amount: u32,
    pub status: EntryStatus,
}

/// The in-progress edit of one slot. `id` is `None` until the device assigns
/// one, i.e. while adding a new entry. Field changes replace the whole value.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct EditScheduleEntry {
    pub id: Option<u32>,
    pub hour: u32,
    pub minute: u32,
    pub amount: u32,
}

impl EditScheduleEntry {
    pub fn from_entry(entry: &ScheduleEntry) -> Self {
        Self {
            id: Some(entry.id),
            hour: entry.hour,
            minute: entry.minute,
            amount: entry.amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_tokens_map_to_raw_statuses() {
        assert_eq!(
            EntryStatus::from_raw_token("dispensed"),
            Some(EntryStatus::Dispensed)
        );
        assert_eq!(
            EntryStatus::from_raw_token("pending"),
            Some(EntryStatus::Pending)
        );
    }

    #[test]
    fn derived_tokens_are_rejected() {
        assert_eq!(EntryStatus::from_raw_token("skipped"), None);
        assert_eq!(EntryStatus::from_raw_token("disabled"), None);
        assert_eq!(EntryStatus::from_raw_token("unknown"), None);
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&EntryStatus::Dispensing).expect("serialize");
        assert_eq!(json, "\"dispensing\"");
    }
}
