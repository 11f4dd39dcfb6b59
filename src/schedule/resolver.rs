use chrono::{NaiveDateTime, NaiveTime};

use crate::schedule::model::{EntryStatus, ScheduleEntry};

/// State of the schedule's master switch entity.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SwitchState {
    On,
    Off,
}

impl SwitchState {
    /// Anything other than an explicit "off" counts as on, including an
    /// unavailable switch entity.
    pub fn from_entity_state(state: &str) -> Self {
        if state.eq_ignore_ascii_case("off") {
            SwitchState::Off
        } else {
            SwitchState::On
        }
    }
}

/// Computes the status shown to the user for one entry.
///
/// Terminal statuses pass through untouched. A pending entry whose trigger
/// time already passed today resolves to `Skipped`; past-due wins over the
/// master switch, so an overdue entry on a disabled schedule still reads
/// `Skipped` rather than `Disabled`.
///
/// The comparison uses the viewer's clock; a device in another timezone is
/// a known limitation this resolver does not correct for.
pub fn display_status(
    entry: &ScheduleEntry,
    now: NaiveDateTime,
    switch: SwitchState,
) -> EntryStatus {
    if entry.status != EntryStatus::Pending {
        return entry.status;
    }

    let Some(scheduled) = NaiveTime::from_hms_opt(entry.hour, entry.minute, 0) else {
        return entry.status;
    };
    if now.time() > scheduled {
        return EntryStatus::Skipped;
    }
    if switch == SwitchState::Off {
        return EntryStatus::Disabled;
    }
    EntryStatus::Pending
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};

    use super::*;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 8, 29)
            .expect("valid date")
            .and_hms_opt(hour, minute, 0)
            .expect("valid time")
    }

    fn entry(hour: u32, minute: u32, status: EntryStatus) -> ScheduleEntry {
        ScheduleEntry {
            id: 0,
            hour,
            minute,
            amount: 5,
            status,
        }
    }

    #[test]
    fn terminal_statuses_pass_through() {
        let dispensed = entry(6, 0, EntryStatus::Dispensed);
        assert_eq!(
            display_status(&dispensed, at(23, 0), SwitchState::Off),
            EntryStatus::Dispensed
        );
        let failed = entry(6, 0, EntryStatus::Failed);
        assert_eq!(
            display_status(&failed, at(5, 0), SwitchState::On),
            EntryStatus::Failed
        );
        let dispensing = entry(6, 0, EntryStatus::Dispensing);
        assert_eq!(
            display_status(&dispensing, at(6, 0), SwitchState::Off),
            EntryStatus::Dispensing
        );
    }

    #[test]
    fn pending_past_due_resolves_to_skipped() {
        let pending = entry(8, 30, EntryStatus::Pending);
        assert_eq!(
            display_status(&pending, at(9, 0), SwitchState::On),
            EntryStatus::Skipped
        );
    }

    #[test]
    fn past_due_wins_over_disabled_switch() {
        let pending = entry(8, 30, EntryStatus::Pending);
        assert_eq!(
            display_status(&pending, at(9, 0), SwitchState::Off),
            EntryStatus::Skipped
        );
    }

    #[test]
    fn pending_future_with_switch_off_is_disabled() {
        let pending = entry(20, 0, EntryStatus::Pending);
        assert_eq!(
            display_status(&pending, at(9, 0), SwitchState::Off),
            EntryStatus::Disabled
        );
    }

    #[test]
    fn pending_future_with_switch_on_stays_pending() {
        let pending = entry(20, 0, EntryStatus::Pending);
        assert_eq!(
            display_status(&pending, at(9, 0), SwitchState::On),
            EntryStatus::Pending
        );
    }

    #[test]
    fn exact_trigger_minute_is_not_past_due() {
        let pending = entry(9, 0, EntryStatus::Pending);
        assert_eq!(
            display_status(&pending, at(9, 0), SwitchState::On),
            EntryStatus::Pending
        );
    }

    #[test]
    fn switch_state_parses_entity_states() {
        assert_eq!(SwitchState::from_entity_state("off"), SwitchState::Off);
        assert_eq!(SwitchState::from_entity_state("on"), SwitchState::On);
        assert_eq!(
            SwitchState::from_entity_state("unavailable"),
            SwitchState::On
        );
    }
}
