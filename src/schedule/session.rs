use crate::device::DeviceLimits;
use crate::schedule::allocator::next_id;
use crate::schedule::model::{EditScheduleEntry, ScheduleEntry};

/// The slot fields a save carries to the device.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct SlotWrite {
    pub id: u32,
    pub hour: u32,
    pub minute: u32,
    pub amount: u32,
}

/// Command a successful save emits, selected by whether the draft already
/// had a device-assigned identifier.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SaveRequest {
    Add(SlotWrite),
    Edit(SlotWrite),
}

impl SaveRequest {
    pub fn write(&self) -> &SlotWrite {
        match self {
            SaveRequest::Add(write) | SaveRequest::Edit(write) => write,
        }
    }
}

/// Lifecycle of the single in-progress edit: closed until an add or edit
/// action opens a draft, closed again by cancel or a valid save. A save is
/// fire-and-forget; the next device state update is the only confirmation.
#[derive(Debug, Default)]
pub struct EditSession {
    draft: Option<EditScheduleEntry>,
}

impl EditSession {
    pub fn draft(&self) -> Option<&EditScheduleEntry> {
        self.draft.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.draft.is_some()
    }

    /// Opens a draft for a new entry at midnight with the device's minimum
    /// amount. The identifier is assigned at save time, not here, to narrow
    /// the race against concurrently added entries.
    pub fn open_add(&mut self, limits: &DeviceLimits) {
        self.draft = Some(EditScheduleEntry {
            id: None,
            hour: 0,
            minute: 0,
            amount: limits.min_amount,
        });
    }

    pub fn open_edit(&mut self, entry: &ScheduleEntry) {
        self.draft = Some(EditScheduleEntry::from_entry(entry));
    }

    pub fn set_time(&mut self, hour: u32, minute: u32) {
        if let Some(draft) = self.draft {
            self.draft = Some(EditScheduleEntry {
                hour,
                minute,
                ..draft
            });
        }
    }

    pub fn set_amount(&mut self, amount: u32) {
        if let Some(draft) = self.draft {
            self.draft = Some(EditScheduleEntry { amount, ..draft });
        }
    }

    pub fn cancel(&mut self) {
        self.draft = None;
    }

    /// Whether the open draft passes the commit gate: time and amount in
    /// range, and for an existing entry at least one field changed against
    /// the last parsed snapshot (no-op saves are rejected).
    pub fn can_save(&self, entries: &[ScheduleEntry], limits: &DeviceLimits) -> bool {
        let Some(draft) = &self.draft else {
            return false;
        };
        if draft.hour > 23 || draft.minute > 59 {
            return false;
        }
        if draft.amount < limits.min_amount || draft.amount > limits.max_amount {
            return false;
        }

        match draft.id {
            None => true,
            Some(id) => {
                // An entry that vanished from the device since the draft
                // opened is treated as changed.
                let unchanged = entries.iter().find(|entry| entry.id == id).map(|entry| {
                    entry.hour == draft.hour
                        && entry.minute == draft.minute
                        && entry.amount == draft.amount
                });
                unchanged != Some(true)
            }
        }
    }

    /// Commits the draft: validates, allocates an identifier for new
    /// entries, closes the session, and returns the command to dispatch.
    /// An invalid draft stays open and yields `None`.
    pub fn save(
        &mut self,
        entries: &[ScheduleEntry],
        limits: &DeviceLimits,
    ) -> Option<SaveRequest> {
        if !self.can_save(entries, limits) {
            return None;
        }
        let draft = self.draft.take()?;
        let write = |id| SlotWrite {
            id,
            hour: draft.hour,
            minute: draft.minute,
            amount: draft.amount,
        };
        Some(match draft.id {
            None => {
                let used: Vec<u32> = entries.iter().map(|entry| entry.id).collect();
                SaveRequest::Add(write(next_id(&used)))
            }
            Some(id) => SaveRequest::Edit(write(id)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::model::EntryStatus;

    fn limits() -> DeviceLimits {
        DeviceLimits {
            max_entries: 10,
            min_amount: 1,
            max_amount: 30,
            step_amount: 1,
        }
    }

    fn entry(id: u32, hour: u32, minute: u32, amount: u32) -> ScheduleEntry {
        ScheduleEntry {
            id,
            hour,
            minute,
            amount,
            status: EntryStatus::Pending,
        }
    }

    #[test]
    fn add_draft_starts_at_midnight_with_minimum_amount() {
        let mut session = EditSession::default();
        session.open_add(&limits());
        let draft = session.draft().expect("open draft");
        assert_eq!(draft.id, None);
        assert_eq!((draft.hour, draft.minute), (0, 0));
        assert_eq!(draft.amount, 1);
    }

    #[test]
    fn field_changes_replace_the_draft() {
        let mut session = EditSession::default();
        session.open_add(&limits());
        session.set_time(7, 45);
        session.set_amount(4);
        let draft = session.draft().expect("open draft");
        assert_eq!((draft.hour, draft.minute, draft.amount), (7, 45, 4));
    }

    #[test]
    fn field_changes_without_a_draft_are_ignored() {
        let mut session = EditSession::default();
        session.set_time(7, 45);
        session.set_amount(4);
        assert!(!session.is_open());
    }

    #[test]
    fn cancel_discards_the_draft() {
        let mut session = EditSession::default();
        session.open_add(&limits());
        session.cancel();
        assert!(!session.is_open());
        assert_eq!(session.save(&[], &limits()), None);
    }

    #[test]
    fn amount_above_maximum_blocks_save() {
        let mut session = EditSession::default();
        session.open_add(&limits());
        session.set_amount(31);
        assert!(!session.can_save(&[], &limits()));
        assert_eq!(session.save(&[], &limits()), None);
        // The draft survives a rejected save.
        assert!(session.is_open());

        session.set_amount(30);
        assert!(session.can_save(&[], &limits()));
    }

    #[test]
    fn out_of_range_time_blocks_save() {
        let mut session = EditSession::default();
        session.open_add(&limits());
        session.set_time(24, 0);
        assert!(!session.can_save(&[], &limits()));
        session.set_time(23, 60);
        assert!(!session.can_save(&[], &limits()));
        session.set_time(23, 59);
        assert!(session.can_save(&[], &limits()));
    }

    #[test]
    fn save_of_new_entry_fills_the_first_free_id() {
        let entries = [
            entry(0, 6, 0, 2),
            entry(1, 7, 0, 2),
            entry(2, 8, 0, 2),
            entry(4, 9, 0, 2),
        ];
        let mut session = EditSession::default();
        session.open_add(&limits());
        session.set_time(10, 30);
        session.set_amount(5);

        let request = session.save(&entries, &limits()).expect("valid save");
        assert_eq!(
            request,
            SaveRequest::Add(SlotWrite {
                id: 3,
                hour: 10,
                minute: 30,
                amount: 5,
            })
        );
        assert!(!session.is_open());
    }

    #[test]
    fn unchanged_existing_entry_cannot_be_saved() {
        let entries = [entry(2, 8, 0, 5)];
        let mut session = EditSession::default();
        session.open_edit(&entries[0]);
        assert!(!session.can_save(&entries, &limits()));

        session.set_amount(6);
        let request = session.save(&entries, &limits()).expect("changed draft");
        assert_eq!(
            request,
            SaveRequest::Edit(SlotWrite {
                id: 2,
                hour: 8,
                minute: 0,
                amount: 6,
            })
        );
    }

    #[test]
    fn editing_a_vanished_entry_is_still_committable() {
        let mut session = EditSession::default();
        session.open_edit(&entry(5, 8, 0, 5));
        // Device rewrote its table; id 5 is gone from the parse result.
        let request = session.save(&[], &limits()).expect("vanished entry");
        assert!(matches!(request, SaveRequest::Edit(write) if write.id == 5));
    }
}
