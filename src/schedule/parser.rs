use regex::Captures;

use crate::device::DeviceProfile;
use crate::schedule::model::{EMPTY_SLOT_HOUR, ScheduleEntry};

/// Extracts schedule entries from a raw device state string.
///
/// The profile grammar is applied repeatedly; extraction stops once
/// `max_entries` records have been consumed, whatever else the string still
/// holds. Empty-slot sentinels (`hour == 255`) and records with an unknown
/// status code or an out-of-range time are dropped. The result is sorted by
/// `(hour, minute)`, ties keeping extraction order.
///
/// An empty or unparseable string is an empty schedule, not an error.
pub fn parse_schedule(raw: &str, profile: &DeviceProfile) -> Vec<ScheduleEntry> {
    let mut entries: Vec<ScheduleEntry> = Vec::new();
    for caps in profile
        .pattern()
        .captures_iter(raw)
        .take(profile.limits.max_entries)
    {
        let Some(entry) = decode_record(&caps, profile) else {
            continue;
        };
        entries.push(entry);
    }
    // sort_by_key is stable, so equal times keep source order.
    entries.sort_by_key(|entry| (entry.hour, entry.minute));
    entries
}

fn decode_record(caps: &Captures<'_>, profile: &DeviceProfile) -> Option<ScheduleEntry> {
    let id = num_field(caps, "id")?;
    let hour = num_field(caps, "hour")?;
    let minute = num_field(caps, "minute")?;
    let amount = num_field(caps, "amount")?;
    let code = num_field(caps, "status")?;

    if hour == EMPTY_SLOT_HOUR {
        return None;
    }
    // Anything else outside the time-of-day range is device garbage.
    if hour > 23 || minute > 59 {
        return None;
    }
    // Unknown status codes drop the whole record, keeping EntryStatus
    // closed downstream.
    let status = profile.status_for(code)?;

    Some(ScheduleEntry {
        id,
        hour,
        minute,
        amount,
        status,
    })
}

fn num_field(caps: &Captures<'_>, name: &str) -> Option<u32> {
    caps.name(name)?.as_str().parse().ok()
}
