//! Slot occupancy rules over a snapshot of reservations.
//!
//! A slot is a (calendar day, time label) pair. Only confirmed reservations
//! occupy one; cancelled records are ignored, which is what frees a slot for
//! rebooking.

use std::collections::HashSet;

use agenda_domain::{CalendarDay, Reservation};

/// The confirmed reservation holding (`date`, `time_slot`), if any.
pub fn find_conflict<'a>(
    records: &'a [Reservation],
    date: &CalendarDay,
    time_slot: &str,
) -> Option<&'a Reservation> {
    records.iter().find(|r| r.occupies(date, time_slot))
}

pub fn has_conflict(records: &[Reservation], date: &CalendarDay, time_slot: &str) -> bool {
    find_conflict(records, date, time_slot).is_some()
}

/// Occupied slot labels for `date`, in stored order, without duplicates.
pub fn active_slots_for_date(records: &[Reservation], date: &CalendarDay) -> Vec<String> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter(|r| r.status.is_active() && r.date == *date)
        .filter(|r| seen.insert(r.time_slot.as_str()))
        .map(|r| r.time_slot.clone())
        .collect()
}
