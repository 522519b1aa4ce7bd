use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use uuid::Uuid;

use shared::{resolve_interval, Shift};

/// Parse a wall-clock time, accepting `HH:MM:SS` and `HH:MM`
pub fn parse_time_of_day(input: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(input, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(input, "%H:%M"))
        .ok()
}

/// Open-interval intersection: touching endpoints do not count as overlap
pub fn overlaps(a: (NaiveDateTime, NaiveDateTime), b: (NaiveDateTime, NaiveDateTime)) -> bool {
    a.0 < b.1 && a.1 > b.0
}

/// Filter `existing` down to the shifts whose resolved interval clashes with
/// the candidate's. Input order is preserved. `exclude_id` drops a shift's
/// own row when an update is re-checked against the stored set.
///
/// `existing` is the set of shifts sharing the candidate's calendar date;
/// a prior day's midnight-crossing shift is not part of that set.
pub fn find_overlapping<'a>(
    date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    existing: &'a [Shift],
    exclude_id: Option<Uuid>,
) -> Vec<&'a Shift> {
    let candidate = resolve_interval(date, start_time, end_time);

    existing
        .iter()
        .filter(|shift| exclude_id.map_or(true, |excluded| shift.id != excluded))
        .filter(|shift| overlaps(candidate, shift.interval()))
        .collect()
}
