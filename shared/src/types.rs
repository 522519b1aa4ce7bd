use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Shift Types
// ============================================================================

/// Resolve a wall-clock interval into concrete instants. An end time at or
/// before the start time means the interval crosses midnight and ends on the
/// following calendar day.
pub fn resolve_interval(
    date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
) -> (NaiveDateTime, NaiveDateTime) {
    let start = date.and_time(start_time);
    let mut end = date.and_time(end_time);
    if end_time <= start_time {
        end += Duration::days(1);
    }
    (start, end)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    pub id: Uuid,
    pub name: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_published: bool,
    pub week_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Shift {
    /// Concrete start/end instants of this shift, midnight crossing applied.
    pub fn interval(&self) -> (NaiveDateTime, NaiveDateTime) {
        resolve_interval(self.date, self.start_time, self.end_time)
    }

    pub fn crosses_midnight(&self) -> bool {
        self.end_time <= self.start_time
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShiftRequest {
    pub name: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub ignore_clash: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateShiftRequest {
    pub name: Option<String>,
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    #[serde(default)]
    pub ignore_clash: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftListQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// What the API returns for a shift: the stored fields plus the resolved
/// start/end instants, so clients never re-derive midnight-crossing math.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftResponse {
    pub id: Uuid,
    pub name: String,
    pub date: NaiveDate,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub is_published: bool,
    pub week_id: Option<Uuid>,
}

impl From<&Shift> for ShiftResponse {
    fn from(shift: &Shift) -> Self {
        let (start, end) = shift.interval();
        Self {
            id: shift.id,
            name: shift.name.clone(),
            date: shift.date,
            start_time: start,
            end_time: end,
            is_published: shift.is_published,
            week_id: shift.week_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClashCheckRequest {
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub exclude_shift_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClashCheckResponse {
    pub has_clash: bool,
    pub conflicting_shift: Option<ShiftResponse>,
}

// ============================================================================
// Week Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Week {
    pub id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Week {
    /// A date belongs to this week if it falls anywhere between the Monday
    /// and the Sunday, both days included.
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekWithShifts {
    pub week: Week,
    pub shifts: Vec<ShiftResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedCheckResponse {
    pub is_published: bool,
}

// ============================================================================
// API Response Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSuccess<T> {
    pub data: T,
}

impl<T> ApiSuccess<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

// ============================================================================
// Tests
// ============================================================================
