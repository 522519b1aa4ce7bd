use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for shifts
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ShiftRow {
    pub id: String,
    pub name: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_published: bool,
    pub week_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ShiftRow {
    pub fn to_shared(&self) -> shared::Shift {
        shared::Shift {
            id: Uuid::parse_str(&self.id).unwrap(),
            name: self.name.clone(),
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
            is_published: self.is_published,
            week_id: self
                .week_id
                .as_deref()
                .map(|id| Uuid::parse_str(id).unwrap()),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_row_to_shared() {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let week_id = Uuid::new_v4();

        let row = ShiftRow {
            id: id.to_string(),
            name: "Morning desk".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            is_published: false,
            week_id: Some(week_id.to_string()),
            created_at: now,
            updated_at: now,
        };

        let shift = row.to_shared();

        assert_eq!(shift.id, id);
        assert_eq!(shift.name, "Morning desk");
        assert_eq!(shift.week_id, Some(week_id));
        assert!(!shift.is_published);
    }

    #[test]
    fn test_shift_row_without_week() {
        let now = Utc::now();

        let row = ShiftRow {
            id: Uuid::new_v4().to_string(),
            name: "Unassigned".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            start_time: NaiveTime::from_hms_opt(8, 30, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            is_published: false,
            week_id: None,
            created_at: now,
            updated_at: now,
        };

        let shift = row.to_shared();

        assert!(shift.week_id.is_none());
    }
}
