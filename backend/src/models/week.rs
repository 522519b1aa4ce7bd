use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for weeks
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct WeekRow {
    pub id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WeekRow {
    pub fn to_shared(&self) -> shared::Week {
        shared::Week {
            id: Uuid::parse_str(&self.id).unwrap(),
            start_date: self.start_date,
            end_date: self.end_date,
            is_published: self.is_published,
            published_at: self.published_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
