use chrono::{NaiveDate, NaiveTime, Utc};
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::ShiftRow;
use crate::services::{overlap, weeks};
use shared::Shift;

#[derive(Debug, Error)]
pub enum ShiftError {
    #[error("Shift not found")]
    NotFound,
    #[error("Shift overlaps with existing shift")]
    Clash(Box<Shift>),
    #[error("Week is published, shifts can no longer be edited")]
    WeekPublished,
    #[error(transparent)]
    WeekError(#[from] weeks::WeekError),
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Validated input for a shift creation, parsed once at the HTTP boundary.
#[derive(Debug, Clone)]
pub struct NewShift {
    pub name: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub ignore_clash: bool,
}

/// Validated partial update; absent fields keep the stored value.
#[derive(Debug, Clone, Default)]
pub struct ShiftChanges {
    pub name: Option<String>,
    pub date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub ignore_clash: bool,
}

pub async fn list_shifts(
    pool: &SqlitePool,
    date_range: Option<(NaiveDate, NaiveDate)>,
) -> Result<Vec<Shift>, ShiftError> {
    let rows: Vec<ShiftRow> = match date_range {
        Some((start, end)) => {
            sqlx::query_as(
                "SELECT * FROM shifts WHERE date BETWEEN ? AND ? ORDER BY date, start_time",
            )
            .bind(start)
            .bind(end)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as("SELECT * FROM shifts ORDER BY date, start_time")
                .fetch_all(pool)
                .await?
        }
    };

    Ok(rows.iter().map(ShiftRow::to_shared).collect())
}

pub async fn get_shift(pool: &SqlitePool, shift_id: &Uuid) -> Result<Option<Shift>, ShiftError> {
    let row: Option<ShiftRow> = sqlx::query_as("SELECT * FROM shifts WHERE id = ?")
        .bind(shift_id.to_string())
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|r| r.to_shared()))
}

/// Candidate set for overlap checks: every shift on the given calendar date.
pub async fn load_shifts_by_date(
    pool: &SqlitePool,
    date: NaiveDate,
) -> Result<Vec<Shift>, ShiftError> {
    let rows: Vec<ShiftRow> =
        sqlx::query_as("SELECT * FROM shifts WHERE date = ? ORDER BY start_time")
            .bind(date)
            .fetch_all(pool)
            .await?;

    Ok(rows.iter().map(ShiftRow::to_shared).collect())
}

pub async fn create_shift(pool: &SqlitePool, new: &NewShift) -> Result<Shift, ShiftError> {
    if weeks::is_date_published(pool, new.date).await? {
        return Err(ShiftError::WeekPublished);
    }

    let existing = load_shifts_by_date(pool, new.date).await?;
    let clashes = overlap::find_overlapping(
        new.date,
        new.start_time,
        new.end_time,
        &existing,
        None,
    );
    if let Some(conflict) = clashes.first() {
        if !new.ignore_clash {
            return Err(ShiftError::Clash(Box::new((*conflict).clone())));
        }
    }

    let week = weeks::resolve_week_for_date(pool, new.date).await?;

    let id = Uuid::new_v4();
    let now = Utc::now();
    sqlx::query(
        r#"
        INSERT INTO shifts (id, name, date, start_time, end_time, is_published, week_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(&new.name)
    .bind(new.date)
    .bind(new.start_time)
    .bind(new.end_time)
    .bind(week.is_published)
    .bind(week.id.to_string())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(Shift {
        id,
        name: new.name.clone(),
        date: new.date,
        start_time: new.start_time,
        end_time: new.end_time,
        is_published: week.is_published,
        week_id: Some(week.id),
        created_at: now,
        updated_at: now,
    })
}

pub async fn update_shift(
    pool: &SqlitePool,
    shift_id: &Uuid,
    changes: &ShiftChanges,
) -> Result<Shift, ShiftError> {
    let mut shift = get_shift(pool, shift_id).await?.ok_or(ShiftError::NotFound)?;

    let date = changes.date.unwrap_or(shift.date);
    let start_time = changes.start_time.unwrap_or(shift.start_time);
    let end_time = changes.end_time.unwrap_or(shift.end_time);

    // Both the current owning week and the target week must be editable.
    if weeks::is_date_published(pool, shift.date).await?
        || (date != shift.date && weeks::is_date_published(pool, date).await?)
    {
        return Err(ShiftError::WeekPublished);
    }

    let existing = load_shifts_by_date(pool, date).await?;
    let clashes =
        overlap::find_overlapping(date, start_time, end_time, &existing, Some(*shift_id));
    if let Some(conflict) = clashes.first() {
        if !changes.ignore_clash {
            return Err(ShiftError::Clash(Box::new((*conflict).clone())));
        }
    }

    if date != shift.date {
        let week = weeks::resolve_week_for_date(pool, date).await?;
        shift.week_id = Some(week.id);
    }

    if let Some(ref name) = changes.name {
        shift.name = name.clone();
    }
    shift.date = date;
    shift.start_time = start_time;
    shift.end_time = end_time;

    let now = Utc::now();
    shift.updated_at = now;

    sqlx::query(
        r#"
        UPDATE shifts SET name = ?, date = ?, start_time = ?, end_time = ?, week_id = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&shift.name)
    .bind(shift.date)
    .bind(shift.start_time)
    .bind(shift.end_time)
    .bind(shift.week_id.map(|id| id.to_string()))
    .bind(now)
    .bind(shift_id.to_string())
    .execute(pool)
    .await?;

    Ok(shift)
}

pub async fn delete_shift(pool: &SqlitePool, shift_id: &Uuid) -> Result<(), ShiftError> {
    let shift = get_shift(pool, shift_id).await?.ok_or(ShiftError::NotFound)?;

    if weeks::is_date_published(pool, shift.date).await? {
        return Err(ShiftError::WeekPublished);
    }

    sqlx::query("DELETE FROM shifts WHERE id = ?")
        .bind(shift_id.to_string())
        .execute(pool)
        .await?;

    Ok(())
}

/// The clash probe: all stored shifts conflicting with the candidate
/// interval, in stored order. Does not gate on publication state.
pub async fn check_clash(
    pool: &SqlitePool,
    date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    exclude_shift_id: Option<Uuid>,
) -> Result<Vec<Shift>, ShiftError> {
    let existing = load_shifts_by_date(pool, date).await?;
    let clashes = overlap::find_overlapping(date, start_time, end_time, &existing, exclude_shift_id);

    Ok(clashes.into_iter().cloned().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn new_shift(name: &str, d: NaiveDate, start: NaiveTime, end: NaiveTime) -> NewShift {
        NewShift {
            name: name.to_string(),
            date: d,
            start_time: start,
            end_time: end,
            ignore_clash: false,
        }
    }

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();

        sqlx::query(
            r#"
            CREATE TABLE weeks (
                id TEXT PRIMARY KEY NOT NULL,
                start_date DATE NOT NULL UNIQUE,
                end_date DATE NOT NULL,
                is_published BOOLEAN NOT NULL DEFAULT FALSE,
                published_at DATETIME,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .unwrap();

        sqlx::query(
            r#"
            CREATE TABLE shifts (
                id TEXT PRIMARY KEY NOT NULL,
                name TEXT NOT NULL,
                date DATE NOT NULL,
                start_time TIME NOT NULL,
                end_time TIME NOT NULL,
                is_published BOOLEAN NOT NULL DEFAULT FALSE,
                week_id TEXT REFERENCES weeks(id),
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .unwrap();

        pool
    }

    #[tokio::test]
    async fn test_create_resolves_owning_week() {
        let pool = setup_test_db().await;

        let shift = create_shift(
            &pool,
            &new_shift("Morning desk", date(2024, 3, 7), time(9, 0), time(17, 0)),
        )
        .await
        .unwrap();

        assert!(shift.week_id.is_some());
        assert!(!shift.is_published);

        let week = weeks::resolve_week_for_date(&pool, date(2024, 3, 7))
            .await
            .unwrap();
        assert_eq!(shift.week_id, Some(week.id));
        assert_eq!(week.start_date, date(2024, 3, 4));
    }

    #[tokio::test]
    async fn test_create_rejects_overlap() {
        let pool = setup_test_db().await;
        let first = create_shift(
            &pool,
            &new_shift("Day", date(2024, 3, 4), time(9, 0), time(17, 0)),
        )
        .await
        .unwrap();

        let result = create_shift(
            &pool,
            &new_shift("Late", date(2024, 3, 4), time(16, 0), time(18, 0)),
        )
        .await;

        match result {
            Err(ShiftError::Clash(conflict)) => assert_eq!(conflict.id, first.id),
            other => panic!("expected clash, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_allows_touching_boundary() {
        let pool = setup_test_db().await;
        create_shift(
            &pool,
            &new_shift("Day", date(2024, 3, 4), time(9, 0), time(17, 0)),
        )
        .await
        .unwrap();

        let evening = create_shift(
            &pool,
            &new_shift("Evening", date(2024, 3, 4), time(17, 0), time(18, 0)),
        )
        .await
        .unwrap();

        assert_eq!(evening.start_time, time(17, 0));
    }

    #[tokio::test]
    async fn test_create_ignore_clash_overrides() {
        let pool = setup_test_db().await;
        create_shift(
            &pool,
            &new_shift("Day", date(2024, 3, 4), time(9, 0), time(17, 0)),
        )
        .await
        .unwrap();

        let mut overlapping = new_shift("Cover", date(2024, 3, 4), time(16, 0), time(18, 0));
        overlapping.ignore_clash = true;

        let shift = create_shift(&pool, &overlapping).await.unwrap();
        assert_eq!(shift.name, "Cover");
    }

    #[tokio::test]
    async fn test_create_blocked_in_published_week() {
        let pool = setup_test_db().await;
        let shift = create_shift(
            &pool,
            &new_shift("Day", date(2024, 3, 4), time(9, 0), time(17, 0)),
        )
        .await
        .unwrap();
        weeks::publish_week(&pool, &shift.week_id.unwrap())
            .await
            .unwrap();

        let result = create_shift(
            &pool,
            &new_shift("Another", date(2024, 3, 5), time(9, 0), time(12, 0)),
        )
        .await;

        assert!(matches!(result, Err(ShiftError::WeekPublished)));
    }

    #[tokio::test]
    async fn test_update_excludes_own_record() {
        let pool = setup_test_db().await;
        let shift = create_shift(
            &pool,
            &new_shift("Day", date(2024, 3, 4), time(9, 0), time(17, 0)),
        )
        .await
        .unwrap();

        // Shrinking the same slot clashes only with itself, which is excluded
        let changes = ShiftChanges {
            start_time: Some(time(10, 0)),
            ..Default::default()
        };
        let updated = update_shift(&pool, &shift.id, &changes).await.unwrap();

        assert_eq!(updated.start_time, time(10, 0));
        assert_eq!(updated.end_time, time(17, 0));
        assert_eq!(updated.name, "Day");
    }

    #[tokio::test]
    async fn test_update_rejects_overlap_with_other_shift() {
        let pool = setup_test_db().await;
        create_shift(
            &pool,
            &new_shift("Morning", date(2024, 3, 4), time(9, 0), time(12, 0)),
        )
        .await
        .unwrap();
        let afternoon = create_shift(
            &pool,
            &new_shift("Afternoon", date(2024, 3, 4), time(13, 0), time(17, 0)),
        )
        .await
        .unwrap();

        let changes = ShiftChanges {
            start_time: Some(time(11, 0)),
            ..Default::default()
        };
        let result = update_shift(&pool, &afternoon.id, &changes).await;

        assert!(matches!(result, Err(ShiftError::Clash(_))));
    }

    #[tokio::test]
    async fn test_update_moves_shift_to_new_week() {
        let pool = setup_test_db().await;
        let shift = create_shift(
            &pool,
            &new_shift("Day", date(2024, 3, 4), time(9, 0), time(17, 0)),
        )
        .await
        .unwrap();
        let old_week_id = shift.week_id;

        let changes = ShiftChanges {
            date: Some(date(2024, 3, 11)),
            ..Default::default()
        };
        let updated = update_shift(&pool, &shift.id, &changes).await.unwrap();

        assert_eq!(updated.date, date(2024, 3, 11));
        assert_ne!(updated.week_id, old_week_id);

        let next_week = weeks::resolve_week_for_date(&pool, date(2024, 3, 11))
            .await
            .unwrap();
        assert_eq!(updated.week_id, Some(next_week.id));
    }

    #[tokio::test]
    async fn test_update_blocked_in_published_week() {
        let pool = setup_test_db().await;
        let shift = create_shift(
            &pool,
            &new_shift("Day", date(2024, 3, 4), time(9, 0), time(17, 0)),
        )
        .await
        .unwrap();
        weeks::publish_week(&pool, &shift.week_id.unwrap())
            .await
            .unwrap();

        let changes = ShiftChanges {
            name: Some("Renamed".to_string()),
            ..Default::default()
        };
        let result = update_shift(&pool, &shift.id, &changes).await;

        assert!(matches!(result, Err(ShiftError::WeekPublished)));
    }

    #[tokio::test]
    async fn test_update_missing_shift_not_found() {
        let pool = setup_test_db().await;

        let result = update_shift(&pool, &Uuid::new_v4(), &ShiftChanges::default()).await;
        assert!(matches!(result, Err(ShiftError::NotFound)));
    }

    #[tokio::test]
    async fn test_delete_shift() {
        let pool = setup_test_db().await;
        let shift = create_shift(
            &pool,
            &new_shift("Day", date(2024, 3, 4), time(9, 0), time(17, 0)),
        )
        .await
        .unwrap();

        delete_shift(&pool, &shift.id).await.unwrap();

        assert!(get_shift(&pool, &shift.id).await.unwrap().is_none());
        let result = delete_shift(&pool, &shift.id).await;
        assert!(matches!(result, Err(ShiftError::NotFound)));
    }

    #[tokio::test]
    async fn test_delete_blocked_in_published_week() {
        let pool = setup_test_db().await;
        let shift = create_shift(
            &pool,
            &new_shift("Day", date(2024, 3, 4), time(9, 0), time(17, 0)),
        )
        .await
        .unwrap();
        weeks::publish_week(&pool, &shift.week_id.unwrap())
            .await
            .unwrap();

        let result = delete_shift(&pool, &shift.id).await;
        assert!(matches!(result, Err(ShiftError::WeekPublished)));
    }

    #[tokio::test]
    async fn test_check_clash_reports_conflicts() {
        let pool = setup_test_db().await;
        let shift = create_shift(
            &pool,
            &new_shift("Day", date(2024, 3, 4), time(9, 0), time(17, 0)),
        )
        .await
        .unwrap();

        let clashes = check_clash(&pool, date(2024, 3, 4), time(16, 0), time(18, 0), None)
            .await
            .unwrap();
        assert_eq!(clashes.len(), 1);
        assert_eq!(clashes[0].id, shift.id);

        let clashes = check_clash(
            &pool,
            date(2024, 3, 4),
            time(16, 0),
            time(18, 0),
            Some(shift.id),
        )
        .await
        .unwrap();
        assert!(clashes.is_empty());

        let clashes = check_clash(&pool, date(2024, 3, 4), time(17, 0), time(18, 0), None)
            .await
            .unwrap();
        assert!(clashes.is_empty());
    }

    #[tokio::test]
    async fn test_list_shifts_date_range() {
        let pool = setup_test_db().await;
        create_shift(
            &pool,
            &new_shift("First", date(2024, 3, 4), time(9, 0), time(17, 0)),
        )
        .await
        .unwrap();
        create_shift(
            &pool,
            &new_shift("Second", date(2024, 3, 11), time(9, 0), time(17, 0)),
        )
        .await
        .unwrap();

        let all = list_shifts(&pool, None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "First");

        let filtered = list_shifts(&pool, Some((date(2024, 3, 10), date(2024, 3, 12))))
            .await
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name, "Second");
    }
}
