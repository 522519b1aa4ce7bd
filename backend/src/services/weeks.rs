use chrono::{Datelike, Duration, NaiveDate, Utc};
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{ShiftRow, WeekRow};
use shared::{Shift, Week};

#[derive(Debug, Error)]
pub enum WeekError {
    #[error("Week not found")]
    NotFound,
    #[error("Week is already published")]
    AlreadyPublished,
    #[error("Week is not published")]
    NotPublished,
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// The Monday on or before `date`. A Sunday maps six days back.
pub fn week_start_for(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// The Sunday closing the week that contains `date`.
pub fn week_end_for(date: NaiveDate) -> NaiveDate {
    week_start_for(date) + Duration::days(6)
}

async fn find_week_row_by_start(
    pool: &SqlitePool,
    start_date: NaiveDate,
) -> Result<Option<WeekRow>, WeekError> {
    let row: Option<WeekRow> = sqlx::query_as("SELECT * FROM weeks WHERE start_date = ?")
        .bind(start_date)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Lookup-or-create the week containing `date`. Weeks are keyed by their
/// Monday, so every date in the same Monday-Sunday span resolves to the same
/// row. The UNIQUE constraint on start_date plus INSERT OR IGNORE makes
/// concurrent resolution of an uncovered date converge on a single row.
pub async fn resolve_week_for_date(
    pool: &SqlitePool,
    date: NaiveDate,
) -> Result<Week, WeekError> {
    let start_date = week_start_for(date);

    if let Some(row) = find_week_row_by_start(pool, start_date).await? {
        return Ok(row.to_shared());
    }

    let now = Utc::now();
    sqlx::query(
        r#"
        INSERT OR IGNORE INTO weeks (id, start_date, end_date, is_published, created_at, updated_at)
        VALUES (?, ?, ?, FALSE, ?, ?)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(start_date)
    .bind(week_end_for(date))
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    let row = find_week_row_by_start(pool, start_date)
        .await?
        .ok_or(WeekError::NotFound)?;

    Ok(row.to_shared())
}

/// Fetch a week and the shifts it owns, ordered by date then start time.
pub async fn find_week_with_shifts(
    pool: &SqlitePool,
    week_id: &Uuid,
) -> Result<(Week, Vec<Shift>), WeekError> {
    let week: WeekRow = sqlx::query_as("SELECT * FROM weeks WHERE id = ?")
        .bind(week_id.to_string())
        .fetch_optional(pool)
        .await?
        .ok_or(WeekError::NotFound)?;

    let shifts: Vec<ShiftRow> =
        sqlx::query_as("SELECT * FROM shifts WHERE week_id = ? ORDER BY date, start_time")
            .bind(week_id.to_string())
            .fetch_all(pool)
            .await?;

    Ok((
        week.to_shared(),
        shifts.iter().map(ShiftRow::to_shared).collect(),
    ))
}

/// Publish a week: flips the week flag, stamps published_at and cascades
/// is_published onto every owned shift. Week flag and shift flags flip in
/// one transaction, so readers never observe a half-applied cascade.
pub async fn publish_week(pool: &SqlitePool, week_id: &Uuid) -> Result<Week, WeekError> {
    let mut tx = pool.begin().await?;

    let week: WeekRow = sqlx::query_as("SELECT * FROM weeks WHERE id = ?")
        .bind(week_id.to_string())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(WeekError::NotFound)?;

    if week.is_published {
        return Err(WeekError::AlreadyPublished);
    }

    let now = Utc::now();
    sqlx::query("UPDATE weeks SET is_published = TRUE, published_at = ?, updated_at = ? WHERE id = ?")
        .bind(now)
        .bind(now)
        .bind(week_id.to_string())
        .execute(&mut *tx)
        .await?;

    sqlx::query("UPDATE shifts SET is_published = TRUE, updated_at = ? WHERE week_id = ?")
        .bind(now)
        .bind(week_id.to_string())
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    let mut published = week.to_shared();
    published.is_published = true;
    published.published_at = Some(now);
    published.updated_at = now;
    Ok(published)
}

/// Unpublish a week: clears the flag and published_at, cascades the cleared
/// flag onto every owned shift in the same transaction.
pub async fn unpublish_week(pool: &SqlitePool, week_id: &Uuid) -> Result<Week, WeekError> {
    let mut tx = pool.begin().await?;

    let week: WeekRow = sqlx::query_as("SELECT * FROM weeks WHERE id = ?")
        .bind(week_id.to_string())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(WeekError::NotFound)?;

    if !week.is_published {
        return Err(WeekError::NotPublished);
    }

    let now = Utc::now();
    sqlx::query(
        "UPDATE weeks SET is_published = FALSE, published_at = NULL, updated_at = ? WHERE id = ?",
    )
    .bind(now)
    .bind(week_id.to_string())
    .execute(&mut *tx)
    .await?;

    sqlx::query("UPDATE shifts SET is_published = FALSE, updated_at = ? WHERE week_id = ?")
        .bind(now)
        .bind(week_id.to_string())
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    let mut unpublished = week.to_shared();
    unpublished.is_published = false;
    unpublished.published_at = None;
    unpublished.updated_at = now;
    Ok(unpublished)
}

/// Whether `date` falls inside a published week. A missing week row simply
/// means false.
pub async fn is_date_published(pool: &SqlitePool, date: NaiveDate) -> Result<bool, WeekError> {
    let row: Option<WeekRow> =
        sqlx::query_as("SELECT * FROM weeks WHERE start_date = ? AND is_published = TRUE")
            .bind(week_start_for(date))
            .fetch_optional(pool)
            .await?;

    Ok(row.is_some())
}
