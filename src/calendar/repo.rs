use anyhow::Context;
use sqlx::{types::Json, PgPool};
use time::Date;
use uuid::Uuid;

use super::repo_types::{CalendarEventInput, CalendarEventRow};

const EVENT_COLUMNS: &str = "id, exam_name, description, form_fill_last_date, prelims_exam_date, \
     mains_exam_date, notification_url, is_active, created_at";

fn iso(dates: &[Date]) -> Vec<String> {
    dates.iter().map(ToString::to_string).collect()
}

pub async fn list(db: &PgPool, active_only: bool) -> anyhow::Result<Vec<CalendarEventRow>> {
    let rows = sqlx::query_as::<_, CalendarEventRow>(&format!(
        r#"
        SELECT {EVENT_COLUMNS}
        FROM calendar_events
        WHERE is_active OR NOT $1
        ORDER BY form_fill_last_date ASC
        "#
    ))
    .bind(active_only)
    .fetch_all(db)
    .await
    .context("list calendar events")?;
    Ok(rows)
}

pub async fn insert(db: &PgPool, input: &CalendarEventInput) -> anyhow::Result<CalendarEventRow> {
    let row = sqlx::query_as::<_, CalendarEventRow>(&format!(
        r#"
        INSERT INTO calendar_events
            (exam_name, description, form_fill_last_date, prelims_exam_date,
             mains_exam_date, notification_url, is_active)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {EVENT_COLUMNS}
        "#
    ))
    .bind(&input.exam_name)
    .bind(&input.description)
    .bind(input.form_fill_last_date)
    .bind(Json(iso(&input.prelims_exam_dates)))
    .bind(Json(iso(&input.mains_exam_dates)))
    .bind(&input.notification_url)
    .bind(input.is_active)
    .fetch_one(db)
    .await
    .context("insert calendar event")?;
    Ok(row)
}

pub async fn update(
    db: &PgPool,
    id: Uuid,
    input: &CalendarEventInput,
) -> anyhow::Result<Option<CalendarEventRow>> {
    let row = sqlx::query_as::<_, CalendarEventRow>(&format!(
        r#"
        UPDATE calendar_events
        SET exam_name = $2, description = $3, form_fill_last_date = $4,
            prelims_exam_date = $5, mains_exam_date = $6, notification_url = $7,
            is_active = $8
        WHERE id = $1
        RETURNING {EVENT_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&input.exam_name)
    .bind(&input.description)
    .bind(input.form_fill_last_date)
    .bind(Json(iso(&input.prelims_exam_dates)))
    .bind(Json(iso(&input.mains_exam_dates)))
    .bind(&input.notification_url)
    .bind(input.is_active)
    .fetch_optional(db)
    .await
    .context("update calendar event")?;
    Ok(row)
}

pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM calendar_events WHERE id = $1")
        .bind(id)
        .execute(db)
        .await
        .context("delete calendar event")?;
    Ok(res.rows_affected() == 1)
}

pub async fn toggle_active(db: &PgPool, id: Uuid) -> anyhow::Result<Option<CalendarEventRow>> {
    let row = sqlx::query_as::<_, CalendarEventRow>(&format!(
        "UPDATE calendar_events SET is_active = NOT is_active WHERE id = $1 RETURNING {EVENT_COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(db)
    .await
    .context("toggle calendar event")?;
    Ok(row)
}

pub async fn count_active(db: &PgPool) -> anyhow::Result<i64> {
    let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM calendar_events WHERE is_active")
        .fetch_one(db)
        .await
        .context("count calendar events")?;
    Ok(n)
}
