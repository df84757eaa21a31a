use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::MySqlPool;
use thiserror::Error;

use crate::model::attendance::{AttendanceRecord, AttendanceStatus};

use super::error::AttendanceError;
use super::reports::{
    AttendanceRow, DailySummary, ExportFilters, LateRow, ListFilters, ReportRow,
};

#[derive(Debug, Error)]
pub enum StoreError {
    /// The `(user_id, work_day)` uniqueness constraint fired.
    #[error("attendance already recorded for this user and day")]
    DuplicateDay,
    #[error(transparent)]
    Backend(#[from] sqlx::Error),
}

impl From<StoreError> for AttendanceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateDay => AttendanceError::AlreadyClockedIn,
            StoreError::Backend(e) => AttendanceError::Storage(e),
        }
    }
}

/// Durable home of attendance records. Implementations must make `insert`
/// atomic with respect to the per-day uniqueness constraint; the ledger
/// never does check-then-insert.
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Creates the day's record. `DuplicateDay` when one already exists for
    /// `(user_id, work_day)`, open or closed.
    async fn insert(
        &self,
        user_id: u64,
        work_day: NaiveDate,
        clock_in: NaiveDateTime,
        status: AttendanceStatus,
    ) -> Result<AttendanceRecord, StoreError>;

    async fn find_for_day(
        &self,
        user_id: u64,
        work_day: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError>;

    /// Sets `clock_out` iff it is still unset. Returns affected rows, so a
    /// lost race shows up as 0.
    async fn close(&self, record_id: u64, clock_out: NaiveDateTime) -> Result<u64, StoreError>;

    async fn list(
        &self,
        filters: &ListFilters,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<AttendanceRow>, StoreError>;

    async fn for_day(&self, day: NaiveDate) -> Result<Vec<ReportRow>, StoreError>;

    async fn late_for_day(&self, day: NaiveDate) -> Result<Vec<LateRow>, StoreError>;

    async fn summary_for_day(&self, day: NaiveDate) -> Result<DailySummary, StoreError>;

    async fn export(&self, filters: &ExportFilters) -> Result<Vec<ReportRow>, StoreError>;
}

/// MySQL-backed store. The schema carries
/// `UNIQUE KEY uq_attendance_user_day (user_id, work_day)`; a duplicate
/// insert surfaces as SQLSTATE 23000 and is translated to `DuplicateDay`.
#[derive(Clone)]
pub struct MySqlAttendanceStore {
    pool: MySqlPool,
}

impl MySqlAttendanceStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

/// Typed bind values for dynamically assembled WHERE clauses.
enum Bind {
    Date(NaiveDate),
    Text(String),
}

fn push_filters(filters: &ListFilters, conditions: &mut Vec<&'static str>, binds: &mut Vec<Bind>) {
    if let Some(date) = filters.date {
        conditions.push("attendance.work_day = ?");
        binds.push(Bind::Date(date));
    }
    if let Some(position) = &filters.position {
        conditions.push("users.position = ?");
        binds.push(Bind::Text(position.clone()));
    }
    if let Some(name) = &filters.name_contains {
        conditions.push("users.name LIKE ?");
        binds.push(Bind::Text(format!("%{name}%")));
    }
}

fn where_clause(conditions: &[&str]) -> String {
    if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    }
}

#[async_trait]
impl AttendanceStore for MySqlAttendanceStore {
    async fn insert(
        &self,
        user_id: u64,
        work_day: NaiveDate,
        clock_in: NaiveDateTime,
        status: AttendanceStatus,
    ) -> Result<AttendanceRecord, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance (user_id, work_day, clock_in, status)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(work_day)
        .bind(clock_in)
        .bind(status)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(AttendanceRecord {
                id: done.last_insert_id(),
                user_id,
                work_day,
                clock_in,
                clock_out: None,
                status,
            }),
            Err(e) => {
                // Duplicate clock-in for the same day
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.code().as_deref() == Some("23000") {
                        return Err(StoreError::DuplicateDay);
                    }
                }
                Err(StoreError::Backend(e))
            }
        }
    }

    async fn find_for_day(
        &self,
        user_id: u64,
        work_day: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let record = sqlx::query_as::<_, AttendanceRecord>(
            r#"
            SELECT id, user_id, work_day, clock_in, clock_out, status
            FROM attendance
            WHERE user_id = ? AND work_day = ?
            "#,
        )
        .bind(user_id)
        .bind(work_day)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn close(&self, record_id: u64, clock_out: NaiveDateTime) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET clock_out = ?
            WHERE id = ? AND clock_out IS NULL
            "#,
        )
        .bind(clock_out)
        .bind(record_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn list(
        &self,
        filters: &ListFilters,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<AttendanceRow>, StoreError> {
        let mut conditions = Vec::new();
        let mut binds = Vec::new();
        push_filters(filters, &mut conditions, &mut binds);

        let sql = format!(
            r#"
            SELECT
                attendance.id,
                users.name,
                users.position,
                attendance.clock_in,
                attendance.clock_out,
                attendance.status
            FROM attendance
            JOIN users ON attendance.user_id = users.id
            {}
            ORDER BY attendance.clock_in DESC, attendance.id ASC
            LIMIT ? OFFSET ?
            "#,
            where_clause(&conditions)
        );

        let mut query = sqlx::query_as::<_, AttendanceRow>(&sql);
        for bind in binds {
            query = match bind {
                Bind::Date(d) => query.bind(d),
                Bind::Text(s) => query.bind(s),
            };
        }
        query = query.bind(limit).bind(offset);

        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn for_day(&self, day: NaiveDate) -> Result<Vec<ReportRow>, StoreError> {
        let rows = sqlx::query_as::<_, ReportRow>(
            r#"
            SELECT
                users.name,
                users.position,
                attendance.clock_in,
                attendance.clock_out,
                attendance.status
            FROM attendance
            JOIN users ON attendance.user_id = users.id
            WHERE attendance.work_day = ?
            ORDER BY attendance.clock_in DESC, attendance.id ASC
            "#,
        )
        .bind(day)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn late_for_day(&self, day: NaiveDate) -> Result<Vec<LateRow>, StoreError> {
        let rows = sqlx::query_as::<_, LateRow>(
            r#"
            SELECT
                users.name,
                users.position,
                attendance.clock_in
            FROM attendance
            JOIN users ON attendance.user_id = users.id
            WHERE attendance.status = 'Late'
            AND attendance.work_day = ?
            ORDER BY attendance.clock_in DESC, attendance.id ASC
            "#,
        )
        .bind(day)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn summary_for_day(&self, day: NaiveDate) -> Result<DailySummary, StoreError> {
        // COUNT(CASE ...) keeps every column a BIGINT
        let summary = sqlx::query_as::<_, DailySummary>(
            r#"
            SELECT
                COUNT(*) AS total_today,
                COUNT(CASE WHEN status = 'Late' THEN 1 END) AS late_today,
                COUNT(CASE WHEN clock_out IS NULL THEN 1 END) AS not_clocked_out
            FROM attendance
            WHERE work_day = ?
            "#,
        )
        .bind(day)
        .fetch_one(&self.pool)
        .await?;

        Ok(summary)
    }

    async fn export(&self, filters: &ExportFilters) -> Result<Vec<ReportRow>, StoreError> {
        let mut conditions = Vec::new();
        let mut binds = Vec::new();
        if let Some(date) = filters.date {
            conditions.push("attendance.work_day = ?");
            binds.push(Bind::Date(date));
        }

        let sql = format!(
            r#"
            SELECT
                users.name,
                users.position,
                attendance.clock_in,
                attendance.clock_out,
                attendance.status
            FROM attendance
            JOIN users ON attendance.user_id = users.id
            {}
            ORDER BY attendance.clock_in DESC, attendance.id ASC
            "#,
            where_clause(&conditions)
        );

        let mut query = sqlx::query_as::<_, ReportRow>(&sql);
        for bind in binds {
            query = match bind {
                Bind::Date(d) => query.bind(d),
                Bind::Text(s) => query.bind(s),
            };
        }

        Ok(query.fetch_all(&self.pool).await?)
    }
}
