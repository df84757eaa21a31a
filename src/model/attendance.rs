use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Decided once at clock-in, never changed afterwards.
/// Stored and serialized as the `'On Time'` / `'Late'` column values.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Display, EnumString, ToSchema,
)]
pub enum AttendanceStatus {
    #[serde(rename = "On Time")]
    #[sqlx(rename = "On Time")]
    #[strum(serialize = "On Time")]
    OnTime,
    #[serde(rename = "Late")]
    #[sqlx(rename = "Late")]
    #[strum(serialize = "Late")]
    Late,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AttendanceRecord {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 42)]
    pub user_id: u64,
    /// Calendar-day key, evaluated in the configured service time zone.
    #[schema(example = "2026-01-05", value_type = String, format = "date")]
    pub work_day: NaiveDate,
    #[schema(example = "2026-01-05T08:55:00", value_type = String, format = "date-time")]
    pub clock_in: NaiveDateTime,
    #[schema(example = "2026-01-05T17:05:00", value_type = String, format = "date-time", nullable = true)]
    pub clock_out: Option<NaiveDateTime>,
    #[schema(example = "On Time")]
    pub status: AttendanceStatus,
}
