use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Notification {
    pub id: u64,
    pub user_id: u64,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    #[schema(example = "2026-01-05T08:55:00", value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
}
