use actix_web::{HttpResponse, http::StatusCode};
use serde_json::json;
use thiserror::Error;

/// Failures of the attendance engine, one variant per rejection the HTTP
/// layer has to distinguish. Status mapping lives in the `ResponseError`
/// impl so every handler surfaces them the same way.
#[derive(Debug, Error)]
pub enum AttendanceError {
    #[error("Location is required")]
    LocationRequired,

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinate(String),

    /// Carries the great-circle distance to the office, rounded to whole
    /// meters, for user feedback.
    #[error("You are outside the allowed work location")]
    OutsideGeofence { distance_m: i64 },

    #[error("User already clocked in today")]
    AlreadyClockedIn,

    #[error("User already clocked out today")]
    AlreadyClockedOut,

    #[error("No clock-in record found for today")]
    NoClockInFound,

    #[error("Access denied. Admins only.")]
    Forbidden,

    /// Clock-out timestamp not after the recorded clock-in. Indicates clock
    /// skew or corrupted state; nothing is written.
    #[error("clock-out not after clock-in")]
    ClockOutBeforeIn,

    #[error("storage failure")]
    Storage(#[source] sqlx::Error),
}

impl actix_web::ResponseError for AttendanceError {
    fn status_code(&self) -> StatusCode {
        match self {
            AttendanceError::LocationRequired
            | AttendanceError::InvalidCoordinate(_)
            | AttendanceError::AlreadyClockedIn
            | AttendanceError::AlreadyClockedOut
            | AttendanceError::NoClockInFound => StatusCode::BAD_REQUEST,

            AttendanceError::OutsideGeofence { .. } | AttendanceError::Forbidden => {
                StatusCode::FORBIDDEN
            }

            AttendanceError::ClockOutBeforeIn | AttendanceError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AttendanceError::OutsideGeofence { distance_m } => json!({
                "message": self.to_string(),
                "distance": format!("{distance_m} meters"),
            }),
            // internal detail stays in the logs
            AttendanceError::Storage(_) | AttendanceError::ClockOutBeforeIn => json!({
                "message": "Internal Server Error"
            }),
            _ => json!({ "message": self.to_string() }),
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}
