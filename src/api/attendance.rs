use crate::attendance::ledger::AttendanceLedger;
use crate::attendance::store::MySqlAttendanceStore;
use crate::auth::auth::AuthUser;
use crate::notify::Notifier;
use actix_web::{HttpResponse, Responder, web};
use chrono::Utc;
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct ClockRequest {
    #[schema(example = 5.848864439722045, nullable = true)]
    pub latitude: Option<f64>,
    #[schema(example = 0.6102520623942992, nullable = true)]
    pub longitude: Option<f64>,
}

/// Clock-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/clock-in",
    request_body = ClockRequest,
    responses(
        (status = 200, description = "Clock-in recorded", body = Object, example = json!({
            "message": "Clock-in recorded successfully"
        })),
        (status = 400, description = "Missing location or already clocked in", body = Object, example = json!({
            "message": "User already clocked in today"
        })),
        (status = 403, description = "Outside the allowed work location", body = Object, example = json!({
            "message": "You are outside the allowed work location",
            "distance": "1258 meters"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn clock_in(
    auth: AuthUser,
    ledger: web::Data<AttendanceLedger<MySqlAttendanceStore>>,
    notifier: web::Data<Notifier>,
    payload: web::Json<ClockRequest>,
) -> actix_web::Result<impl Responder> {
    let record = ledger
        .clock_in(auth.user_id, payload.latitude, payload.longitude, Utc::now())
        .await?;

    notifier
        .record(
            auth.user_id,
            "Clock-in recorded",
            &format!("You clocked in at {}", record.clock_in),
        )
        .await;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Clock-in recorded successfully",
        "record": record,
    })))
}

/// Clock-out endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/clock-out",
    request_body = ClockRequest,
    responses(
        (status = 200, description = "Clock-out recorded", body = Object, example = json!({
            "message": "Clock-out recorded successfully"
        })),
        (status = 400, description = "No clock-in today or already clocked out", body = Object, example = json!({
            "message": "No clock-in record found for today"
        })),
        (status = 403, description = "Outside the allowed work location"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn clock_out(
    auth: AuthUser,
    ledger: web::Data<AttendanceLedger<MySqlAttendanceStore>>,
    notifier: web::Data<Notifier>,
    payload: web::Json<ClockRequest>,
) -> actix_web::Result<impl Responder> {
    let record = ledger
        .clock_out(auth.user_id, payload.latitude, payload.longitude, Utc::now())
        .await?;

    notifier
        .record(
            auth.user_id,
            "Clock-out recorded",
            &format!("You clocked out at {}", record.clock_out.unwrap_or(record.clock_in)),
        )
        .await;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Clock-out recorded successfully",
        "record": record,
    })))
}

/// Caller's own open/closed state for today
#[utoipa::path(
    get,
    path = "/api/attendance/status",
    responses(
        (status = 200, description = "Today's clock state", body = Object, example = json!({
            "clock_in": "2026-01-05T08:55:00",
            "clock_out": null
        })),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn today_status(
    auth: AuthUser,
    ledger: web::Data<AttendanceLedger<MySqlAttendanceStore>>,
) -> actix_web::Result<impl Responder> {
    let status = ledger.today_status(auth.user_id, Utc::now()).await?;
    Ok(HttpResponse::Ok().json(status))
}
