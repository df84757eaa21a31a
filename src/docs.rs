use crate::api::attendance::ClockRequest;
use crate::attendance::ledger::TodayStatus;
use crate::attendance::reports::{
    AttendancePage, AttendanceRow, DailySummary, ExportTotals, LateRow, ReportRow,
};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::notification::Notification;
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "StaffSync API",
        version = "1.0.0",
        description = r#"
## StaffSync — Geofenced Attendance Tracking

Employees clock in and out from within a fixed radius of the office;
administrators get filtered listings, daily summaries and CSV exports.

### Key Features
- **Attendance**
  - Geofence-gated clock-in / clock-out, one record per employee per day
  - Personal today-status view
- **Reports** (admin only)
  - Filtered, paginated attendance listing
  - Today / late-arrival views and daily summary counts
  - Full-history CSV export
- **Notifications**
  - Clock events recorded as in-app notifications

### Security
All routes except login/refresh/logout require a **JWT Bearer** access
token. Report routes additionally require the admin role.
"#,
    ),
    paths(
        crate::api::attendance::clock_in,
        crate::api::attendance::clock_out,
        crate::api::attendance::today_status,

        crate::api::reports::list_attendance,
        crate::api::reports::today_attendance,
        crate::api::reports::late_attendance,
        crate::api::reports::attendance_summary,
        crate::api::reports::export_attendance,

        crate::api::notification::my_notifications,
        crate::api::notification::mark_all_read,
    ),
    components(
        schemas(
            ClockRequest,
            TodayStatus,
            AttendanceRecord,
            AttendanceStatus,
            AttendancePage,
            AttendanceRow,
            ReportRow,
            LateRow,
            DailySummary,
            ExportTotals,
            Notification,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Attendance", description = "Clock-in / clock-out APIs"),
        (name = "Reports", description = "Admin attendance reporting APIs"),
        (name = "Notifications", description = "In-app notification APIs"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
