use crate::attendance::reports::{
    AttendancePage, DailySummary, ExportFilters, LateRow, ListFilters, PageParams,
    ReportAggregator, ReportRow, export_totals,
};
use crate::attendance::store::MySqlAttendanceStore;
use crate::auth::auth::AuthUser;
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::error;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
pub struct AttendanceListQuery {
    /// Restrict to one work day (YYYY-MM-DD)
    pub date: Option<NaiveDate>,
    /// Exact position match
    pub position: Option<String>,
    /// Substring of the employee name, case-insensitive
    pub name: Option<String>,
    /// Page number, 1-based
    pub page: Option<u32>,
    /// Rows per page, capped at 100
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct AttendanceExportQuery {
    /// Restrict to one work day (YYYY-MM-DD)
    pub date: Option<NaiveDate>,
}

/// Admin: filtered, paginated attendance listing
#[utoipa::path(
    get,
    path = "/api/admin/attendance",
    params(AttendanceListQuery),
    responses(
        (status = 200, description = "Paginated attendance rows", body = AttendancePage),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admins only"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Reports"
)]
pub async fn list_attendance(
    auth: AuthUser,
    reports: web::Data<ReportAggregator<MySqlAttendanceStore>>,
    query: web::Query<AttendanceListQuery>,
) -> actix_web::Result<impl Responder> {
    let filters = ListFilters {
        date: query.date,
        position: query.position.clone(),
        name_contains: query.name.clone(),
    };
    let params = PageParams {
        page: query.page,
        limit: query.limit,
    };

    let page = reports.list(&auth.caller(), &filters, params).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// Admin: everyone clocked in today, newest first
#[utoipa::path(
    get,
    path = "/api/admin/attendance/today",
    responses(
        (status = 200, description = "Today's attendance rows", body = [ReportRow]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admins only"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Reports"
)]
pub async fn today_attendance(
    auth: AuthUser,
    reports: web::Data<ReportAggregator<MySqlAttendanceStore>>,
) -> actix_web::Result<impl Responder> {
    let rows = reports.today(&auth.caller(), Utc::now()).await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// Admin: today's late arrivals
#[utoipa::path(
    get,
    path = "/api/admin/attendance/late",
    responses(
        (status = 200, description = "Today's late arrivals", body = [LateRow]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admins only"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Reports"
)]
pub async fn late_attendance(
    auth: AuthUser,
    reports: web::Data<ReportAggregator<MySqlAttendanceStore>>,
) -> actix_web::Result<impl Responder> {
    let rows = reports.late(&auth.caller(), Utc::now()).await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// Admin: today's headline counts
#[utoipa::path(
    get,
    path = "/api/admin/attendance/summary",
    responses(
        (status = 200, description = "Counts over today's records", body = DailySummary, example = json!({
            "total_today": 12,
            "late_today": 2,
            "not_clocked_out": 3
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admins only"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Reports"
)]
pub async fn attendance_summary(
    auth: AuthUser,
    reports: web::Data<ReportAggregator<MySqlAttendanceStore>>,
) -> actix_web::Result<impl Responder> {
    let summary = reports.summary(&auth.caller(), Utc::now()).await?;
    Ok(HttpResponse::Ok().json(summary))
}

/// Admin: CSV download of the full (optionally day-filtered) history
#[utoipa::path(
    get,
    path = "/api/admin/attendance/export",
    params(AttendanceExportQuery),
    responses(
        (status = 200, description = "CSV attachment"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admins only"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Reports"
)]
pub async fn export_attendance(
    auth: AuthUser,
    reports: web::Data<ReportAggregator<MySqlAttendanceStore>>,
    query: web::Query<AttendanceExportQuery>,
) -> actix_web::Result<impl Responder> {
    let filters = ExportFilters { date: query.date };
    let rows = reports.export(&auth.caller(), &filters).await?;

    let body = render_csv(&rows).map_err(|e| {
        error!(error = %e, "Failed to render attendance CSV");
        ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            "Content-Disposition",
            "attachment; filename=attendance.csv",
        ))
        .body(body))
}

/// Renders export rows plus the totals trailer the report consumers expect.
fn render_csv(rows: &[ReportRow]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(["Name", "Position", "Clock In", "Clock Out", "Status"])?;
    for row in rows {
        let clock_in = row.clock_in.to_string();
        let clock_out = row.clock_out.map(|t| t.to_string()).unwrap_or_default();
        let status = row.status.to_string();
        writer.write_record([
            row.name.as_str(),
            row.position.as_str(),
            clock_in.as_str(),
            clock_out.as_str(),
            status.as_str(),
        ])?;
    }

    let totals = export_totals(rows);
    let records = totals.records.to_string();
    let on_time = totals.on_time.to_string();
    let late = totals.late.to_string();
    writer.write_record(["", "", "", "", ""])?;
    writer.write_record(["Total records", records.as_str(), "", "", ""])?;
    writer.write_record(["On time", on_time.as_str(), "", "", ""])?;
    writer.write_record(["Late", late.as_str(), "", "", ""])?;

    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::AttendanceStatus;
    use chrono::NaiveDate;

    #[test]
    fn csv_has_header_rows_and_totals_trailer() {
        let day = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let rows = vec![
            ReportRow {
                name: "Ama Mensah".to_string(),
                position: "Engineer".to_string(),
                clock_in: day.and_hms_opt(8, 55, 0).unwrap(),
                clock_out: Some(day.and_hms_opt(17, 0, 0).unwrap()),
                status: AttendanceStatus::OnTime,
            },
            ReportRow {
                name: "Kofi Boateng".to_string(),
                position: "Designer".to_string(),
                clock_in: day.and_hms_opt(9, 40, 0).unwrap(),
                clock_out: None,
                status: AttendanceStatus::Late,
            },
        ];

        let bytes = render_csv(&rows).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines[0], "Name,Position,Clock In,Clock Out,Status");
        assert!(lines[1].starts_with("Ama Mensah,Engineer,2026-01-05 08:55:00"));
        assert!(lines[2].contains("Late"));
        assert!(lines.iter().any(|l| l.starts_with("Total records,2")));
        assert!(lines.iter().any(|l| l.starts_with("On time,1")));
        assert!(lines.iter().any(|l| l.starts_with("Late,1")));
    }
}
