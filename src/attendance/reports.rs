use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::attendance::AttendanceStatus;
use crate::model::role::Role;

use super::error::AttendanceError;
use super::store::AttendanceStore;

/// The resolved identity attached to every report call by the auth
/// collaborator. The engine never checks credentials, only the role.
#[derive(Debug, Clone, Copy)]
pub struct Caller {
    pub user_id: u64,
    pub role: Role,
}

impl Caller {
    /// Single authorization gate for every admin-only operation; runs
    /// before any storage access.
    pub fn ensure_admin(&self) -> Result<(), AttendanceError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            tracing::warn!(user_id = self.user_id, "non-admin attempted a report operation");
            Err(AttendanceError::Forbidden)
        }
    }
}

/// Conjunctive filters for the paginated listing. `name_contains` is a
/// case-insensitive substring match on the employee name.
#[derive(Debug, Clone, Default)]
pub struct ListFilters {
    pub date: Option<NaiveDate>,
    pub position: Option<String>,
    pub name_contains: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ExportFilters {
    pub date: Option<NaiveDate>,
}

/// Raw pagination inputs. `normalize` clamps both fields so user input
/// never reaches the offset math unchecked.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const MAX_PAGE_LIMIT: u32 = 100;
pub const MAX_PAGE: u32 = 10_000;

impl PageParams {
    pub fn normalize(self) -> (u32, u32) {
        let page = self.page.unwrap_or(1).clamp(1, MAX_PAGE);
        let limit = self
            .limit
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .clamp(1, MAX_PAGE_LIMIT);
        (page, limit)
    }

    /// Offset of the first row, in `u64` so the multiply cannot wrap even
    /// at the clamp boundaries.
    pub fn offset(page: u32, limit: u32) -> u64 {
        u64::from(page - 1) * u64::from(limit)
    }
}

/// One row of the paginated admin listing, joined with the identity
/// attributes owned by the auth collaborator.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct AttendanceRow {
    pub id: u64,
    #[schema(example = "John Doe")]
    pub name: String,
    #[schema(example = "Engineer")]
    pub position: String,
    #[schema(example = "2026-01-05T08:55:00", value_type = String, format = "date-time")]
    pub clock_in: NaiveDateTime,
    #[schema(example = "2026-01-05T17:05:00", value_type = String, format = "date-time", nullable = true)]
    pub clock_out: Option<NaiveDateTime>,
    #[schema(example = "On Time")]
    pub status: AttendanceStatus,
}

/// Row shape shared by the today view and the export; the caller renders
/// these into whatever byte format it serves.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct ReportRow {
    #[schema(example = "John Doe")]
    pub name: String,
    #[schema(example = "Engineer")]
    pub position: String,
    #[schema(example = "2026-01-05T08:55:00", value_type = String, format = "date-time")]
    pub clock_in: NaiveDateTime,
    #[schema(example = "2026-01-05T17:05:00", value_type = String, format = "date-time", nullable = true)]
    pub clock_out: Option<NaiveDateTime>,
    #[schema(example = "On Time")]
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct LateRow {
    #[schema(example = "John Doe")]
    pub name: String,
    #[schema(example = "Engineer")]
    pub position: String,
    #[schema(example = "2026-01-05T09:55:00", value_type = String, format = "date-time")]
    pub clock_in: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, sqlx::FromRow, ToSchema)]
pub struct DailySummary {
    #[schema(example = 12)]
    pub total_today: i64,
    #[schema(example = 2)]
    pub late_today: i64,
    #[schema(example = 3)]
    pub not_clocked_out: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AttendancePage {
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub limit: u32,
    pub rows: Vec<AttendanceRow>,
}

/// Totals the export collaborator appends below the rows.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct ExportTotals {
    pub records: u64,
    pub on_time: u64,
    pub late: u64,
}

pub fn export_totals(rows: &[ReportRow]) -> ExportTotals {
    let late = rows
        .iter()
        .filter(|r| r.status == AttendanceStatus::Late)
        .count() as u64;
    ExportTotals {
        records: rows.len() as u64,
        on_time: rows.len() as u64 - late,
        late,
    }
}

/// Read-only projections over the ledger's storage. Never mutates.
pub struct ReportAggregator<S> {
    store: S,
    tz: Tz,
}

impl<S: AttendanceStore> ReportAggregator<S> {
    pub fn new(store: S, tz: Tz) -> Self {
        Self { store, tz }
    }

    fn work_day(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.tz).date_naive()
    }

    /// Filtered, paginated listing ordered by `clock_in` descending,
    /// insertion order on ties.
    pub async fn list(
        &self,
        caller: &Caller,
        filters: &ListFilters,
        params: PageParams,
    ) -> Result<AttendancePage, AttendanceError> {
        caller.ensure_admin()?;

        let (page, limit) = params.normalize();
        let offset = PageParams::offset(page, limit);
        let rows = self.store.list(filters, limit, offset).await?;

        Ok(AttendancePage { page, limit, rows })
    }

    /// All records clocked in on the current work day, newest first.
    pub async fn today(
        &self,
        caller: &Caller,
        now: DateTime<Utc>,
    ) -> Result<Vec<ReportRow>, AttendanceError> {
        caller.ensure_admin()?;
        Ok(self.store.for_day(self.work_day(now)).await?)
    }

    /// Late arrivals on the current work day.
    pub async fn late(
        &self,
        caller: &Caller,
        now: DateTime<Utc>,
    ) -> Result<Vec<LateRow>, AttendanceError> {
        caller.ensure_admin()?;
        Ok(self.store.late_for_day(self.work_day(now)).await?)
    }

    pub async fn summary(
        &self,
        caller: &Caller,
        now: DateTime<Utc>,
    ) -> Result<DailySummary, AttendanceError> {
        caller.ensure_admin()?;
        Ok(self.store.summary_for_day(self.work_day(now)).await?)
    }

    /// Unpaginated export rows, `clock_in` descending.
    pub async fn export(
        &self,
        caller: &Caller,
        filters: &ExportFilters,
    ) -> Result<Vec<ReportRow>, AttendanceError> {
        caller.ensure_admin()?;
        Ok(self.store.export(filters).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::super::memory::MemoryStore;
    use super::*;
    use chrono::TimeZone;

    fn admin() -> Caller {
        Caller {
            user_id: 1,
            role: Role::Admin,
        }
    }

    fn employee() -> Caller {
        Caller {
            user_id: 2,
            role: Role::Employee,
        }
    }

    fn aggregator(store: MemoryStore) -> ReportAggregator<MemoryStore> {
        ReportAggregator::new(store, chrono_tz::UTC)
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 5, 12, 0, 0).unwrap()
    }

    fn seed(store: &MemoryStore) {
        store.register_user(10, "Ama Mensah", "Engineer");
        store.register_user(11, "Kofi Boateng", "Designer");
        store.register_user(12, "Esi Owusu", "Engineer");

        let day = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        // insertion order: Ama 08:55, Kofi 09:40 (late, still open), Esi 08:55
        store.seed_record(10, day, day.and_hms_opt(8, 55, 0).unwrap(), Some(day.and_hms_opt(17, 0, 0).unwrap()), AttendanceStatus::OnTime);
        store.seed_record(11, day, day.and_hms_opt(9, 40, 0).unwrap(), None, AttendanceStatus::Late);
        store.seed_record(12, day, day.and_hms_opt(8, 55, 0).unwrap(), Some(day.and_hms_opt(16, 30, 0).unwrap()), AttendanceStatus::OnTime);
    }

    #[test]
    fn pagination_normalization() {
        assert_eq!(PageParams::default().normalize(), (1, 10));
        assert_eq!(
            PageParams { page: Some(0), limit: Some(0) }.normalize(),
            (1, 1)
        );
        assert_eq!(
            PageParams { page: Some(3), limit: Some(10_000) }.normalize(),
            (3, 100)
        );
        assert_eq!(
            PageParams { page: Some(u32::MAX), limit: Some(10) }.normalize(),
            (MAX_PAGE, 10)
        );
    }

    #[test]
    fn offset_math_never_wraps_at_the_bounds() {
        let (page, limit) = PageParams {
            page: Some(u32::MAX),
            limit: Some(u32::MAX),
        }
        .normalize();
        assert_eq!(
            PageParams::offset(page, limit),
            u64::from(MAX_PAGE - 1) * u64::from(MAX_PAGE_LIMIT)
        );
    }

    #[test]
    fn export_totals_counts_statuses() {
        let store = MemoryStore::new();
        seed(&store);
        let rows = futures::executor::block_on(
            aggregator(store).export(&admin(), &ExportFilters::default()),
        )
        .unwrap();
        let totals = export_totals(&rows);
        assert_eq!(totals.records, 3);
        assert_eq!(totals.on_time, 2);
        assert_eq!(totals.late, 1);
    }

    #[actix_web::test]
    async fn non_admin_is_forbidden_everywhere() {
        let store = MemoryStore::new();
        seed(&store);
        let agg = aggregator(store);
        let caller = employee();

        assert!(matches!(
            agg.list(&caller, &ListFilters::default(), PageParams::default()).await,
            Err(AttendanceError::Forbidden)
        ));
        assert!(matches!(agg.today(&caller, noon()).await, Err(AttendanceError::Forbidden)));
        assert!(matches!(agg.late(&caller, noon()).await, Err(AttendanceError::Forbidden)));
        assert!(matches!(agg.summary(&caller, noon()).await, Err(AttendanceError::Forbidden)));
        assert!(matches!(
            agg.export(&caller, &ExportFilters::default()).await,
            Err(AttendanceError::Forbidden)
        ));
    }

    #[actix_web::test]
    async fn summary_counts_today() {
        let store = MemoryStore::new();
        seed(&store);
        let summary = aggregator(store).summary(&admin(), noon()).await.unwrap();
        assert_eq!(summary.total_today, 3);
        assert_eq!(summary.late_today, 1);
        assert_eq!(summary.not_clocked_out, 1);
    }

    #[actix_web::test]
    async fn today_is_newest_first_with_stable_ties() {
        let store = MemoryStore::new();
        seed(&store);
        let rows = aggregator(store).today(&admin(), noon()).await.unwrap();
        let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
        // 09:40 first, then the two 08:55 ties in insertion order
        assert_eq!(names, ["Kofi Boateng", "Ama Mensah", "Esi Owusu"]);
    }

    #[actix_web::test]
    async fn late_view_only_contains_late_records() {
        let store = MemoryStore::new();
        seed(&store);
        let rows = aggregator(store).late(&admin(), noon()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Kofi Boateng");
    }

    #[actix_web::test]
    async fn filters_are_conjunctive_and_name_is_case_insensitive() {
        let store = MemoryStore::new();
        seed(&store);
        let agg = aggregator(store);

        let filters = ListFilters {
            date: NaiveDate::from_ymd_opt(2026, 1, 5),
            position: Some("Engineer".to_string()),
            name_contains: Some("esi".to_string()),
        };
        let page = agg.list(&admin(), &filters, PageParams::default()).await.unwrap();
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.rows[0].name, "Esi Owusu");

        let wrong_day = ListFilters {
            date: NaiveDate::from_ymd_opt(2026, 1, 6),
            ..filters
        };
        let page = agg.list(&admin(), &wrong_day, PageParams::default()).await.unwrap();
        assert!(page.rows.is_empty());
    }

    #[actix_web::test]
    async fn list_pages_through_the_descending_set() {
        let store = MemoryStore::new();
        let day = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        for i in 0..25u64 {
            let id = 100 + i;
            store.register_user(id, format!("Worker {i:02}"), "Engineer");
            // later workers clock in later, so descending order is reverse
            store.seed_record(
                id,
                day,
                day.and_hms_opt(8, 0, i as u32).unwrap(),
                None,
                AttendanceStatus::OnTime,
            );
        }
        let agg = aggregator(store);

        let page2 = agg
            .list(
                &admin(),
                &ListFilters::default(),
                PageParams { page: Some(2), limit: Some(10) },
            )
            .await
            .unwrap();
        assert_eq!(page2.page, 2);
        assert_eq!(page2.rows.len(), 10);
        // rows 11..=20 of the descending set are workers 14 down to 05
        assert_eq!(page2.rows.first().unwrap().name, "Worker 14");
        assert_eq!(page2.rows.last().unwrap().name, "Worker 05");

        let page3 = agg
            .list(
                &admin(),
                &ListFilters::default(),
                PageParams { page: Some(3), limit: Some(10) },
            )
            .await
            .unwrap();
        assert_eq!(page3.rows.len(), 5);
    }
}
