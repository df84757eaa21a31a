use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::{error, info};
use utoipa::ToSchema;

use crate::model::attendance::AttendanceRecord;

use super::error::AttendanceError;
use super::geo::{GeoPoint, OfficeLocation};
use super::policy::LatePolicy;
use super::store::{AttendanceStore, StoreError};

/// The caller's open/closed view of today, both fields optional.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct TodayStatus {
    #[schema(example = "2026-01-05T08:55:00", value_type = String, format = "date-time", nullable = true)]
    pub clock_in: Option<NaiveDateTime>,
    #[schema(example = "2026-01-05T17:05:00", value_type = String, format = "date-time", nullable = true)]
    pub clock_out: Option<NaiveDateTime>,
}

/// Owns the per-user, per-day record lifecycle:
/// `Absent -> Open (clocked in) -> Closed (clocked out)`, at most one
/// record per user per work day.
///
/// Work days are evaluated in the single configured time zone; timestamps
/// are stored as local wall time in that zone.
pub struct AttendanceLedger<S> {
    store: S,
    office: OfficeLocation,
    policy: LatePolicy,
    tz: Tz,
}

impl<S: AttendanceStore> AttendanceLedger<S> {
    pub fn new(store: S, office: OfficeLocation, policy: LatePolicy, tz: Tz) -> Self {
        Self {
            store,
            office,
            policy,
            tz,
        }
    }

    fn local_stamp(&self, now: DateTime<Utc>) -> NaiveDateTime {
        now.with_timezone(&self.tz).naive_local()
    }

    pub fn work_day(&self, now: DateTime<Utc>) -> NaiveDate {
        self.local_stamp(now).date()
    }

    /// Validates the submitted position and gates it against the office
    /// geofence. Rejections carry the distance rounded to whole meters.
    fn gate(&self, latitude: Option<f64>, longitude: Option<f64>) -> Result<GeoPoint, AttendanceError> {
        let point = GeoPoint::from_parts(latitude, longitude)?;
        if !self.office.contains(point) {
            return Err(AttendanceError::OutsideGeofence {
                distance_m: self.office.distance_to(point).round() as i64,
            });
        }
        Ok(point)
    }

    /// First valid clock-in of the day creates the record; the insert is
    /// atomic against the per-day uniqueness constraint, so a concurrent
    /// duplicate surfaces as `AlreadyClockedIn` without any extra write.
    pub async fn clock_in(
        &self,
        user_id: u64,
        latitude: Option<f64>,
        longitude: Option<f64>,
        now: DateTime<Utc>,
    ) -> Result<AttendanceRecord, AttendanceError> {
        self.gate(latitude, longitude)?;

        let stamp = self.local_stamp(now);
        let work_day = stamp.date();
        let status = self.policy.status_for(stamp);

        match self.store.insert(user_id, work_day, stamp, status).await {
            Ok(record) => {
                info!(user_id, %work_day, %status, "clock-in recorded");
                Ok(record)
            }
            Err(StoreError::DuplicateDay) => Err(AttendanceError::AlreadyClockedIn),
            Err(StoreError::Backend(e)) => {
                error!(error = %e, user_id, "clock-in write failed");
                Err(AttendanceError::Storage(e))
            }
        }
    }

    /// First valid clock-out closes the day's record. The close is a
    /// conditional write; losing a race re-reads and fails closed rather
    /// than reporting success against stale state.
    pub async fn clock_out(
        &self,
        user_id: u64,
        latitude: Option<f64>,
        longitude: Option<f64>,
        now: DateTime<Utc>,
    ) -> Result<AttendanceRecord, AttendanceError> {
        self.gate(latitude, longitude)?;

        let stamp = self.local_stamp(now);
        let work_day = stamp.date();

        let record = self
            .store
            .find_for_day(user_id, work_day)
            .await?
            .ok_or(AttendanceError::NoClockInFound)?;

        if record.clock_out.is_some() {
            return Err(AttendanceError::AlreadyClockedOut);
        }

        if stamp <= record.clock_in {
            error!(
                user_id,
                record_id = record.id,
                clock_in = %record.clock_in,
                attempted = %stamp,
                "clock-out not after clock-in, refusing to write"
            );
            return Err(AttendanceError::ClockOutBeforeIn);
        }

        let affected = self.store.close(record.id, stamp).await?;
        if affected == 0 {
            // Someone closed it between our read and write
            return match self.store.find_for_day(user_id, work_day).await? {
                Some(r) if r.clock_out.is_some() => Err(AttendanceError::AlreadyClockedOut),
                _ => Err(AttendanceError::NoClockInFound),
            };
        }

        info!(user_id, %work_day, "clock-out recorded");
        Ok(AttendanceRecord {
            clock_out: Some(stamp),
            ..record
        })
    }

    pub async fn today_status(
        &self,
        user_id: u64,
        now: DateTime<Utc>,
    ) -> Result<TodayStatus, AttendanceError> {
        let record = self.store.find_for_day(user_id, self.work_day(now)).await?;
        Ok(TodayStatus {
            clock_in: record.as_ref().map(|r| r.clock_in),
            clock_out: record.and_then(|r| r.clock_out),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::memory::MemoryStore;
    use super::*;
    use crate::model::attendance::AttendanceStatus;
    use chrono::TimeZone;
    use futures::future::join_all;

    const OFFICE: OfficeLocation = OfficeLocation {
        latitude: 5.848864439722045,
        longitude: 0.6102520623942992,
        allowed_radius_m: 100.0,
    };

    const AT_OFFICE: (Option<f64>, Option<f64>) = (Some(OFFICE.latitude), Some(OFFICE.longitude));

    fn ledger(store: MemoryStore) -> AttendanceLedger<MemoryStore> {
        AttendanceLedger::new(store, OFFICE, LatePolicy::default(), chrono_tz::UTC)
    }

    fn utc(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 5, h, m, 0).unwrap()
    }

    #[actix_web::test]
    async fn first_clock_in_opens_the_day() {
        let ledger = ledger(MemoryStore::new());
        let record = ledger
            .clock_in(7, AT_OFFICE.0, AT_OFFICE.1, utc(8, 55))
            .await
            .unwrap();

        assert_eq!(record.user_id, 7);
        assert_eq!(record.status, AttendanceStatus::OnTime);
        assert!(record.clock_out.is_none());

        let status = ledger.today_status(7, utc(9, 0)).await.unwrap();
        assert!(status.clock_in.is_some());
        assert!(status.clock_out.is_none());
    }

    #[actix_web::test]
    async fn second_clock_in_same_day_is_rejected_without_mutation() {
        let store = MemoryStore::new();
        let ledger = ledger(store.clone());

        ledger
            .clock_in(7, AT_OFFICE.0, AT_OFFICE.1, utc(8, 55))
            .await
            .unwrap();
        let err = ledger
            .clock_in(7, AT_OFFICE.0, AT_OFFICE.1, utc(10, 0))
            .await
            .unwrap_err();

        assert!(matches!(err, AttendanceError::AlreadyClockedIn));
        assert_eq!(store.record_count(), 1);
    }

    #[actix_web::test]
    async fn clock_in_on_a_new_day_opens_a_new_record() {
        let store = MemoryStore::new();
        let ledger = ledger(store.clone());

        ledger
            .clock_in(7, AT_OFFICE.0, AT_OFFICE.1, utc(8, 55))
            .await
            .unwrap();
        let next_day = Utc.with_ymd_and_hms(2026, 1, 6, 8, 55, 0).unwrap();
        ledger
            .clock_in(7, AT_OFFICE.0, AT_OFFICE.1, next_day)
            .await
            .unwrap();

        assert_eq!(store.record_count(), 2);
    }

    #[actix_web::test]
    async fn clock_out_without_clock_in_is_rejected() {
        let ledger = ledger(MemoryStore::new());
        let err = ledger
            .clock_out(7, AT_OFFICE.0, AT_OFFICE.1, utc(17, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, AttendanceError::NoClockInFound));
    }

    #[actix_web::test]
    async fn double_clock_out_is_rejected() {
        let ledger = ledger(MemoryStore::new());

        ledger
            .clock_in(7, AT_OFFICE.0, AT_OFFICE.1, utc(8, 55))
            .await
            .unwrap();
        let closed = ledger
            .clock_out(7, AT_OFFICE.0, AT_OFFICE.1, utc(17, 0))
            .await
            .unwrap();
        assert!(closed.clock_out.is_some());

        let err = ledger
            .clock_out(7, AT_OFFICE.0, AT_OFFICE.1, utc(17, 30))
            .await
            .unwrap_err();
        assert!(matches!(err, AttendanceError::AlreadyClockedOut));
    }

    #[actix_web::test]
    async fn clock_out_not_after_clock_in_is_an_integrity_fault() {
        let ledger = ledger(MemoryStore::new());

        ledger
            .clock_in(7, AT_OFFICE.0, AT_OFFICE.1, utc(9, 0))
            .await
            .unwrap();
        let err = ledger
            .clock_out(7, AT_OFFICE.0, AT_OFFICE.1, utc(9, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, AttendanceError::ClockOutBeforeIn));

        // the record is still open
        let status = ledger.today_status(7, utc(10, 0)).await.unwrap();
        assert!(status.clock_out.is_none());
    }

    #[actix_web::test]
    async fn outside_geofence_reports_rounded_distance_and_writes_nothing() {
        let store = MemoryStore::new();
        let ledger = ledger(store.clone());

        // ~10 km north of the office
        let err = ledger
            .clock_in(7, Some(OFFICE.latitude + 0.09), Some(OFFICE.longitude), utc(8, 55))
            .await
            .unwrap_err();

        match err {
            AttendanceError::OutsideGeofence { distance_m } => {
                assert!((9_900..=10_200).contains(&distance_m), "got {distance_m}");
            }
            other => panic!("expected OutsideGeofence, got {other:?}"),
        }
        assert_eq!(store.record_count(), 0);
    }

    #[actix_web::test]
    async fn missing_location_is_rejected_before_any_lookup() {
        let ledger = ledger(MemoryStore::new());
        let err = ledger.clock_in(7, None, None, utc(8, 55)).await.unwrap_err();
        assert!(matches!(err, AttendanceError::LocationRequired));

        let err = ledger
            .clock_out(7, Some(OFFICE.latitude), None, utc(17, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, AttendanceError::LocationRequired));
    }

    #[actix_web::test]
    async fn concurrent_clock_ins_create_exactly_one_record() {
        let store = MemoryStore::new();
        let ledger = ledger(store.clone());

        let attempts = 16;
        let results = join_all(
            (0..attempts).map(|_| ledger.clock_in(7, AT_OFFICE.0, AT_OFFICE.1, utc(8, 55))),
        )
        .await;

        let ok = results.iter().filter(|r| r.is_ok()).count();
        let dup = results
            .iter()
            .filter(|r| matches!(r, Err(AttendanceError::AlreadyClockedIn)))
            .count();

        assert_eq!(ok, 1);
        assert_eq!(dup, attempts - 1);
        assert_eq!(store.record_count(), 1);
    }

    #[actix_web::test]
    async fn work_day_follows_the_configured_time_zone() {
        let store = MemoryStore::new();
        let ledger = AttendanceLedger::new(
            store,
            OFFICE,
            LatePolicy::default(),
            chrono_tz::Asia::Tokyo, // UTC+9
        );

        // 23:30 UTC on Jan 5 is already Jan 6 in Tokyo
        let late_evening = Utc.with_ymd_and_hms(2026, 1, 5, 23, 30, 0).unwrap();
        let record = ledger
            .clock_in(7, AT_OFFICE.0, AT_OFFICE.1, late_evening)
            .await
            .unwrap();

        assert_eq!(record.work_day, NaiveDate::from_ymd_opt(2026, 1, 6).unwrap());
    }

    #[actix_web::test]
    async fn cutoff_policy_marks_late_arrivals() {
        let store = MemoryStore::new();
        let cutoff = chrono::NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let ledger = AttendanceLedger::new(
            store,
            OFFICE,
            LatePolicy::CutoffAt(cutoff),
            chrono_tz::UTC,
        );

        let record = ledger
            .clock_in(7, AT_OFFICE.0, AT_OFFICE.1, utc(9, 40))
            .await
            .unwrap();
        assert_eq!(record.status, AttendanceStatus::Late);
    }
}
