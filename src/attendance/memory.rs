//! In-memory `AttendanceStore` used by the engine tests. Mirrors the MySQL
//! store's semantics: atomic per-day uniqueness on insert, conditional
//! close, case-insensitive name matching, `clock_in DESC` ordering with
//! insertion order on ties.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use crate::model::attendance::{AttendanceRecord, AttendanceStatus};

use super::reports::{
    AttendanceRow, DailySummary, ExportFilters, LateRow, ListFilters, ReportRow,
};
use super::store::{AttendanceStore, StoreError};

#[derive(Default)]
struct Inner {
    next_id: u64,
    records: Vec<AttendanceRecord>,
    // user_id -> (name, position)
    users: HashMap<u64, (String, String)>,
}

/// Clones share state, like a pool handle.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_user(&self, id: u64, name: impl Into<String>, position: impl Into<String>) {
        self.inner
            .lock()
            .unwrap()
            .users
            .insert(id, (name.into(), position.into()));
    }

    /// Seeds a record directly, bypassing the ledger, for report tests.
    pub fn seed_record(
        &self,
        user_id: u64,
        work_day: NaiveDate,
        clock_in: NaiveDateTime,
        clock_out: Option<NaiveDateTime>,
        status: AttendanceStatus,
    ) {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.records.push(AttendanceRecord {
            id,
            user_id,
            work_day,
            clock_in,
            clock_out,
            status,
        });
    }

    pub fn record_count(&self) -> usize {
        self.inner.lock().unwrap().records.len()
    }

    fn profile(inner: &Inner, user_id: u64) -> (String, String) {
        inner
            .users
            .get(&user_id)
            .cloned()
            .unwrap_or_else(|| ("unknown".to_string(), "unknown".to_string()))
    }

    /// Records sorted `clock_in DESC`, ties in insertion order.
    fn descending(inner: &Inner) -> Vec<AttendanceRecord> {
        let mut rows = inner.records.clone();
        // Vec::sort_by is stable, so equal clock_ins keep insertion order
        rows.sort_by(|a, b| b.clock_in.cmp(&a.clock_in));
        rows
    }
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn insert(
        &self,
        user_id: u64,
        work_day: NaiveDate,
        clock_in: NaiveDateTime,
        status: AttendanceStatus,
    ) -> Result<AttendanceRecord, StoreError> {
        let mut inner = self.inner.lock().unwrap();

        // uniqueness check and insert happen under one lock, matching the
        // database's unique-key atomicity
        if inner
            .records
            .iter()
            .any(|r| r.user_id == user_id && r.work_day == work_day)
        {
            return Err(StoreError::DuplicateDay);
        }

        inner.next_id += 1;
        let record = AttendanceRecord {
            id: inner.next_id,
            user_id,
            work_day,
            clock_in,
            clock_out: None,
            status,
        };
        inner.records.push(record.clone());
        Ok(record)
    }

    async fn find_for_day(
        &self,
        user_id: u64,
        work_day: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .records
            .iter()
            .find(|r| r.user_id == user_id && r.work_day == work_day)
            .cloned())
    }

    async fn close(&self, record_id: u64, clock_out: NaiveDateTime) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        match inner
            .records
            .iter_mut()
            .find(|r| r.id == record_id && r.clock_out.is_none())
        {
            Some(record) => {
                record.clock_out = Some(clock_out);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn list(
        &self,
        filters: &ListFilters,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<AttendanceRow>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let rows = Self::descending(&inner)
            .into_iter()
            .filter(|r| filters.date.is_none_or(|d| r.work_day == d))
            .map(|r| {
                let (name, position) = Self::profile(&inner, r.user_id);
                AttendanceRow {
                    id: r.id,
                    name,
                    position,
                    clock_in: r.clock_in,
                    clock_out: r.clock_out,
                    status: r.status,
                }
            })
            .filter(|row| {
                filters
                    .position
                    .as_ref()
                    .is_none_or(|p| &row.position == p)
            })
            .filter(|row| {
                filters.name_contains.as_ref().is_none_or(|needle| {
                    row.name.to_lowercase().contains(&needle.to_lowercase())
                })
            })
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
        Ok(rows)
    }

    async fn for_day(&self, day: NaiveDate) -> Result<Vec<ReportRow>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(Self::descending(&inner)
            .into_iter()
            .filter(|r| r.work_day == day)
            .map(|r| {
                let (name, position) = Self::profile(&inner, r.user_id);
                ReportRow {
                    name,
                    position,
                    clock_in: r.clock_in,
                    clock_out: r.clock_out,
                    status: r.status,
                }
            })
            .collect())
    }

    async fn late_for_day(&self, day: NaiveDate) -> Result<Vec<LateRow>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(Self::descending(&inner)
            .into_iter()
            .filter(|r| r.work_day == day && r.status == AttendanceStatus::Late)
            .map(|r| {
                let (name, position) = Self::profile(&inner, r.user_id);
                LateRow {
                    name,
                    position,
                    clock_in: r.clock_in,
                }
            })
            .collect())
    }

    async fn summary_for_day(&self, day: NaiveDate) -> Result<DailySummary, StoreError> {
        let inner = self.inner.lock().unwrap();
        let today: Vec<_> = inner.records.iter().filter(|r| r.work_day == day).collect();
        Ok(DailySummary {
            total_today: today.len() as i64,
            late_today: today
                .iter()
                .filter(|r| r.status == AttendanceStatus::Late)
                .count() as i64,
            not_clocked_out: today.iter().filter(|r| r.clock_out.is_none()).count() as i64,
        })
    }

    async fn export(&self, filters: &ExportFilters) -> Result<Vec<ReportRow>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(Self::descending(&inner)
            .into_iter()
            .filter(|r| filters.date.is_none_or(|d| r.work_day == d))
            .map(|r| {
                let (name, position) = Self::profile(&inner, r.user_id);
                ReportRow {
                    name,
                    position,
                    clock_in: r.clock_in,
                    clock_out: r.clock_out,
                    status: r.status,
                }
            })
            .collect())
    }
}
