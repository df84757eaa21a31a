use chrono::{NaiveDateTime, NaiveTime};

use crate::model::attendance::AttendanceStatus;

/// Decides a record's status at clock-in time.
///
/// `AlwaysOnTime` is the default: without a configured cutoff every
/// arrival is recorded as on time. `CutoffAt` is the opt-in cutoff,
/// enabled with `LATE_CUTOFF`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LatePolicy {
    #[default]
    AlwaysOnTime,
    CutoffAt(NaiveTime),
}

impl LatePolicy {
    /// `clock_in` is local wall time in the service time zone.
    pub fn status_for(&self, clock_in: NaiveDateTime) -> AttendanceStatus {
        match self {
            LatePolicy::AlwaysOnTime => AttendanceStatus::OnTime,
            LatePolicy::CutoffAt(cutoff) => {
                if clock_in.time() > *cutoff {
                    AttendanceStatus::Late
                } else {
                    AttendanceStatus::OnTime
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 5)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn default_policy_never_marks_late() {
        let policy = LatePolicy::default();
        assert_eq!(policy.status_for(at(23, 59)), AttendanceStatus::OnTime);
    }

    #[test]
    fn cutoff_marks_strictly_after_as_late() {
        let policy = LatePolicy::CutoffAt(NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(policy.status_for(at(8, 59)), AttendanceStatus::OnTime);
        assert_eq!(policy.status_for(at(9, 0)), AttendanceStatus::OnTime);
        assert_eq!(policy.status_for(at(9, 1)), AttendanceStatus::Late);
    }
}
