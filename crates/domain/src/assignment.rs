//! Role assignments: dual-calendar validity periods and lifecycle status.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use silat_core::{AppError, AppResult, AssignmentId, RoleId, UserId};

use crate::HijriDate;

/// Largest tolerated disagreement, in days, between a supplied Hijri date and
/// the conversion of its Gregorian counterpart.
const CALENDAR_TOLERANCE_DAYS: i64 = 1;

/// Validity interval of an assignment on the Gregorian calendar.
///
/// The Gregorian pair is the source of truth for every comparison; Hijri
/// dates are display and input mirrors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentPeriod {
    start: NaiveDate,
    end: Option<NaiveDate>,
}

impl AssignmentPeriod {
    /// Creates a period, rejecting inverted date ordering.
    pub fn new(start: NaiveDate, end: Option<NaiveDate>) -> AppResult<Self> {
        if let Some(end) = end {
            if start >= end {
                return Err(AppError::Validation(format!(
                    "start date '{start}' must precede end date '{end}'"
                )));
            }
        }

        Ok(Self { start, end })
    }

    /// Returns the first valid day.
    #[must_use]
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Returns the end bound, if the period is not open-ended.
    #[must_use]
    pub fn end(&self) -> Option<NaiveDate> {
        self.end
    }

    /// Returns whether two periods intersect.
    ///
    /// An absent end bound behaves as positive infinity.
    #[must_use]
    pub fn overlaps(&self, other: &AssignmentPeriod) -> bool {
        let self_end = self.end.unwrap_or(NaiveDate::MAX);
        let other_end = other.end.unwrap_or(NaiveDate::MAX);

        self.start < other_end && other.start < self_end
    }
}

/// Lifecycle status of an assignment relative to a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    /// The validity period has not started yet.
    Pending,
    /// The as-of date falls inside the validity period.
    Active,
    /// The validity period is over.
    Expired,
    /// The assignment was soft-deleted.
    Inactive,
}

impl AssignmentStatus {
    /// Returns a stable storage value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Expired => "expired",
            Self::Inactive => "inactive",
        }
    }
}

impl Display for AssignmentStatus {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for AssignmentStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "active" => Ok(Self::Active),
            "expired" => Ok(Self::Expired),
            "inactive" => Ok(Self::Inactive),
            _ => Err(AppError::Validation(format!(
                "unknown assignment status '{value}'"
            ))),
        }
    }
}

/// Calendar input for an assignment period.
///
/// Callers may supply the Gregorian pair, the Hijri pair, or both; the
/// missing calendar is derived and a supplied pair must agree with the
/// other's conversion within one day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentDates {
    /// Gregorian start date, authoritative when present.
    pub start_gregorian: Option<NaiveDate>,
    /// Gregorian end date; `None` leaves the end open or Hijri-derived.
    pub end_gregorian: Option<NaiveDate>,
    /// Hijri start mirror.
    pub start_hijri: Option<HijriDate>,
    /// Hijri end mirror.
    pub end_hijri: Option<HijriDate>,
}

impl AssignmentDates {
    /// Resolves the input into a dual-calendar period.
    pub fn resolve(&self) -> AppResult<ResolvedPeriod> {
        let (start, start_hijri) =
            resolve_endpoint("start", self.start_gregorian, self.start_hijri)?
                .ok_or_else(|| {
                    AppError::Validation(
                        "a start date is required in at least one calendar".to_owned(),
                    )
                })?;

        let end = resolve_endpoint("end", self.end_gregorian, self.end_hijri)?;
        let (end, end_hijri) = match end {
            Some((date, hijri)) => (Some(date), Some(hijri)),
            None => (None, None),
        };

        Ok(ResolvedPeriod {
            period: AssignmentPeriod::new(start, end)?,
            start_hijri,
            end_hijri,
        })
    }
}

/// Resolves one endpoint to a Gregorian date plus its Hijri mirror.
fn resolve_endpoint(
    label: &str,
    gregorian: Option<NaiveDate>,
    hijri: Option<HijriDate>,
) -> AppResult<Option<(NaiveDate, HijriDate)>> {
    match (gregorian, hijri) {
        (Some(date), Some(hijri)) => {
            let converted = hijri.to_gregorian()?;
            let drift = (date - converted).num_days().abs();
            if drift > CALENDAR_TOLERANCE_DAYS {
                return Err(AppError::Validation(format!(
                    "{label} dates disagree: hijri '{hijri}' converts to '{converted}', \
                     {drift} days away from '{date}'"
                )));
            }
            Ok(Some((date, hijri)))
        }
        (Some(date), None) => Ok(Some((date, HijriDate::from_gregorian(date)?))),
        (None, Some(hijri)) => Ok(Some((hijri.to_gregorian()?, hijri))),
        (None, None) => Ok(None),
    }
}

/// A validated period carrying both calendar representations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPeriod {
    period: AssignmentPeriod,
    start_hijri: HijriDate,
    end_hijri: Option<HijriDate>,
}

impl ResolvedPeriod {
    /// Returns the Gregorian period used for every comparison.
    #[must_use]
    pub fn period(&self) -> AssignmentPeriod {
        self.period
    }

    /// Returns the Hijri start mirror.
    #[must_use]
    pub fn start_hijri(&self) -> HijriDate {
        self.start_hijri
    }

    /// Returns the Hijri end mirror, if the period is bounded.
    #[must_use]
    pub fn end_hijri(&self) -> Option<HijriDate> {
        self.end_hijri
    }
}

/// A time-bounded grant of a role to a member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    assignment_id: AssignmentId,
    user_id: UserId,
    role_id: RoleId,
    period: AssignmentPeriod,
    start_hijri: HijriDate,
    end_hijri: Option<HijriDate>,
    notes: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RoleAssignment {
    /// Creates a new active assignment from a resolved period.
    #[must_use]
    pub fn new(
        user_id: UserId,
        role_id: RoleId,
        resolved: ResolvedPeriod,
        notes: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            assignment_id: AssignmentId::new(),
            user_id,
            role_id,
            period: resolved.period,
            start_hijri: resolved.start_hijri,
            end_hijri: resolved.end_hijri,
            notes,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rehydrates an assignment from storage.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn from_storage(
        assignment_id: AssignmentId,
        user_id: UserId,
        role_id: RoleId,
        period: AssignmentPeriod,
        start_hijri: HijriDate,
        end_hijri: Option<HijriDate>,
        notes: Option<String>,
        is_active: bool,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            assignment_id,
            user_id,
            role_id,
            period,
            start_hijri,
            end_hijri,
            notes,
            is_active,
            created_at,
            updated_at,
        }
    }

    /// Returns the stable assignment identifier.
    #[must_use]
    pub fn assignment_id(&self) -> AssignmentId {
        self.assignment_id
    }

    /// Returns the member holding the role.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the granted role.
    #[must_use]
    pub fn role_id(&self) -> RoleId {
        self.role_id
    }

    /// Returns the Gregorian validity period.
    #[must_use]
    pub fn period(&self) -> AssignmentPeriod {
        self.period
    }

    /// Returns the Hijri start mirror.
    #[must_use]
    pub fn start_hijri(&self) -> HijriDate {
        self.start_hijri
    }

    /// Returns the Hijri end mirror, if bounded.
    #[must_use]
    pub fn end_hijri(&self) -> Option<HijriDate> {
        self.end_hijri
    }

    /// Returns the free-form notes.
    #[must_use]
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Returns whether the assignment has been soft-deleted.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last-update timestamp.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Resolves the lifecycle status relative to an as-of date.
    ///
    /// Exactly one branch applies: soft-deleted rows are `Inactive`
    /// regardless of dates, rows whose period has not started are `Pending`,
    /// rows past their end date are `Expired`, everything else is `Active`.
    /// An assignment is still active on its end date itself.
    #[must_use]
    pub fn status_at(&self, as_of: NaiveDate) -> AssignmentStatus {
        if !self.is_active {
            return AssignmentStatus::Inactive;
        }

        if as_of < self.period.start {
            return AssignmentStatus::Pending;
        }

        match self.period.end {
            Some(end) if as_of > end => AssignmentStatus::Expired,
            _ => AssignmentStatus::Active,
        }
    }

    /// Replaces the validity period with a newly resolved one.
    pub fn set_period(&mut self, resolved: ResolvedPeriod) {
        self.period = resolved.period;
        self.start_hijri = resolved.start_hijri;
        self.end_hijri = resolved.end_hijri;
    }

    /// Replaces the free-form notes.
    pub fn set_notes(&mut self, notes: Option<String>) {
        self.notes = notes;
    }

    /// Sets the soft-delete flag.
    pub fn set_active(&mut self, is_active: bool) {
        self.is_active = is_active;
    }

    /// Records an update timestamp.
    pub fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use proptest::prelude::*;
    use silat_core::{RoleId, UserId};

    use super::{AssignmentDates, AssignmentPeriod, AssignmentStatus, RoleAssignment};
    use crate::HijriDate;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
    }

    fn period(start: NaiveDate, end: Option<NaiveDate>) -> AssignmentPeriod {
        AssignmentPeriod::new(start, end).unwrap_or_else(|_| {
            AssignmentPeriod::new(NaiveDate::MIN, None).unwrap_or_else(|_| unreachable!())
        })
    }

    fn assignment(start: NaiveDate, end: Option<NaiveDate>) -> RoleAssignment {
        let dates = AssignmentDates {
            start_gregorian: Some(start),
            end_gregorian: end,
            ..AssignmentDates::default()
        };
        let resolved = dates.resolve();
        assert!(resolved.is_ok());
        RoleAssignment::new(
            UserId::new(),
            RoleId::new(),
            resolved.unwrap_or_else(|_| unreachable!()),
            None,
        )
    }

    #[test]
    fn rejects_inverted_periods() {
        let result = AssignmentPeriod::new(date(2025, 6, 1), Some(date(2025, 1, 1)));
        assert!(result.is_err());

        let result = AssignmentPeriod::new(date(2025, 6, 1), Some(date(2025, 6, 1)));
        assert!(result.is_err());
    }

    #[test]
    fn open_ended_periods_are_allowed() {
        let result = AssignmentPeriod::new(date(2025, 6, 1), None);
        assert!(result.is_ok());
    }

    #[test]
    fn detects_overlapping_periods() {
        let first = period(date(2025, 1, 1), Some(date(2025, 12, 31)));
        let second = period(date(2025, 6, 1), Some(date(2026, 6, 1)));
        assert!(first.overlaps(&second));
        assert!(second.overlaps(&first));
    }

    #[test]
    fn disjoint_periods_do_not_overlap() {
        let first = period(date(2024, 1, 1), Some(date(2024, 12, 31)));
        let second = period(date(2025, 1, 1), Some(date(2025, 12, 31)));
        assert!(!first.overlaps(&second));
    }

    #[test]
    fn open_ended_periods_overlap_everything_later() {
        let open = period(date(2025, 1, 1), None);
        let later = period(date(2030, 1, 1), Some(date(2031, 1, 1)));
        assert!(open.overlaps(&later));

        let earlier = period(date(2020, 1, 1), Some(date(2024, 12, 31)));
        assert!(!open.overlaps(&earlier));
    }

    #[test]
    fn derives_hijri_mirror_from_gregorian_input() {
        let dates = AssignmentDates {
            start_gregorian: Some(date(2024, 7, 8)),
            ..AssignmentDates::default()
        };
        let resolved = dates.resolve();
        assert!(resolved.is_ok());
        assert_eq!(
            resolved.ok().map(|value| value.start_hijri()),
            HijriDate::new(1446, 1, 1).ok()
        );
    }

    #[test]
    fn derives_gregorian_from_hijri_only_input() {
        let dates = AssignmentDates {
            start_hijri: HijriDate::new(1446, 1, 1).ok(),
            ..AssignmentDates::default()
        };
        let resolved = dates.resolve();
        assert!(resolved.is_ok());
        assert_eq!(
            resolved.ok().map(|value| value.period().start()),
            Some(date(2024, 7, 8))
        );
    }

    #[test]
    fn rejects_disagreeing_calendar_pairs() {
        let dates = AssignmentDates {
            start_gregorian: Some(date(2024, 1, 1)),
            start_hijri: HijriDate::new(1446, 1, 1).ok(),
            ..AssignmentDates::default()
        };
        assert!(dates.resolve().is_err());
    }

    #[test]
    fn tolerates_one_day_of_calendar_drift() {
        let dates = AssignmentDates {
            start_gregorian: Some(date(2024, 7, 7)),
            start_hijri: HijriDate::new(1446, 1, 1).ok(),
            ..AssignmentDates::default()
        };
        assert!(dates.resolve().is_ok());
    }

    #[test]
    fn requires_a_start_in_some_calendar() {
        let dates = AssignmentDates {
            end_gregorian: Some(date(2025, 1, 1)),
            ..AssignmentDates::default()
        };
        assert!(dates.resolve().is_err());
    }

    #[test]
    fn future_assignments_are_pending() {
        let assignment = assignment(date(2025, 12, 31), None);
        assert_eq!(
            assignment.status_at(date(2025, 6, 1)),
            AssignmentStatus::Pending
        );
    }

    #[test]
    fn elapsed_assignments_are_expired() {
        let assignment = assignment(date(2024, 1, 1), Some(date(2025, 1, 1)));
        assert_eq!(
            assignment.status_at(date(2025, 6, 1)),
            AssignmentStatus::Expired
        );
    }

    #[test]
    fn assignments_stay_active_on_their_end_date() {
        let assignment = assignment(date(2024, 1, 1), Some(date(2025, 1, 1)));
        assert_eq!(
            assignment.status_at(date(2025, 1, 1)),
            AssignmentStatus::Active
        );
    }

    #[test]
    fn soft_deleted_assignments_are_inactive_regardless_of_dates() {
        let mut assignment = assignment(date(2024, 1, 1), Some(date(2025, 1, 1)));
        assignment.set_active(false);
        assert_eq!(
            assignment.status_at(date(2024, 6, 1)),
            AssignmentStatus::Inactive
        );
    }

    proptest! {
        #[test]
        fn status_is_total(
            start_offset in 0u32..20_000,
            length in proptest::option::of(1u32..10_000),
            as_of_offset in 0u32..40_000,
            is_active in any::<bool>(),
        ) {
            let base = date(2000, 1, 1);
            let start = base + chrono::Days::new(u64::from(start_offset));
            let end = length.map(|days| start + chrono::Days::new(u64::from(days)));
            let as_of = base + chrono::Days::new(u64::from(as_of_offset));

            let mut subject = assignment(start, end);
            subject.set_active(is_active);
            let status = subject.status_at(as_of);

            let expected = if !is_active {
                AssignmentStatus::Inactive
            } else if as_of < start {
                AssignmentStatus::Pending
            } else if end.map(|value| as_of > value).unwrap_or(false) {
                AssignmentStatus::Expired
            } else {
                AssignmentStatus::Active
            };
            prop_assert_eq!(status, expected);
        }

        #[test]
        fn overlap_matches_the_interval_formula(
            s1 in 0u32..1000,
            l1 in proptest::option::of(1u32..1000),
            s2 in 0u32..1000,
            l2 in proptest::option::of(1u32..1000),
        ) {
            let base = date(2000, 1, 1);
            let first = period(
                base + chrono::Days::new(u64::from(s1)),
                l1.map(|days| base + chrono::Days::new(u64::from(s1 + days))),
            );
            let second = period(
                base + chrono::Days::new(u64::from(s2)),
                l2.map(|days| base + chrono::Days::new(u64::from(s2 + days))),
            );

            let expected = first.start() < second.end().unwrap_or(NaiveDate::MAX)
                && second.start() < first.end().unwrap_or(NaiveDate::MAX);
            prop_assert_eq!(first.overlaps(&second), expected);
        }
    }
}
