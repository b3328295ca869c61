//! Overlap detection for candidate assignment periods.

use std::sync::Arc;

use async_trait::async_trait;
use silat_core::{AppResult, AssignmentId, RoleId, UserId};
use silat_domain::AssignmentPeriod;

use crate::AssignmentRepository;

/// Port deciding whether a candidate period conflicts with stored rows.
///
/// A port rather than a function so that the linear scan can be swapped for
/// an interval-tree implementation if assignment counts ever warrant it.
#[async_trait]
pub trait ConflictDetector: Send + Sync {
    /// Returns the ids of active assignments whose periods intersect the
    /// candidate, excluding an optional id (the row being updated).
    ///
    /// An empty result means no conflict.
    async fn find_conflicts(
        &self,
        user_id: UserId,
        role_id: RoleId,
        candidate: AssignmentPeriod,
        exclude: Option<AssignmentId>,
    ) -> AppResult<Vec<AssignmentId>>;
}

/// Pairwise scan over the member's active assignments of the same role.
///
/// Linear in the number of assignments held by one member for one role,
/// which stays small in practice.
#[derive(Clone)]
pub struct LinearConflictDetector {
    repository: Arc<dyn AssignmentRepository>,
}

impl LinearConflictDetector {
    /// Creates a detector reading from the given repository.
    #[must_use]
    pub fn new(repository: Arc<dyn AssignmentRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl ConflictDetector for LinearConflictDetector {
    async fn find_conflicts(
        &self,
        user_id: UserId,
        role_id: RoleId,
        candidate: AssignmentPeriod,
        exclude: Option<AssignmentId>,
    ) -> AppResult<Vec<AssignmentId>> {
        let existing = self
            .repository
            .list_active_by_user_role(user_id, role_id, exclude)
            .await?;

        Ok(existing
            .iter()
            .filter(|assignment| assignment.period().overlaps(&candidate))
            .map(|assignment| assignment.assignment_id())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::NaiveDate;
    use silat_core::{AppResult, AssignmentId, RoleId, UserId};
    use silat_domain::{AssignmentDates, AssignmentPeriod, RoleAssignment};
    use tokio::sync::Mutex;

    use super::{ConflictDetector, LinearConflictDetector};
    use crate::AssignmentRepository;

    #[derive(Default)]
    struct FakeAssignmentRepository {
        rows: Mutex<Vec<RoleAssignment>>,
    }

    #[async_trait]
    impl AssignmentRepository for FakeAssignmentRepository {
        async fn insert(&self, assignment: RoleAssignment) -> AppResult<RoleAssignment> {
            self.rows.lock().await.push(assignment.clone());
            Ok(assignment)
        }

        async fn update(&self, assignment: RoleAssignment) -> AppResult<RoleAssignment> {
            Ok(assignment)
        }

        async fn soft_delete(&self, _assignment_id: AssignmentId) -> AppResult<()> {
            Ok(())
        }

        async fn find(&self, _assignment_id: AssignmentId) -> AppResult<Option<RoleAssignment>> {
            Ok(None)
        }

        async fn list_by_user(&self, user_id: UserId) -> AppResult<Vec<RoleAssignment>> {
            Ok(self
                .rows
                .lock()
                .await
                .iter()
                .filter(|row| row.user_id() == user_id)
                .cloned()
                .collect())
        }

        async fn list_active_by_user_role(
            &self,
            user_id: UserId,
            role_id: RoleId,
            exclude: Option<AssignmentId>,
        ) -> AppResult<Vec<RoleAssignment>> {
            Ok(self
                .rows
                .lock()
                .await
                .iter()
                .filter(|row| {
                    row.is_active()
                        && row.user_id() == user_id
                        && row.role_id() == role_id
                        && Some(row.assignment_id()) != exclude
                })
                .cloned()
                .collect())
        }
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
    }

    fn stored_assignment(
        user_id: UserId,
        role_id: RoleId,
        start: NaiveDate,
        end: Option<NaiveDate>,
    ) -> RoleAssignment {
        let dates = AssignmentDates {
            start_gregorian: Some(start),
            end_gregorian: end,
            ..AssignmentDates::default()
        };
        let resolved = dates.resolve();
        assert!(resolved.is_ok());
        RoleAssignment::new(
            user_id,
            role_id,
            resolved.unwrap_or_else(|_| unreachable!()),
            None,
        )
    }

    fn candidate(start: NaiveDate, end: Option<NaiveDate>) -> AssignmentPeriod {
        let period = AssignmentPeriod::new(start, end);
        assert!(period.is_ok());
        period.unwrap_or_else(|_| unreachable!())
    }

    #[tokio::test]
    async fn reports_overlapping_assignment_ids() {
        let user_id = UserId::new();
        let role_id = RoleId::new();
        let repository = Arc::new(FakeAssignmentRepository::default());
        let stored =
            stored_assignment(user_id, role_id, date(2025, 1, 1), Some(date(2025, 12, 31)));
        let stored_id = stored.assignment_id();
        let inserted = repository.insert(stored).await;
        assert!(inserted.is_ok());

        let detector = LinearConflictDetector::new(repository);
        let conflicts = detector
            .find_conflicts(
                user_id,
                role_id,
                candidate(date(2025, 6, 1), Some(date(2026, 6, 1))),
                None,
            )
            .await;

        assert_eq!(conflicts.ok(), Some(vec![stored_id]));
    }

    #[tokio::test]
    async fn ignores_other_roles_and_disjoint_periods() {
        let user_id = UserId::new();
        let role_id = RoleId::new();
        let repository = Arc::new(FakeAssignmentRepository::default());

        let other_role =
            stored_assignment(user_id, RoleId::new(), date(2025, 1, 1), Some(date(2025, 12, 31)));
        let disjoint =
            stored_assignment(user_id, role_id, date(2023, 1, 1), Some(date(2023, 12, 31)));
        for row in [other_role, disjoint] {
            let inserted = repository.insert(row).await;
            assert!(inserted.is_ok());
        }

        let detector = LinearConflictDetector::new(repository);
        let conflicts = detector
            .find_conflicts(
                user_id,
                role_id,
                candidate(date(2025, 6, 1), Some(date(2026, 6, 1))),
                None,
            )
            .await;

        assert_eq!(conflicts.ok(), Some(Vec::new()));
    }

    #[tokio::test]
    async fn excluded_id_never_conflicts_with_itself() {
        let user_id = UserId::new();
        let role_id = RoleId::new();
        let repository = Arc::new(FakeAssignmentRepository::default());
        let stored = stored_assignment(user_id, role_id, date(2025, 1, 1), None);
        let stored_id = stored.assignment_id();
        let inserted = repository.insert(stored).await;
        assert!(inserted.is_ok());

        let detector = LinearConflictDetector::new(repository);
        let conflicts = detector
            .find_conflicts(
                user_id,
                role_id,
                candidate(date(2025, 3, 1), None),
                Some(stored_id),
            )
            .await;

        assert_eq!(conflicts.ok(), Some(Vec::new()));
    }
}
