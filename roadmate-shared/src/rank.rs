/// Rank maintenance for ordered task columns
///
/// Tasks are ordered inside a *partition*, the `(project_id, status)` pair
/// that makes up one board column. Within a partition every task has a
/// distinct non-negative `sort_index`; 0 is the top of the column.
///
/// # Insertion
///
/// ```text
/// requested = None          → append at max + 1 (0 when empty)
/// requested = Some(i), i<0  → RankError::NegativeIndex
/// requested = Some(i), i≥n  → append, no shift      (n = max + 1)
/// requested = Some(i), i<n  → shift [i, n) up by one, insert at i
/// ```
///
/// # Isolation
///
/// [`reserve`] takes a transaction-scoped advisory lock keyed by the
/// partition before it reads the current maximum. A second insert into the
/// same partition blocks on that lock until the first transaction commits or
/// rolls back, then reads the committed state. Different partitions hash to
/// different keys and never wait on each other. The unique constraint on
/// `(project_id, status, sort_index)` backs this up at the storage layer.
///
/// The lock is released with the transaction, so a cancelled request (its
/// transaction dropped and rolled back) leaves neither a shift nor a lock
/// behind.

use sqlx::PgConnection;
use uuid::Uuid;

use crate::models::task::TaskStatus;

/// Error type for rank operations
#[derive(Debug, thiserror::Error)]
pub enum RankError {
    /// Requested position is below zero
    #[error("sort_index must be non-negative, got {0}")]
    NegativeIndex(i32),

    /// Database error
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// One ordered column of a project's board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    pub project_id: Uuid,
    pub status: TaskStatus,
}

impl Partition {
    pub fn new(project_id: Uuid, status: TaskStatus) -> Self {
        Self { project_id, status }
    }

    /// Text hashed into the advisory lock key
    pub fn lock_key(&self) -> String {
        format!("tasks:{}:{}", self.project_id, self.status.as_str())
    }
}

/// Outcome of planning an insertion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankPlan {
    /// Index the new task will occupy
    pub assigned: i32,

    /// When set, every row with `sort_index >= shift_from` moves down by one
    pub shift_from: Option<i32>,
}

/// Rejects negative positions without touching storage
pub fn check_requested(requested: Option<i32>) -> Result<(), RankError> {
    match requested {
        Some(index) if index < 0 => Err(RankError::NegativeIndex(index)),
        _ => Ok(()),
    }
}

/// Plans an insertion given the partition's current maximum index
///
/// Pure: the same inputs always give the same plan. A request at or past
/// the end of the column is an append, so it never shifts.
pub fn plan_insert(current_max: Option<i32>, requested: Option<i32>) -> Result<RankPlan, RankError> {
    check_requested(requested)?;

    let next = current_max.map_or(0, |max| max + 1);

    let plan = match requested {
        Some(index) if index < next => RankPlan {
            assigned: index,
            shift_from: Some(index),
        },
        _ => RankPlan {
            assigned: next,
            shift_from: None,
        },
    };

    Ok(plan)
}

/// Serializes rank changes within a partition until the transaction ends
pub async fn lock_partition(conn: &mut PgConnection, partition: &Partition) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
        .bind(partition.lock_key())
        .execute(conn)
        .await?;

    Ok(())
}

/// Highest `sort_index` in the partition, `None` when it is empty
pub async fn current_max(conn: &mut PgConnection, partition: &Partition) -> Result<Option<i32>, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT MAX(sort_index)
        FROM tasks
        WHERE project_id = $1 AND status = $2
        "#,
    )
    .bind(partition.project_id)
    .bind(partition.status)
    .fetch_one(conn)
    .await
}

/// Moves every row at or below `from` down one place
///
/// Returns the number of rows shifted.
pub async fn shift_down(
    conn: &mut PgConnection,
    partition: &Partition,
    from: i32,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE tasks
        SET sort_index = sort_index + 1
        WHERE project_id = $1 AND status = $2 AND sort_index >= $3
        "#,
    )
    .bind(partition.project_id)
    .bind(partition.status)
    .bind(from)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

/// Reserves a slot in the partition and returns its index
///
/// Locks the partition, plans against the committed maximum, and performs
/// the shift if one is needed. The caller inserts the new row at the
/// returned index on the same transaction.
pub async fn reserve(
    conn: &mut PgConnection,
    partition: &Partition,
    requested: Option<i32>,
) -> Result<i32, RankError> {
    check_requested(requested)?;

    lock_partition(conn, partition).await?;

    let max = current_max(conn, partition).await?;
    let plan = plan_insert(max, requested)?;

    if let Some(from) = plan.shift_from {
        let shifted = shift_down(conn, partition, from).await?;
        tracing::debug!(
            project_id = %partition.project_id,
            status = partition.status.as_str(),
            from,
            shifted,
            "Shifted ranks to open a slot"
        );
    }

    Ok(plan.assigned)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// In-memory model of a partition: each entry is (label, sort_index).
    fn apply(rows: &mut Vec<(&'static str, i32)>, label: &'static str, requested: Option<i32>) -> i32 {
        let max = rows.iter().map(|(_, index)| *index).max();
        let plan = plan_insert(max, requested).unwrap();

        if let Some(from) = plan.shift_from {
            for (_, index) in rows.iter_mut() {
                if *index >= from {
                    *index += 1;
                }
            }
        }

        rows.push((label, plan.assigned));
        rows.sort_by_key(|(_, index)| *index);
        plan.assigned
    }

    #[test]
    fn test_append_to_empty_partition() {
        let plan = plan_insert(None, None).unwrap();
        assert_eq!(plan, RankPlan { assigned: 0, shift_from: None });
    }

    #[test]
    fn test_append_after_max() {
        let plan = plan_insert(Some(4), None).unwrap();
        assert_eq!(plan, RankPlan { assigned: 5, shift_from: None });
    }

    #[test]
    fn test_insert_in_middle_shifts() {
        let mut rows = vec![("a", 0), ("b", 1), ("c", 2), ("d", 3)];

        let assigned = apply(&mut rows, "new", Some(1));

        assert_eq!(assigned, 1);
        assert_eq!(
            rows,
            vec![("a", 0), ("new", 1), ("b", 2), ("c", 3), ("d", 4)]
        );
    }

    #[test]
    fn test_insert_at_top() {
        let plan = plan_insert(Some(2), Some(0)).unwrap();
        assert_eq!(plan, RankPlan { assigned: 0, shift_from: Some(0) });
    }

    #[test]
    fn test_requested_at_count_is_plain_append() {
        // Partition [0,1,2,3]: count is 4
        assert_eq!(plan_insert(Some(3), Some(4)).unwrap(), plan_insert(Some(3), None).unwrap());
        assert_eq!(plan_insert(None, Some(0)).unwrap(), plan_insert(None, None).unwrap());
    }

    #[test]
    fn test_requested_past_end_is_clamped() {
        let plan = plan_insert(Some(3), Some(40)).unwrap();
        assert_eq!(plan, RankPlan { assigned: 4, shift_from: None });
    }

    #[test]
    fn test_negative_index_rejected() {
        assert!(matches!(plan_insert(Some(3), Some(-1)), Err(RankError::NegativeIndex(-1))));
        assert!(matches!(check_requested(Some(-7)), Err(RankError::NegativeIndex(-7))));
        assert!(check_requested(Some(0)).is_ok());
        assert!(check_requested(None).is_ok());
    }

    #[test]
    fn test_sequence_keeps_indices_dense_and_unique() {
        let mut rows = Vec::new();
        let requests = [None, Some(0), None, Some(1), Some(10), Some(2), None, Some(0)];

        for request in requests {
            apply(&mut rows, "t", request);
        }

        let indices: Vec<i32> = rows.iter().map(|(_, index)| *index).collect();
        assert_eq!(indices, (0..requests.len() as i32).collect::<Vec<_>>());
    }

    #[test]
    fn test_existing_relative_order_preserved() {
        let mut rows = vec![("a", 0), ("b", 1), ("c", 2)];
        apply(&mut rows, "x", Some(2));
        apply(&mut rows, "y", Some(0));

        let order: Vec<&str> = rows.iter().map(|(label, _)| *label).collect();
        assert_eq!(order, vec!["y", "a", "b", "x", "c"]);
    }

    #[test]
    fn test_lock_key_differs_per_partition() {
        let project_id = Uuid::new_v4();
        let backlog = Partition::new(project_id, TaskStatus::Backlog);
        let done = Partition::new(project_id, TaskStatus::Done);

        assert_ne!(backlog.lock_key(), done.lock_key());
        assert!(backlog.lock_key().contains(&project_id.to_string()));
    }
}
