/// Project membership and ownership checks
///
/// Every project-scoped operation asks one of two questions about the caller:
///
/// 1. **Membership**: does a `project_members` row exist for `(project, caller)`?
///    Required to read or mutate tasks and the roster.
/// 2. **Ownership**: is the caller `projects.owner_id`? Required to edit or
///    delete the project and to add or remove members.
///
/// # Transactions
///
/// The checks take a `&mut PgConnection` so they run on the same transaction
/// as the mutation they guard. Locks are always taken project row first:
///
/// - membership takes `FOR KEY SHARE` on the project, then `FOR SHARE` on the
///   roster row, so a concurrent removal waits until the guarded mutation
///   commits and a project delete waits before touching the roster
/// - ownership takes `FOR NO KEY UPDATE` on the project, which still admits
///   the key-share locks that task inserts need for their foreign key
///
/// # Example
///
/// ```no_run
/// use roadmate_shared::auth::{authorization::require_member, Identity};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, identity: Identity, project_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let mut tx = pool.begin().await?;
/// require_member(&mut tx, &identity, project_id).await?;
/// // ... mutate project rows on `tx` ...
/// tx.commit().await?;
/// # Ok(())
/// # }
/// ```

use sqlx::PgConnection;
use uuid::Uuid;

use super::Identity;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Caller has no membership row for the project (or the project does not exist)
    #[error("Not a member of project {0}")]
    NotAMember(Uuid),

    /// Caller is not the project's owner (or the project does not exist)
    #[error("Not the owner of project {0}")]
    NotOwner(Uuid),

    /// Database error
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Checks whether `user_id` is on a project's roster
///
/// Locks the membership row for the rest of the transaction.
pub async fn roster_contains(
    conn: &mut PgConnection,
    project_id: Uuid,
    user_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let row: Option<i32> = sqlx::query_scalar(
        r#"
        SELECT 1
        FROM project_members
        WHERE project_id = $1 AND user_id = $2
        FOR SHARE
        "#,
    )
    .bind(project_id)
    .bind(user_id)
    .fetch_optional(conn)
    .await?;

    Ok(row.is_some())
}

/// Key-share locks a project row
///
/// Returns `false` if the project does not exist (or was deleted while
/// waiting).
pub async fn lock_project_key(conn: &mut PgConnection, project_id: Uuid) -> Result<bool, sqlx::Error> {
    let row: Option<i32> = sqlx::query_scalar(
        r#"
        SELECT 1
        FROM projects
        WHERE id = $1
        FOR KEY SHARE
        "#,
    )
    .bind(project_id)
    .fetch_optional(conn)
    .await?;

    Ok(row.is_some())
}

/// Checks whether the caller belongs to a project
pub async fn is_member(
    conn: &mut PgConnection,
    identity: &Identity,
    project_id: Uuid,
) -> Result<bool, sqlx::Error> {
    if !lock_project_key(&mut *conn, project_id).await? {
        return Ok(false);
    }

    roster_contains(conn, project_id, identity.user_id).await
}

/// Checks whether the caller owns a project
///
/// Locks the project row `FOR NO KEY UPDATE` for the rest of the transaction.
pub async fn is_owner(
    conn: &mut PgConnection,
    identity: &Identity,
    project_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let row: Option<i32> = sqlx::query_scalar(
        r#"
        SELECT 1
        FROM projects
        WHERE id = $1 AND owner_id = $2
        FOR NO KEY UPDATE
        "#,
    )
    .bind(project_id)
    .bind(identity.user_id)
    .fetch_optional(conn)
    .await?;

    Ok(row.is_some())
}

/// Requires project membership
///
/// # Errors
///
/// Returns `AuthzError::NotAMember` if the caller is not on the roster.
pub async fn require_member(
    conn: &mut PgConnection,
    identity: &Identity,
    project_id: Uuid,
) -> Result<(), AuthzError> {
    if !is_member(conn, identity, project_id).await? {
        tracing::debug!(
            user_id = %identity.user_id,
            project_id = %project_id,
            "Membership check failed"
        );
        return Err(AuthzError::NotAMember(project_id));
    }

    Ok(())
}

/// Requires project ownership
///
/// # Errors
///
/// Returns `AuthzError::NotOwner` if the caller is not the owner.
pub async fn require_owner(
    conn: &mut PgConnection,
    identity: &Identity,
    project_id: Uuid,
) -> Result<(), AuthzError> {
    if !is_owner(conn, identity, project_id).await? {
        tracing::debug!(
            user_id = %identity.user_id,
            project_id = %project_id,
            "Ownership check failed"
        );
        return Err(AuthzError::NotOwner(project_id));
    }

    Ok(())
}
