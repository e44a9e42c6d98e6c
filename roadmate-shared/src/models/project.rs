/// Projects and their rosters
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Deleting a project cascades to its roster and tasks.
///
/// # Example
///
/// ```no_run
/// use roadmate_shared::auth::Identity;
/// use roadmate_shared::models::project::Project;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, identity: Identity) -> Result<(), sqlx::Error> {
/// let mut tx = pool.begin().await?;
/// let created = Project::create_with_owner(&mut tx, &identity, "Roadmap", "", "backend").await?;
/// tx.commit().await?;
///
/// assert_eq!(created.members.len(), 1);
/// # Ok(())
/// # }
/// ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgConnection;
use uuid::Uuid;

use super::membership::ProjectMember;
use crate::auth::Identity;

/// Project row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Project together with its roster
#[derive(Debug, Clone, Serialize)]
pub struct ProjectWithMembers {
    #[serde(flatten)]
    pub project: Project,
    pub members: Vec<ProjectMember>,
}

impl Project {
    /// Creates a project and puts its owner on the roster
    ///
    /// Both rows are written on `conn`; commit the surrounding transaction
    /// to keep them together.
    pub async fn create_with_owner(
        conn: &mut PgConnection,
        owner: &Identity,
        name: &str,
        description: &str,
        role_key: &str,
    ) -> Result<ProjectWithMembers, sqlx::Error> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (name, description, owner_id)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, owner_id, created_at
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(owner.user_id)
        .fetch_one(&mut *conn)
        .await?;

        let member =
            ProjectMember::add(conn, project.id, owner.user_id, &owner.username, role_key).await?;

        tracing::info!(
            project_id = %project.id,
            owner_id = %owner.user_id,
            "Created project"
        );

        Ok(ProjectWithMembers {
            project,
            members: vec![member],
        })
    }

    /// Renames a project and replaces its description
    ///
    /// Returns `None` if the project no longer exists.
    pub async fn update(
        conn: &mut PgConnection,
        id: Uuid,
        name: &str,
        description: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET name = $2, description = $3
            WHERE id = $1
            RETURNING id, name, description, owner_id, created_at
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .fetch_optional(conn)
        .await
    }

    /// Deletes a project with its roster and tasks
    pub async fn delete(conn: &mut PgConnection, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists every project the caller is on the roster of, newest first,
    /// each with its full roster
    pub async fn list_with_members(
        conn: &mut PgConnection,
        identity: &Identity,
    ) -> Result<Vec<ProjectWithMembers>, sqlx::Error> {
        let projects = sqlx::query_as::<_, Project>(
            r#"
            SELECT p.id, p.name, p.description, p.owner_id, p.created_at
            FROM project_members pm
            JOIN projects p ON p.id = pm.project_id
            WHERE pm.user_id = $1
            ORDER BY p.created_at DESC, lower(p.name) ASC
            "#,
        )
        .bind(identity.user_id)
        .fetch_all(&mut *conn)
        .await?;

        let ids: Vec<Uuid> = projects.iter().map(|p| p.id).collect();
        let members = ProjectMember::list_for_projects(conn, &ids).await?;

        Ok(attach_members(projects, members))
    }
}

/// Groups roster rows under their projects, keeping both orders
pub fn attach_members(
    projects: Vec<Project>,
    members: Vec<ProjectMember>,
) -> Vec<ProjectWithMembers> {
    let mut by_project: HashMap<Uuid, Vec<ProjectMember>> = HashMap::new();
    for member in members {
        by_project.entry(member.project_id).or_default().push(member);
    }

    projects
        .into_iter()
        .map(|project| {
            let members = by_project.remove(&project.id).unwrap_or_default();
            ProjectWithMembers { project, members }
        })
        .collect()
}
