/// Database models
///
/// Each model is a `sqlx::FromRow` struct with associated async functions.
/// Functions that take `&mut PgConnection` are meant to run inside a caller's
/// transaction; the ones taking `&PgPool` stand alone.
///
/// # Models
///
/// - `user`: Stored credentials
/// - `profile`: Profile text, skills and educations
/// - `project`: Projects
/// - `membership`: Project rosters
/// - `task`: Board tasks and ranked insertion
///
/// # Example
///
/// ```no_run
/// use roadmate_shared::models::{profile::Profile, user::User};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let mut tx = pool.begin().await?;
/// let user = User::create(&mut tx, "alice", "$argon2id$...").await?;
/// Profile::create_empty(&mut tx, user.id).await?;
/// tx.commit().await?;
/// # Ok(())
/// # }
/// ```

pub mod membership;
pub mod profile;
pub mod project;
pub mod task;
pub mod user;
