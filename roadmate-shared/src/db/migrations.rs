/// Schema migrations
///
/// SQL files under `roadmate-shared/migrations/` are embedded at compile
/// time with `sqlx::migrate!` and applied in version order. Applied versions
/// are recorded in `_sqlx_migrations`, so running at every startup is safe.
///
/// # Example
///
/// ```no_run
/// use roadmate_shared::db::migrations::{migration_status, run_migrations};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// run_migrations(&pool).await?;
///
/// let status = migration_status(&pool).await?;
/// println!("Applied {} migrations", status.applied_migrations);
/// # Ok(())
/// # }
/// ```

use sqlx::{migrate::MigrateDatabase, postgres::PgPool, Postgres};
use tracing::{debug, error, info};

/// What has been applied so far
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub applied_migrations: usize,

    /// Highest applied version (the timestamp prefix of the file name)
    pub latest_version: Option<i64>,

    /// Number of embedded migrations this build knows about
    pub known_migrations: usize,
}

impl MigrationStatus {
    pub fn is_up_to_date(&self) -> bool {
        self.applied_migrations >= self.known_migrations
    }
}

/// Applies every pending migration
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Running database migrations");

    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Migration failed");
            e
        })?;

    info!("Database schema is up to date");
    Ok(())
}

/// Reports applied versus embedded migrations
pub async fn migration_status(pool: &PgPool) -> Result<MigrationStatus, sqlx::Error> {
    let known_migrations = sqlx::migrate!("./migrations").iter().count();

    let table_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT FROM information_schema.tables
            WHERE table_schema = 'public' AND table_name = '_sqlx_migrations'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        debug!("Migrations table does not exist yet");
        return Ok(MigrationStatus {
            applied_migrations: 0,
            latest_version: None,
            known_migrations,
        });
    }

    let (count, latest_version): (i64, Option<i64>) = sqlx::query_as(
        r#"
        SELECT COUNT(*), MAX(version)
        FROM _sqlx_migrations
        WHERE success = true
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(MigrationStatus {
        applied_migrations: count as usize,
        latest_version,
        known_migrations,
    })
}

/// Creates the database named in `database_url` if it is missing
///
/// Used by local setup and the integration tests; production databases are
/// provisioned ahead of time.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), sqlx::Error> {
    if !Postgres::database_exists(database_url).await? {
        info!("Database does not exist, creating it");
        Postgres::create_database(database_url).await?;
    }

    Ok(())
}
