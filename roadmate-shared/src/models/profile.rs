/// Profiles, skills and educations
///
/// Every row here is owned by exactly one user and only ever touched by that
/// user, so each query is scoped by `user_id`. A row that belongs to someone
/// else is indistinguishable from a missing one.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE profiles (
///     user_id UUID PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
///     name VARCHAR(255) NOT NULL DEFAULT '',
///     headline VARCHAR(255) NOT NULL DEFAULT '',
///     bio TEXT NOT NULL DEFAULT '',
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE skills (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     name VARCHAR(100) NOT NULL,
///     proficiency INTEGER NOT NULL CHECK (proficiency BETWEEN 1 AND 10),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE educations (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     school VARCHAR(255) NOT NULL,
///     degree VARCHAR(255) NOT NULL,
///     major VARCHAR(255) NOT NULL,
///     start_year INTEGER NOT NULL,
///     end_year INTEGER NOT NULL,
///     ...
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

/// Lowest accepted skill proficiency
pub const MIN_PROFICIENCY: i32 = 1;

/// Highest accepted skill proficiency
pub const MAX_PROFICIENCY: i32 = 10;

/// Free-text part of a profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Profile {
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    pub name: String,
    pub headline: String,
    pub bio: String,
    #[serde(skip_serializing)]
    pub updated_at: DateTime<Utc>,
}

/// Partial profile update; `None` fields are left alone
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub headline: Option<String>,
    pub bio: Option<String>,
}

impl ProfileChanges {
    /// Builds changes from raw input, dropping blank fields
    pub fn from_input(name: Option<&str>, headline: Option<&str>, bio: Option<&str>) -> Self {
        fn keep(value: Option<&str>) -> Option<String> {
            value.map(str::trim).filter(|v| !v.is_empty()).map(String::from)
        }

        Self {
            name: keep(name),
            headline: keep(headline),
            bio: keep(bio),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.headline.is_none() && self.bio.is_none()
    }
}

/// Skill entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Skill {
    pub id: Uuid,
    pub name: String,
    pub proficiency: i32,
}

/// Education entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Education {
    pub id: Uuid,
    pub school: String,
    pub degree: String,
    pub major: String,
    #[serde(rename = "startyear")]
    pub start_year: i32,
    #[serde(rename = "endyear")]
    pub end_year: i32,
}

/// Validated education fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EducationInput {
    pub school: String,
    pub degree: String,
    pub major: String,
    pub start_year: i32,
    pub end_year: i32,
}

impl EducationInput {
    /// Trims text fields and checks the year range
    pub fn new(
        school: &str,
        degree: &str,
        major: &str,
        start_year: i32,
        end_year: i32,
    ) -> Result<Self, String> {
        let (school, degree, major) = (school.trim(), degree.trim(), major.trim());

        if school.is_empty() || degree.is_empty() || major.is_empty() {
            return Err("school, degree and major are required".to_string());
        }

        if start_year <= 0 || end_year <= 0 {
            return Err("startyear and endyear are required".to_string());
        }

        if end_year < start_year {
            return Err("endyear must not be before startyear".to_string());
        }

        Ok(Self {
            school: school.to_string(),
            degree: degree.to_string(),
            major: major.to_string(),
            start_year,
            end_year,
        })
    }
}

impl Profile {
    /// Creates the empty profile that goes with a new user
    pub async fn create_empty(conn: &mut PgConnection, user_id: Uuid) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (user_id)
            VALUES ($1)
            RETURNING user_id, name, headline, bio, updated_at
            "#,
        )
        .bind(user_id)
        .fetch_one(conn)
        .await
    }

    pub async fn find(pool: &PgPool, user_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Profile>(
            r#"
            SELECT user_id, name, headline, bio, updated_at
            FROM profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Applies a partial update
    ///
    /// Returns the number of rows changed (0 or 1).
    pub async fn update(
        pool: &PgPool,
        user_id: Uuid,
        changes: &ProfileChanges,
    ) -> Result<u64, sqlx::Error> {
        if changes.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            r#"
            UPDATE profiles
            SET name = COALESCE($2, name),
                headline = COALESCE($3, headline),
                bio = COALESCE($4, bio),
                updated_at = NOW()
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(changes.name.as_deref())
        .bind(changes.headline.as_deref())
        .bind(changes.bio.as_deref())
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}

impl Skill {
    /// Lists skills, strongest first
    pub async fn list(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Skill>(
            r#"
            SELECT id, name, proficiency
            FROM skills
            WHERE user_id = $1
            ORDER BY proficiency DESC, lower(name) ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Adds a skill
    ///
    /// # Errors
    ///
    /// A unique violation if the user already has a skill with this name in
    /// any letter case.
    pub async fn create(
        pool: &PgPool,
        user_id: Uuid,
        name: &str,
        proficiency: i32,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Skill>(
            r#"
            INSERT INTO skills (user_id, name, proficiency)
            VALUES ($1, $2, $3)
            RETURNING id, name, proficiency
            "#,
        )
        .bind(user_id)
        .bind(name)
        .bind(proficiency)
        .fetch_one(pool)
        .await
    }

    /// Changes a skill's proficiency; `None` if the user has no such skill
    pub async fn update_proficiency(
        pool: &PgPool,
        user_id: Uuid,
        id: Uuid,
        proficiency: i32,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Skill>(
            r#"
            UPDATE skills
            SET proficiency = $3
            WHERE id = $2 AND user_id = $1
            RETURNING id, name, proficiency
            "#,
        )
        .bind(user_id)
        .bind(id)
        .bind(proficiency)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM skills WHERE id = $2 AND user_id = $1")
            .bind(user_id)
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl Education {
    /// Lists educations, most recent start first
    pub async fn list(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Education>(
            r#"
            SELECT id, school, degree, major, start_year, end_year
            FROM educations
            WHERE user_id = $1
            ORDER BY start_year DESC, lower(school) ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Adds an education
    ///
    /// # Errors
    ///
    /// A unique violation if an identical entry already exists.
    pub async fn create(
        pool: &PgPool,
        user_id: Uuid,
        input: &EducationInput,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Education>(
            r#"
            INSERT INTO educations (user_id, school, degree, major, start_year, end_year)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, school, degree, major, start_year, end_year
            "#,
        )
        .bind(user_id)
        .bind(&input.school)
        .bind(&input.degree)
        .bind(&input.major)
        .bind(input.start_year)
        .bind(input.end_year)
        .fetch_one(pool)
        .await
    }

    /// Replaces an education; `None` if the user has no such entry
    pub async fn update(
        pool: &PgPool,
        user_id: Uuid,
        id: Uuid,
        input: &EducationInput,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Education>(
            r#"
            UPDATE educations
            SET school = $3, degree = $4, major = $5, start_year = $6, end_year = $7
            WHERE id = $2 AND user_id = $1
            RETURNING id, school, degree, major, start_year, end_year
            "#,
        )
        .bind(user_id)
        .bind(id)
        .bind(&input.school)
        .bind(&input.degree)
        .bind(&input.major)
        .bind(input.start_year)
        .bind(input.end_year)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM educations WHERE id = $2 AND user_id = $1")
            .bind(user_id)
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
