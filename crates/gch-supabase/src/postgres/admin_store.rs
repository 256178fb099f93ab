//! Admin-profile store over a Postgres pool.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use gch_auth::provider::AdminProfileStore;
use gch_core::error::{AppError, ErrorKind};
use gch_core::result::AppResult;
use gch_entity::admin::{AdminProfile, AdminRole, NewAdminProfile, UpdateAdminProfile};

/// Raw row; `role` is stored as text.
#[derive(Debug, sqlx::FromRow)]
struct AdminRow {
    id: Uuid,
    user_id: Uuid,
    email: String,
    full_name: String,
    role: String,
    is_active: bool,
    last_login: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AdminRow> for AdminProfile {
    type Error = AppError;

    fn try_from(row: AdminRow) -> Result<Self, Self::Error> {
        Ok(AdminProfile {
            id: row.id,
            user_id: row.user_id,
            email: row.email,
            full_name: row.full_name,
            role: row.role.parse::<AdminRole>()?,
            is_active: row.is_active,
            last_login: row.last_login,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| {
        let duplicate = matches!(&e, sqlx::Error::Database(db) if db.is_unique_violation());
        if duplicate {
            AppError::with_source(ErrorKind::Conflict, "Admin profile already exists", e)
        } else {
            AppError::with_source(ErrorKind::Database, context, e)
        }
    }
}

/// [`AdminProfileStore`] backed by `sqlx`.
#[derive(Debug, Clone)]
pub struct PgAdminProfileStore {
    pool: PgPool,
    table: String,
}

impl PgAdminProfileStore {
    /// Wrap an existing pool.
    pub fn new(pool: PgPool, table: &str) -> AppResult<Self> {
        if table.is_empty() || !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(AppError::configuration(format!(
                "Invalid admin table name: '{table}'"
            )));
        }
        Ok(Self {
            pool,
            table: table.to_string(),
        })
    }

    /// Open a small pool against `database_url`.
    pub async fn connect(database_url: &str, table: &str) -> AppResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to connect to Postgres", e)
            })?;
        info!(table = %table, "Connected admin profile store to Postgres");
        Self::new(pool, table)
    }

    async fn fetch_one(&self, sql: String, id: Uuid, context: &'static str) -> AppResult<Option<AdminProfile>> {
        sqlx::query_as::<_, AdminRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error(context))?
            .map(AdminProfile::try_from)
            .transpose()
    }
}

#[async_trait]
impl AdminProfileStore for PgAdminProfileStore {
    async fn find_by_user_id(&self, user_id: Uuid) -> AppResult<Option<AdminProfile>> {
        let sql = format!("SELECT * FROM {} WHERE user_id = $1 LIMIT 1", self.table);
        self.fetch_one(sql, user_id, "Failed to find admin profile by user").await
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<AdminProfile>> {
        let sql = format!(
            "SELECT * FROM {} WHERE LOWER(email) = LOWER($1) LIMIT 1",
            self.table
        );
        sqlx::query_as::<_, AdminRow>(&sql)
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find admin profile by email"))?
            .map(AdminProfile::try_from)
            .transpose()
    }

    async fn list(&self) -> AppResult<Vec<AdminProfile>> {
        let sql = format!("SELECT * FROM {} ORDER BY created_at DESC", self.table);
        sqlx::query_as::<_, AdminRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list admin profiles"))?
            .into_iter()
            .map(AdminProfile::try_from)
            .collect()
    }

    async fn insert(&self, profile: NewAdminProfile) -> AppResult<AdminProfile> {
        profile
            .validate()
            .map_err(|e| AppError::validation(format!("Invalid admin profile: {e}")))?;

        let sql = format!(
            "INSERT INTO {} (id, user_id, email, full_name, role, is_active, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, now(), now()) RETURNING *",
            self.table
        );
        let row = sqlx::query_as::<_, AdminRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(profile.user_id)
            .bind(&profile.email)
            .bind(&profile.full_name)
            .bind(profile.role.as_str())
            .bind(profile.is_active)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("Failed to insert admin profile"))?;
        row.try_into()
    }

    async fn update(&self, id: Uuid, changes: UpdateAdminProfile) -> AppResult<AdminProfile> {
        changes
            .validate()
            .map_err(|e| AppError::validation(format!("Invalid admin profile: {e}")))?;
        if changes.is_empty() {
            return Err(AppError::validation("Nothing to update"));
        }

        let sql = format!(
            "UPDATE {} SET \
                email = COALESCE($2, email), \
                full_name = COALESCE($3, full_name), \
                role = COALESCE($4, role), \
                is_active = COALESCE($5, is_active), \
                last_login = COALESCE($6, last_login), \
                updated_at = now() \
             WHERE id = $1 RETURNING *",
            self.table
        );
        sqlx::query_as::<_, AdminRow>(&sql)
            .bind(id)
            .bind(changes.email.as_deref())
            .bind(changes.full_name.as_deref())
            .bind(changes.role.map(|r| r.as_str()))
            .bind(changes.is_active)
            .bind(changes.last_login)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to update admin profile"))?
            .ok_or_else(|| AppError::not_found(format!("Admin profile {id} not found")))?
            .try_into()
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let sql = format!("DELETE FROM {} WHERE id = $1", self.table);
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to delete admin profile"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn touch_last_login(&self, user_id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        let sql = format!(
            "UPDATE {} SET last_login = $2, updated_at = now() WHERE user_id = $1",
            self.table
        );
        sqlx::query(&sql)
            .bind(user_id)
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to update last login"))?;
        Ok(())
    }
}
