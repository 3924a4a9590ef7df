//! Postgres-backed credential store.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Duplicate` |
//! | Database (other) | Any other | `Backend` |
//! | PoolTimedOut / PoolClosed / Io | N/A | `Unavailable` |
//! | Other | N/A | `Backend` |
//!
//! Email uniqueness is enforced on `lower(email)`; emails are also stored
//! lowercased, so both paths agree.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use bizops_auth::{
    AccessUpdate, CoreRole, HashedSecret, MembershipTier, NewServiceUser, NewUser, PageAccess,
    ServiceRole, ServiceUserRecord, StaffAccess, UserRecord, normalize_employee_id,
};
use bizops_core::{ServiceUserId, UserId};

use super::{CredentialStore, StoreError};

const SCHEMA: [&str; 4] = [
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id            UUID PRIMARY KEY,
        username      TEXT NOT NULL UNIQUE,
        email         TEXT NOT NULL,
        password_hash TEXT NOT NULL,
        role          TEXT NOT NULL DEFAULT 'pending',
        membership    TEXT NOT NULL DEFAULT 'none',
        page_access   JSONB NOT NULL DEFAULT '[]'::jsonb,
        created_at    TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS users_email_lower_idx ON users (lower(email))",
    r#"
    CREATE TABLE IF NOT EXISTS service_users (
        id            UUID PRIMARY KEY,
        employee_id   TEXT NOT NULL UNIQUE,
        email         TEXT NOT NULL,
        password_hash TEXT NOT NULL,
        role          TEXT NOT NULL DEFAULT 'service-standard',
        department    TEXT NOT NULL,
        display_name  TEXT NOT NULL,
        scope         JSONB NOT NULL DEFAULT '[]'::jsonb,
        created_at    TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS service_users_email_lower_idx ON service_users (lower(email))",
];

const USER_COLUMNS: &str = "id, username, email, password_hash, role, membership, page_access, created_at";
const SERVICE_USER_COLUMNS: &str =
    "id, employee_id, email, password_hash, role, department, display_name, scope, created_at";

/// Postgres-backed credential store.
///
/// Uses the SQLx connection pool, which is `Send + Sync`; each call is a single
/// statement, so there is no cross-request locking.
pub struct PostgresCredentialStore {
    pool: Arc<PgPool>,
}

impl PostgresCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }

    /// Create tables and indexes if they do not exist.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        }
        Ok(())
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Duplicate(
                    db_err.constraint().unwrap_or("unique identity").to_string(),
                ),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(format!("{operation}: {err}"))
        }
        other => StoreError::Backend(format!("{operation}: {other}")),
    }
}

fn decode_error(column: &str, err: impl core::fmt::Display) -> StoreError {
    StoreError::Backend(format!("failed to decode column '{column}': {err}"))
}

fn user_from_row(row: &PgRow) -> Result<UserRecord, StoreError> {
    let id: Uuid = row.try_get("id").map_err(|e| decode_error("id", e))?;
    let role: String = row.try_get("role").map_err(|e| decode_error("role", e))?;
    let membership: String = row.try_get("membership").map_err(|e| decode_error("membership", e))?;
    let page_access: Json<PageAccess> =
        row.try_get("page_access").map_err(|e| decode_error("page_access", e))?;
    let password_hash: String = row.try_get("password_hash").map_err(|e| decode_error("password_hash", e))?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(|e| decode_error("created_at", e))?;

    Ok(UserRecord {
        id: UserId::from_uuid(id),
        username: row.try_get("username").map_err(|e| decode_error("username", e))?,
        email: row.try_get("email").map_err(|e| decode_error("email", e))?,
        password_hash: HashedSecret::from_phc(password_hash),
        role: role.parse::<CoreRole>().map_err(|e| decode_error("role", e))?,
        membership: membership.parse::<MembershipTier>().map_err(|e| decode_error("membership", e))?,
        page_access: page_access.0,
        created_at,
    })
}

fn service_user_from_row(row: &PgRow) -> Result<ServiceUserRecord, StoreError> {
    let id: Uuid = row.try_get("id").map_err(|e| decode_error("id", e))?;
    let employee_id: String = row.try_get("employee_id").map_err(|e| decode_error("employee_id", e))?;
    let role: String = row.try_get("role").map_err(|e| decode_error("role", e))?;
    let department: String = row.try_get("department").map_err(|e| decode_error("department", e))?;
    let scope: Json<PageAccess> = row.try_get("scope").map_err(|e| decode_error("scope", e))?;
    let password_hash: String = row.try_get("password_hash").map_err(|e| decode_error("password_hash", e))?;

    Ok(ServiceUserRecord {
        id: ServiceUserId::from_uuid(id),
        email: row.try_get("email").map_err(|e| decode_error("email", e))?,
        password_hash: HashedSecret::from_phc(password_hash),
        role: role.parse::<ServiceRole>().map_err(|e| decode_error("role", e))?,
        staff: StaffAccess {
            display_name: row.try_get("display_name").map_err(|e| decode_error("display_name", e))?,
            employee_id: employee_id.clone(),
            department: department.clone(),
            scope: scope.0,
        },
        employee_id,
        department,
        created_at: row.try_get("created_at").map_err(|e| decode_error("created_at", e))?,
    })
}

#[async_trait::async_trait]
impl CredentialStore for PostgresCredentialStore {
    #[instrument(skip_all, fields(username = %user.username))]
    async fn create_user(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        let record = user.into_record(UserId::new());
        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, role, membership, page_access, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(&record.username)
        .bind(record.email.to_lowercase())
        .bind(record.password_hash.as_str())
        .bind(record.role.as_str())
        .bind(record.membership.as_str())
        .bind(Json(&record.page_access))
        .bind(record.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_user", e))?;

        Ok(record)
    }

    async fn find_user_by_login(&self, identifier: &str) -> Result<Option<UserRecord>, StoreError> {
        let identifier = identifier.trim();
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1 OR lower(email) = lower($1) LIMIT 1"
        ))
        .bind(identifier)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_user_by_login", e))?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user_by_id", e))?;

        row.as_ref().map(user_from_row).transpose()
    }

    #[instrument(skip_all, fields(user_id = %id))]
    async fn update_user_access(&self, id: UserId, update: AccessUpdate) -> Result<UserRecord, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE users
            SET role = COALESCE($2, role),
                membership = COALESCE($3, membership),
                page_access = COALESCE($4, page_access)
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(update.role.map(|r| r.as_str()))
        .bind(update.membership.map(|m| m.as_str()))
        .bind(update.page_access.as_ref().map(Json))
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_user_access", e))?;

        match row {
            Some(row) => user_from_row(&row),
            None => Err(StoreError::NotFound),
        }
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, StoreError> {
        let rows = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at, id"))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_users", e))?;

        rows.iter().map(user_from_row).collect()
    }

    #[instrument(skip_all, fields(employee_id = %user.employee_id))]
    async fn create_service_user(&self, user: NewServiceUser) -> Result<ServiceUserRecord, StoreError> {
        let record = user.into_record(ServiceUserId::new());
        sqlx::query(
            r#"
            INSERT INTO service_users
                (id, employee_id, email, password_hash, role, department, display_name, scope, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(&record.employee_id)
        .bind(&record.email)
        .bind(record.password_hash.as_str())
        .bind(record.role.as_str())
        .bind(&record.department)
        .bind(&record.staff.display_name)
        .bind(Json(&record.staff.scope))
        .bind(record.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_service_user", e))?;

        Ok(record)
    }

    async fn find_service_user_by_employee_id(
        &self,
        employee_id: &str,
    ) -> Result<Option<ServiceUserRecord>, StoreError> {
        let Ok(employee_id) = normalize_employee_id(employee_id) else {
            return Ok(None);
        };
        let row = sqlx::query(&format!(
            "SELECT {SERVICE_USER_COLUMNS} FROM service_users WHERE employee_id = $1"
        ))
        .bind(employee_id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_service_user_by_employee_id", e))?;

        row.as_ref().map(service_user_from_row).transpose()
    }

    async fn find_service_user_by_id(&self, id: ServiceUserId) -> Result<Option<ServiceUserRecord>, StoreError> {
        let row = sqlx::query(&format!("SELECT {SERVICE_USER_COLUMNS} FROM service_users WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_service_user_by_id", e))?;

        row.as_ref().map(service_user_from_row).transpose()
    }
}
