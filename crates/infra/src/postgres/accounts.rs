use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use tracing::instrument;

use stockroom_auth::{Role, Session, SessionStore, SessionToken, User, UserStore};
use stockroom_core::{DomainError, DomainResult, PageRequest, UserId};

use super::{PostgresStore, col, limit_offset, map_sqlx_error};

const USER_COLUMNS: &str = "id, username, email, password_hash, full_name, role, is_active, \
                            created_at, updated_at, deleted_at";

fn user_from_row(row: &PgRow) -> DomainResult<User> {
    let role: String = col(row, "role")?;
    Ok(User {
        id: UserId::from_uuid(col(row, "id")?),
        username: col(row, "username")?,
        email: col(row, "email")?,
        password_hash: col(row, "password_hash")?,
        full_name: col(row, "full_name")?,
        role: role
            .parse::<Role>()
            .map_err(|_| DomainError::internal(format!("unknown role '{role}' in users table")))?,
        is_active: col(row, "is_active")?,
        created_at: col(row, "created_at")?,
        updated_at: col(row, "updated_at")?,
        deleted_at: col(row, "deleted_at")?,
    })
}

fn session_from_row(row: &PgRow) -> DomainResult<Session> {
    Ok(Session {
        token: SessionToken::from_uuid(col(row, "token")?),
        user_id: UserId::from_uuid(col(row, "user_id")?),
        created_at: col(row, "created_at")?,
        expires_at: col(row, "expires_at")?,
        revoked_at: col(row, "revoked_at")?,
    })
}

/// Unique violations on the users table can only be the live-email index.
fn email_conflict(operation: &str, err: sqlx::Error) -> DomainError {
    match map_sqlx_error(operation, err) {
        DomainError::Conflict(_) => DomainError::conflict("email already registered"),
        other => other,
    }
}

#[async_trait]
impl UserStore for PostgresStore {
    #[instrument(skip(self, user), fields(user_id = %user.id), err)]
    async fn insert_user(&self, user: &User) -> DomainResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id, username, email, password_hash, full_name, role, is_active,
                created_at, updated_at, deleted_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(*user.id.as_uuid())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .bind(user.deleted_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| email_conflict("insert_user", e))?;
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> DomainResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND deleted_at IS NULL");
        let row = sqlx::query(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_user", e))?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        let sql =
            format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND deleted_at IS NULL");
        let row = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user_by_email", e))?;
        row.as_ref().map(user_from_row).transpose()
    }

    #[instrument(skip(self, user), fields(user_id = %user.id), err)]
    async fn update_user(&self, user: &User) -> DomainResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET username = $2, email = $3, password_hash = $4, full_name = $5,
                role = $6, is_active = $7, updated_at = $8
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(*user.id.as_uuid())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .bind(user.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| email_conflict("update_user", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("user"));
        }
        Ok(())
    }

    async fn list_users(&self, page: PageRequest) -> DomainResult<(Vec<User>, u64)> {
        let (limit, offset) = limit_offset(page);
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE deleted_at IS NULL \
             ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
        );
        let rows = sqlx::query(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_users", e))?;
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE deleted_at IS NULL")
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_users", e))?;

        let users = rows.iter().map(user_from_row).collect::<DomainResult<Vec<_>>>()?;
        Ok((users, total as u64))
    }

    async fn soft_delete_user(&self, id: UserId, at: DateTime<Utc>) -> DomainResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET deleted_at = $2, updated_at = $2, is_active = FALSE
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(*id.as_uuid())
        .bind(at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("soft_delete_user", e))?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl SessionStore for PostgresStore {
    async fn insert_session(&self, session: &Session) -> DomainResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (token, user_id, created_at, expires_at, revoked_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(*session.token.as_uuid())
        .bind(*session.user_id.as_uuid())
        .bind(session.created_at)
        .bind(session.expires_at)
        .bind(session.revoked_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_session", e))?;
        Ok(())
    }

    async fn get_session(&self, token: SessionToken) -> DomainResult<Option<Session>> {
        let row = sqlx::query(
            "SELECT token, user_id, created_at, expires_at, revoked_at FROM sessions WHERE token = $1",
        )
        .bind(*token.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_session", e))?;
        row.as_ref().map(session_from_row).transpose()
    }

    async fn revoke_session(&self, token: SessionToken, at: DateTime<Utc>) -> DomainResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE sessions SET revoked_at = $2
            WHERE token = $1 AND revoked_at IS NULL AND expires_at > $2
            "#,
        )
        .bind(*token.as_uuid())
        .bind(at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("revoke_session", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn revoke_user_sessions(&self, user_id: UserId, at: DateTime<Utc>) -> DomainResult<u64> {
        let result = sqlx::query(
            "UPDATE sessions SET revoked_at = $2 WHERE user_id = $1 AND revoked_at IS NULL",
        )
        .bind(*user_id.as_uuid())
        .bind(at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("revoke_user_sessions", e))?;
        Ok(result.rows_affected())
    }

    #[instrument(skip(self), err)]
    async fn purge_sessions(&self, now: DateTime<Utc>) -> DomainResult<u64> {
        let result =
            sqlx::query("DELETE FROM sessions WHERE revoked_at IS NOT NULL OR expires_at <= $1")
                .bind(now)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("purge_sessions", e))?;
        Ok(result.rows_affected())
    }
}
