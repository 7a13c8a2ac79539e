use std::time::Duration;

use anyhow::Context as _;
use chrono::Utc;
use uuid::Uuid;

use crate::database::Database;
use crate::model::account::SessionRecord;

/// How long a password reset token stays usable.
pub const PASSWORD_RESET_TTL: Duration = Duration::from_secs(60 * 60);

fn expiry_from_now(ttl: Duration) -> anyhow::Result<chrono::DateTime<Utc>> {
    let ttl = chrono::Duration::from_std(ttl).context("ttl out of range")?;
    Utc::now()
        .checked_add_signed(ttl)
        .context("expiry timestamp out of range")
}

pub async fn create_session(
    db: &Database,
    user_id: Uuid,
    ttl: Duration,
) -> anyhow::Result<SessionRecord> {
    let expires_at = expiry_from_now(ttl)?;

    let session = sqlx::query_as::<_, SessionRecord>(
        "INSERT INTO sessions (id, user_id, expires_at)
         VALUES ($1, $2, $3)
         RETURNING id, user_id, created_at, expires_at",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(expires_at)
    .fetch_one(db.pool())
    .await?;

    Ok(session)
}

/// A session that is neither revoked nor expired.
pub async fn find_active_session(
    db: &Database,
    session_id: Uuid,
) -> anyhow::Result<Option<SessionRecord>> {
    let session = sqlx::query_as::<_, SessionRecord>(
        "SELECT id, user_id, created_at, expires_at
         FROM sessions
         WHERE id = $1 AND revoked_at IS NULL AND expires_at > NOW()",
    )
    .bind(session_id)
    .fetch_optional(db.pool())
    .await?;

    Ok(session)
}

pub async fn revoke_session(db: &Database, session_id: Uuid) -> anyhow::Result<bool> {
    let revoked = sqlx::query(
        "UPDATE sessions SET revoked_at = NOW() WHERE id = $1 AND revoked_at IS NULL",
    )
    .bind(session_id)
    .execute(db.pool())
    .await?
    .rows_affected();

    Ok(revoked > 0)
}

pub async fn revoke_all_sessions(db: &Database, user_id: Uuid) -> anyhow::Result<u64> {
    let revoked = sqlx::query(
        "UPDATE sessions SET revoked_at = NOW() WHERE user_id = $1 AND revoked_at IS NULL",
    )
    .bind(user_id)
    .execute(db.pool())
    .await?
    .rows_affected();

    Ok(revoked)
}

pub async fn create_password_reset(db: &Database, user_id: Uuid) -> anyhow::Result<Uuid> {
    let token = Uuid::new_v4();
    let expires_at = expiry_from_now(PASSWORD_RESET_TTL)?;

    sqlx::query("INSERT INTO password_resets (token, user_id, expires_at) VALUES ($1, $2, $3)")
        .bind(token)
        .bind(user_id)
        .bind(expires_at)
        .execute(db.pool())
        .await?;

    Ok(token)
}

/// Mark a reset token used and return its account, if it was still valid.
pub async fn consume_password_reset(db: &Database, token: Uuid) -> anyhow::Result<Option<Uuid>> {
    let user_id: Option<Uuid> = sqlx::query_scalar(
        "UPDATE password_resets
         SET used_at = NOW()
         WHERE token = $1 AND used_at IS NULL AND expires_at > NOW()
         RETURNING user_id",
    )
    .bind(token)
    .fetch_optional(db.pool())
    .await?;

    Ok(user_id)
}
