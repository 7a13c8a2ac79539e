use anyhow::Context as _;
use tracing::info;
use uuid::Uuid;

use crate::database::Database;
use crate::impls::is_unique_violation;
use crate::model::account::Account;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SignUpOutcome {
    Created(Uuid),
    EmailTaken,
    UsernameTaken,
}

/// Create an account and its default profile in one transaction.
pub async fn create_account(
    db: &Database,
    email: &str,
    password_hash: &str,
    username: &str,
) -> anyhow::Result<SignUpOutcome> {
    let email = email.trim().to_lowercase();
    let user_id = Uuid::new_v4();
    let mut tx = db.pool().begin().await?;

    let inserted = sqlx::query(
        "INSERT INTO accounts (id, email, password_hash)
         VALUES ($1, $2, $3)
         ON CONFLICT (email) DO NOTHING",
    )
    .bind(user_id)
    .bind(&email)
    .bind(password_hash)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if inserted == 0 {
        return Ok(SignUpOutcome::EmailTaken);
    }

    let profile = sqlx::query("INSERT INTO profiles (id, username, role) VALUES ($1, $2, 'user')")
        .bind(user_id)
        .bind(username.trim())
        .execute(&mut *tx)
        .await;

    match profile {
        Ok(_) => {}
        Err(err) if is_unique_violation(&err) => return Ok(SignUpOutcome::UsernameTaken),
        Err(err) => return Err(err).context("failed to insert profile for new account"),
    }

    sqlx::query("INSERT INTO user_stats (user_id) VALUES ($1)")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    info!(%user_id, "account created");

    Ok(SignUpOutcome::Created(user_id))
}

pub async fn find_account_by_email(db: &Database, email: &str) -> anyhow::Result<Option<Account>> {
    let account = sqlx::query_as::<_, Account>(
        "SELECT id, email, password_hash, created_at FROM accounts WHERE email = $1",
    )
    .bind(email.trim().to_lowercase())
    .fetch_optional(db.pool())
    .await?;

    Ok(account)
}

pub async fn update_password_hash(
    db: &Database,
    user_id: Uuid,
    password_hash: &str,
) -> anyhow::Result<bool> {
    let updated = sqlx::query("UPDATE accounts SET password_hash = $2 WHERE id = $1")
        .bind(user_id)
        .bind(password_hash)
        .execute(db.pool())
        .await?
        .rows_affected();

    Ok(updated > 0)
}
