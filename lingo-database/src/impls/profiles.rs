use tracing::info;
use uuid::Uuid;

use lingo_utils::access::Role;

use crate::cache::invalidate_leaderboard;
use crate::database::Database;
use crate::impls::is_unique_violation;
use crate::impls::preferences::get_preferences;
use crate::impls::progress::stages_completed;
use crate::model::profile::{Profile, ProfileRow, ProfileSummary};
use crate::realtime::{ChangeEvent, ChangeOp, Table};

const PROFILE_COLUMNS: &str = "id, username, full_name, avatar_url, role, points, streak_days, \
     last_active_on, languages_spoken, achievements, created_at";

/// Editable profile fields; `None` leaves a field unchanged.
#[derive(Clone, Debug, Default)]
pub struct ProfileUpdate<'a> {
    pub username: Option<&'a str>,
    pub full_name: Option<&'a str>,
    pub avatar_url: Option<&'a str>,
}

impl ProfileUpdate<'_> {
    /// Username and avatar are shown on leaderboard entries.
    pub fn touches_leaderboard(&self) -> bool {
        self.username.is_some() || self.avatar_url.is_some()
    }
}

async fn fetch_profile_row(db: &Database, user_id: Uuid) -> anyhow::Result<Option<ProfileRow>> {
    let row = sqlx::query_as::<_, ProfileRow>(&format!(
        "SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1"
    ))
    .bind(user_id)
    .fetch_optional(db.pool())
    .await?;

    Ok(row)
}

pub async fn get_profile(db: &Database, user_id: Uuid) -> anyhow::Result<Option<Profile>> {
    let Some(row) = fetch_profile_row(db, user_id).await? else {
        return Ok(None);
    };

    let completed = stages_completed(db, user_id).await?;
    let learning = get_preferences(db, user_id)
        .await?
        .map(|preferences| preferences.learning_pair());

    Ok(Some(row.into_profile(completed, learning)))
}

/// Fallback username for auto-provisioned profiles.
pub fn default_username(user_id: Uuid) -> String {
    let simple = user_id.simple().to_string();
    format!("learner_{}", &simple[..8])
}

/// Return the learner's profile, inserting a default one (role `user`) when
/// the account was created without it.
pub async fn ensure_profile(db: &Database, user_id: Uuid) -> anyhow::Result<Profile> {
    if let Some(profile) = get_profile(db, user_id).await? {
        return Ok(profile);
    }

    let inserted = sqlx::query(
        "INSERT INTO profiles (id, username, role) VALUES ($1, $2, 'user')
         ON CONFLICT (id) DO NOTHING",
    )
    .bind(user_id)
    .bind(default_username(user_id))
    .execute(db.pool())
    .await?
    .rows_affected();

    sqlx::query("INSERT INTO user_stats (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
        .bind(user_id)
        .execute(db.pool())
        .await?;

    if inserted > 0 {
        info!(%user_id, "auto-provisioned missing profile");
    }

    get_profile(db, user_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("profile for {user_id} missing after provisioning"))
}

/// Returns `Ok(None)` when the profile does not exist and `Ok(Some(false))`
/// when the requested username is taken.
pub async fn update_profile(
    db: &Database,
    user_id: Uuid,
    update: ProfileUpdate<'_>,
) -> anyhow::Result<Option<bool>> {
    let result = sqlx::query(
        "UPDATE profiles
         SET username = COALESCE($2, username),
             full_name = COALESCE($3, full_name),
             avatar_url = COALESCE($4, avatar_url),
             updated_at = NOW()
         WHERE id = $1",
    )
    .bind(user_id)
    .bind(update.username.map(str::trim))
    .bind(update.full_name.map(str::trim))
    .bind(update.avatar_url.map(str::trim))
    .execute(db.pool())
    .await;

    let updated = match result {
        Ok(done) => done.rows_affected(),
        Err(err) if is_unique_violation(&err) => return Ok(Some(false)),
        Err(err) => return Err(err.into()),
    };

    if updated == 0 {
        return Ok(None);
    }

    if update.touches_leaderboard() {
        if let Some(preferences) = get_preferences(db, user_id).await? {
            invalidate_leaderboard(db.cache(), &preferences.primary_learning_language).await;
        }
    }

    if let Some(row) = fetch_profile_row(db, user_id).await? {
        db.notify(ChangeEvent::new(
            Table::Profiles,
            ChangeOp::Update,
            Some(user_id),
            ProfileSummary::from(row),
        ));
    }

    Ok(Some(true))
}

pub async fn set_role(db: &Database, user_id: Uuid, role: Role) -> anyhow::Result<bool> {
    let updated =
        sqlx::query("UPDATE profiles SET role = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(role.as_str())
            .execute(db.pool())
            .await?
            .rows_affected();

    if updated > 0 {
        info!(%user_id, role = %role, "profile role changed");
        db.notify(ChangeEvent::new(
            Table::Profiles,
            ChangeOp::Update,
            Some(user_id),
            serde_json::json!({ "id": user_id, "role": role }),
        ));
    }

    Ok(updated > 0)
}

fn search_pattern(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(|term| format!("%{}%", term.replace('%', "\\%").replace('_', "\\_")))
}

/// Profiles ordered by newest first, optionally filtered by username or
/// full name.
pub async fn list_profiles(
    db: &Database,
    search: Option<&str>,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<ProfileSummary>> {
    let rows = sqlx::query_as::<_, ProfileRow>(&format!(
        "SELECT {PROFILE_COLUMNS} FROM profiles
         WHERE $1::TEXT IS NULL OR username ILIKE $1 OR full_name ILIKE $1
         ORDER BY created_at DESC, id ASC
         LIMIT $2 OFFSET $3"
    ))
    .bind(search_pattern(search))
    .bind(limit)
    .bind(offset)
    .fetch_all(db.pool())
    .await?;

    Ok(rows.into_iter().map(ProfileSummary::from).collect())
}

pub async fn count_profiles(db: &Database, search: Option<&str>) -> anyhow::Result<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM profiles
         WHERE $1::TEXT IS NULL OR username ILIKE $1 OR full_name ILIKE $1",
    )
    .bind(search_pattern(search))
    .fetch_one(db.pool())
    .await?;

    Ok(count)
}

/// Other learners studying `language`, most active first.
pub async fn community_members(
    db: &Database,
    language: &str,
    exclude: Uuid,
    limit: i64,
) -> anyhow::Result<Vec<ProfileSummary>> {
    let rows = sqlx::query_as::<_, ProfileRow>(
        "SELECT p.id, p.username, p.full_name, p.avatar_url, p.role, p.points, p.streak_days,
                p.last_active_on, p.languages_spoken, p.achievements, p.created_at
         FROM profiles p
         JOIN language_preferences lp ON lp.user_id = p.id
         WHERE $1 = ANY(lp.learning_languages) AND p.id <> $2
         ORDER BY p.last_active_on DESC NULLS LAST, p.username ASC
         LIMIT $3",
    )
    .bind(language)
    .bind(exclude)
    .bind(limit)
    .fetch_all(db.pool())
    .await?;

    Ok(rows.into_iter().map(ProfileSummary::from).collect())
}

/// Append achievement keys the learner does not hold yet.
pub async fn add_achievements(db: &Database, user_id: Uuid, keys: &[&str]) -> anyhow::Result<()> {
    if keys.is_empty() {
        return Ok(());
    }

    let keys: Vec<String> = keys.iter().map(|key| (*key).to_owned()).collect();
    sqlx::query(
        "UPDATE profiles
         SET achievements = achievements || ARRAY(
                 SELECT k FROM UNNEST($2::TEXT[]) AS k WHERE NOT (k = ANY(achievements))
             ),
             updated_at = NOW()
         WHERE id = $1",
    )
    .bind(user_id)
    .bind(&keys)
    .execute(db.pool())
    .await?;

    db.notify(ChangeEvent::new(
        Table::Profiles,
        ChangeOp::Update,
        Some(user_id),
        serde_json::json!({ "id": user_id, "unlocked_achievements": keys }),
    ));

    Ok(())
}

pub async fn set_languages_spoken(
    db: &Database,
    user_id: Uuid,
    languages: &[String],
) -> anyhow::Result<()> {
    sqlx::query("UPDATE profiles SET languages_spoken = $2, updated_at = NOW() WHERE id = $1")
        .bind(user_id)
        .bind(languages)
        .execute(db.pool())
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::{ProfileUpdate, default_username, search_pattern};

    #[test]
    fn leaderboard_fields_are_detected() {
        assert!(!ProfileUpdate::default().touches_leaderboard());
        let renamed = ProfileUpdate {
            username: Some("amina"),
            ..ProfileUpdate::default()
        };
        assert!(renamed.touches_leaderboard());
        let new_avatar = ProfileUpdate {
            avatar_url: Some("https://example.com/a.png"),
            ..ProfileUpdate::default()
        };
        assert!(new_avatar.touches_leaderboard());
        let full_name_only = ProfileUpdate {
            full_name: Some("Amina Bello"),
            ..ProfileUpdate::default()
        };
        assert!(!full_name_only.touches_leaderboard());
    }

    #[test]
    fn default_usernames_use_id_prefix() {
        let id = Uuid::parse_str("a1b2c3d4-0000-0000-0000-000000000000").unwrap();
        assert_eq!(default_username(id), "learner_a1b2c3d4");
    }

    #[test]
    fn search_patterns_escape_wildcards() {
        assert_eq!(search_pattern(None), None);
        assert_eq!(search_pattern(Some("  ")), None);
        assert_eq!(search_pattern(Some("ada")), Some("%ada%".to_owned()));
        assert_eq!(search_pattern(Some("a_b%")), Some("%a\\_b\\%%".to_owned()));
    }
}
