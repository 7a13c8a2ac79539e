use axum::Json;
use axum::extract::State;
use serde::Serialize;
use serde_json::{Value, json};

use lingo_core::AppState;
use lingo_database::impls::profiles::get_profile;
use lingo_utils::achievements::{Achievement, CATALOG};

use crate::error::{ApiError, ApiResult};
use crate::session::AuthUser;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AchievementStatus {
    #[serde(flatten)]
    pub achievement: Achievement,
    pub unlocked: bool,
}

pub fn achievement_statuses(unlocked: &[String]) -> Vec<AchievementStatus> {
    CATALOG
        .iter()
        .map(|achievement| AchievementStatus {
            achievement: *achievement,
            unlocked: unlocked.iter().any(|key| key == achievement.key),
        })
        .collect()
}

pub async fn list_achievements(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Value>> {
    let profile = get_profile(&state.db, user.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Profile"))?;
    let statuses = achievement_statuses(&profile.achievements);
    let unlocked = statuses.iter().filter(|status| status.unlocked).count();

    Ok(Json(json!({
        "achievements": statuses,
        "unlocked": unlocked,
        "total": CATALOG.len(),
    })))
}

#[cfg(test)]
mod tests {
    use lingo_utils::achievements::CATALOG;

    use super::achievement_statuses;

    #[test]
    fn statuses_follow_catalog_order() {
        let statuses = achievement_statuses(&["centurion".to_owned(), "retired_key".to_owned()]);
        assert_eq!(statuses.len(), CATALOG.len());
        assert_eq!(statuses[0].achievement.key, CATALOG[0].key);
        assert_eq!(statuses.iter().filter(|status| status.unlocked).count(), 1);

        let json = serde_json::to_value(&statuses[0]).unwrap();
        assert_eq!(json["key"], CATALOG[0].key);
        assert_eq!(json["unlocked"], false);
    }
}
