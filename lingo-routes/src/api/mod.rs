pub mod achievements;
pub mod admin;
pub mod auth;
pub mod community;
pub mod leaderboard;
pub mod preferences;
pub mod profile;
pub mod quiz;
pub mod realtime;
pub mod vocabulary;

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use lingo_core::AppState;
use lingo_database::impls::preferences::get_preferences;
use lingo_database::impls::progress::append_completed_stage;
use lingo_database::model::preferences::LearningPair;
use lingo_utils::stages::{Completion, GateError, StageStatus, Track, record_completion, stage_status};

use crate::error::{ApiError, ApiResult};

/// One row of a stage listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StageListing {
    pub id: i64,
    pub level: i32,
    pub name: String,
    pub items: usize,
    pub status: StageStatus,
}

impl StageListing {
    pub fn new(id: i64, level: i32, name: &str, items: usize, completed: &BTreeSet<i32>) -> Self {
        Self {
            id,
            level,
            name: name.to_owned(),
            items,
            status: stage_status(completed, level),
        }
    }
}

/// The learner's base/target pair, or `SetupRequired` before the first
/// language selection.
pub(crate) async fn learning_pair(state: &AppState, user_id: Uuid) -> ApiResult<LearningPair> {
    get_preferences(&state.db, user_id)
        .await?
        .map(|preferences| preferences.learning_pair())
        .ok_or(ApiError::SetupRequired)
}

/// Apply the completion rule to `completed` and persist a newly appended
/// level. Returns whether the level was new.
pub(crate) async fn complete_stage(
    state: &AppState,
    user_id: Uuid,
    track: Track,
    completed: &mut BTreeSet<i32>,
    level: i32,
) -> ApiResult<bool> {
    let completion = record_completion(completed, level);
    persist_completion(state, user_id, track, level, completion).await
}

/// Store an appended completion. The insert is a no-op when another request
/// recorded the level first, so only one of them reports it as new.
pub(crate) async fn persist_completion(
    state: &AppState,
    user_id: Uuid,
    track: Track,
    level: i32,
    completion: Completion,
) -> ApiResult<bool> {
    match completion {
        Completion::Appended => {
            let inserted = append_completed_stage(&state.db, user_id, track, level).await?;
            if inserted {
                info!(%user_id, track = %track, level, "stage completed");
            }
            Ok(inserted)
        }
        Completion::AlreadyCompleted => Ok(false),
        Completion::Rejected => Err(ApiError::StageLocked(GateError::Locked {
            level,
            requires: level - 1,
        })),
    }
}
