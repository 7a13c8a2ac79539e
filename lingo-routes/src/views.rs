use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::{Value, json};

use lingo_database::model::leaderboard::LeaderboardEntry;
use lingo_utils::formatting::rank_label;

pub const EMPTY_LEADERBOARD_MESSAGE: &str = "No learners on this leaderboard yet.";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A message shown above the page content. Blocking notifications replace
/// the page's interactive content until dismissed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub blocking: bool,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
            blocking: false,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
            blocking: false,
        }
    }

    pub fn blocking(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            blocking: true,
        }
    }
}

/// Page payload rendered by the client.
#[derive(Clone, Debug, Serialize)]
pub struct View {
    pub page: &'static str,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub notifications: Vec<Notification>,
    pub data: Value,
}

impl View {
    pub fn new(page: &'static str, title: impl Into<String>) -> Self {
        Self {
            page,
            title: title.into(),
            description: None,
            notifications: Vec::new(),
            data: Value::Null,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn notify(mut self, notification: Notification) -> Self {
        self.notifications.push(notification);
        self
    }

    pub fn data(mut self, data: impl Serialize) -> Self {
        self.data = serde_json::to_value(data).unwrap_or(Value::Null);
        self
    }

    pub fn with_status(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

impl IntoResponse for View {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

pub fn access_denied_view() -> View {
    View::new("access_denied", "Access denied")
        .description("You do not have permission to view this page.")
        .notify(Notification::blocking(
            NotificationLevel::Error,
            "This area is restricted to administrators.",
        ))
}

pub fn loading_view(page: &'static str) -> View {
    View::new(page, "Loading").data(json!({ "loading": true }))
}

pub fn not_found_view(path: &str) -> View {
    View::new("not_found", "Page not found")
        .description(format!("Nothing lives at `{path}`."))
        .data(json!({ "path": path, "home": "/" }))
}

/// Learner has no language preferences yet; the client shows the picker.
pub fn setup_required_view(page: &'static str, title: &str) -> View {
    View::new(page, title)
        .notify(Notification::info(
            "Choose the languages you speak and want to learn to get started.",
        ))
        .data(json!({ "needs_setup": true }))
}

pub fn leaderboard_view(language: &str, entries: &[LeaderboardEntry]) -> View {
    let view = View::new("leaderboard", format!("{language} leaderboard"))
        .description("Top learners ranked by points.");

    if entries.is_empty() {
        return view
            .notify(Notification::info(EMPTY_LEADERBOARD_MESSAGE))
            .data(json!({ "language": language, "entries": [], "empty": true }));
    }

    let rows: Vec<Value> = entries
        .iter()
        .map(|entry| {
            json!({
                "rank": entry.rank,
                "rank_label": rank_label(entry.rank),
                "user_id": entry.user_id,
                "username": entry.username,
                "avatar_url": entry.avatar_url,
                "points": entry.points,
                "level": entry.level,
                "streak_days": entry.streak_days,
            })
        })
        .collect();

    view.data(json!({ "language": language, "entries": rows, "empty": false }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use uuid::Uuid;

    use lingo_database::model::leaderboard::LeaderboardEntry;

    use super::{
        EMPTY_LEADERBOARD_MESSAGE, NotificationLevel, View, access_denied_view, leaderboard_view,
        not_found_view,
    };

    fn entry(rank: usize, username: &str, points: i64) -> LeaderboardEntry {
        LeaderboardEntry {
            rank,
            user_id: Uuid::new_v4(),
            username: username.to_owned(),
            avatar_url: None,
            points,
            level: points / 100 + 1,
            learning_language: "Hausa".to_owned(),
            streak_days: 0,
        }
    }

    #[test]
    fn empty_leaderboard_renders_message_instead_of_rows() {
        let view = leaderboard_view("Hausa", &[]);
        assert_eq!(view.notifications.len(), 1);
        assert_eq!(view.notifications[0].message, EMPTY_LEADERBOARD_MESSAGE);
        assert_eq!(view.data["empty"], true);
        assert_eq!(view.data["entries"].as_array().map(Vec::len), Some(0));
    }

    #[test]
    fn leaderboard_rows_keep_rank_order() {
        let view = leaderboard_view("Hausa", &[entry(1, "ada", 250), entry(2, "bola", 90)]);
        assert!(view.notifications.is_empty());
        assert_eq!(view.data["entries"][0]["username"], "ada");
        assert_eq!(view.data["entries"][0]["level"], 3);
        assert_eq!(view.data["entries"][1]["rank"], 2);
    }

    #[test]
    fn access_denied_blocks_content() {
        let view = access_denied_view();
        assert_eq!(view.page, "access_denied");
        assert!(view.notifications[0].blocking);
        assert_eq!(view.notifications[0].level, NotificationLevel::Error);
    }

    #[test]
    fn views_serialize_without_empty_description() {
        let json = serde_json::to_value(View::new("dashboard", "Dashboard")).unwrap();
        assert!(json.get("description").is_none());
        assert_eq!(json["page"], "dashboard");

        let response = not_found_view("/nope").with_status(StatusCode::NOT_FOUND);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
