use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt as _};
use tracing::debug;
use uuid::Uuid;

use lingo_core::AppState;
use lingo_database::{ChangeEvent, Table};
use lingo_utils::access::Role;

use crate::error::{ApiError, ApiResult};
use crate::session::AuthUser;

/// Whether `viewer` may see `event`. Rows of per-user tables are private to
/// their owner unless the viewer is an admin.
pub fn visible_to(event: &ChangeEvent, viewer: Uuid, role: Role) -> bool {
    if !event.table.is_per_user() || role == Role::Admin {
        return true;
    }
    event.user_id == Some(viewer)
}

/// Server-sent events for one table. The subscription is dropped, and so
/// unsubscribed, when the client disconnects.
pub async fn subscribe(
    State(state): State<AppState>,
    user: AuthUser,
    Path(table): Path<String>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, axum::Error>>>> {
    let table = Table::parse(&table).ok_or_else(|| ApiError::not_found("Table"))?;
    let (viewer, role) = (user.user_id, user.role);

    let subscription = state
        .db
        .feed()
        .subscribe(table, move |event| visible_to(event, viewer, role));
    debug!(user_id = %viewer, table = %table, "realtime subscriber attached");

    let events = subscription.map(|event| {
        Event::default()
            .event(event.table.as_str())
            .json_data(&event)
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use lingo_database::{ChangeEvent, ChangeOp, Table};
    use lingo_utils::access::Role;

    use super::visible_to;

    #[test]
    fn per_user_rows_stay_private() {
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();
        let event = ChangeEvent::new(Table::UserStats, ChangeOp::Update, Some(owner), ());

        assert!(visible_to(&event, owner, Role::User));
        assert!(!visible_to(&event, other, Role::User));
        assert!(visible_to(&event, other, Role::Admin));
    }

    #[test]
    fn content_rows_are_broadcast() {
        let event = ChangeEvent::new(Table::QuizStages, ChangeOp::Insert, None, ());
        assert!(visible_to(&event, Uuid::new_v4(), Role::User));
    }
}
