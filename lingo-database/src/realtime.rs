use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio_stream::StreamExt as _;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing::warn;
use uuid::Uuid;

/// Buffered events per subscriber before it starts lagging.
pub const FEED_CAPACITY: usize = 256;

/// Tables that publish row changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Profiles,
    UserStats,
    LanguagePreferences,
    VocabularyStages,
    QuizStages,
}

impl Table {
    pub fn as_str(self) -> &'static str {
        match self {
            Table::Profiles => "profiles",
            Table::UserStats => "user_stats",
            Table::LanguagePreferences => "language_preferences",
            Table::VocabularyStages => "vocabulary_stages",
            Table::QuizStages => "quiz_stages",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "profiles" => Some(Table::Profiles),
            "user_stats" => Some(Table::UserStats),
            "language_preferences" => Some(Table::LanguagePreferences),
            "vocabulary_stages" => Some(Table::VocabularyStages),
            "quiz_stages" => Some(Table::QuizStages),
            _ => None,
        }
    }

    /// Rows of these tables belong to a single learner.
    pub fn is_per_user(self) -> bool {
        matches!(
            self,
            Table::Profiles | Table::UserStats | Table::LanguagePreferences
        )
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOp {
    Insert,
    Update,
    Delete,
}

#[derive(Clone, Debug, Serialize)]
pub struct ChangeEvent {
    pub table: Table,
    pub op: ChangeOp,
    /// Owner of the row for per-user tables.
    pub user_id: Option<Uuid>,
    pub row: serde_json::Value,
}

impl ChangeEvent {
    pub fn new(table: Table, op: ChangeOp, user_id: Option<Uuid>, row: impl Serialize) -> Self {
        let row = serde_json::to_value(row).unwrap_or(serde_json::Value::Null);
        Self {
            table,
            op,
            user_id,
            row,
        }
    }
}

/// In-process fan-out of committed row changes.
#[derive(Clone, Debug)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::with_capacity(FEED_CAPACITY)
    }
}

impl ChangeFeed {
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Send an event to current subscribers. Having none is not an error.
    pub fn publish(&self, event: ChangeEvent) {
        let _ = self.tx.send(event);
    }

    /// Subscribe to one table, keeping only events accepted by `predicate`.
    ///
    /// The subscription ends when the returned value is dropped.
    pub fn subscribe<P>(&self, table: Table, predicate: P) -> Subscription
    where
        P: Fn(&ChangeEvent) -> bool + Send + Sync + 'static,
    {
        let stream = BroadcastStream::new(self.tx.subscribe()).filter_map(move |item| match item {
            Ok(event) if event.table == table && predicate(&event) => Some(event),
            Ok(_) => None,
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                warn!(table = %table, skipped, "realtime subscriber lagged; events dropped");
                None
            }
        });

        Subscription {
            table,
            inner: Box::pin(stream),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// A filtered stream of change events for one table.
pub struct Subscription {
    table: Table,
    inner: Pin<Box<dyn Stream<Item = ChangeEvent> + Send>>,
}

impl Subscription {
    pub fn table(&self) -> Table {
        self.table
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

impl Stream for Subscription {
    type Item = ChangeEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;
    use serde_json::json;
    use uuid::Uuid;

    use super::{ChangeEvent, ChangeFeed, ChangeOp, Table};

    #[tokio::test]
    async fn delivers_matching_events_only() {
        let feed = ChangeFeed::default();
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();
        let mut sub = feed.subscribe(Table::Profiles, move |event| event.user_id == Some(me));

        feed.publish(ChangeEvent::new(
            Table::Profiles,
            ChangeOp::Update,
            Some(other),
            json!({"points": 1}),
        ));
        feed.publish(ChangeEvent::new(
            Table::UserStats,
            ChangeOp::Update,
            Some(me),
            json!({"words_learned": 1}),
        ));
        feed.publish(ChangeEvent::new(
            Table::Profiles,
            ChangeOp::Update,
            Some(me),
            json!({"points": 15}),
        ));

        let event = sub.next().await.expect("event");
        assert_eq!(event.table, Table::Profiles);
        assert_eq!(event.user_id, Some(me));
        assert_eq!(event.row["points"], 15);
    }

    #[tokio::test]
    async fn dropping_subscription_unsubscribes() {
        let feed = ChangeFeed::default();
        assert_eq!(feed.subscriber_count(), 0);
        let sub = feed.subscribe(Table::QuizStages, |_| true);
        assert_eq!(feed.subscriber_count(), 1);
        assert_eq!(sub.table(), Table::QuizStages);
        drop(sub);
        assert_eq!(feed.subscriber_count(), 0);
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        let feed = ChangeFeed::with_capacity(4);
        feed.publish(ChangeEvent::new(
            Table::VocabularyStages,
            ChangeOp::Delete,
            None,
            json!({"id": 3}),
        ));
    }

    #[test]
    fn table_names_round_trip() {
        for table in [
            Table::Profiles,
            Table::UserStats,
            Table::LanguagePreferences,
            Table::VocabularyStages,
            Table::QuizStages,
        ] {
            assert_eq!(Table::parse(table.as_str()), Some(table));
        }
        assert!(Table::Profiles.is_per_user());
        assert!(!Table::QuizStages.is_per_user());
        assert_eq!(Table::parse("accounts"), None);
    }
}
