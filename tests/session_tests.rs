//! Session ordering, truncation, deletion, and concurrency tests.

use std::sync::Arc;

use fixrag::{FixragError, Role, SessionStore};

#[tokio::test]
async fn history_preserves_append_order_most_recent_last() {
    let store = SessionStore::new();
    let session = store.create_session().await;

    for i in 0..5 {
        store.append_turn(&session, Role::User, format!("turn {i}")).await.unwrap();
    }

    let history = store.get_history(&session, None).await.unwrap();
    assert_eq!(history.len(), 5);
    for (i, turn) in history.iter().enumerate() {
        assert_eq!(turn.text, format!("turn {i}"));
    }
    assert!(history.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
}

#[tokio::test]
async fn max_turns_truncates_oldest_first() {
    let store = SessionStore::new();
    let session = store.create_session().await;
    for i in 0..10 {
        store.append_turn(&session, Role::User, format!("turn {i}")).await.unwrap();
    }

    let history = store.get_history(&session, Some(3)).await.unwrap();
    let texts: Vec<&str> = history.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(texts, vec!["turn 7", "turn 8", "turn 9"]);

    // A window wider than the history returns everything.
    assert_eq!(store.get_history(&session, Some(100)).await.unwrap().len(), 10);
}

#[tokio::test]
async fn append_to_unknown_session_fails() {
    let store = SessionStore::new();
    let err = store.append_turn("missing", Role::User, "hello").await.unwrap_err();
    assert!(matches!(err, FixragError::SessionNotFound(_)));
}

#[tokio::test]
async fn delete_is_idempotent_and_history_then_fails() {
    let store = SessionStore::new();
    let session = store.create_session().await;
    store.append_turn(&session, Role::User, "hello").await.unwrap();

    store.delete_session(&session).await;
    store.delete_session(&session).await;

    let err = store.get_history(&session, None).await.unwrap_err();
    assert!(matches!(err, FixragError::SessionNotFound(_)));
    assert!(!store.has_session(&session).await);
}

#[tokio::test]
async fn ensure_session_registers_caller_supplied_ids_once() {
    let store = SessionStore::new();
    store.ensure_session("caller-chosen").await;
    store.append_turn("caller-chosen", Role::User, "hello").await.unwrap();

    // Re-ensuring keeps existing turns.
    store.ensure_session("caller-chosen").await;
    assert_eq!(store.get_history("caller-chosen", None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn concurrent_appends_serialize_without_loss() {
    let store = Arc::new(SessionStore::new());
    let session = store.create_session().await;

    let writer = |label: &'static str| {
        let store = Arc::clone(&store);
        let session = session.clone();
        tokio::spawn(async move {
            for i in 0..50 {
                store
                    .append_turn(&session, Role::User, format!("{label}-{i}"))
                    .await
                    .unwrap();
            }
        })
    };

    let (a, b) = tokio::join!(writer("a"), writer("b"));
    a.unwrap();
    b.unwrap();

    let history = store.get_history(&session, None).await.unwrap();
    assert_eq!(history.len(), 100);

    // Each writer's turns appear in its own order; no turn is lost.
    for label in ["a", "b"] {
        let ours: Vec<&str> = history
            .iter()
            .filter(|t| t.text.starts_with(label))
            .map(|t| t.text.as_str())
            .collect();
        let expected: Vec<String> = (0..50).map(|i| format!("{label}-{i}")).collect();
        assert_eq!(ours, expected.iter().map(String::as_str).collect::<Vec<_>>());
    }
}

#[tokio::test]
async fn concurrent_appends_on_distinct_texts_both_land() {
    let store = Arc::new(SessionStore::new());
    let session = store.create_session().await;

    let append = |text: &'static str| {
        let store = Arc::clone(&store);
        let session = session.clone();
        tokio::spawn(async move { store.append_turn(&session, Role::User, text).await })
    };

    let (a, b) = tokio::join!(append("A"), append("B"));
    a.unwrap().unwrap();
    b.unwrap().unwrap();

    let history = store.get_history(&session, None).await.unwrap();
    let mut texts: Vec<&str> = history.iter().map(|t| t.text.as_str()).collect();
    texts.sort_unstable();
    assert_eq!(texts, vec!["A", "B"]);
}

#[tokio::test]
async fn append_exchange_lands_both_turns_adjacently() {
    let store = SessionStore::new();
    let session = store.create_session().await;

    store.append_exchange(&session, "how?", "like this").await.unwrap();

    let history = store.get_history(&session, None).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, Role::User);
    assert_eq!(history[0].text, "how?");
    assert_eq!(history[1].role, Role::Assistant);
    assert_eq!(history[1].text, "like this");
}

#[tokio::test]
async fn unrelated_sessions_are_independent() {
    let store = SessionStore::new();
    let first = store.create_session().await;
    let second = store.create_session().await;
    assert_ne!(first, second);

    store.append_turn(&first, Role::User, "only here").await.unwrap();
    assert_eq!(store.get_history(&first, None).await.unwrap().len(), 1);
    assert!(store.get_history(&second, None).await.unwrap().is_empty());
    assert_eq!(store.len().await, 2);

    store.delete_session(&first).await;
    assert_eq!(store.len().await, 1);
    assert!(store.has_session(&second).await);
}

#[tokio::test]
async fn activity_timestamps_track_appends() {
    let store = SessionStore::new();
    let session = store.create_session().await;
    let created = store.created_at(&session).await.unwrap();

    store.append_turn(&session, Role::User, "hello").await.unwrap();
    let active = store.last_activity(&session).await.unwrap();
    assert!(active >= created);
}
