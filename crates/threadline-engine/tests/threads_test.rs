mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::{
    alice, engine_with, signed_in_engine, wait_for_deselection, wait_until, FaultyStore,
    ScriptedClient,
};
use threadline_engine::{EngineError, Principal, SendOutcome};
use threadline_persist::{
    InMemoryStore, MessageStore, NewMessage, StoreClient, ThreadId, ThreadRegistry,
};

#[tokio::test]
async fn test_thread_list_is_newest_first_and_owner_scoped() {
    let client = ScriptedClient::replying("ok", "Title");
    let (engine, store) = signed_in_engine(client).await;

    let older = store.create("alice").await.unwrap();
    store.create("bob").await.unwrap();
    let newer = store.create("alice").await.unwrap();

    let mut view = engine.threads();
    let threads = wait_until(&mut view, |t| t.len() == 2).await;
    let ids: Vec<_> = threads.into_iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![newer, older]);
}

#[tokio::test]
async fn test_switching_threads_drops_old_listener() {
    let client = ScriptedClient::replying("ok", "Title");
    let (engine, store) = signed_in_engine(client).await;
    let first = store.create("alice").await.unwrap();
    let second = store.create("alice").await.unwrap();
    store.append(&first, NewMessage::user("in first", None)).await.unwrap();

    engine.select_thread(first.clone()).await.unwrap();
    let mut view = engine.messages();
    wait_until(&mut view, |m| m.len() == 1).await;

    engine.select_thread(second.clone()).await.unwrap();
    assert!(engine.current_messages().is_empty());

    store.append(&first, NewMessage::user("late for first", None)).await.unwrap();
    store.append(&second, NewMessage::user("in second", None)).await.unwrap();

    let shown = wait_until(&mut view, |m| !m.is_empty()).await;
    assert!(shown.iter().all(|m| m.thread_id == second));
    tokio::task::yield_now().await;
    assert!(engine.current_messages().iter().all(|m| m.thread_id == second));
}

#[tokio::test]
async fn test_reselecting_same_thread_keeps_listener() {
    let store = FaultyStore::new();
    let engine = engine_with(store.client(), ScriptedClient::replying("ok", "Title"));
    engine.set_principal(Some(alice())).await.unwrap();
    let thread_id = store.inner.create("alice").await.unwrap();

    engine.select_thread(thread_id.clone()).await.unwrap();
    engine.select_thread(thread_id.clone()).await.unwrap();

    assert_eq!(store.message_subscriptions.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_new_thread_clears_selection() {
    let client = ScriptedClient::replying("ok", "Title");
    let (engine, _store) = signed_in_engine(client).await;
    let first = engine.send_message("hello").await.unwrap();
    assert!(first.thread_id().is_some());

    engine.new_thread().await;
    assert!(engine.selected_thread().await.is_none());
    assert!(engine.current_messages().is_empty());

    let second = engine.send_message("again").await.unwrap();
    assert_ne!(first.thread_id(), second.thread_id());
}

#[tokio::test]
async fn test_delete_thread_removes_everything() {
    let client = ScriptedClient::replying("ok", "Title");
    let (engine, store) = signed_in_engine(client).await;
    let outcome = engine.send_message("first").await.unwrap();
    let thread_id = outcome.thread_id().cloned().unwrap();
    engine.send_message("second").await.unwrap();
    assert_eq!(MessageStore::list(&store, &thread_id).await.unwrap().len(), 4);

    let mut threads = engine.threads();
    wait_until(&mut threads, |t| t.len() == 1).await;

    engine.delete_thread(&thread_id).await.unwrap();

    assert!(MessageStore::list(&store, &thread_id).await.unwrap().is_empty());
    assert!(ThreadRegistry::list(&store, "alice").await.unwrap().is_empty());
    assert!(engine.selected_thread().await.is_none());
    assert!(engine.current_messages().is_empty());
    wait_until(&mut threads, |t| t.is_empty()).await;
}

#[tokio::test]
async fn test_deleting_other_thread_keeps_selection() {
    let client = ScriptedClient::replying("ok", "Title");
    let (engine, store) = signed_in_engine(client).await;
    let other = store.create("alice").await.unwrap();
    let outcome = engine.send_message("stay here").await.unwrap();
    let selected = outcome.thread_id().cloned().unwrap();

    engine.delete_thread(&other).await.unwrap();

    assert_eq!(engine.selected_thread().await, Some(selected));
}

#[tokio::test]
async fn test_partial_deletion_keeps_thread_record() {
    let store = FaultyStore::new();
    let engine = engine_with(store.client(), ScriptedClient::replying("ok", "Title"));
    engine.set_principal(Some(alice())).await.unwrap();
    let outcome = engine.send_message("keep me").await.unwrap();
    let thread_id = outcome.thread_id().cloned().unwrap();

    FaultyStore::fail(&store.fail_message_delete);
    let err = engine.delete_thread(&thread_id).await.unwrap_err();

    assert!(matches!(err, EngineError::DeletionIncomplete { thread_id: ref id, .. } if *id == thread_id));
    assert!(store.inner.get(&thread_id).await.unwrap().is_some());
    assert_eq!(engine.selected_thread().await, Some(thread_id));
}

#[tokio::test]
async fn test_principal_change_resets_views() {
    let client = ScriptedClient::replying("ok", "Title");
    let (engine, store) = signed_in_engine(client).await;
    engine.send_message("alice's question").await.unwrap();
    store.create("bob").await.unwrap();

    let mut threads = engine.threads();
    wait_until(&mut threads, |t| t.len() == 1 && t[0].owner_id == "alice").await;

    engine
        .set_principal(Some(Principal::new("bob").with_display_name("Bob")))
        .await
        .unwrap();

    assert!(engine.selected_thread().await.is_none());
    assert!(engine.current_messages().is_empty());
    let shown = wait_until(&mut threads, |t| !t.is_empty()).await;
    assert!(shown.iter().all(|t| t.owner_id == "bob"));
    assert_eq!(engine.principal().await.and_then(|p| p.initial()), Some('B'));
}

#[tokio::test]
async fn test_sign_out_drops_thread_list() {
    let client = ScriptedClient::replying("ok", "Title");
    let (engine, _store) = signed_in_engine(client).await;
    engine.send_message("hello").await.unwrap();

    engine.set_principal(None).await.unwrap();

    assert!(engine.current_threads().is_empty());
    assert!(engine.principal().await.is_none());
    assert!(matches!(
        engine.send_message("again").await,
        Err(EngineError::Unauthenticated)
    ));
}

#[tokio::test]
async fn test_shutdown_cancels_listeners() {
    let client = ScriptedClient::replying("ok", "Title");
    let (engine, store) = signed_in_engine(client).await;
    let outcome = engine.send_message("hello").await.unwrap();
    let thread_id = outcome.thread_id().cloned().unwrap();

    engine.shutdown().await;
    store.append(&thread_id, NewMessage::assistant("after shutdown")).await.unwrap();
    store.create("alice").await.unwrap();
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }

    assert!(engine.current_messages().is_empty());
    assert!(engine.current_threads().is_empty());
}

#[tokio::test]
async fn test_engines_do_not_share_state() {
    let store = StoreClient::in_memory();
    let a = engine_with(store.clone(), ScriptedClient::replying("a", "A"));
    let b = engine_with(store, ScriptedClient::replying("b", "B"));
    a.set_principal(Some(alice())).await.unwrap();
    b.set_principal(Some(alice())).await.unwrap();

    let outcome = a.send_message("from a").await.unwrap();

    assert!(outcome.thread_id().is_some());
    assert!(b.selected_thread().await.is_none());
    let mut threads = b.threads();
    wait_until(&mut threads, |t| t.len() == 1).await;
}

#[tokio::test]
async fn test_select_rejects_missing_thread() {
    let client = ScriptedClient::replying("ok", "Title");
    let (engine, store) = signed_in_engine(client).await;
    let bogus = ThreadId::new("does-not-exist");

    let err = engine.select_thread(bogus.clone()).await.unwrap_err();
    assert!(matches!(err, EngineError::ThreadNotFound(ref id) if *id == bogus));
    assert!(engine.selected_thread().await.is_none());

    let outcome = engine.send_message("hi").await.unwrap();
    assert_ne!(outcome.thread_id(), Some(&bogus));
    assert!(MessageStore::list(&store, &bogus).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_select_rejects_foreign_thread() {
    let client = ScriptedClient::replying("ok", "Title");
    let (engine, store) = signed_in_engine(client).await;
    let own = store.create("alice").await.unwrap();
    let foreign = store.create("bob").await.unwrap();
    engine.select_thread(own.clone()).await.unwrap();

    let err = engine.select_thread(foreign.clone()).await.unwrap_err();

    assert!(matches!(err, EngineError::NotOwner { ref thread_id, .. } if *thread_id == foreign));
    assert_eq!(engine.selected_thread().await, Some(own));
}

#[tokio::test]
async fn test_select_requires_principal() {
    let store = InMemoryStore::new();
    let thread_id = store.create("alice").await.unwrap();
    let engine = engine_with(
        StoreClient::new(Arc::new(store.clone()), Arc::new(store), "memory"),
        ScriptedClient::replying("ok", "Title"),
    );

    let err = engine.select_thread(thread_id).await.unwrap_err();
    assert!(matches!(err, EngineError::Unauthenticated));
}

#[tokio::test]
async fn test_failed_subscribe_keeps_previous_selection() {
    let store = FaultyStore::new();
    let engine = engine_with(store.client(), ScriptedClient::replying("ok", "Title"));
    engine.set_principal(Some(alice())).await.unwrap();
    let first = store.inner.create("alice").await.unwrap();
    let second = store.inner.create("alice").await.unwrap();
    store.inner.append(&first, NewMessage::user("still here", None)).await.unwrap();

    engine.select_thread(first.clone()).await.unwrap();
    let mut view = engine.messages();
    wait_until(&mut view, |m| m.len() == 1).await;

    FaultyStore::fail(&store.fail_message_subscribe);
    let err = engine.select_thread(second).await.unwrap_err();

    assert!(matches!(err, EngineError::Store(_)));
    assert_eq!(engine.selected_thread().await, Some(first.clone()));
    let shown = engine.current_messages();
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].thread_id, first);
}

#[tokio::test]
async fn test_send_after_remote_delete_starts_new_thread() {
    let store = StoreClient::in_memory();
    let a = engine_with(store.clone(), ScriptedClient::replying("a", "A"));
    let b = engine_with(store.clone(), ScriptedClient::replying("b", "B"));
    a.set_principal(Some(alice())).await.unwrap();
    b.set_principal(Some(alice())).await.unwrap();

    let first = a.send_message("first").await.unwrap();
    let old = first.thread_id().cloned().unwrap();
    b.delete_thread(&old).await.unwrap();

    let second = a.send_message("second").await.unwrap();

    let SendOutcome::Completed { thread_id, created_thread } = second else {
        panic!("unexpected outcome: {:?}", second);
    };
    assert!(created_thread);
    assert_ne!(thread_id, old);
    assert!(store.messages().list(&old).await.unwrap().is_empty());
    assert_eq!(store.messages().list(&thread_id).await.unwrap().len(), 2);
    assert_eq!(a.selected_thread().await, Some(thread_id));
}

#[tokio::test]
async fn test_selection_cleared_when_thread_removed_elsewhere() {
    let store = StoreClient::in_memory();
    let a = engine_with(store.clone(), ScriptedClient::replying("a", "A"));
    let b = engine_with(store, ScriptedClient::replying("b", "B"));
    a.set_principal(Some(alice())).await.unwrap();
    b.set_principal(Some(alice())).await.unwrap();

    let outcome = a.send_message("hello").await.unwrap();
    let thread_id = outcome.thread_id().cloned().unwrap();
    let mut threads = a.threads();
    wait_until(&mut threads, |t| t.iter().any(|t| t.id == thread_id)).await;

    b.delete_thread(&thread_id).await.unwrap();

    wait_for_deselection(&a).await;
    assert!(a.current_messages().is_empty());
}

#[tokio::test]
async fn test_delete_requires_principal() {
    let store = InMemoryStore::new();
    let thread_id = store.create("mallory").await.unwrap();
    let engine = engine_with(
        StoreClient::new(Arc::new(store.clone()), Arc::new(store.clone()), "memory"),
        ScriptedClient::replying("ok", "Title"),
    );

    let err = engine.delete_thread(&thread_id).await.unwrap_err();

    assert!(matches!(err, EngineError::Unauthenticated));
    assert!(store.get(&thread_id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_delete_refuses_foreign_thread() {
    let client = ScriptedClient::replying("ok", "Title");
    let (engine, store) = signed_in_engine(client).await;
    let foreign = store.create("mallory").await.unwrap();
    store.append(&foreign, NewMessage::user("mine", None)).await.unwrap();

    let err = engine.delete_thread(&foreign).await.unwrap_err();

    assert!(matches!(err, EngineError::NotOwner { .. }));
    assert!(store.get(&foreign).await.unwrap().is_some());
    assert_eq!(MessageStore::list(&store, &foreign).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_delete_missing_thread_is_not_found() {
    let client = ScriptedClient::replying("ok", "Title");
    let (engine, _store) = signed_in_engine(client).await;

    let err = engine.delete_thread(&ThreadId::new("gone")).await.unwrap_err();
    assert!(matches!(err, EngineError::ThreadNotFound(_)));
}
