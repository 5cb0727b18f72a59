use battleship_sync::gateway::{Commit, Fields, Filter, SyncError, SyncGateway};
use battleship_sync::InMemoryGateway;
use serde_json::{json, Value};

fn fields(value: Value) -> Fields {
    value.as_object().cloned().unwrap_or_default()
}

#[tokio::test]
async fn test_put_get_update_delete() -> anyhow::Result<()> {
    let store = InMemoryGateway::new();
    let id = store.put_record("games", fields(json!({"a": 1, "b": 2}))).await?;

    let record = store.get_record("games", &id).await?;
    assert_eq!(record.id, id);
    assert_eq!(record.fields["a"], json!(1));

    store.update_record("games", &id, fields(json!({"b": 3, "c": 4}))).await?;
    let record = store.get_record("games", &id).await?;
    assert_eq!(Value::Object(record.fields), json!({"a": 1, "b": 3, "c": 4}));

    store.delete_record("games", &id).await?;
    assert_eq!(store.get_record("games", &id).await.unwrap_err(), SyncError::NotFound);
    assert_eq!(store.delete_record("games", &id).await.unwrap_err(), SyncError::NotFound);
    assert_eq!(
        store.update_record("games", &id, Fields::new()).await.unwrap_err(),
        SyncError::NotFound
    );
    Ok(())
}

#[tokio::test]
async fn test_ids_are_unique() -> anyhow::Result<()> {
    let store = InMemoryGateway::new();
    let a = store.put_record("players", Fields::new()).await?;
    let b = store.put_record("players", Fields::new()).await?;
    assert_ne!(a, b);
    Ok(())
}

#[tokio::test]
async fn test_run_atomic_applies_and_aborts() -> anyhow::Result<()> {
    let store = InMemoryGateway::new();
    let id = store.put_record("games", fields(json!({"n": 1}))).await?;
    let writes = store.write_count();

    let mut abort = |_: &Fields| -> Option<Fields> { None };
    assert_eq!(store.run_atomic("games", &id, &mut abort).await?, Commit::Aborted);
    assert_eq!(store.write_count(), writes);

    let mut bump = |current: &Fields| {
        let n = current["n"].as_i64().unwrap_or(0);
        Some(fields(json!({"n": n + 1})))
    };
    assert_eq!(store.run_atomic("games", &id, &mut bump).await?, Commit::Applied);
    assert_eq!(store.get_record("games", &id).await?.fields["n"], json!(2));
    assert_eq!(store.write_count(), writes + 1);
    Ok(())
}

#[tokio::test]
async fn test_run_atomic_detects_concurrent_write() -> anyhow::Result<()> {
    let store = InMemoryGateway::new();
    let id = store.put_record("games", fields(json!({"n": 1}))).await?;

    let other = store.clone();
    let other_id = id.clone();
    let mut racing = move |_: &Fields| {
        // Another writer slips in between our read and our commit.
        let other = other.clone();
        let other_id = other_id.clone();
        std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(other.update_record("games", &other_id, fields(json!({"n": 10}))))
        })
        .join()
        .unwrap()
        .unwrap();
        Some(fields(json!({"n": 2})))
    };
    assert_eq!(
        store.run_atomic("games", &id, &mut racing).await.unwrap_err(),
        SyncError::Conflict
    );
    assert_eq!(store.get_record("games", &id).await?.fields["n"], json!(10));
    Ok(())
}

#[tokio::test]
async fn test_injected_conflicts_are_consumed() -> anyhow::Result<()> {
    let store = InMemoryGateway::new();
    let id = store.put_record("games", fields(json!({"n": 1}))).await?;
    store.inject_conflicts(2);

    let mut set = |_: &Fields| Some(fields(json!({"n": 5})));
    for _ in 0..2 {
        assert_eq!(
            store.run_atomic("games", &id, &mut set).await.unwrap_err(),
            SyncError::Conflict
        );
    }
    assert_eq!(store.run_atomic("games", &id, &mut set).await?, Commit::Applied);
    assert_eq!(store.get_record("games", &id).await?.fields["n"], json!(5));
    Ok(())
}

#[tokio::test]
async fn test_offline_store_fails_every_call() -> anyhow::Result<()> {
    let store = InMemoryGateway::new();
    let id = store.put_record("games", Fields::new()).await?;
    store.set_offline(true);

    assert!(matches!(
        store.get_record("games", &id).await,
        Err(SyncError::Transport(_))
    ));
    assert!(matches!(
        store.put_record("games", Fields::new()).await,
        Err(SyncError::Transport(_))
    ));
    assert!(matches!(
        store.subscribe("games", Filter::All).await,
        Err(SyncError::Transport(_))
    ));

    store.set_offline(false);
    assert!(store.get_record("games", &id).await.is_ok());
    Ok(())
}

#[tokio::test]
async fn test_subscription_gets_initial_and_filtered_snapshots() -> anyhow::Result<()> {
    let store = InMemoryGateway::new();
    store.put_record("players", fields(json!({"name": "alice", "isOnline": true}))).await?;

    let mut online = store
        .subscribe("players", Filter::equals("isOnline", true))
        .await?;
    let first = online.next().await.unwrap();
    assert_eq!(first.len(), 1);

    let bob = store.put_record("players", fields(json!({"name": "bob", "isOnline": true}))).await?;
    assert_eq!(online.next().await.unwrap().len(), 2);

    store.update_record("players", &bob, fields(json!({"isOnline": false}))).await?;
    let snapshot = online.next().await.unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].fields["name"], json!("alice"));

    // Writes elsewhere do not wake this subscription.
    store.put_record("games", Fields::new()).await?;
    assert!(online.try_next().is_none());
    Ok(())
}

#[tokio::test]
async fn test_latest_skips_stale_snapshots() -> anyhow::Result<()> {
    let store = InMemoryGateway::new();
    let id = store.put_record("games", fields(json!({"n": 0}))).await?;
    let mut sub = store.subscribe("games", Filter::Id(id.clone())).await?;
    for n in 1..=3 {
        store.update_record("games", &id, fields(json!({"n": n}))).await?;
    }
    let latest = sub.latest().unwrap();
    assert_eq!(latest[0].fields["n"], json!(3));
    assert!(sub.try_next().is_none());
    Ok(())
}

#[tokio::test]
async fn test_dropped_subscription_is_pruned() -> anyhow::Result<()> {
    let store = InMemoryGateway::new();
    let sub = store.subscribe("games", Filter::All).await?;
    assert_eq!(store.subscriber_count(), 1);
    drop(sub);
    assert_eq!(store.subscriber_count(), 0);
    store.put_record("games", Fields::new()).await?;
    assert_eq!(store.subscriber_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_run_atomic_through_trait_object() -> anyhow::Result<()> {
    let store: std::sync::Arc<dyn SyncGateway> = std::sync::Arc::new(InMemoryGateway::new());
    let id = store.put_record("games", fields(json!({"name": "a"}))).await?;

    let mut seen = Vec::new();
    let mut append = |current: &Fields| {
        let name = current.get("name").and_then(Value::as_str).unwrap_or_default();
        seen.push(name.to_string());
        Some(fields(json!({ "name": format!("{}b", name) })))
    };
    assert_eq!(store.run_atomic("games", &id, &mut append).await?, Commit::Applied);
    assert_eq!(seen, ["a"]);
    assert_eq!(store.get_record("games", &id).await?.fields["name"], json!("ab"));
    Ok(())
}
