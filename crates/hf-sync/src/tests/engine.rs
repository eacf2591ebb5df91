use super::{ann, listing};
use crate::storage::IDENTITY_KEY;
use crate::{
    Authorities, FileStore, KeyValueStore, MemoryStore, ReconcileOutcome, SyncEngine,
    ToggleOutcome,
};

use hf_client::{InMemoryAuthority, Operation};
use hf_config::Config;
use hf_core::Credentials;

use std::sync::Arc;

use tempfile::TempDir;

fn authority() -> Arc<InMemoryAuthority> {
    Arc::new(InMemoryAuthority::new().with_account(ann(), "secret"))
}

#[tokio::test]
async fn given_empty_store_when_bootstrap_then_anonymous_and_no_check() {
    let authority = authority();

    let engine = SyncEngine::bootstrap(
        Arc::new(MemoryStore::new()),
        Authorities::shared(authority.clone()),
        &Config::default(),
    )
    .await
    .unwrap();

    assert_eq!(engine.startup_outcome(), &ReconcileOutcome::Skipped);
    assert_eq!(engine.state().identity().get(), None);
    assert_eq!(authority.calls(Operation::ValidateSession), 0);
}

#[tokio::test]
async fn given_persisted_identity_and_dead_session_when_bootstrap_then_cleared() {
    let store = Arc::new(MemoryStore::new());
    store
        .write(IDENTITY_KEY, &serde_json::to_string(&ann()).unwrap())
        .unwrap();
    store.write("favorites", "[1]").unwrap();

    let engine = SyncEngine::bootstrap(store, Authorities::shared(authority()), &Config::default())
        .await
        .unwrap();

    assert_eq!(engine.startup_outcome(), &ReconcileOutcome::Cleared);
    assert_eq!(engine.state().identity().get(), None);
    assert!(engine.state().favorites().is_empty());
}

#[tokio::test]
async fn given_file_store_when_restarted_then_session_and_favorites_survive() {
    let dir = TempDir::new().unwrap();
    let authority = authority();

    {
        let store = Arc::new(FileStore::open(dir.path()).unwrap());
        let engine = SyncEngine::bootstrap(
            store,
            Authorities::shared(authority.clone()),
            &Config::default(),
        )
        .await
        .unwrap();

        engine
            .session()
            .login(&Credentials::new("a@b.com", "secret"))
            .await
            .unwrap();
        let outcome = engine.toggles().toggle(&listing("42")).await.unwrap();
        assert_eq!(outcome, ToggleOutcome::Confirmed { liked: true });
    }

    let store = Arc::new(FileStore::open(dir.path()).unwrap());
    let engine = SyncEngine::bootstrap(store, Authorities::shared(authority), &Config::default())
        .await
        .unwrap();

    assert_eq!(engine.startup_outcome(), &ReconcileOutcome::Unchanged);
    assert_eq!(engine.state().identity().get(), Some(ann()));
    assert!(engine.state().is_liked(&listing("42")));
}

#[tokio::test]
async fn given_corrupted_identity_file_when_bootstrap_then_anonymous_and_backup_kept() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("identity.json"), "{\"id\":").unwrap();
    let store = Arc::new(FileStore::open(dir.path()).unwrap());

    let engine = SyncEngine::bootstrap(store, Authorities::shared(authority()), &Config::default())
        .await
        .unwrap();

    assert_eq!(engine.state().identity().get(), None);
    let backups: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("identity.json.corrupted."))
        .collect();
    assert_eq!(backups.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn given_engine_when_scheduler_runs_then_uses_configured_interval() {
    let authority = authority();
    authority.sign_in_as(5);
    let store = Arc::new(MemoryStore::new());
    store
        .write(IDENTITY_KEY, &serde_json::to_string(&ann()).unwrap())
        .unwrap();
    let mut config = Config::default();
    config.reconcile.poll_interval_secs = 60;

    let engine = SyncEngine::bootstrap(store, Authorities::shared(authority.clone()), &config)
        .await
        .unwrap();
    assert_eq!(authority.calls(Operation::ValidateSession), 1);

    let (_visibility, visibility_rx) = tokio::sync::watch::channel(crate::Visibility::Visible);
    let (shutdown, shutdown_rx) = tokio::sync::broadcast::channel(1);
    let handle = tokio::spawn(engine.scheduler().run(visibility_rx, shutdown_rx));

    tokio::time::sleep(std::time::Duration::from_secs(121)).await;
    assert_eq!(authority.calls(Operation::ValidateSession), 3);

    shutdown.send(()).unwrap();
    handle.await.unwrap();
}
