use super::{Fixture, ann, listing};
use crate::{Reconciler, SessionManager, SyncError, ToggleController, VerificationState};

use hf_client::{FavoritesAuthority, InjectedFailure, LoginOutcome, Operation};
use hf_core::{Credentials, Identity, Registration};

use std::sync::Arc;
use std::time::Duration;

struct Harness {
    fixture: Fixture,
    reconciler: Arc<Reconciler>,
    manager: SessionManager,
}

fn harness(fixture: Fixture) -> Harness {
    let reconciler = Arc::new(Reconciler::new(
        fixture.state.clone(),
        fixture.authority.clone(),
        Duration::from_secs(30),
    ));
    let toggles = Arc::new(ToggleController::new(
        fixture.state.clone(),
        fixture.authority.clone(),
    ));
    let manager = SessionManager::new(
        fixture.state.clone(),
        fixture.authority.clone(),
        reconciler.clone(),
        toggles,
    );
    Harness {
        fixture,
        reconciler,
        manager,
    }
}

#[tokio::test]
async fn given_valid_credentials_when_login_then_identity_set_and_favorites_loaded() {
    let fixture = Fixture::anonymous();
    // Favorites saved in an earlier session
    fixture.authority.sign_in_as(5);
    fixture.authority.add_favorite(&listing("12")).await.unwrap();
    fixture.authority.expire_session();
    let h = harness(fixture);

    let outcome = h
        .manager
        .login(&Credentials::new("a@b.com", "secret"))
        .await
        .unwrap();

    assert_eq!(outcome, LoginOutcome::Authenticated(ann()));
    assert_eq!(h.fixture.state.identity().get(), Some(ann()));
    assert!(h.fixture.state.is_liked(&listing("12")));
    assert!(matches!(
        h.reconciler.verification(),
        VerificationState::Verified { .. }
    ));
}

#[tokio::test]
async fn given_wrong_password_when_login_then_rejected_and_state_untouched() {
    let h = harness(Fixture::anonymous());

    let outcome = h
        .manager
        .login(&Credentials::new("a@b.com", "wrong"))
        .await
        .unwrap();

    assert!(matches!(outcome, LoginOutcome::Rejected { .. }));
    assert_eq!(h.fixture.state.identity().get(), None);
}

#[tokio::test]
async fn given_malformed_email_when_login_then_validation_error_without_request() {
    let h = harness(Fixture::anonymous());

    let result = h
        .manager
        .login(&Credentials::new("not-an-email", "secret"))
        .await;

    assert!(matches!(result, Err(SyncError::Validation { .. })));
    assert_eq!(h.fixture.authority.calls(Operation::Login), 0);
}

#[tokio::test]
async fn given_unreachable_server_when_login_then_client_error_returned() {
    let h = harness(Fixture::anonymous());
    h.fixture
        .authority
        .fail_next(Operation::Login, InjectedFailure::Unavailable);

    let result = h
        .manager
        .login(&Credentials::new("a@b.com", "secret"))
        .await;

    let Err(err) = result else {
        panic!("expected an error");
    };
    assert!(matches!(err, SyncError::Client { .. }));
    assert!(err.is_transient());
    assert_eq!(h.fixture.state.identity().get(), None);
}

#[tokio::test]
async fn given_other_user_cached_when_login_then_old_favorites_dropped() {
    let fixture = Fixture::anonymous();
    fixture
        .state
        .identity()
        .set(Identity::new(9, "old@b.com"))
        .unwrap();
    fixture.state.set_liked(&listing("3"), true).unwrap();
    let h = harness(fixture);

    h.manager
        .login(&Credentials::new("a@b.com", "secret"))
        .await
        .unwrap();

    assert_eq!(h.fixture.state.identity().user_id(), Some(5));
    assert!(!h.fixture.state.is_liked(&listing("3")));
}

#[tokio::test]
async fn given_new_account_when_register_then_signed_in() {
    let h = harness(Fixture::anonymous());
    let registration = Registration {
        name: "Bob".into(),
        email: "bob@b.com".into(),
        password: "password1".into(),
    };

    let outcome = h.manager.register(&registration).await.unwrap();

    let LoginOutcome::Authenticated(identity) = outcome else {
        panic!("expected authenticated outcome");
    };
    assert_eq!(h.fixture.state.identity().get(), Some(identity));
}

#[tokio::test]
async fn given_short_password_when_register_then_validation_error() {
    let h = harness(Fixture::anonymous());
    let registration = Registration {
        name: "Bob".into(),
        email: "bob@b.com".into(),
        password: "123".into(),
    };

    let result = h.manager.register(&registration).await;

    assert!(matches!(result, Err(SyncError::Validation { .. })));
    assert_eq!(h.fixture.authority.calls(Operation::Register), 0);
}

#[tokio::test]
async fn given_signed_in_when_logout_then_local_and_server_session_gone() {
    let h = harness(Fixture::signed_in());
    h.fixture.state.set_liked(&listing("1"), true).unwrap();

    let previous = h.manager.logout().await.unwrap();

    assert_eq!(previous, Some(ann()));
    assert_eq!(h.fixture.state.identity().get(), None);
    assert!(h.fixture.state.favorites().is_empty());
    assert_eq!(h.fixture.authority.calls(Operation::Logout), 1);
}

#[tokio::test]
async fn given_unreachable_server_when_logout_then_local_state_cleared_anyway() {
    let h = harness(Fixture::signed_in());
    h.fixture
        .authority
        .fail_next(Operation::Logout, InjectedFailure::Unavailable);

    h.manager.logout().await.unwrap();

    assert_eq!(h.fixture.state.identity().get(), None);
}
