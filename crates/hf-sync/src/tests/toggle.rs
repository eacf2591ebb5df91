use super::{Fixture, ann, listing, record, settle};
use crate::{ToggleController, ToggleOutcome};

use hf_client::{FavoritesAuthority, InjectedFailure, Operation};

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use proptest::prelude::*;

fn controller(fixture: &Fixture) -> Arc<ToggleController> {
    Arc::new(ToggleController::new(
        fixture.state.clone(),
        fixture.authority.clone(),
    ))
}

fn count_auth_signals(controller: &ToggleController) -> Arc<AtomicUsize> {
    let count = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&count);
    controller.on_auth_required(move |_| {
        sink.fetch_add(1, Ordering::SeqCst);
    });
    count
}

#[tokio::test]
async fn given_signed_in_when_toggle_then_liked_locally_and_on_server() {
    let fixture = Fixture::signed_in();
    let controller = controller(&fixture);
    let id = listing("42");

    let outcome = controller.toggle(&id).await.unwrap();

    assert_eq!(outcome, ToggleOutcome::Confirmed { liked: true });
    assert!(fixture.state.is_liked(&id));
    assert_eq!(fixture.authority.favorites_of(ann().id), vec![id]);
    assert!(controller.pending().is_empty());
}

#[tokio::test]
async fn given_liked_when_toggle_then_unliked() {
    let fixture = Fixture::signed_in();
    let controller = controller(&fixture);
    let id = listing("42");
    controller.toggle(&id).await.unwrap();

    let outcome = controller.toggle(&id).await.unwrap();

    assert_eq!(outcome, ToggleOutcome::Confirmed { liked: false });
    assert!(!fixture.state.is_liked(&id));
    assert!(fixture.authority.favorites_of(ann().id).is_empty());
}

#[tokio::test]
async fn given_expired_session_when_toggle_42_then_rolled_back_with_true_then_false() {
    let fixture = Fixture::stale_session();
    let controller = controller(&fixture);
    let signals = count_auth_signals(&controller);
    let id = listing("42");
    let (_sub, seen) = record(fixture.state.bus(), &id);

    let outcome = controller.toggle(&id).await.unwrap();

    assert_eq!(outcome, ToggleOutcome::RolledBack { liked: false });
    assert!(!fixture.state.is_liked(&id));
    assert_eq!(*seen.lock().unwrap(), vec![true, false]);
    assert_eq!(signals.load(Ordering::SeqCst), 1);
    assert!(controller.pending().is_empty());
}

#[tokio::test]
async fn given_no_identity_when_toggle_10_then_signal_once_and_nothing_else() {
    let fixture = Fixture::anonymous();
    let controller = controller(&fixture);
    let signals = count_auth_signals(&controller);
    let id = listing("10");
    let (_sub, seen) = record(fixture.state.bus(), &id);

    let outcome = controller.toggle(&id).await.unwrap();

    assert_eq!(outcome, ToggleOutcome::AuthenticationRequired);
    assert_eq!(signals.load(Ordering::SeqCst), 1);
    assert!(fixture.state.favorites().is_empty());
    assert!(seen.lock().unwrap().is_empty());
    assert_eq!(fixture.authority.calls(Operation::AddFavorite), 0);
    assert_eq!(fixture.authority.calls(Operation::RemoveFavorite), 0);
    assert!(controller.pending().is_empty());
}

#[tokio::test]
async fn given_request_in_flight_when_toggle_7_again_then_one_request_only() {
    let fixture = Fixture::signed_in();
    let controller = controller(&fixture);
    let id = listing("7");
    fixture.authority.hold_mutations();

    let first = controller.spawn_toggle(id.clone());
    let authority = fixture.authority.clone();
    settle(|| authority.calls(Operation::AddFavorite) == 1).await;

    let second = controller.toggle(&id).await.unwrap();

    assert_eq!(second, ToggleOutcome::AlreadyPending);
    assert_eq!(fixture.authority.calls(Operation::AddFavorite), 1);
    assert!(fixture.state.is_liked(&id));
    assert!(controller.pending().is_pending(&id));

    fixture.authority.release_mutations();
    let first = first.await.unwrap().unwrap();

    assert_eq!(first, ToggleOutcome::Confirmed { liked: true });
    assert_eq!(fixture.authority.calls(Operation::AddFavorite), 1);
    assert!(!controller.pending().is_pending(&id));
}

#[tokio::test]
async fn given_request_in_flight_when_toggle_other_listing_then_not_blocked() {
    let fixture = Fixture::signed_in();
    let controller = controller(&fixture);
    fixture.authority.hold_mutations();

    let first = controller.spawn_toggle(listing("7"));
    let second = controller.spawn_toggle(listing("8"));
    let authority = fixture.authority.clone();
    settle(|| authority.calls(Operation::AddFavorite) == 2).await;

    assert_eq!(controller.pending().len(), 2);

    fixture.authority.release_mutations();
    let (first, second) = futures::join!(first, second);
    assert_eq!(first.unwrap().unwrap(), ToggleOutcome::Confirmed { liked: true });
    assert_eq!(second.unwrap().unwrap(), ToggleOutcome::Confirmed { liked: true });
}

#[tokio::test]
async fn given_old_request_in_flight_when_anonymous_toggle_then_authentication_required() {
    let fixture = Fixture::signed_in();
    let controller = controller(&fixture);
    let signals = count_auth_signals(&controller);
    let id = listing("7");
    fixture.authority.hold_mutations();

    let first = controller.spawn_toggle(id.clone());
    let authority = fixture.authority.clone();
    settle(|| authority.calls(Operation::AddFavorite) == 1).await;
    fixture.state.clear_session().unwrap();

    let second = controller.toggle(&id).await.unwrap();

    assert_eq!(second, ToggleOutcome::AuthenticationRequired);
    assert_eq!(signals.load(Ordering::SeqCst), 1);
    assert_eq!(fixture.authority.calls(Operation::AddFavorite), 1);

    fixture.authority.release_mutations();
    first.await.unwrap().unwrap();
}

#[tokio::test]
async fn given_network_failure_when_toggle_then_optimistic_state_retained() {
    let fixture = Fixture::signed_in();
    let controller = controller(&fixture);
    let signals = count_auth_signals(&controller);
    let id = listing("3");
    fixture
        .authority
        .fail_next(Operation::AddFavorite, InjectedFailure::Unavailable);
    let (_sub, seen) = record(fixture.state.bus(), &id);

    let outcome = controller.toggle(&id).await.unwrap();

    assert_eq!(outcome, ToggleOutcome::Retained { liked: true });
    assert!(fixture.state.is_liked(&id));
    assert_eq!(*seen.lock().unwrap(), vec![true]);
    assert_eq!(signals.load(Ordering::SeqCst), 0);
    assert!(controller.pending().is_empty());
}

#[tokio::test]
async fn given_server_error_when_toggle_then_optimistic_state_retained() {
    let fixture = Fixture::signed_in();
    let controller = controller(&fixture);
    let id = listing("3");
    fixture.authority.fail_next(
        Operation::AddFavorite,
        InjectedFailure::ServerError("listing deleted".into()),
    );

    let outcome = controller.toggle(&id).await.unwrap();

    assert_eq!(outcome, ToggleOutcome::Retained { liked: true });
    assert!(fixture.state.is_liked(&id));
}

#[tokio::test]
async fn given_identity_cleared_mid_flight_when_rejected_then_favorite_not_restored() {
    let fixture = Fixture::stale_session();
    let controller = controller(&fixture);
    let id = listing("3");
    fixture.state.set_liked(&id, true).unwrap();
    fixture.authority.hold_mutations();

    let handle = controller.spawn_toggle(id.clone());
    let authority = fixture.authority.clone();
    settle(|| authority.calls(Operation::RemoveFavorite) == 1).await;

    fixture.state.clear_session().unwrap();
    fixture.authority.release_mutations();
    let outcome = handle.await.unwrap().unwrap();

    assert_eq!(outcome, ToggleOutcome::RolledBack { liked: true });
    assert!(!fixture.state.is_liked(&id));
    assert!(fixture.state.favorites().is_empty());
}

#[tokio::test]
async fn given_failing_store_when_toggle_then_error_and_no_request() {
    let fixture = Fixture::signed_in();
    let controller = controller(&fixture);
    fixture.store.fail_writes(true);

    let result = controller.toggle(&listing("3")).await;

    assert!(result.is_err());
    assert_eq!(fixture.authority.calls(Operation::AddFavorite), 0);
    assert!(controller.pending().is_empty());
}

// =============================================================================
// hydrate / refresh
// =============================================================================

#[tokio::test]
async fn given_server_favorites_when_hydrate_then_cache_replaced_and_changes_published() {
    let fixture = Fixture::signed_in();
    let controller = controller(&fixture);
    fixture.authority.add_favorite(&listing("1")).await.unwrap();
    fixture.authority.add_favorite(&listing("2")).await.unwrap();
    fixture.state.set_liked(&listing("2"), true).unwrap();
    fixture.state.set_liked(&listing("9"), true).unwrap();
    let (_one, seen_one) = record(fixture.state.bus(), &listing("1"));
    let (_nine, seen_nine) = record(fixture.state.bus(), &listing("9"));

    let diff = controller.hydrate().await.unwrap().unwrap();

    assert_eq!(diff.added, vec![listing("1")]);
    assert_eq!(diff.removed, vec![listing("9")]);
    assert_eq!(
        fixture.state.favorites().snapshot(),
        vec![listing("1"), listing("2")]
    );
    assert_eq!(*seen_one.lock().unwrap(), vec![true]);
    assert_eq!(*seen_nine.lock().unwrap(), vec![false]);
}

#[tokio::test]
async fn given_toggle_in_flight_when_hydrate_without_it_then_optimistic_state_kept() {
    let fixture = Fixture::signed_in();
    let controller = controller(&fixture);
    fixture.authority.add_favorite(&listing("1")).await.unwrap();
    let id = listing("7");
    fixture.authority.hold_mutations();

    let pending = controller.spawn_toggle(id.clone());
    let authority = fixture.authority.clone();
    settle(|| authority.calls(Operation::AddFavorite) == 1).await;
    let (_sub, seen) = record(fixture.state.bus(), &id);

    let diff = controller.hydrate().await.unwrap().unwrap();

    assert_eq!(diff.added, vec![listing("1")]);
    assert!(diff.removed.is_empty());
    assert!(fixture.state.is_liked(&id));
    assert!(seen.lock().unwrap().is_empty());

    fixture.authority.release_mutations();
    assert_eq!(
        pending.await.unwrap().unwrap(),
        ToggleOutcome::Confirmed { liked: true }
    );
    assert_eq!(
        fixture.state.favorites().snapshot(),
        vec![listing("1"), id]
    );
}

#[tokio::test]
async fn given_unreachable_server_when_hydrate_then_local_set_kept() {
    let fixture = Fixture::signed_in();
    let controller = controller(&fixture);
    fixture.state.set_liked(&listing("9"), true).unwrap();
    fixture
        .authority
        .fail_next(Operation::ListFavorites, InjectedFailure::Unavailable);

    assert_eq!(controller.hydrate().await.unwrap(), None);

    assert!(fixture.state.is_liked(&listing("9")));
}

#[tokio::test]
async fn given_no_identity_when_hydrate_then_server_not_asked() {
    let fixture = Fixture::anonymous();
    let controller = controller(&fixture);

    assert_eq!(controller.hydrate().await.unwrap(), None);

    assert_eq!(fixture.authority.calls(Operation::ListFavorites), 0);
}

#[tokio::test]
async fn given_server_disagrees_when_refresh_then_cache_corrected() {
    let fixture = Fixture::signed_in();
    let controller = controller(&fixture);
    let id = listing("4");
    fixture.authority.add_favorite(&id).await.unwrap();
    let (_sub, seen) = record(fixture.state.bus(), &id);

    assert_eq!(controller.refresh(&id).await.unwrap(), Some(true));
    assert_eq!(controller.refresh(&id).await.unwrap(), Some(true));

    assert!(fixture.state.is_liked(&id));
    assert_eq!(*seen.lock().unwrap(), vec![true]);
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn given_n_toggles_without_rejection_when_settled_then_initial_xor_odd(
        initially_liked in any::<bool>(),
        toggles in 0usize..8,
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            let fixture = Fixture::signed_in();
            let controller = controller(&fixture);
            let id = listing("77");
            if initially_liked {
                fixture.state.set_liked(&id, true).unwrap();
                fixture.authority.add_favorite(&id).await.unwrap();
            }

            for _ in 0..toggles {
                controller.toggle(&id).await.unwrap();
            }

            let expected = initially_liked ^ (toggles % 2 == 1);
            assert_eq!(fixture.state.is_liked(&id), expected);
            assert_eq!(
                fixture.authority.favorites_of(ann().id).contains(&id),
                expected
            );
        });
    }
}
