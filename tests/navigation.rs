//! End-to-end navigation through the public `Navigator` API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use corenav::config::{CacheConfig, HistoryConfig};
use corenav::interfaces::{same_destination, DestinationRef, DestinationType};
use corenav::orchestration::queue::TaskState;
use corenav::test_utils::{
    counting_factory, failing_factory, BlankScreen, ContainerScreen, EventLog, PresenterCall,
    RecordingPresenter, ScriptedProtection, TestScreen,
};
use corenav::{
    DataPassing, Lifetime, NavigationError, NavigationOutcome, NavigationRequest, Navigator,
    NavigatorConfig, RouteTable, TargetSpec, TransitionState,
};

fn navigator(presenter: &Arc<RecordingPresenter>) -> Navigator {
    Navigator::new(presenter.clone(), NavigatorConfig::for_test())
}

fn push(name: &str) -> NavigationRequest {
    NavigationRequest::push(TargetSpec::direct(TestScreen::new(name)))
}

fn counter() -> Arc<AtomicUsize> {
    Arc::new(AtomicUsize::new(0))
}

async fn history_names(navigator: &Navigator) -> Vec<String> {
    navigator
        .history()
        .items()
        .await
        .iter()
        .map(|item| item.destination().name().to_string())
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_safe_navigations_commit_in_submission_order() {
    let presenter = Arc::new(RecordingPresenter::new().with_delay(Duration::from_millis(10)));
    let navigator = navigator(&presenter);

    let slow = TargetSpec::factory(|| async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok(Arc::new(TestScreen::new("a")) as DestinationRef)
    });
    let a = navigator.navigate(NavigationRequest::push(slow));
    let b = navigator.navigate(push("b"));
    let c = navigator.navigate(NavigationRequest::present(TargetSpec::direct(
        TestScreen::new("c"),
    )));

    assert!(c.outcome().await.is_completed());
    assert!(b.outcome().await.is_completed());
    assert!(a.outcome().await.is_completed());

    assert_eq!(presenter.displayed_names(), vec!["a", "b", "c"]);
    assert_eq!(history_names(&navigator).await, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_unsafe_navigation_bypasses_queue() {
    let (presenter, release) = RecordingPresenter::new().hold("held");
    let presenter = Arc::new(presenter);
    let navigator = navigator(&presenter);

    let mut held = navigator.navigate(push("held"));
    let after = navigator.navigate(push("after"));
    assert_eq!(
        held.wait_for_state(TransitionState::Presenting).await,
        TransitionState::Presenting
    );

    let fast = navigator.navigate(push("fast").unsafe_navigation());
    assert!(fast.outcome().await.is_completed());
    assert_eq!(presenter.displayed_names(), vec!["fast"]);
    assert_eq!(after.task_state(), TaskState::Pending);
    assert_eq!(after.state(), TransitionState::Created);

    release.add_permits(1);
    assert!(held.outcome().await.is_completed());
    assert!(after.outcome().await.is_completed());
    assert_eq!(presenter.displayed_names(), vec!["fast", "held", "after"]);
}

#[tokio::test]
async fn test_cached_destination_skips_factory() {
    let presenter = Arc::new(RecordingPresenter::new());
    let navigator = navigator(&presenter);
    let calls = counter();

    let request = || {
        NavigationRequest::push(counting_factory("profile", calls.clone()))
            .cache("profile", Lifetime::Forever)
    };
    let first = navigator.navigate(request()).outcome().await;
    let second = navigator.navigate(request()).outcome().await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let first = first.result().expect("first completes").destination.clone();
    let second = second.result().expect("second completes").destination.clone();
    assert!(same_destination(&first, &second));
    assert!(navigator.cache().contains("profile").await);
}

#[tokio::test]
async fn test_single_use_cache_entry_is_not_readded_on_hit() {
    let presenter = Arc::new(RecordingPresenter::new());
    let navigator = navigator(&presenter);
    let calls = counter();

    let request = || {
        NavigationRequest::push(counting_factory("wizard", calls.clone()))
            .cache("wizard", Lifetime::once())
    };
    for _ in 0..3 {
        assert!(navigator.navigate(request()).outcome().await.is_completed());
    }

    // fresh, cached, fresh
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(navigator.cache().contains("wizard").await);
}

#[tokio::test]
async fn test_concurrent_cached_requests_resolve_once() {
    let presenter = Arc::new(RecordingPresenter::new());
    let navigator = navigator(&presenter);
    let calls = counter();

    let handles: Vec<_> = (0..3)
        .map(|_| {
            navigator.navigate(
                NavigationRequest::push(counting_factory("shared", calls.clone()))
                    .cache("shared", Lifetime::Forever)
                    .unsafe_navigation(),
            )
        })
        .collect();
    for handle in handles {
        assert!(handle.outcome().await.is_completed());
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_cache_disabled_ignores_policies() {
    let presenter = Arc::new(RecordingPresenter::new());
    let config = NavigatorConfig {
        cache: CacheConfig { enabled: false },
        ..NavigatorConfig::for_test()
    };
    let navigator = Navigator::new(presenter.clone(), config);
    let calls = counter();

    for _ in 0..2 {
        let request = NavigationRequest::push(counting_factory("profile", calls.clone()))
            .cache("profile", Lifetime::Forever);
        assert!(navigator.navigate(request).outcome().await.is_completed());
    }

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(navigator.cache().is_empty().await);
}

#[tokio::test]
async fn test_protection_cancel_reports_error_and_queue_advances() {
    let presenter = Arc::new(RecordingPresenter::new());
    let navigator = navigator(&presenter);
    let failures = counter();
    let successes = counter();

    let space = Arc::new(ScriptedProtection::cancelling_with("not signed in"));
    let failures_seen = failures.clone();
    let successes_seen = successes.clone();
    let protected = navigator.navigate(
        push("account")
            .protect(space.clone())
            .on_failure(move |_| {
                failures_seen.fetch_add(1, Ordering::SeqCst);
            })
            .on_success(move |_| {
                successes_seen.fetch_add(1, Ordering::SeqCst);
            }),
    );
    let next = navigator.navigate(push("home"));

    let outcome = protected.outcome().await;
    assert!(matches!(
        outcome.error(),
        Some(NavigationError::Protection(_))
    ));
    assert!(next.outcome().await.is_completed());

    assert_eq!(space.protect_calls(), 1);
    assert_eq!(failures.load(Ordering::SeqCst), 1);
    assert_eq!(successes.load(Ordering::SeqCst), 0);
    assert_eq!(presenter.displayed_names(), vec!["home"]);
    assert_eq!(history_names(&navigator).await, vec!["home"]);
}

#[tokio::test]
async fn test_silent_cancel_skips_failure_observers() {
    let presenter = Arc::new(RecordingPresenter::new());
    let navigator = navigator(&presenter);
    let failures = counter();

    let failures_seen = failures.clone();
    let handle = navigator.navigate(
        push("account")
            .protect(Arc::new(ScriptedProtection::cancelling()))
            .on_failure(move |_| {
                failures_seen.fetch_add(1, Ordering::SeqCst);
            }),
    );

    assert!(matches!(
        handle.outcome().await,
        NavigationOutcome::Aborted(None)
    ));
    assert_eq!(failures.load(Ordering::SeqCst), 0);
    assert!(presenter.calls().is_empty());
}

#[tokio::test]
async fn test_deferred_protection_holds_the_queue() {
    let presenter = Arc::new(RecordingPresenter::new());
    let navigator = navigator(&presenter);
    let space = Arc::new(ScriptedProtection::deferred());

    let mut gated = navigator.navigate(push("gated").protect(space.clone()));
    let behind = navigator.navigate(push("behind"));
    assert_eq!(
        gated.wait_for_state(TransitionState::Protecting).await,
        TransitionState::Protecting
    );
    assert_eq!(behind.task_state(), TaskState::Pending);

    while !space.release_unprotect() {
        tokio::task::yield_now().await;
    }

    assert!(gated.outcome().await.is_completed());
    assert!(behind.outcome().await.is_completed());
    assert_eq!(presenter.displayed_names(), vec!["gated", "behind"]);
}

#[tokio::test]
async fn test_inactive_protection_is_never_asked() {
    let presenter = Arc::new(RecordingPresenter::new());
    let navigator = navigator(&presenter);
    let space = Arc::new(ScriptedProtection::inactive());

    let handle = navigator.navigate(push("open").protect(space.clone()));

    assert!(handle.outcome().await.is_completed());
    assert_eq!(space.protect_calls(), 0);
}

#[tokio::test]
async fn test_resolution_failure_notifies_failure_observers_only() {
    let presenter = Arc::new(RecordingPresenter::new());
    let navigator = navigator(&presenter);
    let failures = counter();
    let successes = counter();

    let failures_seen = failures.clone();
    let successes_seen = successes.clone();
    let handle = navigator.navigate(
        NavigationRequest::push(failing_factory("backend unavailable"))
            .cache("broken", Lifetime::Forever)
            .on_failure(move |error| {
                assert_eq!(error.kind(), "resolution");
                failures_seen.fetch_add(1, Ordering::SeqCst);
            })
            .on_success(move |_| {
                successes_seen.fetch_add(1, Ordering::SeqCst);
            }),
    );

    let outcome = handle.outcome().await;
    assert!(matches!(
        outcome.error(),
        Some(NavigationError::Resolution(_))
    ));
    assert_eq!(failures.load(Ordering::SeqCst), 1);
    assert_eq!(successes.load(Ordering::SeqCst), 0);
    assert!(!navigator.cache().contains("broken").await);
    assert!(presenter.calls().is_empty());
    assert!(navigator.history().is_empty().await);
}

#[tokio::test]
async fn test_routed_navigation() {
    let presenter = Arc::new(RecordingPresenter::new());
    let navigator = navigator(&presenter);
    let routes =
        Arc::new(RouteTable::new().register_type("/blank", DestinationType::of::<BlankScreen>()));

    let found = navigator
        .navigate(NavigationRequest::push(TargetSpec::routed(
            routes.clone(),
            "/blank/",
        )))
        .outcome()
        .await;
    let missing = navigator
        .navigate(NavigationRequest::push(TargetSpec::routed(routes, "/nowhere")))
        .outcome()
        .await;

    assert_eq!(
        found.result().map(|r| r.destination.name().to_string()),
        Some("blank".to_string())
    );
    assert!(matches!(
        missing.error(),
        Some(NavigationError::RoutingMiss(path)) if path == "/nowhere"
    ));
}

#[tokio::test]
async fn test_data_delivered_before_presentation() {
    let log = EventLog::new();
    let presenter = Arc::new(RecordingPresenter::new().with_log(log.clone()));
    let navigator = navigator(&presenter);
    let screen = Arc::new(TestScreen::receiving("detail").with_log(log.clone()));

    let outcome = navigator
        .navigate(
            NavigationRequest::push(TargetSpec::Direct(screen.clone()))
                .pass_data(DataPassing::from_future(|| async { Some(json!({"id": 7})) })),
        )
        .outcome()
        .await;

    assert_eq!(
        outcome.result().and_then(|r| r.payload.clone()),
        Some(json!({"id": 7}))
    );
    assert_eq!(screen.received(), vec![Some(json!({"id": 7}))]);
    let data = log.position("data:detail").expect("data recorded");
    let present = log.position("present:detail").expect("present recorded");
    assert!(data < present);
}

#[tokio::test]
async fn test_embedded_container_is_displayed_and_recorded() {
    let presenter = Arc::new(RecordingPresenter::new());
    let navigator = navigator(&presenter);
    let screen = Arc::new(TestScreen::new("inner"));

    let outcome = navigator
        .navigate(
            NavigationRequest::present(TargetSpec::Direct(screen.clone()))
                .embed(|inner| Arc::new(ContainerScreen { inner }) as DestinationRef)
                .on_event("closed", |_| {}),
        )
        .outcome()
        .await;

    let result = outcome.result().expect("completes");
    assert_eq!(result.destination.name(), "inner");
    assert!(result.container.is_some());
    assert_eq!(presenter.displayed_names(), vec!["container"]);
    assert_eq!(history_names(&navigator).await, vec!["container"]);
    assert_eq!(screen.emit("closed"), 1);
}

#[tokio::test]
async fn test_animation_defaults_from_config() {
    let presenter = Arc::new(RecordingPresenter::new());
    let config = NavigatorConfig {
        animated: false,
        ..NavigatorConfig::for_test()
    };
    let navigator = Navigator::new(presenter.clone(), config);

    navigator.navigate(push("plain")).outcome().await;
    navigator
        .navigate(push("fancy").animated(true))
        .outcome()
        .await;

    let animated: Vec<bool> = presenter
        .calls()
        .iter()
        .map(|call| match call {
            PresenterCall::Push { animated, .. } => *animated,
            other => panic!("unexpected call {other:?}"),
        })
        .collect();
    assert_eq!(animated, vec![false, true]);
}

#[tokio::test]
async fn test_success_observer_sees_previous_top_as_source() {
    let presenter = Arc::new(RecordingPresenter::new());
    let navigator = navigator(&presenter);

    let first = navigator.navigate(push("first")).outcome().await;
    let second = navigator.navigate(push("second")).outcome().await;

    assert!(first.result().and_then(|r| r.source.clone()).is_none());
    assert_eq!(
        second
            .result()
            .and_then(|r| r.source.as_ref().map(|s| s.name().to_string())),
        Some("first".to_string())
    );
}

#[tokio::test]
async fn test_back_truncates_history() {
    let presenter = Arc::new(RecordingPresenter::new());
    let navigator = navigator(&presenter);
    for name in ["a", "b", "c", "d"] {
        navigator.navigate(push(name)).outcome().await;
    }

    let target = navigator.back(1, false).await.expect("enough history");
    assert_eq!(target.destination().name(), "c");
    assert_eq!(history_names(&navigator).await, vec!["a", "b"]);
    match presenter.calls().last() {
        Some(PresenterCall::Back {
            destination,
            steps,
            animated,
        }) => {
            assert_eq!(destination.name(), "c");
            assert_eq!(*steps, 1);
            assert!(!animated);
        }
        other => panic!("expected back call, got {other:?}"),
    }
}

#[tokio::test]
async fn test_back_without_enough_history_is_noop() {
    let presenter = Arc::new(RecordingPresenter::new());
    let navigator = navigator(&presenter);
    navigator.navigate(push("only")).outcome().await;
    let calls_before = presenter.calls().len();

    assert!(navigator.back(1, true).await.is_none());
    assert_eq!(presenter.calls().len(), calls_before);
    assert_eq!(history_names(&navigator).await, vec!["only"]);
}

#[tokio::test]
async fn test_back_zero_steps_pops_top() {
    let presenter = Arc::new(RecordingPresenter::new());
    let navigator = navigator(&presenter);
    for name in ["a", "b"] {
        navigator.navigate(push(name)).outcome().await;
    }

    let target = navigator.back(0, true).await.expect("non-empty history");
    assert_eq!(target.destination().name(), "b");
    assert_eq!(history_names(&navigator).await, vec!["a"]);
}

#[tokio::test]
async fn test_history_capacity_drops_oldest() {
    let presenter = Arc::new(RecordingPresenter::new());
    let config = NavigatorConfig {
        history: HistoryConfig { capacity: Some(2) },
        ..NavigatorConfig::for_test()
    };
    let navigator = Navigator::new(presenter.clone(), config);
    for name in ["a", "b", "c"] {
        navigator.navigate(push(name)).outcome().await;
    }

    assert_eq!(history_names(&navigator).await, vec!["b", "c"]);
}

#[tokio::test]
async fn test_reset_clears_cache_and_history() {
    let presenter = Arc::new(RecordingPresenter::new());
    let navigator = navigator(&presenter);
    let calls = counter();

    navigator
        .navigate(
            NavigationRequest::push(counting_factory("profile", calls.clone()))
                .cache("profile", Lifetime::Forever),
        )
        .outcome()
        .await;
    assert!(!navigator.cache().is_empty().await);

    navigator.reset().await;

    assert!(navigator.cache().is_empty().await);
    assert!(navigator.history().is_empty().await);
}

#[tokio::test]
async fn test_unrepresentable_timeout_caches_and_completes() {
    let presenter = Arc::new(RecordingPresenter::new());
    let navigator = navigator(&presenter);
    let failures = counter();

    let failures_seen = failures.clone();
    let mut handle = navigator.navigate(
        push("long")
            .cache("long", Lifetime::Timeout(Duration::MAX))
            .on_failure(move |_| {
                failures_seen.fetch_add(1, Ordering::SeqCst);
            }),
    );

    assert_eq!(
        handle.wait_for_state(TransitionState::Completed).await,
        TransitionState::Completed
    );
    assert!(handle.outcome().await.is_completed());
    assert_eq!(failures.load(Ordering::SeqCst), 0);
    assert_eq!(presenter.displayed_names(), vec!["long"]);
    assert!(navigator.cache().contains("long").await);
}

#[tokio::test]
async fn test_panicking_embedding_aborts_and_queue_advances() {
    let presenter = Arc::new(RecordingPresenter::new());
    let navigator = navigator(&presenter);

    let mut broken = navigator.navigate(
        push("inner").embed(|_| -> DestinationRef { panic!("container unavailable") }),
    );
    let next = navigator.navigate(push("home"));

    assert_eq!(
        broken.wait_for_state(TransitionState::Completed).await,
        TransitionState::Aborted
    );
    match broken.outcome().await.error() {
        Some(NavigationError::Panicked(message)) => {
            assert_eq!(message, "container unavailable")
        }
        other => panic!("expected panic error, got {other:?}"),
    }
    assert!(next.outcome().await.is_completed());
    assert_eq!(presenter.displayed_names(), vec!["home"]);
}

#[tokio::test]
async fn test_panicking_success_observer_reports_panic() {
    let presenter = Arc::new(RecordingPresenter::new());
    let navigator = navigator(&presenter);

    let mut shown = navigator.navigate(push("shown").on_success(|_| panic!("observer failed")));
    let next = navigator.navigate(push("next"));

    assert_eq!(
        shown.wait_for_state(TransitionState::Aborted).await,
        TransitionState::Completed
    );
    assert!(matches!(
        shown.outcome().await.error(),
        Some(NavigationError::Panicked(message)) if message == "observer failed"
    ));
    assert!(next.outcome().await.is_completed());
    assert_eq!(presenter.displayed_names(), vec!["shown", "next"]);
}
