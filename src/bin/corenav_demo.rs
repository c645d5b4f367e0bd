//! corenav-demo: drives a few navigations through a logging presenter.
//!
//! ## Configuration
//! - CORENAV_CONFIG: Path to a YAML config file (optional)
//! - CORENAV_LOG: tracing filter (default: info)
//! - CORENAV__ANIMATED, CORENAV__HISTORY__CAPACITY, CORENAV__CACHE__ENABLED
//!
//! The demo pushes a routed home screen, a profile screen behind a login
//! gate (cached, with data), presents a settings screen wrapped in a
//! container, revisits the cached profile, then goes back one step.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use corenav::interfaces::{
    DataReceiver, Destination, DestinationRef, DestinationType, EventBindings, Payload, Presenter,
    ProtectionHandler, ProtectionSpace, Router,
};
use corenav::utils::bootstrap::init_tracing;
use corenav::{
    DataPassing, Lifetime, NavigationOutcome, NavigationRequest, Navigator, NavigatorConfig,
    RouteTable, TargetSpec,
};

/// Presenter that only logs.
#[derive(Default)]
struct LogPresenter {
    top: Mutex<Option<DestinationRef>>,
}

impl LogPresenter {
    fn set_top(&self, destination: DestinationRef) {
        if let Ok(mut top) = self.top.lock() {
            *top = Some(destination);
        }
    }
}

#[async_trait]
impl Presenter for LogPresenter {
    fn source(&self) -> Option<DestinationRef> {
        self.top.lock().ok().and_then(|top| top.clone())
    }

    async fn push(&self, container: DestinationRef, animated: bool) {
        info!(screen = %container.name(), animated, "push");
        self.set_top(container);
    }

    async fn present(&self, container: DestinationRef, animated: bool) {
        info!(screen = %container.name(), animated, "present");
        self.set_top(container);
    }

    async fn back(&self, destination: DestinationRef, steps: usize, animated: bool) {
        info!(screen = %destination.name(), steps, animated, "back");
        self.set_top(destination);
    }
}

#[derive(Default)]
struct HomeScreen;

impl Destination for HomeScreen {
    fn name(&self) -> &str {
        "home"
    }
}

struct Screen {
    name: &'static str,
}

impl Destination for Screen {
    fn name(&self) -> &str {
        self.name
    }

    fn data_receiver(&self) -> Option<&dyn DataReceiver> {
        Some(self)
    }
}

impl DataReceiver for Screen {
    fn receive_data(&self, payload: Option<Payload>) {
        info!(screen = self.name, ?payload, "data received");
    }
}

struct Container {
    inner: DestinationRef,
    name: String,
}

impl Destination for Container {
    fn name(&self) -> &str {
        &self.name
    }

    fn bind_events(&self, events: &EventBindings) {
        self.inner.bind_events(events);
    }
}

/// Login gate that "signs in" after a short delay.
struct LoginGate;

impl ProtectionSpace for LoginGate {
    fn should_protect(&self) -> bool {
        true
    }

    fn protect(&self, handler: ProtectionHandler) {
        info!("login required, signing in");
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            handler.unprotect();
        });
    }
}

fn report(label: &str, outcome: &NavigationOutcome) {
    match outcome {
        NavigationOutcome::Completed(result) => info!(
            label,
            destination = %result.destination.name(),
            source = ?result.source.as_ref().map(|s| s.name().to_string()),
            "completed"
        ),
        NavigationOutcome::Aborted(error) => info!(label, ?error, "aborted"),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = NavigatorConfig::load(None)?;
    let navigator = Navigator::new(Arc::new(LogPresenter::default()), config);

    let router: Arc<dyn Router> =
        Arc::new(RouteTable::new().register_type("/home", DestinationType::of::<HomeScreen>()));

    let profile = TargetSpec::factory(|| async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok(Arc::new(Screen { name: "profile" }) as DestinationRef)
    });

    let home = navigator.navigate(NavigationRequest::push(TargetSpec::routed(
        router.clone(),
        "/home",
    )));
    let first_profile = navigator.navigate(
        NavigationRequest::push(profile.clone())
            .protect(Arc::new(LoginGate))
            .cache("profile", Lifetime::Forever)
            .pass_data(DataPassing::sync(json!({"user": "ada"}))),
    );
    let settings = navigator.navigate(
        NavigationRequest::present(TargetSpec::direct(Screen { name: "settings" }))
            .animated(false)
            .embed(|inner| {
                let name = format!("container({})", inner.name());
                Arc::new(Container { inner, name }) as DestinationRef
            }),
    );
    let missing = navigator.navigate(NavigationRequest::push(TargetSpec::routed(
        router, "/nowhere",
    )));
    let cached_profile = navigator.navigate(
        NavigationRequest::push(profile)
            .cache("profile", Lifetime::Forever)
            .pass_data(DataPassing::from_future(|| async {
                Some(json!({"user": "ada", "refreshed": true}))
            })),
    );

    report("home", &home.outcome().await);
    report("profile", &first_profile.outcome().await);
    report("settings", &settings.outcome().await);
    report("missing", &missing.outcome().await);
    report("profile (cached)", &cached_profile.outcome().await);

    if let Some(item) = navigator.back(1, true).await {
        info!(screen = %item.destination().name(), "went back");
    }
    info!(
        history = navigator.history().len().await,
        cached = navigator.cache().len().await,
        "demo finished"
    );

    Ok(())
}
