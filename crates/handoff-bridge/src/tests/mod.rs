//! Crate-level tests for the open algorithm and its dispatch surface.

use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use handoff_config::ContentTypePolicy;
use mockall::mock;
use mockall::predicate::always;
use rstest::{fixture, rstest};
use serde_json::json;
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use url::Url;

use crate::dispatch::{BridgeRequest, MethodTable, OPEN_FILE_METHOD};
use crate::{
    AccessGrant, ChooserOutcome, ContentType, ContentTypeResolver, FailureKind, HostError,
    OpenBridge, OpenRequest, OpenRoute, ResolveError, ResourceHandle, ResourceResolver, Viewer,
    ViewerHost,
};


const REPORT: &str = "/srv/docs/report.pdf";

mock! {
    pub Resolver {}
    impl ResourceResolver for Resolver {
        fn resolve(&self, path: &Utf8Path) -> Result<ResourceHandle, ResolveError>;
    }
}

mock! {
    pub Host {}
    impl ViewerHost for Host {
        fn find_viewer(&self, content_type: &ContentType) -> Result<Option<Viewer>, HostError>;
        fn launch(
            &self,
            viewer: &Viewer,
            resource: &ResourceHandle,
            content_type: &ContentType,
        ) -> Result<(), HostError>;
        fn launch_chooser(
            &self,
            resource: &ResourceHandle,
            content_type: &ContentType,
            title: &str,
        ) -> Result<ChooserOutcome, HostError>;
    }
}

fn handle_for(path: &Utf8Path) -> ResourceHandle {
    let uri = Url::from_file_path(path.as_std_path()).expect("absolute test path");
    ResourceHandle::new(
        path.to_path_buf(),
        uri,
        Utf8PathBuf::from("/srv/docs"),
        AccessGrant::read_only(Duration::from_secs(30)),
    )
}

fn host_failure() -> HostError {
    HostError::Spawn {
        program: String::from("xdg-mime"),
        source: Arc::new(io::Error::other("registry offline")),
    }
}

#[fixture]
fn resolver() -> MockResolver {
    let mut resolver = MockResolver::new();
    resolver
        .expect_resolve()
        .returning(|path| Ok(handle_for(path)));
    resolver
}

fn bridge(resolver: MockResolver, host: MockHost) -> OpenBridge<MockResolver, MockHost> {
    OpenBridge::new(
        resolver,
        host,
        ContentTypeResolver::new(ContentTypePolicy::Fixed, ContentType::new("application/pdf")),
    )
}

fn expect_viewer(host: &mut MockHost, viewer: Option<&'static str>) {
    host.expect_find_viewer()
        .withf(|content_type| content_type.as_str() == "application/pdf")
        .once()
        .returning(move |_| Ok(viewer.map(Viewer::new)));
}

fn expect_chooser(host: &mut MockHost, result: Result<ChooserOutcome, HostError>) {
    host.expect_launch_chooser()
        .withf(|_, content_type, title| content_type.is_wildcard() && title == "Open file with")
        .once()
        .return_once(move |_, _, _| result);
}

#[rstest]
#[case(OpenRequest::without_path())]
#[case(OpenRequest::new(""))]
fn missing_path_is_rejected_before_platform_work(#[case] request: OpenRequest) {
    let mut resolver = MockResolver::new();
    resolver.expect_resolve().never();
    let mut host = MockHost::new();
    host.expect_find_viewer().never();
    host.expect_launch_chooser().never();

    let failure = bridge(resolver, host).open(&request).expect_err("rejected");

    assert_eq!(failure.kind(), FailureKind::InvalidArgument);
    assert_eq!(failure.message(), "Path is required");
}

#[rstest]
fn registered_viewer_is_launched_without_fallback(resolver: MockResolver) {
    let mut host = MockHost::new();
    expect_viewer(&mut host, Some("evince.desktop"));
    host.expect_launch()
        .withf(|viewer, resource, _| {
            viewer.id() == "evince.desktop" && resource.path().as_str() == REPORT
        })
        .once()
        .returning(|_, _, _| Ok(()));
    host.expect_launch_chooser().never();

    let route = bridge(resolver, host)
        .open(&OpenRequest::new(REPORT))
        .expect("opened");

    assert_eq!(route, OpenRoute::Primary);
}

#[rstest]
fn missing_registration_falls_back_to_chooser(resolver: MockResolver) {
    let mut host = MockHost::new();
    expect_viewer(&mut host, None);
    host.expect_launch().never();
    expect_chooser(&mut host, Ok(ChooserOutcome::Launched));

    let route = bridge(resolver, host)
        .open(&OpenRequest::new(REPORT))
        .expect("opened");

    assert_eq!(route, OpenRoute::Fallback);
}

#[rstest]
fn failing_query_falls_back_to_chooser(resolver: MockResolver) {
    let mut host = MockHost::new();
    host.expect_find_viewer()
        .with(always())
        .once()
        .returning(|_| Err(host_failure()));
    expect_chooser(&mut host, Ok(ChooserOutcome::Launched));

    let route = bridge(resolver, host)
        .open(&OpenRequest::new(REPORT))
        .expect("opened");

    assert_eq!(route, OpenRoute::Fallback);
}

#[rstest]
fn no_viewer_anywhere_is_reported(resolver: MockResolver) {
    let mut host = MockHost::new();
    expect_viewer(&mut host, None);
    expect_chooser(&mut host, Ok(ChooserOutcome::NoViewers));

    let failure = bridge(resolver, host)
        .open(&OpenRequest::new(REPORT))
        .expect_err("no viewer");

    assert_eq!(failure.kind(), FailureKind::NoCapableViewer);
}

#[rstest]
fn unresolvable_path_never_reaches_the_host() {
    let mut resolver = MockResolver::new();
    resolver.expect_resolve().once().returning(|path| {
        Err(ResolveError::NotAFile {
            path: path.to_path_buf(),
        })
    });
    let mut host = MockHost::new();
    host.expect_find_viewer().never();
    host.expect_launch().never();
    host.expect_launch_chooser().never();

    let failure = bridge(resolver, host)
        .open(&OpenRequest::new(REPORT))
        .expect_err("unresolvable");

    assert_eq!(failure.kind(), FailureKind::ResourceResolutionError);
}

#[rstest]
fn launch_failure_is_a_platform_error(resolver: MockResolver) {
    let mut host = MockHost::new();
    expect_viewer(&mut host, Some("evince.desktop"));
    host.expect_launch()
        .once()
        .returning(|_, _, _| Err(host_failure()));
    host.expect_launch_chooser().never();

    let failure = bridge(resolver, host)
        .open(&OpenRequest::new(REPORT))
        .expect_err("launch fails");

    assert_eq!(failure.kind(), FailureKind::PlatformError);
    assert!(failure.message().contains("registry offline"));
}

#[rstest]
fn chooser_failure_is_a_platform_error(resolver: MockResolver) {
    let mut host = MockHost::new();
    expect_viewer(&mut host, None);
    expect_chooser(&mut host, Err(host_failure()));

    let failure = bridge(resolver, host)
        .open(&OpenRequest::new(REPORT))
        .expect_err("chooser fails");

    assert_eq!(failure.kind(), FailureKind::PlatformError);
}

#[rstest]
fn custom_chooser_title_reaches_the_host(resolver: MockResolver) {
    let mut host = MockHost::new();
    expect_viewer(&mut host, None);
    host.expect_launch_chooser()
        .withf(|_, _, title| title == "Choose a reader")
        .once()
        .returning(|_, _, _| Ok(ChooserOutcome::Launched));

    let route = bridge(resolver, host)
        .with_chooser_title("Choose a reader")
        .open(&OpenRequest::new(REPORT))
        .expect("opened");

    assert_eq!(route, OpenRoute::Fallback);
}

#[rstest]
fn open_file_method_maps_missing_path_to_invalid_argument() {
    let table = MethodTable::for_bridge();
    let bridge = bridge(MockResolver::new(), MockHost::new());

    let response = table.dispatch(&bridge, &BridgeRequest::new(OPEN_FILE_METHOD));

    assert_eq!(
        serde_json::to_value(&response).expect("serialize"),
        json!({"kind": "error", "code": "INVALID_ARGUMENT", "message": "Path is required"})
    );
}

#[rstest]
fn open_file_method_reports_no_viewer_as_file_open_error(resolver: MockResolver) {
    let mut host = MockHost::new();
    expect_viewer(&mut host, None);
    expect_chooser(&mut host, Ok(ChooserOutcome::NoViewers));
    let table = MethodTable::for_bridge();
    let bridge = bridge(resolver, host);

    let request = BridgeRequest::new(OPEN_FILE_METHOD).with_argument("path", REPORT);
    let response = serde_json::to_value(table.dispatch(&bridge, &request)).expect("serialize");

    assert_eq!(response["kind"], "error");
    assert_eq!(response["code"], "FILE_OPEN_ERROR");
    assert_eq!(response["message"], "Unable to open file");
    assert!(
        response["detail"]
            .as_str()
            .is_some_and(|detail| detail.starts_with("no capable viewer"))
    );
}

#[rstest]
fn unknown_methods_are_not_implemented() {
    let table = MethodTable::for_bridge();
    let bridge = bridge(MockResolver::new(), MockHost::new());

    let response = table.dispatch(&bridge, &BridgeRequest::new("shareFile"));

    assert_eq!(
        serde_json::to_value(&response).expect("serialize"),
        json!({"kind": "not_implemented", "method": "shareFile"})
    );
}

/// Records the field names of every event it sees.
#[derive(Clone, Default)]
struct FieldNames(Arc<Mutex<Vec<Vec<&'static str>>>>);

impl<S: Subscriber> Layer<S> for FieldNames {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let names = event.fields().map(|field| field.name()).collect();
        self.0.lock().expect("field names lock").push(names);
    }
}

#[rstest]
fn failure_log_keeps_a_single_message_field() {
    let recorder = FieldNames::default();
    let subscriber = tracing_subscriber::registry().with(recorder.clone());
    let host = MockHost::new();

    tracing::subscriber::with_default(subscriber, || {
        bridge(MockResolver::new(), host)
            .open(&OpenRequest::without_path())
            .expect_err("rejected");
    });

    let events = recorder.0.lock().expect("field names lock").clone();
    let failure = events
        .iter()
        .find(|names| names.contains(&"kind"))
        .expect("failure event");
    assert_eq!(failure.iter().filter(|name| **name == "message").count(), 1);
    assert!(failure.contains(&"detail"));
}
