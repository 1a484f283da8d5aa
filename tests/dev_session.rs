//! Dev orchestrator: port negotiation and compile reporting.

use bean_cli::dev::{negotiate_port, serve, DevNotice, DevOptions, TcpProbe};
use bean_cli::mock::{DevEvent, MockToolchain, RecordingReporter, ReportEvent};
use bean_cli::ProjectConfig;
use bean_protocol::{StatsDiagnostic, StatsReport};
use serde_json::json;
use std::net::TcpListener;

fn notices(reporter: &RecordingReporter) -> Vec<DevNotice> {
    reporter
        .events
        .iter()
        .filter_map(|event| match event {
            ReportEvent::Dev(notice) => Some(notice.clone()),
            _ => None,
        })
        .collect()
}

fn compiled(ms: u64) -> DevEvent {
    DevEvent::Done(StatsReport {
        time_ms: Some(ms),
        ..Default::default()
    })
}

// =============================================================================
// Port negotiation
// =============================================================================

#[test]
fn test_busy_port_is_substituted() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let taken = listener.local_addr().unwrap().port();

    let decision = negotiate_port(&TcpProbe, "127.0.0.1", taken).unwrap();

    assert_ne!(decision.port, taken);
    assert_eq!(decision.requested, taken);
    assert!(decision.substituted());
    assert!(TcpListener::bind(("127.0.0.1", decision.port)).is_ok());
}

#[test]
fn test_free_port_is_kept() {
    let free = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();

    let decision = negotiate_port(&TcpProbe, "127.0.0.1", free).unwrap();
    assert_eq!(decision.port, free);
    assert!(!decision.substituted());
}

#[test]
fn test_session_reports_substitution_and_pins_options() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let taken = listener.local_addr().unwrap().port();

    let mut project = ProjectConfig::with_defaults("/work/app");
    project.dev_server.host = Some("127.0.0.1".to_string());
    project.dev_server.overrides = json!({ "port": taken, "compress": true })
        .as_object()
        .cloned()
        .unwrap();

    let toolchain = MockToolchain::new();
    let mut reporter = RecordingReporter::default();
    let summary = serve(
        &project,
        &json!({}),
        &DevOptions {
            port: Some(taken),
            open: false,
        },
        &toolchain,
        &TcpProbe,
        &mut reporter,
    )
    .unwrap();

    assert_ne!(summary.address.port, taken);
    assert_eq!(
        notices(&reporter)[0],
        DevNotice::PortSubstituted {
            requested: taken,
            port: summary.address.port,
        }
    );
    let options = toolchain.last_server_options().unwrap();
    assert_eq!(options["port"], summary.address.port);
    assert_eq!(options["compress"], true);
    drop(listener);
}

// =============================================================================
// First versus later compiles
// =============================================================================

#[test]
fn test_only_first_success_prints_urls() {
    let project = ProjectConfig::with_defaults("/work/app");
    let toolchain = MockToolchain::new().with_dev_events(vec![
        compiled(1500),
        DevEvent::Invalid(Some("src/App.vue".to_string())),
        compiled(120),
        DevEvent::Invalid(Some("src/main.js".to_string())),
        compiled(90),
    ]);
    let mut reporter = RecordingReporter::default();

    let summary = serve(
        &project,
        &json!({}),
        &DevOptions {
            port: Some(8800),
            open: false,
        },
        &toolchain,
        &AnyPort,
        &mut reporter,
    )
    .unwrap();

    let notices = notices(&reporter);
    match &notices[0] {
        DevNotice::Ready { local, .. } => assert_eq!(local, "http://localhost:8800/"),
        other => panic!("expected ready notice, got {other:?}"),
    }
    assert_eq!(
        notices[1],
        DevNotice::Recompiling {
            file: Some("src/App.vue".to_string())
        }
    );
    assert_eq!(
        notices[2],
        DevNotice::Recompiled {
            elapsed: std::time::Duration::from_millis(120)
        }
    );
    assert_eq!(
        notices
            .iter()
            .filter(|n| matches!(n, DevNotice::Ready { .. }))
            .count(),
        1
    );
    assert_eq!(summary.compiles, 3);
}

#[test]
fn test_errors_reported_in_full_and_serving_continues() {
    let project = ProjectConfig::with_defaults("/work/app");
    let broken = StatsReport {
        errors: vec![
            StatsDiagnostic::new("Module not found: ./Missing.vue"),
            StatsDiagnostic::new("Unexpected token (3:4)"),
        ],
        ..Default::default()
    };
    let toolchain = MockToolchain::new().with_dev_events(vec![
        compiled(800),
        DevEvent::Invalid(None),
        DevEvent::Done(broken),
        DevEvent::Invalid(None),
        compiled(50),
    ]);
    let mut reporter = RecordingReporter::default();

    serve(
        &project,
        &json!({}),
        &DevOptions::default(),
        &toolchain,
        &AnyPort,
        &mut reporter,
    )
    .unwrap();

    let notices = notices(&reporter);
    let diagnostics = notices
        .iter()
        .find_map(|n| match n {
            DevNotice::Diagnostics(d) => Some(d.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(diagnostics.len(), 2);
    assert!(notices
        .iter()
        .any(|n| matches!(n, DevNotice::CompileFailed { errors: 2, .. })));
    assert!(matches!(
        notices[notices.len() - 2],
        DevNotice::Recompiled { .. }
    ));
}

struct AnyPort;

impl bean_cli::dev::PortProbe for AnyPort {
    fn is_free(&self, _host: &str, _port: u16) -> Result<bool, bean_cli::DevError> {
        Ok(true)
    }
}
