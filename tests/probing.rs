mod common;

use common::MockTlsServer;
use openssl::ssl::SslVersion;
use std::sync::Arc;
use std::time::Duration;
use tls_prober::engine::ProbeOrchestrator;
use tls_prober::input::{display_uri, StaticResolver};
use tls_prober::model::{InitPhase, ProbeSettings, ProtocolVersion, TargetSpec};
use tls_prober::output::{build_report, Severity};

fn settings() -> ProbeSettings {
    ProbeSettings {
        connect_timeout: Duration::from_millis(500),
        handshake_timeout: Duration::from_millis(1000),
    }
}

fn prober_for(server: &MockTlsServer, settings: ProbeSettings) -> ProbeOrchestrator {
    ProbeOrchestrator::new(TargetSpec::new("127.0.0.1", server.addr.port()), settings)
}

/// Lets the server's accept loop catch up with connects the kernel already
/// completed.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(150)).await;
}

const LEGACY: [ProtocolVersion; 4] = [
    ProtocolVersion::Ssl2,
    ProtocolVersion::Ssl3,
    ProtocolVersion::Tls10,
    ProtocolVersion::Tls11,
];

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn modern_server_negotiates_only_modern_versions() {
    let server = MockTlsServer::start(SslVersion::TLS1_2, SslVersion::TLS1_3).await;
    let prober = prober_for(&server, settings());

    assert!(prober.is_valid().await);
    assert_eq!(
        prober.capabilities().await,
        vec![ProtocolVersion::Tls12, ProtocolVersion::Tls13]
    );
    assert!(prober.is_supported(ProtocolVersion::Tls12).await);
    assert!(prober.is_supported(ProtocolVersion::Tls13).await);
    assert!(prober.is_supported(ProtocolVersion::NegotiateDefault).await);
    assert_eq!(
        prober.negotiated_default().await,
        Some(ProtocolVersion::Tls13)
    );
    for protocol in LEGACY {
        assert!(!prober.is_supported(protocol).await, "{protocol}");
    }
    assert_eq!(prober.address().await, Some(server.addr.ip()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn legacy_server_negotiates_only_obsolete_versions() {
    let server = MockTlsServer::start(SslVersion::TLS1, SslVersion::TLS1_1).await;
    let prober = prober_for(&server, settings());
    let uri = display_uri("https", prober.target()).unwrap();

    assert_eq!(
        prober.capabilities().await,
        vec![ProtocolVersion::Tls10, ProtocolVersion::Tls11]
    );
    assert!(prober.is_supported(ProtocolVersion::Tls10).await);
    assert!(prober.is_supported(ProtocolVersion::Tls11).await);

    let report = build_report(&prober, &uri, false).await;
    for protocol in [
        ProtocolVersion::Tls10,
        ProtocolVersion::Tls11,
        ProtocolVersion::Tls12,
        ProtocolVersion::Tls13,
    ] {
        let row = report
            .rows
            .iter()
            .find(|row| row.protocol == protocol)
            .unwrap();
        assert_eq!(row.severity, Severity::Warning, "{protocol}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn fixed_endpoint_keeps_the_host_name_for_sni() {
    let server = MockTlsServer::start(SslVersion::TLS1_2, SslVersion::TLS1_3).await;
    let prober = ProbeOrchestrator::new(TargetSpec::new("localhost", 443), settings())
        .with_resolver(Arc::new(StaticResolver(server.addr)));

    assert!(prober.is_valid().await);
    assert_eq!(prober.endpoint().await, Some(server.addr));
    assert_eq!(
        prober.capabilities().await,
        vec![ProtocolVersion::Tls12, ProtocolVersion::Tls13]
    );
    assert!(prober.phase().is_initialized());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn rejected_versions_read_as_unsupported() {
    let server = MockTlsServer::start(SslVersion::TLS1_2, SslVersion::TLS1_2).await;
    let prober = prober_for(&server, settings());

    assert_eq!(prober.capabilities().await, vec![ProtocolVersion::Tls12]);
    assert!(!prober.is_supported(ProtocolVersion::Tls13).await);
    assert_eq!(
        prober.negotiated_default().await,
        Some(ProtocolVersion::Tls12)
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn repeated_queries_do_not_reconnect() {
    let server = MockTlsServer::start(SslVersion::TLS1_2, SslVersion::TLS1_3).await;
    let prober = prober_for(&server, settings());

    let first = prober.capabilities().await;
    settle().await;
    let connections = server.connections();
    assert!(connections > 0);

    for _ in 0..3 {
        assert_eq!(prober.capabilities().await, first);
        for protocol in ProtocolVersion::ALL {
            prober.is_supported(protocol).await;
        }
    }
    settle().await;
    assert_eq!(server.connections(), connections);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_callers_observe_one_probing_pass() {
    let server = MockTlsServer::start(SslVersion::TLS1_2, SslVersion::TLS1_3).await;

    // Learn how many connections a single pass opens.
    let reference = prober_for(&server, settings());
    reference.capabilities().await;
    settle().await;
    let per_pass = server.connections();

    let prober = Arc::new(prober_for(&server, settings()));
    let callers: Vec<_> = (0..8)
        .map(|_| {
            let prober = Arc::clone(&prober);
            tokio::spawn(async move { prober.capabilities().await })
        })
        .collect();
    let results = futures::future::join_all(callers).await;

    let expected = vec![ProtocolVersion::Tls12, ProtocolVersion::Tls13];
    for result in results {
        assert_eq!(result.unwrap(), expected);
    }
    settle().await;
    assert_eq!(server.connections(), per_pass * 2);
    assert_eq!(prober.phase(), InitPhase::Initialized { valid: true });
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn slow_handshake_loses_the_race_and_is_torn_down() {
    let delay = Duration::from_millis(800);
    let server =
        MockTlsServer::start_with_delay(SslVersion::TLS1_2, SslVersion::TLS1_2, delay).await;
    let prober = prober_for(
        &server,
        ProbeSettings {
            connect_timeout: Duration::from_millis(500),
            handshake_timeout: Duration::from_millis(200),
        },
    );

    assert!(prober.is_valid().await);
    assert!(!prober.is_supported(ProtocolVersion::Tls12).await);
    assert!(prober.capabilities().await.is_empty());

    // Once the server finally answers, every client has already hung up.
    tokio::time::sleep(delay + Duration::from_millis(500)).await;
    assert_eq!(server.handshakes(), 0);
}

#[tokio::test]
async fn unresolvable_host_is_invalid() {
    let prober = ProbeOrchestrator::new(
        TargetSpec::new("no-such-host.invalid", 443),
        settings(),
    );

    assert!(!prober.is_valid().await);
    assert_eq!(prober.address().await, None);
    for protocol in ProtocolVersion::ALL {
        assert!(!prober.is_supported(protocol).await, "{protocol}");
    }
    assert!(prober.phase().is_initialized());
    assert_eq!(prober.phase(), InitPhase::Initialized { valid: false });
}

#[tokio::test]
async fn closed_port_is_valid_but_supports_nothing() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let prober = ProbeOrchestrator::new(TargetSpec::new("127.0.0.1", port), settings());
    assert!(prober.is_valid().await);
    assert!(prober.capabilities().await.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn report_tags_modern_server_as_good() {
    let server = MockTlsServer::start(SslVersion::TLS1_2, SslVersion::TLS1_3).await;
    let prober = prober_for(&server, settings());
    let uri = display_uri("https", prober.target()).unwrap();

    let report = build_report(&prober, &uri, false).await;

    assert!(report.valid);
    assert_eq!(report.target.addr.as_deref(), Some("127.0.0.1"));
    assert_eq!(report.preferred().count(), 3);
    assert_eq!(report.obsolete().count(), 4);
    for row in &report.rows {
        assert_eq!(row.severity, Severity::Good, "{}", row.protocol);
    }
    let default_row = report
        .rows
        .iter()
        .find(|row| row.protocol == ProtocolVersion::NegotiateDefault)
        .unwrap();
    assert_eq!(default_row.negotiated, Some(ProtocolVersion::Tls13));
}
