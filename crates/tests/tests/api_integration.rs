use std::sync::Arc;
use std::time::Duration;

use careconnect_client::{ApiClient, ApiError, CareApi, ChatRequest, ClientConfig};
use careconnect_core::{
    lookup_city, ChatRole, Coordinate, GuardianChoice, ServiceCategory, VerificationConfig,
};
use careconnect_observability::FlowMetrics;
use careconnect_sessions::{
    load_service_detail, ChatFlow, ServiceDiscoveryGate, SessionError, CHAT_GREETING,
};
use careconnect_storage::Catalog;
use careconnect_tests::{unreachable_base_url, StubBackend};

async fn client_for(stub: &StubBackend) -> ApiClient {
    let base_url = stub.spawn().await;
    ApiClient::new(&ClientConfig::new(format!("{base_url}/"))).unwrap()
}

#[tokio::test]
async fn chat_round_trip_carries_location() {
    let stub = StubBackend::default();
    let api = Arc::new(client_for(&stub).await);
    let metrics = FlowMetrics::shared();

    let mut flow = ChatFlow::new(api, VerificationConfig::default(), metrics.clone());
    flow.intake_mut().submit_age("41").unwrap();
    let bangalore = lookup_city("Bangalore").unwrap();
    flow.set_location(bangalore.clone()).unwrap();

    let entry = flow.send("I need a shelter tonight").await.unwrap();
    assert_eq!(entry.role, ChatRole::Assistant);
    assert_eq!(entry.content, "Nearby help for: I need a shelter tonight");

    let received = stub.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].message, "I need a shelter tonight");
    assert_eq!(received[0].latitude, bangalore.latitude);
    assert_eq!(received[0].longitude, bangalore.longitude);

    let transcript = flow.session().unwrap().transcript();
    assert_eq!(transcript.len(), 3);
    assert_eq!(transcript[0].content, CHAT_GREETING);

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.chat_sent_total, 1);
    assert_eq!(snapshot.chat_failed_total, 0);
}

#[tokio::test]
async fn non_success_status_surfaces_as_send_failure() {
    let stub = StubBackend::default();
    let api = client_for(&stub).await;

    let error = api
        .send_chat(&ChatRequest::new("boom", &Coordinate::new(19.076, 72.8777)))
        .await
        .unwrap_err();
    match &error {
        ApiError::Status {
            status,
            status_text,
        } => {
            assert_eq!(*status, 500);
            assert_eq!(status_text, "Internal Server Error");
        }
        other => panic!("expected status error, got {other:?}"),
    }
    assert_eq!(error.to_string(), "API error: Internal Server Error");

    let mut flow = ChatFlow::new(
        Arc::new(api),
        VerificationConfig::default(),
        FlowMetrics::shared(),
    );
    flow.intake_mut().submit_age("25").unwrap();
    flow.set_location(Coordinate::new(19.076, 72.8777)).unwrap();

    let error = flow.send("boom again").await.unwrap_err();
    assert!(matches!(error, SessionError::SendFailed { .. }));
    let session = flow.session().unwrap();
    assert_eq!(
        session.error().as_deref(),
        Some("Failed to send message. Please try again.")
    );
    assert_eq!(session.transcript().len(), 2);
    assert!(!session.is_pending());
    assert!(stub.received().is_empty());
}

#[tokio::test]
async fn malformed_reply_is_a_decode_error() {
    let stub = StubBackend::default();
    let api = client_for(&stub).await;

    let error = api
        .send_chat(&ChatRequest::new("garbled", &Coordinate::new(0.0, 0.0)))
        .await
        .unwrap_err();
    assert!(matches!(error, ApiError::Decode(_)), "got {error:?}");
}

#[tokio::test]
async fn service_detail_loads_and_reports_missing_ids() {
    let stub = StubBackend::default();
    let api = client_for(&stub).await;
    let metrics = FlowMetrics::shared();

    let record = load_service_detail(&api, "3", &metrics).await.unwrap();
    assert_eq!(record.name, "Community Health Center");
    assert_eq!(record.category, ServiceCategory::Medical);

    let error = load_service_detail(&api, "99", &metrics).await.unwrap_err();
    assert_eq!(
        error.to_string(),
        "Failed to load service details. Please try again."
    );
    match error {
        SessionError::DetailUnavailable { id, source } => {
            assert_eq!(id, "99");
            assert_eq!(source.status(), Some(404));
        }
        other => panic!("expected detail failure, got {other:?}"),
    }
    assert_eq!(metrics.snapshot().detail_fetch_total, 2);
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    let base_url = unreachable_base_url().await;
    let api = ApiClient::new(&ClientConfig::new(base_url)).unwrap();

    let error = api.fetch_service("1").await.unwrap_err();
    assert!(matches!(error, ApiError::Transport(_)), "got {error:?}");
}

#[tokio::test]
async fn discovery_over_sqlite_with_unaccompanied_minor() {
    let catalog = Arc::new(Catalog::sqlite("sqlite::memory:").await.unwrap());
    let metrics = FlowMetrics::shared();
    let mut gate = ServiceDiscoveryGate::new(
        catalog,
        VerificationConfig {
            advisory_dwell: Duration::from_millis(10),
        },
        metrics.clone(),
    );

    gate.intake_mut().submit_age("15").unwrap();
    gate.intake_mut()
        .select_guardian(GuardianChoice::No)
        .unwrap();
    gate.intake_mut()
        .confirm_guardian(std::time::Instant::now())
        .unwrap();
    assert!(gate.intake().advisory().is_some());
    assert!(gate.intake().age().is_none());

    let record = gate.intake_mut().await_advisory().await.unwrap();
    assert_eq!(record.has_guardian(), Some(false));

    gate.set_location(lookup_city("delhi").unwrap());
    gate.select_category(ServiceCategory::Other).unwrap();
    let ids = gate
        .search()
        .await
        .unwrap()
        .iter()
        .map(|record| record.id.clone())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["1", "2"]);

    gate.select_category(ServiceCategory::Food).unwrap();
    let results = gate.search().await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].name, "City Food Bank");

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.guardian_advisories_total, 1);
    assert_eq!(snapshot.searches_total, 2);
    assert_eq!(snapshot.search_fallback_total, 1);
}
