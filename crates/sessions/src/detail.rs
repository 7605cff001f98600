use careconnect_client::CareApi;
use careconnect_core::ServiceRecord;
use careconnect_observability::FlowMetrics;
use tracing::{instrument, warn};

use crate::error::SessionError;

#[instrument(skip(api, metrics))]
pub async fn load_service_detail<A: CareApi>(
    api: &A,
    id: &str,
    metrics: &FlowMetrics,
) -> Result<ServiceRecord, SessionError> {
    metrics.inc_detail_fetch();
    api.fetch_service(id).await.map_err(|source| {
        warn!(error = %source, "service details failed to load");
        SessionError::DetailUnavailable {
            id: id.to_string(),
            source,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use careconnect_client::{ApiError, ChatReply, ChatRequest};
    use careconnect_storage::fixture_services;

    struct FixtureApi;

    impl CareApi for FixtureApi {
        async fn send_chat(&self, _request: &ChatRequest) -> Result<ChatReply, ApiError> {
            Ok(ChatReply {
                reply: String::new(),
            })
        }

        async fn fetch_service(&self, id: &str) -> Result<ServiceRecord, ApiError> {
            fixture_services()
                .into_iter()
                .find(|record| record.id == id)
                .ok_or(ApiError::Status {
                    status: 404,
                    status_text: "Not Found".to_string(),
                })
        }
    }

    #[tokio::test]
    async fn loads_known_service_and_reports_generic_failure() {
        let metrics = FlowMetrics::default();
        let record = load_service_detail(&FixtureApi, "4", &metrics).await.unwrap();
        assert_eq!(record.name, "Mental Wellness Hub");
        assert_eq!(record.category.label(), "Mental Health Support");

        let error = load_service_detail(&FixtureApi, "99", &metrics)
            .await
            .unwrap_err();
        assert_eq!(
            error.to_string(),
            "Failed to load service details. Please try again."
        );
        assert!(matches!(error, SessionError::DetailUnavailable { ref id, .. } if id == "99"));
        assert_eq!(metrics.snapshot().detail_fetch_total, 2);
    }
}
