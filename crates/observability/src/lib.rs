use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

#[derive(Debug, Default)]
pub struct FlowMetrics {
    verifications_total: AtomicU64,
    guardian_advisories_total: AtomicU64,
    searches_total: AtomicU64,
    search_fallback_total: AtomicU64,
    chat_sent_total: AtomicU64,
    chat_failed_total: AtomicU64,
    detail_fetch_total: AtomicU64,
    chat_latency_millis: AtomicU64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub verifications_total: u64,
    pub guardian_advisories_total: u64,
    pub searches_total: u64,
    pub search_fallback_total: u64,
    pub chat_sent_total: u64,
    pub chat_failed_total: u64,
    pub detail_fetch_total: u64,
    pub avg_chat_latency_millis: f64,
}

impl FlowMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_verification(&self) {
        self.verifications_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_guardian_advisory(&self) {
        self.guardian_advisories_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_search(&self, fell_back: bool) {
        self.searches_total.fetch_add(1, Ordering::Relaxed);
        if fell_back {
            self.search_fallback_total.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn inc_chat_sent(&self) {
        self.chat_sent_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_chat_failed(&self) {
        self.chat_failed_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_detail_fetch(&self) {
        self.detail_fetch_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn observe_chat_latency(&self, duration: Duration) {
        self.chat_latency_millis
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let sent = self.chat_sent_total.load(Ordering::Relaxed);
        let latency = self.chat_latency_millis.load(Ordering::Relaxed);

        MetricsSnapshot {
            verifications_total: self.verifications_total.load(Ordering::Relaxed),
            guardian_advisories_total: self.guardian_advisories_total.load(Ordering::Relaxed),
            searches_total: self.searches_total.load(Ordering::Relaxed),
            search_fallback_total: self.search_fallback_total.load(Ordering::Relaxed),
            chat_sent_total: sent,
            chat_failed_total: self.chat_failed_total.load(Ordering::Relaxed),
            detail_fetch_total: self.detail_fetch_total.load(Ordering::Relaxed),
            avg_chat_latency_millis: if sent == 0 {
                0.0
            } else {
                latency as f64 / sent as f64
            },
        }
    }
}

pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=info,careconnect_sessions=info,careconnect_client=info",
                service_name
            ))
        });

        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_span_list(true)
            .with_writer(std::io::stderr)
            .init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_averages_latency_over_sent_messages() {
        let metrics = FlowMetrics::default();
        assert_eq!(metrics.snapshot().avg_chat_latency_millis, 0.0);

        metrics.inc_chat_sent();
        metrics.inc_chat_sent();
        metrics.observe_chat_latency(Duration::from_millis(30));
        metrics.observe_chat_latency(Duration::from_millis(10));
        metrics.inc_search(true);
        metrics.inc_search(false);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.avg_chat_latency_millis, 20.0);
        assert_eq!(snapshot.searches_total, 2);
        assert_eq!(snapshot.search_fallback_total, 1);
        assert!(serde_json::to_value(&snapshot).unwrap().get("chat_sent_total").is_some());
    }
}
