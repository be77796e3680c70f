use serde::{Deserialize, Serialize};

use crate::server::ServerState;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub started_at: String,
    pub backend: String,
    pub store: String,
}

pub async fn health_report(state: &ServerState) -> HealthReport {
    let store = match state.store.ping().await {
        Ok(()) => "ok",
        Err(err) => {
            tracing::warn!(error = %err, "store ping failed");
            "unavailable"
        }
    };
    HealthReport {
        status: "ok".to_string(),
        version: state.version.to_string(),
        uptime_seconds: state.uptime().as_secs(),
        started_at: state.started_at.to_rfc3339(),
        backend: state.store.backend_name().to_string(),
        store: store.to_string(),
    }
}

pub fn health_summary(report: &HealthReport) -> String {
    format!(
        "{} (v{}, uptime {}s, {} store: {})",
        report.status, report.version, report.uptime_seconds, report.backend, report.store
    )
}
