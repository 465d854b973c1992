use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;
use tokio::time::{Duration, timeout};

use super::AppState;
use crate::collector::DevicePoller;
use crate::config::AppConfig;
use crate::formatter::JsonFormatter;
use crate::models::Snmpv2c;
use crate::snmp::SnmpFetcher;

/// Опрашивает PDU по адресу из запроса и отдаёт JSON отчёт цикла
pub async fn handle_poll(
    State(state): State<Arc<AppState>>,
    Json(params): Json<Snmpv2c>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if params.ip.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "поле ip не может быть пустым".to_string()));
    }

    let target = params.target();
    let community = params
        .community
        .clone()
        .unwrap_or_else(|| state.config.settings.auth.v2c.community.clone());

    let fetcher = Arc::new(SnmpFetcher::from_config(
        &state.config,
        &target,
        community.into_bytes(),
    ));
    let poller = DevicePoller::new(Arc::clone(&state.registry), fetcher, target);

    match timeout(poll_deadline(&state.config), poller.poll()).await {
        Ok(report) => Ok(Json(JsonFormatter::format_report(&report))),
        Err(_) => Err((
            StatusCode::GATEWAY_TIMEOUT,
            "SNMP request timeout".to_string(),
        )),
    }
}

/// Общий предел цикла. Разделы идут параллельно, но перед ними два
/// последовательных запроса (sysObjectID и detect), каждый со своими повторами
fn poll_deadline(config: &AppConfig) -> Duration {
    let attempts = u64::from(config.settings.connection.retries) + 1;
    Duration::from_secs(config.get_timeout().saturating_mul(attempts).saturating_mul(3))
}
