use axum::{Json, extract::State, http::StatusCode};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::error;

use crate::collector::Ds389Collector;
use crate::formatter::JsonFormatter;
use crate::formatter::json::{ErrorInfo, MetricSampleJson};

/// Общее состояние HTTP сервера
pub struct AppState {
    pub collector: Ds389Collector,
    /// Циклы по одному серверу не должны пересекаться
    pub cycle: Mutex<()>,
}

impl AppState {
    pub fn new(collector: Ds389Collector) -> Arc<Self> {
        Arc::new(Self {
            collector,
            cycle: Mutex::new(()),
        })
    }
}

/// Выполняет один цикл опроса по запросу
pub async fn handle_metrics(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MetricSampleJson>, (StatusCode, Json<ErrorInfo>)> {
    let _cycle = state.cycle.lock().await;

    match state.collector.collect_sample().await {
        Ok(sample) => Ok(Json(JsonFormatter::format_sample(&sample))),
        Err(e) => {
            error!(kind = e.kind().as_str(), "цикл опроса прерван: {}", e);
            Err((StatusCode::BAD_GATEWAY, Json(JsonFormatter::format_error(&e))))
        }
    }
}
