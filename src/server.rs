//! ==============================================================================
//! server.rs - json api + dashboard
//! ==============================================================================
//!
//! routes:
//!     POST /api/data       {"data": "particle,pm25,hcho,co2,temp,hum,voc,seq"}
//!     GET  /api/status     latest reading + sensor health
//!     GET  /api/history    ?hours=&limit=   readings, newest first
//!     GET  /api/stats      ?hours=          per-metric stats + anomalies
//!     GET  /api/analysis   ?hours=          correlations, trend, aqi, advice
//!     GET  /*              dashboard static assets (web/dist)
//!
//! query parameters are lenient: anything that is not a positive integer
//! is treated as absent.
//!
//! ==============================================================================

use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::domain::Reading;
use crate::error::SensorError;
use crate::service::SensorService;

// ==============================================================================
// router
// ==============================================================================

pub fn router(service: SensorService, static_dir: &Path) -> Router {
    Router::new()
        .route("/api/data", post(ingest_handler))
        .route("/api/status", get(status_handler))
        .route("/api/history", get(history_handler))
        .route("/api/stats", get(stats_handler))
        .route("/api/analysis", get(analysis_handler))
        .fallback_service(ServeDir::new(static_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

pub async fn run_server(service: SensorService, bind: &str, static_dir: &Path) -> Result<()> {
    let app = router(service, static_dir);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!("[STARTUP] ✓ Dashboard live at http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("[SHUTDOWN] Ctrl-C received, draining connections");
        })
        .await?;
    Ok(())
}

// ==============================================================================
// errors
// ==============================================================================

pub enum ApiError {
    /// request body was not the expected json envelope
    BadRequest(String),
    /// a query operation failed
    Read(SensorError),
    /// storing an uploaded reading failed
    Write(SensorError),
}

impl From<SensorError> for ApiError {
    fn from(e: SensorError) -> Self {
        ApiError::Read(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (error, failed) = match self {
            ApiError::BadRequest(message) => return error_response(StatusCode::BAD_REQUEST, message),
            ApiError::Read(e) => (e, "获取数据失败"),
            ApiError::Write(e) => (e, "保存数据失败"),
        };

        match error {
            e @ SensorError::Format(_) => error_response(StatusCode::BAD_REQUEST, e.to_string()),
            e @ SensorError::NotFound => error_response(StatusCode::NOT_FOUND, e.to_string()),
            // driver detail stays in the log
            e @ SensorError::Store(_) => {
                tracing::error!("[STORE] {}: {}", failed, e);
                error_response(StatusCode::INTERNAL_SERVER_ERROR, failed.to_string())
            }
        }
    }
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(serde_json::json!({"status": "error", "message": message}))).into_response()
}

// ==============================================================================
// handlers
// ==============================================================================

#[derive(Deserialize)]
struct IngestRequest {
    data: String,
}

#[derive(Serialize)]
struct IngestResponse {
    status: &'static str,
    data: Reading,
    message: &'static str,
}

/// device upload endpoint
/// POST /api/data with {"data": "..."}; content-type is not required
async fn ingest_handler(
    State(service): State<SensorService>,
    body: String,
) -> Result<Json<IngestResponse>, ApiError> {
    let request: IngestRequest = serde_json::from_str(&body)
        .map_err(|e| ApiError::BadRequest(format!("invalid json body: {}", e)))?;

    let reading = service.ingest(&request.data).await.map_err(ApiError::Write)?;
    let message = if reading.is_valid { "传感器工作正常" } else { "传感器可能存在问题" };
    Ok(Json(IngestResponse { status: "success", data: reading, message }))
}

async fn status_handler(State(service): State<SensorService>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(service.current_status().await?))
}

#[derive(Deserialize, Default)]
struct WindowParams {
    hours: Option<String>,
    limit: Option<String>,
}

fn positive(raw: &Option<String>) -> Option<i64> {
    raw.as_deref()
        .and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|v| *v > 0)
}

async fn history_handler(
    State(service): State<SensorService>,
    Query(params): Query<WindowParams>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(service.history(positive(&params.hours), positive(&params.limit)).await?))
}

async fn stats_handler(
    State(service): State<SensorService>,
    Query(params): Query<WindowParams>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(service.stats(positive(&params.hours)).await?))
}

async fn analysis_handler(
    State(service): State<SensorService>,
    Query(params): Query<WindowParams>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(service.analysis(positive(&params.hours)).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{contract, MemoryStore};
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn app() -> Router {
        let service = SensorService::open(Arc::new(MemoryStore::new()), 24, false).await.unwrap();
        router(service, Path::new("web/dist"))
    }

    async fn call(app: &Router, method: Method, uri: &str, body: &str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[test]
    fn lenient_query_numbers() {
        assert_eq!(positive(&Some("12".into())), Some(12));
        assert_eq!(positive(&Some("0".into())), None);
        assert_eq!(positive(&Some("-4".into())), None);
        assert_eq!(positive(&Some("abc".into())), None);
        assert_eq!(positive(&None), None);
    }

    #[tokio::test]
    async fn ingest_then_status() {
        let app = app().await;

        let (status, json) = call(&app, Method::POST, "/api/data", r#"{"data":"1000,12,20,500,22,50,100,1"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "success");
        assert_eq!(json["message"], "传感器工作正常");
        assert_eq!(json["data"]["sequence_num"], 1);
        assert_eq!(json["data"]["is_valid"], true);

        let (status, json) = call(&app, Method::POST, "/api/data", r#"{"data":"1000,12,20,500,22,50,100,1"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "传感器可能存在问题");

        let (status, json) = call(&app, Method::GET, "/api/status", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["sensor_status"], "异常");
        assert_eq!(json["last_sequence"], 1);
        assert_eq!(json["last_data"]["is_valid"], false);
    }

    #[tokio::test]
    async fn status_before_any_reading_is_not_found() {
        let app = app().await;
        let (status, json) = call(&app, Method::GET, "/api/status", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["status"], "error");
    }

    #[tokio::test]
    async fn bad_payloads_are_rejected() {
        let app = app().await;

        let (status, _) = call(&app, Method::POST, "/api/data", "not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, json) = call(&app, Method::POST, "/api/data", r#"{"data":"1,2,3"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["message"].as_str().unwrap().contains("got 3"));

        let (status, json) = call(&app, Method::POST, "/api/data", r#"{"data":"1,2,3,4,5,6,oops,8"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["message"].as_str().unwrap().contains("field 7"));
    }

    #[tokio::test]
    async fn ingest_requires_post() {
        let app = app().await;
        let (status, _) = call(&app, Method::GET, "/api/data", "").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn history_stats_and_analysis() {
        let app = app().await;
        for seq in 1..=3 {
            let body = format!(r#"{{"data":"1000,{},20,800,22,50,100,{}"}}"#, seq * 10, seq);
            call(&app, Method::POST, "/api/data", &body).await;
        }

        let (status, json) = call(&app, Method::GET, "/api/history?limit=2&hours=abc", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["count"], 2);
        assert_eq!(json["data"][0]["sequence_num"], 3);

        let (status, json) = call(&app, Method::GET, "/api/stats?hours=1", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["hours"], 1);
        assert_eq!(json["count"], 3);
        assert_eq!(json["stats"]["pm25"]["avg"], 20.0);
        assert_eq!(json["anomalies"].as_array().unwrap().len(), 0);

        let (status, json) = call(&app, Method::GET, "/api/analysis", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["hours"], 24);
        assert_eq!(json["correlations"]["pm25_particle"], 0.0);
        assert_eq!(json["aqi"]["co2_level"], "一般");
        assert_eq!(json["latest"]["sequence_num"], 3);
    }

    #[tokio::test]
    async fn store_failures_are_500_without_driver_detail() {
        let store = Arc::new(contract::UnavailableStore { restore: true });
        let service = SensorService::open(store, 24, false).await.unwrap();
        let app = router(service, Path::new("web/dist"));

        let (status, json) = call(&app, Method::POST, "/api/data", r#"{"data":"0,0,0,0,0,0,0,1"}"#).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "保存数据失败");

        for uri in ["/api/status", "/api/stats", "/api/history", "/api/analysis"] {
            let (status, json) = call(&app, Method::GET, uri, "").await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
            assert_eq!(json["status"], "error");
            assert_eq!(json["message"], "获取数据失败");
        }
    }

    #[tokio::test]
    async fn non_finite_upload_is_a_bad_request() {
        let app = app().await;
        let (status, json) = call(&app, Method::POST, "/api/data", r#"{"data":"1000,NaN,20,500,22,50,100,5"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["message"].as_str().unwrap().contains("field 2"));
    }

    #[tokio::test]
    async fn empty_windows_say_so() {
        let app = app().await;
        let (status, json) = call(&app, Method::GET, "/api/stats", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "暂无数据");
        assert_eq!(json["hours"], 24);

        let (_, json) = call(&app, Method::GET, "/api/analysis?hours=0", "").await;
        assert_eq!(json["message"], "暂无数据");
    }
}
