use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use placement_hub::workflows::placement::{portal_router, Catalog, PlacementPortal};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_portal_routes<C>(portal: Arc<PlacementPortal<C>>) -> axum::Router
where
    C: Catalog + 'static,
{
    portal_router(portal)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{seed_catalog, DEMO_STUDENT};
    use axum::body::Body;
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use placement_hub::clock::{FixedClock, SequentialIds};
    use placement_hub::workflows::placement::{InMemoryCatalog, MatchPolicy};
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    fn portal() -> Arc<PlacementPortal<InMemoryCatalog>> {
        let today = chrono::NaiveDate::from_ymd_opt(2023, 11, 10).expect("valid date");
        Arc::new(PlacementPortal::new(
            seed_catalog(today).expect("seed loads"),
            Arc::new(FixedClock::new(today)),
            Arc::new(SequentialIds::new()),
            MatchPolicy::default(),
        ))
    }

    fn state(ready: bool) -> AppState {
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        }
    }

    async fn get(router: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = router
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn readiness_reports_initializing_until_bound() {
        let router = with_portal_routes(portal()).layer(Extension(state(false)));
        let (status, body) = get(router, "/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "initializing");

        let router = with_portal_routes(portal()).layer(Extension(state(true)));
        let (status, _) = get(router, "/ready").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn seeded_student_sees_frontend_listing() {
        let router = with_portal_routes(portal()).layer(Extension(state(true)));
        let (status, body) = get(
            router,
            &format!("/api/v1/students/{DEMO_STUDENT}/recommendations"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["opportunity"]["id"], "opp-1");
        assert_eq!(body[0]["already_applied"], true);
    }

    #[tokio::test]
    async fn healthcheck_is_static() {
        let Json(body) = healthcheck().await;
        assert_eq!(body["status"], "ok");
    }
}
