use crate::infra::{AppState, Services};
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get};
use axum::{Extension, Json, Router};
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use valve_estimate::attachments::{attachment_router, AttachmentStore};
use valve_estimate::error::AppError;
use valve_estimate::estimates::{estimate_router, EstimateNo};
use valve_estimate::master::master_router;

pub(crate) fn with_service_routes<S>(services: Arc<Services<S>>) -> Router
where
    S: AttachmentStore + 'static,
{
    let lifecycle = Router::new()
        .route(
            "/api/v1/estimates/:estimate_no",
            delete(delete_estimate_endpoint::<S>),
        )
        .with_state(services.clone());

    master_router(services.master.clone())
        .merge(estimate_router(services.estimates.clone()))
        .merge(attachment_router(services.attachments.clone()))
        .merge(lifecycle)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
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

/// Drops a draft estimate together with its uploaded files.
pub(crate) async fn delete_estimate_endpoint<S>(
    State(services): State<Arc<Services<S>>>,
    Path(estimate_no): Path<String>,
) -> Result<StatusCode, AppError>
where
    S: AttachmentStore + 'static,
{
    let estimate_no = EstimateNo(estimate_no);
    services.estimates.delete(&estimate_no)?;
    let removed = services.attachments.purge(&estimate_no)?;
    info!(%estimate_no, attachments = removed, "estimate removed");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::build_services;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::Value;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;
    use valve_estimate::estimates::{CustomerInfo, NewEstimate, NewEstimateItem, TagSpec};
    use valve_estimate::memory::InMemoryAttachmentStore;

    fn app(ready: bool) -> (Router, Arc<Services<InMemoryAttachmentStore>>, Arc<InMemoryAttachmentStore>) {
        let store = Arc::new(InMemoryAttachmentStore::default());
        let services =
            Arc::new(build_services(store.clone(), 1024, true).expect("services build"));
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        let router = with_service_routes(services.clone()).layer(Extension(state));
        (router, services, store)
    }

    fn draft(services: &Services<InMemoryAttachmentStore>) -> EstimateNo {
        let sheet = services
            .estimates
            .create(NewEstimate {
                customer: CustomerInfo {
                    company: "Hanil Petrochem".to_string(),
                    contact: "J. Park".to_string(),
                    email: None,
                    phone: None,
                },
                project: "Tank Farm".to_string(),
                remarks: None,
            })
            .expect("create");
        sheet.estimate_no
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json")
    }

    #[tokio::test]
    async fn health_and_readiness_report_state() {
        let (router, _, _) = app(false);

        let response = router
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
            .await
            .expect("health");
        assert_eq!(response.status(), StatusCode::OK);

        let response = router
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("ready");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_json(response).await["status"], "initializing");
    }

    #[tokio::test]
    async fn seeded_catalog_is_served() {
        let (router, _, _) = app(true);

        let response = router
            .oneshot(
                Request::get("/api/v1/master/body/size?parent=inch")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("sizes");
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let codes: Vec<&str> = body
            .as_array()
            .expect("array")
            .iter()
            .filter_map(|row| row["code"].as_str())
            .collect();
        assert_eq!(codes, vec!["0.5IN", "1IN", "2IN", "4IN"]);
    }

    #[tokio::test]
    async fn deleting_a_draft_purges_its_attachments() {
        let (router, services, store) = app(true);
        let estimate_no = draft(&services);
        services
            .attachments
            .upload(&estimate_no, "pid.pdf", b"%PDF")
            .expect("upload");

        let response = router
            .clone()
            .oneshot(
                Request::delete(format!("/api/v1/estimates/{estimate_no}"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("delete");
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(store.is_empty());

        let response = router
            .oneshot(
                Request::get(format!("/api/v1/estimates/{estimate_no}"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("get");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn submitted_estimates_cannot_be_deleted() {
        let (router, services, _) = app(true);
        let estimate_no = draft(&services);
        let mut tag = TagSpec::new("FV-101");
        tag.body.material = Some("WCB".to_string());
        services
            .estimates
            .add_item(
                &estimate_no,
                NewEstimateItem {
                    valve_type: "GLOBE".to_string(),
                    note: None,
                    tags: vec![tag],
                },
            )
            .expect("item");

        let response = router
            .clone()
            .oneshot(
                Request::post(format!("/api/v1/estimates/{estimate_no}/status"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({ "action": "submit", "actor": { "role": "customer", "name": "J. Park" } })
                            .to_string(),
                    ))
                    .expect("request"),
            )
            .await
            .expect("submit");
        assert_eq!(response.status(), StatusCode::OK);

        let response = router
            .oneshot(
                Request::delete(format!("/api/v1/estimates/{estimate_no}"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("delete");
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
