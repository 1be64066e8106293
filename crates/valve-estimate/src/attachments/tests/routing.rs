use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use super::common::*;
use crate::attachments::attachment_router;

fn upload(uri: &str, bytes: &'static [u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .body(Body::from(bytes))
        .expect("request")
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body")
        .to_vec()
}

#[tokio::test]
async fn upload_then_download_serves_original_bytes() {
    let fixture = fixture(1024);
    let app = attachment_router(fixture.attachments.clone());

    let response = app
        .clone()
        .oneshot(upload(
            &format!(
                "/api/v1/estimates/{}/attachments?file_name=valve%20spec.csv",
                fixture.estimate_no
            ),
            b"tag,size\nFV-101,2\"\n",
        ))
        .await
        .expect("upload");
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: Value = serde_json::from_slice(&body_bytes(response).await).expect("json");
    assert_eq!(created["file_name"], "valve spec.csv");
    assert!(created.get("storage_key").is_none());
    let id = created["attachment_id"].as_str().expect("id").to_string();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/attachments/{id}"))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("download");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"valve spec.csv\""
    );
    assert_eq!(body_bytes(response).await, b"tag,size\nFV-101,2\"\n");

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/v1/attachments/{id}"))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("delete");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn oversized_bodies_are_rejected_with_413() {
    let fixture = fixture(8);
    let app = attachment_router(fixture.attachments.clone());

    let response = app
        .oneshot(upload(
            &format!(
                "/api/v1/estimates/{}/attachments?file_name=big.bin",
                fixture.estimate_no
            ),
            b"0123456789abcdef",
        ))
        .await
        .expect("upload");
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body: Value = serde_json::from_slice(&body_bytes(response).await).expect("json body");
    assert_eq!(body["error"], "uploaded file exceeds the 8 byte limit");
    assert!(fixture.store.is_empty());
}

#[tokio::test]
async fn unknown_estimate_and_attachment_are_not_found() {
    let fixture = fixture(1024);
    let app = attachment_router(fixture.attachments.clone());

    let response = app
        .clone()
        .oneshot(upload(
            "/api/v1/estimates/EST-19990101-0001/attachments?file_name=a.txt",
            b"abc",
        ))
        .await
        .expect("upload");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/attachments/att-999999")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("download");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
