//! Integration specifications for the master-data tables served over HTTP.
//!
//! Scenarios cover table CRUD, parent/child cascades, and catalog listing through the public
//! router only.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use valve_estimate::master::{
    master_router, standard_catalog, MasterDataService, MasterItemUpdate, MasterKind,
};
use valve_estimate::memory::InMemoryMasterRepository;

fn app(seeded: bool) -> Router {
    let service = MasterDataService::new(Arc::new(InMemoryMasterRepository::default()));
    if seeded {
        service.seed(standard_catalog()).expect("seed");
    }
    master_router(Arc::new(service))
}

fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(request(method, uri, body))
        .await
        .expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json")
    };
    (status, value)
}

#[tokio::test]
async fn create_update_and_delete_a_valve_type() {
    let app = app(false);

    let (status, created) = send(
        &app,
        "POST",
        "/api/v1/master/valve/type",
        Some(json!({ "code": " gate ", "name": "Gate Valve" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["code"], "GATE");
    assert_eq!(created["kind"], "valve/valve_type");
    assert_eq!(created["active"], true);

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/master/valve/type",
        Some(json!({ "code": "GATE", "name": "Duplicate" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, updated) = send(
        &app,
        "PUT",
        "/api/v1/master/valve/type/gate",
        Some(json!({ "name": "Gate Valve (API 600)", "active": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["active"], false);

    let (_, listed) = send(&app, "GET", "/api/v1/master/valve/type", None).await;
    assert_eq!(listed.as_array().map(Vec::len), Some(0));
    let (_, listed) = send(
        &app,
        "GET",
        "/api/v1/master/valve/type?include_inactive=true",
        None,
    )
    .await;
    assert_eq!(listed.as_array().map(Vec::len), Some(1));

    let (status, _) = send(&app, "DELETE", "/api/v1/master/valve/type/GATE", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "GET", "/api/v1/master/valve/type/GATE", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cascaded_tables_require_existing_parents() {
    let app = app(true);

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/master/body/size",
        Some(json!({ "code": "6IN", "name": "6\"" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().expect("error").contains("body/size_unit"));

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/master/body/size",
        Some(json!({ "code": "6IN", "name": "6\"", "parent_code": "FEET" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, created) = send(
        &app,
        "POST",
        "/api/v1/master/body/size",
        Some(json!({ "code": "6IN", "name": "6\"", "parent_code": "inch" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["parent_code"], "INCH");

    let (status, _) = send(&app, "DELETE", "/api/v1/master/body/size_unit/INCH", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn catalog_groups_tables_by_category() {
    let app = app(true);

    let (status, catalog) = send(&app, "GET", "/api/v1/master/act", None).await;
    assert_eq!(status, StatusCode::OK);
    let keys: Vec<&str> = catalog["tables"]
        .as_array()
        .expect("tables")
        .iter()
        .filter_map(|table| table["key"].as_str())
        .collect();
    assert_eq!(keys, vec!["act_type", "series", "size", "hand_wheel"]);

    let (status, _) = send(&app, "GET", "/api/v1/master/paint", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, "GET", "/api/v1/master/body/colour", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn search_filters_on_code_and_name() {
    let app = app(true);

    let (_, rows) = send(&app, "GET", "/api/v1/master/body/material?search=stainless", None).await;
    let codes: Vec<&str> = rows
        .as_array()
        .expect("rows")
        .iter()
        .filter_map(|row| row["code"].as_str())
        .collect();
    assert_eq!(codes, vec!["CF8M"]);
}

#[test]
fn reseeding_skips_existing_codes_and_keeps_local_edits() {
    let service = MasterDataService::new(Arc::new(InMemoryMasterRepository::default()));
    let first = service.seed(standard_catalog()).expect("first seed");
    assert_eq!(first, standard_catalog().len());

    service
        .update(
            MasterKind::ValveType,
            "GLOBE",
            MasterItemUpdate {
                name: Some("Globe Valve (plant standard)".to_string()),
                active: Some(false),
                ..MasterItemUpdate::default()
            },
        )
        .expect("local edit");

    let second = service.seed(standard_catalog()).expect("second seed");
    assert_eq!(second, 0);

    let globe = service.get(MasterKind::ValveType, "GLOBE").expect("globe");
    assert_eq!(globe.name, "Globe Valve (plant standard)");
    assert!(!globe.active);
}
