use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tracing::error;

use super::domain::{
    MasterCategory, MasterFilter, MasterItemUpdate, MasterKind, NewMasterItem,
};
use super::repository::MasterDataRepository;
use super::service::{MasterDataError, MasterDataService};

/// Router builder exposing the master-data tables.
pub fn master_router<R>(service: Arc<MasterDataService<R>>) -> Router
where
    R: MasterDataRepository + 'static,
{
    Router::new()
        .route("/api/v1/master/:category", get(catalog_handler::<R>))
        .route(
            "/api/v1/master/:category/:kind",
            get(list_handler::<R>).post(create_handler::<R>),
        )
        .route(
            "/api/v1/master/:category/:kind/:code",
            get(get_handler::<R>)
                .put(update_handler::<R>)
                .delete(delete_handler::<R>),
        )
        .with_state(service)
}

pub fn error_response(err: MasterDataError) -> Response {
    let status = match &err {
        MasterDataError::UnknownKind(_) | MasterDataError::NotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        MasterDataError::Duplicate { .. } | MasterDataError::HasChildren { .. } => {
            StatusCode::CONFLICT
        }
        MasterDataError::EmptyCode
        | MasterDataError::EmptyName
        | MasterDataError::MissingParent { .. }
        | MasterDataError::UnexpectedParent { .. }
        | MasterDataError::ParentNotFound { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        MasterDataError::Repository(_) => {
            error!(error = %err, "master data repository failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}

pub(crate) async fn catalog_handler<R>(
    State(service): State<Arc<MasterDataService<R>>>,
    Path(category): Path<String>,
) -> Response
where
    R: MasterDataRepository + 'static,
{
    let result = MasterCategory::parse(&category)
        .map_err(MasterDataError::from)
        .and_then(|category| service.catalog(category));
    match result {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_handler<R>(
    State(service): State<Arc<MasterDataService<R>>>,
    Path((category, kind)): Path<(String, String)>,
    Query(filter): Query<MasterFilter>,
) -> Response
where
    R: MasterDataRepository + 'static,
{
    let result = MasterKind::parse(&category, &kind)
        .map_err(MasterDataError::from)
        .and_then(|kind| service.list(kind, &filter));
    match result {
        Ok(items) => (StatusCode::OK, Json(items)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn create_handler<R>(
    State(service): State<Arc<MasterDataService<R>>>,
    Path((category, kind)): Path<(String, String)>,
    Json(new_item): Json<NewMasterItem>,
) -> Response
where
    R: MasterDataRepository + 'static,
{
    let result = MasterKind::parse(&category, &kind)
        .map_err(MasterDataError::from)
        .and_then(|kind| service.create(kind, new_item));
    match result {
        Ok(item) => (StatusCode::CREATED, Json(item)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn get_handler<R>(
    State(service): State<Arc<MasterDataService<R>>>,
    Path((category, kind, code)): Path<(String, String, String)>,
) -> Response
where
    R: MasterDataRepository + 'static,
{
    let result = MasterKind::parse(&category, &kind)
        .map_err(MasterDataError::from)
        .and_then(|kind| service.get(kind, &code));
    match result {
        Ok(item) => (StatusCode::OK, Json(item)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn update_handler<R>(
    State(service): State<Arc<MasterDataService<R>>>,
    Path((category, kind, code)): Path<(String, String, String)>,
    Json(update): Json<MasterItemUpdate>,
) -> Response
where
    R: MasterDataRepository + 'static,
{
    let result = MasterKind::parse(&category, &kind)
        .map_err(MasterDataError::from)
        .and_then(|kind| service.update(kind, &code, update));
    match result {
        Ok(item) => (StatusCode::OK, Json(item)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn delete_handler<R>(
    State(service): State<Arc<MasterDataService<R>>>,
    Path((category, kind, code)): Path<(String, String, String)>,
) -> Response
where
    R: MasterDataRepository + 'static,
{
    let result = MasterKind::parse(&category, &kind)
        .map_err(MasterDataError::from)
        .and_then(|kind| service.delete(kind, &code));
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}
