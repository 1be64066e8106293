use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use super::domain::{
    EstimateHeaderUpdate, EstimateItemUpdate, EstimateNo, EstimateQuery, ItemId, NewEstimate,
    NewEstimateItem,
};
use super::ordering::OrderingError;
use super::repository::EstimateRepository;
use super::service::{EstimateService, EstimateServiceError, StatusCommand};
use super::spec::TagSpec;
use super::workflow::{ActorRole, StatusAction, WorkflowError};
use crate::documents::DocumentError;
use crate::master::{MasterDataError, MasterDataRepository};
use crate::repository::RepositoryError;

type SharedService<R, M> = Arc<EstimateService<R, M>>;

#[derive(Debug, Clone, Deserialize)]
pub struct ReorderRequest {
    pub item_ids: Vec<ItemId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MoveRequest {
    pub position: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriceRequest {
    pub unit_price: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActionsQuery {
    pub role: ActorRole,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActionsView {
    pub estimate_no: EstimateNo,
    pub role: ActorRole,
    pub actions: Vec<StatusAction>,
}

/// Router builder exposing the estimate sheet, line item, workflow, and document endpoints.
pub fn estimate_router<R, M>(service: SharedService<R, M>) -> Router
where
    R: EstimateRepository + 'static,
    M: MasterDataRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/estimates",
            get(list_handler::<R, M>).post(create_handler::<R, M>),
        )
        .route(
            "/api/v1/estimates/:estimate_no",
            get(get_handler::<R, M>).put(update_header_handler::<R, M>),
        )
        .route(
            "/api/v1/estimates/:estimate_no/status",
            post(status_handler::<R, M>),
        )
        .route(
            "/api/v1/estimates/:estimate_no/actions",
            get(actions_handler::<R, M>),
        )
        .route(
            "/api/v1/estimates/:estimate_no/items",
            post(add_item_handler::<R, M>),
        )
        .route(
            "/api/v1/estimates/:estimate_no/item-order",
            put(reorder_handler::<R, M>),
        )
        .route(
            "/api/v1/estimates/:estimate_no/items/:item_id",
            put(update_item_handler::<R, M>).delete(remove_item_handler::<R, M>),
        )
        .route(
            "/api/v1/estimates/:estimate_no/items/:item_id/move",
            post(move_item_handler::<R, M>),
        )
        .route(
            "/api/v1/estimates/:estimate_no/items/:item_id/price",
            put(price_handler::<R, M>),
        )
        .route(
            "/api/v1/estimates/:estimate_no/items/:item_id/tags",
            post(add_tag_handler::<R, M>),
        )
        .route(
            "/api/v1/estimates/:estimate_no/items/:item_id/tags/:tag_no",
            put(update_tag_handler::<R, M>).delete(remove_tag_handler::<R, M>),
        )
        .route(
            "/api/v1/estimates/:estimate_no/data-sheet",
            get(data_sheet_handler::<R, M>),
        )
        .route(
            "/api/v1/estimates/:estimate_no/quote-list",
            get(quote_list_handler::<R, M>),
        )
        .route(
            "/api/v1/estimates/:estimate_no/quote-list.csv",
            get(quote_list_csv_handler::<R, M>),
        )
        .with_state(service)
}

/// Maps service failures onto HTTP statuses with a `{"error": ...}` body.
pub fn error_response(err: EstimateServiceError) -> Response {
    let status = match &err {
        EstimateServiceError::NotFound(_)
        | EstimateServiceError::ItemNotFound(_)
        | EstimateServiceError::TagNotFound(_)
        | EstimateServiceError::Ordering(OrderingError::UnknownItem(_))
        | EstimateServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        EstimateServiceError::Ordering(_)
        | EstimateServiceError::Validation(_)
        | EstimateServiceError::Master(MasterDataError::NotFound { .. }) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        EstimateServiceError::NotEditable { .. }
        | EstimateServiceError::Workflow(WorkflowError::InvalidTransition { .. })
        | EstimateServiceError::Document(DocumentError::QuoteUnavailable(_))
        | EstimateServiceError::Document(DocumentError::Unpriced(_))
        | EstimateServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        EstimateServiceError::Workflow(WorkflowError::Forbidden { .. }) => StatusCode::FORBIDDEN,
        EstimateServiceError::Document(_)
        | EstimateServiceError::Master(_)
        | EstimateServiceError::Repository(RepositoryError::Unavailable(_)) => {
            error!(error = %err, "estimate request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}

fn respond<T: Serialize>(status: StatusCode, result: Result<T, EstimateServiceError>) -> Response {
    match result {
        Ok(body) => (status, Json(body)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_handler<R, M>(
    State(service): State<SharedService<R, M>>,
    Query(query): Query<EstimateQuery>,
) -> Response
where
    R: EstimateRepository + 'static,
    M: MasterDataRepository + 'static,
{
    respond(StatusCode::OK, service.list(&query))
}

pub(crate) async fn create_handler<R, M>(
    State(service): State<SharedService<R, M>>,
    Json(new_estimate): Json<NewEstimate>,
) -> Response
where
    R: EstimateRepository + 'static,
    M: MasterDataRepository + 'static,
{
    respond(StatusCode::CREATED, service.create(new_estimate))
}

pub(crate) async fn get_handler<R, M>(
    State(service): State<SharedService<R, M>>,
    Path(estimate_no): Path<String>,
) -> Response
where
    R: EstimateRepository + 'static,
    M: MasterDataRepository + 'static,
{
    respond(StatusCode::OK, service.get(&EstimateNo(estimate_no)))
}

pub(crate) async fn update_header_handler<R, M>(
    State(service): State<SharedService<R, M>>,
    Path(estimate_no): Path<String>,
    Json(update): Json<EstimateHeaderUpdate>,
) -> Response
where
    R: EstimateRepository + 'static,
    M: MasterDataRepository + 'static,
{
    respond(
        StatusCode::OK,
        service.update_header(&EstimateNo(estimate_no), update),
    )
}

pub(crate) async fn status_handler<R, M>(
    State(service): State<SharedService<R, M>>,
    Path(estimate_no): Path<String>,
    Json(command): Json<StatusCommand>,
) -> Response
where
    R: EstimateRepository + 'static,
    M: MasterDataRepository + 'static,
{
    respond(
        StatusCode::OK,
        service.apply(&EstimateNo(estimate_no), command),
    )
}

pub(crate) async fn actions_handler<R, M>(
    State(service): State<SharedService<R, M>>,
    Path(estimate_no): Path<String>,
    Query(query): Query<ActionsQuery>,
) -> Response
where
    R: EstimateRepository + 'static,
    M: MasterDataRepository + 'static,
{
    let estimate_no = EstimateNo(estimate_no);
    let result = service.get(&estimate_no).map(|sheet| ActionsView {
        estimate_no,
        role: query.role,
        actions: StatusAction::available(sheet.status, query.role),
    });
    respond(StatusCode::OK, result)
}

pub(crate) async fn add_item_handler<R, M>(
    State(service): State<SharedService<R, M>>,
    Path(estimate_no): Path<String>,
    Json(new_item): Json<NewEstimateItem>,
) -> Response
where
    R: EstimateRepository + 'static,
    M: MasterDataRepository + 'static,
{
    respond(
        StatusCode::CREATED,
        service.add_item(&EstimateNo(estimate_no), new_item),
    )
}

pub(crate) async fn reorder_handler<R, M>(
    State(service): State<SharedService<R, M>>,
    Path(estimate_no): Path<String>,
    Json(request): Json<ReorderRequest>,
) -> Response
where
    R: EstimateRepository + 'static,
    M: MasterDataRepository + 'static,
{
    respond(
        StatusCode::OK,
        service.reorder_items(&EstimateNo(estimate_no), &request.item_ids),
    )
}

pub(crate) async fn update_item_handler<R, M>(
    State(service): State<SharedService<R, M>>,
    Path((estimate_no, item_id)): Path<(String, String)>,
    Json(update): Json<EstimateItemUpdate>,
) -> Response
where
    R: EstimateRepository + 'static,
    M: MasterDataRepository + 'static,
{
    respond(
        StatusCode::OK,
        service.update_item(&EstimateNo(estimate_no), &ItemId(item_id), update),
    )
}

pub(crate) async fn remove_item_handler<R, M>(
    State(service): State<SharedService<R, M>>,
    Path((estimate_no, item_id)): Path<(String, String)>,
) -> Response
where
    R: EstimateRepository + 'static,
    M: MasterDataRepository + 'static,
{
    respond(
        StatusCode::OK,
        service.remove_item(&EstimateNo(estimate_no), &ItemId(item_id)),
    )
}

pub(crate) async fn move_item_handler<R, M>(
    State(service): State<SharedService<R, M>>,
    Path((estimate_no, item_id)): Path<(String, String)>,
    Json(request): Json<MoveRequest>,
) -> Response
where
    R: EstimateRepository + 'static,
    M: MasterDataRepository + 'static,
{
    respond(
        StatusCode::OK,
        service.move_item(&EstimateNo(estimate_no), &ItemId(item_id), request.position),
    )
}

pub(crate) async fn price_handler<R, M>(
    State(service): State<SharedService<R, M>>,
    Path((estimate_no, item_id)): Path<(String, String)>,
    Json(request): Json<PriceRequest>,
) -> Response
where
    R: EstimateRepository + 'static,
    M: MasterDataRepository + 'static,
{
    respond(
        StatusCode::OK,
        service.price_item(&EstimateNo(estimate_no), &ItemId(item_id), request.unit_price),
    )
}

pub(crate) async fn add_tag_handler<R, M>(
    State(service): State<SharedService<R, M>>,
    Path((estimate_no, item_id)): Path<(String, String)>,
    Json(tag): Json<TagSpec>,
) -> Response
where
    R: EstimateRepository + 'static,
    M: MasterDataRepository + 'static,
{
    respond(
        StatusCode::CREATED,
        service.add_tag(&EstimateNo(estimate_no), &ItemId(item_id), tag),
    )
}

pub(crate) async fn update_tag_handler<R, M>(
    State(service): State<SharedService<R, M>>,
    Path((estimate_no, item_id, tag_no)): Path<(String, String, String)>,
    Json(tag): Json<TagSpec>,
) -> Response
where
    R: EstimateRepository + 'static,
    M: MasterDataRepository + 'static,
{
    respond(
        StatusCode::OK,
        service.update_tag(&EstimateNo(estimate_no), &ItemId(item_id), &tag_no, tag),
    )
}

pub(crate) async fn remove_tag_handler<R, M>(
    State(service): State<SharedService<R, M>>,
    Path((estimate_no, item_id, tag_no)): Path<(String, String, String)>,
) -> Response
where
    R: EstimateRepository + 'static,
    M: MasterDataRepository + 'static,
{
    respond(
        StatusCode::OK,
        service.remove_tag(&EstimateNo(estimate_no), &ItemId(item_id), &tag_no),
    )
}

pub(crate) async fn data_sheet_handler<R, M>(
    State(service): State<SharedService<R, M>>,
    Path(estimate_no): Path<String>,
) -> Response
where
    R: EstimateRepository + 'static,
    M: MasterDataRepository + 'static,
{
    respond(StatusCode::OK, service.data_sheet(&EstimateNo(estimate_no)))
}

pub(crate) async fn quote_list_handler<R, M>(
    State(service): State<SharedService<R, M>>,
    Path(estimate_no): Path<String>,
) -> Response
where
    R: EstimateRepository + 'static,
    M: MasterDataRepository + 'static,
{
    respond(StatusCode::OK, service.quote_list(&EstimateNo(estimate_no)))
}

pub(crate) async fn quote_list_csv_handler<R, M>(
    State(service): State<SharedService<R, M>>,
    Path(estimate_no): Path<String>,
) -> Response
where
    R: EstimateRepository + 'static,
    M: MasterDataRepository + 'static,
{
    let estimate_no = EstimateNo(estimate_no);
    let rendered = service
        .quote_list(&estimate_no)
        .and_then(|quote| quote.to_csv().map_err(EstimateServiceError::from));

    match rendered {
        Ok(body) => {
            let disposition = format!("attachment; filename=\"{estimate_no}-quote.csv\"");
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                body,
            )
                .into_response()
        }
        Err(err) => error_response(err),
    }
}
