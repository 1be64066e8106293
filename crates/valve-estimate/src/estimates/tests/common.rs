use std::sync::Arc;

use axum::body::to_bytes;
use axum::http::StatusCode;
use axum::response::Response;
use serde_json::Value;

use crate::estimates::{
    Actor, ActuatorSpec, BodySpec, CustomerInfo, EstimateNo, EstimateRepository, EstimateService,
    EstimateSheet, NewEstimate, NewEstimateItem, ProcessPoint, StatusAction, StatusCommand,
    TagSpec, TrimSpec,
};
use crate::master::{standard_catalog, MasterDataService};
use crate::memory::{InMemoryEstimateRepository, InMemoryMasterRepository};
use crate::repository::RepositoryError;

pub(super) type MemoryService = EstimateService<InMemoryEstimateRepository, InMemoryMasterRepository>;

pub(super) fn seeded_master() -> Arc<MasterDataService<InMemoryMasterRepository>> {
    let master = Arc::new(MasterDataService::new(Arc::new(
        InMemoryMasterRepository::default(),
    )));
    master.seed(standard_catalog()).expect("seed catalog");
    master
}

pub(super) fn service() -> MemoryService {
    EstimateService::new(Arc::new(InMemoryEstimateRepository::default()), seeded_master())
}

pub(super) fn new_estimate() -> NewEstimate {
    NewEstimate {
        customer: CustomerInfo {
            company: "Hanil Petrochem".to_string(),
            contact: "J. Park".to_string(),
            email: Some("j.park@hanil.example".to_string()),
            phone: None,
        },
        project: "Naphtha Cracker Revamp".to_string(),
        remarks: Some("Budget quote".to_string()),
    }
}

/// A tag whose every code exists in the standard catalog and whose cascades line up.
pub(super) fn valid_tag(tag_no: &str) -> TagSpec {
    let mut tag = TagSpec::new(tag_no);
    tag.quantity = 2;
    tag.fluid.medium = "Cooling Water".to_string();
    tag.fluid.flow_rate = ProcessPoint {
        min: Some(12.0),
        normal: Some(30.0),
        max: Some(45.0),
    };
    tag.fluid.flow_unit = Some("m3/h".to_string());
    tag.body = BodySpec {
        bonnet: Some("std".to_string()),
        material: Some("WCB".to_string()),
        rating: Some("300".to_string()),
        connection: Some("RF".to_string()),
        size_unit: Some("INCH".to_string()),
        size: Some("2IN".to_string()),
    };
    tag.trim = TrimSpec {
        trim_type: Some("CAGE".to_string()),
        series: Some("S100".to_string()),
        port_size: Some("P-1.5".to_string()),
        form: Some("EQ".to_string()),
        material: Some("316SS".to_string()),
        option: None,
    };
    tag.actuator = ActuatorSpec {
        act_type: Some("SD".to_string()),
        series: Some("DA".to_string()),
        size: Some("DA-400".to_string()),
        hand_wheel: Some("SIDE".to_string()),
    };
    tag.accessory.positioner = Some("SMART".to_string());
    tag
}

pub(super) fn new_item(valve_type: &str, tags: &[&str]) -> NewEstimateItem {
    NewEstimateItem {
        valve_type: valve_type.to_string(),
        note: None,
        tags: tags.iter().map(|tag| valid_tag(tag)).collect(),
    }
}

pub(super) fn command(action: StatusAction, actor: Actor) -> StatusCommand {
    StatusCommand {
        action,
        actor,
        note: None,
    }
}

/// Draft with two priced-ready line items already submitted and taken up by staff.
pub(super) fn processing_estimate(service: &MemoryService) -> EstimateSheet {
    let sheet = service.create(new_estimate()).expect("create");
    service
        .add_item(&sheet.estimate_no, new_item("GLOBE", &["FV-101", "FV-102"]))
        .expect("first item");
    service
        .add_item(&sheet.estimate_no, new_item("BALL", &["XV-201"]))
        .expect("second item");
    service
        .apply(
            &sheet.estimate_no,
            command(StatusAction::Submit, Actor::customer("J. Park")),
        )
        .expect("submit");
    service
        .apply(
            &sheet.estimate_no,
            command(StatusAction::StartProcessing, Actor::staff("M. Kim")),
        )
        .expect("start processing")
}

pub(super) fn price_all(service: &MemoryService, estimate_no: &EstimateNo, unit_price: u64) {
    let sheet = service.get(estimate_no).expect("sheet");
    for item in sheet.items {
        service
            .price_item(estimate_no, &item.item_id, unit_price)
            .expect("price");
    }
}

pub(super) async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    serde_json::from_slice(&bytes).expect("json body")
}

pub(super) async fn assert_error(response: Response, status: StatusCode) -> Value {
    assert_eq!(response.status(), status);
    let body = json_body(response).await;
    assert!(body.get("error").is_some(), "missing error field: {body}");
    body
}

/// Repository whose backing store is gone.
pub(super) struct UnavailableRepository;

impl EstimateRepository for UnavailableRepository {
    fn insert(&self, _sheet: EstimateSheet) -> Result<EstimateSheet, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn remove(&self, _estimate_no: &EstimateNo) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _estimate_no: &EstimateNo) -> Result<Option<EstimateSheet>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(&self) -> Result<Vec<EstimateSheet>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn modify<F, E>(&self, _estimate_no: &EstimateNo, _change: F) -> Result<Option<EstimateSheet>, E>
    where
        F: FnOnce(&mut EstimateSheet) -> Result<(), E>,
        E: From<RepositoryError>,
    {
        Err(RepositoryError::Unavailable("database offline".to_string()).into())
    }

    fn remove_if<F, E>(&self, _estimate_no: &EstimateNo, _check: F) -> Result<bool, E>
    where
        F: FnOnce(&EstimateSheet) -> Result<(), E>,
        E: From<RepositoryError>,
    {
        Err(RepositoryError::Unavailable("database offline".to_string()).into())
    }
}
