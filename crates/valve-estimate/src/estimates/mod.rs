//! Estimate sheets, their valve line items and tags, and the status workflow that moves
//! them from draft to ordered.

pub mod domain;
pub(crate) mod ordering;
pub mod repository;
pub mod router;
pub mod service;
pub mod spec;
pub mod workflow;

#[cfg(test)]
mod tests;

pub use domain::{
    CustomerInfo, EstimateHeaderUpdate, EstimateItem, EstimateItemUpdate, EstimateNo,
    EstimateQuery, EstimateSheet, EstimateSummary, ItemId, NewEstimate, NewEstimateItem,
    StatusChange,
};
pub use ordering::OrderingError;
pub use repository::EstimateRepository;
pub use router::estimate_router;
pub use service::{
    EstimateService, EstimateServiceError, StatusCommand, ValidationError, MAX_TAG_QUANTITY,
};
pub use spec::{
    AccessorySpec, ActuatorSpec, BodySpec, FluidCondition, FluidState, ProcessPoint, TagSpec,
    TrimSpec,
};
pub use workflow::{Actor, ActorRole, EstimateStatus, StatusAction, WorkflowError};
