use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;
use valve_estimate::attachments::{AttachmentService, AttachmentStore};
use valve_estimate::error::AppError;
use valve_estimate::estimates::EstimateService;
use valve_estimate::master::{standard_catalog, MasterDataService};
use valve_estimate::memory::{
    InMemoryAttachmentRepository, InMemoryEstimateRepository, InMemoryMasterRepository,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type MasterService = MasterDataService<InMemoryMasterRepository>;
pub(crate) type Estimates = EstimateService<InMemoryEstimateRepository, InMemoryMasterRepository>;
pub(crate) type Attachments<S> =
    AttachmentService<InMemoryAttachmentRepository, S, InMemoryEstimateRepository>;

/// Every domain service wired to the in-process repositories.
pub(crate) struct Services<S> {
    pub(crate) master: Arc<MasterService>,
    pub(crate) estimates: Arc<Estimates>,
    pub(crate) attachments: Arc<Attachments<S>>,
}

pub(crate) fn build_services<S>(
    store: Arc<S>,
    max_attachment_bytes: usize,
    seed_master_data: bool,
) -> Result<Services<S>, AppError>
where
    S: AttachmentStore + 'static,
{
    let master = Arc::new(MasterDataService::new(Arc::new(
        InMemoryMasterRepository::default(),
    )));
    if seed_master_data {
        let inserted = master.seed(standard_catalog())?;
        info!(inserted, "standard master catalog loaded");
    }

    let estimate_repository = Arc::new(InMemoryEstimateRepository::default());
    let estimates = Arc::new(EstimateService::new(
        estimate_repository.clone(),
        master.clone(),
    ));
    let attachments = Arc::new(AttachmentService::new(
        Arc::new(InMemoryAttachmentRepository::default()),
        store,
        estimate_repository,
        max_attachment_bytes,
    ));

    Ok(Services {
        master,
        estimates,
        attachments,
    })
}
