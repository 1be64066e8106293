use std::sync::Arc;

use crate::attachments::AttachmentService;
use crate::estimates::{CustomerInfo, EstimateNo, EstimateService, NewEstimate};
use crate::master::MasterDataService;
use crate::memory::{
    InMemoryAttachmentRepository, InMemoryAttachmentStore, InMemoryEstimateRepository,
    InMemoryMasterRepository,
};

pub(super) type MemoryAttachments =
    AttachmentService<InMemoryAttachmentRepository, InMemoryAttachmentStore, InMemoryEstimateRepository>;

pub(super) struct Fixture {
    pub(super) attachments: Arc<MemoryAttachments>,
    pub(super) store: Arc<InMemoryAttachmentStore>,
    pub(super) estimate_no: EstimateNo,
}

pub(super) fn fixture(max_bytes: usize) -> Fixture {
    let estimates_repo = Arc::new(InMemoryEstimateRepository::default());
    let estimates = EstimateService::new(
        estimates_repo.clone(),
        Arc::new(MasterDataService::new(Arc::new(
            InMemoryMasterRepository::default(),
        ))),
    );
    let sheet = estimates
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
        .expect("estimate");

    let store = Arc::new(InMemoryAttachmentStore::default());
    let attachments = Arc::new(AttachmentService::new(
        Arc::new(InMemoryAttachmentRepository::default()),
        store.clone(),
        estimates_repo,
        max_bytes,
    ));
    Fixture {
        attachments,
        store,
        estimate_no: sheet.estimate_no,
    }
}
