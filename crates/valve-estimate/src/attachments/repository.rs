use super::domain::{Attachment, AttachmentId};
use crate::estimates::EstimateNo;
use crate::repository::RepositoryError;

/// Metadata storage for uploaded files.
pub trait AttachmentRepository: Send + Sync {
    fn insert(&self, attachment: Attachment) -> Result<Attachment, RepositoryError>;
    fn fetch(&self, id: &AttachmentId) -> Result<Option<Attachment>, RepositoryError>;
    fn list_for(&self, estimate_no: &EstimateNo) -> Result<Vec<Attachment>, RepositoryError>;
    fn remove(&self, id: &AttachmentId) -> Result<(), RepositoryError>;
}
