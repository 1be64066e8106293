use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::domain::{sanitize_file_name, Attachment, AttachmentContent, AttachmentId};
use super::repository::AttachmentRepository;
use super::store::{AttachmentStore, StoreError};
use crate::estimates::{EstimateNo, EstimateRepository};
use crate::repository::RepositoryError;

/// Service pairing attachment metadata with blob storage, scoped to existing estimates.
pub struct AttachmentService<R, S, E> {
    repository: Arc<R>,
    store: Arc<S>,
    estimates: Arc<E>,
    max_bytes: usize,
    sequence: AtomicU64,
}

impl<R, S, E> AttachmentService<R, S, E>
where
    R: AttachmentRepository + 'static,
    S: AttachmentStore + 'static,
    E: EstimateRepository + 'static,
{
    pub fn new(repository: Arc<R>, store: Arc<S>, estimates: Arc<E>, max_bytes: usize) -> Self {
        Self {
            repository,
            store,
            estimates,
            max_bytes,
            sequence: AtomicU64::new(1),
        }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    fn next_id(&self) -> AttachmentId {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed);
        AttachmentId(format!("att-{id:06}"))
    }

    pub fn upload(
        &self,
        estimate_no: &EstimateNo,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<Attachment, AttachmentError> {
        self.ensure_estimate(estimate_no)?;
        let file_name = sanitize_file_name(file_name).ok_or(AttachmentError::EmptyFileName)?;
        if bytes.is_empty() {
            return Err(AttachmentError::EmptyPayload);
        }
        if bytes.len() > self.max_bytes {
            return Err(AttachmentError::TooLarge {
                size: bytes.len(),
                limit: self.max_bytes,
            });
        }

        let content_type = mime_guess::from_path(&file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        let (attachment_id, storage_key) = loop {
            let id = self.next_id();
            let key = format!("{estimate_no}/{id}-{file_name}");
            if self.repository.fetch(&id)?.is_none() {
                break (id, key);
            }
        };

        self.store.put(&storage_key, bytes)?;
        let attachment = Attachment {
            attachment_id,
            estimate_no: estimate_no.clone(),
            file_name,
            content_type,
            size_bytes: bytes.len() as u64,
            storage_key: storage_key.clone(),
            uploaded_at: Utc::now(),
        };

        let stored = match self.repository.insert(attachment) {
            Ok(stored) => stored,
            Err(err) => {
                if let Err(cleanup) = self.store.delete(&storage_key) {
                    warn!(error = %cleanup, key = %storage_key, "orphaned attachment blob left behind");
                }
                return Err(err.into());
            }
        };

        info!(
            %estimate_no,
            attachment_id = %stored.attachment_id,
            file_name = %stored.file_name,
            size_bytes = stored.size_bytes,
            "attachment uploaded"
        );
        Ok(stored)
    }

    /// Attachments of one estimate, oldest first.
    pub fn list(&self, estimate_no: &EstimateNo) -> Result<Vec<Attachment>, AttachmentError> {
        self.ensure_estimate(estimate_no)?;
        let mut attachments = self.repository.list_for(estimate_no)?;
        attachments.sort_by(|a, b| {
            a.uploaded_at
                .cmp(&b.uploaded_at)
                .then_with(|| a.attachment_id.cmp(&b.attachment_id))
        });
        Ok(attachments)
    }

    pub fn get(&self, id: &AttachmentId) -> Result<Attachment, AttachmentError> {
        self.repository
            .fetch(id)?
            .ok_or_else(|| AttachmentError::NotFound(id.clone()))
    }

    pub fn download(&self, id: &AttachmentId) -> Result<AttachmentContent, AttachmentError> {
        let attachment = self.get(id)?;
        let bytes = self.store.get(&attachment.storage_key)?;
        Ok(AttachmentContent { attachment, bytes })
    }

    pub fn delete(&self, id: &AttachmentId) -> Result<Attachment, AttachmentError> {
        let attachment = self.get(id)?;
        self.repository.remove(id)?;
        self.discard_blob(&attachment);
        info!(attachment_id = %id, estimate_no = %attachment.estimate_no, "attachment deleted");
        Ok(attachment)
    }

    /// Removes every attachment of an estimate; used when the estimate itself is deleted.
    pub fn purge(&self, estimate_no: &EstimateNo) -> Result<usize, AttachmentError> {
        let attachments = self.repository.list_for(estimate_no)?;
        for attachment in &attachments {
            self.repository.remove(&attachment.attachment_id)?;
            self.discard_blob(attachment);
        }
        if !attachments.is_empty() {
            info!(%estimate_no, removed = attachments.len(), "estimate attachments purged");
        }
        Ok(attachments.len())
    }

    fn discard_blob(&self, attachment: &Attachment) {
        match self.store.delete(&attachment.storage_key) {
            Ok(()) => {}
            Err(StoreError::NotFound(key)) => {
                warn!(%key, "attachment blob already missing");
            }
            Err(err) => {
                warn!(error = %err, key = %attachment.storage_key, "failed to remove attachment blob");
            }
        }
    }

    fn ensure_estimate(&self, estimate_no: &EstimateNo) -> Result<(), AttachmentError> {
        match self.estimates.fetch(estimate_no)? {
            Some(_) => Ok(()),
            None => Err(AttachmentError::EstimateNotFound(estimate_no.clone())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AttachmentError {
    #[error("estimate {0} not found")]
    EstimateNotFound(EstimateNo),
    #[error("attachment {0} not found")]
    NotFound(AttachmentId),
    #[error("file name is required")]
    EmptyFileName,
    #[error("uploaded file is empty")]
    EmptyPayload,
    #[error("uploaded file is {size} bytes; the limit is {limit}")]
    TooLarge { size: usize, limit: usize },
    #[error("uploaded file exceeds the {limit} byte limit")]
    BodyLimitExceeded { limit: usize },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
