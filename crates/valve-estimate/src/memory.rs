//! In-process adapters for every storage trait, backed by mutex-guarded maps.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::attachments::{Attachment, AttachmentId, AttachmentRepository, AttachmentStore, StoreError};
use crate::estimates::{EstimateNo, EstimateRepository, EstimateSheet};
use crate::master::{MasterDataRepository, MasterItem, MasterKind};
use crate::repository::RepositoryError;

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable("repository mutex poisoned".to_string()))
}

#[derive(Default, Clone)]
pub struct InMemoryMasterRepository {
    items: Arc<Mutex<HashMap<(MasterKind, String), MasterItem>>>,
}

impl MasterDataRepository for InMemoryMasterRepository {
    fn insert(&self, item: MasterItem) -> Result<MasterItem, RepositoryError> {
        let mut guard = lock(&self.items)?;
        let key = (item.kind, item.code.clone());
        if guard.contains_key(&key) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(key, item.clone());
        Ok(item)
    }

    fn update(&self, item: MasterItem) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.items)?;
        match guard.get_mut(&(item.kind, item.code.clone())) {
            Some(slot) => {
                *slot = item;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn remove(&self, kind: MasterKind, code: &str) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.items)?;
        guard
            .remove(&(kind, code.to_string()))
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    fn fetch(&self, kind: MasterKind, code: &str) -> Result<Option<MasterItem>, RepositoryError> {
        let guard = lock(&self.items)?;
        Ok(guard.get(&(kind, code.to_string())).cloned())
    }

    fn list(&self, kind: MasterKind) -> Result<Vec<MasterItem>, RepositoryError> {
        let guard = lock(&self.items)?;
        Ok(guard
            .values()
            .filter(|item| item.kind == kind)
            .cloned()
            .collect())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryEstimateRepository {
    sheets: Arc<Mutex<HashMap<EstimateNo, EstimateSheet>>>,
}

impl EstimateRepository for InMemoryEstimateRepository {
    fn insert(&self, sheet: EstimateSheet) -> Result<EstimateSheet, RepositoryError> {
        let mut guard = lock(&self.sheets)?;
        if guard.contains_key(&sheet.estimate_no) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(sheet.estimate_no.clone(), sheet.clone());
        Ok(sheet)
    }

    fn remove(&self, estimate_no: &EstimateNo) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.sheets)?;
        guard
            .remove(estimate_no)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    fn fetch(&self, estimate_no: &EstimateNo) -> Result<Option<EstimateSheet>, RepositoryError> {
        let guard = lock(&self.sheets)?;
        Ok(guard.get(estimate_no).cloned())
    }

    fn list(&self) -> Result<Vec<EstimateSheet>, RepositoryError> {
        let guard = lock(&self.sheets)?;
        Ok(guard.values().cloned().collect())
    }

    fn modify<F, E>(&self, estimate_no: &EstimateNo, change: F) -> Result<Option<EstimateSheet>, E>
    where
        F: FnOnce(&mut EstimateSheet) -> Result<(), E>,
        E: From<RepositoryError>,
    {
        let mut guard = lock(&self.sheets)?;
        let Some(slot) = guard.get_mut(estimate_no) else {
            return Ok(None);
        };
        let mut sheet = slot.clone();
        change(&mut sheet)?;
        *slot = sheet.clone();
        Ok(Some(sheet))
    }

    fn remove_if<F, E>(&self, estimate_no: &EstimateNo, check: F) -> Result<bool, E>
    where
        F: FnOnce(&EstimateSheet) -> Result<(), E>,
        E: From<RepositoryError>,
    {
        let mut guard = lock(&self.sheets)?;
        let Some(sheet) = guard.get(estimate_no) else {
            return Ok(false);
        };
        check(sheet)?;
        guard.remove(estimate_no);
        Ok(true)
    }
}

#[derive(Default, Clone)]
pub struct InMemoryAttachmentRepository {
    records: Arc<Mutex<HashMap<AttachmentId, Attachment>>>,
}

impl AttachmentRepository for InMemoryAttachmentRepository {
    fn insert(&self, attachment: Attachment) -> Result<Attachment, RepositoryError> {
        let mut guard = lock(&self.records)?;
        if guard.contains_key(&attachment.attachment_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(attachment.attachment_id.clone(), attachment.clone());
        Ok(attachment)
    }

    fn fetch(&self, id: &AttachmentId) -> Result<Option<Attachment>, RepositoryError> {
        let guard = lock(&self.records)?;
        Ok(guard.get(id).cloned())
    }

    fn list_for(&self, estimate_no: &EstimateNo) -> Result<Vec<Attachment>, RepositoryError> {
        let guard = lock(&self.records)?;
        Ok(guard
            .values()
            .filter(|attachment| &attachment.estimate_no == estimate_no)
            .cloned()
            .collect())
    }

    fn remove(&self, id: &AttachmentId) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.records)?;
        guard.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }
}

/// Blob store kept in memory; the `demo` command and tests use it instead of the disk.
#[derive(Default, Clone)]
pub struct InMemoryAttachmentStore {
    blobs: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl InMemoryAttachmentStore {
    pub fn len(&self) -> usize {
        self.blobs.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn blob_lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    mutex.lock().map_err(|_| {
        StoreError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "blob store mutex poisoned",
        ))
    })
}

impl AttachmentStore for InMemoryAttachmentStore {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        blob_lock(&self.blobs)?.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        blob_lock(&self.blobs)?
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        blob_lock(&self.blobs)?
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }
}
