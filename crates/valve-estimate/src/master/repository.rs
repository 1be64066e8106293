use super::domain::{MasterItem, MasterKind};
use crate::repository::RepositoryError;

/// Storage abstraction over the per-kind master-data tables.
///
/// Codes arrive already normalized (trimmed, upper-case); implementations compare them
/// verbatim.
pub trait MasterDataRepository: Send + Sync {
    fn insert(&self, item: MasterItem) -> Result<MasterItem, RepositoryError>;
    fn update(&self, item: MasterItem) -> Result<(), RepositoryError>;
    fn remove(&self, kind: MasterKind, code: &str) -> Result<(), RepositoryError>;
    fn fetch(&self, kind: MasterKind, code: &str) -> Result<Option<MasterItem>, RepositoryError>;
    fn list(&self, kind: MasterKind) -> Result<Vec<MasterItem>, RepositoryError>;
}
