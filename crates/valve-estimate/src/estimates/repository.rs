use super::domain::{EstimateNo, EstimateSheet};
use crate::repository::RepositoryError;

/// Storage abstraction so the service module can be exercised in isolation.
///
/// Sheets are stored whole; line items and tags travel inside the sheet record.
pub trait EstimateRepository: Send + Sync {
    fn insert(&self, sheet: EstimateSheet) -> Result<EstimateSheet, RepositoryError>;
    fn remove(&self, estimate_no: &EstimateNo) -> Result<(), RepositoryError>;
    fn fetch(&self, estimate_no: &EstimateNo) -> Result<Option<EstimateSheet>, RepositoryError>;
    fn list(&self) -> Result<Vec<EstimateSheet>, RepositoryError>;

    /// Applies `change` to a copy of the stored sheet and writes it back in one step.
    ///
    /// No other change to the same estimate may interleave. The stored sheet is left
    /// untouched when `change` fails. Returns `Ok(None)` when the estimate does not exist.
    fn modify<F, E>(&self, estimate_no: &EstimateNo, change: F) -> Result<Option<EstimateSheet>, E>
    where
        F: FnOnce(&mut EstimateSheet) -> Result<(), E>,
        E: From<RepositoryError>;

    /// Removes the sheet only if `check` accepts it, atomically with the check.
    fn remove_if<F, E>(&self, estimate_no: &EstimateNo, check: F) -> Result<bool, E>
    where
        F: FnOnce(&EstimateSheet) -> Result<(), E>,
        E: From<RepositoryError>;
}
