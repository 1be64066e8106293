use std::sync::Arc;

use tracing::{debug, info};

use super::domain::{
    MasterCatalogView, MasterCategory, MasterFilter, MasterItem, MasterItemUpdate, MasterKind,
    MasterTableView, NewMasterItem, UnknownMasterKind,
};
use super::repository::MasterDataRepository;
use crate::repository::RepositoryError;

/// Service owning validation and cascade rules for the master-data tables.
pub struct MasterDataService<R> {
    repository: Arc<R>,
}

pub(crate) fn normalize_code(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

impl<R> MasterDataService<R>
where
    R: MasterDataRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Rows of one table ordered by `(sort_order, code)` after applying `filter`.
    pub fn list(
        &self,
        kind: MasterKind,
        filter: &MasterFilter,
    ) -> Result<Vec<MasterItem>, MasterDataError> {
        let mut items: Vec<MasterItem> = self
            .repository
            .list(kind)?
            .into_iter()
            .filter(|item| filter.matches(item))
            .collect();
        items.sort_by(|a, b| {
            a.sort_order
                .cmp(&b.sort_order)
                .then_with(|| a.code.cmp(&b.code))
        });
        Ok(items)
    }

    pub fn catalog(&self, category: MasterCategory) -> Result<MasterCatalogView, MasterDataError> {
        let filter = MasterFilter::default();
        let tables = category
            .kinds()
            .into_iter()
            .map(|kind| {
                Ok(MasterTableView {
                    kind,
                    key: kind.key(),
                    label: kind.label(),
                    parent: kind.parent(),
                    items: self.list(kind, &filter)?,
                })
            })
            .collect::<Result<Vec<_>, MasterDataError>>()?;

        Ok(MasterCatalogView {
            category,
            label: category.label(),
            tables,
        })
    }

    pub fn lookup(
        &self,
        kind: MasterKind,
        code: &str,
    ) -> Result<Option<MasterItem>, MasterDataError> {
        Ok(self.repository.fetch(kind, &normalize_code(code))?)
    }

    pub fn get(&self, kind: MasterKind, code: &str) -> Result<MasterItem, MasterDataError> {
        self.lookup(kind, code)?
            .ok_or_else(|| MasterDataError::NotFound {
                kind,
                code: normalize_code(code),
            })
    }

    pub fn create(
        &self,
        kind: MasterKind,
        new_item: NewMasterItem,
    ) -> Result<MasterItem, MasterDataError> {
        let code = normalize_code(&new_item.code);
        if code.is_empty() {
            return Err(MasterDataError::EmptyCode);
        }
        let name = new_item.name.trim().to_string();
        if name.is_empty() {
            return Err(MasterDataError::EmptyName);
        }

        let parent_code = self.validate_parent(kind, new_item.parent_code.as_deref())?;
        let sort_order = match new_item.sort_order {
            Some(order) => order,
            None => self.next_sort_order(kind)?,
        };

        let item = MasterItem {
            kind,
            code: code.clone(),
            name,
            parent_code,
            sort_order,
            active: true,
        };

        let stored = self.repository.insert(item).map_err(|err| match err {
            RepositoryError::Conflict => MasterDataError::Duplicate { kind, code },
            other => MasterDataError::Repository(other),
        })?;
        info!(%kind, code = %stored.code, "master data item created");
        Ok(stored)
    }

    pub fn update(
        &self,
        kind: MasterKind,
        code: &str,
        update: MasterItemUpdate,
    ) -> Result<MasterItem, MasterDataError> {
        let mut item = self.get(kind, code)?;

        if let Some(name) = update.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(MasterDataError::EmptyName);
            }
            item.name = name;
        }
        if update.parent_code.is_some() {
            item.parent_code = self.validate_parent(kind, update.parent_code.as_deref())?;
        }
        if let Some(order) = update.sort_order {
            item.sort_order = order;
        }
        if let Some(active) = update.active {
            item.active = active;
        }

        self.repository.update(item.clone())?;
        info!(%kind, code = %item.code, active = item.active, "master data item updated");
        Ok(item)
    }

    /// Removes a row. Rows that still parent other rows must be re-homed first.
    pub fn delete(&self, kind: MasterKind, code: &str) -> Result<(), MasterDataError> {
        let item = self.get(kind, code)?;

        let children = self.child_count(kind, &item.code)?;
        if children > 0 {
            return Err(MasterDataError::HasChildren {
                kind,
                code: item.code,
                children,
            });
        }

        self.repository.remove(kind, &item.code)?;
        info!(%kind, code = %item.code, "master data item deleted");
        Ok(())
    }

    /// Loads catalog rows, skipping codes already present. Parents must precede children.
    pub fn seed(&self, items: Vec<MasterItem>) -> Result<usize, MasterDataError> {
        let mut inserted = 0;
        for mut item in items {
            item.code = normalize_code(&item.code);
            if self.repository.fetch(item.kind, &item.code)?.is_some() {
                debug!(kind = %item.kind, code = %item.code, "seed row already present");
                continue;
            }
            item.parent_code = self.validate_parent(item.kind, item.parent_code.as_deref())?;
            self.repository.insert(item)?;
            inserted += 1;
        }
        info!(inserted, "master data seeded");
        Ok(inserted)
    }

    fn validate_parent(
        &self,
        kind: MasterKind,
        parent_code: Option<&str>,
    ) -> Result<Option<String>, MasterDataError> {
        let parent_code = parent_code
            .map(normalize_code)
            .filter(|code| !code.is_empty());

        match (kind.parent(), parent_code) {
            (Some(parent_kind), Some(code)) => {
                if self.repository.fetch(parent_kind, &code)?.is_none() {
                    return Err(MasterDataError::ParentNotFound {
                        kind: parent_kind,
                        code,
                    });
                }
                Ok(Some(code))
            }
            (Some(parent_kind), None) => Err(MasterDataError::MissingParent { kind: parent_kind }),
            (None, Some(_)) => Err(MasterDataError::UnexpectedParent { kind }),
            (None, None) => Ok(None),
        }
    }

    fn next_sort_order(&self, kind: MasterKind) -> Result<u32, MasterDataError> {
        let max = self
            .repository
            .list(kind)?
            .iter()
            .map(|item| item.sort_order)
            .max();
        Ok(max.map_or(1, |order| order.saturating_add(1)))
    }

    fn child_count(&self, kind: MasterKind, code: &str) -> Result<usize, MasterDataError> {
        let mut count = 0;
        for child_kind in MasterKind::ALL
            .iter()
            .copied()
            .filter(|candidate| candidate.parent() == Some(kind))
        {
            count += self
                .repository
                .list(child_kind)?
                .iter()
                .filter(|item| item.parent_code.as_deref() == Some(code))
                .count();
        }
        Ok(count)
    }
}

/// Error raised by the master-data service.
#[derive(Debug, thiserror::Error)]
pub enum MasterDataError {
    #[error(transparent)]
    UnknownKind(#[from] UnknownMasterKind),
    #[error("code must not be empty")]
    EmptyCode,
    #[error("name must not be empty")]
    EmptyName,
    #[error("a parent code from {kind} is required")]
    MissingParent { kind: MasterKind },
    #[error("{kind} rows do not take a parent code")]
    UnexpectedParent { kind: MasterKind },
    #[error("parent {code} not found in {kind}")]
    ParentNotFound { kind: MasterKind, code: String },
    #[error("{code} not found in {kind}")]
    NotFound { kind: MasterKind, code: String },
    #[error("{code} already exists in {kind}")]
    Duplicate { kind: MasterKind, code: String },
    #[error("{code} in {kind} still has {children} dependent rows")]
    HasChildren {
        kind: MasterKind,
        code: String,
        children: usize,
    },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
