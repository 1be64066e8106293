use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::domain::{
    normalize_tag_no, CustomerInfo, EstimateHeaderUpdate, EstimateItem, EstimateItemUpdate, EstimateNo,
    EstimateQuery, EstimateSheet, EstimateSummary, ItemId, NewEstimate, NewEstimateItem,
    StatusChange,
};
use super::ordering::{self, OrderingError};
use super::repository::EstimateRepository;
use super::spec::{SpecReference, TagSpec};
use super::workflow::{Actor, EstimateStatus, StatusAction, WorkflowError};
use crate::documents::{DataSheet, DocumentError, QuoteList};
use crate::master::{MasterDataError, MasterDataRepository, MasterDataService, MasterKind};
use crate::repository::RepositoryError;

/// Upper bound on the quantity of a single tag.
pub const MAX_TAG_QUANTITY: u32 = 9_999;

/// Transition request posted to the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCommand {
    pub action: StatusAction,
    pub actor: Actor,
    #[serde(default)]
    pub note: Option<String>,
}

/// Service composing the estimate repository, master-data lookups, and the workflow rules.
pub struct EstimateService<R, M> {
    repository: Arc<R>,
    master: Arc<MasterDataService<M>>,
    estimate_sequence: Mutex<DailySequence>,
    item_sequence: AtomicU64,
}

/// Per-day counter behind the `NNNN` suffix of estimate numbers.
#[derive(Debug)]
struct DailySequence {
    date: NaiveDate,
    next: u32,
}

impl DailySequence {
    fn take(&mut self, today: NaiveDate) -> u32 {
        if self.date != today {
            self.date = today;
            self.next = 1;
        }
        let id = self.next;
        self.next = self.next.saturating_add(1);
        id
    }
}

impl<R, M> EstimateService<R, M>
where
    R: EstimateRepository + 'static,
    M: MasterDataRepository + 'static,
{
    pub fn new(repository: Arc<R>, master: Arc<MasterDataService<M>>) -> Self {
        Self {
            repository,
            master,
            estimate_sequence: Mutex::new(DailySequence {
                date: Utc::now().date_naive(),
                next: 1,
            }),
            item_sequence: AtomicU64::new(1),
        }
    }

    pub fn master(&self) -> &MasterDataService<M> {
        &self.master
    }

    fn next_estimate_no(&self) -> EstimateNo {
        let today = Utc::now().date_naive();
        // Past 9999 numbers in one day the suffix widens to five digits.
        let id = self
            .estimate_sequence
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take(today);
        EstimateNo(format!("EST-{}-{id:04}", today.format("%Y%m%d")))
    }

    fn next_item_id(&self) -> ItemId {
        let id = self.item_sequence.fetch_add(1, Ordering::Relaxed);
        ItemId(format!("itm-{id:06}"))
    }

    /// Open a new draft for a customer.
    pub fn create(&self, new_estimate: NewEstimate) -> Result<EstimateSheet, EstimateServiceError> {
        let NewEstimate {
            customer,
            project,
            remarks,
        } = new_estimate;

        let customer = validate_customer(customer)?;
        let project = non_empty(project, ValidationError::EmptyProject)?;

        let now = Utc::now();
        let mut sheet = EstimateSheet {
            estimate_no: self.next_estimate_no(),
            customer,
            project,
            remarks: remarks.and_then(trimmed),
            status: EstimateStatus::Draft,
            assignee: None,
            items: Vec::new(),
            history: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        // Numbers restart with the process; skip past any that survived in storage.
        let stored = loop {
            match self.repository.insert(sheet.clone()) {
                Ok(stored) => break stored,
                Err(RepositoryError::Conflict) => {
                    warn!(estimate_no = %sheet.estimate_no, "estimate number taken, retrying");
                    sheet.estimate_no = self.next_estimate_no();
                }
                Err(other) => return Err(other.into()),
            }
        };

        info!(estimate_no = %stored.estimate_no, company = %stored.customer.company, "estimate draft created");
        Ok(stored)
    }

    pub fn get(&self, estimate_no: &EstimateNo) -> Result<EstimateSheet, EstimateServiceError> {
        self.repository
            .fetch(estimate_no)?
            .ok_or_else(|| EstimateServiceError::NotFound(estimate_no.clone()))
    }

    /// Summaries matching `query`, newest first.
    pub fn list(&self, query: &EstimateQuery) -> Result<Vec<EstimateSummary>, EstimateServiceError> {
        let mut sheets: Vec<EstimateSheet> = self
            .repository
            .list()?
            .into_iter()
            .filter(|sheet| query.matches(sheet))
            .collect();
        sheets.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.estimate_no.cmp(&a.estimate_no))
        });
        Ok(sheets.iter().map(EstimateSheet::summary).collect())
    }

    pub fn update_header(
        &self,
        estimate_no: &EstimateNo,
        update: EstimateHeaderUpdate,
    ) -> Result<EstimateSheet, EstimateServiceError> {
        self.edit_draft(estimate_no, |sheet| {
            if let Some(customer) = update.customer {
                sheet.customer = validate_customer(customer)?;
            }
            if let Some(project) = update.project {
                sheet.project = non_empty(project, ValidationError::EmptyProject)?;
            }
            if let Some(remarks) = update.remarks {
                sheet.remarks = trimmed(remarks);
            }
            Ok(())
        })
    }

    /// Discard a draft entirely.
    pub fn delete(&self, estimate_no: &EstimateNo) -> Result<(), EstimateServiceError> {
        let removed = self
            .repository
            .remove_if(estimate_no, |sheet| -> Result<(), EstimateServiceError> {
                ensure_status(sheet, EstimateStatus::Draft)
            })?;
        if !removed {
            return Err(EstimateServiceError::NotFound(estimate_no.clone()));
        }
        info!(%estimate_no, "estimate draft deleted");
        Ok(())
    }

    /// Append a valve line item; it receives the next sheet number.
    pub fn add_item(
        &self,
        estimate_no: &EstimateNo,
        new_item: NewEstimateItem,
    ) -> Result<EstimateItem, EstimateServiceError> {
        let item_id = self.next_item_id();
        let sheet = self.edit_draft(estimate_no, |sheet| {
            let valve_type = normalize_code(&new_item.valve_type, ValidationError::EmptyValveType)?;
            let mut tags = Vec::with_capacity(new_item.tags.len());
            for tag in new_item.tags {
                let tag = prepare_tag(tag)?;
                ensure_unique_tag(sheet, &tags, &tag.tag_no, None)?;
                tags.push(tag);
            }

            sheet.items.push(EstimateItem {
                item_id: item_id.clone(),
                sheet_no: 0,
                valve_type,
                note: new_item.note.and_then(trimmed),
                unit_price: None,
                tags,
            });
            ordering::renumber(&mut sheet.items);
            Ok(())
        })?;

        let item = sheet
            .item(&item_id)
            .cloned()
            .ok_or_else(|| EstimateServiceError::ItemNotFound(item_id.clone()))?;
        info!(%estimate_no, item_id = %item.item_id, sheet_no = item.sheet_no, "line item added");
        Ok(item)
    }

    pub fn update_item(
        &self,
        estimate_no: &EstimateNo,
        item_id: &ItemId,
        update: EstimateItemUpdate,
    ) -> Result<EstimateItem, EstimateServiceError> {
        let sheet = self.edit_draft(estimate_no, |sheet| {
            let item = sheet
                .item_mut(item_id)
                .ok_or_else(|| EstimateServiceError::ItemNotFound(item_id.clone()))?;
            if let Some(valve_type) = update.valve_type {
                item.valve_type = normalize_code(&valve_type, ValidationError::EmptyValveType)?;
            }
            if let Some(note) = update.note {
                item.note = trimmed(note);
            }
            Ok(())
        })?;
        item_from(&sheet, item_id)
    }

    pub fn remove_item(
        &self,
        estimate_no: &EstimateNo,
        item_id: &ItemId,
    ) -> Result<EstimateSheet, EstimateServiceError> {
        let sheet = self.edit_draft(estimate_no, |sheet| {
            ordering::remove(&mut sheet.items, item_id)?;
            Ok(())
        })?;
        info!(%estimate_no, %item_id, "line item removed");
        Ok(sheet)
    }

    /// Replace the item order wholesale (drag-and-drop result).
    pub fn reorder_items(
        &self,
        estimate_no: &EstimateNo,
        order: &[ItemId],
    ) -> Result<EstimateSheet, EstimateServiceError> {
        self.edit_draft(estimate_no, |sheet| {
            ordering::reorder(&mut sheet.items, order)?;
            Ok(())
        })
    }

    pub fn move_item(
        &self,
        estimate_no: &EstimateNo,
        item_id: &ItemId,
        position: u32,
    ) -> Result<EstimateSheet, EstimateServiceError> {
        self.edit_draft(estimate_no, |sheet| {
            ordering::move_to(&mut sheet.items, item_id, position)?;
            Ok(())
        })
    }

    pub fn add_tag(
        &self,
        estimate_no: &EstimateNo,
        item_id: &ItemId,
        tag: TagSpec,
    ) -> Result<EstimateItem, EstimateServiceError> {
        let sheet = self.edit_draft(estimate_no, |sheet| {
            let tag = prepare_tag(tag)?;
            ensure_unique_tag(sheet, &[], &tag.tag_no, None)?;
            let item = sheet
                .item_mut(item_id)
                .ok_or_else(|| EstimateServiceError::ItemNotFound(item_id.clone()))?;
            item.tags.push(tag);
            Ok(())
        })?;
        item_from(&sheet, item_id)
    }

    /// Replace a tag's specification; the tag may be renumbered in the process.
    pub fn update_tag(
        &self,
        estimate_no: &EstimateNo,
        item_id: &ItemId,
        tag_no: &str,
        tag: TagSpec,
    ) -> Result<EstimateItem, EstimateServiceError> {
        let sheet = self.edit_draft(estimate_no, |sheet| {
            let tag = prepare_tag(tag)?;
            ensure_unique_tag(sheet, &[], &tag.tag_no, Some(tag_no))?;
            let item = sheet
                .item_mut(item_id)
                .ok_or_else(|| EstimateServiceError::ItemNotFound(item_id.clone()))?;
            let wanted = normalize_tag_no(tag_no);
            let slot = item
                .tags
                .iter_mut()
                .find(|existing| normalize_tag_no(&existing.tag_no) == wanted)
                .ok_or_else(|| EstimateServiceError::TagNotFound(tag_no.trim().to_string()))?;
            *slot = tag;
            Ok(())
        })?;
        item_from(&sheet, item_id)
    }

    pub fn remove_tag(
        &self,
        estimate_no: &EstimateNo,
        item_id: &ItemId,
        tag_no: &str,
    ) -> Result<EstimateItem, EstimateServiceError> {
        let sheet = self.edit_draft(estimate_no, |sheet| {
            let item = sheet
                .item_mut(item_id)
                .ok_or_else(|| EstimateServiceError::ItemNotFound(item_id.clone()))?;
            let wanted = normalize_tag_no(tag_no);
            let before = item.tags.len();
            item.tags
                .retain(|existing| normalize_tag_no(&existing.tag_no) != wanted);
            if item.tags.len() == before {
                return Err(EstimateServiceError::TagNotFound(tag_no.trim().to_string()));
            }
            Ok(())
        })?;
        item_from(&sheet, item_id)
    }

    /// Staff pricing of a line item while the estimate is being processed.
    pub fn price_item(
        &self,
        estimate_no: &EstimateNo,
        item_id: &ItemId,
        unit_price: u64,
    ) -> Result<EstimateItem, EstimateServiceError> {
        if unit_price == 0 {
            return Err(ValidationError::ZeroPrice.into());
        }
        let sheet = self.edit(estimate_no, EstimateStatus::Processing, |sheet| {
            let item = sheet
                .item_mut(item_id)
                .ok_or_else(|| EstimateServiceError::ItemNotFound(item_id.clone()))?;
            item.unit_price = Some(unit_price);
            Ok(())
        })?;
        info!(%estimate_no, %item_id, unit_price, "line item priced");
        item_from(&sheet, item_id)
    }

    /// Run a workflow transition, enforcing the guards attached to it.
    pub fn apply(
        &self,
        estimate_no: &EstimateNo,
        command: StatusCommand,
    ) -> Result<EstimateSheet, EstimateServiceError> {
        let StatusCommand {
            action,
            actor,
            note,
        } = command;
        let actor = Actor {
            role: actor.role,
            name: non_empty(actor.name, ValidationError::EmptyActor)?,
        };

        let mut transition = None;
        let sheet = self
            .repository
            .modify(estimate_no, |sheet| -> Result<(), EstimateServiceError> {
                let from = sheet.status;
                let to = action.apply(from, actor.role)?;

                match action {
                    StatusAction::Submit => self.validate_submission(sheet)?,
                    StatusAction::StartProcessing => sheet.assignee = Some(actor.name.clone()),
                    StatusAction::RevertToRequested => sheet.assignee = None,
                    StatusAction::Complete => ensure_priced(sheet)?,
                    StatusAction::CancelRequest
                    | StatusAction::RevertToProcessing
                    | StatusAction::Order
                    | StatusAction::CancelOrder => {}
                }

                let now = Utc::now();
                sheet.status = to;
                sheet.updated_at = now;
                sheet.history.push(StatusChange {
                    from,
                    to,
                    action,
                    actor: actor.clone(),
                    note: note.and_then(trimmed),
                    at: now,
                });
                transition = Some((from, to));
                Ok(())
            })?
            .ok_or_else(|| EstimateServiceError::NotFound(estimate_no.clone()))?;

        if let Some((from, to)) = transition {
            info!(
                %estimate_no,
                action = action.label(),
                from = from.label(),
                to = to.label(),
                actor = %actor.name,
                "estimate status changed"
            );
        }
        Ok(sheet)
    }

    pub fn data_sheet(&self, estimate_no: &EstimateNo) -> Result<DataSheet, EstimateServiceError> {
        let sheet = self.get(estimate_no)?;
        Ok(DataSheet::build(&sheet, &self.master)?)
    }

    pub fn quote_list(&self, estimate_no: &EstimateNo) -> Result<QuoteList, EstimateServiceError> {
        let sheet = self.get(estimate_no)?;
        Ok(QuoteList::build(&sheet, &self.master)?)
    }

    /// Checks every master-data reference and cascade on the sheet.
    pub fn validate_submission(&self, sheet: &EstimateSheet) -> Result<(), EstimateServiceError> {
        if sheet.items.is_empty() {
            return Err(ValidationError::NoItems.into());
        }

        for item in &sheet.items {
            if item.tags.is_empty() {
                return Err(ValidationError::ItemWithoutTags {
                    sheet_no: item.sheet_no,
                }
                .into());
            }

            self.ensure_reference(
                None,
                SpecReference {
                    kind: MasterKind::ValveType,
                    code: &item.valve_type,
                },
            )?;

            for tag in &item.tags {
                for reference in tag.references() {
                    self.ensure_reference(Some(&tag.tag_no), reference)?;
                }
                for (child, parent) in tag.cascades() {
                    let stored = self.master.get(child.kind, child.code)?;
                    if stored.parent_code.as_deref() != Some(parent.code) {
                        return Err(ValidationError::CascadeMismatch {
                            tag_no: tag.tag_no.clone(),
                            kind: child.kind,
                            code: child.code.to_string(),
                            parent_kind: parent.kind,
                            parent_code: parent.code.to_string(),
                        }
                        .into());
                    }
                }
            }
        }
        Ok(())
    }

    fn ensure_reference(
        &self,
        tag_no: Option<&str>,
        reference: SpecReference<'_>,
    ) -> Result<(), EstimateServiceError> {
        match self.master.lookup(reference.kind, reference.code)? {
            Some(item) if item.active => Ok(()),
            Some(_) => Err(ValidationError::InactiveReference {
                tag_no: tag_no.map(str::to_string),
                kind: reference.kind,
                code: reference.code.to_string(),
            }
            .into()),
            None => Err(ValidationError::UnknownReference {
                tag_no: tag_no.map(str::to_string),
                kind: reference.kind,
                code: reference.code.to_string(),
            }
            .into()),
        }
    }

    fn edit_draft<F>(
        &self,
        estimate_no: &EstimateNo,
        change: F,
    ) -> Result<EstimateSheet, EstimateServiceError>
    where
        F: FnOnce(&mut EstimateSheet) -> Result<(), EstimateServiceError>,
    {
        self.edit(estimate_no, EstimateStatus::Draft, change)
    }

    fn edit<F>(
        &self,
        estimate_no: &EstimateNo,
        required: EstimateStatus,
        change: F,
    ) -> Result<EstimateSheet, EstimateServiceError>
    where
        F: FnOnce(&mut EstimateSheet) -> Result<(), EstimateServiceError>,
    {
        self.repository
            .modify(estimate_no, |sheet| -> Result<(), EstimateServiceError> {
                ensure_status(sheet, required)?;
                change(sheet)?;
                sheet.updated_at = Utc::now();
                Ok(())
            })?
            .ok_or_else(|| EstimateServiceError::NotFound(estimate_no.clone()))
    }
}

fn ensure_status(sheet: &EstimateSheet, required: EstimateStatus) -> Result<(), EstimateServiceError> {
    if sheet.status == required {
        Ok(())
    } else {
        Err(EstimateServiceError::NotEditable {
            status: sheet.status,
            required,
        })
    }
}

fn ensure_priced(sheet: &EstimateSheet) -> Result<(), EstimateServiceError> {
    let unpriced: Vec<u32> = sheet
        .items
        .iter()
        .filter(|item| item.unit_price.is_none())
        .map(|item| item.sheet_no)
        .collect();
    if unpriced.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::UnpricedItems { sheet_nos: unpriced }.into())
    }
}

fn ensure_unique_tag(
    sheet: &EstimateSheet,
    pending: &[TagSpec],
    tag_no: &str,
    replacing: Option<&str>,
) -> Result<(), EstimateServiceError> {
    let wanted = normalize_tag_no(tag_no);
    if replacing.is_some_and(|current| normalize_tag_no(current) == wanted) {
        return Ok(());
    }
    let taken = sheet.find_tag(tag_no).is_some()
        || pending
            .iter()
            .any(|tag| normalize_tag_no(&tag.tag_no) == wanted);
    if taken {
        Err(ValidationError::DuplicateTagNo(tag_no.to_string()).into())
    } else {
        Ok(())
    }
}

fn prepare_tag(mut tag: TagSpec) -> Result<TagSpec, EstimateServiceError> {
    tag.normalize();
    if tag.tag_no.is_empty() {
        return Err(ValidationError::EmptyTagNo.into());
    }
    if tag.quantity == 0 {
        return Err(ValidationError::ZeroQuantity {
            tag_no: tag.tag_no,
        }
        .into());
    }
    if tag.quantity > MAX_TAG_QUANTITY {
        return Err(ValidationError::QuantityTooLarge {
            tag_no: tag.tag_no,
            max: MAX_TAG_QUANTITY,
        }
        .into());
    }
    if let Some(&field) = tag.fluid.misordered_points().first() {
        return Err(ValidationError::MisorderedProcessPoint {
            tag_no: tag.tag_no.clone(),
            field,
        }
        .into());
    }
    Ok(tag)
}

fn item_from(sheet: &EstimateSheet, item_id: &ItemId) -> Result<EstimateItem, EstimateServiceError> {
    sheet
        .item(item_id)
        .cloned()
        .ok_or_else(|| EstimateServiceError::ItemNotFound(item_id.clone()))
}

fn validate_customer(customer: CustomerInfo) -> Result<CustomerInfo, EstimateServiceError> {
    Ok(CustomerInfo {
        company: non_empty(customer.company, ValidationError::EmptyCompany)?,
        contact: non_empty(customer.contact, ValidationError::EmptyContact)?,
        email: customer.email.and_then(trimmed),
        phone: customer.phone.and_then(trimmed),
    })
}

fn trimmed(raw: String) -> Option<String> {
    let value = raw.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn non_empty(raw: String, err: ValidationError) -> Result<String, EstimateServiceError> {
    trimmed(raw).ok_or_else(|| err.into())
}

fn normalize_code(raw: &str, err: ValidationError) -> Result<String, EstimateServiceError> {
    let code = raw.trim().to_ascii_uppercase();
    if code.is_empty() {
        Err(err.into())
    } else {
        Ok(code)
    }
}

/// Input problems reported back to the form.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("customer company is required")]
    EmptyCompany,
    #[error("customer contact is required")]
    EmptyContact,
    #[error("project name is required")]
    EmptyProject,
    #[error("valve type is required")]
    EmptyValveType,
    #[error("tag number is required")]
    EmptyTagNo,
    #[error("actor name is required")]
    EmptyActor,
    #[error("tag {tag_no} must have a quantity of at least 1")]
    ZeroQuantity { tag_no: String },
    #[error("tag {tag_no} quantity exceeds the maximum of {max}")]
    QuantityTooLarge { tag_no: String, max: u32 },
    #[error("tag number {0} is already used on this estimate")]
    DuplicateTagNo(String),
    #[error("tag {tag_no}: {field} min/normal/max are out of order")]
    MisorderedProcessPoint { tag_no: String, field: &'static str },
    #[error("estimate has no line items")]
    NoItems,
    #[error("sheet {sheet_no} has no tags")]
    ItemWithoutTags { sheet_no: u32 },
    #[error("{}{code} is not a known {kind} code", tag_prefix(.tag_no))]
    UnknownReference {
        tag_no: Option<String>,
        kind: MasterKind,
        code: String,
    },
    #[error("{}{code} is no longer offered in {kind}", tag_prefix(.tag_no))]
    InactiveReference {
        tag_no: Option<String>,
        kind: MasterKind,
        code: String,
    },
    #[error("tag {tag_no}: {kind} {code} does not belong to {parent_kind} {parent_code}")]
    CascadeMismatch {
        tag_no: String,
        kind: MasterKind,
        code: String,
        parent_kind: MasterKind,
        parent_code: String,
    },
    #[error("unit price must be greater than zero")]
    ZeroPrice,
    #[error("sheets {sheet_nos:?} are not priced yet")]
    UnpricedItems { sheet_nos: Vec<u32> },
}

fn tag_prefix(tag_no: &Option<String>) -> String {
    tag_no
        .as_deref()
        .map(|tag| format!("tag {tag}: "))
        .unwrap_or_default()
}

/// Error raised by the estimate service.
#[derive(Debug, thiserror::Error)]
pub enum EstimateServiceError {
    #[error("estimate {0} not found")]
    NotFound(EstimateNo),
    #[error("line item {0} not found")]
    ItemNotFound(ItemId),
    #[error("tag {0} not found")]
    TagNotFound(String),
    #[error("estimate is {}; this change requires {}", .status.label(), .required.label())]
    NotEditable {
        status: EstimateStatus,
        required: EstimateStatus,
    },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Ordering(#[from] OrderingError),
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Master(#[from] MasterDataError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
