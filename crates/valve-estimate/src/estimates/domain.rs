use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::spec::TagSpec;
use super::workflow::{Actor, EstimateStatus, StatusAction};

/// Identifier wrapper for estimate sheets (`EST-YYYYMMDD-NNNN`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EstimateNo(pub String);

impl std::fmt::Display for EstimateNo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable identifier of a line item; unlike `sheet_no` it survives reordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(pub String);

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub company: String,
    pub contact: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Header record of one estimate with its valve line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateSheet {
    pub estimate_no: EstimateNo,
    pub customer: CustomerInfo,
    pub project: String,
    #[serde(default)]
    pub remarks: Option<String>,
    pub status: EstimateStatus,
    #[serde(default)]
    pub assignee: Option<String>,
    pub items: Vec<EstimateItem>,
    pub history: Vec<StatusChange>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EstimateSheet {
    pub fn item(&self, item_id: &ItemId) -> Option<&EstimateItem> {
        self.items.iter().find(|item| &item.item_id == item_id)
    }

    pub(crate) fn item_mut(&mut self, item_id: &ItemId) -> Option<&mut EstimateItem> {
        self.items.iter_mut().find(|item| &item.item_id == item_id)
    }

    pub fn total_quantity(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |total, item| total.saturating_add(item.quantity()))
    }

    /// Sum of priced line amounts; `None` while any item is unpriced.
    pub fn total_amount(&self) -> Option<u64> {
        self.items
            .iter()
            .map(EstimateItem::amount)
            .try_fold(0u64, |total, amount| amount.map(|a| total.saturating_add(a)))
    }

    /// Finds a tag anywhere on the sheet, matching the trimmed tag number case-insensitively.
    pub fn find_tag(&self, tag_no: &str) -> Option<(&EstimateItem, &TagSpec)> {
        let wanted = normalize_tag_no(tag_no);
        self.items.iter().find_map(|item| {
            item.tags
                .iter()
                .find(|tag| normalize_tag_no(&tag.tag_no) == wanted)
                .map(|tag| (item, tag))
        })
    }

    pub fn summary(&self) -> EstimateSummary {
        EstimateSummary {
            estimate_no: self.estimate_no.clone(),
            company: self.customer.company.clone(),
            project: self.project.clone(),
            status: self.status,
            status_label: self.status.label(),
            assignee: self.assignee.clone(),
            item_count: self.items.len(),
            total_quantity: self.total_quantity(),
            total_amount: self.total_amount(),
            updated_at: self.updated_at,
        }
    }
}

pub(crate) fn normalize_tag_no(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

/// One valve line item ("sheet") of an estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateItem {
    pub item_id: ItemId,
    pub sheet_no: u32,
    pub valve_type: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub unit_price: Option<u64>,
    pub tags: Vec<TagSpec>,
}

impl EstimateItem {
    pub fn quantity(&self) -> u32 {
        self.tags
            .iter()
            .fold(0u32, |total, tag| total.saturating_add(tag.quantity))
    }

    pub fn amount(&self) -> Option<u64> {
        self.unit_price
            .map(|price| price.saturating_mul(u64::from(self.quantity())))
    }
}

/// Audit entry appended on every workflow transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    pub from: EstimateStatus,
    pub to: EstimateStatus,
    pub action: StatusAction,
    pub actor: Actor,
    #[serde(default)]
    pub note: Option<String>,
    pub at: DateTime<Utc>,
}

/// Payload used to open a new draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEstimate {
    pub customer: CustomerInfo,
    pub project: String,
    #[serde(default)]
    pub remarks: Option<String>,
}

/// Editable header fields of a draft.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimateHeaderUpdate {
    #[serde(default)]
    pub customer: Option<CustomerInfo>,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEstimateItem {
    pub valve_type: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub tags: Vec<TagSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimateItemUpdate {
    #[serde(default)]
    pub valve_type: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

/// List query mirroring the estimate board filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EstimateQuery {
    #[serde(default)]
    pub status: Option<EstimateStatus>,
    #[serde(default)]
    pub search: Option<String>,
}

impl EstimateQuery {
    pub fn matches(&self, sheet: &EstimateSheet) -> bool {
        if self.status.is_some_and(|status| status != sheet.status) {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => {
                let needle = needle.to_lowercase();
                [
                    sheet.estimate_no.0.as_str(),
                    sheet.customer.company.as_str(),
                    sheet.customer.contact.as_str(),
                    sheet.project.as_str(),
                ]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
            }
            _ => true,
        }
    }
}

/// Row of the estimate list view.
#[derive(Debug, Clone, Serialize)]
pub struct EstimateSummary {
    pub estimate_no: EstimateNo,
    pub company: String,
    pub project: String,
    pub status: EstimateStatus,
    pub status_label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    pub item_count: usize,
    pub total_quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<u64>,
    pub updated_at: DateTime<Utc>,
}
