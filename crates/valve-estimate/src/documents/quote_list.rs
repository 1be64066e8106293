use serde::Serialize;

use super::DocumentError;
use crate::estimates::{EstimateItem, EstimateNo, EstimateSheet, EstimateStatus};
use crate::master::{MasterDataRepository, MasterDataService, MasterKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuoteLine {
    pub sheet_no: u32,
    pub valve_type: String,
    pub valve_type_name: String,
    pub tag_nos: Vec<String>,
    pub quantity: u32,
    pub unit_price: u64,
    pub amount: u64,
}

/// Priced summary handed to the customer once staff complete the estimate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuoteList {
    pub estimate_no: EstimateNo,
    pub company: String,
    pub project: String,
    pub status: EstimateStatus,
    pub lines: Vec<QuoteLine>,
    pub total_quantity: u32,
    pub total_amount: u64,
}

impl QuoteList {
    pub fn build<M>(
        sheet: &EstimateSheet,
        master: &MasterDataService<M>,
    ) -> Result<Self, DocumentError>
    where
        M: MasterDataRepository + 'static,
    {
        if !matches!(
            sheet.status,
            EstimateStatus::Completed | EstimateStatus::Ordered
        ) {
            return Err(DocumentError::QuoteUnavailable(sheet.status));
        }

        let mut items: Vec<&EstimateItem> = sheet.items.iter().collect();
        items.sort_by_key(|item| item.sheet_no);

        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            let unit_price = item
                .unit_price
                .ok_or(DocumentError::Unpriced(item.sheet_no))?;
            let quantity = item.quantity();
            let valve_type_name = master
                .lookup(MasterKind::ValveType, &item.valve_type)?
                .map(|entry| entry.name)
                .unwrap_or_else(|| item.valve_type.clone());

            lines.push(QuoteLine {
                sheet_no: item.sheet_no,
                valve_type: item.valve_type.clone(),
                valve_type_name,
                tag_nos: item.tags.iter().map(|tag| tag.tag_no.clone()).collect(),
                quantity,
                unit_price,
                amount: unit_price.saturating_mul(u64::from(quantity)),
            });
        }

        let total_quantity = lines
            .iter()
            .fold(0u32, |total, line| total.saturating_add(line.quantity));
        let total_amount = lines
            .iter()
            .fold(0u64, |total, line| total.saturating_add(line.amount));

        Ok(Self {
            estimate_no: sheet.estimate_no.clone(),
            company: sheet.customer.company.clone(),
            project: sheet.project.clone(),
            status: sheet.status,
            lines,
            total_quantity,
            total_amount,
        })
    }

    /// Spreadsheet rendering with a trailing total row.
    pub fn to_csv(&self) -> Result<String, DocumentError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record([
            "Sheet No",
            "Valve Type",
            "Tag No",
            "Quantity",
            "Unit Price",
            "Amount",
        ])?;

        for line in &self.lines {
            writer.write_record([
                line.sheet_no.to_string(),
                line.valve_type_name.clone(),
                line.tag_nos.join(" / "),
                line.quantity.to_string(),
                line.unit_price.to_string(),
                line.amount.to_string(),
            ])?;
        }

        writer.write_record([
            String::new(),
            "TOTAL".to_string(),
            String::new(),
            self.total_quantity.to_string(),
            String::new(),
            self.total_amount.to_string(),
        ])?;

        let bytes = writer.into_inner().map_err(|err| err.into_error())?;
        Ok(String::from_utf8(bytes)?)
    }
}
