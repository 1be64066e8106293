//! Downstream documents generated from an estimate: per-tag data sheets and the priced
//! quote list.

mod data_sheet;
mod quote_list;

pub use data_sheet::{DataSheet, DataSheetPage, DataSheetRow, DataSheetSection};
pub use quote_list::{QuoteLine, QuoteList};

use crate::estimates::EstimateStatus;
use crate::master::MasterDataError;

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("quote list is only issued for completed or ordered estimates (status: {})", .0.label())]
    QuoteUnavailable(EstimateStatus),
    #[error("sheet {0} has no unit price")]
    Unpriced(u32),
    #[error(transparent)]
    Master(#[from] MasterDataError),
    #[error("failed to render csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to render csv: {0}")]
    Io(#[from] std::io::Error),
    #[error("rendered csv was not utf-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}
