//! Master-data tables (valve types plus Body/Trim/Act/Acc subtypes) feeding the estimate
//! forms, including parent/child cascades such as size unit → body size → port size.

pub mod domain;
pub mod repository;
pub mod router;
pub mod seed;
pub mod service;

pub use domain::{
    MasterCatalogView, MasterCategory, MasterFilter, MasterItem, MasterItemUpdate, MasterKind,
    MasterTableView, NewMasterItem, UnknownMasterKind,
};
pub use repository::MasterDataRepository;
pub use router::master_router;
pub use seed::standard_catalog;
pub use service::{MasterDataError, MasterDataService};
