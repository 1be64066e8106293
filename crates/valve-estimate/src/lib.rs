//! Estimate request, specification, and tracking for industrial control valves.
//!
//! Customers draft multi-item estimate requests against the master-data catalog, staff
//! price them, and the workflow module governs every status change. Storage lives behind
//! repository traits; [`memory`] holds the in-process adapters used by the service binary
//! and the test suites.

pub mod attachments;
pub mod config;
pub mod documents;
pub mod error;
pub mod estimates;
pub mod master;
pub mod memory;
pub mod repository;
pub mod telemetry;
