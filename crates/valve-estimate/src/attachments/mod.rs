//! Files uploaded against an estimate (customer drawings, specification sheets).

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;
pub mod store;

#[cfg(test)]
mod tests;

pub use domain::{sanitize_file_name, Attachment, AttachmentContent, AttachmentId};
pub use repository::AttachmentRepository;
pub use router::attachment_router;
pub use service::{AttachmentError, AttachmentService};
pub use store::{AttachmentStore, DiskAttachmentStore, StoreError};
