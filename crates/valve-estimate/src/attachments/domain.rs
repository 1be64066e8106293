use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::estimates::EstimateNo;

/// Identifier wrapper for uploaded files (`att-NNNNNN`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AttachmentId(pub String);

impl std::fmt::Display for AttachmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Metadata of a file uploaded against an estimate; the bytes live in an
/// [`AttachmentStore`](super::AttachmentStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub attachment_id: AttachmentId,
    pub estimate_no: EstimateNo,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: u64,
    #[serde(skip_serializing)]
    pub storage_key: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Payload returned by a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentContent {
    pub attachment: Attachment,
    pub bytes: Vec<u8>,
}

/// Reduces a client-supplied name to its final path component.
///
/// Both `/` and `\` count as separators.
pub fn sanitize_file_name(raw: &str) -> Option<String> {
    let name = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim()
        .trim_matches(char::is_control);
    match name {
        "" | "." | ".." => None,
        other => Some(other.to_string()),
    }
}
