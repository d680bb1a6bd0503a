//! Item records mirrored from persistent storage.

use serde::Serialize;
use time::OffsetDateTime;

/// A stored item. Immutable after creation; the service layer only reads.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemRecord {
    /// Store-assigned, monotonically increasing.
    pub id: i64,
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
