//! Scratchpad workspace row model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database representation of a scratchpad entry
///
/// Keys follow the `task:{id}:workspace` scheme; `value` is a JSON object.
/// Expiry is enforced on read.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkspaceRow {
    /// Scoped storage key
    pub key: String,

    /// JSON object payload
    pub value: String,

    /// Expiry timestamp (RFC3339 string)
    pub expires_at: String,

    /// Last write timestamp (RFC3339 string)
    pub updated_at: String,
}

impl WorkspaceRow {
    /// Whether the entry has passed its TTL
    pub fn is_expired(&self) -> bool {
        match chrono::DateTime::parse_from_rfc3339(&self.expires_at) {
            Ok(expires) => expires <= chrono::Utc::now(),
            // Unparseable expiry is treated as expired
            Err(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn test_not_expired() {
        let row = WorkspaceRow {
            key: "task:t1:workspace".to_string(),
            value: "{}".to_string(),
            expires_at: (Utc::now() + Duration::hours(1)).to_rfc3339(),
            updated_at: Utc::now().to_rfc3339(),
        };
        assert!(!row.is_expired());
    }

    #[test]
    fn test_expired() {
        let row = WorkspaceRow {
            key: "task:t1:workspace".to_string(),
            value: "{}".to_string(),
            expires_at: (Utc::now() - Duration::seconds(1)).to_rfc3339(),
            updated_at: Utc::now().to_rfc3339(),
        };
        assert!(row.is_expired());
    }

    #[test]
    fn test_garbage_expiry_counts_as_expired() {
        let row = WorkspaceRow {
            key: "task:t1:workspace".to_string(),
            value: "{}".to_string(),
            expires_at: "someday".to_string(),
            updated_at: Utc::now().to_rfc3339(),
        };
        assert!(row.is_expired());
    }
}
