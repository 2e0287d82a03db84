//! Error types for guest-state

use thiserror::Error;

/// Errors that can occur when reading or writing guest records
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// No event with the given id
    #[error("Event not found: {event_id}")]
    EventNotFound { event_id: String },

    /// No recipient with the given id under the event
    #[error("Recipient not found: {recipient_id} (event {event_id})")]
    RecipientNotFound {
        event_id: String,
        recipient_id: String,
    },

    /// Backing store failure (connection, query, permission)
    #[error("Guest store backend failed: {0}")]
    Backend(String),

    /// Lookup did not complete before the deadline
    #[error("Guest store lookup timed out")]
    Timeout,
}

impl StorageError {
    /// True for the two not-found variants.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StorageError::EventNotFound { .. } | StorageError::RecipientNotFound { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display_names_ids() {
        let err = StorageError::RecipientNotFound {
            event_id: "evt-1".to_string(),
            recipient_id: "guest-9".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("guest-9"));
        assert!(msg.contains("evt-1"));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_backend_is_not_not_found() {
        let err = StorageError::Backend("connection reset".to_string());
        assert!(err.to_string().contains("connection reset"));
        assert!(!err.is_not_found());
        assert!(!StorageError::Timeout.is_not_found());
    }
}
