//! Guest-State: storage boundary for Unveil SMS composition
//!
//! The guest-record store is owned by the wider application. This crate
//! describes only the slice of it the composition engine touches: two reads
//! (event tag/title, recipient notice state) and one idempotent write
//! (compliance notice marked sent).
//!
//! ## Key Components
//!
//! - `EventDirectory`: event lookup by `EventId`
//! - `RecipientLedger`: notice state read and mark-sent write
//! - `fakes`: in-memory implementations for tests and local previews

mod error;
pub mod fakes;
pub mod storage_traits;

pub use error::StorageError;
pub use storage_traits::{
    EventContext, EventDirectory, EventId, RecipientId, RecipientLedger, RecipientNoticeState,
    StorageResult,
};
