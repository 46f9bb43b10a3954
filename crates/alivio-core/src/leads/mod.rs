//! Lead persistence: the two operations this core consumes from the
//! external service, plus the HTTP client implementing them.

pub mod http;
pub mod record;

pub use http::HttpLeadStore;
pub use record::LeadRecord;

use crate::error::StoreError;

/// Seam to the external lead persistence service.
///
/// The email uniqueness check is advisory UX; implementations should also
/// surface insert-time conflicts as `StoreError::DuplicateEmail` so the
/// check-then-insert window cannot silently create duplicates.
pub trait LeadStore: Send {
    /// Whether a lead with this email is already stored.
    fn exists_by_email(&self, email: &str) -> Result<bool, StoreError>;

    /// Persist a new lead. Errors leave no record behind.
    fn insert(&self, record: &LeadRecord) -> Result<LeadRecord, StoreError>;
}
