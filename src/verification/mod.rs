//! Content-addressed verification cache: one shared verdict per normalized text.

pub mod cache;
pub mod error;
pub mod memory;
pub mod nvme;
pub mod record;
pub mod status;
pub mod store;

#[cfg(test)]
mod tests;

pub use cache::{
    ClassificationBreakdown, DEFAULT_STATS_TOP_N, TopVerified, VerificationCache,
    VerificationStats, VerifyOutcome,
};
pub use error::{StoreError, StoreResult, VerificationError};
#[cfg(any(test, feature = "mock"))]
pub use memory::UnreachableStore;
pub use memory::MemoryStore;
pub use nvme::{NvmeStore, StoredRecord};
pub use record::{PostRef, VerificationRecord, VerificationType};
pub use status::{
    VERIFILY_STATUS_ERROR, VERIFILY_STATUS_HEADER, VERIFILY_STATUS_HEALTHY,
    VERIFILY_STATUS_NOT_READY, VERIFILY_STATUS_READY, VerifilyStatus,
};
pub use store::{InsertOutcome, VerificationStore};
