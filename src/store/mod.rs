//! Storage backends for identity records.
//!
//! - Postgres: durable store used by the server
//! - Memory: in-process store for tests and local experiments
//!
//! Records are keyed by a unique `name`. The credential is digested before it
//! reaches any backend; both sides of every credential comparison are SHA-256
//! digests, the raw value is never persisted.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

/// A live identity record as returned by a store.
///
/// The stored credential digest stays inside the store; callers only ever see
/// the public fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: Uuid,
    pub name: String,
    pub profile: Option<String>,
}

/// Fields required to create a record.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub credential: String,
    pub profile: Option<String>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record already exists")]
    Duplicate,

    #[error("record not found")]
    NotFound,

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Digest a credential for storage or lookup.
pub(crate) fn digest_credential(credential: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(credential.as_bytes());
    hasher.finalize().to_vec()
}

/// Contract for identity record storage.
///
/// Each individual call is atomic; there are no cross-call transactions.
/// Paths that authorize an action must use the credential-qualified lookups,
/// never `find_by_name`, so authorization can't ride on a stale credential.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up a record by name only. Registration uniqueness checks only.
    async fn find_by_name(&self, name: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Look up a record by name and credential. Returns the record only when
    /// the supplied credential matches the stored digest exactly.
    async fn find_by_name_and_credential(
        &self,
        name: &str,
        credential: &str,
    ) -> Result<Option<UserRecord>, StoreError>;

    /// Create a record. Fails with [`StoreError::Duplicate`] if the name is
    /// already live.
    async fn insert(&self, user: NewUser) -> Result<UserRecord, StoreError>;

    /// Persist name/profile of an existing record, addressed by id.
    ///
    /// Fails with [`StoreError::Duplicate`] when a rename collides with a
    /// live name and [`StoreError::NotFound`] when the record vanished.
    async fn update(&self, record: &UserRecord) -> Result<(), StoreError>;

    /// Atomic find-and-remove by name and credential.
    async fn delete_by_name_and_credential(
        &self,
        name: &str,
        credential: &str,
    ) -> Result<Option<UserRecord>, StoreError>;
}
