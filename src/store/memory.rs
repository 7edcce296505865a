//! In-memory credential store.
//!
//! Backs the service-layer tests and local experiments with the same
//! uniqueness and digest rules as the Postgres store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

use super::{digest_credential, CredentialStore, NewUser, StoreError, UserRecord};

struct StoredUser {
    record: UserRecord,
    credential_hash: Vec<u8>,
}

/// `HashMap`-backed store guarded by a mutex.
///
/// The lock is only held for in-memory work, never across an await point.
#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<HashMap<Uuid, StoredUser>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_users<T>(&self, f: impl FnOnce(&mut HashMap<Uuid, StoredUser>) -> T) -> T {
        // A poisoned lock only means a writer panicked mid-test; the map
        // itself is still usable.
        let mut users = self.users.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut users)
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.with_users(|users| {
            users
                .values()
                .find(|user| user.record.name == name)
                .map(|user| user.record.clone())
        }))
    }

    async fn find_by_name_and_credential(
        &self,
        name: &str,
        credential: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        let hash = digest_credential(credential);
        Ok(self.with_users(|users| {
            users
                .values()
                .find(|user| user.record.name == name && user.credential_hash == hash)
                .map(|user| user.record.clone())
        }))
    }

    async fn insert(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        self.with_users(|users| {
            if users.values().any(|stored| stored.record.name == user.name) {
                return Err(StoreError::Duplicate);
            }

            let record = UserRecord {
                id: Uuid::new_v4(),
                name: user.name,
                profile: user.profile,
            };
            users.insert(
                record.id,
                StoredUser {
                    record: record.clone(),
                    credential_hash: digest_credential(&user.credential),
                },
            );
            Ok(record)
        })
    }

    async fn update(&self, record: &UserRecord) -> Result<(), StoreError> {
        self.with_users(|users| {
            if users
                .values()
                .any(|stored| stored.record.name == record.name && stored.record.id != record.id)
            {
                return Err(StoreError::Duplicate);
            }

            let Some(stored) = users.get_mut(&record.id) else {
                return Err(StoreError::NotFound);
            };
            stored.record.name = record.name.clone();
            stored.record.profile = record.profile.clone();
            Ok(())
        })
    }

    async fn delete_by_name_and_credential(
        &self,
        name: &str,
        credential: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        let hash = digest_credential(credential);
        Ok(self.with_users(|users| {
            let id = users
                .values()
                .find(|user| user.record.name == name && user.credential_hash == hash)
                .map(|user| user.record.id)?;
            users.remove(&id).map(|user| user.record)
        }))
    }
}
