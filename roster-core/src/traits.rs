//! Core trait definitions

use crate::error::StoreResult;
use crate::types::*;
use async_trait::async_trait;

/// Persistent home of registered principals
///
/// Implementations must enforce username and email uniqueness themselves:
/// `insert` fails with [`crate::StoreError::Duplicate`] instead of overwriting.
#[async_trait]
pub trait PrincipalStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Principal>>;

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<Principal>>;

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Principal>>;

    async fn insert(&self, principal: NewPrincipal) -> StoreResult<Principal>;
}

/// Student record storage
#[async_trait]
pub trait StudentStore: Send + Sync {
    async fn create(&self, student: NewStudent) -> StoreResult<Student>;

    /// All students, ordered by id
    async fn list(&self) -> StoreResult<Vec<Student>>;

    async fn get(&self, id: i64) -> StoreResult<Option<Student>>;

    /// Returns `None` when no student has this id
    async fn update(&self, id: i64, update: StudentUpdate) -> StoreResult<Option<Student>>;

    /// Returns whether a record was removed
    async fn delete(&self, id: i64) -> StoreResult<bool>;
}
