//! In-memory record store (for development and testing)

use async_trait::async_trait;
use roster_core::{
    NewPrincipal, NewStudent, Principal, PrincipalStore, StoreError, StoreResult, Student,
    StudentStore, StudentUpdate,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    principals: BTreeMap<i64, Principal>,
    students: BTreeMap<i64, Student>,
    next_principal_id: i64,
    next_student_id: i64,
}

/// Principals and students kept in process memory
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PrincipalStore for MemoryStore {
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Principal>> {
        Ok(self.tables.read().await.principals.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<Principal>> {
        let tables = self.tables.read().await;
        Ok(tables
            .principals
            .values()
            .find(|p| p.username == username)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Principal>> {
        let tables = self.tables.read().await;
        Ok(tables
            .principals
            .values()
            .find(|p| p.email == email)
            .cloned())
    }

    async fn insert(&self, principal: NewPrincipal) -> StoreResult<Principal> {
        let mut tables = self.tables.write().await;

        for existing in tables.principals.values() {
            if existing.username == principal.username {
                return Err(StoreError::Duplicate {
                    field: "username".to_string(),
                });
            }
            if existing.email == principal.email {
                return Err(StoreError::Duplicate {
                    field: "email".to_string(),
                });
            }
        }

        tables.next_principal_id += 1;
        let principal = principal.with_id(tables.next_principal_id);
        tables.principals.insert(principal.id, principal.clone());
        Ok(principal)
    }
}

#[async_trait]
impl StudentStore for MemoryStore {
    async fn create(&self, student: NewStudent) -> StoreResult<Student> {
        let mut tables = self.tables.write().await;
        tables.next_student_id += 1;
        let student = student.with_id(tables.next_student_id);
        tables.students.insert(student.id, student.clone());
        Ok(student)
    }

    async fn list(&self) -> StoreResult<Vec<Student>> {
        Ok(self.tables.read().await.students.values().cloned().collect())
    }

    async fn get(&self, id: i64) -> StoreResult<Option<Student>> {
        Ok(self.tables.read().await.students.get(&id).cloned())
    }

    async fn update(&self, id: i64, update: StudentUpdate) -> StoreResult<Option<Student>> {
        let mut tables = self.tables.write().await;
        Ok(tables.students.get_mut(&id).map(|student| {
            update.apply(student);
            student.clone()
        }))
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        Ok(self.tables.write().await.students.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_core::Role;

    fn new_principal(username: &str, email: &str) -> NewPrincipal {
        NewPrincipal {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            role: Role::User,
        }
    }

    #[tokio::test]
    async fn test_principal_insert_and_lookup() {
        let store = MemoryStore::new();

        let alice = store.insert(new_principal("alice", "a@x.com")).await.unwrap();
        let bob = store.insert(new_principal("bob", "b@x.com")).await.unwrap();
        assert_eq!(alice.id, 1);
        assert_eq!(bob.id, 2);

        assert_eq!(store.find_by_id(2).await.unwrap().unwrap().username, "bob");
        assert_eq!(
            store.find_by_username("alice").await.unwrap().unwrap().id,
            1
        );
        assert_eq!(store.find_by_email("b@x.com").await.unwrap().unwrap().id, 2);
        assert!(store.find_by_username("Alice").await.unwrap().is_none());
        assert!(store.find_by_id(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_principal_uniqueness() {
        let store = MemoryStore::new();
        store.insert(new_principal("alice", "a@x.com")).await.unwrap();

        assert_eq!(
            store.insert(new_principal("alice", "other@x.com")).await.unwrap_err(),
            StoreError::Duplicate {
                field: "username".to_string()
            }
        );
        assert_eq!(
            store.insert(new_principal("alicia", "a@x.com")).await.unwrap_err(),
            StoreError::Duplicate {
                field: "email".to_string()
            }
        );
        assert_eq!(store.find_by_username("alice").await.unwrap().unwrap().email, "a@x.com");
    }

    #[tokio::test]
    async fn test_student_crud() {
        let store = MemoryStore::new();

        let created = store
            .create(NewStudent {
                name: "Ann".to_string(),
                email: "ann@school.edu".to_string(),
                age: Some(15),
                grade: None,
            })
            .await
            .unwrap();
        assert_eq!(created.id, 1);

        let updated = store
            .update(
                1,
                StudentUpdate {
                    grade: Some("10".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.grade.as_deref(), Some("10"));
        assert_eq!(updated.age, Some(15));

        assert!(store.update(42, StudentUpdate::default()).await.unwrap().is_none());
        assert_eq!(store.list().await.unwrap().len(), 1);
        assert!(store.delete(1).await.unwrap());
        assert!(!store.delete(1).await.unwrap());
        assert!(store.get(1).await.unwrap().is_none());
    }
}
