use redis::{AsyncCommands, Client};
use std::sync::Arc;

use crate::models::{Credential, UtilizationEntry};

const ENTRIES_KEY: &str = "utilization:entries";

/// Credential-store contract: lookup by username and a uniqueness-checked
/// insert. Returns false from `insert_user` when the username is already
/// taken; uniqueness rests on that pre-insert check, not on the backend.
#[allow(async_fn_in_trait)]
pub trait CredentialStore {
    async fn find_user(&self, username: &str) -> Result<Option<Credential>, redis::RedisError>;
    async fn insert_user(&self, credential: &Credential) -> Result<bool, redis::RedisError>;
}

/// Redis-backed credential and record stores. Credentials live as JSON under
/// `user:{username}`; utilization entries are an append-only list that is
/// read back in full on every render.
pub struct StoreService {
    client: Arc<Client>,
}

impl StoreService {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }

    pub async fn append_entry(&self, entry: &UtilizationEntry) -> Result<(), redis::RedisError> {
        let mut conn = self.client.get_async_connection().await?;
        conn.rpush(ENTRIES_KEY, encode(entry, "Failed to encode entry")?)
            .await
    }

    /// Full snapshot of the record store, in insertion order. The engine only
    /// ever sees the in-memory entries returned here.
    pub async fn read_all_entries(&self) -> Result<Vec<UtilizationEntry>, redis::RedisError> {
        let mut conn = self.client.get_async_connection().await?;
        let raw: Vec<String> = conn.lrange(ENTRIES_KEY, 0, -1).await?;
        raw.iter()
            .map(|data| decode(data, "Failed to parse entry"))
            .collect()
    }
}

impl CredentialStore for StoreService {
    async fn find_user(&self, username: &str) -> Result<Option<Credential>, redis::RedisError> {
        let mut conn = self.client.get_async_connection().await?;
        let user_data: Option<String> = conn.get(user_key(username)).await?;
        user_data
            .map(|data| decode(&data, "Failed to parse credential"))
            .transpose()
    }

    async fn insert_user(&self, credential: &Credential) -> Result<bool, redis::RedisError> {
        let mut conn = self.client.get_async_connection().await?;
        let key = user_key(&credential.username);
        let exists: bool = conn.exists(&key).await?;
        if exists {
            return Ok(false);
        }
        conn.set::<_, _, ()>(&key, encode(credential, "Failed to encode credential")?)
            .await?;
        Ok(true)
    }
}

fn user_key(username: &str) -> String {
    format!("user:{}", username)
}

fn encode<T: serde::Serialize>(value: &T, context: &'static str) -> Result<String, redis::RedisError> {
    serde_json::to_string(value)
        .map_err(|e| redis::RedisError::from((redis::ErrorKind::TypeError, context, e.to_string())))
}

fn decode<T: serde::de::DeserializeOwned>(
    data: &str,
    context: &'static str,
) -> Result<T, redis::RedisError> {
    serde_json::from_str(data)
        .map_err(|e| redis::RedisError::from((redis::ErrorKind::TypeError, context, e.to_string())))
}

impl Clone for StoreService {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory credential store with the same key scheme, JSON payloads,
    /// and pre-insert existence check as the Redis-backed one.
    #[derive(Default)]
    struct MemoryCredentialStore {
        records: Mutex<HashMap<String, String>>,
    }

    impl CredentialStore for MemoryCredentialStore {
        async fn find_user(
            &self,
            username: &str,
        ) -> Result<Option<Credential>, redis::RedisError> {
            let records = self.records.lock().unwrap();
            records
                .get(&user_key(username))
                .map(|data| decode(data, "Failed to parse credential"))
                .transpose()
        }

        async fn insert_user(&self, credential: &Credential) -> Result<bool, redis::RedisError> {
            let mut records = self.records.lock().unwrap();
            let key = user_key(&credential.username);
            if records.contains_key(&key) {
                return Ok(false);
            }
            records.insert(key, encode(credential, "Failed to encode credential")?);
            Ok(true)
        }
    }

    fn credential(username: &str, password_hash: &str, role: Role) -> Credential {
        Credential {
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn first_registration_succeeds_and_is_retrievable() {
        let store = MemoryCredentialStore::default();
        let jamie = credential("jamie", "hash-1", Role::User);

        assert!(store.insert_user(&jamie).await.unwrap());

        let found = store.find_user("jamie").await.unwrap().unwrap();
        assert_eq!(found.username, "jamie");
        assert_eq!(found.password_hash, "hash-1");
        assert_eq!(found.role, Role::User);
    }

    #[tokio::test]
    async fn duplicate_username_registration_is_rejected() {
        let store = MemoryCredentialStore::default();
        assert!(store
            .insert_user(&credential("jamie", "hash-1", Role::User))
            .await
            .unwrap());

        // Second registration is refused and the stored credential is untouched.
        assert!(!store
            .insert_user(&credential("jamie", "hash-2", Role::Admin))
            .await
            .unwrap());
        let found = store.find_user("jamie").await.unwrap().unwrap();
        assert_eq!(found.password_hash, "hash-1");
        assert_eq!(found.role, Role::User);
    }

    #[tokio::test]
    async fn unknown_username_is_absent() {
        let store = MemoryCredentialStore::default();
        assert!(store.find_user("nobody").await.unwrap().is_none());
    }
}
