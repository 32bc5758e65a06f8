//! Key-value store adapter.
//!
//! Every service reads and writes through [`KeyValueStore`]. Hosts supply two
//! of them: a persistent one for business records and a session-scoped one
//! for authentication state. Collections are stored whole, as JSON arrays,
//! and rewritten whole on every change.

use serde::{de::DeserializeOwned, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;

use crate::error::StoreError;
use crate::models::{User, UserType};

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Persistent collection keys.
pub const USERS: &str = "users";
pub const SERVICE_REQUESTS: &str = "serviceRequests";
pub const APPOINTMENTS: &str = "appointments";
pub const POINTS_HISTORY: &str = "pointsHistory";

pub const COLLECTIONS: [&str; 4] = [USERS, SERVICE_REQUESTS, APPOINTMENTS, POINTS_HISTORY];

/// Session-scoped keys.
pub const CURRENT_USER: &str = "currentUser";
pub const LOGIN_OTP: &str = "loginOTP";
pub const PENDING_USER: &str = "pendingUser";
pub const REGISTRATION_OTP: &str = "registrationOTP";
pub const PENDING_REGISTRATION: &str = "pendingRegistration";

pub const DEFAULT_ADMIN_ID: &str = "ADMIN-001";
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@admin.com";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// String-keyed storage. Writes must be visible to the next read.
pub trait KeyValueStore {
    fn get_raw(&self, key: &str) -> StoreResult<Option<String>>;
    fn set_raw(&self, key: &str, value: &str) -> StoreResult<()>;
    fn remove(&self, key: &str) -> StoreResult<()>;
}

/// JSON encode/decode on top of any [`KeyValueStore`].
pub trait JsonStore: KeyValueStore {
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        match self.get_raw(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StoreResult<()> {
        let raw = serde_json::to_string(value)?;
        self.set_raw(key, &raw)
    }
}

impl<S: KeyValueStore + ?Sized> JsonStore for S {}

/// The two scopes handed to every service.
#[derive(Clone, Copy)]
pub struct Stores<'a> {
    pub local: &'a dyn KeyValueStore,
    pub session: &'a dyn KeyValueStore,
}

impl<'a> Stores<'a> {
    pub fn new(local: &'a dyn KeyValueStore, session: &'a dyn KeyValueStore) -> Self {
        Self { local, session }
    }
}

/// Reads a whole collection; an absent key reads as empty.
pub fn load_collection<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> StoreResult<Vec<T>> {
    Ok(store.get_json(key)?.unwrap_or_default())
}

pub fn save_collection<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    items: &[T],
) -> StoreResult<()> {
    store.set_json(key, items)
}

/// Creates missing collections and seeds the default admin account.
///
/// Every page context calls this on entry; repeated calls change nothing.
pub fn init_storage(store: &dyn KeyValueStore) -> StoreResult<()> {
    for key in COLLECTIONS {
        if store.get_raw(key)?.is_none() {
            store.set_raw(key, "[]")?;
            tracing::debug!(collection = key, "initialized empty collection");
        }
    }

    let mut users: Vec<User> = load_collection(store, USERS)?;
    if !users.iter().any(|u| u.email == DEFAULT_ADMIN_EMAIL) {
        users.push(User {
            user_id: DEFAULT_ADMIN_ID.to_string(),
            name: "Admin".to_string(),
            email: DEFAULT_ADMIN_EMAIL.to_string(),
            password: DEFAULT_ADMIN_PASSWORD.to_string(),
            phone: String::new(),
            user_type: UserType::Admin,
            verified: true,
            registered_date: crate::time::now(),
            membership: None,
            points: 0,
            service_history: Vec::new(),
        });
        save_collection(store, USERS, &users)?;
        tracing::info!(email = DEFAULT_ADMIN_EMAIL, "seeded default admin account");
    }
    Ok(())
}

/// In-process store backed by a map, for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every entry, the way a browser session ends.
    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_raw(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set_raw(&self, key: &str, value: &str) -> StoreResult<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn init_creates_collections_and_one_admin() {
        let store = MemoryStore::new();
        init_storage(&store).unwrap();
        init_storage(&store).unwrap();

        for key in COLLECTIONS {
            assert!(store.contains(key), "missing {}", key);
        }
        let users: Vec<User> = load_collection(&store, USERS).unwrap();
        let admins: Vec<&User> = users
            .iter()
            .filter(|u| u.email == DEFAULT_ADMIN_EMAIL && u.is_admin())
            .collect();
        assert_eq!(admins.len(), 1);
        assert_eq!(admins[0].user_id, DEFAULT_ADMIN_ID);
    }

    #[test]
    fn init_keeps_existing_collections() {
        let store = MemoryStore::new();
        store.set_raw(SERVICE_REQUESTS, r#"[{"keep":true}]"#).unwrap();
        init_storage(&store).unwrap();
        let items: Vec<Value> = load_collection(&store, SERVICE_REQUESTS).unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn repeated_reads_are_equal() {
        let store = MemoryStore::new();
        init_storage(&store).unwrap();
        let a: Vec<User> = load_collection(&store, USERS).unwrap();
        let b: Vec<User> = load_collection(&store, USERS).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn json_helpers_round_trip_and_remove() {
        let store = MemoryStore::new();
        store.set_json("k", &vec![1, 2, 3]).unwrap();
        assert_eq!(store.get_json::<Vec<i32>>("k").unwrap(), Some(vec![1, 2, 3]));
        store.remove("k").unwrap();
        assert_eq!(store.get_json::<Vec<i32>>("k").unwrap(), None);
    }

    #[test]
    fn corrupt_collection_is_a_codec_error() {
        let store = MemoryStore::new();
        store.set_raw(USERS, "not json").unwrap();
        let err = load_collection::<User>(&store, USERS).unwrap_err();
        assert!(matches!(err, StoreError::Codec(_)));
    }
}
