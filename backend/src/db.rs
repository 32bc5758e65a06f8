// ============================================================================
// src/db.rs - sled-backed key-value scopes
// ============================================================================
use anyhow::Result;
use loyalty_core::store::{StoreResult, COLLECTIONS};
use loyalty_core::{KeyValueStore, StoreError};
use sled::Db;
use std::sync::Arc;

/// Tree holding the durable collections.
pub const LOCAL_TREE: &str = "local";
/// Tree holding login/registration state until `session end`.
pub const SESSION_TREE: &str = "session";

#[derive(Clone)]
pub struct Database {
    pub db: Arc<Db>,
}

impl Database {
    pub fn new(path: &str) -> Result<Self> {
        let db = sled::open(path)?;
        Ok(Self { db: Arc::new(db) })
    }

    pub fn local(&self) -> Result<SledStore> {
        Ok(SledStore::new(self.db.open_tree(LOCAL_TREE)?))
    }

    pub fn session(&self) -> Result<SledStore> {
        Ok(SledStore::new(self.db.open_tree(SESSION_TREE)?))
    }

    /// Byte size of each persisted collection, `None` when absent.
    pub fn collection_sizes(&self) -> Result<Vec<(&'static str, Option<usize>)>> {
        let tree = self.db.open_tree(LOCAL_TREE)?;
        let mut sizes = Vec::new();
        for key in COLLECTIONS {
            sizes.push((key, tree.get(key)?.map(|v| v.len())));
        }
        Ok(sizes)
    }

    pub fn flush(&self) -> Result<usize> {
        Ok(self.db.flush()?)
    }
}

/// One sled tree seen as a string key-value store.
#[derive(Clone)]
pub struct SledStore {
    tree: sled::Tree,
}

fn backend(e: sled::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

impl SledStore {
    pub fn new(tree: sled::Tree) -> Self {
        Self { tree }
    }

    /// Drops every key in this scope.
    pub fn clear(&self) -> StoreResult<()> {
        self.tree.clear().map_err(backend)?;
        self.tree.flush().map_err(backend)?;
        Ok(())
    }

    pub fn keys(&self) -> StoreResult<Vec<String>> {
        let mut keys = Vec::new();
        for entry in self.tree.iter() {
            let (key, _value) = entry.map_err(backend)?;
            keys.push(String::from_utf8_lossy(&key).into_owned());
        }
        Ok(keys)
    }
}

impl KeyValueStore for SledStore {
    fn get_raw(&self, key: &str) -> StoreResult<Option<String>> {
        match self.tree.get(key).map_err(backend)? {
            Some(data) => String::from_utf8(data.to_vec())
                .map(Some)
                .map_err(|e| StoreError::Backend(format!("non UTF-8 value under '{}': {}", key, e))),
            None => Ok(None),
        }
    }

    fn set_raw(&self, key: &str, value: &str) -> StoreResult<()> {
        self.tree.insert(key, value.as_bytes()).map_err(backend)?;
        self.tree.flush().map_err(backend)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.tree.remove(key).map_err(backend)?;
        self.tree.flush().map_err(backend)?;
        Ok(())
    }
}

#[cfg(test)]
mod db_tests {
    use super::*;
    use loyalty_core::store::USERS;
    use loyalty_core::{init_storage, JsonStore, User};
    use tempfile::tempdir;

    #[test]
    fn test_scopes_are_isolated() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::new(db_path.to_str().unwrap()).unwrap();

        let local = db.local().unwrap();
        let session = db.session().unwrap();

        local.set_raw("shared", "local").unwrap();
        session.set_raw("shared", "session").unwrap();
        assert_eq!(local.get_raw("shared").unwrap().as_deref(), Some("local"));
        assert_eq!(session.get_raw("shared").unwrap().as_deref(), Some("session"));

        session.clear().unwrap();
        assert!(session.get_raw("shared").unwrap().is_none());
        assert!(local.get_raw("shared").unwrap().is_some());
    }

    #[test]
    fn test_crud_and_reopen() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        {
            let db = Database::new(db_path.to_str().unwrap()).unwrap();
            let local = db.local().unwrap();
            init_storage(&local).unwrap();
            local.set_raw("tmp", "1").unwrap();
            local.remove("tmp").unwrap();
            assert!(local.get_raw("tmp").unwrap().is_none());
            db.flush().unwrap();
        }

        let db = Database::new(db_path.to_str().unwrap()).unwrap();
        let local = db.local().unwrap();
        let users: Vec<User> = local.get_json(USERS).unwrap().unwrap();
        assert_eq!(users.len(), 1);
        assert!(users[0].is_admin());

        let sizes = db.collection_sizes().unwrap();
        assert!(sizes.iter().all(|(_, size)| size.is_some()));
        let mut keys = local.keys().unwrap();
        keys.sort();
        assert_eq!(keys, vec!["appointments", "pointsHistory", "serviceRequests", "users"]);
    }
}
