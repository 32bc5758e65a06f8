//! User collection access.
//!
//! Every call loads the whole `users` collection, so lookups are plain linear
//! scans over the loaded vector.

use crate::models::{User, UserPatch};
use crate::store::{load_collection, save_collection, KeyValueStore, StoreResult, USERS};

#[derive(Clone, Copy)]
pub struct UserRepository<'a> {
    store: &'a dyn KeyValueStore,
}

impl<'a> UserRepository<'a> {
    pub fn new(store: &'a dyn KeyValueStore) -> Self {
        Self { store }
    }

    pub fn list(&self) -> StoreResult<Vec<User>> {
        load_collection(self.store, USERS)
    }

    /// Appends without checking email uniqueness; callers check first.
    pub fn save(&self, user: User) -> StoreResult<()> {
        let mut users = self.list()?;
        users.push(user);
        save_collection(self.store, USERS, &users)
    }

    /// Shallow-merges `patch` into the user. Returns false when no user has
    /// that id, in which case nothing is written.
    pub fn update(&self, user_id: &str, patch: UserPatch) -> StoreResult<bool> {
        let mut users = self.list()?;
        match users.iter_mut().find(|u| u.user_id == user_id) {
            Some(user) => {
                patch.apply(user);
                save_collection(self.store, USERS, &users)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn find_by_id(&self, user_id: &str) -> StoreResult<Option<User>> {
        Ok(self.list()?.into_iter().find(|u| u.user_id == user_id))
    }

    pub fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.list()?.into_iter().find(|u| u.email == email))
    }

    pub fn find_by_credentials(&self, email: &str, password: &str) -> StoreResult<Option<User>> {
        Ok(self
            .list()?
            .into_iter()
            .find(|u| u.email == email && u.password == password))
    }
}
