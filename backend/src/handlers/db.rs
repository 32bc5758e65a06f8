// ============================================================================
// src/handlers/db.rs - database test, JSON dump and import
// ============================================================================
use crate::db::{Database, SledStore};
use crate::logging::{log_collection_operation, print_success};
use anyhow::{anyhow, Context as _, Result};
use chrono::{DateTime, Utc};
use loyalty_core::store::{
    APPOINTMENTS, COLLECTIONS, DEFAULT_ADMIN_EMAIL, POINTS_HISTORY, SERVICE_REQUESTS, USERS,
};
use loyalty_core::{Appointment, KeyValueStore, PointsHistoryEntry, ServiceRequest, User, UserType};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fs;

/// On-disk shape of `db dump`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dump {
    pub exported_at: DateTime<Utc>,
    pub collections: Map<String, Value>,
}

pub fn test(db: &Database) -> Result<()> {
    for (collection, size) in db.collection_sizes()? {
        match size {
            Some(bytes) => println!("  {:<16} {} bytes", collection, bytes),
            None => println!("  {:<16} missing (run `init`)", collection),
        }
    }
    print_success("Database reachable");
    Ok(())
}

pub fn build_dump(local: &SledStore) -> Result<Dump> {
    let mut collections = Map::new();
    for key in COLLECTIONS {
        let raw = local.get_raw(key)?.unwrap_or_else(|| "[]".to_string());
        let value: Value = serde_json::from_str(&raw).with_context(|| format!("decoding collection '{}'", key))?;
        log_collection_operation("dump", key, value.as_array().map(Vec::len));
        collections.insert(key.to_string(), value);
    }
    Ok(Dump {
        exported_at: loyalty_core::time::now(),
        collections,
    })
}

pub fn dump(local: &SledStore, output: &str) -> Result<()> {
    let dump = build_dump(local)?;
    let json = serde_json::to_string_pretty(&dump)?;
    fs::write(output, json).with_context(|| format!("writing {}", output))?;
    print_success(&format!("Dumped {} collections to {}", dump.collections.len(), output));
    Ok(())
}

/// Checks that a collection decodes as its record type before anything is written.
fn check_collection(key: &str, value: &Value) -> Result<usize> {
    let count = match key {
        USERS => check_users(&serde_json::from_value::<Vec<User>>(value.clone())?)?,
        SERVICE_REQUESTS => serde_json::from_value::<Vec<ServiceRequest>>(value.clone())?.len(),
        APPOINTMENTS => serde_json::from_value::<Vec<Appointment>>(value.clone())?.len(),
        POINTS_HISTORY => serde_json::from_value::<Vec<PointsHistoryEntry>>(value.clone())?.len(),
        other => return Err(anyhow!("unknown collection '{}'", other)),
    };
    Ok(count)
}

/// Emails stay unique and the default admin address stays an admin account.
fn check_users(users: &[User]) -> Result<usize> {
    let mut seen = HashSet::new();
    for user in users {
        if !seen.insert(user.email.as_str()) {
            return Err(anyhow!("duplicate email '{}'", user.email));
        }
        if user.email == DEFAULT_ADMIN_EMAIL && user.user_type != UserType::Admin {
            return Err(anyhow!("'{}' must belong to an admin account", DEFAULT_ADMIN_EMAIL));
        }
    }
    Ok(users.len())
}

/// Replaces every collection present in the dump. Collections the dump lacks
/// are left alone.
pub fn apply_dump(local: &SledStore, dump: &Dump) -> Result<usize> {
    for (key, value) in &dump.collections {
        check_collection(key, value).with_context(|| format!("invalid collection '{}'", key))?;
    }
    for (key, value) in &dump.collections {
        local.set_raw(key, &serde_json::to_string(value)?)?;
        log_collection_operation("import", key, value.as_array().map(Vec::len));
    }
    Ok(dump.collections.len())
}

pub fn import(local: &SledStore, input: &str) -> Result<()> {
    let text = fs::read_to_string(input).with_context(|| format!("reading {}", input))?;
    let dump: Dump = serde_json::from_str(&text).with_context(|| format!("parsing {}", input))?;
    let replaced = apply_dump(local, &dump)?;
    // keep the admin seed invariant after a partial import
    loyalty_core::init_storage(local)?;
    print_success(&format!("Imported {} collections from {}", replaced, input));
    Ok(())
}
