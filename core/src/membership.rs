use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};
use crate::models::{Membership, User, UserPatch};
use crate::repository::UserRepository;
use crate::store::KeyValueStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MembershipStatus {
    Active,
    Expired,
    /// No membership record at all.
    Inactive,
}

impl MembershipStatus {
    pub fn of(membership: Option<&Membership>, now: DateTime<Utc>) -> Self {
        match membership {
            Some(m) if m.is_active_at(now) => MembershipStatus::Active,
            Some(_) => MembershipStatus::Expired,
            None => MembershipStatus::Inactive,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipStatus::Active => "Active",
            MembershipStatus::Expired => "Expired",
            MembershipStatus::Inactive => "Inactive",
        }
    }
}

impl fmt::Display for MembershipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct MembershipService<'a> {
    users: UserRepository<'a>,
}

impl<'a> MembershipService<'a> {
    pub fn new(store: &'a dyn KeyValueStore) -> Self {
        Self {
            users: UserRepository::new(store),
        }
    }

    /// Replaces any existing membership. The expiry is taken as given, past
    /// dates included.
    pub fn grant(&self, user_id: &str, kind: &str, expiry_date: DateTime<Utc>) -> Result<Membership> {
        let membership = Membership {
            kind: kind.to_string(),
            start_date: crate::time::now(),
            expiry_date,
        };
        let patch = UserPatch {
            membership: Some(Some(membership.clone())),
            ..Default::default()
        };
        if !self.users.update(user_id, patch)? {
            return Err(Error::UserNotFound);
        }
        tracing::info!(user_id, kind, expiry = %expiry_date, "membership granted");
        Ok(membership)
    }

    /// Removes the membership and zeroes the point balance.
    pub fn revoke(&self, user_id: &str) -> Result<()> {
        let patch = UserPatch {
            membership: Some(None),
            points: Some(0),
            ..Default::default()
        };
        if !self.users.update(user_id, patch)? {
            return Err(Error::UserNotFound);
        }
        tracing::info!(user_id, "membership revoked, points reset");
        Ok(())
    }

    pub fn status(&self, user_id: &str, now: DateTime<Utc>) -> Result<MembershipStatus> {
        let user: User = self.users.find_by_id(user_id)?.ok_or(Error::UserNotFound)?;
        Ok(MembershipStatus::of(user.membership.as_ref(), now))
    }
}
