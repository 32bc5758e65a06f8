//! Point balance adjustments made from the admin dashboard.

use crate::error::{Error, Result};
use crate::models::{PointsAction, PointsHistoryEntry, ServiceHistoryEntry, UserPatch};
use crate::repository::UserRepository;
use crate::store::{load_collection, save_collection, KeyValueStore, POINTS_HISTORY};

pub const RECENT_HISTORY_LIMIT: usize = 10;

/// Balance after applying `action`. Subtraction floors at zero.
pub fn apply_action(balance: u64, action: PointsAction, amount: u64) -> u64 {
    match action {
        PointsAction::Add => balance.saturating_add(amount),
        PointsAction::Subtract => balance.saturating_sub(amount),
        PointsAction::Set => amount,
    }
}

/// Signed value written to the user's service history.
///
/// `Set` records `+amount` rather than the actual delta.
pub fn history_delta(action: PointsAction, amount: u64) -> i64 {
    let amount = i64::try_from(amount).unwrap_or(i64::MAX);
    match action {
        PointsAction::Add | PointsAction::Set => amount,
        PointsAction::Subtract => -amount,
    }
}

pub struct LoyaltyService<'a> {
    store: &'a dyn KeyValueStore,
    users: UserRepository<'a>,
}

impl<'a> LoyaltyService<'a> {
    pub fn new(store: &'a dyn KeyValueStore) -> Self {
        Self {
            store,
            users: UserRepository::new(store),
        }
    }

    /// Applies the adjustment, appends a completed service-history entry and
    /// a ledger row. Returns the new balance.
    pub fn adjust(&self, user_id: &str, action: PointsAction, amount: u64, reason: &str) -> Result<u64> {
        let user = self.users.find_by_id(user_id)?.ok_or(Error::UserNotFound)?;
        let now = crate::time::now();
        let balance = apply_action(user.points, action, amount);

        let mut history = user.service_history;
        history.push(ServiceHistoryEntry {
            date: now,
            service_name: reason.to_string(),
            points_earned: history_delta(action, amount),
            status: "completed".to_string(),
        });
        let patch = UserPatch {
            points: Some(balance),
            service_history: Some(history),
            ..Default::default()
        };
        if !self.users.update(user_id, patch)? {
            return Err(Error::UserNotFound);
        }

        let mut ledger: Vec<PointsHistoryEntry> = load_collection(self.store, POINTS_HISTORY)?;
        ledger.push(PointsHistoryEntry {
            date: now,
            user_id: user.user_id.clone(),
            user_name: user.name,
            action,
            amount,
            reason: reason.to_string(),
        });
        save_collection(self.store, POINTS_HISTORY, &ledger)?;

        tracing::info!(
            user_id = %user.user_id,
            action = %action,
            amount,
            previous = user.points,
            balance,
            "points adjusted"
        );
        Ok(balance)
    }

    pub fn history(&self) -> Result<Vec<PointsHistoryEntry>> {
        Ok(load_collection(self.store, POINTS_HISTORY)?)
    }

    /// The last `limit` ledger rows, newest first.
    pub fn recent_history(&self, limit: usize) -> Result<Vec<PointsHistoryEntry>> {
        let ledger = self.history()?;
        Ok(ledger.into_iter().rev().take(limit).collect())
    }
}
