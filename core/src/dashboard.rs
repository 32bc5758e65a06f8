//! Read models behind the customer and admin dashboards. Nothing here
//! writes; every view is rebuilt from freshly loaded collections.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::membership::MembershipStatus;
use crate::models::{PointsHistoryEntry, ServiceHistoryEntry, ServiceRequest, User};
use crate::points::{LoyaltyService, RECENT_HISTORY_LIMIT};
use crate::repository::UserRepository;
use crate::requests::{ServiceDesk, StatusFilter};
use crate::store::KeyValueStore;
use crate::time::{add_months, format_date};

/// Currency value of one point.
pub const POINT_VALUE: f64 = 0.5;
pub const POINTS_EXPIRY_MONTHS: u32 = 12;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_points: u64,
    pub services_count: usize,
    /// "Active" whenever a membership record exists, expired or not.
    pub membership_status: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipCard {
    pub title: String,
    pub start_date: String,
    pub expiry_date: String,
    pub status: MembershipStatus,
    pub member_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsOverview {
    pub total_points: u64,
    pub value: f64,
    pub expires_on: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummary {
    pub welcome: String,
    pub user_id: String,
    pub email: String,
    pub member_since: String,
    pub stats: DashboardStats,
    pub membership: Option<MembershipCard>,
    /// Only shown to members.
    pub points: Option<PointsOverview>,
    pub service_history: Vec<ServiceHistoryEntry>,
}

pub fn stats(user: &User) -> DashboardStats {
    DashboardStats {
        total_points: user.points,
        services_count: user.service_history.len(),
        membership_status: if user.membership.is_some() { "Active" } else { "Inactive" },
    }
}

pub fn membership_card(user: &User, now: DateTime<Utc>) -> Option<MembershipCard> {
    let m = user.membership.as_ref()?;
    Some(MembershipCard {
        title: format!("{} Membership", m.kind.to_uppercase()),
        start_date: format_date(&m.start_date),
        expiry_date: format_date(&m.expiry_date),
        status: if m.is_active_at(now) { MembershipStatus::Active } else { MembershipStatus::Expired },
        member_id: user.user_id.clone(),
    })
}

pub fn points_overview(user: &User, now: DateTime<Utc>) -> Option<PointsOverview> {
    user.membership.as_ref()?;
    Some(PointsOverview {
        total_points: user.points,
        value: user.points as f64 * POINT_VALUE,
        expires_on: format_date(&add_months(now, POINTS_EXPIRY_MONTHS)),
    })
}

pub fn customer_summary(user: &User, now: DateTime<Utc>) -> CustomerSummary {
    CustomerSummary {
        welcome: format!("Welcome, {}", user.name),
        user_id: user.user_id.clone(),
        email: user.email.clone(),
        member_since: format_date(&user.registered_date),
        stats: stats(user),
        membership: membership_card(user, now),
        points: points_overview(user, now),
        service_history: user.service_history.clone(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRow {
    pub user_id: String,
    pub name: String,
    pub email: String,
    /// Membership type, or "None".
    pub membership: String,
    pub has_membership: bool,
    pub points: u64,
}

impl MemberRow {
    fn from_user(user: &User) -> Self {
        Self {
            user_id: user.user_id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            membership: user
                .membership
                .as_ref()
                .map(|m| m.kind.clone())
                .unwrap_or_else(|| "None".to_string()),
            has_membership: user.membership.is_some(),
            points: user.points,
        }
    }

    /// Case-insensitive match over every visible column.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        [
            self.user_id.as_str(),
            self.name.as_str(),
            self.email.as_str(),
            self.membership.as_str(),
        ]
        .iter()
        .any(|col| col.to_lowercase().contains(&term))
            || self.points.to_string().contains(&term)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDetails {
    pub name: String,
    pub email: String,
    pub user_id: String,
    pub points: u64,
    pub membership: String,
    pub registered: String,
}

pub struct AdminDashboard<'a> {
    users: UserRepository<'a>,
    loyalty: LoyaltyService<'a>,
    desk: ServiceDesk<'a>,
}

impl<'a> AdminDashboard<'a> {
    pub fn new(store: &'a dyn KeyValueStore) -> Self {
        Self {
            users: UserRepository::new(store),
            loyalty: LoyaltyService::new(store),
            desk: ServiceDesk::new(store),
        }
    }

    /// Every non-admin account.
    pub fn members(&self) -> Result<Vec<MemberRow>> {
        Ok(self
            .users
            .list()?
            .iter()
            .filter(|u| !u.is_admin())
            .map(MemberRow::from_user)
            .collect())
    }

    pub fn search_members(&self, term: &str) -> Result<Vec<MemberRow>> {
        Ok(self
            .members()?
            .into_iter()
            .filter(|row| row.matches(term))
            .collect())
    }

    /// `(user id, "name (user id)")` pairs for the member pickers.
    pub fn member_options(&self) -> Result<Vec<(String, String)>> {
        Ok(self
            .members()?
            .into_iter()
            .map(|row| {
                let label = format!("{} ({})", row.name, row.user_id);
                (row.user_id, label)
            })
            .collect())
    }

    pub fn member_details(&self, user_id: &str) -> Result<Option<MemberDetails>> {
        Ok(self.users.find_by_id(user_id)?.map(|u| MemberDetails {
            membership: u
                .membership
                .as_ref()
                .map(|m| m.kind.clone())
                .unwrap_or_else(|| "None".to_string()),
            registered: format_date(&u.registered_date),
            name: u.name,
            email: u.email,
            user_id: u.user_id,
            points: u.points,
        }))
    }

    pub fn recent_points_history(&self) -> Result<Vec<PointsHistoryEntry>> {
        self.loyalty.recent_history(RECENT_HISTORY_LIMIT)
    }

    pub fn service_requests(&self, filter: &StatusFilter) -> Result<Vec<ServiceRequest>> {
        self.desk.filter_requests(filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::membership::MembershipService;
    use crate::models::PointsAction;
    use crate::store::{init_storage, MemoryStore};
    use crate::testing::seed_customer;
    use chrono::{Duration, TimeZone};

    fn fixture() -> MemoryStore {
        let store = MemoryStore::new();
        init_storage(&store).unwrap();
        seed_customer(&store, "C1", "alice@x.com", "pw");
        seed_customer(&store, "C2", "bob@x.com", "pw");
        store
    }

    #[test]
    fn members_exclude_admins() {
        let store = fixture();
        let admin = AdminDashboard::new(&store);
        let ids: Vec<String> = admin.members().unwrap().into_iter().map(|r| r.user_id).collect();
        assert_eq!(ids, vec!["C1", "C2"]);
    }

    #[test]
    fn search_is_case_insensitive_across_columns() {
        let store = fixture();
        let now = crate::time::now();
        MembershipService::new(&store).grant("C2", "Gold", now + Duration::days(10)).unwrap();
        let admin = AdminDashboard::new(&store);

        assert_eq!(admin.search_members("ALICE").unwrap().len(), 1);
        assert_eq!(admin.search_members("gold").unwrap()[0].user_id, "C2");
        assert_eq!(admin.search_members("none").unwrap()[0].user_id, "C1");
        assert_eq!(admin.search_members("x.com").unwrap().len(), 2);
        assert!(admin.search_members("zzz").unwrap().is_empty());
    }

    #[test]
    fn member_options_and_details() {
        let store = fixture();
        let admin = AdminDashboard::new(&store);
        let options = admin.member_options().unwrap();
        assert_eq!(options[0], ("C1".to_string(), "Customer C1 (C1)".to_string()));

        let details = admin.member_details("C2").unwrap().unwrap();
        assert_eq!(details.email, "bob@x.com");
        assert_eq!(details.membership, "None");
        assert!(admin.member_details("ghost").unwrap().is_none());
    }

    #[test]
    fn customer_summary_without_membership_hides_points() {
        let store = fixture();
        let user = UserRepository::new(&store).find_by_id("C1").unwrap().unwrap();
        let summary = customer_summary(&user, crate::time::now());
        assert_eq!(summary.welcome, "Welcome, Customer C1");
        assert_eq!(summary.stats.membership_status, "Inactive");
        assert!(summary.membership.is_none());
        assert!(summary.points.is_none());
    }

    #[test]
    fn customer_summary_with_membership() {
        let store = fixture();
        let now = Utc.with_ymd_and_hms(2030, 1, 15, 9, 0, 0).unwrap();
        MembershipService::new(&store)
            .grant("C1", "gold", Utc.with_ymd_and_hms(2031, 1, 1, 0, 0, 0).unwrap())
            .unwrap();
        LoyaltyService::new(&store).adjust("C1", PointsAction::Add, 75, "Service").unwrap();
        let user = UserRepository::new(&store).find_by_id("C1").unwrap().unwrap();

        let summary = customer_summary(&user, now);
        assert_eq!(summary.stats.total_points, 75);
        assert_eq!(summary.stats.services_count, 1);
        assert_eq!(summary.stats.membership_status, "Active");

        let card = summary.membership.unwrap();
        assert_eq!(card.title, "GOLD Membership");
        assert_eq!(card.expiry_date, "Jan 1, 2031");
        assert_eq!(card.status, MembershipStatus::Active);

        let points = summary.points.unwrap();
        assert_eq!(points.value, 37.5);
        assert_eq!(points.expires_on, "Jan 15, 2031");
    }

    #[test]
    fn expired_card_still_counts_as_member_in_stats() {
        let store = fixture();
        let now = crate::time::now();
        MembershipService::new(&store).grant("C1", "silver", now - Duration::days(2)).unwrap();
        let user = UserRepository::new(&store).find_by_id("C1").unwrap().unwrap();
        assert_eq!(stats(&user).membership_status, "Active");
        assert_eq!(membership_card(&user, now).unwrap().status, MembershipStatus::Expired);
    }
}
