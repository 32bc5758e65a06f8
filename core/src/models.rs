// src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account role. Doubles as the login channel picked on the login page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Customer,
    Admin,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Customer => "customer",
            UserType::Admin => "admin",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "customer" => Ok(UserType::Customer),
            "admin" => Ok(UserType::Admin),
            other => Err(format!("unknown user type '{}' (expected customer or admin)", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(deserialize_with = "crate::time::deserialize_date")]
    pub start_date: DateTime<Utc>,
    #[serde(deserialize_with = "crate::time::deserialize_date")]
    pub expiry_date: DateTime<Utc>,
}

impl Membership {
    /// Status is derived at read time; nothing sweeps expired memberships.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry_date > now
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceHistoryEntry {
    pub date: DateTime<Utc>,
    pub service_name: String,
    pub points_earned: i64,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: String,
    pub name: String,
    pub email: String,
    // Plaintext, compared verbatim at login.
    pub password: String,
    #[serde(default)]
    pub phone: String,
    pub user_type: UserType,
    pub verified: bool,
    pub registered_date: DateTime<Utc>,
    #[serde(default)]
    pub membership: Option<Membership>,
    #[serde(default)]
    pub points: u64,
    #[serde(default)]
    pub service_history: Vec<ServiceHistoryEntry>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.user_type == UserType::Admin
    }
}

/// Shallow merge applied by [`UserRepository::update`](crate::repository::UserRepository::update).
///
/// `membership: Some(None)` clears the membership; `None` leaves it alone.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub verified: Option<bool>,
    pub membership: Option<Option<Membership>>,
    pub points: Option<u64>,
    pub service_history: Option<Vec<ServiceHistoryEntry>>,
}

impl UserPatch {
    pub fn apply(self, user: &mut User) {
        if let Some(name) = self.name {
            user.name = name;
        }
        if let Some(phone) = self.phone {
            user.phone = phone;
        }
        if let Some(verified) = self.verified {
            user.verified = verified;
        }
        if let Some(membership) = self.membership {
            user.membership = membership;
        }
        if let Some(points) = self.points {
            user.points = points;
        }
        if let Some(history) = self.service_history {
            user.service_history = history;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    pub id: u64,
    pub user_id: String,
    pub title: String,
    pub category: String,
    pub details: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: u64,
    pub user_id: String,
    pub date: String,
    pub time: String,
    pub service_type: String,
    pub notes: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointsAction {
    Add,
    Subtract,
    Set,
}

impl PointsAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PointsAction::Add => "add",
            PointsAction::Subtract => "subtract",
            PointsAction::Set => "set",
        }
    }
}

impl fmt::Display for PointsAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PointsAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "add" => Ok(PointsAction::Add),
            "subtract" => Ok(PointsAction::Subtract),
            "set" => Ok(PointsAction::Set),
            other => Err(format!("unknown points action '{}' (expected add, subtract or set)", other)),
        }
    }
}

/// One row of the global points ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsHistoryEntry {
    pub date: DateTime<Utc>,
    pub user_id: String,
    pub user_name: String,
    pub action: PointsAction,
    pub amount: u64,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn admin_seed_shape_decodes_with_defaults() {
        let json = r#"{
            "userId": "ADMIN-001",
            "name": "Admin",
            "email": "admin@admin.com",
            "password": "admin123",
            "phone": "",
            "userType": "admin",
            "verified": true,
            "registeredDate": "2024-01-01T00:00:00Z"
        }"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert!(user.is_admin());
        assert_eq!(user.points, 0);
        assert!(user.membership.is_none());
        assert!(user.service_history.is_empty());
    }

    #[test]
    fn membership_serializes_type_field() {
        let m = Membership {
            kind: "gold".into(),
            start_date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            expiry_date: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        };
        let v = serde_json::to_value(&m).unwrap();
        assert_eq!(v["type"], "gold");
        assert!(v.get("expiryDate").is_some());
    }

    #[test]
    fn membership_accepts_bare_picker_dates() {
        let json = r#"{"type": "silver", "startDate": "2024-03-05T10:20:30.000Z", "expiryDate": "2030-01-01"}"#;
        let m: Membership = serde_json::from_str(json).unwrap();
        assert_eq!(m.expiry_date, Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(m.start_date, Utc.with_ymd_and_hms(2024, 3, 5, 10, 20, 30).unwrap());

        let bad = r#"{"type": "silver", "startDate": "soon", "expiryDate": "2030-01-01"}"#;
        assert!(serde_json::from_str::<Membership>(bad).is_err());
    }

    #[test]
    fn patch_clears_membership_only_when_asked() {
        let mut user: User = serde_json::from_value(serde_json::json!({
            "userId": "U", "name": "A", "email": "a@x.com", "password": "p",
            "userType": "customer", "verified": true,
            "registeredDate": "2024-01-01T00:00:00Z",
            "membership": {"type": "gold", "startDate": "2024-01-01T00:00:00Z", "expiryDate": "2030-01-01T00:00:00Z"},
            "points": 40
        }))
        .unwrap();

        UserPatch { points: Some(10), ..Default::default() }.apply(&mut user);
        assert_eq!(user.points, 10);
        assert!(user.membership.is_some());

        UserPatch { membership: Some(None), ..Default::default() }.apply(&mut user);
        assert!(user.membership.is_none());
    }

    #[test]
    fn points_action_parses_case_insensitively() {
        assert_eq!("ADD".parse::<PointsAction>().unwrap(), PointsAction::Add);
        assert_eq!(" set ".parse::<PointsAction>().unwrap(), PointsAction::Set);
        assert!("double".parse::<PointsAction>().is_err());
    }
}
