//! Page contexts, picked by sniffing the current path.

use serde::{Deserialize, Serialize};

use crate::models::{User, UserType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Page {
    Login,
    Register,
    CustomerDashboard,
    AdminDashboard,
}

impl Page {
    /// Maps a URL path to its page. Unknown paths have no page context.
    pub fn from_path(path: &str) -> Option<Page> {
        if path.contains("index.html") || path == "/" {
            Some(Page::Login)
        } else if path.contains("register.html") {
            Some(Page::Register)
        } else if path.contains("customer-dashboard.html") {
            Some(Page::CustomerDashboard)
        } else if path.contains("admin-dashboard.html") {
            Some(Page::AdminDashboard)
        } else {
            None
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Page::Login => "index.html",
            Page::Register => "register.html",
            Page::CustomerDashboard => "customer-dashboard.html",
            Page::AdminDashboard => "admin-dashboard.html",
        }
    }

    pub fn dashboard_for(user_type: UserType) -> Page {
        match user_type {
            UserType::Admin => Page::AdminDashboard,
            UserType::Customer => Page::CustomerDashboard,
        }
    }

    /// Who may stay on this page. `Err` carries the redirect target.
    pub fn guard(&self, current: Option<&User>) -> Result<(), Page> {
        match (self, current) {
            (Page::Login | Page::Register, _) => Ok(()),
            (Page::CustomerDashboard, Some(user)) if !user.is_admin() => Ok(()),
            (Page::AdminDashboard, Some(user)) if user.is_admin() => Ok(()),
            _ => Err(Page::Login),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(user_type: UserType) -> User {
        User {
            user_id: "U".into(),
            name: "U".into(),
            email: "u@x.com".into(),
            password: "pw".into(),
            phone: String::new(),
            user_type,
            verified: true,
            registered_date: crate::time::now(),
            membership: None,
            points: 0,
            service_history: Vec::new(),
        }
    }

    #[test]
    fn paths_map_to_pages() {
        assert_eq!(Page::from_path("/"), Some(Page::Login));
        assert_eq!(Page::from_path("/app/index.html"), Some(Page::Login));
        assert_eq!(Page::from_path("/register.html"), Some(Page::Register));
        assert_eq!(Page::from_path("/customer-dashboard.html"), Some(Page::CustomerDashboard));
        assert_eq!(Page::from_path("/admin-dashboard.html"), Some(Page::AdminDashboard));
        assert_eq!(Page::from_path("/about.html"), None);
    }

    #[test]
    fn dashboards_are_guarded_by_role() {
        let admin = user(UserType::Admin);
        let customer = user(UserType::Customer);

        assert_eq!(Page::CustomerDashboard.guard(Some(&customer)), Ok(()));
        assert_eq!(Page::CustomerDashboard.guard(Some(&admin)), Err(Page::Login));
        assert_eq!(Page::CustomerDashboard.guard(None), Err(Page::Login));

        assert_eq!(Page::AdminDashboard.guard(Some(&admin)), Ok(()));
        assert_eq!(Page::AdminDashboard.guard(Some(&customer)), Err(Page::Login));

        assert_eq!(Page::Login.guard(None), Ok(()));
        assert_eq!(Page::Register.guard(Some(&admin)), Ok(()));
    }
}
