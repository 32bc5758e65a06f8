//! End-to-end page flows against in-memory stores.

use chrono::Duration;
use loyalty_core::store::{CURRENT_USER, DEFAULT_ADMIN_EMAIL, DEFAULT_ADMIN_PASSWORD};
use loyalty_core::{
    init_storage, AdminDashboard, AuthService, Error, KeyValueStore, LoyaltyService, MemoryStore, MembershipService,
    MembershipStatus, NewServiceRequest, Page, PointsAction, RegistrationForm, RegistrationService, ServiceDesk,
    StatusFilter, Stores, UserRepository, UserType,
};

struct Browser {
    local: MemoryStore,
    session: MemoryStore,
}

impl Browser {
    fn open() -> Self {
        let local = MemoryStore::new();
        init_storage(&local).unwrap();
        Self {
            local,
            session: MemoryStore::new(),
        }
    }

    fn stores(&self) -> Stores<'_> {
        Stores::new(&self.local, &self.session)
    }

    fn register(&self, name: &str, email: &str, password: &str) -> String {
        let reg = RegistrationService::new(self.stores());
        let challenge = reg
            .begin(RegistrationForm {
                name: name.into(),
                email: email.into(),
                phone: String::new(),
                password: password.into(),
                confirm_password: password.into(),
            })
            .unwrap();
        reg.verify_otp(&challenge.otp).unwrap().user_id
    }

    fn sign_in(&self, email: &str, password: &str, channel: UserType) -> Page {
        let auth = AuthService::new(self.stores());
        let challenge = auth.login(email, password, channel).unwrap();
        auth.verify_otp(&challenge.otp).unwrap()
    }
}

#[test]
fn register_then_log_in_as_customer() {
    let browser = Browser::open();
    browser.register("A", "a@x.com", "p1");

    let page = browser.sign_in("a@x.com", "p1", UserType::Customer);
    assert_eq!(page, Page::CustomerDashboard);

    let current = AuthService::new(browser.stores()).current_user().unwrap().unwrap();
    assert_eq!(current.user_type, UserType::Customer);
    assert_eq!(current.points, 0);
    assert!(current.membership.is_none());
    assert_eq!(Page::CustomerDashboard.guard(Some(&current)), Ok(()));
}

#[test]
fn admin_grants_and_revokes_membership() {
    let browser = Browser::open();
    let user_id = browser.register("A", "a@x.com", "p1");

    assert_eq!(
        browser.sign_in(DEFAULT_ADMIN_EMAIL, DEFAULT_ADMIN_PASSWORD, UserType::Admin),
        Page::AdminDashboard
    );

    let now = chrono::Utc::now();
    let membership = MembershipService::new(&browser.local);
    membership.grant(&user_id, "gold", now + Duration::days(180)).unwrap();
    assert_eq!(membership.status(&user_id, now).unwrap(), MembershipStatus::Active);
    assert_eq!(membership.status(&user_id, now).unwrap().as_str(), "Active");

    LoyaltyService::new(&browser.local)
        .adjust(&user_id, PointsAction::Add, 250, "Welcome bonus")
        .unwrap();
    membership.revoke(&user_id).unwrap();

    assert_eq!(membership.status(&user_id, now).unwrap().as_str(), "Inactive");
    let user = UserRepository::new(&browser.local).find_by_id(&user_id).unwrap().unwrap();
    assert_eq!(user.points, 0);
}

#[test]
fn failed_registrations_never_create_users() {
    let browser = Browser::open();
    let reg = RegistrationService::new(browser.stores());

    let mismatch = reg.begin(RegistrationForm {
        name: "A".into(),
        email: "a@x.com".into(),
        password: "p1".into(),
        confirm_password: "p2".into(),
        ..Default::default()
    });
    assert!(matches!(mismatch, Err(Error::PasswordMismatch)));

    browser.register("A", "a@x.com", "p1");
    let duplicate = reg.begin(RegistrationForm {
        name: "Again".into(),
        email: "a@x.com".into(),
        password: "p3".into(),
        confirm_password: "p3".into(),
        ..Default::default()
    });
    assert!(matches!(duplicate, Err(Error::EmailTaken)));

    let users = UserRepository::new(&browser.local).list().unwrap();
    let mut emails: Vec<&str> = users.iter().map(|u| u.email.as_str()).collect();
    emails.sort_unstable();
    let before = emails.len();
    emails.dedup();
    assert_eq!(emails.len(), before, "emails must stay unique");
    assert_eq!(users.len(), 2);
}

#[test]
fn wrong_login_code_keeps_session_pending() {
    let browser = Browser::open();
    browser.register("A", "a@x.com", "p1");
    let auth = AuthService::new(browser.stores());

    let challenge = auth.login("a@x.com", "p1", UserType::Customer).unwrap();
    assert!(matches!(auth.verify_otp("99999"), Err(Error::InvalidOtp)));
    assert!(browser.session.get_raw(CURRENT_USER).unwrap().is_none());
    assert_eq!(
        browser.session.get_raw("loginOTP").unwrap().as_deref(),
        Some(challenge.otp.as_str())
    );
}

#[test]
fn customer_request_is_triaged_by_admin() {
    let browser = Browser::open();
    let user_id = browser.register("A", "a@x.com", "p1");
    let desk = ServiceDesk::new(&browser.local);

    let request = desk
        .create_request(
            &user_id,
            NewServiceRequest {
                title: "Engine light".into(),
                category: "repair".into(),
                details: "Comes on at idle".into(),
            },
        )
        .unwrap();

    let admin = AdminDashboard::new(&browser.local);
    let pending = admin.service_requests(&StatusFilter::parse("pending")).unwrap();
    assert_eq!(pending.len(), 1);

    assert!(desk.update_status(request.id, "resolved").unwrap());
    assert!(admin.service_requests(&StatusFilter::parse("pending")).unwrap().is_empty());
    assert_eq!(desk.requests_for_user(&user_id).unwrap()[0].status, "resolved");
}
