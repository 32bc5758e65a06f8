//! Membership and loyalty services.
//!
//! All state goes through two injected [`KeyValueStore`]s: a persistent one
//! for users, requests, appointments and the points ledger, and a
//! session-scoped one for login and registration state. Each operation runs to
//! completion synchronously: it reads a whole collection, mutates it, and
//! writes it back.

pub mod auth;
pub mod dashboard;
pub mod error;
pub mod ids;
pub mod membership;
pub mod models;
pub mod pages;
pub mod points;
pub mod registration;
pub mod repository;
pub mod requests;
pub mod store;
pub mod time;
pub mod validation;

pub use auth::{AuthService, LoginState, OtpChallenge};
pub use dashboard::AdminDashboard;
pub use error::{Error, Result, StoreError};
pub use membership::{MembershipService, MembershipStatus};
pub use models::{
    Appointment, Membership, PointsAction, PointsHistoryEntry, ServiceHistoryEntry, ServiceRequest, User,
    UserPatch, UserType,
};
pub use pages::Page;
pub use points::LoyaltyService;
pub use registration::{RegistrationForm, RegistrationService};
pub use repository::UserRepository;
pub use requests::{NewAppointment, NewServiceRequest, ServiceDesk, StatusFilter};
pub use store::{init_storage, JsonStore, KeyValueStore, MemoryStore, Stores};
