//! Browser bindings for the loyalty services.
//!
//! `LoyaltyApp` runs every operation against `localStorage` and
//! `sessionStorage`, so state written here is the same state the pages read.
//! Results cross the boundary as JSON strings; failures reject with the
//! message the page shows in its alert.

use js_sys::{Function, Reflect};
use loyalty_core::dashboard::customer_summary;
use loyalty_core::store::{KeyValueStore, StoreResult};
use loyalty_core::time::{now, parse_date};
use loyalty_core::{
    init_storage, AdminDashboard, AuthService, Error, LoyaltyService, MembershipService, NewAppointment,
    NewServiceRequest, Page, PointsAction, RegistrationForm, RegistrationService, ServiceDesk, StatusFilter,
    StoreError, Stores, UserType,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

/// One of the browser's Web Storage areas.
pub struct BrowserStorage {
    area: JsValue,
}

fn js_message(value: JsValue) -> String {
    value
        .as_string()
        .or_else(|| value.dyn_ref::<js_sys::Error>().map(|e| String::from(e.message())))
        .unwrap_or_else(|| format!("{:?}", value))
}

fn backend(value: JsValue) -> StoreError {
    StoreError::Backend(js_message(value))
}

impl BrowserStorage {
    /// Looks up `globalThis[name]`, e.g. `"localStorage"`.
    pub fn named(name: &str) -> Result<Self, JsValue> {
        let area = Reflect::get(&js_sys::global(), &JsValue::from_str(name))?;
        if area.is_undefined() || area.is_null() {
            return Err(JsValue::from_str(&format!("{} is not available", name)));
        }
        Ok(Self { area })
    }

    fn call(&self, method: &str, args: &[JsValue]) -> StoreResult<JsValue> {
        let func: Function = Reflect::get(&self.area, &JsValue::from_str(method))
            .map_err(backend)?
            .dyn_into()
            .map_err(|_| StoreError::Backend(format!("Storage.{} is not a function", method)))?;
        match args {
            [] => func.call0(&self.area),
            [a] => func.call1(&self.area, a),
            [a, b, ..] => func.call2(&self.area, a, b),
        }
        .map_err(backend)
    }
}

impl KeyValueStore for BrowserStorage {
    fn get_raw(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.call("getItem", &[JsValue::from_str(key)])?.as_string())
    }

    fn set_raw(&self, key: &str, value: &str) -> StoreResult<()> {
        // Quota errors surface here
        self.call("setItem", &[JsValue::from_str(key), JsValue::from_str(value)])?;
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.call("removeItem", &[JsValue::from_str(key)])?;
        Ok(())
    }
}

fn to_js(err: Error) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn from_json<T: serde::de::DeserializeOwned>(json: &str) -> Result<T, JsValue> {
    serde_json::from_str(json).map_err(|e| to_js(Error::InvalidInput(e.to_string())))
}

/// JS numbers carry request ids; anything fractional or negative is not one.
fn request_id(value: f64) -> Result<u64, Error> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 {
        Ok(value as u64)
    } else {
        Err(Error::InvalidInput(format!("{} is not a request id", value)))
    }
}

fn user_type(value: &str) -> Result<UserType, Error> {
    value.parse().map_err(Error::InvalidInput)
}

#[wasm_bindgen]
pub struct LoyaltyApp {
    local: BrowserStorage,
    session: BrowserStorage,
}

impl LoyaltyApp {
    fn stores(&self) -> Stores<'_> {
        Stores::new(&self.local, &self.session)
    }
}

#[wasm_bindgen]
impl LoyaltyApp {
    /// Binds to the page's storage areas and seeds them on first use.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<LoyaltyApp, JsValue> {
        let app = LoyaltyApp {
            local: BrowserStorage::named("localStorage")?,
            session: BrowserStorage::named("sessionStorage")?,
        };
        init_storage(&app.local).map_err(|e| to_js(e.into()))?;
        Ok(app)
    }

    /// Redirect target for `path`, or `undefined` when the visitor may stay.
    #[wasm_bindgen(js_name = guardPage)]
    pub fn guard_page(&self, path: &str) -> Result<Option<String>, JsValue> {
        let Some(page) = Page::from_path(path) else {
            return Ok(None);
        };
        let current = AuthService::new(self.stores()).current_user().map_err(to_js)?;
        Ok(page.guard(current.as_ref()).err().map(|target| target.path().to_string()))
    }

    #[wasm_bindgen(js_name = currentUser)]
    pub fn current_user(&self) -> Result<String, JsValue> {
        to_json(&AuthService::new(self.stores()).current_user().map_err(to_js)?)
    }

    /// Returns the `{email, otp}` challenge; the page shows the code.
    pub fn login(&self, email: &str, password: &str, login_type: &str) -> Result<String, JsValue> {
        let channel = user_type(login_type).map_err(to_js)?;
        let challenge = AuthService::new(self.stores())
            .login(email, password, channel)
            .map_err(to_js)?;
        to_json(&challenge)
    }

    /// Returns the dashboard path to navigate to.
    #[wasm_bindgen(js_name = verifyLoginOtp)]
    pub fn verify_login_otp(&self, otp: &str) -> Result<String, JsValue> {
        let page = AuthService::new(self.stores()).verify_otp(otp).map_err(to_js)?;
        Ok(page.path().to_string())
    }

    #[wasm_bindgen(js_name = resendLoginOtp)]
    pub fn resend_login_otp(&self) -> Result<String, JsValue> {
        to_json(&AuthService::new(self.stores()).resend_otp().map_err(to_js)?)
    }

    /// Clears the signed-in user and returns the login path.
    pub fn logout(&self) -> Result<String, JsValue> {
        AuthService::new(self.stores()).logout().map_err(to_js)?;
        Ok(Page::Login.path().to_string())
    }

    /// `form_json` carries `name, email, phone, password, confirmPassword`.
    pub fn register(&self, form_json: &str) -> Result<String, JsValue> {
        let form: RegistrationForm = from_json(form_json)?;
        to_json(&RegistrationService::new(self.stores()).begin(form).map_err(to_js)?)
    }

    #[wasm_bindgen(js_name = verifyRegistrationOtp)]
    pub fn verify_registration_otp(&self, otp: &str) -> Result<String, JsValue> {
        let user = RegistrationService::new(self.stores())
            .verify_otp(otp)
            .map_err(to_js)?;
        to_json(&user)
    }

    #[wasm_bindgen(js_name = resendRegistrationOtp)]
    pub fn resend_registration_otp(&self) -> Result<String, JsValue> {
        to_json(&RegistrationService::new(self.stores()).resend_otp().map_err(to_js)?)
    }

    // Customer dashboard

    #[wasm_bindgen(js_name = customerSummary)]
    pub fn customer_summary(&self) -> Result<String, JsValue> {
        let user = AuthService::new(self.stores())
            .current_user()
            .map_err(to_js)?
            .ok_or_else(|| JsValue::from_str(Page::Login.path()))?;
        to_json(&customer_summary(&user, now()))
    }

    #[wasm_bindgen(js_name = submitServiceRequest)]
    pub fn submit_service_request(&self, user_id: &str, request_json: &str) -> Result<String, JsValue> {
        let new: NewServiceRequest = from_json(request_json)?;
        to_json(&ServiceDesk::new(&self.local).create_request(user_id, new).map_err(to_js)?)
    }

    #[wasm_bindgen(js_name = bookAppointment)]
    pub fn book_appointment(&self, user_id: &str, appointment_json: &str) -> Result<String, JsValue> {
        let new: NewAppointment = from_json(appointment_json)?;
        to_json(&ServiceDesk::new(&self.local).book_appointment(user_id, new).map_err(to_js)?)
    }

    #[wasm_bindgen(js_name = requestsForUser)]
    pub fn requests_for_user(&self, user_id: &str) -> Result<String, JsValue> {
        to_json(&ServiceDesk::new(&self.local).requests_for_user(user_id).map_err(to_js)?)
    }

    #[wasm_bindgen(js_name = appointmentsForUser)]
    pub fn appointments_for_user(&self, user_id: &str) -> Result<String, JsValue> {
        to_json(&ServiceDesk::new(&self.local).appointments_for_user(user_id).map_err(to_js)?)
    }

    // Admin dashboard

    pub fn members(&self) -> Result<String, JsValue> {
        to_json(&AdminDashboard::new(&self.local).members().map_err(to_js)?)
    }

    #[wasm_bindgen(js_name = searchMembers)]
    pub fn search_members(&self, term: &str) -> Result<String, JsValue> {
        to_json(&AdminDashboard::new(&self.local).search_members(term).map_err(to_js)?)
    }

    #[wasm_bindgen(js_name = memberOptions)]
    pub fn member_options(&self) -> Result<String, JsValue> {
        to_json(&AdminDashboard::new(&self.local).member_options().map_err(to_js)?)
    }

    #[wasm_bindgen(js_name = memberDetails)]
    pub fn member_details(&self, user_id: &str) -> Result<String, JsValue> {
        to_json(&AdminDashboard::new(&self.local).member_details(user_id).map_err(to_js)?)
    }

    #[wasm_bindgen(js_name = recentPointsHistory)]
    pub fn recent_points_history(&self) -> Result<String, JsValue> {
        to_json(&AdminDashboard::new(&self.local).recent_points_history().map_err(to_js)?)
    }

    /// `filter` is "all" or a status fragment.
    #[wasm_bindgen(js_name = serviceRequests)]
    pub fn service_requests(&self, filter: &str) -> Result<String, JsValue> {
        let filter = StatusFilter::parse(filter);
        to_json(&AdminDashboard::new(&self.local).service_requests(&filter).map_err(to_js)?)
    }

    /// Returns the new balance.
    #[wasm_bindgen(js_name = adjustPoints)]
    pub fn adjust_points(&self, user_id: &str, action: &str, amount: u32, reason: &str) -> Result<f64, JsValue> {
        let action: PointsAction = action.parse().map_err(|e| to_js(Error::InvalidInput(e)))?;
        let balance = LoyaltyService::new(&self.local)
            .adjust(user_id, action, u64::from(amount), reason)
            .map_err(to_js)?;
        Ok(balance as f64)
    }

    /// `expiry` is the date picker value (`YYYY-MM-DD`).
    #[wasm_bindgen(js_name = grantMembership)]
    pub fn grant_membership(&self, user_id: &str, kind: &str, expiry: &str) -> Result<String, JsValue> {
        let expiry = parse_date(expiry)
            .ok_or_else(|| to_js(Error::InvalidInput(format!("'{}' is not a valid date", expiry))))?;
        to_json(&MembershipService::new(&self.local).grant(user_id, kind, expiry).map_err(to_js)?)
    }

    #[wasm_bindgen(js_name = revokeMembership)]
    pub fn revoke_membership(&self, user_id: &str) -> Result<(), JsValue> {
        MembershipService::new(&self.local).revoke(user_id).map_err(to_js)
    }

    /// False when no request has this id.
    #[wasm_bindgen(js_name = updateRequestStatus)]
    pub fn update_request_status(&self, id: f64, status: &str) -> Result<bool, JsValue> {
        let id = request_id(id).map_err(to_js)?;
        ServiceDesk::new(&self.local).update_status(id, status).map_err(to_js)
    }
}
