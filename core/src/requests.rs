//! Service requests and appointment bookings.
//!
//! Both live in global collections filtered by owner on read. Ids are the
//! creation time in milliseconds, so two records created in the same
//! millisecond share an id; lookups return the first match.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{Appointment, ServiceRequest};
use crate::store::{load_collection, save_collection, KeyValueStore, APPOINTMENTS, SERVICE_REQUESTS};
use crate::validation as v;

pub const DEFAULT_STATUS: &str = "pending";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewServiceRequest {
    pub title: String,
    pub category: String,
    pub details: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewAppointment {
    pub date: String,
    pub time: String,
    pub service_type: String,
    pub notes: String,
}

/// Admin-side filter over request status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusFilter {
    All,
    /// Keeps requests whose status contains this text.
    Matching(String),
}

impl StatusFilter {
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("all") {
            StatusFilter::All
        } else {
            StatusFilter::Matching(value.to_string())
        }
    }

    pub fn accepts(&self, status: &str) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Matching(needle) => status.contains(needle.as_str()),
        }
    }
}

pub struct ServiceDesk<'a> {
    store: &'a dyn KeyValueStore,
}

impl<'a> ServiceDesk<'a> {
    pub fn new(store: &'a dyn KeyValueStore) -> Self {
        Self { store }
    }

    pub fn create_request(&self, user_id: &str, new: NewServiceRequest) -> Result<ServiceRequest> {
        v::required("Title", &new.title).map_err(Error::InvalidInput)?;

        let request = ServiceRequest {
            id: crate::time::now_millis(),
            user_id: user_id.to_string(),
            title: new.title,
            category: new.category,
            details: new.details,
            status: DEFAULT_STATUS.to_string(),
            created_at: crate::time::now(),
        };
        let mut requests = self.requests()?;
        requests.push(request.clone());
        save_collection(self.store, SERVICE_REQUESTS, &requests)?;
        tracing::info!(request_id = request.id, user_id, "service request submitted");
        Ok(request)
    }

    pub fn requests(&self) -> Result<Vec<ServiceRequest>> {
        Ok(load_collection(self.store, SERVICE_REQUESTS)?)
    }

    pub fn requests_for_user(&self, user_id: &str) -> Result<Vec<ServiceRequest>> {
        Ok(self
            .requests()?
            .into_iter()
            .filter(|r| r.user_id == user_id)
            .collect())
    }

    pub fn filter_requests(&self, filter: &StatusFilter) -> Result<Vec<ServiceRequest>> {
        Ok(self
            .requests()?
            .into_iter()
            .filter(|r| filter.accepts(&r.status))
            .collect())
    }

    pub fn find_request(&self, request_id: u64) -> Result<Option<ServiceRequest>> {
        Ok(self.requests()?.into_iter().find(|r| r.id == request_id))
    }

    /// Sets the status of the first request with this id. Returns false and
    /// writes nothing when the id is unknown.
    pub fn update_status(&self, request_id: u64, status: &str) -> Result<bool> {
        let mut requests = self.requests()?;
        let Some(request) = requests.iter_mut().find(|r| r.id == request_id) else {
            tracing::debug!(request_id, "status update skipped: no such request");
            return Ok(false);
        };
        request.status = status.to_string();
        save_collection(self.store, SERVICE_REQUESTS, &requests)?;
        tracing::info!(request_id, status, "service request status changed");
        Ok(true)
    }

    pub fn book_appointment(&self, user_id: &str, new: NewAppointment) -> Result<Appointment> {
        v::appointment_date(&new.date).map_err(Error::InvalidInput)?;
        v::appointment_time(&new.time).map_err(Error::InvalidInput)?;

        let appointment = Appointment {
            id: crate::time::now_millis(),
            user_id: user_id.to_string(),
            date: new.date,
            time: new.time,
            service_type: new.service_type,
            notes: new.notes,
            status: DEFAULT_STATUS.to_string(),
            created_at: crate::time::now(),
        };
        let mut appointments = self.appointments()?;
        appointments.push(appointment.clone());
        save_collection(self.store, APPOINTMENTS, &appointments)?;
        tracing::info!(appointment_id = appointment.id, user_id, "appointment booked");
        Ok(appointment)
    }

    pub fn appointments(&self) -> Result<Vec<Appointment>> {
        Ok(load_collection(self.store, APPOINTMENTS)?)
    }

    pub fn appointments_for_user(&self, user_id: &str) -> Result<Vec<Appointment>> {
        Ok(self
            .appointments()?
            .into_iter()
            .filter(|a| a.user_id == user_id)
            .collect())
    }
}
