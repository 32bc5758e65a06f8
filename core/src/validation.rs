use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

static RE_EMAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}$").unwrap());
static RE_PHONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9+()\-.\s]{6,32}$").unwrap());

pub fn email(s: &str) -> bool { RE_EMAIL.is_match(s) }
pub fn phone(s: &str) -> bool { RE_PHONE.is_match(s) }

pub fn validate_email_strict(email_str: &str) -> Result<(), String> {
    if !email(email_str) {
        return Err("Invalid email format".into());
    }
    if email_str.len() > 254 {
        return Err("Email too long".into());
    }
    let (local, domain) = email_str.split_once('@').ok_or("Invalid email format")?;
    if local.is_empty() || local.len() > 64 {
        return Err("Invalid email local part".into());
    }
    if domain.is_empty() || !domain.contains('.') {
        return Err("Invalid email domain".into());
    }
    Ok(())
}

pub fn required(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} is required", field));
    }
    Ok(())
}

/// Phone is optional on the registration form.
pub fn optional_phone(value: &str) -> Result<(), String> {
    if value.is_empty() || phone(value) {
        Ok(())
    } else {
        Err("Invalid phone number".into())
    }
}

/// Date picker value, `YYYY-MM-DD`.
pub fn appointment_date(value: &str) -> Result<(), String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| "Appointment date must be YYYY-MM-DD".into())
}

/// Time picker value, `HH:MM`.
pub fn appointment_time(value: &str) -> Result<(), String> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map(|_| ())
        .map_err(|_| "Appointment time must be HH:MM".into())
}
