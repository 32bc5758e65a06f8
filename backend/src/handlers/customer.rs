use super::{Context, HandlerError};
use crate::cli::{AppointmentCommands, RequestCommands};
use crate::logging::print_success;
use anyhow::Result;
use loyalty_core::time::format_date;
use loyalty_core::{
    AdminDashboard, Appointment, NewAppointment, NewServiceRequest, Page, ServiceDesk, ServiceRequest,
    StatusFilter,
};

pub fn requests(ctx: &Context, action: RequestCommands) -> Result<()> {
    let desk = ServiceDesk::new(ctx.local);

    match action {
        RequestCommands::Create { title, category, details } => {
            let user = ctx.require(Page::CustomerDashboard)?;
            let request = desk.create_request(&user.user_id, NewServiceRequest { title, category, details })?;
            print_success(&format!("Service request #{} submitted", request.id));
        }
        RequestCommands::List { status } => {
            let filter = StatusFilter::parse(&status);
            let user = ctx.current_user()?;
            let rows = match user {
                Some(u) if u.is_admin() => AdminDashboard::new(ctx.local).service_requests(&filter)?,
                _ => {
                    let u = ctx.require(Page::CustomerDashboard)?;
                    desk.requests_for_user(&u.user_id)?
                        .into_iter()
                        .filter(|r| filter.accepts(&r.status))
                        .collect()
                }
            };
            if rows.is_empty() {
                println!("No service requests");
            }
            for request in &rows {
                print_request(request);
            }
        }
        RequestCommands::Show { id } => {
            let user = ctx.current_user()?;
            let request = desk
                .find_request(id)?
                // customers only see their own requests
                .filter(|r| user.as_ref().is_some_and(|u| u.is_admin() || u.user_id == r.user_id))
                .ok_or_else(|| HandlerError::NotFound(format!("Service request #{}", id)))?;
            print_request(&request);
            if !request.details.is_empty() {
                println!("    {}", request.details);
            }
        }
        RequestCommands::UpdateStatus { id, status } => {
            ctx.require(Page::AdminDashboard)?;
            if !desk.update_status(id, status.trim())? {
                return Err(HandlerError::NotFound(format!("Service request #{}", id)).into());
            }
            print_success(&format!("Request #{} marked {}", id, status.trim()));
        }
    }
    Ok(())
}

fn print_request(request: &ServiceRequest) {
    println!(
        "#{:<14} {:<11} {:<12} {}  ({})",
        request.id,
        request.status,
        request.category,
        request.title,
        format_date(&request.created_at)
    );
}

pub fn appointments(ctx: &Context, action: AppointmentCommands) -> Result<()> {
    let desk = ServiceDesk::new(ctx.local);

    match action {
        AppointmentCommands::Book { date, time, service_type, notes } => {
            let user = ctx.require(Page::CustomerDashboard)?;
            let booked = desk.book_appointment(&user.user_id, NewAppointment { date, time, service_type, notes })?;
            print_success(&format!("Appointment booked for {} at {}", booked.date, booked.time));
        }
        AppointmentCommands::List => {
            let rows = match ctx.current_user()? {
                Some(u) if u.is_admin() => desk.appointments()?,
                _ => {
                    let u = ctx.require(Page::CustomerDashboard)?;
                    desk.appointments_for_user(&u.user_id)?
                }
            };
            if rows.is_empty() {
                println!("No appointments");
            }
            for appointment in &rows {
                print_appointment(appointment);
            }
        }
    }
    Ok(())
}

fn print_appointment(a: &Appointment) {
    println!("{} {}  {:<16} {:<10} {}", a.date, a.time, a.service_type, a.status, a.notes);
}
