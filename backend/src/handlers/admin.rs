use super::Context;
use crate::cli::{ActionArg, MemberCommands, MembershipCommands, PointsCommands};
use crate::logging::print_success;
use anyhow::Result;
use colored::Colorize;
use loyalty_core::dashboard::MemberRow;
use loyalty_core::time::{format_date, now, parse_date};
use loyalty_core::{AdminDashboard, Error, LoyaltyService, MembershipService, Page};

pub fn members(ctx: &Context, action: MemberCommands) -> Result<()> {
    ctx.require(Page::AdminDashboard)?;
    let dashboard = AdminDashboard::new(ctx.local);

    match action {
        MemberCommands::List => print_rows(&dashboard.members()?),
        MemberCommands::Search { term } => print_rows(&dashboard.search_members(&term)?),
        MemberCommands::Show { user_id } => {
            let details = dashboard.member_details(&user_id)?.ok_or(Error::UserNotFound)?;
            let status = MembershipService::new(ctx.local).status(&user_id, now())?;
            println!("{}", details.name.bold());
            println!("Email:      {}", details.email);
            println!("Member ID:  {}", details.user_id);
            println!("Points:     {}", details.points);
            println!("Membership: {} ({})", details.membership, status);
            println!("Registered: {}", details.registered);
        }
    }
    Ok(())
}

fn print_rows(rows: &[MemberRow]) {
    if rows.is_empty() {
        println!("No members found");
        return;
    }
    println!(
        "{:<24} {:<20} {:<28} {:<12} {:>8}",
        "ID".bold(),
        "Name".bold(),
        "Email".bold(),
        "Membership".bold(),
        "Points".bold()
    );
    for row in rows {
        println!(
            "{:<24} {:<20} {:<28} {:<12} {:>8}",
            row.user_id, row.name, row.email, row.membership, row.points
        );
    }
}

pub fn points(ctx: &Context, action: PointsCommands) -> Result<()> {
    ctx.require(Page::AdminDashboard)?;
    let loyalty = LoyaltyService::new(ctx.local);

    match action {
        PointsCommands::Adjust { user, action, amount, reason } => {
            let balance = loyalty.adjust(&user, action.into(), amount, &reason)?;
            let verb = match action {
                ActionArg::Add => "added",
                ActionArg::Subtract => "subtracted",
                ActionArg::Set => "set",
            };
            print_success(&format!("Points {} successfully. New balance: {}", verb, balance));
        }
        PointsCommands::History { limit } => {
            let entries = loyalty.recent_history(limit)?;
            if entries.is_empty() {
                println!("No points history yet");
            }
            for entry in entries {
                println!(
                    "{}  {:<20} {:<9} {:>6}  {}",
                    format_date(&entry.date),
                    entry.user_name,
                    entry.action,
                    entry.amount,
                    entry.reason
                );
            }
        }
    }
    Ok(())
}

pub fn membership(ctx: &Context, action: MembershipCommands) -> Result<()> {
    ctx.require(Page::AdminDashboard)?;
    let service = MembershipService::new(ctx.local);

    match action {
        MembershipCommands::Grant { user, kind, expiry } => {
            let expiry = parse_date(&expiry)
                .ok_or_else(|| Error::InvalidInput(format!("'{}' is not a valid expiry date", expiry)))?;
            let granted = service.grant(&user, kind.trim(), expiry)?;
            print_success(&format!(
                "{} membership granted until {}",
                granted.kind.to_uppercase(),
                format_date(&granted.expiry_date)
            ));
        }
        MembershipCommands::Revoke { user } => {
            service.revoke(&user)?;
            print_success("Membership revoked and points reset");
        }
        MembershipCommands::Show { user } => {
            println!("{}", service.status(&user, now())?);
        }
    }
    Ok(())
}
