use super::Context;
use crate::cli::{LoginArgs, RegisterArgs};
use crate::logging::print_success;
use anyhow::Result;
use colored::Colorize;
use loyalty_core::dashboard::{customer_summary, CustomerSummary};
use loyalty_core::time::format_date;
use loyalty_core::{init_storage, AuthService, LoginState, Page, RegistrationForm, RegistrationService, User};

pub fn init(ctx: &Context) -> Result<()> {
    init_storage(ctx.local)?;
    print_success("Storage initialized");
    Ok(())
}

pub fn register(ctx: &Context, args: RegisterArgs) -> Result<()> {
    let form = RegistrationForm {
        name: args.name,
        email: args.email,
        phone: args.phone,
        password: args.password,
        confirm_password: args.confirm_password,
    };
    let challenge = RegistrationService::new(ctx.stores()).begin(form)?;
    ctx.deliver_otp(&challenge.email, &challenge.otp);
    println!("Run `verify-registration <code>` to finish.");
    Ok(())
}

pub fn verify_registration(ctx: &Context, otp: &str) -> Result<User> {
    let user = RegistrationService::new(ctx.stores()).verify_otp(otp.trim())?;
    print_success("Registration successful! Please login.");
    println!("Your member ID: {}", user.user_id.bold());
    Ok(user)
}

pub fn login(ctx: &Context, args: LoginArgs) -> Result<()> {
    let challenge = AuthService::new(ctx.stores()).login(&args.email, &args.password, args.channel.into())?;
    ctx.deliver_otp(&challenge.email, &challenge.otp);
    println!("Run `verify-login <code>` to finish.");
    Ok(())
}

pub fn verify_login(ctx: &Context, otp: &str) -> Result<Page> {
    let page = AuthService::new(ctx.stores()).verify_otp(otp.trim())?;
    print_success(&format!("Signed in. Redirecting to {}", page.path()));
    Ok(page)
}

pub fn resend_otp(ctx: &Context, registration: bool) -> Result<()> {
    let challenge = if registration {
        RegistrationService::new(ctx.stores()).resend_otp()?
    } else {
        AuthService::new(ctx.stores()).resend_otp()?
    };
    ctx.deliver_otp(&challenge.email, &challenge.otp);
    Ok(())
}

pub fn logout(ctx: &Context) -> Result<()> {
    AuthService::new(ctx.stores()).logout()?;
    print_success("Signed out");
    Ok(())
}

pub fn end_session(ctx: &Context) -> Result<()> {
    ctx.session.clear()?;
    print_success("Session cleared");
    Ok(())
}

/// Prints the dashboard the signed-in user would land on.
pub fn whoami(ctx: &Context) -> Result<()> {
    let auth = AuthService::new(ctx.stores());
    let Some(user) = auth.current_user()? else {
        match auth.state()? {
            LoginState::OtpPending => println!("Login pending verification. Run `verify-login <code>`."),
            _ => println!("Not signed in."),
        }
        return Ok(());
    };

    if user.is_admin() {
        println!("{} {} ({})", "Admin:".bold(), user.name, user.email);
        println!("Dashboard: {}", Page::AdminDashboard.path());
        return Ok(());
    }

    let summary = customer_summary(&user, loyalty_core::time::now());
    print_summary(&summary);

    let desk = loyalty_core::ServiceDesk::new(ctx.local);
    let requests = desk.requests_for_user(&user.user_id)?;
    let appointments = desk.appointments_for_user(&user.user_id)?;
    println!("Service requests: {}  Appointments: {}", requests.len(), appointments.len());
    Ok(())
}

/// Points are worth half a rupee each.
fn format_points_value(value: f64) -> String {
    format!("\u{20b9}{:.2}", value)
}

fn print_summary(summary: &CustomerSummary) {
    println!("{}", summary.welcome.bold());
    println!("Member ID: {}  Email: {}", summary.user_id, summary.email);
    println!("Member since: {}", summary.member_since);
    println!(
        "Points: {}  Services: {}  Membership: {}",
        summary.stats.total_points, summary.stats.services_count, summary.stats.membership_status
    );
    if let Some(card) = &summary.membership {
        println!(
            "{} membership  {} - {}  [{}]",
            card.title, card.start_date, card.expiry_date, card.status
        );
    }
    if let Some(points) = &summary.points {
        println!(
            "Balance: {} pts ({}), expires {}",
            points.total_points,
            format_points_value(points.value),
            points.expires_on
        );
    }
    for entry in &summary.service_history {
        println!(
            "  {}  {}  {:+} pts  {}",
            format_date(&entry.date),
            entry.service_name,
            entry.points_earned,
            entry.status
        );
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::Fixture;
    use super::*;
    use crate::cli::Channel;
    use loyalty_core::store::{CURRENT_USER, LOGIN_OTP, REGISTRATION_OTP};
    use loyalty_core::KeyValueStore;

    fn register_args(email: &str) -> RegisterArgs {
        RegisterArgs {
            name: "A".into(),
            email: email.into(),
            phone: String::new(),
            password: "p1".into(),
            confirm_password: "p1".into(),
        }
    }

    #[test]
    fn balance_is_shown_in_rupees() {
        assert_eq!(format_points_value(125.0), "\u{20b9}125.00");
        assert_eq!(format_points_value(0.5), "\u{20b9}0.50");
    }

    #[test]
    fn register_and_sign_in_across_invocations() {
        let fx = Fixture::new();
        let ctx = fx.ctx();

        register(&ctx, register_args("a@x.com")).unwrap();
        let code = fx.session.get_raw(REGISTRATION_OTP).unwrap().unwrap();
        let user = verify_registration(&ctx, &format!(" {} ", code)).unwrap();
        assert!(user.verified);

        login(
            &ctx,
            LoginArgs { email: "a@x.com".into(), password: "p1".into(), channel: Channel::Customer },
        )
        .unwrap();
        let code = fx.session.get_raw(LOGIN_OTP).unwrap().unwrap();
        assert_eq!(verify_login(&ctx, &code).unwrap(), Page::CustomerDashboard);
        assert_eq!(fx.session.get_raw(CURRENT_USER).unwrap(), Some(user.user_id));

        whoami(&ctx).unwrap();
        logout(&ctx).unwrap();
        assert!(ctx.current_user().unwrap().is_none());
    }

    #[test]
    fn wrong_channel_is_reported() {
        let fx = Fixture::new();
        let ctx = fx.ctx();
        let err = login(
            &ctx,
            LoginArgs {
                email: "admin@admin.com".into(),
                password: "admin123".into(),
                channel: Channel::Customer,
            },
        )
        .unwrap_err();
        assert_eq!(super::super::user_facing_message(&err).as_deref(), Some("Please use Admin login"));
    }

    #[test]
    fn session_end_drops_pending_codes() {
        let fx = Fixture::new();
        let ctx = fx.ctx();
        register(&ctx, register_args("b@x.com")).unwrap();
        end_session(&ctx).unwrap();
        assert!(fx.session.keys().unwrap().is_empty());
        assert!(resend_otp(&ctx, true).is_err());
    }
}
