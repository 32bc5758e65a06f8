use clap::{Args, Parser, Subcommand, ValueEnum};
use loyalty_core::{PointsAction, UserType};

/// Loyalty Desk - membership, points and service requests from the terminal
#[derive(Parser, Clone, Debug)]
#[command(name = "loyalty_backend")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Loyalty Desk with sled storage and database management")]
#[command(long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, default_value_t = false, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, default_value = ".env", global = true)]
    pub config: String,

    /// Sled database directory override
    #[arg(long, env = "DB_FULL_PATH", global = true)]
    pub db_path: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Which login tab a sign-in goes through.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channel {
    Customer,
    Admin,
}

impl From<Channel> for UserType {
    fn from(channel: Channel) -> Self {
        match channel {
            Channel::Customer => UserType::Customer,
            Channel::Admin => UserType::Admin,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionArg {
    Add,
    Subtract,
    Set,
}

impl From<ActionArg> for PointsAction {
    fn from(action: ActionArg) -> Self {
        match action {
            ActionArg::Add => PointsAction::Add,
            ActionArg::Subtract => PointsAction::Subtract,
            ActionArg::Set => PointsAction::Set,
        }
    }
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Create the collections and seed the default admin
    Init,
    /// Start a registration; prints the verification code
    Register(RegisterArgs),
    /// Finish a pending registration
    VerifyRegistration {
        otp: String,
    },
    /// Check credentials and stage a login code
    Login(LoginArgs),
    /// Finish a pending login
    VerifyLogin {
        otp: String,
    },
    /// Issue a fresh code for the pending login or registration
    ResendOtp {
        /// Resend the registration code instead of the login code
        #[arg(long)]
        registration: bool,
    },
    /// Clear the signed-in user
    Logout,
    /// Show the dashboard of the signed-in user
    Whoami,
    /// Member administration (admin only)
    Members {
        #[command(subcommand)]
        action: MemberCommands,
    },
    /// Points balance management (admin only)
    Points {
        #[command(subcommand)]
        action: PointsCommands,
    },
    /// Membership management (admin only)
    Membership {
        #[command(subcommand)]
        action: MembershipCommands,
    },
    /// Service requests
    Requests {
        #[command(subcommand)]
        action: RequestCommands,
    },
    /// Service appointments
    Appointments {
        #[command(subcommand)]
        action: AppointmentCommands,
    },
    /// Session scope management
    Session {
        #[command(subcommand)]
        action: SessionCommands,
    },
    /// Database management commands
    Db {
        #[command(subcommand)]
        action: DbCommands,
    },
}

#[derive(Args, Clone, Debug)]
pub struct RegisterArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub email: String,
    #[arg(long, default_value = "")]
    pub phone: String,
    #[arg(long)]
    pub password: String,
    #[arg(long)]
    pub confirm_password: String,
}

#[derive(Args, Clone, Debug)]
pub struct LoginArgs {
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub password: String,
    /// Login tab
    #[arg(long = "as", value_enum, default_value_t = Channel::Customer)]
    pub channel: Channel,
}

#[derive(Subcommand, Clone, Debug)]
pub enum MemberCommands {
    /// List every non-admin user
    List,
    /// Case-insensitive search across the member table
    Search { term: String },
    /// Member details with membership status
    Show { user_id: String },
}

#[derive(Subcommand, Clone, Debug)]
pub enum PointsCommands {
    /// Add, subtract or set a member's balance
    Adjust {
        #[arg(long)]
        user: String,
        #[arg(long, value_enum)]
        action: ActionArg,
        #[arg(long)]
        amount: u64,
        #[arg(long, default_value = "")]
        reason: String,
    },
    /// Latest points-history entries, newest first
    History {
        #[arg(long, default_value_t = loyalty_core::points::RECENT_HISTORY_LIMIT)]
        limit: usize,
    },
}

#[derive(Subcommand, Clone, Debug)]
pub enum MembershipCommands {
    Grant {
        #[arg(long)]
        user: String,
        /// Membership type, e.g. gold
        #[arg(long = "type")]
        kind: String,
        /// Expiry date, YYYY-MM-DD or RFC 3339
        #[arg(long)]
        expiry: String,
    },
    /// Remove the membership and zero the balance
    Revoke {
        #[arg(long)]
        user: String,
    },
    Show {
        #[arg(long)]
        user: String,
    },
}

#[derive(Subcommand, Clone, Debug)]
pub enum RequestCommands {
    /// File a request as the signed-in customer
    Create {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        category: String,
        #[arg(long, default_value = "")]
        details: String,
    },
    /// Admins see all requests, customers their own
    List {
        /// "all" or a status substring
        #[arg(long, default_value = "all")]
        status: String,
    },
    Show { id: u64 },
    /// Change a request's status (admin only)
    UpdateStatus { id: u64, status: String },
}

#[derive(Subcommand, Clone, Debug)]
pub enum AppointmentCommands {
    /// Book as the signed-in customer
    Book {
        /// YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// HH:MM
        #[arg(long)]
        time: String,
        #[arg(long, default_value = "")]
        service_type: String,
        #[arg(long, default_value = "")]
        notes: String,
    },
    List,
}

#[derive(Subcommand, Clone, Debug)]
pub enum SessionCommands {
    /// Drop every session key, like closing the browser tab
    End,
}

#[derive(Subcommand, Clone, Debug)]
pub enum DbCommands {
    /// Open the database and report collection sizes
    Test,
    /// Export the persistent collections to a JSON file
    Dump {
        #[arg(short, long, default_value = "loyalty_dump.json")]
        output: String,
    },
    /// Replace the persistent collections from a JSON dump
    Import {
        #[arg(short, long)]
        input: String,
    },
    /// Snapshot the database directory
    Backup,
    /// Restore the newest snapshot into an empty database directory
    Restore,
}

impl Commands {
    /// Short label used in command logging.
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Init => "init",
            Commands::Register(_) => "register",
            Commands::VerifyRegistration { .. } => "verify-registration",
            Commands::Login(_) => "login",
            Commands::VerifyLogin { .. } => "verify-login",
            Commands::ResendOtp { .. } => "resend-otp",
            Commands::Logout => "logout",
            Commands::Whoami => "whoami",
            Commands::Members { .. } => "members",
            Commands::Points { .. } => "points",
            Commands::Membership { .. } => "membership",
            Commands::Requests { .. } => "requests",
            Commands::Appointments { .. } => "appointments",
            Commands::Session { .. } => "session",
            Commands::Db { .. } => "db",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut full = vec!["loyalty_backend"];
        full.extend_from_slice(args);
        Cli::try_parse_from(full).unwrap()
    }

    #[test]
    fn global_flags_follow_subcommands() {
        let cli = parse(&["whoami", "--verbose", "--db-path", "/tmp/db"]);
        assert!(cli.verbose);
        assert_eq!(cli.db_path.as_deref(), Some("/tmp/db"));
        assert_eq!(cli.config, ".env");
        assert_eq!(cli.command.name(), "whoami");
    }

    #[test]
    fn login_defaults_to_customer_tab() {
        let cli = parse(&["login", "--email", "a@x.com", "--password", "p1"]);
        match cli.command {
            Commands::Login(args) => assert_eq!(UserType::from(args.channel), UserType::Customer),
            other => panic!("unexpected {:?}", other),
        }

        let cli = parse(&["login", "--email", "a@x.com", "--password", "p1", "--as", "admin"]);
        assert!(matches!(cli.command, Commands::Login(LoginArgs { channel: Channel::Admin, .. })));
    }

    #[test]
    fn points_adjust_parses_action() {
        let cli = parse(&["points", "adjust", "--user", "U1", "--action", "subtract", "--amount", "30"]);
        match cli.command {
            Commands::Points {
                action: PointsCommands::Adjust { user, action, amount, reason },
            } => {
                assert_eq!(user, "U1");
                assert_eq!(PointsAction::from(action), PointsAction::Subtract);
                assert_eq!(amount, 30);
                assert!(reason.is_empty());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn negative_amounts_are_rejected() {
        let res = Cli::try_parse_from([
            "loyalty_backend", "points", "adjust", "--user", "U1", "--action", "add", "--amount", "-5",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn membership_grant_uses_type_flag() {
        let cli = parse(&["membership", "grant", "--user", "U1", "--type", "gold", "--expiry", "2030-01-01"]);
        assert!(matches!(
            cli.command,
            Commands::Membership { action: MembershipCommands::Grant { ref kind, .. } } if kind == "gold"
        ));
    }

    #[test]
    fn request_listing_defaults_to_all() {
        let cli = parse(&["requests", "list"]);
        assert!(matches!(
            cli.command,
            Commands::Requests { action: RequestCommands::List { ref status } } if status == "all"
        ));
    }
}
