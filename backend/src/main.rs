// Loyalty Desk command-line host over sled storage
use clap::Parser;
use std::time::Instant;

// Module declarations
mod backup;
mod cli;
mod config;
mod db;
mod handlers;
mod logging;

use backup::BackupManager;
use cli::{Cli, Commands, DbCommands, SessionCommands};
use db::Database;
use handlers::Context;

fn main() {
    let cli = Cli::parse();

    // Load configuration first so LOG_FILE_* from .env reaches the logger.
    let cfg = config::load_config_from_file(&cli.config).with_sled_path(cli.db_path.as_deref());

    if let Err(e) = logging::init_logging(cli.verbose, &cfg.logging) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }
    if cli.verbose {
        logging::print_build_info();
    }

    let name = cli.command.name();
    logging::log_command_start(name, &cfg.sled_path);
    let started = Instant::now();

    let result = run(cli.command, &cfg);
    logging::log_command_complete(name, result.is_ok(), started.elapsed());

    if let Err(err) = result {
        match handlers::user_facing_message(&err) {
            Some(message) => logging::print_failure(&message),
            None => {
                logging::log_error(&format!("{:#}", err));
                logging::print_failure(&format!("Error: {:#}", err));
            }
        }
        std::process::exit(1);
    }
}

fn run(command: Commands, cfg: &config::AppConfig) -> anyhow::Result<()> {
    let backups = BackupManager::new(&cfg.sled_path, &cfg.backup_dir, &cfg.backup_name_template);

    // Restore must run while the database is closed.
    if let Commands::Db { action: DbCommands::Restore } = command {
        if backups.restore_from_latest()? {
            logging::print_success("Database restored from latest backup");
        } else {
            logging::log_warning("Nothing restored");
            println!("Nothing restored (no backup, or the database already holds data)");
        }
        return Ok(());
    }

    if let Some(parent) = std::path::Path::new(&cfg.sled_path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    let database = Database::new(&cfg.sled_path)?;
    let local = database.local()?;
    let session = database.session()?;

    // Every page context starts by making sure storage is seeded.
    loyalty_core::init_storage(&local)?;

    let ctx = Context {
        local: &local,
        session: &session,
        otp_echo: cfg.otp_echo,
    };

    match command {
        Commands::Init => handlers::account::init(&ctx)?,
        Commands::Register(args) => handlers::account::register(&ctx, args)?,
        Commands::VerifyRegistration { otp } => {
            handlers::account::verify_registration(&ctx, &otp)?;
        }
        Commands::Login(args) => handlers::account::login(&ctx, args)?,
        Commands::VerifyLogin { otp } => {
            handlers::account::verify_login(&ctx, &otp)?;
        }
        Commands::ResendOtp { registration } => handlers::account::resend_otp(&ctx, registration)?,
        Commands::Logout => handlers::account::logout(&ctx)?,
        Commands::Whoami => handlers::account::whoami(&ctx)?,
        Commands::Members { action } => handlers::admin::members(&ctx, action)?,
        Commands::Points { action } => handlers::admin::points(&ctx, action)?,
        Commands::Membership { action } => handlers::admin::membership(&ctx, action)?,
        Commands::Requests { action } => handlers::customer::requests(&ctx, action)?,
        Commands::Appointments { action } => handlers::customer::appointments(&ctx, action)?,
        Commands::Session { action: SessionCommands::End } => handlers::account::end_session(&ctx)?,
        Commands::Db { action } => match action {
            DbCommands::Test => handlers::db::test(&database)?,
            DbCommands::Dump { output } => handlers::db::dump(&local, &output)?,
            DbCommands::Import { input } => handlers::db::import(&local, &input)?,
            DbCommands::Backup => {
                database.flush()?;
                let path = backups.backup_now(cfg.backup_retention)?;
                logging::print_success(&format!("Backup written to {}", path.display()));
            }
            // handled before the database opens
            DbCommands::Restore => {}
        },
    }

    database.flush()?;
    Ok(())
}
