use crate::config::LoggingConfig;
use colored::Colorize;
use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;
use tracing_subscriber::{
    fmt::{self, time::ChronoUtc},
    prelude::*,
    EnvFilter,
};

/// Initialize the logging system with colors and build information.
///
/// `RUST_LOG` wins over the built-in filter. When file logging is enabled a
/// second plain-text layer appends to the configured path.
pub fn init_logging(verbose: bool, config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = if verbose {
        "debug,loyalty_backend=trace,loyalty_core=trace,sled=info"
    } else {
        "warn,loyalty_backend=info,loyalty_core=info"
    };

    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(filter))?;

    // Command output goes to stdout, so diagnostics stay on stderr.
    let use_ansi = atty::is(atty::Stream::Stderr);
    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_timer(ChronoUtc::rfc_3339())
        .with_ansi(use_ansi)
        .with_file(verbose)
        .with_line_number(verbose)
        .with_writer(io::stderr);

    let file_layer = match (config.file_enabled, config.file_path.as_deref()) {
        (true, Some(path)) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        _ => None,
    };

    // Forward log crate records to tracing
    let _ = tracing_log::LogTracer::init();

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(file_layer)
        .try_init();

    tracing::debug!("PID={} starting up", std::process::id());

    Ok(())
}

/// Print build and version information with colors
pub fn print_build_info() {
    let name = env!("CARGO_PKG_NAME");
    let version = option_env!("APP_BUILD_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
    let build_timestamp = option_env!("VERGEN_BUILD_TIMESTAMP").unwrap_or("unknown");
    let git_branch = option_env!("VERGEN_GIT_BRANCH").unwrap_or("no-git");
    let git_commit: String = option_env!("VERGEN_GIT_SHA")
        .unwrap_or("00000000")
        .chars()
        .take(8)
        .collect();
    let desc = option_env!("APP_PKG_DESCRIPTION").unwrap_or("");

    println!("{}", "═".repeat(60).cyan());
    println!("{} v{}", name.bold(), version);
    if !desc.is_empty() {
        println!("Description: {}", desc);
    }
    println!("{}", "─".repeat(60).cyan());
    println!("Build: {}", build_timestamp);
    println!("Git: {} ({})", git_branch, git_commit);
    println!("{}", "═".repeat(60).cyan());
}

/// Log CLI command execution
pub fn log_command_start(command: &str, description: &str) {
    tracing::info!("⚡ Executing: {} ({})", command, description);
}

/// Log command completion
pub fn log_command_complete(command: &str, success: bool, duration: std::time::Duration) {
    if success {
        tracing::info!("✅ Command '{}' completed in {:.2?}", command, duration);
    } else {
        tracing::error!("❌ Command '{}' failed after {:.2?}", command, duration);
    }
}

/// Log collection operation status
pub fn log_collection_operation(operation: &str, collection: &str, count: Option<usize>) {
    let icon = match operation {
        "seed" => "📝",
        "dump" => "💾",
        "import" => "📥",
        _ => "🔄",
    };
    let count_text = count.map(|c| format!(" ({} records)", c)).unwrap_or_default();
    tracing::info!("{} {} collection {}{}", icon, operation.to_uppercase(), collection, count_text);
}

pub fn log_warning(message: &str) {
    tracing::warn!("⚠️ {}", message);
}

pub fn log_error(message: &str) {
    tracing::error!("❌ {}", message);
}

/// Prints a user-facing failure in red, the terminal stand-in for an alert.
pub fn print_failure(message: &str) {
    eprintln!("{}", message.red().bold());
}

pub fn print_success(message: &str) {
    println!("{}", message.green());
}
