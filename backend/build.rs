use std::{env, process::Command};
use vergen::EmitBuilder;

fn main() {
    // Build & cargo info always; git metadata only inside a worktree with a HEAD
    let mut emit_builder = EmitBuilder::builder();
    emit_builder.all_build().all_cargo();

    let has_head = Command::new("git")
        .args(["rev-parse", "--verify", "HEAD"])
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false);
    if has_head {
        emit_builder.all_git();
    }

    if let Err(e) = emit_builder.emit() {
        println!("cargo:warning=Unable to generate build information: {}", e);
    }

    // Patch component carries the commit count so local builds sort after releases.
    let base_ver = env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "0.0.0".into());
    let commits = if has_head {
        Command::new("git")
            .args(["rev-list", "--count", "HEAD"])
            .output()
            .ok()
            .filter(|o| o.status.success())
            .and_then(|o| String::from_utf8_lossy(&o.stdout).trim().parse::<u64>().ok())
            .unwrap_or(0)
    } else {
        0
    };
    let (maj, min, pat) = parse_semver(&base_ver);
    println!("cargo:rustc-env=APP_BUILD_VERSION={}.{}.{}", maj, min, pat + commits);

    if let Ok(desc) = env::var("CARGO_PKG_DESCRIPTION") {
        println!("cargo:rustc-env=APP_PKG_DESCRIPTION={}", desc);
    }
    println!("cargo:rerun-if-changed=build.rs");
}

fn parse_semver(s: &str) -> (u64, u64, u64) {
    let mut parts = s.split('.').map(|p| p.parse().unwrap_or(0));
    (
        parts.next().unwrap_or(0),
        parts.next().unwrap_or(0),
        parts.next().unwrap_or(0),
    )
}
