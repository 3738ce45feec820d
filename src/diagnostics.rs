//! System diagnostics and dependency checking.
//!
//! Verifies that required external tools and credentials are available before
//! a run wastes time transcoding.

use crate::config::Config;
use crate::defaults;
use std::process::Command;

/// Result of a dependency check.
#[derive(Debug, PartialEq)]
pub enum CheckResult {
    /// Dependency is available and working
    Ok,
    /// Dependency is not found
    NotFound,
    /// Dependency is present but has issues
    Warning(String),
}

/// Check if a command exists and is executable.
fn check_command(command: &str) -> CheckResult {
    match Command::new(command).arg("-version").output() {
        Ok(output) if output.status.success() => CheckResult::Ok,
        Ok(_) => CheckResult::Warning(format!("'{}' found but -version failed", command)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => CheckResult::NotFound,
        Err(e) => CheckResult::Warning(format!("Error checking '{}': {}", command, e)),
    }
}

/// Check that the bearer token for remote services is configured.
fn check_token() -> CheckResult {
    match std::env::var(defaults::TOKEN_ENV) {
        Ok(token) if !token.is_empty() => CheckResult::Ok,
        _ => CheckResult::NotFound,
    }
}

fn print_result(name: &str, result: &CheckResult, hint: &str) {
    match result {
        CheckResult::Ok => eprintln!("  ✓ {}", name),
        CheckResult::NotFound => {
            eprintln!("  ✗ {} not found", name);
            if !hint.is_empty() {
                eprintln!("    {}", hint);
            }
        }
        CheckResult::Warning(message) => eprintln!("  ⚠ {}: {}", name, message),
    }
}

/// Run all dependency checks and print a report. Returns true when every
/// check passed.
pub fn check_dependencies(config: &Config) -> bool {
    eprintln!("Checking dependencies...");

    let ffmpeg = check_command("ffmpeg");
    print_result(
        "ffmpeg",
        &ffmpeg,
        "Install: sudo apt install ffmpeg (Debian/Ubuntu), sudo pacman -S ffmpeg (Arch)",
    );

    let token = check_token();
    print_result(
        defaults::TOKEN_ENV,
        &token,
        "Export a bearer token for the staging and recognition services",
    );

    let bucket = if config.staging.bucket.is_empty() {
        CheckResult::Warning("staging.bucket is empty".to_string())
    } else {
        CheckResult::Ok
    };
    print_result("staging bucket", &bucket, "");

    matches!(ffmpeg, CheckResult::Ok)
        && matches!(token, CheckResult::Ok)
        && matches!(bucket, CheckResult::Ok)
}
