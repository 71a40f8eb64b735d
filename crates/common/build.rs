use std::env;
use std::process::Command;

/// Run a command and return its trimmed stdout if it exited cleanly.
fn command_output(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn set_env(key: &str, value: &str) {
    println!("cargo:rustc-env={}={}", key, value);
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=../../.git/HEAD");
    println!("cargo:rerun-if-changed=../../.git/refs/heads");

    let profile = env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());
    set_env("BUILD_PROFILE", &profile);

    let features: Vec<String> = env::vars()
        .filter_map(|(key, _)| key.strip_prefix("CARGO_FEATURE_").map(str::to_lowercase))
        .collect();
    let features = if features.is_empty() {
        "none".to_string()
    } else {
        features.join(",")
    };
    set_env("BUILD_FEATURES", &features);

    // CI_BUILD_REF wins, then git, then the crate version
    let version = env::var("CI_BUILD_REF")
        .ok()
        .filter(|v| !v.is_empty())
        .or_else(|| command_output("git", &["describe", "--always", "--dirty", "--long", "--tags"]))
        .or_else(|| command_output("git", &["rev-parse", "--short", "HEAD"]))
        .unwrap_or_else(|| env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "unknown".to_string()));
    set_env("REPO_VERSION", &version);

    set_env("BUILD_TIMESTAMP", &chrono::Utc::now().to_rfc3339());

    let rustc = command_output("rustc", &["--version"]).unwrap_or_else(|| "unknown".to_string());
    set_env("RUST_VERSION", &rustc);

    if let Ok(target) = env::var("TARGET") {
        set_env("BUILD_TARGET", &target);
    }
}
