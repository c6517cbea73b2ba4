use std::env;
use std::process::Command;

// Release builds pass the commit in through the environment; local builds ask git.
const SHA_ENVS: [&str; 2] = ["SHEETLIFT_GIT_SHA", "GITHUB_SHA"];

fn main() {
    for name in SHA_ENVS {
        println!("cargo:rerun-if-env-changed={name}");
    }

    let version = env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "0.0.0".to_string());
    let sha = SHA_ENVS
        .iter()
        .find_map(|name| env::var(name).ok().and_then(short_sha))
        .or_else(git_sha);

    match sha {
        Some(sha) => println!("cargo:rustc-env=SHEETLIFT_VERSION={version} ({sha})"),
        None => println!("cargo:rustc-env=SHEETLIFT_VERSION={version}"),
    }
}

fn short_sha(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.chars().take(7).collect())
    }
}

fn git_sha() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    short_sha(String::from_utf8_lossy(&output.stdout).to_string())
}
