use std::process::Command;

fn main() {
    let cargo_version = env!("CARGO_PKG_VERSION");

    // Git commit hash, when building from a checkout
    let git_hash = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let version = match git_hash {
        Some(hash) => format!("{} ({})", cargo_version, hash),
        None => cargo_version.to_string(),
    };

    println!("cargo:rustc-env=LEAFLINK_VERSION={}", version);
    println!("cargo:rerun-if-changed=.git/HEAD");
}
