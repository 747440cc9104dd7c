//! Stamps the binary with `TOKENWARD_VERSION`.
//!
//! Taken from `git describe` in a checkout, else the package version.

use std::process::Command;

fn main() {
    for watched in [".git/HEAD", ".git/refs/"] {
        println!("cargo:rerun-if-changed={watched}");
    }

    let version = describe().unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_owned());
    println!("cargo:rustc-env=TOKENWARD_VERSION={version}");
}

fn describe() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        .ok()
        .filter(|out| out.status.success())?;

    let described = String::from_utf8(output.stdout).ok()?;
    let described = described.trim().trim_start_matches('v');
    (!described.is_empty()).then(|| described.to_owned())
}
