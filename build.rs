// TraitScope - GPL-3.0-or-later
// Composes the string printed by `traitscope --version`

use std::env;
use std::process::Command;

/// `git describe` of the source tree, e.g. `v0.4.0-3-g1a2b3c4-dirty`
fn describe() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--always", "--dirty", "--tags"])
        .output()
        .ok()?;
    let rev = String::from_utf8(output.stdout).ok()?;
    let rev = rev.trim();
    (output.status.success() && !rev.is_empty()).then(|| rev.to_string())
}

fn main() {
    let version = env::var("CARGO_PKG_VERSION").unwrap_or_default();

    // Packaged builds have no .git and may pass the revision in instead
    let revision = env::var("TRAITSCOPE_REVISION").ok().or_else(describe);

    let full = revision.map_or_else(|| version.clone(), |rev| format!("{version} ({rev})"));
    println!("cargo:rustc-env=TRAITSCOPE_VERSION={full}");

    println!("cargo:rerun-if-env-changed=TRAITSCOPE_REVISION");
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");
}
