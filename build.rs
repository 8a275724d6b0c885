use std::process::Command;

/// Run `git` in the crate root. `None` when git is missing or the command
/// fails, as in a crates.io tarball build.
fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn main() {
    // The embedded hash must follow the checked-out commit.
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/");

    let hash = git(&["rev-parse", "--short", "HEAD"]).unwrap_or_default();
    let on_tag = git(&["describe", "--exact-match", "--tags", "HEAD"]).is_some();

    println!("cargo:rustc-env=BANNER_CARBON_GIT_HASH={hash}");
    println!("cargo:rustc-env=BANNER_CARBON_ON_RELEASE_TAG={on_tag}");
}
