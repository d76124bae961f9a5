/// Build script for irqlab
/// Embeds version and source revision for `irqlab version`

fn main() {
    println!("cargo:rerun-if-changed=Cargo.toml");

    if let Ok(version) = std::env::var("CARGO_PKG_VERSION") {
        println!("cargo:rustc-env=IRQLAB_VERSION={version}");
    }

    // Capture git hash when building from a checkout
    let hash = std::process::Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|hash| hash.trim().to_string())
        .unwrap_or_default();
    println!("cargo:rustc-env=IRQLAB_GIT_HASH={hash}");
}
