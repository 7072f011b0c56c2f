use anyhow::{Context, Result};

fn main() -> Result<()> {
    println!("cargo:rerun-if-env-changed=CARGO_PKG_VERSION");
    let version = std::env::var("CARGO_PKG_VERSION").context("CARGO_PKG_VERSION is not set")?;
    let rustc = rustc_version::version().context("failed to query rustc version")?;

    for (key, value) in [
        ("EVADMIN_VERSION", version),
        ("EVADMIN_RUSTC_VERSION", rustc.to_string()),
    ] {
        println!("cargo:rustc-env={key}={value}");
    }
    Ok(())
}
