//! Command: print version information.

/// Build version: `SHOP_BUILD_VERSION` at compile time, else the crate version.
#[must_use]
pub fn version() -> &'static str {
    option_env!("SHOP_BUILD_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Print the version to stdout.
pub fn run() {
    println!("shop-build {}", version());
}
