//! Build script for usedsize-core
//!
//! Checks build requirements before compilation:
//! - Minimum Rust version (`u64::div_ceil` needs Rust 1.73.0)
//! - Platform support: the live-process backend is Linux only
//!
//! ## Requirements
//!
//! - **Rust**: 1.73.0 or newer
//! - **Linux**: `/proc/<pid>/mem` and `/proc/<pid>/maps` (any 2.6+ kernel)
//! - **Other platforms**: snapshot inspection only

fn main()
{
    // Check minimum Rust version
    match (rustc_version::version(), rustc_version::Version::parse("1.73.0")) {
        (Ok(found), Ok(minimum)) => {
            if found < minimum {
                panic!("usedsize-core requires Rust {minimum} or newer, found {found}");
            }
        }
        // If we can't get version (e.g., in some build environments), just warn
        _ => println!("cargo:warning=could not verify Rust version"),
    }

    let target_os = std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    if target_os != "linux" {
        println!("cargo:warning=usedsize-core: no live-process backend for {target_os}; only snapshots are available");
    }
}
