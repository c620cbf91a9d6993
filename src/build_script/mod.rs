//! Rewrites of travis-build generated `build.sh` scripts.
//!
//! travis-build scripts are not always reproducible when replayed outside
//! Travis. These patches remove the parts that depend on Travis' own
//! environment.

mod checkout;
mod maven_tls;

pub use checkout::rewrite_checkout;
pub use maven_tls::{patch_maven_tls, UnflaggedMavenLine};
