mod styling;
mod summary;
mod tables;

pub use styling::{bright_green, dim, magenta_bold};
pub use summary::print_progress;

/// Prints the buildmine banner to stderr.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("⛏ buildmine"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("Travis job mining and build script patching")
    );
}
