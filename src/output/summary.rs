use std::fmt::Write;

use comfy_table::Cell;

use crate::providers::travis::MiningProgress;

use super::styling::{bright, cyan, dim};
use super::tables::{color_coded_failure_cell, create_cyan_header, create_table};

/// Prints the mining progress of a repository to stderr.
///
/// Stdout is left for the JSON report so it can be piped.
pub fn print_progress(repo: &str, progress: &MiningProgress) {
    eprintln!("{}", render_progress(repo, progress));
}

fn render_progress(repo: &str, progress: &MiningProgress) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "{} {}", bright("📊"), bright("Mining progress").underlined());
    let _ = writeln!(output, "  {} {}\n", dim("Repository:"), cyan(repo));

    let mut table = create_table();
    table.set_header(create_cyan_header(&["", "Total", "Failed (push)", "Failed (PR)"]));
    table.add_row(vec![
        Cell::new("Builds"),
        Cell::new(progress.builds),
        color_coded_failure_cell(progress.failed_builds, progress.builds),
        color_coded_failure_cell(progress.failed_pr_builds, progress.builds),
    ]);
    table.add_row(vec![
        Cell::new("Jobs"),
        Cell::new(progress.jobs),
        color_coded_failure_cell(progress.failed_jobs, progress.jobs),
        color_coded_failure_cell(progress.failed_pr_jobs, progress.jobs),
    ]);

    let _ = writeln!(output, "{table}");
    output
}
