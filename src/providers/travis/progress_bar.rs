use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Progress indication for the two download phases of a job fetch
pub struct PhaseProgress {
    pb: ProgressBar,
}

impl PhaseProgress {
    /// Start the spinner shown while the build list is paged through
    pub fn start_listing(repo: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_draw_target(ProgressDrawTarget::stderr());
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!("Phase 1/2: Listing builds for {repo}..."));
        pb.enable_steady_tick(Duration::from_millis(100));

        Self { pb }
    }

    /// Finish the listing spinner
    pub fn finish_listing(self, build_count: usize) {
        self.pb
            .finish_with_message(format!("✓ Phase 1/2: Listed {build_count} builds"));
    }

    /// Start the bar shown while build details are downloaded
    pub fn start_details(build_count: usize) -> Self {
        let pb = ProgressBar::new(build_count as u64);
        pb.set_draw_target(ProgressDrawTarget::stderr());
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} {msg} [{bar:30.cyan/blue}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        pb.set_message("Phase 2/2: Downloading build info");

        Self { pb }
    }

    pub fn inc(&self) {
        self.pb.inc(1);
    }

    /// Finish the detail bar
    pub fn finish_details(self) {
        self.pb
            .finish_with_message("✓ Phase 2/2: Downloaded build info");
    }

    /// Clears the bar without a completion message, used when a phase fails
    pub fn abandon(self) {
        self.pb.abandon();
    }
}
