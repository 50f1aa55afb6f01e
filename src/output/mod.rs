mod pdf;
mod progress;
mod styling;
mod summary;
mod tables;

pub use pdf::{render_report, ReportAssets, ReportContent, ReportHeader};
pub use progress::PhaseProgress;
pub use styling::notice;
pub use summary::print_summary;

use styling::{banner, label};

/// Prints the deploy-report banner to stderr.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        banner("📄 deploy-report"),
        label(env!("CARGO_PKG_VERSION")),
        label("GitLab deployment reports")
    );
}
