use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::styling::{failure, heading, notice, success};

const PHASES: [(&str, &str); 4] = [
    ("Fetching latest pipeline", "Fetched latest pipeline"),
    ("Fetching pipeline jobs", "Fetched pipeline jobs"),
    ("Fetching job log", "Fetched job log"),
    ("Rendering report", "Report rendered"),
];

/// Spinner per phase of a report run, drawn on stderr.
pub struct PhaseProgress {
    pb: ProgressBar,
    phase: usize,
    visible: bool,
}

impl PhaseProgress {
    pub fn start(visible: bool) -> Self {
        if visible {
            eprintln!("{}", heading("⚙️", "Phases"));
        }
        Self {
            pb: create_spinner(phase_message(0, false), visible),
            phase: 0,
            visible,
        }
    }

    /// Marks the current phase done and starts the next one.
    pub fn advance(self) -> Self {
        self.pb.finish_with_message(phase_message(self.phase, true));
        let phase = self.phase + 1;
        Self {
            pb: create_spinner(phase_message(phase, false), self.visible),
            phase,
            visible: self.visible,
        }
    }

    pub fn finish(self) {
        self.pb.finish_with_message(phase_message(self.phase, true));
        if self.visible {
            eprintln!();
        }
    }

    /// Stops the spinner and leaves `reason` in place of the phase message.
    pub fn abandon(self, reason: &str) {
        let (label, _) = PHASES[self.phase.min(PHASES.len() - 1)];
        self.pb.abandon_with_message(
            failure(format!(
                "Phase {}/{}: {label} ✗ {reason}",
                self.phase + 1,
                PHASES.len()
            ))
            .to_string(),
        );
        if self.visible {
            eprintln!();
        }
    }
}

fn phase_message(phase: usize, done: bool) -> String {
    let (running, finished) = PHASES[phase.min(PHASES.len() - 1)];
    let number = format!("Phase {}/{}", phase + 1, PHASES.len());
    if done {
        success(format!("{number}: {finished} ✓")).to_string()
    } else {
        notice(format!("{number}: {running}")).to_string()
    }
}

fn create_spinner(message: String, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("  {msg} {spinner}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
