use crate::timecode::format_duration;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::time::{Duration, Instant};

const PROGRESS_KEY: &str = "out_time_ms=";

/// One `out_time_ms=` line of ffmpeg's `-progress` output. Despite the key
/// name ffmpeg reports microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSample {
    pub out_time_us: u64,
}

/// Returns a sample for `out_time_ms=<integer>` lines and `None` for every
/// other key, including `out_time_ms=N/A`.
pub fn parse_progress_line(line: &str) -> Option<ProgressSample> {
    let value = line.trim().strip_prefix(PROGRESS_KEY)?;
    let out_time_us = value.trim().parse().ok()?;
    Some(ProgressSample { out_time_us })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Share of the output written so far, within `0..=100`.
    pub percent: f64,
    /// `None` until there is enough progress to extrapolate from.
    pub eta: Option<Duration>,
}

impl Projection {
    pub fn message(&self) -> String {
        let eta = self
            .eta
            .map(format_duration)
            .unwrap_or_else(|| "--:--:--".to_string());
        format!("Progress: {:.3}%    Time left: {eta}", self.percent)
    }
}

/// Extrapolates the remaining wall-clock time from the encoded share so far.
pub fn project(elapsed_us: u64, total_us: u64, wall_elapsed: Duration) -> Projection {
    if total_us == 0 {
        return Projection {
            percent: 0.0,
            eta: None,
        };
    }
    let fraction = elapsed_us as f64 / total_us as f64;
    let percent = (fraction * 100.0).clamp(0.0, 100.0);
    if fraction <= 0.0 {
        return Projection { percent, eta: None };
    }
    let remaining = wall_elapsed.as_secs_f64() * (1.0 / fraction - 1.0);
    let eta = Duration::try_from_secs_f64(remaining.max(0.0)).ok();
    Projection { percent, eta }
}

/// Projects samples against a fixed total and the moment encoding started.
#[derive(Debug, Clone, Copy)]
pub struct Projector {
    total_us: u64,
    started: Instant,
}

impl Projector {
    pub fn new(total_us: u64, started: Instant) -> Self {
        Self { total_us, started }
    }

    pub fn observe(&self, sample: ProgressSample) -> Projection {
        project(sample.out_time_us, self.total_us, self.started.elapsed())
    }
}

/// Single-line progress display; hidden when stdout is not a terminal.
pub struct ProgressDisplay {
    bar: ProgressBar,
}

impl ProgressDisplay {
    pub fn new(total_us: u64) -> Self {
        let bar = if std::io::stdout().is_terminal() {
            ProgressBar::new(total_us)
        } else {
            ProgressBar::hidden()
        };
        bar.set_style(
            ProgressStyle::with_template("[{elapsed_precise}] [{bar:30.cyan/blue}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        bar.set_message(project(0, total_us, Duration::ZERO).message());
        Self { bar }
    }

    pub fn update(&self, sample: ProgressSample, projection: &Projection) {
        let position = self
            .bar
            .length()
            .map_or(sample.out_time_us, |len| sample.out_time_us.min(len));
        self.bar.set_position(position);
        self.bar.set_message(projection.message());
    }

    pub fn finish(&self) {
        self.bar.finish();
    }

    pub fn abandon(&self) {
        self.bar.abandon();
    }
}
