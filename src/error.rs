use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BookError {
    /// Nothing in the book directory matched. Callers report this and exit cleanly.
    #[error("no files in {} match {patterns}", .dir.display())]
    NoInputFiles { dir: PathBuf, patterns: String },

    #[error("probe {}: {detail}", .path.display())]
    Probe { path: PathBuf, detail: String },

    #[error("invalid pattern '{pattern}'")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("read directory {}", .dir.display())]
    ReadDir {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("ffmpeg failed with status {status}{}", format_stderr(.stderr))]
    Combine { status: ExitStatus, stderr: String },
}

impl BookError {
    pub fn probe(path: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        BookError::Probe {
            path: path.into(),
            detail: detail.into(),
        }
    }
}

fn format_stderr(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(":\n{trimmed}")
    }
}
