use crate::chapters::FileChapter;
use crate::error::BookError;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug, Clone, PartialEq)]
pub struct ProbedMedia {
    pub duration_secs: f64,
    /// Chapters embedded in the container, in the order the probe reported them.
    pub chapters: Vec<FileChapter>,
}

/// Reads duration and embedded chapters of a media file.
pub trait MediaProbe {
    fn probe(&self, path: &Path) -> Result<ProbedMedia, BookError>;
}

#[derive(Debug, Clone)]
pub struct Ffprobe {
    binary: PathBuf,
}

impl Ffprobe {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for Ffprobe {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

impl MediaProbe for Ffprobe {
    fn probe(&self, path: &Path) -> Result<ProbedMedia, BookError> {
        let output = Command::new(&self.binary)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-show_chapters",
                "-of",
                "json",
            ])
            .arg(path)
            .output()
            .map_err(|err| {
                BookError::probe(path, format!("run {}: {err}", self.binary.display()))
            })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BookError::probe(
                path,
                format!("ffprobe exited with {}: {}", output.status, stderr.trim()),
            ));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        let media = parse_ffprobe_json(path, &stdout)?;
        tracing::debug!(
            path = %path.display(),
            duration = media.duration_secs,
            chapters = media.chapters.len(),
            "probed file"
        );
        Ok(media)
    }
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    chapters: Vec<FfprobeChapter>,
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeChapter {
    start_time: String,
    #[serde(default)]
    tags: HashMap<String, String>,
}

/// Decodes `ffprobe -of json` output. A missing or unparseable duration fails
/// the probe; a chapter with an unparseable start does too, since dropping it
/// would shift every later chapter title.
pub fn parse_ffprobe_json(path: &Path, json: &str) -> Result<ProbedMedia, BookError> {
    let parsed: FfprobeOutput = serde_json::from_str(json)
        .map_err(|err| BookError::probe(path, format!("decode ffprobe output: {err}")))?;

    let duration_text = parsed
        .format
        .and_then(|format| format.duration)
        .ok_or_else(|| BookError::probe(path, "ffprobe reported no duration"))?;
    let duration_secs = parse_seconds(&duration_text)
        .ok_or_else(|| BookError::probe(path, format!("bad duration '{duration_text}'")))?;

    let mut chapters = Vec::with_capacity(parsed.chapters.len());
    for chapter in parsed.chapters {
        let offset_secs = parse_seconds(&chapter.start_time).ok_or_else(|| {
            BookError::probe(path, format!("bad chapter start '{}'", chapter.start_time))
        })?;
        let title = chapter
            .tags
            .into_iter()
            .find(|(key, _)| key.eq_ignore_ascii_case("title"))
            .map(|(_, value)| value);
        chapters.push(FileChapter::new(offset_secs, title));
    }

    Ok(ProbedMedia {
        duration_secs,
        chapters,
    })
}

fn parse_seconds(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value >= 0.0)
}
