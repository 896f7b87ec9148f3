use anyhow::{Context, Result};
use ctfb::artifacts::Artifacts;
use ctfb::book::{self, ScanRequest};
use ctfb::chapters::ChapterSource;
use ctfb::combine::{self, CombineRequest};
use ctfb::probe::{Ffprobe, MediaProbe};
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

fn sine_tone(path: &Path, seconds: u32) -> Result<()> {
    let status = Command::new("ffmpeg")
        .args(["-y", "-loglevel", "error", "-f", "lavfi", "-i"])
        .arg(format!("sine=frequency=440:duration={seconds}"))
        .args(["-c:a", "libopus"])
        .arg(path)
        .status()
        .context("spawn ffmpeg")?;
    anyhow::ensure!(status.success(), "ffmpeg failed with status {status}");
    Ok(())
}

#[test]
#[ignore = "requires ffmpeg and ffprobe"]
fn e2e_combine_two_files_with_chapters() -> Result<()> {
    let dir = tempdir()?;
    sine_tone(&dir.path().join("01 first.opus"), 2)?;
    sine_tone(&dir.path().join("02 it's second.opus"), 3)?;
    fs::write(
        dir.path().join("02 it's second.info.json"),
        r#"{"chapters": [{"start_time": 0.0, "title": "Start"}, {"start_time": 1.5, "title": "Middle"}]}"#,
    )?;

    let output = dir.path().join("Book.opus");
    let request = ScanRequest {
        dir: dir.path().to_path_buf(),
        title: "Book".to_string(),
        patterns: vec!["*.opus".to_string()],
        source: ChapterSource::Sidecar,
        exclude: Some(output.clone()),
    };
    let probe = Ffprobe::default();
    let book = book::scan(&request, &probe)?;
    assert_eq!(book.input_files().len(), 2);
    assert_eq!(book.chapters().len(), 3);

    let artifacts = Artifacts::write(dir.path(), &book)?;
    combine::combine(
        &CombineRequest {
            ffmpeg: combine::ensure_tool(Path::new("ffmpeg"))?,
            file_list: artifacts.file_list_path().to_path_buf(),
            metadata: artifacts.metadata_path().to_path_buf(),
            bitrate: Some("32k".to_string()),
            output: output.clone(),
        },
        book.total_micros(),
    )?;
    artifacts.remove()?;

    let combined = probe.probe(&output)?;
    assert_eq!(combined.chapters.len(), 3);
    assert!((combined.duration_secs - book.total_duration_secs()).abs() < 0.5);
    Ok(())
}
