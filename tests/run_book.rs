use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::tempdir;

fn ctfb(book_dir: &Path, config: &Path) -> Result<Output> {
    Ok(Command::new(env!("CARGO_BIN_EXE_ctfb"))
        .arg("-d")
        .arg(book_dir)
        .arg("--config")
        .arg(config)
        .env_remove("RUST_LOG")
        .output()?)
}

fn write_config(dir: &Path, ffmpeg: &Path, ffprobe: &Path) -> Result<PathBuf> {
    let path = dir.join("ctfb.yaml");
    fs::write(
        &path,
        format!(
            "ffmpeg: '{}'\nffprobe: '{}'\n",
            ffmpeg.display(),
            ffprobe.display()
        ),
    )?;
    Ok(path)
}

#[test]
fn empty_directory_exits_cleanly_without_artifacts() -> Result<()> {
    let book = tempdir()?;
    let home = tempdir()?;
    let config = write_config(
        home.path(),
        Path::new("/nonexistent/ffmpeg"),
        Path::new("/nonexistent/ffprobe"),
    )?;

    let output = ctfb(book.path(), &config)?;
    assert!(output.status.success(), "status {}", output.status);
    assert_eq!(String::from_utf8(output.stdout)?.trim(), "No files found.");
    assert!(!book.path().join("metadata.txt").exists());
    assert!(!book.path().join("filelist.txt").exists());
    Ok(())
}

#[cfg(unix)]
mod tool_checks {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    /// A stand-in tool that only leaves a marker file behind when run.
    fn marking_tool(dir: &Path, name: &str) -> Result<(PathBuf, PathBuf)> {
        let marker = dir.join(format!("{name}.ran"));
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\ntouch '{}'\nexit 1\n", marker.display()))?;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
        Ok((path, marker))
    }

    #[test]
    fn missing_ffmpeg_fails_before_any_file_is_probed() -> Result<()> {
        let book = tempdir()?;
        let home = tempdir()?;
        fs::write(book.path().join("a.opus"), b"")?;
        let (ffprobe, ran) = marking_tool(home.path(), "ffprobe")?;
        let config = write_config(home.path(), Path::new("/nonexistent/ffmpeg"), &ffprobe)?;

        let output = ctfb(book.path(), &config)?;
        assert_eq!(output.status.code(), Some(1));
        let stderr = String::from_utf8(output.stderr)?;
        assert!(stderr.contains("`/nonexistent/ffmpeg` not found in PATH"), "{stderr}");
        assert!(!String::from_utf8(output.stdout)?.contains("input files found"));
        assert!(!ran.exists(), "ffprobe ran before the tool check");
        assert!(!book.path().join("metadata.txt").exists());
        Ok(())
    }

    #[test]
    fn missing_ffprobe_is_reported_as_missing_tool() -> Result<()> {
        let book = tempdir()?;
        let home = tempdir()?;
        fs::write(book.path().join("a.opus"), b"")?;
        let (ffmpeg, ran) = marking_tool(home.path(), "ffmpeg")?;
        let config = write_config(home.path(), &ffmpeg, Path::new("/nonexistent/ffprobe"))?;

        let output = ctfb(book.path(), &config)?;
        assert_eq!(output.status.code(), Some(1));
        let stderr = String::from_utf8(output.stderr)?;
        assert!(stderr.contains("`/nonexistent/ffprobe` not found in PATH"), "{stderr}");
        assert!(!ran.exists());
        Ok(())
    }
}
