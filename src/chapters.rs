use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Secondary extension of sidecar chapter files, appended to the input's stem.
pub const SIDECAR_EXTENSION: &str = "info.json";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChapterSource {
    #[default]
    Embedded,
    Sidecar,
}

/// A chapter marker relative to the start of its own file.
///
/// A `None` title means the assembler substitutes the chapter's global id.
#[derive(Debug, Clone, PartialEq)]
pub struct FileChapter {
    pub offset_secs: f64,
    pub title: Option<String>,
}

impl FileChapter {
    pub fn new(offset_secs: f64, title: Option<String>) -> Self {
        Self { offset_secs, title }
    }
}

#[derive(Debug, Deserialize)]
struct SidecarInfo {
    #[serde(default)]
    chapters: Option<Vec<SidecarChapter>>,
}

#[derive(Debug, Deserialize)]
struct SidecarChapter {
    start_time: f64,
    #[serde(default)]
    title: Option<String>,
}

pub fn sidecar_path_for_input(input: &Path) -> Option<PathBuf> {
    let stem = input.file_stem()?.to_string_lossy();
    Some(input.with_file_name(format!("{stem}.{SIDECAR_EXTENSION}")))
}

/// Reads sidecar chapters for `input`. Any failure yields an empty list.
pub fn read_sidecar_chapters(input: &Path) -> Vec<FileChapter> {
    let Some(path) = sidecar_path_for_input(input) else {
        return Vec::new();
    };
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no sidecar chapters");
        return Vec::new();
    }
    match load_sidecar(&path) {
        Ok(chapters) => chapters,
        Err(err) => {
            tracing::debug!(
                path = %path.display(),
                error = %err,
                "ignoring unreadable sidecar"
            );
            Vec::new()
        }
    }
}

fn load_sidecar(path: &Path) -> anyhow::Result<Vec<FileChapter>> {
    let contents = fs::read_to_string(path)?;
    let info: SidecarInfo = serde_json::from_str(&contents)?;
    Ok(info
        .chapters
        .unwrap_or_default()
        .into_iter()
        .map(|chapter| FileChapter::new(chapter.start_time, chapter.title))
        .collect())
}

/// Resolves the chapter list for one input file.
///
/// `embedded` is what the probe reported and is only consulted in
/// [`ChapterSource::Embedded`] mode.
pub fn extract(input: &Path, source: ChapterSource, embedded: Vec<FileChapter>) -> Vec<FileChapter> {
    let raw = match source {
        ChapterSource::Embedded => embedded,
        ChapterSource::Sidecar => read_sidecar_chapters(input),
    };
    normalize(input, raw)
}

fn normalize(input: &Path, raw: Vec<FileChapter>) -> Vec<FileChapter> {
    let mut chapters: Vec<FileChapter> = raw
        .into_iter()
        .map(|chapter| FileChapter {
            offset_secs: if chapter.offset_secs.is_finite() {
                chapter.offset_secs.max(0.0)
            } else {
                0.0
            },
            title: chapter
                .title
                .map(|title| title.trim().to_string())
                .filter(|title| !title.is_empty()),
        })
        .collect();
    chapters.sort_by(|a, b| a.offset_secs.total_cmp(&b.offset_secs));

    if chapters.is_empty() {
        chapters.push(FileChapter::new(0.0, Some(chapter_name(input))));
    }
    chapters
}

/// File name with its last extension stripped.
pub fn chapter_name(input: &Path) -> String {
    input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn sidecar_sits_next_to_input() {
        let path = sidecar_path_for_input(Path::new("/books/ch 1.opus")).expect("path");
        assert_eq!(path, PathBuf::from("/books/ch 1.info.json"));
    }

    #[test]
    fn empty_embedded_list_synthesizes_whole_file_chapter() {
        let chapters = extract(Path::new("dir/part.one.opus"), ChapterSource::Embedded, vec![]);
        assert_eq!(
            chapters,
            vec![FileChapter::new(0.0, Some("part.one".to_string()))]
        );
    }

    #[test]
    fn embedded_chapters_are_sorted_and_blank_titles_dropped() {
        let chapters = extract(
            Path::new("a.opus"),
            ChapterSource::Embedded,
            vec![
                FileChapter::new(30.0, Some("Later".to_string())),
                FileChapter::new(0.0, Some("   ".to_string())),
                FileChapter::new(-1.0, None),
            ],
        );
        assert_eq!(
            chapters,
            vec![
                FileChapter::new(0.0, None),
                FileChapter::new(0.0, None),
                FileChapter::new(30.0, Some("Later".to_string())),
            ]
        );
    }

    #[test]
    fn sidecar_mode_ignores_embedded_chapters() -> Result<()> {
        let dir = tempdir()?;
        let input = dir.path().join("track.opus");
        fs::write(&input, b"")?;
        fs::write(
            dir.path().join("track.info.json"),
            r#"{"title": "x", "chapters": [
                {"start_time": 0.0, "end_time": 5.0, "title": "Intro"},
                {"start_time": 5.0, "end_time": 9.0}
            ]}"#,
        )?;
        let chapters = extract(
            &input,
            ChapterSource::Sidecar,
            vec![FileChapter::new(1.0, Some("embedded".to_string()))],
        );
        assert_eq!(
            chapters,
            vec![
                FileChapter::new(0.0, Some("Intro".to_string())),
                FileChapter::new(5.0, None),
            ]
        );
        Ok(())
    }

    #[test]
    fn malformed_sidecar_falls_back_to_file_name() -> Result<()> {
        let dir = tempdir()?;
        let input = dir.path().join("broken.opus");
        fs::write(dir.path().join("broken.info.json"), "{ not json")?;
        let chapters = extract(&input, ChapterSource::Sidecar, vec![]);
        assert_eq!(chapters, vec![FileChapter::new(0.0, Some("broken".to_string()))]);
        Ok(())
    }

    #[test]
    fn missing_sidecar_or_chapter_key_falls_back_to_file_name() -> Result<()> {
        let dir = tempdir()?;
        let missing = dir.path().join("missing.opus");
        assert_eq!(
            extract(&missing, ChapterSource::Sidecar, vec![]),
            vec![FileChapter::new(0.0, Some("missing".to_string()))]
        );

        let null_chapters = dir.path().join("video.opus");
        fs::write(dir.path().join("video.info.json"), r#"{"chapters": null}"#)?;
        assert_eq!(
            extract(&null_chapters, ChapterSource::Sidecar, vec![]),
            vec![FileChapter::new(0.0, Some("video".to_string()))]
        );
        Ok(())
    }
}
