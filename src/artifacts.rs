use crate::book::{BookState, ChapterEntry};
use crate::timecode::{from_sexagesimal, to_chapter_id, to_sexagesimal};
use anyhow::{Context, Result};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

pub const METADATA_HEADER: &str = ";FFMETADATA";
pub const METADATA_FILE: &str = "metadata.txt";
pub const FILE_LIST_FILE: &str = "filelist.txt";

pub fn render_metadata(book: &BookState) -> String {
    let mut lines = Vec::with_capacity(2 + book.chapters().len() * 2);
    lines.push(METADATA_HEADER.to_string());
    lines.push(format!("title={}", escape_metadata_value(book.title())));
    for chapter in book.chapters() {
        let id = to_chapter_id(chapter.id);
        lines.push(format!("CHAPTER{id}={}", to_sexagesimal(chapter.start_secs)));
        lines.push(format!("CHAPTER{id}NAME={}", escape_metadata_value(&chapter.title)));
    }
    lines.join("\n")
}

pub fn render_file_list(book: &BookState) -> String {
    book.input_files()
        .iter()
        .map(|path| format!("file '{}'", escape_path(path)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Quotes are closed, backslash-escaped and reopened: `'` becomes `'\''`.
pub fn escape_path(path: &Path) -> String {
    path.to_string_lossy().replace('\'', "'\\''")
}

/// Escapes the characters ffmpeg treats specially in metadata values.
fn escape_metadata_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '=' | ';' | '#' | '\\' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            '\n' => escaped.push_str("\\\n"),
            '\r' => {}
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn unescape_metadata_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(ch);
        }
    }
    out
}

/// Recovers the ordered paths of a concat file list.
///
/// Follows ffmpeg's token rules: inside single quotes everything is literal,
/// outside them a backslash escapes the next character.
pub fn parse_file_list(text: &str) -> Vec<PathBuf> {
    text.lines()
        .filter_map(|line| line.trim_start().strip_prefix("file "))
        .map(|token| PathBuf::from(unquote_token(token.trim())))
        .collect()
}

fn unquote_token(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    let mut quoted = false;
    let mut chars = token.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\'' => quoted = !quoted,
            '\\' if !quoted => {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            _ => out.push(ch),
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedMetadata {
    pub title: Option<String>,
    pub chapters: Vec<ChapterEntry>,
}

/// Parses a chapter metadata file, including one the user edited by hand.
pub fn parse_metadata(text: &str) -> Result<ParsedMetadata> {
    let mut lines = text.lines();
    let header = lines.next().unwrap_or_default().trim();
    if !header.starts_with(METADATA_HEADER) {
        anyhow::bail!("missing {METADATA_HEADER} header");
    }
    let chapter_re = Regex::new(r"^CHAPTER(\d+)(NAME)?=(.*)$").context("compile chapter regex")?;

    let mut title = None;
    let mut chapters: Vec<ChapterEntry> = Vec::new();
    for (index, line) in lines.enumerate() {
        let line_no = index + 2;
        if line.trim().is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }
        if let Some(value) = line.strip_prefix("title=") {
            title = Some(unescape_metadata_value(value));
            continue;
        }
        let caps = chapter_re
            .captures(line)
            .with_context(|| format!("line {line_no}: unexpected '{line}'"))?;
        let id: usize = caps[1]
            .parse()
            .with_context(|| format!("line {line_no}: bad chapter id"))?;
        let value = &caps[3];
        let position = match chapters.iter().position(|chapter| chapter.id == id) {
            Some(position) => position,
            None => {
                chapters.push(ChapterEntry {
                    id,
                    start_secs: 0.0,
                    title: String::new(),
                });
                chapters.len() - 1
            }
        };
        let chapter = &mut chapters[position];
        if caps.get(2).is_some() {
            chapter.title = unescape_metadata_value(value);
        } else {
            chapter.start_secs = from_sexagesimal(value)
                .with_context(|| format!("line {line_no}: bad timestamp '{value}'"))?;
        }
    }
    Ok(ParsedMetadata { title, chapters })
}

/// The metadata and file-list files written into the book directory.
///
/// Dropping the guard removes both files; call [`Artifacts::remove`] to see
/// deletion errors or [`Artifacts::keep`] to leave them on disk.
#[derive(Debug)]
pub struct Artifacts {
    metadata_path: PathBuf,
    file_list_path: PathBuf,
    armed: bool,
}

impl Artifacts {
    pub fn write(dir: &Path, book: &BookState) -> Result<Self> {
        let artifacts = Self {
            metadata_path: dir.join(METADATA_FILE),
            file_list_path: dir.join(FILE_LIST_FILE),
            armed: true,
        };
        fs::write(&artifacts.metadata_path, render_metadata(book)).with_context(|| {
            format!("write metadata {}", artifacts.metadata_path.display())
        })?;
        fs::write(&artifacts.file_list_path, render_file_list(book)).with_context(|| {
            format!("write file list {}", artifacts.file_list_path.display())
        })?;
        tracing::debug!(
            metadata = %artifacts.metadata_path.display(),
            file_list = %artifacts.file_list_path.display(),
            "artifacts written"
        );
        Ok(artifacts)
    }

    pub fn metadata_path(&self) -> &Path {
        &self.metadata_path
    }

    pub fn file_list_path(&self) -> &Path {
        &self.file_list_path
    }

    pub fn read_metadata(&self) -> Result<ParsedMetadata> {
        let text = fs::read_to_string(&self.metadata_path)
            .with_context(|| format!("read metadata {}", self.metadata_path.display()))?;
        parse_metadata(&text)
            .with_context(|| format!("parse metadata {}", self.metadata_path.display()))
    }

    pub fn remove(mut self) -> Result<()> {
        self.armed = false;
        for path in [&self.metadata_path, &self.file_list_path] {
            fs::remove_file(path).with_context(|| format!("remove {}", path.display()))?;
        }
        Ok(())
    }

    pub fn keep(mut self) {
        self.armed = false;
        tracing::info!(
            metadata = %self.metadata_path.display(),
            file_list = %self.file_list_path.display(),
            "keeping artifacts for inspection"
        );
    }
}

impl Drop for Artifacts {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        for path in [&self.metadata_path, &self.file_list_path] {
            if let Err(err) = fs::remove_file(path) {
                tracing::warn!(path = %path.display(), error = %err, "failed to remove artifact");
            }
        }
    }
}
