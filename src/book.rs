use crate::chapters::{self, ChapterSource, FileChapter};
use crate::error::BookError;
use crate::probe::MediaProbe;
use crate::timecode::to_chapter_id;
use glob::{MatchOptions, Pattern};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// A chapter marker on the book's global timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterEntry {
    pub id: usize,
    pub start_secs: f64,
    pub title: String,
}

/// Everything gathered while scanning the book directory.
#[derive(Debug, Clone, Default)]
pub struct BookState {
    title: String,
    input_files: Vec<PathBuf>,
    total_duration_secs: f64,
    chapters: Vec<ChapterEntry>,
}

impl BookState {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Appends one input file: its chapters are placed at the current running
    /// total, then the file's duration is added to it. Offsets are clamped to
    /// the file's own span so a later file never starts before an earlier one.
    pub fn push_file(&mut self, path: PathBuf, duration_secs: f64, chapters: Vec<FileChapter>) {
        let span = duration_secs.max(0.0);
        for chapter in chapters {
            let id = self.chapters.len();
            let offset_secs = chapter.offset_secs.clamp(0.0, span);
            if offset_secs != chapter.offset_secs {
                tracing::warn!(
                    path = %path.display(),
                    offset = chapter.offset_secs,
                    duration = duration_secs,
                    "chapter offset outside file, clamped"
                );
            }
            let title = chapter.title.unwrap_or_else(|| to_chapter_id(id));
            self.chapters.push(ChapterEntry {
                id,
                start_secs: self.total_duration_secs + offset_secs,
                title,
            });
        }
        self.total_duration_secs += span;
        self.input_files.push(path);
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn input_files(&self) -> &[PathBuf] {
        &self.input_files
    }

    pub fn chapters(&self) -> &[ChapterEntry] {
        &self.chapters
    }

    pub fn total_duration_secs(&self) -> f64 {
        self.total_duration_secs
    }

    /// Total duration in the unit of ffmpeg's `out_time_ms` progress key.
    pub fn total_micros(&self) -> u64 {
        (self.total_duration_secs * 1e6) as u64
    }
}

/// A set of file-name globs; a name matches if any of them does.
///
/// Supports `*`, `?`, `[...]`, `[!...]` and brace alternation such as
/// `*.{mp3,ogg}`. Wildcards do not match a leading dot.
#[derive(Debug, Clone)]
pub struct NamePatterns {
    sources: Vec<String>,
    compiled: Vec<Pattern>,
}

impl NamePatterns {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, BookError> {
        let mut compiled = Vec::new();
        for pattern in patterns {
            for expanded in expand_braces(pattern.as_ref()) {
                let glob = Pattern::new(&expanded).map_err(|source| BookError::InvalidPattern {
                    pattern: pattern.as_ref().to_string(),
                    source,
                })?;
                compiled.push(glob);
            }
        }
        Ok(Self {
            sources: patterns.iter().map(|p| p.as_ref().to_string()).collect(),
            compiled,
        })
    }

    pub fn matches(&self, file_name: &str) -> bool {
        let options = MatchOptions {
            case_sensitive: true,
            require_literal_separator: true,
            require_literal_leading_dot: true,
        };
        self.compiled
            .iter()
            .any(|pattern| pattern.matches_with(file_name, options))
    }
}

impl fmt::Display for NamePatterns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sources.join(", "))
    }
}

/// Expands the first balanced `{a,b}` group and recurses on the results, so
/// nested and repeated groups are handled. Unbalanced braces stay literal.
pub fn expand_braces(pattern: &str) -> Vec<String> {
    let Some(open) = pattern.find('{') else {
        return vec![pattern.to_string()];
    };
    let mut depth = 0usize;
    let mut close = None;
    let mut commas = Vec::new();
    for (offset, ch) in pattern[open..].char_indices() {
        let index = open + offset;
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    close = Some(index);
                    break;
                }
            }
            ',' if depth == 1 => commas.push(index),
            _ => {}
        }
    }
    let Some(close) = close else {
        return vec![pattern.to_string()];
    };

    let prefix = &pattern[..open];
    let suffix = &pattern[close + 1..];
    let mut bounds = Vec::with_capacity(commas.len() + 2);
    bounds.push(open);
    bounds.extend(commas);
    bounds.push(close);

    bounds
        .windows(2)
        .flat_map(|pair| expand_braces(&format!("{prefix}{}{suffix}", &pattern[pair[0] + 1..pair[1]])))
        .collect()
}

#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub dir: PathBuf,
    pub title: String,
    pub patterns: Vec<String>,
    pub source: ChapterSource,
    /// Skipped even if it matches, so a previous output is never read back in.
    pub exclude: Option<PathBuf>,
}

/// Scans `request.dir` and assembles every matching file into a book.
pub fn scan(request: &ScanRequest, probe: &dyn MediaProbe) -> Result<BookState, BookError> {
    let files = discover(request)?;
    assemble(&request.title, files, request.source, probe)
}

/// Matching files of `request.dir`, or `NoInputFiles` when there are none.
/// Nothing is probed yet.
pub fn discover(request: &ScanRequest) -> Result<Vec<PathBuf>, BookError> {
    let patterns = NamePatterns::new(&request.patterns)?;
    let files = discover_inputs(&request.dir, &patterns, request.exclude.as_deref())?;
    if files.is_empty() {
        return Err(BookError::NoInputFiles {
            dir: request.dir.clone(),
            patterns: patterns.to_string(),
        });
    }
    tracing::info!(count = files.len(), dir = %request.dir.display(), "input files found");
    Ok(files)
}

/// Lists matching regular files in the order the directory yields them.
pub fn discover_inputs(
    dir: &Path,
    patterns: &NamePatterns,
    exclude: Option<&Path>,
) -> Result<Vec<PathBuf>, BookError> {
    let read_err = |source| BookError::ReadDir {
        dir: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        let path = entry.path();
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            tracing::debug!(path = %path.display(), "skipping non utf-8 file name");
            continue;
        };
        if !patterns.matches(&name) || !path.is_file() {
            continue;
        }
        if exclude.is_some_and(|excluded| excluded == path) {
            tracing::info!(path = %path.display(), "skipping output file");
            continue;
        }
        files.push(path);
    }
    Ok(files)
}

/// Probes each file in order and lays its chapters out after the previous ones.
/// The first probe failure aborts the whole book.
pub fn assemble(
    title: &str,
    files: Vec<PathBuf>,
    source: ChapterSource,
    probe: &dyn MediaProbe,
) -> Result<BookState, BookError> {
    let mut book = BookState::new(title);
    for path in files {
        let media = probe.probe(&path)?;
        let file_chapters = chapters::extract(&path, source, media.chapters);
        tracing::debug!(
            path = %path.display(),
            duration = media.duration_secs,
            chapters = file_chapters.len(),
            "adding file"
        );
        book.push_file(path, media.duration_secs, file_chapters);
    }
    Ok(book)
}
