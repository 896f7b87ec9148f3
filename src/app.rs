use crate::artifacts::Artifacts;
use crate::book::{self, BookState, ScanRequest};
use crate::chapters::ChapterSource;
use crate::cli::Cli;
use crate::combine::{self, CombineRequest};
use crate::config::{Config, ConfigStore};
use crate::error::BookError;
use crate::logging;
use crate::probe::Ffprobe;
use crate::prompt::{self, Ask, Confirmation};
use crate::timecode::{format_duration, to_sexagesimal};
use anyhow::{Context, Result};
use clap::Parser;
use std::env;
use std::path::{Path, PathBuf};

/// Fully resolved options for one book.
#[derive(Debug, Clone, PartialEq)]
pub struct BookOptions {
    pub book_dir: PathBuf,
    pub title: String,
    pub patterns: Vec<String>,
    pub output: PathBuf,
    pub bitrate: Option<String>,
    pub chapter_source: ChapterSource,
    pub interactive: bool,
}

impl BookOptions {
    /// Merges flags, config and (in interactive mode) answers. A flag always
    /// wins; `ask` is only consulted for options the flags leave open.
    pub fn resolve(
        cli: &Cli,
        config: &Config,
        book_dir: PathBuf,
        mut ask: Option<&mut dyn Ask>,
    ) -> Result<Self> {
        let dir_name = book_dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "book".to_string());

        let title = match &cli.title {
            Some(title) => title.clone(),
            None => answer(&mut ask, "Title", &dir_name)?,
        };

        let patterns = if !cli.patterns.is_empty() {
            cli.patterns.clone()
        } else {
            let defaults = config.patterns();
            let shown = defaults.join(" ");
            let answered = answer(&mut ask, "Input pattern", &shown)?;
            if answered == shown {
                defaults
            } else {
                vec![answered]
            }
        };

        let output = match &cli.output {
            Some(output) => output.clone(),
            None => PathBuf::from(answer(&mut ask, "Output file", &format!("{dir_name}.opus"))?),
        };
        let output = if output.is_absolute() {
            output
        } else {
            book_dir.join(output)
        };

        let bitrate = match &cli.bitrate {
            Some(bitrate) => Some(bitrate.clone()),
            None => Some(answer(
                &mut ask,
                "Bitrate",
                config.bitrate.as_deref().unwrap_or_default(),
            )?),
        }
        .map(|bitrate| bitrate.trim().to_string())
        .filter(|bitrate| !bitrate.is_empty());

        let chapter_source = if cli.sidecar_chapters {
            ChapterSource::Sidecar
        } else {
            config.chapter_source
        };

        Ok(Self {
            book_dir,
            title,
            patterns,
            output,
            bitrate,
            chapter_source,
            interactive: cli.interactive,
        })
    }

    pub fn scan_request(&self) -> ScanRequest {
        ScanRequest {
            dir: self.book_dir.clone(),
            title: self.title.clone(),
            patterns: self.patterns.clone(),
            source: self.chapter_source,
            exclude: Some(self.output.clone()),
        }
    }
}

fn answer(ask: &mut Option<&mut dyn Ask>, question: &str, default: &str) -> Result<String> {
    match ask {
        Some(ask) => ask.ask(question, default),
        None => Ok(default.to_string()),
    }
}

/// Canonical book directory: the given one, or the working directory.
pub fn resolve_book_dir(dir: Option<&Path>) -> Result<PathBuf> {
    let dir = match dir {
        Some(dir) => dir.to_path_buf(),
        None => env::current_dir().context("resolve current directory")?,
    };
    dir.canonicalize()
        .with_context(|| format!("open book directory {}", dir.display()))
}

/// External tools, resolved once the book directory is known to hold input.
#[derive(Debug, Clone)]
pub struct Tools {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl Tools {
    pub fn resolve(config: &Config) -> Result<Self> {
        Ok(Self {
            ffmpeg: combine::ensure_tool(&config.ffmpeg)?,
            ffprobe: combine::ensure_tool(&config.ffprobe)?,
        })
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let store = match &cli.config {
        Some(path) => ConfigStore::at(path),
        None => ConfigStore::new()?,
    };
    let config = store.load()?;
    let book_dir = resolve_book_dir(cli.dir.as_deref())?;

    let options = if cli.interactive {
        let mut prompter = prompt::stdio();
        BookOptions::resolve(&cli, &config, book_dir, Some(&mut prompter))?
    } else {
        BookOptions::resolve(&cli, &config, book_dir, None)?
    };
    tracing::info!(?options, "resolved options");

    let request = options.scan_request();
    let files = match book::discover(&request) {
        Ok(files) => files,
        Err(BookError::NoInputFiles { dir, patterns }) => {
            tracing::info!(dir = %dir.display(), %patterns, "nothing to combine");
            println!("No files found.");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    let tools = Tools::resolve(&config)?;
    let probe = Ffprobe::new(tools.ffprobe.clone());
    let book = book::assemble(&request.title, files, request.source, &probe)?;
    make_book(&options, &tools, &book)
}

fn make_book(options: &BookOptions, tools: &Tools, book: &BookState) -> Result<()> {
    println!("{} input files found.", book.input_files().len());
    println!("Total duration: {}", to_sexagesimal(book.total_duration_secs()));

    let artifacts = Artifacts::write(&options.book_dir, book)?;

    if options.interactive {
        let mut prompter = prompt::stdio();
        while prompter.confirm(artifacts.metadata_path())? == Confirmation::OpenMetadata {
            prompt::open_with_default_app(artifacts.metadata_path())?;
        }
        match artifacts.read_metadata() {
            Ok(parsed) => println!("Creating the book with {} chapters...", parsed.chapters.len()),
            Err(err) => tracing::warn!(error = %format!("{err:#}"), "edited metadata looks malformed"),
        }
    }

    let request = CombineRequest {
        ffmpeg: tools.ffmpeg.clone(),
        file_list: artifacts.file_list_path().to_path_buf(),
        metadata: artifacts.metadata_path().to_path_buf(),
        bitrate: options.bitrate.clone(),
        output: options.output.clone(),
    };
    match combine::combine(&request, book.total_micros()) {
        Ok(elapsed) => {
            println!("Time elapsed: {}", format_duration(elapsed));
            artifacts.remove()?;
            Ok(())
        }
        Err(err) => {
            artifacts.keep();
            Err(err)
        }
    }
}
