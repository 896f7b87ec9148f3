use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process::Command;

/// Source of answers for options left off the command line.
pub trait Ask {
    /// Returns the answer, or `default` when the answer is empty.
    fn ask(&mut self, question: &str, default: &str) -> Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    OpenMetadata,
    Combine,
}

pub struct Prompter<R, W> {
    input: R,
    output: W,
}

pub fn stdio() -> Prompter<io::StdinLock<'static>, io::Stdout> {
    Prompter::new(io::stdin().lock(), io::stdout())
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn read_answer(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        let read = self.input.read_line(&mut line).context("read answer")?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    pub fn confirm(&mut self, metadata: &Path) -> Result<Confirmation> {
        write!(
            self.output,
            "Type [m] to open {} or press Enter to create the book: ",
            metadata.display()
        )?;
        self.output.flush()?;
        let answer = self.read_answer()?.unwrap_or_default();
        if answer.eq_ignore_ascii_case("m") {
            Ok(Confirmation::OpenMetadata)
        } else {
            Ok(Confirmation::Combine)
        }
    }
}

impl<R: BufRead, W: Write> Ask for Prompter<R, W> {
    fn ask(&mut self, question: &str, default: &str) -> Result<String> {
        if default.is_empty() {
            write!(self.output, "{question}: ")?;
        } else {
            write!(self.output, "{question} [{default}]: ")?;
        }
        self.output.flush()?;
        Ok(self
            .read_answer()?
            .filter(|answer| !answer.is_empty())
            .unwrap_or_else(|| default.to_string()))
    }
}

/// Opens `path` with the platform's default application without waiting for it.
pub fn open_with_default_app(path: &Path) -> Result<()> {
    let mut command = if cfg!(target_os = "macos") {
        Command::new("open")
    } else if cfg!(target_os = "windows") {
        let mut command = Command::new("cmd");
        command.args(["/C", "start", ""]);
        command
    } else {
        Command::new("xdg-open")
    };
    command
        .arg(path)
        .spawn()
        .with_context(|| format!("open {}", path.display()))?;
    Ok(())
}
