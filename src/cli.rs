use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone, Default)]
#[command(
    name = "ctfb",
    version,
    about = "Combine a directory of audio files into one file with chapters",
    after_help = "Examples:\n  \
        ctfb\n  \
        ctfb -t \"Fabulous Title\" -p \"*.wma\" -p \"*.mp3\" -b 32k -o fabulous.mp3\n  \
        ctfb -b 32k -i\n  \
        ctfb -p \"*.ogg\" -o out.ogg"
)]
pub struct Cli {
    /// Title of the combined file [default: directory name]
    #[arg(short, long)]
    pub title: Option<String>,

    /// Glob for input file names; repeat to combine several [default: *.opus]
    #[arg(short = 'p', long = "pattern", value_name = "GLOB")]
    pub patterns: Vec<String>,

    /// Output file name with extension [default: <directory name>.opus]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Audio bitrate of the output; without it the audio is stream-copied
    #[arg(short, long)]
    pub bitrate: Option<String>,

    /// Prompt for missing options and pause before combining
    #[arg(short, long)]
    pub interactive: bool,

    /// Read chapters from youtube-dl .info.json files next to each input
    #[arg(long = "yt", visible_alias = "sidecar-chapters")]
    pub sidecar_chapters: bool,

    /// Directory holding the input files [default: current directory]
    #[arg(short, long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Configuration file [default: ~/.config/ctfb.yaml]
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// More log output; repeat for debug logs
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}
