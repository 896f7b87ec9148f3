pub mod app;
pub mod artifacts;
pub mod book;
pub mod chapters;
pub mod cli;
pub mod combine;
pub mod config;
pub mod error;
pub mod logging;
pub mod probe;
pub mod progress;
pub mod prompt;
pub mod timecode;

pub use app::run;
pub use book::{BookState, ChapterEntry};
pub use error::BookError;
