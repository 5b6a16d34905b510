use chrono::Local;
use std::fmt::{Display, Formatter};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const HEADER_WIDTH: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Info,
    Success,
    Warning,
    Error,
    Progress,
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Status::Info => "INFO",
            Status::Success => "SUCCESS",
            Status::Warning => "WARNING",
            Status::Error => "ERROR",
            Status::Progress => "PROGRESS",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, Error)]
#[error("Failed to write to log file {path:?}: {source}")]
pub struct LogWriteError {
    path: PathBuf,
    source: std::io::Error,
}

/// Sends every status line of a run to the console logger and,
/// when a log file is set, appends it there too.
#[derive(Debug, Default)]
pub struct Reporter {
    log_file: Option<PathBuf>,
}

impl Reporter {
    pub fn new(log_file: Option<PathBuf>) -> Self {
        Self { log_file }
    }

    pub fn info(&self, message: &str) {
        self.report(Status::Info, message);
    }

    pub fn success(&self, message: &str) {
        self.report(Status::Success, message);
    }

    pub fn warning(&self, message: &str) {
        self.report(Status::Warning, message);
    }

    pub fn error(&self, message: &str) {
        self.report(Status::Error, message);
    }

    pub fn progress(&self, message: &str) {
        self.report(Status::Progress, message);
    }

    /// A banner around `title`, for console readability.
    pub fn header(&self, title: &str) {
        let rule = "=".repeat(HEADER_WIDTH);
        info!("{rule}");
        self.info(title);
        info!("{rule}");
    }

    /// Fails only when the log file can't be written; the console line is always emitted.
    pub fn status(&self, status: Status, message: &str) -> Result<(), LogWriteError> {
        match status {
            Status::Info | Status::Success | Status::Progress => info!("{message}"),
            Status::Warning => warn!("{message}"),
            Status::Error => error!("{message}"),
        }

        match &self.log_file {
            Some(log_file) => append_to_log_file(log_file, status, message),
            None => Ok(()),
        }
    }

    /// A log file that can't be written never stops the run.
    fn report(&self, status: Status, message: &str) {
        if let Err(e) = self.status(status, message) {
            error!("{e}");
        }
    }
}

fn format_line(status: Status, message: &str) -> String {
    let timestamp = Local::now().format(TIMESTAMP_FORMAT);
    format!("[{timestamp}] {status}: {message}")
}

fn append_to_log_file(path: &Path, status: Status, message: &str) -> Result<(), LogWriteError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .and_then(|mut file| writeln!(file, "{}", format_line(status, message)))
        .map_err(|source| LogWriteError {
            path: path.to_path_buf(),
            source,
        })
}
