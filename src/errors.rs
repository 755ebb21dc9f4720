//! Errors that can abort a preprocessing run.
//!
//! None of these are recovered from locally: every variant propagates up to
//! the command line entry point and ends the run. Restarting a run against
//! the same output directory resumes at the first stage whose output is
//! missing.

use std::path::PathBuf;

use tracing::error;

use crate::samples::record::StageKind;

/// Result type used throughout the `readprep` library.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the `readprep` library.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A manifest or read list did not follow the expected schema.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// A referenced read file (or codec input) does not exist.
    #[error("file not found: {}", .0.display())]
    MissingFile(PathBuf),

    /// The mate column held something other than `1` or `2`.
    #[error("invalid mate `{0}`: mate should be 1 or 2")]
    InvalidMate(String),

    /// The sampled quality characters did not fall within a known encoding.
    #[error(
        "could not determine the phred encoding of {}: {}",
        .path.display(),
        describe_max(.max)
    )]
    UnknownEncoding {
        /// The file that was sampled.
        path: PathBuf,

        /// The highest character code observed, if any were observed.
        max: Option<u8>,
    },

    /// A required external executable could not be resolved.
    #[error("required tool `{0}` could not be found")]
    MissingTool(String),

    /// An external tool exited with a non-zero status.
    #[error("{tool} failed during the {stage} stage\n{stdout}\n{stderr}")]
    StageFailed {
        /// The stage that was running.
        stage: StageKind,

        /// The tool that failed.
        tool: String,

        /// Captured standard output of the failing invocation.
        stdout: String,

        /// Captured standard error of the failing invocation.
        stderr: String,
    },

    /// A stage was asked to run on data it cannot consume.
    #[error("invalid stage order: {0}")]
    InvalidStageOrder(String),

    /// Standard I/O errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Errors (de)serializing the provenance log or parameter files.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn describe_max(max: &Option<u8>) -> String {
    match max {
        Some(max) => format!("highest quality character code was {}", max),
        None => String::from("no quality scores were sampled"),
    }
}

/// Process exit codes for each class of failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitCode {
    /// Any failure without a more specific code.
    Failure = 1,

    /// Indicates that invalid data was supplied to the given subcommand.
    InvalidInputData = 2,

    /// A required external tool was not available.
    MissingTool = 3,

    /// An external tool was run and failed.
    StageFailed = 4,
}

impl Error {
    /// Gets the process exit code that corresponds to this error.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Error::MalformedInput(_)
            | Error::MissingFile(_)
            | Error::InvalidMate(_)
            | Error::UnknownEncoding { .. }
            | Error::InvalidStageOrder(_) => ExitCode::InvalidInputData,
            Error::MissingTool(_) => ExitCode::MissingTool,
            Error::StageFailed { .. } => ExitCode::StageFailed,
            Error::Io(_) | Error::Json(_) => ExitCode::Failure,
        }
    }
}

/// Logs the message as an error and exits the process with the given code.
pub fn exit<I>(message: I, code: ExitCode) -> !
where
    I: std::fmt::Display,
{
    error!("{}", message);
    std::process::exit(code as i32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_failed_message_carries_captured_output() {
        let err = Error::StageFailed {
            stage: StageKind::Trim,
            tool: String::from("trimmomatic"),
            stdout: String::from("some stdout"),
            stderr: String::from("Exception in thread main"),
        };

        let message = err.to_string();
        assert!(message.starts_with("trimmomatic failed during the trim stage"));
        assert!(message.contains("some stdout"));
        assert!(message.contains("Exception in thread main"));
        assert_eq!(err.exit_code(), ExitCode::StageFailed);
    }

    #[test]
    fn test_unknown_encoding_message() {
        let err = Error::UnknownEncoding {
            path: PathBuf::from("reads.fq"),
            max: Some(110),
        };
        assert_eq!(
            err.to_string(),
            "could not determine the phred encoding of reads.fq: \
            highest quality character code was 110"
        );

        let err = Error::UnknownEncoding {
            path: PathBuf::from("empty.fq"),
            max: None,
        };
        assert!(err.to_string().ends_with("no quality scores were sampled"));
        assert_eq!(err.exit_code(), ExitCode::InvalidInputData);
    }
}
