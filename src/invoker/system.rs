//! A [`ToolInvoker`] that runs real processes.

use std::fs;
use std::fs::File;
use std::process::Command;
use std::process::Stdio;

use tracing::debug;

use super::CommandLine;
use super::ToolInvoker;
use super::ToolOutput;
use crate::errors::Error;
use crate::errors::Result;
use crate::utils::atomic::partial_path;

/// Runs command lines with [`std::process::Command`], blocking until each
/// exits. There is no timeout.
#[derive(Debug, Default)]
pub struct SystemInvoker;

impl SystemInvoker {
    /// Creates a new `SystemInvoker`.
    pub fn new() -> Self {
        Self
    }
}

impl ToolInvoker for SystemInvoker {
    fn invoke(&mut self, command: &CommandLine) -> Result<ToolOutput> {
        debug!("  [*] Running `{}`.", command);

        let mut process = Command::new(command.program());
        process.args(command.arguments());

        let program = command.program().to_string_lossy().into_owned();
        let spawn_error = |err: std::io::Error| match err.kind() {
            std::io::ErrorKind::NotFound => Error::MissingTool(program.clone()),
            _ => Error::Io(err),
        };

        // (1) Redirected output is written to a partial file that is only
        // renamed into place if the tool succeeds.
        let redirect = match command.stdout() {
            Some(dest) => {
                let partial = partial_path(dest);
                process.stdout(Stdio::from(File::create(&partial)?));
                Some((partial, dest.to_path_buf()))
            }
            None => None,
        };

        let output = match process.output() {
            Ok(output) => output,
            Err(err) => {
                if let Some((partial, _)) = &redirect {
                    let _ = fs::remove_file(partial);
                }
                return Err(spawn_error(err));
            }
        };

        let success = output.status.success();

        // (2) Move (or discard) the redirected output.
        if let Some((partial, dest)) = redirect {
            if success {
                fs::rename(&partial, &dest)?;
            } else {
                let _ = fs::remove_file(&partial);
            }
        }

        Ok(ToolOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            success,
        })
    }
}
