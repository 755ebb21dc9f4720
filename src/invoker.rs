//! The boundary between `readprep` and the external tools it drives.
//!
//! Stages never spawn processes themselves. They describe what to run as a
//! [`CommandLine`] (an argument vector, never a shell string) and hand it to
//! a [`ToolInvoker`], which runs it to completion and reports what the tool
//! printed and whether it succeeded. Swapping the invoker is how the
//! orchestrator is tested without any of the wrapped tools installed.

pub mod command_line;
pub mod resolver;
pub mod system;

pub use command_line::CommandLine;
pub use resolver::PathResolver;
pub use resolver::ToolResolver;
pub use system::SystemInvoker;

use crate::errors::Result;

/// What an external tool left behind once it exited.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Captured standard output (empty when it was redirected to a file).
    pub stdout: String,

    /// Captured standard error.
    pub stderr: String,

    /// Whether the tool exited successfully.
    pub success: bool,
}

impl ToolOutput {
    /// A successful run with the given standard error.
    pub fn success<S>(stderr: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            success: true,
        }
    }

    /// A failed run with the given standard error.
    pub fn failure<S>(stderr: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            success: false,
        }
    }
}

/// Runs one command line synchronously.
///
/// A tool exiting unsuccessfully is *not* an error at this level: it is
/// reported through [`ToolOutput::success`] so the caller can attach the
/// stage that was running. Errors are reserved for failing to run the tool
/// at all.
pub trait ToolInvoker {
    /// Runs the command to completion.
    fn invoke(&mut self, command: &CommandLine) -> Result<ToolOutput>;
}

impl<T> ToolInvoker for &mut T
where
    T: ToolInvoker + ?Sized,
{
    fn invoke(&mut self, command: &CommandLine) -> Result<ToolOutput> {
        (**self).invoke(command)
    }
}
