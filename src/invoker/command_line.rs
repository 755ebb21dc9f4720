//! A structured argument-vector builder.

use std::ffi::OsStr;
use std::ffi::OsString;
use std::fmt;
use std::path::Path;
use std::path::PathBuf;

/// One invocation of an external program.
///
/// ```
/// use readprep::invoker::CommandLine;
///
/// let command = CommandLine::new("bbnorm.sh")
///     .opt("in=", "/data/a_1.fq")
///     .arg("-Xmx4g");
///
/// assert_eq!(command.to_string(), "bbnorm.sh in=/data/a_1.fq -Xmx4g");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandLine {
    program: OsString,
    args: Vec<OsString>,
    stdout: Option<PathBuf>,
}

impl CommandLine {
    /// Starts a command line for the given program.
    pub fn new<S>(program: S) -> Self
    where
        S: AsRef<OsStr>,
    {
        Self {
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
            stdout: None,
        }
    }

    /// Appends one argument.
    pub fn arg<S>(mut self, arg: S) -> Self
    where
        S: AsRef<OsStr>,
    {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Appends several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Appends `flag` and `value` glued together as one argument, as in
    /// `in=reads.fq` or `-Xmx4g`.
    pub fn opt<F, V>(mut self, flag: F, value: V) -> Self
    where
        F: AsRef<OsStr>,
        V: AsRef<OsStr>,
    {
        let mut joined = flag.as_ref().to_os_string();
        joined.push(value.as_ref());
        self.args.push(joined);
        self
    }

    /// Sends the program's standard output to a file instead of capturing it.
    pub fn stdout_to<P>(mut self, path: P) -> Self
    where
        P: AsRef<Path>,
    {
        self.stdout = Some(path.as_ref().to_path_buf());
        self
    }

    /// The program to run.
    pub fn program(&self) -> &OsStr {
        &self.program
    }

    /// The arguments, in order.
    pub fn arguments(&self) -> &[OsString] {
        &self.args
    }

    /// The file standard output is redirected to, if any.
    pub fn stdout(&self) -> Option<&Path> {
        self.stdout.as_deref()
    }

    /// Whether any argument equals the given value.
    pub fn has_arg<S>(&self, arg: S) -> bool
    where
        S: AsRef<OsStr>,
    {
        self.args.iter().any(|a| a.as_os_str() == arg.as_ref())
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;

        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }

        if let Some(stdout) = &self.stdout {
            write!(f, " > {}", stdout.display())?;
        }

        Ok(())
    }
}
