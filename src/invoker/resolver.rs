//! Locating external executables before a stage starts.

use std::collections::HashMap;
use std::env;
use std::ffi::OsString;
use std::path::Path;
use std::path::PathBuf;

use tracing::debug;

use crate::errors::Error;
use crate::errors::Result;

/// Finds the path of a runnable tool by name.
pub trait ToolResolver {
    /// Resolves a tool, returning `None` if it cannot be found.
    fn resolve(&self, name: &str) -> Option<PathBuf>;

    /// Resolves a tool, failing with [`Error::MissingTool`] if it cannot be
    /// found.
    fn require(&self, name: &str) -> Result<PathBuf> {
        match self.resolve(name) {
            Some(path) => {
                debug!("  [*] Using {} at {}.", name, path.display());
                Ok(path)
            }
            None => Err(Error::MissingTool(name.to_string())),
        }
    }
}

/// Resolves tools by searching a list of directories, as a shell does with
/// `PATH`. Explicit overrides take precedence over the search.
#[derive(Clone, Debug, Default)]
pub struct PathResolver {
    dirs: Vec<PathBuf>,
    overrides: HashMap<String, PathBuf>,
}

impl PathResolver {
    /// Searches the directories listed in the `PATH` environment variable.
    pub fn from_env() -> Self {
        Self::from_path_var(env::var_os("PATH").unwrap_or_default())
    }

    /// Searches the directories listed in a `PATH`-style value.
    pub fn from_path_var(path: OsString) -> Self {
        Self {
            dirs: env::split_paths(&path).collect(),
            overrides: HashMap::new(),
        }
    }

    /// Uses a specific executable for the named tool.
    pub fn with_override<N, P>(mut self, name: N, path: P) -> Self
    where
        N: Into<String>,
        P: Into<PathBuf>,
    {
        self.overrides.insert(name.into(), path.into());
        self
    }
}

impl ToolResolver for PathResolver {
    fn resolve(&self, name: &str) -> Option<PathBuf> {
        if let Some(path) = self.overrides.get(name) {
            return is_executable(path).then(|| path.clone());
        }

        self.dirs
            .iter()
            .map(|dir| dir.join(name))
            .find(|candidate| is_executable(candidate))
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(all(test, unix))]
mod tests {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    use tempfile::TempDir;

    use super::*;

    fn install(dir: &TempDir, name: &str, mode: u32) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(mode)).unwrap();
        path
    }

    #[test]
    fn test_resolve_from_search_path() {
        let dir = TempDir::new().unwrap();
        let tool = install(&dir, "bbnorm.sh", 0o755);
        install(&dir, "not-executable", 0o644);

        let resolver = PathResolver::from_path_var(dir.path().as_os_str().to_os_string());
        assert_eq!(resolver.resolve("bbnorm.sh"), Some(tool));
        assert_eq!(resolver.resolve("not-executable"), None);
        assert!(matches!(
            resolver.require("salmon"),
            Err(Error::MissingTool(t)) if t == "salmon"
        ));
    }

    #[test]
    fn test_override_wins() {
        let dir = TempDir::new().unwrap();
        let tool = install(&dir, "my-trimmomatic", 0o755);

        let resolver = PathResolver::from_path_var(OsString::new())
            .with_override("trimmomatic", &tool);
        assert_eq!(resolver.require("trimmomatic").unwrap(), tool);
    }
}
