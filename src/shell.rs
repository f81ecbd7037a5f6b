// Shell script runner
// Writes a generated launcher to disk, runs it as a child process and waits for its exit code

use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command};

use crate::error::{Result, SorterError};

/// Host shell family, picked explicitly rather than sniffed from strings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOs {
    Windows,
    Posix,
}

impl HostOs {
    pub fn current() -> Self {
        if cfg!(windows) {
            HostOs::Windows
        } else {
            HostOs::Posix
        }
    }

    /// File extension for launcher scripts ("" on POSIX)
    pub fn script_extension(&self) -> &'static str {
        match self {
            HostOs::Windows => ".bat",
            HostOs::Posix => "",
        }
    }
}

/// A script file plus the child process running it
pub struct ShellScript {
    text: String,
    path: PathBuf,
    host: HostOs,
    env: Vec<(OsString, OsString)>,
    child: Option<Child>,
}

impl ShellScript {
    pub fn new(text: impl Into<String>, path: impl Into<PathBuf>, host: HostOs) -> Self {
        ShellScript {
            text: text.into(),
            path: path.into(),
            host,
            env: Vec::new(),
            child: None,
        }
    }

    /// Set an environment variable for the child only
    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Write the script, creating parent directories
    pub fn write(&self) -> io::Result<()> {
        write_text_file(&self.path, &self.text)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o755))?;
        }

        Ok(())
    }

    /// Write the script and launch it with `cwd` as working directory
    ///
    /// Standard streams are inherited so the tool's own output reaches the console.
    /// The script is handed to the shell by absolute path, so `cwd` may differ
    /// from the caller's directory.
    pub fn start(&mut self, cwd: &Path) -> Result<()> {
        self.path = absolute_path(&self.path);
        self.write()?;

        let mut command = match self.host {
            HostOs::Windows => {
                let mut c = Command::new("cmd");
                c.arg("/C").arg(&self.path);
                c
            }
            HostOs::Posix => {
                let mut c = Command::new("bash");
                c.arg(&self.path);
                c
            }
        };
        command.current_dir(cwd);
        for (key, value) in &self.env {
            command.env(key, value);
        }

        log::debug!("Launching {} in {}", self.path.display(), cwd.display());

        let child = command.spawn().map_err(|source| SorterError::Spawn {
            script: self.path.clone(),
            source,
        })?;
        self.child = Some(child);
        Ok(())
    }

    /// Block until the child exits; a signal-terminated child reports -1
    pub fn wait(&mut self) -> Result<i32> {
        let child = self.child.as_mut().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::Other,
                format!("{} was never started", self.path.display()),
            )
        })?;
        let status = child.wait()?;
        self.child = None;
        Ok(status.code().unwrap_or(-1))
    }
}

/// Resolve `path` against the current directory; absolute paths pass through
pub fn absolute_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}

/// Write a text file in one scoped handle
pub fn write_text_file(path: &Path, text: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::File::create(path)?;
    file.write_all(text.as_bytes())?;
    file.flush()
}

/// Write `script_text` to `script_path`, run it in `cwd` and return its exit code
pub fn run_script(
    script_text: &str,
    script_path: &Path,
    cwd: &Path,
    host: HostOs,
    env: &[(&str, &Path)],
) -> Result<i32> {
    let mut script = ShellScript::new(script_text, script_path, host);
    for (key, value) in env {
        script = script.env(*key, value.as_os_str());
    }
    script.start(cwd)?;
    script.wait()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_exit_codes() {
        let temp_dir = TempDir::new().unwrap();
        let ok = temp_dir.path().join("ok");
        let bad = temp_dir.path().join("bad");

        let code = run_script("exit 0\n", &ok, temp_dir.path(), HostOs::Posix, &[]).unwrap();
        assert_eq!(code, 0);

        let code = run_script("exit 3\n", &bad, temp_dir.path(), HostOs::Posix, &[]).unwrap();
        assert_eq!(code, 3);
    }

    #[test]
    fn test_runs_in_cwd_with_env() {
        let temp_dir = TempDir::new().unwrap();
        let work = temp_dir.path().join("work");
        fs::create_dir_all(&work).unwrap();
        let script = temp_dir.path().join("scripts").join("launch");

        let code = run_script(
            "echo \"$TOOL_HOME\" > seen.txt\n",
            &script,
            &work,
            HostOs::Posix,
            &[("TOOL_HOME", Path::new("/opt/tool"))],
        )
        .unwrap();

        assert_eq!(code, 0);
        assert!(script.is_file());
        let seen = fs::read_to_string(work.join("seen.txt")).unwrap();
        assert_eq!(seen.trim(), "/opt/tool");
    }

    #[test]
    fn test_wait_without_start() {
        let mut script = ShellScript::new("exit 0", "/nonexistent/never", HostOs::Posix);
        assert!(script.wait().is_err());
    }

    #[test]
    fn test_relative_script_path_with_other_cwd() {
        let cwd = std::env::current_dir().unwrap();
        let temp_dir = TempDir::new_in(&cwd).unwrap();
        let relative = temp_dir.path().strip_prefix(&cwd).unwrap().to_path_buf();
        let work = relative.join("work");
        fs::create_dir_all(&work).unwrap();

        let code = run_script(
            "pwd > where.txt\n",
            &work.join("launch"),
            &work,
            HostOs::Posix,
            &[],
        )
        .unwrap();

        assert_eq!(code, 0);
        assert!(temp_dir.path().join("work").join("where.txt").is_file());
    }

    #[test]
    fn test_absolute_path() {
        assert_eq!(absolute_path(Path::new("/opt/x")), PathBuf::from("/opt/x"));
        let resolved = absolute_path(Path::new("runs/a"));
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("runs/a"));
    }

    #[test]
    fn test_script_extension() {
        assert_eq!(HostOs::Windows.script_extension(), ".bat");
        assert_eq!(HostOs::Posix.script_extension(), "");
    }
}
