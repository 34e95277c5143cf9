//! Subprocess execution
//!
//! Steps build [`CommandSpec`] values and hand them to a [`CommandRunner`].
//! Only the exit code is looked at.

use crate::error::{BotError, BotResult};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

/// A command line with its environment overrides
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Set on top of the inherited environment
    pub env: Vec<(String, String)>,
    pub cwd: Option<PathBuf>,
    /// Run the joined command line through the platform shell
    pub shell: bool,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            cwd: None,
            shell: false,
        }
    }

    /// Shell command line
    pub fn shell(line: impl Into<String>) -> Self {
        Self {
            shell: true,
            ..Self::new(line)
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((name.into(), value.into()));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Environment override for `name`, if set
    pub fn env_value(&self, name: &str) -> Option<&str> {
        self.env
            .iter()
            .rev()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn to_command(&self) -> Command {
        let mut command = if self.shell {
            let (shell, flag) = if cfg!(windows) { ("cmd", "/C") } else { ("sh", "-c") };
            let mut c = Command::new(shell);
            c.arg(flag).arg(self.to_string());
            c
        } else {
            let mut c = Command::new(&self.program);
            c.args(&self.args);
            c
        };
        command.envs(self.env.iter().map(|(k, v)| (k, v)));
        if let Some(cwd) = &self.cwd {
            command.current_dir(cwd);
        }
        command
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Runs commands to completion
pub trait CommandRunner {
    /// Exit code of the command
    fn run(&mut self, command: &CommandSpec) -> BotResult<i32>;

    /// Captured stdout, `None` when the command failed
    fn output(&mut self, command: &CommandSpec) -> BotResult<Option<String>>;
}

/// Runs real subprocesses, inheriting stdio
#[derive(Debug, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&mut self, command: &CommandSpec) -> BotResult<i32> {
        debug!(command = %command, "spawn");
        let status = command.to_command().status().map_err(|source| BotError::Spawn {
            program: command.program.clone(),
            source,
        })?;
        // Killed by a signal counts as a plain failure
        Ok(status.code().unwrap_or(1))
    }

    fn output(&mut self, command: &CommandSpec) -> BotResult<Option<String>> {
        debug!(command = %command, "capture");
        let output = command
            .to_command()
            .stdin(Stdio::null())
            .output()
            .map_err(|source| BotError::Spawn {
                program: command.program.clone(),
                source,
            })?;
        if !output.status.success() {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&output.stdout).into_owned()))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Records every command; exit codes and output are scripted by
    /// substring match on the command line
    #[derive(Debug, Default)]
    pub struct RecordingRunner {
        pub commands: Vec<CommandSpec>,
        codes: Vec<(String, i32)>,
        outputs: Vec<(String, String)>,
    }

    impl RecordingRunner {
        pub fn fail_when(mut self, pattern: &str, code: i32) -> Self {
            self.codes.push((pattern.to_string(), code));
            self
        }

        pub fn output_when(mut self, pattern: &str, text: &str) -> Self {
            self.outputs.push((pattern.to_string(), text.to_string()));
            self
        }

        /// Command lines in run order
        pub fn lines(&self) -> Vec<String> {
            self.commands.iter().map(ToString::to_string).collect()
        }
    }

    impl CommandRunner for RecordingRunner {
        fn run(&mut self, command: &CommandSpec) -> BotResult<i32> {
            let line = command.to_string();
            self.commands.push(command.clone());
            Ok(self
                .codes
                .iter()
                .find(|(pattern, _)| line.contains(pattern.as_str()))
                .map_or(0, |(_, code)| *code))
        }

        fn output(&mut self, command: &CommandSpec) -> BotResult<Option<String>> {
            let line = command.to_string();
            self.commands.push(command.clone());
            Ok(self
                .outputs
                .iter()
                .find(|(pattern, _)| line.contains(pattern.as_str()))
                .map(|(_, text)| text.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_display_and_env() {
        let command = CommandSpec::new("python")
            .args(["tools/test.py", "--mode=debug"])
            .env("TERM", "nocolor")
            .env("TERM", "dumb");
        assert_eq!(command.to_string(), "python tools/test.py --mode=debug");
        assert_eq!(command.env_value("TERM"), Some("dumb"));
        assert_eq!(command.env_value("PATH"), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_exit_codes() {
        let mut runner = SystemRunner;
        assert_eq!(runner.run(&CommandSpec::shell("exit 3")).unwrap(), 3);
        assert_eq!(
            runner.output(&CommandSpec::shell("echo Mozilla Firefox 17.0")).unwrap(),
            Some("Mozilla Firefox 17.0\n".to_string())
        );
        assert_eq!(runner.output(&CommandSpec::shell("false")).unwrap(), None);
        assert!(runner.run(&CommandSpec::new("/nonexistent/tool")).is_err());
    }
}
