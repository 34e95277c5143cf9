//! Client bot steps
//!
//! Editor bots (`dart-editor*`) run the editor build; every other client
//! bot hands over to the compiler bot script.

use crate::annotator::Annotator;
use crate::clobber::{build_root, clean_output_directory, ClobberOptions};
use crate::env::{BotEnv, JAVA_HOME};
use crate::error::BotResult;
use crate::runner::{CommandRunner, CommandSpec};
use std::env::consts::ARCH;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// JDK the linux editor bots build with, relative to the home directory
const LINUX_EDITOR_JDK: &str = "jdk1.6.0_25";

/// Architecture name used in build roots
pub fn guess_arch() -> &'static str {
    if ARCH.starts_with("arm") || ARCH == "aarch64" {
        "arm"
    } else {
        "ia32"
    }
}

/// Name and version of a client build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientBuild {
    pub name: String,
    pub version: String,
}

pub struct ClientSteps<'a, R: CommandRunner, W: Write> {
    env: &'a BotEnv,
    dart_root: PathBuf,
    runner: R,
    annotator: Annotator<W>,
}

impl<'a, R: CommandRunner, W: Write> ClientSteps<'a, R, W> {
    pub fn new(env: &'a BotEnv, dart_root: impl Into<PathBuf>, runner: R, annotator: Annotator<W>) -> Self {
        Self {
            env,
            dart_root: dart_root.into(),
            runner,
            annotator,
        }
    }

    pub fn into_parts(self) -> (R, Annotator<W>) {
        (self.runner, self.annotator)
    }

    fn python(&self) -> String {
        self.env.python.to_string_lossy().into_owned()
    }

    pub fn run(&mut self) -> BotResult<i32> {
        if self.env.should_clobber() {
            self.annotator.step("Clobber");
            let status = self.clobber();
            if status != 0 {
                self.annotator.failure();
                return Ok(status);
            }
        }

        let build = self.build_info()?;
        let status = if build.name.starts_with("dart-editor") {
            self.process_tools("release", &build)?
        } else {
            let java_home = self.java_home();
            self.process_compiler(&build.name, java_home)?
        };

        if status != 0 {
            self.annotator.failure();
        }
        info!(status, name = %build.name, "client build done");
        Ok(status)
    }

    fn clobber(&mut self) -> i32 {
        match ClobberOptions::all(self.env.host) {
            Ok(options) => {
                for path in clean_output_directory(&self.dart_root, &options, self.env.host) {
                    self.annotator.line(&format!("Deleting {}", path.display()));
                }
                0
            }
            Err(e) => {
                self.annotator.line(&e.to_string());
                1
            }
        }
    }

    /// Builder name and revision, falling back to the host name and the
    /// working copy revision
    pub fn build_info(&mut self) -> BotResult<ClientBuild> {
        let name = match self.env.builder_name() {
            Some(name) => name.to_string(),
            None => hostname::get()
                .map(|h| h.to_string_lossy().into_owned())
                .unwrap_or_default()
                .split('.')
                .next()
                .unwrap_or_default()
                .to_string(),
        };
        let version = match self.env.revision() {
            Some(revision) => revision.to_string(),
            None => self
                .runner
                .output(&CommandSpec::shell("svnversion -n").current_dir(&self.dart_root))?
                .unwrap_or_else(|| "unknown".to_string()),
        };
        debug!(%name, %version, "client build");
        Ok(ClientBuild { name, version })
    }

    /// Editor build
    fn process_tools(&mut self, mode: &str, build: &ClientBuild) -> BotResult<i32> {
        self.annotator.line("ProcessTools");
        let script = Path::new(".").join("editor").join("build").join("build.py");
        let out_dir = build_root(self.env.host, mode, guess_arch(), self.env.host.build_name());

        self.annotator.line(&format!("mode = {mode}"));
        self.annotator.line(&format!("name = {}", build.name));
        self.annotator.line(&format!("version = {}", build.version));
        self.annotator.line(&format!("toolsBuildScript = {}", self.dart_root.join(&script).display()));

        let mut command = CommandSpec::new(self.python())
            .arg(script.to_string_lossy())
            .arg(format!("--mode={mode}"))
            .arg(format!("--revision={}", build.version))
            .arg(format!("--name={}", build.name))
            .arg(format!("--out={}", out_dir.display()))
            .current_dir(&self.dart_root);

        if build.name.contains("linux") {
            let home = self.env.var("HOME").unwrap_or("~");
            let java_home = Path::new(home).join(LINUX_EDITOR_JDK);
            let path = match self.env.var("PATH") {
                Some(path) => format!("{}:{path}", java_home.join("bin").display()),
                None => java_home.join("bin").display().to_string(),
            };
            command = command
                .env("JAVA_HOME", java_home.display().to_string())
                .env("PATH", path);
        }
        self.runner.run(&command)
    }

    /// `JAVA_HOME` for the compiler bot, from `BUILDBOT_JAVA_HOME` relative
    /// to the working directory
    fn java_home(&mut self) -> Option<String> {
        let relative = self.env.var(JAVA_HOME)?;
        let pwd = self.env.var("PWD").unwrap_or(".");
        let java_home = Path::new(pwd).join(relative).display().to_string();
        self.annotator.line("Setting java home to");
        self.annotator.line(&java_home);
        Some(java_home)
    }

    fn process_compiler(&mut self, name: &str, java_home: Option<String>) -> BotResult<i32> {
        self.annotator.line("ProcessCompiler");
        let script = Path::new("utils").join("compiler").join("buildbot.py");
        let mut command = CommandSpec::new(self.python())
            .arg(script.to_string_lossy())
            .current_dir(&self.dart_root);
        // Windows bots need the shell's environment
        command.shell = name.contains("windows");
        if let Some(java_home) = java_home {
            command = command.env("JAVA_HOME", java_home);
        }
        self.runner.run(&command)
    }
}
