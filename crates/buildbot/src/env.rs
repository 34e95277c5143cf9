//! Environment snapshot
//!
//! The bot reads its environment once at startup; everything downstream
//! receives this value instead of calling `std::env`.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

pub const BUILDER_NAME: &str = "BUILDBOT_BUILDERNAME";
pub const BUILDER_CLOBBER: &str = "BUILDBOT_CLOBBER";
pub const REVISION: &str = "BUILDBOT_REVISION";
pub const JAVA_HOME: &str = "BUILDBOT_JAVA_HOME";
pub const USER_TEST: &str = "USER_TEST";

/// Host operating system as the bots name it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOs {
    Linux,
    Mac,
    Windows,
    FreeBsd,
    Other,
}

impl HostOs {
    pub fn current() -> Self {
        match env::consts::OS {
            "linux" => Self::Linux,
            "macos" => Self::Mac,
            "windows" => Self::Windows,
            "freebsd" => Self::FreeBsd,
            _ => Self::Other,
        }
    }

    /// Name used in build directory layouts
    pub fn build_name(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Mac => "macos",
            Self::Windows => "win32",
            Self::FreeBsd => "freebsd",
            Self::Other => "unknown",
        }
    }

    /// Whether a builder for `system` may run on this host
    pub fn runs(self, system: &str) -> bool {
        match system {
            "win7" | "win8" => self == Self::Windows,
            "mac" => self == Self::Mac,
            "linux" => self == Self::Linux,
            _ => true,
        }
    }
}

/// Variables the steps care about, read once
#[derive(Debug, Clone)]
pub struct BotEnv {
    vars: HashMap<String, String>,
    pub host: HostOs,
    /// Interpreter for the tools/*.py scripts
    pub python: PathBuf,
}

impl BotEnv {
    pub fn from_env() -> Self {
        let python = which::which("python")
            .or_else(|_| which::which("python3"))
            .unwrap_or_else(|_| PathBuf::from("python"));
        Self {
            vars: env::vars().collect(),
            host: HostOs::current(),
            python,
        }
    }

    /// Empty environment for `host`
    pub fn empty(host: HostOs) -> Self {
        Self {
            vars: HashMap::new(),
            host,
            python: PathBuf::from("python"),
        }
    }

    pub fn with_var(mut self, name: &str, value: &str) -> Self {
        self.vars.insert(name.to_string(), value.to_string());
        self
    }

    /// Non-empty value of `name`
    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn builder_name(&self) -> Option<&str> {
        self.var(BUILDER_NAME)
    }

    pub fn revision(&self) -> Option<&str> {
        self.var(REVISION)
    }

    pub fn should_clobber(&self) -> bool {
        self.var(BUILDER_CLOBBER) == Some("1")
    }

    pub fn user_test(&self) -> bool {
        self.var(USER_TEST) == Some("yes")
    }

    /// The full snapshot, for passing on to children
    pub fn vars(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
