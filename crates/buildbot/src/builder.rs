//! Builder name parsing
//!
//! Bot names encode what to test:
//!
//! - `dart2js-<linux|mac|windows>-<debug|release>[-<option>][-<shard>-<shards>]`
//!   runs the compiler tests on d8;
//! - `web-<ie|ff|safari|chrome|opera>-<win7|win8|mac|linux>[-<shard>-<shards>]`
//!   runs them in a browser, always in release mode.

use crate::env::BotEnv;
use crate::error::{BotError, BotResult};
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::fmt;

lazy_static! {
    static ref DART2JS_BUILDER: Regex =
        Regex::new(r"^dart2js-(linux|mac|windows)-(debug|release)(-([a-z]+))?-?(\d*)-?(\d*)").unwrap();
    static ref WEB_BUILDER: Regex =
        Regex::new(r"^web-(ie|ff|safari|chrome|opera)-(win7|win8|mac|linux)-?(\d*)-?(\d*)").unwrap();
}

/// What a builder tests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    pub compiler: String,
    pub runtime: String,
    pub mode: String,
    pub system: String,
    pub option: Option<String>,
    pub shard_index: Option<String>,
    pub total_shards: Option<String>,
    /// False when emulating a bot from the command line
    pub is_buildbot: bool,
}

impl BuildInfo {
    /// Decode a builder name, `None` when it matches neither pattern
    pub fn parse(name: &str) -> Option<Self> {
        fn group(caps: &Captures, i: usize) -> Option<String> {
            caps.get(i)
                .map(|m| m.as_str())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        }

        let mut info = if let Some(caps) = DART2JS_BUILDER.captures(name) {
            Self {
                compiler: "dart2js".to_string(),
                runtime: "d8".to_string(),
                system: caps[1].to_string(),
                mode: caps[2].to_string(),
                option: group(&caps, 4),
                shard_index: group(&caps, 5),
                total_shards: group(&caps, 6),
                is_buildbot: true,
            }
        } else if let Some(caps) = WEB_BUILDER.captures(name) {
            Self {
                compiler: "dart2js".to_string(),
                runtime: caps[1].to_string(),
                system: caps[2].to_string(),
                mode: "release".to_string(),
                option: None,
                shard_index: group(&caps, 3),
                total_shards: group(&caps, 4),
                is_buildbot: true,
            }
        } else {
            return None;
        };
        if info.system == "windows" {
            info.system = "win7".to_string();
        }
        Some(info)
    }

    /// Builder from the environment, or the emulated one named on the
    /// command line
    ///
    /// `Ok(None)` means the name matched no builder pattern.
    pub fn resolve(env: &BotEnv, cli_name: Option<&str>) -> BotResult<Option<Self>> {
        let (name, is_buildbot) = match (env.builder_name(), cli_name) {
            (Some(name), _) => (name, true),
            (None, Some(name)) => (name, false),
            (None, None) => return Err(BotError::MissingBuilderName),
        };
        let Some(mut info) = Self::parse(name) else {
            return Ok(None);
        };
        info.is_buildbot = is_buildbot;
        if !env.host.runs(&info.system) {
            return Err(BotError::PlatformMismatch {
                system: info.system,
                host: env.host.build_name().to_string(),
            });
        }
        Ok(Some(info))
    }

    /// `--shards` / `--shard` flags for the test runner
    pub fn shard_flags(&self) -> Vec<String> {
        match &self.shard_index {
            Some(index) => vec![
                format!("--shards={}", self.total_shards.as_deref().unwrap_or("")),
                format!("--shard={index}"),
            ],
            None => Vec::new(),
        }
    }

    pub fn is_checked(&self) -> bool {
        self.option.as_deref() == Some("checked")
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "compiler: {}, runtime: {} mode: {}, system: {}, option: {}",
            self.compiler,
            self.runtime,
            self.mode,
            self.system,
            self.option.as_deref().unwrap_or("None")
        )?;
        if let Some(index) = &self.shard_index {
            write!(f, " shard {} of {}", index, self.total_shards.as_deref().unwrap_or(""))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{HostOs, BUILDER_NAME};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_dart2js_builder() {
        let info = BuildInfo::parse("dart2js-linux-debug").unwrap();
        assert_eq!(
            (info.compiler.as_str(), info.runtime.as_str(), info.mode.as_str(), info.system.as_str()),
            ("dart2js", "d8", "debug", "linux")
        );
        assert_eq!(info.option, None);
        assert_eq!(info.shard_index, None);
        assert!(info.shard_flags().is_empty());
    }

    #[test]
    fn test_web_builder() {
        let info = BuildInfo::parse("web-chrome-win7").unwrap();
        assert_eq!(
            (info.compiler.as_str(), info.runtime.as_str(), info.mode.as_str(), info.system.as_str()),
            ("dart2js", "chrome", "release", "win7")
        );
    }

    #[test]
    fn test_option_and_shards() {
        let info = BuildInfo::parse("dart2js-windows-release-checked-2-3").unwrap();
        assert_eq!(info.system, "win7");
        assert_eq!(info.option.as_deref(), Some("checked"));
        assert!(info.is_checked());
        assert_eq!(info.shard_index.as_deref(), Some("2"));
        assert_eq!(info.total_shards.as_deref(), Some("3"));
        assert_eq!(info.shard_flags(), vec!["--shards=3", "--shard=2"]);
        assert_eq!(
            info.to_string(),
            "compiler: dart2js, runtime: d8 mode: release, system: win7, option: checked shard 2 of 3"
        );

        let web = BuildInfo::parse("web-ie-win8-1-2").unwrap();
        assert_eq!(web.shard_flags(), vec!["--shards=2", "--shard=1"]);
    }

    #[test]
    fn test_unknown_names() {
        assert_eq!(BuildInfo::parse("vm-linux-debug"), None);
        assert_eq!(BuildInfo::parse("web-netscape-linux"), None);
        assert_eq!(BuildInfo::parse("my-dart2js-linux-debug"), None);
    }

    #[test]
    fn test_parse_is_deterministic() {
        for name in ["dart2js-mac-release", "web-ff-linux-1-4", "frog-linux"] {
            assert_eq!(BuildInfo::parse(name), BuildInfo::parse(name));
        }
    }

    #[test]
    fn test_resolve_prefers_environment() {
        let env = BotEnv::empty(HostOs::Linux).with_var(BUILDER_NAME, "dart2js-linux-release");
        let info = BuildInfo::resolve(&env, Some("web-ff-linux")).unwrap().unwrap();
        assert_eq!(info.runtime, "d8");
        assert!(info.is_buildbot);

        let env = BotEnv::empty(HostOs::Linux);
        let info = BuildInfo::resolve(&env, Some("web-ff-linux")).unwrap().unwrap();
        assert_eq!(info.runtime, "ff");
        assert!(!info.is_buildbot);
    }

    #[test]
    fn test_resolve_errors() {
        let env = BotEnv::empty(HostOs::Linux);
        assert!(matches!(BuildInfo::resolve(&env, None), Err(BotError::MissingBuilderName)));
        assert!(matches!(
            BuildInfo::resolve(&env, Some("web-ie-win7")),
            Err(BotError::PlatformMismatch { .. })
        ));
        assert!(BuildInfo::resolve(&env, Some("nonsense")).unwrap().is_none());
    }
}
