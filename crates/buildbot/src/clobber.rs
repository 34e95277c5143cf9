//! Output directory cleaning
//!
//! Build roots are `<build dir>/<Mode>[<Os>]<ARCH>`, for example
//! `out/ReleaseIA32` or `out/DebugAndroidARM`. The build dir depends on the
//! host: `out` on linux and freebsd, `xcodebuild` on macos, `build` on win32.

use crate::env::HostOs;
use crate::error::{BotError, BotResult};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const MODES: &[&str] = &["debug", "release"];
const ARCHES: &[&str] = &["ia32", "x64", "simarm", "arm"];
const OSES: &[&str] = &["android", "freebsd", "linux", "macos", "win32"];

/// Configurations to delete
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClobberOptions {
    pub modes: Vec<String>,
    pub arches: Vec<String>,
    pub oses: Vec<String>,
}

impl ClobberOptions {
    /// Parse comma separated lists; `all` expands, `host` becomes the host os
    pub fn parse(mode: &str, arch: &str, os: &str, host: HostOs) -> BotResult<Self> {
        let split = |value: &str, all: &str| -> Vec<String> {
            let value = if value == "all" { all } else { value };
            value.split(',').map(str::to_string).collect()
        };
        let modes = split(mode, "release,debug");
        let arches = split(arch, "ia32,x64");
        let oses: Vec<String> = split(os, "host,android")
            .into_iter()
            .map(|os| if os == "host" { host.build_name().to_string() } else { os })
            .collect();

        if let Some(bad) = modes.iter().find(|m| !MODES.contains(&m.as_str())) {
            return Err(BotError::unknown_option("mode", bad.as_str()));
        }
        if let Some(bad) = arches.iter().find(|a| !ARCHES.contains(&a.as_str())) {
            return Err(BotError::unknown_option("arch", bad.as_str()));
        }
        if let Some(bad) = oses.iter().find(|o| !OSES.contains(&o.as_str())) {
            return Err(BotError::unknown_option("os", bad.as_str()));
        }
        Ok(Self { modes, arches, oses })
    }

    /// Every mode and arch for the host and android
    pub fn all(host: HostOs) -> BotResult<Self> {
        Self::parse("all", "all", "all", host)
    }

    /// One mode, every arch, host and android
    pub fn for_mode(mode: &str, host: HostOs) -> BotResult<Self> {
        Self::parse(mode, "all", "all", host)
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Build directory of the host platform
pub fn build_dir(host: HostOs) -> &'static str {
    match host {
        HostOs::Mac => "xcodebuild",
        HostOs::Windows => "build",
        _ => "out",
    }
}

/// Build configuration name, `<Mode>[<Os>]<ARCH>`
///
/// The os only appears when cross compiling for a target other than the host.
pub fn build_conf(host: HostOs, mode: &str, arch: &str, target_os: &str) -> String {
    let os = if target_os == host.build_name() {
        String::new()
    } else {
        capitalize(target_os)
    };
    format!("{}{}{}", capitalize(mode), os, arch.to_uppercase())
}

/// Build root relative to the checkout
pub fn build_root(host: HostOs, mode: &str, arch: &str, target_os: &str) -> PathBuf {
    Path::new(build_dir(host)).join(build_conf(host, mode, arch, target_os))
}

/// Delete every configured build root below `checkout`
///
/// Missing directories are skipped. Returns the roots that were removed.
pub fn clean_output_directory(checkout: &Path, options: &ClobberOptions, host: HostOs) -> Vec<PathBuf> {
    let mut deleted = Vec::new();
    for mode in &options.modes {
        for arch in &options.arches {
            for target_os in &options.oses {
                let root = build_root(host, mode, arch, target_os);
                let mut roots = vec![checkout.join(&root)];
                // Windows also keeps object files in the runtime library
                if host == HostOs::Windows {
                    roots.push(checkout.join("runtime").join(&root));
                }
                for path in roots {
                    debug!(path = %path.display(), "Deleting");
                    match fs::remove_dir_all(&path) {
                        Ok(()) => deleted.push(path),
                        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                        Err(e) => warn!(path = %path.display(), error = %e, "could not delete"),
                    }
                }
            }
        }
    }
    deleted
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_parse_all() {
        let options = ClobberOptions::all(HostOs::Linux).unwrap();
        assert_eq!(options.modes, vec!["release", "debug"]);
        assert_eq!(options.arches, vec!["ia32", "x64"]);
        assert_eq!(options.oses, vec!["linux", "android"]);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!(matches!(
            ClobberOptions::parse("fast", "all", "all", HostOs::Linux),
            Err(BotError::UnknownOption { kind: "mode", .. })
        ));
        assert!(matches!(
            ClobberOptions::parse("debug", "mips", "all", HostOs::Linux),
            Err(BotError::UnknownOption { kind: "arch", .. })
        ));
        assert!(matches!(
            ClobberOptions::parse("debug", "x64", "beos", HostOs::Linux),
            Err(BotError::UnknownOption { kind: "os", .. })
        ));
        assert!(ClobberOptions::parse("all", "all", "host", HostOs::Other).is_err());
    }

    #[test]
    fn test_build_roots() {
        assert_eq!(build_root(HostOs::Linux, "release", "ia32", "linux"), PathBuf::from("out/ReleaseIA32"));
        assert_eq!(
            build_root(HostOs::Linux, "debug", "arm", "android"),
            PathBuf::from("out/DebugAndroidARM")
        );
        assert_eq!(build_root(HostOs::Mac, "debug", "x64", "macos"), PathBuf::from("xcodebuild/DebugX64"));
        assert_eq!(build_root(HostOs::Windows, "release", "ia32", "win32"), PathBuf::from("build/ReleaseIA32"));
    }

    #[test]
    fn test_clean_only_requested_mode() {
        let dir = tempdir().unwrap();
        for conf in ["DebugIA32", "DebugX64", "ReleaseIA32"] {
            fs::create_dir_all(dir.path().join("out").join(conf).join("obj")).unwrap();
        }
        let options = ClobberOptions::for_mode("debug", HostOs::Linux).unwrap();

        let deleted = clean_output_directory(dir.path(), &options, HostOs::Linux);
        assert_eq!(
            deleted,
            vec![dir.path().join("out/DebugIA32"), dir.path().join("out/DebugX64")]
        );
        assert!(dir.path().join("out/ReleaseIA32").is_dir());
    }

    #[test]
    fn test_clean_windows_runtime_roots() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("build/ReleaseIA32")).unwrap();
        fs::create_dir_all(dir.path().join("runtime/build/ReleaseIA32")).unwrap();
        let options = ClobberOptions::parse("release", "ia32", "win32", HostOs::Windows).unwrap();

        let deleted = clean_output_directory(dir.path(), &options, HostOs::Windows);
        assert_eq!(deleted.len(), 2);
        assert!(!dir.path().join("runtime/build/ReleaseIA32").exists());
    }
}
