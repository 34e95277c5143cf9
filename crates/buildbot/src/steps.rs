//! dart2js bot steps
//!
//! Clobber (on request), build the SDK, then run the compiler test groups
//! for the builder's runtime. The first failing step ends the run and its
//! exit code becomes the bot's.

use crate::annotator::Annotator;
use crate::builder::BuildInfo;
use crate::clobber::{clean_output_directory, ClobberOptions};
use crate::env::BotEnv;
use crate::error::BotResult;
use crate::runner::{CommandRunner, CommandSpec};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Runtimes driven through a browser, which need an X server on linux
const BROWSER_RUNTIMES: &[&str] = &["ie", "chrome", "safari", "opera", "ff", "drt"];

/// Suites the slow IE bot runs
const IE_SUITES: &[&str] = &[
    "dartc",
    "samples",
    "standalone",
    "corelib",
    "co19",
    "language",
    "isolate",
    "vm",
    "json",
    "benchmark_smoke",
    "dartdoc",
    "utils",
    "pub",
    "lib",
];

const EXTRA_SUITES: &[&str] = &["dart2js_extra", "dart2js_native"];

pub fn needs_xterm(runtime: &str) -> bool {
    BROWSER_RUNTIMES.contains(&runtime)
}

/// Filesystem locations the steps touch
#[derive(Debug, Clone)]
pub struct StepPaths {
    /// Root of the dart checkout; commands run here
    pub dart_root: PathBuf,
    /// Where firefox leaves `tmp*` profiles
    pub firefox_profile_dirs: Vec<PathBuf>,
    /// Temp directory of the windows bot user
    pub windows_temp_dir: PathBuf,
}

impl StepPaths {
    pub fn new(dart_root: impl Into<PathBuf>) -> Self {
        Self {
            dart_root: dart_root.into(),
            firefox_profile_dirs: vec![PathBuf::from("/tmp"), PathBuf::from("/var/tmp")],
            windows_temp_dir: PathBuf::from(r"C:\Users\chrome-bot\AppData\Local\Temp"),
        }
    }
}

/// Step sequence of a dart2js or web bot
pub struct Dart2JsSteps<'a, R: CommandRunner, W: Write> {
    env: &'a BotEnv,
    info: &'a BuildInfo,
    paths: StepPaths,
    runner: R,
    annotator: Annotator<W>,
}

impl<'a, R: CommandRunner, W: Write> Dart2JsSteps<'a, R, W> {
    pub fn new(env: &'a BotEnv, info: &'a BuildInfo, paths: StepPaths, runner: R, annotator: Annotator<W>) -> Self {
        Self {
            env,
            info,
            paths,
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

    fn tool(&self, script: &str) -> CommandSpec {
        CommandSpec::new(self.python())
            .arg(script)
            .env("TERM", "nocolor")
            .current_dir(&self.paths.dart_root)
    }

    /// Run every step; returns the exit code for the bot
    pub fn run(&mut self) -> BotResult<i32> {
        self.annotator.line(&self.info.to_string());

        if self.env.should_clobber() {
            self.annotator.step("Clobber");
            let status = self.clobber();
            if status != 0 {
                self.annotator.failure();
                return Ok(status);
            }
        }

        self.annotator.step("build sdk");
        let status = self.build_sdk()?;
        if status != 0 {
            self.annotator.failure();
            return Ok(status);
        }

        let flags = self.info.shard_flags();
        let mut status = self.test_compiler(&flags)?;

        // Checked mode is only re-run when the host is not already checked
        if status == 0 && !self.info.is_checked() && self.info.runtime == "d8" {
            let mut checked = flags.clone();
            checked.push("--checked".to_string());
            status = self.test_compiler(&checked)?;
        }

        if self.info.runtime != "d8" {
            self.clean_up_temporary_files();
        }
        if status != 0 {
            self.annotator.failure();
        }
        info!(status, builder = %self.info, "done");
        Ok(status)
    }

    fn clobber(&mut self) -> i32 {
        let options = match ClobberOptions::for_mode(&self.info.mode, self.env.host) {
            Ok(options) => options,
            Err(e) => {
                self.annotator.line(&e.to_string());
                return 1;
            }
        };
        self.annotator.line(&format!("Clobbering {}", self.info.mode));
        for path in clean_output_directory(&self.paths.dart_root, &options, self.env.host) {
            self.annotator.line(&format!("Deleting {}", path.display()));
        }
        0
    }

    fn build_sdk(&mut self) -> BotResult<i32> {
        let command = self
            .tool("./tools/build.py")
            .arg(format!("--mode={}", self.info.mode))
            .arg("create_sdk");
        self.annotator.line(&format!("running {command}"));
        self.runner.run(&command)
    }

    /// One `tools/test.py` invocation in its own step
    fn test_step(&mut self, name: &str, compiler: &str, runtime: &str, targets: &[&str], flags: &[String]) -> BotResult<i32> {
        self.annotator
            .step(&format!("{name} {compiler} tests: {runtime} {}", flags.join(" ")));

        let mut command = if needs_xterm(runtime) && self.info.system == "linux" {
            CommandSpec::new("xvfb-run").arg("-a").arg(self.python())
        } else {
            CommandSpec::new(self.python())
        };
        command = command
            .arg("./tools/test.py")
            .arg(format!("--mode={}", self.info.mode))
            .arg(format!("--compiler={compiler}"))
            .arg(format!("--runtime={runtime}"))
            .args(["--time", "--use-sdk", "--report"]);
        if self.env.user_test() {
            command = command.arg("--progress=color");
        } else {
            command = command.args(["--progress=buildbot", "-v"]);
        }
        command = command
            .args(flags.iter().cloned())
            .args(targets.iter().copied())
            .env("TERM", "nocolor")
            .current_dir(&self.paths.dart_root);

        self.annotator.line(&format!("running {command}"));
        let status = self.runner.run(&command)?;
        if status != 0 {
            self.annotator.failure();
        }
        debug!(step = name, status, "test step");
        Ok(status)
    }

    /// Test groups for the builder's runtime, stopping at the first failure
    fn test_compiler(&mut self, flags: &[String]) -> BotResult<i32> {
        let system = self.info.system.clone();
        let mut runtime = self.info.runtime.clone();
        let mut flags = flags.to_vec();

        let ie_on_windows = system.starts_with("win") && runtime == "ie";
        let mut bot_num = None;
        if ie_on_windows {
            // Fast and slow bots instead of shards; one IE driver at a time
            bot_num = flags
                .iter()
                .find_map(|f| f.strip_prefix("--shard="))
                .map(str::to_string);
            flags.retain(|f| !f.starts_with("--shard"));
            flags.push("-j1".to_string());
        }

        if system == "linux" && runtime == "chrome" {
            runtime = "drt".to_string();
        } else if (runtime == "ff" || runtime == "chrome") && self.info.is_buildbot {
            self.print_browser_version(&runtime)?;
        }

        if self.info.is_checked() {
            flags.push("--host-checked".to_string());
        }

        let mut groups: Vec<(&str, &str, &str, Vec<&str>)> = Vec::new();
        if runtime == "d8" {
            groups.push(("dart2js_unit", "none", "vm", vec!["dart2js"]));
        }
        if !ie_on_windows {
            groups.push(("dart2js", "dart2js", &runtime, Vec::new()));
            groups.push(("dart2js_extra", "dart2js", &runtime, EXTRA_SUITES.to_vec()));
        } else if bot_num.as_deref() == Some("1") {
            groups.push(("dart2js", "dart2js", &runtime, vec!["html"]));
        } else {
            groups.push(("dart2js", "dart2js", &runtime, IE_SUITES.to_vec()));
            groups.push(("dart2js_extra", "dart2js", &runtime, EXTRA_SUITES.to_vec()));
        }

        for (name, compiler, group_runtime, targets) in groups {
            let status = self.test_step(name, compiler, group_runtime, &targets, &flags)?;
            if status != 0 {
                return Ok(status);
            }
        }
        Ok(0)
    }

    fn browser_path(&self, runtime: &str) -> String {
        let (mac_app, mac_binary, linux, windows) = match runtime {
            "chrome" => (
                r"Google\ Chrome",
                r"Google\ Chrome",
                "google-chrome",
                r"C:/Users/chrome-bot/AppData/Local/Google/Chrome/Application/chrome.exe",
            ),
            _ => (
                "Firefox",
                "firefox",
                "firefox",
                r"C:/Program Files (x86)/Mozilla Firefox/firefox.exe",
            ),
        };
        match self.info.system.as_str() {
            "mac" => format!("/Applications/{mac_app}.app/Contents/MacOS/{mac_binary}"),
            "linux" => linux.to_string(),
            _ => windows.to_string(),
        }
    }

    /// Print the installed browser version; lookup failures are ignored
    fn print_browser_version(&mut self, runtime: &str) -> BotResult<()> {
        let query = match (runtime, self.info.system.as_str()) {
            ("chrome", "win7") => {
                r#"reg query "HKCU\Software\Microsoft\Windows\CurrentVersion\Uninstall\Google Chrome" /v Version"#
                    .to_string()
            }
            ("ff", "win7") => format!("\"{}\" --version| more", self.browser_path(runtime)),
            _ => format!("\"{}\" --version", self.browser_path(runtime)),
        };
        let version = self
            .runner
            .output(&CommandSpec::shell(query))?
            .and_then(|output| output.split_whitespace().last().map(str::to_string));
        match version {
            Some(version) => self.annotator.line(&format!("Version of {runtime}: {version}")),
            None => warn!(runtime, "could not determine browser version"),
        }
        Ok(())
    }

    /// Remove temporary browser profiles left behind by selenium
    fn clean_up_temporary_files(&mut self) {
        if self.info.system == "win7" {
            if let Err(e) = fs::remove_dir_all(&self.paths.windows_temp_dir) {
                debug!(error = %e, "temp cleanup");
            }
        } else if self.info.runtime == "ff" {
            for dir in &self.paths.firefox_profile_dirs {
                delete_firefox_profiles(dir);
            }
        }
    }
}

/// Delete every `tmp*` directory directly inside `dir`
pub fn delete_firefox_profiles(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut deleted = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        let is_profile = entry.file_name().to_string_lossy().starts_with("tmp") && path.is_dir();
        if !is_profile {
            continue;
        }
        match fs::remove_dir_all(&path) {
            Ok(()) => deleted.push(path),
            Err(e) => warn!(path = %path.display(), error = %e, "could not delete profile"),
        }
    }
    deleted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{HostOs, BUILDER_CLOBBER, USER_TEST};
    use crate::runner::testing::RecordingRunner;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    struct Run {
        status: i32,
        lines: Vec<String>,
        log: String,
        commands: Vec<CommandSpec>,
    }

    fn run_bot(env: &BotEnv, name: &str, runner: RecordingRunner, paths: StepPaths) -> Run {
        let mut info = BuildInfo::parse(name).unwrap();
        info.is_buildbot = false;
        let mut steps = Dart2JsSteps::new(env, &info, paths, runner, Annotator::new(Vec::new()));
        let status = steps.run().unwrap();
        let (runner, annotator) = steps.into_parts();
        Run {
            status,
            lines: runner.lines(),
            log: String::from_utf8(annotator.into_inner()).unwrap(),
            commands: runner.commands,
        }
    }

    fn linux() -> BotEnv {
        BotEnv::empty(HostOs::Linux)
    }

    fn paths() -> StepPaths {
        let mut paths = StepPaths::new("/dart");
        paths.firefox_profile_dirs = Vec::new();
        paths.windows_temp_dir = PathBuf::from("/nonexistent/temp");
        paths
    }

    #[test]
    fn test_d8_bot_sequence() {
        let run = run_bot(&linux(), "dart2js-linux-debug", RecordingRunner::default(), paths());
        assert_eq!(run.status, 0);

        let test = "python ./tools/test.py --mode=debug";
        let common = "--time --use-sdk --report --progress=buildbot -v";
        assert_eq!(
            run.lines,
            vec![
                "python ./tools/build.py --mode=debug create_sdk".to_string(),
                format!("{test} --compiler=none --runtime=vm {common} dart2js"),
                format!("{test} --compiler=dart2js --runtime=d8 {common}"),
                format!("{test} --compiler=dart2js --runtime=d8 {common} dart2js_extra dart2js_native"),
                format!("{test} --compiler=none --runtime=vm {common} --checked dart2js"),
                format!("{test} --compiler=dart2js --runtime=d8 {common} --checked"),
                format!("{test} --compiler=dart2js --runtime=d8 {common} --checked dart2js_extra dart2js_native"),
            ]
        );
        assert!(run.log.starts_with("compiler: dart2js, runtime: d8 mode: debug, system: linux, option: None\n"));
        assert!(run.log.contains("@@@BUILD_STEP build sdk@@@\n"));
        assert!(run.log.contains("@@@BUILD_STEP dart2js_unit none tests: vm @@@\n"));
        assert!(run.log.contains("@@@BUILD_STEP dart2js dart2js tests: d8 --checked@@@\n"));
        assert!(!run.log.contains("STEP_FAILURE"));
        assert!(run
            .commands
            .iter()
            .all(|c| c.env_value("TERM") == Some("nocolor") && c.cwd.as_deref() == Some(Path::new("/dart"))));
    }

    #[test]
    fn test_sdk_failure_short_circuits() {
        let runner = RecordingRunner::default().fail_when("create_sdk", 2);
        let run = run_bot(&linux(), "dart2js-linux-release", runner, paths());
        assert_eq!(run.status, 2);
        assert_eq!(run.lines.len(), 1);
        assert!(run.log.contains("@@@BUILD_STEP build sdk@@@\nrunning "));
        assert!(run.log.ends_with("@@@STEP_FAILURE@@@\n"));
        assert_eq!(run.log.matches("@@@BUILD_STEP").count(), 1);
    }

    #[test]
    fn test_first_test_failure_stops_run() {
        let runner = RecordingRunner::default().fail_when("--runtime=d8", 7);
        let run = run_bot(&linux(), "dart2js-linux-release", runner, paths());
        assert_eq!(run.status, 7);
        // unit tests, then the failing default suites; no extras, no checked re-run
        assert_eq!(run.lines.len(), 3);
        assert_eq!(run.log.matches("@@@STEP_FAILURE@@@").count(), 2);
    }

    #[test]
    fn test_checked_option() {
        let run = run_bot(&linux(), "dart2js-linux-release-checked", RecordingRunner::default(), paths());
        assert_eq!(run.status, 0);
        assert_eq!(run.lines.len(), 4);
        assert!(run.lines[1..].iter().all(|l| l.contains("--host-checked")));
        assert!(!run.lines.iter().any(|l| l.contains(" --checked")));
    }

    #[test]
    fn test_shards_and_user_test() {
        let env = linux().with_var(USER_TEST, "yes");
        let run = run_bot(&env, "web-ff-linux-2-3", RecordingRunner::default(), paths());
        assert_eq!(
            run.lines[1],
            "xvfb-run -a python ./tools/test.py --mode=release --compiler=dart2js --runtime=ff \
             --time --use-sdk --report --progress=color --shards=3 --shard=2"
        );
    }

    #[test]
    fn test_linux_chrome_uses_drt() {
        let run = run_bot(&linux(), "web-chrome-linux", RecordingRunner::default(), paths());
        assert_eq!(run.lines.len(), 3);
        assert!(run.lines[1].starts_with("xvfb-run -a "));
        assert!(run.lines[1].contains("--runtime=drt"));
        assert!(!run.log.contains("Version of"));
    }

    #[test]
    fn test_browser_version_on_real_bot() {
        let mut info = BuildInfo::parse("web-ff-linux").unwrap();
        info.is_buildbot = true;
        let env = linux();
        let runner = RecordingRunner::default().output_when("firefox", "Mozilla Firefox 17.0.1\n");
        let mut steps = Dart2JsSteps::new(&env, &info, paths(), runner, Annotator::new(Vec::new()));
        steps.run().unwrap();
        let (runner, annotator) = steps.into_parts();
        assert!(runner.commands.iter().any(|c| c.shell && c.program == "\"firefox\" --version"));
        let log = String::from_utf8(annotator.into_inner()).unwrap();
        assert!(log.contains("Version of ff: 17.0.1\n"));
    }

    #[test]
    fn test_browser_version_failure_ignored() {
        let mut info = BuildInfo::parse("web-ff-linux").unwrap();
        info.is_buildbot = true;
        let env = linux();
        let mut steps = Dart2JsSteps::new(&env, &info, paths(), RecordingRunner::default(), Annotator::new(Vec::new()));
        assert_eq!(steps.run().unwrap(), 0);
    }

    #[test]
    fn test_ie_bots() {
        let env = BotEnv::empty(HostOs::Windows);
        let fast = run_bot(&env, "web-ie-win7-1-2", RecordingRunner::default(), paths());
        assert_eq!(fast.lines.len(), 2);
        assert!(fast.lines[1].ends_with("-v -j1 html"));
        assert!(!fast.lines[1].contains("--shard"));

        let slow = run_bot(&env, "web-ie-win7-2-2", RecordingRunner::default(), paths());
        assert_eq!(slow.lines.len(), 3);
        assert!(slow.lines[1].ends_with("-j1 dartc samples standalone corelib co19 language isolate vm json benchmark_smoke dartdoc utils pub lib"));
        assert!(slow.lines[2].ends_with("-j1 dart2js_extra dart2js_native"));

        let unsharded = run_bot(&env, "web-ie-win8", RecordingRunner::default(), paths());
        assert_eq!(unsharded.lines.len(), 3);
    }

    #[test]
    fn test_clobber_step() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("out/DebugIA32")).unwrap();
        fs::create_dir_all(dir.path().join("out/ReleaseIA32")).unwrap();
        let env = linux().with_var(BUILDER_CLOBBER, "1");

        let run = run_bot(&env, "dart2js-linux-debug", RecordingRunner::default(), StepPaths::new(dir.path()));
        assert_eq!(run.status, 0);
        assert!(run.log.contains("@@@BUILD_STEP Clobber@@@\nClobbering debug\nDeleting "));
        assert!(!dir.path().join("out/DebugIA32").exists());
        assert!(dir.path().join("out/ReleaseIA32").exists());
    }

    #[test]
    fn test_firefox_profiles_cleaned() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("tmpA1b2")).unwrap();
        fs::create_dir_all(dir.path().join("keep")).unwrap();
        fs::write(dir.path().join("tmpfile"), "").unwrap();
        let mut paths = paths();
        paths.firefox_profile_dirs = vec![dir.path().to_path_buf()];

        run_bot(&linux(), "web-ff-linux", RecordingRunner::default(), paths);
        assert!(!dir.path().join("tmpA1b2").exists());
        assert!(dir.path().join("keep").exists());
        assert!(dir.path().join("tmpfile").exists());
    }
}
