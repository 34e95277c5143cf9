//! SDK layout
//!
//! ```text
//! dart-sdk/
//!   bin/      dart[.exe], dart.lib (windows), dart_analyzer, dart2js, dartdoc, pub
//!   include/  dart_api.h, dart_debugger_api.h
//!   lib/      _internal, compiler, core, html, io, ...
//!   pkg/      args, dartdoc, htmlescape, intl, logging, unittest
//!   util/     analyzer (linux, macos), pub
//!   revision
//!   create.stamp
//! ```
//!
//! [`SdkLayout::plan`] turns the static lists below into a sequence of
//! [`Step`]s relative to a staging directory; [`create_sdk`] runs them and
//! moves the result into place.

use crate::error::PackResult;
use crate::fsops::{copy_file, copy_tree, replace_in_file, touch, Substitution};
use crate::gypi::load_io_sources;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Libraries copied into `lib/`
pub const LIBRARIES: &[&str] = &[
    "_internal",
    "compiler",
    "html",
    "core",
    "coreimpl",
    "crypto",
    "isolate",
    "json",
    "math",
    "mirrors",
    "uri",
    "utf",
];

/// Packages copied into `pkg/`
pub const PACKAGES: &[&str] = &["args", "htmlescape", "dartdoc", "intl", "logging", "unittest"];

const LIBRARY_IGNORES: &[&str] = &["*.svn", "doc", "*.py", "*.gypi", "*.sh"];
const PACKAGE_IGNORES: &[&str] = &["*.svn", "doc", "docs", "*.py", "*.gypi", "*.sh"];
const PUB_IGNORES: &[&str] = &[".svn", "sdk"];

/// Third party jars the analyzer needs, relative to `util/analyzer`
const ANALYZER_JARS: &[&str] = &[
    "args4j/2.0.12/args4j-2.0.12.jar",
    "guava/r09/guava-r09.jar",
    "json/r2_20080312/json.jar",
];

/// Host the SDK is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetOs {
    Linux,
    MacOs,
    Win32,
    Other,
}

impl TargetOs {
    pub fn current() -> Self {
        match std::env::consts::OS {
            "linux" => Self::Linux,
            "macos" => Self::MacOs,
            "windows" => Self::Win32,
            _ => Self::Other,
        }
    }

    pub fn executable_extension(self) -> &'static str {
        if self == Self::Win32 {
            ".exe"
        } else {
            ""
        }
    }

    pub fn script_extension(self) -> &'static str {
        if self == Self::Win32 {
            ".bat"
        } else {
            ""
        }
    }

    /// The analyzer is only packaged where its prerequisites are installed
    pub fn ships_analyzer(self) -> bool {
        matches!(self, Self::Linux | Self::MacOs)
    }
}

/// One packaging operation; destinations are relative to the SDK root
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    CreateDir(PathBuf),
    CopyFile { from: PathBuf, to: PathBuf },
    CopyTree {
        from: PathBuf,
        to: PathBuf,
        ignore: &'static [&'static str],
    },
    Replace {
        file: PathBuf,
        substitutions: Vec<Substitution>,
    },
    Append { file: PathBuf, text: String },
}

/// Inputs of an SDK build
#[derive(Debug, Clone)]
pub struct SdkLayout {
    /// Root of the dart checkout
    pub home: PathBuf,
    /// Build output holding the VM, dart2js scripts and the analyzer
    pub build_dir: PathBuf,
    pub os: TargetOs,
    pub revision: Option<String>,
}

impl SdkLayout {
    pub fn new(home: impl Into<PathBuf>, build_dir: impl Into<PathBuf>, os: TargetOs) -> Self {
        let home = home.into();
        let build_dir = home.join(build_dir.into());
        Self {
            home,
            build_dir,
            os,
            revision: None,
        }
    }

    pub fn with_revision(mut self, revision: Option<String>) -> Self {
        self.revision = revision;
        self
    }

    /// The dart:io sources list of the checkout
    pub fn io_sources_file(&self) -> PathBuf {
        self.home.join("runtime").join("bin").join("io_sources.gypi")
    }

    /// Every step of the build, in order
    pub fn plan(&self, io_sources: &[String]) -> Vec<Step> {
        let mut steps = Vec::new();
        self.plan_bin(&mut steps);
        self.plan_include(&mut steps);
        self.plan_io(&mut steps, io_sources);
        self.plan_libraries(&mut steps);
        self.plan_util(&mut steps);
        self.plan_dart2js(&mut steps);
        steps
    }

    fn plan_bin(&self, steps: &mut Vec<Step>) {
        let exe = self.os.executable_extension();
        let script = self.os.script_extension();
        steps.push(Step::CreateDir("bin".into()));
        if self.os == TargetOs::Win32 {
            steps.push(Step::CopyFile {
                from: self.build_dir.join("dart.lib"),
                to: "bin/dart.lib".into(),
            });
        }
        steps.push(Step::CopyFile {
            from: self.build_dir.join(format!("dart{exe}")),
            to: format!("bin/dart{exe}").into(),
        });
        if self.os.ships_analyzer() {
            steps.push(Step::CopyFile {
                from: self.analyzer_home().join("bin").join("dart_analyzer"),
                to: format!("bin/dart_analyzer{script}").into(),
            });
        }
        steps.push(Step::CopyFile {
            from: self.home.join("utils").join("pub").join("sdk").join(format!("pub{script}")),
            to: format!("bin/pub{script}").into(),
        });
    }

    fn plan_include(&self, steps: &mut Vec<Step>) {
        steps.push(Step::CreateDir("include".into()));
        for header in ["dart_api.h", "dart_debugger_api.h"] {
            steps.push(Step::CopyFile {
                from: self.home.join("runtime").join("include").join(header),
                to: Path::new("include").join(header),
            });
        }
    }

    /// `lib/io`: `io.dart` becomes `io_runtime.dart`, which then sources
    /// every other runtime file
    fn plan_io(&self, steps: &mut Vec<Step>, io_sources: &[String]) {
        steps.push(Step::CreateDir("lib/io/runtime".into()));
        let runtime_bin = self.home.join("runtime").join("bin");
        for source in io_sources {
            let to = if source == "io.dart" {
                PathBuf::from("lib/io/io_runtime.dart")
            } else {
                Path::new("lib/io/runtime").join(source)
            };
            steps.push(Step::CopyFile {
                from: runtime_bin.join(source),
                to,
            });
        }
        let directives: String = io_sources
            .iter()
            .filter(|s| s.as_str() != "io.dart")
            .map(|s| format!("#source(\"runtime/{s}\");\n"))
            .collect();
        steps.push(Step::Append {
            file: "lib/io/io_runtime.dart".into(),
            text: directives,
        });
    }

    fn plan_libraries(&self, steps: &mut Vec<Step>) {
        for library in LIBRARIES {
            steps.push(Step::CopyTree {
                from: self.home.join("lib").join(library),
                to: Path::new("lib").join(library),
                ignore: LIBRARY_IGNORES,
            });
        }
        steps.push(Step::Replace {
            file: "lib/compiler/implementation/lib/io.dart".into(),
            substitutions: vec![Substitution::new("../../runtime/bin", "../io/runtime")],
        });

        steps.push(Step::CreateDir("pkg".into()));
        for package in PACKAGES {
            steps.push(Step::CopyTree {
                from: self.home.join("pkg").join(package),
                to: Path::new("pkg").join(package),
                ignore: PACKAGE_IGNORES,
            });
        }
        steps.push(Step::Replace {
            file: "pkg/dartdoc/dartdoc.dart".into(),
            substitutions: vec![Substitution::new("final bool IN_SDK = false;", "final bool IN_SDK = true;")],
        });
    }

    fn plan_util(&self, steps: &mut Vec<Step>) {
        steps.push(Step::CreateDir("util".into()));
        if self.os.ships_analyzer() {
            let analyzer = self.analyzer_home().join("util").join("analyzer");
            steps.push(Step::CopyFile {
                from: analyzer.join("dart_analyzer.jar"),
                to: "util/analyzer/dart_analyzer.jar".into(),
            });
            for jar in ANALYZER_JARS {
                steps.push(Step::CopyFile {
                    from: analyzer.join(jar),
                    to: Path::new("util/analyzer").join(jar),
                });
            }
        }
        steps.push(Step::CopyTree {
            from: self.home.join("utils").join("pub"),
            to: "util/pub".into(),
            ignore: PUB_IGNORES,
        });
    }

    fn plan_dart2js(&self, steps: &mut Vec<Step>) {
        if let Some(revision) = &self.revision {
            steps.push(Step::Replace {
                file: "lib/compiler/implementation/compiler.dart".into(),
                substitutions: vec![Substitution::new(
                    "BUILD_ID = 'build number could not be determined'",
                    format!("BUILD_ID = '{revision}'"),
                )],
            });
        }
        let script = self.os.script_extension();
        let (pattern, replacement) = if self.os == TargetOs::Win32 {
            (r"%SCRIPTPATH%\.\.\\lib", r"%SCRIPTPATH%..\lib")
        } else {
            (r"\$BIN_DIR/\.\./\.\./lib", "$BIN_DIR/../lib")
        };
        steps.push(Step::CopyFile {
            from: self.build_dir.join(format!("dart2js{script}")),
            to: format!("bin/dart2js{script}").into(),
        });
        steps.push(Step::Replace {
            file: format!("bin/dart2js{script}").into(),
            substitutions: vec![Substitution::new(pattern, replacement)],
        });
        steps.push(Step::CopyFile {
            from: self.build_dir.join(format!("dartdoc{script}")),
            to: format!("bin/dartdoc{script}").into(),
        });
    }

    fn analyzer_home(&self) -> PathBuf {
        self.build_dir.join("analyzer")
    }
}

/// Run `steps` below `root`
pub fn execute(steps: &[Step], root: &Path) -> PackResult<()> {
    for step in steps {
        debug!(?step, "step");
        match step {
            Step::CreateDir(dir) => fs::create_dir_all(root.join(dir))?,
            Step::CopyFile { from, to } => copy_file(from, &root.join(to))?,
            Step::CopyTree { from, to, ignore } => {
                copy_tree(from, &root.join(to), ignore)?;
            }
            Step::Replace { file, substitutions } => replace_in_file(&root.join(file), substitutions)?,
            Step::Append { file, text } => {
                let mut handle = OpenOptions::new().create(true).append(true).open(root.join(file))?;
                handle.write_all(text.as_bytes())?;
            }
        }
    }
    Ok(())
}

/// Summary of [`create_sdk`]
#[derive(Debug)]
pub struct PackReport {
    pub sdk: PathBuf,
    pub steps: usize,
    pub revision: Option<String>,
}

/// Build the SDK at `sdk`
///
/// Everything is assembled in a temporary directory next to `sdk` and
/// renamed into place, so a failed build leaves no partial SDK behind.
pub fn create_sdk(layout: &SdkLayout, sdk: &Path) -> PackResult<PackReport> {
    let io_sources = load_io_sources(&layout.io_sources_file())?;
    let steps = layout.plan(&io_sources);

    let parent = match sdk.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)?;
    if sdk.exists() {
        fs::remove_dir_all(sdk)?;
    }
    let staging = tempfile::Builder::new().prefix(".dart-sdk-").tempdir_in(&parent)?;

    execute(&steps, staging.path())?;
    if let Some(revision) = &layout.revision {
        fs::write(staging.path().join("revision"), format!("{revision}\n"))?;
    }

    fs::rename(staging.path(), sdk)?;
    touch(&sdk.join("create.stamp"))?;

    info!(sdk = %sdk.display(), steps = steps.len(), revision = ?layout.revision, "created SDK");
    Ok(PackReport {
        sdk: sdk.to_path_buf(),
        steps: steps.len(),
        revision: layout.revision.clone(),
    })
}
