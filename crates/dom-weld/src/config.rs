//! Generator configuration from `domweld.toml`
//!
//! Every field is optional; command line flags are layered on top by the
//! binary.

use crate::error::WeldResult;
use crate::renamer::RenameOverrides;
use crate::systems::DEFAULT_DERIVED_SOURCES_PARTITIONS;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default configuration file name
pub const CONFIG_FILE: &str = "domweld.toml";

/// System names understood by the driver
pub const DART2JS_SYSTEM: &str = "htmldart2js";
pub const DARTIUM_SYSTEM: &str = "htmldartium";

/// Driver configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Systems to run, in order
    pub systems: Vec<String>,
    /// IDL database file or directory
    pub database: PathBuf,
    /// Root of the generated tree
    pub output_dir: PathBuf,
    /// Template search roots, tried before the built-in templates
    pub template_dirs: Vec<PathBuf>,
    /// Hand-written dartium sources referenced by `html_dartium.dart`
    pub auxiliary_dir: PathBuf,
    pub derived_sources_partitions: usize,
    /// Reject IDL types that neither the type table nor the database knows
    pub strict_types: bool,
    pub renames: RenameOverrides,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            systems: vec![DART2JS_SYSTEM.to_string(), DARTIUM_SYSTEM.to_string()],
            database: PathBuf::from("database"),
            output_dir: PathBuf::from("generated"),
            template_dirs: Vec::new(),
            auxiliary_dir: PathBuf::from("src"),
            derived_sources_partitions: DEFAULT_DERIVED_SOURCES_PARTITIONS,
            strict_types: false,
            renames: RenameOverrides::default(),
        }
    }
}

impl GeneratorConfig {
    /// Parse a configuration document
    pub fn parse(text: &str) -> WeldResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read a configuration file
    ///
    /// Relative paths in the file are resolved against its directory.
    pub fn load(path: &Path) -> WeldResult<Self> {
        let text = fs::read_to_string(path)?;
        let mut config = Self::parse(&text)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        debug!(path = %path.display(), systems = ?config.systems, "loaded configuration");
        Ok(config)
    }

    /// Read `path` if it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> WeldResult<Self> {
        if path.is_file() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn with_systems(mut self, systems: Vec<String>) -> Self {
        self.systems = systems;
        self
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn with_database(mut self, database: impl Into<PathBuf>) -> Self {
        self.database = database.into();
        self
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };
        resolve(&mut self.database);
        resolve(&mut self.output_dir);
        resolve(&mut self.auxiliary_dir);
        self.template_dirs.iter_mut().for_each(resolve);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = GeneratorConfig::parse("").unwrap();
        assert_eq!(config.systems, vec!["htmldart2js", "htmldartium"]);
        assert_eq!(config.derived_sources_partitions, 20);
        assert!(!config.strict_types);
        assert!(config.renames.members.is_empty());
    }

    #[test]
    fn test_parse_full() {
        let config = GeneratorConfig::parse(
            r#"
systems = ["htmldart2js"]
database = "idl/db.json"
output_dir = "out"
derived_sources_partitions = 4
strict_types = true

[renames]
removed = ["Node.normalize"]

[renames.members]
"Document.querySelector" = "query"

[renames.interfaces]
WebKitPoint = "Point"
"#,
        )
        .unwrap();
        assert_eq!(config.systems, vec!["htmldart2js"]);
        assert_eq!(config.database, PathBuf::from("idl/db.json"));
        assert_eq!(config.derived_sources_partitions, 4);
        assert!(config.strict_types);
        assert_eq!(config.renames.removed, vec!["Node.normalize"]);
        assert_eq!(config.renames.members["Document.querySelector"], "query");
        assert_eq!(config.renames.interfaces["WebKitPoint"], "Point");
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(GeneratorConfig::parse("sytems = []").is_err());
    }

    #[test]
    fn test_load_resolves_relative_paths() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "database = \"db\"\ntemplate_dirs = [\"t\", \"/abs\"]\n").unwrap();

        let config = GeneratorConfig::load(&path).unwrap();
        assert_eq!(config.database, dir.path().join("db"));
        assert_eq!(config.output_dir, dir.path().join("generated"));
        assert_eq!(config.template_dirs, vec![dir.path().join("t"), PathBuf::from("/abs")]);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempdir().unwrap();
        let config = GeneratorConfig::load_or_default(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("generated"));
    }
}
