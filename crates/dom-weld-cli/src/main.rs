//! dartdomgen: generate the dart:html libraries from the IDL database

use anyhow::{Context, Result};
use clap::Parser;
use dom_weld::config::CONFIG_FILE;
use dom_weld::{apply_webcomponents_shim, generate_bindings, GeneratorConfig};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Systems to generate (htmldart2js, htmldartium)
    #[arg(long, value_delimiter = ',')]
    systems: Option<Vec<String>>,

    /// Directory to put the generated files
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// IDL database file or directory
    #[arg(long)]
    database: Option<PathBuf>,

    /// Configuration file
    #[arg(long, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Template search root, may be repeated
    #[arg(long = "template-dir")]
    template_dirs: Vec<PathBuf>,

    /// Fail on IDL types neither the type table nor the database knows
    #[arg(long)]
    strict_types: bool,

    /// Publicize html_dart2js.dart implementation classes and append this file
    #[arg(long, value_name = "EXTRA_CODE")]
    webcomponents_shim: Option<PathBuf>,
}

impl Cli {
    /// Configuration file values with command line overrides applied
    fn config(&self) -> Result<GeneratorConfig> {
        let mut config = GeneratorConfig::load_or_default(&self.config)
            .with_context(|| format!("Reading {}", self.config.display()))?;
        if let Some(systems) = &self.systems {
            config.systems = systems.clone();
        }
        if let Some(output_dir) = &self.output_dir {
            config.output_dir = output_dir.clone();
        }
        if let Some(database) = &self.database {
            config.database = database.clone();
        }
        if !self.template_dirs.is_empty() {
            config.template_dirs = self.template_dirs.clone();
        }
        config.strict_types |= self.strict_types;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_env("DOMWELD_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = cli.config()?;

    let report = generate_bindings(&config)
        .with_context(|| format!("Generating from {}", config.database.display()))?;
    info!(
        systems = ?report.systems,
        interfaces = report.interfaces,
        written = report.written.len(),
        unchanged = report.unchanged,
        "done"
    );

    if let Some(extra) = &cli.webcomponents_shim {
        let library = config.output_dir.join("html_dart2js.dart");
        apply_webcomponents_shim(&library, extra)
            .with_context(|| format!("Applying web components shim to {}", library.display()))?;
    }
    Ok(())
}
