//! create_sdk: build the dart-sdk directory

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use sdk_pack::{create_sdk, detect_revision, SdkLayout, TargetOs};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Os {
    Linux,
    Macos,
    Win32,
}

impl From<Os> for TargetOs {
    fn from(os: Os) -> Self {
        match os {
            Os::Linux => TargetOs::Linux,
            Os::Macos => TargetOs::MacOs,
            Os::Win32 => TargetOs::Win32,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Where to create the SDK; its parent is the build directory
    sdk: PathBuf,

    /// Root of the dart checkout
    #[arg(long, default_value = ".")]
    home: PathBuf,

    /// Revision to stamp into the SDK (default: BUILDBOT_REVISION or svn info)
    #[arg(long)]
    revision: Option<String>,

    /// Target OS (default: the host)
    #[arg(long, value_enum)]
    os: Option<Os>,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_env("SDK_PACK_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let build_dir = cli
        .sdk
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let os = cli.os.map(TargetOs::from).unwrap_or_else(TargetOs::current);
    let revision = detect_revision(&cli.home, cli.revision);
    if revision.is_none() {
        info!("revision unknown, SDK will not be stamped");
    }

    let layout = SdkLayout::new(&cli.home, build_dir, os).with_revision(revision);
    let report = create_sdk(&layout, &cli.sdk)
        .with_context(|| format!("Creating SDK at {}", cli.sdk.display()))?;
    info!(steps = report.steps, "SDK ready at {}", report.sdk.display());
    Ok(())
}
