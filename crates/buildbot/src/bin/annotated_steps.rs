//! annotated_steps: run the CI steps for this bot

use anyhow::{Context, Result};
use buildbot::client::ClientSteps;
use buildbot::clobber::{clean_output_directory, ClobberOptions};
use buildbot::steps::{Dart2JsSteps, StepPaths};
use buildbot::{Annotator, BotEnv, BotError, BuildInfo, SystemRunner};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// The name of the buildbot you would like to emulate (ex: web-chrome-win7)
    #[arg(short, long, global = true)]
    name: Option<String>,

    /// Root of the dart checkout
    #[arg(long, global = true, default_value = ".")]
    dart_root: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// dart2js and browser bot steps (default)
    Dart2js,
    /// Editor and client bot steps
    Client,
    /// Delete build output directories
    Clobber {
        /// Build variants (comma-separated): all, debug, release
        #[arg(short, long, default_value = "all")]
        mode: String,
        /// Target architectures (comma-separated): all, ia32, x64, simarm, arm
        #[arg(long, default_value = "all")]
        arch: String,
        /// Target OSs (comma-separated): all, host, android
        #[arg(long, default_value = "all")]
        os: String,
    },
}

fn run(cli: Cli, env: BotEnv) -> Result<i32> {
    match cli.command.unwrap_or(Command::Dart2js) {
        Command::Dart2js => {
            let info = match BuildInfo::resolve(&env, cli.name.as_deref()) {
                Ok(Some(info)) => info,
                Ok(None) => {
                    println!("compiler: None, runtime: None mode: None, system: None, option: None");
                    return Ok(1);
                }
                Err(e @ (BotError::MissingBuilderName | BotError::PlatformMismatch { .. })) => {
                    println!("{e}");
                    return Ok(1);
                }
                Err(e) => return Err(e.into()),
            };
            let paths = StepPaths::new(&cli.dart_root);
            let mut steps = Dart2JsSteps::new(&env, &info, paths, SystemRunner, Annotator::stdout());
            steps.run().context("Running dart2js steps")
        }
        Command::Client => {
            let mut steps = ClientSteps::new(&env, &cli.dart_root, SystemRunner, Annotator::stdout());
            steps.run().context("Running client steps")
        }
        Command::Clobber { mode, arch, os } => {
            let options = match ClobberOptions::parse(&mode, &arch, &os, env.host) {
                Ok(options) => options,
                Err(e) => {
                    println!("{e}");
                    return Ok(1);
                }
            };
            for path in clean_output_directory(&cli.dart_root, &options, env.host) {
                println!("Deleting {}", path.display());
            }
            Ok(0)
        }
    }
}

fn main() {
    // Logs go to stderr; stdout carries the step markers
    let filter = EnvFilter::try_from_env("BUILDBOT_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let code = match run(cli, BotEnv::from_env()) {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            1
        }
    };
    process::exit(code);
}
