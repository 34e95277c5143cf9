//! Annotated build steps for the dart CI bots
//!
//! The bot name selects what to build and test. Steps are announced with
//! `@@@BUILD_STEP ...@@@` markers on stdout and run strictly one after
//! another; the first failing step ends the run and its exit code is the
//! bot's exit code.
//!
//! - [`steps`]: dart2js and browser bots
//! - [`client`]: editor and client bots
//! - [`clobber`]: output directory cleaning

pub mod annotator;
pub mod builder;
pub mod client;
pub mod clobber;
pub mod env;
pub mod error;
pub mod runner;
pub mod steps;

pub use annotator::Annotator;
pub use builder::BuildInfo;
pub use env::{BotEnv, HostOs};
pub use error::{BotError, BotResult};
pub use runner::{CommandRunner, CommandSpec, SystemRunner};
