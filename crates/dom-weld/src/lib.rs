//! dom-weld: Dart DOM bindings from an IDL database
//!
//! The generator reads a pre-parsed IDL database (JSON), resolves IDL types
//! through a [`TypeRegistry`] and drives one or more generator systems over
//! every interface. Systems write text through an [`Emitter`] whose
//! templates expose named holes; the emitter is flushed once at the end and
//! leaves unchanged files alone.
//!
//! # Systems
//!
//! - `htmldart2js`: dart:html interfaces plus `_XImpl` classes bound to
//!   JavaScript objects with native specs.
//! - `htmldartium`: dart:html interfaces plus Dart implementation classes
//!   backed by C++ native callbacks, the per-interface C++ glue and the
//!   resolver.
//!
//! # Example
//!
//! ```no_run
//! use dom_weld::{generate_bindings, GeneratorConfig};
//! use std::path::Path;
//!
//! let config = GeneratorConfig::load_or_default(Path::new("domweld.toml"))?
//!     .with_output_dir("generated");
//! let report = generate_bindings(&config)?;
//! println!("{} files written", report.written.len());
//! # Ok::<(), dom_weld::WeldError>(())
//! ```

pub mod analysis;
pub mod config;
pub mod dom;
pub mod emitter;
pub mod error;
pub mod generator;
pub mod html;
pub mod idl;
pub mod renamer;
pub mod shim;
pub mod systems;
pub mod templates;
pub mod types;

pub use config::GeneratorConfig;
pub use emitter::{Emitter, FlushReport};
pub use error::{WeldError, WeldResult};
pub use generator::{generate_bindings, generate_from_database, GenerationReport, WEBKIT_RENAMES};
pub use idl::IdlDatabase;
pub use renamer::{HtmlRenamer, RenameOverrides};
pub use shim::apply_webcomponents_shim;
pub use templates::TemplateLoader;
pub use types::TypeRegistry;
