//! Binding generation driver
//!
//! Loads the database, applies the WebKit type renames and runs each
//! configured system into one shared [`Emitter`], which is flushed once all
//! systems are done.

use crate::config::{GeneratorConfig, DART2JS_SYSTEM, DARTIUM_SYSTEM};
use crate::emitter::Emitter;
use crate::error::{WeldError, WeldResult};
use crate::idl::IdlDatabase;
use crate::renamer::HtmlRenamer;
use crate::systems::{generate, Backend, HtmlDart2JsBackend, HtmlInterfacesSystem, NativeBackend, SystemOptions};
use crate::templates::TemplateLoader;
use crate::types::TypeRegistry;
use std::path::PathBuf;
use tracing::{debug, info};

/// W3C names the database uses for types WebKit still calls by older names
pub static WEBKIT_RENAMES: &[(&str, &str)] = &[
    ("ApplicationCache", "DOMApplicationCache"),
    ("BarProp", "BarInfo"),
    ("DedicatedWorkerGlobalScope", "DedicatedWorkerContext"),
    ("FormData", "DOMFormData"),
    ("Selection", "DOMSelection"),
    ("SharedWorkerGlobalScope", "SharedWorkerContext"),
    ("Window", "DOMWindow"),
    ("WorkerGlobalScope", "WorkerContext"),
];

const INTERFACE_SUBPATHS: &[&str] = &["html/interface", "html/impl", "html", ""];
const DART2JS_SUBPATHS: &[&str] = &["html/dart2js", "html/impl", "html", ""];
const DARTIUM_SUBPATHS: &[&str] = &["dom/native", "html/dartium", "html/impl", ""];

/// Summary of a generator run
#[derive(Debug, Default)]
pub struct GenerationReport {
    pub systems: Vec<String>,
    pub interfaces: usize,
    pub written: Vec<PathBuf>,
    pub unchanged: usize,
}

/// Load the configured database and generate every configured system
pub fn generate_bindings(config: &GeneratorConfig) -> WeldResult<GenerationReport> {
    let database = IdlDatabase::load(&config.database)?;
    generate_from_database(database, config)
}

/// Generate every configured system from an already loaded database
pub fn generate_from_database(mut database: IdlDatabase, config: &GeneratorConfig) -> WeldResult<GenerationReport> {
    if let Some(unknown) = config
        .systems
        .iter()
        .find(|name| !matches!(name.as_str(), DART2JS_SYSTEM | DARTIUM_SYSTEM))
    {
        return Err(WeldError::UnknownSystem(unknown.clone()));
    }

    database.rename_types(WEBKIT_RENAMES);
    let database = database;

    let mut emitter = Emitter::new();
    for system_name in &config.systems {
        run_system(&database, config, system_name, &mut emitter)?;
    }

    info!("Flush...");
    let flushed = emitter.flush()?;
    info!(
        written = flushed.written.len(),
        unchanged = flushed.unchanged,
        "generated bindings"
    );
    Ok(GenerationReport {
        systems: config.systems.clone(),
        interfaces: database.len(),
        written: flushed.written,
        unchanged: flushed.unchanged,
    })
}

fn run_system(database: &IdlDatabase, config: &GeneratorConfig, system_name: &str, emitter: &mut Emitter) -> WeldResult<()> {
    let renamer = HtmlRenamer::with_overrides(database, &config.renames);
    let types = TypeRegistry::new(database).with_renamer(&renamer);

    if config.strict_types {
        let unknown = types.unregistered_types();
        if !unknown.is_empty() {
            return Err(WeldError::UnknownType(unknown.join(", ")));
        }
    }

    let options = |subpaths: &[&str], conditions: &[(&str, bool)]| SystemOptions {
        templates: TemplateLoader::new(config.template_dirs.clone(), subpaths, conditions),
        database,
        types: &types,
        renamer: &renamer,
        output_dir: config.output_dir.clone(),
    };

    let backend: Box<dyn Backend<'_> + '_> = if system_name == DART2JS_SYSTEM {
        Box::new(HtmlDart2JsBackend::new(options(
            DART2JS_SUBPATHS,
            &[("DARTIUM", false), ("DART2JS", true)],
        )))
    } else {
        Box::new(
            NativeBackend::new(
                options(DARTIUM_SUBPATHS, &[("DARTIUM", true), ("DART2JS", false)]),
                config.auxiliary_dir.clone(),
            )
            .with_partitions(config.derived_sources_partitions),
        )
    };

    info!(system = system_name, "generating");
    let mut system = HtmlInterfacesSystem::new(options(INTERFACE_SUBPATHS, &[]), backend);
    generate(database, &mut system, emitter)?;
    debug!(system = system_name, files = emitter.file_paths().count(), "system done");
    Ok(())
}
