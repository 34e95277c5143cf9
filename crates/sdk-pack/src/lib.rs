//! # sdk-pack
//!
//! Assembles the `dart-sdk` directory from a dart checkout and its build
//! output: the VM and scripts under `bin/`, the embedding headers, the core
//! libraries with the dart:io runtime sources rewired, the bundled packages,
//! the analyzer and pub.
//!
//! ```no_run
//! use sdk_pack::{create_sdk, SdkLayout, TargetOs};
//!
//! let layout = SdkLayout::new("/src/dart", "out/ReleaseIA32", TargetOs::current())
//!     .with_revision(Some("13987".to_string()));
//! create_sdk(&layout, "/src/dart/out/ReleaseIA32/dart-sdk".as_ref())?;
//! # Ok::<(), sdk_pack::PackError>(())
//! ```

pub mod error;
pub mod fsops;
pub mod gypi;
pub mod layout;
pub mod revision;

pub use error::{PackError, PackResult};
pub use layout::{create_sdk, PackReport, SdkLayout, Step, TargetOs};
pub use revision::detect_revision;
