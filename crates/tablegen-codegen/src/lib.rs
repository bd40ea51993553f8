//! Code generation for tablegen.
//!
//! A [`GenerationContext`] holds the resolved export closure and the table
//! data of one run; [`CodeTarget`]s turn it into files, and
//! [`run_target`] fans their generation units out across threads.

pub mod context;
pub mod errors;
pub mod manifest;
pub mod options;
pub mod orchestrator;
pub mod style;
pub mod target;
pub mod template;

pub use context::{GenerationContext, TagFilter, TargetConfig};
pub use errors::{CodegenError, CodegenResult};
pub use manifest::{OutputFile, OutputFileManifest};
pub use options::{EnvOptions, keys};
pub use orchestrator::{run_target, run_targets};
pub use style::{CodeStyle, NamingConvention};
pub use target::{CodeTarget, JsonDataTarget, RustJsonTarget, TargetRegistry, file_stem};
pub use template::TemplateRenderer;
