use std::collections::BTreeMap;
use std::thread;
use std::time::Instant;

use tracing::{info, warn};

use tablegen_core::TableDef;

use crate::context::GenerationContext;
use crate::errors::{CodegenError, CodegenResult};
use crate::manifest::{OutputFile, OutputFileManifest};
use crate::target::{CodeTarget, TargetRegistry};

/// One artifact of a target run.
#[derive(Debug, Clone, Copy)]
enum GenerationUnit<'a> {
    Manifest,
    Table(&'a TableDef),
}

impl GenerationUnit<'_> {
    fn label(&self) -> String {
        match self {
            GenerationUnit::Manifest => "manifest".to_string(),
            GenerationUnit::Table(table) => table.full_name(),
        }
    }

    fn generate(
        &self,
        target: &dyn CodeTarget,
        ctx: &GenerationContext<'_>,
    ) -> CodegenResult<OutputFile> {
        let (path, body) = match self {
            GenerationUnit::Manifest => (
                target.manifest_file(ctx),
                target.generate_manifest(ctx, ctx.export_tables())?,
            ),
            GenerationUnit::Table(table) => {
                (target.table_file(table), target.generate_one(ctx, table)?)
            }
        };
        let header = target.file_header();
        let content = if header.is_empty() {
            body
        } else {
            format!("{header}{body}")
        };
        Ok(OutputFile { path, content })
    }
}

/// Generate every artifact of `target` and append them to `manifest`.
///
/// The manifest artifact and one artifact per export table are generated
/// concurrently. All units are joined before anything is appended; if any
/// unit fails or panics the manifest is left untouched and the first
/// failure in task order is returned. Files are appended in task order
/// (manifest first, then tables in export order), whatever order the
/// units finish in. Two units resolving to the same path also fail the run.
pub fn run_target(
    target: &dyn CodeTarget,
    ctx: &GenerationContext<'_>,
    manifest: &mut OutputFileManifest,
) -> CodegenResult<()> {
    let start = Instant::now();
    let tasks: Vec<GenerationUnit<'_>> = std::iter::once(GenerationUnit::Manifest)
        .chain(ctx.export_tables().iter().map(|table| GenerationUnit::Table(*table)))
        .collect();

    info!(code_target = target.name(), units = tasks.len(), "generation begin");

    let results: Vec<CodegenResult<OutputFile>> = thread::scope(|scope| {
        let workers: Vec<_> = tasks
            .iter()
            .map(|task| scope.spawn(move || task.generate(target, ctx)))
            .collect();
        workers
            .into_iter()
            .zip(&tasks)
            .map(|(worker, task)| match worker.join() {
                Ok(Ok(file)) => Ok(file),
                Ok(Err(source)) => Err(CodegenError::UnitFailed {
                    unit: task.label(),
                    source: Box::new(source),
                }),
                Err(_) => Err(CodegenError::UnitPanicked(task.label())),
            })
            .collect()
    });

    let files = match results
        .into_iter()
        .collect::<CodegenResult<Vec<_>>>()
        .and_then(|files| check_unique_paths(&tasks, files))
    {
        Ok(files) => files,
        Err(err) => {
            warn!(code_target = target.name(), error = %err, "generation failed");
            return Err(err);
        }
    };

    let count = files.len();
    for file in files {
        manifest.add_file(file);
    }

    info!(
        code_target = target.name(),
        files = count,
        duration_ms = start.elapsed().as_millis() as u64,
        "generation end"
    );
    Ok(())
}

fn check_unique_paths(
    tasks: &[GenerationUnit<'_>],
    files: Vec<OutputFile>,
) -> CodegenResult<Vec<OutputFile>> {
    let mut seen: BTreeMap<&str, &GenerationUnit<'_>> = BTreeMap::new();
    for (file, task) in files.iter().zip(tasks) {
        if let Some(first) = seen.insert(file.path.as_str(), task) {
            return Err(CodegenError::DuplicateOutputPath {
                path: file.path.clone(),
                first: first.label(),
                second: task.label(),
            });
        }
    }
    Ok(files)
}

/// Run each named target against the same context, one manifest per target.
pub fn run_targets(
    registry: &TargetRegistry,
    names: &[String],
    ctx: &GenerationContext<'_>,
) -> CodegenResult<Vec<OutputFileManifest>> {
    names
        .iter()
        .map(|name| {
            let target = registry.get(name)?;
            let mut manifest = OutputFileManifest::new(target.name());
            run_target(target, ctx, &mut manifest)?;
            Ok(manifest)
        })
        .collect()
}
