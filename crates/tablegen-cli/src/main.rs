mod config;
mod output;
mod registry;

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use thiserror::Error;
use uuid::Uuid;

use config::{DEFAULT_CONFIG_FILE, TablegenConfig, load_config};
use output::{OutputError, write_json_atomic, write_manifest};
use registry::{RunContext, RunSummary, TargetSummary, init_logging, start_run, write_summary};
use tablegen_codegen::{
    CodegenError, EnvOptions, GenerationContext, OutputFileManifest, TargetRegistry, run_targets,
};
use tablegen_core::{Error as CoreError, SCHEMA_VERSION, TypeGraph, TypeGraphDocument};
use tablegen_data::JsonDirLoader;

#[derive(Debug, Error)]
enum CliError {
    #[error("registry error: {0}")]
    Registry(#[from] registry::RegistryError),
    #[error("output error: {0}")]
    Output(#[from] OutputError),
    #[error("schema error: {0}")]
    Core(#[from] CoreError),
    #[error("generation error: {0}")]
    Codegen(#[from] CodegenError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Parser, Debug)]
#[command(name = "tablegen", version, about = "Config table code generator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate code and data for the configured code targets.
    Gen(GenArgs),
    /// List the available code targets.
    Targets,
    /// Print the JSON Schema of the type graph document.
    Schema(SchemaArgs),
}

#[derive(Args, Debug)]
struct GenArgs {
    /// Config file; optional when it is the default name.
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,
    /// Type graph document (overrides `schema` in the config file).
    #[arg(long)]
    schema: Option<PathBuf>,
    /// Target name (overrides `[target].name`).
    #[arg(long)]
    target: Option<String>,
    /// Code targets to run (replaces `[target].code_targets`).
    #[arg(long = "code-target", short = 't', value_name = "NAME")]
    code_targets: Vec<String>,
    /// Additional enabled group.
    #[arg(long = "group", value_name = "GROUP")]
    groups: Vec<String>,
    /// Table data directory.
    #[arg(long)]
    input_dir: Option<PathBuf>,
    /// Patch data directory.
    #[arg(long)]
    patch_dir: Option<PathBuf>,
    /// Additional include tag.
    #[arg(long = "include-tag", value_name = "TAG")]
    include_tags: Vec<String>,
    /// Additional exclude tag.
    #[arg(long = "exclude-tag", value_name = "TAG")]
    exclude_tags: Vec<String>,
    /// Generator option `family.key=value`.
    #[arg(long = "option", short = 'x', value_name = "FAMILY.KEY=VALUE")]
    options: Vec<String>,
    /// Fallback output root; each target writes to `<out>/<target>`.
    #[arg(long)]
    out: Option<PathBuf>,
    /// Record the run under this directory.
    #[arg(long)]
    run_dir: Option<PathBuf>,
    /// Append JSON logs to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,
    /// Generate everything but write no files.
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

#[derive(Args, Debug)]
struct SchemaArgs {
    /// Write the schema to a file instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Gen(args) => run_gen(args),
        Command::Targets => run_list_targets(),
        Command::Schema(args) => run_schema(args),
    }
}

fn run_list_targets() -> Result<(), CliError> {
    let registry = TargetRegistry::with_builtin()?;
    for name in registry.names() {
        let target = registry.get(name)?;
        println!("{name}\t.{}\t{}", target.file_suffix(), target.output_dir_key());
    }
    Ok(())
}

fn run_schema(args: SchemaArgs) -> Result<(), CliError> {
    let schema = schemars::schema_for!(TypeGraphDocument);
    match args.out {
        Some(path) => write_json_atomic(&path, &schema)?,
        None => println!("{}", serde_json::to_string_pretty(&schema)?),
    }
    Ok(())
}

/// Config file values with command-line overrides applied.
fn resolve_config(args: &GenArgs) -> Result<TablegenConfig, CliError> {
    let path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let mut config = load_config(&path, args.config.is_some())?;

    if let Some(schema) = &args.schema {
        config.schema = Some(schema.clone());
    }
    if let Some(target) = &args.target {
        config.target.name = target.clone();
    }
    if !args.code_targets.is_empty() {
        config.target.code_targets = args.code_targets.clone();
    }
    config.target.groups.extend(args.groups.iter().cloned());
    if let Some(dir) = &args.input_dir {
        config.data.input_dir = Some(dir.clone());
    }
    if let Some(dir) = &args.patch_dir {
        config.data.patch_dir = Some(dir.clone());
    }
    config.data.include_tags.extend(args.include_tags.iter().cloned());
    config.data.exclude_tags.extend(args.exclude_tags.iter().cloned());
    Ok(config)
}

fn load_graph(path: &Path) -> Result<TypeGraph, CliError> {
    let content = std::fs::read_to_string(path)?;
    let document: TypeGraphDocument = serde_json::from_str(&content)?;
    Ok(TypeGraph::from_document(document)?)
}

fn output_dir(
    ctx: &GenerationContext<'_>,
    registry: &TargetRegistry,
    manifest: &OutputFileManifest,
    out: Option<&Path>,
) -> Result<PathBuf, CliError> {
    let target = registry.get(&manifest.target_name)?;
    if let Some(dir) = ctx.output_dir(target.name(), target.output_dir_key()) {
        return Ok(PathBuf::from(dir));
    }
    out.map(|root| root.join(target.name())).ok_or_else(|| {
        CliError::InvalidConfig(format!(
            "no output directory for code target '{}': set option {}.{} or pass --out",
            target.name(),
            target.name(),
            target.output_dir_key()
        ))
    })
}

/// Resolve every output directory, then write each manifest.
///
/// A target without a directory fails the run before any file is written.
fn write_outputs(
    ctx: &GenerationContext<'_>,
    registry: &TargetRegistry,
    manifests: &[OutputFileManifest],
    out: Option<&Path>,
    dry_run: bool,
) -> Result<Vec<TargetSummary>, CliError> {
    let planned = manifests
        .iter()
        .map(|manifest| Ok((output_dir(ctx, registry, manifest, out)?, manifest)))
        .collect::<Result<Vec<_>, CliError>>()?;

    let mut targets = Vec::with_capacity(planned.len());
    for (dir, manifest) in planned {
        if !dry_run {
            write_manifest(&dir, manifest)?;
        }
        tracing::info!(
            event = "target_written",
            code_target = %manifest.target_name,
            dir = %dir.display(),
            files = manifest.len(),
            dry_run = dry_run
        );
        targets.push(TargetSummary {
            name: manifest.target_name.clone(),
            output_dir: dir.display().to_string(),
            files: manifest.len(),
            bytes: manifest.bytes(),
        });
    }
    Ok(targets)
}

fn run_gen(args: GenArgs) -> Result<(), CliError> {
    init_logging(args.log_file.as_deref())?;
    let config = resolve_config(&args)?;

    let schema_path = config.schema.clone().ok_or_else(|| {
        CliError::InvalidConfig("no schema document: set `schema` or pass --schema".to_string())
    })?;
    let input_dir = config.data.input_dir.clone().ok_or_else(|| {
        CliError::InvalidConfig("no data directory: set [data].input_dir or pass --input-dir".to_string())
    })?;
    if config.target.code_targets.is_empty() {
        return Err(CliError::InvalidConfig(
            "no code targets: set [target].code_targets or pass --code-target".to_string(),
        ));
    }

    let mut options: EnvOptions = config.options.clone().into_iter().collect();
    for assignment in &args.options {
        options.set_assignment(assignment)?;
    }

    let run_id = Uuid::new_v4().to_string();
    let started_at = chrono::Utc::now();
    let timer = Instant::now();
    tracing::info!(
        event = "run_started",
        run_id = %run_id,
        target_name = %config.target.name,
        code_targets = ?config.target.code_targets
    );

    let run_root = match &args.run_dir {
        Some(run_dir) => Some(start_run(&RunContext {
            run_id: run_id.clone(),
            started_at,
            schema_version: SCHEMA_VERSION.to_string(),
            schema_path: schema_path.clone(),
            target: config.target.name.clone(),
            code_targets: config.target.code_targets.clone(),
            run_dir: run_dir.clone(),
        })?),
        None => None,
    };

    let graph = load_graph(&schema_path)?;
    tracing::info!(event = "schema_loaded", types = graph.types().len());

    let registry = TargetRegistry::with_builtin()?;
    for name in &config.target.code_targets {
        registry.get(name)?;
    }

    let mut ctx = GenerationContext::new(
        &graph,
        config.target.target_config(),
        config.data.tag_filter(),
        options,
    )?;
    let mut loader = JsonDirLoader::new(&input_dir);
    if let Some(patch_dir) = &config.data.patch_dir {
        loader = loader.with_patch_dir(patch_dir);
    }
    ctx.load_datas(&loader)?;

    let manifests = run_targets(&registry, &config.target.code_targets, &ctx)?;

    let targets = write_outputs(&ctx, &registry, &manifests, args.out.as_deref(), args.dry_run)?;

    let duration_ms = timer.elapsed().as_millis() as u64;
    if let Some(run_root) = &run_root {
        write_summary(
            run_root,
            &RunSummary {
                run_id: run_id.clone(),
                status: "success",
                duration_ms,
                dry_run: args.dry_run,
                targets,
            },
        )?;
    }

    tracing::info!(event = "run_finished", status = "success", duration_ms = duration_ms);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_overrides_config_values() {
        let cli = Cli::parse_from([
            "tablegen",
            "gen",
            "--config",
            "missing-on-purpose.toml",
            "--schema",
            "schema.json",
            "-t",
            "json",
            "--group",
            "editor",
            "--exclude-tag",
            "dev",
            "-x",
            "json.outputDataDir=gen",
        ]);
        let Command::Gen(args) = cli.command else {
            panic!("expected gen command");
        };
        assert_eq!(args.options, vec!["json.outputDataDir=gen"]);

        // An explicit config path must exist.
        assert!(matches!(resolve_config(&args), Err(CliError::Io(_))));

        let args = GenArgs { config: None, ..args };
        let config = resolve_config(&args).expect("defaults apply without a config file");
        assert_eq!(config.schema, Some(PathBuf::from("schema.json")));
        assert_eq!(config.target.code_targets, vec!["json"]);
        assert_eq!(config.target.groups, vec!["editor"]);
        assert!(config.data.exclude_tags.contains("dev"));
    }

    #[test]
    fn missing_output_dir_writes_nothing() {
        let root = std::env::temp_dir().join(format!("tablegen_cli_{}", Uuid::new_v4()));
        let code_dir = root.join("outrs");
        let graph = TypeGraph::new(Vec::new()).expect("empty graph");
        let mut options = EnvOptions::new();
        options.set("rust-json.outputCodeDir", code_dir.display().to_string());
        let ctx = GenerationContext::new(
            &graph,
            tablegen_codegen::TargetConfig::new("client"),
            tablegen_codegen::TagFilter::default(),
            options,
        )
        .expect("context");
        let registry = TargetRegistry::with_builtin().expect("registry");

        let manifests: Vec<OutputFileManifest> = ["rust-json", "json"]
            .into_iter()
            .map(|name| {
                let mut manifest = OutputFileManifest::new(name);
                manifest.add_file(tablegen_codegen::OutputFile {
                    path: format!("tables.{name}"),
                    content: String::new(),
                });
                manifest
            })
            .collect();

        let err = write_outputs(&ctx, &registry, &manifests, None, false).unwrap_err();
        assert!(matches!(err, CliError::InvalidConfig(message) if message.contains("'json'")));
        assert!(!code_dir.exists());

        let targets = write_outputs(&ctx, &registry, &manifests, Some(&root), false)
            .expect("fallback directory");
        assert_eq!(targets.len(), 2);
        assert!(code_dir.join("tables.rust-json").exists());
        assert!(root.join("json").join("tables.json").exists());
    }
}
