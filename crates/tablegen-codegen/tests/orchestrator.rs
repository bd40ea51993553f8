mod common;

use std::thread;
use std::time::Duration;

use tablegen_codegen::{
    CodeTarget, CodegenError, CodegenResult, EnvOptions, GenerationContext, OutputFile,
    OutputFileManifest, TargetRegistry, run_target, run_targets,
};
use tablegen_core::TableDef;

/// Target whose units can be slowed down, fail or panic on demand.
#[derive(Default)]
struct ScriptedTarget {
    manifest_delay: Duration,
    fail_on: Option<&'static str>,
    panic_on: Option<&'static str>,
}

impl CodeTarget for ScriptedTarget {
    fn name(&self) -> &str {
        "scripted"
    }

    fn file_header(&self) -> &str {
        "# scripted\n"
    }

    fn file_suffix(&self) -> &str {
        "txt"
    }

    fn generate_manifest(
        &self,
        _ctx: &GenerationContext<'_>,
        export_tables: &[&TableDef],
    ) -> CodegenResult<String> {
        thread::sleep(self.manifest_delay);
        let names: Vec<_> = export_tables.iter().map(|table| table.full_name()).collect();
        Ok(names.join(","))
    }

    fn generate_one(&self, ctx: &GenerationContext<'_>, table: &TableDef) -> CodegenResult<String> {
        let name = table.full_name();
        if self.panic_on == Some(name.as_str()) {
            panic!("scripted panic on {name}");
        }
        if self.fail_on == Some(name.as_str()) {
            return Err(CodegenError::InvalidOption(format!("scripted failure on {name}")));
        }
        Ok(format!("{name}={}", ctx.export_records(table)?.len()))
    }
}

fn paths(manifest: &OutputFileManifest) -> Vec<&str> {
    manifest.files.iter().map(|file| file.path.as_str()).collect()
}

#[test]
fn slow_manifest_unit_still_lands_first() {
    let graph = common::graph();
    let ctx = common::context(&graph, EnvOptions::new());
    let target = ScriptedTarget {
        manifest_delay: Duration::from_millis(50),
        ..ScriptedTarget::default()
    };

    let mut manifest = OutputFileManifest::new("scripted");
    run_target(&target, &ctx, &mut manifest).expect("run");

    assert_eq!(paths(&manifest), vec!["tables.txt", "tb_item.txt", "tb_global.txt"]);
    assert_eq!(
        manifest.files[0],
        OutputFile {
            path: "tables.txt".to_string(),
            content: "# scripted\nTbItem,TbGlobal".to_string(),
        }
    );
    assert_eq!(manifest.files[1].content, "# scripted\nTbItem=2");
    assert_eq!(manifest.files[2].content, "# scripted\nTbGlobal=1");
}

#[test]
fn failing_unit_leaves_manifest_untouched() {
    let graph = common::graph();
    let ctx = common::context(&graph, EnvOptions::new());
    let target = ScriptedTarget {
        fail_on: Some("TbGlobal"),
        ..ScriptedTarget::default()
    };

    let mut manifest = OutputFileManifest::new("scripted");
    manifest.add_file(OutputFile {
        path: "existing.txt".to_string(),
        content: String::new(),
    });

    let err = run_target(&target, &ctx, &mut manifest).unwrap_err();
    match &err {
        CodegenError::UnitFailed { unit, source } => {
            assert_eq!(unit, "TbGlobal");
            assert!(matches!(**source, CodegenError::InvalidOption(_)));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(paths(&manifest), vec!["existing.txt"]);
}

#[test]
fn panicking_unit_is_reported_and_aborts_the_run() {
    let graph = common::graph();
    let ctx = common::context(&graph, EnvOptions::new());
    let target = ScriptedTarget {
        panic_on: Some("TbItem"),
        ..ScriptedTarget::default()
    };

    let mut manifest = OutputFileManifest::new("scripted");
    let err = run_target(&target, &ctx, &mut manifest).unwrap_err();
    assert!(matches!(err, CodegenError::UnitPanicked(unit) if unit == "TbItem"));
    assert!(manifest.is_empty());
}

#[test]
fn unregistered_table_data_fails_the_unit() {
    let graph = common::graph();
    let ctx = GenerationContext::new(
        &graph,
        tablegen_codegen::TargetConfig::new("client"),
        tablegen_codegen::TagFilter::default(),
        EnvOptions::new(),
    )
    .unwrap();

    let mut manifest = OutputFileManifest::new("scripted");
    let err = run_target(&ScriptedTarget::default(), &ctx, &mut manifest).unwrap_err();
    assert!(matches!(
        err,
        CodegenError::UnitFailed { ref unit, .. } if unit == "TbItem"
    ));
    assert!(manifest.is_empty());
}

#[test]
fn builtin_targets_are_deterministic_across_runs() {
    let graph = common::graph();
    let ctx = common::context(&graph, EnvOptions::new());
    let registry = TargetRegistry::with_builtin().unwrap();
    let names = vec!["rust-json".to_string(), "json".to_string()];

    let first = run_targets(&registry, &names, &ctx).expect("first run");
    for _ in 0..5 {
        let again = run_targets(&registry, &names, &ctx).expect("repeat run");
        assert_eq!(again.len(), first.len());
        for (a, b) in first.iter().zip(&again) {
            assert_eq!(a.target_name, b.target_name);
            assert_eq!(a.files, b.files);
        }
    }
}

#[test]
fn unknown_target_name_is_rejected() {
    let graph = common::graph();
    let ctx = common::context(&graph, EnvOptions::new());
    let registry = TargetRegistry::with_builtin().unwrap();

    let err = run_targets(&registry, &["cobol".to_string()], &ctx).unwrap_err();
    assert!(matches!(err, CodegenError::UnknownTarget(name) if name == "cobol"));
}
