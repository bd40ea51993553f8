use heck::{ToLowerCamelCase, ToShoutySnakeCase, ToSnakeCase, ToUpperCamelCase};
use minijinja::Environment;
use serde::Serialize;

use tablegen_core::full_name;

use crate::errors::CodegenResult;

/// Template environment owned by a code target.
///
/// Templates are embedded at compile time; rendering only needs a shared
/// reference, so one renderer serves every generation unit of a run.
#[derive(Debug)]
pub struct TemplateRenderer {
    env: Environment<'static>,
}

impl TemplateRenderer {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_keep_trailing_newline(true);
        env.add_filter("pascal", |value: String| value.to_upper_camel_case());
        env.add_filter("camel", |value: String| value.to_lower_camel_case());
        env.add_filter("snake", |value: String| value.to_snake_case());
        env.add_filter("screaming_snake", |value: String| {
            value.to_shouty_snake_case()
        });
        env.add_filter("full_name", |namespace: String, name: String| {
            full_name(&namespace, &name)
        });
        Self { env }
    }

    pub fn add_template(&mut self, name: &'static str, source: &'static str) -> CodegenResult<()> {
        self.env.add_template(name, source)?;
        Ok(())
    }

    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> CodegenResult<String> {
        Ok(self.env.get_template(name)?.render(ctx)?)
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}
