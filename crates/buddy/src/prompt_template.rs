use include_dir::{include_dir, Dir};
use serde::Serialize;
use tera::{Context, Error as TeraError, Tera};

static PROMPTS_DIR: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/src/prompts");

pub fn render_prompt<T: Serialize>(template: &str, context_data: &T) -> Result<String, TeraError> {
    let mut tera = Tera::default();
    tera.add_raw_template("inline_template", template)?;
    let context = Context::from_serialize(context_data)?;
    tera.render("inline_template", &context)
}

/// Render one of the prompt templates bundled with the crate
pub fn render_prompt_file<T: Serialize>(
    template_name: &str,
    context_data: &T,
) -> Result<String, TeraError> {
    let template = PROMPTS_DIR
        .get_file(template_name)
        .and_then(|file| file.contents_utf8())
        .ok_or_else(|| TeraError::msg(format!("Prompt template not found: {}", template_name)))?;
    render_prompt(template, context_data)
}
