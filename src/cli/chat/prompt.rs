use rustyline::{Config, Editor, Result};

pub fn generate_prompt(model_name: Option<&str>) -> String {
    match model_name {
        Some(name) => format!("[{}] > ", name),
        None => "> ".to_string(),
    }
}

pub fn rl() -> Result<Editor<()>> {
    let config = Config::builder()
        .history_ignore_space(true)
        .completion_type(rustyline::CompletionType::List)
        .build();
    Editor::with_config(config)
}
