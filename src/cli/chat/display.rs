use std::io::Write;

use crossterm::style::Stylize;
use eyre::Result;

use super::conversation_state::{Message, Role};
use crate::models::ModelDescriptor;

pub fn render_message(output: &mut dyn Write, message: &Message) -> Result<()> {
    let label = match message.role {
        Role::User => "U".cyan().bold(),
        Role::Assistant => "A".green().bold(),
    };
    writeln!(output, "{} {}", label, message.content)?;
    Ok(())
}

pub fn render_error(output: &mut dyn Write, error: &str) -> Result<()> {
    writeln!(output, "{}", error.to_string().red())?;
    Ok(())
}

pub fn render_pending(output: &mut dyn Write, model: &ModelDescriptor) -> Result<()> {
    writeln!(output, "{}", format!("{} is thinking...", model.name).dim())?;
    output.flush()?;
    Ok(())
}

pub fn render_models(
    output: &mut dyn Write,
    models: &[ModelDescriptor],
    selected: &ModelDescriptor,
) -> Result<()> {
    for model in models {
        let marker = if model == selected { "*" } else { " " };
        writeln!(output, "{} {:<16} {}", marker, model.name, model.id)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SIMULATED_MODELS;

    #[test]
    fn message_content_is_printed_after_label() {
        let mut out = Vec::new();
        render_message(&mut out, &Message::assistant("Hi there")).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains('A'));
        assert!(text.trim_end().ends_with("Hi there"));
    }

    #[test]
    fn selected_model_is_marked() {
        let mut out = Vec::new();
        render_models(&mut out, SIMULATED_MODELS, &SIMULATED_MODELS[1]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("* FinBERT"));
        assert!(lines[0].starts_with("  Financial BERT"));
    }
}
