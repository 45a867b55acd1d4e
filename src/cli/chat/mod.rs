pub mod conversation_state;
pub mod display;
pub mod prompt;

use std::io::Write;
use std::process::ExitCode;

use color_print::cformat;
use conversation_state::{ConversationState, TurnOutcome};
use eyre::Result;
use prompt::generate_prompt;
use tracing::{debug, info, warn};

use crate::inference::ExchangeProvider;
use crate::models::ModelSelector;

pub static EXAMPLE_PROMPTS: [&str; 4] = [
    "What are the advantages of using Next.js?",
    "Write code that demonstrates dijkstra's algorithm",
    "Help me write an essay about silicon valley",
    "What is the weather in San Francisco?",
];

const HELP_TEXT: &str = "
FinSLM Chat

/clear          Start a new conversation
/models         List the available models
/model <id>     Switch model (id or name)
/example <n>    Send example prompt n
/help           Show this help dialogue
/quit           Quit the application
";

pub struct ChatContext {
    output: Box<dyn Write>,
    input: Option<String>,
    interactive: bool,
    conversation_state: ConversationState,
    model_selector: ModelSelector,
    provider: Box<dyn ExchangeProvider>,
}

impl ChatContext {
    pub fn new(
        output: Box<dyn Write>,
        input: Option<String>,
        interactive: bool,
        model_selector: ModelSelector,
        provider: Box<dyn ExchangeProvider>,
    ) -> Self {
        Self {
            output,
            input,
            interactive,
            conversation_state: ConversationState::new(),
            model_selector,
            provider,
        }
    }

    pub async fn run(&mut self) -> Result<ExitCode> {
        // Single query mode
        if let Some(input) = self.input.take() {
            let outcome = self.handle_input(&input).await?;
            return Ok(match outcome {
                TurnOutcome::Failed => ExitCode::FAILURE,
                _ => ExitCode::SUCCESS,
            });
        }

        if self.interactive {
            self.print_welcome()?;
            self.run_interactive().await?;
        }

        Ok(ExitCode::SUCCESS)
    }

    fn print_welcome(&mut self) -> Result<()> {
        let model = self.model_selector.selected();
        writeln!(
            self.output,
            "{}",
            cformat!(
                "\n<bold>FinSLM Chat</bold>\nA small language model fine-tuned on financial data.\n\n<dim>provider:</dim> {}   <dim>model:</dim> <cyan>{}</cyan>\n",
                self.provider.name(),
                model.name
            )
        )?;

        writeln!(self.output, "Things to try")?;
        for (i, example) in EXAMPLE_PROMPTS.iter().enumerate() {
            writeln!(self.output, "{}", cformat!("  <dim>{}.</dim> {}", i + 1, example))?;
        }
        writeln!(self.output, "\n/help         Show the help dialogue")?;
        writeln!(self.output, "/quit         Quit the application\n")?;
        Ok(())
    }

    async fn run_interactive(&mut self) -> Result<()> {
        let mut rl = prompt::rl()?;

        loop {
            let prompt_text = generate_prompt(Some(self.model_selector.selected().name));
            let readline = rl.readline(&prompt_text);

            match readline {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }

                    rl.add_history_entry(line.as_str());

                    if line.trim() == "/quit" {
                        break;
                    }

                    if let Err(e) = self.handle_input(&line).await {
                        writeln!(self.output, "Error: {}", e)?;
                    }
                }
                Err(rustyline::error::ReadlineError::Interrupted)
                | Err(rustyline::error::ReadlineError::Eof) => break,
                Err(e) => {
                    writeln!(self.output, "Error: {}", e)?;
                    break;
                }
            }
        }

        Ok(())
    }

    /// Dispatch one line of input. Known slash commands never reach the
    /// provider; anything else, including other text starting with `/`, is
    /// sent as chat.
    async fn handle_input(&mut self, input: &str) -> Result<TurnOutcome> {
        let trimmed = input.trim();
        let (command, argument) = match trimmed.split_once(char::is_whitespace) {
            Some((command, argument)) => (command, argument.trim()),
            None => (trimmed, ""),
        };

        match command {
            "/help" => {
                writeln!(self.output, "{}", HELP_TEXT)?;
            }
            "/clear" => {
                self.conversation_state.clear();
                writeln!(self.output, "Conversation cleared.")?;
            }
            "/models" => {
                display::render_models(
                    &mut self.output,
                    self.model_selector.models(),
                    self.model_selector.selected(),
                )?;
            }
            "/model" if argument.is_empty() => {
                let model = self.model_selector.selected();
                writeln!(self.output, "Current model: {} ({})", model.name, model.id)?;
            }
            "/model" => match self.model_selector.select(argument) {
                Ok(model) => {
                    info!("Switched model to {}", model.id);
                    writeln!(self.output, "Switched to {} ({})", model.name, model.id)?;
                }
                Err(e) => display::render_error(&mut self.output, &e.to_string())?,
            },
            "/example" => {
                let example = argument
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| EXAMPLE_PROMPTS.get(i));
                match example {
                    Some(example) => return self.process_chat_input(example).await,
                    None => display::render_error(
                        &mut self.output,
                        &format!("Choose an example between 1 and {}", EXAMPLE_PROMPTS.len()),
                    )?,
                }
            }
            _ => return self.process_chat_input(input).await,
        }

        Ok(TurnOutcome::Ignored)
    }

    async fn process_chat_input(&mut self, input: &str) -> Result<TurnOutcome> {
        let model = *self.model_selector.selected();
        if self.conversation_state.can_submit(input) {
            display::render_pending(&mut self.output, &model)?;
        }

        let outcome = self
            .conversation_state
            .submit(self.provider.as_ref(), model.id, input)
            .await;

        match outcome {
            TurnOutcome::Replied => {
                if let Some(reply) = self.conversation_state.messages().last() {
                    display::render_message(&mut self.output, reply)?;
                }
            }
            TurnOutcome::Failed => {
                let message = self.conversation_state.last_error().unwrap_or("Error: unknown failure");
                debug!("Chat turn failed: {}", message);
                display::render_error(&mut self.output, message)?;
            }
            TurnOutcome::Ignored if self.conversation_state.is_awaiting_response() => {
                warn!("Input ignored while a request is outstanding");
            }
            TurnOutcome::Ignored => {
                debug!("Blank input ignored");
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use super::*;
    use crate::config::ProviderKind;
    use crate::inference::SimulatedProvider;

    /// Cloneable sink so tests can read what the context printed.
    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn simulated_context(input: Option<&str>) -> (ChatContext, SharedBuffer) {
        let buffer = SharedBuffer::default();
        let selector = ModelSelector::for_provider(ProviderKind::Simulated, None).unwrap();
        let context = ChatContext::new(
            Box::new(buffer.clone()),
            input.map(str::to_string),
            false,
            selector,
            Box::new(SimulatedProvider::new(Duration::ZERO)),
        );
        (context, buffer)
    }

    #[tokio::test]
    async fn plain_text_runs_a_turn() {
        let (mut context, buffer) = simulated_context(None);

        let outcome = context.handle_input("Hello").await.unwrap();

        assert_eq!(outcome, TurnOutcome::Replied);
        assert_eq!(context.conversation_state.messages().len(), 2);
        assert!(buffer
            .contents()
            .contains("simulated response from the financial-bert model for the input: \"Hello\""));
    }

    #[tokio::test]
    async fn model_command_changes_the_id_sent_next() {
        let (mut context, buffer) = simulated_context(None);

        context.handle_input("/model FinGPT").await.unwrap();
        context.handle_input("Hello").await.unwrap();

        assert_eq!(context.model_selector.selected().id, "fin-gpt");
        assert!(buffer.contents().contains("from the fin-gpt model"));
    }

    #[tokio::test]
    async fn unknown_model_is_reported_not_fatal() {
        let (mut context, buffer) = simulated_context(None);

        let outcome = context.handle_input("/model gpt-4").await.unwrap();

        assert_eq!(outcome, TurnOutcome::Ignored);
        assert_eq!(context.model_selector.selected().id, "financial-bert");
        assert!(buffer.contents().contains("Unknown model 'gpt-4'"));
    }

    #[tokio::test]
    async fn commands_do_not_touch_history() {
        let (mut context, _buffer) = simulated_context(None);

        for command in ["/help", "/models", "/model", "/clear"] {
            context.handle_input(command).await.unwrap();
        }

        assert!(context.conversation_state.messages().is_empty());
    }

    #[tokio::test]
    async fn unknown_slash_text_is_sent_as_chat() {
        let (mut context, buffer) = simulated_context(None);

        let outcome = context.handle_input("/etc/hosts explained?").await.unwrap();

        assert_eq!(outcome, TurnOutcome::Replied);
        assert_eq!(
            context.conversation_state.messages()[0].content,
            "/etc/hosts explained?"
        );
        assert!(buffer.contents().contains("for the input: \"/etc/hosts explained?\""));
    }

    #[tokio::test]
    async fn clear_starts_a_new_conversation() {
        let (mut context, buffer) = simulated_context(None);
        context.handle_input("Hello").await.unwrap();

        context.handle_input("/clear").await.unwrap();

        assert!(context.conversation_state.messages().is_empty());
        assert!(buffer.contents().contains("Conversation cleared."));
    }

    #[tokio::test]
    async fn example_command_sends_the_prompt() {
        let (mut context, _buffer) = simulated_context(None);

        let outcome = context.handle_input("/example 2").await.unwrap();

        assert_eq!(outcome, TurnOutcome::Replied);
        assert_eq!(context.conversation_state.messages()[0].content, EXAMPLE_PROMPTS[1]);
    }

    #[tokio::test]
    async fn example_out_of_range_is_rejected() {
        let (mut context, buffer) = simulated_context(None);

        for arg in ["/example 0", "/example 5", "/example x"] {
            assert_eq!(context.handle_input(arg).await.unwrap(), TurnOutcome::Ignored);
        }

        assert!(context.conversation_state.messages().is_empty());
        assert!(buffer.contents().contains("between 1 and 4"));
    }

    #[tokio::test]
    async fn single_query_mode_exits_after_one_turn() {
        let (mut context, buffer) = simulated_context(Some("What is a bond?"));

        context.run().await.unwrap();

        assert!(context.input.is_none());
        assert_eq!(context.conversation_state.messages().len(), 2);
        assert!(buffer.contents().contains("What is a bond?"));
    }

    #[tokio::test]
    async fn missing_token_is_shown_as_error() {
        let buffer = SharedBuffer::default();
        let selector = ModelSelector::for_provider(ProviderKind::Live, None).unwrap();
        let provider = crate::inference::HuggingFaceClient::new("http://127.0.0.1:9/", None).unwrap();
        let mut context = ChatContext::new(
            Box::new(buffer.clone()),
            None,
            false,
            selector,
            Box::new(provider),
        );

        let outcome = context.handle_input("Hello").await.unwrap();

        assert_eq!(outcome, TurnOutcome::Failed);
        assert_eq!(context.conversation_state.messages().len(), 1);
        assert!(buffer
            .contents()
            .contains("Error: Hugging Face API token is not configured"));
    }
}
