//! Interactive chat session about one document

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::debug;

use crate::chat::{ChatClient, ChatOutcome};
use crate::render;

enum SlashResult {
    Continue,
    Quit,
}

/// Readline loop feeding questions to a [`ChatClient`]
pub struct ChatSession {
    client: ChatClient,
    document_url: String,
}

impl ChatSession {
    pub fn new(client: ChatClient, document_url: impl Into<String>) -> Self {
        Self {
            client,
            document_url: document_url.into(),
        }
    }

    pub fn client(&self) -> &ChatClient {
        &self.client
    }

    /// Run the REPL main loop
    pub async fn run(&mut self) -> Result<()> {
        self.print_welcome();

        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        loop {
            let readline = rl.readline(&format!("{} ", ">".bright_green()));

            match readline {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(input);

                    if input.starts_with('/') {
                        match self.handle_slash_command(input) {
                            SlashResult::Continue => continue,
                            SlashResult::Quit => break,
                        }
                    } else {
                        self.ask(input).await;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(err) => {
                    return Err(eyre::eyre!("Readline error: {}", err));
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    /// Ask one question and print the reply
    pub async fn ask(&mut self, question: &str) -> ChatOutcome {
        debug!(%question, "ChatSession::ask: called");
        let outcome = self.client.ask(Some(&self.document_url), question).await;
        if outcome != ChatOutcome::Skipped
            && let Some(reply) = self.client.transcript().last()
        {
            println!("{}", render::message(reply));
        }
        outcome
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", "Document Chat".bright_cyan().bold());
        println!("Document: {}", self.document_url.cyan());
        println!("Type {} for help, {} to quit", "/help".yellow(), "/quit".yellow());
        println!();
        if let Some(greeting) = self.client.transcript().last() {
            println!("{}", render::message(greeting));
        }
    }

    fn handle_slash_command(&mut self, input: &str) -> SlashResult {
        let cmd = input.split_whitespace().next().unwrap_or("");

        match cmd {
            "/help" | "/h" => {
                println!();
                println!("{}", "Available Commands:".bright_cyan());
                println!("  {:14} Show this help", "/help".yellow());
                println!("  {:14} Exit the chat", "/quit".yellow());
                println!("  {:14} Show the conversation so far", "/history".yellow());
                println!();
                SlashResult::Continue
            }
            "/quit" | "/q" | "/exit" => SlashResult::Quit,
            "/history" => {
                println!();
                print!("{}", render::transcript(self.client.transcript()));
                println!();
                SlashResult::Continue
            }
            _ => {
                println!("{} Unknown command: {}", "?".yellow(), cmd);
                println!("Type {} for available commands", "/help".yellow());
                SlashResult::Continue
            }
        }
    }
}
