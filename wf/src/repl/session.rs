//! REPL session management

use std::sync::Arc;

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::EngineError;
use crate::orchestrator::{Orchestrator, Outcome};
use crate::synth::{Synthesizer, TextSynthesizer};

/// Result of a slash command
enum SlashResult {
    Continue,
    Quit,
}

/// Interactive chat session bound to one session id
pub struct ChatSession {
    orchestrator: Arc<Orchestrator>,
    synthesizer: TextSynthesizer,
    session_id: String,
}

impl ChatSession {
    pub fn new(orchestrator: Arc<Orchestrator>, synthesizer: TextSynthesizer, session_id: String) -> Self {
        Self {
            orchestrator,
            synthesizer,
            session_id,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
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
                        match self.handle_slash_command(input).await {
                            SlashResult::Continue => continue,
                            SlashResult::Quit => break,
                        }
                    } else {
                        self.process_request(input).await;
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

        println!("Safe travels!");
        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", "Wayfarer Trip Planner".bright_cyan().bold());
        println!("Session: {}", self.session_id.dimmed());
        println!("Type {} for help, {} to quit", "/help".yellow(), "/quit".yellow());
        println!();
    }

    async fn handle_slash_command(&self, input: &str) -> SlashResult {
        let cmd = input.split_whitespace().next().unwrap_or("");
        debug!(%cmd, "ChatSession::handle_slash_command: called");
        match cmd {
            "/help" | "/h" => {
                self.print_help();
                SlashResult::Continue
            }
            "/quit" | "/q" | "/exit" => SlashResult::Quit,
            "/session" => {
                self.print_session().await;
                SlashResult::Continue
            }
            "/plan" => {
                self.print_plan().await;
                SlashResult::Continue
            }
            _ => {
                println!("{} Unknown command: {}", "?".yellow(), cmd);
                println!("Type {} for available commands", "/help".yellow());
                SlashResult::Continue
            }
        }
    }

    fn print_help(&self) {
        println!();
        println!("{}", "Available Commands:".bright_cyan());
        println!("  {:14} Show this help", "/help".yellow());
        println!("  {:14} Exit the REPL", "/quit".yellow());
        println!("  {:14} Show the session id and last request", "/session".yellow());
        println!("  {:14} Show the current plan", "/plan".yellow());
        println!();
        println!("{}", "Try:".bright_cyan());
        println!("  plan a 3 day trip to Tokyo for culture and food");
        println!("  find hotels in Tokyo");
        println!("  add more food");
        println!();
    }

    async fn print_session(&self) {
        println!("Session: {}", self.session_id);
        match self.orchestrator.session(&self.session_id).await {
            Ok(session) => {
                println!("Last request: {}", session.last_intent.raw_text);
                println!("Plan: {} days", session.last_plan.days.len());
            }
            Err(EngineError::SessionNotFound(_)) => println!("{}", "No plan yet.".dimmed()),
            Err(e) => println!("{} {}", "!".bright_red(), e),
        }
    }

    async fn print_plan(&self) {
        let Ok(session) = self.orchestrator.session(&self.session_id).await else {
            println!("{}", "No plan yet.".dimmed());
            return;
        };

        let outcome = Outcome::Planned {
            intent: session.last_intent.clone(),
            plan: session.last_plan.clone(),
        };
        self.print_outcome(&outcome);
    }

    /// Run one request; Ctrl+C cancels in-flight provider calls
    async fn process_request(&self, input: &str) {
        debug!(%input, "ChatSession::process_request: called");
        let cancel = CancellationToken::new();
        let request = self.orchestrator.handle(&self.session_id, input, &cancel);
        tokio::pin!(request);

        let result = tokio::select! {
            result = &mut request => result,
            _ = tokio::signal::ctrl_c() => {
                println!("{}", "Cancelling, using results gathered so far...".dimmed());
                cancel.cancel();
                request.await
            }
        };

        match result {
            Ok(outcome) => self.print_outcome(&outcome),
            Err(e) => println!("{} {}", "!".bright_red(), e),
        }
    }

    fn print_outcome(&self, outcome: &Outcome) {
        match self.synthesizer.synthesize(outcome) {
            Ok(text) => println!("{}", text),
            Err(e) => println!("{} {}", "!".bright_red(), e),
        }
    }
}
