//! Interactive decision assistant.
//!
//! This binary provides a REPL for talking a decision through with a model
//! served by an OpenAI-compatible chat-completions endpoint.
//!
//! # Usage
//!
//! ```bash
//! # Basic usage; reads HF_TOKEN from .decidr/secrets.yaml or the environment
//! decidr-chat
//!
//! # Start with a decision in mind
//! decidr-chat --context "Should I take the job in Denver?"
//!
//! # Use another model and log traffic
//! decidr-chat --model accounts/fireworks/models/llama-v3p1-8b-instruct --log-file decidr.jsonl
//!
//! # Disable colors (useful for piping output)
//! decidr-chat --no-color
//! ```
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/context <text>` - Set the decision you are making
//! - `/new` - Start a new decision from the context
//! - `/clear` - Clear conversation history
//! - `/example <n>` - Start from an example scenario
//! - `/tips` - Show decision-making tips
//! - `/quit` - Exit the application
//!
//! Ctrl+C while waiting for a reply cancels that request.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::Notify;

use decidr::chat::{
    Action, ChatArgs, ChatCommand, ChatConfig, Dispatcher, Notice, PlainTextRenderer, Renderer,
    Session, help_text, parse_command,
};
use decidr::{ChatClient, CredentialProvider, JsonLinesLogger, Model, SecretsStore};

/// Main entry point for the decidr-chat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("decidr-chat [OPTIONS]");
    let config = ChatConfig::from(args);

    let secrets = SecretsStore::new(config.secrets_path.clone());
    let mut client = ChatClient::with_options(
        secrets.clone(),
        Some(config.endpoint.as_str()),
        config.timeout,
    )?;
    if let Some(path) = &config.log_file {
        client = client.with_logger(Arc::new(JsonLinesLogger::create(path)?));
    }

    let mut renderer = PlainTextRenderer::with_color(config.use_color);
    let mut dispatcher = Dispatcher::new(client, config.model.clone());
    let mut session = Session::new();
    if let Some(context) = config.initial_context.clone() {
        dispatcher
            .dispatch(&mut session, Action::SetContext(context), &mut renderer)
            .await?;
    }
    let mut rl = DefaultEditor::new()?;

    // Flag and wakeup for cancelling an in-flight request
    let interrupted = Arc::new(AtomicBool::new(false));
    let wakeup = Arc::new(Notify::new());

    // Set up Ctrl+C handler
    let interrupted_clone = interrupted.clone();
    let wakeup_clone = wakeup.clone();
    ctrlc::set_handler(move || {
        interrupted_clone.store(true, Ordering::Relaxed);
        wakeup_clone.notify_waiters();
    })?;

    renderer.render(&session);
    // The token is re-read on every request; this only warns early.
    if let Err(err) = secrets.get_credentials() {
        renderer.print_error(&err.to_string());
        if let Some(remediation) = err.remediation() {
            renderer.print_info(remediation);
        }
    }
    println!("Type /help for commands, /quit to exit\n");

    loop {
        // Reset interrupt flag before each input
        interrupted.store(false, Ordering::Relaxed);

        let readline = rl.readline("You: ");

        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                let actions = match parse_command(line) {
                    None => vec![Action::SubmitMessage(line.to_string())],
                    Some(ChatCommand::Quit) => {
                        println!("Goodbye!");
                        break;
                    }
                    Some(ChatCommand::Help) => {
                        for line in help_text().lines() {
                            println!("    {}", line);
                        }
                        continue;
                    }
                    Some(ChatCommand::Tips) => {
                        renderer.print_tips();
                        continue;
                    }
                    Some(ChatCommand::Examples) => {
                        renderer.print_scenarios();
                        continue;
                    }
                    Some(ChatCommand::Show) => {
                        renderer.render(&session);
                        continue;
                    }
                    Some(ChatCommand::Model(model_name)) => {
                        let model = model_name
                            .parse()
                            .unwrap_or_else(|_| Model::Custom(model_name.clone()));
                        dispatcher.set_model(model);
                        renderer.print_info(&format!("Model changed to: {}", model_name));
                        continue;
                    }
                    Some(ChatCommand::ShowConfig) => {
                        print_config(&config, &dispatcher, &session);
                        continue;
                    }
                    Some(ChatCommand::Invalid(message)) => {
                        renderer.print_error(&message);
                        continue;
                    }
                    Some(command) => command.actions(),
                };

                let mut notices = Vec::new();
                for action in actions {
                    let cancel = wait_for_interrupt(&interrupted, &wakeup);
                    match dispatcher
                        .dispatch_until(&mut session, action, &mut renderer, cancel)
                        .await
                    {
                        Ok(mut produced) => notices.append(&mut produced),
                        Err(err) => notices.push(Notice::error(err.to_string())),
                    }
                }
                renderer.render(&session);
                for notice in &notices {
                    renderer.print_notice(notice);
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D - exit
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}

/// Resolves once Ctrl+C has been pressed.
async fn wait_for_interrupt(flag: &AtomicBool, wakeup: &Notify) {
    loop {
        let notified = wakeup.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        if flag.swap(false, Ordering::Relaxed) {
            return;
        }
        notified.await;
    }
}

fn print_config<B: decidr::ChatBackend>(
    config: &ChatConfig,
    dispatcher: &Dispatcher<B>,
    session: &Session,
) {
    println!("    Current Configuration:");
    println!("      Model: {}", dispatcher.model());
    println!("      Endpoint: {}", config.endpoint);
    println!("      Secrets file: {}", config.secrets_path.display());
    match config.timeout {
        Some(timeout) => println!("      Timeout: {}s", timeout.as_secs()),
        None => println!("      Timeout: (none)"),
    }
    match config.log_file {
        Some(ref path) => println!("      Log file: {}", path.display()),
        None => println!("      Log file: (disabled)"),
    }
    if session.decision_context().is_empty() {
        println!("      Decision context: (none)");
    } else {
        println!("      Decision context: {}", session.decision_context());
    }
    println!("      Messages: {}", session.message_count());
}
