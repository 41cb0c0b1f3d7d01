use std::sync::Arc;

use colored::Colorize;
use query_engine::llm::ChatTransport;
use query_engine::{AppConfig, ConversationStore, QueryOrchestrator, resolve_system_prompt};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::info;

const PROMPT: &str = "\n♈ You: ";
const BLANK_INPUT_NOTICE: &str = "❌ Please ask me about zodiac signs!";

/// One line of REPL input, classified before anything touches the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplCommand<'a> {
    Quit,
    Clear,
    Blank,
    Ask(&'a str),
}

impl<'a> ReplCommand<'a> {
    pub fn parse(line: &'a str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            Self::Blank
        } else if trimmed.eq_ignore_ascii_case("quit") {
            Self::Quit
        } else if trimmed.eq_ignore_ascii_case("clear") {
            Self::Clear
        } else {
            Self::Ask(trimmed)
        }
    }
}

/// Runs the interactive session and returns the process exit code.
pub async fn run(config: AppConfig, transport: Arc<dyn ChatTransport>) -> i32 {
    let system_prompt = match resolve_system_prompt(config.system_prompt_file.as_deref()) {
        Ok(prompt) => prompt,
        Err(err) => {
            eprintln!("{}", format!("❌ {err}").red());
            return 1;
        }
    };

    let mut orchestrator = QueryOrchestrator::new(
        ConversationStore::init(system_prompt),
        &config.chat,
        config.grounding,
        transport,
    );
    info!(
        session_id = %orchestrator.session_id(),
        model = orchestrator.model(),
        "zodiac guide session started"
    );

    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(err) => {
            eprintln!("{}", format!("❌ failed to open terminal editor: {err}").red());
            return 1;
        }
    };

    print_ready_banner();

    loop {
        match editor.readline(PROMPT) {
            Ok(line) => match ReplCommand::parse(&line) {
                ReplCommand::Quit => {
                    print_goodbye();
                    return 0;
                }
                ReplCommand::Clear => {
                    orchestrator.clear();
                    println!("{}", "🔄 Starting a new zodiac reading...".bright_cyan());
                }
                ReplCommand::Blank => {
                    println!("{}", BLANK_INPUT_NOTICE.bright_black());
                }
                ReplCommand::Ask(question) => {
                    let _ = editor.add_history_entry(question);
                    println!("{}", "🔍 Searching zodiac information...".bright_black());

                    match orchestrator.ask(question).await {
                        Ok(reply) => {
                            println!("\n{} {reply}", "♌ Zodiac Guide:".bright_magenta().bold());
                        }
                        Err(err) => {
                            println!("\n{}", format!("❌ Error: {err}").red());
                            println!(
                                "{}",
                                "Please try again or type 'quit' to exit.".bright_black()
                            );
                        }
                    }
                }
            },
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                println!();
                print_goodbye();
                return 0;
            }
            Err(err) => {
                eprintln!("{}", format!("❌ terminal input failed: {err}").red());
                return 1;
            }
        }
    }
}

fn print_ready_banner() {
    println!(
        "\n{}",
        "♌ Ready to explore the fascinating world of zodiac signs!".bright_magenta()
    );
    println!("Ask about any sign as a child, adult, professional, or in relationships...");
    println!(
        "{}",
        "Type 'quit' to exit, 'clear' to start a new exploration.".bright_black()
    );
    println!("{}", "-".repeat(50));
}

fn print_goodbye() {
    println!("{}", "👋 Thanks for exploring the zodiac! Goodbye!".bright_green());
}
