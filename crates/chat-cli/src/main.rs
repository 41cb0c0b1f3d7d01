use std::sync::Arc;

use colored::Colorize;
use query_engine::llm::{AzureOpenAiTransport, ChatTransport};
use query_engine::{AppConfig, ConfigError, load_dotenv};

mod check;
mod cli;
mod repl;

use cli::{CliError, CliOptions, Mode, print_usage};

#[tokio::main]
async fn main() {
    let options = match CliOptions::parse(std::env::args().skip(1)) {
        Ok(options) => options,
        Err(CliError::HelpRequested) => {
            print_usage();
            std::process::exit(0);
        }
        Err(err) => {
            eprintln!("error: {err}");
            eprintln!();
            print_usage();
            std::process::exit(2);
        }
    };

    if let Err(err) = load_dotenv() {
        eprintln!("{}", format!("❌ {err}").red());
        std::process::exit(1);
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "chat_cli=info,query_engine=info".to_string()),
        )
        .with_writer(std::io::stderr)
        .init();

    if options.mode == Mode::Chat {
        println!("{}", "♈ Linda Goodman's Zodiac Guide".bright_magenta().bold());
        println!("{}", "=".repeat(50));
        println!("🌟 Your captivating journey through zodiac wisdom begins here!\n");
    }

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(ConfigError::MissingVars(missing)) => {
            eprintln!("{}", "❌ Missing required environment variables:".red());
            for name in missing {
                eprintln!("   - {name}");
            }
            eprintln!("\n📝 Set them in your environment or in a .env file.");
            std::process::exit(1);
        }
        Err(err) => {
            eprintln!("{}", format!("❌ {err}").red());
            std::process::exit(1);
        }
    };

    let transport: Arc<dyn ChatTransport> =
        match AzureOpenAiTransport::new(&config.chat, &config.transport) {
            Ok(transport) => Arc::new(transport),
            Err(err) => {
                eprintln!("{}", format!("❌ Error creating OpenAI client: {err}").red());
                std::process::exit(1);
            }
        };

    let exit_code = match options.mode {
        Mode::Check => check::run(&config, transport.as_ref()).await,
        Mode::Chat => repl::run(config, transport).await,
    };
    std::process::exit(exit_code);
}
