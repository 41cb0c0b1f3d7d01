use colored::Colorize;
use query_engine::AppConfig;
use query_engine::llm::{ChatTransport, SearchIndexProbe, check_chat_connection};
use tracing::warn;

/// Probes the chat deployment and then the search index. Returns the process
/// exit code: 0 when both respond, 1 otherwise.
pub async fn run(config: &AppConfig, transport: &dyn ChatTransport) -> i32 {
    let mut healthy = true;

    println!("{}", "🔍 Testing Azure OpenAI connection...".bright_cyan());
    match check_chat_connection(transport, &config.chat.model_deployment_name).await {
        Ok(reply) => {
            println!("{}", "✅ Azure OpenAI connection successful!".bright_green());
            println!("   Response: {reply}");
        }
        Err(err) => {
            warn!(error_type = err.kind(), "chat connectivity check failed");
            println!("{}", format!("❌ Azure OpenAI connection failed: {err}").red());
            healthy = false;
        }
    }

    println!("{}", "🔍 Testing Azure AI Search connection...".bright_cyan());
    let probe = match SearchIndexProbe::new(&config.transport) {
        Ok(probe) => probe,
        Err(err) => {
            println!("{}", format!("❌ failed to build search client: {err}").red());
            return 1;
        }
    };
    match probe.probe(&config.grounding).await {
        Ok(matched) => {
            println!("{}", "✅ Azure AI Search connection successful!".bright_green());
            println!(
                "   Index '{}' returned {matched} document(s)",
                config.grounding.index_name
            );
        }
        Err(err) => {
            warn!(error_type = err.kind(), "search connectivity check failed");
            println!("{}", format!("❌ Azure AI Search connection failed: {err}").red());
            healthy = false;
        }
    }

    if healthy {
        println!("\n{}", "🎉 All connections successful!".bright_green().bold());
        0
    } else {
        println!(
            "\n{}",
            "⚠️  Some connections failed. Check your .env configuration.".yellow()
        );
        1
    }
}
