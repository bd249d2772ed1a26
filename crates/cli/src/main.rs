use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use relief_agents::ReliefResponder;
use relief_core::{extract_features, normalize_text, ResponseTable};
use relief_ml::{ClassifierSettings, IntentClassifier, RemoteSettings, DEFAULT_REMOTE_ENDPOINT};
use relief_observability::{init_tracing, AppMetrics};
use serde::Serialize;

#[derive(Debug, Parser)]
#[command(name = "relief")]
#[command(about = "Relief Desk CLI")]
struct Cli {
    #[arg(long, env = "RELIEF_RESPONSES_PATH", default_value = "data/disaster_responses.csv")]
    responses: PathBuf,

    #[arg(long, env = "RELIEF_MODEL_PATH", default_value = "models/classifier.json")]
    model: PathBuf,

    /// Empty string disables the hosted classifier.
    #[arg(long, env = "RELIEF_REMOTE_CLASSIFIER_URL", default_value = DEFAULT_REMOTE_ENDPOINT)]
    remote_url: String,

    #[arg(long, env = "RELIEF_REMOTE_CLASSIFIER_TOKEN", hide_env_values = true)]
    remote_token: Option<String>,

    #[arg(long, env = "RELIEF_REMOTE_TIMEOUT_SECONDS", default_value_t = 10)]
    remote_timeout_seconds: u64,

    #[arg(long, env = "RELIEF_LOG_DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive chat loop.
    Chat,
    /// Answer one message and print the result as JSON.
    Ask { message: String },
    /// Show normalized text and keyword features without classifying.
    Extract { message: String },
}

#[derive(Debug, Serialize)]
struct ExtractOutput {
    normalized: String,
    location: String,
    disaster_type: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing("relief_cli", cli.log_dir.as_deref());

    match &cli.command {
        Command::Chat => run_chat(build_responder(&cli)).await?,
        Command::Ask { message } => {
            let result = build_responder(&cli).respond(message).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Extract { message } => {
            let features = extract_features(message);
            let output = ExtractOutput {
                normalized: normalize_text(message),
                location: features.location,
                disaster_type: features.disaster_type,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

async fn run_chat(responder: ReliefResponder) -> Result<()> {
    println!(
        "Relief Desk chat ({} classifier). type 'exit' to quit.",
        responder.classifier().strategy_name()
    );

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }

        let message = line.trim();
        if message.eq_ignore_ascii_case("exit") || message.eq_ignore_ascii_case("quit") {
            break;
        }

        if message.is_empty() {
            continue;
        }

        let result = responder.respond(message).await;
        println!("\n{}", result.response);
        println!(
            "[intent: {} | disaster: {} | location: {}]\n",
            result.intent, result.disaster_type, result.location
        );
    }

    Ok(())
}

fn build_responder(cli: &Cli) -> ReliefResponder {
    let remote_url = cli.remote_url.trim();
    let settings = ClassifierSettings {
        model_path: cli.model.clone(),
        remote: (!remote_url.is_empty()).then(|| RemoteSettings {
            endpoint: remote_url.to_string(),
            token: cli.remote_token.clone().filter(|token| !token.is_empty()),
            timeout: Duration::from_secs(cli.remote_timeout_seconds.max(1)),
        }),
    };

    ReliefResponder::new(
        Arc::new(IntentClassifier::select(&settings)),
        Arc::new(ResponseTable::load_or_builtin(&cli.responses)),
        AppMetrics::shared(),
    )
}
