use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "shadow-cli")]
#[command(about = "Inspect a running shadow proxy", long_about = None)]
struct Cli {
    /// Admin listener base URL.
    #[arg(short, long, default_value = "http://127.0.0.1:18081")]
    url: String,

    /// Bearer token, if the admin API requires one.
    #[arg(short, long, env = "SHADOW_ADMIN_KEY")]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check proxy status
    Status,
    /// Per-route comparison statistics
    Stats,
    /// Replayable divergent requests for one route and outcome
    Errors {
        /// Route key, e.g. the matching path pattern
        #[arg(long)]
        api: String,
        /// Outcome label, e.g. "body mismatch"
        #[arg(long)]
        state: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(key) = &cli.key {
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", key))?);
    }

    let request = match &cli.command {
        Commands::Status => client.get(format!("{}/admin/status", cli.url)),
        Commands::Stats => client.get(format!("{}/debug/stats", cli.url)),
        Commands::Errors { api, state } => client
            .get(format!("{}/debug/errors", cli.url))
            .query(&[("api", api.as_str()), ("state", state.as_str())]),
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
