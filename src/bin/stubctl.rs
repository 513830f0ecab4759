use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "stubctl")]
#[command(about = "Management CLI for the stub server admin API", long_about = None)]
struct Cli {
    #[arg(short, long, env = "STUB_ADMIN_URL", default_value = "http://127.0.0.1:8081")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show reload state and counters
    Status,
    /// List the routes currently being served
    Routes,
    /// Reload the config file now
    Reload,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Status => client.get(format!("{base}/admin/status")).send().await?,
        Commands::Routes => client.get(format!("{base}/admin/routes")).send().await?,
        Commands::Reload => client.post(format!("{base}/admin/reload")).send().await?,
    };

    let ok = print_response(res).await?;
    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<bool, Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    // The admin API answers JSON even for failed reloads.
    match serde_json::from_str::<Value>(&text) {
        Ok(json) if status.is_success() => println!("{}", serde_json::to_string_pretty(&json)?),
        Ok(json) => {
            eprintln!("Error: Admin API returned status {status}");
            eprintln!("{}", serde_json::to_string_pretty(&json)?);
        }
        Err(_) => {
            eprintln!("Error: Admin API returned status {status}");
            eprintln!("Response: {text}");
        }
    }
    Ok(status.is_success())
}
