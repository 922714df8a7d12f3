use std::path::PathBuf;

use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};
use tokio::io::AsyncWriteExt;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Client CLI for the Relay Gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8443")]
    url: String,

    /// Bearer token for protected routes
    #[arg(short, long, env = "GATEWAY_AUTH_TOKEN", default_value = "CHANGE_ME_IN_PRODUCTION")]
    token: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch robots.txt (no token required)
    Robots,
    /// Scrape an article's author and comments
    Scrape {
        /// Article URL
        url: String,
    },
    /// Relay a request body to the upstream model and stream the reply
    Proxy {
        #[arg(long)]
        model: String,
        /// Upstream API key
        #[arg(long)]
        key: String,
        /// JSON file forwarded as the upstream body
        #[arg(long)]
        body: PathBuf,
    },
    /// Synthesize speech into an audio file
    Tts {
        #[arg(long)]
        text: String,
        #[arg(long)]
        speaker: String,
        #[arg(long, default_value_t = 1.0)]
        speed: f32,
        /// Treat the text as a phoneme sequence
        #[arg(long)]
        phoneme: bool,
        #[arg(long)]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.token))?,
    );

    match cli.command {
        Commands::Robots => {
            let res = client.get(format!("{}/robots.txt", base)).send().await?;
            if check_status(&res) {
                println!("{}", res.text().await?);
            } else {
                print_error(res).await;
            }
        }
        Commands::Scrape { url } => {
            let res = client
                .post(format!("{}/api/scrape", base))
                .headers(headers)
                .json(&json!({ "url": url }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Proxy { model, key, body } => {
            let body: Value = serde_json::from_str(&tokio::fs::read_to_string(&body).await?)?;
            let res = client
                .post(format!("{}/gemini-proxy", base))
                .headers(headers)
                .json(&json!({ "upstream_api_key": key, "model": model, "body": body }))
                .send()
                .await?;

            if !check_status(&res) {
                print_error(res).await;
                return Ok(());
            }

            let mut stdout = tokio::io::stdout();
            let mut stream = res.bytes_stream();
            while let Some(chunk) = stream.next().await {
                stdout.write_all(&chunk?).await?;
                stdout.flush().await?;
            }
            stdout.write_all(b"\n").await?;
        }
        Commands::Tts {
            text,
            speaker,
            speed,
            phoneme,
            out,
        } => {
            let res = client
                .post(format!("{}/tts", base))
                .headers(headers)
                .json(&json!({
                    "text": text,
                    "speaker": speaker,
                    "speed": speed,
                    "is_phoneme": phoneme,
                }))
                .send()
                .await?;

            if !check_status(&res) {
                print_error(res).await;
                return Ok(());
            }

            let audio = res.bytes().await?;
            tokio::fs::write(&out, &audio).await?;
            println!("Wrote {} bytes to {}", audio.len(), out.display());
        }
    }

    Ok(())
}

fn check_status(res: &reqwest::Response) -> bool {
    res.status().is_success()
}

async fn print_error(res: reqwest::Response) {
    eprintln!("Error: gateway returned status {}", res.status());
    if let Ok(text) = res.text().await {
        eprintln!("Response: {}", text);
    }
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    if !check_status(&res) {
        print_error(res).await;
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
