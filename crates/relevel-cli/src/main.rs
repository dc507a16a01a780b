use anyhow::Result;
use clap::{Parser, Subcommand};
use relevel_core::{CefrLevel, Error, RewriteOutcome};
use relevel_local::client::LevelRewriteClient;
use relevel_local::dom::HtmlDocument;
use relevel_local::session::Session;
use relevel_local::{normalize, select};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "relevel")]
#[command(about = "CEFR-level rewriting for HTML documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rewrite a document's main content to a target CEFR level.
    Rewrite(RewriteCmd),
    /// Extract and normalize the main content without rewriting it.
    Extract(ExtractCmd),
    /// Print version info.
    Version(VersionCmd),
}

#[derive(clap::Args, Debug)]
struct RewriteCmd {
    /// HTML document to rewrite.
    #[arg(long)]
    input: PathBuf,
    /// Target CEFR level. Allowed: A1, A2, B1, B2, C1, C2
    #[arg(long)]
    level: String,
    /// Write the rewritten document here; omitted, only the outcome is printed.
    #[arg(long)]
    out: Option<PathBuf>,
    /// API key for the rewrite service.
    #[arg(long, env = "RELEVEL_API_KEY", default_value = "", hide_env_values = true)]
    api_key: String,
    /// Override the service base URL (default: RELEVEL_API_BASE_URL or the public endpoint).
    #[arg(long)]
    base_url: Option<String>,
    /// Override the model (default: RELEVEL_MODEL or the built-in default).
    #[arg(long)]
    model: Option<String>,
    #[arg(long, default_value_t = 30_000)]
    timeout_ms: u64,
    /// Output format for the outcome. Allowed: json, text
    #[arg(long, default_value = "json")]
    output: String,
}

#[derive(clap::Args, Debug)]
struct ExtractCmd {
    /// HTML document to read.
    #[arg(long)]
    input: PathBuf,
    /// Output format. Allowed: json, text
    #[arg(long, default_value = "json")]
    output: String,
}

#[derive(clap::Args, Debug)]
struct VersionCmd {
    /// Output format. Allowed: json, text
    #[arg(long, default_value = "json")]
    output: String,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("RELEVEL_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Rewrite(cmd) => run_rewrite(cmd).await,
        Commands::Extract(cmd) => run_extract(cmd),
        Commands::Version(cmd) => run_version(cmd),
    }
}

fn print_rewrite_outcome(outcome: &RewriteOutcome, output: &str) -> Result<()> {
    if output == "text" {
        match (&outcome.error, outcome.original_chars, outcome.rewritten_chars) {
            (None, Some(orig), Some(new)) => {
                println!("relevel rewrite: ok original_chars={orig} rewritten_chars={new}");
            }
            _ => {
                println!(
                    "relevel rewrite: failed: {}",
                    outcome.error.as_deref().unwrap_or("unknown")
                );
            }
        }
    } else {
        println!("{}", serde_json::to_string_pretty(outcome)?);
    }
    Ok(())
}

async fn run_rewrite(cmd: RewriteCmd) -> Result<()> {
    let html = std::fs::read_to_string(&cmd.input)?;

    // A bad level is a boundary outcome like any other failure, not a fault.
    let level = match cmd.level.parse::<CefrLevel>() {
        Ok(level) => level,
        Err(err) => {
            return print_rewrite_outcome(&RewriteOutcome::failed(&err), &cmd.output);
        }
    };

    let host = HtmlDocument::parse(&html);
    let client = LevelRewriteClient::from_env(reqwest::Client::new(), cmd.base_url, cmd.model)
        .with_timeout_ms(cmd.timeout_ms);
    let mut session = Session::new(host, client);

    let outcome = session.rewrite(level, &cmd.api_key).await;
    if outcome.success {
        if let Some(out_path) = &cmd.out {
            std::fs::write(out_path, session.host().outer_html())?;
        }
    }
    print_rewrite_outcome(&outcome, &cmd.output)
}

#[derive(Debug, serde::Serialize)]
struct ExtractReport {
    success: bool,
    chars: usize,
    truncated: bool,
    text: String,
}

fn run_extract(cmd: ExtractCmd) -> Result<()> {
    let html = std::fs::read_to_string(&cmd.input)?;
    let doc = HtmlDocument::parse(&html);
    let payload = normalize::normalize(&select::main_content_text(&doc));

    if payload.text.is_empty() {
        let outcome = RewriteOutcome::failed(&Error::NoContentFound);
        if cmd.output == "text" {
            println!(
                "relevel extract: failed: {}",
                outcome.error.as_deref().unwrap_or("unknown")
            );
        } else {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        return Ok(());
    }

    if cmd.output == "text" {
        println!("{}", payload.text);
    } else {
        let report = ExtractReport {
            success: true,
            chars: payload.text.chars().count(),
            truncated: payload.truncated,
            text: payload.text,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}

fn run_version(cmd: VersionCmd) -> Result<()> {
    let version = env!("CARGO_PKG_VERSION");
    if cmd.output == "text" {
        println!("relevel {version}");
    } else {
        println!(
            "{}",
            serde_json::json!({ "name": "relevel", "version": version })
        );
    }
    Ok(())
}
