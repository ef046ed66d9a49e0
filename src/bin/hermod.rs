//! hermod: query a completion endpoint through the acceleration layer.
//!
//! Handy for checking an endpoint and for watching cache and dedup
//! behaviour from a shell (`RUST_LOG=hermod=debug`).

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::sync::LazyLock;

use clap::{Args as ClapArgs, Parser, Subcommand};
use futures_util::StreamExt;
use futures_util::future::join_all;

use hermod::{AcceleratedGateway, Config, QueryRequest, QueryResponse, StreamEvent};

static VERSION: LazyLock<String> = LazyLock::new(hermod::version_string);

/// Hermod CLI
#[derive(Parser)]
#[command(name = "hermod")]
#[command(version = VERSION.as_str())]
#[command(about = "Cached, deduplicated access to an AI completion endpoint")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Endpoint base URL (overrides the config file)
    #[arg(short, long, env = "HERMOD_ENDPOINT")]
    endpoint: Option<String>,

    /// Dispatch timeout in seconds (overrides the config file)
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Print responses as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(ClapArgs)]
struct QueryArgs {
    /// Message (or omit to read from stdin)
    message: Option<String>,
    /// System prompt
    #[arg(short, long)]
    system: Option<String>,
    /// Preferred provider hint
    #[arg(short, long)]
    provider: Option<String>,
    /// Preferred model hint (e.g. "fast", "pro")
    #[arg(short, long)]
    model: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Send a query
    Query {
        #[command(flatten)]
        query: QueryArgs,
        /// Issue the same query N times concurrently, then once more
        #[arg(short, long, default_value_t = 1)]
        repeat: usize,
    },

    /// Send a query and print the answer progressively
    Stream {
        #[command(flatten)]
        query: QueryArgs,
    },

    /// Warm the configured anticipated queries and report the result
    Prefetch,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing (default: warn for CLI; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(endpoint) = args.endpoint {
        config.endpoint.base_url = endpoint;
    }
    if let Some(secs) = args.timeout {
        config.dispatch.timeout_secs = secs;
    }
    let gateway = config.builder().build()?;

    match args.command {
        Command::Query { query, repeat } => {
            let request = build_request(query)?;
            let responses = join_all((0..repeat.max(1)).map(|_| gateway.query(&request))).await;
            for response in &responses {
                print_response(response, args.json)?;
            }
            if repeat > 1 {
                // The follow-up should be served from cache.
                print_response(&gateway.query(&request).await, args.json)?;
            }
        }
        Command::Stream { query } => {
            let request = build_request(query)?;
            stream_response(&gateway, request, args.json).await?;
        }
        Command::Prefetch => {
            let queries = config.prefetch.queries.clone();
            let summary = gateway.warm(&queries).await;
            println!(
                "Prefetched {} queries: {} warmed, {} failed, {} already cached",
                queries.len(),
                summary.warmed,
                summary.failed,
                summary.skipped
            );
        }
    }

    Ok(())
}

fn build_request(args: QueryArgs) -> Result<QueryRequest, Box<dyn std::error::Error>> {
    let message = match args.message {
        Some(message) => message,
        None => read_stdin()?,
    };
    if message.trim().is_empty() {
        return Err("message must not be empty".into());
    }

    let mut request = QueryRequest::new(message);
    if let Some(system) = args.system {
        request = request.system_prompt(system);
    }
    if let Some(provider) = args.provider {
        request = request.preferred_provider(provider);
    }
    if let Some(model) = args.model {
        request = request.preferred_model(model);
    }
    Ok(request)
}

fn read_stdin() -> io::Result<String> {
    let mut stdin = io::stdin();
    if stdin.is_terminal() {
        eprintln!("Reading message from stdin (Ctrl-D to finish)...");
    }
    let mut buf = String::new();
    stdin.read_to_string(&mut buf)?;
    Ok(buf.trim().to_string())
}

fn print_response(response: &QueryResponse, json: bool) -> serde_json::Result<()> {
    if json {
        println!("{}", serde_json::to_string(response)?);
        return Ok(());
    }
    let cached = if response.cached { ", cached" } else { "" };
    println!(
        "[{}/{} {}ms{}] {}",
        response.provider, response.model, response.latency_ms, cached, response.content
    );
    Ok(())
}

async fn stream_response(
    gateway: &AcceleratedGateway,
    request: QueryRequest,
    json: bool,
) -> serde_json::Result<()> {
    let mut stream = gateway.query_stream(request);
    let mut shown = 0;
    while let Some(event) = stream.next().await {
        match event {
            StreamEvent::Partial(text) => {
                if !json {
                    // Only the newly revealed suffix is printed.
                    print!("{}", &text[shown..]);
                    shown = text.len();
                    let _ = io::Write::flush(&mut io::stdout());
                }
            }
            StreamEvent::Done(response) => {
                if json {
                    print_response(&response, true)?;
                } else {
                    println!();
                    eprintln!(
                        "({}/{}, {}ms{})",
                        response.provider,
                        response.model,
                        response.latency_ms,
                        if response.cached { ", cached" } else { "" }
                    );
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn version_flag_reports_git_metadata() {
        let command = Args::command();
        let version = command.get_version().unwrap();
        assert_eq!(version, hermod::version_string());
        assert!(version.starts_with(hermod::PKG_VERSION));
        assert!(version.contains('+'));
    }

    #[test]
    fn cli_definition_is_valid() {
        Args::command().debug_assert();
    }
}
