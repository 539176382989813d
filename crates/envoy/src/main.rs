mod client;
mod config;
mod ui;

use anyhow::Result;
use client::ApiClient;
use config::Config;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<()> {
    // Retry diagnostics go to stderr; chat output stays on stdout.
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    // Load config
    let mut config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            return Err(e);
        }
    };

    // Parse args
    let args: Vec<String> = std::env::args().collect();

    let client = ApiClient::new(config.server_url.clone(), config.retry_policy());

    // Handle commands, default to chat if no args
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("chat");

    match command {
        "chat" => {
            ui::interactive_chat(client, config.system_prompt.clone()).await?;
        }
        "ping" => {
            ui::ping(client).await?;
        }
        "suggest" => {
            ui::suggest(client, args[2..].join(" ")).await?;
        }
        "config" => {
            if args.len() < 3 {
                println!("Current config:");
                println!("  Server URL: {}", config.server_url);
                println!("  Max attempts: {}", config.max_attempts);
                println!("  System prompt: {}", if config.system_prompt.is_some() { "set" } else { "none" });
            } else if args[2] == "set" && args.len() >= 5 {
                match args[3].as_str() {
                    "server" => {
                        config.server_url = args[4].clone();
                        config.save()?;
                        println!("Server URL updated to: {}", config.server_url);
                    }
                    "attempts" => match args[4].parse::<u32>() {
                        Ok(n) if n > 0 => {
                            config.max_attempts = n;
                            config.save()?;
                            println!("Max attempts updated to: {}", n);
                        }
                        _ => eprintln!("Attempts must be a positive number"),
                    },
                    "prompt" => {
                        config.system_prompt = Some(args[4..].join(" "));
                        config.save()?;
                        println!("System prompt updated");
                    }
                    _ => print_usage(),
                }
            } else {
                print_usage();
            }
        }
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            // Treat anything else as a message
            ui::single_message(client, config.system_prompt.clone(), args[1..].join(" ")).await?;
        }
    }

    Ok(())
}

fn print_usage() {
    println!("Envoy - Client for the relay proxy");
    println!("\nUsage:");
    println!("  envoy chat                      Start interactive chat");
    println!("  envoy \"your message\"            Send a single message");
    println!("  envoy suggest TEXT              Submit a suggestion");
    println!("  envoy ping                      Check the backend is up");
    println!("  envoy config                    Show current configuration");
    println!("  envoy config set server URL     Set server URL");
    println!("  envoy config set attempts N     Set max attempts per request");
    println!("  envoy config set prompt TEXT    Set the chat system prompt");
}
