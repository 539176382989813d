use crate::client::ApiClient;
use anyhow::Result;
use relay_shared::ChatMessage;
use std::io::{self, Write};

pub async fn single_message(
    client: ApiClient,
    system_prompt: Option<String>,
    message: String,
) -> Result<()> {
    let mut history: Vec<ChatMessage> = system_prompt.into_iter().map(ChatMessage::system).collect();
    history.push(ChatMessage::user(message));

    match client.chat(&history).await {
        Ok(reply) => println!("{}", reply),
        Err(e) => eprintln!("Error: {}", e),
    }
    Ok(())
}

pub async fn interactive_chat(client: ApiClient, system_prompt: Option<String>) -> Result<()> {
    warm_up(&client).await;
    println!("Envoy chat started. Type 'quit' to exit.\n");

    let mut history: Vec<ChatMessage> = system_prompt.into_iter().map(ChatMessage::system).collect();

    loop {
        print!("You: ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if input.eq_ignore_ascii_case("quit") || input.eq_ignore_ascii_case("exit") {
            println!("Goodbye!");
            break;
        }

        if input.is_empty() {
            continue;
        }

        history.push(ChatMessage::user(input));
        println!("Thinking...");

        match client.chat(&history).await {
            Ok(reply) => {
                println!("\n{}\n", reply);
                history.push(ChatMessage::assistant(reply));
            }
            Err(e) => {
                // Drop the unanswered turn so the next request stays well-formed.
                history.pop();
                eprintln!("Error: {}\n", e);
            }
        }
    }

    Ok(())
}

pub async fn suggest(client: ApiClient, message: String) -> Result<()> {
    if message.trim().is_empty() {
        eprintln!("Please enter a suggestion.");
        return Ok(());
    }

    match client.submit_suggestion(&message).await {
        Ok(()) => println!("Thanks! Your suggestion was sent."),
        Err(e) => eprintln!("Error: {}", e),
    }
    Ok(())
}

pub async fn ping(client: ApiClient) -> Result<()> {
    match client.ping().await {
        Ok(pong) => println!("Backend ready! (ts {})", pong.ts),
        Err(e) => eprintln!("Backend unreachable: {}", e),
    }
    Ok(())
}

/// Nudges a sleeping proxy awake before the first real request.
async fn warm_up(client: &ApiClient) {
    if client.ping().await.is_err() {
        println!("Backend warming up...");
    }
}
