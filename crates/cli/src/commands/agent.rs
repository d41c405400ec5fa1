//! `verdant agent` — Interactive or single-message chat mode.

use tokio::io::{AsyncBufReadExt, BufReader};

use verdant_config::AppConfig;

pub async fn run(message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let mut runtime = super::build_runtime(&config).await?;

    if let Some(msg) = message {
        // Single message mode
        eprint!("  Thinking...");
        let outcome = runtime.agent.handle_turn(&msg, None).await;
        eprint!("\r              \r");
        match outcome.response {
            Some(response) => println!("{response}"),
            None => {
                return Err(outcome
                    .error
                    .unwrap_or_else(|| "turn produced no response".into())
                    .into());
            }
        }
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  Verdant Agent — Interactive Mode");
    println!();
    println!("  Model:   {}", config.engine.model);
    println!("  Tools:   {}", runtime.tools.names().join(", "));
    println!("  Agent:   {}", runtime.agent.directive().name);
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print!("  You > ");
    use std::io::Write;
    std::io::stdout().flush()?;

    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        if input.is_empty() {
            print!("  You > ");
            std::io::stdout().flush()?;
            continue;
        }
        if input == "exit" {
            break;
        }

        eprint!("  ...");
        let outcome = runtime.agent.handle_turn(input, None).await;
        eprint!("\r     \r");
        println!();
        match (outcome.response, outcome.error) {
            (Some(response), _) => {
                for line in response.lines() {
                    println!("  Verdant > {line}");
                }
            }
            (None, error) => {
                eprintln!(
                    "  [Error] {}",
                    error.unwrap_or_else(|| "turn produced no response".into())
                );
            }
        }
        println!();

        print!("  You > ");
        std::io::stdout().flush()?;
    }

    println!();
    println!("  Goodbye!");
    println!();

    Ok(())
}
