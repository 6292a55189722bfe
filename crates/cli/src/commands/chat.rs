//! `wardrobe chat` — Single-message or interactive chat with the stylist.

use tokio::io::{AsyncBufReadExt, BufReader};
use wardrobe_agent::WardrobeService;
use wardrobe_core::cancel::CancellationToken;
use wardrobe_core::error::{Error, FailureKind};
use wardrobe_core::inference::ChatTurn;

pub async fn run(message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let service = super::load_service(true)?;

    if let Some(msg) = message {
        // Single message mode
        let cancel = super::cancel_on_ctrl_c();
        eprint!("  Thinking...");
        let reply = service.chat(&msg, &[], None, &cancel).await;
        eprint!("\r              \r");
        println!("{}", reply?);
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  Wardrobe Stylist — Interactive Mode");
    println!();
    println!("  Location:  {}", service.home().label);
    println!("  Wardrobe:  {} item(s)", service.items().await?.len());
    println!();
    println!("  Type your message and press Enter.");
    println!("  Ctrl+C cancels a pending reply; type 'exit' to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut history: Vec<ChatTurn> = Vec::new();

    prompt()?;
    while let Some(line) = lines.next_line().await? {
        let line = line.trim().to_string();
        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }
        if line.is_empty() {
            prompt()?;
            continue;
        }

        eprint!("  ...");
        match reply_or_cancel(&service, &line, &history).await {
            Ok(reply) => {
                eprint!("\r     \r");
                println!();
                for text in reply.lines() {
                    println!("  Stylist > {text}");
                }
                println!();
                history.push(ChatTurn::user(line));
                history.push(ChatTurn::model(reply));
            }
            Err(Error::Inference(failure)) if failure.kind == FailureKind::Cancelled => {
                eprint!("\r     \r");
                eprintln!("  [Cancelled]");
                println!();
            }
            Err(e) => {
                eprint!("\r     \r");
                eprintln!("  [Error] {e}");
                println!();
            }
        }

        prompt()?;
    }

    println!();
    println!("  Goodbye!");
    println!();
    Ok(())
}

/// Send one message; Ctrl-C while waiting cancels only this reply.
async fn reply_or_cancel(
    service: &WardrobeService,
    message: &str,
    history: &[ChatTurn],
) -> Result<String, Error> {
    let cancel = CancellationToken::new();
    let call = service.chat(message, history, None, &cancel);
    tokio::pin!(call);
    tokio::select! {
        reply = &mut call => reply,
        _ = tokio::signal::ctrl_c() => {
            cancel.cancel();
            call.await
        }
    }
}

fn prompt() -> std::io::Result<()> {
    use std::io::Write;
    print!("  You > ");
    std::io::stdout().flush()
}
