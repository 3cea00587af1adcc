use std::time::Duration;

use anyhow::{Context, Result};
use threadline::chrono::Utc;
use threadline::prelude::*;
use threadline::{init_logging, Rendering};

fn describe(rendering: &Rendering) -> String {
    match rendering {
        Rendering::PlainText { text, .. } => text.clone(),
        Rendering::Structured { value, label } => match label {
            Some(label) => format!("[{}] {}", label, value),
            None => value.to_string(),
        },
        Rendering::Media { url } => format!("<image {}>", url),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = ClientConfig::load().context("Failed to load configuration")?;
    init_logging(&config.logging)?;

    println!("Threadline - Simple Example");
    println!("===========================\n");

    // 1. Build the session (HTTP API + realtime titles)
    println!("1. Connecting to {}...", config.api.base_url);
    let session = Session::builder().config(config).build()?;
    println!("   ✓ Session ready\n");

    // 2. Load existing threads
    println!("2. Loading threads...");
    let threads = session.mutations().load_threads().await?;
    println!("   ✓ {} thread(s) on the server\n", threads.len());

    // 3. Send a message without a thread; one is created on the fly
    println!("3. Sending a message...");
    let notes = AttachmentCandidate::new(
        "notes.txt",
        "text/plain",
        b"Pack sunscreen and a hat.".to_vec(),
    );
    let report = session
        .send(None, "Help me plan a weekend in Lisbon", vec![notes])
        .await?;

    for rejection in &report.rejected {
        println!("   ✗ {}", rejection);
    }
    let Some(thread) = report.thread else {
        println!("   Nothing to send");
        return Ok(());
    };
    println!("   ✓ Thread {}\n", thread.id);

    // 4. Render the conversation
    println!("4. Conversation:");
    let modes = RenderModes::new();
    if let Some(view) = session.render_thread(&thread.id, &modes, Utc::now()) {
        println!("   Title: {}", view.title);
        for entry in &view.entries {
            let text: Vec<String> = entry.rendering.parts.iter().map(describe).collect();
            println!("   [{} {}] {}", entry.role.as_str(), entry.timestamp, text.join(" "));
            for call in &entry.tool_calls {
                println!("      → {}({})", call.name, describe(&call.arguments));
                if let Some(result) = &call.result {
                    let text: Vec<String> = result.parts.iter().map(describe).collect();
                    println!("      ← {}", text.join(" "));
                }
            }
        }
    }
    println!();

    // 5. Wait briefly for the server to name the thread
    println!("5. Waiting for a title...");
    let mut changes = session.store().subscribe();
    let titled = tokio::time::timeout(
        Duration::from_secs(15),
        changes.wait_for(|s| s.is_title_fresh(&thread.id)),
    )
    .await;

    match titled {
        Ok(Ok(snapshot)) => {
            let title = snapshot
                .thread(&thread.id)
                .map(|t| t.display_title().to_string())
                .unwrap_or_default();
            println!("   ✓ Titled: {}\n", title);
        }
        _ => println!("   (no title pushed yet, status: {:?})\n", session.sync_status()),
    }

    println!("Done.");
    Ok(())
}
