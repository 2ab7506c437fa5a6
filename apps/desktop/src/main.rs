use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use client_core::{AssistantClient, AssistantEvent};
use shared::domain::{ItemId, Language};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast,
    task::JoinHandle,
};
use tracing::warn;

mod config;
mod line_capture;

use line_capture::LineSpeechCapture;

#[derive(Parser, Debug)]
#[command(name = "voicecart", about = "Voice-driven shopping list client")]
struct Args {
    /// Backend base URL; overrides voicecart.toml.
    #[arg(long, env = "VOICECART_SERVER_URL")]
    server_url: Option<String>,
    /// UI language tag (en or es).
    #[arg(long)]
    language: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let args = Args::parse();

    let mut settings = config::load_settings();
    if let Some(server_url) = args.server_url {
        settings.server_url = server_url;
    }
    if let Some(tag) = args.language {
        settings.language = Language::from_tag(&tag)
            .ok_or_else(|| anyhow::anyhow!("unsupported language tag '{tag}'"))?;
    }
    let server_url = config::normalize_server_url(&settings.server_url)?;

    let capture = LineSpeechCapture::new();
    let client = AssistantClient::new(server_url, settings.language, capture.clone());
    let pump = client.spawn_capture_pump()?;
    let renderer = spawn_renderer(&client);

    client.bootstrap().await;
    repl(&client, &capture).await?;

    pump.abort();
    renderer.abort();
    Ok(())
}

async fn repl(client: &Arc<AssistantClient>, capture: &Arc<LineSpeechCapture>) -> Result<()> {
    print_help();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }
        // An armed mic session swallows the line as its transcript.
        if capture.push_line(&line) {
            continue;
        }

        let (verb, rest) = match line.split_once(' ') {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line.as_str(), ""),
        };
        match verb {
            "mic" | "stop" => client.press_mic().await,
            "say" => {
                client.dispatch(rest).await;
            }
            "search" => {
                client.search_dispatch(rest).await;
            }
            "add" => {
                client.add_suggestion_as_item(rest).await;
            }
            "delete" => match rest.parse::<i64>() {
                Ok(id) => {
                    client.delete_item(ItemId(id)).await;
                }
                Err(_) => println!("usage: delete <item-id>"),
            },
            "list" => {
                if let Err(err) = client.refresh_list().await {
                    warn!("list refresh failed: {err}");
                }
            }
            "suggestions" => {
                if let Err(err) = client.load_suggestions().await {
                    warn!("suggestion load failed: {err}");
                }
            }
            "lang" => match Language::from_tag(rest) {
                Some(language) => client.set_language(language).await,
                None => println!("usage: lang en|es"),
            },
            "help" => print_help(),
            "quit" | "exit" => break,
            _ => println!("unknown command, type 'help'"),
        }
    }
    Ok(())
}

fn spawn_renderer(client: &Arc<AssistantClient>) -> JoinHandle<()> {
    let mut events = client.subscribe_events();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(AssistantEvent::StatusChanged(status)) => println!("{status}"),
                Ok(AssistantEvent::ListRefreshed(items)) => {
                    println!("-- shopping list ({}) --", items.len());
                    for item in items {
                        match item.category {
                            Some(category) => {
                                println!("  #{} {} x{} [{category}]", item.id.0, item.name, item.quantity)
                            }
                            None => println!("  #{} {} x{}", item.id.0, item.name, item.quantity),
                        }
                    }
                }
                Ok(AssistantEvent::SuggestionsUpdated(labels)) => {
                    println!("-- suggestions --");
                    for label in labels {
                        println!("  + {label}");
                    }
                }
                Ok(AssistantEvent::SearchResultsUpdated(results)) => {
                    println!("-- search results ({}) --", results.len());
                    for result in results {
                        println!(
                            "  #{} {} ({}) ₹{:.2}",
                            result.id.0, result.name, result.brand, result.price
                        );
                    }
                }
                Ok(AssistantEvent::ViewChanged(view)) => println!("[view: {view:?}]"),
                Ok(AssistantEvent::LanguageChanged(language)) => {
                    println!("[language: {}]", language.tag())
                }
                Ok(AssistantEvent::ListeningChanged(_)) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "renderer lagged behind events");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

fn print_help() {
    println!("commands:");
    println!("  mic               toggle the microphone (next line is your utterance)");
    println!("  say <text>        dispatch a command transcript directly");
    println!("  search <text>     search the product catalog");
    println!("  add <label>       add a suggestion to the list");
    println!("  delete <item-id>  remove an item");
    println!("  list              refresh the shopping list");
    println!("  suggestions       reload suggestions");
    println!("  lang en|es        switch language");
    println!("  quit              exit");
}
