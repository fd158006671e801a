//! Terminal chat client
//!
//! Asks questions on the command line and reveals each answer line by line,
//! followed by the sources it cites.
//!
//! Commands: `/copy` copies the last answer, `/session` retries session
//! creation, `/quit` exits.

use std::io::Write;
use std::sync::Arc;

use base64::Engine;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jacbot::backend::{Backend, BackendClient};
use jacbot::config::{Config, UiConfig};
use jacbot::render::{Clipboard, ClipboardError, CopyAction, TranscriptView, Viewport};
use jacbot::session::{ChatError, ChatSession};

/// The terminal always shows the newest output.
struct TerminalViewport;

impl Viewport for TerminalViewport {
    fn scroll_to_bottom(&self, smooth: bool) {
        tracing::trace!(smooth, "scroll to bottom");
    }
}

/// Copies through the terminal's OSC 52 escape sequence.
struct Osc52Clipboard;

impl Clipboard for Osc52Clipboard {
    fn set_text(&self, text: &str) -> Result<(), ClipboardError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(text);
        let mut stdout = std::io::stdout().lock();
        write!(stdout, "\x1b]52;c;{encoded}\x07")?;
        stdout.flush()?;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jacbot=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = Config::from_env()?;
    if let Some(url) = std::env::args().nth(1) {
        config = config.with_backend_base_url(url);
    }
    let ui = config.load_ui()?;

    let mut chat = ChatSession::new(BackendClient::new(config.backend_base_url.clone()));
    let mut view = TranscriptView::new(ui.clone(), Arc::new(TerminalViewport));
    let mut copy = CopyAction::new();

    println!("{}", ui.branding.bot_name);
    println!("How may I help you today?\n");

    if chat.init().await.is_err() {
        show_notifications(&mut chat);
    }

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = input.next_line().await? else {
            break;
        };

        let line = line.trim();
        match line {
            "/quit" | "/exit" => break,
            "/session" => {
                if chat.init().await.is_err() {
                    show_notifications(&mut chat);
                }
                continue;
            }
            "/copy" => {
                let last_answer = chat.messages().iter().rev().find(|m| m.is_assistant());
                match last_answer {
                    Some(answer) if copy.copy(&Osc52Clipboard, &answer.content) => {
                        println!("Copied.");
                    }
                    Some(_) => {}
                    None => println!("Nothing to copy yet."),
                }
                continue;
            }
            _ => {}
        }

        let pending = match chat.begin(line) {
            Ok(pending) => pending,
            Err(ChatError::EmptyQuestion) => continue,
            Err(_) => {
                show_notifications(&mut chat);
                continue;
            }
        };
        view.sync(chat.messages());

        println!("{} is thinking...", ui.branding.bot_name);
        let result = chat.resolve(&pending).await;
        if chat.finish(pending, result).is_err() {
            show_notifications(&mut chat);
            continue;
        }

        view.sync(chat.messages());
        reveal_answer(&mut view, &chat, &ui).await;
    }

    view.shutdown();
    Ok(())
}

/// Print lines as they are revealed, then the cited sources.
async fn reveal_answer<B: Backend>(view: &mut TranscriptView, chat: &ChatSession<B>, ui: &UiConfig) {
    let mut reveal = view.subscribe_reveal();
    let mut printed = 0;
    println!();
    loop {
        {
            let state = reveal.borrow_and_update();
            let visible = state.visible_lines();
            for line in visible.iter().skip(printed) {
                println!("  {line}");
            }
            printed = printed.max(visible.len());
            if state.complete || state.content.is_none() {
                break;
            }
        }
        if reveal.changed().await.is_err() {
            break;
        }
    }

    let frames = view.frames(chat.messages());
    let Some(frame) = frames.last() else {
        return;
    };
    if !frame.sources.is_empty() {
        println!("\n  Sources ({} found)", frame.sources.len());
        for listed in &frame.sources {
            let page = listed.page_label.as_deref().unwrap_or("");
            println!(
                "  - {} {} [{}] {}",
                listed.source.source, page, listed.match_label, listed.href
            );
        }
    }
    if let Some(disclaimer) = &frame.disclaimer {
        match &disclaimer.url {
            Some(url) => println!("\n  Disclaimer: {} ({url})", disclaimer.text),
            None => println!("\n  Disclaimer: {}", disclaimer.text),
        }
    }
    println!("\n  ({} / {})", ui.branding.bot_name, frame.id);
}

fn show_notifications<B: Backend>(chat: &mut ChatSession<B>) {
    while let Some(notification) = chat.dismiss(0) {
        eprintln!("! {}", notification.message);
    }
}
