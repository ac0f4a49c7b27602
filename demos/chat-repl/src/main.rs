//! Line-oriented chat client for a remote agent.
//!
//! Run with: cargo run -p chat-repl
//!
//! Connects to the agent named by `AGENT_RESOURCE_ID` / `AGENT_LOCATION`
//! using the bearer token in `AGENT_ACCESS_TOKEN`. Without a config, or with
//! `AGENT_OFFLINE=1`, it talks to an in-process echo agent instead.

use std::{io::Write, sync::Arc};

use agent_chat_core::{GatewayConfig, Role, SessionSummary, Transport};
use agent_chat_session::{
    ChatController, ChatState, ConversationView, Gateway, UserAction, ViewUpdate,
};
use agent_chat_transport::{EnvToken, HttpTransport, MemoryTransport};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const TOKEN_VAR: &str = "AGENT_ACCESS_TOKEN";

const HELP: &str = "\
Commands:
  /new            start a new chat
  /list           list chats
  /refresh        re-fetch the chat list
  /open <n|id>    open a chat
  /delete <n|id>  delete a chat
  /history        show the open chat
  /quit           exit
Anything else is sent to the agent.";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let controller = ChatController::new(Gateway::new(build_transport()?));
    let mut state = ChatState::new();
    tracing::info!(user_id = %state.user_id, "Chat client ready");

    println!("{HELP}");
    state = apply(&controller, state, UserAction::ShowSessions).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let action = match parse_command(line, state.directory.entries()) {
            Command::Quit => break,
            Command::Help => {
                println!("{HELP}");
                continue;
            }
            Command::Invalid(message) => {
                println!("{message}");
                continue;
            }
            Command::Action(action) => action,
        };

        state = match action {
            UserAction::SendText(text) => {
                let (next, updates) = controller
                    .send_streaming(state, &text, |fragment| {
                        println!("assistant: {fragment}");
                    })
                    .await;
                // Fragments were already printed as they arrived.
                for update in updates {
                    if !matches!(update, ViewUpdate::Reply(_)) {
                        render(update);
                    }
                }
                next
            }
            action @ (UserAction::CreateSession | UserAction::DeleteSession(_)) => {
                let next = apply(&controller, state, action).await;
                apply(&controller, next, UserAction::ShowSessions).await
            }
            action @ UserAction::SelectSession(_) => {
                let next = apply(&controller, state, action).await;
                apply(&controller, next, UserAction::LoadHistory).await
            }
            action => apply(&controller, state, action).await,
        };
    }

    Ok(())
}

fn build_transport() -> anyhow::Result<Arc<dyn Transport>> {
    let offline = std::env::var("AGENT_OFFLINE").is_ok_and(|v| v == "1");
    if offline {
        tracing::info!("Using in-process echo agent");
        return Ok(Arc::new(MemoryTransport::new()));
    }

    match GatewayConfig::from_env() {
        Ok(config) => {
            tracing::info!(resource = %config.resource_id, "Using remote agent");
            Ok(Arc::new(HttpTransport::new(config, Arc::new(EnvToken::new(TOKEN_VAR)))?))
        }
        Err(e) => {
            tracing::warn!("{e}; falling back to in-process echo agent");
            Ok(Arc::new(MemoryTransport::new()))
        }
    }
}

async fn apply(controller: &ChatController, state: ChatState, action: UserAction) -> ChatState {
    let (state, updates) = controller.handle(state, action).await;
    for update in updates {
        render(update);
    }
    state
}

enum Command {
    Action(UserAction),
    Help,
    Quit,
    Invalid(String),
}

fn parse_command(line: &str, sessions: &[SessionSummary]) -> Command {
    let Some(rest) = line.strip_prefix('/') else {
        return Command::Action(UserAction::SendText(line.to_string()));
    };
    let (name, arg) = rest.split_once(' ').map_or((rest, ""), |(n, a)| (n, a.trim()));

    match name {
        "new" => Command::Action(UserAction::CreateSession),
        "list" => Command::Action(UserAction::ShowSessions),
        "refresh" => Command::Action(UserAction::RefreshSessions),
        "history" => Command::Action(UserAction::LoadHistory),
        "open" => resolve(arg, sessions).map_or_else(Command::Invalid, |id| {
            Command::Action(UserAction::SelectSession(id))
        }),
        "delete" => resolve(arg, sessions).map_or_else(Command::Invalid, |id| {
            Command::Action(UserAction::DeleteSession(id))
        }),
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => Command::Invalid(format!("Unknown command /{other}. Try /help.")),
    }
}

/// Accept a 1-based list index or a literal id.
fn resolve(arg: &str, sessions: &[SessionSummary]) -> Result<String, String> {
    if arg.is_empty() {
        return Err("Which chat? Give its number from /list or its id.".to_string());
    }
    match arg.parse::<usize>() {
        Ok(n) => sessions
            .get(n.wrapping_sub(1))
            .map(|s| s.id.clone())
            .ok_or_else(|| format!("No chat #{n}. Try /list.")),
        Err(_) => Ok(arg.to_string()),
    }
}

fn render(update: ViewUpdate) {
    match update {
        ViewUpdate::Sessions(sessions) if sessions.is_empty() => {
            println!("No existing conversations. Type /new to start one.");
        }
        ViewUpdate::Sessions(sessions) => {
            println!("Existing chats:");
            for (i, session) in sessions.iter().enumerate() {
                println!(
                    "  {}. Chat session ({})  {}",
                    i + 1,
                    session.last_update_label(),
                    session.id
                );
            }
        }
        ViewUpdate::SessionCreated(id) => println!("Created new session: {id}"),
        ViewUpdate::SessionSelected(id) => println!("Opened chat {id}"),
        ViewUpdate::SessionDeleted(_) => println!("Session deleted!"),
        ViewUpdate::Conversation(ConversationView::Empty) => {
            println!("Let's get started! Tell me what you'd like to explore.");
        }
        ViewUpdate::Conversation(ConversationView::Messages(transcript)) => {
            for message in &transcript {
                let who = match message.role {
                    Role::User => "you",
                    Role::Assistant => "assistant",
                };
                println!("{who}: {}", message.text);
            }
        }
        ViewUpdate::Reply(fragments) => {
            for fragment in fragments {
                println!("assistant: {fragment}");
            }
        }
        ViewUpdate::NoResponse => println!("No response received from the agent."),
        ViewUpdate::Notice(notice) => println!("! {}", notice.message),
    }
}
