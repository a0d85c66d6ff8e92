//! Room-based chat and agent-dispatch server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin chanoma-server
//! cargo run --bin chanoma-server -- --host 0.0.0.0 --port 3000 --config chanoma.toml
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use chanoma_server::{
    domain::ConnectionRegistry,
    infrastructure::{
        agent::HttpConversationalAgent, broadcaster::WebSocketBroadcaster, config::ServerConfig,
        message_pusher::WebSocketMessagePusher, repository::InMemoryRoomRepository,
    },
    ui::{Server, state::AppState},
    usecase::{
        AgentDispatcher, ConnectCallerUseCase, CreateRoomUseCase, DisconnectParticipantUseCase,
        JoinRoomUseCase, SendChatUseCase,
    },
};
use chanoma_shared::logger::setup_logger;
use clap::Parser;
use tokio::sync::Mutex;

#[derive(Parser, Debug)]
#[command(name = "chanoma-server")]
#[command(about = "Room-based chat and agent-dispatch server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Path to the identity/credential config file (TOML)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();
    let config = ServerConfig::load_or_default(args.config.as_deref());

    // Initialize dependencies in order:
    // 1. Registry / Repository
    // 2. MessagePusher / Broadcaster
    // 3. Agent backend
    // 4. UseCases
    // 5. AppState / Server

    // 1. Create connection registry and room repository (in-memory)
    let registry = Arc::new(Mutex::new(ConnectionRegistry::new()));
    let repository = Arc::new(InMemoryRoomRepository::new());

    // 2. Create MessagePusher and Broadcaster (WebSocket implementations)
    let message_pusher = Arc::new(WebSocketMessagePusher::new());
    let broadcaster = Arc::new(WebSocketBroadcaster::new(
        registry.clone(),
        message_pusher.clone(),
    ));

    // 3. Create the external agent client from the configured credentials
    let agent = Arc::new(HttpConversationalAgent::new(config.agent_endpoints()));

    // 4. Create UseCases
    let connect_caller_usecase = Arc::new(ConnectCallerUseCase::new(
        repository.clone(),
        registry.clone(),
        broadcaster.clone(),
        config.api_key_map(),
    ));
    let create_room_usecase = Arc::new(CreateRoomUseCase::new(
        repository.clone(),
        broadcaster.clone(),
    ));
    let join_room_usecase = Arc::new(JoinRoomUseCase::new(
        repository.clone(),
        registry.clone(),
        broadcaster.clone(),
    ));
    let send_chat_usecase = Arc::new(SendChatUseCase::new(
        repository.clone(),
        registry.clone(),
        broadcaster.clone(),
    ));
    let disconnect_participant_usecase = Arc::new(DisconnectParticipantUseCase::new(
        repository.clone(),
        registry.clone(),
        broadcaster.clone(),
        message_pusher.clone(),
    ));
    let agent_dispatcher = Arc::new(AgentDispatcher::new(
        repository.clone(),
        broadcaster.clone(),
        agent,
        config.agent_deadline(),
    ));

    // 5. Create and run the server
    let state = Arc::new(AppState {
        connect_caller_usecase,
        create_room_usecase,
        join_room_usecase,
        send_chat_usecase,
        disconnect_participant_usecase,
        agent_dispatcher,
        broadcaster,
        message_pusher,
        registry,
        agent_mention: config.agent_mention.clone(),
    });
    let server = Server::new(state);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
