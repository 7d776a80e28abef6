use std::io::{Error, ErrorKind};
use std::sync::Arc;

use boardgame_engine::config::EngineConfig;
use boardgame_engine::protocol::{self, Command};
use boardgame_engine::EngineError;
use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use log::{error, info};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::protocol::Message;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(long, default_value = "localhost")]
    host: String,
    #[arg(long, default_value_t = 999)]
    port: u16,
    /// One of error, warn, info, debug, trace
    #[arg(long, default_value = "info")]
    log_level: String,
    #[command(flatten)]
    engine: EngineConfig,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let args = Args::parse();

    let level = args
        .log_level
        .parse::<log::Level>()
        .map_err(|e| Error::new(ErrorKind::InvalidInput, format!("{}: {}", args.log_level, e)))?;
    simple_logger::init_with_level(level).map_err(|e| Error::new(ErrorKind::Other, e.to_string()))?;
    args.engine
        .validate()
        .map_err(|e| Error::new(ErrorKind::InvalidInput, e.to_string()))?;

    let address = format!("{}:{}", args.host, args.port);
    let listener = TcpListener::bind(&address).await?;
    info!("Listening on: {}", address);

    let config = Arc::new(args.engine);
    while let Ok((stream, _)) = listener.accept().await {
        let config = Arc::clone(&config);
        tokio::spawn(async move {
            if let Err(e) = accept_connection(stream, config).await {
                error!("Connection failed: {}", e);
            }
        });
    }

    Ok(())
}

/// Per-connection state. Positions travel with each request, so only the
/// tuning and the random source for the easy tier live here.
struct Session {
    config: Arc<EngineConfig>,
    rng: SmallRng,
}

impl Session {
    fn new(config: Arc<EngineConfig>) -> Self {
        Self {
            config,
            rng: SmallRng::from_entropy(),
        }
    }
}

async fn accept_connection(stream: TcpStream, config: Arc<EngineConfig>) -> Result<(), Error> {
    let addr = stream.peer_addr()?;
    info!("Peer address: {}", addr);

    let ws_stream = tokio_tungstenite::accept_async(stream)
        .await
        .map_err(|e| Error::new(ErrorKind::ConnectionAborted, e))?;
    info!("New WebSocket connection: {}", addr);

    let (mut write, mut read) = ws_stream.split();
    let session = Arc::new(Mutex::new(Session::new(config)));

    while let Some(raw_message) = read.next().await {
        let message = match raw_message {
            Ok(message) => message,
            Err(e) => {
                error!("Error reading websocket message: {}", e);
                continue;
            }
        };
        if !message.is_text() && !message.is_binary() {
            continue;
        }
        let response = match serde_json::from_slice::<Value>(&message.into_data()) {
            Ok(data) => {
                info!("Received: {}", data);
                handle_message(&session, data).await.unwrap_or_else(|e| {
                    error!("Error handling message: {}", e);
                    json!({ "error": e.to_string() })
                })
            }
            Err(e) => {
                error!("Error parsing JSON: {}", e);
                json!({ "error": e.to_string() })
            }
        };
        let response_str = response.to_string();
        write
            .send(Message::text(response_str.clone()))
            .await
            .map_err(|e| Error::new(ErrorKind::BrokenPipe, e))?;
        info!("Sent: {}", response_str);
    }

    info!("Closed: {}", addr);
    Ok(())
}

/// Runs the command on a blocking worker so a deep search never stalls the
/// connection task.
async fn handle_message(session: &Arc<Mutex<Session>>, data: Value) -> Result<Value, EngineError> {
    let command = Command::parse(data)?;
    let session = Arc::clone(session);
    tokio::task::spawn_blocking(move || {
        let mut guard = session.blocking_lock();
        let session = &mut *guard;
        protocol::respond(command, &session.config, &mut session.rng)
    })
    .await
    .map_err(|e| EngineError::Io(Error::new(ErrorKind::Other, e)))?
}
