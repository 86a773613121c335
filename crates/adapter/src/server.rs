//! TCP server for the control adapter
//!
//! Handles incoming connections and manages client lifecycle.
//! Uses tokio for async networking.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot, RwLock};
use tracing::{debug, info, warn};

use crate::core::{DeckProvider, GameController};
use crate::protocol::*;
use crate::runtime::{ClientCommand, InboundCommand, InboundPayload, OutboundMessage};
use crate::types::{GameAction, GameEvent};

/// Stable 64-bit FNV-1a hasher for deterministic `state_hash`.
///
/// `DefaultHasher` output is not guaranteed stable across Rust versions.
#[derive(Debug, Clone)]
struct Fnv1aHasher {
    state: u64,
}

impl Fnv1aHasher {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;

    fn new() -> Self {
        Self {
            state: Self::OFFSET_BASIS,
        }
    }
}

impl std::hash::Hasher for Fnv1aHasher {
    fn finish(&self) -> u64 {
        self.state
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.state ^= b as u64;
            self.state = self.state.wrapping_mul(Self::PRIME);
        }
    }
}

fn extract_seq_best_effort(s: &str) -> Option<u64> {
    let start = s.find("\"seq\"")?;
    let after_key = &s[start + 5..];
    let colon = after_key.find(':')?;
    let rest = after_key[colon + 1..].trim_start();
    let end = rest.bytes().take_while(|b| b.is_ascii_digit()).count();
    if end == 0 {
        return None;
    }
    rest[..end].parse::<u64>().ok()
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub protocol_version: String,
    pub max_pending_commands: usize,
    pub disabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7777,
            protocol_version: PROTOCOL_VERSION.to_string(),
            max_pending_commands: 10,
            disabled: false,
        }
    }
}

impl ServerConfig {
    /// Create from `MATCH_ADAPTER_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host = lookup("MATCH_ADAPTER_HOST")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.host);
        let port = lookup("MATCH_ADAPTER_PORT")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.port);
        let max_pending_commands = lookup("MATCH_ADAPTER_MAX_PENDING")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.max_pending_commands);
        let disabled = lookup("MATCH_ADAPTER_DISABLED")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Self {
            host,
            port,
            protocol_version: defaults.protocol_version,
            max_pending_commands,
            disabled,
        }
    }

    /// `host:port` string suitable for binding
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn accepts_version(&self, requested: &str) -> bool {
        let major = |v: &str| v.split('.').next().map(str::to_string);
        major(requested).is_some() && major(requested) == major(&self.protocol_version)
    }
}

/// Shared server state
struct ServerState {
    config: ServerConfig,
    clients: RwLock<Vec<ClientHandle>>,
    controller: RwLock<Option<u64>>,
}

impl ServerState {
    fn new(config: ServerConfig) -> Self {
        Self {
            config,
            clients: RwLock::new(Vec::new()),
            controller: RwLock::new(None),
        }
    }

    async fn is_handshaken(&self, client_id: u64) -> bool {
        let clients = self.clients.read().await;
        clients
            .iter()
            .find(|c| c.id == client_id)
            .map(|c| c.handshaken)
            .unwrap_or(false)
    }

    async fn is_controller(&self, client_id: u64) -> bool {
        *self.controller.read().await == Some(client_id)
    }

    /// Record `seq` if it is strictly greater than the last one seen.
    async fn check_and_update_seq(&self, client_id: u64, seq: u64) -> bool {
        let mut clients = self.clients.write().await;
        let Some(client) = clients.iter_mut().find(|c| c.id == client_id) else {
            return true;
        };

        match client.last_seq {
            Some(prev) if seq <= prev => false,
            _ => {
                client.last_seq = Some(seq);
                true
            }
        }
    }

    async fn send_to(&self, client_id: u64, msg: ClientOutbound) {
        let clients = self.clients.read().await;
        if let Some(c) = clients.iter().find(|c| c.id == client_id) {
            let _ = c.tx.send(msg);
        }
    }

    async fn broadcast(&self, obs: ObservationMessage) {
        let clients = self.clients.read().await;
        for c in clients.iter().filter(|c| c.handshaken && c.stream_observations) {
            let _ = c.tx.send(ClientOutbound::Observation(obs.clone()));
        }
    }
}

/// Handle to a connected client
struct ClientHandle {
    id: u64,
    stream_observations: bool,
    handshaken: bool,
    last_seq: Option<u64>,
    tx: mpsc::UnboundedSender<ClientOutbound>,
}

#[derive(Debug, Clone)]
enum ClientOutbound {
    Ack(AckMessage),
    Error(ErrorMessage),
    Welcome(WelcomeMessage),
    Observation(ObservationMessage),
}

/// Start the TCP server
///
/// `ready_tx` receives the bound address once the listener is up.
pub async fn run_server(
    config: ServerConfig,
    command_tx: mpsc::Sender<InboundCommand>,
    mut out_rx: mpsc::UnboundedReceiver<OutboundMessage>,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.bind_addr()).await?;
    let bound = listener.local_addr()?;
    info!(addr = %bound, "control adapter listening");
    if let Some(tx) = ready_tx {
        let _ = tx.send(bound);
    }

    let state = Arc::new(ServerState::new(config));
    let mut client_id_counter = 0u64;

    // Outbound dispatcher.
    {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                match msg {
                    OutboundMessage::ToClientAck { client_id, ack } => {
                        state.send_to(client_id, ClientOutbound::Ack(ack)).await;
                    }
                    OutboundMessage::ToClientError { client_id, err } => {
                        state.send_to(client_id, ClientOutbound::Error(err)).await;
                    }
                    OutboundMessage::ToClientObservation { client_id, obs } => {
                        state
                            .send_to(client_id, ClientOutbound::Observation(obs))
                            .await;
                    }
                    OutboundMessage::BroadcastObservation { obs } => {
                        state.broadcast(obs).await;
                    }
                }
            }
        });
    }

    loop {
        let (socket, addr) = listener.accept().await?;
        client_id_counter += 1;
        let client_id = client_id_counter;

        info!(client_id, %addr, "client connected");

        let state = Arc::clone(&state);
        let command_tx = command_tx.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_client(socket, client_id, state, command_tx).await {
                warn!(client_id, error = %e, "client error");
            }
            info!(client_id, "client disconnected");
        });
    }
}

/// Handle a single client connection
async fn handle_client(
    socket: TcpStream,
    client_id: u64,
    state: Arc<ServerState>,
    command_tx: mpsc::Sender<InboundCommand>,
) -> anyhow::Result<()> {
    let (reader, mut writer) = tokio::io::split(socket);
    let mut reader = BufReader::new(reader);

    let (tx, mut rx) = mpsc::unbounded_channel::<ClientOutbound>();

    {
        let mut clients = state.clients.write().await;
        clients.push(ClientHandle {
            id: client_id,
            stream_observations: false,
            handshaken: false,
            last_seq: None,
            tx: tx.clone(),
        });
    }

    let write_task = tokio::spawn(async move {
        let mut buf: Vec<u8> = Vec::with_capacity(4096);
        while let Some(msg) = rx.recv().await {
            buf.clear();
            let encoded = match &msg {
                ClientOutbound::Ack(v) => serde_json::to_writer(&mut buf, v),
                ClientOutbound::Error(v) => serde_json::to_writer(&mut buf, v),
                ClientOutbound::Welcome(v) => serde_json::to_writer(&mut buf, v),
                ClientOutbound::Observation(v) => serde_json::to_writer(&mut buf, v),
            };
            if encoded.is_err() {
                continue;
            }
            buf.push(b'\n');
            if writer.write_all(&buf).await.is_err() {
                break;
            }
            if writer.flush().await.is_err() {
                break;
            }
        }
    });

    let reply_error = |seq: u64, code: ErrorCode, message: &str| {
        let _ = tx.send(ClientOutbound::Error(create_error(seq, code, message)));
    };

    let mut line = String::new();
    let mut result = Ok(());
    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                // Cleanup below must still run.
                result = Err(e.into());
                break;
            }
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        debug!(client_id, line = trimmed, "inbound");

        let parsed = match parse_message(trimmed) {
            Ok(p) => p,
            Err(e) => {
                let seq = extract_seq_best_effort(trimmed).unwrap_or(0);
                reply_error(
                    seq,
                    ErrorCode::InvalidCommand,
                    &format!("JSON parse error: {}", e),
                );
                continue;
            }
        };

        let seq = match &parsed {
            ParsedMessage::Hello(m) => m.seq,
            ParsedMessage::Command(m) => m.seq,
            ParsedMessage::Control(m) => m.seq,
            ParsedMessage::Unknown(m) => m.seq,
        };
        let handshaken = state.is_handshaken(client_id).await;

        if !handshaken && !matches!(parsed, ParsedMessage::Hello(_)) {
            reply_error(seq, ErrorCode::HandshakeRequired, "Send hello first");
            continue;
        }

        // Sequencing: enforce monotonic seq per sender.
        if handshaken && !state.check_and_update_seq(client_id, seq).await {
            reply_error(
                seq,
                ErrorCode::InvalidCommand,
                "seq must be strictly increasing",
            );
            continue;
        }

        match parsed {
            ParsedMessage::Hello(hello) => {
                if handshaken {
                    reply_error(seq, ErrorCode::InvalidCommand, "Already handshaken");
                    continue;
                }
                if !state.config.accepts_version(&hello.protocol_version) {
                    reply_error(
                        seq,
                        ErrorCode::ProtocolMismatch,
                        &format!(
                            "Protocol version {} not supported",
                            hello.protocol_version
                        ),
                    );
                    break;
                }

                // First client to hello becomes controller.
                let (role, controller_id) = {
                    let mut controller = state.controller.write().await;
                    let mut clients = state.clients.write().await;
                    if let Some(client) = clients.iter_mut().find(|c| c.id == client_id) {
                        client.handshaken = true;
                        client.last_seq = Some(hello.seq);
                        client.stream_observations = hello.requested.stream_observations;
                    }
                    if controller.is_none() {
                        *controller = Some(client_id);
                        info!(client_id, client = %hello.client.name, "client is now controller");
                        (AssignedRole::Controller, Some(client_id))
                    } else {
                        (AssignedRole::Observer, *controller)
                    }
                };

                let welcome = create_welcome(
                    hello.seq,
                    &state.config.protocol_version,
                    client_id,
                    role,
                    controller_id,
                );
                let _ = tx.send(ClientOutbound::Welcome(welcome));

                if hello.requested.stream_observations {
                    let request = InboundCommand {
                        client_id,
                        seq: hello.seq,
                        payload: InboundPayload::SnapshotRequest,
                    };
                    // Waits for queue space; only this client's reader stalls.
                    if command_tx.send(request).await.is_err() {
                        warn!(client_id, "game loop gone, no initial observation");
                    }
                }
            }

            ParsedMessage::Command(cmd) => {
                if !state.is_controller(client_id).await {
                    reply_error(
                        cmd.seq,
                        ErrorCode::NotController,
                        "Only controller may send commands",
                    );
                    continue;
                }

                let actions = cmd.actions.0.iter().map(|&a| GameAction::from(a)).collect();

                // Backpressure: bounded queue. Ack comes from the game loop.
                if command_tx
                    .try_send(InboundCommand {
                        client_id,
                        seq: cmd.seq,
                        payload: InboundPayload::Command(ClientCommand::Actions(actions)),
                    })
                    .is_err()
                {
                    reply_error(cmd.seq, ErrorCode::Backpressure, "Command queue is full");
                }
            }

            ParsedMessage::Control(ctrl) => {
                let mut controller = state.controller.write().await;
                match ctrl.action {
                    ControlAction::Claim if controller.is_none() => {
                        *controller = Some(client_id);
                        info!(client_id, "client claimed control");
                        let _ = tx.send(ClientOutbound::Ack(create_ack(ctrl.seq)));
                    }
                    ControlAction::Claim if *controller == Some(client_id) => {
                        let _ = tx.send(ClientOutbound::Ack(create_ack(ctrl.seq)));
                    }
                    ControlAction::Claim => {
                        reply_error(
                            ctrl.seq,
                            ErrorCode::ControllerActive,
                            "Controller already assigned",
                        );
                    }
                    ControlAction::Release if *controller == Some(client_id) => {
                        *controller = None;
                        info!(client_id, "client released control");
                        let _ = tx.send(ClientOutbound::Ack(create_ack(ctrl.seq)));
                    }
                    ControlAction::Release => {
                        reply_error(
                            ctrl.seq,
                            ErrorCode::NotController,
                            "Only controller may release",
                        );
                    }
                }
            }

            ParsedMessage::Unknown(m) => {
                reply_error(m.seq, ErrorCode::InvalidCommand, "Unknown message type");
            }
        }
    }

    // Remove client and promote the next handshaken client if it held control.
    {
        let mut controller = state.controller.write().await;
        let mut clients = state.clients.write().await;

        clients.retain(|c| c.id != client_id);

        if *controller == Some(client_id) {
            let next_id = clients.iter().filter(|c| c.handshaken).map(|c| c.id).min();
            *controller = next_id;
            match next_id {
                Some(new_id) => info!(client_id = new_id, "controller promoted"),
                None => info!(client_id, "controller released on disconnect"),
            }
        }
    }

    drop(tx);
    let _ = write_task.await;

    result
}

/// Apply one command to the game, validating every cell first.
///
/// Nothing is applied when any action names a cell outside the board.
/// Past that check the actions run in order and stop at the first failure,
/// a `restart` that cannot deal; the actions before it stay applied.
pub fn apply_command<D: DeckProvider>(
    game: &mut GameController<D>,
    command: &ClientCommand,
) -> Result<(), (ErrorCode, String)> {
    let ClientCommand::Actions(actions) = command;

    for action in actions {
        let cell = match *action {
            GameAction::Select { row, col } => Some((row, col)),
            GameAction::RevealAnimationFinished { row, col } => Some((row, col)),
            _ => None,
        };
        if let Some((row, col)) = cell {
            if !game.board().contains(row, col) {
                return Err((
                    ErrorCode::InvalidCell,
                    format!(
                        "card ({}, {}) is outside the {}x{} board",
                        row,
                        col,
                        game.board().rows(),
                        game.board().cols()
                    ),
                ));
            }
        }
    }

    for &action in actions {
        game.apply_action(action)
            .map_err(|e| (ErrorCode::InvalidCommand, e.to_string()))?;
    }
    Ok(())
}

/// Hash of everything an observation shows about the game.
pub fn state_hash<D: DeckProvider>(game: &GameController<D>) -> StateHash {
    use std::hash::{Hash, Hasher};

    let mut hasher = Fnv1aHasher::new();
    game.board().rows().hash(&mut hasher);
    game.board().cols().hash(&mut hasher);
    for (_, card) in game.board().iter() {
        // Face-down content must not leak through the hash.
        card.face_up()
            .then(|| &card.content().text)
            .hash(&mut hasher);
        card.face_up().hash(&mut hasher);
        card.matched().hash(&mut hasher);
        card.enabled().hash(&mut hasher);
        card.flip_pulse().hash(&mut hasher);
    }
    game.phase().hash(&mut hasher);
    game.matched_pairs().hash(&mut hasher);
    game.has_pending_reveal().hash(&mut hasher);
    game.completion_visible().hash(&mut hasher);
    game.completion_pulse().hash(&mut hasher);
    game.episode_id().hash(&mut hasher);
    StateHash(hasher.finish())
}

/// Build observation message from game state
pub fn build_observation<D: DeckProvider>(
    game: &GameController<D>,
    seq: u64,
    events: &[GameEvent],
) -> ObservationMessage {
    let cards = game
        .board()
        .iter()
        .map(|(_, card)| CardObservation {
            text: card.face_up().then(|| card.content().text.clone()),
            face_up: card.face_up(),
            matched: card.matched(),
            enabled: card.enabled(),
            flip_pulse: card.flip_pulse(),
        })
        .collect();

    ObservationMessage {
        msg_type: ObservationType::Observation,
        seq,
        ts: current_timestamp_ms(),
        episode_id: game.episode_id(),
        phase: game.phase().into(),
        playable: !game.won(),
        board: BoardObservation {
            rows: game.board().rows(),
            cols: game.board().cols(),
            cards,
        },
        matched_pairs: game.matched_pairs(),
        total_pairs: game.total_pairs(),
        pending_reveal_ms: game.pending_reveal_ms(),
        completion: CompletionObservation {
            visible: game.completion_visible(),
            pulse: game.completion_pulse(),
        },
        events: events.iter().map(|&e| EventLower::from(e)).collect(),
        state_hash: state_hash(game),
    }
}
