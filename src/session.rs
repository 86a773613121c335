//! Host-side game session.
//!
//! Owns the controller and turns adapter traffic into game actions and
//! outbound replies. No I/O happens here, so the whole loop body is testable
//! without a socket.

use tracing::{debug, warn};

use crate::adapter::protocol::{create_ack, create_error, StateHash};
use crate::adapter::server::{apply_command, build_observation, state_hash};
use crate::adapter::{InboundCommand, InboundPayload, OutboundMessage};
use crate::core::{DeckProvider, GameController};
use crate::types::GameEvent;

#[derive(Debug)]
pub struct GameSession<D: DeckProvider> {
    game: GameController<D>,
    seq: u64,
    last_broadcast: Option<StateHash>,
    unsent_events: Vec<GameEvent>,
}

impl<D: DeckProvider> GameSession<D> {
    pub fn new(game: GameController<D>) -> Self {
        Self {
            game,
            seq: 0,
            last_broadcast: None,
            unsent_events: Vec::new(),
        }
    }

    pub fn game(&self) -> &GameController<D> {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut GameController<D> {
        &mut self.game
    }

    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    /// Apply one inbound message and queue the replies into `out`.
    pub fn handle(&mut self, inbound: InboundCommand, out: &mut Vec<OutboundMessage>) {
        let InboundCommand {
            client_id,
            seq,
            payload,
        } = inbound;

        match payload {
            InboundPayload::SnapshotRequest => {
                let obs_seq = self.next_seq();
                out.push(OutboundMessage::ToClientObservation {
                    client_id,
                    obs: build_observation(&self.game, obs_seq, &[]),
                });
            }
            InboundPayload::Command(command) => match apply_command(&mut self.game, &command) {
                Ok(()) => {
                    debug!(client_id, seq, "command applied");
                    out.push(OutboundMessage::ToClientAck {
                        client_id,
                        ack: create_ack(seq),
                    });
                }
                Err((code, message)) => {
                    warn!(client_id, seq, ?code, %message, "command rejected");
                    out.push(OutboundMessage::ToClientError {
                        client_id,
                        err: create_error(seq, code, &message),
                    });
                }
            },
        }
    }

    /// Advance game time.
    pub fn tick(&mut self, elapsed_ms: u32) {
        self.game.tick(elapsed_ms);
    }

    /// Observation for all streaming clients, if the state changed since the
    /// last broadcast. Events accumulate until then.
    pub fn poll_broadcast(&mut self) -> Option<OutboundMessage> {
        self.unsent_events.extend(self.game.take_events());

        let hash = state_hash(&self.game);
        if self.last_broadcast == Some(hash) {
            return None;
        }
        self.last_broadcast = Some(hash);

        let seq = self.next_seq();
        let obs = build_observation(&self.game, seq, &self.unsent_events);
        self.unsent_events.clear();
        Some(OutboundMessage::BroadcastObservation { obs })
    }
}
