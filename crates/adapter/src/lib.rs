//! Adapter module - remote presentation layer over TCP with a JSON protocol
//!
//! The game core never draws anything. A presentation client (terminal UI,
//! GUI shell, test harness, agent) connects here, forwards taps and
//! animation acknowledgments, and renders from the observations it receives.
//!
//! # Protocol Overview
//!
//! **Line-delimited JSON** over TCP:
//!
//! 1. **Connection**: Client connects to TCP socket (default: 127.0.0.1:7777)
//! 2. **Handshake**: Client sends `hello`, server responds with `welcome`
//! 3. **Controller Assignment**: First client to hello becomes the controller
//! 4. **Observation Streaming**: Server sends an observation whenever the
//!    game state changes
//! 5. **Commanding**: Controller sends commands with a list of actions
//!
//! # Message Types
//!
//! ## Client → Server
//!
//! - **hello**: Initial handshake with client info and requested capabilities
//! - **command**: Up to 32 actions (`select`, `cancelReveal`,
//!   `revealAnimationFinished`, `completionAnimationFinished`, `restart`)
//! - **control**: Claim or release controller status
//!
//! ## Server → Client
//!
//! - **welcome**: Assigned client id and role
//! - **observation**: Board, phase, pair counts, pending reveal, completion
//!   banner and the events since the previous observation
//! - **ack**: The command was applied
//! - **error**: Error response with code and message
//!
//! Face-down cards are sent without their text.
//!
//! # Environment Variables
//!
//! - `MATCH_ADAPTER_HOST`: Bind address (default: "127.0.0.1")
//! - `MATCH_ADAPTER_PORT`: Port number (default: 7777)
//! - `MATCH_ADAPTER_MAX_PENDING`: Command queue depth (default: 10)
//! - `MATCH_ADAPTER_DISABLED`: Set to "1" or "true" to disable the adapter
//!
//! # Example Protocol Flow
//!
//! ```text
//! Client -> Server: {"type":"hello","seq":1,"ts":0,"client":{"name":"ui","version":"1.0.0"},"protocol_version":"1.0.0","requested":{"stream_observations":true}}
//! Server -> Client: {"type":"welcome","seq":1,"ts":0,"protocol_version":"1.0.0","client_id":1,"role":"controller",...}
//! Server -> Client: {"type":"observation","seq":1,"ts":0,"phase":"idle","board":{...},...}
//! Client -> Server: {"type":"command","seq":2,"ts":0,"actions":[{"action":"select","row":0,"col":1}]}
//! Server -> Client: {"type":"ack","seq":2,"ts":0,"status":"ok"}
//! ```

pub mod protocol;
pub mod runtime;
pub mod server;

pub use memory_match_core as core;
pub use memory_match_types as types;

// Re-export protocol types for convenience
pub use protocol::*;
pub use runtime::{Adapter, ClientCommand, InboundCommand, InboundPayload, OutboundMessage};
pub use server::{apply_command, build_observation, run_server, state_hash, ServerConfig};
