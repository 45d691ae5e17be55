//! # parley-server
//!
//! The Parley messaging server: a single process accepting long-lived
//! TLS connections, authenticating users, and fanning out live messages
//! and state refreshes to online participants.
//!
//! The binary entry point lives in `main.rs`; everything else is a
//! library so integration tests can run a real server in-process.
//!
//! ## Architecture
//!
//! ```text
//! client ──TLS──▶ dispatch (one read task per connection)
//!                    │ typed ClientMessage
//!                    ▼
//!                handlers (auth / contact / conv / chat)
//!                    │
//!          ┌─────────┴──────────┐
//!          ▼                    ▼
//!      parley-db            notify (fan-out)
//!   (single async mutex)        │
//!                               ▼
//!                    per-connection write queues
//! ```
//!
//! Every connection owns an unbounded outbound queue drained by a
//! dedicated writer task, so a handler can enqueue pushes to any number
//! of peers without blocking on their sockets, and writes to one peer
//! are never interleaved.

pub mod config;
pub mod dispatch;
pub mod handlers;
pub mod notify;
pub mod registry;
pub mod state;
pub mod tls;
