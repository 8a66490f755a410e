//! Tequmsa Relay — in-memory update relay over HTTP

pub mod server;

pub use server::{router, start_relay, RelayState};
