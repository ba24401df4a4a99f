//! Crowd Helm - authoritative turn server for a crowd-voted grid ship battle
//!
//! Viewers vote on the player ship's next move; every turn the engine
//! resolves the winning action, lets the opponent answer, and broadcasts
//! a full snapshot to every connected client.

pub mod app;
pub mod chat;
pub mod config;
pub mod game;
pub mod http;
pub mod maps;
pub mod util;
pub mod ws;
