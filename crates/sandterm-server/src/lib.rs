//! Sandterm server library - HTTP/WebSocket front end for sandbox consoles.
//!
//! This library provides the HTTP routes, WebSocket handlers, and application state
//! for the Sandterm server. It's separated from main.rs to enable integration testing.

pub mod config;
pub mod logging;
pub mod routes;
pub mod state;
pub mod websocket;
