//! Parley is a chat client for OpenAI-compatible LLM APIs with two
//! switchable conversation-memory strategies.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns conversation state: the dual-representation store, the
//!   assistant orchestrator, prompt rendering, and configuration.
//! - [`api`] defines chat payloads and the HTTP client used to reach the
//!   completion endpoint.
//! - [`commands`] implements slash-command parsing and execution shared
//!   by both adapters.
//! - [`ui`] runs the line-oriented terminal loop.
//! - [`server`] exposes the same conversation over HTTP.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod commands;
pub mod core;
pub mod logging;
pub mod server;
pub mod ui;
