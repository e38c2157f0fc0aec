//! # Balcão Payment Pipeline server
//! The HTTP face of the counter's order pipeline. It is responsible for:
//! * order intake and mid-flight item additions,
//! * creating PIX payments at the gateway and polling them until they settle,
//! * receiving gateway webhooks (and never trusting their payloads),
//! * manual staff payment confirmation and kitchen-side status changes.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more
//! information.

pub mod config;
pub mod data_objects;
pub mod errors;
pub mod messenger;
pub mod poller;
pub mod routes;
pub mod server;
