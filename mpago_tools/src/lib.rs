//! A small client for a Mercado Pago-style instant-payment gateway.
//!
//! Creating PIX payments and polling their status are the only two calls the counter needs.
//! Everything goes through a bounded exponential-backoff [`retry::RetryPolicy`], since the
//! gateway is the flakiest dependency in the stack.

mod api;
mod config;
mod data_objects;
mod error;
pub mod retry;

pub use api::MpagoApi;
pub use config::MpagoConfig;
pub use data_objects::{Payer, PaymentState, PixPayment};
pub use error::MpagoApiError;
