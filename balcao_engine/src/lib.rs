//! Balcão Payment Engine
//!
//! The core of the counter's order-taking platform: the order payment and fulfillment
//! coordination pipeline. This library is storage-agnostic at the API level and ships a SQLite
//! backend.
//!
//! The library is divided into three main sections:
//! 1. Database types and access ([`mod@db_types`], the SQLite backend). You should never need
//!    to run queries directly; use the public APIs instead. The data types are public.
//! 2. The pipeline traits ([`mod@traits`]): the [`PaymentPipelineDatabase`] storage contract
//!    and the [`NotificationDispatcher`] outward-messaging contract. Backends and messaging
//!    channels implement these.
//! 3. The pipeline APIs: [`PaymentConfirmationApi`] (the confirmation coordinator),
//!    [`OrderAmendmentApi`] (mid-flight item additions) and [`OrderFlowApi`] (intake, status
//!    changes, payment artifacts).

mod bpe_api;
pub mod db_types;
mod sqlite;
pub mod status;
#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;
pub mod traits;

pub use bpe_api::{
    amendment_api::OrderAmendmentApi,
    confirmation_api::{PaymentConfirmationApi, DEDUP_WINDOW_SECONDS},
    order_flow_api::OrderFlowApi,
    order_objects,
};
pub use sqlite::SqliteDatabase;
pub use traits::{
    AmendedOrder,
    NotificationDispatcher,
    NotificationError,
    PaymentPipelineDatabase,
    PaymentPipelineError,
};
