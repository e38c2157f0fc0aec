//! SQLite backend for the payment pipeline.

mod confirmation_log;
mod db;
mod menu;
mod notifications;
mod order_items;
mod orders;

pub use db::SqliteDatabase;
