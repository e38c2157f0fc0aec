mod money;
pub mod op;
mod secret;

pub use money::{Money, MoneyConversionError, COMMISSION_RATE_PERCENT};
pub use secret::Secret;
