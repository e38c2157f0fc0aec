mod data_objects;
mod notifications;
mod payment_pipeline_database;

pub use data_objects::AmendedOrder;
pub use notifications::{NotificationDispatcher, NotificationError};
pub use payment_pipeline_database::{PaymentPipelineDatabase, PaymentPipelineError};
