// Not every suite uses every helper.
#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
    Mutex,
};

use balcao_engine::{
    db_types::{NotificationType, Order, OrderId},
    NotificationDispatcher,
    NotificationError,
};

/// A dispatcher that records every message it is asked to deliver, and can be told to fail.
#[derive(Clone, Default)]
pub struct RecordingDispatcher {
    delivered: Arc<Mutex<Vec<(NotificationType, OrderId)>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_all(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn delivered(&self) -> Vec<(NotificationType, OrderId)> {
        self.delivered.lock().unwrap().clone()
    }

    pub fn delivered_count(&self) -> usize {
        self.delivered.lock().unwrap().len()
    }
}

impl NotificationDispatcher for RecordingDispatcher {
    async fn notify(&self, event: NotificationType, order: &Order) -> Result<(), NotificationError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotificationError::DeliveryFailed {
                event: event.to_string(),
                message: "messenger unreachable".to_string(),
            });
        }
        self.delivered.lock().unwrap().push((event, order.order_id.clone()));
        Ok(())
    }
}

pub fn init_logging() {
    let _ = env_logger::try_init();
}
