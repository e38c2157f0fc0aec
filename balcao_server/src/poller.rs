//! The client-side payment status poller.
//!
//! A PIX code is paid out-of-band, so after creating one the server polls the gateway until
//! the payment settles or the code expires. The webhook usually wins this race; the poller is
//! the fallback for lost webhooks, and the confirmation coordinator makes the double delivery
//! harmless.

use std::{collections::HashMap, sync::Arc, time::Duration};

use balcao_engine::{
    db_types::{ConfirmationSource, OrderId, PaymentMethod},
    PaymentConfirmationApi,
    SqliteDatabase,
};
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use log::*;
use mpago_tools::{MpagoApi, MpagoApiError, PaymentState};
use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
};

use crate::messenger::Messenger;

/// Where the poller asks for a payment's current state. Object-safe so tests can substitute a
/// scripted gateway.
pub trait PaymentStatusSource: Send + Sync + 'static {
    fn payment_status<'a>(&'a self, payment_id: &'a str) -> BoxFuture<'a, Result<PaymentState, MpagoApiError>>;
}

impl PaymentStatusSource for MpagoApi {
    fn payment_status<'a>(&'a self, payment_id: &'a str) -> BoxFuture<'a, Result<PaymentState, MpagoApiError>> {
        Box::pin(MpagoApi::payment_status(self, payment_id))
    }
}

/// How a poll loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The gateway reported the payment approved and the confirmation went through.
    Confirmed,
    /// The gateway closed the payment without money changing hands.
    Closed(PaymentState),
    /// The PIX code expired before the payment settled. The caller must start a new payment
    /// cycle.
    TimedOut,
    /// A newer poll loop for the same order replaced this one.
    Superseded,
    /// The payment was approved but the confirmation was rejected (e.g. the order was
    /// cancelled in the meantime).
    ConfirmationFailed(String),
}

#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self { interval: Duration::from_secs(5) }
    }
}

/// Keeps at most one active poll loop per order. Starting a loop for an order cancels the
/// previous one; cancellation has no side effects on the order.
#[derive(Clone)]
pub struct PollerRegistry {
    db: SqliteDatabase,
    messenger: Messenger,
    source: Arc<dyn PaymentStatusSource>,
    config: PollerConfig,
    active: Arc<Mutex<HashMap<OrderId, watch::Sender<bool>>>>,
}

impl PollerRegistry {
    pub fn new(db: SqliteDatabase, messenger: Messenger, source: Arc<dyn PaymentStatusSource>, config: PollerConfig) -> Self {
        Self { db, messenger, source, config, active: Arc::new(Mutex::new(HashMap::new())) }
    }

    /// Registers a poll loop for the given payment. Any loop already running for this order is
    /// told to stand down first.
    pub async fn start_polling(
        &self,
        order_id: OrderId,
        payment_id: String,
        expires_at: DateTime<Utc>,
    ) -> JoinHandle<PollOutcome> {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        {
            let mut active = self.active.lock().await;
            if let Some(previous) = active.insert(order_id.clone(), cancel_tx) {
                if previous.send(true).is_ok() {
                    info!("⏱️ Superseding the running poll loop for order {order_id}");
                }
            }
        }
        let db = self.db.clone();
        let messenger = self.messenger.clone();
        let source = Arc::clone(&self.source);
        let interval = self.config.interval;
        let registry = Arc::clone(&self.active);
        info!("⏱️ Poll loop for order {order_id} started (payment {payment_id}, expires {expires_at})");
        tokio::spawn(async move {
            let outcome =
                poll_until_settled(db, messenger, source, interval, order_id.clone(), payment_id, expires_at, cancel_rx)
                    .await;
            // Deregister, unless a newer loop owns the entry by now. Our receiver is gone, so
            // a closed sender in the map is necessarily ours.
            let mut active = registry.lock().await;
            if active.get(&order_id).is_some_and(|tx| tx.is_closed()) {
                active.remove(&order_id);
            }
            outcome
        })
    }

    /// Whether a poll loop is currently registered for this order.
    pub async fn is_polling(&self, order_id: &OrderId) -> bool {
        self.active.lock().await.contains_key(order_id)
    }
}

/// Resolves only on an explicit cancel signal. A dropped sender means the registry is gone and
/// nothing can supersede this loop any more, so the wait never completes.
async fn wait_for_cancellation(rx: &mut watch::Receiver<bool>) {
    loop {
        if rx.changed().await.is_err() {
            futures::future::pending::<()>().await;
        }
        if *rx.borrow() {
            return;
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn poll_until_settled(
    db: SqliteDatabase,
    messenger: Messenger,
    source: Arc<dyn PaymentStatusSource>,
    interval: Duration,
    order_id: OrderId,
    payment_id: String,
    expires_at: DateTime<Utc>,
    mut cancel_rx: watch::Receiver<bool>,
) -> PollOutcome {
    let api = PaymentConfirmationApi::new(db, messenger);
    let mut timer = tokio::time::interval(interval);
    timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = wait_for_cancellation(&mut cancel_rx) => {
                debug!("⏱️ Poll loop for order {order_id} stood down");
                return PollOutcome::Superseded;
            },
            _ = timer.tick() => {
                if Utc::now() >= expires_at {
                    info!("⏱️ PIX code for order {order_id} expired before the payment settled");
                    return PollOutcome::TimedOut;
                }
                match source.payment_status(&payment_id).await {
                    Ok(PaymentState::Approved) => {
                        debug!("⏱️ Payment {payment_id} for order {order_id} approved");
                        return match api
                            .confirm_payment(
                                &order_id,
                                ConfirmationSource::Gateway,
                                Some(PaymentMethod::Pix),
                                Some(payment_id.clone()),
                            )
                            .await
                        {
                            Ok(_) => PollOutcome::Confirmed,
                            Err(e) => {
                                error!("⏱️ Payment {payment_id} approved but order {order_id} could not be confirmed: {e}");
                                PollOutcome::ConfirmationFailed(e.to_string())
                            },
                        };
                    },
                    Ok(state) if state.is_final() => {
                        info!("⏱️ Payment {payment_id} for order {order_id} closed as {state}");
                        return PollOutcome::Closed(state);
                    },
                    Ok(state) => trace!("⏱️ Payment {payment_id} for order {order_id} still {state}"),
                    // The transport has already retried; treat a persistent failure as a missed
                    // poll and try again on the next tick.
                    Err(e) => warn!("⏱️ Could not poll payment {payment_id} for order {order_id}: {e}"),
                }
            },
        }
    }
}
