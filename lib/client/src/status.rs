//! Background polling of MT5 account connectivity.
//!
//! Execution is only allowed while an MT5 account is connected. Rather than
//! asking the backend on every run, a monitor polls on an interval and
//! publishes the latest answer; readers see the cached value.

use crate::api::WorkflowApi;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// Read side of the cached connectivity.
#[derive(Debug, Clone)]
pub struct BrokerStatus {
    rx: watch::Receiver<bool>,
}

impl BrokerStatus {
    /// A status that never changes.
    #[must_use]
    pub fn fixed(connected: bool) -> Self {
        let (_tx, rx) = watch::channel(connected);
        Self { rx }
    }

    /// The cached value. Never touches the network.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        *self.rx.borrow()
    }

    /// Waits for the next published value.
    ///
    /// Returns `None` once the publisher is gone.
    pub async fn changed(&mut self) -> Option<bool> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }
}

/// Polls `GET /mt5/accounts` and publishes whether any account is connected.
///
/// The polling task stops when the monitor is dropped.
pub struct BrokerStatusMonitor {
    api: Arc<dyn WorkflowApi>,
    tx: Arc<watch::Sender<bool>>,
    task: JoinHandle<()>,
}

impl BrokerStatusMonitor {
    /// Starts polling. The first poll happens immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(api: Arc<dyn WorkflowApi>, interval: Duration) -> Self {
        let (tx, _rx) = watch::channel(false);
        let tx = Arc::new(tx);

        let task = {
            let api = api.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    poll(api.as_ref(), &tx).await;
                }
            })
        };

        Self { api, tx, task }
    }

    /// Polls once right now and returns the new value.
    pub async fn refresh(&self) -> bool {
        poll(self.api.as_ref(), &self.tx).await
    }

    /// A handle to the cached value.
    #[must_use]
    pub fn status(&self) -> BrokerStatus {
        BrokerStatus {
            rx: self.tx.subscribe(),
        }
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        *self.tx.borrow()
    }

    /// Stops polling. The last value stays readable.
    pub fn shutdown(&self) {
        self.task.abort();
    }
}

impl Drop for BrokerStatusMonitor {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn poll(api: &dyn WorkflowApi, tx: &watch::Sender<bool>) -> bool {
    let connected = match api.list_mt5_accounts().await {
        Ok(accounts) => accounts.iter().any(|a| a.is_connected),
        Err(e) => {
            warn!(error = %e, "broker status poll failed");
            false
        }
    };
    debug!(connected, "broker status");
    tx.send_if_modified(|current| {
        let changed = *current != connected;
        *current = connected;
        changed
    });
    connected
}
