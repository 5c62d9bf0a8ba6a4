//! The thread that owns the SQLite connection.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::thread;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error};

use super::StoreState;
use crate::error::{Result, VitalsError};

pub(crate) type Job = Box<dyn FnOnce(&mut StoreState) + Send + 'static>;

/// Result of a job queued on the store worker.
///
/// Dropping a `Pending` does not cancel the job; it still runs, and its
/// result is discarded.
#[must_use = "the job runs either way; await it to observe the result"]
#[derive(Debug)]
pub struct Pending<T> {
    rx: oneshot::Receiver<Result<T>>,
}

impl<T> Pending<T> {
    pub(crate) fn new(rx: oneshot::Receiver<Result<T>>) -> Self {
        Self { rx }
    }
}

impl<T> Future for Pending<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(VitalsError::WorkerStopped)))
    }
}

/// Start the worker. Jobs run one at a time in the order received.
///
/// The loop ends after a job marks the state as closing, or once every
/// sender is gone; either way unsaved changes are persisted first.
pub(crate) fn spawn(state: StoreState) -> Result<mpsc::UnboundedSender<Job>> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Job>();

    thread::Builder::new()
        .name("vitals-store".to_string())
        .spawn(move || {
            let mut state = state;
            while let Some(job) = rx.blocking_recv() {
                job(&mut state);
                if state.closing {
                    break;
                }
            }
            if let Err(err) = state.persist() {
                error!(error = %err, "failed to persist store on shutdown");
            }
            debug!("store worker stopped");
        })?;

    Ok(tx)
}
