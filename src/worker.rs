//! Background execution of an organize run.
//!
//! The worker owns its [`OrganizePlan`] and talks back over two channels:
//! an unbounded stream of [`Progress`] events and a one-shot channel that
//! carries the final result. Only the thread holding the
//! [`OrganizeHandle`] reads them.

use crate::file_organizer::{OrganizeError, OrganizePlan, OrganizeReport, OrganizeResult, Progress};
use crossbeam_channel::{Receiver, bounded, select, unbounded};
use std::thread::{self, JoinHandle};

/// Handle to an organize run on the worker thread.
pub struct OrganizeHandle {
    progress_rx: Receiver<Progress>,
    result_rx: Receiver<OrganizeResult<OrganizeReport>>,
    thread: Option<JoinHandle<()>>,
}

/// Starts `plan` on a new worker thread.
pub fn spawn_organize(plan: OrganizePlan) -> OrganizeHandle {
    let (progress_tx, progress_rx) = unbounded();
    let (result_tx, result_rx) = bounded(1);

    let thread = thread::Builder::new()
        .name("organize".to_string())
        .spawn(move || {
            log::debug!("Organize worker started for {}", plan.root().display());
            let result = plan.execute(|progress| {
                let _ = progress_tx.send(progress.clone());
            });
            if let Err(e) = &result {
                log::warn!("Organize worker failed: {}", e);
            }
            let _ = result_tx.send(result);
        });

    match thread {
        Ok(thread) => OrganizeHandle {
            progress_rx,
            result_rx,
            thread: Some(thread),
        },
        Err(e) => {
            log::warn!("Could not start organize worker: {}", e);
            // Senders are gone, so waiting reports a disconnected worker.
            OrganizeHandle {
                progress_rx,
                result_rx,
                thread: None,
            }
        }
    }
}

impl OrganizeHandle {
    /// Blocks until the worker reports, passing every progress event to
    /// `on_progress` along the way.
    ///
    /// A worker that exits without sending a result (for example after a
    /// panic) yields [`OrganizeError::WorkerDisconnected`].
    pub fn wait(mut self, mut on_progress: impl FnMut(&Progress)) -> OrganizeResult<OrganizeReport> {
        let mut progress_open = true;
        let result = loop {
            if progress_open {
                select! {
                    recv(self.progress_rx) -> msg => match msg {
                        Ok(progress) => on_progress(&progress),
                        Err(_) => progress_open = false,
                    },
                    recv(self.result_rx) -> msg => break msg,
                }
            } else {
                break self.result_rx.recv();
            }
        };

        for progress in self.progress_rx.try_iter() {
            on_progress(&progress);
        }
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            log::warn!("Organize worker panicked");
        }

        result.unwrap_or(Err(OrganizeError::WorkerDisconnected))
    }
}
