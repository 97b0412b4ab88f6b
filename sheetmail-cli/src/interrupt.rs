//! Ctrl-C handling during a batch.
//!
//! The first interrupt sets the run's [`CancelFlag`]: the file being written
//! is finished, the rest are skipped and the manifest still records the run.

use std::future::Future;
use std::io;
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};

use sheetmail_batch::CancelFlag;

/// Cancel `cancel` when the process receives Ctrl-C.
pub fn cancel_on_ctrl_c(cancel: CancelFlag) -> Result<JoinHandle<()>> {
    cancel_on(cancel, tokio::signal::ctrl_c)
}

fn cancel_on<S, F>(cancel: CancelFlag, signal: S) -> Result<JoinHandle<()>>
where
    S: FnOnce() -> F + Send + 'static,
    F: Future<Output = io::Result<()>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start signal runtime")?;
    thread::Builder::new()
        .name("sheetmail-interrupt".to_string())
        .spawn(move || {
            runtime.block_on(async move {
                match signal().await {
                    Ok(()) => {
                        tracing::warn!("received ctrl-c, stopping after the current file");
                        cancel.cancel();
                    }
                    Err(err) => tracing::warn!(error = %err, "ctrl-c handler failed"),
                }
            })
        })
        .context("failed to spawn interrupt watcher")
}
