//! Rebuild-on-change driver.
//!
//! Out of the core's scope (spec §1, §9): the core stays synchronous and
//! stateless. This module owns the event source and calls the pure
//! [`crate::compile`] entry point on each event, serializing rebuilds on a
//! single thread so each invocation is atomic.

use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;

use notify::{RecursiveMode, Watcher};

use crate::error::CliError;

/// Watch `src` for any filesystem change and invoke `on_change` once per
/// batch of events, serially. Blocks until the watcher's channel closes or
/// an I/O error occurs.
pub fn watch(src: &Path, mut on_change: impl FnMut() -> Result<(), CliError>) -> Result<(), CliError> {
    let (tx, rx) = mpsc::channel();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        // Drop the send error silently: it only fires after `rx` is gone,
        // which happens when this function is already returning.
        let _ = tx.send(res);
    })
    .map_err(|e| CliError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;

    watcher
        .watch(src, RecursiveMode::Recursive)
        .map_err(|e| CliError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;

    log::info!("watching {} for changes", src.display());

    loop {
        match rx.recv_timeout(Duration::from_millis(200)) {
            Ok(Ok(event)) => {
                log::debug!("fs event: {event:?}");
                on_change()?;
            }
            Ok(Err(err)) => {
                log::warn!("watcher error: {err}");
            }
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => return Ok(()),
        }
    }
}
