// Copyright 2025 mobile_rag_engine contributors
// SPDX-License-Identifier: MIT

use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{PoisonError, RwLock};

use log::{Level, Metadata, Record};

/// Receiver of formatted lines while a host is attached; stdout otherwise.
static LOG_SINK: Lazy<RwLock<Option<Sender<String>>>> = Lazy::new(|| RwLock::new(None));

static LOGGER_INSTALLED: AtomicBool = AtomicBool::new(false);

/// Formats `[LEVEL][target] message` and routes it to the sink or stdout.
struct IndexLogger;

impl log::Log for IndexLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        #[cfg(debug_assertions)]
        {
            metadata.level() <= Level::Debug
        }
        #[cfg(not(debug_assertions))]
        {
            metadata.level() <= Level::Info
        }
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let msg = format!("[{}][{}] {}", record.level(), record.target(), record.args());

            if !forward_to_sink(&msg) {
                println!("{}", msg);
            }
        }
    }

    fn flush(&self) {}
}

static LOGGER: IndexLogger = IndexLogger;

/// Install the index logger as the `log` backend.
///
/// Repeat calls are no-ops. Debug builds emit `debug!` lines from indexing
/// and search; release builds stop at `info!`.
pub fn init_logger() -> anyhow::Result<()> {
    let first = LOGGER_INSTALLED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_ok();
    if !first {
        return Ok(());
    }

    #[cfg(debug_assertions)]
    let level = log::LevelFilter::Debug;
    #[cfg(not(debug_assertions))]
    let level = log::LevelFilter::Info;

    log::set_logger(&LOGGER)
        .map(|()| log::set_max_level(level))
        .map_err(|e| {
            LOGGER_INSTALLED.store(false, Ordering::SeqCst);
            anyhow::anyhow!("another logger is already installed: {}", e)
        })
}

/// Send every index and search log line to `sink` instead of stdout.
/// Replaces any previously attached sink.
pub fn init_log_stream(sink: Sender<String>) -> anyhow::Result<()> {
    let mut guard = LOG_SINK.write().map_err(|e| anyhow::anyhow!("log sink poisoned: {}", e))?;
    *guard = Some(sink);
    Ok(())
}

/// Detach the sink; lines go back to stdout.
pub fn close_log_stream() -> anyhow::Result<()> {
    let mut guard = LOG_SINK.write().map_err(|e| anyhow::anyhow!("log sink poisoned: {}", e))?;
    *guard = None;
    Ok(())
}

/// False when no sink is attached or its receiver has hung up.
fn forward_to_sink(msg: &str) -> bool {
    let guard = LOG_SINK.read().unwrap_or_else(PoisonError::into_inner);
    guard.as_ref().is_some_and(|sink| sink.send(msg.to_string()).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_init_logger_is_idempotent() {
        assert!(init_logger().is_ok());
        assert!(init_logger().is_ok());
    }

    #[test]
    fn test_stream_receives_lines_until_closed() {
        let (tx, rx) = mpsc::channel();
        init_log_stream(tx).unwrap();
        assert!(forward_to_sink("[INFO][rag_core] hello"));
        // Lines from tests running in parallel may be interleaved.
        assert!(rx.try_iter().any(|line| line == "[INFO][rag_core] hello"));

        close_log_stream().unwrap();
        assert!(!forward_to_sink("dropped"));
    }
}
