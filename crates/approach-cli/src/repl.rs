//! Blocking line reader.
//!
//! The terminal read blocks, so it runs on its own worker thread feeding a
//! channel. Socket I/O keeps flowing while the user thinks; the session
//! only consumes a line when the service has signalled `readyForCommand`.

use std::io::BufRead;

use tokio::sync::mpsc;
use tracing::debug;

/// Spawns the stdin reader worker and returns its line channel.
///
/// The channel closes when stdin reaches end of input or the receiver is
/// dropped.
pub fn spawn_line_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(1);

    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
        debug!("line reader finished");
    });

    rx
}
