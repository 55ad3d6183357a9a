// Server loop
// Accepts connections until shutdown is requested, then drains open connections

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Notify;

use super::connection::accept_connection;
use super::ServerState;
use crate::logger;

/// How long open connections get to finish after shutdown
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);
const DRAIN_POLL: Duration = Duration::from_millis(50);

/// Accept loop. Must run inside a `LocalSet`; connections are spawned with
/// `spawn_local`.
#[allow(clippy::ignored_unit_patterns)]
pub async fn run(listener: TcpListener, state: Arc<ServerState>, shutdown: Arc<Notify>) {
    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => accept_connection(stream, peer_addr, &state),
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }

            _ = shutdown.notified() => break,
        }
    }

    drop(listener);
    logger::log_shutdown(state.connections.load(Ordering::SeqCst));

    let drained = tokio::time::timeout(DRAIN_TIMEOUT, async {
        while state.connections.load(Ordering::SeqCst) > 0 {
            tokio::time::sleep(DRAIN_POLL).await;
        }
    })
    .await;
    if drained.is_err() {
        logger::log_warning(&format!(
            "{} connection(s) still open after {} seconds; exiting anyway",
            state.connections.load(Ordering::SeqCst),
            DRAIN_TIMEOUT.as_secs()
        ));
    }
}
