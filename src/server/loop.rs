// Server loop module
// Accepts connections until shutdown is requested

use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Notify;

use super::connection::accept_connection;
use crate::config::AppState;
use crate::logger;
use crate::store::TripleStore;

/// Accept connections on `listener` until `shutdown` is notified.
///
/// Returns without waiting for open connections; they are aborted when the
/// `LocalSet` driving them is dropped.
#[allow(clippy::ignored_unit_patterns)]
pub async fn run_server<S: TripleStore + 'static>(
    listener: TcpListener,
    state: Arc<AppState<S>>,
    shutdown: Arc<Notify>,
) {
    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => accept_connection(stream, peer_addr, &state),
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }

            _ = shutdown.notified() => {
                logger::log_shutdown("Shutdown signal received");
                break;
            }
        }
    }
}
