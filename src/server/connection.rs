// Connection module
// Serves a single accepted TCP connection over HTTP/1.1

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;

use crate::config::AppState;
use crate::handler;
use crate::logger;
use crate::store::TripleStore;

/// Log the new connection and serve it on the local task set.
///
/// Must be called from within a `LocalSet`.
pub fn accept_connection<S: TripleStore + 'static>(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState<S>>,
) {
    logger::log_connection_accepted(&peer_addr);
    handle_connection(stream, peer_addr, Arc::clone(state));
}

/// Serve requests on the connection until the client closes it.
///
/// Requests on one connection are answered in order, each one completely
/// before the next is read.
fn handle_connection<S: TripleStore + 'static>(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: Arc<AppState<S>>,
) {
    tokio::task::spawn_local(async move {
        let io = TokioIo::new(stream);

        let mut builder = http1::Builder::new();
        builder.keep_alive(true);

        let conn = builder.serve_connection(
            io,
            service_fn(move |req| handler::handle_request(req, Arc::clone(&state), peer_addr)),
        );

        if let Err(err) = conn.await {
            logger::log_connection_error(&err);
        }
    });
}
