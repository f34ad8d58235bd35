use crate::api::http::service::SimulatorService;
use crate::error::SimulatorError;
use crate::simulator::Simulator;
use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use std::pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tracing::{debug, error, info};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Binds `addr` and serves until `notifier` fires.
pub async fn start(
    notifier: Arc<Notify>,
    addr: &str,
    simulator: Arc<Simulator>,
) -> Result<(), SimulatorError> {
    let addr = common::socket::parse_address(addr)
        .map_err(|e| SimulatorError::NetworkError(format!("{}: {}", addr, e)))?;
    let listener =
        common::socket::bind(&addr).map_err(|e| SimulatorError::NetworkError(e.to_string()))?;

    info!("simulator: listening on http://{}", addr);
    serve(notifier, listener, simulator).await
}

/// Accepts connections on `listener` until `notifier` fires, then waits for open
/// connections to finish, at most [`SHUTDOWN_TIMEOUT`].
pub async fn serve(
    notifier: Arc<Notify>,
    listener: TcpListener,
    simulator: Arc<Simulator>,
) -> Result<(), SimulatorError> {
    let http = http1::Builder::new();
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let mut signal = pin::pin!(notifier.notified());
    let service = SimulatorService::new(simulator);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, remote_addr) = match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        error!("simulator: accept: {}", e);
                        continue;
                    }
                };

                debug!("simulator: connection from {}", remote_addr);
                let io = TokioIo::new(stream);
                let conn = http.serve_connection(io, service.clone());
                let fut = graceful.watch(conn);
                tokio::spawn(async move {
                    if let Err(e) = fut.await {
                        debug!("simulator: connection {}: {:?}", remote_addr, e);
                    }
                });
            },
            _ = &mut signal => {
                info!("simulator: http server: graceful shutdown");
                break;
            }
        }
    }

    tokio::select! {
        _ = graceful.shutdown() => {
            info!("simulator: http server: all connections gracefully closed");
        },
        _ = tokio::time::sleep(SHUTDOWN_TIMEOUT) => {
            info!("simulator: timed out wait for all connections to close");
        }
    }
    Ok(())
}
