//! Listening port selection
//!
//! Binds the first free TCP port at or after the configured start port.
//! The socket that wins the probe is handed straight to the server, so there
//! is no window in which another process can take the port.

use std::io::ErrorKind;
use tokio::net::TcpListener;

use crate::error::BootstrapError;

/// Bind `host:port` for the first `port >= start_port` that is not in use.
///
/// Only `AddrInUse` moves the probe to the next port; any other bind error
/// is returned immediately. At most `max_attempts` ports are tried and the
/// probe never wraps past 65535.
pub async fn bind_first_available(
    host: &str,
    start_port: u16,
    max_attempts: u32,
) -> Result<(TcpListener, u16), BootstrapError> {
    let mut port = start_port;
    let mut attempts = 0u32;

    while attempts < max_attempts {
        attempts += 1;
        match TcpListener::bind((host, port)).await {
            Ok(listener) => {
                let bound = listener
                    .local_addr()
                    .map(|a| a.port())
                    .map_err(|source| BootstrapError::Bind { port, source })?;
                if attempts > 1 {
                    tracing::debug!("Port {} in use, settled on {}", start_port, bound);
                }
                return Ok((listener, bound));
            }
            Err(e) if e.kind() == ErrorKind::AddrInUse => {
                tracing::debug!("Port {} is in use, trying next", port);
                port = match port.checked_add(1) {
                    Some(p) => p,
                    None => break,
                };
            }
            Err(source) => return Err(BootstrapError::Bind { port, source }),
        }
    }

    Err(BootstrapError::Exhausted {
        start: start_port,
        attempts,
    })
}
