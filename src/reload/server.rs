//! WebSocket listener for live reload.
//!
//! Accepts connections on a plain thread and hands the raw streams to the
//! WsActor, which performs the handshake and owns the clients.

use std::net::{IpAddr, TcpListener};
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;

use crate::actor::messages::WsMsg;

/// Maximum port retry attempts
const MAX_PORT_RETRIES: u16 = 10;

const ACCEPT_POLL: Duration = Duration::from_millis(100);

/// Bind near `base_port` and start the acceptor thread.
///
/// Returns the port actually bound.
pub fn start_ws_server(
    interface: IpAddr,
    base_port: u16,
    ws_tx: mpsc::Sender<WsMsg>,
) -> Result<u16> {
    let (listener, actual_port) = bind_with_retry(interface, base_port, MAX_PORT_RETRIES)?;
    listener.set_nonblocking(true)?;

    std::thread::spawn(move || {
        while !crate::core::is_shutdown() {
            match listener.accept() {
                Ok((stream, addr)) => {
                    crate::debug!("reload"; "client connected: {}", addr);
                    // the handshake runs in blocking mode
                    let _ = stream.set_nonblocking(false);
                    if ws_tx.blocking_send(WsMsg::AddClient(stream)).is_err() {
                        break;
                    }
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    std::thread::sleep(ACCEPT_POLL);
                }
                Err(e) => {
                    crate::log!("reload"; "accept error: {}", e);
                    std::thread::sleep(ACCEPT_POLL);
                }
            }
        }
    });

    Ok(actual_port)
}

/// Try binding to port, retry with incremented port if in use
pub(crate) fn bind_with_retry(
    interface: IpAddr,
    base_port: u16,
    max_retries: u16,
) -> Result<(TcpListener, u16)> {
    let mut last_error = None;

    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind((interface, port)) {
            Ok(listener) => {
                let actual_port = listener.local_addr()?.port();
                return Ok((listener, actual_port));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "failed to bind {}:{} after {} attempts: {}",
        interface,
        base_port,
        max_retries,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}
