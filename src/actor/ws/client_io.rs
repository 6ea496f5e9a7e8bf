use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use tungstenite::protocol::Message;

use super::Clients;
use crate::reload::message::ReloadMessage;

const READ_POLL: Duration = Duration::from_millis(100);

/// A peer that connects but never sends the upgrade request is dropped
/// after this long.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(3);

/// Handshake with a new client, greet it and register it.
///
/// Blocks for up to [`HANDSHAKE_TIMEOUT`]; call it off the async loop.
pub(super) fn add_client(clients: &Clients, stream: TcpStream) {
    // blocking during the handshake, non-blocking for polled reads after
    let _ = stream.set_nonblocking(false);
    let _ = stream.set_read_timeout(Some(HANDSHAKE_TIMEOUT));
    let mut ws = match tungstenite::accept(stream) {
        Ok(ws) => ws,
        Err(e) => {
            crate::debug!("reload"; "handshake failed: {}", e);
            return;
        }
    };
    let _ = ws.get_ref().set_read_timeout(None);
    let _ = ws.get_ref().set_nonblocking(true);

    let hello = ReloadMessage::Connected.to_json();
    if let Err(e) = ws.send(Message::Text(hello.into())) {
        crate::log!("reload"; "failed to send connected message: {}", e);
        return;
    }

    let mut clients = clients.lock();
    clients.push(ws);
    crate::debug!("reload"; "client connected (total: {})", clients.len());
}

/// Poll clients for close frames and dead connections.
///
/// Reading also answers pings. Exits once the actor is gone.
pub(super) fn reader_loop(clients: Clients) {
    loop {
        std::thread::sleep(READ_POLL);
        if Arc::strong_count(&clients) == 1 {
            break;
        }

        clients.lock().retain_mut(|ws| match ws.read() {
            Ok(Message::Close(_)) => {
                crate::debug!("reload"; "client closed");
                false
            }
            Ok(_) => true,
            Err(tungstenite::Error::Io(ref e)) if e.kind() == std::io::ErrorKind::WouldBlock => {
                true
            }
            Err(e) => {
                crate::debug!("reload"; "client dropped: {}", e);
                false
            }
        });
    }
}
